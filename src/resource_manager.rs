//! Resource management

use crate::error::AccessorError;

use tokio::sync::{Semaphore, SemaphorePermit};

/// [crate::resource_manager::ResourceManager] limits the number of store reads running at once.
/// Resource management is performed using a Tokio Semaphore.
#[derive(Debug)]
pub struct ResourceManager {
    /// Optional semaphore for tasks.
    tasks: Option<Semaphore>,
}

impl ResourceManager {
    /// Returns a new ResourceManager object.
    pub fn new(task_limit: Option<usize>) -> Self {
        Self {
            tasks: task_limit.map(Semaphore::new),
        }
    }

    /// Acquire a task resource.
    pub async fn task(&self) -> Result<Option<SemaphorePermit<'_>>, AccessorError> {
        if let Some(tasks) = &self.tasks {
            Ok(Some(tasks.acquire().await?))
        } else {
            Ok(None)
        }
    }
}
