use crate::cli::CommandLineArgs;
use crate::dataset::Layout;
use crate::error::AccessorError;
use crate::registry::DatasetRegistry;
use crate::resource_manager::ResourceManager;

use std::sync::Arc;

/// Shared application state passed to each request handler.
pub struct AppState {
    /// Command line arguments.
    pub args: CommandLineArgs,

    /// Registered datasets.
    pub registry: DatasetRegistry,

    /// Resource manager.
    pub resource_manager: ResourceManager,
}

impl AppState {
    /// Create and return an [AppState].
    ///
    /// Fails if any configured dataset cannot be registered.
    pub fn new(args: &CommandLineArgs) -> Result<Self, AccessorError> {
        let layout = Layout {
            label_kind: args.label_kind,
        };
        let registry = DatasetRegistry::new(&args.datasets, layout)?;
        let task_limit = args
            .thread_limit
            .unwrap_or_else(|| num_cpus::get().saturating_sub(1))
            .max(1);
        let resource_manager = ResourceManager::new(Some(task_limit));

        Ok(Self {
            args: args.clone(),
            registry,
            resource_manager,
        })
    }
}

/// AppState wrapped in an Atomic Reference Count (Arc) to allow multiple references.
pub type SharedAppState = Arc<AppState>;
