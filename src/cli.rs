//! Command Line Interface (CLI) arguments.

use crate::models::{Cleanse, LabelKind};
use crate::registry::DatasetSource;

use clap::Parser;

/// seq2view command line interface
#[derive(Clone, Debug, Parser)]
pub struct CommandLineArgs {
    /// The IP address on which the server should listen
    #[arg(long, default_value = "0.0.0.0", env = "SEQ2VIEW_HOST")]
    pub host: String,
    /// The port to which the server should bind
    #[arg(long, default_value_t = 8080, env = "SEQ2VIEW_PORT")]
    pub port: u16,
    /// Flag indicating whether HTTPS should be used
    #[arg(long, default_value_t = false, env = "SEQ2VIEW_HTTPS")]
    pub https: bool,
    /// Path to the certificate file to be used for HTTPS encryption
    #[arg(
        long,
        default_value = "~/.config/seq2view/certs/cert.pem",
        env = "SEQ2VIEW_CERT_FILE"
    )]
    pub cert_file: String,
    /// Path to the key file to be used for HTTPS encryption
    #[arg(
        long,
        default_value = "~/.config/seq2view/certs/key.pem",
        env = "SEQ2VIEW_KEY_FILE"
    )]
    pub key_file: String,
    /// Maximum time in seconds to wait for requests to complete upon receiving `ctrl+c` signal.
    #[arg(long, default_value_t = 60, env = "SEQ2VIEW_SHUTDOWN_TIMEOUT")]
    pub graceful_shutdown_timeout: u64,
    /// Dataset to serve, as ID=PATH. May be repeated, or given as a comma-separated list in the
    /// environment.
    #[arg(
        long = "dataset",
        required = true,
        value_delimiter = ',',
        env = "SEQ2VIEW_DATASETS"
    )]
    pub datasets: Vec<DatasetSource>,
    /// Kind segment of the node holding feature labels.
    #[arg(long, value_enum, env = "SEQ2VIEW_LABEL_KIND")]
    pub label_kind: LabelKind,
    /// Whether to drop NaN and zero/zero points from extracted series.
    #[arg(long, value_enum, env = "SEQ2VIEW_CLEANSE")]
    pub cleanse: Cleanse,
    /// Whether to enable sending traces to Jaeger.
    #[arg(long, default_value_t = false, env = "SEQ2VIEW_ENABLE_JAEGER")]
    pub enable_jaeger: bool,
    /// Whether to use Rayon for execution of blocking store reads.
    #[arg(long, default_value_t = false, env = "SEQ2VIEW_USE_RAYON")]
    pub use_rayon: bool,
    /// Maximum number of store reads to run concurrently. Defaults to one less than the number
    /// of CPUs.
    #[arg(long, env = "SEQ2VIEW_THREAD_LIMIT")]
    pub thread_limit: Option<usize>,
}

/// Returns parsed command line arguments.
pub fn parse() -> CommandLineArgs {
    CommandLineArgs::parse()
}
