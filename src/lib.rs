use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

pub mod clients;
pub mod config;
pub mod credentials;
pub mod error;
pub mod events;
pub mod ingest;
pub mod message;
pub mod patch;
pub mod twins;

pub use clients::Clients;
pub use error::{ErrorKind, IngestError};
pub use ingest::{handler, ingest, IngestOptions, Outcome};

pub fn set_up_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();
}
