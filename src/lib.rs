pub mod archive;
pub mod capabilities;
pub mod config;
pub mod controller;
mod error;
pub mod mail;
pub mod profile;
pub mod sampler;
pub mod session;

pub use archive::{ArchiveStore, LoadedArchive};
pub use config::Settings;
pub use controller::{Controller, SampleReport, SaveReason};
pub use error::{ChamberError, Result};
pub use profile::{Profile, ProfileEvaluator, ProfileSetpoint};
pub use session::{DataRecord, SessionClock, SessionLog, SessionState};

/// Install the global `tracing` subscriber.
///
/// Honors `RUST_LOG` and falls back to `info`. A second call is a no-op.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}
