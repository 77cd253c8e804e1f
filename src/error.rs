use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChamberError {
    #[error("Malformed profile: {0}")]
    MalformedProfile(String),

    #[error("Profile is not closed-loop: first temperature {first} differs from last {last}")]
    AsymmetricProfile { first: f64, last: f64 },

    #[error("Cycle generation needs at least 2 cycles, got {0}")]
    InvalidCycleCount(u32),

    #[error("Record at {next} is not after the previous record at {previous}")]
    OutOfOrderRecord { previous: String, next: String },

    #[error("Profile I/O failed for {path:?}: {source}")]
    ProfileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Archive I/O failed for {path:?}: {source}")]
    ArchiveIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Archive {path:?} is corrupt: {reason}")]
    ArchiveCorrupt { path: PathBuf, reason: String },

    #[error("Malformed session log: {0}")]
    MalformedLog(String),

    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Sensor error: {0}")]
    Sensor(String),

    #[error("Mail error: {0}")]
    Mail(String),
}

impl ChamberError {
    pub(crate) fn archive_io(path: impl Into<PathBuf>, source: impl Into<std::io::Error>) -> Self {
        ChamberError::ArchiveIo {
            path: path.into(),
            source: source.into(),
        }
    }
}

impl From<ChamberError> for String {
    fn from(err: ChamberError) -> Self {
        err.to_string()
    }
}

pub type Result<T, E = ChamberError> = std::result::Result<T, E>;
