//! Crate-level error type.

use crate::config::ConfigLoadError;
use crate::filter::FilterError;
use crate::io::IoError;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// DrishtiSLAM error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Artifact I/O error
    #[error(transparent)]
    Io(#[from] IoError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigLoadError),

    /// Filter cycle error
    #[error(transparent)]
    Filter(#[from] FilterError),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(IoError::Io(e))
    }
}
