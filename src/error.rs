//! Errors at the crate's fallible edges (files and level data).
//! The simulation itself never fails.

use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GameError {
    /// Reading or writing a file failed
    #[error("failed to access {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Level or score data is not valid JSON for its type
    #[error("malformed JSON")]
    Parse(#[from] serde_json::Error),

    /// Level parsed but cannot be played
    #[error("level {name:?} is invalid: {reason}")]
    InvalidLevel { name: String, reason: String },
}

impl GameError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        GameError::Io {
            path: path.into(),
            source,
        }
    }
}
