//! Error types for catalog construction and story loading.

use std::fmt;
use std::io;

/// Errors raised while building a catalog or fetching story text.
///
/// Story loading never propagates these to the caller; the loader logs them
/// and substitutes placeholder text. Catalog construction does return them.
#[derive(Debug)]
pub enum StoryError {
    /// Filesystem failure.
    Io(io::Error),
    /// A story source could not produce text for `source_ref`.
    Fetch { source_ref: String, reason: String },
    /// Catalog metadata is malformed.
    Catalog(String),
    /// Two catalog entries share the same story id.
    DuplicateStoryId(u32),
    /// Metadata JSON failed to parse.
    Json(serde_json::Error),
}

impl fmt::Display for StoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {}", err),
            Self::Fetch { source_ref, reason } => {
                write!(f, "failed to fetch story '{}': {}", source_ref, reason)
            }
            Self::Catalog(msg) => write!(f, "invalid catalog: {}", msg),
            Self::DuplicateStoryId(id) => write!(f, "duplicate story id {}", id),
            Self::Json(err) => write!(f, "invalid catalog json: {}", err),
        }
    }
}

impl std::error::Error for StoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for StoryError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for StoryError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}
