use std::path::PathBuf;
use thiserror::Error;

/// Errors reported while loading a map.
///
/// Rendering and collision queries never fail; only loading does.
#[derive(Debug, Error)]
pub enum MapError {
    /// The document (or a tileset file) is not well-formed or misses data
    /// the decoder cannot do without.
    #[error("failed to parse {origin}: {reason}")]
    Parse {
        /// File path, or `<memory>` for in-memory documents.
        origin: String,
        /// What went wrong.
        reason: String,
    },
    /// A recognised but unsupported feature, e.g. a non-orthogonal map.
    #[error("unsupported map format: {0}")]
    UnsupportedFormat(String),
    /// A host provider could not deliver a referenced file.
    #[error("failed to load resource `{}`", path.display())]
    ResourceNotFound {
        /// Resolved path handed to the provider.
        path: PathBuf,
        /// Whatever the provider reported.
        #[source]
        source: anyhow::Error,
    },
    /// The map parsed but registered no tileset.
    #[error("map has no tilesets")]
    EmptyMap,
}

impl MapError {
    pub(crate) fn parse(origin: &str, reason: impl Into<String>) -> Self {
        MapError::Parse {
            origin: origin.to_owned(),
            reason: reason.into(),
        }
    }
}
