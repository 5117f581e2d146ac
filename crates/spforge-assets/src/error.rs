//! Error types for spforge-assets.

use std::io;
use std::path::{Path, PathBuf};

use spforge_ucfb::Magic;
use thiserror::Error;

/// Result type for record operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for record operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or truncated chunk data.
    #[error(transparent)]
    Chunk(#[from] spforge_ucfb::Error),

    /// The version tag matches no known schema.
    #[error("{record} has unknown version {version}")]
    UnknownVersion { record: &'static str, version: u32 },

    /// A field holds a value the schema does not allow.
    #[error("invalid {record}: {reason}")]
    InvalidRecord { record: &'static str, reason: String },

    /// Rendertype name or value that matches no rendertype.
    #[error("{0} is not a valid rendertype")]
    UnknownRendertype(String),

    /// Legacy texture format with no modern equivalent.
    #[error("texture specifies unsupported format {0:#010x}")]
    UnsupportedFormat(u32),

    /// Payload does not fit the volume resource size fields.
    #[error("resource of {size} bytes is too large to store (limit {limit})")]
    ResourceTooLarge { size: usize, limit: usize },

    /// File whose record chunk is neither a material nor a texture.
    #[error("unrecognised asset chunk '{0}'")]
    UnknownAsset(Magic),

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An error tied to a specific asset file.
    #[error("{}: {source}", path.display())]
    Asset {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create an invalid record error.
    pub fn invalid_record(record: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            record,
            reason: reason.into(),
        }
    }

    /// Attach the path of the asset being processed.
    pub fn at_path(self, path: impl AsRef<Path>) -> Self {
        Self::Asset {
            path: path.as_ref().to_path_buf(),
            source: Box::new(self),
        }
    }

    /// The error with any path context removed.
    pub fn root(&self) -> &Error {
        match self {
            Self::Asset { source, .. } => source.root(),
            other => other,
        }
    }
}
