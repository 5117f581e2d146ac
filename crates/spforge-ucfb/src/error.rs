//! Error types for spforge-ucfb.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::magic::Magic;

/// Result type for chunk operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for chunk operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Buffer is too short to hold a chunk header.
    #[error("chunk header needs 8 bytes, buffer has {len}")]
    HeaderTooShort { len: usize },

    /// A chunk header declares more payload than its buffer holds.
    #[error("chunk '{magic}' declares {declared} bytes but only {available} are available")]
    DeclaredSizeExceedsBuffer {
        magic: Magic,
        declared: usize,
        available: usize,
    },

    /// A read would run past the end of the chunk.
    #[error("read of {need} bytes at offset {offset} overruns chunk '{magic}' of size {size}")]
    Overrun {
        magic: Magic,
        offset: usize,
        need: usize,
        size: usize,
    },

    /// A strict child read found an unexpected magic number.
    #[error("expected child chunk '{expected}', found '{found}'")]
    MagicMismatch { expected: Magic, found: Magic },

    /// No remaining child carried the wanted magic number.
    #[error("no child chunk '{wanted}' in '{parent}'")]
    ChildNotFound { wanted: Magic, parent: Magic },

    /// A chunk grew past the signed 32-bit size field.
    #[error("chunk '{magic}' size {size} exceeds the 2147483647 byte limit")]
    SizeOverflow { magic: Magic, size: u64 },

    /// A child writer was dropped without being closed.
    #[error("child chunk '{magic}' was never closed")]
    UnclosedChild { magic: Magic },

    /// Text that is not a four byte magic number.
    #[error("invalid magic number: {0:?}")]
    InvalidMagic(String),

    /// Underlying sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Output file could not be opened.
    #[error("unable to open {} for output: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Whether this error comes from malformed or truncated input.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::HeaderTooShort { .. }
                | Self::DeclaredSizeExceedsBuffer { .. }
                | Self::Overrun { .. }
                | Self::MagicMismatch { .. }
                | Self::ChildNotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::Overrun {
            magic: Magic::NAME,
            offset: 4,
            need: 8,
            size: 10,
        };
        assert_eq!(
            err.to_string(),
            "read of 8 bytes at offset 4 overruns chunk 'NAME' of size 10"
        );

        let err = Error::MagicMismatch {
            expected: Magic::VER_,
            found: Magic::NAME,
        };
        assert_eq!(err.to_string(), "expected child chunk 'VER_', found 'NAME'");
    }

    #[test]
    fn test_is_malformed() {
        assert!(Error::HeaderTooShort { len: 3 }.is_malformed());
        assert!(!Error::UnclosedChild { magic: Magic::DATA }.is_malformed());
        assert!(!Error::Io(io::Error::other("disk")).is_malformed());
    }
}
