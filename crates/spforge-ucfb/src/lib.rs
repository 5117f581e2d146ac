//! spforge-ucfb: the chunked binary container used by game asset files.
//!
//! A chunk is a four byte magic number, a little-endian `u32` payload size
//! (excluding the 8 byte header) and the payload itself. A payload may in
//! turn be a back-to-back sequence of child chunks, so a file forms a tree.
//!
//! # Modules
//!
//! - `magic` - Four-character chunk tags
//! - `reader` - Bounds-checked cursor over an immutable chunk
//! - `writer` - Append-only writer that backpatches chunk sizes on close
//! - `sink` - Output targets for the writer (memory, files, counting)
//!
//! # Alignment
//!
//! Unless a read or write is explicitly unaligned, the cursor is padded
//! forward to the next multiple of four relative to the start of the
//! current chunk's payload. Writers and readers must agree on which fields
//! are unaligned.
//!
//! ```
//! use spforge_ucfb::{ChunkWrite, Magic, Reader, Writer};
//!
//! let mut writer = Writer::new(Vec::new(), Magic::UCFB).unwrap();
//! writer.with_child(Magic::new(*b"TEST"), |child| child.write(&42u32)).unwrap();
//! let bytes = writer.finish().unwrap();
//!
//! let mut root = Reader::new(&bytes).unwrap();
//! let mut child = root.read_child_strict(Magic::new(*b"TEST")).unwrap();
//! assert_eq!(child.read::<u32>().unwrap(), 42);
//! assert!(!root.has_more());
//! ```

pub mod error;
pub mod magic;
pub mod reader;
pub mod sink;
pub mod writer;

pub use error::{Error, Result};
pub use magic::Magic;
pub use reader::{Children, ReadMulti, Reader, StrictReader};
pub use sink::{create_file, NullSink, Sink, StreamSink};
pub use writer::{ChildWriter, ChunkValue, ChunkWrite, Writer};

/// Size of a chunk header (magic + size).
pub const HEADER_SIZE: usize = 8;

/// Boundary that aligned reads and writes pad to.
pub const CHUNK_ALIGNMENT: usize = 4;

/// Largest payload size a chunk header can carry.
pub const MAX_CHUNK_SIZE: usize = i32::MAX as usize;

/// Whether a read or write pads the cursor to [`CHUNK_ALIGNMENT`] afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Alignment {
    #[default]
    Aligned,
    Unaligned,
}

impl Alignment {
    pub fn is_aligned(self) -> bool {
        self == Self::Aligned
    }
}

/// Round `value` up to the next multiple of `alignment` (a power of two).
#[inline]
pub fn next_multiple_of(value: usize, alignment: usize) -> usize {
    debug_assert!(alignment.is_power_of_two());
    (value + alignment - 1) & !(alignment - 1)
}
