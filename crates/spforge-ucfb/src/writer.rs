//! Append-only chunk writer with size backpatching.
//!
//! [`Writer::new`] emits the root header with a zero size placeholder. Child
//! chunks are opened with [`ChunkWrite::emplace_child`] and must be closed
//! explicitly with [`ChildWriter::close`], which patches the child's size and
//! adds the child (header, payload and trailing padding) to its parent. The
//! root size is patched by [`Writer::finish`].
//!
//! Children borrow their parent mutably, so they close in the order they
//! were opened and a parent cannot write while a child is open. A child that
//! is dropped without being closed leaves its frame on the stack; every later
//! operation on an ancestor then fails with [`Error::UnclosedChild`].
//!
//! Running sizes are tracked as bytes are written, never by re-measuring the
//! sink. A chunk that would grow past `i32::MAX` bytes fails with
//! [`Error::SizeOverflow`] before anything is written.

use std::fmt;

use bytemuck::Pod;

use crate::error::{Error, Result};
use crate::magic::Magic;
use crate::sink::Sink;
use crate::{next_multiple_of, Alignment, CHUNK_ALIGNMENT, HEADER_SIZE, MAX_CHUNK_SIZE};

static ZEROES: [u8; 4096] = [0; 4096];

#[derive(Debug, Clone, Copy)]
struct Frame {
    magic: Magic,
    size_pos: u64,
    size: u64,
}

/// Root chunk writer.
pub struct Writer<S: Sink> {
    sink: S,
    frames: Vec<Frame>,
}

impl<S: Sink> Writer<S> {
    /// Start a root chunk with `magic` on `sink`.
    pub fn new(mut sink: S, magic: Magic) -> Result<Self> {
        let size_pos = sink.position() + 4;
        sink.write(magic.as_bytes())?;
        sink.write(&0u32.to_le_bytes())?;

        Ok(Self {
            sink,
            frames: vec![Frame {
                magic,
                size_pos,
                size: 0,
            }],
        })
    }

    /// Patch the root size, flush the sink and hand it back.
    pub fn finish(mut self) -> Result<S> {
        self.check_depth(0)?;
        let root = self.frames[0];
        self.backpatch(root)?;
        self.sink.flush()?;

        tracing::trace!(magic = %root.magic, size = root.size, "closed root chunk");
        Ok(self.sink)
    }

    fn check_depth(&self, depth: usize) -> Result<()> {
        match self.frames.get(depth + 1) {
            Some(open) => Err(Error::UnclosedChild { magic: open.magic }),
            None => Ok(()),
        }
    }

    fn grow(&mut self, depth: usize, len: u64) -> Result<()> {
        let frame = &mut self.frames[depth];
        let size = frame.size + len;

        if size > MAX_CHUNK_SIZE as u64 {
            return Err(Error::SizeOverflow {
                magic: frame.magic,
                size,
            });
        }

        frame.size = size;
        Ok(())
    }

    fn padding_after(&self, depth: usize, len: u64, alignment: Alignment) -> u64 {
        if !alignment.is_aligned() {
            return 0;
        }
        let end = self.frames[depth].size + len;
        next_multiple_of(end as usize, CHUNK_ALIGNMENT) as u64 - end
    }

    fn write_zeroes(&mut self, mut count: u64) -> Result<()> {
        while count > 0 {
            let n = count.min(ZEROES.len() as u64) as usize;
            self.sink.write(&ZEROES[..n])?;
            count -= n as u64;
        }
        Ok(())
    }

    fn write_raw(&mut self, depth: usize, bytes: &[u8], alignment: Alignment) -> Result<()> {
        self.check_depth(depth)?;

        let padding = self.padding_after(depth, bytes.len() as u64, alignment);
        self.grow(depth, bytes.len() as u64 + padding)?;

        self.sink.write(bytes)?;
        self.write_zeroes(padding)
    }

    fn pad_raw(&mut self, depth: usize, count: u64, alignment: Alignment) -> Result<()> {
        self.check_depth(depth)?;

        let padding = self.padding_after(depth, count, alignment);
        self.grow(depth, count + padding)?;

        self.write_zeroes(count + padding)
    }

    fn open_child(&mut self, depth: usize, magic: Magic) -> Result<()> {
        self.pad_raw(depth, 0, Alignment::Aligned)?;
        self.grow(depth, HEADER_SIZE as u64)?;

        let size_pos = self.sink.position() + 4;
        self.sink.write(magic.as_bytes())?;
        self.sink.write(&0u32.to_le_bytes())?;

        self.frames.push(Frame {
            magic,
            size_pos,
            size: 0,
        });
        Ok(())
    }

    fn close_child(&mut self, depth: usize) -> Result<()> {
        self.check_depth(depth)?;

        let Some(child) = self.frames.pop() else {
            return Ok(());
        };
        self.backpatch(child)?;

        let parent = depth - 1;
        self.grow(parent, child.size)?;
        self.pad_raw(parent, 0, Alignment::Aligned)?;

        tracing::trace!(magic = %child.magic, size = child.size, "closed child chunk");
        Ok(())
    }

    fn backpatch(&mut self, frame: Frame) -> Result<()> {
        let size = i32::try_from(frame.size).map_err(|_| Error::SizeOverflow {
            magic: frame.magic,
            size: frame.size,
        })?;
        self.sink.write_at(frame.size_pos, &size.to_le_bytes())
    }
}

impl<S: Sink> fmt::Debug for Writer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Writer")
            .field("frames", &self.frames)
            .field("position", &self.sink.position())
            .finish()
    }
}

/// Scoped writer for a child chunk.
///
/// Must be finished with [`close`](Self::close).
pub struct ChildWriter<'w, S: Sink> {
    writer: &'w mut Writer<S>,
    depth: usize,
    closed: bool,
}

impl<S: Sink> ChildWriter<'_, S> {
    /// Patch this chunk's size and add it to the parent.
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.writer.close_child(self.depth)
    }
}

impl<S: Sink> Drop for ChildWriter<'_, S> {
    fn drop(&mut self) {
        if !self.closed {
            let magic = self.writer.frames.get(self.depth).map(|f| f.magic);
            tracing::warn!(?magic, depth = self.depth, "child chunk dropped without close");
        }
    }
}

impl<S: Sink> fmt::Debug for ChildWriter<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildWriter")
            .field("depth", &self.depth)
            .field("frame", &self.writer.frames.get(self.depth))
            .finish()
    }
}

mod sealed {
    pub trait Sealed {}

    impl<S: crate::Sink> Sealed for super::Writer<S> {}
    impl<S: crate::Sink> Sealed for super::ChildWriter<'_, S> {}
}

/// Write operations shared by the root writer and child writers.
pub trait ChunkWrite: sealed::Sealed {
    type Sink: Sink;

    #[doc(hidden)]
    fn target(&mut self) -> (&mut Writer<Self::Sink>, usize);

    #[doc(hidden)]
    fn target_ref(&self) -> (&Writer<Self::Sink>, usize);

    /// Magic number of the chunk being written.
    fn magic(&self) -> Magic {
        let (writer, depth) = self.target_ref();
        writer.frames[depth].magic
    }

    /// Payload bytes written to this chunk so far.
    fn size(&self) -> u64 {
        let (writer, depth) = self.target_ref();
        writer.frames[depth].size
    }

    /// Position of the next byte relative to the start of the sink.
    fn absolute_position(&self) -> u64 {
        self.target_ref().0.sink.position()
    }

    /// Write a value and pad to the chunk alignment.
    fn write<V: ChunkValue + ?Sized>(&mut self, value: &V) -> Result<()> {
        value.write_to(self, Alignment::Aligned)
    }

    fn write_unaligned<V: ChunkValue + ?Sized>(&mut self, value: &V) -> Result<()> {
        value.write_to(self, Alignment::Unaligned)
    }

    fn write_with<V: ChunkValue + ?Sized>(&mut self, value: &V, alignment: Alignment) -> Result<()> {
        value.write_to(self, alignment)
    }

    /// Write the raw bytes of any flat value.
    fn write_pod<T: Pod>(&mut self, value: &T, alignment: Alignment) -> Result<()> {
        self.write_bytes(bytemuck::bytes_of(value), alignment)
    }

    fn write_bytes(&mut self, bytes: &[u8], alignment: Alignment) -> Result<()> {
        let (writer, depth) = self.target();
        writer.write_raw(depth, bytes, alignment)
    }

    /// Write `count` zero bytes, then pad to the chunk alignment.
    fn pad(&mut self, count: u64) -> Result<()> {
        let (writer, depth) = self.target();
        writer.pad_raw(depth, count, Alignment::Aligned)
    }

    fn pad_unaligned(&mut self, count: u64) -> Result<()> {
        let (writer, depth) = self.target();
        writer.pad_raw(depth, count, Alignment::Unaligned)
    }

    /// Write `data` so that its first byte lands on a multiple of
    /// `alignment` relative to the start of the sink.
    ///
    /// Emits a `u32` holding the number of padding bytes that follow it,
    /// the padding, then `data` (aligned). Readers skip the padding with
    /// [`Reader::consume_unaligned`](crate::Reader::consume_unaligned).
    fn write_at_alignment(&mut self, alignment: u64, data: &[u8]) -> Result<()> {
        let alignment = alignment.max(1);

        self.pad(0)?;
        let from = self.absolute_position() + 4;
        let offset = (alignment - from % alignment) % alignment;
        let offset_field = u32::try_from(offset).map_err(|_| Error::SizeOverflow {
            magic: self.magic(),
            size: self.size() + offset,
        })?;

        self.write(&offset_field)?;
        self.pad_unaligned(offset)?;
        self.write_bytes(data, Alignment::Aligned)
    }

    /// Open a child chunk.
    fn emplace_child(&mut self, magic: Magic) -> Result<ChildWriter<'_, Self::Sink>> {
        let (writer, depth) = self.target();
        writer.open_child(depth, magic)?;

        Ok(ChildWriter {
            writer,
            depth: depth + 1,
            closed: false,
        })
    }

    /// Open a child chunk, fill it with `f` and close it.
    ///
    /// The child is closed even when `f` fails; `f`'s error takes precedence.
    fn with_child<T, E, F>(&mut self, magic: Magic, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut ChildWriter<'_, Self::Sink>) -> std::result::Result<T, E>,
        E: From<Error>,
    {
        let mut child = self.emplace_child(magic)?;
        let result = f(&mut child);
        let closed = child.close();

        let value = result?;
        closed?;
        Ok(value)
    }
}

impl<S: Sink> ChunkWrite for Writer<S> {
    type Sink = S;

    fn target(&mut self) -> (&mut Writer<S>, usize) {
        (self, 0)
    }

    fn target_ref(&self) -> (&Writer<S>, usize) {
        (self, 0)
    }
}

impl<S: Sink> ChunkWrite for ChildWriter<'_, S> {
    type Sink = S;

    fn target(&mut self) -> (&mut Writer<S>, usize) {
        (&mut *self.writer, self.depth)
    }

    fn target_ref(&self) -> (&Writer<S>, usize) {
        (&*self.writer, self.depth)
    }
}

/// A value that can be written into a chunk.
pub trait ChunkValue {
    fn write_to<W: ChunkWrite + ?Sized>(&self, writer: &mut W, alignment: Alignment) -> Result<()>;
}

macro_rules! impl_chunk_value_pod {
    ($($ty:ty),+) => {
        $(
            impl ChunkValue for $ty {
                fn write_to<W: ChunkWrite + ?Sized>(&self, writer: &mut W, alignment: Alignment) -> Result<()> {
                    writer.write_bytes(bytemuck::bytes_of(self), alignment)
                }
            }
        )+
    };
}

impl_chunk_value_pod!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64, Magic);

impl ChunkValue for bool {
    fn write_to<W: ChunkWrite + ?Sized>(&self, writer: &mut W, alignment: Alignment) -> Result<()> {
        writer.write_bytes(&[u8::from(*self)], alignment)
    }
}

impl<T: Pod, const N: usize> ChunkValue for [T; N] {
    fn write_to<W: ChunkWrite + ?Sized>(&self, writer: &mut W, alignment: Alignment) -> Result<()> {
        writer.write_bytes(bytemuck::cast_slice(self.as_slice()), alignment)
    }
}

impl<T: Pod> ChunkValue for [T] {
    fn write_to<W: ChunkWrite + ?Sized>(&self, writer: &mut W, alignment: Alignment) -> Result<()> {
        writer.write_bytes(bytemuck::cast_slice(self), alignment)
    }
}

impl<T: Pod> ChunkValue for Vec<T> {
    fn write_to<W: ChunkWrite + ?Sized>(&self, writer: &mut W, alignment: Alignment) -> Result<()> {
        self.as_slice().write_to(writer, alignment)
    }
}

/// Strings are written as their bytes plus a NUL terminator.
impl ChunkValue for str {
    fn write_to<W: ChunkWrite + ?Sized>(&self, writer: &mut W, alignment: Alignment) -> Result<()> {
        writer.write_bytes(self.as_bytes(), Alignment::Unaligned)?;
        writer.write_bytes(&[0], alignment)
    }
}

impl ChunkValue for String {
    fn write_to<W: ChunkWrite + ?Sized>(&self, writer: &mut W, alignment: Alignment) -> Result<()> {
        self.as_str().write_to(writer, alignment)
    }
}

impl<V: ChunkValue + ?Sized> ChunkValue for &V {
    fn write_to<W: ChunkWrite + ?Sized>(&self, writer: &mut W, alignment: Alignment) -> Result<()> {
        (**self).write_to(writer, alignment)
    }
}

macro_rules! impl_chunk_value_tuple {
    ($($name:ident $idx:tt),+) => {
        impl<$($name: ChunkValue),+> ChunkValue for ($($name,)+) {
            fn write_to<W: ChunkWrite + ?Sized>(&self, writer: &mut W, alignment: Alignment) -> Result<()> {
                $(self.$idx.write_to(writer, alignment)?;)+
                Ok(())
            }
        }
    };
}

impl_chunk_value_tuple!(A 0);
impl_chunk_value_tuple!(A 0, B 1);
impl_chunk_value_tuple!(A 0, B 1, C 2);
impl_chunk_value_tuple!(A 0, B 1, C 2, D 3);
impl_chunk_value_tuple!(A 0, B 1, C 2, D 3, E 4);
impl_chunk_value_tuple!(A 0, B 1, C 2, D 3, E 4, F 5);
