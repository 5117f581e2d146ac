//! Bounds-checked cursor over an immutable chunk.
//!
//! A [`Reader`] is a non-owning view of one chunk's payload plus a single
//! piece of mutable state: the offset of the next unread byte. Readers are
//! `Copy`; a copy carries its own head, so any number of readers (on any
//! number of threads) may walk the same buffer independently.
//!
//! Every read advances the head by the bytes consumed and then, unless the
//! read is unaligned, pads it to the next multiple of four relative to the
//! start of the payload. A read that would run past the end of the chunk
//! fails and leaves the head where it was.

use std::borrow::Cow;
use std::fmt;
use std::mem::size_of;
use std::ops::{Deref, DerefMut};

use bytemuck::Pod;

use crate::error::{Error, Result};
use crate::magic::Magic;
use crate::{next_multiple_of, Alignment, CHUNK_ALIGNMENT, HEADER_SIZE};

/// Cursor over a single chunk's payload.
#[derive(Clone, Copy)]
pub struct Reader<'a> {
    magic: Magic,
    data: &'a [u8],
    head: usize,
}

impl<'a> Reader<'a> {
    /// Create a reader over a buffer holding a complete chunk (header included).
    ///
    /// Trailing bytes past the declared payload are ignored.
    pub fn new(bytes: &'a [u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(Error::HeaderTooShort { len: bytes.len() });
        }

        let magic = Magic::new([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let declared = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
        let available = bytes.len() - HEADER_SIZE;

        if declared > available {
            return Err(Error::DeclaredSizeExceedsBuffer {
                magic,
                declared,
                available,
            });
        }

        Ok(Self::from_parts(
            magic,
            &bytes[HEADER_SIZE..HEADER_SIZE + declared],
        ))
    }

    /// Create a reader from an already validated magic number and payload.
    pub fn from_parts(magic: Magic, payload: &'a [u8]) -> Self {
        Self {
            magic,
            data: payload,
            head: 0,
        }
    }

    /// Magic number of this chunk.
    pub fn magic(&self) -> Magic {
        self.magic
    }

    /// Payload size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Offset of the next unread byte.
    pub fn head(&self) -> usize {
        self.head
    }

    /// Whole payload, regardless of the head.
    pub fn payload(&self) -> &'a [u8] {
        self.data
    }

    /// Bytes left between the head and the end of the chunk.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.head)
    }

    /// True while the head has not reached the end of the chunk.
    pub fn has_more(&self) -> bool {
        self.head < self.data.len()
    }

    /// Rewind to the start of the payload.
    pub fn reset_head(&mut self) {
        self.head = 0;
    }

    /// Read a flat value.
    pub fn read<T: Pod>(&mut self) -> Result<T> {
        self.read_with(Alignment::Aligned)
    }

    /// Read a flat value without padding the head afterwards.
    pub fn read_unaligned<T: Pod>(&mut self) -> Result<T> {
        self.read_with(Alignment::Unaligned)
    }

    pub fn read_with<T: Pod>(&mut self, alignment: Alignment) -> Result<T> {
        let bytes = self.take(size_of::<T>(), alignment)?;
        Ok(bytemuck::pod_read_unaligned(bytes))
    }

    /// Read a one byte boolean; any non-zero value is `true`.
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read::<u8>()? != 0)
    }

    /// Read several flat values in sequence, each aligned.
    ///
    /// ```
    /// # use spforge_ucfb::{Magic, Reader};
    /// let payload = [1u8, 0, 0, 0, 2, 0, 0, 0];
    /// let mut reader = Reader::from_parts(Magic::INFO, &payload);
    /// let (a, b) = reader.read_multi::<(u32, u32)>().unwrap();
    /// assert_eq!((a, b), (1, 2));
    /// ```
    pub fn read_multi<M: ReadMulti>(&mut self) -> Result<M> {
        self.read_multi_with(&[])
    }

    /// Read several flat values with a per-field alignment.
    ///
    /// Fields without an entry in `alignments` are aligned. On failure the
    /// head is restored to where it was before the first field.
    pub fn read_multi_with<M: ReadMulti>(&mut self, alignments: &[Alignment]) -> Result<M> {
        let start = self.head;
        M::read_fields(self, alignments).inspect_err(|_| self.head = start)
    }

    /// Read `count` flat values.
    ///
    /// The result borrows the buffer when it is suitably aligned for `T`
    /// and is copied otherwise.
    pub fn read_array<T: Pod>(&mut self, count: usize) -> Result<Cow<'a, [T]>> {
        self.read_array_with(count, Alignment::Aligned)
    }

    pub fn read_array_unaligned<T: Pod>(&mut self, count: usize) -> Result<Cow<'a, [T]>> {
        self.read_array_with(count, Alignment::Unaligned)
    }

    pub fn read_array_with<T: Pod>(
        &mut self,
        count: usize,
        alignment: Alignment,
    ) -> Result<Cow<'a, [T]>> {
        let len = count.checked_mul(size_of::<T>()).ok_or(Error::Overrun {
            magic: self.magic,
            offset: self.head,
            need: usize::MAX,
            size: self.size(),
        })?;
        let bytes = self.take(len, alignment)?;

        Ok(match bytemuck::try_cast_slice(bytes) {
            Ok(slice) => Cow::Borrowed(slice),
            Err(_) => Cow::Owned(
                bytes
                    .chunks_exact(size_of::<T>().max(1))
                    .map(bytemuck::pod_read_unaligned)
                    .collect(),
            ),
        })
    }

    /// Read `len` raw bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.take(len, Alignment::Aligned)
    }

    pub fn read_bytes_unaligned(&mut self, len: usize) -> Result<&'a [u8]> {
        self.take(len, Alignment::Unaligned)
    }

    /// Read a NUL-terminated string.
    ///
    /// Bytes that are not valid UTF-8 are replaced; use
    /// [`read_string_bytes`](Self::read_string_bytes) for the raw bytes.
    pub fn read_string(&mut self) -> Result<Cow<'a, str>> {
        Ok(String::from_utf8_lossy(self.read_string_bytes()?))
    }

    pub fn read_string_unaligned(&mut self) -> Result<Cow<'a, str>> {
        Ok(String::from_utf8_lossy(
            self.read_string_bytes_with(Alignment::Unaligned)?,
        ))
    }

    /// Read a NUL-terminated string as raw bytes, terminator excluded.
    pub fn read_string_bytes(&mut self) -> Result<&'a [u8]> {
        self.read_string_bytes_with(Alignment::Aligned)
    }

    pub fn read_string_bytes_with(&mut self, alignment: Alignment) -> Result<&'a [u8]> {
        let rest = self.data.get(self.head..).unwrap_or_default();
        let len = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());

        // A missing terminator makes the read overrun by one byte.
        let bytes = self.take(len + 1, alignment)?;
        Ok(&bytes[..len])
    }

    /// Read the next child chunk.
    ///
    /// Child headers always begin on an aligned offset. The writer pads
    /// before opening a child, so the head is aligned first even when the
    /// previous read was unaligned.
    pub fn read_child(&mut self) -> Result<Reader<'a>> {
        self.read_child_with(Alignment::Aligned)
    }

    pub fn read_child_unaligned(&mut self) -> Result<Reader<'a>> {
        self.read_child_with(Alignment::Unaligned)
    }

    pub fn read_child_with(&mut self, alignment: Alignment) -> Result<Reader<'a>> {
        let start = self.head;
        self.align_head();

        let child = self.read_child_inner(alignment);
        if child.is_err() {
            self.head = start;
        }
        child
    }

    fn read_child_inner(&mut self, alignment: Alignment) -> Result<Reader<'a>> {
        let header = self.take(HEADER_SIZE, Alignment::Unaligned)?;
        let magic = Magic::new([header[0], header[1], header[2], header[3]]);
        let size = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as usize;

        let payload = self.take(size, alignment)?;
        Ok(Reader::from_parts(magic, payload))
    }

    /// Read the next child chunk, or `None` if it would overrun.
    ///
    /// The head is unchanged when `None` is returned.
    pub fn try_read_child(&mut self) -> Option<Reader<'a>> {
        self.read_child().ok()
    }

    /// Read the next child, which must carry `expected`.
    ///
    /// On a magic mismatch the head is rolled back and
    /// [`Error::MagicMismatch`] is returned.
    pub fn read_child_strict(&mut self, expected: Magic) -> Result<StrictReader<'a>> {
        self.read_child_strict_with(expected, Alignment::Aligned)
    }

    pub fn read_child_strict_unaligned(&mut self, expected: Magic) -> Result<StrictReader<'a>> {
        self.read_child_strict_with(expected, Alignment::Unaligned)
    }

    pub fn read_child_strict_with(
        &mut self,
        expected: Magic,
        alignment: Alignment,
    ) -> Result<StrictReader<'a>> {
        let start = self.head;
        let child = self.read_child_with(alignment)?;

        if child.magic != expected {
            self.head = start;
            return Err(Error::MagicMismatch {
                expected,
                found: child.magic,
            });
        }

        Ok(StrictReader { reader: child })
    }

    /// Read the next child if it carries `expected`.
    ///
    /// Returns `None`, with the head rolled back, on a magic mismatch or when
    /// no bytes remain. A child whose declared size overruns this chunk is
    /// still an error.
    pub fn read_child_strict_optional(
        &mut self,
        expected: Magic,
    ) -> Result<Option<StrictReader<'a>>> {
        if !self.has_more() {
            return Ok(None);
        }

        match self.read_child_strict(expected) {
            Ok(child) => Ok(Some(child)),
            Err(Error::MagicMismatch { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Skip `amount` bytes.
    pub fn consume(&mut self, amount: usize) -> Result<()> {
        self.take(amount, Alignment::Aligned).map(drop)
    }

    pub fn consume_unaligned(&mut self, amount: usize) -> Result<()> {
        self.take(amount, Alignment::Unaligned).map(drop)
    }

    /// Read children until one carries `wanted`.
    ///
    /// Children before the match are consumed. Fails with
    /// [`Error::ChildNotFound`] once the chunk is exhausted.
    pub fn skip_to_child(&mut self, wanted: Magic) -> Result<StrictReader<'a>> {
        while self.has_more() {
            let child = self.read_child()?;

            if child.magic == wanted {
                return Ok(StrictReader { reader: child });
            }

            tracing::trace!(parent = %self.magic, skipped = %child.magic, "skipping child chunk");
        }

        Err(Error::ChildNotFound {
            wanted,
            parent: self.magic,
        })
    }

    /// Iterate the remaining children from the current head.
    ///
    /// The iterator works on a copy; `self` is not advanced.
    pub fn children(&self) -> Children<'a> {
        Children {
            reader: *self,
            done: false,
        }
    }

    fn take(&mut self, len: usize, alignment: Alignment) -> Result<&'a [u8]> {
        let start = self.head;
        let end = start
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(Error::Overrun {
                magic: self.magic,
                offset: start,
                need: len,
                size: self.data.len(),
            })?;

        self.head = end;
        if alignment.is_aligned() {
            self.align_head();
        }

        Ok(&self.data[start..end])
    }

    fn align_head(&mut self) {
        self.head = next_multiple_of(self.head, CHUNK_ALIGNMENT);
    }
}

impl fmt::Debug for Reader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reader")
            .field("magic", &self.magic)
            .field("size", &self.data.len())
            .field("head", &self.head)
            .finish()
    }
}

/// A reader whose magic number has been checked against an expected value.
///
/// Produced by the strict child reads; dereferences to [`Reader`].
#[derive(Clone, Copy, Debug)]
pub struct StrictReader<'a> {
    reader: Reader<'a>,
}

impl<'a> StrictReader<'a> {
    /// Check `reader`'s magic number once.
    pub fn new(reader: Reader<'a>, expected: Magic) -> Result<Self> {
        if reader.magic != expected {
            return Err(Error::MagicMismatch {
                expected,
                found: reader.magic,
            });
        }
        Ok(Self { reader })
    }

    pub fn into_inner(self) -> Reader<'a> {
        self.reader
    }
}

impl<'a> Deref for StrictReader<'a> {
    type Target = Reader<'a>;

    fn deref(&self) -> &Reader<'a> {
        &self.reader
    }
}

impl<'a> DerefMut for StrictReader<'a> {
    fn deref_mut(&mut self) -> &mut Reader<'a> {
        &mut self.reader
    }
}

/// Iterator over the children of a chunk. Stops after the first error.
#[derive(Debug, Clone)]
pub struct Children<'a> {
    reader: Reader<'a>,
    done: bool,
}

impl<'a> Iterator for Children<'a> {
    type Item = Result<Reader<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || !self.reader.has_more() {
            return None;
        }

        let child = self.reader.read_child();
        self.done = child.is_err();
        Some(child)
    }
}

impl std::iter::FusedIterator for Children<'_> {}

/// A tuple of flat values readable with [`Reader::read_multi`].
pub trait ReadMulti: Sized {
    fn read_fields(reader: &mut Reader<'_>, alignments: &[Alignment]) -> Result<Self>;
}

macro_rules! impl_read_multi {
    ($($name:ident $idx:tt),+) => {
        impl<$($name: Pod),+> ReadMulti for ($($name,)+) {
            fn read_fields(reader: &mut Reader<'_>, alignments: &[Alignment]) -> Result<Self> {
                Ok(($(
                    reader.read_with::<$name>(alignments.get($idx).copied().unwrap_or_default())?,
                )+))
            }
        }
    };
}

impl_read_multi!(A 0);
impl_read_multi!(A 0, B 1);
impl_read_multi!(A 0, B 1, C 2);
impl_read_multi!(A 0, B 1, C 2, D 3);
impl_read_multi!(A 0, B 1, C 2, D 3, E 4);
impl_read_multi!(A 0, B 1, C 2, D 3, E 4, F 5);
impl_read_multi!(A 0, B 1, C 2, D 3, E 4, F 5, G 6);
impl_read_multi!(A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7);
