//! Output targets for [`Writer`](crate::Writer).

use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use bytes::{BufMut, BytesMut};

use crate::error::{Error, Result};

/// Append-only byte sink that supports overwriting bytes it already holds.
pub trait Sink {
    /// Number of bytes written so far.
    fn position(&self) -> u64;

    /// Append bytes.
    fn write(&mut self, bytes: &[u8]) -> Result<()>;

    /// Overwrite previously written bytes without moving the append position.
    fn write_at(&mut self, position: u64, bytes: &[u8]) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

fn patch_range(len: usize, position: u64, count: usize) -> Result<std::ops::Range<usize>> {
    let start = usize::try_from(position).unwrap_or(usize::MAX);
    match start.checked_add(count) {
        Some(end) if end <= len => Ok(start..end),
        _ => Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("patch of {count} bytes at {position} is past the end of {len} written bytes"),
        ))),
    }
}

impl Sink for Vec<u8> {
    fn position(&self) -> u64 {
        self.len() as u64
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.extend_from_slice(bytes);
        Ok(())
    }

    fn write_at(&mut self, position: u64, bytes: &[u8]) -> Result<()> {
        let range = patch_range(self.len(), position, bytes.len())?;
        self[range].copy_from_slice(bytes);
        Ok(())
    }
}

impl Sink for BytesMut {
    fn position(&self) -> u64 {
        self.len() as u64
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.put_slice(bytes);
        Ok(())
    }

    fn write_at(&mut self, position: u64, bytes: &[u8]) -> Result<()> {
        let range = patch_range(self.len(), position, bytes.len())?;
        self[range].copy_from_slice(bytes);
        Ok(())
    }
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn position(&self) -> u64 {
        (**self).position()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write(bytes)
    }

    fn write_at(&mut self, position: u64, bytes: &[u8]) -> Result<()> {
        (**self).write_at(position, bytes)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// Sink over any seekable stream, such as a file.
#[derive(Debug)]
pub struct StreamSink<W> {
    inner: W,
    start: u64,
    position: u64,
}

impl<W: Write + Seek> StreamSink<W> {
    /// Wrap a stream. Output begins at the stream's current position.
    pub fn new(mut inner: W) -> Result<Self> {
        let start = inner.stream_position()?;
        Ok(Self {
            inner,
            start,
            position: 0,
        })
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write + Seek> Sink for StreamSink<W> {
    fn position(&self) -> u64 {
        self.position
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        self.position += bytes.len() as u64;
        Ok(())
    }

    fn write_at(&mut self, position: u64, bytes: &[u8]) -> Result<()> {
        if position + bytes.len() as u64 > self.position {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "patch is past the end of the stream",
            )));
        }

        self.inner.seek(SeekFrom::Start(self.start + position))?;
        self.inner.write_all(bytes)?;
        self.inner.seek(SeekFrom::Start(self.start + self.position))?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }
}

/// Sink that discards bytes and only counts them.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink {
    len: u64,
}

impl NullSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Sink for NullSink {
    fn position(&self) -> u64 {
        self.len
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.len += bytes.len() as u64;
        Ok(())
    }

    fn write_at(&mut self, _position: u64, _bytes: &[u8]) -> Result<()> {
        Ok(())
    }
}

/// Open `path` for output, truncating any existing file.
pub fn create_file(path: impl AsRef<Path>) -> Result<StreamSink<BufWriter<File>>> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| Error::Create {
        path: path.to_path_buf(),
        source,
    })?;
    StreamSink::new(BufWriter::new(file))
}
