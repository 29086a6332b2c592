//! Position-tracking reader over a seekable byte source.

use std::io::{Read, Seek, SeekFrom};

use crate::checksum::{Crc32, Digest};
use crate::{Error, READ_BUFFER_SIZE, Result};

/// Sequential reader over `Read + Seek` that knows its absolute offset.
///
/// All header decoding goes through this type so that every error can
/// report where it happened. Short reads surface as [`Error::Truncated`]
/// at the offset where the field begins; other I/O failures surface as
/// [`Error::Io`].
#[derive(Debug)]
pub struct ByteCursor<R> {
    inner: R,
    pos: u64,
}

impl<R: Read + Seek> ByteCursor<R> {
    /// Wraps `inner`, starting at its current stream position.
    ///
    /// # Errors
    ///
    /// Returns an error if the current position cannot be queried.
    pub fn new(mut inner: R) -> Result<Self> {
        let pos = inner
            .stream_position()
            .map_err(|e| Error::from_io(0, 0, e))?;
        Ok(Self { inner, pos })
    }

    /// Returns the absolute offset of the next byte to be read.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Unwraps the cursor, returning the byte source.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Reads exactly `n` bytes.
    ///
    /// The buffer grows with the bytes actually read rather than with `n`.
    pub fn read_exact(&mut self, n: usize) -> Result<Vec<u8>> {
        let offset = self.pos;
        let needed = n as u64;
        let mut buf = Vec::new();
        (&mut self.inner)
            .take(needed)
            .read_to_end(&mut buf)
            .map_err(|e| Error::from_io(offset, needed, e))?;
        self.pos += buf.len() as u64;
        if buf.len() < n {
            return Err(Error::Truncated { offset, needed });
        }
        Ok(buf)
    }

    /// Reads a fixed-size array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    /// Reads a single byte.
    pub fn read_byte(&mut self) -> Result<u8> {
        let [b] = self.read_array::<1>()?;
        Ok(b)
    }

    /// Reads a byte and interprets any non-zero value as `true`.
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_byte()? != 0)
    }

    /// Reads an unsigned 32-bit little-endian integer.
    pub fn read_u32_le(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    /// Reads an unsigned 64-bit little-endian integer.
    pub fn read_u64_le(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// Reads a stored CRC-32.
    pub fn read_digest(&mut self) -> Result<Digest> {
        Ok(Digest::from_le_bytes(self.read_array()?))
    }

    /// Moves the cursor by `delta` bytes relative to the current position.
    pub fn seek_relative(&mut self, delta: i64) -> Result<()> {
        let offset = self.pos;
        self.pos = self
            .inner
            .seek(SeekFrom::Current(delta))
            .map_err(|e| Error::from_io(offset, 0, e))?;
        Ok(())
    }

    /// Moves the cursor to an absolute offset.
    pub fn seek_to(&mut self, offset: u64) -> Result<()> {
        let from = self.pos;
        self.pos = self
            .inner
            .seek(SeekFrom::Start(offset))
            .map_err(|e| Error::from_io(from, 0, e))?;
        Ok(())
    }

    /// Skips `n` bytes that must exist in the source.
    ///
    /// Unlike [`seek_relative`](Self::seek_relative) this reads the bytes,
    /// so skipping past the end of the source is reported as truncation.
    pub fn skip(&mut self, n: u64) -> Result<()> {
        let offset = self.pos;
        let copied = std::io::copy(&mut (&mut self.inner).take(n), &mut std::io::sink())
            .map_err(|e| Error::from_io(offset, n, e))?;
        self.pos += copied;
        if copied < n {
            return Err(Error::Truncated { offset, needed: n });
        }
        Ok(())
    }

    /// Computes the CRC-32 of the next `len` bytes, consuming them.
    ///
    /// The region is streamed in bounded chunks, so `len` does not need to
    /// fit in memory.
    pub fn checksum_region(&mut self, len: u64) -> Result<Digest> {
        let offset = self.pos;
        let mut crc = Crc32::new();
        let mut buffer = [0u8; READ_BUFFER_SIZE];
        let mut remaining = len;
        while remaining > 0 {
            let chunk = remaining.min(READ_BUFFER_SIZE as u64) as usize;
            self.inner
                .read_exact(&mut buffer[..chunk])
                .map_err(|e| Error::from_io(offset, len, e))?;
            crc.update(&buffer[..chunk]);
            self.pos += chunk as u64;
            remaining -= chunk as u64;
        }
        Ok(crc.finalize())
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        let offset = self.pos;
        self.inner
            .read_exact(buf)
            .map_err(|e| Error::from_io(offset, buf.len() as u64, e))?;
        self.pos += buf.len() as u64;
        Ok(())
    }
}
