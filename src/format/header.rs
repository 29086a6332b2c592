//! The fixed 32-byte signature header at the start of every 7z archive.

use std::io::{Read, Seek};

use super::cursor::ByteCursor;
use super::{SIGNATURE, SIGNATURE_HEADER_SIZE, START_HEADER_OFFSET, START_HEADER_SIZE};
use crate::checksum::{self, Digest};
use crate::{Error, Result};

/// The signature header of a 7z archive.
///
/// This is the first structure in a 7z file. It locates the next header,
/// which holds all remaining metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Archive format version - major number.
    pub version_major: u8,
    /// Archive format version - minor number.
    pub version_minor: u8,
    /// CRC of the following 20 bytes (offset, size, crc).
    pub start_header_crc: Digest,
    /// Offset from the end of the signature header to the next header.
    pub next_header_offset: u64,
    /// Size of the next header (compressed if encoded).
    pub next_header_size: u64,
    /// CRC of the next header data.
    pub next_header_crc: Digest,
}

impl SignatureHeader {
    /// Parses the signature header at the cursor.
    ///
    /// The version is stored but not validated, so archives written by
    /// newer tools are still read.
    ///
    /// # Errors
    ///
    /// - [`Error::BadSignature`] if the first 6 bytes are not the 7z magic;
    ///   nothing past those bytes is read.
    /// - [`Error::ChecksumMismatch`] if the start header CRC does not match
    ///   the 20-byte region at offset 12.
    /// - [`Error::Truncated`] if the source is shorter than 32 bytes.
    pub fn parse<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> Result<Self> {
        let base = cursor.position();

        let found: [u8; 6] = cursor.read_array()?;
        if found != *SIGNATURE {
            return Err(Error::BadSignature {
                offset: base,
                found,
            });
        }

        let version_major = cursor.read_byte()?;
        let version_minor = cursor.read_byte()?;
        let start_header_crc = cursor.read_digest()?;

        let region: [u8; START_HEADER_SIZE] = cursor.read_array()?;
        checksum::verify(&region, start_header_crc, base + START_HEADER_OFFSET)?;

        let [o0, o1, o2, o3, o4, o5, o6, o7, s0, s1, s2, s3, s4, s5, s6, s7, c0, c1, c2, c3] =
            region;
        let next_header_offset = u64::from_le_bytes([o0, o1, o2, o3, o4, o5, o6, o7]);
        let next_header_size = u64::from_le_bytes([s0, s1, s2, s3, s4, s5, s6, s7]);
        let next_header_crc = Digest::from_le_bytes([c0, c1, c2, c3]);

        log::debug!(
            "7z signature header v{}.{}: next header at +{} ({} bytes, crc {})",
            version_major,
            version_minor,
            next_header_offset,
            next_header_size,
            next_header_crc
        );

        Ok(Self {
            version_major,
            version_minor,
            start_header_crc,
            next_header_offset,
            next_header_size,
            next_header_crc,
        })
    }

    /// Returns the absolute position of the next header.
    ///
    /// Returns `None` if the stored offset overflows a 64-bit position.
    pub fn next_header_position(&self) -> Option<u64> {
        SIGNATURE_HEADER_SIZE.checked_add(self.next_header_offset)
    }
}
