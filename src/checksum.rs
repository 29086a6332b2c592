//! CRC-32 computation and verification for header regions.
//!
//! 7z protects its start header, its next header, and (optionally) every
//! packed stream, folder and substream with a CRC-32 using the IEEE 802.3
//! polynomial. Stored values are 4 little-endian bytes.
//!
//! # Example
//!
//! ```rust
//! use sevenz_header::checksum::{Crc32, Digest};
//!
//! let mut crc = Crc32::new();
//! crc.update(b"Hello, ");
//! crc.update(b"World!");
//! assert_eq!(crc.finalize(), Digest(0xEC4AC3D0));
//! assert_eq!(Digest(0x1A2).to_string(), "000001A2");
//! ```

use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// A CRC-32 value as stored in or computed over an archive.
///
/// Displays as exactly 8 uppercase hexadecimal digits, zero-padded on the
/// left, which is the form used in error messages and listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Digest(pub u32);

impl Digest {
    /// Interprets 4 bytes in archive order (little-endian).
    ///
    /// This is the same value as reversing the file bytes and reading them
    /// as a big-endian integer.
    pub fn from_le_bytes(bytes: [u8; 4]) -> Self {
        Digest(u32::from_le_bytes(bytes))
    }

    /// Returns the raw checksum value.
    pub fn value(self) -> u32 {
        self.0
    }

    /// Renders the digest as 8 uppercase hexadecimal digits.
    pub fn to_hex(self) -> String {
        self.to_string()
    }

    /// Parses an 8-digit hexadecimal rendering, in either case.
    pub fn from_hex(s: &str) -> Option<Self> {
        if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        u32::from_str_radix(s, 16).ok().map(Digest)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}", self.0)
    }
}

impl From<u32> for Digest {
    fn from(value: u32) -> Self {
        Digest(value)
    }
}

/// Error returned when a string is not an 8-digit hexadecimal digest.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("digest must be exactly 8 hexadecimal digits")]
pub struct ParseDigestError;

impl FromStr for Digest {
    type Err = ParseDigestError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Digest::from_hex(s).ok_or(ParseDigestError)
    }
}

/// Incremental CRC-32 calculator.
#[derive(Clone, Default)]
pub struct Crc32 {
    hasher: crc32fast::Hasher,
}

impl fmt::Debug for Crc32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Crc32")
            .field("current", &self.finalize())
            .finish()
    }
}

impl Crc32 {
    /// Creates a new calculator.
    pub fn new() -> Self {
        Self {
            hasher: crc32fast::Hasher::new(),
        }
    }

    /// Feeds more data into the checksum.
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Returns the checksum of everything fed so far.
    pub fn finalize(&self) -> Digest {
        Digest(self.hasher.clone().finalize())
    }

    /// Resets the calculator to its initial state.
    pub fn reset(&mut self) {
        self.hasher.reset();
    }

    /// Computes the checksum of a single slice in one call.
    pub fn compute(data: &[u8]) -> Digest {
        Digest(crc32fast::hash(data))
    }
}

/// Verifies that `data` has the CRC-32 `expected`.
///
/// `offset` is the archive position of the first byte of `data` and is
/// reported in the error on mismatch.
///
/// # Errors
///
/// Returns [`Error::ChecksumMismatch`] carrying both digests when the
/// computed value differs.
pub fn verify(data: &[u8], expected: Digest, offset: u64) -> Result<()> {
    let actual = Crc32::compute(data);
    if actual == expected {
        Ok(())
    } else {
        Err(Error::ChecksumMismatch {
            offset,
            expected,
            actual,
        })
    }
}
