//! Error types for 7z header parsing.
//!
//! This module provides the [`Error`] enum which represents every way a
//! header parse can fail, along with a convenient [`Result<T>`] type alias.
//!
//! Every variant records the absolute byte offset at which the problem was
//! detected, so a failure can be located in a hex dump of the archive.
//!
//! # Example
//!
//! ```rust,no_run
//! use sevenz_header::{Archive, Error};
//!
//! match Archive::open_path("archive.7z") {
//!     Ok(archive) => println!("version {}", archive.signature().version_minor),
//!     Err(Error::BadSignature { .. }) => eprintln!("not a 7z archive"),
//!     Err(e) if e.is_corruption() => {
//!         eprintln!("archive damaged at byte {:#x}: {}", e.offset(), e)
//!     }
//!     Err(e) => eprintln!("error: {}", e),
//! }
//! ```

use std::io;

use crate::checksum::Digest;

/// The error type for 7z header parsing.
///
/// Errors fall into a few groups:
///
/// | Category | Variants |
/// |----------|----------|
/// | Input | [`Io`][Self::Io], [`Truncated`][Self::Truncated] |
/// | Format | [`BadSignature`][Self::BadSignature], [`UnexpectedTag`][Self::UnexpectedTag], [`CorruptHeader`][Self::CorruptHeader] |
/// | Integrity | [`ChecksumMismatch`][Self::ChecksumMismatch] |
/// | Compatibility | [`UnsupportedSection`][Self::UnsupportedSection] |
/// | Resources | [`ResourceLimitExceeded`][Self::ResourceLimitExceeded] |
///
/// None of these are retried internally: the first failure aborts the parse
/// and no partial header is returned.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The underlying byte source reported an I/O failure.
    ///
    /// End-of-file is reported as [`Truncated`][Self::Truncated] instead.
    #[error("I/O error at offset {offset:#x}: {source}")]
    Io {
        /// Offset of the read or seek that failed.
        offset: u64,
        /// The error returned by the byte source.
        #[source]
        source: io::Error,
    },

    /// Fewer bytes remained than a field requires.
    #[error("Truncated input at offset {offset:#x}: needed {needed} bytes")]
    Truncated {
        /// Offset where the incomplete field starts.
        offset: u64,
        /// Size of the field that could not be read.
        needed: u64,
    },

    /// The first six bytes are not the 7z magic `37 7A BC AF 27 1C`.
    #[error("Bad 7z signature at offset {offset:#x}: found {found:02X?}")]
    BadSignature {
        /// Offset of the signature.
        offset: u64,
        /// The bytes found instead of the magic.
        found: [u8; 6],
    },

    /// A CRC-32 stored in the archive does not match the covered bytes.
    ///
    /// Raised for the start header region and the next header. Both digests
    /// display as 8 uppercase hexadecimal digits.
    #[error("Checksum mismatch at offset {offset:#x}: expected {expected}, actual {actual}")]
    ChecksumMismatch {
        /// Offset of the first byte covered by the checksum.
        offset: u64,
        /// The digest stored in the archive.
        expected: Digest,
        /// The digest computed over the data.
        actual: Digest,
    },

    /// A property ID did not match any tag valid at that point of the header.
    #[error("Unexpected property ID {actual:#04x} at offset {offset:#x}: expected {expected}")]
    UnexpectedTag {
        /// Offset of the tag byte.
        offset: u64,
        /// What the grammar allowed at this position.
        expected: &'static str,
        /// The tag byte found.
        actual: u8,
    },

    /// A recognized section stores its data outside the header.
    ///
    /// This is distinct from corruption: the archive may be valid, but
    /// reading the section would require decoding packed streams.
    #[error("Unsupported section at offset {offset:#x}: {section}")]
    UnsupportedSection {
        /// Offset where the section was detected.
        offset: u64,
        /// Name of the section.
        section: &'static str,
    },

    /// A structural invariant of the header does not hold.
    ///
    /// Examples are a coder flag byte with bit 7 set, a bind pair pointing
    /// outside its folder, or substream sizes larger than their folder.
    #[error("Corrupt header at offset {offset:#x}: {reason}")]
    CorruptHeader {
        /// The byte offset where corruption was detected.
        offset: u64,
        /// A description of the corruption.
        reason: String,
    },

    /// A count or size in the header exceeds the configured limits.
    ///
    /// Adjust limits using [`ResourceLimits`]:
    ///
    /// ```rust
    /// use sevenz_header::ResourceLimits;
    ///
    /// let limits = ResourceLimits::default().max_entries(10_000);
    /// ```
    ///
    /// [`ResourceLimits`]: crate::format::streams::ResourceLimits
    #[error("Resource limit exceeded at offset {offset:#x}: {reason}")]
    ResourceLimitExceeded {
        /// Offset of the field carrying the oversized value.
        offset: u64,
        /// Which limit was exceeded.
        reason: String,
    },
}

impl Error {
    /// Returns the byte offset at which this error was detected.
    pub fn offset(&self) -> u64 {
        match self {
            Error::Io { offset, .. }
            | Error::Truncated { offset, .. }
            | Error::BadSignature { offset, .. }
            | Error::ChecksumMismatch { offset, .. }
            | Error::UnexpectedTag { offset, .. }
            | Error::UnsupportedSection { offset, .. }
            | Error::CorruptHeader { offset, .. }
            | Error::ResourceLimitExceeded { offset, .. } => *offset,
        }
    }

    /// Returns `true` if this is a data corruption error.
    ///
    /// Corruption errors indicate the header bytes are damaged, as opposed
    /// to a short file, an I/O failure, or an unsupported layout.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Error::ChecksumMismatch { .. }
                | Error::UnexpectedTag { .. }
                | Error::CorruptHeader { .. }
        )
    }

    /// Returns `true` if the archive uses a layout this crate does not read.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Error::UnsupportedSection { .. })
    }

    /// Creates a CorruptHeader error.
    pub fn corrupt_header(offset: u64, reason: impl Into<String>) -> Self {
        Error::CorruptHeader {
            offset,
            reason: reason.into(),
        }
    }

    /// Creates a ResourceLimitExceeded error.
    pub fn limit_exceeded(offset: u64, reason: impl Into<String>) -> Self {
        Error::ResourceLimitExceeded {
            offset,
            reason: reason.into(),
        }
    }

    /// Wraps an I/O error raised at `offset`.
    ///
    /// `UnexpectedEof` becomes [`Error::Truncated`] so that callers see one
    /// variant for short input regardless of the byte source.
    pub(crate) fn from_io(offset: u64, needed: u64, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::UnexpectedEof {
            Error::Truncated { offset, needed }
        } else {
            Error::Io { offset, source }
        }
    }
}

/// A specialized Result type for header parsing.
///
/// This is defined as `std::result::Result<T, Error>` for convenience.
pub type Result<T> = std::result::Result<T, Error>;
