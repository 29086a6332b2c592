//! # sevenz-header
//!
//! A pure-Rust reader for the metadata of 7z archives.
//!
//! This crate decodes the signature header and the next header of a 7z
//! archive: archive properties, pack and coder descriptions, substreams and
//! file entries. It never reads file data and never decompresses anything.
//! An archive whose header is itself compressed is reported as such, along
//! with the streams info describing the packed header.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sevenz_header::{Archive, Result};
//!
//! fn main() -> Result<()> {
//!     let archive = Archive::open_path("archive.7z")?;
//!
//!     println!(
//!         "7z v{}.{}",
//!         archive.signature().version_major,
//!         archive.signature().version_minor
//!     );
//!     for entry in archive.entries() {
//!         match entry.crc {
//!             Some(crc) => println!("{} {:>10} {}", crc, entry.size, entry.name),
//!             None => println!("{:8} {:>10} {}", "", entry.size, entry.name),
//!         }
//!     }
//!     for folder in archive.folders() {
//!         for coder in &folder.coders {
//!             println!("coder {:?}", coder.method_name());
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Lower-Level Parsing
//!
//! [`HeaderParser`] works on any `Read + Seek` source and returns the
//! decoded records directly:
//!
//! ```rust
//! use sevenz_header::{HeaderParser, ResourceLimits};
//! use std::io::Cursor;
//!
//! let parser = HeaderParser::with_limits(ResourceLimits::default().max_entries(10_000))
//!     .verify_next_header_crc(true);
//! let result = parser.parse(Cursor::new(vec![0u8; 32]));
//! assert!(result.is_err());
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`], which is an alias for
//! `std::result::Result<T, Error>`. Every [`Error`] carries the absolute
//! byte offset where the problem was detected:
//!
//! ```rust,no_run
//! use sevenz_header::{Archive, Error};
//!
//! fn open_archive(path: &str) -> sevenz_header::Result<()> {
//!     match Archive::open_path(path) {
//!         Ok(archive) => {
//!             println!("Opened archive with {} entries", archive.entries().len());
//!             Ok(())
//!         }
//!         Err(Error::BadSignature { found, .. }) => {
//!             eprintln!("Not a 7z file (starts with {found:02X?})");
//!             Ok(())
//!         }
//!         Err(e) if e.is_corruption() => {
//!             eprintln!("Damaged archive at offset {:#x}: {e}", e.offset());
//!             Err(e)
//!         }
//!         Err(e) => Err(e),
//!     }
//! }
//! # fn main() {}
//! ```
//!
//! ## Resource Limits
//!
//! Counts and blob sizes read from the header are checked against
//! [`ResourceLimits`] before anything is allocated.
//!
//! ## Logging
//!
//! Diagnostics are emitted through the [`log`](https://docs.rs/log) facade.
//! No logger is installed by this crate.
//!
//! ## Minimum Supported Rust Version (MSRV)
//!
//! This crate requires **Rust 1.85** or later.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

/// Chunk size used when streaming a region through CRC-32.
pub(crate) const READ_BUFFER_SIZE: usize = 8192;

pub mod archive;
pub mod checksum;
pub mod error;
pub mod format;
pub mod timestamp;

pub use archive::Archive;
pub use checksum::Digest;
pub use error::{Error, Result};
pub use format::files::{ArchiveEntry, FilesInfo};
pub use format::header::SignatureHeader;
pub use format::parser::{ArchiveMetadata, Header, HeaderParser, NextHeader, read_archive_header};
pub use format::properties::{ArchiveProperties, ArchiveProperty};
pub use format::streams::{
    BindPair, Coder, CodersInfo, Folder, PackInfo, ResourceLimits, StreamsInfo, SubStreamsInfo,
    UnpackStream,
};
pub use timestamp::Timestamp;
