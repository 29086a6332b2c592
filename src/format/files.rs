//! Files info structures for 7z archives.
//!
//! These structures describe the file entries within an archive.

use std::io::{Read, Seek};

use super::attributes;
use super::cursor::ByteCursor;
use super::property_id;
use super::reader::{PropertyTag, read_all_or_bits, read_bool_vector, read_variable_u64};
use super::streams::{ResourceLimits, UnpackStream};
use crate::checksum::Digest;
use crate::timestamp::Timestamp;
use crate::{Error, Result};

/// A single file entry in the archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// File name (path within the archive).
    pub name: String,
    /// Whether this entry has an associated data stream.
    pub has_stream: bool,
    /// Whether this is a directory.
    pub is_directory: bool,
    /// Whether this is an anti-item (for incremental backups).
    pub is_anti: bool,
    /// Uncompressed size in bytes.
    pub size: u64,
    /// CRC-32 of the uncompressed data.
    pub crc: Option<Digest>,
    /// Creation time.
    pub ctime: Option<Timestamp>,
    /// Last access time.
    pub atime: Option<Timestamp>,
    /// Last modification time.
    pub mtime: Option<Timestamp>,
    /// Windows file attributes.
    pub attributes: Option<u32>,
    /// Start position stored for the entry.
    pub start_pos: Option<u64>,
}

impl ArchiveEntry {
    /// Returns true if this entry represents a file (not a directory).
    pub fn is_file(&self) -> bool {
        !self.is_directory
    }
}

/// Files info from the archive header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilesInfo {
    /// List of file entries.
    pub entries: Vec<ArchiveEntry>,
    /// Archive comment (if any).
    pub comment: Option<String>,
}

impl FilesInfo {
    /// Parses FilesInfo from the cursor.
    ///
    /// The cursor should be positioned after the `FilesInfo` property ID.
    /// Entries that carry a stream take their size and digest from
    /// `streams`, in order.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedSection`] if a property stores its data
    ///   externally.
    /// - [`Error::CorruptHeader`] if a property does not consume exactly its
    ///   declared size, or the number of entries with streams differs from
    ///   `streams.len()`.
    pub fn parse<R: Read + Seek>(
        cursor: &mut ByteCursor<R>,
        streams: &[UnpackStream],
        limits: &ResourceLimits,
    ) -> Result<Self> {
        let start = cursor.position();
        let num_files = limits.read_count(cursor, "files")?;
        let mut entries: Vec<ArchiveEntry> = Vec::new();

        let mut empty_streams: Vec<bool> = Vec::new();
        let mut empty_files = Vec::new();
        let mut anti_items = Vec::new();
        let mut comment = None;

        loop {
            let tag = PropertyTag::read(cursor)?;
            if tag.id == property_id::END {
                break;
            }

            let size_offset = cursor.position();
            let size = read_variable_u64(cursor)?;
            limits.check_bytes(size_offset, size, "file property")?;
            let body = cursor.position();
            let num_empty = empty_streams.iter().filter(|&&empty| empty).count();

            match tag.id {
                property_id::EMPTY_STREAM => {
                    empty_streams = read_bool_vector(cursor, num_files)?;
                }
                property_id::EMPTY_FILE => {
                    empty_files = read_bool_vector(cursor, num_empty)?;
                }
                property_id::ANTI => {
                    anti_items = read_bool_vector(cursor, num_empty)?;
                }
                property_id::NAME => {
                    expect_inline(cursor, "external file names")?;
                    for index in 0..num_files {
                        let name = read_utf16le_string(cursor)?;
                        entry_at(&mut entries, index).name = name;
                    }
                }
                property_id::CTIME => {
                    read_defined(cursor, &mut entries, num_files, "external creation times", |c, e| {
                        e.ctime = Some(Timestamp::from_filetime(c.read_u64_le()?));
                        Ok(())
                    })?;
                }
                property_id::ATIME => {
                    read_defined(cursor, &mut entries, num_files, "external access times", |c, e| {
                        e.atime = Some(Timestamp::from_filetime(c.read_u64_le()?));
                        Ok(())
                    })?;
                }
                property_id::MTIME => {
                    read_defined(cursor, &mut entries, num_files, "external modification times", |c, e| {
                        e.mtime = Some(Timestamp::from_filetime(c.read_u64_le()?));
                        Ok(())
                    })?;
                }
                property_id::WIN_ATTRIBUTES => {
                    read_defined(cursor, &mut entries, num_files, "external attributes", |c, e| {
                        e.attributes = Some(c.read_u32_le()?);
                        Ok(())
                    })?;
                }
                property_id::START_POS => {
                    read_defined(cursor, &mut entries, num_files, "external start positions", |c, e| {
                        e.start_pos = Some(c.read_u64_le()?);
                        Ok(())
                    })?;
                }
                property_id::COMMENT => {
                    expect_inline(cursor, "external comment")?;
                    comment = Some(read_utf16le_string(cursor)?);
                }
                property_id::DUMMY => {
                    cursor.skip(size)?;
                }
                other => {
                    log::warn!(
                        "skipping unknown file property {other:#04x} ({size} bytes) at offset {:#x}",
                        tag.offset
                    );
                    cursor.skip(size)?;
                }
            }

            let consumed = cursor.position() - body;
            if consumed != size {
                return Err(Error::corrupt_header(
                    body,
                    format!(
                        "file property {} declares {size} bytes but holds {consumed}",
                        property_id::name(tag.id).unwrap_or("unknown")
                    ),
                ));
            }
            log::trace!(
                "file property {}: {size} bytes",
                property_id::name(tag.id).unwrap_or("unknown")
            );
        }

        let num_empty = empty_streams.iter().filter(|&&empty| empty).count();
        let with_streams = num_files - num_empty;
        if with_streams != streams.len() {
            return Err(Error::corrupt_header(
                start,
                format!(
                    "{with_streams} files have data but the archive describes {} streams",
                    streams.len()
                ),
            ));
        }
        entries.resize_with(num_files, ArchiveEntry::default);

        let mut empty_index = 0;
        for (index, entry) in entries.iter_mut().enumerate() {
            let is_empty = empty_streams.get(index).copied().unwrap_or(false);
            entry.has_stream = !is_empty;
            if is_empty {
                let is_empty_file = empty_files.get(empty_index).copied().unwrap_or(false);
                entry.is_directory = !is_empty_file;
                entry.is_anti = anti_items.get(empty_index).copied().unwrap_or(false);
                empty_index += 1;
            }
            if entry
                .attributes
                .is_some_and(|attrs| attrs & attributes::DIRECTORY != 0)
            {
                entry.is_directory = true;
            }
        }

        for (entry, stream) in entries.iter_mut().filter(|e| e.has_stream).zip(streams) {
            entry.size = stream.size;
            entry.crc = stream.digest;
        }

        log::debug!("files info: {} entries", entries.len());
        Ok(Self { entries, comment })
    }

    /// Returns the number of files.
    pub fn num_files(&self) -> usize {
        self.entries.len()
    }

    /// Returns the archive comment, if any.
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Returns entries that have data streams (non-empty files).
    pub fn files_with_streams(&self) -> impl Iterator<Item = &ArchiveEntry> {
        self.entries.iter().filter(|e| e.has_stream)
    }

    /// Returns directory entries.
    pub fn directories(&self) -> impl Iterator<Item = &ArchiveEntry> {
        self.entries.iter().filter(|e| e.is_directory)
    }

    /// Returns anti-item entries (marked for deletion in incremental backups).
    pub fn anti_items(&self) -> impl Iterator<Item = &ArchiveEntry> {
        self.entries.iter().filter(|e| e.is_anti)
    }
}

/// Maximum length for UTF-16LE strings read from archives (in code units).
const MAX_UTF16_STRING_LENGTH: usize = 32768;

/// Reads the `external` byte that precedes inline property data.
fn expect_inline<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    section: &'static str,
) -> Result<()> {
    let offset = cursor.position();
    if cursor.read_byte()? != 0 {
        return Err(Error::UnsupportedSection { offset, section });
    }
    Ok(())
}

/// Reads a UTF-16LE null-terminated string.
fn read_utf16le_string<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> Result<String> {
    let offset = cursor.position();
    let mut units = Vec::new();

    loop {
        let unit = u16::from_le_bytes(cursor.read_array()?);
        if unit == 0 {
            break;
        }
        if units.len() >= MAX_UTF16_STRING_LENGTH {
            return Err(Error::limit_exceeded(
                offset,
                format!("string longer than {MAX_UTF16_STRING_LENGTH} UTF-16 code units"),
            ));
        }
        units.push(unit);
    }

    String::from_utf16(&units).map_err(|_| Error::corrupt_header(offset, "invalid UTF-16 string"))
}

/// Returns entry `index`, creating default entries up to it.
fn entry_at(entries: &mut Vec<ArchiveEntry>, index: usize) -> &mut ArchiveEntry {
    if entries.len() <= index {
        entries.resize_with(index + 1, ArchiveEntry::default);
    }
    &mut entries[index]
}

/// Reads a defined-vector over `num_files` entries, the `external` byte,
/// then one value per defined entry.
fn read_defined<R, F>(
    cursor: &mut ByteCursor<R>,
    entries: &mut Vec<ArchiveEntry>,
    num_files: usize,
    section: &'static str,
    mut read_value: F,
) -> Result<()>
where
    R: Read + Seek,
    F: FnMut(&mut ByteCursor<R>, &mut ArchiveEntry) -> Result<()>,
{
    let defined = read_all_or_bits(cursor, num_files)?;
    expect_inline(cursor, section)?;

    for index in 0..num_files {
        if defined.as_ref().is_none_or(|bits| bits[index]) {
            read_value(cursor, entry_at(entries, index))?;
        }
    }
    Ok(())
}
