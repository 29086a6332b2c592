//! Opening archives and querying their metadata.
//!
//! [`Archive`] reads the headers of a 7z archive once and keeps the decoded
//! records. The source is only held while parsing; no file data is ever
//! read or decompressed.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use crate::format::files::ArchiveEntry;
use crate::format::header::SignatureHeader;
use crate::format::parser::{ArchiveMetadata, Header, HeaderParser, NextHeader};
use crate::format::streams::{Folder, StreamsInfo};
use crate::{Error, Result};

/// The decoded headers of a 7z archive.
///
/// # Example
///
/// ```rust,no_run
/// use sevenz_header::Archive;
///
/// let archive = Archive::open_path("backup.7z")?;
/// for entry in archive.entries() {
///     println!("{}: {} bytes", entry.name, entry.size);
/// }
/// # Ok::<(), sevenz_header::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Archive {
    metadata: ArchiveMetadata,
}

impl Archive {
    /// Opens and parses the archive at `path`.
    ///
    /// The file handle is closed before this returns, on success and on
    /// failure alike.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("opening {}", path.display());
        let file = File::open(path).map_err(|source| Error::Io { offset: 0, source })?;
        Self::open(BufReader::new(file))
    }

    /// Parses the archive that starts at the reader's current position.
    pub fn open<R: Read + Seek>(reader: R) -> Result<Self> {
        Self::open_with(reader, &HeaderParser::default())
    }

    /// Parses an archive with a configured parser.
    ///
    /// ```rust
    /// use sevenz_header::{Archive, HeaderParser, ResourceLimits};
    /// use std::io::Cursor;
    ///
    /// let parser = HeaderParser::with_limits(ResourceLimits::default().max_entries(100));
    /// let err = Archive::open_with(Cursor::new(b"not an archive".to_vec()), &parser);
    /// assert!(err.is_err());
    /// ```
    pub fn open_with<R: Read + Seek>(reader: R, parser: &HeaderParser) -> Result<Self> {
        let metadata = parser.parse(reader)?;
        Ok(Self { metadata })
    }

    /// Returns the signature header.
    pub fn signature(&self) -> &SignatureHeader {
        &self.metadata.signature
    }

    /// Returns the decoded next header.
    pub fn next_header(&self) -> &NextHeader {
        &self.metadata.next_header
    }

    /// Returns the plain header, or `None` if the header is encoded.
    pub fn header(&self) -> Option<&Header> {
        match &self.metadata.next_header {
            NextHeader::Plain(header) => Some(header),
            NextHeader::Encoded(_) => None,
        }
    }

    /// Returns the streams info of an encoded header.
    pub fn encoded_header(&self) -> Option<&StreamsInfo> {
        match &self.metadata.next_header {
            NextHeader::Plain(_) => None,
            NextHeader::Encoded(info) => Some(info),
        }
    }

    /// Returns true if the header is stored encoded.
    ///
    /// Entries of such archives cannot be listed without decompressing the
    /// header, so [`entries`](Self::entries) is empty.
    pub fn is_header_encoded(&self) -> bool {
        matches!(self.metadata.next_header, NextHeader::Encoded(_))
    }

    /// Returns the folders of the main streams.
    pub fn folders(&self) -> &[Folder] {
        self.header().map(Header::folders).unwrap_or_default()
    }

    /// Returns the file entries.
    pub fn entries(&self) -> &[ArchiveEntry] {
        self.header().map(Header::entries).unwrap_or_default()
    }

    /// Consumes the archive and returns the decoded records.
    pub fn into_metadata(self) -> ArchiveMetadata {
        self.metadata
    }
}

impl From<ArchiveMetadata> for Archive {
    fn from(metadata: ArchiveMetadata) -> Self {
        Self { metadata }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::Crc32;
    use crate::format::{SIGNATURE, property_id};
    use std::io::Cursor;

    fn archive_bytes(header: &[u8]) -> Vec<u8> {
        let mut region = Vec::new();
        region.extend_from_slice(&0u64.to_le_bytes());
        region.extend_from_slice(&(header.len() as u64).to_le_bytes());
        region.extend_from_slice(&Crc32::compute(header).value().to_le_bytes());

        let mut data = SIGNATURE.to_vec();
        data.extend_from_slice(&[0, 4]);
        data.extend_from_slice(&Crc32::compute(&region).value().to_le_bytes());
        data.extend_from_slice(&region);
        data.extend_from_slice(header);
        data
    }

    #[test]
    fn test_open_plain() {
        let data = archive_bytes(&[property_id::HEADER, property_id::END]);
        let archive = Archive::open(Cursor::new(data)).unwrap();

        assert!(!archive.is_header_encoded());
        assert!(archive.header().is_some());
        assert!(archive.encoded_header().is_none());
        assert!(archive.entries().is_empty());
        assert!(archive.folders().is_empty());
        assert_eq!(archive.signature().version_minor, 4);
    }

    #[test]
    fn test_open_encoded() {
        let data = archive_bytes(&[property_id::ENCODED_HEADER, property_id::END]);
        let archive = Archive::open(Cursor::new(data)).unwrap();

        assert!(archive.is_header_encoded());
        assert!(archive.header().is_none());
        assert_eq!(archive.encoded_header(), Some(&StreamsInfo::default()));
        assert!(archive.entries().is_empty());

        let metadata = archive.into_metadata();
        assert!(matches!(metadata.next_header, NextHeader::Encoded(_)));
    }

    #[test]
    fn test_open_missing_file() {
        let err = Archive::open_path("/nonexistent/archive.7z").unwrap_err();
        assert!(matches!(err, Error::Io { offset: 0, .. }));
    }
}
