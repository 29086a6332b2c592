//! Main header parser for 7z archives.
//!
//! This module drives the tag-based decoding of the next header. Plain
//! headers are decoded completely; for encoded headers only the streams
//! info describing the packed header is recorded.

use std::io::{Read, Seek};

use super::cursor::ByteCursor;
use super::files::{ArchiveEntry, FilesInfo};
use super::header::SignatureHeader;
use super::properties::ArchiveProperties;
use super::property_id;
use super::reader::PropertyTag;
use super::streams::{Folder, ResourceLimits, StreamsInfo};
use crate::{Error, Result};

/// A decoded plain header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    /// Archive-level properties.
    pub archive_properties: Option<ArchiveProperties>,
    /// Streams holding additional header data.
    pub additional_streams: Option<StreamsInfo>,
    /// Streams holding the file data.
    pub main_streams: Option<StreamsInfo>,
    /// File metadata.
    pub files_info: Option<FilesInfo>,
}

impl Header {
    /// Returns all file entries.
    pub fn entries(&self) -> &[ArchiveEntry] {
        self.files_info
            .as_ref()
            .map(|f| f.entries.as_slice())
            .unwrap_or_default()
    }

    /// Returns the folders of the main streams.
    pub fn folders(&self) -> &[Folder] {
        self.main_streams
            .as_ref()
            .map(StreamsInfo::folders)
            .unwrap_or_default()
    }

    fn parse<R: Read + Seek>(cursor: &mut ByteCursor<R>, limits: &ResourceLimits) -> Result<Self> {
        let mut tag = PropertyTag::read(cursor)?;

        let archive_properties = if tag.id == property_id::ARCHIVE_PROPERTIES {
            log::debug!("ArchiveProperties at {:#x}", tag.offset);
            let props = ArchiveProperties::parse(cursor, limits)?;
            tag = PropertyTag::read(cursor)?;
            Some(props)
        } else {
            None
        };

        let additional_streams = if tag.id == property_id::ADDITIONAL_STREAMS_INFO {
            log::debug!("AdditionalStreamsInfo at {:#x}", tag.offset);
            let info = StreamsInfo::parse(cursor, limits)?;
            tag = PropertyTag::read(cursor)?;
            Some(info)
        } else {
            None
        };

        let main_streams = if tag.id == property_id::MAIN_STREAMS_INFO {
            log::debug!("MainStreamsInfo at {:#x}", tag.offset);
            let info = StreamsInfo::parse(cursor, limits)?;
            tag = PropertyTag::read(cursor)?;
            Some(info)
        } else {
            None
        };

        let files_info = if tag.id == property_id::FILES_INFO {
            log::debug!("FilesInfo at {:#x}", tag.offset);
            let streams = main_streams
                .as_ref()
                .map(StreamsInfo::unpack_streams)
                .unwrap_or_default();
            let info = FilesInfo::parse(cursor, &streams, limits)?;
            tag = PropertyTag::read(cursor)?;
            Some(info)
        } else {
            None
        };

        tag.expect(
            property_id::END,
            "ArchiveProperties, AdditionalStreamsInfo, MainStreamsInfo, FilesInfo or End",
        )?;

        Ok(Self {
            archive_properties,
            additional_streams,
            main_streams,
            files_info,
        })
    }
}

/// The structure found at the next header position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextHeader {
    /// A plain header.
    Plain(Header),
    /// An encoded header: the streams info that describes where the packed
    /// header lives and how it was coded.
    Encoded(StreamsInfo),
}

/// Everything read from an archive's headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMetadata {
    /// The fixed signature header.
    pub signature: SignatureHeader,
    /// The decoded next header.
    pub next_header: NextHeader,
}

/// Header parser with resource limit enforcement.
#[derive(Debug, Clone)]
pub struct HeaderParser {
    limits: ResourceLimits,
    verify_next_header_crc: bool,
}

impl HeaderParser {
    /// Creates a new header parser with default limits.
    pub fn new() -> Self {
        Self::with_limits(ResourceLimits::default())
    }

    /// Creates a new header parser with custom limits.
    pub fn with_limits(limits: ResourceLimits) -> Self {
        Self {
            limits,
            verify_next_header_crc: false,
        }
    }

    /// Enables or disables verification of the next header CRC.
    ///
    /// Disabled by default: the next header size and CRC stored in the
    /// start header are recorded but not trusted. When enabled, the size is
    /// checked against [`ResourceLimits::max_header_bytes`] and the header
    /// region is read twice.
    pub fn verify_next_header_crc(mut self, verify: bool) -> Self {
        self.verify_next_header_crc = verify;
        self
    }

    /// Returns the configured limits.
    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }

    /// Parses the headers of the archive that starts at the reader's
    /// current position.
    ///
    /// # Errors
    ///
    /// Any malformed or truncated structure aborts the parse; see
    /// [`Error`] for the variants.
    pub fn parse<R: Read + Seek>(&self, reader: R) -> Result<ArchiveMetadata> {
        let mut cursor = ByteCursor::new(reader)?;
        let signature = SignatureHeader::parse(&mut cursor)?;

        let seek_offset = cursor.position();
        let delta = i64::try_from(signature.next_header_offset).map_err(|_| {
            Error::corrupt_header(
                seek_offset,
                format!(
                    "next header offset {} is out of range",
                    signature.next_header_offset
                ),
            )
        })?;
        cursor.seek_relative(delta)?;
        let header_pos = cursor.position();

        if self.verify_next_header_crc && signature.next_header_size > 0 {
            self.limits.check_bytes(
                header_pos,
                signature.next_header_size,
                "next header",
            )?;
            let actual = cursor.checksum_region(signature.next_header_size)?;
            if actual != signature.next_header_crc {
                return Err(Error::ChecksumMismatch {
                    offset: header_pos,
                    expected: signature.next_header_crc,
                    actual,
                });
            }
            cursor.seek_to(header_pos)?;
        }

        let tag = PropertyTag::read(&mut cursor)?;
        let next_header = match tag.id {
            property_id::HEADER => {
                log::debug!("plain header at {header_pos:#x}");
                NextHeader::Plain(Header::parse(&mut cursor, &self.limits)?)
            }
            property_id::ENCODED_HEADER => {
                log::debug!("encoded header at {header_pos:#x}");
                NextHeader::Encoded(StreamsInfo::parse(&mut cursor, &self.limits)?)
            }
            _ => return Err(tag.unexpected("Header or EncodedHeader")),
        };

        Ok(ArchiveMetadata {
            signature,
            next_header,
        })
    }
}

impl Default for HeaderParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads a complete 7z archive's headers with default settings.
///
/// This is the main entry point for parsing a 7z file.
pub fn read_archive_header<R: Read + Seek>(reader: R) -> Result<ArchiveMetadata> {
    HeaderParser::new().parse(reader)
}

#[cfg(test)]
#[allow(clippy::vec_init_then_push)]
mod tests {
    use super::*;
    use crate::checksum::{Crc32, Digest};
    use crate::format::SIGNATURE;
    use std::io::Cursor;

    fn write_variable_u64(buf: &mut Vec<u8>, value: u64) {
        use super::super::reader::write_variable_u64;
        write_variable_u64(buf, value).unwrap();
    }

    /// Builds an archive with `gap` filler bytes between the signature
    /// header and `header`.
    fn archive(gap: usize, header: &[u8]) -> Vec<u8> {
        let mut region = Vec::with_capacity(20);
        region.extend_from_slice(&(gap as u64).to_le_bytes());
        region.extend_from_slice(&(header.len() as u64).to_le_bytes());
        region.extend_from_slice(&Crc32::compute(header).value().to_le_bytes());

        let mut data = Vec::new();
        data.extend_from_slice(SIGNATURE);
        data.extend_from_slice(&[0, 4]);
        data.extend_from_slice(&Crc32::compute(&region).value().to_le_bytes());
        data.extend_from_slice(&region);
        data.resize(32 + gap, 0xEE);
        data.extend_from_slice(header);
        data
    }

    fn parse(data: Vec<u8>) -> Result<ArchiveMetadata> {
        read_archive_header(Cursor::new(data))
    }

    fn plain(metadata: ArchiveMetadata) -> Header {
        match metadata.next_header {
            NextHeader::Plain(header) => header,
            other => panic!("expected plain header, got {other:?}"),
        }
    }

    #[test]
    fn test_minimal_header() {
        let header = plain(parse(archive(0, &[property_id::HEADER, property_id::END])).unwrap());
        assert_eq!(header, Header::default());
        assert!(header.entries().is_empty());
        assert!(header.folders().is_empty());
    }

    #[test]
    fn test_header_after_gap() {
        let metadata = parse(archive(100, &[property_id::HEADER, property_id::END])).unwrap();
        assert_eq!(metadata.signature.next_header_offset, 100);
        assert_eq!(metadata.signature.next_header_position(), Some(132));
        plain(metadata);
    }

    #[test]
    fn test_invalid_header_tag() {
        let err = parse(archive(0, &[0xFF, property_id::END])).unwrap_err();
        match err {
            Error::UnexpectedTag {
                offset,
                expected,
                actual,
            } => {
                assert_eq!(offset, 32);
                assert_eq!(expected, "Header or EncodedHeader");
                assert_eq!(actual, 0xFF);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_header_with_streams() {
        let mut data = Vec::new();
        data.push(property_id::HEADER);
        data.push(property_id::MAIN_STREAMS_INFO);
        data.push(property_id::PACK_INFO);
        write_variable_u64(&mut data, 0); // pack_pos
        write_variable_u64(&mut data, 1); // 1 stream
        data.push(property_id::SIZE);
        write_variable_u64(&mut data, 1000);
        data.push(property_id::END);
        data.push(property_id::END); // streams info
        data.push(property_id::END); // header

        let header = plain(parse(archive(0, &data)).unwrap());
        let pack_info = header.main_streams.unwrap().pack_info.unwrap();
        assert_eq!(pack_info.sizes, Some(vec![1000]));
        assert!(header.files_info.is_none());
    }

    #[test]
    fn test_encoded_header_recorded() {
        let mut data = Vec::new();
        data.push(property_id::ENCODED_HEADER);
        data.push(property_id::PACK_INFO);
        write_variable_u64(&mut data, 0);
        write_variable_u64(&mut data, 1);
        data.push(property_id::SIZE);
        write_variable_u64(&mut data, 42);
        data.push(property_id::END);
        data.push(property_id::END);

        let metadata = parse(archive(0, &data)).unwrap();
        match metadata.next_header {
            NextHeader::Encoded(info) => {
                assert_eq!(info.pack_info.unwrap().total_packed_size(), Some(42));
                assert!(info.coders_info.is_none());
            }
            other => panic!("expected encoded header, got {other:?}"),
        }
    }

    #[test]
    fn test_sections_out_of_order() {
        let data = vec![
            property_id::HEADER,
            property_id::MAIN_STREAMS_INFO,
            property_id::END,
            property_id::ARCHIVE_PROPERTIES,
            property_id::END,
            property_id::END,
        ];
        let err = parse(archive(0, &data)).unwrap_err();
        assert!(matches!(err, Error::UnexpectedTag { offset: 35, actual: 0x02, .. }));
    }

    #[test]
    fn test_repeated_section_rejected() {
        let data = vec![
            property_id::HEADER,
            property_id::ARCHIVE_PROPERTIES,
            property_id::END,
            property_id::ARCHIVE_PROPERTIES,
            property_id::END,
            property_id::END,
        ];
        assert!(matches!(
            parse(archive(0, &data)).unwrap_err(),
            Error::UnexpectedTag { offset: 35, .. }
        ));
    }

    fn verifying() -> HeaderParser {
        HeaderParser::new().verify_next_header_crc(true)
    }

    #[test]
    fn test_next_header_crc_mismatch() {
        let mut data = archive(0, &[property_id::HEADER, property_id::END]);
        // Corrupt the stored next header CRC and fix the start header CRC
        data[28] ^= 0xFF;
        let start_crc = Crc32::compute(&data[12..32]).value();
        data[8..12].copy_from_slice(&start_crc.to_le_bytes());

        match verifying().parse(Cursor::new(data.clone())).unwrap_err() {
            Error::ChecksumMismatch {
                offset, actual, ..
            } => {
                assert_eq!(offset, 32);
                assert_eq!(actual, Crc32::compute(&[property_id::HEADER, property_id::END]));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(parse(data).is_ok());
    }

    #[test]
    fn test_next_header_size_not_trusted_by_default() {
        // The stored size covers 7 bytes, but only the 2-byte header exists
        let header = [property_id::HEADER, property_id::END];
        let mut data = archive(0, &header);
        data[20..28].copy_from_slice(&7u64.to_le_bytes());
        let start_crc = Crc32::compute(&data[12..32]).value();
        data[8..12].copy_from_slice(&start_crc.to_le_bytes());

        let metadata = parse(data.clone()).unwrap();
        assert_eq!(metadata.signature.next_header_size, 7);
        assert_eq!(plain(metadata), Header::default());

        assert!(matches!(
            verifying().parse(Cursor::new(data)).unwrap_err(),
            Error::Truncated { offset: 32, needed: 7 }
        ));
    }

    #[test]
    fn test_zero_size_skips_verification() {
        let mut data = archive(0, &[]);
        data.extend_from_slice(&[property_id::HEADER, property_id::END]);
        let metadata = verifying().parse(Cursor::new(data)).unwrap();
        assert_eq!(metadata.signature.next_header_size, 0);
        assert_eq!(metadata.signature.next_header_crc, Digest(0));
    }

    #[test]
    fn test_next_header_offset_out_of_range() {
        let mut data = archive(0, &[]);
        data[12..20].copy_from_slice(&u64::MAX.to_le_bytes());
        let start_crc = Crc32::compute(&data[12..32]).value();
        data[8..12].copy_from_slice(&start_crc.to_le_bytes());

        assert!(matches!(
            parse(data).unwrap_err(),
            Error::CorruptHeader { offset: 32, .. }
        ));
    }

    #[test]
    fn test_header_size_limit() {
        let data = archive(0, &[property_id::HEADER, property_id::END]);
        let parser = HeaderParser::with_limits(ResourceLimits::default().max_header_bytes(1))
            .verify_next_header_crc(true);
        assert!(matches!(
            parser.parse(Cursor::new(data)).unwrap_err(),
            Error::ResourceLimitExceeded { offset: 32, .. }
        ));
    }

    #[test]
    fn test_archive_at_nonzero_position() {
        let mut data = vec![0u8; 10];
        data.extend(archive(0, &[property_id::HEADER, property_id::END]));
        let mut reader = Cursor::new(data);
        reader.set_position(10);

        let metadata = HeaderParser::new().parse(reader).unwrap();
        plain(metadata);
    }

    #[test]
    fn test_parser_configuration() {
        let limits = ResourceLimits::default().max_entries(10).max_header_bytes(100);
        let parser = HeaderParser::with_limits(limits);
        assert_eq!(parser.limits().max_entries, 10);
        assert_eq!(parser.limits().max_header_bytes, 100);
    }
}
