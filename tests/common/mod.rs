//! Shared test utilities for integration tests.
//!
//! Archives are assembled byte by byte: the helpers here produce correct
//! signature headers and CRCs so each test only spells out the header
//! structure it cares about.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use sevenz_header::checksum::Crc32;
use sevenz_header::format::reader::write_variable_u64;
use sevenz_header::format::{SIGNATURE, property_id};

/// Incrementally writes header bytes.
#[derive(Debug, Default, Clone)]
pub struct HeaderBuilder {
    buf: Vec<u8>,
}

impl HeaderBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one raw byte (usually a property ID).
    pub fn byte(mut self, b: u8) -> Self {
        self.buf.push(b);
        self
    }

    /// Appends raw bytes.
    pub fn bytes(mut self, data: &[u8]) -> Self {
        self.buf.extend_from_slice(data);
        self
    }

    /// Appends a variable-length number.
    pub fn number(mut self, value: u64) -> Self {
        write_variable_u64(&mut self.buf, value).unwrap();
        self
    }

    /// Appends a little-endian u32 digest.
    pub fn digest(mut self, crc: u32) -> Self {
        self.buf.extend_from_slice(&crc.to_le_bytes());
        self
    }

    /// Appends a `(id, size, payload)` file property.
    pub fn property(self, id: u8, payload: &[u8]) -> Self {
        self.byte(id).number(payload.len() as u64).bytes(payload)
    }

    /// Returns the bytes written so far.
    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}

/// Encodes strings as the inline payload of a `Name` or `Comment` property.
pub fn utf16_payload(strings: &[&str]) -> Vec<u8> {
    let mut payload = vec![0x00]; // not external
    for s in strings {
        for unit in s.encode_utf16() {
            payload.extend_from_slice(&unit.to_le_bytes());
        }
        payload.extend_from_slice(&[0x00, 0x00]);
    }
    payload
}

/// Builds the 32-byte signature header with a correct start header CRC.
pub fn signature_header(next_offset: u64, next_size: u64, next_crc: u32) -> Vec<u8> {
    let mut region = Vec::with_capacity(20);
    region.extend_from_slice(&next_offset.to_le_bytes());
    region.extend_from_slice(&next_size.to_le_bytes());
    region.extend_from_slice(&next_crc.to_le_bytes());

    let mut data = Vec::with_capacity(32);
    data.extend_from_slice(SIGNATURE);
    data.extend_from_slice(&[0x00, 0x04]);
    data.extend_from_slice(&Crc32::compute(&region).value().to_le_bytes());
    data.extend_from_slice(&region);
    data
}

/// Builds a complete archive: signature header, `packed` data, then
/// `header` as the next header.
pub fn build_archive(packed: &[u8], header: &[u8]) -> Vec<u8> {
    let mut data = signature_header(
        packed.len() as u64,
        header.len() as u64,
        Crc32::compute(header).value(),
    );
    data.extend_from_slice(packed);
    data.extend_from_slice(header);
    data
}

/// The smallest valid archive: an empty plain header.
pub fn minimal_archive() -> Vec<u8> {
    build_archive(&[], &[property_id::HEADER, property_id::END])
}

/// The `MainStreamsInfo` section of [`sample_header`], tag included: one
/// LZMA folder of 30 bytes split into substreams of 10, 12 and 8 bytes.
pub fn sample_streams() -> Vec<u8> {
    HeaderBuilder::new()
        .byte(property_id::MAIN_STREAMS_INFO)
        // PackInfo: one 16-byte pack stream
        .byte(property_id::PACK_INFO)
        .number(0)
        .number(1)
        .byte(property_id::SIZE)
        .number(16)
        .byte(property_id::END)
        // UnPackInfo: one folder, one LZMA coder with properties
        .byte(property_id::UNPACK_INFO)
        .byte(property_id::FOLDER)
        .number(1)
        .byte(0x00)
        .number(1)
        .byte(0x23)
        .bytes(&[0x03, 0x01, 0x01])
        .number(5)
        .bytes(&[0x5D, 0x00, 0x00, 0x10, 0x00])
        .byte(property_id::CODERS_UNPACK_SIZE)
        .number(30)
        .byte(property_id::END)
        // SubStreamsInfo: three files, last size derived
        .byte(property_id::SUBSTREAMS_INFO)
        .byte(property_id::NUM_UNPACK_STREAM)
        .number(3)
        .byte(property_id::SIZE)
        .number(10)
        .number(12)
        .byte(property_id::CRC)
        .byte(0x01)
        .digest(SAMPLE_CRCS[0])
        .digest(SAMPLE_CRCS[1])
        .digest(SAMPLE_CRCS[2])
        .byte(property_id::END)
        .byte(property_id::END)
        .build()
}

/// Digests of the three files in [`sample_header`].
pub const SAMPLE_CRCS: [u32; 3] = [0x1111_1111, 0x2222_2222, 0x0000_01A2];

/// A realistic plain header: one LZMA folder holding three files, plus one
/// directory.
///
/// | Entry | Size | Kind |
/// |-------|------|------|
/// | `docs` | - | directory |
/// | `docs/a.txt` | 10 | file |
/// | `docs/b.txt` | 12 | file |
/// | `c.bin` | 8 | file |
pub fn sample_header() -> Vec<u8> {
    let mut mtimes = vec![0x01, 0x00]; // all defined, inline
    for secs in [0u64, 10, 20, 30] {
        mtimes.extend_from_slice(&(116_444_736_000_000_000u64 + secs * 10_000_000).to_le_bytes());
    }

    let mut attrs = vec![0x01, 0x00];
    for attr in [0x10u32, 0x20, 0x20, 0x21] {
        attrs.extend_from_slice(&attr.to_le_bytes());
    }

    HeaderBuilder::new()
        .byte(property_id::HEADER)
        .bytes(&sample_streams())
        // FilesInfo
        .byte(property_id::FILES_INFO)
        .number(4)
        .property(property_id::EMPTY_STREAM, &[0b1000_0000])
        .property(property_id::DUMMY, &[0x00, 0x00])
        .property(
            property_id::NAME,
            &utf16_payload(&["docs", "docs/a.txt", "docs/b.txt", "c.bin"]),
        )
        .property(property_id::MTIME, &mtimes)
        .property(property_id::WIN_ATTRIBUTES, &attrs)
        .byte(property_id::END)
        .byte(property_id::END)
        .build()
}

/// [`sample_header`] wrapped in an archive with 16 bytes of packed data.
pub fn sample_archive() -> Vec<u8> {
    build_archive(&[0xAB; 16], &sample_header())
}

/// Recomputes the start header CRC after a test edits bytes 12..32.
pub fn fix_start_header_crc(data: &mut [u8]) {
    let crc = Crc32::compute(&data[12..32]).value();
    data[8..12].copy_from_slice(&crc.to_le_bytes());
}

/// Unwraps an error result, panicking on success.
pub fn expect_err<T, E>(result: Result<T, E>) -> E {
    match result {
        Ok(_) => panic!("Expected error but got Ok"),
        Err(e) => e,
    }
}
