//! Fuzz target for the next header decoder.
//!
//! The input is wrapped in a valid signature header with a correct CRC, so
//! every input reaches the tag-driven decoder.
//!
//! Run with: cargo +nightly fuzz run next_header

#![no_main]

use libfuzzer_sys::fuzz_target;
use sevenz_header::checksum::Crc32;
use sevenz_header::format::SIGNATURE;
use sevenz_header::{HeaderParser, ResourceLimits};
use std::io::Cursor;

fuzz_target!(|header: &[u8]| {
    let mut region = Vec::with_capacity(20);
    region.extend_from_slice(&0u64.to_le_bytes());
    region.extend_from_slice(&(header.len() as u64).to_le_bytes());
    region.extend_from_slice(&Crc32::compute(header).value().to_le_bytes());

    let mut data = Vec::with_capacity(32 + header.len());
    data.extend_from_slice(SIGNATURE);
    data.extend_from_slice(&[0, 4]);
    data.extend_from_slice(&Crc32::compute(&region).value().to_le_bytes());
    data.extend_from_slice(&region);
    data.extend_from_slice(header);

    let limits = ResourceLimits::default()
        .max_entries(4096)
        .max_header_bytes(1 << 20);
    let _ = HeaderParser::with_limits(limits).parse(Cursor::new(data));
});
