//! Fuzz target for header parsing with arbitrary byte input.
//!
//! Most inputs fail at the signature or start header CRC; this target mainly
//! guards the first 32 bytes and the error paths around them.
//!
//! Run with: cargo +nightly fuzz run header_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    if let Ok(archive) = sevenz_header::Archive::open(Cursor::new(data)) {
        for entry in archive.entries() {
            let _ = entry.name.len();
            let _ = entry.crc.map(|crc| crc.to_string());
        }
    }
});
