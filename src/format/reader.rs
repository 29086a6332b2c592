//! Low-level binary reading utilities for 7z header parsing.

use std::io::{self, Read, Seek, Write};

use super::cursor::ByteCursor;
use crate::checksum::Digest;
use crate::{Error, Result};

/// Reads a variable-length encoded u64.
///
/// 7z uses a variable-length integer encoding where the first byte's high bits
/// indicate the number of additional bytes to read:
///
/// - `0xxxxxxx` (1 byte): value 0-127
/// - `10xxxxxx` + 1 byte: value 0-16383
/// - `110xxxxx` + 2 bytes: value 0-2097151
/// - And so on...
/// - `11111111` + 8 bytes: full u64
///
/// The extra bytes are little-endian and hold the low bits; whatever is left
/// of the first byte after its run of ones holds the high bits.
///
/// # Errors
///
/// Returns [`Error::Truncated`] if the source ends inside the number.
pub fn read_variable_u64<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> Result<u64> {
    let first = cursor.read_byte()?;

    let mut mask = 0x80u8;
    let mut value = 0u64;

    for i in 0..8 {
        if first & mask == 0 {
            let high = u64::from(first & mask.wrapping_sub(1));
            return Ok(value | (high << (8 * i)));
        }
        value |= u64::from(cursor.read_byte()?) << (8 * i);
        mask >>= 1;
    }

    // All 8 high bits were set, value is in the following 8 bytes
    Ok(value)
}

/// Reads a variable-length number that is used as an in-memory count.
///
/// # Errors
///
/// Returns [`Error::CorruptHeader`] if the value does not fit in `usize`.
pub fn read_variable_usize<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> Result<usize> {
    let offset = cursor.position();
    let value = read_variable_u64(cursor)?;
    usize::try_from(value)
        .map_err(|_| Error::corrupt_header(offset, format!("count {value} does not fit in memory")))
}

/// Writes a variable-length encoded u64 in its shortest form.
///
/// This is the inverse of [`read_variable_u64`].
pub fn write_variable_u64<W: Write>(w: &mut W, value: u64) -> io::Result<()> {
    for k in 0..8u32 {
        let high = value >> (8 * k);
        if high < (1u64 << (7 - k)) {
            let marker = !(0xFFu8 >> k);
            let extra = k as usize;
            let mut buf = [0u8; 9];
            buf[0] = marker | high as u8;
            buf[1..=extra].copy_from_slice(&value.to_le_bytes()[..extra]);
            return w.write_all(&buf[..=extra]);
        }
    }

    let mut buf = [0xFFu8; 9];
    buf[1..].copy_from_slice(&value.to_le_bytes());
    w.write_all(&buf)
}

/// Reads a boolean vector (bit array) of the specified length.
///
/// Bits are read from MSB to LSB within each byte.
pub fn read_bool_vector<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    count: usize,
) -> Result<Vec<bool>> {
    let bytes = cursor.read_exact(count.div_ceil(8))?;

    Ok((0..count)
        .map(|i| (bytes[i / 8] >> (7 - (i % 8))) & 1 != 0)
        .collect())
}

/// Reads an `AllAreDefined` marker and, when it is zero, a bit vector over
/// `count` items.
///
/// Returns `None` when every item is defined. A marker other than 0 or 1 is
/// [`Error::CorruptHeader`](crate::Error::CorruptHeader).
pub fn read_all_or_bits<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    count: usize,
) -> Result<Option<Vec<bool>>> {
    let offset = cursor.position();
    match cursor.read_byte()? {
        0 => read_bool_vector(cursor, count).map(Some),
        1 => Ok(None),
        other => Err(Error::corrupt_header(
            offset,
            format!("AllAreDefined marker must be 0 or 1, found {other:#04x}"),
        )),
    }
}

/// Reads a digest list over `count` streams.
///
/// Layout: a defined-vector (see [`read_all_or_bits`]) followed by one
/// little-endian CRC-32 per defined stream.
pub fn read_digests<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    count: usize,
) -> Result<Vec<Option<Digest>>> {
    let defined = read_all_or_bits(cursor, count)?;
    (0..count)
        .map(|i| {
            if defined.as_ref().is_none_or(|bits| bits[i]) {
                cursor.read_digest().map(Some)
            } else {
                Ok(None)
            }
        })
        .collect()
}

/// A property ID together with the offset it was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyTag {
    /// Offset of the tag byte.
    pub offset: u64,
    /// The property ID.
    pub id: u8,
}

impl PropertyTag {
    /// Reads the next property ID.
    pub fn read<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> Result<Self> {
        let offset = cursor.position();
        let id = cursor.read_byte()?;
        Ok(Self { offset, id })
    }

    /// Fails unless this tag is `expected`.
    pub fn expect(self, expected: u8, context: &'static str) -> Result<()> {
        if self.id == expected {
            Ok(())
        } else {
            Err(self.unexpected(context))
        }
    }

    /// Builds the error for a tag that is not valid at its position.
    pub fn unexpected(self, expected: &'static str) -> Error {
        Error::UnexpectedTag {
            offset: self.offset,
            expected,
            actual: self.id,
        }
    }
}
