//! Archive-level properties.

use std::io::{Read, Seek};

use super::cursor::ByteCursor;
use super::property_id;
use super::reader::read_variable_u64;
use super::streams::ResourceLimits;
use crate::Result;

/// One opaque archive property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveProperty {
    /// Property type byte.
    pub property_type: u8,
    /// Payload bytes, in file order.
    pub data: Vec<u8>,
}

impl ArchiveProperty {
    /// Returns the payload with its bytes in reverse order.
    ///
    /// Some consumers expect this orientation for archive property payloads.
    pub fn reversed_data(&self) -> Vec<u8> {
        self.data.iter().rev().copied().collect()
    }
}

/// The archive properties section of a header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveProperties {
    /// Properties in file order.
    pub properties: Vec<ArchiveProperty>,
}

impl ArchiveProperties {
    /// Parses `(type, size, data)` triples until a type of `End`.
    ///
    /// The cursor should be positioned after the `ArchiveProperties`
    /// property ID.
    pub fn parse<R: Read + Seek>(
        cursor: &mut ByteCursor<R>,
        limits: &ResourceLimits,
    ) -> Result<Self> {
        let mut properties = Vec::new();

        loop {
            let property_type = cursor.read_byte()?;
            if property_type == property_id::END {
                break;
            }

            let size_offset = cursor.position();
            let size = read_variable_u64(cursor)?;
            let size = limits.check_bytes(size_offset, size, "archive property")?;
            if properties.len() >= limits.max_entries {
                return Err(crate::Error::limit_exceeded(
                    size_offset,
                    "too many archive properties",
                ));
            }
            let data = cursor.read_exact(size)?;

            log::trace!("archive property {property_type:#04x}: {size} bytes");
            properties.push(ArchiveProperty {
                property_type,
                data,
            });
        }

        Ok(Self { properties })
    }

    /// Returns `true` if no properties are stored.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Returns the first property of the given type.
    pub fn get(&self, property_type: u8) -> Option<&ArchiveProperty> {
        self.properties
            .iter()
            .find(|p| p.property_type == property_type)
    }
}
