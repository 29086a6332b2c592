//! Streams info structures for 7z archives.
//!
//! These structures describe the packed streams of an archive, the coder
//! graphs (folders) that turn them into unpacked streams, and how those
//! unpacked streams split into files.

use std::io::{Read, Seek};

use super::cursor::ByteCursor;
use super::reader::{PropertyTag, read_digests, read_variable_u64};
use super::{method_id, property_id};
use crate::checksum::Digest;
use crate::{Error, Result};

/// Resource limits applied while decoding a header.
///
/// Every count and blob length in a header is attacker-controlled; these
/// limits bound what a single parse may allocate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLimits {
    /// Maximum number of entries (files, streams, folders, etc.) allowed.
    pub max_entries: usize,
    /// Maximum bytes for a single header blob or a verified header region.
    pub max_header_bytes: u64,
    /// Maximum number of coders in one folder.
    pub max_coders_per_folder: usize,
    /// Maximum number of input or output streams in one folder.
    pub max_folder_streams: usize,
}

impl Default for ResourceLimits {
    /// Creates resource limits with the following default values:
    ///
    /// | Limit | Default Value |
    /// |-------|---------------|
    /// | `max_entries` | 1,000,000 |
    /// | `max_header_bytes` | 64 MiB |
    /// | `max_coders_per_folder` | 64 |
    /// | `max_folder_streams` | 64 |
    fn default() -> Self {
        Self {
            max_entries: 1_000_000,
            max_header_bytes: 64 << 20,
            max_coders_per_folder: 64,
            max_folder_streams: 64,
        }
    }
}

impl ResourceLimits {
    /// Creates new resource limits with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates resource limits with no restrictions.
    pub fn unlimited() -> Self {
        Self {
            max_entries: usize::MAX,
            max_header_bytes: u64::MAX,
            max_coders_per_folder: usize::MAX,
            max_folder_streams: usize::MAX,
        }
    }

    /// Sets the maximum number of entries.
    pub fn max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self
    }

    /// Sets the maximum header bytes.
    pub fn max_header_bytes(mut self, max: u64) -> Self {
        self.max_header_bytes = max;
        self
    }

    /// Sets the maximum number of coders per folder.
    pub fn max_coders_per_folder(mut self, max: usize) -> Self {
        self.max_coders_per_folder = max;
        self
    }

    /// Sets the maximum number of streams per folder.
    pub fn max_folder_streams(mut self, max: usize) -> Self {
        self.max_folder_streams = max;
        self
    }

    pub(crate) fn check_entries(&self, offset: u64, count: u64, what: &str) -> Result<usize> {
        match usize::try_from(count) {
            Ok(n) if n <= self.max_entries => Ok(n),
            _ => Err(Error::limit_exceeded(
                offset,
                format!("too many {what}: {count}"),
            )),
        }
    }

    pub(crate) fn check_bytes(&self, offset: u64, len: u64, what: &str) -> Result<usize> {
        match usize::try_from(len) {
            Ok(n) if len <= self.max_header_bytes => Ok(n),
            _ => Err(Error::limit_exceeded(
                offset,
                format!("{what} too large: {len} bytes"),
            )),
        }
    }

    /// Reads a count and checks it against `max_entries`.
    pub(crate) fn read_count<R: Read + Seek>(
        &self,
        cursor: &mut ByteCursor<R>,
        what: &str,
    ) -> Result<usize> {
        let offset = cursor.position();
        let count = read_variable_u64(cursor)?;
        self.check_entries(offset, count, what)
    }
}

fn read_numbers<R: Read + Seek>(cursor: &mut ByteCursor<R>, count: usize) -> Result<Vec<u64>> {
    (0..count).map(|_| read_variable_u64(cursor)).collect()
}

/// Information about packed (compressed) streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackInfo {
    /// Position of the first pack stream, relative to the end of the
    /// signature header.
    pub pack_pos: u64,
    /// Number of packed streams.
    pub num_pack_streams: u64,
    /// Size of each packed stream, if stored.
    pub sizes: Option<Vec<u64>>,
    /// CRC of each packed stream, if a CRC list is stored.
    pub digests: Option<Vec<Option<Digest>>>,
}

impl PackInfo {
    /// Parses PackInfo.
    ///
    /// The cursor should be positioned after the `PackInfo` property ID.
    pub fn parse<R: Read + Seek>(
        cursor: &mut ByteCursor<R>,
        limits: &ResourceLimits,
    ) -> Result<Self> {
        let pack_pos = read_variable_u64(cursor)?;
        let count = limits.read_count(cursor, "pack streams")?;

        let mut tag = PropertyTag::read(cursor)?;

        let sizes = if tag.id == property_id::SIZE {
            let sizes = read_numbers(cursor, count)?;
            tag = PropertyTag::read(cursor)?;
            Some(sizes)
        } else {
            None
        };

        let digests = if tag.id == property_id::CRC {
            let digests = read_digests(cursor, count)?;
            tag = PropertyTag::read(cursor)?;
            Some(digests)
        } else {
            None
        };

        tag.expect(property_id::END, "Size, CRC or End in PackInfo")?;

        log::trace!("pack info: {count} streams at pack position {pack_pos}");

        Ok(Self {
            pack_pos,
            num_pack_streams: count as u64,
            sizes,
            digests,
        })
    }

    /// Returns the number of pack streams.
    pub fn num_streams(&self) -> u64 {
        self.num_pack_streams
    }

    /// Returns the total packed size, or `None` if sizes are not stored.
    pub fn total_packed_size(&self) -> Option<u64> {
        self.sizes
            .as_ref()
            .map(|sizes| sizes.iter().fold(0u64, |acc, &s| acc.saturating_add(s)))
    }
}

const CODER_ID_SIZE_MASK: u8 = 0x0F;
const CODER_IS_COMPLEX: u8 = 0x10;
const CODER_HAS_ATTRIBUTES: u8 = 0x20;
const CODER_RESERVED_MUST_BE_ZERO: u8 = 0x80;

/// A compression, encryption or filter coder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coder {
    /// Method ID bytes (variable length, typically 1-4 bytes).
    pub method_id: Vec<u8>,
    /// Number of input streams.
    pub num_in_streams: u64,
    /// Number of output streams.
    pub num_out_streams: u64,
    /// Whether the stream counts were stored explicitly.
    pub is_complex: bool,
    /// Optional coder properties (e.g., LZMA dictionary size).
    pub properties: Option<Vec<u8>>,
}

impl Coder {
    /// Parses one coder, starting with its flag byte.
    ///
    /// The flag byte packs four fields: bits 0-3 are the method ID length,
    /// bit 4 marks a complex coder, bit 5 announces a properties blob and
    /// bit 7 must be clear. Bit 6 is reserved and ignored.
    fn parse<R: Read + Seek>(cursor: &mut ByteCursor<R>, limits: &ResourceLimits) -> Result<Self> {
        let flags_offset = cursor.position();
        let flags = cursor.read_byte()?;
        if flags & CODER_RESERVED_MUST_BE_ZERO != 0 {
            return Err(Error::corrupt_header(
                flags_offset,
                format!("coder flag byte {flags:#04x} has bit 7 set"),
            ));
        }

        let method_id = cursor.read_exact(usize::from(flags & CODER_ID_SIZE_MASK))?;
        let is_complex = flags & CODER_IS_COMPLEX != 0;

        let (num_in_streams, num_out_streams) = if is_complex {
            let counts_offset = cursor.position();
            let num_in = read_variable_u64(cursor)?;
            let num_out = read_variable_u64(cursor)?;
            let max = limits.max_folder_streams as u64;
            if num_in > max || num_out > max {
                return Err(Error::limit_exceeded(
                    counts_offset,
                    format!("coder has {num_in} inputs and {num_out} outputs"),
                ));
            }
            (num_in, num_out)
        } else {
            (1, 1)
        };

        let properties = if flags & CODER_HAS_ATTRIBUTES != 0 {
            let size_offset = cursor.position();
            let size = read_variable_u64(cursor)?;
            let size = limits.check_bytes(size_offset, size, "coder properties")?;
            Some(cursor.read_exact(size)?)
        } else {
            None
        };

        Ok(Self {
            method_id,
            num_in_streams,
            num_out_streams,
            is_complex,
            properties,
        })
    }

    /// Returns the method ID as a u64 for comparison with [`method_id`] constants.
    ///
    /// Method ID bytes are stored most significant first.
    pub fn method_id_u64(&self) -> u64 {
        self.method_id
            .iter()
            .take(8)
            .fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
    }

    /// Returns a display name for well-known methods.
    pub fn method_name(&self) -> Option<&'static str> {
        method_id::name(self.method_id_u64())
    }
}

/// A binding pair connecting a coder output to another coder's input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindPair {
    /// Index of the input stream (folder-wide numbering).
    pub in_index: u64,
    /// Index of the output stream (folder-wide numbering).
    pub out_index: u64,
}

/// A folder (block) containing one or more coders.
///
/// Folders describe how compressed data is processed through a chain
/// of coders (compression, encryption, filters). Input and output streams
/// are numbered folder-wide in coder order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    /// List of coders in this folder.
    pub coders: Vec<Coder>,
    /// Binding pairs connecting coder streams.
    pub bind_pairs: Vec<BindPair>,
    /// Input stream index fed by each packed stream.
    pub packed_streams: Vec<u64>,
    /// Whether `packed_streams` was stored; a single packed stream is
    /// implicit and derived from the unbound input.
    pub explicit_packed_streams: bool,
}

impl Folder {
    /// Parses a single folder.
    ///
    /// Reads `NumOutStreams - 1` bind pairs and, when more than one input is
    /// left unbound, one packed stream index per unbound input.
    pub fn parse<R: Read + Seek>(
        cursor: &mut ByteCursor<R>,
        limits: &ResourceLimits,
    ) -> Result<Self> {
        let offset = cursor.position();
        let num_coders = read_variable_u64(cursor)?;
        if num_coders > limits.max_coders_per_folder as u64 {
            return Err(Error::limit_exceeded(
                offset,
                format!("too many coders in folder: {num_coders}"),
            ));
        }

        let coders = (0..num_coders)
            .map(|_| Coder::parse(cursor, limits))
            .collect::<Result<Vec<_>>>()?;

        let total_in = coders
            .iter()
            .fold(0u64, |acc, c| acc.saturating_add(c.num_in_streams));
        let total_out = coders
            .iter()
            .fold(0u64, |acc, c| acc.saturating_add(c.num_out_streams));
        let max_streams = limits.max_folder_streams as u64;
        if total_in > max_streams || total_out > max_streams {
            return Err(Error::limit_exceeded(
                offset,
                format!("folder has {total_in} inputs and {total_out} outputs"),
            ));
        }

        let num_bind_pairs = total_out
            .checked_sub(1)
            .ok_or_else(|| Error::corrupt_header(offset, "folder has no output streams"))?;

        let bind_pairs = (0..num_bind_pairs)
            .map(|i| {
                let pair_offset = cursor.position();
                let in_index = read_variable_u64(cursor)?;
                let out_index = read_variable_u64(cursor)?;
                if in_index >= total_in {
                    return Err(Error::corrupt_header(
                        pair_offset,
                        format!(
                            "bind_pair[{i}].in_index {in_index} exceeds total_in_streams {total_in}"
                        ),
                    ));
                }
                if out_index >= total_out {
                    return Err(Error::corrupt_header(
                        pair_offset,
                        format!(
                            "bind_pair[{i}].out_index {out_index} exceeds total_out_streams {total_out}"
                        ),
                    ));
                }
                Ok(BindPair {
                    in_index,
                    out_index,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let packed_offset = cursor.position();
        let num_packed = total_in.checked_sub(num_bind_pairs).ok_or_else(|| {
            Error::corrupt_header(
                packed_offset,
                format!("folder has {num_bind_pairs} bind pairs but only {total_in} inputs"),
            )
        })?;

        let explicit_packed_streams = num_packed > 1;
        let packed_streams = if num_packed == 1 {
            let unbound = (0..total_in)
                .find(|&i| !bind_pairs.iter().any(|bp| bp.in_index == i))
                .ok_or_else(|| {
                    Error::corrupt_header(packed_offset, "every input stream is bound")
                })?;
            vec![unbound]
        } else {
            (0..num_packed)
                .map(|i| {
                    let index_offset = cursor.position();
                    let index = read_variable_u64(cursor)?;
                    if index >= total_in {
                        return Err(Error::corrupt_header(
                            index_offset,
                            format!(
                                "packed_streams[{i}] {index} exceeds total_in_streams {total_in}"
                            ),
                        ));
                    }
                    Ok(index)
                })
                .collect::<Result<Vec<_>>>()?
        };

        Ok(Self {
            coders,
            bind_pairs,
            packed_streams,
            explicit_packed_streams,
        })
    }

    /// Returns the total number of input streams across all coders.
    pub fn total_in_streams(&self) -> u64 {
        self.coders.iter().map(|c| c.num_in_streams).sum()
    }

    /// Returns the total number of output streams.
    pub fn total_out_streams(&self) -> u64 {
        self.coders.iter().map(|c| c.num_out_streams).sum()
    }

    /// Returns the output stream not consumed by any bind pair.
    ///
    /// This is the folder's decoded result; its size is the folder's
    /// unpack size.
    pub fn main_out_stream(&self) -> Option<u64> {
        (0..self.total_out_streams()).find(|&i| self.find_bind_pair_for_out_stream(i).is_none())
    }

    /// Finds the main coder index (the one producing the main output).
    pub fn main_coder_index(&self) -> Option<usize> {
        let main = usize::try_from(self.main_out_stream()?).ok()?;
        self.coder_stream_offsets()
            .iter()
            .zip(&self.coders)
            .position(|(&(_, out_offset), coder)| {
                main >= out_offset && main < out_offset + coder.num_out_streams as usize
            })
    }

    /// Returns the stream offsets for each coder.
    ///
    /// Each tuple contains (first_in_stream_idx, first_out_stream_idx).
    pub fn coder_stream_offsets(&self) -> Vec<(usize, usize)> {
        let mut result = Vec::with_capacity(self.coders.len());
        let mut in_offset = 0;
        let mut out_offset = 0;

        for coder in &self.coders {
            result.push((in_offset, out_offset));
            in_offset += coder.num_in_streams as usize;
            out_offset += coder.num_out_streams as usize;
        }

        result
    }

    /// Finds the bind pair that feeds the given input stream.
    pub fn find_bind_pair_for_in_stream(&self, in_stream_idx: u64) -> Option<&BindPair> {
        self.bind_pairs
            .iter()
            .find(|bp| bp.in_index == in_stream_idx)
    }

    /// Finds the bind pair that consumes the given output stream.
    pub fn find_bind_pair_for_out_stream(&self, out_stream_idx: u64) -> Option<&BindPair> {
        self.bind_pairs
            .iter()
            .find(|bp| bp.out_index == out_stream_idx)
    }

    /// Returns the position in `packed_streams` of an input stream, if it is
    /// fed directly from a packed stream.
    pub fn find_packed_stream_index(&self, in_stream_idx: u64) -> Option<usize> {
        self.packed_streams
            .iter()
            .position(|&ps| ps == in_stream_idx)
    }
}

/// Coders info: the folders of a streams info and their output sizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodersInfo {
    /// Number of folders declared.
    pub num_folders: u64,
    /// Folders, in order. Empty when the definitions are external.
    pub folders: Vec<Folder>,
    /// Index of the data stream holding the folder definitions, if external.
    pub data_stream_index: Option<u64>,
    /// Size of every output stream, in folder order then per-folder output
    /// order.
    pub unpack_sizes: Vec<u64>,
    /// CRC of each folder's main output, if a CRC list is stored.
    pub digests: Option<Vec<Option<Digest>>>,
}

impl CodersInfo {
    /// Parses CodersInfo.
    ///
    /// The cursor should be positioned after the `UnPackInfo` property ID.
    pub fn parse<R: Read + Seek>(
        cursor: &mut ByteCursor<R>,
        limits: &ResourceLimits,
    ) -> Result<Self> {
        PropertyTag::read(cursor)?.expect(property_id::FOLDER, "Folder")?;

        let num_folders = limits.read_count(cursor, "folders")?;
        let external = cursor.read_bool()?;

        let (folders, data_stream_index) = if external {
            (Vec::new(), Some(read_variable_u64(cursor)?))
        } else {
            let folders = (0..num_folders)
                .map(|i| {
                    let folder = Folder::parse(cursor, limits)?;
                    log::trace!(
                        "folder {i}: {} coders, {} bind pairs, {} packed streams",
                        folder.coders.len(),
                        folder.bind_pairs.len(),
                        folder.packed_streams.len()
                    );
                    Ok(folder)
                })
                .collect::<Result<Vec<_>>>()?;
            (folders, None)
        };

        PropertyTag::read(cursor)?.expect(property_id::CODERS_UNPACK_SIZE, "CodersUnPackSize")?;

        let sizes_offset = cursor.position();
        let num_sizes = folders
            .iter()
            .fold(0u64, |acc, f| acc.saturating_add(f.total_out_streams()));
        let num_sizes = limits.check_entries(sizes_offset, num_sizes, "unpack sizes")?;
        let unpack_sizes = read_numbers(cursor, num_sizes)?;

        let mut tag = PropertyTag::read(cursor)?;
        let digests = if tag.id == property_id::CRC {
            let digests = read_digests(cursor, num_folders)?;
            tag = PropertyTag::read(cursor)?;
            Some(digests)
        } else {
            None
        };

        tag.expect(property_id::END, "CRC or End in CodersInfo")?;

        Ok(Self {
            num_folders: num_folders as u64,
            folders,
            data_stream_index,
            unpack_sizes,
            digests,
        })
    }

    /// Returns `true` if the folder definitions are stored outside the header.
    pub fn is_external(&self) -> bool {
        self.data_stream_index.is_some()
    }

    /// Returns each folder's slice of [`unpack_sizes`](Self::unpack_sizes).
    pub fn folder_unpack_sizes(&self) -> impl Iterator<Item = &[u64]> + '_ {
        let mut rest = self.unpack_sizes.as_slice();
        self.folders.iter().map(move |folder| {
            let n = usize::try_from(folder.total_out_streams())
                .unwrap_or(usize::MAX)
                .min(rest.len());
            let (head, tail) = rest.split_at(n);
            rest = tail;
            head
        })
    }

    /// Returns the size of each folder's main output stream.
    pub fn folder_main_sizes(&self) -> impl Iterator<Item = Option<u64>> + '_ {
        self.folders
            .iter()
            .zip(self.folder_unpack_sizes())
            .map(|(folder, sizes)| {
                let main = usize::try_from(folder.main_out_stream()?).ok()?;
                sizes.get(main).copied()
            })
    }

    /// Returns the unpack size of folder `index`.
    pub fn folder_unpack_size(&self, index: usize) -> Option<u64> {
        self.folder_main_sizes().nth(index).flatten()
    }

    /// Returns the stored CRC of folder `index`.
    pub fn folder_digest(&self, index: usize) -> Option<Digest> {
        self.digests.as_ref()?.get(index).copied().flatten()
    }
}

/// Information about substreams within folders.
///
/// In solid archives, multiple files can be packed into a single folder.
/// SubStreamsInfo describes how many files are in each folder and their sizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubStreamsInfo {
    /// Number of unpack streams (files) in each folder.
    pub num_unpack_streams: Vec<u64>,
    /// Unpacked sizes of each substream.
    pub unpack_sizes: Vec<u64>,
    /// CRC of each substream, where known.
    pub digests: Vec<Option<Digest>>,
}

impl SubStreamsInfo {
    /// Parses SubStreamsInfo for the folders of `coders_info`.
    ///
    /// The cursor should be positioned after the `SubStreamsInfo` property
    /// ID. The last substream of each folder has no stored size; it is the
    /// folder's unpack size minus the other substreams. Folders holding a
    /// single substream with a folder CRC reuse that CRC.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedSection`] if the folders are external,
    /// since their sizes are then unknown.
    pub fn parse<R: Read + Seek>(
        cursor: &mut ByteCursor<R>,
        coders_info: Option<&CodersInfo>,
        limits: &ResourceLimits,
    ) -> Result<Self> {
        let start = cursor.position();

        let folders: Vec<(u64, Option<Digest>)> = match coders_info {
            None => Vec::new(),
            Some(info) if info.is_external() && info.num_folders > 0 => {
                return Err(Error::UnsupportedSection {
                    offset: start,
                    section: "SubStreamsInfo over external folders",
                });
            }
            Some(info) => info
                .folder_main_sizes()
                .enumerate()
                .map(|(i, size)| {
                    let size = size.ok_or_else(|| {
                        Error::corrupt_header(start, format!("folder {i} has no unpack size"))
                    })?;
                    Ok((size, info.folder_digest(i)))
                })
                .collect::<Result<_>>()?,
        };

        let mut tag = PropertyTag::read(cursor)?;

        let num_unpack_streams = if tag.id == property_id::NUM_UNPACK_STREAM {
            let counts = folders
                .iter()
                .map(|_| limits.read_count(cursor, "substreams in folder").map(|n| n as u64))
                .collect::<Result<Vec<_>>>()?;
            tag = PropertyTag::read(cursor)?;
            counts
        } else {
            vec![1; folders.len()]
        };

        let total = num_unpack_streams
            .iter()
            .fold(0u64, |acc, &n| acc.saturating_add(n));
        let total = limits.check_entries(tag.offset, total, "substreams")?;

        let has_sizes = tag.id == property_id::SIZE;
        let mut unpack_sizes = Vec::new();
        for (i, (&count, &(folder_size, _))) in num_unpack_streams.iter().zip(&folders).enumerate()
        {
            if count == 0 {
                continue;
            }
            if count > 1 && !has_sizes {
                return Err(Error::corrupt_header(
                    tag.offset,
                    format!("folder {i} has {count} substreams but no stored sizes"),
                ));
            }

            let mut sum = 0u64;
            for _ in 1..count {
                let size_offset = cursor.position();
                let size = read_variable_u64(cursor)?;
                sum = sum.checked_add(size).ok_or_else(|| {
                    Error::corrupt_header(size_offset, "substream sizes overflow")
                })?;
                unpack_sizes.push(size);
            }

            let last = folder_size.checked_sub(sum).ok_or_else(|| {
                Error::corrupt_header(
                    cursor.position(),
                    format!("substreams of folder {i} total {sum}, exceeding its size {folder_size}"),
                )
            })?;
            unpack_sizes.push(last);
        }
        if has_sizes {
            tag = PropertyTag::read(cursor)?;
        }

        let inherits_digest =
            |count: u64, folder_digest: Option<Digest>| count == 1 && folder_digest.is_some();
        let num_missing: usize = num_unpack_streams
            .iter()
            .zip(&folders)
            .filter(|&(&count, &(_, digest))| !inherits_digest(count, digest))
            .map(|(&count, _)| count as usize)
            .sum();

        let stored = if tag.id == property_id::CRC {
            let stored = read_digests(cursor, num_missing)?;
            tag = PropertyTag::read(cursor)?;
            stored
        } else {
            vec![None; num_missing]
        };

        tag.expect(property_id::END, "CRC or End in SubStreamsInfo")?;

        let mut stored = stored.into_iter();
        let mut digests = Vec::new();
        for (&count, &(_, folder_digest)) in num_unpack_streams.iter().zip(&folders) {
            if inherits_digest(count, folder_digest) {
                digests.push(folder_digest);
            } else {
                digests.extend(stored.by_ref().take(count as usize));
            }
        }

        log::trace!(
            "substreams: {} streams over {} folders",
            unpack_sizes.len(),
            folders.len()
        );

        Ok(Self {
            num_unpack_streams,
            unpack_sizes,
            digests,
        })
    }

    /// Returns the total number of substreams.
    pub fn total_streams(&self) -> u64 {
        self.num_unpack_streams.iter().sum()
    }
}

/// One decoded stream that backs a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnpackStream {
    /// Unpacked size.
    pub size: u64,
    /// CRC of the unpacked data, if stored.
    pub digest: Option<Digest>,
}

/// A group of packed streams, the coders applied to them, and the split of
/// their output into files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamsInfo {
    /// Where the packed streams live.
    pub pack_info: Option<PackInfo>,
    /// The folders decoding the packed streams.
    pub coders_info: Option<CodersInfo>,
    /// How folder outputs divide into files.
    pub substreams_info: Option<SubStreamsInfo>,
}

impl StreamsInfo {
    /// Parses a StreamsInfo block up to and including its `End` tag.
    ///
    /// Each part is present only if the next property ID announces it.
    pub fn parse<R: Read + Seek>(
        cursor: &mut ByteCursor<R>,
        limits: &ResourceLimits,
    ) -> Result<Self> {
        let mut tag = PropertyTag::read(cursor)?;

        let pack_info = if tag.id == property_id::PACK_INFO {
            log::trace!("PackInfo at {:#x}", tag.offset);
            let info = PackInfo::parse(cursor, limits)?;
            tag = PropertyTag::read(cursor)?;
            Some(info)
        } else {
            None
        };

        let coders_info = if tag.id == property_id::UNPACK_INFO {
            log::trace!("UnPackInfo at {:#x}", tag.offset);
            let info = CodersInfo::parse(cursor, limits)?;
            tag = PropertyTag::read(cursor)?;
            Some(info)
        } else {
            None
        };

        let substreams_info = if tag.id == property_id::SUBSTREAMS_INFO {
            log::trace!("SubStreamsInfo at {:#x}", tag.offset);
            let info = SubStreamsInfo::parse(cursor, coders_info.as_ref(), limits)?;
            tag = PropertyTag::read(cursor)?;
            Some(info)
        } else {
            None
        };

        tag.expect(
            property_id::END,
            "PackInfo, UnPackInfo, SubStreamsInfo or End",
        )?;

        Ok(Self {
            pack_info,
            coders_info,
            substreams_info,
        })
    }

    /// Returns the folders, or an empty slice if there is no coders info.
    pub fn folders(&self) -> &[Folder] {
        self.coders_info
            .as_ref()
            .map(|info| info.folders.as_slice())
            .unwrap_or_default()
    }

    /// Returns the streams that hold file data, in file order.
    ///
    /// Without SubStreamsInfo every folder holds exactly one stream.
    pub fn unpack_streams(&self) -> Vec<UnpackStream> {
        if let Some(substreams) = &self.substreams_info {
            return substreams
                .unpack_sizes
                .iter()
                .zip(&substreams.digests)
                .map(|(&size, &digest)| UnpackStream { size, digest })
                .collect();
        }

        self.coders_info
            .as_ref()
            .map(|info| {
                info.folder_main_sizes()
                    .enumerate()
                    .map(|(i, size)| UnpackStream {
                        size: size.unwrap_or_default(),
                        digest: info.folder_digest(i),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}
