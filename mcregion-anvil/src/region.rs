//! Location table lookup and chunk payload framing over an in-memory region file.

use std::fmt;

use crate::coords::{self, ChunkSlot};
use crate::error::{RegionError, Result};
use crate::{CHUNK_HEADER_BYTES, HEADER_BYTES, SECTOR_BYTES, SLOT_COUNT, decode_unsigned};

/// One 4-byte location table entry: [Offset:3 bytes][Count:1 byte] (Big Endian).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct LocationEntry {
    /// Offset of the chunk from the start of the file, in 4096-byte sectors.
    pub sector_offset: u32,
    /// Number of sectors reserved for the chunk.
    pub sector_count: u8,
}

impl LocationEntry {
    /// Both fields zero: the chunk has never been generated.
    pub fn is_absent(&self) -> bool {
        self.sector_offset == 0 && self.sector_count == 0
    }

    pub fn offset_bytes(&self) -> u64 {
        self.sector_offset as u64 * SECTOR_BYTES
    }

    pub fn reserved_bytes(&self) -> u64 {
        self.sector_count as u64 * SECTOR_BYTES
    }
}

/// A chunk's compressed payload, borrowed from the region file buffer.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct ChunkPayload<'a> {
    pub compression: u8,
    pub data: &'a [u8],
}

impl ChunkPayload<'_> {
    /// Decompress into the chunk's NBT byte stream.
    pub fn decompress(&self) -> Result<Vec<u8>> {
        crate::decompress_chunk(self.compression, self.data)
    }
}

impl fmt::Debug for ChunkPayload<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkPayload {{ compression: {}, len: {} }}", self.compression, self.data.len())
    }
}

/// A whole region file held in memory.
///
/// The buffer is never mutated after construction, so a `RegionFile` can be
/// shared across threads behind an `Arc`.
pub struct RegionFile {
    name: String,
    bytes: Vec<u8>,
}

impl RegionFile {
    /// Wrap raw file contents. The length must be a positive multiple of 4096.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let name = name.into();
        if bytes.is_empty() {
            return Err(RegionError::malformed(&name, "file is empty"));
        }
        if bytes.len() as u64 % SECTOR_BYTES != 0 {
            return Err(RegionError::malformed(
                &name,
                format!("length {} is not a multiple of {}", bytes.len(), SECTOR_BYTES),
            ));
        }
        Ok(Self { name, bytes })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Location table entry for a slot.
    pub fn location(&self, slot: ChunkSlot) -> Result<LocationEntry> {
        let entry = self.table_entry(0, slot)?;
        Ok(LocationEntry {
            sector_offset: decode_unsigned(entry, 3)? as u32,
            sector_count: entry[3],
        })
    }

    /// Unix seconds at which the chunk in `slot` was last saved.
    pub fn timestamp(&self, slot: ChunkSlot) -> Result<u32> {
        let entry = self.table_entry(SECTOR_BYTES as usize, slot)?;
        Ok(decode_unsigned(entry, 4)? as u32)
    }

    fn table_entry(&self, table_start: usize, slot: ChunkSlot) -> Result<&[u8]> {
        let start = table_start + slot.index() * 4;
        self.bytes
            .get(start..start + 4)
            .ok_or_else(|| RegionError::malformed(&self.name, "file too short for header tables"))
    }

    /// Every slot whose location entry is not the absent sentinel.
    /// Walks the whole 32x32 table.
    pub fn present_chunks(&self) -> Result<Vec<ChunkSlot>> {
        let mut present = Vec::new();
        for index in 0..SLOT_COUNT {
            let Some(slot) = ChunkSlot::from_index(index) else { break };
            if !self.location(slot)?.is_absent() {
                present.push(slot);
            }
        }
        Ok(present)
    }

    /// Payload for world block (x, z), or `None` if that chunk was never generated.
    pub fn chunk_at(&self, x: i64, z: i64) -> Result<Option<ChunkPayload<'_>>> {
        self.chunk(coords::chunk_slot_index(x, z))
    }

    /// Payload stored in `slot`, or `None` if the slot is empty.
    pub fn chunk(&self, slot: ChunkSlot) -> Result<Option<ChunkPayload<'_>>> {
        let entry = self.location(slot)?;
        if entry.is_absent() {
            return Ok(None);
        }

        if (entry.sector_offset as u64) < HEADER_BYTES / SECTOR_BYTES {
            return Err(RegionError::malformed(
                &self.name,
                format!("chunk {} points into the header (sector {})", slot, entry.sector_offset),
            ));
        }

        let file_len = self.bytes.len() as u64;
        let header_at = entry.offset_bytes();
        if header_at + CHUNK_HEADER_BYTES as u64 > file_len {
            return Err(RegionError::malformed(
                &self.name,
                format!(
                    "chunk {} header at byte {} is past end of file ({} bytes)",
                    slot, header_at, file_len
                ),
            ));
        }

        let header_at = header_at as usize;
        let header = &self.bytes[header_at..header_at + CHUNK_HEADER_BYTES];
        let length = decode_unsigned(header, 4)?;
        let compression = header[4];

        // Length counts the type byte.
        if length == 0 {
            return Err(RegionError::malformed(
                &self.name,
                format!("chunk {} has zero payload length", slot),
            ));
        }

        let data_start = header_at + CHUNK_HEADER_BYTES;
        let data_end = data_start as u64 + (length - 1);
        if data_end > file_len {
            return Err(RegionError::malformed(
                &self.name,
                format!(
                    "chunk {} payload of {} bytes runs past end of file ({} bytes)",
                    slot, length, file_len
                ),
            ));
        }

        if length + 4 > entry.reserved_bytes() {
            log::warn!(
                "{}: chunk {} payload ({} bytes) overruns its {} reserved sectors",
                self.name,
                slot,
                length + 4,
                entry.sector_count
            );
        }

        Ok(Some(ChunkPayload {
            compression,
            data: &self.bytes[data_start..data_end as usize],
        }))
    }
}

impl fmt::Debug for RegionFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RegionFile {{ name: {:?}, len: {} }}", self.name, self.bytes.len())
    }
}
