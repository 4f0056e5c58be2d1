//! World, region and chunk coordinate mapping.
//!
//! All divisions here round toward negative infinity: block -1 lives in
//! region -1 and chunk -1, never in 0.

use std::fmt;

/// Blocks along one horizontal edge of a chunk.
pub const CHUNK_WIDTH: i64 = 16;

/// Chunks along one edge of a region file.
pub const REGION_SIZE: i64 = 32;

/// Blocks along one horizontal edge of a region file.
pub const REGION_WIDTH: i64 = CHUNK_WIDTH * REGION_SIZE; // 512

/// A block position in the world.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct WorldPos {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl WorldPos {
    pub fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    pub fn region(&self) -> RegionPos {
        region_coordinate_of(self.x, self.z)
    }

    pub fn slot(&self) -> ChunkSlot {
        chunk_slot_index(self.x, self.z)
    }
}

impl fmt::Display for WorldPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.x, self.y, self.z)
    }
}

/// Region file coordinates (as in the filename "r.0.-1.mca").
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct RegionPos {
    pub x: i64,
    pub z: i64,
}

impl RegionPos {
    pub fn new(x: i64, z: i64) -> Self {
        Self { x, z }
    }

    pub fn filename(&self) -> String {
        region_filename(self.x, self.z)
    }

    /// Parse region position from filename (e.g., "r.0.-1.mca").
    pub fn from_filename(name: &str) -> Option<Self> {
        let parts: Vec<&str> = name.split('.').collect();
        if parts.len() == 4 && parts[0] == "r" && parts[3] == "mca" {
            let x = parts[1].parse().ok()?;
            let z = parts[2].parse().ok()?;
            Some(Self { x, z })
        } else {
            None
        }
    }
}

/// Chunk position local to one region file, both axes in 0..32.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct ChunkSlot {
    pub x: u8,
    pub z: u8,
}

impl ChunkSlot {
    /// Returns `None` if either axis is 32 or more.
    pub fn new(x: u8, z: u8) -> Option<Self> {
        if (x as i64) < REGION_SIZE && (z as i64) < REGION_SIZE {
            Some(Self { x, z })
        } else {
            None
        }
    }

    /// Linear index into the location table (0-1023).
    #[inline]
    pub fn index(&self) -> usize {
        self.z as usize * REGION_SIZE as usize + self.x as usize
    }

    /// Inverse of [`ChunkSlot::index`]. Indices past 1023 yield `None`.
    pub fn from_index(index: usize) -> Option<Self> {
        let size = REGION_SIZE as usize;
        if index >= size * size {
            return None;
        }
        Some(Self {
            x: (index % size) as u8,
            z: (index / size) as u8,
        })
    }
}

impl fmt::Display for ChunkSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.x, self.z)
    }
}

/// Region file holding world block (x, z).
#[inline]
pub fn region_coordinate_of(x: i64, z: i64) -> RegionPos {
    RegionPos {
        x: x.div_euclid(REGION_WIDTH),
        z: z.div_euclid(REGION_WIDTH),
    }
}

#[inline]
pub fn region_filename(region_x: i64, region_z: i64) -> String {
    format!("r.{}.{}.mca", region_x, region_z)
}

/// World chunk coordinate holding block coordinate `block`.
#[inline]
pub fn block_to_chunk(block: i64) -> i64 {
    block.div_euclid(CHUNK_WIDTH)
}

/// Convert world chunk coordinate to local region coordinate (0-31).
#[inline]
pub fn chunk_to_local(chunk_coord: i64) -> u8 {
    chunk_coord.rem_euclid(REGION_SIZE) as u8
}

/// Location table slot for world block (x, z).
#[inline]
pub fn chunk_slot_index(x: i64, z: i64) -> ChunkSlot {
    ChunkSlot {
        x: chunk_to_local(block_to_chunk(x)),
        z: chunk_to_local(block_to_chunk(z)),
    }
}
