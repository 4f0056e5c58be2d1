//! Read-only access to Anvil region files (.mca).
//!
//! Region files contain 32x32 chunks in a specific binary format:
//! - Bytes 0-4095: Location table (1024 entries × 4 bytes)
//! - Bytes 4096-8191: Timestamp table (1024 entries × 4 bytes)
//! - Bytes 8192+: Chunk data (variable size sectors)

use std::time::Instant;

use flate2::{Decompress, FlushDecompress, Status};

pub mod coords;
pub mod error;
pub mod region;

pub use coords::{ChunkSlot, RegionPos, WorldPos};
pub use error::{RegionError, Result};
pub use region::{ChunkPayload, LocationEntry, RegionFile};

pub const SECTOR_BYTES: u64 = 4096; // minecraft uses 4096 bytes per sector
pub const HEADER_BYTES: u64 = 8192; // header is 8192 bytes (2 sectors 8kb)

/// Entries in each header table.
pub const SLOT_COUNT: usize = 1024;

/// Chunk payload framing: [Length: 4][Type: 1][Data...]
pub const CHUNK_HEADER_BYTES: usize = 5;

/// Widest integer `decode_unsigned` will produce.
pub const MAX_DECODE_BYTES: usize = 8;

/// Decode the first `count` bytes of `bytes` as a big-endian unsigned integer.
pub fn decode_unsigned(bytes: &[u8], count: usize) -> Result<u64> {
    if count == 0 || count > MAX_DECODE_BYTES {
        return Err(RegionError::InvalidArgument(format!(
            "byte count must be 1..={}, got {}",
            MAX_DECODE_BYTES, count
        )));
    }
    if count > bytes.len() {
        return Err(RegionError::InvalidArgument(format!(
            "need {} bytes, only {} available",
            count,
            bytes.len()
        )));
    }
    Ok(bytes[..count]
        .iter()
        .fold(0u64, |acc, &b| (acc << 8) | b as u64))
}

/// Compression types used in Minecraft Anvil format
pub mod compression {
    pub const GZIP: u8 = 1;
    pub const ZLIB: u8 = 2;
    pub const NONE: u8 = 3;

    /// Set on the type byte when the payload lives in an external .mcc file.
    pub const EXTERNAL_FLAG: u8 = 0x80;
}

/// Compression scheme named by a chunk's type byte.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Compression {
    Gzip,
    Zlib,
    None,
}

impl Compression {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            compression::GZIP => Some(Compression::Gzip),
            compression::ZLIB => Some(Compression::Zlib),
            compression::NONE => Some(Compression::None),
            _ => None,
        }
    }
}

/// Decompress a chunk payload into its NBT byte stream.
/// Supports ZLib (2) and None (3); every other type byte is reported unsupported.
pub fn decompress_chunk(tag: u8, data: &[u8]) -> Result<Vec<u8>> {
    match Compression::from_tag(tag) {
        Some(Compression::Zlib) => inflate_zlib(data),
        Some(Compression::None) => Ok(data.to_vec()),
        Some(Compression::Gzip) | None => Err(RegionError::UnsupportedCompression(tag)),
    }
}

fn inflate_zlib(data: &[u8]) -> Result<Vec<u8>> {
    let start = Instant::now();
    let mut inflater = Decompress::new(true);
    let mut out = Vec::with_capacity(data.len().saturating_mul(4).max(1024));

    loop {
        if out.len() == out.capacity() {
            out.reserve(out.capacity());
        }
        let before_in = inflater.total_in();
        let before_out = inflater.total_out();
        let input = &data[before_in as usize..];

        let status = inflater
            .decompress_vec(input, &mut out, FlushDecompress::None)
            .map_err(|e| RegionError::DecompressionFailure(e.to_string()))?;

        match status {
            Status::StreamEnd => break,
            Status::Ok | Status::BufError => {
                // Output space was available, so no progress means the input ran out.
                if inflater.total_in() == before_in && inflater.total_out() == before_out {
                    return Err(RegionError::DecompressionFailure(format!(
                        "zlib stream truncated after {} of {} bytes",
                        before_in,
                        data.len()
                    )));
                }
            }
        }
    }

    log::trace!(
        "Inflated {} -> {} bytes in {:?}",
        data.len(),
        out.len(),
        start.elapsed()
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression as ZlibCompression;
    use flate2::write::{GzEncoder, ZlibEncoder};
    use std::io::Write;

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), ZlibCompression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_decode_unsigned_widths() {
        for count in 1..=8usize {
            let max = if count == 8 { u64::MAX } else { (1u64 << (8 * count)) - 1 };
            for value in [0u64, 1, max / 3, max] {
                let bytes = value.to_be_bytes();
                assert_eq!(decode_unsigned(&bytes[8 - count..], count).unwrap(), value);
            }
        }
    }

    #[test]
    fn test_decode_unsigned_sector_offset() {
        // Three byte sector offset followed by the sector count.
        let entry = [0x01, 0x02, 0x03, 0x04];
        assert_eq!(decode_unsigned(&entry, 3).unwrap(), 0x010203);
        assert_eq!(decode_unsigned(&entry[3..], 1).unwrap(), 4);
        // High bit bytes must not sign-extend.
        assert_eq!(decode_unsigned(&[0xFF, 0x80], 2).unwrap(), 0xFF80);
    }

    #[test]
    fn test_decode_unsigned_invalid_count() {
        let bytes = [0u8; 16];
        assert!(matches!(decode_unsigned(&bytes, 0), Err(RegionError::InvalidArgument(_))));
        assert!(matches!(decode_unsigned(&bytes, 9), Err(RegionError::InvalidArgument(_))));
        assert!(matches!(decode_unsigned(&bytes[..2], 3), Err(RegionError::InvalidArgument(_))));
    }

    #[test]
    fn test_decompress_zlib() {
        let plain: Vec<u8> = (0..50_000u32).map(|i| (i % 251) as u8).collect();
        let out = decompress_chunk(compression::ZLIB, &zlib(&plain)).unwrap();
        assert_eq!(out, plain);
    }

    #[test]
    fn test_decompress_zlib_high_ratio() {
        for len in [8192usize, 65536, 1 << 20] {
            let plain = vec![0u8; len];
            let stream = zlib(&plain);
            assert!(stream.len() * 4 < len);
            assert_eq!(decompress_chunk(compression::ZLIB, &stream).unwrap(), plain);
        }
    }

    #[test]
    fn test_decompress_zlib_empty_plaintext() {
        let out = decompress_chunk(compression::ZLIB, &zlib(&[])).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_decompress_none_is_passthrough() {
        let data = [9u8, 8, 7];
        assert_eq!(decompress_chunk(compression::NONE, &data).unwrap(), data.to_vec());
    }

    #[test]
    fn test_decompress_corrupt_zlib() {
        let err = decompress_chunk(compression::ZLIB, &[0xDE, 0xAD, 0xBE, 0xEF, 0x00]).unwrap_err();
        assert!(matches!(err, RegionError::DecompressionFailure(_)));
    }

    #[test]
    fn test_decompress_truncated_zlib() {
        let plain: Vec<u8> = (0..10_000u32).map(|i| (i * 7 % 256) as u8).collect();
        let stream = zlib(&plain);
        let err = decompress_chunk(compression::ZLIB, &stream[..stream.len() / 2]).unwrap_err();
        assert!(matches!(err, RegionError::DecompressionFailure(_)));
    }

    #[test]
    fn test_gzip_is_unsupported() {
        let mut encoder = GzEncoder::new(Vec::new(), ZlibCompression::default());
        encoder.write_all(b"hello").unwrap();
        let gz = encoder.finish().unwrap();
        assert!(matches!(
            decompress_chunk(compression::GZIP, &gz),
            Err(RegionError::UnsupportedCompression(1))
        ));
    }

    #[test]
    fn test_unknown_tags_are_unsupported() {
        for tag in [0u8, 4, 9, compression::ZLIB | compression::EXTERNAL_FLAG] {
            match decompress_chunk(tag, &[]) {
                Err(RegionError::UnsupportedCompression(t)) => assert_eq!(t, tag),
                other => panic!("tag {}: unexpected {:?}", tag, other),
            }
        }
    }

    #[test]
    fn test_compression_tags() {
        assert_eq!(Compression::from_tag(compression::GZIP), Some(Compression::Gzip));
        assert_eq!(Compression::from_tag(compression::ZLIB), Some(Compression::Zlib));
        assert_eq!(Compression::from_tag(compression::NONE), Some(Compression::None));
        assert_eq!(Compression::from_tag(4), None);
    }
}
