//! Directory-backed region source.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use mcregion_anvil::{RegionError, Result};

use crate::RegionSource;

/// Reads `r.<x>.<z>.mca` files from one directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl RegionSource for DirectorySource {
    fn read_region(&self, name: &str) -> Result<Vec<u8>> {
        read_whole_file(&self.root.join(name))
    }
}

/// Read a file into one exactly-sized buffer.
pub fn read_whole_file(path: &Path) -> Result<Vec<u8>> {
    let not_found = |source: io::Error| RegionError::RegionFileNotFound {
        path: path.to_path_buf(),
        source,
    };
    let io_failure = |source: io::Error| RegionError::IoFailure {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(not_found)?;
    let metadata = file.metadata().map_err(io_failure)?;
    if !metadata.is_file() {
        return Err(not_found(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a regular file",
        )));
    }
    read_exact_len(file, metadata.len(), path)
}

/// Read exactly `expected` bytes from `reader` into a buffer allocated up front.
fn read_exact_len(reader: impl Read, expected: u64, path: &Path) -> Result<Vec<u8>> {
    let io_failure = |source: io::Error| RegionError::IoFailure {
        path: path.to_path_buf(),
        source,
    };

    let out_of_memory = || RegionError::OutOfMemory {
        path: path.to_path_buf(),
        bytes: expected,
    };

    let mut buffer = Vec::new();
    // Allocation is fallible here, unlike `fs::read`.
    let capacity = usize::try_from(expected).map_err(|_| out_of_memory())?;
    buffer.try_reserve_exact(capacity).map_err(|_| out_of_memory())?;

    let read = reader
        .take(expected)
        .read_to_end(&mut buffer)
        .map_err(io_failure)?;

    if read as u64 != expected {
        return Err(io_failure(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("short read: got {} of {} bytes", read, expected),
        )));
    }

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("r.0.0.mca"), vec![7u8; 8192]).unwrap();

        let source = DirectorySource::new(dir.path());
        let bytes = source.read_region("r.0.0.mca").unwrap();
        assert_eq!(bytes.len(), 8192);
        assert!(bytes.iter().all(|b| *b == 7));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirectorySource::new(dir.path());
        assert!(matches!(
            source.read_region("r.5.5.mca"),
            Err(RegionError::RegionFileNotFound { .. })
        ));
    }

    #[test]
    fn test_short_read_is_io_failure() {
        let bytes = [0u8; 10];
        let err = read_exact_len(&bytes[..], 4096, Path::new("r.0.0.mca")).unwrap_err();
        match err {
            RegionError::IoFailure { source, .. } => {
                assert_eq!(source.kind(), io::ErrorKind::UnexpectedEof)
            }
            other => panic!("expected IoFailure, got {:?}", other),
        }
    }

    #[test]
    fn test_failed_read_is_io_failure() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::other("device gone"))
            }
        }
        assert!(matches!(
            read_exact_len(Broken, 4096, Path::new("r.0.0.mca")),
            Err(RegionError::IoFailure { .. })
        ));
    }

    #[test]
    fn test_unallocatable_length_is_out_of_memory() {
        let err = read_exact_len(io::empty(), u64::MAX, Path::new("r.0.0.mca")).unwrap_err();
        match err {
            RegionError::OutOfMemory { bytes, .. } => assert_eq!(bytes, u64::MAX),
            other => panic!("expected OutOfMemory, got {:?}", other),
        }
    }

    #[test]
    fn test_exact_length_read() {
        let bytes = vec![3u8; 8192];
        assert_eq!(read_exact_len(&bytes[..], 8192, Path::new("r.0.0.mca")).unwrap(), bytes);
    }

    #[test]
    fn test_directory_is_not_a_region() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("r.0.0.mca")).unwrap();
        let source = DirectorySource::new(dir.path());
        assert!(matches!(
            source.read_region("r.0.0.mca"),
            Err(RegionError::RegionFileNotFound { .. })
        ));
    }
}
