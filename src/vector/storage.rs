//! Binary on-disk format for the similarity index matrix.
//!
//! # Storage Format
//!
//! - Header (48 bytes): magic `DVEC`, version, dimension, row count (u32 LE
//!   each), then the 32-byte fingerprint of the corpus the rows were built from
//! - Rows: contiguous f32 values in little-endian format, row-major
//!
//! Files are written to a temporary sibling and renamed into place, so a
//! reader never observes a half-written matrix. Reads go through a memory map.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use memmap2::MmapOptions;
use tempfile::NamedTempFile;

use crate::vector::{SimilarityIndex, VectorDimension, VectorError};

/// File name of the index matrix inside an index directory.
pub const INDEX_FILE_NAME: &str = "index.vec";

/// Current storage format version.
const STORAGE_VERSION: u32 = 1;

/// Magic bytes to identify index matrix files.
const MAGIC_BYTES: &[u8; 4] = b"DVEC";

/// Size of the storage header in bytes.
const HEADER_SIZE: usize = 48;

/// Number of bytes per f32 value.
const BYTES_PER_F32: usize = 4;

/// Fingerprint length stored in the header.
const FINGERPRINT_LEN: usize = 32;

/// Decoded contents of an index file.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredIndex {
    pub index: SimilarityIndex,
    pub fingerprint: [u8; FINGERPRINT_LEN],
}

/// Header fields, parsed before any row data is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Header {
    version: u32,
    dimension: usize,
    rows: usize,
    fingerprint: [u8; FINGERPRINT_LEN],
}

/// Reader/writer for the index matrix file of one index directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexFile {
    path: PathBuf,
}

impl IndexFile {
    /// Index file inside `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(INDEX_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Checks if the index file exists on disk.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Writes the whole matrix, replacing any previous file atomically.
    pub fn write(
        &self,
        index: &SimilarityIndex,
        fingerprint: &[u8; FINGERPRINT_LEN],
    ) -> Result<(), VectorError> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;

        let dimension = index.dimension().map_or(0, |d| d.get());
        let rows = index.len();
        let dimension_u32 = u32::try_from(dimension).map_err(|_| {
            VectorError::InvalidFormat(format!("dimension {dimension} does not fit the header"))
        })?;
        let rows_u32 = u32::try_from(rows).map_err(|_| {
            VectorError::InvalidFormat(format!("row count {rows} does not fit the header"))
        })?;

        let temp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            writer.write_all(MAGIC_BYTES)?;
            writer.write_all(&STORAGE_VERSION.to_le_bytes())?;
            writer.write_all(&dimension_u32.to_le_bytes())?;
            writer.write_all(&rows_u32.to_le_bytes())?;
            writer.write_all(fingerprint)?;

            for &value in index.as_slice() {
                writer.write_all(&value.to_le_bytes())?;
            }
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| VectorError::Storage(e.error))?;

        Ok(())
    }

    /// Reads and validates the matrix.
    ///
    /// Truncated files, bad magic bytes, unknown versions and length mismatches
    /// are all reported as format errors.
    pub fn read(&self) -> Result<StoredIndex, VectorError> {
        let file = File::open(&self.path)?;
        let len = file.metadata()?.len();
        if len < HEADER_SIZE as u64 {
            return Err(VectorError::InvalidFormat(
                "File too small to contain header".to_string(),
            ));
        }

        // SAFETY: the file is only ever replaced by rename, never modified in place
        let mmap = unsafe { MmapOptions::new().map(&file)? };
        let header = Self::read_header(&mmap)?;

        if header.version != STORAGE_VERSION {
            return Err(VectorError::VersionMismatch {
                expected: STORAGE_VERSION,
                actual: header.version,
            });
        }

        let value_count = header.rows.checked_mul(header.dimension).ok_or_else(|| {
            VectorError::InvalidFormat("Row count overflows the address space".to_string())
        })?;
        let expected_len = HEADER_SIZE + value_count * BYTES_PER_F32;
        if mmap.len() != expected_len {
            return Err(VectorError::InvalidFormat(format!(
                "Expected {expected_len} bytes for {} rows of width {}, found {}",
                header.rows,
                header.dimension,
                mmap.len()
            )));
        }

        if header.rows == 0 {
            return Ok(StoredIndex {
                index: SimilarityIndex::empty(),
                fingerprint: header.fingerprint,
            });
        }

        let dimension = VectorDimension::new(header.dimension)?;
        let data: Vec<f32> = mmap[HEADER_SIZE..]
            .chunks_exact(BYTES_PER_F32)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();

        Ok(StoredIndex {
            index: SimilarityIndex::from_raw_parts(dimension, data)?,
            fingerprint: header.fingerprint,
        })
    }

    /// Deletes the file if present.
    pub fn remove(&self) -> io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    fn read_header(bytes: &[u8]) -> Result<Header, VectorError> {
        // Check magic bytes
        if &bytes[0..4] != MAGIC_BYTES {
            return Err(VectorError::InvalidFormat(
                "Invalid magic bytes".to_string(),
            ));
        }

        let read_u32 = |at: usize| {
            u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };

        let mut fingerprint = [0u8; FINGERPRINT_LEN];
        fingerprint.copy_from_slice(&bytes[16..HEADER_SIZE]);

        Ok(Header {
            version: read_u32(4),
            dimension: read_u32(8) as usize,
            rows: read_u32(12) as usize,
            fingerprint,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> SimilarityIndex {
        SimilarityIndex::build(vec![vec![1.0, 2.0, 2.0], vec![0.0, 0.0, 0.0]]).unwrap()
    }

    #[test]
    fn test_write_and_read_matrix() {
        let temp_dir = TempDir::new().unwrap();
        let file = IndexFile::new(temp_dir.path());
        assert!(!file.exists());

        let index = sample();
        file.write(&index, &[7u8; 32]).unwrap();
        assert!(file.exists());

        let stored = file.read().unwrap();
        assert_eq!(stored.index, index);
        assert_eq!(stored.fingerprint, [7u8; 32]);
    }

    #[test]
    fn test_empty_index_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let file = IndexFile::new(temp_dir.path());

        file.write(&SimilarityIndex::empty(), &[0u8; 32]).unwrap();
        let stored = file.read().unwrap();
        assert!(stored.index.is_empty());
    }

    #[test]
    fn test_truncated_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let file = IndexFile::new(temp_dir.path());
        file.write(&sample(), &[1u8; 32]).unwrap();

        let bytes = std::fs::read(file.path()).unwrap();
        std::fs::write(file.path(), &bytes[..bytes.len() - 3]).unwrap();
        assert!(matches!(file.read(), Err(VectorError::InvalidFormat(_))));

        std::fs::write(file.path(), b"DVEC").unwrap();
        assert!(matches!(file.read(), Err(VectorError::InvalidFormat(_))));
    }

    #[test]
    fn test_bad_magic_and_version() {
        let temp_dir = TempDir::new().unwrap();
        let file = IndexFile::new(temp_dir.path());
        file.write(&sample(), &[1u8; 32]).unwrap();

        let mut bytes = std::fs::read(file.path()).unwrap();
        bytes[4] = 99;
        std::fs::write(file.path(), &bytes).unwrap();
        assert!(matches!(
            file.read(),
            Err(VectorError::VersionMismatch {
                expected: 1,
                actual: 99
            })
        ));

        bytes[0] = b'X';
        std::fs::write(file.path(), &bytes).unwrap();
        assert!(matches!(file.read(), Err(VectorError::InvalidFormat(_))));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let file = IndexFile::new(temp_dir.path());
        file.remove().unwrap();

        file.write(&sample(), &[0u8; 32]).unwrap();
        file.remove().unwrap();
        assert!(!file.exists());
    }
}
