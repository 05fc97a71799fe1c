//! On-disk layout of the sample matrix and a seekable per-feature reader.
//!
//! The matrix is feature-major: every component `i` in `0..=M` (0 = background)
//! owns a contiguous run of `samples` little-endian `f32` values starting at byte
//! `i * samples * 4`. Row `r` of component `i` sits at `i * samples * 4 + r * 4`.

use crate::errors::CiError;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Size in bytes of one stored sample value.
pub const BYTES_PER_VALUE: u64 = 4;

/// Dimensions of a sample matrix and the byte offsets derived from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleMatrixLayout {
    width: usize,
    samples: u64,
}

impl SampleMatrixLayout {
    /// Create a layout for `width` components (`M + 1`) of `samples` rows each.
    ///
    /// # Errors
    ///
    /// Returns an error if either dimension is zero.
    pub fn new(width: usize, samples: u64) -> crate::errors::Result<Self> {
        if width == 0 {
            return Err(CiError::InvalidParameter {
                parameter: "width".to_string(),
                reason: "sample matrix needs at least one component".to_string(),
            });
        }
        if samples == 0 {
            return Err(CiError::InvalidParameter {
                parameter: "samples".to_string(),
                reason: "sample matrix needs at least one sample row".to_string(),
            });
        }
        Ok(Self { width, samples })
    }

    /// Recover the layout of an existing matrix from its size on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the length is not a positive multiple of one row.
    pub fn from_file_len(width: usize, len: u64) -> crate::errors::Result<Self> {
        let row_bytes = width as u64 * BYTES_PER_VALUE;
        if width == 0 || len == 0 || len % row_bytes != 0 {
            return Err(CiError::InvalidParameter {
                parameter: "sample-matrix".to_string(),
                reason: format!("{len} bytes is not a whole number of {width}-component rows"),
            });
        }
        Self::new(width, len / row_bytes)
    }

    /// Number of components (`M + 1`).
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of sample rows (`nCV * nSpC`).
    #[must_use]
    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Byte offset of the first value of component `i`.
    #[must_use]
    pub fn feature_offset(&self, i: usize) -> u64 {
        i as u64 * self.samples * BYTES_PER_VALUE
    }

    /// Byte offset of row `r` of component `i`.
    #[must_use]
    pub fn offset(&self, i: usize, r: u64) -> u64 {
        self.feature_offset(i) + r * BYTES_PER_VALUE
    }

    /// Total size of the matrix in bytes.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.feature_offset(self.width)
    }
}

/// Sequential reader over the per-component runs of a finished sample matrix.
///
/// Each Phase II worker owns one of these; the cursor is private.
pub struct SampleMatrixReader {
    path: PathBuf,
    layout: SampleMatrixLayout,
    reader: BufReader<File>,
    scratch: Vec<u8>,
}

impl SampleMatrixReader {
    /// Open a matrix, checking its size matches `layout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or has the wrong length.
    pub fn open<P: AsRef<Path>>(path: P, layout: SampleMatrixLayout) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)
            .with_context(|| format!("Failed to open sample matrix: {}", path.display()))?;
        let len = file
            .metadata()
            .with_context(|| format!("Failed to stat sample matrix: {}", path.display()))?
            .len();
        if len != layout.total_bytes() {
            return Err(CiError::InvalidFileFormat {
                file_type: "sample matrix".to_string(),
                path: path.display().to_string(),
                reason: format!("expected {} bytes, found {len}", layout.total_bytes()),
            }
            .into());
        }
        let scratch = vec![0u8; (layout.samples() * BYTES_PER_VALUE) as usize];
        Ok(Self { path, layout, reader: BufReader::new(file), scratch })
    }

    /// Position the cursor at the start of component `i`.
    ///
    /// # Errors
    ///
    /// Returns an error if the seek fails.
    pub fn seek_to_feature(&mut self, i: usize) -> Result<()> {
        let offset = self.layout.feature_offset(i);
        self.reader
            .seek(SeekFrom::Start(offset))
            .with_context(|| format!("Failed to seek to byte {offset} in {}", self.path.display()))?;
        Ok(())
    }

    /// Read the run at the cursor into `out` and advance to the next component.
    ///
    /// # Errors
    ///
    /// Returns an error if `out` is not exactly one run long or the read fails.
    pub fn read_feature(&mut self, out: &mut [f32]) -> Result<()> {
        if out.len() as u64 != self.layout.samples() {
            return Err(CiError::InvalidParameter {
                parameter: "out".to_string(),
                reason: format!("buffer holds {} values, run has {}", out.len(), self.layout.samples()),
            }
            .into());
        }
        self.reader
            .read_exact(&mut self.scratch)
            .with_context(|| format!("Failed to read sample run from {}", self.path.display()))?;
        for (value, bytes) in out.iter_mut().zip(self.scratch.chunks_exact(BYTES_PER_VALUE as usize)) {
            *value = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        }
        Ok(())
    }
}
