//! Memory-bounded, disk-backed sink for abundance sample rows.
//!
//! Producers submit whole batches of rows. Rows are staged in memory in
//! component-major order and, whenever staging fills up, written out as one
//! contiguous run per component at the positions given by
//! [`SampleMatrixLayout::offset`]. The lock is held for the whole batch, so a
//! producer's rows are contiguous in the output and a full staging area blocks
//! the submitting thread until it has been drained.
//!
//! The matrix is written to a temporary file next to the destination and only
//! renamed into place by [`SampleBuffer::finalize`]. A run that fails or is
//! dropped early leaves nothing at the destination path.

use crate::errors::CiError;
use crate::sample_matrix::{BYTES_PER_VALUE, SampleMatrixLayout};
use anyhow::{Context, Result};
use log::debug;
use parking_lot::Mutex;
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const BYTES_PER_MB: u64 = 1 << 20;

struct BufferState {
    /// Staged next to `path`; removed on drop unless persisted.
    file: NamedTempFile,
    /// `staging[i * capacity_rows + k]` holds component `i` of staged row `k`.
    staging: Vec<f32>,
    staged_rows: usize,
    written_rows: u64,
    bytes: Vec<u8>,
}

/// A bounded buffer writing the feature-major sample matrix.
pub struct SampleBuffer {
    path: PathBuf,
    layout: SampleMatrixLayout,
    capacity_rows: usize,
    state: Mutex<BufferState>,
}

impl SampleBuffer {
    /// Number of rows a staging area of `memory_mb` megabytes can hold, capped at
    /// the number of rows the matrix will contain.
    #[must_use]
    pub fn capacity_for(layout: &SampleMatrixLayout, memory_mb: u64) -> usize {
        let rows = memory_mb * BYTES_PER_MB / BYTES_PER_VALUE / layout.width() as u64;
        rows.min(layout.samples()) as usize
    }

    /// Create a temporary file beside `path`, sized for the full matrix, and an
    /// empty staging area.
    ///
    /// # Errors
    ///
    /// Returns an error if the memory budget cannot hold a single row or the
    /// temporary file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P, layout: SampleMatrixLayout, memory_mb: u64) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let capacity_rows = Self::capacity_for(&layout, memory_mb);
        if capacity_rows == 0 {
            return Err(CiError::InvalidParameter {
                parameter: "buffer-memory".to_string(),
                reason: format!(
                    "{memory_mb} MB cannot hold one row of {} values",
                    layout.width()
                ),
            }
            .into());
        }

        let parent = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let file = NamedTempFile::new_in(parent)
            .with_context(|| format!("Failed to create sample matrix in: {}", parent.display()))?;
        file.as_file()
            .set_len(layout.total_bytes())
            .with_context(|| format!("Failed to size sample matrix: {}", file.path().display()))?;

        debug!(
            "Sample buffer holds {capacity_rows} of {} rows ({} components)",
            layout.samples(),
            layout.width()
        );

        let state = BufferState {
            file,
            staging: vec![0.0; capacity_rows * layout.width()],
            staged_rows: 0,
            written_rows: 0,
            bytes: Vec::with_capacity(capacity_rows * BYTES_PER_VALUE as usize),
        };
        Ok(Self { path, layout, capacity_rows, state: Mutex::new(state) })
    }

    /// Rows held in memory before a drain.
    #[must_use]
    pub fn capacity_rows(&self) -> usize {
        self.capacity_rows
    }

    /// Append a batch of rows. Blocks while another producer is submitting, and
    /// drains to disk whenever staging fills.
    ///
    /// # Errors
    ///
    /// Returns an error if a row has the wrong width, the batch would exceed the
    /// declared number of rows, or a drain fails. Nothing is staged on a
    /// validation error.
    pub fn submit(&self, rows: &[Vec<f32>]) -> Result<()> {
        let width = self.layout.width();
        if let Some(row) = rows.iter().find(|r| r.len() != width) {
            return Err(CiError::InvalidParameter {
                parameter: "rows".to_string(),
                reason: format!("row has {} values, expected {width}", row.len()),
            }
            .into());
        }

        let mut state = self.state.lock();
        let pending = state.written_rows + state.staged_rows as u64 + rows.len() as u64;
        if pending > self.layout.samples() {
            return Err(CiError::SampleCountMismatch {
                expected: self.layout.samples(),
                actual: pending,
                action: "submitted",
            }
            .into());
        }

        for row in rows {
            if state.staged_rows == self.capacity_rows {
                self.drain(&mut state)?;
            }
            let k = state.staged_rows;
            for (i, &value) in row.iter().enumerate() {
                state.staging[i * self.capacity_rows + k] = value;
            }
            state.staged_rows += 1;
        }
        Ok(())
    }

    /// Drain what is left, verify every row arrived, sync the file to disk and
    /// move it to the destination path. Must only be called once all producers
    /// are done.
    ///
    /// # Errors
    ///
    /// Returns an error if the final drain, sync or rename fails, or if fewer
    /// rows than declared were written. The destination is untouched on error.
    pub fn finalize(self) -> Result<u64> {
        let Self { path, layout, capacity_rows, state } = self;
        let mut state = state.into_inner();
        Self::write_staged(&path, &layout, capacity_rows, &mut state)?;

        if state.written_rows != layout.samples() {
            return Err(CiError::SampleCountMismatch {
                expected: layout.samples(),
                actual: state.written_rows,
                action: "written",
            }
            .into());
        }
        state
            .file
            .as_file()
            .sync_all()
            .with_context(|| format!("Failed to sync sample matrix: {}", path.display()))?;
        state
            .file
            .persist(&path)
            .map_err(|e| e.error)
            .with_context(|| format!("Failed to move sample matrix into place: {}", path.display()))?;
        Ok(state.written_rows)
    }

    fn drain(&self, state: &mut BufferState) -> Result<()> {
        Self::write_staged(&self.path, &self.layout, self.capacity_rows, state)
    }

    /// Write each component's staged run to its slot in the matrix.
    fn write_staged(
        path: &Path,
        layout: &SampleMatrixLayout,
        capacity_rows: usize,
        state: &mut BufferState,
    ) -> Result<()> {
        let staged = state.staged_rows;
        if staged == 0 {
            return Ok(());
        }
        for i in 0..layout.width() {
            let run = &state.staging[i * capacity_rows..i * capacity_rows + staged];
            state.bytes.clear();
            for value in run {
                state.bytes.extend_from_slice(&value.to_le_bytes());
            }
            let offset = layout.offset(i, state.written_rows);
            state
                .file
                .seek(SeekFrom::Start(offset))
                .and_then(|_| state.file.write_all(&state.bytes))
                .with_context(|| format!("Failed to write sample matrix at byte {offset}: {}", path.display()))?;
        }
        state.written_rows += staged as u64;
        state.staged_rows = 0;
        Ok(())
    }
}
