//! Durable append-only data point log
//!
//! ## Overview
//!
//! Converted readings first land in an in-memory pending list. Periodically
//! the pending list is merged into a JSON array file on disk, which is the
//! only persisted state of the whole system and the historical record
//! served by the read-only responder.
//!
//! ## Flush protocol
//!
//! ```text
//! flush_to_file(state)
//!   ├─ state does not permit flush ──▶ Suppressed (file and pending untouched)
//!   ├─ pending empty ────────────────▶ NothingPending
//!   ├─ read file
//!   │    ├─ missing / empty ─────────▶ treat as []
//!   │    ├─ unreadable ──────────────▶ Err(Read)
//!   │    └─ not a point array ───────▶ Err(Corrupt)
//!   ├─ existing ++ pending
//!   ├─ write sibling temp file, fsync, rename over target
//!   │    └─ any step fails ──────────▶ Err(Write), pending kept
//!   └─ clear pending ────────────────▶ Written
//! ```
//!
//! Pending points are only dropped after the rename succeeds, so retrying a
//! failed flush never duplicates entries. Points still pending when the
//! process dies are lost; the file holds whatever was last written.
//!
//! The rename makes each rewrite atomic for readers: the responder sees
//! either the previous array or the new one, never a partial file.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::datapoint::DataPoint;
use crate::errors::{StorageError, StorageResult};
use crate::transmission::TransmissionState;

/// Result of a flush attempt that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Delivery state blocked persistence
    Suppressed,
    /// Nothing was waiting to be written
    NothingPending,
    /// Pending points were merged into the file
    Written {
        /// Points appended by this flush
        appended: usize,
        /// Points in the file afterwards
        total: usize,
    },
}

/// Pending buffer plus its durable JSON array file
#[derive(Debug)]
pub struct DataPointLog {
    path: PathBuf,
    pending: Vec<DataPoint>,
}

impl DataPointLog {
    /// Log backed by the file at `path`; the file need not exist yet
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pending: Vec::new(),
        }
    }

    /// Durable file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Queue a point for the next flush
    pub fn add(&mut self, point: DataPoint) {
        self.pending.push(point);
    }

    /// Points not yet confirmed durable, oldest first
    pub fn pending(&self) -> &[DataPoint] {
        &self.pending
    }

    /// Merge pending points into the durable file
    ///
    /// No-op unless `state` permits persistence. On any error the file is
    /// left as it was and the pending points stay queued.
    pub fn flush_to_file(&mut self, state: TransmissionState) -> StorageResult<FlushOutcome> {
        if !state.permits_flush() {
            log::debug!(
                "flush suppressed ({:?}), {} points held",
                state,
                self.pending.len()
            );
            return Ok(FlushOutcome::Suppressed);
        }
        if self.pending.is_empty() {
            return Ok(FlushOutcome::NothingPending);
        }

        let mut combined = self.read_persisted()?;
        combined.extend_from_slice(&self.pending);

        let encoded = serde_json::to_vec(&combined).map_err(StorageError::Encode)?;
        write_atomically(&self.path, &encoded).map_err(|source| StorageError::Write {
            path: self.path.clone(),
            source,
        })?;

        let appended = self.pending.len();
        self.pending.clear();
        log::info!(
            "saved {} points to {} ({} total)",
            appended,
            self.path.display(),
            combined.len()
        );

        Ok(FlushOutcome::Written {
            appended,
            total: combined.len(),
        })
    }

    /// Current content of the durable file
    ///
    /// A missing or blank file reads as an empty array.
    pub fn read_persisted(&self) -> StorageResult<Vec<DataPoint>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }
}

/// Replace `path` with `bytes` through a synced sibling temp file
fn write_atomically(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp = temp_path(path);
    let result = (|| {
        let mut file = File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
