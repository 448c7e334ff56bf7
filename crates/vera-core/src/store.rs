//! Trace persistence.
//!
//! Stores only ever hold sealed traces. Every trace is re-verified on the way
//! in and on the way out; a trace whose hashes no longer match is refused
//! with [`StoreError::Tampered`].

use crate::audit::AuditTrace;
use crate::ids::TraceId;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};
use vera_integrity::IntegrityError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("trace JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("trace {trace_id} failed integrity verification: {}", .mismatches.join(", "))]
    Tampered {
        trace_id: TraceId,
        mismatches: Vec<String>,
    },

    #[error("a different trace is already stored under {0}")]
    Conflict(TraceId),

    #[error("trace id {0:?} cannot be used as a file name")]
    InvalidId(String),

    #[error(transparent)]
    Integrity(#[from] IntegrityError),
}

fn ensure_intact(trace: &AuditTrace) -> Result<(), StoreError> {
    let report = trace.verify_integrity()?;
    if report.valid {
        Ok(())
    } else {
        Err(StoreError::Tampered {
            trace_id: trace.trace_id().clone(),
            mismatches: report.mismatches,
        })
    }
}

pub trait TraceStore: Send + Sync {
    /// Store a sealed trace. Saving the same trace twice is a no-op; saving a
    /// different trace under an existing id is a [`StoreError::Conflict`].
    fn save(&self, trace: &AuditTrace) -> Result<(), StoreError>;

    fn get(&self, id: &TraceId) -> Result<Option<AuditTrace>, StoreError>;

    /// All stored ids, sorted.
    fn list(&self) -> Result<Vec<TraceId>, StoreError>;

    /// `id` followed by each prior trace its recompute metadata points to,
    /// newest first. Stops at the first trace with no stored predecessor.
    fn lineage(&self, id: &TraceId) -> Result<Vec<AuditTrace>, StoreError> {
        let mut chain = Vec::new();
        let mut seen = BTreeSet::new();
        let mut next = Some(id.clone());
        while let Some(current) = next.take() {
            if !seen.insert(current.clone()) {
                break;
            }
            let Some(trace) = self.get(&current)? else {
                break;
            };
            next = trace
                .recompute_metadata()
                .and_then(|meta| meta.prior_trace_id.clone());
            chain.push(trace);
        }
        Ok(chain)
    }
}

// ============================================================================
// In-Memory
// ============================================================================

#[derive(Debug, Default)]
pub struct InMemoryTraceStore {
    traces: RwLock<BTreeMap<TraceId, AuditTrace>>,
}

impl InMemoryTraceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.traces.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.read().is_empty()
    }
}

impl TraceStore for InMemoryTraceStore {
    fn save(&self, trace: &AuditTrace) -> Result<(), StoreError> {
        ensure_intact(trace)?;
        let mut traces = self.traces.write();
        if let Some(existing) = traces.get(trace.trace_id()) {
            if existing.integrity() != trace.integrity() {
                return Err(StoreError::Conflict(trace.trace_id().clone()));
            }
            return Ok(());
        }
        traces.insert(trace.trace_id().clone(), trace.clone());
        debug!(trace_id = %trace.trace_id(), "stored trace in memory");
        Ok(())
    }

    fn get(&self, id: &TraceId) -> Result<Option<AuditTrace>, StoreError> {
        Ok(self.traces.read().get(id).cloned())
    }

    fn list(&self) -> Result<Vec<TraceId>, StoreError> {
        Ok(self.traces.read().keys().cloned().collect())
    }
}

// ============================================================================
// Directory
// ============================================================================

/// One pretty-printed `<traceId>.json` file per trace.
#[derive(Debug, Clone)]
pub struct DirectoryTraceStore {
    root: PathBuf,
}

impl DirectoryTraceStore {
    /// Open `root`, creating it if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| StoreError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &TraceId) -> Result<PathBuf, StoreError> {
        let raw = id.as_str();
        let safe = !raw.is_empty()
            && !raw.starts_with('.')
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !safe {
            return Err(StoreError::InvalidId(raw.to_string()));
        }
        Ok(self.root.join(format!("{raw}.json")))
    }

    /// Saving an identical trace twice is a no-op; anything else conflicts.
    fn matches_stored(&self, path: &Path, trace: &AuditTrace) -> Result<(), StoreError> {
        let existing = self.read(path)?;
        if existing.integrity() != trace.integrity() {
            return Err(StoreError::Conflict(trace.trace_id().clone()));
        }
        debug!(trace_id = %trace.trace_id(), "trace already stored");
        Ok(())
    }

    fn read(&self, path: &Path) -> Result<AuditTrace, StoreError> {
        let text = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let trace: AuditTrace = serde_json::from_str(&text).map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        ensure_intact(&trace)?;
        Ok(trace)
    }
}

impl TraceStore for DirectoryTraceStore {
    fn save(&self, trace: &AuditTrace) -> Result<(), StoreError> {
        ensure_intact(trace)?;
        let path = self.path_for(trace.trace_id())?;
        if path.exists() {
            return self.matches_stored(&path, trace);
        }

        let json = serde_json::to_string_pretty(trace).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        let io_err = |source: io::Error| StoreError::Io {
            path: self.root.clone(),
            source,
        };
        let mut staging = NamedTempFile::new_in(&self.root).map_err(io_err)?;
        staging.write_all(json.as_bytes()).map_err(io_err)?;
        staging.as_file().sync_all().map_err(io_err)?;

        // Publishing never replaces a file; a concurrent writer that got
        // there first decides the outcome.
        if let Err(err) = staging.persist_noclobber(&path) {
            if err.error.kind() == io::ErrorKind::AlreadyExists {
                return self.matches_stored(&path, trace);
            }
            return Err(StoreError::Io {
                path,
                source: err.error,
            });
        }

        info!(
            trace_id = %trace.trace_id(),
            path = %path.display(),
            "stored trace"
        );
        Ok(())
    }

    fn get(&self, id: &TraceId) -> Result<Option<AuditTrace>, StoreError> {
        let path = self.path_for(id)?;
        if !path.exists() {
            return Ok(None);
        }
        self.read(&path).map(Some)
    }

    fn list(&self) -> Result<Vec<TraceId>, StoreError> {
        let entries = fs::read_dir(&self.root).map_err(|source| StoreError::Io {
            path: self.root.clone(),
            source,
        })?;
        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Io {
                path: self.root.clone(),
                source,
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(TraceId::from(stem));
            }
        }
        ids.sort();
        Ok(ids)
    }
}
