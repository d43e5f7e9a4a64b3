//! Load-once cache of datasets keyed by the identity of their source file.
//!
//! A source is identified by its canonical path plus the file's size and modification
//! time. A changed file gets a new identity, so the next lookup reloads it.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use tracing::{debug, info};

use crate::dataset::Dataset;
use crate::error::LoadError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceId {
    pub path: PathBuf,
    pub len: u64,
    pub modified: Option<SystemTime>,
}

impl SourceId {
    pub fn of(path: &Path) -> Result<Self, LoadError> {
        let path = fs::canonicalize(path)?;
        let meta = fs::metadata(&path)?;
        Ok(SourceId {
            path,
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

/// Shares one read-only `Dataset` per source between callers.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: Mutex<HashMap<PathBuf, (SourceId, Arc<Dataset>)>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached dataset for `path`, loading it when absent or when the
    /// file changed since it was cached.
    pub fn get_or_load(&self, path: &Path) -> Result<Arc<Dataset>, LoadError> {
        let id = SourceId::of(path)?;
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        if let Some((cached_id, dataset)) = entries.get(&id.path) {
            if *cached_id == id {
                debug!(source = %id.path.display(), "dataset cache hit");
                return Ok(Arc::clone(dataset));
            }
            info!(source = %id.path.display(), "source changed, reloading dataset");
        }

        let dataset = Arc::new(Dataset::load(&id.path)?);
        entries.insert(id.path.clone(), (id, Arc::clone(&dataset)));
        Ok(dataset)
    }

    /// Drops the cached dataset for `path`. Returns whether an entry existed.
    pub fn invalidate(&self, path: &Path) -> bool {
        let key = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(&key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
