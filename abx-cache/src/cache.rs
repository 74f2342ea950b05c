use crate::loader::scan_stimuli;
use abx_core::StimulusPool;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Holds the last scanned pool until it is explicitly rescanned.
///
/// Sessions take an `Arc` snapshot, so a rescan never changes a pool a
/// running session is sampling from.
#[derive(Debug)]
pub struct PoolCache {
    root: PathBuf,
    drivers: Vec<String>,
    pool: Option<Arc<StimulusPool>>,
}

impl PoolCache {
    pub fn new(root: impl Into<PathBuf>, drivers: Vec<String>) -> Self {
        Self {
            root: root.into(),
            drivers,
            pool: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the cached pool, scanning on first use
    pub fn get(&mut self) -> crate::Result<Arc<StimulusPool>> {
        match &self.pool {
            Some(pool) => Ok(Arc::clone(pool)),
            None => self.rescan(),
        }
    }

    pub fn rescan(&mut self) -> crate::Result<Arc<StimulusPool>> {
        debug!("rescanning {}", self.root.display());
        let pool = Arc::new(scan_stimuli(&self.root, &self.drivers)?);
        self.pool = Some(Arc::clone(&pool));
        Ok(pool)
    }

    pub fn invalidate(&mut self) {
        self.pool = None;
    }

    pub fn is_loaded(&self) -> bool {
        self.pool.is_some()
    }
}
