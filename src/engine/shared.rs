//! Shared-read / exclusive-write access to one discovery index.

use std::sync::{Arc, RwLock};

use crate::index::DiscoveryIndex;
use crate::store::ContentStore;
use crate::types::{IndexConfig, IndexError, IndexResult, Operation};

use super::dispatch::{IndexContext, OperationDispatcher};
use super::maintainer::MaintenanceReport;

/// A discovery index that many readers and one writer can hold.
///
/// Each operation runs under the write lock start to finish; each read
/// closure runs under one read lock, so no mutation interleaves with it.
#[derive(Clone)]
pub struct SharedIndex {
    index: Arc<RwLock<DiscoveryIndex>>,
    dispatcher: Arc<OperationDispatcher>,
}

impl SharedIndex {
    /// Create an empty shared index.
    pub fn new(config: IndexConfig) -> Self {
        Self {
            index: Arc::new(RwLock::new(DiscoveryIndex::new())),
            dispatcher: Arc::new(OperationDispatcher::new(config)),
        }
    }

    /// Apply one committed operation under the write lock.
    pub fn apply(&self, store: &dyn ContentStore, op: &Operation) -> IndexResult<MaintenanceReport> {
        let mut guard = self.index.write().map_err(|_| IndexError::LockPoisoned)?;
        let mut ctx = IndexContext::new(&mut guard, store);
        self.dispatcher.apply(&mut ctx, op)
    }

    /// Run `f` against the index under a read lock.
    pub fn read<R>(&self, f: impl FnOnce(&DiscoveryIndex) -> R) -> IndexResult<R> {
        let guard = self.index.read().map_err(|_| IndexError::LockPoisoned)?;
        Ok(f(&guard))
    }
}
