//! The ordered set of tracked workers.
//!
//! The registry itself is not synchronized; it lives inside the output gate
//! so that a render pass sees an entry either fully registered or not at all.
//! The percentage each entry points at is owned by the worker and read
//! without the gate.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::errors::{ProgressError, Result};

/// Capacity of a fresh registry
pub const INITIAL_CAPACITY: usize = 10;
/// Growth factor applied when the registry is full
pub const GROWTH_FACTOR: usize = 2;

/// A worker-owned percentage (0 to 100) the monitor reads on every tick.
///
/// Cheap to clone; clones observe the same value.
#[derive(Debug, Clone, Default)]
pub struct SharedProgress(Arc<AtomicU8>);

impl SharedProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a percentage, clamped to 100
    pub fn set(&self, percent: u8) {
        self.0.store(percent.min(100), Ordering::Relaxed);
    }

    /// Stores `done * 100 / total`, clamped to 100. A zero total counts as done.
    pub fn set_ratio(&self, done: u64, total: u64) {
        let percent = if total == 0 {
            100
        } else {
            (u128::from(done) * 100 / u128::from(total)).min(100) as u8
        };
        self.set(percent);
    }

    pub fn get(&self) -> u8 {
        self.0.load(Ordering::Relaxed).min(100)
    }
}

/// One tracked worker
#[derive(Debug, Clone)]
pub struct ProgressSource {
    label: String,
    progress: SharedProgress,
    last_rendered: u8,
}

impl ProgressSource {
    /// Source labelled `Thread <id>`
    pub fn new(id: impl fmt::Display, progress: SharedProgress) -> Self {
        Self::labeled(format!("Thread {}", id), progress)
    }

    pub fn labeled(label: impl Into<String>, progress: SharedProgress) -> Self {
        Self {
            label: label.into(),
            progress,
            last_rendered: 0,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// The worker's current percentage
    pub fn current(&self) -> u8 {
        self.progress.get()
    }

    /// The percentage drawn by the last render pass
    pub fn last_rendered(&self) -> u8 {
        self.last_rendered
    }

    pub(crate) fn set_last_rendered(&mut self, percent: u8) {
        self.last_rendered = percent;
    }
}

/// Size counters exposed for instrumentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    pub len: usize,
    pub capacity: usize,
}

/// Growable, index-addressed list of sources with LIFO removal.
///
/// `capacity` is tracked explicitly: it starts at [`INITIAL_CAPACITY`] and
/// doubles exactly when an append finds the registry full.
#[derive(Debug)]
pub struct Registry {
    sources: Vec<ProgressSource>,
    capacity: usize,
    released: bool,
}

impl Registry {
    pub fn new() -> Result<Self> {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(ProgressError::config("Registry capacity can't be 0"));
        }
        let mut sources = Vec::new();
        sources
            .try_reserve_exact(capacity)
            .map_err(|_| ProgressError::Allocation { requested: capacity })?;
        Ok(Self {
            sources,
            capacity,
            released: false,
        })
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            len: self.len(),
            capacity: self.capacity,
        }
    }

    /// Fails when the registry was released or its counters are inconsistent.
    pub fn check(&self) -> Result<()> {
        if self.released {
            return Err(ProgressError::NotInitialized(
                "Threads info array is released".to_string(),
            ));
        }
        if self.sources.len() > self.capacity {
            return Err(ProgressError::config(format!(
                "Number of threads ({}) greater than dimension of threads info array ({})",
                self.sources.len(),
                self.capacity
            )));
        }
        Ok(())
    }

    /// Appends a source, doubling the capacity first when full.
    ///
    /// Returns the index of the new entry.
    pub fn add(&mut self, source: ProgressSource) -> Result<usize> {
        self.check()?;
        if self.sources.len() == self.capacity {
            let grown = self.capacity * GROWTH_FACTOR;
            self.sources
                .try_reserve_exact(grown - self.sources.len())
                .map_err(|_| ProgressError::Allocation { requested: grown })?;
            log::debug!("registry grown from {} to {} entries", self.capacity, grown);
            self.capacity = grown;
        }
        let index = self.sources.len();
        self.sources.push(source);
        Ok(index)
    }

    /// Removes the most recently added source.
    ///
    /// An empty registry is left alone and a warning is logged.
    pub fn remove_last(&mut self) -> Result<Option<ProgressSource>> {
        self.check()?;
        let removed = self.sources.pop();
        if removed.is_none() {
            log::warn!("[thread] there aren't threads to remove");
        }
        Ok(removed)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ProgressSource> {
        self.sources.iter_mut()
    }

    /// Frees the backing storage; every later operation fails.
    pub fn release(&mut self) {
        self.sources = Vec::new();
        self.released = true;
    }
}
