//! Window instance pooling
//!
//! Recycles destroyed windows per concrete class so dialogs that open and
//! close constantly don't rebuild their visuals every time. Free lists are
//! keyed by [`WindowKind`] and bounded by `max_pool_size`.

use std::collections::HashMap;
use std::fmt;

use casement_core::{Window, WindowArgs, WindowClass, WindowKind};

/// Why the pool refused an instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The class's free list is already full
    CapacityExceeded,
    /// The subtype's cleanup hook failed
    CleanupFailed(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::CapacityExceeded => write!(f, "pool capacity exceeded"),
            RejectReason::CleanupFailed(e) => write!(f, "cleanup failed: {}", e),
        }
    }
}

/// Outcome of [`WindowPool::return_window`]
#[derive(Debug)]
pub enum PoolReturn {
    Pooled,
    /// The instance is handed back; the caller must destroy it
    Rejected { window: Window, reason: RejectReason },
}

impl PoolReturn {
    pub fn is_pooled(&self) -> bool {
        matches!(self, PoolReturn::Pooled)
    }
}

/// Pool statistics for monitoring
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub created: u64,
    pub reused: u64,
    pub returned: u64,
    pub capacity_exceeded: u64,
    pub cleanup_failures: u64,
    pub trimmed: u64,
}

/// Per-class free lists of destroyed window instances
pub struct WindowPool {
    pools: HashMap<WindowKind, Vec<Window>>,
    max_pool_size: usize,
    stats: PoolStats,
}

impl fmt::Debug for WindowPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowPool")
            .field("classes", &self.pools.len())
            .field("pooled", &self.total_pooled())
            .field("max_pool_size", &self.max_pool_size)
            .field("stats", &self.stats)
            .finish()
    }
}

impl Default for WindowPool {
    fn default() -> Self {
        Self::new(50)
    }
}

impl WindowPool {
    /// Create a pool keeping at most `max_pool_size` instances per class
    pub fn new(max_pool_size: usize) -> Self {
        Self {
            pools: HashMap::new(),
            max_pool_size,
            stats: PoolStats::default(),
        }
    }

    /// Get a window of class `W` with identity `id`
    ///
    /// Pops a pooled instance and resets it when one exists, otherwise
    /// constructs a new one. The flag is `true` for a reused instance.
    pub fn get_window<W: WindowClass>(&mut self, id: &str, args: &WindowArgs) -> (Window, bool) {
        let kind = WindowKind::of::<W>();

        if let Some(mut window) = self.pools.get_mut(&kind).and_then(|v| v.pop()) {
            match window.reset_for_reuse(id, args) {
                Ok(()) => {
                    self.stats.reused += 1;
                    log::debug!(
                        "Reusing pooled {} as '{}' (reuses: {})",
                        kind.name(),
                        id,
                        self.stats.reused
                    );
                    return (window, true);
                }
                Err(e) => {
                    log::error!("Reset of pooled {} failed, constructing new: {:#}", kind.name(), e);
                    window.discard();
                }
            }
        }

        self.stats.created += 1;
        log::debug!(
            "Constructing new {} '{}' (created: {})",
            kind.name(),
            id,
            self.stats.created
        );
        (Window::new::<W>(id, args), false)
    }

    /// Offer a removed window back to the pool
    ///
    /// The window must already be out of the registry and off the stack.
    pub fn return_window(&mut self, mut window: Window) -> PoolReturn {
        let kind = window.kind();
        let max = self.max_pool_size;
        let pool = self.pools.entry(kind).or_default();

        if pool.len() >= max {
            self.stats.capacity_exceeded += 1;
            log::debug!("Pool full for {}, rejecting '{}'", kind.name(), window.id());
            return PoolReturn::Rejected {
                window,
                reason: RejectReason::CapacityExceeded,
            };
        }

        if let Err(e) = window.prepare_for_pool() {
            self.stats.cleanup_failures += 1;
            log::error!("Cleanup of '{}' for pooling failed: {:#}", window.id(), e);
            return PoolReturn::Rejected {
                window,
                reason: RejectReason::CleanupFailed(format!("{:#}", e)),
            };
        }

        self.stats.returned += 1;
        log::debug!(
            "Returning '{}' to {} pool (size: {})",
            window.id(),
            kind.name(),
            pool.len() + 1
        );
        pool.push(window);
        PoolReturn::Pooled
    }

    /// Trim every free list down to a quarter of `max_pool_size`
    ///
    /// Returns how many instances were discarded.
    pub fn optimize_pools(&mut self) -> usize {
        let keep = self.max_pool_size / 4;
        let mut trimmed = 0;
        for (kind, pool) in &mut self.pools {
            if pool.len() <= keep {
                continue;
            }
            for window in pool.drain(keep..) {
                window.discard();
                trimmed += 1;
            }
            log::debug!("Trimmed {} pool to {}", kind.name(), pool.len());
        }
        self.pools.retain(|_, pool| !pool.is_empty());
        self.stats.trimmed += trimmed as u64;
        if trimmed > 0 {
            log::info!("Pool optimization discarded {} idle windows", trimmed);
        }
        trimmed
    }

    /// Discard every pooled instance
    pub fn clear(&mut self) -> usize {
        let mut discarded = 0;
        for (_, pool) in self.pools.drain() {
            for window in pool {
                window.discard();
                discarded += 1;
            }
        }
        discarded
    }

    pub fn pooled_count(&self, kind: WindowKind) -> usize {
        self.pools.get(&kind).map_or(0, Vec::len)
    }

    pub fn total_pooled(&self) -> usize {
        self.pools.values().map(Vec::len).sum()
    }

    pub fn max_pool_size(&self) -> usize {
        self.max_pool_size
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }
}
