//! Memory accounting hooks shared by every cache in a query.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use serde::{Deserialize, Serialize};

use crate::errors::NeighbourError;

/// Global memory accounting for a query. Caches only ever raise or lower the counter.
pub trait ResourceMonitor {
    /// Charges `bytes`. Fails when the query would exceed its memory budget.
    fn increase_memory_usage(&self, bytes: usize) -> Result<(), NeighbourError>;

    fn decrease_memory_usage(&self, bytes: usize);
}

/// Monitor handle shared between the providers of one query.
pub type SharedMonitor = Arc<dyn ResourceMonitor + Send + Sync>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySnapshot {
    pub current: usize,
    pub peak: usize,
    pub limit: Option<usize>,
}

/// Atomic counter with an optional byte ceiling.
#[derive(Debug, Default)]
pub struct MemoryMonitor {
    current: AtomicUsize,
    peak: AtomicUsize,
    limit: Option<usize>,
}

impl MemoryMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn current(&self) -> usize {
        self.current.load(Ordering::Relaxed)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MemorySnapshot {
        MemorySnapshot {
            current: self.current(),
            peak: self.peak(),
            limit: self.limit,
        }
    }
}

impl ResourceMonitor for MemoryMonitor {
    fn increase_memory_usage(&self, bytes: usize) -> Result<(), NeighbourError> {
        let updated = self
            .current
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                let next = current.checked_add(bytes)?;
                match self.limit {
                    Some(limit) if next > limit => None,
                    _ => Some(next),
                }
            });
        match updated {
            Ok(previous) => {
                self.peak.fetch_max(previous + bytes, Ordering::Relaxed);
                Ok(())
            }
            Err(current) => Err(NeighbourError::ResourceLimitExceeded {
                requested: bytes,
                current,
                limit: self.limit.unwrap_or(usize::MAX),
            }),
        }
    }

    fn decrease_memory_usage(&self, bytes: usize) {
        let _ = self
            .current
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                Some(current.saturating_sub(bytes))
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_tracks_current_and_peak() {
        let monitor = MemoryMonitor::new();
        monitor.increase_memory_usage(100).unwrap();
        monitor.increase_memory_usage(50).unwrap();
        monitor.decrease_memory_usage(120);
        assert_eq!(
            monitor.snapshot(),
            MemorySnapshot {
                current: 30,
                peak: 150,
                limit: None
            }
        );
    }

    #[test]
    fn test_monitor_refuses_past_limit_without_charging() {
        let monitor = MemoryMonitor::with_limit(64);
        monitor.increase_memory_usage(60).unwrap();
        let err = monitor.increase_memory_usage(10).unwrap_err();
        assert!(matches!(
            err,
            NeighbourError::ResourceLimitExceeded {
                requested: 10,
                current: 60,
                limit: 64
            }
        ));
        assert_eq!(monitor.current(), 60);
    }

    #[test]
    fn test_monitor_decrease_saturates_at_zero() {
        let monitor = MemoryMonitor::new();
        monitor.increase_memory_usage(5).unwrap();
        monitor.decrease_memory_usage(10);
        assert_eq!(monitor.current(), 0);
    }
}
