/*!
 * Lock-Free Gate Statistics
 * Atomic counters updated on the gate's entry/exit paths
 */

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic gate statistics
///
/// # Performance
/// - Cache-line aligned to prevent false sharing
/// - All operations use relaxed ordering; snapshots are approximate while
///   vehicles are still moving
#[repr(C, align(64))]
#[derive(Debug, Default)]
pub struct GateStats {
    admitted: AtomicU64,
    contended: AtomicU64,
    waits: AtomicU64,
    departed: AtomicU64,
    broadcasts: AtomicU64,
}

/// Point-in-time copy of [`GateStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GateStatsSnapshot {
    /// Vehicles let into the intersection
    pub admitted: u64,
    /// Admissions that had to wait at least once
    pub contended: u64,
    /// Condition-variable waits (a contended admission may wait repeatedly)
    pub waits: u64,
    /// Vehicles that left the intersection
    pub departed: u64,
    /// Per-origin broadcasts issued when a counter dropped to zero
    pub broadcasts: u64,
}

impl GateStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub(super) fn inc_admitted(&self, waited: u64) {
        self.admitted.fetch_add(1, Ordering::Relaxed);
        if waited > 0 {
            self.contended.fetch_add(1, Ordering::Relaxed);
            self.waits.fetch_add(waited, Ordering::Relaxed);
        }
    }

    #[inline(always)]
    pub(super) fn inc_departed(&self) {
        self.departed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub(super) fn inc_broadcasts(&self) {
        self.broadcasts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> GateStatsSnapshot {
        GateStatsSnapshot {
            admitted: self.admitted.load(Ordering::Relaxed),
            contended: self.contended.load(Ordering::Relaxed),
            waits: self.waits.load(Ordering::Relaxed),
            departed: self.departed.load(Ordering::Relaxed),
            broadcasts: self.broadcasts.load(Ordering::Relaxed),
        }
    }
}

impl GateStatsSnapshot {
    /// Vehicles admitted but not yet departed
    #[inline]
    pub fn inside(&self) -> u64 {
        self.admitted.saturating_sub(self.departed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let stats = GateStats::new();
        stats.inc_admitted(0);
        stats.inc_admitted(3);
        stats.inc_departed();
        stats.inc_broadcasts();

        let snap = stats.snapshot();
        assert_eq!(snap.admitted, 2);
        assert_eq!(snap.contended, 1);
        assert_eq!(snap.waits, 3);
        assert_eq!(snap.inside(), 1);
        assert_eq!(snap.broadcasts, 1);
    }
}
