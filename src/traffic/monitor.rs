/*!
 * Crossing Monitor
 *
 * Independent bookkeeping of which vehicles are inside the intersection,
 * used by the simulation to check that the gate never admits a vehicle onto
 * a path that one already inside forbids under the active policy.
 *
 * Overlaps the policy exempts but the plain conflict rule would flag (a
 * U-turn next to conflicting traffic under the directional policy) are
 * counted separately and are not violations.
 */

use super::conflict::{conflicts, ConflictPolicy, ConflictTable};
use super::direction::Path;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::error;

/// A vehicle admitted onto a path forbidden by one already inside
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub entering: Path,
    pub occupied: Path,
}

#[derive(Debug, Default)]
struct MonitorState {
    inside: [u32; Path::COUNT],
    concurrent: u32,
    max_concurrent: u32,
    exempt_overlaps: u64,
    violations: Vec<Violation>,
}

/// Records arrivals and departures reported by vehicle threads
#[derive(Debug)]
pub struct CrossingMonitor {
    table: ConflictTable,
    state: Mutex<MonitorState>,
}

impl CrossingMonitor {
    /// Monitor checking the symmetric conflict rule
    pub fn new() -> Self {
        Self::with_policy(ConflictPolicy::default())
    }

    /// Monitor checking the same forbids-sets a gate with `policy` enforces
    pub fn with_policy(policy: ConflictPolicy) -> Self {
        Self {
            table: policy.table(),
            state: Mutex::new(MonitorState::default()),
        }
    }

    #[inline]
    pub fn policy(&self) -> ConflictPolicy {
        self.table.policy()
    }

    /// Vehicle is now inside on `path`; returns false if an occupant forbids it
    pub fn arrive(&self, path: Path) -> bool {
        let mut state = self.state.lock();
        let mut clean = true;

        for occupied in Path::all() {
            if state.inside[occupied.index()] == 0 {
                continue;
            }
            if self.table.mask(occupied) & (1 << path.index()) != 0 {
                error!(entering = %path, occupied = %occupied, "forbidden path admitted into intersection");
                state.violations.push(Violation {
                    entering: path,
                    occupied,
                });
                clean = false;
            } else if conflicts(path, occupied) {
                state.exempt_overlaps += 1;
            }
        }

        state.inside[path.index()] += 1;
        state.concurrent += 1;
        state.max_concurrent = state.max_concurrent.max(state.concurrent);
        clean
    }

    /// Vehicle on `path` has left
    pub fn depart(&self, path: Path) {
        let mut state = self.state.lock();
        let inside = &mut state.inside[path.index()];
        *inside = inside.saturating_sub(1);
        state.concurrent = state.concurrent.saturating_sub(1);
    }

    pub fn violations(&self) -> Vec<Violation> {
        self.state.lock().violations.clone()
    }

    /// Conflicting overlaps the policy allowed
    pub fn exempt_overlaps(&self) -> u64 {
        self.state.lock().exempt_overlaps
    }

    /// Largest number of vehicles seen inside at once
    pub fn max_concurrent(&self) -> u32 {
        self.state.lock().max_concurrent
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().concurrent == 0
    }
}

impl Default for CrossingMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traffic::direction::Direction::*;

    #[test]
    fn test_compatible_paths_are_clean() {
        let monitor = CrossingMonitor::new();
        assert!(monitor.arrive(Path::new(North, South)));
        assert!(monitor.arrive(Path::new(South, North)));
        assert_eq!(monitor.max_concurrent(), 2);

        monitor.depart(Path::new(North, South));
        monitor.depart(Path::new(South, North));
        assert!(monitor.is_empty());
        assert!(monitor.violations().is_empty());
    }

    #[test]
    fn test_conflict_is_recorded() {
        let monitor = CrossingMonitor::new();
        monitor.arrive(Path::new(North, South));
        assert!(!monitor.arrive(Path::new(East, West)));
        assert_eq!(
            monitor.violations(),
            vec![Violation {
                entering: Path::new(East, West),
                occupied: Path::new(North, South),
            }]
        );
    }

    #[test]
    fn test_directional_u_turn_beside_traffic_is_exempt() {
        let monitor = CrossingMonitor::with_policy(ConflictPolicy::Directional);
        let through = Path::new(North, South);
        let u_turn = Path::new(East, East);
        assert!(conflicts(u_turn, through));

        assert!(monitor.arrive(through));
        assert!(monitor.arrive(u_turn));
        assert!(monitor.violations().is_empty());
        assert_eq!(monitor.exempt_overlaps(), 1);
    }

    #[test]
    fn test_directional_u_turn_still_blocks_others() {
        let monitor = CrossingMonitor::with_policy(ConflictPolicy::Directional);
        monitor.arrive(Path::new(East, East));
        assert!(!monitor.arrive(Path::new(North, South)));
        assert_eq!(monitor.violations().len(), 1);
        assert_eq!(monitor.exempt_overlaps(), 0);
    }

    #[test]
    fn test_symmetric_flags_u_turn_overlap() {
        let monitor = CrossingMonitor::new();
        monitor.arrive(Path::new(North, South));
        assert!(!monitor.arrive(Path::new(East, East)));
        assert_eq!(monitor.policy(), ConflictPolicy::Symmetric);
    }
}
