/*!
 * Intersection Gate
 *
 * Monitor admitting vehicles onto paths through a four-way intersection.
 *
 * # Protocol
 *
 * One mutex guards a per-path forbidding counter. A vehicle may enter path Q
 * only while Q's counter is zero; on entry it increments the counter of every
 * path its own path forbids (see [`ConflictTable`]), on exit it decrements
 * them again. Waiters park on the condition variable of their origin, and an
 * exit broadcasts the origin of every path whose counter dropped to zero.
 *
 * One condition variable is shared by all destinations of an origin, so
 * wake-ups are broadcasts and every woken vehicle re-checks its own counter.
 */

use super::conflict::{ConflictPolicy, ConflictTable};
use super::direction::{Direction, Path};
use super::stats::{GateStats, GateStatsSnapshot};
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Counters protected by the gate lock
#[derive(Debug, Default)]
struct Occupancy {
    /// Vehicles currently inside that forbid the path at each index
    forbidding: [u32; Path::COUNT],
    /// Vehicles currently inside on the path at each index
    inside: [u32; Path::COUNT],
}

impl Occupancy {
    #[inline(always)]
    fn is_blocked(&self, path: Path) -> bool {
        self.forbidding[path.index()] != 0
    }
}

/// Copy of the gate counters taken under the lock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancySnapshot {
    forbidding: [u32; Path::COUNT],
    inside: [u32; Path::COUNT],
}

impl OccupancySnapshot {
    /// Forbidding counter of `path`
    #[inline]
    pub fn forbidding(&self, path: Path) -> u32 {
        self.forbidding[path.index()]
    }

    /// Vehicles inside on `path`
    #[inline]
    pub fn inside(&self, path: Path) -> u32 {
        self.inside[path.index()]
    }

    /// Counters laid out as `matrix[origin][destination]`
    pub fn matrix(&self) -> [[u32; 4]; 4] {
        let mut matrix = [[0; 4]; 4];
        for path in Path::all() {
            matrix[path.origin.index()][path.destination.index()] = self.forbidding(path);
        }
        matrix
    }

    pub fn total_inside(&self) -> u32 {
        self.inside.iter().sum()
    }

    pub fn is_idle(&self) -> bool {
        self.total_inside() == 0 && self.forbidding.iter().all(|c| *c == 0)
    }
}

/// Four-way intersection controller
pub struct IntersectionGate {
    state: Mutex<Occupancy>,
    /// One condition variable per origin, indexed by [`Direction::index`]
    origin_cvs: [Condvar; 4],
    table: ConflictTable,
    stats: GateStats,
}

impl IntersectionGate {
    /// Create a gate using the symmetric conflict policy
    pub fn new() -> Self {
        Self::with_policy(ConflictPolicy::default())
    }

    pub fn with_policy(policy: ConflictPolicy) -> Self {
        debug!(?policy, "intersection gate initialized");
        Self {
            state: Mutex::new(Occupancy::default()),
            origin_cvs: [Condvar::new(), Condvar::new(), Condvar::new(), Condvar::new()],
            table: policy.table(),
            stats: GateStats::new(),
        }
    }

    #[inline]
    pub fn policy(&self) -> ConflictPolicy {
        self.table.policy()
    }

    /// Block until a vehicle may enter on `origin -> destination`, then admit it
    pub fn enter(&self, origin: Direction, destination: Direction) {
        let path = Path::new(origin, destination);
        let mut state = self.state.lock();

        let mut waited = 0;
        while state.is_blocked(path) {
            waited += 1;
            self.origin_cvs[origin.index()].wait(&mut state);
        }
        self.admit(&mut state, path);
        drop(state);

        self.stats.inc_admitted(waited);
        debug!(%path, waited, "vehicle entered intersection");
    }

    /// Admit a vehicle only if its path is clear right now
    pub fn try_enter(&self, origin: Direction, destination: Direction) -> bool {
        let path = Path::new(origin, destination);
        let mut state = self.state.lock();

        if state.is_blocked(path) {
            return false;
        }
        self.admit(&mut state, path);
        drop(state);

        self.stats.inc_admitted(0);
        debug!(%path, "vehicle entered intersection without waiting");
        true
    }

    /// Release the paths a departing vehicle was blocking and wake their origins
    ///
    /// # Panics
    /// A departure on a path with no vehicle inside is a broken caller, and is
    /// treated as a fatal kernel assertion.
    pub fn exit(&self, origin: Direction, destination: Direction) {
        let path = Path::new(origin, destination);
        let mut state = self.state.lock();

        let inside = &mut state.inside[path.index()];
        assert!(*inside > 0, "vehicle left on {path} without entering");
        *inside -= 1;

        let mut cleared_origins = 0u8;
        for blocked in self.table.forbidden(path) {
            let counter = &mut state.forbidding[blocked.index()];
            *counter -= 1;
            if *counter == 0 {
                cleared_origins |= 1 << blocked.origin.index();
            }
        }

        for direction in Direction::ALL {
            if cleared_origins & (1 << direction.index()) != 0 {
                self.origin_cvs[direction.index()].notify_all();
                self.stats.inc_broadcasts();
            }
        }
        drop(state);

        self.stats.inc_departed();
        debug!(%path, "vehicle left intersection");
    }

    /// Enter and return a guard that exits when dropped
    pub fn cross(&self, origin: Direction, destination: Direction) -> CrossingGuard<'_> {
        self.enter(origin, destination);
        CrossingGuard {
            gate: self,
            path: Path::new(origin, destination),
        }
    }

    /// Copy of the counters
    pub fn snapshot(&self) -> OccupancySnapshot {
        let state = self.state.lock();
        OccupancySnapshot {
            forbidding: state.forbidding,
            inside: state.inside,
        }
    }

    /// No vehicle inside and every counter back at zero
    pub fn is_idle(&self) -> bool {
        self.snapshot().is_idle()
    }

    /// Occupied paths and their vehicle counts, in path index order
    pub fn occupants(&self) -> Vec<(Path, u32)> {
        let state = self.state.lock();
        Path::all()
            .map(|path| (path, state.inside[path.index()]))
            .filter(|(_, n)| *n > 0)
            .collect()
    }

    pub fn stats(&self) -> GateStatsSnapshot {
        self.stats.snapshot()
    }

    /// Final report when the simulation is done with the gate
    pub fn shutdown(&self) -> GateStatsSnapshot {
        let snapshot = self.snapshot();
        if !snapshot.is_idle() {
            warn!(
                inside = snapshot.total_inside(),
                "intersection gate shut down with vehicles inside"
            );
        }
        self.stats.snapshot()
    }

    fn admit(&self, state: &mut Occupancy, path: Path) {
        for blocked in self.table.forbidden(path) {
            state.forbidding[blocked.index()] += 1;
        }
        state.inside[path.index()] += 1;
    }
}

impl Default for IntersectionGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Vehicle inside the intersection; leaves when dropped
#[must_use = "the vehicle leaves the intersection as soon as the guard is dropped"]
pub struct CrossingGuard<'a> {
    gate: &'a IntersectionGate,
    path: Path,
}

impl CrossingGuard<'_> {
    #[inline]
    pub fn path(&self) -> Path {
        self.path
    }
}

impl Drop for CrossingGuard<'_> {
    fn drop(&mut self) {
        self.gate.exit(self.path.origin, self.path.destination);
    }
}
