/*!
 * Intersection Traffic Control
 *
 * Lets simulated vehicle threads cross a four-way intersection concurrently
 * without collisions.
 *
 * # Architecture
 *
 * - **Direction / Path**: the four approaches and the 16 routes between them
 * - **Conflict rule**: pure predicate over pairs of paths, plus a policy that
 *   turns it into per-path forbids-sets
 * - **IntersectionGate**: monitor (one mutex, one condvar per origin) gating
 *   entry and exit
 * - **TrafficSimulation**: driver spawning vehicle threads and checking the
 *   safety property with a [`CrossingMonitor`]
 */

pub mod config;
pub mod conflict;
pub mod direction;
pub mod gate;
pub mod monitor;
pub mod simulation;
pub mod stats;

pub use config::SimulationConfig;
pub use conflict::{conflicts, ConflictPolicy, ConflictTable};
pub use direction::{Direction, Path};
pub use gate::{CrossingGuard, IntersectionGate, OccupancySnapshot};
pub use monitor::{CrossingMonitor, Violation};
pub use simulation::{SimulationReport, TrafficSimulation};
pub use stats::{GateStats, GateStatsSnapshot};
