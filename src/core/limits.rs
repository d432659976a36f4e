/*!
 * System Limits and Constants
 *
 * Centralized location for kernel-wide limits, thresholds, and magic numbers.
 * Organized by domain for maintainability and discoverability.
 *
 * ## Conventions
 * - Values are grouped by domain (process, exec, traffic)
 * - Values inherited from the OS/161 userland ABI are marked with [OS161-COMPAT]
 */

use std::time::Duration;

// =============================================================================
// PROCESS LIMITS
// =============================================================================

/// Pid reserved for the kernel's root process
/// Every other process is forked (directly or indirectly) from it
pub const ROOT_PID: u32 = 1;

/// Smallest pid handed out by fork [OS161-COMPAT]
pub const PID_MIN: u32 = 2;

/// Largest pid handed out by fork [OS161-COMPAT]
pub const PID_MAX: u32 = 32767;

/// Default process table capacity
/// fork() fails with OutOfMemory once this many records are live
pub const DEFAULT_MAX_PROCESSES: usize = 256;

/// Exit status recorded for a forked process whose body panicked
pub const PANIC_EXIT_CODE: i32 = 255;

// =============================================================================
// EXEC LIMITS
// =============================================================================

/// Maximum size of the marshalled argument block in bytes [OS161-COMPAT]
pub const ARG_MAX: usize = 64 * 1024;

/// Maximum length of a program path including its terminator [OS161-COMPAT]
pub const PATH_MAX: usize = 1024;

/// Maximum number of argv entries read before giving up on a terminator
pub const MAX_ARGS: usize = 1024;

/// Width of a user pointer in bytes (32-bit MIPS userland) [OS161-COMPAT]
pub const USER_PTR_SIZE: usize = 4;

// =============================================================================
// TRAFFIC SIMULATION DEFAULTS
// =============================================================================

/// Vehicle threads spawned by the default simulation
pub const DEFAULT_VEHICLES: usize = 10;

/// Crossings each vehicle thread makes before finishing
pub const DEFAULT_CROSSINGS_PER_VEHICLE: usize = 20;

/// Upper bound on the time a vehicle spends inside the intersection
pub const DEFAULT_MAX_CROSSING_TIME: Duration = Duration::from_millis(2);

/// Upper bound on the pause between two crossings of the same vehicle
pub const DEFAULT_MAX_ARRIVAL_DELAY: Duration = Duration::from_millis(1);

/// Hard ceiling on vehicle threads for a single simulation run
pub const MAX_VEHICLES: usize = 1024;

/// Hard ceiling on crossings per vehicle for a single simulation run
pub const MAX_CROSSINGS_PER_VEHICLE: usize = 1_000_000;
