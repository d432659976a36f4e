/*!
 * Synch Kernel Library
 * Intersection gate, process wait coordination, and exec() argument
 * marshalling exposed as a library
 */

pub mod core;
pub mod memory;
pub mod monitoring;
pub mod process;
pub mod syscalls;
pub mod traffic;

// Re-exports
pub use crate::core::errors::{errno, KernelError};
pub use crate::core::limits;
pub use crate::core::types::{ExitCode, KernelResult, Pid, WaitStatus};
pub use memory::{UserMemory, UserPtr};
pub use monitoring::init_tracing;
pub use process::{
    ArgBlock, ImageReplacer, LoadedImage, ProcessConfig, ProcessInfo, ProcessState,
    ProgramLoader, ProgramRegistry, WaitCoordinator,
};
pub use syscalls::SyscallContext;
pub use traffic::{
    ConflictPolicy, Direction, IntersectionGate, Path, SimulationConfig, SimulationReport,
    TrafficSimulation,
};
