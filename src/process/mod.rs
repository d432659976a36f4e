/*!
 * Process Module
 * Process records, the process table, and the fork / exit / wait protocol
 */

pub mod config;
pub mod coordinator;
pub mod execution;
pub mod record;
pub mod table;
pub mod types;

// Re-export for convenience
pub use config::ProcessConfig;
pub use coordinator::WaitCoordinator;
pub use execution::{ArgBlock, ImageReplacer, LoadedImage, ProgramLoader, ProgramRegistry};
pub use record::{ExitTransition, ProcessRecord};
pub use table::{ProcessTable, Reservation};
pub use types::{ProcessInfo, ProcessState};
