/*!
 * Process Types
 * Common types for process lifecycle coordination
 */

use crate::core::types::{ExitCode, Pid};
use serde::{Deserialize, Serialize};

/// Reclamation state of a process record
///
/// `Running -> Exited -> Reaped`, or `Running -> Reaped` directly when nobody
/// holds a claim on the record by the time the process exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    /// Process thread is still executing
    Running,
    /// Process has exited; record kept until its parent relinquishes it
    Exited,
    /// Record removed from the process table
    Reaped,
}

impl ProcessState {
    #[inline(always)]
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, ProcessState::Running)
    }

    #[inline(always)]
    #[must_use]
    pub const fn is_terminated(self) -> bool {
        matches!(self, ProcessState::Exited | ProcessState::Reaped)
    }
}

/// Point-in-time view of a process record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProcessInfo {
    pub pid: Pid,
    pub parent: Option<Pid>,
    pub name: String,
    pub state: ProcessState,
    /// Children in fork order
    pub children: Vec<Pid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<ExitCode>,
    /// Parent still holds its claim on this record
    pub claimed: bool,
}
