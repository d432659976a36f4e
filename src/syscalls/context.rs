/*!
 * Syscall Context
 * Per-process handle through which a thread issues process syscalls
 */

use crate::core::types::{KernelResult, Pid};
use crate::memory::UserMemory;
use crate::monitoring::SyscallSpan;
use crate::process::{ImageReplacer, WaitCoordinator};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// The calling process as seen by its syscalls
///
/// Each forked process receives its own context on its own thread. Contexts
/// share the coordinator and replacer; the address space belongs to one
/// process.
pub struct SyscallContext {
    pub(super) pid: Pid,
    pub(super) coordinator: Arc<WaitCoordinator>,
    pub(super) replacer: Arc<ImageReplacer>,
    pub(super) memory: Arc<UserMemory>,
}

impl SyscallContext {
    pub fn new(
        pid: Pid,
        coordinator: Arc<WaitCoordinator>,
        replacer: Arc<ImageReplacer>,
        memory: Arc<UserMemory>,
    ) -> Self {
        Self {
            pid,
            coordinator,
            replacer,
            memory,
        }
    }

    pub(super) fn child(&self, pid: Pid, memory: Arc<UserMemory>) -> Self {
        Self {
            pid,
            coordinator: Arc::clone(&self.coordinator),
            replacer: Arc::clone(&self.replacer),
            memory,
        }
    }

    /// Address space of the calling process
    pub fn memory(&self) -> &UserMemory {
        &self.memory
    }

    pub fn coordinator(&self) -> &Arc<WaitCoordinator> {
        &self.coordinator
    }
}

impl fmt::Debug for SyscallContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyscallContext")
            .field("pid", &self.pid)
            .field("mapped_bytes", &self.memory.mapped_bytes())
            .finish()
    }
}

/// Record the outcome of a syscall on its span
pub(super) fn finish<T>(span: &SyscallSpan, result: KernelResult<T>) -> KernelResult<T> {
    match &result {
        Ok(_) => span.record_ok(),
        Err(e) => {
            span.record_errno(e.errno());
            debug!(errno = e.errno(), error = %e, "syscall failed");
        }
    }
    result
}
