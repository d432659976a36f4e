/*!
 * Process Syscalls
 * fork, _exit, waitpid and getpid
 */

use super::context::{finish, SyscallContext};
use crate::core::errors::KernelError;
use crate::core::limits::PANIC_EXIT_CODE;
use crate::core::types::{ExitCode, KernelResult, Pid, WaitStatus};
use crate::memory::UserPtr;
use crate::monitoring::span_syscall;
use crate::process::ProcessRecord;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, warn};

impl SyscallContext {
    #[inline]
    pub fn getpid(&self) -> Pid {
        self.pid
    }

    /// Create a child process running `body` on its own thread
    ///
    /// The child starts with a copy of the caller's address space. The value
    /// `body` returns becomes its exit status unless it called `exit` itself.
    pub fn fork<F>(&self, body: F) -> KernelResult<Pid>
    where
        F: FnOnce(SyscallContext) -> ExitCode + Send + 'static,
    {
        let span = span_syscall("fork", self.pid);
        let _entered = span.enter();
        finish(&span, self.spawn_child(body))
    }

    fn spawn_child<F>(&self, body: F) -> KernelResult<Pid>
    where
        F: FnOnce(SyscallContext) -> ExitCode + Send + 'static,
    {
        let memory = Arc::new(self.memory.duplicate()?);
        let child = self.coordinator.fork(self.pid)?;
        let record = self.coordinator.record(child)?;
        let ctx = self.child(child, memory);

        let spawned = thread::Builder::new()
            .name(format!("pid-{child}"))
            .spawn(move || run_child(ctx, record, body));

        if let Err(e) = spawned {
            self.coordinator.discard(self.pid, child);
            return Err(KernelError::out_of_memory(format!(
                "cannot start thread for process {child}: {e}"
            )));
        }

        debug!(parent = self.pid, child, "child thread started");
        Ok(child)
    }

    /// Terminate the calling process with `code`
    pub fn exit(self, code: ExitCode) -> KernelResult<()> {
        let span = span_syscall("_exit", self.pid);
        let _entered = span.enter();
        finish(&span, self.coordinator.exit(self.pid, code))
    }

    /// Wait for `pid` to exit and store its encoded status at `status`
    ///
    /// A null `status` discards the status. The status is written after the
    /// wait completes, so a bad pointer fails the call only once the target
    /// has already been collected.
    pub fn waitpid(&self, pid: Pid, status: UserPtr, options: i32) -> KernelResult<Pid> {
        let span = span_syscall("waitpid", self.pid);
        let _entered = span.enter();

        let result = self
            .coordinator
            .wait(self.pid, pid, options)
            .and_then(|code| {
                if !status.is_null() {
                    let encoded = WaitStatus::exited(code).raw();
                    self.memory.copyout(status, &encoded.to_le_bytes())?;
                }
                Ok(pid)
            });
        finish(&span, result)
    }
}

fn run_child<F>(ctx: SyscallContext, record: Arc<ProcessRecord>, body: F)
where
    F: FnOnce(SyscallContext) -> ExitCode,
{
    let pid = ctx.pid;
    let coordinator = Arc::clone(&ctx.coordinator);

    let code = match panic::catch_unwind(AssertUnwindSafe(move || body(ctx))) {
        Ok(code) => code,
        Err(_) => {
            error!(pid, "process body panicked");
            PANIC_EXIT_CODE
        }
    };

    // The body may already have called exit itself
    if record.state().is_terminated() {
        return;
    }
    if let Err(e) = coordinator.exit(pid, code) {
        warn!(pid, error = %e, "implicit exit failed");
    }
}
