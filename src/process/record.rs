/*!
 * Process Record
 *
 * Per-process state shared between the process's own thread, its parent, and
 * any waiters. Two independent locks:
 *
 * - the **exit lock** (with its condition variable) publishes the exit status;
 * - the **lifecycle lock** guards the child set, the parent's claim and the
 *   reclamation state.
 *
 * No code path holds both at once.
 */

use super::types::{ProcessInfo, ProcessState};
use crate::core::types::{ExitCode, Pid};
use parking_lot::{Condvar, Mutex, RwLock};

/// Result of asking a record to leave the running state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitTransition {
    /// Some earlier call already moved the process out of `Running`
    AlreadyExited,
    /// This call moved it to `Exited`; `reap` is set when nobody holds a claim
    Exited { reap: bool },
}

#[derive(Debug, Default)]
struct ExitSlot {
    code: Option<ExitCode>,
    waiters: usize,
}

#[derive(Debug)]
struct Lifecycle {
    state: ProcessState,
    /// Parent has not yet given up interest in this record's status
    parent_claim: bool,
    /// Closed once the process starts exiting
    accepting_children: bool,
    children: Vec<Pid>,
}

pub struct ProcessRecord {
    pid: Pid,
    parent: Option<Pid>,
    name: RwLock<String>,
    exit: Mutex<ExitSlot>,
    exited: Condvar,
    lifecycle: Mutex<Lifecycle>,
}

impl ProcessRecord {
    /// Record for a forked child; the parent holds a claim from creation
    pub fn child(pid: Pid, parent: Pid, name: impl Into<String>) -> Self {
        Self::new(pid, Some(parent), name.into())
    }

    /// Record for a process with no parent to claim it
    pub fn root(pid: Pid, name: impl Into<String>) -> Self {
        Self::new(pid, None, name.into())
    }

    fn new(pid: Pid, parent: Option<Pid>, name: String) -> Self {
        Self {
            pid,
            parent,
            name: RwLock::new(name),
            exit: Mutex::new(ExitSlot::default()),
            exited: Condvar::new(),
            lifecycle: Mutex::new(Lifecycle {
                state: ProcessState::Running,
                parent_claim: parent.is_some(),
                accepting_children: true,
                children: Vec::new(),
            }),
        }
    }

    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    #[inline]
    pub fn parent(&self) -> Option<Pid> {
        self.parent
    }

    pub fn name(&self) -> String {
        self.name.read().clone()
    }

    pub fn rename(&self, name: impl Into<String>) {
        *self.name.write() = name.into();
    }

    // ------------------------------------------------------------------
    // Exit lock
    // ------------------------------------------------------------------

    /// Store the exit status and wake every waiter
    ///
    /// Returns false if a status was already published.
    pub fn publish_exit(&self, code: ExitCode) -> bool {
        let mut slot = self.exit.lock();
        if slot.code.is_some() {
            return false;
        }
        slot.code = Some(code);
        self.exited.notify_all();
        true
    }

    /// Block until the process has exited and return its status
    pub fn wait_exit(&self) -> ExitCode {
        let mut slot = self.exit.lock();
        slot.waiters += 1;
        let code = loop {
            if let Some(code) = slot.code {
                break code;
            }
            self.exited.wait(&mut slot);
        };
        slot.waiters -= 1;
        code
    }

    /// Exit status if already published
    pub fn exit_code(&self) -> Option<ExitCode> {
        self.exit.lock().code
    }

    /// Threads currently blocked in [`ProcessRecord::wait_exit`]
    pub fn waiters(&self) -> usize {
        self.exit.lock().waiters
    }

    // ------------------------------------------------------------------
    // Lifecycle lock
    // ------------------------------------------------------------------

    pub fn state(&self) -> ProcessState {
        self.lifecycle.lock().state
    }

    /// Append a freshly forked child; refused once the process is exiting
    pub fn add_child(&self, child: Pid) -> bool {
        let mut lifecycle = self.lifecycle.lock();
        if !lifecycle.accepting_children {
            return false;
        }
        lifecycle.children.push(child);
        true
    }

    pub fn remove_child(&self, child: Pid) -> bool {
        let mut lifecycle = self.lifecycle.lock();
        match lifecycle.children.iter().position(|c| *c == child) {
            Some(index) => {
                lifecycle.children.remove(index);
                true
            }
            None => false,
        }
    }

    /// Children in fork order
    pub fn children(&self) -> Vec<Pid> {
        self.lifecycle.lock().children.clone()
    }

    /// Empty the child set and stop accepting new children
    pub fn take_children(&self) -> Vec<Pid> {
        let mut lifecycle = self.lifecycle.lock();
        lifecycle.accepting_children = false;
        std::mem::take(&mut lifecycle.children)
    }

    /// Parent gives up its claim; returns true if the record must be reaped now
    pub fn release_claim(&self) -> bool {
        let mut lifecycle = self.lifecycle.lock();
        if !lifecycle.parent_claim {
            return false;
        }
        lifecycle.parent_claim = false;
        Self::reap_if_done(&mut lifecycle)
    }

    /// Process finished executing
    ///
    /// Exactly one call per record returns [`ExitTransition::Exited`].
    pub fn mark_exited(&self) -> ExitTransition {
        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.state != ProcessState::Running {
            return ExitTransition::AlreadyExited;
        }
        lifecycle.state = ProcessState::Exited;
        ExitTransition::Exited {
            reap: Self::reap_if_done(&mut lifecycle),
        }
    }

    fn reap_if_done(lifecycle: &mut Lifecycle) -> bool {
        if lifecycle.state == ProcessState::Exited && !lifecycle.parent_claim {
            lifecycle.state = ProcessState::Reaped;
            true
        } else {
            false
        }
    }

    pub fn info(&self) -> ProcessInfo {
        let exit_code = self.exit_code();
        let name = self.name();
        let lifecycle = self.lifecycle.lock();
        ProcessInfo {
            pid: self.pid,
            parent: self.parent,
            name,
            state: lifecycle.state,
            children: lifecycle.children.clone(),
            exit_code,
            claimed: lifecycle.parent_claim,
        }
    }
}

impl std::fmt::Debug for ProcessRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessRecord")
            .field("pid", &self.pid)
            .field("parent", &self.parent)
            .finish_non_exhaustive()
    }
}
