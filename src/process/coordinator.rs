/*!
 * Wait Coordinator
 *
 * Fork / exit / wait protocol over the process table.
 *
 * # Reclamation
 *
 * A record is removed from the table exactly once, when both hold:
 * - the process has exited, and
 * - its parent no longer needs the status (the parent waited for it, the
 *   parent exited, or there never was a parent).
 *
 * Whichever of the two events happens second performs the removal. Exiting
 * therefore never blocks, and a child whose parent waited for it is reclaimed
 * as soon as it finishes.
 */

use super::config::ProcessConfig;
use super::record::{ExitTransition, ProcessRecord};
use super::table::ProcessTable;
use super::types::{ProcessInfo, ProcessState};
use crate::core::errors::KernelError;
use crate::core::limits::ROOT_PID;
use crate::core::types::{ExitCode, KernelResult, Pid};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct WaitCoordinator {
    table: ProcessTable,
}

impl WaitCoordinator {
    pub fn new(config: ProcessConfig) -> Self {
        info!(max_processes = config.max_processes, "wait coordinator initialized");
        Self {
            table: ProcessTable::new(config.max_processes),
        }
    }

    /// Coordinator with the root process already registered
    pub fn with_root(config: ProcessConfig, name: &str) -> KernelResult<Self> {
        let coordinator = Self::new(config);
        coordinator.spawn_root(name)?;
        Ok(coordinator)
    }

    /// Register the parentless root process under [`ROOT_PID`]
    pub fn spawn_root(&self, name: &str) -> KernelResult<Pid> {
        self.table
            .insert_fixed(Arc::new(ProcessRecord::root(ROOT_PID, name)))?;
        debug!(pid = ROOT_PID, name, "root process registered");
        Ok(ROOT_PID)
    }

    /// Create a running child of `parent`; the parent holds a claim on it
    pub fn fork(&self, parent: Pid) -> KernelResult<Pid> {
        let parent_record = self.lookup(parent)?;
        if !parent_record.state().is_running() {
            return Err(KernelError::invalid_argument(format!(
                "process {parent} has exited and cannot fork"
            )));
        }

        let slot = self.table.reserve()?;
        let child = slot.pid();
        let record = Arc::new(ProcessRecord::child(child, parent, parent_record.name()));
        slot.commit(Arc::clone(&record));

        if !parent_record.add_child(child) {
            // Parent began exiting underneath us; nobody will ever wait for this child
            self.discard(parent, child);
            return Err(KernelError::invalid_argument(format!(
                "process {parent} is exiting and cannot fork"
            )));
        }

        debug!(parent, child, "process forked");
        Ok(child)
    }

    /// Undo a fork whose child never ran
    pub fn discard(&self, parent: Pid, child: Pid) {
        if let Some(parent_record) = self.table.get(parent) {
            parent_record.remove_child(child);
        }
        if self.table.remove(child).is_some() {
            debug!(parent, child, "forked process discarded");
        }
    }

    /// Terminate `pid` with `code`
    ///
    /// Marks the process exited, releases the claims it holds on its children
    /// and publishes the status to all waiters, then reclaims the record if
    /// its parent no longer needs it.
    /// Fails with `InvalidArgument` if the process already exited; when
    /// several threads race to exit one process exactly one of them succeeds.
    pub fn exit(&self, pid: Pid, code: ExitCode) -> KernelResult<()> {
        let record = self.lookup(pid)?;

        // Marked exited before the status is visible, so a parent woken by
        // the status always finds the record ready to reclaim
        let reap_now = match record.mark_exited() {
            ExitTransition::Exited { reap } => reap,
            ExitTransition::AlreadyExited => {
                return Err(KernelError::invalid_argument(format!(
                    "process {pid} already exited"
                )));
            }
        };

        for child in record.take_children() {
            if let Some(child_record) = self.table.get(child) {
                if child_record.release_claim() {
                    self.reap(child, "parent exited");
                }
            }
        }

        // Only the winner of mark_exited gets here
        if !record.publish_exit(code) {
            warn!(pid, code, "exit status was already published");
        }
        debug!(pid, code, "exit status published");

        if reap_now {
            self.reap(pid, "exited unclaimed");
        }
        Ok(())
    }

    /// Block until `target` exits and return its status
    ///
    /// `options` must be zero. A parent waiting for its own child relinquishes
    /// its claim, so the child's record can be reclaimed.
    pub fn wait(&self, caller: Pid, target: Pid, options: i32) -> KernelResult<ExitCode> {
        if options != 0 {
            return Err(KernelError::invalid_argument(format!(
                "unsupported wait options {options:#x}"
            )));
        }
        if caller == target {
            return Err(KernelError::invalid_argument(format!(
                "process {caller} cannot wait for itself"
            )));
        }

        let record = self.lookup(target)?;
        let code = record.wait_exit();

        if record.parent() == Some(caller) {
            if let Some(parent_record) = self.table.get(caller) {
                parent_record.remove_child(target);
            }
            if record.release_claim() {
                self.reap(target, "parent waited");
            }
        }

        debug!(caller, target, code, "wait completed");
        Ok(code)
    }

    pub fn state(&self, pid: Pid) -> Option<ProcessState> {
        self.table.get(pid).map(|r| r.state())
    }

    pub fn info(&self, pid: Pid) -> Option<ProcessInfo> {
        self.table.get(pid).map(|r| r.info())
    }

    /// Children of `pid` in fork order
    pub fn children(&self, pid: Pid) -> KernelResult<Vec<Pid>> {
        Ok(self.lookup(pid)?.children())
    }

    /// Threads blocked waiting for `pid` to exit
    pub fn waiters(&self, pid: Pid) -> usize {
        self.table.get(pid).map_or(0, |r| r.waiters())
    }

    /// Records currently in the table, exited but unreclaimed ones included
    pub fn live(&self) -> usize {
        self.table.record_count()
    }

    /// Most records the table holds at once
    #[inline]
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    pub fn exists(&self, pid: Pid) -> bool {
        self.table.contains(pid)
    }

    /// Live pids in ascending order
    pub fn processes(&self) -> Vec<Pid> {
        self.table.pids()
    }

    pub fn record(&self, pid: Pid) -> KernelResult<Arc<ProcessRecord>> {
        self.lookup(pid)
    }

    fn lookup(&self, pid: Pid) -> KernelResult<Arc<ProcessRecord>> {
        self.table.get(pid).ok_or(KernelError::NoSuchProcess(pid))
    }

    fn reap(&self, pid: Pid, cause: &'static str) {
        match self.table.remove(pid) {
            Some(_) => debug!(pid, cause, "process reaped"),
            None => warn!(pid, cause, "reaped process was not in the table"),
        }
    }
}

impl Default for WaitCoordinator {
    fn default() -> Self {
        Self::new(ProcessConfig::default())
    }
}
