/*!
 * Process Table
 *
 * Concurrent pid -> record map with a bounded number of live entries.
 * Records are handed out as `Arc`s, so a waiter that looked a record up keeps
 * it alive even after the table has dropped it.
 */

use super::record::ProcessRecord;
use crate::core::errors::KernelError;
use crate::core::id::{IdGenerator, PidGenerator};
use crate::core::types::{KernelResult, Pid};
use ahash::RandomState;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub struct ProcessTable {
    records: DashMap<Pid, Arc<ProcessRecord>, RandomState>,
    pids: PidGenerator,
    live: AtomicUsize,
    capacity: usize,
}

/// Reserved table slot and pid; released again unless committed
pub struct Reservation<'a> {
    table: &'a ProcessTable,
    pid: Option<Pid>,
}

impl Reservation<'_> {
    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid.unwrap_or_default()
    }

    /// Publish `record` under the reserved pid
    pub fn commit(mut self, record: Arc<ProcessRecord>) {
        if let Some(pid) = self.pid.take() {
            debug_assert_eq!(record.pid(), pid);
            self.table.records.insert(pid, record);
        }
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if let Some(pid) = self.pid.take() {
            self.table.pids.recycle(pid);
            self.table.live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl ProcessTable {
    pub fn new(capacity: usize) -> Self {
        Self::with_pids(capacity, PidGenerator::default())
    }

    pub fn with_pids(capacity: usize, pids: PidGenerator) -> Self {
        Self {
            records: DashMap::with_hasher(RandomState::new()),
            pids,
            live: AtomicUsize::new(0),
            capacity,
        }
    }

    /// Claim a slot and a pid for a new process
    pub fn reserve(&self) -> KernelResult<Reservation<'_>> {
        self.live
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < self.capacity).then(|| n + 1)
            })
            .map_err(|n| KernelError::out_of_memory(format!("process table full ({n} live)")))?;

        match self.pids.next() {
            Some(pid) => Ok(Reservation {
                table: self,
                pid: Some(pid),
            }),
            None => {
                self.live.fetch_sub(1, Ordering::SeqCst);
                Err(KernelError::out_of_memory("pid space exhausted"))
            }
        }
    }

    /// Insert a record under a fixed pid outside the allocator's range
    pub fn insert_fixed(&self, record: Arc<ProcessRecord>) -> KernelResult<()> {
        let pid = record.pid();
        self.live
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < self.capacity).then(|| n + 1)
            })
            .map_err(|_| KernelError::out_of_memory("process table full"))?;

        if self.records.contains_key(&pid) {
            self.live.fetch_sub(1, Ordering::SeqCst);
            return Err(KernelError::invalid_argument(format!("pid {pid} already in use")));
        }
        self.records.insert(pid, record);
        Ok(())
    }

    pub fn get(&self, pid: Pid) -> Option<Arc<ProcessRecord>> {
        self.records.get(&pid).map(|r| Arc::clone(r.value()))
    }

    /// Drop the record and make its pid available again
    pub fn remove(&self, pid: Pid) -> Option<Arc<ProcessRecord>> {
        let (_, record) = self.records.remove(&pid)?;
        self.live.fetch_sub(1, Ordering::SeqCst);
        if record.parent().is_some() {
            self.pids.recycle(pid);
        }
        Some(record)
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.records.contains_key(&pid)
    }

    /// Committed records; reservations not yet committed are not counted
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn pids(&self) -> Vec<Pid> {
        let mut pids: Vec<Pid> = self.records.iter().map(|r| *r.key()).collect();
        pids.sort_unstable();
        pids
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
