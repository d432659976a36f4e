/*!
 * Image Replacement
 *
 * Marshals exec() arguments out of caller memory into an [`ArgBlock`] and
 * hands the result to a [`ProgramLoader`].
 *
 * Every string is measured first, the scratch buffer is sized once from the
 * total, and then each string is copied exactly once. Measuring and copying
 * are separate passes over memory the caller may still be writing to, so a
 * string that grows in between is caught by the bounded copy.
 */

use super::args::ArgBlock;
use crate::core::errors::KernelError;
use crate::core::limits::{ARG_MAX, MAX_ARGS, PATH_MAX, USER_PTR_SIZE};
use crate::core::types::{KernelResult, Pid};
use crate::memory::{UserMemory, UserPtr};
use ahash::RandomState;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Outcome of a successful image load
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedImage {
    pub pid: Pid,
    pub program: String,
    pub argc: usize,
    pub entry: UserPtr,
}

/// Replaces a process image with the program named by an [`ArgBlock`]
pub trait ProgramLoader: Send + Sync {
    fn load(&self, pid: Pid, image: &ArgBlock) -> KernelResult<LoadedImage>;
}

/// In-kernel table of loadable programs keyed by path
#[derive(Debug, Default)]
pub struct ProgramRegistry {
    programs: RwLock<HashMap<String, UserPtr, RandomState>>,
}

impl ProgramRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, path: impl Into<String>, entry: UserPtr) -> &Self {
        self.programs.write().insert(path.into(), entry);
        self
    }

    pub fn contains(&self, path: &str) -> bool {
        self.programs.read().contains_key(path)
    }
}

impl ProgramLoader for ProgramRegistry {
    fn load(&self, pid: Pid, image: &ArgBlock) -> KernelResult<LoadedImage> {
        let entry = self
            .programs
            .read()
            .get(image.program())
            .copied()
            .ok_or_else(|| KernelError::ExecFailed {
                program: image.program().to_string(),
                reason: "no such program".to_string(),
            })?;

        Ok(LoadedImage {
            pid,
            program: image.program().to_string(),
            argc: image.argc(),
            entry,
        })
    }
}

pub struct ImageReplacer {
    loader: Arc<dyn ProgramLoader>,
}

impl ImageReplacer {
    pub fn new(loader: Arc<dyn ProgramLoader>) -> Self {
        Self { loader }
    }

    /// Marshal arguments from `mem` and load the new image for `pid`
    #[instrument(level = "debug", skip(self, mem))]
    pub fn replace(
        &self,
        pid: Pid,
        mem: &UserMemory,
        program: UserPtr,
        argv: UserPtr,
    ) -> KernelResult<LoadedImage> {
        let block = Self::marshal(mem, program, argv)?;
        debug!(
            argc = block.argc(),
            bytes = block.total_bytes(),
            "arguments marshalled"
        );
        self.loader.load(pid, &block)
    }

    /// Copy the program path and argument vector into one kernel buffer
    pub fn marshal(mem: &UserMemory, program: UserPtr, argv: UserPtr) -> KernelResult<ArgBlock> {
        let path_len = mem.strlen(program, PATH_MAX)?;
        if path_len == 0 {
            return Err(KernelError::invalid_argument("empty program path"));
        }

        let ptrs = Self::read_argv(mem, argv)?;

        // Measure pass
        let mut total = path_len + 1;
        let mut lens = Vec::new();
        lens.try_reserve_exact(ptrs.len())?;
        for ptr in &ptrs {
            let budget = ARG_MAX.saturating_sub(total);
            let len = mem.strlen(*ptr, budget).map_err(|e| match e {
                KernelError::InvalidArgument(_) => arg_max_exceeded(),
                other => other,
            })?;
            lens.push(len + 1);
            total += len + 1;
        }

        let mut buf = Vec::new();
        buf.try_reserve_exact(total)?;
        let mut offsets = Vec::new();
        offsets.try_reserve_exact(ptrs.len())?;

        // Copy pass
        mem.copyinstr_into(program, path_len + 1, &mut buf)?;
        for (ptr, len) in ptrs.iter().zip(&lens) {
            offsets.push(buf.len());
            mem.copyinstr_into(*ptr, *len, &mut buf)?;
        }

        ArgBlock::from_parts(buf, offsets)
    }

    /// Read the NULL-terminated argv pointer array
    fn read_argv(mem: &UserMemory, argv: UserPtr) -> KernelResult<Vec<UserPtr>> {
        let mut ptrs = Vec::new();
        for index in 0..=MAX_ARGS {
            let ptr = mem.read_ptr(argv.offset(index * USER_PTR_SIZE)?)?;
            if ptr.is_null() {
                return Ok(ptrs);
            }
            ptrs.try_reserve(1)?;
            ptrs.push(ptr);
        }
        Err(KernelError::out_of_memory(format!(
            "more than {MAX_ARGS} exec arguments"
        )))
    }
}

fn arg_max_exceeded() -> KernelError {
    KernelError::out_of_memory(format!("exec arguments exceed {ARG_MAX} bytes"))
}
