/*!
 * Core Types
 * Common types used across the kernel
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Process ID type
pub type Pid = u32;

/// Status value a process passes to `_exit`
pub type ExitCode = i32;

/// Common result type for kernel operations
pub type KernelResult<T> = Result<T, super::errors::KernelError>;

/// Encoded wait status as written by `waitpid` [OS161-COMPAT]
///
/// Layout: the low two bits carry the termination kind, the remaining bits
/// carry the exit code. Only normal exit is produced by this kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WaitStatus(i32);

impl WaitStatus {
    const KIND_MASK: i32 = 0x3;
    const EXITED: i32 = 0;

    /// Encode a normal exit with `code`
    #[inline]
    #[must_use]
    pub const fn exited(code: ExitCode) -> Self {
        Self((code << 2) | Self::EXITED)
    }

    /// Wrap a raw status word read back from user memory
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    #[inline]
    #[must_use]
    pub const fn raw(self) -> i32 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn is_exited(self) -> bool {
        self.0 & Self::KIND_MASK == Self::EXITED
    }

    #[inline]
    #[must_use]
    pub const fn exit_code(self) -> ExitCode {
        self.0 >> 2
    }
}

impl fmt::Display for WaitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_exited() {
            write!(f, "exited({})", self.exit_code())
        } else {
            write!(f, "raw({:#x})", self.0)
        }
    }
}
