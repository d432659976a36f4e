/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use super::types::Pid;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OS/161 errno values for the failures this kernel reports
pub mod errno {
    pub const ENOMEM: i32 = 3;
    pub const EFAULT: i32 = 6;
    pub const EINVAL: i32 = 8;
    pub const ENOEXEC: i32 = 13;
    pub const ESRCH: i32 = 15;
}

/// Unified kernel error type with miette diagnostics
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum KernelError {
    #[error("Out of memory: {0}")]
    #[diagnostic(
        code(kernel::out_of_memory),
        help("The process table or a scratch buffer could not grow. Reap finished processes.")
    )]
    OutOfMemory(String),

    #[error("Bad user address {addr:#x}: {reason}")]
    #[diagnostic(
        code(kernel::copy_fault),
        help("The caller passed a pointer outside its mapped address space.")
    )]
    CopyFault { addr: usize, reason: String },

    #[error("No such process: {0}")]
    #[diagnostic(
        code(process::not_found),
        help("The process may have been reaped or never existed. Check PID validity.")
    )]
    NoSuchProcess(Pid),

    #[error("Invalid argument: {0}")]
    #[diagnostic(code(kernel::invalid_argument))]
    InvalidArgument(String),

    #[error("Cannot execute {program}: {reason}")]
    #[diagnostic(
        code(exec::failed),
        help("The program loader rejected the image. Check the program path.")
    )]
    ExecFailed { program: String, reason: String },

    #[error("Initialization failed: {0}")]
    #[diagnostic(
        code(kernel::initialization_failure),
        help("Synchronization primitives or worker threads could not be created. This is fatal.")
    )]
    InitializationFailure(String),
}

impl KernelError {
    #[inline]
    pub fn out_of_memory(msg: impl Into<String>) -> Self {
        Self::OutOfMemory(msg.into())
    }

    #[inline]
    pub fn copy_fault(addr: usize, reason: impl Into<String>) -> Self {
        Self::CopyFault {
            addr,
            reason: reason.into(),
        }
    }

    #[inline]
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    #[inline]
    pub fn initialization(msg: impl Into<String>) -> Self {
        Self::InitializationFailure(msg.into())
    }

    /// Numeric errno for the syscall return convention
    ///
    /// `InitializationFailure` never reaches a syscall caller; it maps to
    /// ENOMEM for completeness.
    #[must_use]
    pub const fn errno(&self) -> i32 {
        match self {
            Self::OutOfMemory(_) | Self::InitializationFailure(_) => errno::ENOMEM,
            Self::CopyFault { .. } => errno::EFAULT,
            Self::NoSuchProcess(_) => errno::ESRCH,
            Self::InvalidArgument(_) => errno::EINVAL,
            Self::ExecFailed { .. } => errno::ENOEXEC,
        }
    }

    /// Whether the caller can continue after this error
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::InitializationFailure(_))
    }
}

impl From<std::collections::TryReserveError> for KernelError {
    fn from(err: std::collections::TryReserveError) -> Self {
        KernelError::OutOfMemory(err.to_string())
    }
}
