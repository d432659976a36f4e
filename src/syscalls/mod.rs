/*!
 * Syscalls Module
 * Process syscalls over the wait coordinator and image replacer
 */

mod context;
mod exec;
mod process;

// Re-export public API
pub use context::SyscallContext;
