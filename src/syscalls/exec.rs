/*!
 * Exec Syscall
 */

use super::context::{finish, SyscallContext};
use crate::core::types::KernelResult;
use crate::memory::UserPtr;
use crate::monitoring::span_syscall;
use crate::process::LoadedImage;
use tracing::info;

impl SyscallContext {
    /// Replace the calling process image with the program at `program`
    ///
    /// `argv` points at a NULL-terminated array of string pointers in the
    /// caller's address space. On success the process takes the program path
    /// as its name.
    pub fn execv(&self, program: UserPtr, argv: UserPtr) -> KernelResult<LoadedImage> {
        let span = span_syscall("execv", self.pid);
        let _entered = span.enter();

        let result = self
            .replacer
            .replace(self.pid, &self.memory, program, argv)
            .and_then(|image| {
                self.coordinator.record(self.pid)?.rename(image.program.clone());
                info!(pid = self.pid, program = %image.program, argc = image.argc, "image replaced");
                Ok(image)
            });
        finish(&span, result)
    }
}
