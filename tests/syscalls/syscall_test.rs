/*!
 * Process Syscall Tests
 * fork / execv / _exit / waitpid as a user program would issue them
 */

use pretty_assertions::assert_eq;
use std::sync::Arc;
use synch_kernel::limits::{ARG_MAX, ROOT_PID};
use synch_kernel::{
    errno, ImageReplacer, ProcessConfig, ProgramRegistry, SyscallContext, UserMemory, UserPtr,
    WaitCoordinator, WaitStatus,
};

const STATUS: UserPtr = UserPtr(0x7000);
const PATH: UserPtr = UserPtr(0x1000);
const ARGV: UserPtr = UserPtr(0x6000);

fn boot(max_processes: usize) -> SyscallContext {
    let coordinator = Arc::new(
        WaitCoordinator::with_root(
            ProcessConfig::default().with_max_processes(max_processes),
            "init",
        )
        .unwrap(),
    );
    let registry = Arc::new(ProgramRegistry::new());
    registry.register("/testbin/argtest", UserPtr(0x40_0000));

    let memory = Arc::new(UserMemory::new());
    memory.map(STATUS, 4, true).unwrap();
    SyscallContext::new(
        ROOT_PID,
        coordinator,
        Arc::new(ImageReplacer::new(registry)),
        memory,
    )
}

fn map_args(mem: &UserMemory, program: &str, args: &[&str]) {
    mem.map_cstr(PATH, program, false).unwrap();
    let ptrs: Vec<UserPtr> = args
        .iter()
        .enumerate()
        .map(|(i, arg)| {
            mem.map_cstr(UserPtr(0x10_0000 + i * 0x2_0000), arg, false)
                .unwrap()
        })
        .collect();
    mem.map_ptr_array(ARGV, &ptrs).unwrap();
}

fn status(ctx: &SyscallContext) -> WaitStatus {
    let bytes = ctx.memory().copyin(STATUS, 4).unwrap();
    WaitStatus::from_raw(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

#[test]
fn test_child_execs_and_reports_argc() {
    let ctx = boot(16);
    map_args(ctx.memory(), "/testbin/argtest", &["argtest", "a", "bb", "ccc"]);

    let child = ctx
        .fork(|child| match child.execv(PATH, ARGV) {
            Ok(image) => image.argc as i32,
            Err(e) => -e.errno(),
        })
        .unwrap();

    assert_eq!(ctx.waitpid(child, STATUS, 0), Ok(child));
    assert_eq!(status(&ctx).exit_code(), 4);
}

#[test]
fn test_exec_errors_map_to_errno() {
    let ctx = boot(16);
    map_args(ctx.memory(), "/testbin/missing", &["missing"]);
    assert_eq!(ctx.execv(PATH, ARGV).unwrap_err().errno(), errno::ENOEXEC);
    assert_eq!(ctx.execv(PATH, UserPtr(0x5000)).unwrap_err().errno(), errno::EFAULT);
}

#[test]
fn test_exec_oversized_arguments() {
    let ctx = boot(16);
    let big = "y".repeat(ARG_MAX / 3 + 1);
    map_args(ctx.memory(), "/testbin/argtest", &[&big, &big, &big]);
    assert_eq!(ctx.execv(PATH, ARGV).unwrap_err().errno(), errno::ENOMEM);
}

#[test]
fn test_fork_fails_when_table_full() {
    let ctx = boot(2);
    let child = ctx.fork(|_| 0).unwrap();
    assert_eq!(ctx.fork(|_| 0).unwrap_err().errno(), errno::ENOMEM);

    ctx.waitpid(child, STATUS, 0).unwrap();
    let again = ctx.fork(|_| 1).unwrap();
    ctx.waitpid(again, STATUS, 0).unwrap();
    assert_eq!(status(&ctx).exit_code(), 1);
}

#[test]
fn test_grandchildren() {
    let ctx = boot(16);
    let child = ctx
        .fork(|child| {
            let grandchild = match child.fork(|g| g.getpid() as i32 % 50) {
                Ok(pid) => pid,
                Err(e) => return -e.errno(),
            };
            match child.waitpid(grandchild, UserPtr::NULL, 0) {
                Ok(_) => 10,
                Err(e) => -e.errno(),
            }
        })
        .unwrap();

    ctx.waitpid(child, STATUS, 0).unwrap();
    assert_eq!(status(&ctx).exit_code(), 10);
    assert_eq!(ctx.coordinator().processes(), vec![ROOT_PID]);
}

#[test]
fn test_waitpid_errno_values() {
    let ctx = boot(16);
    assert_eq!(ctx.waitpid(999, STATUS, 0).unwrap_err().errno(), errno::ESRCH);
    assert_eq!(
        ctx.waitpid(ROOT_PID, STATUS, 0).unwrap_err().errno(),
        errno::EINVAL
    );
}
