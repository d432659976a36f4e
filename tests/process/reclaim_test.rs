/*!
 * Record Reclamation Tests
 * When exited processes leave the table
 */

use pretty_assertions::assert_eq;
use synch_kernel::limits::ROOT_PID;
use synch_kernel::{KernelError, ProcessConfig, ProcessState, WaitCoordinator};

fn coordinator() -> WaitCoordinator {
    WaitCoordinator::with_root(ProcessConfig::default(), "init").unwrap()
}

#[test]
fn test_exited_child_waits_for_parent() {
    let wc = coordinator();
    let child = wc.fork(ROOT_PID).unwrap();
    wc.exit(child, 9).unwrap();

    let info = wc.info(child).unwrap();
    assert_eq!(info.state, ProcessState::Exited);
    assert_eq!(info.exit_code, Some(9));
    assert!(info.claimed);

    wc.wait(ROOT_PID, child, 0).unwrap();
    assert!(!wc.exists(child));
}

#[test]
fn test_parent_exit_reclaims_exited_children() {
    let wc = coordinator();
    let parent = wc.fork(ROOT_PID).unwrap();
    let child = wc.fork(parent).unwrap();
    wc.exit(child, 0).unwrap();
    assert!(wc.exists(child));

    wc.exit(parent, 0).unwrap();
    assert!(!wc.exists(child));
    assert_eq!(wc.state(parent), Some(ProcessState::Exited));
}

#[test]
fn test_orphan_reclaimed_at_own_exit() {
    let wc = coordinator();
    let parent = wc.fork(ROOT_PID).unwrap();
    let orphan = wc.fork(parent).unwrap();
    wc.exit(parent, 0).unwrap();

    assert!(!wc.info(orphan).unwrap().claimed);
    wc.exit(orphan, 4).unwrap();
    assert!(!wc.exists(orphan));
}

#[test]
fn test_non_parent_wait_keeps_record() {
    let wc = coordinator();
    let a = wc.fork(ROOT_PID).unwrap();
    let b = wc.fork(ROOT_PID).unwrap();
    wc.exit(b, 6).unwrap();

    assert_eq!(wc.wait(a, b, 0), Ok(6));
    assert!(wc.exists(b));
    assert_eq!(wc.wait(ROOT_PID, b, 0), Ok(6));
    assert!(!wc.exists(b));
}

#[test]
fn test_exited_process_cannot_fork() {
    let wc = coordinator();
    let parent = wc.fork(ROOT_PID).unwrap();
    wc.exit(parent, 0).unwrap();
    assert!(matches!(wc.fork(parent), Err(KernelError::InvalidArgument(_))));
}

#[test]
fn test_reaping_frees_table_slots() {
    let wc = WaitCoordinator::with_root(ProcessConfig::default().with_max_processes(3), "init")
        .unwrap();
    let first: Vec<_> = (0..2).map(|_| wc.fork(ROOT_PID).unwrap()).collect();
    assert!(matches!(wc.fork(ROOT_PID), Err(KernelError::OutOfMemory(_))));

    for &pid in &first {
        wc.exit(pid, 0).unwrap();
        wc.wait(ROOT_PID, pid, 0).unwrap();
    }
    for _ in 0..2 {
        assert!(wc.fork(ROOT_PID).is_ok());
    }
}
