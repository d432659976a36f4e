/*!
 * Wait Coordinator Tests
 * fork / exit / wait ordering across threads
 */

use pretty_assertions::assert_eq;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use synch_kernel::limits::ROOT_PID;
use synch_kernel::{KernelError, ProcessConfig, ProcessState, WaitCoordinator};

fn coordinator() -> Arc<WaitCoordinator> {
    Arc::new(WaitCoordinator::with_root(ProcessConfig::default(), "init").unwrap())
}

#[test]
fn test_fork_exit_wait() {
    let wc = coordinator();
    let child = wc.fork(ROOT_PID).unwrap();

    let worker = {
        let wc = Arc::clone(&wc);
        thread::spawn(move || wc.exit(child, 17))
    };
    assert_eq!(wc.wait(ROOT_PID, child, 0), Ok(17));
    worker.join().unwrap().unwrap();
}

#[test]
fn test_concurrent_waiters_see_same_status() {
    let wc = coordinator();
    let target = wc.fork(ROOT_PID).unwrap();
    let siblings: Vec<_> = (0..4).map(|_| wc.fork(ROOT_PID).unwrap()).collect();

    let waiters: Vec<_> = siblings
        .iter()
        .map(|&sibling| {
            let wc = Arc::clone(&wc);
            thread::spawn(move || wc.wait(sibling, target, 0))
        })
        .collect();
    let parent = {
        let wc = Arc::clone(&wc);
        thread::spawn(move || wc.wait(ROOT_PID, target, 0))
    };

    while wc.waiters(target) < 5 {
        thread::yield_now();
    }
    wc.exit(target, -3).unwrap();

    for waiter in waiters {
        assert_eq!(waiter.join().unwrap(), Ok(-3));
    }
    assert_eq!(parent.join().unwrap(), Ok(-3));
    assert!(!wc.exists(target));
}

#[test]
fn test_wait_unknown_pid() {
    let wc = coordinator();
    assert_eq!(wc.wait(ROOT_PID, 31000, 0), Err(KernelError::NoSuchProcess(31000)));
}

#[test]
fn test_nonzero_options_leave_state_alone() {
    let wc = coordinator();
    let child = wc.fork(ROOT_PID).unwrap();
    wc.exit(child, 5).unwrap();

    assert!(matches!(
        wc.wait(ROOT_PID, child, 1),
        Err(KernelError::InvalidArgument(_))
    ));
    assert_eq!(wc.state(child), Some(ProcessState::Exited));
    assert_eq!(wc.children(ROOT_PID).unwrap(), vec![child]);
    assert_eq!(wc.wait(ROOT_PID, child, 0), Ok(5));
}

#[test]
fn test_exit_never_blocks() {
    let wc = coordinator();
    let parent = wc.fork(ROOT_PID).unwrap();
    let child = wc.fork(parent).unwrap();

    // Nobody waits for the child and its parent is still running
    let barrier = Arc::new(Barrier::new(2));
    let exiting = {
        let wc = Arc::clone(&wc);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            wc.exit(child, 0).unwrap();
            barrier.wait();
        })
    };
    barrier.wait();
    exiting.join().unwrap();

    assert_eq!(wc.state(child), Some(ProcessState::Exited));
}

#[test]
fn test_many_children_many_threads() {
    let wc = coordinator();
    let children: Vec<_> = (0..32).map(|_| wc.fork(ROOT_PID).unwrap()).collect();

    let exits: Vec<_> = children
        .iter()
        .map(|&pid| {
            let wc = Arc::clone(&wc);
            thread::spawn(move || {
                thread::sleep(Duration::from_micros(u64::from(pid % 7) * 100));
                wc.exit(pid, pid as i32).unwrap();
            })
        })
        .collect();

    for &pid in &children {
        assert_eq!(wc.wait(ROOT_PID, pid, 0), Ok(pid as i32));
    }
    for handle in exits {
        handle.join().unwrap();
    }
    assert_eq!(wc.processes(), vec![ROOT_PID]);
}
