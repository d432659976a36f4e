/*!
 * Synch Kernel - Main Entry Point
 *
 * Drives both synchronization protocols end to end:
 * - Intersection traffic simulation over the gate
 * - fork / execv / _exit / waitpid through the syscall layer
 */

use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

use synch_kernel::{
    init_tracing, limits::ROOT_PID, ImageReplacer, KernelResult, Pid, ProcessConfig,
    ProgramRegistry, SimulationConfig, SyscallContext, TrafficSimulation, UserMemory, UserPtr,
    WaitCoordinator, WaitStatus,
};

const STATUS_PTR: UserPtr = UserPtr(0x7fff_0000);
const PROGRAM_PTR: UserPtr = UserPtr(0x1000);
const ARG_PTRS: [UserPtr; 2] = [UserPtr(0x2000), UserPtr(0x2100)];
const ARGV_PTR: UserPtr = UserPtr(0x3000);

#[derive(Debug, Serialize)]
struct ChildOutcome {
    pid: Pid,
    status: i32,
    exit_code: i32,
}

fn main() -> Result<()> {
    init_tracing();

    info!("Synch kernel starting...");
    info!("================================================");

    info!("Initializing traffic simulation...");
    let config = SimulationConfig::from_env()?;
    let simulation = TrafficSimulation::init(config)?;
    let report = match simulation.run() {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "traffic simulation could not start");
            return Err(e.into());
        }
    };
    println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);
    if !report.is_clean() {
        return Err(miette::miette!(
            "intersection safety violated {} time(s)",
            report.violations.len()
        ));
    }

    info!("Initializing process subsystem...");
    let root = boot_root(ProcessConfig::from_env()?)?;
    let outcomes = run_process_demo(&root)?;
    println!("{}", serde_json::to_string_pretty(&outcomes).into_diagnostic()?);

    info!(
        live = root.coordinator().live(),
        capacity = root.coordinator().capacity(),
        "Kernel shutdown complete"
    );
    Ok(())
}

/// Root process with a small user address space and a program registry
fn boot_root(config: ProcessConfig) -> KernelResult<SyscallContext> {
    let coordinator = Arc::new(WaitCoordinator::with_root(config, "init")?);

    let registry = Arc::new(ProgramRegistry::new());
    registry.register("/testbin/add", UserPtr(0x40_0000));

    let memory = Arc::new(UserMemory::new());
    memory.map(STATUS_PTR, 4, true)?;
    memory.map_cstr(PROGRAM_PTR, "/testbin/add", false)?;
    memory.map_cstr(ARG_PTRS[0], "add", false)?;
    memory.map_cstr(ARG_PTRS[1], "2", false)?;
    memory.map_ptr_array(ARGV_PTR, &ARG_PTRS)?;

    Ok(SyscallContext::new(
        ROOT_PID,
        coordinator,
        Arc::new(ImageReplacer::new(registry)),
        memory,
    ))
}

/// Fork a few children, let one exec, and collect every status
fn run_process_demo(root: &SyscallContext) -> KernelResult<Vec<ChildOutcome>> {
    let mut children = Vec::new();
    for code in 0..3 {
        children.push(root.fork(move |_| code)?);
    }
    children.push(root.fork(|ctx| match ctx.execv(PROGRAM_PTR, ARGV_PTR) {
        Ok(image) => image.argc as i32,
        Err(e) => e.errno(),
    })?);

    let mut outcomes = Vec::with_capacity(children.len());
    for pid in children {
        root.waitpid(pid, STATUS_PTR, 0)?;
        let bytes = root.memory().copyin(STATUS_PTR, 4)?;
        let status = WaitStatus::from_raw(i32::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3],
        ]));
        info!(pid, %status, "child collected");
        outcomes.push(ChildOutcome {
            pid,
            status: status.raw(),
            exit_code: status.exit_code(),
        });
    }
    Ok(outcomes)
}
