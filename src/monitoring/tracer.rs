/*!
 * Structured Tracing
 * Subscriber setup and syscall spans using the tracing crate
 */

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, span, warn, Level};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use crate::core::types::Pid;

/// Syscalls slower than this are reported at warn level
const SLOW_SYSCALL: Duration = Duration::from_millis(10);

static NEXT_TRACE_ID: AtomicU64 = AtomicU64::new(1);

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - KERNEL_TRACE_JSON: Enable JSON output (default: false)
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("KERNEL_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    if use_json {
        let installed = registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init();
        if installed.is_ok() {
            info!("Structured tracing initialized with JSON output");
        }
    } else {
        let installed = registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init();
        if installed.is_ok() {
            info!("Structured tracing initialized");
        }
    }
}

/// Monotonic id correlating the start and end events of one syscall
pub fn next_trace_id() -> u64 {
    NEXT_TRACE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Span covering one syscall from entry to return
pub struct SyscallSpan {
    span: tracing::Span,
    start: Instant,
    syscall: &'static str,
    trace_id: u64,
}

impl SyscallSpan {
    pub fn new(syscall: &'static str, pid: Pid) -> Self {
        let trace_id = next_trace_id();

        let span = span!(
            Level::DEBUG,
            "syscall",
            trace_id,
            syscall,
            pid,
            result = tracing::field::Empty,
            errno = tracing::field::Empty,
        );

        span.in_scope(|| debug!(syscall, pid, "syscall started"));

        Self {
            span,
            start: Instant::now(),
            syscall,
            trace_id,
        }
    }

    #[inline]
    pub fn trace_id(&self) -> u64 {
        self.trace_id
    }

    /// Record success
    pub fn record_ok(&self) {
        self.span.record("result", "success");
    }

    /// Record a failure with its errno
    pub fn record_errno(&self, errno: i32) {
        self.span.record("result", "error");
        self.span.record("errno", errno);
    }

    /// Enter the span context
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for SyscallSpan {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        let _entered = self.span.enter();

        if elapsed > SLOW_SYSCALL && self.syscall != "waitpid" {
            warn!(
                trace_id = self.trace_id,
                syscall = self.syscall,
                duration_ms = elapsed.as_millis() as u64,
                "slow syscall detected"
            );
        } else {
            debug!(
                trace_id = self.trace_id,
                syscall = self.syscall,
                duration_us = elapsed.as_micros() as u64,
                "syscall completed"
            );
        }
    }
}

/// Create a syscall span
#[inline]
pub fn span_syscall(syscall: &'static str, pid: Pid) -> SyscallSpan {
    SyscallSpan::new(syscall, pid)
}
