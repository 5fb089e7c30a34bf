//! # Process isolation: one forked OS child per instance.
//!
//! Full crash containment (a runaway instance cannot corrupt supervisor
//! memory) at the cost of heavier startup. The child's whole life is the
//! shared unit body: it builds its own current-thread runtime on a fresh OS
//! thread (the forked thread inherits the parent's runtime context and must
//! not re-enter it), arms the signal translation, runs the service, and
//! exits 0 or 1. The parent observes that exit code through `waitpid` and
//! settles the slot's status from it.
//!
//! SIGHUP in a child has no path back to the parent's notifier; it performs
//! a clean cooperative stop instead, and the success exit makes the parent's
//! wait loop relaunch the slot immediately.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{fork, ForkResult};
use tracing::warn;

use crate::error::SuperviseError;
use crate::notify::NotifyHandle;
use crate::services::{Reference, ServiceSlot, SlotRef};

use super::core::Core;
use super::runner::{run_service, translate_signals};
use super::strategy::{StopSignal, Strategy};

/// Failure flag local to a forked child; selects its exit code.
static CHILD_FAILED: AtomicBool = AtomicBool::new(false);

/// Forked-process isolation strategy.
#[derive(Default)]
pub(crate) struct ProcessStrategy;

impl ProcessStrategy {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self)
    }
}

impl Strategy for ProcessStrategy {
    fn invoke(
        self: Arc<Self>,
        _core: Arc<Core>,
        slot: SlotRef,
        _restart: Option<NotifyHandle>,
    ) -> Result<Reference, SuperviseError> {
        // Safety: the child immediately leaves the inherited runtime behind
        // and only ever runs its own code on a fresh thread.
        match unsafe { fork() } {
            Ok(ForkResult::Parent { child }) => Ok(Reference::Process(child)),
            Ok(ForkResult::Child) => {
                let strategy = Arc::clone(&self);
                let code = std::thread::Builder::new()
                    .name(format!("{}-unit", slot.name()))
                    .spawn(move || child_unit(strategy, slot))
                    .map_err(|_| 1)
                    .and_then(|unit| unit.join().map_err(|_| 1))
                    .unwrap_or(1);
                std::process::exit(code);
            }
            Err(errno) => Err(SuperviseError::LaunchFailed {
                service: slot.name().to_string(),
                message: errno.to_string(),
            }),
        }
    }

    fn watch(self: Arc<Self>, core: Arc<Core>, slot: SlotRef) {
        let Some(Reference::Process(pid)) = slot.reference() else {
            return;
        };
        tokio::spawn(async move {
            let waited = tokio::task::spawn_blocking(move || waitpid(pid, None)).await;
            match waited {
                Ok(Ok(WaitStatus::Exited(_, 0))) => slot.status().succeed(),
                // Non-zero exits, signal deaths, and already-reaped children
                // (ECHILD) all count as failed runs.
                Ok(_) | Err(_) => slot.status().fail(),
            }
            core.push_exit(slot);
        });
    }

    fn deliver_stop(&self, slot: &ServiceSlot, signal: StopSignal) {
        let Some(Reference::Process(pid)) = slot.reference() else {
            return;
        };
        let os_signal = match signal {
            StopSignal::Interrupt => Signal::SIGINT,
            StopSignal::Terminate => Signal::SIGTERM,
        };
        match kill(pid, os_signal) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(errno) => warn!(
                service = slot.name(),
                pid = pid.as_raw(),
                signal = signal.as_label(),
                error = %errno,
                "stop signal delivery failed"
            ),
        }
    }

    fn mark_failed(&self, _slot: &ServiceSlot) {
        // Runs in the child: the flag turns into a non-zero exit status,
        // which is the only channel a process has back to the parent.
        CHILD_FAILED.store(true, Ordering::SeqCst);
    }

    fn finish(&self, success: bool) {
        std::process::exit(if success { 0 } else { 1 });
    }
}

/// Entire life of a forked child: fresh runtime, signal translation, one
/// service execution, exit code.
fn child_unit(strategy: Arc<ProcessStrategy>, slot: SlotRef) -> i32 {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(_) => return 1,
    };

    runtime.block_on(async move {
        let ctx = tokio_util::sync::CancellationToken::new();
        let _signals = translate_signals(&ctx, None);
        if run_service(slot.service(), &ctx).await.is_err() {
            strategy.mark_failed(&slot);
        }
    });

    if CHILD_FAILED.load(Ordering::SeqCst) {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::services::{ServiceFn, ServiceSlot};
    use tokio_util::sync::CancellationToken;

    #[test]
    fn stop_signals_map_to_conventional_names() {
        assert_eq!(StopSignal::Interrupt.as_label(), "SIGINT");
        assert_eq!(StopSignal::Terminate.as_label(), "SIGTERM");
    }

    #[test]
    fn deliver_stop_without_reference_is_a_no_op() {
        let strategy = ProcessStrategy::new();
        let slot = ServiceSlot::new(ServiceFn::arc(
            "unlaunched",
            |_ctx: CancellationToken| async { Ok::<_, ServiceError>(()) },
        ));
        strategy.deliver_stop(&slot, StopSignal::Terminate);
    }
}
