//! # The shared unit body.
//!
//! Both isolation strategies run the same body around a service: swallow
//! pre-start interrupts, execute `run` behind a panic boundary, report
//! failures, and guarantee `stop` runs on every exit path. The body's
//! `Result` is what each strategy's failure bookkeeping consumes.
//!
//! [`translate_signals`] arms the per-unit OS-signal translation: INT/TERM
//! become a cooperative cancellation of the unit's token, HUP becomes a
//! formation-restart request when a notifier handle is reachable (thread
//! isolation) and a clean stop otherwise (a forked child, whose success
//! exit makes the parent relaunch the slot immediately).

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::error::ServiceError;
use crate::notify::NotifyHandle;
use crate::services::ServiceRef;

/// Runs one service execution to completion.
///
/// - a token already cancelled at entry skips the body entirely (the unit
///   never starts doing work);
/// - `Err(Canceled)` from `run` is a graceful stop, not a failure;
/// - panics are caught, reported, and classified as failures;
/// - `service.stop()` runs regardless of how the body exited.
pub(crate) async fn run_service(
    service: &ServiceRef,
    ctx: &CancellationToken,
) -> Result<(), ServiceError> {
    if ctx.is_cancelled() {
        return Ok(());
    }

    let outcome = match AssertUnwindSafe(service.run(ctx.clone())).catch_unwind().await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) if err.is_graceful() => Ok(()),
        Ok(Err(err)) => {
            error!(service = service.name(), error = %err, "service run failed");
            Err(err)
        }
        Err(panic) => {
            let info = panic_text(panic);
            error!(service = service.name(), info = %info, "service run panicked");
            Err(ServiceError::Panicked { info })
        }
    };

    service.stop().await;
    outcome
}

fn panic_text(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(text) = panic.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = panic.downcast_ref::<String>() {
        text.clone()
    } else {
        "opaque panic payload".to_string()
    }
}

/// Listener task guard; dropping it tears the listener down with the unit.
pub(crate) struct SignalGuard {
    listener: Option<tokio::task::AbortHandle>,
}

impl Drop for SignalGuard {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}

/// Arms the unit-scoped OS-signal translation.
///
/// Registration failures are tolerated: a unit that cannot listen for
/// signals still runs, it just cannot be signalled cooperatively.
#[cfg(unix)]
pub(crate) fn translate_signals(
    ctx: &CancellationToken,
    on_hangup: Option<NotifyHandle>,
) -> SignalGuard {
    use tokio::signal::unix::{signal, SignalKind};

    use crate::notify::{NotifyEvent, Payload};

    let ctx = ctx.clone();
    let listener = tokio::spawn(async move {
        let (Ok(mut interrupt), Ok(mut terminate), Ok(mut hangup)) = (
            signal(SignalKind::interrupt()),
            signal(SignalKind::terminate()),
            signal(SignalKind::hangup()),
        ) else {
            return;
        };

        loop {
            tokio::select! {
                _ = interrupt.recv() => ctx.cancel(),
                _ = terminate.recv() => ctx.cancel(),
                _ = hangup.recv() => match &on_hangup {
                    Some(handle) => handle.notify(NotifyEvent::Restart, Payload::new()),
                    None => ctx.cancel(),
                },
            }
        }
    })
    .abort_handle();

    SignalGuard {
        listener: Some(listener),
    }
}

#[cfg(not(unix))]
pub(crate) fn translate_signals(
    _ctx: &CancellationToken,
    _on_hangup: Option<NotifyHandle>,
) -> SignalGuard {
    SignalGuard { listener: None }
}
