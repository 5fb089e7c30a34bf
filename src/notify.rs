//! # Notifier: out-of-band restart requests.
//!
//! The [`Notifier`] lets a running supervisor be told "restart" from outside
//! its own wait loop: an operator command, a unit's SIGHUP translation, or
//! an embedder's control plane. Notifications flow through an unbounded
//! channel into a worker task that invokes the registered callback, so
//! `notify` never blocks the caller.
//!
//! The notifier is an in-process collaborator. Across a fork boundary the
//! channel does not reach the parent; see the process strategy for how a
//! forked child renders SIGHUP instead.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;

/// Events a notifier can carry.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotifyEvent {
    /// Restart the whole formation.
    Restart,
}

/// Free-form payload attached to a notification.
pub type Payload = HashMap<String, String>;

/// One notification: an event plus its payload.
#[derive(Clone, Debug)]
pub struct Notification {
    /// What is being requested.
    pub event: NotifyEvent,
    /// Free-form request metadata.
    pub payload: Payload,
}

/// Cloneable sender half handed to launched units.
///
/// Sending on a handle whose notifier was stopped is a silent no-op.
#[derive(Clone, Debug)]
pub struct NotifyHandle {
    tx: mpsc::UnboundedSender<Notification>,
}

impl NotifyHandle {
    /// Forwards an event to the notifier's callback.
    pub fn notify(&self, event: NotifyEvent, payload: Payload) {
        let _ = self.tx.send(Notification { event, payload });
    }
}

/// In-process pub/sub collaborator driving a callback from a worker task.
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
    worker: AbortHandle,
}

impl Notifier {
    /// Creates a notifier whose worker invokes `callback` per notification.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(Notification) + Send + Sync + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<Notification>();
        let worker = tokio::spawn(async move {
            while let Some(notification) = rx.recv().await {
                callback(notification);
            }
        })
        .abort_handle();
        Self { tx, worker }
    }

    /// Forwards an event to the callback.
    pub fn notify(&self, event: NotifyEvent, payload: Payload) {
        let _ = self.tx.send(Notification { event, payload });
    }

    /// Returns a cloneable sender half for launched units.
    pub fn handle(&self) -> NotifyHandle {
        NotifyHandle {
            tx: self.tx.clone(),
        }
    }

    /// Stops the worker; idempotent. Pending notifications are dropped.
    pub fn stop(&self) {
        self.worker.abort();
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn callback_receives_notifications() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let notifier = Notifier::new(move |n| {
            assert_eq!(n.event, NotifyEvent::Restart);
            counter.fetch_add(1, Ordering::SeqCst);
        });

        notifier.notify(NotifyEvent::Restart, Payload::new());
        notifier.handle().notify(NotifyEvent::Restart, Payload::new());

        tokio::time::timeout(Duration::from_secs(1), async {
            while seen.load(Ordering::SeqCst) < 2 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("both notifications delivered");
    }

    #[tokio::test]
    async fn stop_is_idempotent_and_silences_handles() {
        let notifier = Notifier::new(|_n| {});
        let handle = notifier.handle();
        notifier.stop();
        notifier.stop();
        // worker is gone; the send is a no-op rather than an error
        handle.notify(NotifyEvent::Restart, Payload::new());
    }
}
