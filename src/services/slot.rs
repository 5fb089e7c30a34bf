//! # Managed instance slots.
//!
//! A [`ServiceSlot`] is one concurrently running unit: the service body, the
//! shared [`Status`] cell, the typed launch [`Metadata`], and the opaque
//! [`Reference`] to the underlying process or task. Relaunches reuse the
//! slot, so retries and identity persist across restarts within one run
//! cycle; a brand new formation slot gets a brand new `ServiceSlot`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use super::service::ServiceRef;
use super::status::Status;

/// Slot identity source; ids are unique per process.
static SLOT_SEQ: AtomicU64 = AtomicU64::new(1);

/// Typed launch record for one slot.
#[derive(Clone, Debug, Default)]
pub struct Metadata {
    /// Number of launches so far; incremented before every launch,
    /// including the first.
    pub retries: u32,
    /// Monotonic timestamp of the most recent launch.
    pub started_at: Option<Instant>,
}

/// Opaque handle to the running unit behind a slot.
#[derive(Clone, Debug)]
pub enum Reference {
    /// Child process id (process isolation).
    #[cfg(unix)]
    Process(nix::unistd::Pid),
    /// Cancellation token of the spawned unit task (thread isolation).
    Thread(CancellationToken),
}

/// Shared handle to a managed slot.
pub type SlotRef = Arc<ServiceSlot>;

/// One managed service instance.
pub struct ServiceSlot {
    id: u64,
    service: ServiceRef,
    status: Status,
    metadata: Mutex<Metadata>,
    reference: Mutex<Option<Reference>>,
}

impl ServiceSlot {
    /// Wraps a service instance into a fresh slot.
    pub fn new(service: ServiceRef) -> SlotRef {
        Arc::new(Self {
            id: SLOT_SEQ.fetch_add(1, Ordering::Relaxed),
            service,
            status: Status::new(),
            metadata: Mutex::new(Metadata::default()),
            reference: Mutex::new(None),
        })
    }

    /// Process-unique slot id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The service body this slot runs.
    pub fn service(&self) -> &ServiceRef {
        &self.service
    }

    /// Convenience: the service's name.
    pub fn name(&self) -> &str {
        self.service.name()
    }

    /// The slot's shared status cell.
    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Whether the supervisor should relaunch this slot after exit.
    pub fn restartable(&self) -> bool {
        self.service.restartable()
    }

    /// Snapshot of the launch metadata.
    pub fn metadata(&self) -> Metadata {
        self.metadata.lock().expect("slot metadata lock").clone()
    }

    /// Number of launches so far.
    pub fn retries(&self) -> u32 {
        self.metadata.lock().expect("slot metadata lock").retries
    }

    /// Time elapsed since the most recent launch.
    pub fn uptime(&self) -> Duration {
        self.metadata
            .lock()
            .expect("slot metadata lock")
            .started_at
            .map(|at| at.elapsed())
            .unwrap_or(Duration::ZERO)
    }

    /// Stamps a launch: bumps `retries`, records `started_at`, re-arms the
    /// status cell. Returns the new retry count. Callers hold the roster
    /// lock across the launch sequence.
    pub(crate) fn begin_launch(&self) -> u32 {
        let mut meta = self.metadata.lock().expect("slot metadata lock");
        meta.retries = meta.retries.saturating_add(1);
        meta.started_at = Some(Instant::now());
        self.status.reset();
        meta.retries
    }

    /// Records the launch primitive's handle; overwritten on relaunch.
    pub(crate) fn set_reference(&self, reference: Reference) {
        *self.reference.lock().expect("slot reference lock") = Some(reference);
    }

    /// Current handle to the running unit, if launched.
    pub fn reference(&self) -> Option<Reference> {
        self.reference.lock().expect("slot reference lock").clone()
    }
}

impl std::fmt::Debug for ServiceSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceSlot")
            .field("id", &self.id)
            .field("service", &self.service.name())
            .field("status", &self.status.state())
            .finish()
    }
}
