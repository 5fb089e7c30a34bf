//! # Shared supervision state.
//!
//! One [`Core`] is shared between the supervisor's main flow, the per-unit
//! completion watchers, and the backoff timers. The lifecycle queue is the
//! only multi-producer structure used without the roster lock; everything
//! else (slots, statuses, per-slot metadata) is mutated under it.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use tokio::sync::mpsc;

use crate::events::Bus;
use crate::services::{SlotRef, Status};

/// What happened to a slot, as carried on the lifecycle queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Lifecycle {
    /// The slot's unit exited; its status has been settled.
    Exit,
    /// A backoff timer elapsed; the slot wants relaunching.
    Restart,
}

/// Live slots plus every status recorded during the current run cycle.
#[derive(Default)]
pub(crate) struct Roster {
    /// Currently managed slots; entries leave when their exit is processed.
    pub(crate) services: Vec<SlotRef>,
    /// One status handle per launch. Handles share the slot's cell, so the
    /// collection converges to each slot's final outcome without pruning.
    pub(crate) statuses: Vec<Status>,
}

/// State shared across the supervisor, watchers, and backoff timers.
pub(crate) struct Core {
    /// Producer half of the lifecycle queue; rebuilt per run cycle.
    events_tx: Mutex<mpsc::UnboundedSender<(Lifecycle, SlotRef)>>,
    /// The single lock guarding roster and per-slot launch mutation.
    pub(crate) roster: Mutex<Roster>,
    /// Set once a stop sequence begins; never relaunch afterwards.
    stopping: AtomicBool,
    /// Backoff timers still owed a `Restart` event; keeps `wait` alive
    /// while the roster is momentarily empty.
    pending_restarts: AtomicUsize,
    /// Lifecycle observability bus.
    pub(crate) bus: Bus,
}

impl Core {
    pub(crate) fn new(bus: Bus) -> (Self, mpsc::UnboundedReceiver<(Lifecycle, SlotRef)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let core = Self {
            events_tx: Mutex::new(tx),
            roster: Mutex::new(Roster::default()),
            stopping: AtomicBool::new(false),
            pending_restarts: AtomicUsize::new(0),
            bus,
        };
        (core, rx)
    }

    /// Starts a fresh run cycle: clears the roster, re-arms the flags, and
    /// rebuilds the queue so stale events from a previous cycle cannot leak
    /// into this one. Returns the new consumer half.
    pub(crate) fn begin_cycle(&self) -> mpsc::UnboundedReceiver<(Lifecycle, SlotRef)> {
        let (tx, rx) = mpsc::unbounded_channel();
        {
            let mut roster = self.roster.lock().expect("roster lock");
            roster.services.clear();
            roster.statuses.clear();
        }
        self.stopping.store(false, Ordering::SeqCst);
        self.pending_restarts.store(0, Ordering::SeqCst);
        *self.events_tx.lock().expect("queue sender lock") = tx;
        rx
    }

    pub(crate) fn push_exit(&self, slot: SlotRef) {
        let tx = self.events_tx.lock().expect("queue sender lock").clone();
        let _ = tx.send((Lifecycle::Exit, slot));
    }

    pub(crate) fn push_restart(&self, slot: SlotRef) {
        let tx = self.events_tx.lock().expect("queue sender lock").clone();
        let _ = tx.send((Lifecycle::Restart, slot));
    }

    /// Marks the stop sequence as begun. Returns true on the first call of
    /// the current cycle.
    pub(crate) fn begin_stopping(&self) -> bool {
        !self.stopping.swap(true, Ordering::SeqCst)
    }

    pub(crate) fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::SeqCst)
    }

    pub(crate) fn restart_scheduled(&self) {
        self.pending_restarts.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn restart_delivered(&self) {
        let mut current = self.pending_restarts.load(Ordering::SeqCst);
        while current > 0 {
            match self.pending_restarts.compare_exchange(
                current,
                current - 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => break,
                Err(observed) => current = observed,
            }
        }
    }

    /// True when nothing is managed and no backoff timer is outstanding.
    pub(crate) fn is_drained(&self) -> bool {
        self.pending_restarts.load(Ordering::SeqCst) == 0
            && self.roster.lock().expect("roster lock").services.is_empty()
    }

    /// Removes a slot from the live set; no-op if already removed.
    pub(crate) fn remove_service(&self, slot: &SlotRef) {
        let mut roster = self.roster.lock().expect("roster lock");
        roster.services.retain(|s| s.id() != slot.id());
    }

    /// Snapshot of the currently managed slots.
    pub(crate) fn live_services(&self) -> Vec<SlotRef> {
        self.roster.lock().expect("roster lock").services.clone()
    }

    /// True iff every status recorded this cycle reads success.
    pub(crate) fn all_succeeded(&self) -> bool {
        self.roster
            .lock()
            .expect("roster lock")
            .statuses
            .iter()
            .all(Status::is_success)
    }
}
