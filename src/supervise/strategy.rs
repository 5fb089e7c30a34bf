//! # The isolation strategy seam.
//!
//! The supervisor's algorithm is isolation-agnostic; everything that differs
//! between "one OS process per instance" and "one in-process task per
//! instance" sits behind [`Strategy`]. The set is closed: two
//! implementations, selected when the supervisor is constructed, agreeing on
//! the exact same restart/backoff/stop contract.

use std::sync::Arc;

use crate::error::SuperviseError;
use crate::notify::NotifyHandle;
use crate::services::{Reference, ServiceSlot, SlotRef};

use super::core::Core;

/// Stop signal delivered to managed units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopSignal {
    /// Interactive interrupt (SIGINT).
    Interrupt,
    /// Termination request (SIGTERM).
    Terminate,
}

impl StopSignal {
    /// Conventional signal name, for logs and events.
    pub fn as_label(&self) -> &'static str {
        match self {
            StopSignal::Interrupt => "SIGINT",
            StopSignal::Terminate => "SIGTERM",
        }
    }
}

/// Strategy-specific launch, watch, and stop primitives.
///
/// Methods that hand the strategy to a spawned unit take `self: Arc<Self>`
/// so the unit body can reach the strategy's own bookkeeping (e.g. the
/// thread strategy's failed-set).
pub(crate) trait Strategy: Send + Sync + 'static {
    /// Launches one unit for `slot` and returns its opaque reference.
    /// Called under the roster lock; must not block on the unit itself.
    fn invoke(
        self: Arc<Self>,
        core: Arc<Core>,
        slot: SlotRef,
        restart: Option<NotifyHandle>,
    ) -> Result<Reference, SuperviseError>;

    /// Arms the completion watcher that settles the slot's status and
    /// enqueues the exit event once the unit is gone.
    fn watch(self: Arc<Self>, core: Arc<Core>, slot: SlotRef);

    /// Best-effort delivery of a stop signal to the slot's running unit.
    fn deliver_stop(&self, slot: &ServiceSlot, signal: StopSignal);

    /// Records that the slot's current execution failed, in whatever form
    /// the strategy's watcher can observe.
    fn mark_failed(&self, slot: &ServiceSlot);

    /// Terminal action once the caller is done with the aggregate outcome.
    fn finish(&self, success: bool);
}
