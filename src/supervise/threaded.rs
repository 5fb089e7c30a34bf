//! # Thread isolation: one in-process task per instance.
//!
//! Cheaper than forking, but an in-process unit has no exit code: a
//! cancelled or crashed task cannot report how it ended. The strategy keeps
//! its own failed-set, populated by the unit body via
//! [`Strategy::mark_failed`], and the watcher consults it after the join to
//! settle the slot's status.
//!
//! Stop delivery is cooperative cancellation of the unit's token; the unit
//! body still guarantees `service.stop()` runs before the task ends.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::SuperviseError;
use crate::notify::NotifyHandle;
use crate::services::{Reference, ServiceSlot, SlotRef};

use super::core::Core;
use super::runner::{run_service, translate_signals};
use super::strategy::{StopSignal, Strategy};

/// In-process isolation strategy.
#[derive(Default)]
pub(crate) struct ThreadStrategy {
    /// Slot ids whose current execution reported failure.
    failed: Mutex<HashSet<u64>>,
    /// Unit join handles, held between `invoke` and `watch`.
    handles: Mutex<HashMap<u64, JoinHandle<()>>>,
}

impl ThreadStrategy {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Removes and reports the failed-flag for a slot's finished execution.
    fn take_failed(&self, slot_id: u64) -> bool {
        self.failed.lock().expect("failed-set lock").remove(&slot_id)
    }
}

impl Strategy for ThreadStrategy {
    fn invoke(
        self: Arc<Self>,
        _core: Arc<Core>,
        slot: SlotRef,
        restart: Option<NotifyHandle>,
    ) -> Result<Reference, SuperviseError> {
        let token = CancellationToken::new();
        let unit_token = token.clone();
        let strategy = Arc::clone(&self);
        let unit_slot = slot.clone();

        let handle = tokio::spawn(async move {
            let _signals = translate_signals(&unit_token, restart);
            if run_service(unit_slot.service(), &unit_token).await.is_err() {
                strategy.mark_failed(&unit_slot);
            }
        });

        self.handles
            .lock()
            .expect("handle map lock")
            .insert(slot.id(), handle);
        Ok(Reference::Thread(token))
    }

    fn watch(self: Arc<Self>, core: Arc<Core>, slot: SlotRef) {
        let handle = self
            .handles
            .lock()
            .expect("handle map lock")
            .remove(&slot.id());

        tokio::spawn(async move {
            if let Some(handle) = handle {
                let _ = handle.await;
            }
            // A joined task has no exit code; the failed-set decides,
            // unless this execution already settled its status.
            if slot.status().is_unknown() {
                if self.take_failed(slot.id()) {
                    slot.status().fail();
                } else {
                    slot.status().succeed();
                }
            }
            core.push_exit(slot);
        });
    }

    fn deliver_stop(&self, slot: &ServiceSlot, _signal: StopSignal) {
        if let Some(Reference::Thread(token)) = slot.reference() {
            token.cancel();
        }
    }

    fn mark_failed(&self, slot: &ServiceSlot) {
        self.failed
            .lock()
            .expect("failed-set lock")
            .insert(slot.id());
    }

    fn finish(&self, _success: bool) {
        // The calling task simply ends; there is no unit to tear down.
    }
}
