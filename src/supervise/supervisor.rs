//! # Supervisor: the shared supervision algorithm.
//!
//! One [`Supervisor`] drives a formation through a run/wait cycle:
//!
//! ```text
//! Container ──► run():  formation ──► effective counts (limit-clamped)
//!                        │
//!                        └─► one ServiceSlot per instance ──► manage_service()
//!                                                               │
//!                              Strategy::invoke (fork / spawn) ◄┘
//!                              Strategy::watch ──► lifecycle queue
//!
//!            wait():  recv (Exit | Restart), the single suspension point
//!                        ├─ Exit: remove from roster
//!                        │    ├─ success + restartable  → relaunch now
//!                        │    ├─ failure + restartable  → backoff timer → Restart
//!                        │    └─ otherwise              → slot retired
//!                        ├─ Restart: relaunch unless stopping
//!                        └─ roster empty + no timers    → return
//!
//!            stop()/interrupt()/terminate(): stopping = true, signal all,
//!            stop the notifier; exits observed afterwards never relaunch.
//! ```
//!
//! The same algorithm runs under both isolation strategies; construction
//! picks one ([`Supervisor::threaded`] or [`Supervisor::forked`]) and the
//! restart/backoff/stop contract is identical across them.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tracing::warn;

use crate::config::Config;
use crate::container::{Container, ContainerRef, HookEvent};
use crate::error::SuperviseError;
use crate::events::{Bus, Event, EventKind};
use crate::notify::{Notification, Notifier, NotifyEvent, NotifyHandle, Payload};
use crate::services::{ServiceSlot, SlotRef};

use super::core::{Core, Lifecycle};
use super::strategy::{StopSignal, Strategy};
use super::threaded::ThreadStrategy;

/// Supervises a formation of services under one isolation strategy.
pub struct Supervisor {
    config: Config,
    core: Arc<Core>,
    strategy: Arc<dyn Strategy>,
    /// Consumer half of the lifecycle queue; taken by `wait`.
    lifecycle_rx: Mutex<Option<mpsc::UnboundedReceiver<(Lifecycle, SlotRef)>>>,
    /// Notifier for out-of-band restart requests; replaced per run cycle.
    notifier: Mutex<Option<Notifier>>,
    /// Self-handle for callbacks armed during `run`.
    me: Weak<Supervisor>,
}

impl Supervisor {
    /// Creates a supervisor whose instances run as in-process tasks.
    pub fn threaded(config: Config) -> Arc<Self> {
        Self::with_strategy(config, ThreadStrategy::new())
    }

    /// Creates a supervisor whose instances run as forked OS processes.
    #[cfg(unix)]
    pub fn forked(config: Config) -> Arc<Self> {
        Self::with_strategy(config, super::process::ProcessStrategy::new())
    }

    fn with_strategy(config: Config, strategy: Arc<dyn Strategy>) -> Arc<Self> {
        let bus = Bus::new(config.bus_capacity_clamped());
        let (core, lifecycle_rx) = Core::new(bus);
        Arc::new_cyclic(|me| Self {
            config,
            core: Arc::new(core),
            strategy,
            lifecycle_rx: Mutex::new(Some(lifecycle_rx)),
            notifier: Mutex::new(None),
            me: me.clone(),
        })
    }

    /// Subscribes to the supervisor's lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.core.bus.subscribe()
    }

    /// Launches the container's formation.
    ///
    /// Resolves each entry to its factory, computes the effective instance
    /// count (the factory's default when the formation omits one, clamped
    /// to the factory's limit with a non-fatal warning), and launches that
    /// many independent instances. After `run` returns every requested
    /// instance has been submitted for launch; none exceeds its limit.
    ///
    /// A supervisor can be reused across cycles: each call starts from a
    /// clean roster, queue, and notifier.
    pub async fn run(&self, container: &ContainerRef) -> Result<(), SuperviseError> {
        let lifecycle_rx = self.core.begin_cycle();
        *self.lifecycle_rx.lock().expect("lifecycle receiver lock") = Some(lifecycle_rx);
        self.replace_notifier(container);

        let options = container.options();
        let formation = container.formation();
        for (name, desired) in formation.iter() {
            let factory =
                container
                    .service(name)
                    .ok_or_else(|| SuperviseError::UnknownService {
                        name: name.to_string(),
                    })?;

            let requested = desired.unwrap_or_else(|| factory.count());
            let effective = match factory.limit() {
                Some(limit) if requested > limit => {
                    warn!(
                        service = name,
                        requested, limit, "requested instances exceed limit; clamping"
                    );
                    self.core.bus.publish(
                        Event::new(EventKind::LimitClamped)
                            .with_service(name)
                            .with_reason(format!("requested {requested}, limit {limit}")),
                    );
                    limit
                }
                _ => requested,
            };

            for _ in 0..effective {
                let slot = ServiceSlot::new(factory.build(&options));
                self.manage_service(&slot)?;
            }
        }
        Ok(())
    }

    /// Blocks on the lifecycle queue until the formation has wound down.
    ///
    /// Returns immediately when nothing is managed. Otherwise processes one
    /// event at a time: exits retire or relaunch their slot, restarts
    /// relaunch unless a stop sequence began, and the loop ends once the
    /// roster is empty with no backoff timer outstanding.
    pub async fn wait(&self, container: &ContainerRef) -> Result<(), SuperviseError> {
        if self.core.is_drained() {
            return Ok(());
        }
        let receiver = self.lifecycle_rx.lock().expect("lifecycle receiver lock").take();
        let Some(mut lifecycle_rx) = receiver else {
            return Ok(());
        };

        while let Some((lifecycle, slot)) = lifecycle_rx.recv().await {
            match lifecycle {
                Lifecycle::Restart => {
                    self.core.restart_delivered();
                    if !self.core.is_stopping() && container.is_running() {
                        self.manage_service(&slot)?;
                    }
                }
                Lifecycle::Exit => {
                    self.core.remove_service(&slot);
                    self.publish_exit(&slot);
                    if !self.core.is_stopping()
                        && container.is_running()
                        && slot.restartable()
                    {
                        if slot.status().is_success() {
                            self.manage_service(&slot)?;
                        } else {
                            self.backoff_service(&slot);
                        }
                    }
                }
            }
            if self.core.is_drained() {
                break;
            }
        }
        Ok(())
    }

    /// Stops the formation with SIGINT semantics.
    pub fn interrupt(&self) {
        self.stop(StopSignal::Interrupt);
    }

    /// Stops the formation with SIGTERM semantics.
    pub fn terminate(&self) {
        self.stop(StopSignal::Terminate);
    }

    /// Begins the stop sequence: no relaunches happen afterwards, every
    /// managed unit gets the signal, and the notifier is stopped.
    /// Idempotent and safe to call from any task.
    pub fn stop(&self, signal: StopSignal) {
        if self.core.begin_stopping() {
            self.core.bus.publish(
                Event::new(EventKind::StopRequested).with_reason(signal.as_label()),
            );
        }
        for slot in self.core.live_services() {
            self.strategy.deliver_stop(&slot, signal);
        }
        if let Some(notifier) = self.notifier.lock().expect("notifier lock").as_ref() {
            notifier.stop();
        }
    }

    /// Requests a formation-wide restart through the notifier.
    ///
    /// A no-op when no run cycle is active. The notifier's callback honors
    /// the request by interrupting the formation inside the container's
    /// [`performing`](Container::performing) hook.
    pub fn restart(&self, payload: Payload) {
        if let Some(notifier) = self.notifier.lock().expect("notifier lock").as_ref() {
            notifier.notify(NotifyEvent::Restart, payload);
        }
    }

    /// True iff every instance launched during this cycle ended in success.
    pub fn succeeded(&self) -> bool {
        self.core.all_succeeded()
    }

    /// Strategy-specific terminal action: the forked strategy exits the
    /// process with a status reflecting [`succeeded`](Supervisor::succeeded);
    /// the threaded strategy lets the calling task end.
    pub fn finish(&self) {
        self.strategy.finish(self.succeeded());
    }

    /// Launches (or relaunches) one slot: stamps the launch metadata, runs
    /// the strategy's launch primitive, records the reference, registers
    /// the slot and its status, and arms the completion watcher. The whole
    /// sequence holds the roster lock so a concurrent completion cannot
    /// observe a half-launched slot.
    fn manage_service(&self, slot: &SlotRef) -> Result<(), SuperviseError> {
        {
            let mut roster = self.core.roster.lock().expect("roster lock");
            let retries = slot.begin_launch();
            self.core.bus.publish(
                Event::new(EventKind::ServiceStarting)
                    .with_service(slot.name())
                    .with_retries(retries),
            );
            let reference = Arc::clone(&self.strategy).invoke(
                Arc::clone(&self.core),
                slot.clone(),
                self.restart_handle(),
            )?;
            slot.set_reference(reference);
            roster.services.push(slot.clone());
            roster.statuses.push(slot.status().clone());
        }
        Arc::clone(&self.strategy).watch(Arc::clone(&self.core), slot.clone());
        Ok(())
    }

    /// Schedules a backed-off relaunch for a failed slot.
    fn backoff_service(&self, slot: &SlotRef) {
        let delay = self.current_service_backoff(slot);
        self.core.restart_scheduled();
        self.core.bus.publish(
            Event::new(EventKind::BackoffScheduled)
                .with_service(slot.name())
                .with_retries(slot.retries())
                .with_delay(delay),
        );
        let core = Arc::clone(&self.core);
        let slot = slot.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            core.push_restart(slot);
        });
    }

    /// Relaunch delay for the slot's current failure.
    fn current_service_backoff(&self, slot: &SlotRef) -> Duration {
        self.config.backoff.delay(slot.uptime(), slot.retries())
    }

    /// Stops any previous notifier and registers a fresh one bound to this
    /// container and this supervisor's notification handler.
    fn replace_notifier(&self, container: &ContainerRef) {
        let me = self.me.clone();
        let container = Arc::clone(container);
        let notifier = Notifier::new(move |notification| {
            if let Some(supervisor) = me.upgrade() {
                supervisor.handle_notification(container.as_ref(), notification);
            }
        });
        if let Some(previous) = self
            .notifier
            .lock()
            .expect("notifier lock")
            .replace(notifier)
        {
            previous.stop();
        }
    }

    /// Reacts to out-of-band notifications.
    fn handle_notification(&self, container: &dyn Container, notification: Notification) {
        match notification.event {
            NotifyEvent::Restart => {
                self.core
                    .bus
                    .publish(Event::new(EventKind::RestartRequested));
                if container.is_restartable() {
                    container.performing(HookEvent::Restart, &mut || self.interrupt());
                }
            }
        }
    }

    fn restart_handle(&self) -> Option<NotifyHandle> {
        self.notifier
            .lock()
            .expect("notifier lock")
            .as_ref()
            .map(Notifier::handle)
    }

    fn publish_exit(&self, slot: &SlotRef) {
        let kind = if slot.status().is_failure() {
            EventKind::ServiceFailed
        } else {
            EventKind::ServiceStopped
        };
        self.core.bus.publish(
            Event::new(kind)
                .with_service(slot.name())
                .with_retries(slot.retries()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::formation::Formation;
    use crate::services::{FactoryFn, FactoryRef, ServiceFn};
    use crate::Options;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio_util::sync::CancellationToken;

    struct Static {
        formation: Formation,
        factory: FactoryRef,
        running: AtomicBool,
    }

    impl Container for Static {
        fn formation(&self) -> Formation {
            self.formation.clone()
        }

        fn service(&self, name: &str) -> Option<FactoryRef> {
            (name == self.factory.name()).then(|| Arc::clone(&self.factory))
        }

        fn is_running(&self) -> bool {
            self.running.load(Ordering::SeqCst)
        }
    }

    fn one_shot_container(name: &'static str) -> ContainerRef {
        let mut formation = Formation::new();
        formation.set(name, None);
        Arc::new(Static {
            formation,
            factory: FactoryFn::new(name, move |_opts: &Options| {
                ServiceFn::arc_once(name, |_ctx: CancellationToken| async {
                    Ok::<_, ServiceError>(())
                })
            })
            .arc(),
            running: AtomicBool::new(true),
        })
    }

    #[tokio::test]
    async fn empty_cycle_reports_success_and_returns() {
        let supervisor = Supervisor::threaded(Config::default());
        let container: ContainerRef = Arc::new(Static {
            formation: Formation::new(),
            factory: FactoryFn::new("unused", |_opts: &Options| {
                ServiceFn::arc("unused", |_ctx: CancellationToken| async {
                    Ok::<_, ServiceError>(())
                })
            })
            .arc(),
            running: AtomicBool::new(true),
        });
        supervisor.run(&container).await.expect("run");
        supervisor.wait(&container).await.expect("wait");
        assert!(supervisor.succeeded());
    }

    #[tokio::test]
    async fn unknown_formation_name_is_rejected() {
        let supervisor = Supervisor::threaded(Config::default());
        let mut formation = Formation::new();
        formation.set("ghost", Some(1));
        let broken: ContainerRef = Arc::new(Static {
            formation,
            factory: FactoryFn::new("worker", |_opts: &Options| {
                ServiceFn::arc("worker", |_ctx: CancellationToken| async {
                    Ok::<_, ServiceError>(())
                })
            })
            .arc(),
            running: AtomicBool::new(true),
        });
        let err = supervisor.run(&broken).await.expect_err("unknown name");
        assert!(matches!(err, SuperviseError::UnknownService { name } if name == "ghost"));
    }

    #[tokio::test]
    async fn restart_without_cycle_is_a_no_op() {
        let supervisor = Supervisor::threaded(Config::default());
        supervisor.restart(Payload::new());
        assert!(supervisor.succeeded());
    }

    #[tokio::test]
    async fn supervisor_is_reusable_across_cycles() {
        let supervisor = Supervisor::threaded(Config::default());
        let container = one_shot_container("worker");
        for _ in 0..2 {
            supervisor.run(&container).await.expect("run");
            supervisor.wait(&container).await.expect("wait");
            assert!(supervisor.succeeded());
        }
    }
}
