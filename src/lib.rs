//! # servisor
//!
//! **Servisor** is a service supervision core: it starts, monitors,
//! restarts, and cleanly stops a named set of long-running services (a
//! *formation*) under one of two isolation strategies sharing a single
//! restart/backoff/stop contract.
//!
//! ## Architecture
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  Formation   │   │  Factories   │   │   Options    │
//!     │ name → count │   │ count/limit  │   │ (opaque bag) │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            └──────────────────┼──────────────────┘
//!                               ▼  (Container)
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Supervisor (shared algorithm)                                    │
//! │  - roster (live slots + per-launch statuses, one lock)            │
//! │  - lifecycle queue (Exit / Restart, single consumer)              │
//! │  - backoff timers (max(minimum, uptime) × retries)                │
//! │  - Notifier (out-of-band restart requests)                        │
//! │  - Bus (lifecycle event broadcast)                                │
//! └──────┬─────────────────────────────────────────────────────┬──────┘
//!        ▼ threaded                                     forked ▼
//!   ┌──────────────┐                                  ┌──────────────┐
//!   │ tokio task   │  one unit per instance, running  │ forked child │
//!   │ + cancel     │  the same body: signal           │ + waitpid    │
//!   │   token      │  translation, panic boundary,    │ + exit code  │
//!   └──────────────┘  guaranteed service.stop()       └──────────────┘
//! ```
//!
//! ## Lifecycle
//! ```text
//! run():  formation entry ─► effective count (factory default, limit clamp)
//!                             └─► slot per instance ─► launch + watcher
//!
//! wait(): loop on lifecycle queue
//!   Exit(success)  + restartable ─► relaunch immediately
//!   Exit(failure)  + restartable ─► backoff timer ─► Restart ─► relaunch
//!   Exit, retiring                ─► roster shrinks
//!   stopping / container stopped  ─► no relaunch, drain and return
//!
//! stop()/interrupt()/terminate(): signal every unit, stop the notifier;
//! restart(): notifier ─► performing(Restart) hook ─► interrupt()
//! ```
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use tokio_util::sync::CancellationToken;
//! use servisor::{
//!     Config, Container, ContainerRef, FactoryFn, FactoryRef, Formation,
//!     Options, ServiceError, ServiceFn, Supervisor,
//! };
//!
//! struct App {
//!     formation: Formation,
//!     worker: FactoryRef,
//!     running: AtomicBool,
//! }
//!
//! impl Container for App {
//!     fn formation(&self) -> Formation {
//!         self.formation.clone()
//!     }
//!
//!     fn service(&self, name: &str) -> Option<FactoryRef> {
//!         (name == "worker").then(|| Arc::clone(&self.worker))
//!     }
//!
//!     fn is_running(&self) -> bool {
//!         self.running.load(Ordering::SeqCst)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut formation = Formation::new();
//!     formation.set("worker", Some(2));
//!
//!     let worker = FactoryFn::new("worker", |_opts: &Options| {
//!         ServiceFn::arc("worker", |ctx: CancellationToken| async move {
//!             while !ctx.is_cancelled() {
//!                 // poll a queue, serve a socket, ...
//!                 tokio::time::sleep(std::time::Duration::from_millis(100)).await;
//!             }
//!             Ok::<_, ServiceError>(())
//!         })
//!     })
//!     .with_limit(4)
//!     .arc();
//!
//!     let app: ContainerRef = Arc::new(App {
//!         formation,
//!         worker,
//!         running: AtomicBool::new(true),
//!     });
//!
//!     let supervisor = Supervisor::threaded(Config::default());
//!     supervisor.run(&app).await?;
//!     supervisor.wait(&app).await?;
//!     assert!(supervisor.succeeded());
//!     Ok(())
//! }
//! ```

mod config;
mod container;
mod error;
mod formation;
mod notify;
mod supervise;

pub mod events;
pub mod services;

// ---- Public re-exports ----

pub use config::{Config, Options};
pub use container::{Container, ContainerRef, HookEvent};
pub use error::{ServiceError, SuperviseError};
pub use events::{Bus, Event, EventKind};
pub use formation::Formation;
pub use notify::{Notification, Notifier, NotifyEvent, NotifyHandle, Payload};
pub use services::{
    FactoryFn, FactoryRef, Metadata, Reference, Service, ServiceFactory, ServiceFn, ServiceRef,
    ServiceSlot, SlotRef, State, Status,
};
pub use supervise::{BackoffPolicy, StopSignal, Supervisor, MINIMUM_BACKOFF};
