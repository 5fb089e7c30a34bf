//! # Container: the consumed orchestration surface.
//!
//! The supervisor does not own the formation, the service catalog, or the
//! decision to keep running; those belong to the embedding [`Container`].
//! The supervisor only reads this narrow interface and reports back through
//! its own API.

use std::sync::Arc;

use crate::config::Options;
use crate::formation::Formation;
use crate::services::FactoryRef;

/// Shared handle to a container.
pub type ContainerRef = Arc<dyn Container>;

/// Lifecycle moments a container may wrap with before/after hooks.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookEvent {
    /// A formation-wide restart is being performed.
    Restart,
}

/// The orchestration surface the supervisor consumes.
pub trait Container: Send + Sync + 'static {
    /// The desired topology: which services run, how many of each.
    fn formation(&self) -> Formation;

    /// Resolves a formation name to its service factory.
    fn service(&self, name: &str) -> Option<FactoryRef>;

    /// Opaque bag forwarded to every service construction.
    fn options(&self) -> Options {
        Options::new()
    }

    /// Whether the container still wants its services running. Once false,
    /// exited instances are not relaunched.
    fn is_running(&self) -> bool;

    /// Whether formation-wide restart requests should be honored.
    fn is_restartable(&self) -> bool {
        true
    }

    /// Runs `action` inside the container's before/after hooks for `event`.
    ///
    /// The default implementation is a passthrough.
    fn performing(&self, event: HookEvent, action: &mut dyn FnMut()) {
        let _ = event;
        action();
    }
}
