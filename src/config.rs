//! # Supervisor configuration and the opaque service options bag.
//!
//! [`Config`] centralizes the runtime knobs the supervisor itself consumes.
//! [`Options`] is an opaque key/value bag owned by the container and handed
//! verbatim to every [`ServiceFactory::build`](crate::ServiceFactory::build)
//! call; the supervisor never interprets it.

use std::collections::HashMap;

use crate::supervise::BackoffPolicy;

/// Global configuration for a supervisor.
///
/// ## Field semantics
/// - `bus_capacity`: lifecycle event ring buffer size (min 1; clamped)
/// - `backoff`: relaunch delay policy applied after failed exits
#[derive(Clone, Debug)]
pub struct Config {
    /// Capacity of the lifecycle event broadcast channel.
    ///
    /// Slow subscribers that lag behind more than this many events observe
    /// `Lagged` and skip older items.
    pub bus_capacity: usize,

    /// Backoff policy for relaunching failed instances.
    pub backoff: BackoffPolicy,
}

impl Config {
    /// Returns the bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024`
    /// - `backoff = BackoffPolicy::default()` (500ms floor)
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            backoff: BackoffPolicy::default(),
        }
    }
}

/// Opaque keyword bag forwarded to service construction.
///
/// The container owns the contents; the supervisor only carries the bag from
/// [`Container::options`](crate::Container::options) to each factory.
#[derive(Clone, Debug, Default)]
pub struct Options {
    entries: HashMap<String, String>,
}

impl Options {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry, replacing any previous value for the key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Looks up an entry.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// True when the bag carries no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
