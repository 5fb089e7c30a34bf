//! # Supervision core: the shared algorithm and its two isolation strategies.

mod backoff;
mod core;
#[cfg(unix)]
mod process;
mod runner;
mod strategy;
mod supervisor;
mod threaded;

pub use backoff::{BackoffPolicy, MINIMUM_BACKOFF};
pub use strategy::StopSignal;
pub use supervisor::Supervisor;
