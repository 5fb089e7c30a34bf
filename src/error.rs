//! Error types used by the supervision runtime and supervised services.
//!
//! Two enums cover the two failure planes:
//!
//! - [`SuperviseError`] — errors raised by the supervisor itself. These are
//!   never swallowed: a formation that names an unknown service, or a launch
//!   primitive that fails, propagates out of `run`/`wait`.
//! - [`ServiceError`] — errors raised by one service execution. These feed
//!   the restart machinery instead of aborting the supervisor.

use thiserror::Error;

/// # Errors produced by the supervisor.
///
/// The supervisor cannot meaningfully proceed without starting the requested
/// topology, so these surface to the caller instead of being retried.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SuperviseError {
    /// A formation entry does not resolve to a known service factory.
    #[error("unknown service {name:?} in formation")]
    UnknownService {
        /// The unresolvable formation entry.
        name: String,
    },

    /// The strategy-specific launch primitive failed (e.g. fork refused).
    #[error("failed to launch {service:?}: {message}")]
    LaunchFailed {
        /// Name of the service whose slot could not be launched.
        service: String,
        /// Platform error text from the launch primitive.
        message: String,
    },
}

impl SuperviseError {
    /// Returns a short stable label (snake_case) for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SuperviseError::UnknownService { .. } => "unknown_service",
            SuperviseError::LaunchFailed { .. } => "launch_failed",
        }
    }
}

/// # Errors produced by one service execution.
///
/// A service's `run` returning `Err` marks the instance's launch as failed,
/// with one exception: [`ServiceError::Canceled`] reports a cooperative stop
/// and is treated as a graceful exit.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The service's execution loop failed.
    #[error("execution failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },

    /// The service body panicked; the panic was caught at the unit boundary.
    #[error("service panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// The service observed its cancellation token and stopped cleanly.
    #[error("execution cancelled")]
    Canceled,
}

impl ServiceError {
    /// Returns a short stable label (snake_case) for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ServiceError::Failed { .. } => "service_failed",
            ServiceError::Panicked { .. } => "service_panicked",
            ServiceError::Canceled => "service_canceled",
        }
    }

    /// True when the error reports a cooperative stop rather than a failure.
    ///
    /// Graceful errors do not mark the instance's status as failed, so a
    /// shutdown-time cancellation never poisons the aggregate outcome.
    pub fn is_graceful(&self) -> bool {
        matches!(self, ServiceError::Canceled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canceled_is_graceful() {
        assert!(ServiceError::Canceled.is_graceful());
        assert!(!ServiceError::Failed { error: "boom".into() }.is_graceful());
        assert!(!ServiceError::Panicked { info: "boom".into() }.is_graceful());
    }

    #[test]
    fn labels_are_stable() {
        let err = SuperviseError::UnknownService { name: "web".into() };
        assert_eq!(err.as_label(), "unknown_service");
        assert_eq!(ServiceError::Canceled.as_label(), "service_canceled");
    }
}
