//! # Service abstraction and function-backed implementation.
//!
//! [`Service`] is the unit of work the supervisor manages: an async,
//! cancelable `run` plus a `stop` cleanup hook. The common handle type is
//! [`ServiceRef`], an `Arc<dyn Service>` shared between the supervisor and
//! the launched unit.
//!
//! A service receives a [`CancellationToken`] and should periodically check
//! it to stop cooperatively during shutdown.

use std::{borrow::Cow, future::Future, sync::Mutex};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::ServiceError;

/// Shared handle to a service object.
pub type ServiceRef = std::sync::Arc<dyn Service>;

/// # Asynchronous, cancelable unit of work.
///
/// A `Service` has a stable [`name`](Service::name) and an async
/// [`run`](Service::run) that executes until completion, failure, or
/// cancellation. [`stop`](Service::stop) runs on every exit path for
/// cleanup. [`restartable`](Service::restartable) tells the supervisor
/// whether this service should be relaunched after it exits.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use async_trait::async_trait;
/// use servisor::{Service, ServiceError};
///
/// struct Heartbeat;
///
/// #[async_trait]
/// impl Service for Heartbeat {
///     fn name(&self) -> &str { "heartbeat" }
///
///     async fn run(&self, ctx: CancellationToken) -> Result<(), ServiceError> {
///         while !ctx.is_cancelled() {
///             // emit a beat...
///             tokio::time::sleep(std::time::Duration::from_millis(50)).await;
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Service: Send + Sync + 'static {
    /// Returns a stable, human-readable service name.
    fn name(&self) -> &str;

    /// Executes the service until completion or cancellation.
    ///
    /// Implementations should check `ctx.is_cancelled()` and exit promptly
    /// to honor stop signals. Returning [`ServiceError::Canceled`] reports
    /// a cooperative stop and is treated as graceful.
    async fn run(&self, ctx: CancellationToken) -> Result<(), ServiceError>;

    /// Cleanup hook invoked after `run` returns, on every exit path.
    async fn stop(&self) {}

    /// Whether the supervisor should relaunch this service after it exits.
    fn restartable(&self) -> bool {
        true
    }
}

/// # Function-backed service implementation.
///
/// Wraps a closure `Fnc: FnMut(CancellationToken) -> Fut`. The closure is
/// guarded by a [`Mutex`] so `run(&self, ..)` can be called repeatedly even
/// though the closure is `FnMut`; the mutex is held only while the future is
/// created, never while it executes.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use servisor::{ServiceFn, ServiceRef, ServiceError};
///
/// let svc: ServiceRef = ServiceFn::arc("worker", |ctx: CancellationToken| async move {
///     if ctx.is_cancelled() {
///         return Ok(());
///     }
///     // do work...
///     Ok::<_, ServiceError>(())
/// });
///
/// assert_eq!(svc.name(), "worker");
/// ```
pub struct ServiceFn<Fnc, Fut>
where
    Fnc: FnMut(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), ServiceError>> + Send + 'static,
{
    /// Stable service name.
    name: Cow<'static, str>,
    /// Underlying function (mutex allows `FnMut` behind `&self`).
    func: Mutex<Fnc>,
    /// Relaunch-after-exit flag reported to the supervisor.
    restartable: bool,
}

impl<Fnc, Fut> ServiceFn<Fnc, Fut>
where
    Fnc: FnMut(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), ServiceError>> + Send + 'static,
{
    /// Creates a new function-backed, restartable service.
    ///
    /// Prefer [`ServiceFn::arc`] when you immediately need a [`ServiceRef`].
    pub fn new(name: impl Into<Cow<'static, str>>, func: Fnc) -> Self {
        Self {
            name: name.into(),
            func: Mutex::new(func),
            restartable: true,
        }
    }

    /// Sets whether the service should be relaunched after it exits.
    pub fn restartable(mut self, restartable: bool) -> Self {
        self.restartable = restartable;
        self
    }

    /// Creates the service and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, func: Fnc) -> ServiceRef {
        std::sync::Arc::new(Self::new(name, func))
    }

    /// Like [`ServiceFn::arc`], for services that must not be relaunched.
    pub fn arc_once(name: impl Into<Cow<'static, str>>, func: Fnc) -> ServiceRef {
        std::sync::Arc::new(Self::new(name, func).restartable(false))
    }
}

#[async_trait]
impl<Fnc, Fut> Service for ServiceFn<Fnc, Fut>
where
    Fnc: FnMut(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), ServiceError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: CancellationToken) -> Result<(), ServiceError> {
        let fut = {
            let mut f = self.func.lock().map_err(|_| ServiceError::Failed {
                error: "service closure mutex poisoned".into(),
            })?;
            (f)(ctx)
        };
        fut.await
    }

    fn restartable(&self) -> bool {
        self.restartable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn service_fn_runs_and_reports_name() {
        let svc = ServiceFn::arc("echo", |_ctx: CancellationToken| async move {
            Ok::<_, ServiceError>(())
        });
        assert_eq!(svc.name(), "echo");
        assert!(svc.restartable());
        assert!(svc.run(CancellationToken::new()).await.is_ok());
    }

    #[tokio::test]
    async fn arc_once_is_not_restartable() {
        let svc = ServiceFn::arc_once("one-shot", |_ctx: CancellationToken| async move {
            Ok::<_, ServiceError>(())
        });
        assert!(!svc.restartable());
    }
}
