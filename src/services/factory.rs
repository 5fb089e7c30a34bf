//! # Service factories: the per-class template behind a formation entry.
//!
//! A [`ServiceFactory`] is the "service class": it declares how many
//! instances run by default ([`count`](ServiceFactory::count)), an optional
//! hard ceiling ([`limit`](ServiceFactory::limit)), and builds one
//! independent [`ServiceRef`] per slot. Building per slot keeps each
//! instance's state independent across the formation.

use std::{borrow::Cow, sync::Arc};

use crate::config::Options;

use super::service::ServiceRef;

/// Shared handle to a service factory.
pub type FactoryRef = Arc<dyn ServiceFactory>;

/// Template for service instances resolved from a formation entry.
pub trait ServiceFactory: Send + Sync + 'static {
    /// Name the formation refers to this service by.
    fn name(&self) -> &str;

    /// Default number of instances when the formation omits a count.
    fn count(&self) -> usize {
        1
    }

    /// Hard ceiling on simultaneous instances; `None` means unbounded.
    fn limit(&self) -> Option<usize> {
        None
    }

    /// Builds one independent instance with the container's options.
    fn build(&self, options: &Options) -> ServiceRef;
}

/// # Closure-backed factory.
///
/// Convenience implementation for composing formations without hand-written
/// factory structs.
///
/// # Example
/// ```
/// use servisor::{FactoryFn, ServiceFactory, ServiceFn, ServiceError, Options};
/// use tokio_util::sync::CancellationToken;
///
/// let factory = FactoryFn::new("worker", |_opts: &Options| {
///     ServiceFn::arc("worker", |_ctx: CancellationToken| async move {
///         Ok::<_, ServiceError>(())
///     })
/// })
/// .with_count(2)
/// .with_limit(4);
///
/// assert_eq!(factory.count(), 2);
/// assert_eq!(factory.limit(), Some(4));
/// ```
pub struct FactoryFn {
    name: Cow<'static, str>,
    count: usize,
    limit: Option<usize>,
    build: Box<dyn Fn(&Options) -> ServiceRef + Send + Sync>,
}

impl FactoryFn {
    /// Creates a factory with default count 1 and no limit.
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        build: impl Fn(&Options) -> ServiceRef + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            count: 1,
            limit: None,
            build: Box::new(build),
        }
    }

    /// Sets the default instance count.
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    /// Sets the hard instance ceiling.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns the factory as a shared handle.
    pub fn arc(self) -> FactoryRef {
        Arc::new(self)
    }
}

impl ServiceFactory for FactoryFn {
    fn name(&self) -> &str {
        &self.name
    }

    fn count(&self) -> usize {
        self.count
    }

    fn limit(&self) -> Option<usize> {
        self.limit
    }

    fn build(&self, options: &Options) -> ServiceRef {
        (self.build)(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::services::ServiceFn;
    use tokio_util::sync::CancellationToken;

    #[test]
    fn builds_independent_instances() {
        let factory = FactoryFn::new("worker", |_opts| {
            ServiceFn::arc("worker", |_ctx: CancellationToken| async move {
                Ok::<_, ServiceError>(())
            })
        });
        let opts = Options::new();
        let a = factory.build(&opts);
        let b = factory.build(&opts);
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(factory.count(), 1);
        assert_eq!(factory.limit(), None);
    }
}
