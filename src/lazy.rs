use core::fmt::{self, Debug, Formatter};
use parking_lot::Mutex;
use tracing::debug;

use crate::{
    args::Args,
    container::ContainerInner,
    key::ServiceKey,
    utils::thread_safety::{RcThreadSafety, SendSafety, SyncSafety, WeakThreadSafety},
    Container, ResolveErrorKind,
};

/// Deferred resolution of a service.
///
/// Creating a `Lazy` doesn't call the factory. The first successful [`Lazy::get`] resolves the service
/// in the container the handle was created from, with the runtime arguments given at creation,
/// and every later call returns the same instance regardless of the service lifetime.
/// A failed resolution isn't remembered, the next call tries again.
///
/// The handle doesn't keep the container alive. Once the container is dropped,
/// [`Lazy::get`] fails with [`ResolveErrorKind::Disposed`] unless the instance was already resolved.
///
/// Clones share the resolved instance.
pub struct Lazy<Dep> {
    inner: RcThreadSafety<LazyInner<Dep>>,
}

struct LazyInner<Dep> {
    container: WeakThreadSafety<ContainerInner>,
    key: ServiceKey,
    args: Args,
    resolved: Mutex<Option<RcThreadSafety<Dep>>>,
}

impl<Dep> Lazy<Dep> {
    #[inline]
    #[must_use]
    pub(crate) fn new(container: &Container, key: ServiceKey, args: Args) -> Self {
        Self {
            inner: RcThreadSafety::new(LazyInner {
                container: RcThreadSafety::downgrade(&container.inner),
                key,
                args,
                resolved: Mutex::new(None),
            }),
        }
    }

    #[inline]
    #[must_use]
    pub fn key(&self) -> &ServiceKey {
        &self.inner.key
    }

    #[inline]
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.inner.resolved.lock().is_some()
    }
}

impl<Dep: SendSafety + SyncSafety + 'static> Lazy<Dep> {
    /// Resolves the service on the first call and returns the cached instance afterwards
    #[allow(clippy::missing_errors_doc)]
    pub fn get(&self) -> Result<RcThreadSafety<Dep>, ResolveErrorKind> {
        if let Some(dependency) = self.inner.resolved.lock().as_ref() {
            return Ok(dependency.clone());
        }

        let Some(inner) = self.inner.container.upgrade() else {
            return Err(ResolveErrorKind::Disposed);
        };
        let container = Container { inner };

        // The lock isn't held during resolution, the factory may use other lazy handles
        let dependency = container.resolve_with::<Dep>(&self.inner.key, self.inner.args.clone())?;
        debug!(service = %self.inner.key, "Lazy dependency resolved");

        Ok(self.inner.resolved.lock().get_or_insert(dependency).clone())
    }
}

impl<Dep> Clone for Lazy<Dep> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<Dep> Debug for Lazy<Dep> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lazy")
            .field("key", &self.inner.key)
            .field("is_resolved", &self.is_resolved())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use crate::{args::Args, Config, Container, InstantiateErrorKind, ResolveErrorKind, RcThreadSafety};

    use alloc::{
        format,
        string::{String, ToString as _},
    };
    use core::sync::atomic::{AtomicU8, Ordering};
    use tracing_test::traced_test;

    struct Request(u8);

    #[test]
    #[traced_test]
    fn test_deferred_until_first_get() {
        let call_count = RcThreadSafety::new(AtomicU8::new(0));

        let container = Container::new();
        container
            .register(
                "request",
                {
                    let call_count = call_count.clone();
                    move |_, _| {
                        call_count.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, InstantiateErrorKind>(Request(1))
                    }
                },
                Config::transient(),
            )
            .unwrap();

        let lazy = container.lazy::<Request>("request");
        assert_eq!(call_count.load(Ordering::SeqCst), 0);
        assert!(!lazy.is_resolved());

        let request_1 = lazy.get().unwrap();
        let request_2 = lazy.clone().get().unwrap();

        assert!(lazy.is_resolved());
        assert!(RcThreadSafety::ptr_eq(&request_1, &request_2));
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[traced_test]
    fn test_passes_args() {
        let container = Container::new();
        container
            .register(
                "request",
                |_, args| Ok::<_, InstantiateErrorKind>(Request(args.get::<u8>(0).copied().unwrap_or_default())),
                Config::transient(),
            )
            .unwrap();

        let lazy = container.lazy_with::<Request>("request", Args::new().with(7u8));

        assert_eq!(lazy.get().unwrap().0, 7);
    }

    #[test]
    #[traced_test]
    fn test_failure_is_retried() {
        let container = Container::new();
        let lazy = container.lazy::<Request>("request");

        assert!(matches!(lazy.get(), Err(ResolveErrorKind::NoInstantiator { .. })));
        assert!(!lazy.is_resolved());

        container
            .register("request", |_, _| Ok::<_, InstantiateErrorKind>(Request(2)), Config::default())
            .unwrap();

        assert_eq!(lazy.get().unwrap().0, 2);
        assert_eq!(lazy.key().to_string(), "request");
    }

    #[test]
    #[traced_test]
    fn test_fails_after_container_dropped() {
        let (resolved, pending) = {
            let container = Container::new();
            container
                .register("request", |_, _| Ok::<_, InstantiateErrorKind>(Request(3)), Config::singleton())
                .unwrap();

            let resolved = container.lazy::<Request>("request");
            resolved.get().unwrap();
            (resolved, container.lazy::<Request>("request"))
        };

        assert_eq!(resolved.get().unwrap().0, 3);
        assert!(matches!(pending.get(), Err(ResolveErrorKind::Disposed)));
        assert!(logs_contain("Lazy dependency resolved"));
    }
}
