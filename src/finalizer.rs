use alloc::boxed::Box;
use core::any::type_name;

use crate::{
    service::{service_fn, BoxCloneService},
    utils::thread_safety::{RcAnyThreadSafety, RcThreadSafety, SendSafety, SyncSafety},
};

/// Hook called for a cached instance when its container is disposed.
///
/// Implemented for closures `FnMut(RcThreadSafety<Dep>) -> Result<(), anyhow::Error>`.
/// An error is logged by the container and doesn't stop finalization of other instances.
pub trait Finalizer<Dep>: Clone + 'static {
    #[allow(clippy::missing_errors_doc)]
    fn finalize(&mut self, dependency: RcThreadSafety<Dep>) -> Result<(), anyhow::Error>;
}

/// Cleanup exposed by the service itself.
/// Use [`crate::Config::disposable`] to call it on disposal of the container.
pub trait Dispose {
    #[allow(clippy::missing_errors_doc)]
    fn dispose(&self) -> Result<(), anyhow::Error>;
}

pub(crate) type BoxedCloneFinalizer = BoxCloneService<RcAnyThreadSafety, (), anyhow::Error>;

#[must_use]
pub(crate) fn boxed_finalizer_factory<Dep, Fin>(mut finalizer: Fin) -> BoxedCloneFinalizer
where
    Dep: SendSafety + SyncSafety + 'static,
    Fin: Finalizer<Dep> + SendSafety + SyncSafety,
{
    BoxCloneService(Box::new(service_fn(move |dependency: RcAnyThreadSafety| {
        let dependency = dependency
            .downcast::<Dep>()
            .map_err(|_| anyhow::anyhow!("Finalizer expects an instance of `{}`", type_name::<Dep>()))?;
        finalizer.finalize(dependency)
    })))
}

impl<F, Dep> Finalizer<Dep> for F
where
    F: FnMut(RcThreadSafety<Dep>) -> Result<(), anyhow::Error> + Clone + 'static,
{
    #[inline]
    fn finalize(&mut self, dependency: RcThreadSafety<Dep>) -> Result<(), anyhow::Error> {
        self(dependency)
    }
}

#[cfg(test)]
mod tests {
    use super::boxed_finalizer_factory;
    use crate::{
        service::Service as _,
        utils::thread_safety::{RcAnyThreadSafety, RcThreadSafety},
    };

    use alloc::string::ToString as _;
    use core::sync::atomic::{AtomicU8, Ordering};

    struct Connection(AtomicU8);

    #[test]
    fn test_finalizer_receives_instance() {
        let connection = RcThreadSafety::new(Connection(AtomicU8::new(0)));

        let mut finalizer = boxed_finalizer_factory(|connection: RcThreadSafety<Connection>| {
            connection.0.fetch_add(1, Ordering::SeqCst);
            Ok::<_, anyhow::Error>(())
        });
        finalizer.call(connection.clone() as RcAnyThreadSafety).unwrap();

        assert_eq!(connection.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_finalizer_rejects_other_type() {
        let mut finalizer = boxed_finalizer_factory(|_: RcThreadSafety<Connection>| Ok::<_, anyhow::Error>(()));

        let err = finalizer.call(RcThreadSafety::new(1u8) as RcAnyThreadSafety).unwrap_err();
        assert!(err.to_string().contains("Connection"));
    }
}
