use alloc::boxed::Box;
use tracing::debug;

use crate::{
    args::Args,
    dependency_resolver::{DependencyKeys, DependencyList},
    errors::{InstantiateErrorKind, ResolveErrorKind},
    key::ServiceKey,
    service::{service_fn, BoxCloneService},
    utils::thread_safety::{RcAnyThreadSafety, RcThreadSafety, SendSafety, SyncSafety},
    Container,
};

/// Constructor of a service from its injected dependencies.
///
/// Implemented for closures `Fn(T1, ..., Tn) -> Result<Provides, Err>` where every parameter is a
/// [`crate::DependencyResolver`] (up to 12 parameters) and `Err: Into<InstantiateErrorKind>`.
/// Parameters are matched with the declared dependency keys by position.
pub trait Constructor<Deps>: Clone + SendSafety + SyncSafety + 'static {
    type Provides: SendSafety + SyncSafety + 'static;

    #[allow(clippy::missing_errors_doc)]
    fn construct(&self, dependencies: Deps) -> Result<Self::Provides, InstantiateErrorKind>;
}

/// Same as [`Constructor`], but the runtime arguments of the resolution call are passed
/// after the injected dependencies: `Fn(T1, ..., Tn, Args) -> Result<Provides, Err>`
pub trait ConstructorWithArgs<Deps>: Clone + SendSafety + SyncSafety + 'static {
    type Provides: SendSafety + SyncSafety + 'static;

    #[allow(clippy::missing_errors_doc)]
    fn construct(&self, dependencies: Deps, args: Args) -> Result<Self::Provides, InstantiateErrorKind>;
}

macro_rules! impl_constructor {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case)]
        impl<F, Provides, Err, $($ty,)*> Constructor<($($ty,)*)> for F
        where
            F: Fn($($ty,)*) -> Result<Provides, Err> + Clone + SendSafety + SyncSafety + 'static,
            Provides: SendSafety + SyncSafety + 'static,
            Err: Into<InstantiateErrorKind>,
        {
            type Provides = Provides;

            #[inline]
            fn construct(&self, ($($ty,)*): ($($ty,)*)) -> Result<Self::Provides, InstantiateErrorKind> {
                self($($ty,)*).map_err(Into::into)
            }
        }

        #[allow(non_snake_case)]
        impl<F, Provides, Err, $($ty,)*> ConstructorWithArgs<($($ty,)*)> for F
        where
            F: Fn($($ty,)* Args) -> Result<Provides, Err> + Clone + SendSafety + SyncSafety + 'static,
            Provides: SendSafety + SyncSafety + 'static,
            Err: Into<InstantiateErrorKind>,
        {
            type Provides = Provides;

            #[inline]
            fn construct(&self, ($($ty,)*): ($($ty,)*), args: Args) -> Result<Self::Provides, InstantiateErrorKind> {
                self($($ty,)* args).map_err(Into::into)
            }
        }
    };
}

all_the_tuples!(impl_constructor);

pub(crate) struct Request {
    container: Container,
    args: Args,
}

impl Request {
    #[inline]
    #[must_use]
    pub(crate) const fn new(container: Container, args: Args) -> Self {
        Self { container, args }
    }
}

/// Type-erased instantiator stored in a service descriptor.
/// It's called with the resolving container, so dependencies are resolved where the resolution started.
pub(crate) type BoxedCloneInstantiator = BoxCloneService<Request, RcAnyThreadSafety, ResolveErrorKind>;

#[must_use]
pub(crate) fn boxed_factory<T, F>(factory: F) -> BoxedCloneInstantiator
where
    T: SendSafety + SyncSafety + 'static,
    F: Fn(&Container, &Args) -> Result<T, InstantiateErrorKind> + Clone + SendSafety + SyncSafety + 'static,
{
    BoxCloneService(Box::new(service_fn(move |Request { container, args }| {
        let dependency = factory(&container, &args)?;
        debug!("Instantiated");
        Ok::<_, ResolveErrorKind>(RcThreadSafety::new(dependency) as RcAnyThreadSafety)
    })))
}

#[must_use]
pub(crate) fn boxed_constructor<Deps, C>(dependent: ServiceKey, constructor: C, keys: RcThreadSafety<[ServiceKey]>) -> BoxedCloneInstantiator
where
    Deps: DependencyList + 'static,
    C: Constructor<Deps>,
{
    BoxCloneService(Box::new(service_fn(move |Request { container, .. }| {
        let dependencies = Deps::resolve_all(&container, &mut DependencyKeys::new(&dependent, &keys))?;
        let dependency = constructor.construct(dependencies)?;
        debug!("Constructed");
        Ok::<_, ResolveErrorKind>(RcThreadSafety::new(dependency) as RcAnyThreadSafety)
    })))
}

#[must_use]
pub(crate) fn boxed_constructor_with_args<Deps, C>(
    dependent: ServiceKey,
    constructor: C,
    keys: RcThreadSafety<[ServiceKey]>,
) -> BoxedCloneInstantiator
where
    Deps: DependencyList + 'static,
    C: ConstructorWithArgs<Deps>,
{
    BoxCloneService(Box::new(service_fn(move |Request { container, args }| {
        let dependencies = Deps::resolve_all(&container, &mut DependencyKeys::new(&dependent, &keys))?;
        let dependency = constructor.construct(dependencies, args)?;
        debug!("Constructed");
        Ok::<_, ResolveErrorKind>(RcThreadSafety::new(dependency) as RcAnyThreadSafety)
    })))
}

/// Instantiator of a registered instance, every call returns the same value
#[must_use]
pub(crate) fn boxed_instance(instance: RcAnyThreadSafety) -> BoxedCloneInstantiator {
    BoxCloneService(Box::new(service_fn(move |_: Request| Ok::<_, ResolveErrorKind>(instance.clone()))))
}
