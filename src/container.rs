use alloc::{
    string::{String, ToString as _},
    vec::Vec,
};
use core::{
    any::type_name,
    fmt::{self, Debug, Formatter},
    sync::atomic::{AtomicBool, Ordering},
};
use parking_lot::Mutex;
use tracing::{debug, error, info_span, warn};

use crate::{
    args::Args,
    cache::{Cache, Resolved},
    config::{Config, Lifetime},
    dependency_resolver::DependencyList,
    errors::{CircularDependency, DisposedError, InstantiateErrorKind, RegisterErrorKind, ResolveErrorKind},
    instantiator::{
        boxed_constructor, boxed_constructor_with_args, boxed_factory, boxed_instance, BoxedCloneInstantiator, Constructor,
        ConstructorWithArgs, Request,
    },
    key::ServiceKey,
    lazy::Lazy,
    registry::{Registry, ServiceDescriptor},
    service::Service as _,
    utils::thread_safety::{RcAnyThreadSafety, RcThreadSafety, SendSafety, SyncSafety},
};

/// Service container.
///
/// Holds registrations and the instances it has cached, and may have a parent it falls back to
/// when a registration isn't found locally (see [`Container::create_scope`]).
/// Cloning is cheap, clones share the same state.
///
/// The container is disposed with [`Container::dispose`] or when its last handle is dropped.
///
/// # Concurrency
/// The container tracks the keys being resolved in a single stack shared by its handles.
/// Two threads resolving the same key on the same container at the same time may get a false
/// [`ResolveErrorKind::CircularDependency`]. Resolve from one thread per container, or use a scope per thread.
#[derive(Clone)]
pub struct Container {
    pub(crate) inner: RcThreadSafety<ContainerInner>,
}

impl Container {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RcThreadSafety::new(ContainerInner::new(None)),
        }
    }

    /// Registers a factory called with the resolving container and the runtime arguments of the call.
    ///
    /// Registering the same key again replaces the registration, instances cached before are kept.
    #[allow(clippy::missing_errors_doc)]
    pub fn register<T, F>(&self, key: impl Into<ServiceKey>, factory: F, config: Config) -> Result<&Self, RegisterErrorKind>
    where
        T: SendSafety + SyncSafety + 'static,
        F: Fn(&Container, &Args) -> Result<T, InstantiateErrorKind> + Clone + SendSafety + SyncSafety + 'static,
    {
        self.ensure_active()?;

        let Config {
            lifetime,
            dependencies,
            finalizer,
        } = config;
        self.insert_descriptor(ServiceDescriptor::new(
            key.into(),
            boxed_factory(factory),
            lifetime,
            dependencies.into(),
            finalizer,
        ));
        Ok(self)
    }

    /// Registers a constructor whose parameters are resolved from the keys in [`Config::dependencies`], by position.
    ///
    /// # Errors
    /// - [`RegisterErrorKind::Disposed`] if the container is disposed.
    /// - [`RegisterErrorKind::DependencyCount`] if the count of declared keys differs from the count of parameters.
    pub fn register_class<Deps, C>(&self, key: impl Into<ServiceKey>, constructor: C, config: Config) -> Result<&Self, RegisterErrorKind>
    where
        Deps: DependencyList + 'static,
        C: Constructor<Deps>,
    {
        self.register_constructed::<Deps>(key.into(), config, |key, dependencies| {
            boxed_constructor::<Deps, C>(key, constructor, dependencies)
        })
    }

    /// Same as [`Container::register_class`], but the runtime arguments are passed to the constructor
    /// after the injected dependencies
    #[allow(clippy::missing_errors_doc)]
    pub fn register_class_with_args<Deps, C>(
        &self,
        key: impl Into<ServiceKey>,
        constructor: C,
        config: Config,
    ) -> Result<&Self, RegisterErrorKind>
    where
        Deps: DependencyList + 'static,
        C: ConstructorWithArgs<Deps>,
    {
        self.register_constructed::<Deps>(key.into(), config, |key, dependencies| {
            boxed_constructor_with_args::<Deps, C>(key, constructor, dependencies)
        })
    }

    /// Registers a ready instance. It's cached as a singleton right away, replacing an instance
    /// cached under the key before, and child scopes resolving the key get the same instance.
    #[inline]
    #[allow(clippy::missing_errors_doc)]
    pub fn register_instance<T>(&self, key: impl Into<ServiceKey>, instance: T) -> Result<&Self, RegisterErrorKind>
    where
        T: SendSafety + SyncSafety + 'static,
    {
        self.register_instance_with(key, instance, Config::singleton())
    }

    /// Same as [`Container::register_instance`], but the finalizer of `config` is called for the instance
    /// when this container is disposed. The lifetime and dependencies of `config` are ignored.
    #[allow(clippy::missing_errors_doc)]
    pub fn register_instance_with<T>(
        &self,
        key: impl Into<ServiceKey>,
        instance: T,
        config: Config,
    ) -> Result<&Self, RegisterErrorKind>
    where
        T: SendSafety + SyncSafety + 'static,
    {
        self.ensure_active()?;

        let key = key.into();
        let instance: RcAnyThreadSafety = RcThreadSafety::new(instance);
        self.inner
            .cache
            .lock()
            .replace_singleton(&key, instance.clone(), config.finalizer.as_ref());
        self.insert_descriptor(ServiceDescriptor::new(
            key,
            boxed_instance(instance),
            Lifetime::Singleton,
            RcThreadSafety::from(Vec::new()),
            // Scopes share the instance, only the registering container finalizes it
            None,
        ));
        Ok(self)
    }

    #[inline]
    #[allow(clippy::missing_errors_doc)]
    pub fn resolve<T>(&self, key: impl Into<ServiceKey>) -> Result<RcThreadSafety<T>, ResolveErrorKind>
    where
        T: SendSafety + SyncSafety + 'static,
    {
        self.resolve_with(key, Args::new())
    }

    /// Resolves the service, passing `args` to its factory.
    ///
    /// Arguments are ignored if the instance is taken from the cache.
    #[allow(clippy::missing_errors_doc)]
    pub fn resolve_with<T>(&self, key: impl Into<ServiceKey>, args: Args) -> Result<RcThreadSafety<T>, ResolveErrorKind>
    where
        T: SendSafety + SyncSafety + 'static,
    {
        let key = key.into();

        let span = info_span!("resolve", service = %key);
        let _guard = span.enter();

        let dependency = self.resolve_any(&key, args)?;
        match dependency.downcast::<T>() {
            Ok(dependency) => Ok(dependency),
            Err(_) => {
                let err = ResolveErrorKind::IncorrectType {
                    key,
                    expected: type_name::<T>(),
                };
                error!("{}", err);
                Err(err)
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn try_resolve<T>(&self, key: impl Into<ServiceKey>) -> Option<RcThreadSafety<T>>
    where
        T: SendSafety + SyncSafety + 'static,
    {
        self.try_resolve_with(key, Args::new())
    }

    /// Same as [`Container::resolve_with`], but any failure is logged and `None` is returned
    #[must_use]
    pub fn try_resolve_with<T>(&self, key: impl Into<ServiceKey>, args: Args) -> Option<RcThreadSafety<T>>
    where
        T: SendSafety + SyncSafety + 'static,
    {
        let key = key.into();
        match self.resolve_with::<T>(&key, args) {
            Ok(dependency) => Some(dependency),
            Err(err) => {
                warn!(service = %key, "Service not resolved: {}", err);
                None
            }
        }
    }

    /// Returns a handle that resolves the service on the first [`Lazy::get`].
    /// The handle doesn't keep the container alive.
    #[inline]
    #[must_use]
    pub fn lazy<T>(&self, key: impl Into<ServiceKey>) -> Lazy<T> {
        self.lazy_with(key, Args::new())
    }

    #[inline]
    #[must_use]
    pub fn lazy_with<T>(&self, key: impl Into<ServiceKey>, args: Args) -> Lazy<T> {
        Lazy::new(self, key.into(), args)
    }

    /// Checks the container and its parents. Always `false` for a disposed container.
    #[inline]
    #[must_use]
    pub fn is_registered(&self, key: impl Into<ServiceKey>) -> bool {
        self.find_descriptor(&key.into()).is_some()
    }

    /// Returns the local registration, or the nearest one from the parents
    #[inline]
    #[must_use]
    pub fn find_service_descriptor(&self, key: impl Into<ServiceKey>) -> Option<ServiceDescriptor> {
        self.find_descriptor(&key.into())
    }

    /// Creates a child container.
    ///
    /// The child has no registrations and no cached instances of its own.
    /// Registrations not found in the child are looked up in the parents,
    /// but instances are cached by the container that resolves them.
    #[allow(clippy::missing_errors_doc)]
    pub fn create_scope(&self) -> Result<Container, DisposedError> {
        self.ensure_active()?;

        debug!("Scope created");
        Ok(Self {
            inner: RcThreadSafety::new(ContainerInner::new(Some(self.clone()))),
        })
    }

    /// Finalizes cached instances, then drops every registration and instance of the container.
    ///
    /// Singletons are finalized before scoped instances, each in the order they were resolved.
    /// A failed finalizer is logged and doesn't stop the others.
    /// Calling it again does nothing. Parents and child scopes aren't disposed.
    #[inline]
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    #[inline]
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }

    /// Checks the declared dependencies of every registration visible from the container for cycles,
    /// without instantiating anything.
    ///
    /// Registrations of the container override the ones of its parents with the same keys.
    ///
    /// # Errors
    /// - [`ResolveErrorKind::Disposed`] if the container is disposed.
    /// - [`ResolveErrorKind::CircularDependency`] with the path of the first cycle found.
    pub fn validate_no_cycles(&self) -> Result<(), ResolveErrorKind> {
        self.ensure_active()?;

        let mut containers = Vec::new();
        let mut container = Some(self);
        while let Some(current) = container {
            containers.push(current);
            container = current.inner.parent.as_ref();
        }

        let mut registry = Registry::new();
        for container in containers.into_iter().rev() {
            registry.merge(&container.inner.registry.lock());
        }

        match registry.dfs_detect() {
            Ok(()) => {
                debug!(services = registry.len(), "No cycles found");
                Ok(())
            }
            Err(err) => {
                error!("{}", err);
                Err(err.into())
            }
        }
    }

    /// Readable name of the key, the same used in errors and logs
    #[inline]
    #[must_use]
    pub fn service_name(key: impl Into<ServiceKey>) -> String {
        key.into().to_string()
    }
}

impl Container {
    fn ensure_active(&self) -> Result<(), DisposedError> {
        if self.is_disposed() {
            error!("{}", DisposedError);
            return Err(DisposedError);
        }
        Ok(())
    }

    fn register_constructed<Deps: DependencyList>(
        &self,
        key: ServiceKey,
        config: Config,
        instantiator: impl FnOnce(ServiceKey, RcThreadSafety<[ServiceKey]>) -> BoxedCloneInstantiator,
    ) -> Result<&Self, RegisterErrorKind> {
        self.ensure_active()?;

        let Config {
            lifetime,
            dependencies,
            finalizer,
        } = config;
        if dependencies.len() != Deps::LEN {
            let err = RegisterErrorKind::DependencyCount {
                key,
                declared: dependencies.len(),
                expected: Deps::LEN,
            };
            error!("{}", err);
            return Err(err);
        }

        let dependencies: RcThreadSafety<[ServiceKey]> = dependencies.into();
        let instantiator = instantiator(key.clone(), dependencies.clone());
        self.insert_descriptor(ServiceDescriptor::new(key, instantiator, lifetime, dependencies, finalizer));
        Ok(self)
    }

    fn insert_descriptor(&self, descriptor: ServiceDescriptor) {
        let key = descriptor.key().clone();
        let lifetime = descriptor.lifetime();

        if self.inner.registry.lock().insert(descriptor).is_some() {
            debug!(service = %key, %lifetime, "Registration replaced");
        } else {
            debug!(service = %key, %lifetime, "Registered");
        }
    }

    fn find_descriptor(&self, key: &ServiceKey) -> Option<ServiceDescriptor> {
        let mut container = self;
        loop {
            if container.is_disposed() {
                return None;
            }

            let descriptor = container.inner.registry.lock().get(key).cloned();
            if descriptor.is_some() {
                return descriptor;
            }
            container = container.inner.parent.as_ref()?;
        }
    }

    fn resolve_any(&self, key: &ServiceKey, args: Args) -> Result<RcAnyThreadSafety, ResolveErrorKind> {
        if self.is_disposed() {
            let err = ResolveErrorKind::Disposed;
            error!("{}", err);
            return Err(err);
        }

        let cached = self.inner.cache.lock().get(key);
        if let Some(dependency) = cached {
            debug!("Found in cache");
            return Ok(dependency);
        }
        debug!("Not found in cache");

        let Some(descriptor) = self.find_descriptor(key) else {
            let err = ResolveErrorKind::NoInstantiator { key: key.clone() };
            error!("{}", err);
            return Err(err);
        };

        let dependency = {
            let _resolution = match ResolutionGuard::enter(&self.inner.resolution_stack, key) {
                Ok(resolution) => resolution,
                Err(err) => {
                    error!("{}", err);
                    return Err(err.into());
                }
            };

            match descriptor.instantiator.clone().call(Request::new(self.clone(), args)) {
                Ok(dependency) => dependency,
                Err(err) => {
                    error!("{}", err);
                    return Err(err);
                }
            }
        };

        let lifetime = descriptor.lifetime();
        let dependency = self
            .inner
            .cache
            .lock()
            .insert(key, lifetime, dependency, descriptor.finalizer.as_ref());
        debug!(%lifetime, "Resolved");

        Ok(dependency)
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Container {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("registry", &*self.inner.registry.lock())
            .field("has_parent", &self.inner.parent.is_some())
            .field("is_disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

pub(crate) struct ContainerInner {
    pub(crate) registry: Mutex<Registry>,
    pub(crate) cache: Mutex<Cache>,
    pub(crate) resolution_stack: Mutex<Vec<ServiceKey>>,
    pub(crate) parent: Option<Container>,
    pub(crate) disposed: AtomicBool,
}

impl ContainerInner {
    #[inline]
    #[must_use]
    fn new(parent: Option<Container>) -> Self {
        Self {
            registry: Mutex::new(Registry::new()),
            cache: Mutex::new(Cache::new()),
            resolution_stack: Mutex::new(Vec::new()),
            parent,
            disposed: AtomicBool::new(false),
        }
    }

    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            debug!("Container already disposed");
            return;
        }

        let resolved = self.cache.lock().take_resolved();
        for Resolved {
            key,
            dependency,
            mut finalizer,
            ..
        } in resolved
        {
            match finalizer.call(dependency) {
                Ok(()) => debug!(service = %key, "Finalizer called"),
                Err(err) => error!(service = %key, "Finalizer failed: {}", err),
            }
        }

        self.cache.lock().clear();
        self.registry.lock().clear();
        self.resolution_stack.lock().clear();
        debug!("Container disposed");
    }
}

impl Drop for ContainerInner {
    fn drop(&mut self) {
        if !self.disposed.load(Ordering::Acquire) {
            self.dispose();
            debug!("Container disposed on drop");
        }
    }
}

/// Marks a key as being resolved by the container until dropped,
/// so the key is removed from the resolution stack whether the factory succeeds or fails
struct ResolutionGuard<'a> {
    stack: &'a Mutex<Vec<ServiceKey>>,
    key: &'a ServiceKey,
}

impl<'a> ResolutionGuard<'a> {
    fn enter(stack: &'a Mutex<Vec<ServiceKey>>, key: &'a ServiceKey) -> Result<Self, CircularDependency> {
        let mut resolving = stack.lock();
        if resolving.contains(key) {
            let mut chain = resolving.clone();
            chain.push(key.clone());
            return Err(CircularDependency::new(chain));
        }
        resolving.push(key.clone());

        Ok(Self { stack, key })
    }
}

impl Drop for ResolutionGuard<'_> {
    fn drop(&mut self) {
        let mut resolving = self.stack.lock();
        if let Some(position) = resolving.iter().rposition(|key| key == self.key) {
            resolving.remove(position);
        }
    }
}
