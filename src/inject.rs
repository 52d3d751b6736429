use crate::{
    dependency_resolver::DependencyResolver,
    key::ServiceKey,
    lazy::Lazy,
    utils::thread_safety::{RcThreadSafety, SendSafety, SyncSafety},
    Container, ResolveErrorKind,
};

/// Resolves the dependency when the dependent is constructed
pub struct Inject<Dep>(pub RcThreadSafety<Dep>);

impl<Dep: SendSafety + SyncSafety + 'static> DependencyResolver for Inject<Dep> {
    fn resolve(container: &Container, key: &ServiceKey) -> Result<Self, ResolveErrorKind> {
        container.resolve(key).map(Self)
    }
}

/// Optional dependency, `None` if the key isn't registered in the container or its parents.
/// Other failures are still returned.
impl<Dep: SendSafety + SyncSafety + 'static> DependencyResolver for Option<Inject<Dep>> {
    fn resolve(container: &Container, key: &ServiceKey) -> Result<Self, ResolveErrorKind> {
        if !container.is_registered(key) {
            return Ok(None);
        }
        Inject::resolve(container, key).map(Some)
    }
}

/// Defers resolution until [`Lazy::get`] is called
impl<Dep: SendSafety + SyncSafety + 'static> DependencyResolver for Lazy<Dep> {
    fn resolve(container: &Container, key: &ServiceKey) -> Result<Self, ResolveErrorKind> {
        Ok(container.lazy(key))
    }
}
