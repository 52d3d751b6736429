use alloc::{
    collections::{BTreeMap, BTreeSet},
    vec::Vec,
};
use core::fmt::{self, Debug, Formatter};

use crate::{
    config::Lifetime,
    errors::CircularDependency,
    finalizer::BoxedCloneFinalizer,
    instantiator::BoxedCloneInstantiator,
    key::ServiceKey,
    utils::thread_safety::RcThreadSafety,
};

/// Registration of a service: how it's instantiated and cached, and what it depends on
#[derive(Clone)]
pub struct ServiceDescriptor {
    key: ServiceKey,
    pub(crate) instantiator: BoxedCloneInstantiator,
    lifetime: Lifetime,
    dependencies: RcThreadSafety<[ServiceKey]>,
    pub(crate) finalizer: Option<BoxedCloneFinalizer>,
}

impl ServiceDescriptor {
    #[inline]
    #[must_use]
    pub(crate) fn new(
        key: ServiceKey,
        instantiator: BoxedCloneInstantiator,
        lifetime: Lifetime,
        dependencies: RcThreadSafety<[ServiceKey]>,
        finalizer: Option<BoxedCloneFinalizer>,
    ) -> Self {
        Self {
            key,
            instantiator,
            lifetime,
            dependencies,
            finalizer,
        }
    }

    #[inline]
    #[must_use]
    pub fn key(&self) -> &ServiceKey {
        &self.key
    }

    #[inline]
    #[must_use]
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// Declared dependency keys, in the order of the constructor parameters
    #[inline]
    #[must_use]
    pub fn dependencies(&self) -> &[ServiceKey] {
        &self.dependencies
    }

    #[inline]
    #[must_use]
    pub fn has_finalizer(&self) -> bool {
        self.finalizer.is_some()
    }
}

impl Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("key", &self.key)
            .field("lifetime", &self.lifetime)
            .field("dependencies", &self.dependencies)
            .field("finalizer", &self.finalizer.is_some())
            .finish_non_exhaustive()
    }
}

#[derive(Default, Clone)]
pub(crate) struct Registry {
    entries: BTreeMap<ServiceKey, ServiceDescriptor>,
}

impl Registry {
    #[inline]
    #[must_use]
    pub(crate) const fn new() -> Self {
        Self { entries: BTreeMap::new() }
    }

    /// Adds the descriptor, replacing the previous one with the same key
    #[inline]
    pub(crate) fn insert(&mut self, descriptor: ServiceDescriptor) -> Option<ServiceDescriptor> {
        self.entries.insert(descriptor.key.clone(), descriptor)
    }

    #[inline]
    #[must_use]
    pub(crate) fn get(&self, key: &ServiceKey) -> Option<&ServiceDescriptor> {
        self.entries.get(key)
    }

    #[inline]
    #[must_use]
    pub(crate) fn contains(&self, key: &ServiceKey) -> bool {
        self.entries.contains_key(key)
    }

    #[inline]
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Adds descriptors of `other`, they override the ones with the same keys
    #[inline]
    pub(crate) fn merge(&mut self, other: &Registry) {
        self.entries
            .extend(other.entries.iter().map(|(key, descriptor)| (key.clone(), descriptor.clone())));
    }

    /// Walks the declared dependency graph and returns the first cycle found.
    ///
    /// Edges to keys without a descriptor are skipped, missing registrations are reported on resolution.
    pub(crate) fn dfs_detect(&self) -> Result<(), CircularDependency> {
        let mut visited = BTreeSet::new();
        let mut stack = Vec::new();

        for key in self.entries.keys() {
            if let Some(cycle_start) = self.dfs_visit(key, &mut visited, &mut stack) {
                let mut chain = stack.split_off(cycle_start);
                if let Some(first) = chain.first().cloned() {
                    chain.push(first);
                }
                return Err(CircularDependency::new(chain));
            }
        }
        Ok(())
    }

    /// Returns the stack position where the cycle starts
    fn dfs_visit(&self, key: &ServiceKey, visited: &mut BTreeSet<ServiceKey>, stack: &mut Vec<ServiceKey>) -> Option<usize> {
        if visited.contains(key) {
            return None;
        }
        if let Some(position) = stack.iter().position(|visiting| visiting == key) {
            return Some(position);
        }
        stack.push(key.clone());

        if let Some(ServiceDescriptor { dependencies, .. }) = self.entries.get(key) {
            for dependency in dependencies.iter() {
                if !self.entries.contains_key(dependency) {
                    continue;
                }
                if let Some(position) = self.dfs_visit(dependency, visited, stack) {
                    return Some(position);
                }
            }
        }

        stack.pop();
        visited.insert(key.clone());
        None
    }
}

impl Debug for Registry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.values()).finish()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::{Registry, ServiceDescriptor};
    use crate::{
        config::Lifetime,
        instantiator::boxed_instance,
        key::ServiceKey,
        utils::thread_safety::{RcAnyThreadSafety, RcThreadSafety},
    };

    use alloc::{string::ToString as _, vec::Vec};

    fn descriptor(key: &'static str, lifetime: Lifetime, dependencies: &[&'static str]) -> ServiceDescriptor {
        let instance: RcAnyThreadSafety = RcThreadSafety::new(());
        ServiceDescriptor::new(
            key.into(),
            boxed_instance(instance),
            lifetime,
            dependencies.iter().copied().map(ServiceKey::from).collect::<Vec<_>>().into(),
            None,
        )
    }

    #[test]
    fn test_insert_overrides() {
        let mut registry = Registry::new();
        assert!(registry.insert(descriptor("a", Lifetime::Transient, &[])).is_none());

        let replaced = registry.insert(descriptor("a", Lifetime::Singleton, &["b"])).unwrap();
        assert_eq!(replaced.lifetime(), Lifetime::Transient);

        let descriptor = registry.get(&"a".into()).unwrap();
        assert_eq!(descriptor.lifetime(), Lifetime::Singleton);
        assert_eq!(descriptor.dependencies(), [ServiceKey::named("b")]);
        assert!(!descriptor.has_finalizer());
        assert_eq!(registry.len(), 1);

        registry.clear();
        assert!(!registry.contains(&"a".into()));
    }

    #[test]
    fn test_merge_overrides() {
        let mut parent = Registry::new();
        parent.insert(descriptor("a", Lifetime::Transient, &[]));
        parent.insert(descriptor("b", Lifetime::Transient, &[]));

        let mut child = Registry::new();
        child.insert(descriptor("a", Lifetime::Scoped, &[]));

        parent.merge(&child);

        assert_eq!(parent.len(), 2);
        assert_eq!(parent.get(&"a".into()).unwrap().lifetime(), Lifetime::Scoped);
    }

    #[test]
    fn test_dfs_detect_ok() {
        let mut registry = Registry::new();
        registry.insert(descriptor("a", Lifetime::Singleton, &[]));
        registry.insert(descriptor("b", Lifetime::Transient, &["a"]));
        registry.insert(descriptor("c", Lifetime::Transient, &["b", "a"]));
        registry.insert(descriptor("d", Lifetime::Transient, &["b", "c", "unregistered"]));

        registry.dfs_detect().unwrap();
    }

    #[test]
    fn test_dfs_detect_single() {
        let mut registry = Registry::new();
        registry.insert(descriptor("a", Lifetime::Transient, &["a"]));

        let err = registry.dfs_detect().unwrap_err();
        assert_eq!(err.to_string(), "Circular dependency detected: a -> a");
    }

    #[test]
    fn test_dfs_detect_many() {
        let mut registry = Registry::new();
        registry.insert(descriptor("root", Lifetime::Transient, &["a"]));
        registry.insert(descriptor("a", Lifetime::Transient, &["b"]));
        registry.insert(descriptor("b", Lifetime::Transient, &["c"]));
        registry.insert(descriptor("c", Lifetime::Transient, &["a"]));

        let err = registry.dfs_detect().unwrap_err();
        assert_eq!(
            err.chain(),
            [
                ServiceKey::named("a"),
                ServiceKey::named("b"),
                ServiceKey::named("c"),
                ServiceKey::named("a")
            ]
        );
    }
}
