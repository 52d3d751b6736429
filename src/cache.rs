use alloc::{
    collections::{btree_map::Entry, vec_deque::VecDeque, BTreeMap},
    vec::Vec,
};

use crate::{
    config::Lifetime, finalizer::BoxedCloneFinalizer, key::ServiceKey, utils::thread_safety::RcAnyThreadSafety,
};

/// Instances owned by a single container
#[derive(Default)]
pub(crate) struct Cache {
    singletons: BTreeMap<ServiceKey, RcAnyThreadSafety>,
    scoped: BTreeMap<ServiceKey, RcAnyThreadSafety>,
    resolved: ResolvedSet,
}

impl Cache {
    #[must_use]
    pub(crate) const fn new() -> Self {
        Self {
            singletons: BTreeMap::new(),
            scoped: BTreeMap::new(),
            resolved: ResolvedSet::new(),
        }
    }

    /// Singleton cache is checked before the scoped one
    #[must_use]
    pub(crate) fn get(&self, key: &ServiceKey) -> Option<RcAnyThreadSafety> {
        self.singletons.get(key).or_else(|| self.scoped.get(key)).cloned()
    }

    /// Caches the instance according to its lifetime and returns the cached one.
    ///
    /// If the key is already cached, the existing instance wins and `finalizer` isn't recorded.
    /// Transient instances are returned as is.
    pub(crate) fn insert(
        &mut self,
        key: &ServiceKey,
        lifetime: Lifetime,
        dependency: RcAnyThreadSafety,
        finalizer: Option<&BoxedCloneFinalizer>,
    ) -> RcAnyThreadSafety {
        let map = match lifetime {
            Lifetime::Singleton => &mut self.singletons,
            Lifetime::Scoped => &mut self.scoped,
            Lifetime::Transient => return dependency,
        };

        match map.entry(key.clone()) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                if let Some(finalizer) = finalizer {
                    self.resolved.push(Resolved {
                        key: key.clone(),
                        lifetime,
                        dependency: dependency.clone(),
                        finalizer: finalizer.clone(),
                    });
                }
                entry.insert(dependency).clone()
            }
        }
    }

    /// Caches the instance as a singleton, replacing any instance cached under the key
    /// together with its pending finalization
    pub(crate) fn replace_singleton(
        &mut self,
        key: &ServiceKey,
        dependency: RcAnyThreadSafety,
        finalizer: Option<&BoxedCloneFinalizer>,
    ) {
        self.scoped.remove(key);
        self.resolved.remove(key);
        if let Some(finalizer) = finalizer {
            self.resolved.push(Resolved {
                key: key.clone(),
                lifetime: Lifetime::Singleton,
                dependency: dependency.clone(),
                finalizer: finalizer.clone(),
            });
        }
        self.singletons.insert(key.clone(), dependency);
    }

    #[inline]
    #[must_use]
    pub(crate) fn singletons_len(&self) -> usize {
        self.singletons.len()
    }

    #[inline]
    #[must_use]
    pub(crate) fn scoped_len(&self) -> usize {
        self.scoped.len()
    }

    /// Takes instances to finalize: singletons first, then scoped ones, each group in resolution order
    #[must_use]
    pub(crate) fn take_resolved(&mut self) -> Vec<Resolved> {
        let (mut singletons, scoped): (Vec<_>, Vec<_>) = core::mem::take(&mut self.resolved)
            .0
            .into_iter()
            .partition(|resolved| resolved.lifetime == Lifetime::Singleton);
        singletons.extend(scoped);
        singletons
    }

    pub(crate) fn clear(&mut self) {
        self.singletons.clear();
        self.scoped.clear();
        self.resolved.0.clear();
    }
}

pub(crate) struct Resolved {
    pub(crate) key: ServiceKey,
    pub(crate) lifetime: Lifetime,
    pub(crate) dependency: RcAnyThreadSafety,
    pub(crate) finalizer: BoxedCloneFinalizer,
}

#[derive(Default)]
pub(crate) struct ResolvedSet(pub(crate) VecDeque<Resolved>);

impl ResolvedSet {
    pub(crate) const fn new() -> Self {
        Self(VecDeque::new())
    }

    pub(crate) fn push(&mut self, resolved: Resolved) {
        self.0.push_back(resolved);
    }

    pub(crate) fn remove(&mut self, key: &ServiceKey) {
        self.0.retain(|resolved| resolved.key != *key);
    }
}

#[cfg(test)]
mod tests {
    use super::Cache;
    use crate::{
        config::Lifetime,
        finalizer::boxed_finalizer_factory,
        key::ServiceKey,
        utils::thread_safety::{RcAnyThreadSafety, RcThreadSafety},
    };

    use alloc::vec::Vec;

    fn instance(value: u8) -> RcAnyThreadSafety {
        RcThreadSafety::new(value)
    }

    #[test]
    fn test_insert_by_lifetime() {
        let mut cache = Cache::new();

        cache.insert(&"singleton".into(), Lifetime::Singleton, instance(1), None);
        cache.insert(&"scoped".into(), Lifetime::Scoped, instance(2), None);
        cache.insert(&"transient".into(), Lifetime::Transient, instance(3), None);

        assert_eq!(cache.singletons_len(), 1);
        assert_eq!(cache.scoped_len(), 1);
        assert!(cache.get(&"singleton".into()).is_some());
        assert!(cache.get(&"scoped".into()).is_some());
        assert!(cache.get(&"transient".into()).is_none());
    }

    #[test]
    fn test_first_insert_wins() {
        let mut cache = Cache::new();
        let key = ServiceKey::named("singleton");

        let first = cache.insert(&key, Lifetime::Singleton, instance(1), None);
        let second = cache.insert(&key, Lifetime::Singleton, instance(2), None);

        assert!(RcAnyThreadSafety::ptr_eq(&first, &second));
        assert_eq!(cache.get(&key).unwrap().downcast_ref::<u8>(), Some(&1));
    }

    #[test]
    fn test_replace_singleton() {
        let finalizer = boxed_finalizer_factory(|_: RcThreadSafety<u8>| Ok::<_, anyhow::Error>(()));
        let mut cache = Cache::new();
        let key = ServiceKey::named("config");

        cache.insert(&key, Lifetime::Singleton, instance(1), Some(&finalizer));
        cache.replace_singleton(&key, instance(2), None);

        assert_eq!(cache.get(&key).unwrap().downcast_ref::<u8>(), Some(&2));
        assert_eq!(cache.singletons_len(), 1);
        assert!(cache.take_resolved().is_empty());

        cache.replace_singleton(&key, instance(3), Some(&finalizer));

        let resolved = cache.take_resolved();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].dependency.downcast_ref::<u8>(), Some(&3));
    }

    #[test]
    fn test_take_resolved_singletons_first() {
        let finalizer = boxed_finalizer_factory(|_: RcThreadSafety<u8>| Ok::<_, anyhow::Error>(()));
        let mut cache = Cache::new();

        cache.insert(&"scoped_1".into(), Lifetime::Scoped, instance(1), Some(&finalizer));
        cache.insert(&"singleton_1".into(), Lifetime::Singleton, instance(2), Some(&finalizer));
        cache.insert(&"no_finalizer".into(), Lifetime::Singleton, instance(3), None);
        cache.insert(&"scoped_2".into(), Lifetime::Scoped, instance(4), Some(&finalizer));
        cache.insert(&"singleton_2".into(), Lifetime::Singleton, instance(5), Some(&finalizer));

        let keys = cache
            .take_resolved()
            .into_iter()
            .map(|resolved| resolved.key)
            .collect::<Vec<_>>();

        assert_eq!(
            keys,
            [
                ServiceKey::named("singleton_1"),
                ServiceKey::named("singleton_2"),
                ServiceKey::named("scoped_1"),
                ServiceKey::named("scoped_2"),
            ]
        );
        assert!(cache.take_resolved().is_empty());

        cache.clear();
        assert_eq!(cache.singletons_len(), 0);
        assert_eq!(cache.scoped_len(), 0);
    }
}
