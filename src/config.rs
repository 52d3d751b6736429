use alloc::{string::ToString as _, vec::Vec};
use core::{
    fmt::{self, Debug, Display, Formatter},
    str::FromStr,
};

use crate::{
    errors::InvalidLifetime,
    finalizer::{boxed_finalizer_factory, BoxedCloneFinalizer, Dispose, Finalizer},
    key::ServiceKey,
    utils::thread_safety::{RcThreadSafety, SendSafety, SyncSafety},
};

/// Caching policy of a registration.
///
/// - `Singleton`: cached in the resolving container and reused until it's disposed.
/// - `Transient`: never cached, every resolution calls the factory.
/// - `Scoped`: cached in the container that resolved it first, so every scope gets its own instance.
///
/// Lifetimes are per container: a child scope resolving a singleton registered in its parent
/// caches its own instance, the parent's cache isn't consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifetime {
    Singleton,
    #[default]
    Transient,
    Scoped,
}

impl Lifetime {
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Lifetime::Singleton => "singleton",
            Lifetime::Transient => "transient",
            Lifetime::Scoped => "scoped",
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_cached(&self) -> bool {
        !matches!(self, Lifetime::Transient)
    }
}

impl Display for Lifetime {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Lifetime {
    type Err = InvalidLifetime;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        [Lifetime::Singleton, Lifetime::Transient, Lifetime::Scoped]
            .into_iter()
            .find(|lifetime| lifetime.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| InvalidLifetime(s.to_string()))
    }
}

/// Config for a registration
/// ## Fields
/// - `lifetime`:
///   Caching policy, [`Lifetime::Transient`] by default.
/// - `dependencies`:
///   Keys of the services injected into a constructor, in the order of its parameters.
///   Plain factories may leave it empty and resolve manually, but declared keys still take part in
///   [`crate::Container::validate_no_cycles`].
/// - finalizer:
///   Called for cached instances when the container is disposed. Transient instances aren't finalized.
#[derive(Clone, Default)]
pub struct Config {
    pub lifetime: Lifetime,
    pub dependencies: Vec<ServiceKey>,
    pub(crate) finalizer: Option<BoxedCloneFinalizer>,
}

impl Config {
    #[inline]
    #[must_use]
    pub fn singleton() -> Self {
        Self::default().lifetime(Lifetime::Singleton)
    }

    #[inline]
    #[must_use]
    pub fn transient() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn scoped() -> Self {
        Self::default().lifetime(Lifetime::Scoped)
    }

    #[inline]
    #[must_use]
    pub fn lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = lifetime;
        self
    }

    #[inline]
    #[must_use]
    pub fn dependency(mut self, key: impl Into<ServiceKey>) -> Self {
        self.dependencies.push(key.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn dependencies<I>(mut self, keys: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ServiceKey>,
    {
        self.dependencies.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Sets a finalizer for the instances of this registration.
    ///
    /// # Warning
    /// `Dep` has to be the type the factory provides, otherwise the finalizer fails on disposal.
    /// The failure is logged and doesn't stop finalization of other instances.
    #[inline]
    #[must_use]
    pub fn finalizer<Dep, Fin>(mut self, finalizer: Fin) -> Self
    where
        Dep: SendSafety + SyncSafety + 'static,
        Fin: Finalizer<Dep> + SendSafety + SyncSafety,
    {
        self.finalizer = Some(boxed_finalizer_factory(finalizer));
        self
    }

    /// Sets a finalizer that calls [`Dispose::dispose`]
    #[inline]
    #[must_use]
    pub fn disposable<Dep>(self) -> Self
    where
        Dep: Dispose + SendSafety + SyncSafety + 'static,
    {
        self.finalizer::<Dep, _>(|dependency: RcThreadSafety<Dep>| dependency.dispose())
    }

    #[inline]
    #[must_use]
    pub fn has_finalizer(&self) -> bool {
        self.finalizer.is_some()
    }
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("lifetime", &self.lifetime)
            .field("dependencies", &self.dependencies)
            .field("finalizer", &self.finalizer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, Lifetime};
    use crate::{errors::InvalidLifetime, finalizer::Dispose, key::ServiceKey};

    use alloc::string::String;

    struct Db;

    impl Dispose for Db {
        fn dispose(&self) -> Result<(), anyhow::Error> {
            Ok(())
        }
    }

    #[test]
    fn test_lifetime_from_str() {
        assert_eq!("singleton".parse::<Lifetime>(), Ok(Lifetime::Singleton));
        assert_eq!(" Scoped ".parse::<Lifetime>(), Ok(Lifetime::Scoped));
        assert_eq!("TRANSIENT".parse::<Lifetime>(), Ok(Lifetime::Transient));
        assert_eq!(
            "request".parse::<Lifetime>(),
            Err(InvalidLifetime(String::from("request")))
        );
    }

    #[test]
    fn test_lifetime_default_and_caching() {
        assert_eq!(Lifetime::default(), Lifetime::Transient);
        assert!(Lifetime::Singleton.is_cached());
        assert!(Lifetime::Scoped.is_cached());
        assert!(!Lifetime::Transient.is_cached());
    }

    #[test]
    fn test_config_builders() {
        let config = Config::singleton().dependency("logger").dependencies([ServiceKey::of::<Db>()]);

        assert_eq!(config.lifetime, Lifetime::Singleton);
        assert_eq!(config.dependencies, [ServiceKey::named("logger"), ServiceKey::of::<Db>()]);
        assert!(!config.has_finalizer());
        assert!(Config::scoped().disposable::<Db>().has_finalizer());
        assert_eq!(Config::transient().lifetime, Lifetime::Transient);
    }
}
