use alloc::{boxed::Box, vec::Vec};
use core::fmt::{self, Display, Formatter};

use super::{container::DisposedError, instantiate::InstantiateErrorKind};
use crate::key::ServiceKey;

#[derive(thiserror::Error, Debug)]
pub enum ResolveErrorKind {
    #[error("Container is disposed")]
    Disposed,
    #[error("Service `{key}` not found in container or its parents")]
    NoInstantiator { key: ServiceKey },
    #[error(transparent)]
    CircularDependency(#[from] CircularDependency),
    #[error("Failed to resolve dependency `{dependency}` of `{dependent}`: {cause}")]
    Dependency {
        dependent: ServiceKey,
        dependency: ServiceKey,
        cause: Box<ResolveErrorKind>,
    },
    #[error("Incorrect type of service `{key}`, expected: {expected}")]
    IncorrectType { key: ServiceKey, expected: &'static str },
    #[error("Dependency key at position {position} isn't declared for `{dependent}`")]
    MissingDependencyKey { dependent: ServiceKey, position: usize },
    #[error(transparent)]
    Instantiator(InstantiateErrorKind),
}

impl ResolveErrorKind {
    /// Annotates a failure of `dependency` with the service that required it.
    /// Disposal and cycles are reported as is, a cycle already carries the whole chain.
    #[must_use]
    pub(crate) fn in_dependency(self, dependent: &ServiceKey, dependency: &ServiceKey) -> Self {
        match self {
            err @ (Self::Disposed | Self::CircularDependency(_)) => err,
            err => Self::Dependency {
                dependent: dependent.clone(),
                dependency: dependency.clone(),
                cause: Box::new(err),
            },
        }
    }

    /// Returns the innermost error, skipping [`Self::Dependency`] wrappers
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::Dependency { cause, .. } => cause.root_cause(),
            err => err,
        }
    }
}

impl From<DisposedError> for ResolveErrorKind {
    fn from(_: DisposedError) -> Self {
        Self::Disposed
    }
}

impl From<InstantiateErrorKind> for ResolveErrorKind {
    fn from(err: InstantiateErrorKind) -> Self {
        match err {
            InstantiateErrorKind::Resolve(err) => *err,
            err @ InstantiateErrorKind::Custom(_) => Self::Instantiator(err),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub struct CircularDependency {
    chain: Box<[ServiceKey]>,
}

impl CircularDependency {
    #[inline]
    #[must_use]
    pub(crate) fn new(chain: Vec<ServiceKey>) -> Self {
        Self {
            chain: chain.into_boxed_slice(),
        }
    }

    /// Keys in resolution order, the last one repeats an earlier key
    #[inline]
    #[must_use]
    pub fn chain(&self) -> &[ServiceKey] {
        &self.chain
    }
}

impl Display for CircularDependency {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Circular dependency detected: ")?;
        for (index, key) in self.chain.iter().enumerate() {
            if index > 0 {
                write!(f, " -> ")?;
            }
            write!(f, "{key}")?;
        }
        Ok(())
    }
}
