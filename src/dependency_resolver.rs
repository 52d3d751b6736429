use tracing::debug;

use super::errors::ResolveErrorKind;
use crate::{key::ServiceKey, Container};

/// Value a constructor parameter is resolved into, given the key declared for its position
pub trait DependencyResolver: Sized {
    #[allow(clippy::missing_errors_doc)]
    fn resolve(container: &Container, key: &ServiceKey) -> Result<Self, ResolveErrorKind>;
}

/// Declared dependency keys of a dependent service, consumed in parameter order
pub struct DependencyKeys<'a> {
    dependent: &'a ServiceKey,
    keys: &'a [ServiceKey],
    position: usize,
}

impl<'a> DependencyKeys<'a> {
    #[inline]
    #[must_use]
    pub(crate) fn new(dependent: &'a ServiceKey, keys: &'a [ServiceKey]) -> Self {
        Self {
            dependent,
            keys,
            position: 0,
        }
    }

    /// Resolves the next declared dependency, annotating a failure with the dependent service
    #[allow(clippy::missing_errors_doc)]
    pub fn resolve_next<Dep: DependencyResolver>(&mut self, container: &Container) -> Result<Dep, ResolveErrorKind> {
        let Some(key) = self.keys.get(self.position) else {
            return Err(ResolveErrorKind::MissingDependencyKey {
                dependent: self.dependent.clone(),
                position: self.position,
            });
        };
        self.position += 1;

        let dependency = Dep::resolve(container, key).map_err(|err| err.in_dependency(self.dependent, key))?;
        debug!(dependency = %key, "Dependency resolved");
        Ok(dependency)
    }
}

/// Parameter list of a constructor
pub trait DependencyList: Sized {
    /// Count of declared keys the list consumes
    const LEN: usize;

    #[allow(clippy::missing_errors_doc)]
    fn resolve_all(container: &Container, keys: &mut DependencyKeys<'_>) -> Result<Self, ResolveErrorKind>;
}

macro_rules! impl_dependency_list {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case, unused_variables)]
        impl<$($ty,)*> DependencyList for ($($ty,)*)
        where
            $( $ty: DependencyResolver, )*
        {
            const LEN: usize = count_idents!($($ty),*);

            #[inline]
            fn resolve_all(container: &Container, keys: &mut DependencyKeys<'_>) -> Result<Self, ResolveErrorKind> {
                Ok(($(keys.resolve_next::<$ty>(container)?,)*))
            }
        }
    };
}

all_the_tuples!(impl_dependency_list);
