use alloc::boxed::Box;

use super::dependency_resolver::ResolveErrorKind;

/// Error returned by a factory or a constructor.
///
/// Use `?` on [`anyhow::Error`] for custom failures.
/// A [`ResolveErrorKind`] raised by nested resolution inside a factory is converted with `?` too
/// and is returned to the caller of the outer resolution unchanged.
#[derive(thiserror::Error, Debug)]
pub enum InstantiateErrorKind {
    #[error(transparent)]
    Custom(#[from] anyhow::Error),
    #[error(transparent)]
    Resolve(Box<ResolveErrorKind>),
}

impl From<ResolveErrorKind> for InstantiateErrorKind {
    fn from(err: ResolveErrorKind) -> Self {
        Self::Resolve(Box::new(err))
    }
}
