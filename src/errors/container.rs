use crate::key::ServiceKey;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Container is disposed")]
pub struct DisposedError;

#[derive(thiserror::Error, Debug)]
pub enum RegisterErrorKind {
    #[error(transparent)]
    Disposed(#[from] DisposedError),
    #[error("Service `{key}` declares {declared} dependencies, but its constructor takes {expected}")]
    DependencyCount {
        key: ServiceKey,
        declared: usize,
        expected: usize,
    },
}
