mod config;
mod container;
mod dependency_resolver;
mod instantiate;

pub use config::InvalidLifetime;
pub use container::{DisposedError, RegisterErrorKind};
pub use dependency_resolver::{CircularDependency, ResolveErrorKind};
pub use instantiate::InstantiateErrorKind;
