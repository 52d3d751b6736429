#![no_std]

extern crate alloc;

#[macro_use]
pub(crate) mod macros;

pub(crate) mod any;
pub(crate) mod args;
pub(crate) mod cache;
pub(crate) mod config;
pub(crate) mod container;
pub(crate) mod dependency_resolver;
pub(crate) mod errors;
pub(crate) mod finalizer;
pub(crate) mod inject;
pub(crate) mod instantiator;
pub(crate) mod key;
pub(crate) mod lazy;
pub(crate) mod registry;
pub(crate) mod service;

pub mod utils;

pub use any::TypeInfo;
pub use args::Args;
pub use config::{Config, Lifetime};
pub use container::Container;
pub use dependency_resolver::{DependencyList, DependencyResolver};
pub use errors::{
    CircularDependency, DisposedError, InstantiateErrorKind, InvalidLifetime, RegisterErrorKind, ResolveErrorKind,
};
pub use finalizer::{Dispose, Finalizer};
pub use inject::Inject;
pub use instantiator::{Constructor, ConstructorWithArgs};
pub use key::{ServiceKey, Token};
pub use lazy::Lazy;
pub use registry::ServiceDescriptor;
pub use utils::thread_safety::RcThreadSafety;
