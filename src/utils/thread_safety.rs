//! Shared handle aliases switched by the `thread_safe` feature.
//!
//! With the feature enabled every instance, factory and finalizer has to be `Send + Sync`
//! and handles are [`alloc::sync::Arc`]. Without it the bounds disappear and handles are [`alloc::rc::Rc`].

#[cfg(feature = "thread_safe")]
mod thread_safe {
    use alloc::sync::{Arc, Weak};
    use core::any::Any;

    pub trait SendSafety: Send {}
    pub trait SyncSafety: Sync {}

    impl<T: Send + ?Sized> SendSafety for T {}
    impl<T: Sync + ?Sized> SyncSafety for T {}

    pub type RcThreadSafety<T> = Arc<T>;
    pub type RcAnyThreadSafety = RcThreadSafety<dyn Any + Send + Sync>;
    pub type WeakThreadSafety<T> = Weak<T>;
}

#[cfg(not(feature = "thread_safe"))]
mod thread_unsafe {
    use alloc::rc::{Rc, Weak};
    use core::any::Any;

    pub trait SendSafety {}
    pub trait SyncSafety {}

    impl<T: ?Sized> SendSafety for T {}
    impl<T: ?Sized> SyncSafety for T {}

    pub type RcThreadSafety<T> = Rc<T>;
    pub type RcAnyThreadSafety = RcThreadSafety<dyn Any>;
    pub type WeakThreadSafety<T> = Weak<T>;
}

#[cfg(feature = "thread_safe")]
pub use thread_safe::RcThreadSafety;
#[cfg(feature = "thread_safe")]
pub(crate) use thread_safe::{RcAnyThreadSafety, SendSafety, SyncSafety, WeakThreadSafety};

#[cfg(not(feature = "thread_safe"))]
pub use thread_unsafe::RcThreadSafety;
#[cfg(not(feature = "thread_safe"))]
pub(crate) use thread_unsafe::{RcAnyThreadSafety, SendSafety, SyncSafety, WeakThreadSafety};
