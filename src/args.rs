use alloc::vec::Vec;
use core::fmt::{self, Debug, Formatter};

use crate::utils::thread_safety::{RcAnyThreadSafety, RcThreadSafety, SendSafety, SyncSafety};

/// Runtime arguments passed through a resolution call to the factory.
///
/// Arguments aren't resolved by the container, they are handed to the factory as is.
/// Cloning is cheap, values are shared.
#[derive(Clone, Default)]
pub struct Args {
    values: Vec<RcAnyThreadSafety>,
}

impl Args {
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { values: Vec::new() }
    }

    #[inline]
    #[must_use]
    pub fn with<T: SendSafety + SyncSafety + 'static>(mut self, value: T) -> Self {
        self.push(value);
        self
    }

    #[inline]
    pub fn push<T: SendSafety + SyncSafety + 'static>(&mut self, value: T) {
        self.values.push(RcThreadSafety::new(value));
    }

    /// Returns the argument at `index` if it exists and has type `T`
    #[inline]
    #[must_use]
    pub fn get<T: 'static>(&self, index: usize) -> Option<&T> {
        self.values.get(index)?.downcast_ref()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Debug for Args {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args").field("len", &self.values.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::Args;

    #[test]
    fn test_get_by_index_and_type() {
        let args = Args::new().with(1u8).with("name");

        assert_eq!(args.len(), 2);
        assert_eq!(args.get::<u8>(0), Some(&1));
        assert_eq!(args.get::<&str>(1), Some(&"name"));
        assert_eq!(args.get::<u16>(0), None);
        assert_eq!(args.get::<u8>(2), None);
    }

    #[test]
    fn test_clone_shares_values() {
        let mut args = Args::new();
        assert!(args.is_empty());

        args.push(5i32);
        let cloned = args.clone();

        assert_eq!(cloned.get::<i32>(0), Some(&5));
    }
}
