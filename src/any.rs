use core::{
    any::{type_name, TypeId},
    cmp::Ordering,
    hash::{Hash, Hasher},
};

/// Type identity used by [`crate::ServiceKey::of`].
/// Equality, ordering and hashing only look at the [`TypeId`], the name is kept for diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct TypeInfo {
    pub name: &'static str,
    pub id: TypeId,
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl PartialOrd for TypeInfo {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeInfo {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl TypeInfo {
    #[inline]
    #[must_use]
    pub fn of<T>() -> Self
    where
        T: ?Sized + 'static,
    {
        Self {
            name: type_name::<T>(),
            id: TypeId::of::<T>(),
        }
    }

    /// Type name without the module path, generic arguments included.
    /// `alloc::sync::Arc<app::Logger>` becomes `Arc<app::Logger>`.
    #[inline]
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        let path_end = self.name.find('<').unwrap_or(self.name.len());
        match self.name[..path_end].rfind("::") {
            Some(index) => &self.name[index + 2..],
            None => self.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TypeInfo;

    use alloc::vec::Vec;

    struct Logger;

    mod nested {
        pub(super) struct Logger;
    }

    #[test]
    fn test_eq_by_id() {
        assert_eq!(TypeInfo::of::<Logger>(), TypeInfo::of::<Logger>());
        assert_ne!(TypeInfo::of::<Logger>(), TypeInfo::of::<nested::Logger>());
    }

    #[test]
    fn test_short_name() {
        assert_eq!(TypeInfo::of::<Logger>().short_name(), "Logger");
        assert_eq!(TypeInfo::of::<u8>().short_name(), "u8");
        assert_eq!(TypeInfo::of::<Vec<Logger>>().short_name(), "Vec<wirebox::any::tests::Logger>");
    }
}
