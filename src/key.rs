use alloc::{borrow::Cow, string::String};
use core::{
    cmp::Ordering,
    fmt::{self, Display, Formatter},
    hash::{Hash, Hasher},
    sync::atomic::{AtomicUsize, Ordering as AtomicOrdering},
};

use crate::any::TypeInfo;

static NEXT_TOKEN_ID: AtomicUsize = AtomicUsize::new(0);

/// Symbolic service identifier.
///
/// Every call to [`Token::new`] creates a distinct token, even with the same description,
/// so two libraries can't collide by picking the same name. Clones are equal to the original.
#[derive(Debug, Clone)]
pub struct Token {
    id: usize,
    description: Cow<'static, str>,
}

impl Token {
    #[must_use]
    pub fn new(description: impl Into<Cow<'static, str>>) -> Self {
        Self {
            id: NEXT_TOKEN_ID.fetch_add(1, AtomicOrdering::Relaxed),
            description: description.into(),
        }
    }

    #[inline]
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Token {}

impl PartialOrd for Token {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Token {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum KeyRepr {
    Name(Cow<'static, str>),
    Token(Token),
    Type(TypeInfo),
}

/// Identifier a service is registered and resolved by.
///
/// A key is either a name, a [`Token`] or a type. Keys of different kinds never compare equal,
/// so `ServiceKey::named("u8")` and `ServiceKey::of::<u8>()` are different services.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServiceKey(KeyRepr);

impl ServiceKey {
    #[inline]
    #[must_use]
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self(KeyRepr::Name(name.into()))
    }

    #[inline]
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self(KeyRepr::Type(TypeInfo::of::<T>()))
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match &self.0 {
            KeyRepr::Name(name) => Some(name),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn token(&self) -> Option<&Token> {
        match &self.0 {
            KeyRepr::Token(token) => Some(token),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn type_info(&self) -> Option<&TypeInfo> {
        match &self.0 {
            KeyRepr::Type(type_info) => Some(type_info),
            _ => None,
        }
    }
}

impl Display for ServiceKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.0 {
            KeyRepr::Name(name) => f.write_str(name),
            KeyRepr::Token(token) => write!(f, "Token({})", token.description),
            KeyRepr::Type(type_info) => f.write_str(type_info.short_name()),
        }
    }
}

impl From<&'static str> for ServiceKey {
    fn from(name: &'static str) -> Self {
        Self::named(name)
    }
}

impl From<String> for ServiceKey {
    fn from(name: String) -> Self {
        Self::named(name)
    }
}

impl From<Token> for ServiceKey {
    fn from(token: Token) -> Self {
        Self(KeyRepr::Token(token))
    }
}

impl From<&Token> for ServiceKey {
    fn from(token: &Token) -> Self {
        Self(KeyRepr::Token(token.clone()))
    }
}

impl From<TypeInfo> for ServiceKey {
    fn from(type_info: TypeInfo) -> Self {
        Self(KeyRepr::Type(type_info))
    }
}

impl From<&ServiceKey> for ServiceKey {
    fn from(key: &ServiceKey) -> Self {
        key.clone()
    }
}
