use alloc::string::String;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid lifetime `{0}`, expected one of: singleton, transient, scoped")]
pub struct InvalidLifetime(pub String);
