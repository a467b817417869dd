//! The `ImmutableString` type: a cheaply-cloneable, thread-shareable string.
//!
//! Most string values flowing through evaluation are either literals baked into the compiled
//! tree or short copies of variable/field names, so cloning a [`Value::Str`][crate::dynamic::Value::Str]
//! should never walk the bytes. Grounded on the teacher's `immutable_string.rs`, with `Arc`
//! instead of the feature-gated `Rc`/`Arc` alias so that a compiled [`Expression`][crate::engine::Expression]
//! is unconditionally `Send + Sync`.

use crate::SmartString;
use std::{
    borrow::Borrow,
    fmt,
    ops::Deref,
    str::FromStr,
    sync::Arc,
};

/// An immutable, reference-counted string.
#[derive(Clone, Eq, Ord, PartialOrd, Hash, Default)]
pub struct ImmutableString(Arc<SmartString>);

impl Deref for ImmutableString {
    type Target = str;

    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        self.0.as_str()
    }
}

impl AsRef<str> for ImmutableString {
    #[inline(always)]
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl Borrow<str> for ImmutableString {
    #[inline(always)]
    fn borrow(&self) -> &str {
        self.0.as_str()
    }
}

impl PartialEq for ImmutableString {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.as_str() == other.0.as_str()
    }
}

impl PartialEq<str> for ImmutableString {
    #[inline(always)]
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl fmt::Display for ImmutableString {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.0.as_str(), f)
    }
}

impl fmt::Debug for ImmutableString {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.0.as_str(), f)
    }
}

impl ImmutableString {
    /// Borrow this string as a `&str`.
    #[inline(always)]
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
    /// Clone the underlying bytes out into an owned [`String`].
    #[inline(always)]
    #[must_use]
    pub fn into_owned(self) -> String {
        self.0.as_str().to_string()
    }
}

impl From<&str> for ImmutableString {
    #[inline(always)]
    fn from(value: &str) -> Self {
        Self(Arc::new(SmartString::from(value)))
    }
}
impl From<String> for ImmutableString {
    #[inline(always)]
    fn from(value: String) -> Self {
        Self(Arc::new(SmartString::from(value.as_str())))
    }
}
impl From<&String> for ImmutableString {
    #[inline(always)]
    fn from(value: &String) -> Self {
        Self(Arc::new(SmartString::from(value.as_str())))
    }
}

impl FromStr for ImmutableString {
    type Err = std::convert::Infallible;

    #[inline(always)]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.into())
    }
}

impl FromIterator<char> for ImmutableString {
    #[inline(always)]
    fn from_iter<T: IntoIterator<Item = char>>(iter: T) -> Self {
        Self(Arc::new(iter.into_iter().collect::<SmartString>()))
    }
}
