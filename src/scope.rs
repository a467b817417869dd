//! Module that defines the [`Scope`] type: the name-to-value environment threaded explicitly
//! through evaluation.
//!
//! Grounded on the teacher's `scope.rs` `Scope` type (same push/get/contains/clear surface), but
//! holding only variable bindings — this language has no local bindings or assignment, so a
//! `Scope` here is exactly the spec's "Environment: a mapping from name (string) to value (any)"
//! (spec.md §3), nothing more. No stage ever stores a reference to one (spec.md §3 invariants);
//! it is passed down through `Stage::operator` calls for the lifetime of a single `evaluate`.

use crate::dynamic::Value;
use std::collections::HashMap;

/// The environment an [`Expression`][crate::engine::Expression] is evaluated against: a mapping
/// from variable/accessor-root name to [`Value`].
///
/// # Example
///
/// ```
/// use exprlang::{Engine, Scope};
///
/// let engine = Engine::new();
/// let expr = engine.compile("age >= 18").unwrap();
///
/// let mut scope = Scope::new();
/// scope.push("age", 21_i64);
///
/// assert_eq!(expr.evaluate(&scope).unwrap().as_bool(), Some(true));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Scope {
    vars: HashMap<String, Value, ahash::RandomState>,
}

impl Scope {
    /// Create a new, empty [`Scope`].
    #[inline(always)]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a name to a value, overwriting any previous binding under the same name.
    #[inline]
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Look up a binding by name.
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Does this scope contain a binding for `name`?
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Remove a binding, returning its previous value if any.
    #[inline]
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.vars.remove(name)
    }

    /// Number of bindings currently in this scope.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Is this scope empty?
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Remove every binding.
    #[inline]
    pub fn clear(&mut self) -> &mut Self {
        self.vars.clear();
        self
    }

    /// Iterate over all `(name, value)` bindings.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> Extend<(K, V)> for Scope {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.push(k, v);
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Scope {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut scope = Self::new();
        scope.extend(iter);
        scope
    }
}
