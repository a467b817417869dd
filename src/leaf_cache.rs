//! The optional weak-reference leaf cache: different compiled expressions that reference the
//! same variable name, or contain the same literal value, reuse the same leaf [`StageOperator`]
//! closure instead of each allocating its own.
//!
//! Grounded on `original_source/cache.go`'s `getParameterStage`/`getConstantStage`, which key a
//! map of `weak.Pointer`s by parameter name and by constant value respectively, handing back an
//! existing stage when its weak pointer is still live. This is the direct Rust translation of
//! that idea: `std::sync::Weak` in place of `weak.Pointer`, one map per leaf kind.

use crate::ast::{StageOperator, WeakStageOperator};
use crate::dynamic::Value;
use std::collections::HashMap;
use std::sync::Mutex;

/// A hashable, owned stand-in for the handful of [`Value`] kinds that can appear as a literal
/// leaf. Not `Value` itself: `Value` has no `Eq`/`Hash` (floats, and host values can't implement
/// either), but every literal kind the parser builds can be represented by one that does.
#[derive(Clone, PartialEq, Eq, Hash)]
enum LiteralKey {
    Num(u64),
    Str(String),
    Bool(bool),
    Time(i64),
}

impl LiteralKey {
    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Num(n) => Some(Self::Num(n.to_bits())),
            Value::Str(s) => Some(Self::Str(s.as_str().to_string())),
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Time(t) => Some(Self::Time(t.timestamp_nanos_opt().unwrap_or_default())),
            _ => None,
        }
    }
}

#[derive(Default)]
pub(crate) struct LeafCache {
    variables: Mutex<HashMap<String, WeakStageOperator>>,
    literals: Mutex<HashMap<LiteralKey, WeakStageOperator>>,
}

impl LeafCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Return the cached operator for variable `name` if one is still alive, otherwise build one
    /// with `build`, cache a weak reference to it, and return it.
    pub(crate) fn variable(&self, name: &str, build: impl FnOnce() -> StageOperator) -> StageOperator {
        let mut table = self.variables.lock().unwrap();
        if let Some(op) = table.get(name).and_then(std::sync::Weak::upgrade) {
            return op;
        }
        let op = build();
        table.insert(name.to_string(), std::sync::Arc::downgrade(&op));
        op
    }

    /// As [`Self::variable`], keyed by literal value. Falls back to always building fresh for
    /// value kinds [`LiteralKey::of`] can't represent (there are none among the parser's literal
    /// leaves today, but host-reflected values never reach this path either way).
    pub(crate) fn literal(&self, value: &Value, build: impl FnOnce() -> StageOperator) -> StageOperator {
        let Some(key) = LiteralKey::of(value) else {
            return build();
        };
        let mut table = self.literals.lock().unwrap();
        if let Some(op) = table.get(&key).and_then(std::sync::Weak::upgrade) {
            return op;
        }
        let op = build();
        table.insert(key, std::sync::Arc::downgrade(&op));
        op
    }
}
