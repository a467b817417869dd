//! Module defining the interface to host-registered (native Rust) functions.
//!
//! A [`FUNCTION`][crate::token::TokenKind::Function] token carries a handle straight to one of
//! these; the parser wraps the handle and the parsed argument subtree into a
//! [`Stage::Functional`][crate::ast::OperatorSymbol::Functional] and the evaluator calls it with
//! the evaluated, variadic argument list (spec.md §4.4, "Function call").

use crate::dynamic::Value;
use crate::error::EvalAltResult;
use std::fmt;
use std::sync::Arc;

/// Immutable reference-counted container used throughout the crate for cheaply-shared,
/// thread-safe state (compiled patterns, host function handles, host values).
///
/// Grounded on the teacher's `Shared` alias, permanently resolved to [`Arc`] (rather than
/// feature-gated between `Rc` and `Arc`) because a compiled [`Expression`][crate::engine::Expression]
/// must be `Send + Sync` unconditionally, per spec.md §5.
pub type Shared<T> = Arc<T>;

/// A host function: takes the evaluated, left-to-right argument list and the environment it was
/// called from, returns a value or an error that is surfaced verbatim as
/// [`EvalAltResult::HostError`].
pub trait NativeFunction: Fn(&[Value]) -> Result<Value, EvalAltResult> + Send + Sync {}

impl<F> NativeFunction for F where F: Fn(&[Value]) -> Result<Value, EvalAltResult> + Send + Sync {}

/// A shared handle to a registered host function, the `TokenValue` carried by a `FUNCTION`
/// token.
#[derive(Clone)]
pub struct FunctionHandle {
    name: Arc<str>,
    func: Shared<dyn NativeFunction>,
}

impl fmt::Debug for FunctionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FunctionHandle({})", self.name)
    }
}

impl FunctionHandle {
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>, func: Shared<dyn NativeFunction>) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
    /// The name this function was registered under.
    #[inline(always)]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
    /// Invoke the function with the evaluated argument list.
    #[inline(always)]
    pub fn call(&self, args: &[Value]) -> Result<Value, EvalAltResult> {
        (self.func)(args)
    }
}
