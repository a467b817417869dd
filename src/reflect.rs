//! Reflective access to host-provided values.
//!
//! The language lets an expression navigate a chain like `foo.Nested.Funk` or call a
//! zero-or-more-argument method `foo.Nested.Funk(1, 2)` on a value the host placed into the
//! [`Scope`][crate::scope::Scope]. The evaluator itself never uses language-level reflection
//! (`std::any`, derive macros, ...) to do this — per the design notes, that capability is pushed
//! out to an adapter trait that host crates implement for their own structures. This keeps the
//! core tree walker in `engine.rs` free of per-host-type special cases.

use crate::dynamic::Value;
use crate::error::{EvalAltResult, Position};

/// Implemented by host values whose fields and methods should be reachable from an accessor
/// chain (`a.b.c`) or a method call (`a.b.c(1, 2)`).
///
/// `field` and `call` both receive the *unqualified* member name, i.e. the last segment of the
/// accessor path; navigating through intermediate segments is the caller's job (see
/// [`Stage::Access`][crate::ast::OperatorSymbol::Access] in `engine.rs`).
///
/// An adapter should return [`EvalAltResult::AccessError`] for a member that exists on the host
/// type but is intentionally unexported to expressions, and [`EvalAltResult::NameError`] for a
/// member that does not exist at all; the evaluator does not distinguish the two itself.
pub trait HostIntrospect: std::fmt::Debug + Send + Sync {
    /// Read a public field by name.
    ///
    /// Returns `Ok(None)` when `name` is not a field at all (the evaluator will then try
    /// `call` with zero arguments, matching the spec's "field or zero-argument method" rule).
    fn field(&self, name: &str) -> Result<Option<Value>, EvalAltResult> {
        let _ = name;
        Ok(None)
    }

    /// Invoke a method by name with positional arguments.
    ///
    /// `args` have already been evaluated left-to-right; coercion of numeric arguments to a
    /// method's expected width is the adapter's responsibility (see
    /// [`coerce_to_integer`] for a helper).
    fn call(&self, name: &str, args: &[Value]) -> Result<Value, EvalAltResult> {
        let _ = (name, args);
        Err(EvalAltResult::NameError(
            format!("No method or field '{name}'"),
            Position::NONE,
        ))
    }
}

/// Coerce a `Value::Num` argument into a signed integer of the requested width, failing with
/// [`EvalAltResult::CoercionError`] (the spec's contractual "Argument type conversion failed")
/// when the float is out of range or not integral.
///
/// Host adapters that accept `i32`/`i64`/etc. parameters should run incoming numeric arguments
/// through this before using them, mirroring the spec's "integer-class float arguments convert
/// to the requested signed or unsigned integer width if in range" rule.
pub fn coerce_to_integer<T>(value: &Value) -> Result<T, EvalAltResult>
where
    T: num_traits::NumCast,
{
    use num_traits::NumCast;

    let n = match value {
        Value::Num(n) => *n,
        _ => {
            return Err(EvalAltResult::CoercionError(
                "Argument type conversion failed".into(),
                Position::NONE,
            ))
        }
    };

    if n.fract() != 0.0 {
        return Err(EvalAltResult::CoercionError(
            "Argument type conversion failed".into(),
            Position::NONE,
        ));
    }

    <T as NumCast>::from(n).ok_or_else(|| {
        EvalAltResult::CoercionError("Argument type conversion failed".into(), Position::NONE)
    })
}

/// Build the [`EvalAltResult::ArityError`] a [`HostIntrospect::call`] implementation should
/// return when it was passed fewer positional arguments than the method requires.
#[must_use]
pub fn too_few_arguments(method: &str) -> EvalAltResult {
    EvalAltResult::ArityError(
        format!("too few arguments to parameter call '{method}'"),
        Position::NONE,
    )
}

/// Build the [`EvalAltResult::ArityError`] a [`HostIntrospect::call`] implementation should
/// return when it was passed more positional arguments than the method accepts.
#[must_use]
pub fn too_many_arguments(method: &str) -> EvalAltResult {
    EvalAltResult::ArityError(
        format!("too many arguments to parameter call '{method}'"),
        Position::NONE,
    )
}

/// Check `args.len()` against the exact arity a method requires, returning the appropriate
/// contractual [`EvalAltResult::ArityError`] on mismatch.
pub fn check_arity(method: &str, args: &[Value], expected: usize) -> Result<(), EvalAltResult> {
    if args.len() < expected {
        Err(too_few_arguments(method))
    } else if args.len() > expected {
        Err(too_many_arguments(method))
    } else {
        Ok(())
    }
}

/// Build the [`EvalAltResult::AccessError`] a [`HostIntrospect`] implementation should return for
/// a member that exists on the host type but is intentionally not reachable from expressions.
#[must_use]
pub fn unexported(name: &str) -> EvalAltResult {
    EvalAltResult::AccessError(
        format!("Unable to access unexported '{name}'"),
        Position::NONE,
    )
}
