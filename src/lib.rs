//! # exprlang - a tiny, embeddable runtime expression language
//!
//! `exprlang` compiles a C-family infix expression once into a tree of [`ast::Stage`] nodes and
//! evaluates that tree, as many times as needed, against a caller-supplied [`Scope`] of named
//! values and host functions. It is not Turing-complete: there is no assignment, no loops, no
//! local bindings, and every number is a 64-bit float.
//!
//! # A Quick Example
//!
//! ```
//! use exprlang::{Engine, Scope};
//!
//! let engine = Engine::new();
//! let expr = engine.compile("age >= 18 && name == 'Alice'").unwrap();
//!
//! let mut scope = Scope::new();
//! scope.push("age", 21_i64);
//! scope.push("name", "Alice");
//!
//! assert_eq!(expr.evaluate(&scope).unwrap().as_bool(), Some(true));
//! ```

mod ast;
mod dynamic;
mod engine;
mod error;
mod fn_native;
mod immutable_string;
mod leaf_cache;
mod optimize;
mod parse;
mod reflect;
mod scope;
mod token;

pub use ast::OperatorSymbol;
pub use dynamic::{Instant, Pattern, Value};
pub use engine::{Engine, Expression, OptimizationLevel};
pub use error::{EvalAltResult, Position};
pub use fn_native::{FunctionHandle, NativeFunction, Shared};
pub use immutable_string::ImmutableString;
pub use reflect::{
    check_arity, coerce_to_integer, too_few_arguments, too_many_arguments, unexported,
    HostIntrospect,
};
pub use scope::Scope;
pub use token::{Token, TokenKind};

/// Alias to [`smallvec::SmallVec<[T; 4]>`](https://crates.io/crates/smallvec), used to hold
/// function-call argument lists and accessor paths inline without allocating in the common case
/// of a handful of items.
pub(crate) type StaticVec<T> = smallvec::SmallVec<[T; 4]>;

pub(crate) type SmartString = smartstring::SmartString<smartstring::Compact>;
