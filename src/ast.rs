//! Module defining the compiled tree: [`Stage`] nodes tagged with an [`OperatorSymbol`].
//!
//! A `Stage` is the unit the parser builds and the planner and evaluator walk. Grounded
//! structurally on the teacher's separation of "what kind of node is this" (`OperatorSymbol`,
//! analogous to the teacher's `ast.rs::Expr` discriminants) from "how do I evaluate it"
//! (`operator`, a boxed closure, rather than a giant `match` in the evaluator over every
//! operator at every call — spec.md §9's "route type checks through per-stage predicate pairs
//! rather than per-operator switches at evaluation time").

use crate::dynamic::Value;
use crate::error::EvalAltResult;
use crate::scope::Scope;
use std::fmt;
use std::sync::{Arc, Weak};

/// A closed enumeration naming a stage's behaviour (spec.md §3). Carried alongside the
/// `operator` closure purely for introspection (debugging, the planner's regex-literal search,
/// and `Expression::vars`) — the evaluator itself dispatches through `operator`, never through a
/// `match` on this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum OperatorSymbol {
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulus,
    Exponent,
    Negate,
    Invert,
    BitwiseNot,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    BitwiseLshift,
    BitwiseRshift,
    Eq,
    Neq,
    Gt,
    Lt,
    Gte,
    Lte,
    Req,
    Nreq,
    In,
    And,
    Or,
    TernaryTrue,
    TernaryFalse,
    Coalesce,
    Literal,
    Noop,
    Value,
    Functional,
    Access,
    Separate,
}

impl fmt::Display for OperatorSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Predicate a single child value must satisfy, e.g. "is this a number".
pub type TypeCheck = fn(&Value) -> bool;
/// Predicate over the pair of child values, used when the relationship between the two matters
/// (e.g. additive `+` requires both sides to be the *same* class: both numbers or both strings).
pub type PairTypeCheck = fn(&Value, &Value) -> bool;
/// A stage's evaluation behaviour: a pure function of the (already type-checked) left and right
/// child results and the environment. Never mutates its children (spec.md §3 invariants).
pub type StageOperator =
    Arc<dyn Fn(Option<&Value>, Option<&Value>, &Scope) -> Result<Value, EvalAltResult> + Send + Sync>;
/// The [`Weak`] counterpart of [`StageOperator`], used by the leaf cache to hold a non-owning
/// reference to a variable or literal leaf's closure.
pub type WeakStageOperator =
    Weak<dyn Fn(Option<&Value>, Option<&Value>, &Scope) -> Result<Value, EvalAltResult> + Send + Sync>;

/// A node of the compiled expression tree.
///
/// Leaf stages (literals, variable lookups, accessor chains, function calls) carry their data
/// inside the `operator` closure itself rather than as separate `Stage` fields — there is no
/// "kind of leaf" special-cased by the evaluator, only the one generic post-order walk in
/// `engine.rs`.
pub struct Stage {
    pub symbol: OperatorSymbol,
    pub operator: StageOperator,
    pub left_check: Option<TypeCheck>,
    pub right_check: Option<TypeCheck>,
    pub pair_check: Option<PairTypeCheck>,
    /// Contractual substring embedded in the `TypeError` raised when a check above fails; one of
    /// the four templates in spec.md §4.2's type table, or empty when this stage has no checks.
    pub type_error_template: &'static str,
    pub left: Option<Box<Stage>>,
    pub right: Option<Box<Stage>>,
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("symbol", &self.symbol)
            .field("left", &self.left)
            .field("right", &self.right)
            .finish()
    }
}

impl Stage {
    /// Build a stage with no type-checks attached (literals, variable/accessor leaves, logical
    /// short-circuit nodes whose checks are applied ad hoc inside `operator`).
    #[must_use]
    pub fn leaf(symbol: OperatorSymbol, operator: StageOperator) -> Self {
        Self {
            symbol,
            operator,
            left_check: None,
            right_check: None,
            pair_check: None,
            type_error_template: "",
            left: None,
            right: None,
        }
    }

    /// Build a binary stage with the given type-check pair and error template, per the spec.md
    /// §4.2 type table. `left_check`/`right_check` are either both present or both absent
    /// (spec.md §3 invariant).
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn binary(
        symbol: OperatorSymbol,
        operator: StageOperator,
        left_check: Option<TypeCheck>,
        right_check: Option<TypeCheck>,
        pair_check: Option<PairTypeCheck>,
        type_error_template: &'static str,
        left: Stage,
        right: Stage,
    ) -> Self {
        debug_assert_eq!(left_check.is_some(), right_check.is_some());
        Self {
            symbol,
            operator,
            left_check,
            right_check,
            pair_check,
            type_error_template,
            left: Some(Box::new(left)),
            right: Some(Box::new(right)),
        }
    }

    /// Build a unary (prefix) stage.
    #[must_use]
    pub fn unary(
        symbol: OperatorSymbol,
        operator: StageOperator,
        right_check: TypeCheck,
        type_error_template: &'static str,
        operand: Stage,
    ) -> Self {
        Self {
            symbol,
            operator,
            left_check: None,
            right_check: Some(right_check),
            pair_check: None,
            type_error_template,
            left: None,
            right: Some(Box::new(operand)),
        }
    }

}
