//! Module implementing the planner: the pass that runs once, right after parsing, between a
//! freshly-built [`Stage`] tree and the [`Expression`][crate::engine::Expression] handed back to
//! the caller.
//!
//! Two independent rewrites, both observable-behaviour-preserving (spec.md §9): precompiling a
//! `=~`/`!~` stage's right-hand side when it is a string literal, and folding a stage whose
//! operands are both compile-time constants down to the literal it always evaluates to. Neither
//! reorders or re-associates operators — this is a local rewrite pass, not a re-planner.

use crate::ast::{OperatorSymbol, Stage};
use crate::dynamic::Value;
use crate::engine::{eval_stage, OptimizationLevel};
use crate::error::{EvalAltResult, Position};
use crate::scope::Scope;
use std::sync::Arc;

/// Rewrite `stage` in place according to `level`.
///
/// # Errors
///
/// Returns an [`EvalAltResult::PlanError`] if a `=~`/`!~` literal right-hand side fails to
/// compile as a regular expression.
pub(crate) fn optimize(stage: &mut Stage, level: OptimizationLevel) -> Result<(), EvalAltResult> {
    if level == OptimizationLevel::None {
        return Ok(());
    }
    precompile_regex(stage)?;
    if level == OptimizationLevel::Full {
        fold_constants(stage);
    }
    Ok(())
}

fn precompile_regex(stage: &mut Stage) -> Result<(), EvalAltResult> {
    if let Some(left) = stage.left.as_deref_mut() {
        precompile_regex(left)?;
    }
    if let Some(right) = stage.right.as_deref_mut() {
        precompile_regex(right)?;
    }

    if !matches!(stage.symbol, OperatorSymbol::Req | OperatorSymbol::Nreq) {
        return Ok(());
    }

    let is_literal_string = stage
        .right
        .as_deref()
        .map_or(false, |r| r.symbol == OperatorSymbol::Literal);
    if !is_literal_string {
        return Ok(());
    }

    let right = stage.right.as_deref_mut().unwrap();
    let Value::Str(pattern) = eval_stage(right, &Scope::new())? else {
        // Literal right-hand side that isn't a string — the type-check at evaluation time will
        // raise the usual comparator type error; nothing to precompile.
        return Ok(());
    };

    let compiled = Arc::new(regex::Regex::new(&pattern).map_err(|e| {
        EvalAltResult::PlanError(format!("Invalid regular expression: {e}"), Position::NONE)
    })?);

    *right = Stage::leaf(
        OperatorSymbol::Literal,
        Arc::new(move |_, _, _: &Scope| Ok(Value::Regex(compiled.clone()))),
    );

    Ok(())
}

/// Is `stage` guaranteed to evaluate to the same constant value against any scope? True for a
/// literal, and (by induction, after this function has run bottom-up) for a folded binary/unary
/// stage — both now carry [`OperatorSymbol::Literal`].
fn is_constant(stage: &Stage) -> bool {
    stage.symbol == OperatorSymbol::Literal
}

fn fold_constants(stage: &mut Stage) {
    if let Some(left) = stage.left.as_deref_mut() {
        fold_constants(left);
    }
    if let Some(right) = stage.right.as_deref_mut() {
        fold_constants(right);
    }

    if is_constant(stage) {
        return;
    }

    // Only stages built with at least one type-check are genuine binary/unary operators over
    // `left`/`right`; leaves carrying their own captured sub-stages (function calls, accessor
    // chains, `&&`/`||`/`?:`/`??`) have no checks and must never be folded here — evaluating them
    // against an empty scope could call a host function or mask a short-circuit.
    if stage.left_check.is_none() && stage.right_check.is_none() {
        return;
    }

    let left_ok = stage.left.as_deref().map_or(true, is_constant);
    let right_ok = stage.right.as_deref().map_or(true, is_constant);
    if !left_ok || !right_ok {
        return;
    }

    if let Ok(value) = eval_stage(stage, &Scope::new()) {
        *stage = Stage::leaf(
            OperatorSymbol::Literal,
            Arc::new(move |_, _, _: &Scope| Ok(value.clone())),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::tokenize;
    use std::collections::HashMap;

    fn parse(src: &str) -> Stage {
        let funcs = HashMap::default();
        let tokens = tokenize(src, &funcs).unwrap();
        crate::parse::parse(&tokens).unwrap()
    }

    #[test]
    fn folds_constant_arithmetic() {
        let mut stage = parse("1 + 2 * 3");
        optimize(&mut stage, OptimizationLevel::Full).unwrap();
        assert_eq!(stage.symbol, OperatorSymbol::Literal);
        assert_eq!(eval_stage(&stage, &Scope::new()).unwrap().as_f64(), Some(7.0));
    }

    #[test]
    fn does_not_fold_across_a_variable() {
        let mut stage = parse("age + 1");
        optimize(&mut stage, OptimizationLevel::Full).unwrap();
        assert_ne!(stage.symbol, OperatorSymbol::Literal);
    }

    #[test]
    fn precompiles_regex_literal() {
        let mut stage = parse("name =~ '^A'");
        optimize(&mut stage, OptimizationLevel::Simple).unwrap();
        let right = stage.right.as_deref().unwrap();
        let v = eval_stage(right, &Scope::new()).unwrap();
        assert!(matches!(v, Value::Regex(_)));
    }

    #[test]
    fn does_not_fold_function_calls() {
        let mut engine_funcs: HashMap<String, crate::fn_native::FunctionHandle, ahash::RandomState> =
            HashMap::default();
        engine_funcs.insert(
            "rnd".into(),
            crate::fn_native::FunctionHandle::new("rnd", Arc::new(|_: &[Value]| Ok(Value::Num(4.0)))),
        );
        let tokens = tokenize("rnd()", &engine_funcs).unwrap();
        let mut stage = crate::parse::parse(&tokens).unwrap();
        optimize(&mut stage, OptimizationLevel::Full).unwrap();
        assert_ne!(stage.symbol, OperatorSymbol::Literal);
    }
}
