//! Main module defining the parser: a precedence-climbing recursive descent that turns a token
//! stream into a [`Stage`] tree, one level per operator class from loosest to tightest
//! (ternary/coalesce, `||`, `&&`, `==`/`!=`, `=~`/`!~`/`in`, relational, additive/bitwise-or-xor,
//! multiplicative/bitwise-and-shift, exponent, prefix, primary).
//!
//! Each precedence level is its own function, loosest-binding first, falling through to the next
//! tighter level for anything it does not itself handle — the classic recursive-descent shape the
//! teacher's own `parse_expr`/`parse_binary_op` chain uses, adapted to a flat expression grammar
//! with no statements. Where an operator requires its operands to be a particular runtime type
//! (spec.md §4.2's type table), the `Stage` built here carries the matching type-check pair and
//! error template; the generic walker in `engine.rs` applies them before calling the operator.

use crate::ast::{OperatorSymbol, PairTypeCheck, Stage, StageOperator, TypeCheck};
use crate::dynamic::Value;
use crate::engine::eval_stage;
use crate::error::{EvalAltResult, Position};
use crate::leaf_cache::LeafCache;
use crate::reflect::HostIntrospect;
use crate::scope::Scope;
use crate::token::{Token, TokenKind, TokenValue};
use std::sync::Arc;

const MODIFIER_TEMPLATE: &str = "cannot be used with the modifier";
const COMPARATOR_TEMPLATE: &str = "cannot be used with the comparator";
const LOGICAL_TEMPLATE: &str = "cannot be used with the logical operator";
const TERNARY_TEMPLATE: &str = "cannot be used with the ternary operator";

fn is_number(v: &Value) -> bool {
    v.is_number()
}
fn is_bool(v: &Value) -> bool {
    v.is_bool()
}
fn is_comparable(v: &Value) -> bool {
    matches!(v, Value::Num(_) | Value::Str(_) | Value::Time(_))
}
fn is_number_or_string(v: &Value) -> bool {
    v.is_number() || v.is_string()
}
fn is_string(v: &Value) -> bool {
    v.is_string()
}
fn is_string_or_pattern(v: &Value) -> bool {
    v.is_string_or_pattern()
}
fn is_array(v: &Value) -> bool {
    v.is_array()
}
fn any_value(_: &Value) -> bool {
    true
}

fn pair_numeric_or_string(l: &Value, r: &Value) -> bool {
    (l.is_number() && r.is_number()) || (l.is_string() && r.is_string())
}
fn pair_same_comparable(l: &Value, r: &Value) -> bool {
    matches!(
        (l, r),
        (Value::Num(_), Value::Num(_)) | (Value::Str(_), Value::Str(_)) | (Value::Time(_), Value::Time(_))
    )
}

fn compare_values(l: &Value, r: &Value) -> std::cmp::Ordering {
    match (l, r) {
        (Value::Num(a), Value::Num(b)) => a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal),
        (Value::Str(a), Value::Str(b)) => a.as_str().cmp(b.as_str()),
        (Value::Time(a), Value::Time(b)) => a.cmp(b),
        _ => unreachable!("pair_same_comparable guarantees a matching pair"),
    }
}

/// Parse a fully tokenized expression into its [`Stage`] tree.
///
/// # Errors
///
/// Returns a [`EvalAltResult::ParseError`] on an unexpected or missing token.
pub(crate) fn parse(tokens: &[Token]) -> Result<Stage, EvalAltResult> {
    parse_with_cache(tokens, None)
}

/// As [`parse`], consulting `leaf_cache` (if given) when building a variable or literal leaf, so
/// that leaf reused across different compiles of different source text shares one closure.
///
/// # Errors
///
/// Returns a [`EvalAltResult::ParseError`] on an unexpected or missing token.
pub(crate) fn parse_with_cache(
    tokens: &[Token],
    leaf_cache: Option<&LeafCache>,
) -> Result<Stage, EvalAltResult> {
    let mut p = Parser { tokens, pos: 0, leaf_cache };
    let stage = p.ternary()?;
    if let Some(tok) = p.peek() {
        return Err(EvalAltResult::ParseError(
            format!("Unexpected token '{}'", tok.text()),
            tok.pos,
        ));
    }
    Ok(stage)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    leaf_cache: Option<&'a LeafCache>,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn advance(&mut self) -> &'a Token {
        let tok = &self.tokens[self.pos];
        self.pos += 1;
        tok
    }

    fn last_pos(&self) -> Position {
        self.tokens.last().map_or(Position::NONE, |t| t.pos)
    }

    fn expect_clause_close(&mut self) -> Result<(), EvalAltResult> {
        match self.peek_kind() {
            Some(TokenKind::ClauseClose) => {
                self.advance();
                Ok(())
            }
            _ => Err(EvalAltResult::ParseError(
                "Expected ')'".into(),
                self.peek().map_or(self.last_pos(), |t| t.pos),
            )),
        }
    }

    /// Symbol text of the upcoming token, if it's a binary/ternary operator token.
    fn peek_symbol(&self) -> Option<(OperatorSymbol, TokenKind)> {
        match self.peek() {
            Some(Token {
                value: TokenValue::Symbol(sym, _),
                kind,
                ..
            }) => Some((*sym, *kind)),
            _ => None,
        }
    }

    // --- precedence level 1 (loosest): ternary `?:` and coalesce `??`, both over `||` ---
    //
    // `ternary := logicOr ('?' logicOr (':' ternary)?)?  |  logicOr '??' ternary` (spec.md §6):
    // `?:` and `??` share one level, both right-associative through their "else" branch.
    fn ternary(&mut self) -> Result<Stage, EvalAltResult> {
        let cond = self.or()?;
        match self.peek_symbol() {
            Some((OperatorSymbol::TernaryTrue, TokenKind::Ternary)) => {
                self.advance();
                let when_true = self.or()?;
                match self.peek_symbol() {
                    Some((OperatorSymbol::TernaryFalse, TokenKind::Ternary)) => {
                        self.advance();
                    }
                    _ => {
                        return Err(EvalAltResult::ParseError(
                            "Expected ':' to complete ternary expression".into(),
                            self.peek().map_or(self.last_pos(), |t| t.pos),
                        ))
                    }
                }
                let when_false = self.ternary()?;
                Ok(build_ternary(cond, when_true, when_false))
            }
            Some((OperatorSymbol::Coalesce, TokenKind::Ternary)) => {
                self.advance();
                let right = self.ternary()?;
                Ok(build_coalesce(cond, right))
            }
            _ => Ok(cond),
        }
    }

    // --- level 2: `||` ---
    fn or(&mut self) -> Result<Stage, EvalAltResult> {
        let mut left = self.and()?;
        while matches!(self.peek_symbol(), Some((OperatorSymbol::Or, TokenKind::Logicalop))) {
            self.advance();
            let right = self.and()?;
            left = build_or(left, right);
        }
        Ok(left)
    }

    // --- level 3: `&&` ---
    fn and(&mut self) -> Result<Stage, EvalAltResult> {
        let mut left = self.equality()?;
        while matches!(self.peek_symbol(), Some((OperatorSymbol::And, TokenKind::Logicalop))) {
            self.advance();
            let right = self.equality()?;
            left = build_and(left, right);
        }
        Ok(left)
    }

    // --- level 4: `==`, `!=` ---
    fn equality(&mut self) -> Result<Stage, EvalAltResult> {
        let mut left = self.regex_in()?;
        loop {
            let sym = match self.peek_symbol() {
                Some((sym @ (OperatorSymbol::Eq | OperatorSymbol::Neq), TokenKind::Comparator)) => sym,
                _ => break,
            };
            self.advance();
            let right = self.regex_in()?;
            left = build_equality(sym, left, right);
        }
        Ok(left)
    }

    // --- level 5: `=~`, `!~`, `in` — looser than relational comparisons (spec.md §4.2 level 7) ---
    fn regex_in(&mut self) -> Result<Stage, EvalAltResult> {
        let mut left = self.relational()?;
        loop {
            let sym = match self.peek_symbol() {
                Some((
                    sym @ (OperatorSymbol::Req | OperatorSymbol::Nreq | OperatorSymbol::In),
                    TokenKind::Comparator,
                )) => sym,
                _ => break,
            };
            self.advance();
            let right = self.relational()?;
            left = match sym {
                OperatorSymbol::In => build_in(left, right),
                _ => build_regex(sym, left, right),
            };
        }
        Ok(left)
    }

    // --- level 6: `<`, `>`, `<=`, `>=` (spec.md §4.2 level 8) ---
    fn relational(&mut self) -> Result<Stage, EvalAltResult> {
        let mut left = self.additive()?;
        loop {
            let sym = match self.peek_symbol() {
                Some((
                    sym @ (OperatorSymbol::Gt
                    | OperatorSymbol::Lt
                    | OperatorSymbol::Gte
                    | OperatorSymbol::Lte),
                    TokenKind::Comparator,
                )) => sym,
                _ => break,
            };
            self.advance();
            let right = self.additive()?;
            left = build_relational(sym, left, right);
        }
        Ok(left)
    }

    // --- level 7: `+`, `-`, `|`, `^` (spec.md §4.2 level 9) ---
    fn additive(&mut self) -> Result<Stage, EvalAltResult> {
        let mut left = self.multiplicative()?;
        loop {
            let sym = match self.peek_symbol() {
                Some((
                    sym @ (OperatorSymbol::Plus
                    | OperatorSymbol::Minus
                    | OperatorSymbol::BitwiseOr
                    | OperatorSymbol::BitwiseXor),
                    TokenKind::Modifier,
                )) => sym,
                _ => break,
            };
            self.advance();
            let right = self.multiplicative()?;
            left = match sym {
                OperatorSymbol::Plus => build_plus(left, right),
                OperatorSymbol::Minus => build_arith(sym, left, right, |a, b| a - b),
                _ => build_bitwise(sym, left, right),
            };
        }
        Ok(left)
    }

    // --- level 8: `*`, `/`, `%`, `<<`, `>>`, `&` (spec.md §4.2 level 10) ---
    fn multiplicative(&mut self) -> Result<Stage, EvalAltResult> {
        let mut left = self.exponent()?;
        loop {
            let sym = match self.peek_symbol() {
                Some((
                    sym @ (OperatorSymbol::Multiply
                    | OperatorSymbol::Divide
                    | OperatorSymbol::Modulus
                    | OperatorSymbol::BitwiseLshift
                    | OperatorSymbol::BitwiseRshift
                    | OperatorSymbol::BitwiseAnd),
                    TokenKind::Modifier,
                )) => sym,
                _ => break,
            };
            self.advance();
            let right = self.exponent()?;
            left = match sym {
                OperatorSymbol::Multiply => build_arith(sym, left, right, |a, b| a * b),
                OperatorSymbol::Divide => build_arith(sym, left, right, |a, b| a / b),
                OperatorSymbol::Modulus => build_modulus(left, right),
                _ => build_bitwise(sym, left, right),
            };
        }
        Ok(left)
    }

    // --- level 9: `**` (right-associative, spec.md §4.2 level 11) ---
    fn exponent(&mut self) -> Result<Stage, EvalAltResult> {
        let left = self.unary()?;
        if matches!(self.peek_symbol(), Some((OperatorSymbol::Exponent, TokenKind::Modifier))) {
            self.advance();
            // right-associative
            let right = self.exponent()?;
            return Ok(build_truncated_arith(OperatorSymbol::Exponent, left, right, f64::powf));
        }
        Ok(left)
    }

    // --- level 10: prefix `-`, `!`, `~` (spec.md §4.2 level 12) ---
    fn unary(&mut self) -> Result<Stage, EvalAltResult> {
        if let Some((sym, TokenKind::Prefix)) = self.peek_symbol() {
            self.advance();
            let operand = self.unary()?;
            return Ok(build_prefix(sym, operand));
        }
        self.primary()
    }

    // --- literals, variables, accessors, calls, parenthesized groups ---
    fn primary(&mut self) -> Result<Stage, EvalAltResult> {
        let tok = self.peek().ok_or_else(|| {
            EvalAltResult::ParseError("Unexpected end of expression".into(), self.last_pos())
        })?;

        match (&tok.kind, &tok.value) {
            (TokenKind::Numeric, TokenValue::Num(n)) => {
                let n = *n;
                self.advance();
                Ok(self.literal_leaf(Value::Num(n)))
            }
            (TokenKind::StringLit, TokenValue::Str(s)) => {
                let s = s.clone();
                self.advance();
                Ok(self.literal_leaf(Value::Str(s)))
            }
            (TokenKind::Boolean, TokenValue::Bool(b)) => {
                let b = *b;
                self.advance();
                Ok(self.literal_leaf(Value::Bool(b)))
            }
            (TokenKind::Time, TokenValue::Time(t)) => {
                let t = *t;
                self.advance();
                Ok(self.literal_leaf(Value::Time(t)))
            }
            (TokenKind::Variable, TokenValue::Name(name)) => {
                let name = name.to_string();
                self.advance();
                Ok(self.variable_leaf(name))
            }
            (TokenKind::Accessor, TokenValue::Path(path)) => {
                let path: Vec<String> = path.iter().map(|s| s.to_string()).collect();
                self.advance();
                let args = self.maybe_call_args()?;
                Ok(build_accessor(path, args))
            }
            (TokenKind::Function, TokenValue::Func(func)) => {
                let func = func.clone();
                self.advance();
                let args = self.call_args(&func.name().to_string())?;
                Ok(build_call(func, args))
            }
            (TokenKind::Clause, _) => {
                self.advance();
                let mut items = vec![self.ternary()?];
                while matches!(self.peek_kind(), Some(TokenKind::Separator)) {
                    self.advance();
                    items.push(self.ternary()?);
                }
                self.expect_clause_close()?;
                if items.len() == 1 {
                    Ok(items.pop().unwrap())
                } else {
                    Ok(build_array(items))
                }
            }
            _ => Err(EvalAltResult::ParseError(
                format!("Unexpected token '{}'", tok.text()),
                tok.pos,
            )),
        }
    }

    /// Parse `(arg, arg, ...)` after a function-name token has already been consumed.
    fn call_args(&mut self, name: &str) -> Result<Vec<Stage>, EvalAltResult> {
        match self.peek_kind() {
            Some(TokenKind::Clause) => {}
            _ => {
                return Err(EvalAltResult::ParseError(
                    format!("Expected '(' after function '{name}'"),
                    self.peek().map_or(self.last_pos(), |t| t.pos),
                ))
            }
        }
        self.advance();
        let mut args = Vec::new();
        if !matches!(self.peek_kind(), Some(TokenKind::ClauseClose)) {
            args.push(self.ternary()?);
            while matches!(self.peek_kind(), Some(TokenKind::Separator)) {
                self.advance();
                args.push(self.ternary()?);
            }
        }
        self.expect_clause_close()?;
        Ok(args)
    }

    /// An accessor chain (`a.b.c`) may optionally be followed by a call `(...)`, turning its
    /// final segment into a method call rather than a field read.
    fn maybe_call_args(&mut self) -> Result<Option<Vec<Stage>>, EvalAltResult> {
        if matches!(self.peek_kind(), Some(TokenKind::Clause)) {
            self.advance();
            let mut args = Vec::new();
            if !matches!(self.peek_kind(), Some(TokenKind::ClauseClose)) {
                args.push(self.ternary()?);
                while matches!(self.peek_kind(), Some(TokenKind::Separator)) {
                    self.advance();
                    args.push(self.ternary()?);
                }
            }
            self.expect_clause_close()?;
            Ok(Some(args))
        } else {
            Ok(None)
        }
    }

    /// Build a literal leaf, reusing a cached operator closure for this exact value when a leaf
    /// cache is attached and already holds one.
    fn literal_leaf(&self, value: Value) -> Stage {
        let op = match self.leaf_cache {
            Some(cache) => cache.literal(&value, || literal_operator(value.clone())),
            None => literal_operator(value),
        };
        Stage::leaf(OperatorSymbol::Literal, op)
    }

    /// Build a variable leaf, reusing a cached operator closure for this name when a leaf cache
    /// is attached and already holds one.
    fn variable_leaf(&self, name: String) -> Stage {
        let op = match self.leaf_cache {
            Some(cache) => cache.variable(&name, || variable_operator(name.clone())),
            None => variable_operator(name),
        };
        Stage::leaf(OperatorSymbol::Value, op)
    }
}

fn literal_operator(value: Value) -> StageOperator {
    Arc::new(move |_, _, _: &Scope| Ok(value.clone()))
}

fn variable_operator(name: String) -> StageOperator {
    Arc::new(move |_, _, scope: &Scope| {
        scope.get(&name).cloned().ok_or_else(|| {
            EvalAltResult::NameError(format!("No parameter '{name}' found"), Position::NONE)
        })
    })
}

// --- Stage builders: one per operator family, pairing the type-check table with its closure ---

fn build_plus(left: Stage, right: Stage) -> Stage {
    let op: StageOperator = Arc::new(|l: Option<&Value>, r: Option<&Value>, _: &Scope| {
        match (l.unwrap(), r.unwrap()) {
            (Value::Num(a), Value::Num(b)) => Ok(Value::Num(a + b)),
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}").into())),
            _ => unreachable!("pair_numeric_or_string guarantees a matching pair"),
        }
    });
    Stage::binary(
        OperatorSymbol::Plus,
        op,
        Some(is_number_or_string as TypeCheck),
        Some(is_number_or_string as TypeCheck),
        Some(pair_numeric_or_string as PairTypeCheck),
        MODIFIER_TEMPLATE,
        left,
        right,
    )
}

fn build_arith(symbol: OperatorSymbol, left: Stage, right: Stage, f: fn(f64, f64) -> f64) -> Stage {
    let op: StageOperator = Arc::new(move |l, r, _: &Scope| {
        Ok(Value::Num(f(l.unwrap().as_f64().unwrap(), r.unwrap().as_f64().unwrap())))
    });
    Stage::binary(
        symbol,
        op,
        Some(is_number as TypeCheck),
        Some(is_number as TypeCheck),
        None,
        MODIFIER_TEMPLATE,
        left,
        right,
    )
}

/// Like [`build_arith`], but truncates both operands to signed 64-bit first and widens the
/// result back to float, matching `%`/bitwise/shifts. Used for `**`.
fn build_truncated_arith(
    symbol: OperatorSymbol,
    left: Stage,
    right: Stage,
    f: fn(f64, f64) -> f64,
) -> Stage {
    let op: StageOperator = Arc::new(move |l, r, _: &Scope| {
        let a = l.unwrap().as_truncated_i64().unwrap() as f64;
        let b = r.unwrap().as_truncated_i64().unwrap() as f64;
        Ok(Value::Num(f(a, b)))
    });
    Stage::binary(
        symbol,
        op,
        Some(is_number as TypeCheck),
        Some(is_number as TypeCheck),
        None,
        MODIFIER_TEMPLATE,
        left,
        right,
    )
}

fn build_modulus(left: Stage, right: Stage) -> Stage {
    let op: StageOperator = Arc::new(|l: Option<&Value>, r: Option<&Value>, _: &Scope| {
        let a = l.unwrap().as_truncated_i64().unwrap();
        let b = r.unwrap().as_truncated_i64().unwrap();
        if b == 0 {
            return Ok(Value::Num(f64::NAN));
        }
        Ok(Value::Num((a % b) as f64))
    });
    Stage::binary(
        OperatorSymbol::Modulus,
        op,
        Some(is_number as TypeCheck),
        Some(is_number as TypeCheck),
        None,
        MODIFIER_TEMPLATE,
        left,
        right,
    )
}

fn build_bitwise(symbol: OperatorSymbol, left: Stage, right: Stage) -> Stage {
    let op: StageOperator = Arc::new(move |l: Option<&Value>, r: Option<&Value>, _: &Scope| {
        let a = l.unwrap().as_truncated_i64().unwrap();
        let b = r.unwrap().as_truncated_i64().unwrap();
        let result = match symbol {
            OperatorSymbol::BitwiseAnd => a & b,
            OperatorSymbol::BitwiseOr => a | b,
            OperatorSymbol::BitwiseXor => a ^ b,
            OperatorSymbol::BitwiseLshift => a.wrapping_shl(b as u32 & 63),
            OperatorSymbol::BitwiseRshift => a.wrapping_shr(b as u32 & 63),
            _ => unreachable!(),
        };
        Ok(Value::Num(result as f64))
    });
    Stage::binary(
        symbol,
        op,
        Some(is_number as TypeCheck),
        Some(is_number as TypeCheck),
        None,
        MODIFIER_TEMPLATE,
        left,
        right,
    )
}

fn build_equality(symbol: OperatorSymbol, left: Stage, right: Stage) -> Stage {
    let op: StageOperator = Arc::new(move |l: Option<&Value>, r: Option<&Value>, _: &Scope| {
        let eq = l.unwrap() == r.unwrap();
        Ok(Value::Bool(if symbol == OperatorSymbol::Eq { eq } else { !eq }))
    });
    Stage::binary(
        symbol,
        op,
        Some(any_value as TypeCheck),
        Some(any_value as TypeCheck),
        None,
        COMPARATOR_TEMPLATE,
        left,
        right,
    )
}

fn build_relational(symbol: OperatorSymbol, left: Stage, right: Stage) -> Stage {
    let op: StageOperator = Arc::new(move |l: Option<&Value>, r: Option<&Value>, _: &Scope| {
        let ord = compare_values(l.unwrap(), r.unwrap());
        use std::cmp::Ordering::*;
        let result = match (symbol, ord) {
            (OperatorSymbol::Gt, Greater) => true,
            (OperatorSymbol::Lt, Less) => true,
            (OperatorSymbol::Gte, Greater | Equal) => true,
            (OperatorSymbol::Lte, Less | Equal) => true,
            _ => false,
        };
        Ok(Value::Bool(result))
    });
    Stage::binary(
        symbol,
        op,
        Some(is_comparable as TypeCheck),
        Some(is_comparable as TypeCheck),
        Some(pair_same_comparable as PairTypeCheck),
        COMPARATOR_TEMPLATE,
        left,
        right,
    )
}

fn build_regex(symbol: OperatorSymbol, left: Stage, right: Stage) -> Stage {
    let op: StageOperator = Arc::new(move |l: Option<&Value>, r: Option<&Value>, _: &Scope| {
        let s = l.unwrap().as_str().unwrap();
        let matched = match r.unwrap() {
            Value::Regex(re) => re.is_match(s),
            Value::Str(pattern) => regex::Regex::new(pattern)
                .map_err(|e| {
                    EvalAltResult::PlanError(format!("Invalid regular expression: {e}"), Position::NONE)
                })?
                .is_match(s),
            _ => unreachable!("is_string_or_pattern guarantees one of the two"),
        };
        Ok(Value::Bool(if symbol == OperatorSymbol::Req { matched } else { !matched }))
    });
    Stage::binary(
        symbol,
        op,
        Some(is_string as TypeCheck),
        Some(is_string_or_pattern as TypeCheck),
        None,
        COMPARATOR_TEMPLATE,
        left,
        right,
    )
}

fn build_in(left: Stage, right: Stage) -> Stage {
    let op: StageOperator = Arc::new(|l: Option<&Value>, r: Option<&Value>, _: &Scope| {
        let arr = r.unwrap().as_array().unwrap();
        Ok(Value::Bool(arr.contains(l.unwrap())))
    });
    Stage::binary(
        OperatorSymbol::In,
        op,
        Some(any_value as TypeCheck),
        Some(is_array as TypeCheck),
        None,
        COMPARATOR_TEMPLATE,
        left,
        right,
    )
}

fn build_prefix(symbol: OperatorSymbol, operand: Stage) -> Stage {
    let (check, template): (TypeCheck, &'static str) = match symbol {
        OperatorSymbol::Negate | OperatorSymbol::BitwiseNot => (is_number, MODIFIER_TEMPLATE),
        OperatorSymbol::Invert => (is_bool, LOGICAL_TEMPLATE),
        _ => unreachable!("only prefix symbols reach build_prefix"),
    };
    let op: StageOperator = Arc::new(move |_: Option<&Value>, r: Option<&Value>, _: &Scope| match symbol {
        OperatorSymbol::Negate => Ok(Value::Num(-r.unwrap().as_f64().unwrap())),
        OperatorSymbol::Invert => Ok(Value::Bool(!r.unwrap().as_bool().unwrap())),
        OperatorSymbol::BitwiseNot => Ok(Value::Num(!r.unwrap().as_truncated_i64().unwrap() as f64)),
        _ => unreachable!(),
    });
    Stage::unary(symbol, op, check, template, operand)
}

fn build_and(left: Stage, right: Stage) -> Stage {
    let left = Box::new(left);
    let right = Box::new(right);
    let op: StageOperator = Arc::new(move |_, _, scope: &Scope| {
        let l = eval_stage(&left, scope)?;
        if !l.is_bool() {
            return Err(logical_type_error(&l));
        }
        if l.as_bool() == Some(false) {
            return Ok(Value::Bool(false));
        }
        let r = eval_stage(&right, scope)?;
        if !r.is_bool() {
            return Err(logical_type_error(&r));
        }
        Ok(r)
    });
    Stage::leaf(OperatorSymbol::And, op)
}

fn build_or(left: Stage, right: Stage) -> Stage {
    let left = Box::new(left);
    let right = Box::new(right);
    let op: StageOperator = Arc::new(move |_, _, scope: &Scope| {
        let l = eval_stage(&left, scope)?;
        if !l.is_bool() {
            return Err(logical_type_error(&l));
        }
        if l.as_bool() == Some(true) {
            return Ok(Value::Bool(true));
        }
        let r = eval_stage(&right, scope)?;
        if !r.is_bool() {
            return Err(logical_type_error(&r));
        }
        Ok(r)
    });
    Stage::leaf(OperatorSymbol::Or, op)
}

fn logical_type_error(v: &Value) -> EvalAltResult {
    EvalAltResult::type_error(
        &format!("'{}' ({})", v, v.type_name()),
        LOGICAL_TEMPLATE,
        Position::NONE,
    )
}

fn build_ternary(cond: Stage, when_true: Stage, when_false: Stage) -> Stage {
    let cond = Box::new(cond);
    let when_true = Box::new(when_true);
    let when_false = Box::new(when_false);
    let op: StageOperator = Arc::new(move |_, _, scope: &Scope| {
        let c = eval_stage(&cond, scope)?;
        if !c.is_bool() {
            return Err(EvalAltResult::type_error(
                &format!("'{}' ({})", c, c.type_name()),
                TERNARY_TEMPLATE,
                Position::NONE,
            ));
        }
        if c.as_bool() == Some(true) {
            eval_stage(&when_true, scope)
        } else {
            eval_stage(&when_false, scope)
        }
    });
    Stage::leaf(OperatorSymbol::TernaryTrue, op)
}

fn build_coalesce(left: Stage, right: Stage) -> Stage {
    let left = Box::new(left);
    let right = Box::new(right);
    let op: StageOperator = Arc::new(move |_, _, scope: &Scope| match eval_stage(&left, scope) {
        Ok(v) => Ok(v),
        Err(EvalAltResult::NameError(_, _)) => eval_stage(&right, scope),
        Err(e) => Err(e),
    });
    Stage::leaf(OperatorSymbol::Coalesce, op)
}

fn build_accessor(path: Vec<String>, args: Option<Vec<Stage>>) -> Stage {
    let op: StageOperator = Arc::new(move |_, _, scope: &Scope| {
        let root_name = &path[0];
        let mut current = scope.get(root_name).cloned().ok_or_else(|| {
            EvalAltResult::NameError(format!("No parameter '{root_name}' found"), Position::NONE)
        })?;

        let last = path.len() - 1;
        for (i, segment) in path.iter().enumerate().skip(1) {
            let host = as_host(&current, segment)?;
            if i == last && args.is_some() {
                let values = evaluate_args(args.as_deref().unwrap(), scope)?;
                current = host.call(segment, &values)?;
            } else if let Some(v) = host.field(segment)? {
                current = v;
            } else {
                current = host.call(segment, &[])?;
            }
        }
        Ok(current)
    });
    Stage::leaf(OperatorSymbol::Access, op)
}

fn as_host<'v>(value: &'v Value, member: &str) -> Result<&'v Arc<dyn HostIntrospect>, EvalAltResult> {
    match value {
        Value::Host(h) => Ok(h),
        _ => Err(EvalAltResult::NameError(
            format!("No method or field '{member}'"),
            Position::NONE,
        )),
    }
}

fn evaluate_args(args: &[Stage], scope: &Scope) -> Result<Vec<Value>, EvalAltResult> {
    args.iter().map(|s| eval_stage(s, scope)).collect()
}

fn build_call(func: crate::fn_native::FunctionHandle, args: Vec<Stage>) -> Stage {
    let op: StageOperator = Arc::new(move |_, _, scope: &Scope| {
        let values = evaluate_args(&args, scope)?;
        func.call(&values)
    });
    Stage::leaf(OperatorSymbol::Functional, op)
}

fn build_array(items: Vec<Stage>) -> Stage {
    let op: StageOperator = Arc::new(move |_, _, scope: &Scope| {
        Ok(Value::Array(Arc::new(evaluate_args(&items, scope)?)))
    });
    Stage::leaf(OperatorSymbol::Value, op)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::tokenize;
    use std::collections::HashMap;

    fn parse_str(src: &str) -> Stage {
        let funcs = HashMap::default();
        let tokens = tokenize(src, &funcs).unwrap();
        parse(&tokens).unwrap()
    }

    #[test]
    fn operator_precedence_respected() {
        let stage = parse_str("1 + 2 * 3");
        let v = eval_stage(&stage, &Scope::new()).unwrap();
        assert_eq!(v.as_f64(), Some(7.0));
    }

    #[test]
    fn exponent_is_right_associative() {
        let stage = parse_str("2 ** 3 ** 2");
        let v = eval_stage(&stage, &Scope::new()).unwrap();
        assert_eq!(v.as_f64(), Some(512.0));
    }

    #[test]
    fn ternary_picks_branch() {
        let stage = parse_str("1 > 0 ? 'yes' : 'no'");
        let v = eval_stage(&stage, &Scope::new()).unwrap();
        assert_eq!(v.as_str(), Some("yes"));
    }

    #[test]
    fn coalesce_falls_back_on_missing_variable() {
        let stage = parse_str("missing ?? 42");
        let v = eval_stage(&stage, &Scope::new()).unwrap();
        assert_eq!(v.as_f64(), Some(42.0));
    }

    #[test]
    fn in_checks_array_membership() {
        let stage = parse_str("2 in (1, 2, 3)");
        let v = eval_stage(&stage, &Scope::new()).unwrap();
        assert_eq!(v.as_bool(), Some(true));
    }

    #[test]
    fn type_error_names_the_modifier() {
        let stage = parse_str("1 + true");
        let err = eval_stage(&stage, &Scope::new()).unwrap_err();
        assert!(err.to_string().contains("cannot be used with the modifier"));
    }

    #[test]
    fn type_error_names_the_logical_operator() {
        let stage = parse_str("1 && true");
        let err = eval_stage(&stage, &Scope::new()).unwrap_err();
        assert!(err.to_string().contains("cannot be used with the logical operator"));
    }

    #[test]
    fn bitwise_or_and_additive_share_a_level_left_to_right() {
        // `|` sits alongside `+`/`-` in spec.md §4.2 level 9; left-to-right: (1 | 2) + 4 = 7.
        let stage = parse_str("1 | 2 + 4");
        let v = eval_stage(&stage, &Scope::new()).unwrap();
        assert_eq!(v.as_f64(), Some(7.0));
    }

    #[test]
    fn bitwise_and_binds_tighter_than_additive() {
        // `&` sits at multiplicative level (spec.md §4.2 level 10): 1 + (2 & 3) = 1 + 2 = 3.
        let stage = parse_str("1 + 2 & 3");
        let v = eval_stage(&stage, &Scope::new()).unwrap();
        assert_eq!(v.as_f64(), Some(3.0));
    }

    #[test]
    fn equality_binds_looser_than_relational() {
        // `<` at level 6 binds before `==` at level 4: (1 < 2) == true.
        let stage = parse_str("1 < 2 == true");
        let v = eval_stage(&stage, &Scope::new()).unwrap();
        assert_eq!(v.as_bool(), Some(true));
    }

    #[test]
    fn in_binds_looser_than_equality_operands_but_is_its_own_level() {
        // `in` parses at level 5, between equality (4) and relational (6): the membership
        // test binds before the outer `==`.
        let stage = parse_str("1 in (1, 2) == true");
        let v = eval_stage(&stage, &Scope::new()).unwrap();
        assert_eq!(v.as_bool(), Some(true));
    }

    #[test]
    fn missing_clause_close_is_parse_error() {
        let funcs = HashMap::default();
        let tokens = tokenize("(1 + 2", &funcs);
        assert!(tokens.is_err());
    }
}
