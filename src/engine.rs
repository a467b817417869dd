//! Main module defining the script evaluation [`Engine`] and the compiled [`Expression`] it
//! produces.

use crate::ast::Stage;
use crate::dynamic::Value;
use crate::error::{EvalAltResult, Position};
use crate::fn_native::{FunctionHandle, NativeFunction, Shared};
use crate::leaf_cache::LeafCache;
use crate::optimize;
use crate::parse;
use crate::scope::Scope;
use crate::token::{self, Token};
use std::collections::HashMap;
use std::sync::Arc;

/// How aggressively the planner rewrites a freshly-parsed tree before it is handed back as an
/// [`Expression`]. Grounded on the teacher's `OptimizationLevel` (same three-level shape, applied
/// to a much smaller rewrite: this language has no statements to fold, only regex literals and
/// constant subexpressions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptimizationLevel {
    /// Evaluate stages exactly as built by the parser.
    None,
    /// Precompile `=~`/`!~` stages whose right-hand side is a string literal. Never changes
    /// observable behaviour.
    #[default]
    Simple,
    /// [`Self::Simple`], plus fold constant subexpressions (arithmetic/logical/comparison stages
    /// whose operands are both literals) at compile time.
    Full,
}

struct ExpressionInner {
    root: Stage,
    tokens: Vec<Token>,
    vars: Vec<String>,
}

/// A compiled expression: a [`Stage`] tree ready to be evaluated, as many times as needed,
/// against any [`Scope`].
///
/// Cloning an [`Expression`] is cheap (an `Arc` bump); the same compiled tree can be evaluated
/// concurrently from multiple threads against disjoint [`Scope`]s.
#[derive(Clone)]
pub struct Expression(Arc<ExpressionInner>);

impl Expression {
    /// Evaluate this expression against `scope`.
    pub fn evaluate(&self, scope: &Scope) -> Result<Value, Box<EvalAltResult>> {
        eval_stage(&self.0.root, scope).map_err(Box::new)
    }

    /// The names of every variable and accessor root this expression reads from its [`Scope`],
    /// in first-occurrence order. Computed from the token stream rather than the compiled tree,
    /// so it reflects every reference even ones a constant-folding pass later proved unreachable.
    #[must_use]
    pub fn vars(&self) -> &[String] {
        &self.0.vars
    }

    /// The token stream this expression was compiled from, for diagnostics and tooling.
    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.0.tokens
    }
}

/// The post-order walk every compiled [`Stage`] tree is evaluated with.
///
/// A stage with both `left_check` and `right_check` set has its children evaluated eagerly
/// (arithmetic, comparison, bitwise, `in`); a stage without them is a leaf as far as this walker
/// is concerned — literals, variable/accessor lookups, function calls and the short-circuiting
/// control-flow stages (`&&`, `||`, `?:`, `??`) each carry their own operands inside the
/// `operator` closure and recurse into this function themselves when (and only when) they decide
/// an operand is actually needed.
pub(crate) fn eval_stage(stage: &Stage, scope: &Scope) -> Result<Value, EvalAltResult> {
    let left = match (&stage.left, stage.left_check) {
        (Some(l), Some(_)) => Some(eval_stage(l, scope)?),
        _ => None,
    };
    let right = match (&stage.right, stage.right_check) {
        (Some(r), Some(_)) => Some(eval_stage(r, scope)?),
        _ => None,
    };

    if let (Some(check), Some(v)) = (stage.left_check, left.as_ref()) {
        if !check(v) {
            return Err(single_type_error(stage, v));
        }
    }
    if let (Some(check), Some(v)) = (stage.right_check, right.as_ref()) {
        if !check(v) {
            return Err(single_type_error(stage, v));
        }
    }
    if let (Some(check), Some(l), Some(r)) = (stage.pair_check, left.as_ref(), right.as_ref()) {
        if !check(l, r) {
            return Err(pair_type_error(stage, l, r));
        }
    }

    (stage.operator)(left.as_ref(), right.as_ref(), scope)
}

fn single_type_error(stage: &Stage, v: &Value) -> EvalAltResult {
    EvalAltResult::type_error(
        &format!("'{}' ({})", v, v.type_name()),
        stage.type_error_template,
        Position::NONE,
    )
}

fn pair_type_error(stage: &Stage, l: &Value, r: &Value) -> EvalAltResult {
    EvalAltResult::type_error(
        &format!(
            "'{}' ({}) and '{}' ({})",
            l,
            l.type_name(),
            r,
            r.type_name()
        ),
        stage.type_error_template,
        Position::NONE,
    )
}

struct EngineInner {
    functions: HashMap<String, FunctionHandle, ahash::RandomState>,
    optimization_level: OptimizationLevel,
    leaf_cache: Option<LeafCache>,
}

/// Compiles expressions and owns the registry of host functions they may call.
///
/// Mirrors the teacher's `Engine`, minus everything that exists only to run a scripting language:
/// no module resolver, no statement optimizer, no closures/functions-lib. `compile` and
/// `compile_with_fns` are the two entry points that do real work; everything else configures
/// them.
pub struct Engine(EngineInner);

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Create a new engine with [`OptimizationLevel::Simple`] and no registered functions or
    /// leaf cache. Built with the `no_optimize` feature, the default is [`OptimizationLevel::None`]
    /// instead, mirroring the teacher's crate-level `no_optimize` feature.
    #[must_use]
    pub fn new() -> Self {
        #[cfg(not(feature = "no_optimize"))]
        let optimization_level = OptimizationLevel::default();
        #[cfg(feature = "no_optimize")]
        let optimization_level = OptimizationLevel::None;

        Self(EngineInner {
            functions: HashMap::default(),
            optimization_level,
            leaf_cache: None,
        })
    }

    /// Enable the optional weak-reference leaf cache: a variable or literal leaf built while
    /// compiling one expression is reused by any other expression (compiled on this `Engine`)
    /// that references the same variable name or the same literal value, as long as at least one
    /// user of that leaf's closure is still alive, instead of each compile allocating its own.
    ///
    /// Off by default. Grounded on `original_source/cache.go`'s `weak.Pointer`-backed
    /// `getParameterStage`/`getConstantStage` cache, translated to [`std::sync::Weak`].
    #[must_use]
    pub fn with_leaf_cache(mut self) -> Self {
        self.0.leaf_cache = Some(LeafCache::new());
        self
    }

    /// Set how aggressively [`Self::compile`] rewrites the parsed tree.
    pub fn set_optimization_level(&mut self, level: OptimizationLevel) -> &mut Self {
        self.0.optimization_level = level;
        self
    }

    /// Register a host function under `name`, callable from any expression compiled afterwards.
    pub fn register_fn(
        &mut self,
        name: impl Into<String>,
        func: impl NativeFunction + 'static,
    ) -> &mut Self {
        let name = name.into();
        self.0
            .functions
            .insert(name.clone(), FunctionHandle::new(name, Shared::new(func)));
        self
    }

    /// Compile `source` into an [`Expression`], resolving function calls against this engine's
    /// registered functions.
    ///
    /// # Errors
    ///
    /// Returns the first lex, parse or plan error encountered.
    pub fn compile(&self, source: &str) -> Result<Expression, Box<EvalAltResult>> {
        self.compile_inner(source, &self.0.functions)
    }

    /// Compile `source` against an explicit, one-shot `name -> function` map instead of this
    /// engine's registered functions. Does not read or mutate the engine's function registry;
    /// the returned [`Expression`] resolves its calls solely against `funcs`.
    ///
    /// This is the spec's second `compile` entry point (`compile(src, funcs)`) — an alternative
    /// to `register_fn` followed by [`Self::compile`] for callers who want a fresh function set
    /// per call rather than a persistent registry.
    ///
    /// # Errors
    ///
    /// Returns the first lex, parse or plan error encountered.
    pub fn compile_with_fns(
        &self,
        source: &str,
        funcs: &HashMap<String, FunctionHandle>,
    ) -> Result<Expression, Box<EvalAltResult>> {
        let mut functions = HashMap::with_hasher(ahash::RandomState::default());
        functions.extend(funcs.iter().map(|(name, handle)| (name.clone(), handle.clone())));
        self.compile_inner(source, &functions)
    }

    fn compile_inner(
        &self,
        source: &str,
        functions: &HashMap<String, FunctionHandle, ahash::RandomState>,
    ) -> Result<Expression, Box<EvalAltResult>> {
        let tokens = token::tokenize(source, functions)?;
        let vars = collect_vars(&tokens);
        let mut root = parse::parse_with_cache(&tokens, self.0.leaf_cache.as_ref())?;
        optimize::optimize(&mut root, self.0.optimization_level)?;

        Ok(Expression(Arc::new(ExpressionInner { root, tokens, vars })))
    }
}

fn collect_vars(tokens: &[Token]) -> Vec<String> {
    use crate::token::{TokenKind, TokenValue};

    let mut seen = Vec::new();
    for token in tokens {
        let name = match (&token.kind, &token.value) {
            (TokenKind::Variable, TokenValue::Name(n)) => n.to_string(),
            (TokenKind::Accessor, TokenValue::Path(p)) => {
                p.first().map(|s| s.to_string()).unwrap_or_default()
            }
            _ => continue,
        };
        if !name.is_empty() && !seen.contains(&name) {
            seen.push(name);
        }
    }
    seen
}
