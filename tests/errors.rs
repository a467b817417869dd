use exprlang::{Engine, EvalAltResult, Scope};

#[test]
fn unbalanced_parens_fails_to_compile() {
    let engine = Engine::new();
    let err = engine.compile("(1 + 2").unwrap_err();
    assert!(matches!(*err, EvalAltResult::ParseError(_, _)));
}

#[test]
fn unclosed_string_is_a_lex_error() {
    let engine = Engine::new();
    let err = engine.compile("'unterminated").unwrap_err();
    assert!(matches!(*err, EvalAltResult::LexError(_, _)));
}

#[test]
fn hanging_accessor_is_a_lex_error() {
    let engine = Engine::new();
    let err = engine.compile("foo.").unwrap_err();
    assert!(matches!(*err, EvalAltResult::LexError(_, _)));
}

#[test]
fn missing_variable_is_a_name_error() {
    let engine = Engine::new();
    let expr = engine.compile("missing + 1").unwrap();
    let err = expr.evaluate(&Scope::new()).unwrap_err();
    assert!(err.to_string().contains("No parameter"));
}

#[test]
fn modifier_type_error_names_the_contractual_template() {
    let engine = Engine::new();
    let expr = engine.compile("1 + true").unwrap();
    let err = expr.evaluate(&Scope::new()).unwrap_err();
    assert!(err.to_string().contains("cannot be used with the modifier"));
}

#[test]
fn first_error_aborts_evaluation() {
    // children are evaluated before a stage's own type-checks run: a missing variable on
    // the right aborts with a NameError before `+`'s modifier type-check ever sees the
    // (already-valid) left operand.
    let engine = Engine::new();
    let mut scope = Scope::new();
    scope.push("x", true);
    let expr = engine.compile("x + missing").unwrap();
    let err = expr.evaluate(&scope).unwrap_err();
    assert!(err.to_string().contains("No parameter"));
}

#[test]
fn coercion_error_on_a_non_integral_float_argument() {
    let result = exprlang::coerce_to_integer::<i64>(&exprlang::Value::Num(1.5));
    assert!(matches!(result, Err(EvalAltResult::CoercionError(_, _))));
}

#[test]
fn unbalanced_input_never_compiles() {
    let engine = Engine::new();
    for bad in ["(1 + 2", "1 + 2)", "((1 + 2)", "foo(1, 2"] {
        assert!(engine.compile(bad).is_err(), "expected {bad:?} to fail");
    }
}
