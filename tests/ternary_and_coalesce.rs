use exprlang::{Engine, Scope};

#[test]
fn ternary_picks_the_true_branch() {
    let engine = Engine::new();
    let expr = engine.compile("1 > 0 ? 'yes' : 'no'").unwrap();
    assert_eq!(expr.evaluate(&Scope::new()).unwrap().as_str(), Some("yes"));
}

#[test]
fn ternary_picks_the_false_branch() {
    let engine = Engine::new();
    let expr = engine.compile("1 < 0 ? 'yes' : 'no'").unwrap();
    assert_eq!(expr.evaluate(&Scope::new()).unwrap().as_str(), Some("no"));
}

#[test]
fn ternary_is_right_associative() {
    let engine = Engine::new();
    // true ? 1 : (false ? 2 : 3)
    let expr = engine.compile("true ? 1 : false ? 2 : 3").unwrap();
    assert_eq!(expr.evaluate(&Scope::new()).unwrap().as_f64(), Some(1.0));
}

#[test]
fn ternary_condition_must_be_bool() {
    let engine = Engine::new();
    let expr = engine.compile("1 ? 'yes' : 'no'").unwrap();
    let err = expr.evaluate(&Scope::new()).unwrap_err();
    assert!(err.to_string().contains("cannot be used with the ternary operator"));
}

#[test]
fn ternary_binds_looser_than_or() {
    // `||` binds before `?:`: (true || false) ? 1 : 2
    let engine = Engine::new();
    let expr = engine.compile("true || false ? 1 : 2").unwrap();
    assert_eq!(expr.evaluate(&Scope::new()).unwrap().as_f64(), Some(1.0));
}

#[test]
fn coalesce_falls_back_on_a_missing_variable() {
    let engine = Engine::new();
    let expr = engine.compile("missing ?? 42").unwrap();
    assert_eq!(expr.evaluate(&Scope::new()).unwrap().as_f64(), Some(42.0));
}

#[test]
fn coalesce_does_not_fall_back_on_a_present_variable() {
    let engine = Engine::new();
    let mut scope = Scope::new();
    scope.push("x", 7_i64);
    let expr = engine.compile("x ?? 42").unwrap();
    assert_eq!(expr.evaluate(&scope).unwrap().as_f64(), Some(7.0));
}

#[test]
fn coalesce_propagates_errors_other_than_a_missing_name() {
    let engine = Engine::new();
    // left side is a genuine type error (not a name error), must not be swallowed
    let expr = engine.compile("(1 + true) ?? 42").unwrap();
    let err = expr.evaluate(&Scope::new()).unwrap_err();
    assert!(err.to_string().contains("cannot be used with the modifier"));
}
