use exprlang::{Engine, Scope};

#[test]
fn numeric_comparisons() {
    let engine = Engine::new();
    let mut scope = Scope::new();
    scope.push("foo", 5_i64);
    let expr = engine.compile("foo == 5").unwrap();
    assert_eq!(expr.evaluate(&scope).unwrap().as_bool(), Some(true));
}

#[test]
fn relational_operators() {
    let engine = Engine::new();
    let scope = Scope::new();
    assert_eq!(
        engine.compile("3 < 5").unwrap().evaluate(&scope).unwrap().as_bool(),
        Some(true)
    );
    assert_eq!(
        engine.compile("5 <= 5").unwrap().evaluate(&scope).unwrap().as_bool(),
        Some(true)
    );
    assert_eq!(
        engine.compile("5 > 5").unwrap().evaluate(&scope).unwrap().as_bool(),
        Some(false)
    );
    assert_eq!(
        engine.compile("'a' < 'b'").unwrap().evaluate(&scope).unwrap().as_bool(),
        Some(true)
    );
}

#[test]
fn equality_never_type_errors_across_kinds() {
    let engine = Engine::new();
    let expr = engine.compile("1 == 'x'").unwrap();
    assert_eq!(expr.evaluate(&Scope::new()).unwrap().as_bool(), Some(false));
}

#[test]
fn relational_requires_comparable_operands_of_matching_kind() {
    let engine = Engine::new();
    let mut scope = Scope::new();
    scope.push("bool", true);
    let expr = engine.compile("bool > bool").unwrap();
    let err = expr.evaluate(&scope).unwrap_err();
    assert!(err.to_string().contains("cannot be used with the comparator"));
}

#[test]
fn relational_rejects_mismatched_comparable_kinds() {
    let engine = Engine::new();
    let expr = engine.compile("1 < 'a'").unwrap();
    let err = expr.evaluate(&Scope::new()).unwrap_err();
    assert!(err.to_string().contains("cannot be used with the comparator"));
}
