use exprlang::{Engine, Scope};

#[test]
fn vars_reports_every_referenced_name_once_in_first_occurrence_order() {
    let engine = Engine::new();
    let expr = engine.compile("a + b * a - c").unwrap();
    assert_eq!(
        expr.vars(),
        &["a".to_string(), "b".to_string(), "c".to_string()]
    );
}

#[test]
fn vars_includes_accessor_roots_but_not_intermediate_segments() {
    let engine = Engine::new();
    let expr = engine.compile("foo.Bar.Baz + qux").unwrap();
    assert_eq!(
        expr.vars(),
        &["foo".to_string(), "qux".to_string()]
    );
}

#[test]
fn vars_is_empty_for_a_constant_expression() {
    let engine = Engine::new();
    let expr = engine.compile("1 + 2").unwrap();
    assert!(expr.vars().is_empty());
}

#[test]
fn tokens_reflects_the_source_text() {
    let engine = Engine::new();
    let expr = engine.compile("1 + 2").unwrap();
    assert_eq!(expr.tokens().len(), 3);
}

#[test]
fn scope_push_overwrites_and_remove_clears_a_binding() {
    let mut scope = Scope::new();
    scope.push("x", 1_i64);
    scope.push("x", 2_i64);
    assert_eq!(scope.get("x").and_then(|v| v.as_f64()), Some(2.0));
    assert!(scope.remove("x").is_some());
    assert!(!scope.contains("x"));
}

#[test]
fn scope_from_iterator() {
    let scope: Scope = vec![("a", 1_i64), ("b", 2_i64)].into_iter().collect();
    assert_eq!(scope.len(), 2);
    assert_eq!(scope.get("a").and_then(|v| v.as_f64()), Some(1.0));
}
