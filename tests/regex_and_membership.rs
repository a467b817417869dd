use exprlang::{Engine, Scope};

#[test]
fn regex_match_against_a_literal_pattern() {
    let engine = Engine::new();
    let mut scope = Scope::new();
    scope.push("name", "abc");
    let expr = engine.compile("name =~ '^a'").unwrap();
    assert_eq!(expr.evaluate(&scope).unwrap().as_bool(), Some(true));
}

#[test]
fn negated_regex_match() {
    let engine = Engine::new();
    let scope = Scope::new();
    let expr = engine.compile("'a' !~ '^b'").unwrap();
    assert_eq!(expr.evaluate(&scope).unwrap().as_bool(), Some(true));
}

#[test]
fn invalid_regex_literal_fails_to_compile() {
    let engine = Engine::new();
    let err = engine.compile("name =~ '('").unwrap_err();
    assert!(matches!(*err, exprlang::EvalAltResult::PlanError(_, _)));
}

#[test]
fn regex_operand_must_be_a_string() {
    let engine = Engine::new();
    let expr = engine.compile("1 =~ 'x'").unwrap();
    let err = expr.evaluate(&Scope::new()).unwrap_err();
    assert!(err.to_string().contains("cannot be used with the comparator"));
}

#[test]
fn membership_against_a_parenthesized_list() {
    let engine = Engine::new();
    let expr = engine.compile("1 in (1, 2, 3)").unwrap();
    assert_eq!(expr.evaluate(&Scope::new()).unwrap().as_bool(), Some(true));
}

#[test]
fn membership_is_false_when_absent() {
    let engine = Engine::new();
    let expr = engine.compile("9 in (1, 2, 3)").unwrap();
    assert_eq!(expr.evaluate(&Scope::new()).unwrap().as_bool(), Some(false));
}

#[test]
fn single_parenthesized_value_is_grouping_not_an_array() {
    let engine = Engine::new();
    let expr = engine.compile("(1 + 1) * 2").unwrap();
    assert_eq!(expr.evaluate(&Scope::new()).unwrap().as_f64(), Some(4.0));
}

#[test]
fn membership_right_hand_side_must_be_an_array() {
    let engine = Engine::new();
    let expr = engine.compile("1 in 2").unwrap();
    let err = expr.evaluate(&Scope::new()).unwrap_err();
    assert!(err.to_string().contains("cannot be used with the comparator"));
}
