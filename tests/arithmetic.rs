use exprlang::{Engine, Scope};

#[test]
fn operator_precedence() {
    let engine = Engine::new();
    let expr = engine.compile("1 + 2 * 3").unwrap();
    assert_eq!(expr.evaluate(&Scope::new()).unwrap().as_f64(), Some(7.0));
}

#[test]
fn grouping_overrides_precedence() {
    let engine = Engine::new();
    let expr = engine.compile("(1 + 2) * 3").unwrap();
    assert_eq!(expr.evaluate(&Scope::new()).unwrap().as_f64(), Some(9.0));
}

#[test]
fn hex_literal() {
    let engine = Engine::new();
    let expr = engine.compile("0x10 + 1").unwrap();
    assert_eq!(expr.evaluate(&Scope::new()).unwrap().as_f64(), Some(17.0));
}

#[test]
fn hex_literal_max_u64_widens_without_a_signed_intermediate() {
    let engine = Engine::new();
    let expr = engine.compile("0xFFFFFFFFFFFFFFFF").unwrap();
    assert_eq!(
        expr.evaluate(&Scope::new()).unwrap().as_f64(),
        Some(0xFFFF_FFFF_FFFF_FFFFu64 as f64)
    );
}

#[test]
fn division_and_modulus() {
    let engine = Engine::new();
    assert_eq!(
        engine.compile("7 / 2").unwrap().evaluate(&Scope::new()).unwrap().as_f64(),
        Some(3.5)
    );
    assert_eq!(
        engine.compile("7 % 2").unwrap().evaluate(&Scope::new()).unwrap().as_f64(),
        Some(1.0)
    );
}

#[test]
fn modulus_by_zero_is_nan_not_an_error() {
    let engine = Engine::new();
    let expr = engine.compile("1 % 0").unwrap();
    let result = expr.evaluate(&Scope::new()).unwrap().as_f64().unwrap();
    assert!(result.is_nan());
}

#[test]
fn exponent_is_right_associative() {
    let engine = Engine::new();
    let expr = engine.compile("2 ** 3 ** 2").unwrap();
    // right-assoc: 2 ** (3 ** 2) = 2 ** 9 = 512, not (2 ** 3) ** 2 = 64
    assert_eq!(expr.evaluate(&Scope::new()).unwrap().as_f64(), Some(512.0));
}

#[test]
fn exponent_truncates_non_integral_operands_before_computing() {
    let engine = Engine::new();
    // base and exponent both truncate to signed 64-bit first: 2.9 ** 2.9 becomes 2 ** 2 = 4.0,
    // not the raw floating-point power (which would be ~8.41).
    let expr = engine.compile("2.9 ** 2.9").unwrap();
    assert_eq!(expr.evaluate(&Scope::new()).unwrap().as_f64(), Some(4.0));
}

#[test]
fn unary_minus_after_binary_operator() {
    let engine = Engine::new();
    let expr = engine.compile("5 - -3").unwrap();
    assert_eq!(expr.evaluate(&Scope::new()).unwrap().as_f64(), Some(8.0));
}

#[test]
fn addition_is_commutative_for_numbers() {
    let engine = Engine::new();
    let mut scope = Scope::new();
    scope.push("x", 3.5);
    scope.push("y", 9.25);
    let a = engine.compile("x + y").unwrap().evaluate(&scope).unwrap().as_f64();
    let b = engine.compile("y + x").unwrap().evaluate(&scope).unwrap().as_f64();
    assert_eq!(a, b);
}

#[test]
fn string_plus_is_not_commutative() {
    let engine = Engine::new();
    let scope = Scope::new();
    let a = engine
        .compile("'abc' + 'de'")
        .unwrap()
        .evaluate(&scope)
        .unwrap()
        .as_str()
        .unwrap()
        .to_string();
    let b = engine
        .compile("'de' + 'abc'")
        .unwrap()
        .evaluate(&scope)
        .unwrap()
        .as_str()
        .unwrap()
        .to_string();
    assert_ne!(a, b);
    assert_eq!(a, "abcde");
}

#[test]
fn pure_evaluation_is_repeatable() {
    let engine = Engine::new();
    let expr = engine.compile("1 + 2 * 3 - 4 / 2").unwrap();
    let scope = Scope::new();
    let a = expr.evaluate(&scope).unwrap().as_f64();
    let b = expr.evaluate(&scope).unwrap().as_f64();
    assert_eq!(a, b);
}
