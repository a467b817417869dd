use exprlang::{Engine, Scope};

#[test]
fn bitwise_and_or_xor() {
    let engine = Engine::new();
    let scope = Scope::new();
    assert_eq!(
        engine.compile("6 & 3").unwrap().evaluate(&scope).unwrap().as_f64(),
        Some(2.0)
    );
    assert_eq!(
        engine.compile("6 | 1").unwrap().evaluate(&scope).unwrap().as_f64(),
        Some(7.0)
    );
    assert_eq!(
        engine.compile("6 ^ 3").unwrap().evaluate(&scope).unwrap().as_f64(),
        Some(5.0)
    );
}

#[test]
fn shifts() {
    let engine = Engine::new();
    let scope = Scope::new();
    assert_eq!(
        engine.compile("1 << 4").unwrap().evaluate(&scope).unwrap().as_f64(),
        Some(16.0)
    );
    assert_eq!(
        engine.compile("16 >> 4").unwrap().evaluate(&scope).unwrap().as_f64(),
        Some(1.0)
    );
}

#[test]
fn bitwise_not_prefix() {
    let engine = Engine::new();
    let expr = engine.compile("~0").unwrap();
    assert_eq!(expr.evaluate(&Scope::new()).unwrap().as_f64(), Some(-1.0));
}

#[test]
fn bitwise_and_binds_tighter_than_bitwise_or() {
    // `&` is multiplicative-tier, `|` is additive-tier: 1 | (2 & 3) = 1 | 2 = 3.
    let engine = Engine::new();
    let expr = engine.compile("1 | 2 & 3").unwrap();
    assert_eq!(expr.evaluate(&Scope::new()).unwrap().as_f64(), Some(3.0));
}

#[test]
fn bitwise_operands_must_be_numbers() {
    let engine = Engine::new();
    let expr = engine.compile("true & 1").unwrap();
    let err = expr.evaluate(&Scope::new()).unwrap_err();
    assert!(err.to_string().contains("cannot be used with the modifier"));
}
