//! Compile an expression once, then evaluate it against a few different environments.
//!
//! Run with `cargo run --example eligibility`.

use exprlang::{Engine, Scope, Value};

fn main() {
    let mut engine = Engine::new();
    engine.register_fn("min_age", |_args: &[Value]| Ok(Value::Num(18.0)));

    let expr = engine
        .compile("age >= min_age() && (country in ('US', 'CA', 'UK') || has_waiver) && !banned")
        .unwrap();

    println!("referenced vars: {:?}", expr.vars());

    let applicants = [
        ("Alice", 21_i64, "US", false, false),
        ("Bob", 16_i64, "CA", false, false),
        ("Carmen", 15_i64, "DE", true, false),
        ("Dana", 30_i64, "DE", false, true),
    ];

    for (name, age, country, has_waiver, banned) in applicants {
        let mut scope = Scope::new();
        scope.push("age", age);
        scope.push("country", country);
        scope.push("has_waiver", has_waiver);
        scope.push("banned", banned);

        match expr.evaluate(&scope) {
            Ok(v) => println!("{name}: eligible = {}", v.as_bool().unwrap_or(false)),
            Err(e) => println!("{name}: error: {e}"),
        }
    }
}
