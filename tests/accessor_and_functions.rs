use exprlang::{EvalAltResult, HostIntrospect, Scope, Value};

#[derive(Debug)]
struct Nested {
    funk: String,
}

impl HostIntrospect for Nested {
    fn field(&self, name: &str) -> Result<Option<Value>, EvalAltResult> {
        match name {
            "Funk" => Ok(Some(Value::Str(self.funk.as_str().into()))),
            _ => Ok(None),
        }
    }
}

#[derive(Debug)]
struct Foo {
    nested: Nested,
    secret: i64,
}

impl HostIntrospect for Foo {
    fn field(&self, name: &str) -> Result<Option<Value>, EvalAltResult> {
        match name {
            "Nested" => Ok(Some(Value::Host(std::sync::Arc::new(Nested {
                funk: self.nested.funk.clone(),
            })))),
            "secret" => Err(exprlang::unexported("secret")),
            _ => Ok(None),
        }
    }

    fn call(&self, name: &str, args: &[Value]) -> Result<Value, EvalAltResult> {
        match name {
            "add_secret" => {
                exprlang::check_arity("add_secret", args, 1)?;
                let delta: i64 = exprlang::coerce_to_integer(&args[0])?;
                Ok(Value::Num((self.secret + delta) as f64))
            }
            _ => Err(EvalAltResult::NameError(
                format!("No method or field '{name}'"),
                exprlang::Position::NONE,
            )),
        }
    }
}

fn foo_scope() -> Scope {
    let mut scope = Scope::new();
    scope.push(
        "foo",
        Value::Host(std::sync::Arc::new(Foo {
            nested: Nested { funk: "x".into() },
            secret: 100,
        })),
    );
    scope
}

#[test]
fn accessor_reads_a_nested_field() {
    let engine = exprlang::Engine::new();
    let expr = engine.compile("foo.Nested.Funk").unwrap();
    assert_eq!(expr.evaluate(&foo_scope()).unwrap().as_str(), Some("x"));
}

#[test]
fn accessor_to_a_nonexistent_member_is_a_name_error() {
    let engine = exprlang::Engine::new();
    let expr = engine.compile("foo.NotExist").unwrap();
    let err = expr.evaluate(&foo_scope()).unwrap_err();
    assert!(err.to_string().contains("No method or field"));
}

#[test]
fn accessor_to_an_unexported_field_is_an_access_error() {
    let engine = exprlang::Engine::new();
    let expr = engine.compile("foo.secret").unwrap();
    let err = expr.evaluate(&foo_scope()).unwrap_err();
    assert!(err.to_string().contains("Unable to access unexported 'secret'"));
}

#[test]
fn accessor_call_dispatches_to_call_with_coerced_arguments() {
    let engine = exprlang::Engine::new();
    let expr = engine.compile("foo.add_secret(5)").unwrap();
    assert_eq!(expr.evaluate(&foo_scope()).unwrap().as_f64(), Some(105.0));
}

#[test]
fn accessor_call_with_wrong_arity_is_an_arity_error() {
    let engine = exprlang::Engine::new();
    let expr = engine.compile("foo.add_secret(1, 2)").unwrap();
    let err = expr.evaluate(&foo_scope()).unwrap_err();
    assert!(err.to_string().contains("too many arguments"));
}

#[test]
fn registered_function_is_callable() {
    let mut engine = exprlang::Engine::new();
    engine.register_fn("double", |args: &[Value]| {
        Ok(Value::Num(args[0].as_f64().unwrap_or(0.0) * 2.0))
    });
    let expr = engine.compile("double(21)").unwrap();
    assert_eq!(expr.evaluate(&Scope::new()).unwrap().as_f64(), Some(42.0));
}

#[test]
fn registered_function_arguments_are_evaluated_left_to_right() {
    let mut engine = exprlang::Engine::new();
    engine.register_fn("concat3", |args: &[Value]| {
        let joined = args
            .iter()
            .map(|v| v.as_str().unwrap_or_default())
            .collect::<Vec<_>>()
            .join("");
        Ok(Value::Str(joined.into()))
    });
    let expr = engine.compile("concat3('a', 'b', 'c')").unwrap();
    assert_eq!(
        expr.evaluate(&Scope::new()).unwrap().as_str(),
        Some("abc")
    );
}

#[test]
fn host_function_error_is_surfaced_as_host_error() {
    let mut engine = exprlang::Engine::new();
    engine.register_fn("boom", |_args: &[Value]| {
        Err(EvalAltResult::HostError(
            "kaboom".into(),
            exprlang::Position::NONE,
        ))
    });
    let expr = engine.compile("boom()").unwrap();
    let err = expr.evaluate(&Scope::new()).unwrap_err();
    assert!(err.to_string().contains("kaboom"));
}
