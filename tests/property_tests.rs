use formulon::{compile, compiled::Bindings, node::value::Value};
use proptest::prelude::*;

/// Random arithmetic over two parameters and small integer literals.
fn arithmetic() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![(0_i64..10).prop_map(|n| n.to_string()),
                           Just("x".to_string()),
                           Just("y".to_string()),];

    leaf.prop_recursive(4, 32, 3, |inner| {
            prop_oneof![(inner.clone(), prop::sample::select(vec!["+", "-", "*", "/", "%", "^"]), inner.clone())
                            .prop_map(|(left, op, right)| format!("({left} {op} {right})")),
                        inner.clone().prop_map(|e| format!("-{e}")),
                        (prop::sample::select(vec!["min", "max"]), prop::collection::vec(inner.clone(), 2..4))
                            .prop_map(|(f, args)| format!("{f}({})", args.join(", "))),
                        inner.prop_map(|e| format!("abs({e})")),]
        })
}

proptest! {
    /// The compiler returns `Ok` or `Err` for any text, and never panics.
    #[test]
    fn compile_does_not_panic(s in "\\PC*") {
        let _ = compile(&s);
    }

    /// Same for text made mostly of the characters the grammar cares about.
    #[test]
    fn compile_does_not_panic_on_grammar_soup(s in r#"[a-z0-9 +*/%^()<>=!&|,."\\-]{0,40}"#) {
        if let Ok(expression) = compile(&s) {
            let _ = expression.invoke(&Bindings::new());
        }
    }

    /// Compiling the same text twice gives the same tree, manifest and error.
    #[test]
    fn compilation_is_deterministic(s in r#"[a-z0-9 +*/%^()<>=!&|,."-]{0,40}"#) {
        match (compile(&s), compile(&s)) {
            (Ok(first), Ok(second)) => {
                prop_assert_eq!(first.root(), second.root());
                prop_assert_eq!(first.parameters(), second.parameters());
            },
            (Err(first), Err(second)) => prop_assert_eq!(first, second),
            _ => prop_assert!(false, "'{}' compiled only once", s),
        }
    }

    /// Simplifying an already simplified tree changes nothing.
    #[test]
    fn simplify_is_idempotent(source in arithmetic()) {
        let expression = compile(&source).unwrap();
        let root = expression.root();
        prop_assert_eq!(&root.simplify(), root);
    }

    /// Folding with every parameter bound computes what invocation computes.
    #[test]
    fn specialization_agrees_with_invocation(source in arithmetic(), x in -5_i64..5, y in -5_i64..5) {
        let expression = compile(&source).unwrap();
        let bindings = Bindings::new().with("x", x).with("y", y);

        let specialized = expression.specialize(&bindings).unwrap();
        prop_assert!(specialized.parameters().is_empty());

        match expression.invoke(&bindings) {
            Ok(value) => prop_assert_eq!(specialized.root().as_constant(), Some(value)),
            Err(error) => prop_assert_eq!(specialized.invoke(&Bindings::new()).unwrap_err(), error),
        }
    }

    /// Integer-only arithmetic without division never produces a float.
    #[test]
    fn integer_arithmetic_stays_integral(a in -1000_i64..1000, b in -1000_i64..1000, c in -1000_i64..1000) {
        let expression = compile("a * b + c - a").unwrap();
        let bindings = Bindings::new().with("a", a).with("b", b).with("c", c);
        prop_assert_eq!(expression.invoke(&bindings).unwrap(), Value::Integer(a * b + c - a));
    }
}
