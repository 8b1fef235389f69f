use std::{collections::HashSet, sync::Arc, thread};

use formulon::{
    compile, compile_with,
    compiled::Bindings,
    compiler::{
        constants::ConstantInterner, core::ExpressionCompiler, locator::OperatorLocator,
        parameters::ParameterRegistry, resolver::Resolver, symbol::SymbolKind,
    },
    error::{CompileError, EvalError},
    function::registry::{FunctionBody, FunctionDescriptor, FunctionRegistry},
    grammar::{GrammarConfig, Precedence},
    node::{
        core::{Node, Operation},
        kind::{NumericMode, ValueKind},
        signature::{Requirement, Signature},
        value::Value,
    },
};

const SOURCES: &[&str] = &["2 + 3 * 4",
                           "x * x + 2 * x + 1",
                           "if(a > b, a, b) - min(a, b, 10)",
                           r#"upper(name) + "!""#,
                           "not (p and q) or p xor q",
                           "sqrt(x ^ 2 + y ^ 2)",
                           "random(10) + 1",
                           "round(price * 1.2, 2)",
                           "max(1, 2, 3) * abs(-4)",
                           "len(data) > 2 && byteat(data, 0) == 255",
                           "1 / 0"];

static IDENTITY: FunctionDescriptor =
    FunctionDescriptor { names:     &["f"],
                         signature: Signature::fixed(&[Requirement::Kind(ValueKind::NUMBER)], ValueKind::NUMBER),
                         body:      FunctionBody::Pure(|args| Ok(args[0].clone())),
                         variadic:  false, };

fn compiles(source: &str) -> formulon::compiled::CompiledExpression {
    compile(source).unwrap_or_else(|e| panic!("'{source}' failed to compile: {e}"))
}

fn constants_of(root: &Node) -> Vec<Node> {
    let mut constants = Vec::new();
    root.walk(&mut |node| {
            if matches!(node, Node::Constant(_)) {
                constants.push(node.clone());
            }
        });
    constants
}

#[test]
fn simplify_is_idempotent() {
    for source in SOURCES {
        let root = compiles(source).root().clone();
        let again = root.simplify();
        assert_eq!(again, root, "'{source}'");
        assert_eq!(again.to_string(), root.to_string(), "'{source}'");
    }
}

#[test]
fn compiling_twice_gives_equal_results() {
    for source in SOURCES {
        let first = compiles(source);
        let second = compiles(source);
        assert_eq!(first.root(), second.root(), "'{source}'");
        assert_eq!(first.parameters(), second.parameters(), "'{source}'");
        assert_eq!(first.return_kind(), second.return_kind(), "'{source}'");
    }
}

#[test]
fn constant_arithmetic_folds() {
    let expression = compiles("2 + 3 * 4");
    assert_eq!(expression.root().as_constant(), Some(Value::Integer(14)));
    assert_eq!(expression.return_kind(), ValueKind::INTEGER);
    assert!(expression.parameters().is_empty());
}

#[test]
fn numeric_and_boolean_use_of_one_parameter_conflicts() {
    let error = compile("x + 1 > 0 && x").unwrap_err();
    assert!(matches!(error, CompileError::TypeConflict { .. }), "{error:?}");

    let error = compile("if(flag, 1, 2) + flag").unwrap_err();
    assert!(matches!(error, CompileError::TypeConflict { .. }), "{error:?}");
}

#[test]
fn integer_and_float_use_of_one_parameter_conflicts() {
    let error = compile("byteat(0x01, i) + sqrt(i)").unwrap_err();
    assert!(matches!(error, CompileError::TypeConflict { .. }), "{error:?}");
}

#[test]
fn call_compiles_to_operation_and_group_to_its_content() {
    let mut functions = FunctionRegistry::with_builtins();
    functions.register(&IDENTITY);
    let compiler = ExpressionCompiler::with_functions(GrammarConfig::default(), functions).unwrap();

    let call = compiler.compile("f(x)").unwrap();
    match call.root() {
        Node::Operation(operation) => {
            assert!(matches!(operation.operation(), Operation::Function(d) if d.name() == "f"));
            assert!(matches!(&operation.children()[0], Node::Parameter(p) if &*p.name == "x"));
        },
        other => panic!("expected a call, found {other:?}"),
    }

    let group = compiler.compile("(x)").unwrap();
    assert!(matches!(group.root(), Node::Parameter(p) if &*p.name == "x"));

    let nested = compiler.compile("((((x))))").unwrap();
    assert_eq!(nested.root(), group.root());
}

#[test]
fn variadic_calls_fold_left() {
    let expression = compiles("max(1, 2, 3)");
    assert_eq!(expression.root().as_constant(), Some(Value::Integer(3)));

    let expression = compiles("min(a, b, c, d)");
    assert_eq!(expression.root().to_string(), "min(min(min(a, b), c), d)");
    let bindings = Bindings::new().with("a", 4).with("b", 9).with("c", -2).with("d", 0);
    assert_eq!(expression.invoke(&bindings).unwrap(), Value::Integer(-2));
}

#[test]
fn repeated_literals_share_one_constant_node() {
    let expression = compiles("5 + x * 5 - 5");
    let constants = constants_of(expression.root());
    assert_eq!(constants.len(), 3);

    let Node::Constant(first) = &constants[0] else { unreachable!() };
    assert_eq!(first.literal_text(), Some("5"));
    for constant in &constants[1..] {
        let Node::Constant(other) = constant else { unreachable!() };
        assert!(Arc::ptr_eq(first, other));
    }
}

#[test]
fn random_is_never_folded() {
    let expression = compiles("random(10)");
    assert!(matches!(expression.root(), Node::Operation(_)));
    assert_eq!(expression.return_kind(), ValueKind::INTEGER);

    let mut seen = HashSet::new();
    for _ in 0..200 {
        let Value::Integer(n) = expression.invoke(&Bindings::new()).unwrap() else {
            panic!("random(10) must produce an integer");
        };
        assert!((0..10).contains(&n));
        seen.insert(n);
    }
    assert!(seen.len() > 1);

    let between = compiles("random(-3, 3)");
    for _ in 0..100 {
        let Value::Integer(n) = between.invoke(&Bindings::new()).unwrap() else {
            panic!("random(lo, hi) must produce an integer");
        };
        assert!((-3..3).contains(&n));
    }

    let unit = compiles("random()");
    let Value::Float(x) = unit.invoke(&Bindings::new()).unwrap() else {
        panic!("random() must produce a float");
    };
    assert!((0.0..1.0).contains(&x));
}

#[test]
fn random_with_an_empty_range_fails_at_invocation() {
    let expression = compiles("random(0)");
    assert!(matches!(expression.invoke(&Bindings::new()),
                     Err(EvalError::InvalidArgument { .. })));
    assert!(matches!(compiles("random(3, 3)").invoke(&Bindings::new()),
                     Err(EvalError::InvalidArgument { .. })));
}

#[test]
fn manifest_lists_parameters_in_first_appearance_order_with_kinds() {
    let expression = compiles(r#"if(flag, repeat(label, count), "none")"#);
    let manifest = expression.parameters()
                             .iter()
                             .map(|p| (p.name.as_str(), p.kind))
                             .collect::<Vec<_>>();
    assert_eq!(manifest,
               [("flag", ValueKind::Boolean),
                ("label", ValueKind::String),
                ("count", ValueKind::INTEGER)]);
    assert_eq!(expression.return_kind(), ValueKind::String);

    let bindings = Bindings::new().with("flag", true).with("label", "ab").with("count", 3);
    assert_eq!(expression.invoke(&bindings).unwrap(), Value::from("ababab"));

    let bindings = Bindings::new().with("flag", false).with("label", "ab").with("count", 3);
    assert_eq!(expression.invoke(&bindings).unwrap(), Value::from("none"));
}

#[test]
fn unconstrained_parameters_default_to_numbers() {
    let expression = compiles("x");
    assert_eq!(expression.parameters()[0].kind, ValueKind::NUMBER);
    assert_eq!(expression.invoke(&Bindings::new().with("x", 2.5)).unwrap(), Value::Float(2.5));
}

#[test]
fn float_demands_reach_parameters_through_arithmetic() {
    let expression = compiles("sin(x * 2)");
    assert_eq!(expression.parameters()[0].kind, ValueKind::NUMBER);

    let expression = compiles("sqrt(x)");
    assert_eq!(expression.parameters()[0].kind, ValueKind::FLOAT);
    assert_eq!(expression.invoke(&Bindings::new().with("x", 4)).unwrap(), Value::Float(2.0));
}

#[test]
fn bindings_are_checked_against_the_manifest() {
    let expression = compiles("x + 1");

    let error = expression.invoke(&Bindings::new()).unwrap_err();
    assert_eq!(error, EvalError::MissingParameter { name: "x".to_string() });

    let error = expression.invoke(&Bindings::new().with("x", "one")).unwrap_err();
    assert_eq!(error,
               EvalError::ParameterKind { name:     "x".to_string(),
                                          expected: ValueKind::NUMBER,
                                          found:    ValueKind::String, });

    let extra = Bindings::new().with("x", 1).with("unused", true);
    assert_eq!(expression.invoke(&extra).unwrap(), Value::Integer(2));
}

#[test]
fn failed_invocation_leaves_expression_usable() {
    let expression = compiles("10 / x");
    assert_eq!(expression.invoke(&Bindings::new().with("x", 0)).unwrap_err(),
               EvalError::DivisionByZero);
    assert_eq!(expression.invoke(&Bindings::new().with("x", 2)).unwrap(), Value::Integer(5));
}

#[test]
fn failing_constant_subexpressions_are_left_for_invocation() {
    let expression = compiles("1 / 0");
    assert!(matches!(expression.root(), Node::Operation(_)));
    assert_eq!(expression.invoke(&Bindings::new()).unwrap_err(), EvalError::DivisionByZero);
}

#[test]
fn integer_division_overflow_is_an_error() {
    let expression = compiles("(-9223372036854775807 - 1) / -1");
    assert_eq!(expression.invoke(&Bindings::new()).unwrap_err(), EvalError::Overflow);

    let expression = compiles("a / b");
    let bindings = Bindings::new().with("a", i64::MIN).with("b", -1);
    assert_eq!(expression.invoke(&bindings).unwrap_err(), EvalError::Overflow);
    assert_eq!(expression.invoke(&Bindings::new().with("a", i64::MIN).with("b", 2)).unwrap(),
               Value::Integer(i64::MIN / 2));
}

#[test]
fn large_integers_mix_with_floats() {
    let none = Bindings::new();
    let value = |source: &str| compiles(source).invoke(&none).unwrap();

    assert_eq!(value("9007199254740993 > 1.5"), Value::Boolean(true));
    assert_eq!(value("9007199254740993 > 9007199254740992.0"), Value::Boolean(true));
    assert_eq!(value("9007199254740992.0 < 9007199254740993"), Value::Boolean(true));
    assert_eq!(value("9007199254740993 == 9007199254740992.0"), Value::Boolean(false));
    assert_eq!(value("9007199254740992 == 9007199254740992.0"), Value::Boolean(true));
    assert_eq!(value("9223372036854775807 < 1e300"), Value::Boolean(true));
    assert_eq!(value("9007199254740993 + 0.5"), Value::Float(9_007_199_254_740_992.0));

    let root = compiles("sqrt(x)");
    let big = Bindings::new().with("x", 9_007_199_254_740_993_i64);
    assert!(root.invoke(&big).is_ok());
}

#[test]
fn integer_powers_with_huge_exponents() {
    let none = Bindings::new();
    let value = |source: &str| compiles(source).invoke(&none);

    assert_eq!(value("1 ^ 5000000000"), Ok(Value::Integer(1)));
    assert_eq!(value("0 ^ 5000000000"), Ok(Value::Integer(0)));
    assert_eq!(value("0 ^ 0"), Ok(Value::Integer(1)));
    assert_eq!(value("(-1) ^ 5000000000"), Ok(Value::Integer(1)));
    assert_eq!(value("(-1) ^ 5000000001"), Ok(Value::Integer(-1)));
    assert_eq!(value("2 ^ 5000000000"), Err(EvalError::Overflow));
}

#[test]
fn function_registry_lists_names() {
    let functions = FunctionRegistry::builtin();
    let names = functions.names();

    assert!(names.windows(2).all(|pair| pair[0] < pair[1]));
    assert!(names.contains(&"random") && names.contains(&"rand"));
    assert!(functions.contains("substr"));
    assert!(!functions.contains("f"));

    let mut custom = FunctionRegistry::empty();
    custom.register(&IDENTITY);
    assert_eq!(custom.names(), ["f"]);
    assert_eq!(custom.arities("f"), [1]);
}

#[test]
fn decided_short_circuits_fold() {
    assert_eq!(compiles("false && x").root().as_constant(), Some(Value::Boolean(false)));
    assert_eq!(compiles("true || x").root().as_constant(), Some(Value::Boolean(true)));
    assert_eq!(compiles("if(1 > 0, y, 2)").root().to_string(), "y");
}

#[test]
fn specialize_binds_some_parameters() {
    let expression = compiles("a * x + b");
    let line = expression.specialize(&Bindings::new().with("a", 3).with("b", 4)).unwrap();

    assert_eq!(line.parameters().len(), 1);
    assert_eq!(line.parameters()[0].name, "x");
    assert_eq!(line.invoke(&Bindings::new().with("x", 2)).unwrap(), Value::Integer(10));

    let constant = line.specialize(&Bindings::new().with("x", 1)).unwrap();
    assert_eq!(constant.root().as_constant(), Some(Value::Integer(7)));

    assert!(expression.specialize(&Bindings::new().with("a", "text")).is_err());
}

#[test]
fn compiled_expressions_are_shared_between_threads() {
    let expression = compiles("n * n");

    thread::scope(|scope| {
        for n in 0..8_i64 {
            let expression = &expression;
            scope.spawn(move || {
                     let bindings = Bindings::new().with("n", n);
                     assert_eq!(expression.invoke(&bindings).unwrap(), Value::Integer(n * n));
                 });
        }
    });
}

#[test]
fn syntax_errors() {
    for source in ["",
                   "   ",
                   "(1 + 2",
                   "1 + 2)",
                   "()",
                   "max(1,)",
                   "(1, 2)",
                   "1, 2",
                   "2 +",
                   "* 2",
                   "1 2",
                   "x y",
                   r#""unterminated"#,
                   r#""called"(1)"#,
                   "2 (3)"]
    {
        let error = compile(source).unwrap_err();
        assert!(matches!(error, CompileError::Syntax { .. }), "'{source}': {error:?}");
    }
}

#[test]
fn unknown_functions_and_arity_errors() {
    assert_eq!(compile("nosuch(1)").unwrap_err(),
               CompileError::UnknownSymbol { name:  "nosuch".to_string(),
                                             arity: 1, });

    let error = compile("sqrt(1, 2)").unwrap_err();
    assert_eq!(error,
               CompileError::Arity { name:     "sqrt".to_string(),
                                     expected: vec![1],
                                     found:    2, });

    let error = compile("max(1)").unwrap_err();
    assert!(matches!(error, CompileError::Arity { .. }), "{error:?}");
}

#[test]
fn type_errors_between_operands() {
    for source in [r#""a" * 2"#, "true + 1", r#"sqrt("4")"#, "not 1", r#"1 < "2""#] {
        let error = compile(source).unwrap_err();
        assert!(matches!(error, CompileError::TypeConflict { .. }), "'{source}': {error:?}");
    }
}

#[test]
fn precedence_direction_is_configurable() {
    let lower = compile_with("2 + 3 * 4", GrammarConfig::default()).unwrap();
    assert_eq!(lower.root().as_constant(), Some(Value::Integer(14)));

    let grammar = GrammarConfig::default().with_precedence(Precedence::HigherBindsTighter);
    let higher = compile_with("2 + 3 * 4", grammar).unwrap();
    assert_eq!(higher.root().as_constant(), Some(Value::Integer(20)));
}

#[test]
fn custom_punctuation() {
    let grammar = GrammarConfig::default().with_parens("[", "]")
                                          .with_separator(";")
                                          .with_string_delimiter("'");
    let compiler = ExpressionCompiler::new(grammar).unwrap();

    let expression = compiler.compile("max[1; 2] * [3 + 1]").unwrap();
    assert_eq!(expression.root().as_constant(), Some(Value::Integer(8)));

    let error = compiler.compile("'it''s' + ' fine'").unwrap_err();
    assert!(matches!(error, CompileError::Syntax { .. }), "{error:?}");

    let expression = compiler.compile(r"'it\'s' + ' fine'").unwrap();
    assert_eq!(expression.root().as_constant(), Some(Value::from("it's fine")));
}

#[test]
fn invalid_grammars_are_rejected() {
    assert!(ExpressionCompiler::new(GrammarConfig::default().with_separator("")).is_err());
    assert!(ExpressionCompiler::new(GrammarConfig::default().with_parens("(", "(")).is_err());
    assert!(ExpressionCompiler::new(GrammarConfig::default().with_parens("a", ")")).is_err());
    assert!(ExpressionCompiler::new(GrammarConfig::default().with_prefix_operators(&["~"])).is_err());
}

#[test]
fn single_equals_can_be_added_to_the_grammar() {
    let mut grammar = GrammarConfig::default();
    grammar.operators.insert(4, "=");
    let compiler = ExpressionCompiler::new(grammar).unwrap();

    let expression = compiler.compile("1 + 1 = 2").unwrap();
    assert_eq!(expression.root().as_constant(), Some(Value::Boolean(true)));
    let expression = compiler.compile("1 <= 2 = true").unwrap();
    assert_eq!(expression.root().as_constant(), Some(Value::Boolean(true)));
}

#[test]
fn locator_prefers_longest_tokens_and_respects_words() {
    let locator = OperatorLocator::new(&GrammarConfig::default());

    let tokens = locator.locate("a ** b <> c")
                        .into_iter()
                        .map(|o| o.token)
                        .collect::<Vec<_>>();
    assert_eq!(tokens, ["**", "<>"]);

    let found = locator.locate("android or notes");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].token, "or");
    assert_eq!(found[0].level, Some(7));

    let found = locator.locate("not x");
    assert_eq!(found[0].level, None);

    assert!(locator.locate("1.5E+10").is_empty());
}

#[test]
fn resolver_builds_flat_symbols() {
    let grammar = GrammarConfig::default();
    let source = r#"concat("(", upper(s)) + (s)"#;
    let mut constants = ConstantInterner::new(source, "\"");
    let symbols = Resolver::new(&grammar).resolve(source, &mut constants).unwrap();

    let calls = symbols.iter()
                       .filter_map(|(_, symbol)| match &symbol.kind {
                           SymbolKind::Call { function, arguments } => Some((function.clone(), arguments.len())),
                           SymbolKind::Expression { .. } => None,
                       })
                       .collect::<Vec<_>>();
    assert_eq!(calls, [("upper".to_string(), 1), ("concat".to_string(), 2)]);
    assert_eq!(constants.len(), 1);

    let root = symbols.get(symbols.root().unwrap()).unwrap();
    let SymbolKind::Expression { dependencies, .. } = &root.kind else {
        panic!("the root is an expression");
    };
    assert_eq!(dependencies.len(), 2);
}

#[test]
fn resolver_handles_deep_nesting_without_recursion() {
    let depth = 5_000;
    let source = format!("{}x{}", "(".repeat(depth), ")".repeat(depth));
    let expression = compile(&source).unwrap();
    assert!(matches!(expression.root(), Node::Parameter(_)));
}

#[test]
fn generated_names_do_not_clash_with_user_names() {
    let expression = compiles("__s0 + (__k0 * 2)");
    let names = expression.parameters().iter().map(|p| p.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, ["__s0", "__k0"]);

    let bindings = Bindings::new().with("__s0", 1).with("__k0", 2);
    assert_eq!(expression.invoke(&bindings).unwrap(), Value::Integer(5));
}

#[test]
fn parameter_registry_narrows_and_conflicts() {
    let mut parameters = ParameterRegistry::new();
    parameters.advertise("x");
    parameters.advertise("s");
    let revision = parameters.revision();

    parameters.determine_numeric("x", NumericMode::Any).unwrap();
    parameters.determine_numeric("x", NumericMode::Float).unwrap();
    assert!(parameters.revision() > revision);
    assert_eq!(parameters.kind("x"), Some(ValueKind::FLOAT));

    let settled = parameters.revision();
    parameters.determine_numeric("x", NumericMode::Any).unwrap();
    assert_eq!(parameters.revision(), settled);

    assert!(parameters.determine_numeric("x", NumericMode::Integer).is_err());
    assert!(parameters.determine_string("x").is_err());

    parameters.determine_string("s").unwrap();
    assert!(parameters.determine_byte_array("s").is_err());

    let (nodes, manifest) = parameters.finalize();
    assert_eq!(nodes.len(), 2);
    assert_eq!(manifest[0].kind, ValueKind::FLOAT);
    assert_eq!(manifest[1].kind, ValueKind::String);
}
