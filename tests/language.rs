use std::fs;

use formulon::{
    compile,
    compiled::{Bindings, CompiledExpression},
    node::value::Value,
};
use walkdir::WalkDir;

/// One line of a `.case` file:
///
/// ```text
/// expression => expected
/// expression | name=value, other=value => expected
/// expression => error
/// ```
struct Case {
    line:       usize,
    expression: String,
    bindings:   Vec<(String, String)>,
    expected:   String,
}

#[test]
fn case_files_pass() {
    let mut count = 0;

    for entry in
        WalkDir::new("tests/cases").sort_by_file_name()
                                   .into_iter()
                                   .filter_map(Result::ok)
                                   .filter(|e| e.path().extension().is_some_and(|ext| ext == "case"))
    {
        let path = entry.path();
        let content =
            fs::read_to_string(path).unwrap_or_else(|e| panic!("Failed to read {path:?}: {e}"));

        for case in parse_cases(&content) {
            count += 1;
            if let Err(message) = run_case(&case) {
                panic!("{path:?}:{} `{}` failed: {message}", case.line, case.expression);
            }
        }
    }

    assert!(count > 0, "No cases found in tests/cases");
}

fn parse_cases(content: &str) -> Vec<Case> {
    content.lines()
           .enumerate()
           .filter(|(_, line)| !line.trim().is_empty() && !line.trim_start().starts_with('#'))
           .map(|(index, line)| {
               let (input, expected) =
                   line.rsplit_once(" => ")
                       .unwrap_or_else(|| panic!("line {} has no ' => ': {line}", index + 1));
               let (expression, bindings) = match input.split_once(" | ") {
                   Some((expression, bindings)) => (expression, parse_bindings(bindings)),
                   None => (input, Vec::new()),
               };
               Case { line:       index + 1,
                      expression: expression.trim().to_string(),
                      bindings,
                      expected:   expected.trim().to_string(), }
           })
           .collect()
}

fn parse_bindings(text: &str) -> Vec<(String, String)> {
    text.split(',')
        .map(|pair| {
            let (name, value) = pair.split_once('=')
                                    .unwrap_or_else(|| panic!("binding '{pair}' is not NAME=VALUE"));
            (name.trim().to_string(), value.trim().to_string())
        })
        .collect()
}

fn bind(expression: &CompiledExpression, case: &Case) -> Result<Bindings, String> {
    let mut bindings = Bindings::new();
    for (name, text) in &case.bindings {
        let kind = expression.parameters()
                             .iter()
                             .find(|p| &p.name == name)
                             .map(|p| p.kind)
                             .ok_or_else(|| format!("no parameter named '{name}'"))?;
        let value = Value::parse_as(kind, text).ok_or_else(|| format!("'{text}' is not a {kind}"))?;
        bindings.set(name.as_str(), value);
    }
    Ok(bindings)
}

fn run_case(case: &Case) -> Result<(), String> {
    let outcome = compile(&case.expression).map_err(|e| e.to_string())
                                           .and_then(|expression| {
                                               let bindings = bind(&expression, case)?;
                                               expression.invoke(&bindings).map_err(|e| e.to_string())
                                           });

    match (outcome, case.expected.as_str()) {
        (Err(_), "error") => Ok(()),
        (Ok(value), "error") => Err(format!("expected an error, got {value}")),
        (Ok(value), expected) if value.to_string() == expected => Ok(()),
        (Ok(value), expected) => Err(format!("expected {expected}, got {value}")),
        (Err(e), expected) => Err(format!("expected {expected}, got error: {e}")),
    }
}

fn assert_value(source: &str, bindings: &Bindings, expected: Value) {
    let expression = compile(source).unwrap_or_else(|e| panic!("'{source}' failed to compile: {e}"));
    match expression.invoke(bindings) {
        Ok(value) => assert_eq!(value, expected, "'{source}'"),
        Err(e) => panic!("'{source}' failed: {e}"),
    }
}

fn assert_failure(source: &str) {
    if let Ok(expression) = compile(source) {
        assert!(expression.invoke(&Bindings::new()).is_err(),
                "'{source}' succeeded but was expected to fail");
    }
}

#[test]
fn integer_and_float_results_keep_their_kind() {
    let none = Bindings::new();
    assert_value("6 / 3", &none, Value::Integer(2));
    assert_value("7 / 2", &none, Value::Float(3.5));
    assert_value("2 * 1.5", &none, Value::Float(3.0));
    assert_value("floor(2.9) + 1", &none, Value::Integer(3));
    assert_value("sqrt(x)", &Bindings::new().with("x", 9), Value::Float(3.0));
}

#[test]
fn parameters_are_bound_by_name() {
    let bindings = Bindings::new().with("width", 3).with("height", 4);
    assert_value("width * height", &bindings, Value::Integer(12));
    assert_value("hypot(width, height)", &bindings, Value::Float(5.0));
}

#[test]
fn strings_and_bytes() {
    let none = Bindings::new();
    assert_value(r#"upper("ab") + lower("CD")"#, &none, Value::from("ABcd"));
    assert_value("0x00 + 0xff", &none, Value::from(vec![0x00, 0xff]));
    assert_value(r#"len("a, b")"#, &none, Value::Integer(4));
}

#[test]
fn word_operators_need_word_boundaries() {
    let bindings = Bindings::new().with("brand", 1).with("order", 2);
    assert_value("brand + order", &bindings, Value::Integer(3));
}

#[test]
fn malformed_expressions_fail() {
    assert_failure("");
    assert_failure("   ");
    assert_failure("(1 + 2");
    assert_failure("1 + 2)");
    assert_failure("()");
    assert_failure("1, 2");
    assert_failure("max(1,)");
    assert_failure("1 +");
}

#[test]
fn runtime_failures_fail() {
    assert_failure("1 / 0");
    assert_failure("asin(2)");
    assert_failure("9223372036854775807 * 2");
    assert_failure("byteat(0x01, 3)");
}
