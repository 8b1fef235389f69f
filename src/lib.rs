//! # formulon
//!
//! formulon compiles small typed expressions into reusable evaluators.
//! An expression is parsed, type checked and simplified once; the result can
//! then be invoked any number of times, from any number of threads, with
//! different parameter values.
//!
//! ```
//! use formulon::{compile, compiled::Bindings, node::{kind::ValueKind, value::Value}};
//!
//! let expression = compile("if(qty > 10, price * qty * 0.9, price * qty)").unwrap();
//!
//! let names = expression.parameters().iter().map(|p| p.name.as_str()).collect::<Vec<_>>();
//! assert_eq!(names, ["qty", "price"]);
//!
//! // One branch multiplies by a float, so the result is always a float.
//! assert_eq!(expression.return_kind(), ValueKind::FLOAT);
//!
//! let order = Bindings::new().with("qty", 20).with("price", 2.5);
//! assert_eq!(expression.invoke(&order).unwrap(), Value::Float(45.0));
//! ```

#![warn(
    clippy::redundant_clone,
    clippy::needless_pass_by_value,
    clippy::similar_names,
    clippy::large_enum_variant,
    clippy::string_lit_as_bytes,
    clippy::match_same_arms,
    clippy::cargo,
    clippy::nursery,
    clippy::perf,
    clippy::style,
    clippy::suspicious,
    clippy::correctness,
    clippy::complexity,
    clippy::pedantic,
    //missing_docs,
)]
#![allow(clippy::missing_errors_doc)]

use crate::{
    compiled::{Bindings, CompiledExpression},
    compiler::core::ExpressionCompiler,
    error::{CompileResult, EvalResult},
    grammar::GrammarConfig,
    node::value::Value,
};

/// The result of a compilation.
///
/// Holds the simplified tree, the ordered parameter manifest and the compiled
/// evaluator, and binds parameter values by name on every invocation.
pub mod compiled;
/// Turns source text into a [`CompiledExpression`].
///
/// # Responsibilities
/// - Resolves parentheses and calls into a flat symbol table.
/// - Finds operators and classifies operands into constants and parameters.
/// - Infers parameter kinds to a fixed point.
/// - Builds, simplifies and compiles the typed tree.
pub mod compiler;
/// Provides unified error types for compilation and evaluation.
///
/// Compile errors are raised once, by the single compile call. Evaluation
/// errors are raised per invocation and leave the compiled expression usable.
pub mod error;
/// Builtin functions and the registry that resolves calls by name and arity.
pub mod function;
/// The configurable surface syntax: punctuation, operator precedence levels
/// and prefix operators.
pub mod grammar;
/// The typed expression tree.
///
/// Defines values, kinds, operators, the signatures that type check them and
/// the nodes that fold and compile themselves.
pub mod node;
/// General utilities for safe numeric conversion and randomness.
///
/// # Responsibilities
/// - Convert between `i64`, `usize`, `u32` and `f64`, checked where data
///   would be lost.
/// - Order integers against floats exactly.
/// - Provide a lock-free random source for the `random` builtins.
pub mod util;

/// Compiles `source` with the default grammar and the builtin functions.
///
/// # Errors
/// Any [`CompileError`](error::CompileError).
///
/// # Examples
/// ```
/// use formulon::compile;
///
/// let expression = compile("2 + 3 * 4").unwrap();
/// assert_eq!(expression.root().to_string(), "14");
///
/// assert!(compile("2 +").is_err());
/// ```
pub fn compile(source: &str) -> CompileResult<CompiledExpression> {
    compile_with(source, GrammarConfig::default())
}

/// Compiles `source` with a custom grammar.
///
/// # Errors
/// The grammar's validation errors and any compile error.
///
/// # Examples
/// ```
/// use formulon::{compile_with, grammar::{GrammarConfig, Precedence}, node::value::Value,
///                compiled::Bindings};
///
/// // With higher levels binding tighter, `+` (level 2) binds before `*` (level 1).
/// let grammar = GrammarConfig::default().with_precedence(Precedence::HigherBindsTighter);
/// let expression = compile_with("2 + 3 * 4", grammar).unwrap();
///
/// assert_eq!(expression.invoke(&Bindings::new()).unwrap(), Value::Integer(20));
/// ```
pub fn compile_with(source: &str, grammar: GrammarConfig) -> CompileResult<CompiledExpression> {
    ExpressionCompiler::new(grammar)?.compile(source)
}

/// Compiles and invokes `source` once.
///
/// # Errors
/// Compile errors and evaluation errors, boxed.
///
/// # Examples
/// ```
/// use formulon::{compiled::Bindings, evaluate, node::value::Value};
///
/// let bindings = Bindings::new().with("name", "world");
/// let greeting = evaluate(r#""Hello, " + name + "!""#, &bindings).unwrap();
///
/// assert_eq!(greeting, Value::from("Hello, world!"));
/// ```
pub fn evaluate(source: &str, bindings: &Bindings) -> Result<Value, Box<dyn std::error::Error>> {
    let expression = compile(source)?;
    let value: EvalResult<Value> = expression.invoke(bindings);
    Ok(value?)
}
