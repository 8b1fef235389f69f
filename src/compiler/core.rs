use std::{collections::HashMap, sync::Arc};

use crate::{
    compiled::CompiledExpression,
    compiler::{
        constants::ConstantInterner,
        inference::infer_parameters,
        locator::OperatorLocator,
        parameters::ParameterRegistry,
        resolver::Resolver,
        syntax::{Expr, TreeBuilder},
    },
    error::{CompileError, CompileResult},
    function::registry::FunctionRegistry,
    grammar::GrammarConfig,
    node::core::{Node, ParameterNode},
};

/// Compiles expression source text into reusable evaluators.
///
/// A compiler holds only read-only configuration, so one instance can compile
/// any number of expressions, from any number of threads. All tables built
/// while compiling are local to a single [`ExpressionCompiler::compile`] call.
///
/// # Example
/// ```
/// use formulon::{compiled::Bindings, compiler::core::ExpressionCompiler, grammar::GrammarConfig,
///                node::value::Value};
///
/// let compiler = ExpressionCompiler::new(GrammarConfig::default()).unwrap();
/// let area = compiler.compile("pi() * r ^ 2").unwrap();
///
/// let r = Bindings::new().with("r", 2.0);
/// let result = area.invoke(&r).unwrap().as_float().unwrap();
/// assert!((result - 4.0 * std::f64::consts::PI).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct ExpressionCompiler {
    grammar:   GrammarConfig,
    functions: Arc<FunctionRegistry>,
    locator:   OperatorLocator,
}

impl ExpressionCompiler {
    /// Creates a compiler for `grammar` with the builtin functions.
    ///
    /// # Errors
    /// The grammar's validation errors.
    pub fn new(grammar: GrammarConfig) -> CompileResult<Self> {
        Self::with_registry(grammar, FunctionRegistry::builtin())
    }

    /// Creates a compiler with a custom function registry.
    ///
    /// # Errors
    /// The grammar's validation errors.
    pub fn with_functions(grammar: GrammarConfig, functions: FunctionRegistry) -> CompileResult<Self> {
        Self::with_registry(grammar, Arc::new(functions))
    }

    /// Creates a compiler sharing an existing function registry.
    ///
    /// # Errors
    /// The grammar's validation errors.
    pub fn with_registry(grammar: GrammarConfig, functions: Arc<FunctionRegistry>) -> CompileResult<Self> {
        grammar.validate()?;
        let locator = OperatorLocator::new(&grammar);
        Ok(Self { grammar,
                  functions,
                  locator })
    }

    /// Compiles `source`.
    ///
    /// The text is resolved into flat symbols, each symbol is tokenized and
    /// classified into an untyped tree, parameter kinds are inferred to a
    /// fixed point and fixed, and the typed tree is built, simplified and
    /// compiled.
    ///
    /// # Errors
    /// `Syntax`, `UnknownSymbol`, `Arity` or `TypeConflict`; no partial
    /// result is produced.
    pub fn compile(&self, source: &str) -> CompileResult<CompiledExpression> {
        log::debug!("compiling '{source}'");

        let mut constants = ConstantInterner::new(source, &self.grammar.string_delimiter);
        let symbols = Resolver::new(&self.grammar).resolve(source, &mut constants)?;

        let mut parameters = ParameterRegistry::new();
        let tree = TreeBuilder::new(&self.grammar,
                                    &self.locator,
                                    &self.functions,
                                    &mut constants,
                                    &mut parameters).build(&symbols)?;
        log::debug!("built untyped tree with {} constant(s) and {} parameter(s)",
                    constants.len(),
                    parameters.len());

        infer_parameters(&tree, &mut parameters)?;
        let (nodes, manifest) = parameters.finalize();

        let root = typed(&tree, &nodes)?;
        let simplified = root.simplify();
        log::debug!("simplified '{source}' to {simplified}");

        Ok(CompiledExpression::new(source, simplified, manifest))
    }
}

/// Builds the typed node for an untyped tree. Operation constructors type
/// check their children.
fn typed(expr: &Expr, parameters: &HashMap<Arc<str>, Arc<ParameterNode>>) -> CompileResult<Node> {
    match expr {
        Expr::Constant(constant) => Ok(Node::Constant(Arc::clone(constant))),
        Expr::Parameter(name) => {
            parameters.get(name)
                      .map(|parameter| Node::Parameter(Arc::clone(parameter)))
                      .ok_or_else(|| CompileError::syntax(format!("parameter '{name}' was never registered")))
        },
        Expr::Operation { operation, arguments } => {
            let children = arguments.iter()
                                    .map(|argument| typed(argument, parameters))
                                    .collect::<CompileResult<Vec<_>>>()?;
            Node::operation(*operation, children)
        },
    }
}
