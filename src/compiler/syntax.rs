use std::sync::Arc;

use crate::{
    compiler::{
        constants::ConstantInterner,
        literal::Literal,
        locator::{Occurrence, OperatorLocator},
        parameters::ParameterRegistry,
        symbol::{SymbolKind, SymbolTable},
    },
    error::{CompileError, CompileResult},
    function::registry::FunctionRegistry,
    grammar::GrammarConfig,
    node::{
        core::{ConstantNode, Operation},
        operator::{BinaryOperator, UnaryOperator},
    },
};

/// An expression tree before parameter kinds are known.
///
/// Operations are already resolved; only the typing is missing.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// An interned constant.
    Constant(Arc<ConstantNode>),
    /// A parameter, by name.
    Parameter(Arc<str>),
    /// An operator or function application.
    Operation {
        /// What is applied.
        operation: Operation,
        /// The operands.
        arguments: Vec<Self>,
    },
}

impl Expr {
    fn operation(operation: Operation, arguments: Vec<Self>) -> Self {
        Self::Operation { operation,
                          arguments }
    }

    /// Calls `visit` for every parameter occurrence, left to right.
    pub fn visit_parameters(&self, visit: &mut impl FnMut(&str)) {
        match self {
            Self::Constant(_) => {},
            Self::Parameter(name) => visit(name),
            Self::Operation { arguments, .. } => {
                for argument in arguments {
                    argument.visit_parameters(visit);
                }
            },
        }
    }
}

/// Turns the symbols of a resolved expression into one untyped tree.
pub struct TreeBuilder<'a> {
    grammar:    &'a GrammarConfig,
    locator:    &'a OperatorLocator,
    functions:  &'a FunctionRegistry,
    constants:  &'a mut ConstantInterner,
    parameters: &'a mut ParameterRegistry,
}

enum Element<'t> {
    Operand(&'t str),
    Operator(&'t Occurrence),
}

impl<'a> TreeBuilder<'a> {
    /// Creates a builder over the compile-local tables.
    pub const fn new(grammar: &'a GrammarConfig,
                     locator: &'a OperatorLocator,
                     functions: &'a FunctionRegistry,
                     constants: &'a mut ConstantInterner,
                     parameters: &'a mut ParameterRegistry)
                     -> Self {
        Self { grammar,
               locator,
               functions,
               constants,
               parameters }
    }

    /// Builds the tree of every symbol in dependency order and returns the
    /// root's.
    ///
    /// Parameters are advertised in the order they appear in the source, which
    /// fixes their frame slots.
    ///
    /// # Errors
    /// `Syntax` for malformed operator sequences and unrecognized operands,
    /// and the function registry's errors for unresolvable calls.
    pub fn build(&mut self, symbols: &SymbolTable) -> CompileResult<Expr> {
        let mut trees: Vec<Expr> = Vec::with_capacity(symbols.len());

        for (id, symbol) in symbols.iter() {
            let tree = match &symbol.kind {
                SymbolKind::Expression { text, .. } => self.parse_flat(text, symbols, &trees)?,
                SymbolKind::Call { function, arguments } => {
                    let arguments = arguments.iter()
                                             .map(|argument| trees.get(argument.0).cloned())
                                             .collect::<Option<Vec<_>>>()
                                             .ok_or_else(|| {
                                                 CompileError::syntax(format!("call of '{function}' refers to \
                                                                               an unresolved argument"))
                                             })?;
                    let factory = self.functions.resolve(function, arguments.len())?;
                    factory.build(arguments, |operation, children| {
                               Ok::<_, CompileError>(Expr::operation(operation, children))
                           })?
                },
            };
            log::trace!("symbol {} ({:?}) built", symbol.name, id);
            trees.push(tree);
        }

        let root = symbols.root()
                          .and_then(|root| trees.get(root.0).cloned())
                          .ok_or_else(|| CompileError::syntax("empty expression"))?;
        root.visit_parameters(&mut |name| {
                self.parameters.advertise(name);
            });
        Ok(root)
    }

    /// Parses parenthesis-free text: operands separated by binary operators,
    /// each operand optionally preceded by prefix operators.
    fn parse_flat(&mut self, text: &str, symbols: &SymbolTable, trees: &[Expr]) -> CompileResult<Expr> {
        let occurrences = self.locator.locate(text);

        let mut elements = Vec::with_capacity(occurrences.len() * 2 + 1);
        let mut position = 0;
        for occurrence in &occurrences {
            let gap = text[position..occurrence.index].trim();
            if !gap.is_empty() {
                elements.push(Element::Operand(gap));
            }
            elements.push(Element::Operator(occurrence));
            position = occurrence.end();
        }
        let tail = text[position..].trim();
        if !tail.is_empty() {
            elements.push(Element::Operand(tail));
        }

        let mut operands: Vec<Expr> = Vec::new();
        let mut operators: Vec<(BinaryOperator, u32)> = Vec::new();
        let mut prefixes: Vec<UnaryOperator> = Vec::new();
        let mut expecting_operand = true;

        for element in elements {
            match (element, expecting_operand) {
                (Element::Operand(operand), true) => {
                    let mut leaf = self.leaf(operand, symbols, trees)?;
                    while let Some(prefix) = prefixes.pop() {
                        leaf = Expr::operation(Operation::Unary(prefix), vec![leaf]);
                    }
                    operands.push(leaf);
                    expecting_operand = false;
                },
                (Element::Operand(operand), false) => {
                    return Err(CompileError::syntax(format!("missing operator before '{operand}'")));
                },
                (Element::Operator(occurrence), true) => {
                    let prefix = self.grammar
                                     .is_prefix(&occurrence.token)
                                     .then(|| UnaryOperator::from_token(&occurrence.token))
                                     .flatten()
                                     .ok_or_else(|| {
                                         CompileError::syntax(format!("'{}' is missing its left operand",
                                                                      occurrence.token))
                                     })?;
                    prefixes.push(prefix);
                },
                (Element::Operator(occurrence), false) => {
                    let (Some(level), Some(operator)) =
                        (occurrence.level, BinaryOperator::from_token(&occurrence.token))
                    else {
                        return Err(CompileError::syntax(format!("'{}' cannot follow an operand",
                                                                occurrence.token)));
                    };
                    while let Some((top, top_level)) = operators.last().copied() {
                        let looser = self.grammar.precedence.looser(level, top_level);
                        let same_left = top_level == level && !operator.is_right_associative();
                        if !(looser || same_left) {
                            break;
                        }
                        operators.pop();
                        reduce(&mut operands, top)?;
                    }
                    operators.push((operator, level));
                    expecting_operand = true;
                },
            }
        }

        if expecting_operand {
            let details = match occurrences.last() {
                Some(last) if !operands.is_empty() || !prefixes.is_empty() => {
                    format!("'{}' is missing its right operand", last.token)
                },
                _ => "empty expression".to_string(),
            };
            return Err(CompileError::syntax(details));
        }

        while let Some((operator, _)) = operators.pop() {
            reduce(&mut operands, operator)?;
        }
        match (operands.pop(), operands.is_empty()) {
            (Some(tree), true) => Ok(tree),
            _ => Err(CompileError::syntax(format!("malformed expression '{text}'"))),
        }
    }

    /// Classifies an operand: a symbol, a constant, a new literal or a
    /// parameter name, in that order.
    fn leaf(&mut self, operand: &str, symbols: &SymbolTable, trees: &[Expr]) -> CompileResult<Expr> {
        if let Some(id) = symbols.lookup(operand) {
            return trees.get(id.0)
                        .cloned()
                        .ok_or_else(|| CompileError::syntax(format!("'{operand}' is used before it is defined")));
        }
        if let Some(constant) = self.constants.get(operand) {
            return Ok(Expr::Constant(constant));
        }
        if let Some(name) = self.constants.intern(operand)?
           && let Some(constant) = self.constants.get(&name)
        {
            return Ok(Expr::Constant(constant));
        }
        match Literal::classify(operand)? {
            Some(Literal::Identifier(name)) => Ok(Expr::Parameter(Arc::from(name))),
            _ => Err(CompileError::syntax(format!("unrecognized operand '{operand}'"))),
        }
    }
}

fn reduce(operands: &mut Vec<Expr>, operator: BinaryOperator) -> CompileResult<()> {
    let (Some(right), Some(left)) = (operands.pop(), operands.pop()) else {
        return Err(CompileError::syntax(format!("'{operator}' is missing an operand")));
    };
    operands.push(Expr::operation(Operation::Binary(operator), vec![left, right]));
    Ok(())
}
