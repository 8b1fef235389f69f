/// Interns literal tokens into shared constant nodes.
pub mod constants;
/// The expression compiler: drives every phase from source text to a
/// [`CompiledExpression`](crate::compiled::CompiledExpression).
pub mod core;
/// Fixed-point inference of parameter kinds.
pub mod inference;
/// The `logos` lexer that classifies a single operand.
pub mod literal;
/// Finds operator tokens in flat text.
pub mod locator;
/// The per-expression registry of named parameters.
pub mod parameters;
/// Rewrites parentheses and calls into a flat symbol table.
pub mod resolver;
/// Generated names and the symbol arena.
pub mod symbol;
/// Builds the untyped expression tree from resolved symbols.
pub mod syntax;
