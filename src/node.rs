/// Constant, parameter and operation nodes and their compilation.
///
/// Nodes are immutable and reference counted; a compiled tree can be shared
/// between threads and cloned cheaply.
pub mod core;
/// The static kinds values and nodes can have.
pub mod kind;
/// Binary and prefix operators with their evaluation rules.
pub mod operator;
/// Typing contracts of operators and functions.
pub mod signature;
/// Runtime values.
pub mod value;
