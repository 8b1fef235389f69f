/// Mathematical builtins: trigonometry, roots, rounding and constants.
pub mod builtin;
/// Binary encoding helpers: `hex`, `bytes`, `utf8` and `byteat`.
pub mod bytes;
/// The `clamp` function implementation.
///
/// Restricts a value to an inclusive range.
pub mod clamp;
/// The `if` function: evaluates one of two branches.
pub mod conditional;
/// The two-argument logarithm.
pub mod log;
/// `min` and `max` function implementations.
pub mod min_max;
/// `random` in its three arities.
pub mod random;
/// Function descriptors and the name and arity lookup used by the compiler.
pub mod registry;
/// String functions.
pub mod text;
