/// Compilation errors.
///
/// Defines every error that can be raised while turning source text into a
/// compiled expression: malformed syntax, unknown functions, incompatible
/// kinds and wrong argument counts. All of them are detected eagerly, before a
/// compiled expression exists.
pub mod compile_error;
/// Evaluation errors.
///
/// Contains the errors an invocation of a compiled expression can raise, such
/// as missing parameters, division by zero or out-of-domain arguments. They
/// never invalidate the compiled expression itself.
pub mod eval_error;

pub use compile_error::{CompileError, CompileResult};
pub use eval_error::{EvalError, EvalResult};
