use crate::node::kind::ValueKind;

/// Result type used by the evaluator and the built-in functions.
pub type EvalResult<T> = Result<T, EvalError>;

/// Represents all errors that can occur while invoking a compiled expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    /// A parameter listed in the manifest had no binding.
    #[error("Missing value for parameter '{name}'.")]
    MissingParameter {
        /// The parameter name.
        name: String,
    },
    /// A binding had a kind the parameter cannot accept.
    #[error("Parameter '{name}' expects a {expected} value, but a {found} value was supplied.")]
    ParameterKind {
        /// The parameter name.
        name:     String,
        /// The kind determined at compile time.
        expected: ValueKind,
        /// The kind of the supplied value.
        found:    ValueKind,
    },
    /// Attempted division (or remainder) by zero.
    #[error("Division by zero.")]
    DivisionByZero,
    /// Integer arithmetic overflowed.
    #[error("Integer overflow while computing the result.")]
    Overflow,
    /// An argument was outside the domain of a function.
    #[error("Invalid argument: {details}.")]
    InvalidArgument {
        /// Why the argument is invalid.
        details: String,
    },
    /// An index was outside a string or byte array.
    #[error("Index {index} is out of bounds for length {length}.")]
    IndexOutOfBounds {
        /// The requested index.
        index:  i64,
        /// The length of the indexed value.
        length: usize,
    },
    /// A value had a kind the operation cannot handle.
    #[error("Type mismatch: {details}.")]
    TypeMismatch {
        /// A description of the mismatch.
        details: String,
    },
}

impl EvalError {
    /// Builds an [`EvalError::InvalidArgument`] from anything printable.
    pub fn invalid_argument(details: impl Into<String>) -> Self {
        Self::InvalidArgument { details: details.into() }
    }
}
