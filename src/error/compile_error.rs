/// Result type used by every compilation phase.
pub type CompileResult<T> = Result<T, CompileError>;

/// Represents all errors that can occur while compiling an expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    /// The text is malformed: unbalanced parentheses, a dangling operator, an
    /// empty group or an operand that is neither a literal nor a name.
    #[error("Syntax error: {details}.")]
    Syntax {
        /// What was wrong with the text.
        details: String,
    },
    /// A function name (or operator token) has no registered implementation.
    #[error("Unknown symbol '{name}' with {arity} argument(s).")]
    UnknownSymbol {
        /// The name that could not be resolved.
        name:  String,
        /// The number of arguments it was used with.
        arity: usize,
    },
    /// Two usages of a parameter, or an operand and its operator, demand
    /// incompatible kinds.
    #[error("Type conflict: {details}.")]
    TypeConflict {
        /// A description of the conflicting kinds.
        details: String,
    },
    /// A known function was called with an unsupported number of arguments.
    #[error("Function '{name}' takes {} argument(s), but {found} were supplied.",
            join_arities(.expected))]
    Arity {
        /// The function name.
        name:     String,
        /// The argument counts the function supports.
        expected: Vec<usize>,
        /// The argument count that was supplied.
        found:    usize,
    },
}

impl CompileError {
    /// Builds a [`CompileError::Syntax`] from anything printable.
    ///
    /// # Example
    /// ```
    /// use formulon::error::CompileError;
    ///
    /// let e = CompileError::syntax("unexpected ')'");
    /// assert_eq!(e.to_string(), "Syntax error: unexpected ')'.");
    /// ```
    pub fn syntax(details: impl Into<String>) -> Self {
        Self::Syntax { details: details.into() }
    }

    /// Builds a [`CompileError::TypeConflict`] from anything printable.
    pub fn type_conflict(details: impl Into<String>) -> Self {
        Self::TypeConflict { details: details.into() }
    }
}

fn join_arities(arities: &[usize]) -> String {
    match arities {
        [] => "no".to_string(),
        [single] => single.to_string(),
        [init @ .., last] => {
            let init = init.iter().map(ToString::to_string).collect::<Vec<_>>();
            format!("{} or {last}", init.join(", "))
        },
    }
}
