use logos::Logos;

use crate::{
    error::{CompileError, CompileResult},
    node::value::{Value, decode_hex},
};

/// A single literal or name, as recognized in an operand.
///
/// Operands reach the classifier already stripped of operators and
/// parentheses, so an operand is valid only if it lexes as exactly one token.
#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Literal {
    /// Float literals, such as `3.5`, `.5`, `2.0` or `2.1e-10`.
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", parse_float)]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", parse_float)]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", parse_float)]
    Float(f64),
    /// Integer literals, such as `42`. Kept as text so that overflow can be
    /// reported instead of silently rejected.
    #[regex(r"[0-9]+", |lex| lex.slice().to_string())]
    Integer(String),
    /// Byte array literals: `0x` followed by hex digits, such as `0x00ff`.
    #[regex(r"0[xX][0-9a-fA-F]*", |lex| lex.slice()[2..].to_string())]
    Bytes(String),
    /// `true` or `false`.
    #[token("true", |_| true)]
    #[token("false", |_| false)]
    Bool(bool),
    /// Names of parameters, functions and generated symbols.
    #[regex(r"[\p{L}_][\p{L}\p{N}_]*", |lex| lex.slice().to_string())]
    Identifier(String),
}

/// Parses a floating-point literal from the current token slice.
fn parse_float(lex: &logos::Lexer<Literal>) -> Option<f64> {
    lex.slice().parse().ok()
}

impl Literal {
    /// Classifies a whole operand.
    ///
    /// Returns `Ok(None)` when the text is not exactly one literal or name.
    ///
    /// # Errors
    /// `Syntax` for integers that do not fit in an `i64` and for byte arrays
    /// with an odd number of hex digits.
    ///
    /// # Example
    /// ```
    /// use formulon::compiler::literal::Literal;
    ///
    /// assert_eq!(Literal::classify(" 42 ").unwrap(), Some(Literal::Integer("42".into())));
    /// assert_eq!(Literal::classify("1e3").unwrap(), Some(Literal::Float(1000.0)));
    /// assert_eq!(Literal::classify("rate").unwrap(), Some(Literal::Identifier("rate".into())));
    /// assert_eq!(Literal::classify("1 2").unwrap(), None);
    /// assert!(Literal::classify("0xabc").is_err());
    /// ```
    pub fn classify(text: &str) -> CompileResult<Option<Self>> {
        let mut lexer = Self::lexer(text);
        let Some(Ok(literal)) = lexer.next() else {
            return Ok(None);
        };
        if lexer.next().is_some() {
            return Ok(None);
        }

        match &literal {
            Self::Integer(digits) if digits.parse::<i64>().is_err() => {
                Err(CompileError::syntax(format!("integer literal {digits} is out of range")))
            },
            Self::Bytes(digits) if digits.len() % 2 != 0 => {
                Err(CompileError::syntax(format!("byte array literal 0x{digits} has an odd number of digits")))
            },
            _ => Ok(Some(literal)),
        }
    }

    /// The value of a literal, or `None` for identifiers.
    #[must_use]
    pub fn value(&self) -> Option<Value> {
        match self {
            Self::Float(f) => Some(Value::Float(*f)),
            Self::Integer(digits) => digits.parse().ok().map(Value::Integer),
            Self::Bytes(digits) => decode_hex(digits).map(Value::from),
            Self::Bool(b) => Some(Value::Boolean(*b)),
            Self::Identifier(_) => None,
        }
    }
}
