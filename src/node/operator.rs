use std::cmp::Ordering;

use crate::{
    error::{EvalError, EvalResult},
    node::{
        kind::{KindClass, ValueKind},
        signature::{Requirement, Returns, Signature},
        value::Value,
    },
    util::num::{cmp_i64_f64, i64_to_u32_checked},
};

/// Represents a binary operator.
///
/// Grammar tokens map onto these through [`BinaryOperator::from_token`]; the
/// precedence of each token is configuration, the operation behind it is not.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    /// Addition, or concatenation of strings and byte arrays (`+`)
    Add,
    /// Subtraction (`-`)
    Sub,
    /// Multiplication (`*`)
    Mul,
    /// Division (`/`)
    Div,
    /// Remainder (`%`)
    Mod,
    /// Exponentiation (`^`, `**`)
    Pow,
    /// Less than (`<`)
    Less,
    /// Less than or equal (`<=`)
    LessEqual,
    /// Greater than (`>`)
    Greater,
    /// Greater than or equal (`>=`)
    GreaterEqual,
    /// Equal to (`==`, `=`)
    Equal,
    /// Not equal to (`!=`, `<>`)
    NotEqual,
    /// Logical and (`&&`, `and`)
    And,
    /// Logical or (`||`, `or`)
    Or,
    /// Logical exclusive or (`xor`)
    Xor,
}

/// Represents a prefix operator.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    /// Arithmetic negation (`-x`).
    Negate,
    /// Numeric identity (`+x`).
    Plus,
    /// Logical NOT (`!x`, `not x`).
    Not,
}

const GROUP_PAIR: &[Requirement] = &[Requirement::Group, Requirement::Group];
const BOOLEAN_PAIR: &[Requirement] = &[Requirement::Kind(ValueKind::Boolean),
                                       Requirement::Kind(ValueKind::Boolean)];

const ADDITIVE: Signature = Signature::grouped(GROUP_PAIR,
                                               &[KindClass::Numeric,
                                                 KindClass::String,
                                                 KindClass::ByteArray],
                                               Returns::Group);
const ARITHMETIC: Signature = Signature::grouped(GROUP_PAIR, &[KindClass::Numeric], Returns::Group);
const WIDENING: Signature = Signature::grouped(GROUP_PAIR, &[KindClass::Numeric], Returns::Widened);
const ORDERING: Signature = Signature::grouped(GROUP_PAIR,
                                               &[KindClass::Numeric, KindClass::String],
                                               Returns::Kind(ValueKind::Boolean));
const EQUALITY: Signature = Signature::grouped(GROUP_PAIR, &[], Returns::Kind(ValueKind::Boolean));
const LOGIC: Signature = Signature::fixed(BOOLEAN_PAIR, ValueKind::Boolean);

const NUMERIC_PREFIX: Signature =
    Signature::grouped(&[Requirement::Group], &[KindClass::Numeric], Returns::Group);
const LOGIC_PREFIX: Signature =
    Signature::fixed(&[Requirement::Kind(ValueKind::Boolean)], ValueKind::Boolean);

impl BinaryOperator {
    /// Maps a grammar token to its operation.
    ///
    /// # Example
    /// ```
    /// use formulon::node::operator::BinaryOperator;
    ///
    /// assert_eq!(BinaryOperator::from_token("**"), Some(BinaryOperator::Pow));
    /// assert_eq!(BinaryOperator::from_token("and"), Some(BinaryOperator::And));
    /// assert_eq!(BinaryOperator::from_token("$"), None);
    /// ```
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        let op = match token {
            "+" => Self::Add,
            "-" => Self::Sub,
            "*" => Self::Mul,
            "/" => Self::Div,
            "%" => Self::Mod,
            "^" | "**" => Self::Pow,
            "<" => Self::Less,
            "<=" => Self::LessEqual,
            ">" => Self::Greater,
            ">=" => Self::GreaterEqual,
            "==" | "=" => Self::Equal,
            "!=" | "<>" => Self::NotEqual,
            "&&" | "and" => Self::And,
            "||" | "or" => Self::Or,
            "xor" => Self::Xor,
            _ => return None,
        };
        Some(op)
    }

    /// Returns the typing contract of this operator.
    #[must_use]
    pub const fn signature(self) -> Signature {
        match self {
            Self::Add => ADDITIVE,
            Self::Sub | Self::Mul | Self::Mod => ARITHMETIC,
            Self::Div | Self::Pow => WIDENING,
            Self::Less | Self::LessEqual | Self::Greater | Self::GreaterEqual => ORDERING,
            Self::Equal | Self::NotEqual => EQUALITY,
            Self::And | Self::Or | Self::Xor => LOGIC,
        }
    }

    /// Exponentiation groups to the right: `2 ^ 3 ^ 2` is `2 ^ (3 ^ 2)`.
    #[must_use]
    pub const fn is_right_associative(self) -> bool {
        matches!(self, Self::Pow)
    }

    /// Applies the operator to two evaluated operands.
    ///
    /// Integer arithmetic is checked. Division of two integers stays an
    /// integer when it is exact and becomes a float otherwise.
    ///
    /// # Example
    /// ```
    /// use formulon::node::{operator::BinaryOperator, value::Value};
    ///
    /// let r = BinaryOperator::Div.apply(&Value::Integer(10), &Value::Integer(4)).unwrap();
    /// assert_eq!(r, Value::Float(2.5));
    ///
    /// let r = BinaryOperator::Add.apply(&Value::from("ab"), &Value::from("cd")).unwrap();
    /// assert_eq!(r, Value::from("abcd"));
    /// ```
    pub fn apply(self, left: &Value, right: &Value) -> EvalResult<Value> {
        use Value::{Boolean, ByteArray, String};

        match self {
            Self::Add => match (left, right) {
                (String(a), String(b)) => Ok(Value::from(format!("{a}{b}"))),
                (ByteArray(a), ByteArray(b)) => Ok(Value::from([a.as_ref(), b.as_ref()].concat())),
                _ => arithmetic(left, right, i64::checked_add, |a, b| a + b),
            },
            Self::Sub => arithmetic(left, right, i64::checked_sub, |a, b| a - b),
            Self::Mul => arithmetic(left, right, i64::checked_mul, |a, b| a * b),
            Self::Div => divide(left, right),
            Self::Mod => remainder(left, right),
            Self::Pow => power(left, right),
            Self::Less => Ok(Boolean(compare(left, right)?.is_some_and(Ordering::is_lt))),
            Self::LessEqual => Ok(Boolean(compare(left, right)?.is_some_and(Ordering::is_le))),
            Self::Greater => Ok(Boolean(compare(left, right)?.is_some_and(Ordering::is_gt))),
            Self::GreaterEqual => Ok(Boolean(compare(left, right)?.is_some_and(Ordering::is_ge))),
            Self::Equal => Ok(Boolean(values_equal(left, right))),
            Self::NotEqual => Ok(Boolean(!values_equal(left, right))),
            Self::And => Ok(Boolean(left.as_bool()? && right.as_bool()?)),
            Self::Or => Ok(Boolean(left.as_bool()? || right.as_bool()?)),
            Self::Xor => Ok(Boolean(left.as_bool()? ^ right.as_bool()?)),
        }
    }
}

impl UnaryOperator {
    /// Maps a grammar token to its operation.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "-" => Some(Self::Negate),
            "+" => Some(Self::Plus),
            "!" | "not" => Some(Self::Not),
            _ => None,
        }
    }

    /// Returns the typing contract of this operator.
    #[must_use]
    pub const fn signature(self) -> Signature {
        match self {
            Self::Negate | Self::Plus => NUMERIC_PREFIX,
            Self::Not => LOGIC_PREFIX,
        }
    }

    /// Applies the operator to an evaluated operand.
    ///
    /// # Example
    /// ```
    /// use formulon::node::{operator::UnaryOperator, value::Value};
    ///
    /// assert_eq!(UnaryOperator::Negate.apply(&Value::Integer(4)).unwrap(), Value::Integer(-4));
    /// assert_eq!(UnaryOperator::Not.apply(&Value::Boolean(false)).unwrap(), Value::Boolean(true));
    /// ```
    pub fn apply(self, operand: &Value) -> EvalResult<Value> {
        match (self, operand) {
            (Self::Negate, Value::Integer(i)) => i.checked_neg().map(Value::Integer).ok_or(EvalError::Overflow),
            (Self::Negate, other) => Ok(Value::Float(-other.as_float()?)),
            (Self::Plus, Value::Integer(_) | Value::Float(_)) => Ok(operand.clone()),
            (Self::Plus, other) => other.as_float().map(Value::Float),
            (Self::Not, other) => Ok(Value::Boolean(!other.as_bool()?)),
        }
    }
}

fn arithmetic(left: &Value,
              right: &Value,
              integer_op: fn(i64, i64) -> Option<i64>,
              float_op: fn(f64, f64) -> f64)
              -> EvalResult<Value> {
    if let (Value::Integer(a), Value::Integer(b)) = (left, right) {
        return integer_op(*a, *b).map(Value::Integer).ok_or(EvalError::Overflow);
    }
    Ok(Value::Float(float_op(left.as_float()?, right.as_float()?)))
}

fn divide(left: &Value, right: &Value) -> EvalResult<Value> {
    if let (Value::Integer(a), Value::Integer(b)) = (left, right) {
        if *b == 0 {
            return Err(EvalError::DivisionByZero);
        }
        if a.checked_rem(*b).ok_or(EvalError::Overflow)? == 0 {
            return a.checked_div(*b).map(Value::Integer).ok_or(EvalError::Overflow);
        }
    }
    let divisor = right.as_float()?;
    if divisor == 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    Ok(Value::Float(left.as_float()? / divisor))
}

fn remainder(left: &Value, right: &Value) -> EvalResult<Value> {
    if let (Value::Integer(a), Value::Integer(b)) = (left, right) {
        if *b == 0 {
            return Err(EvalError::DivisionByZero);
        }
        return a.checked_rem(*b).map(Value::Integer).ok_or(EvalError::Overflow);
    }
    let divisor = right.as_float()?;
    if divisor == 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    Ok(Value::Float(left.as_float()? % divisor))
}

fn power(left: &Value, right: &Value) -> EvalResult<Value> {
    if let (Value::Integer(base), Value::Integer(exponent)) = (left, right)
       && *exponent >= 0
    {
        // Only 0, 1 and -1 survive exponents past u32::MAX.
        return match base {
            0 => Ok(Value::Integer(i64::from(*exponent == 0))),
            1 => Ok(Value::Integer(1)),
            -1 => Ok(Value::Integer(if exponent % 2 == 0 { 1 } else { -1 })),
            _ => {
                let exponent = i64_to_u32_checked(*exponent, EvalError::Overflow)?;
                base.checked_pow(exponent).map(Value::Integer).ok_or(EvalError::Overflow)
            },
        };
    }
    Ok(Value::Float(left.as_float()?.powf(right.as_float()?)))
}

/// Orders two values of the same class. `None` means unordered (NaN).
fn compare(left: &Value, right: &Value) -> EvalResult<Option<Ordering>> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Ok(Some(a.cmp(b))),
        (Value::Integer(a), Value::Float(b)) => Ok(cmp_i64_f64(*a, *b)),
        (Value::Float(a), Value::Integer(b)) => Ok(cmp_i64_f64(*b, *a).map(Ordering::reverse)),
        (Value::String(a), Value::String(b)) => Ok(Some(a.cmp(b))),
        _ => Ok(left.as_float()?.partial_cmp(&right.as_float()?)),
    }
}

/// Equality across the numeric sub-modes, exact everywhere else.
fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => a == b,
        (Value::Float(a), Value::Float(b)) => a == b,
        (Value::Integer(a), Value::Float(b)) | (Value::Float(b), Value::Integer(a)) => {
            cmp_i64_f64(*a, *b) == Some(Ordering::Equal)
        },
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Boolean(a), Value::Boolean(b)) => a == b,
        (Value::ByteArray(a), Value::ByteArray(b)) => a == b,
        _ => false,
    }
}

impl std::fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let operator = match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Pow => "^",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
        };
        write!(f, "{operator}")
    }
}

impl std::fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let operator = match self {
            Self::Negate => "-",
            Self::Plus => "+",
            Self::Not => "not ",
        };
        write!(f, "{operator}")
    }
}
