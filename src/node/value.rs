use std::{
    hash::{Hash, Hasher},
    sync::Arc,
};

use ordered_float::OrderedFloat;

use crate::{
    error::{EvalError, EvalResult},
    node::kind::{NumericMode, ValueKind},
    util::num::{f64_to_i64_checked, i64_to_f64},
};

/// Represents a runtime value.
///
/// Constants hold a `Value`, parameter bindings supply them, and every
/// invocation of a compiled expression produces one. Text and bytes are
/// reference counted so that cloning a value is cheap and values can be
/// shared between threads.
#[derive(Debug, Clone)]
pub enum Value {
    /// A 64-bit signed integer.
    Integer(i64),
    /// A 64-bit float.
    Float(f64),
    /// Text.
    String(Arc<str>),
    /// `true` or `false`.
    Boolean(bool),
    /// Raw bytes.
    ByteArray(Arc<[u8]>),
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(Arc::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(Arc::from(v))
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::ByteArray(Arc::from(v))
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Self::ByteArray(Arc::from(v))
    }
}

/// Floats compare by their total order so that folded constants (including
/// infinities) compare equal to themselves.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => OrderedFloat(*a) == OrderedFloat(*b),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::ByteArray(a), Self::ByteArray(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Integer(i) => i.hash(state),
            Self::Float(f) => OrderedFloat(*f).hash(state),
            Self::String(s) => s.hash(state),
            Self::Boolean(b) => b.hash(state),
            Self::ByteArray(b) => b.hash(state),
        }
    }
}

impl Value {
    /// Returns the exact kind of this value.
    ///
    /// # Example
    /// ```
    /// use formulon::node::{kind::ValueKind, value::Value};
    ///
    /// assert_eq!(Value::Integer(3).kind(), ValueKind::INTEGER);
    /// assert_eq!(Value::from("text").kind(), ValueKind::String);
    /// ```
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Integer(_) => ValueKind::INTEGER,
            Self::Float(_) => ValueKind::FLOAT,
            Self::String(_) => ValueKind::String,
            Self::Boolean(_) => ValueKind::Boolean,
            Self::ByteArray(_) => ValueKind::ByteArray,
        }
    }

    /// Converts the value to an `f64`, or returns an error if not numeric.
    ///
    /// Integers above `2^53` in magnitude widen to the nearest float.
    pub fn as_float(&self) -> EvalResult<f64> {
        match self {
            Self::Float(f) => Ok(*f),
            Self::Integer(i) => Ok(i64_to_f64(*i)),
            other => Err(other.mismatch("a number")),
        }
    }

    /// Converts the value to an `i64`.
    ///
    /// Floats are accepted only when they hold an integral value.
    ///
    /// # Example
    /// ```
    /// use formulon::node::value::Value;
    ///
    /// assert_eq!(Value::Float(4.0).as_integer().unwrap(), 4);
    /// assert!(Value::Float(4.5).as_integer().is_err());
    /// ```
    pub fn as_integer(&self) -> EvalResult<i64> {
        match self {
            Self::Integer(i) => Ok(*i),
            Self::Float(f) => f64_to_i64_checked(*f, ()).map_err(|()| {
                                                        EvalError::invalid_argument(format!("{f} is not an integer"))
                                                    }),
            other => Err(other.mismatch("an integer")),
        }
    }

    /// Converts the value to `bool`, or returns an error if not boolean.
    pub fn as_bool(&self) -> EvalResult<bool> {
        match self {
            Self::Boolean(b) => Ok(*b),
            other => Err(other.mismatch("a boolean")),
        }
    }

    /// Borrows the text of a string value.
    pub fn as_str(&self) -> EvalResult<&str> {
        match self {
            Self::String(s) => Ok(s),
            other => Err(other.mismatch("a string")),
        }
    }

    /// Borrows the bytes of a byte array value.
    pub fn as_bytes(&self) -> EvalResult<&[u8]> {
        match self {
            Self::ByteArray(b) => Ok(b),
            other => Err(other.mismatch("a byte array")),
        }
    }

    /// Adjusts a value so that it matches a statically determined kind.
    ///
    /// Integers widen to floats for float kinds and integral floats narrow to
    /// integers for integer kinds. Returns `None` when the value cannot take
    /// the kind.
    ///
    /// # Example
    /// ```
    /// use formulon::node::{kind::ValueKind, value::Value};
    ///
    /// assert_eq!(Value::Integer(2).conform(ValueKind::FLOAT), Some(Value::Float(2.0)));
    /// assert_eq!(Value::Float(2.0).conform(ValueKind::INTEGER), Some(Value::Integer(2)));
    /// assert_eq!(Value::Boolean(true).conform(ValueKind::NUMBER), None);
    /// ```
    #[must_use]
    pub fn conform(self, kind: ValueKind) -> Option<Self> {
        match (self, kind) {
            (Self::Integer(i), ValueKind::Numeric(NumericMode::Float)) => Some(Self::Float(i64_to_f64(i))),
            (Self::Float(f), ValueKind::Numeric(NumericMode::Integer)) => {
                f64_to_i64_checked(f, ()).ok().map(Self::Integer)
            },
            (value, kind) if value.kind().class() == kind.class() => Some(value),
            _ => None,
        }
    }

    /// Parses text as a value of the given kind.
    ///
    /// Numbers accept integer and float notation, booleans accept `true` and
    /// `false`, byte arrays accept hex digits with an optional `0x` prefix, and
    /// strings take the text verbatim.
    ///
    /// # Example
    /// ```
    /// use formulon::node::{kind::ValueKind, value::Value};
    ///
    /// assert_eq!(Value::parse_as(ValueKind::NUMBER, "12"), Some(Value::Integer(12)));
    /// assert_eq!(Value::parse_as(ValueKind::ByteArray, "0x0aff"),
    ///            Some(Value::from(vec![0x0a, 0xff])));
    /// ```
    #[must_use]
    pub fn parse_as(kind: ValueKind, text: &str) -> Option<Self> {
        match kind {
            ValueKind::Numeric(mode) => {
                let value = text.parse::<i64>()
                                .map(Self::Integer)
                                .or_else(|_| text.parse::<f64>().map(Self::Float))
                                .ok()?;
                value.conform(ValueKind::Numeric(mode))
            },
            ValueKind::Boolean => text.parse::<bool>().ok().map(Self::Boolean),
            ValueKind::String => Some(Self::from(text)),
            ValueKind::ByteArray => {
                let digits = text.strip_prefix("0x")
                                 .or_else(|| text.strip_prefix("0X"))
                                 .unwrap_or(text);
                decode_hex(digits).map(Self::from)
            },
        }
    }

    fn mismatch(&self, expected: &str) -> EvalError {
        EvalError::TypeMismatch { details: format!("expected {expected}, found {} value {self}",
                                                   self.kind()), }
    }
}

/// Decodes an even-length string of hex digits.
///
/// # Example
/// ```
/// use formulon::node::value::decode_hex;
///
/// assert_eq!(decode_hex("00ff10"), Some(vec![0x00, 0xff, 0x10]));
/// assert_eq!(decode_hex("abc"), None);
/// ```
#[must_use]
pub fn decode_hex(digits: &str) -> Option<Vec<u8>> {
    if digits.len() % 2 != 0 || !digits.is_ascii() {
        return None;
    }
    (0..digits.len()).step_by(2)
                     .map(|i| u8::from_str_radix(&digits[i..i + 2], 16).ok())
                     .collect()
}

/// Encodes bytes as lowercase hex digits.
#[must_use]
pub fn encode_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;

    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
                    let _ = write!(out, "{b:02x}");
                    out
                })
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::ByteArray(b) => write!(f, "0x{}", encode_hex(b)),
        }
    }
}
