use crate::{
    error::{EvalError, EvalResult},
    function::registry::check_arity,
    node::value::Value,
    util::num::{i64_to_usize_checked, usize_to_i64_checked},
};

/// Upper bound on the length of strings built by `repeat`.
const MAX_REPEAT_LEN: usize = 1 << 24;

/// Returns the length of a string in characters, or of a byte array in bytes.
///
/// # Example
/// ```
/// use formulon::{function::text::length, node::value::Value};
///
/// assert_eq!(length(&[Value::from("héllo")]).unwrap(), Value::Integer(5));
/// assert_eq!(length(&[Value::from(vec![1_u8, 2, 3])]).unwrap(), Value::Integer(3));
/// ```
pub fn length(args: &[Value]) -> EvalResult<Value> {
    check_arity(args, 1)?;

    let len = match &args[0] {
        Value::ByteArray(bytes) => bytes.len(),
        other => other.as_str()?.chars().count(),
    };
    usize_to_i64_checked(len, EvalError::Overflow).map(Value::Integer)
}

/// Converts a string to upper case.
pub fn upper(args: &[Value]) -> EvalResult<Value> {
    check_arity(args, 1)?;
    Ok(Value::from(args[0].as_str()?.to_uppercase()))
}

/// Converts a string to lower case.
pub fn lower(args: &[Value]) -> EvalResult<Value> {
    check_arity(args, 1)?;
    Ok(Value::from(args[0].as_str()?.to_lowercase()))
}

/// Removes leading and trailing whitespace.
pub fn trim(args: &[Value]) -> EvalResult<Value> {
    check_arity(args, 1)?;
    Ok(Value::from(args[0].as_str()?.trim()))
}

/// Joins two strings or two byte arrays.
///
/// # Example
/// ```
/// use formulon::{function::text::concat, node::value::Value};
///
/// assert_eq!(concat(&[Value::from("ab"), Value::from("cd")]).unwrap(), Value::from("abcd"));
/// ```
pub fn concat(args: &[Value]) -> EvalResult<Value> {
    check_arity(args, 2)?;

    match (&args[0], &args[1]) {
        (Value::ByteArray(a), Value::ByteArray(b)) => Ok(Value::from([&a[..], &b[..]].concat())),
        (a, b) => Ok(Value::from(format!("{}{}", a.as_str()?, b.as_str()?))),
    }
}

/// Returns `true` if the first string contains the second.
pub fn contains(args: &[Value]) -> EvalResult<Value> {
    check_arity(args, 2)?;
    Ok(Value::Boolean(args[0].as_str()?.contains(args[1].as_str()?)))
}

/// Returns `true` if the first string starts with the second.
pub fn starts_with(args: &[Value]) -> EvalResult<Value> {
    check_arity(args, 2)?;
    Ok(Value::Boolean(args[0].as_str()?.starts_with(args[1].as_str()?)))
}

/// Returns `true` if the first string ends with the second.
pub fn ends_with(args: &[Value]) -> EvalResult<Value> {
    check_arity(args, 2)?;
    Ok(Value::Boolean(args[0].as_str()?.ends_with(args[1].as_str()?)))
}

/// `substring(text, start, count)`: `count` characters starting at the
/// zero-based character index `start`.
///
/// # Errors
/// `IndexOutOfBounds` when the range does not lie within the text.
///
/// # Example
/// ```
/// use formulon::{function::text::substring, node::value::Value};
///
/// let args = [Value::from("formula"), Value::Integer(4), Value::Integer(3)];
/// assert_eq!(substring(&args).unwrap(), Value::from("ula"));
///
/// let args = [Value::from("formula"), Value::Integer(5), Value::Integer(3)];
/// assert!(substring(&args).is_err());
/// ```
pub fn substring(args: &[Value]) -> EvalResult<Value> {
    check_arity(args, 3)?;

    let text = args[0].as_str()?;
    let start = args[1].as_integer()?;
    let count = args[2].as_integer()?;
    let length = text.chars().count();

    let out_of_bounds = |index: i64| EvalError::IndexOutOfBounds { index, length };
    let first = i64_to_usize_checked(start, out_of_bounds(start))?;
    let taken = i64_to_usize_checked(count, EvalError::invalid_argument(format!("negative count {count}")))?;
    if first.checked_add(taken).is_none_or(|end| end > length) {
        return Err(out_of_bounds(start.saturating_add(count)));
    }

    Ok(Value::from(text.chars().skip(first).take(taken).collect::<String>()))
}

/// `replace(text, pattern, replacement)`: replaces every occurrence.
///
/// # Errors
/// `InvalidArgument` for an empty pattern.
pub fn replace(args: &[Value]) -> EvalResult<Value> {
    check_arity(args, 3)?;

    let pattern = args[1].as_str()?;
    if pattern.is_empty() {
        return Err(EvalError::invalid_argument("replace: empty pattern"));
    }
    Ok(Value::from(args[0].as_str()?.replace(pattern, args[2].as_str()?)))
}

/// `repeat(text, n)`: the text repeated `n` times.
///
/// # Errors
/// `InvalidArgument` for a negative count or a result longer than 16 MiB.
pub fn repeat(args: &[Value]) -> EvalResult<Value> {
    check_arity(args, 2)?;

    let text = args[0].as_str()?;
    let count = args[1].as_integer()?;
    let times = i64_to_usize_checked(count, EvalError::invalid_argument(format!("repeat: negative count {count}")))?;
    if text.len().checked_mul(times).is_none_or(|len| len > MAX_REPEAT_LEN) {
        return Err(EvalError::invalid_argument(format!("repeat: result of {times} copies is too long")));
    }
    Ok(Value::from(text.repeat(times)))
}

/// Formats any value as a string. Strings are returned unchanged.
///
/// # Example
/// ```
/// use formulon::{function::text::to_string, node::value::Value};
///
/// assert_eq!(to_string(&[Value::Float(2.5)]).unwrap(), Value::from("2.5"));
/// assert_eq!(to_string(&[Value::Boolean(true)]).unwrap(), Value::from("true"));
/// ```
pub fn to_string(args: &[Value]) -> EvalResult<Value> {
    check_arity(args, 1)?;

    match &args[0] {
        Value::String(_) => Ok(args[0].clone()),
        other => Ok(Value::from(other.to_string())),
    }
}

/// Parses a string as an integer or, failing that, a float.
///
/// # Errors
/// `InvalidArgument` when the text is not a number.
pub fn parse_number(args: &[Value]) -> EvalResult<Value> {
    check_arity(args, 1)?;

    let text = args[0].as_str()?.trim();
    text.parse::<i64>()
        .map(Value::Integer)
        .or_else(|_| text.parse::<f64>().map(Value::Float))
        .map_err(|_| EvalError::invalid_argument(format!("'{text}' is not a number")))
}
