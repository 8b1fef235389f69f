use crate::{
    error::{EvalError, EvalResult},
    function::registry::check_arity,
    node::value::{Value, encode_hex},
    util::num::i64_to_usize_checked,
};

/// Formats a byte array as lowercase hex digits without a prefix.
///
/// # Example
/// ```
/// use formulon::{function::bytes::hex, node::value::Value};
///
/// assert_eq!(hex(&[Value::from(vec![0xca_u8, 0xfe])]).unwrap(), Value::from("cafe"));
/// ```
pub fn hex(args: &[Value]) -> EvalResult<Value> {
    check_arity(args, 1)?;
    Ok(Value::from(encode_hex(args[0].as_bytes()?)))
}

/// Encodes a string as UTF-8 bytes.
pub fn bytes(args: &[Value]) -> EvalResult<Value> {
    check_arity(args, 1)?;
    Ok(Value::from(args[0].as_str()?.as_bytes()))
}

/// Decodes UTF-8 bytes into a string.
///
/// # Errors
/// `InvalidArgument` when the bytes are not valid UTF-8.
pub fn utf8(args: &[Value]) -> EvalResult<Value> {
    check_arity(args, 1)?;

    std::str::from_utf8(args[0].as_bytes()?).map(Value::from)
                                            .map_err(|e| EvalError::invalid_argument(format!("utf8: {e}")))
}

/// `byteat(bytes, index)`: the byte at a zero-based index, as an integer.
///
/// # Example
/// ```
/// use formulon::{error::EvalError, function::bytes::byte_at, node::value::Value};
///
/// let data = Value::from(vec![7_u8, 9]);
/// assert_eq!(byte_at(&[data.clone(), Value::Integer(1)]).unwrap(), Value::Integer(9));
/// assert_eq!(byte_at(&[data, Value::Integer(2)]),
///            Err(EvalError::IndexOutOfBounds { index: 2, length: 2 }));
/// ```
pub fn byte_at(args: &[Value]) -> EvalResult<Value> {
    check_arity(args, 2)?;

    let data = args[0].as_bytes()?;
    let index = args[1].as_integer()?;
    let out_of_bounds = EvalError::IndexOutOfBounds { index,
                                                      length: data.len() };

    let position = i64_to_usize_checked(index, out_of_bounds.clone())?;
    data.get(position)
        .map(|b| Value::Integer(i64::from(*b)))
        .ok_or(out_of_bounds)
}
