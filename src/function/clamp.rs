use crate::{
    error::{EvalError, EvalResult},
    function::registry::check_arity,
    node::value::Value,
};

/// Clamps a numeric value between a minimum and maximum bound.
///
/// If `min > max`, an `InvalidArgument` error is returned.
/// The result is an integer when all three arguments are integers; otherwise
/// a float is produced.
///
/// # Parameters
/// - `args`: Slice containing `[value, min, max]`.
///
/// # Example
/// ```
/// use formulon::{function::clamp::clamp, node::value::Value};
///
/// let result = clamp(&[Value::Integer(5), Value::Integer(0), Value::Integer(3)]).unwrap();
///
/// // 5 clamped between 0 and 3 yields 3
/// assert_eq!(result, 3.into());
/// ```
pub fn clamp(args: &[Value]) -> EvalResult<Value> {
    check_arity(args, 3)?;

    if let [Value::Integer(val), Value::Integer(min), Value::Integer(max)] = args {
        if min > max {
            return Err(EvalError::invalid_argument(format!("clamp: min ({min}) > max ({max})")));
        }
        return Ok(Value::Integer(*val.clamp(min, max)));
    }

    let val = args[0].as_float()?;
    let min = args[1].as_float()?;
    let max = args[2].as_float()?;

    if min > max || min.is_nan() || max.is_nan() {
        return Err(EvalError::invalid_argument(format!("clamp: min ({min}) > max ({max})")));
    }

    Ok(Value::Float(val.clamp(min, max)))
}
