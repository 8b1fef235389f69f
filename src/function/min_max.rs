use crate::{error::EvalResult, function::registry::check_arity, node::value::Value};

/// Computes the minimum or maximum of two numeric values.
///
/// If both values are integers, the result is an integer. Otherwise the
/// comparison is performed on floats.
///
/// The operation is selected by the `name` parameter, which must be `"min"` or
/// `"max"`. Calls with more arguments are chained pairwise by the compiler.
///
/// # Example
/// ```
/// use formulon::{function::min_max::min_max, node::value::Value};
///
/// let r = min_max("min", &[Value::Integer(3), Value::Integer(7)]).unwrap();
/// assert_eq!(r, 3.into());
///
/// let r = min_max("max", &[Value::Float(2.5), Value::Integer(1)]).unwrap();
/// assert_eq!(r, 2.5.into());
/// ```
pub fn min_max(name: &str, args: &[Value]) -> EvalResult<Value> {
    check_arity(args, 2)?;

    let result = if let (Value::Integer(a), Value::Integer(b)) = (&args[0], &args[1]) {
        let value = if name == "min" {
            std::cmp::min(a, b)
        } else {
            std::cmp::max(a, b)
        };
        Value::Integer(*value)
    } else {
        let left = args[0].as_float()?;
        let right = args[1].as_float()?;
        let value = if name == "min" {
            left.min(right)
        } else {
            left.max(right)
        };
        Value::Float(value)
    };

    Ok(result)
}
