use crate::{
    error::{EvalError, EvalResult},
    function::registry::check_arity,
    node::value::Value,
};

/// Computes the logarithm of a value with respect to a given base.
///
/// Accepts exactly two arguments: `value` and `base`, computing
/// `log_base(value) = ln(value) / ln(base)`.
///
/// Both arguments must be positive. A base of `1` has a zero logarithm and
/// produces `DivisionByZero`.
///
/// # Example
/// ```
/// use formulon::{function::log::log, node::value::Value};
///
/// let result = log(&[Value::Integer(8), Value::Integer(2)]).unwrap();
/// assert_eq!(result, Value::Float(3.0));
/// ```
pub fn log(args: &[Value]) -> EvalResult<Value> {
    check_arity(args, 2)?;

    let value = args[0].as_float()?;
    let base = args[1].as_float()?;

    if value <= 0.0 || base <= 0.0 {
        return Err(EvalError::invalid_argument(format!("log({value}, {base}): value and base must be positive")));
    }

    let ln_base = base.ln();
    if ln_base == 0.0 {
        return Err(EvalError::DivisionByZero);
    }

    Ok(Value::Float(value.ln() / ln_base))
}
