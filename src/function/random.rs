use crate::{
    error::{EvalError, EvalResult},
    function::registry::check_arity,
    node::value::Value,
    util::random,
};

/// `random()`: a float in `[0, 1)`.
pub fn unit(args: &[Value]) -> EvalResult<Value> {
    check_arity(args, 0)?;
    Ok(Value::Float(random::next_f64()))
}

/// `random(n)`: an integer in `[0, n)`.
///
/// # Errors
/// `InvalidArgument` unless `n` is positive.
///
/// # Example
/// ```
/// use formulon::{function::random::below, node::value::Value};
///
/// let roll = below(&[Value::Integer(6)]).unwrap().as_integer().unwrap();
/// assert!((0..6).contains(&roll));
/// assert!(below(&[Value::Integer(0)]).is_err());
/// ```
pub fn below(args: &[Value]) -> EvalResult<Value> {
    check_arity(args, 1)?;

    let bound = args[0].as_integer()?;
    let bound = u64::try_from(bound).ok()
                                    .filter(|b| *b > 0)
                                    .ok_or_else(|| {
                                        EvalError::invalid_argument(format!("random({bound}): bound must be positive"))
                                    })?;

    i64::try_from(random::below(bound)).map(Value::Integer)
                                       .map_err(|_| EvalError::Overflow)
}

/// `random(lo, hi)`: an integer in `[lo, hi)`.
///
/// # Errors
/// `InvalidArgument` when the range is empty.
///
/// # Example
/// ```
/// use formulon::{function::random::between, node::value::Value};
///
/// let x = between(&[Value::Integer(-2), Value::Integer(2)]).unwrap().as_integer().unwrap();
/// assert!((-2..2).contains(&x));
/// assert!(between(&[Value::Integer(3), Value::Integer(3)]).is_err());
/// ```
pub fn between(args: &[Value]) -> EvalResult<Value> {
    check_arity(args, 2)?;

    let lo = args[0].as_integer()?;
    let hi = args[1].as_integer()?;
    if lo >= hi {
        return Err(EvalError::invalid_argument(format!("random({lo}, {hi}): empty range")));
    }

    let offset = random::below(hi.abs_diff(lo));
    Ok(Value::Integer(lo.wrapping_add_unsigned(offset)))
}
