use crate::{
    error::{EvalError, EvalResult},
    function::registry::check_arity,
    node::value::Value,
    util::num::f64_to_i64_checked,
};

/// Applies a unary real function to a numeric value.
///
/// The generated functions accept exactly one argument. Integers are converted
/// to floats before the function is applied. The second form takes a domain
/// predicate; arguments outside the domain produce `InvalidArgument` instead
/// of `NaN`.
///
/// # Example
/// ```
/// use formulon::{function::builtin::sin, node::value::Value};
///
/// let x = Value::Float(std::f64::consts::PI / 2.0);
/// let r = sin(&[x]).unwrap();
///
/// assert_eq!(r, Value::Float(1.0));
/// ```
macro_rules! real_builtin {
    ($fname:ident, $real_fn:ident) => {
        pub fn $fname(args: &[Value]) -> EvalResult<Value> {
            check_arity(args, 1)?;

            Ok(Value::Float(args[0].as_float()?.$real_fn()))
        }
    };
    ($fname:ident, $real_fn:ident, $domain:expr, $message:literal) => {
        pub fn $fname(args: &[Value]) -> EvalResult<Value> {
            check_arity(args, 1)?;

            let x = args[0].as_float()?;
            let in_domain: fn(f64) -> bool = $domain;
            if !in_domain(x) {
                return Err(EvalError::invalid_argument(format!(concat!($message, ", found {}"), x)));
            }
            Ok(Value::Float(x.$real_fn()))
        }
    };
}

real_builtin!(sin, sin);
real_builtin!(cos, cos);
real_builtin!(tan, tan);
real_builtin!(atan, atan);
real_builtin!(sinh, sinh);
real_builtin!(cosh, cosh);
real_builtin!(tanh, tanh);
real_builtin!(exp, exp);
real_builtin!(radians, to_radians);
real_builtin!(degrees, to_degrees);
real_builtin!(asin, asin, |x| (-1.0..=1.0).contains(&x), "asin expects a value in [-1, 1]");
real_builtin!(acos, acos, |x| (-1.0..=1.0).contains(&x), "acos expects a value in [-1, 1]");
real_builtin!(sqrt, sqrt, |x| x >= 0.0, "sqrt expects a non-negative value");
real_builtin!(ln, ln, |x| x > 0.0, "ln expects a positive value");
real_builtin!(log10, log10, |x| x > 0.0, "log10 expects a positive value");
real_builtin!(log2, log2, |x| x > 0.0, "log2 expects a positive value");

/// The constant π.
pub fn pi(args: &[Value]) -> EvalResult<Value> {
    check_arity(args, 0)?;
    Ok(Value::Float(std::f64::consts::PI))
}

/// Euler's number.
pub fn e(args: &[Value]) -> EvalResult<Value> {
    check_arity(args, 0)?;
    Ok(Value::Float(std::f64::consts::E))
}

/// The constant τ = 2π.
pub fn tau(args: &[Value]) -> EvalResult<Value> {
    check_arity(args, 0)?;
    Ok(Value::Float(std::f64::consts::TAU))
}

/// Raises the first argument to the power of the second, as floats.
///
/// # Example
/// ```
/// use formulon::{function::builtin::pow, node::value::Value};
///
/// assert_eq!(pow(&[Value::Integer(2), Value::Float(0.5)]).unwrap(),
///            Value::Float(2.0_f64.sqrt()));
/// ```
pub fn pow(args: &[Value]) -> EvalResult<Value> {
    check_arity(args, 2)?;
    Ok(Value::Float(args[0].as_float()?.powf(args[1].as_float()?)))
}

/// The four-quadrant arctangent of `y / x`.
pub fn atan2(args: &[Value]) -> EvalResult<Value> {
    check_arity(args, 2)?;
    Ok(Value::Float(args[0].as_float()?.atan2(args[1].as_float()?)))
}

/// The length of the hypotenuse of a right triangle with legs `x` and `y`.
pub fn hypot(args: &[Value]) -> EvalResult<Value> {
    check_arity(args, 2)?;
    Ok(Value::Float(args[0].as_float()?.hypot(args[1].as_float()?)))
}

/// Returns the absolute value, keeping integers as integers.
///
/// # Errors
/// `Overflow` for `abs(i64::MIN)`.
pub fn abs(args: &[Value]) -> EvalResult<Value> {
    check_arity(args, 1)?;

    match &args[0] {
        Value::Integer(i) => i.checked_abs().map(Value::Integer).ok_or(EvalError::Overflow),
        other => Ok(Value::Float(other.as_float()?.abs())),
    }
}

/// Returns the numeric sign of a value.
///
/// Integers return `-1`, `0` or `1`.
/// Floats return `-1.0`, `0.0` or `1.0`.
///
/// # Example
/// ```
/// use formulon::{function::builtin::sign, node::value::Value};
///
/// let s = sign(&[Value::Integer(-42)]).unwrap();
/// assert_eq!(s, Value::Integer(-1));
/// ```
pub fn sign(args: &[Value]) -> EvalResult<Value> {
    check_arity(args, 1)?;

    match &args[0] {
        Value::Integer(i) => Ok(Value::Integer(i.signum())),
        other => {
            let x = other.as_float()?;
            Ok(Value::Float(if x == 0.0 { 0.0 } else { x.signum() }))
        },
    }
}

/// Applies a rounding operation (`floor`, `ceil`, `round` or `trunc`) and
/// returns an integer.
///
/// Integers are returned as-is. `round` rounds half away from zero.
///
/// # Errors
/// `Overflow` when the rounded value does not fit in an `i64`, and
/// `InvalidArgument` for an unknown operation name.
///
/// # Example
/// ```
/// use formulon::{function::builtin::unary_round, node::value::Value};
///
/// let r = unary_round("floor", &[Value::Float(3.8)]).unwrap();
/// assert_eq!(r, Value::Integer(3));
/// ```
pub fn unary_round(name: &str, args: &[Value]) -> EvalResult<Value> {
    check_arity(args, 1)?;

    let op = match name {
        "floor" => f64::floor,
        "ceil" => f64::ceil,
        "round" => f64::round,
        "trunc" => f64::trunc,
        other => return Err(EvalError::invalid_argument(format!("unknown rounding '{other}'"))),
    };

    match &args[0] {
        Value::Integer(i) => Ok(Value::Integer(*i)),
        other => f64_to_i64_checked(op(other.as_float()?), EvalError::Overflow).map(Value::Integer),
    }
}

/// Rounds to a number of decimal digits and returns a float.
///
/// Negative digit counts round to tens, hundreds and so on.
///
/// # Example
/// ```
/// use formulon::{function::builtin::round_digits, node::value::Value};
///
/// assert_eq!(round_digits(&[Value::Float(1.23456), Value::Integer(2)]).unwrap(),
///            Value::Float(1.23));
/// assert_eq!(round_digits(&[Value::Integer(1234), Value::Integer(-2)]).unwrap(),
///            Value::Float(1200.0));
/// ```
pub fn round_digits(args: &[Value]) -> EvalResult<Value> {
    check_arity(args, 2)?;

    let x = args[0].as_float()?;
    let digits = args[1].as_integer()?;
    let digits = i32::try_from(digits).ok()
                                      .filter(|d| d.abs() <= 308)
                                      .ok_or_else(|| {
                                          EvalError::invalid_argument(format!("cannot round to {digits} digits"))
                                      })?;

    if digits < 0 {
        let factor = 10_f64.powi(-digits);
        return Ok(Value::Float((x / factor).round() * factor));
    }
    let factor = 10_f64.powi(digits);
    Ok(Value::Float((x * factor).round() / factor))
}

/// Converts a number to a float.
pub fn float(args: &[Value]) -> EvalResult<Value> {
    check_arity(args, 1)?;
    Ok(Value::Float(args[0].as_float()?))
}
