use std::cmp::Ordering;

/// Widens an `i64` to the nearest `f64`.
///
/// Magnitudes above `2^53` round to the nearest representable float; use
/// [`cmp_i64_f64`] where the exact relation between the two matters.
///
/// ## Example
/// ```
/// use formulon::util::num::i64_to_f64;
///
/// assert_eq!(i64_to_f64(42), 42.0);
/// assert_eq!(i64_to_f64(9_007_199_254_740_993), 9_007_199_254_740_992.0);
/// ```
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn i64_to_f64(value: i64) -> f64 {
    value as f64
}

/// Orders an `i64` against an `f64` without rounding either side.
///
/// Returns `None` when `float` is NaN.
///
/// ## Example
/// ```
/// use std::cmp::Ordering;
///
/// use formulon::util::num::cmp_i64_f64;
///
/// assert_eq!(cmp_i64_f64(9_007_199_254_740_993, 9_007_199_254_740_992.0), Some(Ordering::Greater));
/// assert_eq!(cmp_i64_f64(3, 3.0), Some(Ordering::Equal));
/// assert_eq!(cmp_i64_f64(-3, -2.5), Some(Ordering::Less));
/// assert_eq!(cmp_i64_f64(i64::MAX, f64::INFINITY), Some(Ordering::Less));
/// assert_eq!(cmp_i64_f64(0, f64::NAN), None);
/// ```
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn cmp_i64_f64(integer: i64, float: f64) -> Option<Ordering> {
    if float.is_nan() {
        return None;
    }
    // -2^63 is exact; i64::MAX as f64 rounds up to 2^63.
    if float >= i64::MAX as f64 {
        return Some(Ordering::Less);
    }
    if float < i64::MIN as f64 {
        return Some(Ordering::Greater);
    }
    let whole = float.trunc();
    match integer.cmp(&(whole as i64)) {
        Ordering::Equal => 0.0.partial_cmp(&(float - whole)),
        unequal => Some(unequal),
    }
}

/// Safely converts a `usize` to `i64`.
///
/// ## Errors
/// Returns `Err(error)` if the value does not fit.
pub fn usize_to_i64_checked<E>(value: usize, error: E) -> Result<i64, E> {
    i64::try_from(value).map_err(|_| error)
}

/// Safely converts an `f64` to `i64` if the value is finite, within range, and
/// not fractional.
///
/// ## Errors
/// Returns `Err(error)` for non-finite, out-of-range, or fractional values.
///
/// ## Example
/// ```
/// use formulon::util::num::f64_to_i64_checked;
///
/// assert_eq!(f64_to_i64_checked(1000.0, ()), Ok(1000));
/// assert!(f64_to_i64_checked(1.5, ()).is_err());
/// assert!(f64_to_i64_checked(1e20, ()).is_err());
/// assert!(f64_to_i64_checked(f64::NAN, ()).is_err());
/// ```
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_precision_loss)]
pub fn f64_to_i64_checked<E>(value: f64, error: E) -> Result<i64, E> {
    if !value.is_finite() || value.fract() != 0.0 {
        return Err(error);
    }
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range.
    if value < i64::MIN as f64 || value >= i64::MAX as f64 {
        return Err(error);
    }
    Ok(value as i64)
}

/// Safely converts an `i64` to `u32`.
///
/// ## Errors
/// Returns `Err(error)` if the value is negative or exceeds `u32::MAX`.
///
/// ## Example
/// ```
/// use formulon::util::num::i64_to_u32_checked;
///
/// assert_eq!(i64_to_u32_checked(45, ()), Ok(45));
/// assert!(i64_to_u32_checked(-1, ()).is_err());
/// assert!(i64_to_u32_checked(i64::MAX, ()).is_err());
/// ```
pub fn i64_to_u32_checked<E>(value: i64, error: E) -> Result<u32, E> {
    u32::try_from(value).map_err(|_| error)
}

/// Safely converts an `i64` to a `usize` if and only if it can be represented
/// exactly.
///
/// ## Errors
/// Returns `Err(error)` if the value is negative or exceeds the maximum
/// representable `usize`.
///
/// ## Example
/// ```
/// use formulon::util::num::i64_to_usize_checked;
///
/// assert_eq!(i64_to_usize_checked(42, ()), Ok(42));
/// assert!(i64_to_usize_checked(-1, ()).is_err());
/// ```
pub fn i64_to_usize_checked<E>(value: i64, error: E) -> Result<usize, E> {
    usize::try_from(value).map_err(|_| error)
}
