/// Numeric conversion helpers.
///
/// Conversions between integer and floating-point types. The checked ones
/// return a caller-chosen error instead of losing information; widening to
/// `f64` rounds, and mixed comparisons are exact.
pub mod num;
/// Thread-safe random number source.
///
/// Backs the `random` built-ins, which may be evaluated concurrently from
/// many threads.
pub mod random;
