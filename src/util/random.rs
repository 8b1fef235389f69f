use std::{
    collections::hash_map::RandomState,
    hash::BuildHasher,
    sync::{
        LazyLock,
        atomic::{AtomicU64, Ordering},
    },
};

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

static STATE: LazyLock<AtomicU64> = LazyLock::new(|| {
                                         // RandomState is keyed per process.
                                         AtomicU64::new(RandomState::new().hash_one(0x5EED_u64))
                                     });

/// Returns the next 64 random bits.
///
/// SplitMix64 over a shared atomic counter: every caller advances the counter
/// with a single `fetch_add`, so concurrent evaluations never block each other
/// and never observe the same state.
pub fn next_u64() -> u64 {
    let mut z = STATE.fetch_add(GOLDEN_GAMMA, Ordering::Relaxed)
                     .wrapping_add(GOLDEN_GAMMA);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Returns a uniformly distributed float in `[0, 1)`.
///
/// # Example
/// ```
/// use formulon::util::random::next_f64;
///
/// let x = next_f64();
/// assert!((0.0..1.0).contains(&x));
/// ```
#[allow(clippy::cast_precision_loss)]
pub fn next_f64() -> f64 {
    (next_u64() >> 11) as f64 * (1.0 / (1_u64 << 53) as f64)
}

/// Returns a uniformly distributed integer in `[0, bound)`.
///
/// `bound` must be positive. Uses rejection sampling to avoid modulo bias.
///
/// # Example
/// ```
/// use formulon::util::random::below;
///
/// for _ in 0..100 {
///     assert!(below(6) < 6);
/// }
/// ```
pub fn below(bound: u64) -> u64 {
    debug_assert!(bound > 0);
    let zone = u64::MAX - (u64::MAX % bound);
    loop {
        let candidate = next_u64();
        if candidate < zone {
            return candidate % bound;
        }
    }
}
