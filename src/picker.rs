//! Random selection from message and sound pools.

use rand::Rng;

/// Source of uniform random indices.
pub trait RandomSource {
    /// Return an index in `0..len`. `len` is never zero.
    fn index(&mut self, len: usize) -> usize;
}

/// Unseeded thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn index(&mut self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Pick one element of `pool` uniformly at random.
///
/// Returns `None` for an empty pool. A single-element pool never consults
/// the random source.
pub fn pick<'a, T>(pool: &'a [T], rng: &mut dyn RandomSource) -> Option<&'a T> {
    match pool.len() {
        0 => None,
        1 => pool.first(),
        len => {
            let idx = rng.index(len);
            debug_assert!(idx < len, "random index {idx} out of range for pool of {len}");
            pool.get(idx.min(len - 1))
        }
    }
}
