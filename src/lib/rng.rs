//! Seeded random number generators for the resampling workers.
//!
//! Every partition gets its own generator. Their seeds are drawn from a single
//! master generator, so a fixed `--seed` reproduces a run for the same set of
//! partition files.

use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

/// Create a random number generator, optionally seeded for reproducibility.
///
/// With `None` the generator is seeded from OS entropy.
///
/// # Examples
///
/// ```
/// use ciquant_lib::rng::create_rng;
///
/// let mut a = create_rng(Some(7));
/// let mut b = create_rng(Some(7));
/// // a and b produce identical streams
/// ```
#[must_use]
pub fn create_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => rand::make_rng(),
    }
}

/// Draw one independent seed per partition from a master generator.
#[must_use]
pub fn partition_seeds(seed: Option<u64>, partitions: usize) -> Vec<u64> {
    let mut master = create_rng(seed);
    (0..partitions).map(|_| master.random()).collect()
}
