//! Deterministic random number generation for shuffles, dice and tokens.
//!
//! ## Key Features
//!
//! - **Deterministic**: Same seed produces identical sequence
//! - **Injectable**: Game code only sees the `RandomSource` trait, so tests
//!   can swap in a scripted source
//!
//! ```
//! use deck_playtest::core::{GameRng, RandomSource};
//!
//! let mut a = GameRng::new(42);
//! let mut b = GameRng::new(42);
//! assert_eq!(a.next_below(60), b.next_below(60));
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Source of randomness consumed by the game engine.
///
/// Everything random in a playtest (library order, die rolls, token
/// placement) goes through this trait.
pub trait RandomSource {
    /// Uniform integer in `0..upper`. `upper` must be non-zero.
    fn next_below(&mut self, upper: usize) -> usize;

    /// Uniform float in `[0, 1)`.
    fn next_unit(&mut self) -> f64;
}

/// Seeded ChaCha8 generator.
#[derive(Clone, Debug)]
pub struct GameRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl GameRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Create an RNG seeded from the operating system.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(rand::thread_rng().gen())
    }

    /// The seed this generator was created with.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RandomSource for GameRng {
    fn next_below(&mut self, upper: usize) -> usize {
        self.inner.gen_range(0..upper)
    }

    fn next_unit(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }
}
