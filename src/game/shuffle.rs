//! Shuffle and draw primitives.
//!
//! Both functions return fresh sequences, so a caller holding the original
//! slice never sees it change. Randomness comes from a `RandomSource`, so a
//! fixed seed (or a scripted source) reproduces the same permutation.

use crate::core::RandomSource;

/// Uniform random permutation (Fisher–Yates).
pub fn shuffle<T: Clone, R: RandomSource + ?Sized>(sequence: &[T], rng: &mut R) -> Vec<T> {
    let mut shuffled = sequence.to_vec();
    for i in (1..shuffled.len()).rev() {
        let j = rng.next_below(i + 1);
        shuffled.swap(i, j);
    }
    shuffled
}

/// Take the top card (the last element) off a library.
///
/// Returns the card and the remaining library. Drawing from an empty
/// library returns `None` and an empty library.
pub fn draw<T: Clone>(library: &[T]) -> (Option<T>, Vec<T>) {
    match library.split_last() {
        Some((top, rest)) => (Some(top.clone()), rest.to_vec()),
        None => (None, Vec::new()),
    }
}
