//! Deterministic randomness for reproducible splits
//!
//! A glibc-style LCG drives a Fisher-Yates shuffle so the same seed yields
//! the same partitions on every platform and toolchain.

use std::num::Wrapping;

/// Linear Congruential Generator for deterministic pseudo-randomness
/// Uses constants from Numerical Recipes (glibc)
#[derive(Clone, Debug)]
pub struct LcgRng {
    state: Wrapping<u64>,
}

impl LcgRng {
    const MULTIPLIER: u64 = 1103515245;
    const INCREMENT: u64 = 12345;
    const BITS: u32 = 31;
    const MODULUS: u64 = 1 << Self::BITS;

    pub fn new(seed: u64) -> Self {
        Self {
            state: Wrapping(seed % Self::MODULUS),
        }
    }

    /// Next raw value in [0, 2^31)
    pub fn next_u31(&mut self) -> u64 {
        self.state = self.state * Wrapping(Self::MULTIPLIER) + Wrapping(Self::INCREMENT);
        self.state.0 & (Self::MODULUS - 1)
    }

    /// Uniform value in [0, max), taken from the high bits of the state.
    pub fn next_range(&mut self, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        ((self.next_u31() * max as u64) >> Self::BITS) as usize
    }

    /// In-place Fisher-Yates shuffle.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.next_range(i + 1);
            items.swap(i, j);
        }
    }

    /// Seeded permutation of `0..n`.
    pub fn permutation(&mut self, n: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..n).collect();
        self.shuffle(&mut indices);
        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lcg_determinism() {
        let mut rng1 = LcgRng::new(42);
        let mut rng2 = LcgRng::new(42);

        for _ in 0..100 {
            assert_eq!(rng1.next_u31(), rng2.next_u31());
        }
    }

    #[test]
    fn test_lcg_range() {
        let mut rng = LcgRng::new(42);
        for _ in 0..1000 {
            assert!(rng.next_range(10) < 10);
        }
        assert_eq!(rng.next_range(0), 0);
        assert_eq!(rng.next_range(1), 0);
    }

    #[test]
    fn test_permutation_covers_every_index() {
        let mut perm = LcgRng::new(7).permutation(257);
        perm.sort_unstable();
        assert_eq!(perm, (0..257).collect::<Vec<_>>());
    }

    #[test]
    fn test_permutation_depends_on_seed() {
        let a = LcgRng::new(42).permutation(64);
        let b = LcgRng::new(42).permutation(64);
        let c = LcgRng::new(43).permutation(64);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_shuffle_small_inputs() {
        let mut rng = LcgRng::new(1);
        let mut empty: Vec<u8> = Vec::new();
        rng.shuffle(&mut empty);
        assert!(empty.is_empty());

        let mut single = vec![9];
        rng.shuffle(&mut single);
        assert_eq!(single, vec![9]);
    }
}
