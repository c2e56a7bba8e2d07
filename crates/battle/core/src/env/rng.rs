//! RNG oracle for deterministic random number generation.
//!
//! Every roll the battle makes (hit checks, damage variance, AI choices,
//! breakage) goes through one [`RngOracle`] owned by the battle. Given the
//! same seed, a battle replays identically.

use std::collections::VecDeque;

/// Source of randomness consumed by the battle rules.
///
/// Implementations must be deterministic for a given seed.
pub trait RngOracle: Send {
    /// Next raw 32-bit value of the stream.
    fn next_u32(&mut self) -> u32;

    /// Uniform value in `[min, max]` inclusive. Returns `min` when the range
    /// is empty.
    fn random_int(&mut self, min: i32, max: i32) -> i32 {
        if min >= max {
            return min;
        }
        let span = (i64::from(max) - i64::from(min) + 1) as u64;
        let offset = u64::from(self.next_u32()) % span;
        (i64::from(min) + offset as i64) as i32
    }

    /// Percentile roll in `0..=99`.
    fn roll_percent(&mut self) -> u32 {
        self.random_int(0, 99) as u32
    }
}

/// PCG random number generator (PCG-XSH-RR, 64-bit state, 32-bit output).
///
/// - PCG paper: <https://www.pcg-random.org/>
#[derive(Clone, Copy, Debug)]
pub struct PcgRng {
    state: u64,
}

impl PcgRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    /// Creates a generator from a battle seed.
    pub fn new(seed: u64) -> Self {
        let mut rng = Self {
            state: mix_seed(seed),
        };
        rng.step();
        rng
    }

    #[inline]
    fn step(&mut self) -> u64 {
        let old = self.state;
        self.state = old
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT);
        old
    }

    #[inline]
    fn output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }
}

impl Default for PcgRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl RngOracle for PcgRng {
    fn next_u32(&mut self) -> u32 {
        Self::output(self.step())
    }
}

/// SplitMix-style avalanche so that neighbouring seeds diverge immediately.
fn mix_seed(seed: u64) -> u64 {
    let mut hash = seed ^ 0x9e3779b97f4a7c15;
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51afd7ed558ccd);
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xc4ceb9fe1a85ec53);
    hash ^= hash >> 33;
    hash
}

/// What a [`ScriptedRng`] answers once its script is exhausted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScriptFallback {
    /// Always the upper bound of the requested range.
    Max,
    /// Always the lower bound of the requested range.
    Min,
}

/// Replays a fixed list of rolls, clamped into each requested range.
///
/// Intended for tests and reproductions where the exact outcome of each
/// roll matters more than its distribution.
#[derive(Clone, Debug)]
pub struct ScriptedRng {
    rolls: VecDeque<i32>,
    fallback: ScriptFallback,
}

impl ScriptedRng {
    pub fn new(rolls: impl IntoIterator<Item = i32>, fallback: ScriptFallback) -> Self {
        Self {
            rolls: rolls.into_iter().collect(),
            fallback,
        }
    }

    /// Every roll yields the maximum of its range.
    pub fn always_max() -> Self {
        Self::new([], ScriptFallback::Max)
    }

    /// Every roll yields the minimum of its range.
    pub fn always_min() -> Self {
        Self::new([], ScriptFallback::Min)
    }

    pub fn push(&mut self, roll: i32) {
        self.rolls.push_back(roll);
    }

    pub fn remaining(&self) -> usize {
        self.rolls.len()
    }
}

impl RngOracle for ScriptedRng {
    fn next_u32(&mut self) -> u32 {
        match self.rolls.pop_front() {
            Some(roll) => roll as u32,
            None => match self.fallback {
                ScriptFallback::Max => u32::MAX,
                ScriptFallback::Min => 0,
            },
        }
    }

    fn random_int(&mut self, min: i32, max: i32) -> i32 {
        if min >= max {
            return min;
        }
        match self.rolls.pop_front() {
            Some(roll) => roll.clamp(min, max),
            None => match self.fallback {
                ScriptFallback::Max => max,
                ScriptFallback::Min => min,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pcg_is_deterministic_per_seed() {
        let mut a = PcgRng::new(42);
        let mut b = PcgRng::new(42);
        let mut c = PcgRng::new(43);
        let first: Vec<u32> = (0..8).map(|_| a.next_u32()).collect();
        let second: Vec<u32> = (0..8).map(|_| b.next_u32()).collect();
        let other: Vec<u32> = (0..8).map(|_| c.next_u32()).collect();
        assert_eq!(first, second);
        assert_ne!(first, other);
    }

    #[test]
    fn random_int_stays_inside_inclusive_bounds() {
        let mut rng = PcgRng::new(7);
        for _ in 0..1000 {
            let value = rng.random_int(50, 100);
            assert!((50..=100).contains(&value));
        }
        assert_eq!(rng.random_int(5, 5), 5);
        assert_eq!(rng.random_int(9, 3), 9);
    }

    #[test]
    fn roll_percent_covers_zero_to_ninety_nine() {
        let mut rng = PcgRng::new(99);
        let rolls: Vec<u32> = (0..2000).map(|_| rng.roll_percent()).collect();
        assert!(rolls.iter().all(|&r| r < 100));
        assert!(rolls.contains(&0));
        assert!(rolls.contains(&99));
    }

    #[test]
    fn scripted_rng_clamps_then_falls_back() {
        let mut rng = ScriptedRng::new([3, 500], ScriptFallback::Min);
        assert_eq!(rng.random_int(0, 10), 3);
        assert_eq!(rng.random_int(0, 10), 10);
        assert_eq!(rng.random_int(4, 10), 4);
        assert_eq!(ScriptedRng::always_max().roll_percent(), 99);
    }
}
