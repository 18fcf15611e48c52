//! A seeded, reproducible source of randomness.
//!
//! Every engine takes ownership of exactly one [`RngSource`] and never
//! reaches for entropy anywhere else (no `rand::thread_rng()`, no
//! `SystemTime`). Two runs constructed with the same seed and the same
//! configuration produce bit-identical schedules.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Wraps a [`StdRng`] behind the handful of operations the moves and
/// engines actually need, so call sites read as intent rather than as
/// raw `rand` API calls.
pub struct RngSource {
    inner: StdRng,
}

impl RngSource {
    pub fn new(seed: u64) -> Self {
        RngSource {
            inner: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniform float in `[0, 1)`.
    pub fn uniform01(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    /// Uniform integer in `[0, n)`. Panics if `n == 0`.
    pub fn uniform_usize(&mut self, n: usize) -> usize {
        self.inner.gen_range(0..n)
    }

    /// Uniform float in `[lo, hi)`.
    pub fn uniform_range(&mut self, lo: f64, hi: f64) -> f64 {
        self.inner.gen_range(lo..hi)
    }

    /// `k` distinct indices drawn from `0..n`, in ascending order.
    /// Falls back to `0..n` if `k >= n`.
    pub fn choose_k_distinct(&mut self, n: usize, k: usize) -> Vec<usize> {
        if k >= n {
            return (0..n).collect();
        }
        let mut chosen: Vec<usize> = rand::seq::index::sample(&mut self.inner, n, k).into_vec();
        chosen.sort_unstable();
        chosen
    }

    /// Fisher-Yates shuffle in place.
    pub fn shuffle_in_place<T>(&mut self, seq: &mut [T]) {
        seq.shuffle(&mut self.inner);
    }

    /// Picks a single element at random, with no weighting.
    pub fn choose<'a, T>(&mut self, seq: &'a [T]) -> Option<&'a T> {
        seq.choose(&mut self.inner)
    }

    /// Weighted pick among `(item, weight)` pairs. Weights need not sum
    /// to one; a non-positive total weight falls back to a uniform pick.
    pub fn weighted_choice<'a, T>(&mut self, items: &'a [(T, f64)]) -> Option<&'a T> {
        let total: f64 = items.iter().map(|(_, w)| w.max(0.0)).sum();
        if items.is_empty() {
            return None;
        }
        if !(total > 0.0) {
            let idx = self.uniform_usize(items.len());
            return Some(&items[idx].0);
        }
        let mut target = self.uniform_range(0.0, total);
        for (item, w) in items {
            let w = w.max(0.0);
            if target < w {
                return Some(item);
            }
            target -= w;
        }
        items.last().map(|(item, _)| item)
    }
}
