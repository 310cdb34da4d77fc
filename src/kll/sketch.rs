// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use super::COMPACTION_RATE;
use super::MIN_K;
use crate::common::RandomSource;
use crate::common::XorShift64;
use crate::error::Error;

/// KLL sketch over `u64` values acting as a weighted-multiset summary.
///
/// An item stored at level `L` carries weight `2^L`. The capacity of level
/// `L` in a stack of `m` levels is `ceil(k * c^(m - 1 - L))` with `c = 2/3`,
/// so the total number of retained items is bounded by `k / (1 - c) = 3k`
/// regardless of the stream length.
///
/// See the [kll module level documentation](crate::kll) for more.
#[derive(Debug, Clone)]
pub struct KllSketch {
    k: u16,
    n: u64,
    levels: Vec<Vec<u64>>,
    rng: XorShift64,
}

impl KllSketch {
    /// Creates a new sketch with the given value of k.
    ///
    /// The compaction coin flips are seeded from the clock; use
    /// [`KllSketch::with_seed`] for reproducible behavior.
    ///
    /// # Panics
    ///
    /// Panics if `k` is zero.
    pub fn new(k: u16) -> Self {
        let mut rng = XorShift64::default();
        let seed = rng.next_u64();
        Self::with_seed(k, seed)
    }

    /// Creates a new sketch with the given value of k and compaction seed.
    ///
    /// # Panics
    ///
    /// Panics if `k` is zero.
    pub fn with_seed(k: u16, seed: u64) -> Self {
        assert!(k >= MIN_K, "k must be >= {MIN_K}, got {k}");
        Self {
            k,
            n: 0,
            levels: vec![Vec::new()],
            rng: XorShift64::seeded(seed),
        }
    }

    /// Returns parameter k used to configure this sketch.
    pub fn k(&self) -> u16 {
        self.k
    }

    /// Returns total weight of the stream.
    pub fn n(&self) -> u64 {
        self.n
    }

    /// Returns true if the sketch has not seen any data.
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Returns the number of retained items.
    pub fn num_retained(&self) -> usize {
        self.levels.iter().map(|level| level.len()).sum()
    }

    /// Returns the number of compactor levels.
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// Returns the total weight of the retained items.
    ///
    /// Tracks `n` up to the weight drift introduced by compacting levels of
    /// odd population.
    pub fn retained_weight(&self) -> u64 {
        let mut total = 0u64;
        for (level, items) in self.levels.iter().enumerate() {
            total += (items.len() as u64) << level;
        }
        total
    }

    /// Updates the sketch with a new value.
    pub fn update(&mut self, value: u64) {
        self.n += 1;
        self.levels[0].push(value);
        if self.levels[0].len() >= self.level_capacity(0) {
            self.compact(0);
        }
    }

    /// Updates the sketch with a value carrying the given weight.
    ///
    /// The weight is decomposed into powers of two and the value is inserted
    /// once per set bit at the matching level; every overfull level is then
    /// compacted. A zero weight is a no-op.
    pub fn update_weighted(&mut self, value: u64, weight: u64) {
        if weight == 0 {
            return;
        }
        self.n += weight;
        let mut remaining = weight;
        let mut level = 0usize;
        while remaining > 0 {
            if remaining & 1 == 1 {
                if level >= self.levels.len() {
                    self.levels.resize_with(level + 1, Vec::new);
                }
                self.levels[level].push(value);
            }
            remaining >>= 1;
            level += 1;
        }

        let mut level = 0;
        while level < self.levels.len() {
            if self.levels[level].len() >= self.level_capacity(level) {
                self.compact(level);
            }
            level += 1;
        }
    }

    /// Merges another sketch into this one.
    ///
    /// Levels are appended position-wise and then compacted from the bottom
    /// up. Returns [`ErrorKind::IncompatibleParameters`] if the sketches
    /// were configured with different values of k.
    ///
    /// [`ErrorKind::IncompatibleParameters`]: crate::error::ErrorKind::IncompatibleParameters
    pub fn merge(&mut self, other: &KllSketch) -> Result<(), Error> {
        if self.k != other.k {
            return Err(Error::incompatible_parameters(
                "kll sketches must share the same k to be merged",
            )
            .with_context("k", self.k)
            .with_context("other_k", other.k));
        }

        self.n += other.n;
        if self.levels.len() < other.levels.len() {
            self.levels.resize_with(other.levels.len(), Vec::new);
        }
        for (level, items) in other.levels.iter().enumerate() {
            self.levels[level].extend_from_slice(items);
        }

        let mut level = 0;
        while level < self.levels.len() {
            if self.levels[level].len() >= self.level_capacity(level) {
                self.compact(level);
            }
            level += 1;
        }
        Ok(())
    }

    /// Returns the estimated number of occurrences of `value` in the
    /// summarized stream.
    pub fn estimate(&self, value: u64) -> f64 {
        let mut total = 0.0;
        for (level, items) in self.levels.iter().enumerate() {
            let count = items.iter().filter(|&&item| item == value).count();
            total += (count as f64) * ((1u64 << level) as f64);
        }
        total
    }

    /// Returns the estimated weight of values less than or equal to `value`.
    pub fn rank(&self, value: u64) -> f64 {
        let mut total = 0.0;
        for (level, items) in self.levels.iter().enumerate() {
            let count = items.iter().filter(|&&item| item <= value).count();
            total += (count as f64) * ((1u64 << level) as f64);
        }
        total
    }

    /// Returns the estimated weight of values in the circular range
    /// `(lo, hi]`.
    ///
    /// The range is half-open with an exclusive lower and inclusive upper
    /// endpoint. `lo >= hi` denotes a range that wraps through zero, and
    /// `lo == hi` denotes the full value domain.
    pub fn count_in_range(&self, lo: u64, hi: u64) -> f64 {
        let mut total = 0.0;
        for (level, items) in self.levels.iter().enumerate() {
            let count = items
                .iter()
                .filter(|&&item| in_circular_range(item, lo, hi))
                .count();
            total += (count as f64) * ((1u64 << level) as f64);
        }
        total
    }

    /// Returns a new sketch summarizing only the values in the circular
    /// range `(lo, hi]`.
    ///
    /// Level indices (and therefore weights) are preserved and no
    /// recompaction takes place, so the extraction is lossless: splitting a
    /// sketch into a range and its complement conserves every retained item.
    pub fn rebuild(&self, lo: u64, hi: u64) -> KllSketch {
        let mut seed_rng = self.rng;
        let seed = seed_rng.next_u64() ^ lo.rotate_left(32) ^ hi;

        let mut levels = Vec::with_capacity(self.levels.len());
        let mut n = 0u64;
        for (level, items) in self.levels.iter().enumerate() {
            let kept: Vec<u64> = items
                .iter()
                .copied()
                .filter(|&item| in_circular_range(item, lo, hi))
                .collect();
            n += (kept.len() as u64) << level;
            levels.push(kept);
        }

        KllSketch {
            k: self.k,
            n,
            levels,
            rng: XorShift64::seeded(seed),
        }
    }

    /// Visits every retained item with its level weight.
    pub fn for_each_item<F: FnMut(u64, u64)>(&self, mut f: F) {
        for (level, items) in self.levels.iter().enumerate() {
            let weight = 1u64 << level;
            for &item in items {
                f(item, weight);
            }
        }
    }

    /// Upper bound on the number of items a sketch with this k retains.
    pub fn max_retained_items(k: u16) -> usize {
        (k as f64 / (1.0 - COMPACTION_RATE)).ceil() as usize
    }

    /// Upper bound on the memory footprint, in bytes, of the retained items
    /// of a sketch with this k.
    pub fn max_memory_bytes(k: u16) -> u64 {
        Self::max_retained_items(k) as u64 * std::mem::size_of::<u64>() as u64
    }

    fn level_capacity(&self, level: usize) -> usize {
        let depth = self.levels.len() - 1 - level;
        let cap = (self.k as f64) * COMPACTION_RATE.powi(depth as i32);
        cap.ceil() as usize
    }

    fn compact(&mut self, start: usize) {
        let mut level = start;
        loop {
            if self.levels[level].len() < self.level_capacity(level) {
                return;
            }
            if level + 1 >= self.levels.len() {
                self.levels.push(Vec::new());
            }

            let mut current = std::mem::take(&mut self.levels[level]);
            current.sort_unstable();
            let offset = usize::from(self.rng.next_bool());
            let mut survivors: Vec<u64> = current.into_iter().skip(offset).step_by(2).collect();
            self.levels[level + 1].append(&mut survivors);

            level += 1;
        }
    }
}

#[inline]
fn in_circular_range(value: u64, lo: u64, hi: u64) -> bool {
    if lo < hi {
        value > lo && value <= hi
    } else {
        // Wrapped range, including the full domain when lo == hi.
        value > lo || value <= hi
    }
}
