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

//! Hash layer: the sketch-wide partition hash and the per-row placement
//! hashes.
//!
//! An item's *partition hash* `P(x)` is a seeded XXH64 of its identifier and
//! is invariant for the lifetime of a sketch; it fixes the item's identity on
//! the ring. Each row then applies its own *placement hash*
//! `a * P(x) + b (mod 2^64)` with `a` odd, which keeps rows independent while
//! preserving the shared identity underneath.

mod xxhash;

pub use self::xxhash::xxhash64;

// Derivation streams for the two placement parameters.
const PLACEMENT_A_STREAM: u64 = 0x9E3779B185EBCA87;
const PLACEMENT_B_STREAM: u64 = 0xC2B2AE3D27D4EB4F;

/// Returns the sketch-wide partition hash of an item.
pub fn partition_hash(item: u64, seed: u32) -> u64 {
    xxhash64(item, seed as u64)
}

/// Per-row placement parameters for the pairwise-independent linear hash
/// `a * p + b (mod 2^64)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementHash {
    a: u64,
    b: u64,
}

impl PlacementHash {
    /// Derives the placement parameters from a row seed.
    ///
    /// The multiplier is forced odd so the map is a bijection on `u64`.
    pub fn from_seed(seed: u32) -> Self {
        let a = xxhash64(seed as u64, PLACEMENT_A_STREAM) | 1;
        let b = xxhash64(seed as u64, PLACEMENT_B_STREAM);
        Self { a, b }
    }

    /// Places a partition hash on this row's ring domain.
    pub fn place(&self, partition_hash: u64) -> u64 {
        self.a.wrapping_mul(partition_hash).wrapping_add(self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_hash_is_seed_sensitive() {
        let h1 = partition_hash(12345, 1);
        let h2 = partition_hash(12345, 2);
        assert_ne!(h1, h2);
        assert_eq!(h1, partition_hash(12345, 1));
    }

    #[test]
    fn test_placement_multiplier_is_odd() {
        for seed in 0..64 {
            let params = PlacementHash::from_seed(seed);
            assert_eq!(params.a & 1, 1, "multiplier must be odd for seed {seed}");
        }
    }

    #[test]
    fn test_placement_is_injective_on_sample() {
        use std::collections::HashSet;

        let params = PlacementHash::from_seed(9);
        let placed: HashSet<u64> = (0..10_000u64).map(|p| params.place(p)).collect();
        assert_eq!(placed.len(), 10_000);
    }

    #[test]
    fn test_rows_place_differently() {
        let p0 = PlacementHash::from_seed(1);
        let p1 = PlacementHash::from_seed(2);
        let h = partition_hash(777, 3);
        assert_ne!(p0.place(h), p1.place(h));
    }
}
