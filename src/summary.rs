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

//! Capability traits for the summaries in this crate.
//!
//! [`FrequencySummary`] is the contract an experiment harness codes against
//! when it only needs to feed items and read back counts, so the sketch can
//! be swapped against baseline comparators behind one interface.
//! [`QuantileSummary`] captures the weighted-multiset operations the ring
//! remapping machinery relies on. Structural operations (expand, shrink,
//! merge, split) are deliberately not part of either trait: they are
//! inherent to the concrete sketch type.

use crate::error::Error;
use crate::kll::KllSketch;
use crate::sketch::RingSketch;

/// A summary that ingests a stream of items and estimates per-item counts.
pub trait FrequencySummary {
    /// Ingests one occurrence of an item.
    fn update(&mut self, item: u64);

    /// Returns the estimated number of occurrences of an item.
    fn estimate(&self, item: u64) -> f64;
}

/// A weighted-multiset summary over `u64` values supporting rank and range
/// queries.
pub trait QuantileSummary: Sized {
    /// Ingests one value with weight 1.
    fn update(&mut self, value: u64);

    /// Ingests one value with the given weight.
    fn update_weighted(&mut self, value: u64, weight: u64);

    /// Returns the estimated weight of values less than or equal to `value`.
    fn rank(&self, value: u64) -> f64;

    /// Returns the estimated weight of values in the circular range
    /// `(lo, hi]`.
    fn count_in_range(&self, lo: u64, hi: u64) -> f64;

    /// Returns a new summary covering only the circular range `(lo, hi]`.
    fn rebuild(&self, lo: u64, hi: u64) -> Self;

    /// Merges another summary into this one.
    fn merge(&mut self, other: &Self) -> Result<(), Error>;
}

impl FrequencySummary for RingSketch {
    fn update(&mut self, item: u64) {
        RingSketch::update(self, item);
    }

    fn estimate(&self, item: u64) -> f64 {
        RingSketch::estimate(self, item)
    }
}

impl FrequencySummary for KllSketch {
    fn update(&mut self, value: u64) {
        KllSketch::update(self, value);
    }

    fn estimate(&self, value: u64) -> f64 {
        KllSketch::estimate(self, value)
    }
}

impl QuantileSummary for KllSketch {
    fn update(&mut self, value: u64) {
        KllSketch::update(self, value);
    }

    fn update_weighted(&mut self, value: u64, weight: u64) {
        KllSketch::update_weighted(self, value, weight);
    }

    fn rank(&self, value: u64) -> f64 {
        KllSketch::rank(self, value)
    }

    fn count_in_range(&self, lo: u64, hi: u64) -> f64 {
        KllSketch::count_in_range(self, lo, hi)
    }

    fn rebuild(&self, lo: u64, hi: u64) -> KllSketch {
        KllSketch::rebuild(self, lo, hi)
    }

    fn merge(&mut self, other: &KllSketch) -> Result<(), Error> {
        KllSketch::merge(self, other)
    }
}
