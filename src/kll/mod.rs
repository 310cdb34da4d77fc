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

//! KLL sketch used as a weighted-multiset summary over 64-bit hash values.
//!
//! This is a compactor-stack quantiles sketch with lazy compaction: items
//! enter level 0 with weight 1, and a full level is sorted and halved by
//! keeping every other element from a random offset, promoting the survivors
//! one level up where each carries twice the weight. On top of the usual
//! rank machinery it supports per-value count estimation, counting over a
//! circular value range, and rebuilding the sub-summary for a range without
//! recompaction — the operations that ring remapping is built from.
//!
//! # Usage
//!
//! ```rust
//! # use ringsketch::kll::KllSketch;
//! let mut sketch = KllSketch::with_seed(200, 1);
//! sketch.update(42);
//! sketch.update(42);
//! sketch.update(7);
//! assert_eq!(sketch.estimate(42), 2.0);
//! assert_eq!(sketch.count_in_range(6, 42), 3.0);
//! ```

mod sketch;

pub use self::sketch::KllSketch;

/// Default value of parameter k.
pub const DEFAULT_K: u16 = 200;
/// Minimum value of parameter k.
pub const MIN_K: u16 = 1;
/// Ratio between the capacities of adjacent compactor levels.
pub(crate) const COMPACTION_RATE: f64 = 2.0 / 3.0;
