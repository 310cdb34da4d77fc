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

//! Resizable, mergeable, partitionable frequency-estimation sketch.
//!
//! [`RingSketch`] ingests a stream of `u64` item identifiers and answers
//! per-item frequency queries with bounded error in sublinear memory, like a
//! Count-Min sketch — but a live sketch can also grow ([`RingSketch::expand`]),
//! give memory back ([`RingSketch::shrink`]), absorb an independently built
//! sketch ([`RingSketch::merge`]) and be cut into two sketches that partition
//! the key domain between them ([`RingSketch::split`]), all without touching
//! the original stream.
//!
//! Each of the sketch's `depth` rows is a consistent-hash ring whose buckets
//! own a KLL summary of the placement-hash values routed to them. Because
//! the summaries are keyed by position on the ring, any re-arrangement of
//! ring arcs can be replayed on the summaries with range rebuilds; that one
//! mechanism underlies all four structural operations.
//!
//! # Usage
//!
//! ```rust
//! # use ringsketch::sketch::RingSketch;
//! let mut sketch = RingSketch::builder()
//!     .depth(4)
//!     .width(64)
//!     .kll_k(200)
//!     .seed(42)
//!     .build()
//!     .unwrap();
//!
//! for _ in 0..10 {
//!     sketch.update(7);
//! }
//! assert_eq!(sketch.estimate(7), 10.0);
//!
//! sketch.expand(128).unwrap();
//! assert_eq!(sketch.estimate(7), 10.0);
//! ```

mod row;
mod sketch;

pub use self::sketch::RingSketch;
pub use self::sketch::RingSketchBuilder;

/// Default number of rows.
pub const DEFAULT_DEPTH: u32 = 4;
/// Default KLL parameter for bucket summaries.
pub const DEFAULT_KLL_K: u16 = 200;
