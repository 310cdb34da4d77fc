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

#![allow(dead_code)]

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use rand_distr::Zipf;
use ringsketch::sketch::RingSketch;

/// Draws `len` items from Zipf(`diversity`, `exponent`) with a seeded RNG.
/// Items are the ranks themselves, in `1..=diversity`.
pub fn zipf_stream(len: usize, diversity: u64, exponent: f64, seed: u64) -> Vec<u64> {
    let dist = Zipf::new(diversity as f64, exponent).expect("valid zipf parameters");
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.sample(dist) as u64).collect()
}

/// Exact per-item frequencies of a stream.
pub fn true_frequencies(stream: &[u64]) -> HashMap<u64, u64> {
    let mut freqs = HashMap::new();
    for &item in stream {
        *freqs.entry(item).or_insert(0) += 1;
    }
    freqs
}

/// The `k` most frequent items, most frequent first.
pub fn top_k(freqs: &HashMap<u64, u64>, k: usize) -> Vec<u64> {
    let mut items: Vec<(u64, u64)> = freqs.iter().map(|(&item, &count)| (item, count)).collect();
    items.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    items.into_iter().take(k).map(|(item, _)| item).collect()
}

/// Average relative error of the sketch's estimates over the given items.
pub fn average_relative_error(
    sketch: &RingSketch,
    items: &[u64],
    freqs: &HashMap<u64, u64>,
) -> f64 {
    assert!(!items.is_empty());
    let mut total = 0.0;
    for &item in items {
        let truth = freqs.get(&item).copied().unwrap_or(0) as f64;
        assert!(truth > 0.0, "items must occur in the stream");
        total += (sketch.estimate(item) - truth).abs() / truth;
    }
    total / items.len() as f64
}
