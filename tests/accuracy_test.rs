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

mod common;

use common::average_relative_error;
use common::top_k;
use common::true_frequencies;
use common::zipf_stream;
use ringsketch::sketch::RingSketch;

// Skewed-workload accuracy at the sketch's working point: heavy hitters of a
// zipfian stream must be recovered with low relative error.
#[test]
fn test_zipf_heavy_hitter_accuracy() {
    let stream = zipf_stream(1_000_000, 10_000, 1.1, 1);

    let mut sketch = RingSketch::builder()
        .depth(4)
        .width(256)
        .kll_k(30)
        .seed(42)
        .build()
        .unwrap();
    for &item in &stream {
        sketch.update(item);
    }

    let freqs = true_frequencies(&stream);
    let heavy = top_k(&freqs, 100);
    let are = average_relative_error(&sketch, &heavy, &freqs);
    assert!(are < 0.10, "top-100 ARE {are} must stay below 0.10");
}

// Estimates are unbiased per row, so averaging rows keeps single-item error
// roughly symmetric around the truth even under compaction.
#[test]
fn test_estimates_track_truth_for_mid_ranks() {
    let stream = zipf_stream(300_000, 2_000, 1.1, 2);

    let mut sketch = RingSketch::builder()
        .depth(4)
        .width(128)
        .kll_k(30)
        .seed(7)
        .build()
        .unwrap();
    for &item in &stream {
        sketch.update(item);
    }

    let freqs = true_frequencies(&stream);
    let heavy = top_k(&freqs, 20);
    for &item in &heavy {
        let truth = freqs[&item] as f64;
        let estimate = sketch.estimate(item);
        assert!(
            (estimate - truth).abs() < 0.25 * truth + 200.0,
            "estimate {estimate} strays from truth {truth} for item {item}"
        );
    }
}
