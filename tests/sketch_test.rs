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

use common::true_frequencies;
use common::zipf_stream;
use googletest::assert_that;
use googletest::prelude::contains_substring;
use ringsketch::error::ErrorKind;
use ringsketch::kll::KllSketch;
use ringsketch::sketch::RingSketch;

#[test]
fn test_builder_defaults_and_getters() {
    let sketch = RingSketch::builder()
        .depth(3)
        .width(64)
        .kll_k(100)
        .seed(1)
        .build()
        .unwrap();
    assert_eq!(sketch.depth(), 3);
    assert_eq!(sketch.width(), 64);
    assert_eq!(sketch.kll_k(), 100);
    assert_eq!(sketch.row_seeds().len(), 3);
}

#[test]
fn test_builder_rejects_bad_configs() {
    let err = RingSketch::builder().depth(0).width(8).build().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigInvalid);

    let err = RingSketch::builder().width(0).build().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigInvalid);

    let err = RingSketch::builder().width(8).kll_k(0).build().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigInvalid);

    let err = RingSketch::builder().seed(1).build().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    assert_that!(err.message(), contains_substring("memory budget"));

    let err = RingSketch::builder()
        .width(8)
        .memory_budget(1 << 20)
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    assert_that!(err.message(), contains_substring("mutually exclusive"));

    let err = RingSketch::builder()
        .depth(2)
        .width(8)
        .row_seeds(vec![1, 2, 3])
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
}

#[test]
fn test_empty_sketch() {
    let sketch = RingSketch::builder().width(16).seed(3).build().unwrap();
    for item in [0u64, 1, 42, u64::MAX] {
        assert_eq!(sketch.estimate(item), 0.0);
        assert!(sketch.is_responsible_for(item));
    }
    let ranges = sketch.get_partition_ranges();
    assert_eq!(ranges.len(), 1);
    assert!(ranges[0].is_full());
}

#[test]
fn test_exact_counts_on_small_stream() {
    let mut sketch = RingSketch::builder()
        .depth(3)
        .width(16)
        .kll_k(1024)
        .seed(5)
        .build()
        .unwrap();

    let stream = zipf_stream(1_000, 50, 1.1, 17);
    for &item in &stream {
        sketch.update(item);
    }

    // Every bucket holds fewer values than the KLL capacity, so no
    // compaction has happened and estimates are exact.
    let freqs = true_frequencies(&stream);
    for (&item, &count) in &freqs {
        assert_eq!(sketch.estimate(item), count as f64);
    }
    assert_eq!(sketch.estimate(999_999), 0.0);
}

#[test]
fn test_width_one_degenerates_to_one_kll_per_row() {
    let mut sketch = RingSketch::builder()
        .depth(2)
        .width(1)
        .kll_k(1024)
        .seed(6)
        .build()
        .unwrap();
    for item in 0..100u64 {
        for _ in 0..(item % 5) {
            sketch.update(item);
        }
    }
    for item in 0..100u64 {
        assert_eq!(sketch.estimate(item), (item % 5) as f64);
    }
}

#[test]
fn test_depth_one_single_row() {
    let mut sketch = RingSketch::builder()
        .depth(1)
        .width(8)
        .kll_k(1024)
        .seed(7)
        .build()
        .unwrap();
    for _ in 0..250 {
        sketch.update(77);
    }
    assert_eq!(sketch.estimate(77), 250.0);
}

#[test]
fn test_same_seed_same_sketch() {
    let build = || {
        let mut sketch = RingSketch::builder()
            .depth(4)
            .width(32)
            .kll_k(30)
            .seed(99)
            .build()
            .unwrap();
        for &item in &zipf_stream(20_000, 500, 1.2, 123) {
            sketch.update(item);
        }
        sketch
    };
    let a = build();
    let b = build();
    for item in 1..=500u64 {
        assert_eq!(a.estimate(item), b.estimate(item));
    }
}

#[test]
fn test_structural_ops_on_empty_sketch() {
    let mut sketch = RingSketch::builder()
        .depth(2)
        .width(16)
        .kll_k(64)
        .seed(21)
        .build()
        .unwrap();

    sketch.expand(32).unwrap();
    sketch.shrink(16).unwrap();
    assert_eq!(sketch.estimate(42), 0.0);

    let (left, right) = RingSketch::split(&sketch, 8, 8).unwrap();
    assert_eq!(left.estimate(42), 0.0);
    assert_eq!(right.estimate(42), 0.0);

    let merged = RingSketch::merge(&left, &right).unwrap();
    assert_eq!(merged.width(), 16);
    assert_eq!(merged.estimate(42), 0.0);
}

#[test]
fn test_memory_model_and_budget_inverse() {
    let sketch = RingSketch::builder()
        .depth(4)
        .width(64)
        .kll_k(30)
        .seed(1)
        .build()
        .unwrap();
    let expected = 4 * 64 * KllSketch::max_memory_bytes(30);
    assert_eq!(sketch.get_max_memory_usage(), expected);

    assert_eq!(RingSketch::max_width_for_budget(expected, 4, 30).unwrap(), 64);

    let from_budget = RingSketch::from_budget(expected, 4, 30, 1).unwrap();
    assert_eq!(from_budget.width(), 64);
    assert_eq!(from_budget.get_max_memory_usage(), expected);

    let err = RingSketch::max_width_for_budget(10, 4, 30).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
}
