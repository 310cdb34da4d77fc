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

use crate::common::RandomSource;
use crate::common::XorShift64;
use crate::error::Error;
use crate::kll::KllSketch;
use crate::ring::Ring;

/// One bucket of a row: a counter and the KLL summary of the placement-hash
/// values routed to it.
///
/// The counter mirrors the KLL's total weight (up to KLL approximation) and
/// is never consulted by estimation; it exists as a cheap integrity check.
#[derive(Debug, Clone)]
pub(crate) struct Bucket {
    pub(crate) count: u64,
    pub(crate) kll: KllSketch,
}

impl Bucket {
    pub(crate) fn new(kll_k: u16, seed: u64) -> Self {
        Self {
            count: 0,
            kll: KllSketch::with_seed(kll_k, seed),
        }
    }
}

/// One row of the sketch: a ring plus its buckets, indexed by bucket id.
#[derive(Debug, Clone)]
pub(crate) struct Row {
    pub(crate) ring: Ring,
    pub(crate) buckets: Vec<Bucket>,
}

impl Row {
    pub(crate) fn new(width: u32, kll_k: u16, rng: &mut XorShift64) -> Self {
        let ring = Ring::with_random_points(width, rng);
        let buckets = (0..width)
            .map(|_| Bucket::new(kll_k, rng.next_u64()))
            .collect();
        Self { ring, buckets }
    }

    pub(crate) fn update(&mut self, h: u64) {
        let id = self.ring.lookup(h) as usize;
        self.buckets[id].count += 1;
        self.buckets[id].kll.update(h);
    }

    pub(crate) fn estimate(&self, h: u64) -> f64 {
        let id = self.ring.lookup(h) as usize;
        self.buckets[id].kll.estimate(h)
    }
}

/// Transforms a row's buckets from one ring layout to another.
///
/// Both rings partition the hash circle into arcs; the union of their points
/// refines both partitions. On each refined arc every value lies in exactly
/// one input bucket and is destined for exactly one output bucket, so the
/// arc's sub-summary can be extracted with a range rebuild and merged into
/// its output bucket. The traversal starts from the largest refined point,
/// making the first arc the one that wraps through zero.
///
/// The output buckets summarize exactly the same stream as the input row:
/// for every value `h` previously routed through `in_ring`, the output
/// bucket holding `h` is `out_ring.lookup(h)`.
pub(crate) fn remap(
    in_ring: &Ring,
    in_buckets: &[Bucket],
    out_ring: &Ring,
    kll_k: u16,
    rng: &mut XorShift64,
) -> Result<Vec<Bucket>, Error> {
    debug_assert_eq!(in_ring.width() as usize, in_buckets.len());

    let mut out_buckets: Vec<Bucket> = (0..out_ring.width())
        .map(|_| Bucket::new(kll_k, rng.next_u64()))
        .collect();

    let mut points: Vec<u64> = in_ring.points().chain(out_ring.points()).collect();
    points.sort_unstable();
    points.dedup();

    let mut prev = match points.last() {
        Some(&point) => point,
        None => return Ok(out_buckets),
    };
    for &current in &points {
        let in_id = in_ring.lookup(prev) as usize;
        let arc_count = in_buckets[in_id].kll.count_in_range(prev, current);
        if arc_count > 0.0 {
            let out_id = out_ring.lookup(prev) as usize;
            out_buckets[out_id].count += arc_count.round() as u64;
            let sub = in_buckets[in_id].kll.rebuild(prev, current);
            out_buckets[out_id].kll.merge(&sub)?;
        }
        prev = current;
    }

    Ok(out_buckets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::RingEntry;

    fn ring_from_points(points: &[u64]) -> Ring {
        Ring::from_entries(
            points
                .iter()
                .enumerate()
                .map(|(idx, &point)| RingEntry {
                    point,
                    bucket_id: idx as u32,
                })
                .collect(),
        )
    }

    #[test]
    fn test_remap_routes_by_output_ring() {
        let mut rng = XorShift64::seeded(3);
        let in_ring = ring_from_points(&[1 << 62, 3 << 62]);
        let out_ring = ring_from_points(&[1 << 61, 1 << 62, 1 << 63, 3 << 62]);

        let mut in_buckets: Vec<Bucket> = (0..2).map(|_| Bucket::new(256, rng.next_u64())).collect();
        let mut values = Vec::new();
        let mut gen = XorShift64::seeded(17);
        for _ in 0..200 {
            let h = gen.next_u64();
            let id = in_ring.lookup(h) as usize;
            in_buckets[id].count += 1;
            in_buckets[id].kll.update(h);
            values.push(h);
        }

        let out_buckets = remap(&in_ring, &in_buckets, &out_ring, 256, &mut rng).unwrap();

        // Small enough that no compaction happened anywhere: the remap is an
        // exact redistribution.
        for h in values {
            let out_id = out_ring.lookup(h) as usize;
            assert!(out_buckets[out_id].kll.estimate(h) >= 1.0);
            for (id, bucket) in out_buckets.iter().enumerate() {
                if id != out_id {
                    assert_eq!(bucket.kll.estimate(h), 0.0);
                }
            }
        }
        let total: u64 = out_buckets.iter().map(|b| b.count).sum();
        assert_eq!(total, 200);
    }

    #[test]
    fn test_remap_preserves_wrapped_arc() {
        let mut rng = XorShift64::seeded(5);
        // All mass above the last ring point or below the first one lives on
        // the wrapped arc.
        let in_ring = ring_from_points(&[100, 200]);
        let out_ring = ring_from_points(&[150, 250]);

        let mut in_buckets: Vec<Bucket> = (0..2).map(|_| Bucket::new(64, rng.next_u64())).collect();
        for h in [u64::MAX - 3, u64::MAX, 5, 50, 220] {
            let id = in_ring.lookup(h) as usize;
            in_buckets[id].count += 1;
            in_buckets[id].kll.update(h);
        }

        let out_buckets = remap(&in_ring, &in_buckets, &out_ring, 64, &mut rng).unwrap();
        let total_weight: u64 = out_buckets.iter().map(|b| b.kll.retained_weight()).sum();
        assert_eq!(total_weight, 5);
        for h in [u64::MAX - 3, u64::MAX, 5, 50, 220] {
            let out_id = out_ring.lookup(h) as usize;
            assert_eq!(out_buckets[out_id].kll.estimate(h), 1.0);
        }
    }
}
