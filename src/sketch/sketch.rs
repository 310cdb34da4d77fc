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

use super::row::remap;
use super::row::Row;
use super::DEFAULT_DEPTH;
use super::DEFAULT_KLL_K;
use crate::common::RandomSource;
use crate::common::XorShift64;
use crate::error::Error;
use crate::hash::partition_hash;
use crate::hash::PlacementHash;
use crate::kll::KllSketch;
use crate::ring::intersect_ranges;
use crate::ring::ranges_contain;
use crate::ring::union_ranges;
use crate::ring::HashRange;
use crate::ring::Ring;
use crate::ring::RingEntry;

/// Frequency-estimation sketch built on per-row consistent-hash rings and
/// per-bucket KLL summaries.
///
/// See the [sketch module level documentation](crate::sketch) for more.
#[derive(Debug, Clone)]
pub struct RingSketch {
    depth: u32,
    width: u32,
    kll_k: u16,
    partition_seed: u32,
    row_seeds: Vec<u32>,
    placements: Vec<PlacementHash>,
    rows: Vec<Row>,
    coverage: Vec<HashRange>,
    rng: XorShift64,
}

impl RingSketch {
    /// Create a new builder for RingSketch.
    ///
    /// # Examples
    ///
    /// ```
    /// # use ringsketch::sketch::RingSketch;
    /// let sketch = RingSketch::builder().width(32).seed(1).build().unwrap();
    /// assert_eq!(sketch.width(), 32);
    /// ```
    pub fn builder() -> RingSketchBuilder {
        RingSketchBuilder::default()
    }

    /// Creates a sketch sized to a memory budget: the largest feasible width
    /// for the given depth and KLL parameter.
    pub fn from_budget(bytes: u64, depth: u32, kll_k: u16, seed: u64) -> Result<Self, Error> {
        Self::builder()
            .depth(depth)
            .kll_k(kll_k)
            .memory_budget(bytes)
            .seed(seed)
            .build()
    }

    /// Solves the memory model `bytes = depth * width * kll_max_memory(k)`
    /// for the largest feasible width.
    ///
    /// Returns `ConfigInvalid` if the budget does not fit a single bucket
    /// per row or the depth is zero.
    pub fn max_width_for_budget(bytes: u64, depth: u32, kll_k: u16) -> Result<u32, Error> {
        if depth == 0 {
            return Err(Error::config_invalid("depth must be >= 1"));
        }
        let per_width = depth as u64 * KllSketch::max_memory_bytes(kll_k);
        let width = bytes / per_width;
        if width == 0 {
            return Err(Error::config_invalid(
                "memory budget too small for a single bucket per row",
            )
            .with_context("bytes", bytes)
            .with_context("bytes_per_width", per_width));
        }
        Ok(width.min(u32::MAX as u64) as u32)
    }

    /// Number of rows.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Number of buckets per row.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// KLL parameter of the bucket summaries.
    pub fn kll_k(&self) -> u16 {
        self.kll_k
    }

    /// The sketch-wide partition hash seed.
    pub fn partition_seed(&self) -> u32 {
        self.partition_seed
    }

    /// Per-row placement hash seeds.
    pub fn row_seeds(&self) -> &[u32] {
        &self.row_seeds
    }

    /// Worst-case memory footprint of the bucket summaries, in bytes.
    pub fn get_max_memory_usage(&self) -> u64 {
        self.depth as u64 * self.width as u64 * KllSketch::max_memory_bytes(self.kll_k)
    }

    /// Ingests one occurrence of an item.
    pub fn update(&mut self, item: u64) {
        let p = partition_hash(item, self.partition_seed);
        for (row, placement) in self.rows.iter_mut().zip(self.placements.iter()) {
            row.update(placement.place(p));
        }
    }

    /// Returns the estimated number of occurrences of an item.
    ///
    /// The estimate is the mean of the per-row KLL estimates. Each row's
    /// per-value estimator is unbiased in expectation, so averaging reduces
    /// variance (unlike the minimum used by Count-Min, whose per-row counts
    /// are biased upward by collisions).
    pub fn estimate(&self, item: u64) -> f64 {
        let p = partition_hash(item, self.partition_seed);
        let total: f64 = self
            .rows
            .iter()
            .zip(self.placements.iter())
            .map(|(row, placement)| row.estimate(placement.place(p)))
            .sum();
        total / self.depth as f64
    }

    /// Grows the sketch to a larger width in place.
    ///
    /// Each row's ring gains `new_width - width` fresh random points with
    /// sequential bucket ids, and the row's summaries are remapped onto the
    /// refined ring. Estimates are preserved up to KLL rebuild error.
    ///
    /// Returns `InvalidResize` if `new_width` is not larger than the current
    /// width; the sketch is untouched on error.
    pub fn expand(&mut self, new_width: u32) -> Result<(), Error> {
        if new_width <= self.width {
            return Err(Error::invalid_resize(
                "expand requires a width larger than the current one",
            )
            .with_context("width", self.width)
            .with_context("new_width", new_width));
        }

        let additional = new_width - self.width;
        let kll_k = self.kll_k;
        let rng = &mut self.rng;
        for row in self.rows.iter_mut() {
            let mut new_ring = row.ring.clone();
            new_ring.extend_random(additional, rng);
            let new_buckets = remap(&row.ring, &row.buckets, &new_ring, kll_k, rng)?;
            row.ring = new_ring;
            row.buckets = new_buckets;
        }
        self.width = new_width;
        Ok(())
    }

    /// Shrinks the sketch to a smaller, non-zero width in place.
    ///
    /// Each row keeps `new_width` uniformly random ring points (reindexed
    /// contiguously) and the row's summaries are remapped onto the coarser
    /// ring, folding evicted arcs into their successors.
    ///
    /// Returns `InvalidResize` if `new_width` is zero or not smaller than
    /// the current width; the sketch is untouched on error.
    pub fn shrink(&mut self, new_width: u32) -> Result<(), Error> {
        if new_width == 0 || new_width >= self.width {
            return Err(Error::invalid_resize(
                "shrink requires a width in 1..current width",
            )
            .with_context("width", self.width)
            .with_context("new_width", new_width));
        }

        let kll_k = self.kll_k;
        let rng = &mut self.rng;
        for row in self.rows.iter_mut() {
            let mut new_ring = row.ring.clone();
            new_ring.shrink_random(new_width, rng);
            let new_buckets = remap(&row.ring, &row.buckets, &new_ring, kll_k, rng)?;
            row.ring = new_ring;
            row.buckets = new_buckets;
        }
        self.width = new_width;
        Ok(())
    }

    /// Combines two independently built sketches into one of width
    /// `s1.width() + s2.width()`.
    ///
    /// Per row, the two rings are concatenated (the second sketch's bucket
    /// ids offset by `s1.width()`) and both sources are remapped onto the
    /// union ring, so both histories survive without reweighting. Memory
    /// grows accordingly; compose with [`RingSketch::shrink`] for a
    /// width-fixed merge. The result is responsible for the union of the
    /// inputs' key-domain partitions.
    ///
    /// Returns `IncompatibleSketches` unless the inputs agree on depth, KLL
    /// parameter, partition seed and per-row seeds.
    pub fn merge(s1: &RingSketch, s2: &RingSketch) -> Result<RingSketch, Error> {
        if s1.depth != s2.depth {
            return Err(Error::incompatible_sketches("sketches differ in depth")
                .with_context("depth", s1.depth)
                .with_context("other_depth", s2.depth));
        }
        if s1.kll_k != s2.kll_k {
            return Err(Error::incompatible_sketches("sketches differ in kll_k")
                .with_context("kll_k", s1.kll_k)
                .with_context("other_kll_k", s2.kll_k));
        }
        if s1.partition_seed != s2.partition_seed {
            return Err(Error::incompatible_sketches(
                "sketches differ in partition seed",
            ));
        }
        if s1.row_seeds != s2.row_seeds {
            return Err(Error::incompatible_sketches("sketches differ in row seeds"));
        }
        let new_width = s1
            .width
            .checked_add(s2.width)
            .ok_or_else(|| Error::config_invalid("merged width overflows u32"))?;

        let mut rng = s1.rng;
        let mut rows = Vec::with_capacity(s1.depth as usize);
        for (r1, r2) in s1.rows.iter().zip(s2.rows.iter()) {
            let mut entries: Vec<RingEntry> = r1.ring.entries().to_vec();
            entries.extend(r2.ring.entries().iter().map(|entry| RingEntry {
                point: entry.point,
                bucket_id: entry.bucket_id + s1.width,
            }));
            let merged_ring = Ring::from_entries(entries);

            let mut buckets = remap(&r1.ring, &r1.buckets, &merged_ring, s1.kll_k, &mut rng)?;
            let other = remap(&r2.ring, &r2.buckets, &merged_ring, s1.kll_k, &mut rng)?;
            for (bucket, from_other) in buckets.iter_mut().zip(other.iter()) {
                bucket.count += from_other.count;
                bucket.kll.merge(&from_other.kll)?;
            }
            rows.push(Row {
                ring: merged_ring,
                buckets,
            });
        }

        Ok(RingSketch {
            depth: s1.depth,
            width: new_width,
            kll_k: s1.kll_k,
            partition_seed: s1.partition_seed,
            row_seeds: s1.row_seeds.clone(),
            placements: s1.placements.clone(),
            rows,
            coverage: union_ranges(&s1.coverage, &s2.coverage),
            rng,
        })
    }

    /// Splits a sketch into two whose combined responsibility covers the
    /// parent's key domain.
    ///
    /// Per row, the first `w1` ring entries (in ring order) and their
    /// buckets go to the first child and the rest to the second, with bucket
    /// ids reindexed contiguously; no summaries are rebuilt. Each child's
    /// partition responsibility is the parent's intersected with the arcs
    /// its row-0 entries covered on the parent ring, so for any item exactly
    /// one child reports [`RingSketch::is_responsible_for`].
    ///
    /// Returns `InvalidSplit` unless `w1` and `w2` are non-zero and sum to
    /// the parent's width.
    pub fn split(sketch: &RingSketch, w1: u32, w2: u32) -> Result<(RingSketch, RingSketch), Error> {
        let valid = w1 != 0 && w2 != 0 && w1.checked_add(w2) == Some(sketch.width);
        if !valid {
            return Err(Error::invalid_split(
                "split widths must be non-zero and sum to the sketch width",
            )
            .with_context("width", sketch.width)
            .with_context("w1", w1)
            .with_context("w2", w2));
        }

        let mut left_rows = Vec::with_capacity(sketch.depth as usize);
        let mut right_rows = Vec::with_capacity(sketch.depth as usize);
        for row in &sketch.rows {
            let (left, right) = row.ring.entries().split_at(w1 as usize);
            left_rows.push(child_row(left, row));
            right_rows.push(child_row(right, row));
        }

        // Responsibility is delimited on the canonical reference row.
        let row0 = sketch.rows[0].ring.entries();
        let boundary = row0[w1 as usize - 1].point;
        let last = row0[row0.len() - 1].point;
        let left_arc = HashRange {
            lo: last,
            hi: boundary,
        };
        let right_arc = HashRange {
            lo: boundary,
            hi: last,
        };

        let mut rng = sketch.rng;
        let left_rng = XorShift64::seeded(rng.next_u64());
        let right_rng = XorShift64::seeded(rng.next_u64());

        let left = RingSketch {
            depth: sketch.depth,
            width: w1,
            kll_k: sketch.kll_k,
            partition_seed: sketch.partition_seed,
            row_seeds: sketch.row_seeds.clone(),
            placements: sketch.placements.clone(),
            rows: left_rows,
            coverage: intersect_ranges(&sketch.coverage, &[left_arc]),
            rng: left_rng,
        };
        let right = RingSketch {
            depth: sketch.depth,
            width: w2,
            kll_k: sketch.kll_k,
            partition_seed: sketch.partition_seed,
            row_seeds: sketch.row_seeds.clone(),
            placements: sketch.placements.clone(),
            rows: right_rows,
            coverage: intersect_ranges(&sketch.coverage, &[right_arc]),
            rng: right_rng,
        };
        Ok((left, right))
    }

    /// Returns true if this sketch is responsible for the item's region of
    /// the key domain.
    ///
    /// A freshly built sketch is responsible for everything; children of a
    /// [`RingSketch::split`] partition the parent's responsibility between
    /// them, and [`RingSketch::merge`] unions it back. Responsibility is
    /// delimited on row 0, the canonical reference row: the remaining rows
    /// sample their rings independently and induce partitions that differ
    /// from row 0's near arc boundaries.
    pub fn is_responsible_for(&self, item: u64) -> bool {
        let p = partition_hash(item, self.partition_seed);
        ranges_contain(&self.coverage, self.placements[0].place(p))
    }

    /// Returns the arcs of the (row-0) hash domain this sketch is
    /// responsible for.
    ///
    /// Arcs are half-open `(lo, hi]`; an unsplit sketch reports a single arc
    /// covering the full domain.
    pub fn get_partition_ranges(&self) -> Vec<HashRange> {
        self.coverage.clone()
    }
}

fn child_row(entries: &[RingEntry], parent: &Row) -> Row {
    let ring = Ring::from_entries(
        entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| RingEntry {
                point: entry.point,
                bucket_id: idx as u32,
            })
            .collect(),
    );
    let buckets = entries
        .iter()
        .map(|entry| parent.buckets[entry.bucket_id as usize].clone())
        .collect();
    Row { ring, buckets }
}

/// Builder for [`RingSketch`].
///
/// Either a width or a memory budget must be provided; everything else has
/// defaults. All randomness is derived from the master seed, so two builds
/// with the same parameters produce identical sketches.
#[derive(Debug, Clone, Default)]
pub struct RingSketchBuilder {
    depth: Option<u32>,
    width: Option<u32>,
    memory_budget: Option<u64>,
    kll_k: Option<u16>,
    partition_seed: Option<u32>,
    row_seeds: Option<Vec<u32>>,
    seed: Option<u64>,
}

impl RingSketchBuilder {
    /// Sets the number of rows.
    pub fn depth(mut self, depth: u32) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Sets the number of buckets per row.
    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    /// Sizes the width from a memory budget in bytes.
    pub fn memory_budget(mut self, bytes: u64) -> Self {
        self.memory_budget = Some(bytes);
        self
    }

    /// Sets the KLL parameter of the bucket summaries.
    pub fn kll_k(mut self, kll_k: u16) -> Self {
        self.kll_k = Some(kll_k);
        self
    }

    /// Pins the partition hash seed instead of deriving it from the master
    /// seed.
    pub fn partition_seed(mut self, seed: u32) -> Self {
        self.partition_seed = Some(seed);
        self
    }

    /// Pins the per-row placement seeds instead of deriving them from the
    /// master seed. Must contain exactly `depth` seeds.
    pub fn row_seeds(mut self, seeds: Vec<u32>) -> Self {
        self.row_seeds = Some(seeds);
        self
    }

    /// Sets the master seed all remaining randomness is derived from.
    ///
    /// Without it the sketch is seeded from the clock.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builds the sketch.
    ///
    /// Returns `ConfigInvalid` when the parameters are unusable: zero depth,
    /// width or KLL parameter, a missing (or ambiguous) size, a budget too
    /// small for one bucket per row, or a row seed list of the wrong length.
    pub fn build(self) -> Result<RingSketch, Error> {
        let depth = self.depth.unwrap_or(DEFAULT_DEPTH);
        if depth == 0 {
            return Err(Error::config_invalid("depth must be >= 1"));
        }
        let kll_k = self.kll_k.unwrap_or(DEFAULT_KLL_K);
        if kll_k == 0 {
            return Err(Error::config_invalid("kll_k must be >= 1"));
        }

        let width = match (self.width, self.memory_budget) {
            (Some(width), None) => width,
            (None, Some(bytes)) => RingSketch::max_width_for_budget(bytes, depth, kll_k)?,
            (None, None) => {
                return Err(Error::config_invalid(
                    "either a width or a memory budget is required",
                ));
            }
            (Some(_), Some(_)) => {
                return Err(Error::config_invalid(
                    "width and memory budget are mutually exclusive",
                ));
            }
        };
        if width == 0 {
            return Err(Error::config_invalid("width must be >= 1"));
        }

        let mut rng = match self.seed {
            Some(seed) => XorShift64::seeded(seed),
            None => XorShift64::default(),
        };

        let partition_seed = self
            .partition_seed
            .unwrap_or_else(|| rng.next_u64() as u32);
        let row_seeds = match self.row_seeds {
            Some(seeds) => {
                if seeds.len() != depth as usize {
                    return Err(Error::config_invalid(
                        "row seed list length must equal depth",
                    )
                    .with_context("depth", depth)
                    .with_context("row_seeds", seeds.len()));
                }
                seeds
            }
            None => (0..depth).map(|_| rng.next_u64() as u32).collect(),
        };
        let placements: Vec<PlacementHash> = row_seeds
            .iter()
            .map(|&seed| PlacementHash::from_seed(seed))
            .collect();

        let rows = (0..depth)
            .map(|_| Row::new(width, kll_k, &mut rng))
            .collect();

        Ok(RingSketch {
            depth,
            width,
            kll_k,
            partition_seed,
            row_seeds,
            placements,
            rows,
            coverage: vec![HashRange::full()],
            rng,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_a_size() {
        let err = RingSketch::builder().seed(1).build().unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_counts_mirror_kll_weight() {
        let mut sketch = RingSketch::builder()
            .depth(2)
            .width(8)
            .kll_k(1024)
            .seed(9)
            .build()
            .unwrap();
        for item in 0..500u64 {
            sketch.update(item % 40);
        }
        for row in &sketch.rows {
            let counts: u64 = row.buckets.iter().map(|b| b.count).sum();
            let weights: u64 = row.buckets.iter().map(|b| b.kll.retained_weight()).sum();
            assert_eq!(counts, 500);
            assert_eq!(weights, 500);
        }
    }

    #[test]
    fn test_split_carries_buckets_with_their_arcs() {
        let mut sketch = RingSketch::builder()
            .depth(1)
            .width(16)
            .kll_k(1024)
            .seed(4)
            .build()
            .unwrap();
        for item in 0..200u64 {
            sketch.update(item);
        }
        let (left, right) = RingSketch::split(&sketch, 10, 6).unwrap();
        for item in 0..200u64 {
            let child = if left.is_responsible_for(item) {
                &left
            } else {
                &right
            };
            assert_eq!(child.estimate(item), sketch.estimate(item));
        }
    }
}
