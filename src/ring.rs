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

//! Consistent-hash ring of one sketch row, plus circular-arc ranges.
//!
//! A ring is a sorted sequence of `(point, bucket_id)` entries over the full
//! `u64` domain treated as a circle. An entry owns the arc between its
//! predecessor's point (exclusive) and its own point (inclusive); the first
//! entry's arc wraps around zero. Lookup resolves a hash to the entry with
//! the smallest point strictly greater than it, wrapping to the front —
//! the strict comparison pairs with the `(lo, hi]` range convention used by
//! the bucket summaries.

use crate::common::shuffle;
use crate::common::RandomSource;

/// One `(point, bucket_id)` entry on a ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingEntry {
    /// Position of the entry on the hash circle.
    pub point: u64,
    /// Bucket the entry routes to.
    pub bucket_id: u32,
}

/// Consistent-hash ring: ring points sorted ascending, each carrying a
/// bucket id. Bucket ids form a permutation of `0..width`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ring {
    entries: Vec<RingEntry>,
}

impl Ring {
    /// Creates a ring of `width` uniformly random points with bucket ids
    /// `0..width` assigned in insertion order.
    pub fn with_random_points<R: RandomSource>(width: u32, rng: &mut R) -> Self {
        let entries = (0..width)
            .map(|bucket_id| RingEntry {
                point: rng.next_u64(),
                bucket_id,
            })
            .collect();
        Self::from_entries(entries)
    }

    /// Builds a ring from existing entries, sorting them by point.
    pub fn from_entries(mut entries: Vec<RingEntry>) -> Self {
        entries.sort_by_key(|entry| entry.point);
        debug_assert!(
            entries.windows(2).all(|w| w[0].point < w[1].point),
            "ring points must be distinct"
        );
        Self { entries }
    }

    /// Number of entries (buckets) on the ring.
    pub fn width(&self) -> u32 {
        self.entries.len() as u32
    }

    /// Returns the entries in ring order.
    pub fn entries(&self) -> &[RingEntry] {
        &self.entries
    }

    /// Iterates the ring points in ascending order.
    pub fn points(&self) -> impl Iterator<Item = u64> + '_ {
        self.entries.iter().map(|entry| entry.point)
    }

    /// Resolves a hash to the bucket id owning it: the entry with the
    /// smallest point strictly greater than `h`, wrapping to the first
    /// entry when no such point exists.
    ///
    /// # Panics
    ///
    /// Panics if the ring is empty.
    pub fn lookup(&self, h: u64) -> u32 {
        assert!(!self.entries.is_empty(), "lookup on an empty ring");
        let idx = self.entries.partition_point(|entry| entry.point <= h);
        let idx = if idx == self.entries.len() { 0 } else { idx };
        self.entries[idx].bucket_id
    }

    /// Appends `additional` random points with fresh sequential bucket ids
    /// starting at the current width, then resorts.
    pub fn extend_random<R: RandomSource>(&mut self, additional: u32, rng: &mut R) {
        let next_id = self.width();
        for offset in 0..additional {
            self.entries.push(RingEntry {
                point: rng.next_u64(),
                bucket_id: next_id + offset,
            });
        }
        self.entries.sort_by_key(|entry| entry.point);
    }

    /// Keeps `new_width` uniformly random survivors and reindexes their
    /// bucket ids contiguously to `0..new_width`, ordered by original id.
    ///
    /// # Panics
    ///
    /// Panics if `new_width` is zero or not smaller than the current width.
    pub fn shrink_random<R: RandomSource>(&mut self, new_width: u32, rng: &mut R) {
        assert!(
            new_width > 0 && new_width < self.width(),
            "new_width must be in 1..width"
        );
        shuffle(&mut self.entries, rng);
        self.entries.truncate(new_width as usize);

        self.entries.sort_by_key(|entry| entry.bucket_id);
        for (index, entry) in self.entries.iter_mut().enumerate() {
            entry.bucket_id = index as u32;
        }
        self.entries.sort_by_key(|entry| entry.point);
    }

    /// Returns the arcs on the circle owned by the given bucket, one per
    /// ring entry carrying its id.
    pub fn partition_ranges_for(&self, bucket_id: u32) -> Vec<HashRange> {
        let mut arcs = Vec::new();
        for (idx, entry) in self.entries.iter().enumerate() {
            if entry.bucket_id != bucket_id {
                continue;
            }
            let prev = if idx == 0 {
                self.entries[self.entries.len() - 1].point
            } else {
                self.entries[idx - 1].point
            };
            arcs.push(HashRange {
                lo: prev,
                hi: entry.point,
            });
        }
        arcs
    }
}

/// A circular arc `(lo, hi]` on the `u64` hash circle.
///
/// `lo >= hi` denotes an arc that wraps through zero; `lo == hi` denotes the
/// full circle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashRange {
    /// Exclusive lower endpoint.
    pub lo: u64,
    /// Inclusive upper endpoint.
    pub hi: u64,
}

impl HashRange {
    /// The arc covering the full hash circle.
    pub fn full() -> Self {
        Self { lo: 0, hi: 0 }
    }

    /// Returns true if this arc covers the full circle.
    pub fn is_full(&self) -> bool {
        self.lo == self.hi
    }

    /// Returns true if the arc contains the value.
    pub fn contains(&self, value: u64) -> bool {
        if self.lo < self.hi {
            value > self.lo && value <= self.hi
        } else {
            value > self.lo || value <= self.hi
        }
    }
}

/// Returns true if any arc in the set contains the value.
pub(crate) fn ranges_contain(ranges: &[HashRange], value: u64) -> bool {
    ranges.iter().any(|range| range.contains(value))
}

/// Intersection of two arc sets.
pub(crate) fn intersect_ranges(a: &[HashRange], b: &[HashRange]) -> Vec<HashRange> {
    let left = to_spans(a);
    let right = to_spans(b);

    let mut spans = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        let start = left[i].0.max(right[j].0);
        let end = left[i].1.min(right[j].1);
        if start < end {
            spans.push((start, end));
        }
        if left[i].1 <= right[j].1 {
            i += 1;
        } else {
            j += 1;
        }
    }
    from_spans(spans)
}

/// Union of two arc sets.
pub(crate) fn union_ranges(a: &[HashRange], b: &[HashRange]) -> Vec<HashRange> {
    let mut spans = to_spans(a);
    spans.extend(to_spans(b));
    spans.sort_unstable();

    let mut merged: Vec<(u128, u128)> = Vec::new();
    for (start, end) in spans {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    from_spans(merged)
}

const DOMAIN_END: u128 = 1 << 64;

// Unrolls circular arcs into sorted linear half-open spans over
// [0, 2^64), widened to u128 so the domain end is representable.
// Empty spans are dropped so they cannot round-trip into full arcs.
fn to_spans(ranges: &[HashRange]) -> Vec<(u128, u128)> {
    let mut spans = Vec::with_capacity(ranges.len() + 1);
    for range in ranges {
        let lo = range.lo as u128;
        let hi = range.hi as u128;
        if range.is_full() {
            spans.push((0, DOMAIN_END));
        } else if lo < hi {
            spans.push((lo + 1, hi + 1));
        } else {
            if lo + 1 < DOMAIN_END {
                spans.push((lo + 1, DOMAIN_END));
            }
            spans.push((0, hi + 1));
        }
    }
    spans.sort_unstable();
    spans
}

fn from_spans(spans: Vec<(u128, u128)>) -> Vec<HashRange> {
    spans
        .into_iter()
        .filter(|(start, end)| start < end)
        .map(|(start, end)| HashRange {
            lo: if start == 0 {
                u64::MAX
            } else {
                (start - 1) as u64
            },
            hi: (end - 1) as u64,
        })
        .collect()
}
