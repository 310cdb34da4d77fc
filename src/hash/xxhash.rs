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

// Unsigned 64-bit primes from xxhash64.
const P1: u64 = 0x9E3779B185EBCA87;
const P2: u64 = 0xC2B2AE3D27D4EB4F;
const P3: u64 = 0x165667B19E3779F9;
const P4: u64 = 0x85EBCA77C2B2AE63;
const P5: u64 = 0x27D4EB2F165667C5;

/// XXH64 of the 8 little-endian bytes of `input`, with the given seed.
///
/// This is the short-input path of the xxhash64 algorithm specialized to a
/// single 64-bit word, which is the only input shape the sketch hashes. It
/// has excellent avalanche and 2-way bit independence properties and is
/// deterministic across platforms.
#[inline]
pub fn xxhash64(input: u64, seed: u64) -> u64 {
    let mut hash = seed.wrapping_add(P5).wrapping_add(8);
    let mut k1 = input;
    k1 = k1.wrapping_mul(P2);
    k1 = k1.rotate_left(31);
    k1 = k1.wrapping_mul(P1);
    hash ^= k1;
    hash = hash.rotate_left(27).wrapping_mul(P1).wrapping_add(P4);
    finalize(hash)
}

#[inline]
fn finalize(mut hash: u64) -> u64 {
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(P2);
    hash ^= hash >> 29;
    hash = hash.wrapping_mul(P3);
    hash ^ (hash >> 32)
}
