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
//! The crate provides [`sketch::RingSketch`], a sublinear-memory summary of
//! a stream of `u64` item identifiers that answers per-item frequency
//! queries with bounded error and — unlike conventional frequency sketches —
//! supports structural transforms on a live sketch:
//!
//! - [`sketch::RingSketch::expand`] and [`sketch::RingSketch::shrink`]
//!   resize the memory footprint while preserving estimates;
//! - [`sketch::RingSketch::merge`] combines two independently built sketches
//!   into one of larger capacity;
//! - [`sketch::RingSketch::split`] cuts a sketch into two that partition the
//!   key domain between them.
//!
//! The supporting pieces are exposed as their own modules: [`kll`] is the
//! quantile summary each bucket carries, [`ring`] the consistent-hash ring
//! of one row, [`hash`] the two-level hashing scheme, and [`common`] the
//! seedable randomness utilities. All randomness is explicit, so any run is
//! reproducible from its seeds.

pub mod common;
pub mod error;
pub mod hash;
pub mod kll;
pub mod ring;
pub mod sketch;
pub mod summary;
