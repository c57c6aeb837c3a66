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

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering::Relaxed;

use tracing::debug;
use tracing::warn;

use super::sketch::check_shape;
use super::CountMinSketch;
use crate::error::Error;
use crate::hash::DEFAULT_UPDATE_SEED;
use crate::hash::HashFamily;

/// A Count-Min sketch that can be updated through a shared reference.
///
/// Layout, hash family and saturation rules match [`CountMinSketch`]; every
/// cell is an `AtomicU64`, so producers on many threads can update and query
/// it without a lock. A query racing with an update may read a cell before the
/// increment lands, but never a partially written value.
#[derive(Debug)]
pub struct AtomicCountMinSketch {
    num_rows: u32,
    num_hashes: u8,
    seed: u64,
    total_weight: AtomicU64,
    hashes: HashFamily,
    counters: Box<[AtomicU64]>,
}

impl AtomicCountMinSketch {
    /// Creates a concurrent sketch with the default seed.
    ///
    /// Fails under the same conditions as [`CountMinSketch::new`].
    pub fn new(num_rows: u32, num_hashes: u8) -> Result<Self, Error> {
        Self::with_seed(num_rows, num_hashes, DEFAULT_UPDATE_SEED)
    }

    /// Creates a concurrent sketch with an explicit base seed.
    pub fn with_seed(num_rows: u32, num_hashes: u8, seed: u64) -> Result<Self, Error> {
        let cells = check_shape(num_rows, num_hashes)?;
        debug!(num_rows, num_hashes, seed, "creating atomic count-min sketch");
        Ok(AtomicCountMinSketch {
            num_rows,
            num_hashes,
            seed,
            total_weight: AtomicU64::new(0),
            hashes: HashFamily::new(num_hashes, seed),
            counters: (0..cells).map(|_| AtomicU64::new(0)).collect(),
        })
    }

    /// Counts one occurrence of `key`.
    pub fn update<K: AsRef<[u8]>>(&self, key: K) {
        self.increment(key.as_ref(), 1);
    }

    /// Counts `amount` occurrences of `key`; a zero amount is rejected and
    /// leaves the sketch untouched.
    pub fn update_with_weight<K: AsRef<[u8]>>(
        &self,
        key: K,
        amount: u64,
    ) -> Result<(), Error> {
        if amount == 0 {
            return Err(Error::invalid_amount("update amount must be positive")
                .with_context("amount", amount));
        }
        self.increment(key.as_ref(), amount);
        Ok(())
    }

    fn increment(&self, key: &[u8], amount: u64) {
        let num_hashes = usize::from(self.num_hashes);
        for (column, row) in self.hashes.row_indices(key, self.num_rows).enumerate() {
            let cell = &self.counters[row as usize * num_hashes + column];
            let previous = saturating_fetch_add(cell, amount);
            if previous != u64::MAX && previous.saturating_add(amount) == u64::MAX {
                warn!(row, column, "count-min counter saturated");
            }
        }
        saturating_fetch_add(&self.total_weight, amount);
    }

    /// Returns the estimated frequency of `key`, the minimum over its cells.
    pub fn estimate<K: AsRef<[u8]>>(&self, key: K) -> u64 {
        let num_hashes = usize::from(self.num_hashes);
        self.hashes
            .row_indices(key.as_ref(), self.num_rows)
            .enumerate()
            .map(|(column, row)| self.counters[row as usize * num_hashes + column].load(Relaxed))
            .fold(u64::MAX, u64::min)
    }

    /// Returns the number of rows.
    pub fn num_rows(&self) -> u32 {
        self.num_rows
    }

    /// Returns the number of hash functions (columns).
    pub fn num_hashes(&self) -> u8 {
        self.num_hashes
    }

    /// Returns the base seed of the hash family.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns the sum of all accepted update amounts.
    pub fn total_weight(&self) -> u64 {
        self.total_weight.load(Relaxed)
    }

    /// Copies the current counters into a single-threaded sketch.
    ///
    /// Updates that run concurrently with the copy may be reflected in some
    /// cells and not others.
    pub fn snapshot(&self) -> CountMinSketch {
        let counters = self.counters.iter().map(|c| c.load(Relaxed)).collect();
        CountMinSketch::from_parts(
            self.num_rows,
            self.num_hashes,
            self.seed,
            self.total_weight(),
            self.hashes.clone(),
            counters,
        )
    }
}

/// Adds `amount` to `cell`, clamping at `u64::MAX`. Returns the previous value.
fn saturating_fetch_add(cell: &AtomicU64, amount: u64) -> u64 {
    cell.fetch_update(Relaxed, Relaxed, |current| {
        (current != u64::MAX).then(|| current.saturating_add(amount))
    })
    .unwrap_or_else(|current| current)
}
