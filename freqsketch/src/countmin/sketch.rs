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

use std::f64::consts::E;

use tracing::debug;
use tracing::warn;

use crate::error::Error;
use crate::hash::DEFAULT_UPDATE_SEED;
use crate::hash::HashFamily;

/// Upper limit on `num_rows * num_hashes`: 2^28 counters, 2 GiB of `u64`.
pub const MAX_CELLS: u64 = 1 << 28;

/// Count-Min sketch for estimating item frequencies.
///
/// The counters form a single matrix of `num_rows` rows by `num_hashes`
/// columns. Column `j` is owned by hash function `j`, which selects one row
/// per key; an update adds to that cell in every column and an estimate is
/// the minimum over the same cells. Estimates never fall below the true
/// frequency of a key.
///
/// Counters saturate at `u64::MAX` instead of wrapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountMinSketch {
    num_rows: u32,
    num_hashes: u8,
    seed: u64,
    total_weight: u64,
    hashes: HashFamily,
    /// Row-major `num_rows x num_hashes` matrix.
    counters: Vec<u64>,
}

impl CountMinSketch {
    /// Creates a sketch with `num_rows` rows and `num_hashes` hash functions,
    /// using the default seed.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidConfiguration`](crate::error::ErrorKind::InvalidConfiguration)
    /// if either dimension is zero or the matrix would exceed [`MAX_CELLS`].
    ///
    /// # Examples
    ///
    /// ```
    /// # use freqsketch::countmin::CountMinSketch;
    /// let sketch = CountMinSketch::new(10, 5).unwrap();
    /// assert_eq!(sketch.num_rows(), 10);
    /// assert_eq!(sketch.num_hashes(), 5);
    /// assert!(sketch.is_empty());
    ///
    /// assert!(CountMinSketch::new(0, 5).is_err());
    /// ```
    pub fn new(num_rows: u32, num_hashes: u8) -> Result<Self, Error> {
        Self::with_seed(num_rows, num_hashes, DEFAULT_UPDATE_SEED)
    }

    /// Creates a sketch with an explicit base seed for the hash family.
    ///
    /// Two sketches built with the same dimensions and seed map every key to
    /// the same cells.
    pub fn with_seed(num_rows: u32, num_hashes: u8, seed: u64) -> Result<Self, Error> {
        let cells = check_shape(num_rows, num_hashes)?;
        debug!(num_rows, num_hashes, seed, "creating count-min sketch");
        Ok(CountMinSketch {
            num_rows,
            num_hashes,
            seed,
            total_weight: 0,
            hashes: HashFamily::new(num_hashes, seed),
            counters: vec![0; cells],
        })
    }

    /// Creates a sketch sized for a relative error `epsilon` (as a fraction of
    /// the total stream weight) that holds with probability `1 - delta`.
    ///
    /// See [`suggest_num_rows`](Self::suggest_num_rows) and
    /// [`suggest_num_hashes`](Self::suggest_num_hashes).
    ///
    /// # Examples
    ///
    /// ```
    /// # use freqsketch::countmin::CountMinSketch;
    /// let sketch = CountMinSketch::with_accuracy(0.01, 0.01).unwrap();
    /// assert_eq!(sketch.num_rows(), 272);
    /// assert_eq!(sketch.num_hashes(), 5);
    /// ```
    pub fn with_accuracy(epsilon: f64, delta: f64) -> Result<Self, Error> {
        let num_rows = Self::suggest_num_rows(epsilon)?;
        let num_hashes = Self::suggest_num_hashes(delta)?;
        Self::new(num_rows, num_hashes)
    }

    /// Suggests the number of rows for a target relative error: `ceil(e / epsilon)`.
    ///
    /// # Errors
    ///
    /// `epsilon` must lie in `(0, 1)` and the result must fit in a `u32`.
    pub fn suggest_num_rows(epsilon: f64) -> Result<u32, Error> {
        if !(epsilon > 0.0 && epsilon < 1.0) {
            return Err(Error::invalid_configuration("epsilon must be in (0, 1)")
                .with_context("epsilon", epsilon));
        }
        let rows = (E / epsilon).ceil();
        if rows > f64::from(u32::MAX) {
            return Err(
                Error::invalid_configuration("epsilon is too small to size the sketch")
                    .with_context("epsilon", epsilon),
            );
        }
        Ok(rows as u32)
    }

    /// Suggests the number of hash functions for a failure probability
    /// `delta`: `ceil(ln(1 / delta))`, at least 1 and at most 255.
    ///
    /// # Errors
    ///
    /// `delta` must lie in `(0, 1)`.
    pub fn suggest_num_hashes(delta: f64) -> Result<u8, Error> {
        if !(delta > 0.0 && delta < 1.0) {
            return Err(Error::invalid_configuration("delta must be in (0, 1)")
                .with_context("delta", delta));
        }
        let hashes = (1.0 / delta).ln().ceil();
        Ok(hashes.clamp(1.0, f64::from(u8::MAX)) as u8)
    }

    /// Counts one occurrence of `key`.
    pub fn update<K: AsRef<[u8]>>(&mut self, key: K) {
        self.increment(key.as_ref(), 1);
    }

    /// Counts `amount` occurrences of `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidAmount`](crate::error::ErrorKind::InvalidAmount)
    /// if `amount` is zero. The sketch is left untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// # use freqsketch::countmin::CountMinSketch;
    /// let mut sketch = CountMinSketch::new(64, 4).unwrap();
    /// sketch.update_with_weight("banana", 3).unwrap();
    /// assert!(sketch.estimate("banana") >= 3);
    ///
    /// assert!(sketch.update_with_weight("banana", 0).is_err());
    /// assert_eq!(sketch.total_weight(), 3);
    /// ```
    pub fn update_with_weight<K: AsRef<[u8]>>(
        &mut self,
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

    fn increment(&mut self, key: &[u8], amount: u64) {
        let num_hashes = usize::from(self.num_hashes);
        for (column, row) in self.hashes.row_indices(key, self.num_rows).enumerate() {
            let cell = &mut self.counters[row as usize * num_hashes + column];
            let updated = cell.saturating_add(amount);
            if updated == u64::MAX && *cell != u64::MAX {
                warn!(row, column, "count-min counter saturated");
            }
            *cell = updated;
        }
        self.total_weight = self.total_weight.saturating_add(amount);
    }

    /// Returns the estimated frequency of `key`.
    ///
    /// The estimate is never below the true frequency. Keys that were never
    /// updated report 0 unless they collide with updated keys in every column.
    ///
    /// # Examples
    ///
    /// ```
    /// # use freqsketch::countmin::CountMinSketch;
    /// let mut sketch = CountMinSketch::new(5, 3).unwrap();
    /// assert_eq!(sketch.estimate("apple"), 0);
    ///
    /// for _ in 0..7 {
    ///     sketch.update("apple");
    /// }
    /// assert!(sketch.estimate("apple") >= 7);
    /// ```
    pub fn estimate<K: AsRef<[u8]>>(&self, key: K) -> u64 {
        let num_hashes = usize::from(self.num_hashes);
        self.hashes
            .row_indices(key.as_ref(), self.num_rows)
            .enumerate()
            .map(|(column, row)| self.counters[row as usize * num_hashes + column])
            .fold(u64::MAX, u64::min)
    }

    /// Returns an upper bound on the true frequency of `key`.
    ///
    /// Collisions only inflate counters, so this is the estimate itself.
    pub fn upper_bound<K: AsRef<[u8]>>(&self, key: K) -> u64 {
        self.estimate(key)
    }

    /// Returns a lower bound on the true frequency of `key`, holding with
    /// probability about `1 - e^-num_hashes`.
    ///
    /// Computed as `estimate - relative_error * total_weight`, floored at 0.
    pub fn lower_bound<K: AsRef<[u8]>>(&self, key: K) -> u64 {
        let slack = (self.relative_error() * self.total_weight as f64).ceil() as u64;
        self.estimate(key).saturating_sub(slack)
    }

    /// Returns the relative error implied by the row count, `e / num_rows`.
    pub fn relative_error(&self) -> f64 {
        E / f64::from(self.num_rows)
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

    /// Returns the hash family mapping keys to rows.
    pub fn hash_family(&self) -> &HashFamily {
        &self.hashes
    }

    /// Returns the sum of all accepted update amounts, saturating at `u64::MAX`.
    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    /// Returns true if no update has been applied.
    pub fn is_empty(&self) -> bool {
        self.total_weight == 0
    }

    /// Returns the counter at `(row, column)`, or `None` if out of range.
    pub fn counter(&self, row: u32, column: u8) -> Option<u64> {
        if row >= self.num_rows || column >= self.num_hashes {
            return None;
        }
        let index = row as usize * usize::from(self.num_hashes) + usize::from(column);
        Some(self.counters[index])
    }

    pub(super) fn from_parts(
        num_rows: u32,
        num_hashes: u8,
        seed: u64,
        total_weight: u64,
        hashes: HashFamily,
        counters: Vec<u64>,
    ) -> Self {
        debug_assert_eq!(counters.len(), num_rows as usize * usize::from(num_hashes));
        CountMinSketch {
            num_rows,
            num_hashes,
            seed,
            total_weight,
            hashes,
            counters,
        }
    }
}

/// Validates sketch dimensions and returns the number of cells.
pub(super) fn check_shape(num_rows: u32, num_hashes: u8) -> Result<usize, Error> {
    if num_rows == 0 {
        return Err(Error::invalid_configuration("num_rows must be at least 1")
            .with_context("num_rows", num_rows));
    }
    if num_hashes == 0 {
        return Err(Error::invalid_configuration("num_hashes must be at least 1")
            .with_context("num_hashes", num_hashes));
    }
    let cells = u64::from(num_rows) * u64::from(num_hashes);
    if cells > MAX_CELLS {
        return Err(Error::invalid_configuration("sketch exceeds the counter limit")
            .with_context("num_rows", num_rows)
            .with_context("num_hashes", num_hashes)
            .with_context("max_cells", MAX_CELLS));
    }
    Ok(cells as usize)
}
