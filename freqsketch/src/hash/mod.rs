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

//! Seeded hash family used to map keys onto sketch rows.
//!
//! Every column of a sketch owns one 64-bit seed. A key is hashed with
//! MurmurHash3 (x64, 128-bit) over the little-endian seed bytes followed by
//! the raw key bytes, and the low 64-bit lane is reduced modulo the row count.
//! Column seeds are expanded from a single base seed with SplitMix64, so two
//! families built from the same base seed are identical on every platform.

use std::hash::Hasher;

/// The default base seed for sketches that do not specify one.
pub const DEFAULT_UPDATE_SEED: u64 = 9001;

const GOLDEN_GAMMA: u64 = 0x9E3779B97F4A7C15;

/// A fixed family of independently seeded hash functions, one per column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashFamily {
    seeds: Box<[u64]>,
}

impl HashFamily {
    /// Creates `num_hashes` column functions derived from `seed`.
    pub fn new(num_hashes: u8, seed: u64) -> Self {
        let mut state = seed;
        let seeds = (0..num_hashes).map(|_| splitmix64(&mut state)).collect();
        Self { seeds }
    }

    /// Returns the number of hash functions in the family.
    pub fn num_hashes(&self) -> u8 {
        self.seeds.len() as u8
    }

    /// Returns the per-column seeds.
    pub fn column_seeds(&self) -> &[u64] {
        &self.seeds
    }

    /// Hashes `key` with the function of `column`.
    ///
    /// # Panics
    ///
    /// Panics if `column >= num_hashes()`.
    pub fn hash<K: AsRef<[u8]>>(&self, key: K, column: usize) -> u64 {
        hash_with_seed(key.as_ref(), self.seeds[column])
    }

    /// Returns the row that `column` selects for `key` in a sketch of `num_rows` rows.
    ///
    /// # Panics
    ///
    /// Panics if `column >= num_hashes()` or `num_rows == 0`.
    ///
    /// # Examples
    ///
    /// ```
    /// use freqsketch::hash::HashFamily;
    ///
    /// let family = HashFamily::new(3, 42);
    /// let row = family.row_index("apple", 1, 10);
    /// assert!(row < 10);
    /// assert_eq!(row, family.row_index("apple", 1, 10));
    /// ```
    pub fn row_index<K: AsRef<[u8]>>(&self, key: K, column: usize, num_rows: u32) -> u32 {
        reduce(self.hash(key, column), num_rows)
    }

    /// Returns the rows selected for `key` by every column, in column order.
    pub fn row_indices<'a>(
        &'a self,
        key: &'a [u8],
        num_rows: u32,
    ) -> impl Iterator<Item = u32> + 'a {
        self.seeds
            .iter()
            .map(move |&seed| reduce(hash_with_seed(key, seed), num_rows))
    }
}

fn hash_with_seed(key: &[u8], seed: u64) -> u64 {
    let mut hasher = mur3::Hasher128::with_seed(0);
    hasher.write(&seed.to_le_bytes());
    hasher.write(key);
    let (h1, _) = hasher.finish128();
    h1
}

#[inline]
fn reduce(hash: u64, num_rows: u32) -> u32 {
    (hash % u64::from(num_rows)) as u32
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(GOLDEN_GAMMA);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}
