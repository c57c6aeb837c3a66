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

#![allow(dead_code)]

use std::collections::HashMap;

/// The eight tickers of the simulated stock stream.
pub const TICKERS: [&str; 8] = [
    "apple",
    "google",
    "amazon",
    "palantir",
    "facebook",
    "stripe",
    "exxon",
    "microsoft",
];

/// Exact per-key counts, used as the reference for sketch estimates.
#[derive(Debug, Default)]
pub struct ExactCounter {
    counts: HashMap<String, u64>,
}

impl ExactCounter {
    pub fn add(&mut self, key: &str, amount: u64) {
        *self.counts.entry(key.to_string()).or_default() += amount;
    }

    pub fn count(&self, key: &str) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }
}

/// Xorshift generator so streams are reproducible across runs.
pub struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    pub fn seeded(seed: u64) -> Self {
        let state = if seed == 0 { 0x9e3779b97f4a7c15 } else { seed };
        Self { state }
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    pub fn below(&mut self, bound: u64) -> u64 {
        self.next_u64() % bound
    }
}

/// Draws `len` tickers uniformly at random.
pub fn ticker_stream(len: usize, seed: u64) -> Vec<&'static str> {
    let mut rng = XorShift64::seeded(seed);
    (0..len)
        .map(|_| TICKERS[rng.below(TICKERS.len() as u64) as usize])
        .collect()
}

/// Draws `len` weighted events over `num_keys` distinct keys, skewed so low
/// key ids are more frequent.
pub fn weighted_stream(len: usize, num_keys: u64, seed: u64) -> Vec<(String, u64)> {
    let mut rng = XorShift64::seeded(seed);
    (0..len)
        .map(|_| {
            let id = rng.below(num_keys).min(rng.below(num_keys));
            let amount = 1 + rng.below(4);
            (format!("key-{id}"), amount)
        })
        .collect()
}
