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

use common::ExactCounter;
use common::TICKERS;
use common::ticker_stream;
use common::weighted_stream;
use freqsketch::countmin::CountMinSketch;
use freqsketch::error::ErrorKind;
use freqsketch::hash::HashFamily;
use googletest::assert_that;
use googletest::prelude::contains_substring;
use googletest::prelude::eq;
use googletest::prelude::ge;

#[test]
fn test_estimates_never_undercount() {
    let mut sketch = CountMinSketch::new(50, 4).unwrap();
    let mut exact = ExactCounter::default();

    for (i, (key, amount)) in weighted_stream(20_000, 1_000, 17).into_iter().enumerate() {
        sketch.update_with_weight(&key, amount).unwrap();
        exact.add(&key, amount);

        if i % 2_500 == 0 {
            for seen in exact.keys() {
                assert_that!(sketch.estimate(seen), ge(exact.count(seen)));
            }
        }
    }

    for key in exact.keys() {
        assert_that!(sketch.estimate(key), ge(exact.count(key)));
    }
}

#[test]
fn test_estimates_are_monotonic() {
    let mut sketch = CountMinSketch::new(8, 3).unwrap();
    let mut previous = sketch.estimate("apple");

    for (i, ticker) in ticker_stream(2_000, 3).into_iter().enumerate() {
        sketch.update(ticker);
        if i % 5 == 0 {
            sketch.update("apple");
        }
        let current = sketch.estimate("apple");
        assert!(current >= previous, "estimate dropped from {previous} to {current}");
        previous = current;
    }
}

#[test]
fn test_fresh_sketch_reports_zero() {
    let sketch = CountMinSketch::new(5, 3).unwrap();
    assert!(sketch.is_empty());
    assert_eq!(sketch.total_weight(), 0);

    for key in TICKERS {
        assert_eq!(sketch.estimate(key), 0);
    }
    for i in 0..1_000 {
        assert_eq!(sketch.estimate(format!("unseen-{i}")), 0);
    }
    assert_eq!(sketch.estimate(""), 0);
    assert_eq!(sketch.estimate([0xffu8, 0x00]), 0);
}

/// Finds a seed whose hash family gives every key a private cell in at least
/// one column, which makes the sketch exact on that key set.
fn collision_free_seed(keys: &[&str], num_rows: u32, num_hashes: u8) -> u64 {
    let isolated = |family: &HashFamily, key: usize| {
        (0..usize::from(num_hashes)).any(|column| {
            let row = family.row_index(keys[key], column, num_rows);
            keys.iter()
                .enumerate()
                .filter(|&(other, _)| other != key)
                .all(|(_, other)| family.row_index(other, column, num_rows) != row)
        })
    };

    (0..1_000u64)
        .find(|&seed| {
            let family = HashFamily::new(num_hashes, seed);
            (0..keys.len()).all(|key| isolated(&family, key))
        })
        .expect("no collision-free hash family in the first 1000 seeds")
}

#[test]
fn test_exact_when_rows_cover_distinct_keys() {
    const NUM_ROWS: u32 = 10;
    const NUM_HASHES: u8 = 5;

    let seed = collision_free_seed(&TICKERS, NUM_ROWS, NUM_HASHES);
    let mut sketch = CountMinSketch::with_seed(NUM_ROWS, NUM_HASHES, seed).unwrap();
    let mut exact = ExactCounter::default();

    for ticker in ticker_stream(10_000, 42) {
        sketch.update(ticker);
        exact.add(ticker, 1);
    }

    assert_eq!(sketch.total_weight(), 10_000);
    for ticker in TICKERS {
        assert_that!(sketch.estimate(ticker), eq(exact.count(ticker)));
    }
}

#[test]
fn test_weighted_updates_are_additive() {
    let mut split = CountMinSketch::new(16, 4).unwrap();
    let mut combined = CountMinSketch::new(16, 4).unwrap();

    split.update_with_weight("google", 3).unwrap();
    split.update_with_weight("google", 4).unwrap();
    split.update("amazon");
    split.update("amazon");
    combined.update_with_weight("google", 7).unwrap();
    combined.update_with_weight("amazon", 2).unwrap();

    assert_eq!(split, combined);
}

#[test]
fn test_identical_streams_give_identical_sketches() {
    let stream = weighted_stream(5_000, 300, 5);
    let mut first = CountMinSketch::with_seed(32, 4, 12345).unwrap();
    let mut second = CountMinSketch::with_seed(32, 4, 12345).unwrap();

    for (key, amount) in &stream {
        first.update_with_weight(key, *amount).unwrap();
    }
    for (key, amount) in &stream {
        second.update_with_weight(key, *amount).unwrap();
    }
    assert_eq!(first, second);

    // update order does not matter either
    let mut reversed = CountMinSketch::with_seed(32, 4, 12345).unwrap();
    for (key, amount) in stream.iter().rev() {
        reversed.update_with_weight(key, *amount).unwrap();
    }
    assert_eq!(first, reversed);
}

#[test]
fn test_small_sketch_scenario() {
    let mut sketch = CountMinSketch::new(5, 3).unwrap();
    let mut exact = ExactCounter::default();

    for (key, times) in [("a", 7), ("b", 3), ("c", 1)] {
        for _ in 0..times {
            sketch.update(key);
            exact.add(key, 1);
        }
    }

    assert_eq!(exact.count("a"), 7);
    assert_eq!(exact.count("b"), 3);
    assert_eq!(exact.count("c"), 1);
    for key in ["a", "b", "c"] {
        assert_that!(sketch.estimate(key), ge(exact.count(key)));
    }
    assert_eq!(sketch.total_weight(), 11);
}

#[test]
fn test_invalid_configuration() {
    let err = CountMinSketch::new(0, 3).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    assert_that!(err.message(), contains_substring("num_rows"));

    let err = CountMinSketch::new(5, 0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    assert_that!(err.message(), contains_substring("num_hashes"));

    let err = CountMinSketch::new(u32::MAX, 255).unwrap_err();
    assert_that!(err.to_string(), contains_substring("max_cells"));
}

#[test]
fn test_zero_amount_leaves_sketch_unchanged() {
    let mut sketch = CountMinSketch::new(10, 4).unwrap();
    sketch.update_with_weight("stripe", 5).unwrap();
    let before = sketch.clone();

    let err = sketch.update_with_weight("stripe", 0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidAmount);
    assert_that!(err.to_string(), contains_substring("amount: 0"));
    assert_eq!(sketch, before);
}

#[test]
fn test_saturated_key_stays_on_top() {
    let mut sketch = CountMinSketch::new(4, 2).unwrap();
    sketch.update_with_weight("hot", u64::MAX).unwrap();
    sketch.update_with_weight("hot", 1_000).unwrap();
    sketch.update("cold");

    assert_eq!(sketch.estimate("hot"), u64::MAX);
    assert!(sketch.estimate("hot") >= sketch.estimate("cold"));
}

#[test]
fn test_sizing_policy() {
    assert_eq!(CountMinSketch::suggest_num_rows(0.01).unwrap(), 272);
    assert_eq!(CountMinSketch::suggest_num_rows(0.5).unwrap(), 6);
    assert_eq!(CountMinSketch::suggest_num_hashes(0.01).unwrap(), 5);
    assert_eq!(CountMinSketch::suggest_num_hashes(0.5).unwrap(), 1);
    assert_eq!(CountMinSketch::suggest_num_hashes(0.99).unwrap(), 1);
    assert_eq!(CountMinSketch::suggest_num_hashes(1e-300).unwrap(), 255);

    for epsilon in [0.0, 1.0, -0.1, f64::NAN, 1e-12] {
        let err = CountMinSketch::suggest_num_rows(epsilon).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    }
    for delta in [0.0, 1.0, 2.0, f64::NAN] {
        let err = CountMinSketch::suggest_num_hashes(delta).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    }
}

#[test]
fn test_accuracy_sized_sketch_meets_error_bound() {
    let mut sketch = CountMinSketch::with_accuracy(0.01, 0.01).unwrap();
    let mut exact = ExactCounter::default();
    for (key, amount) in weighted_stream(10_000, 500, 99) {
        sketch.update_with_weight(&key, amount).unwrap();
        exact.add(&key, amount);
    }

    let allowed = (sketch.relative_error() * sketch.total_weight() as f64).ceil() as u64;
    let violations = exact
        .keys()
        .filter(|key| sketch.estimate(key) - exact.count(key) > allowed)
        .count();
    // each key may exceed the bound with probability at most 1%
    assert!(violations <= 20, "{violations} keys exceed the error bound");

    let under = exact
        .keys()
        .filter(|key| sketch.lower_bound(key) > exact.count(key))
        .count();
    assert_eq!(under, violations);
}
