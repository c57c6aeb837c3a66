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

//! Count-Min sketch implementation for frequency estimation.
//!
//! The Count-Min sketch approximates how often each key occurs in a stream
//! using a fixed `num_rows x num_hashes` counter matrix, independent of the
//! number of distinct keys. Estimates only ever overstate the true count.
//!
//! # Usage
//!
//! ```rust
//! use freqsketch::countmin::CountMinSketch;
//!
//! let mut sketch = CountMinSketch::new(256, 5).unwrap();
//!
//! sketch.update("apple");
//! sketch.update_with_weight("banana", 3).unwrap();
//!
//! let banana = sketch.estimate("banana");
//! assert!(banana >= 3);
//!
//! let lower = sketch.lower_bound("banana");
//! assert!(lower <= banana);
//! ```
//!
//! # Configuration Helpers
//!
//! For a relative error `epsilon` (fraction of total stream weight) holding
//! with probability `1 - delta`, use `ceil(e / epsilon)` rows and
//! `ceil(ln(1 / delta))` hash functions:
//!
//! ```rust
//! use freqsketch::countmin::CountMinSketch;
//!
//! let num_rows = CountMinSketch::suggest_num_rows(0.01).unwrap();
//! let num_hashes = CountMinSketch::suggest_num_hashes(0.01).unwrap();
//!
//! let _sketch = CountMinSketch::new(num_rows, num_hashes).unwrap();
//! ```
//!
//! # Concurrent Updates
//!
//! [`AtomicCountMinSketch`] accepts updates through `&self`:
//!
//! ```rust
//! use freqsketch::countmin::AtomicCountMinSketch;
//!
//! let sketch = AtomicCountMinSketch::new(64, 4).unwrap();
//! std::thread::scope(|s| {
//!     for _ in 0..4 {
//!         s.spawn(|| sketch.update("tick"));
//!     }
//! });
//! assert!(sketch.estimate("tick") >= 4);
//! ```

mod atomic;
mod sketch;

pub use self::atomic::AtomicCountMinSketch;
pub use self::sketch::CountMinSketch;
pub use self::sketch::MAX_CELLS;
