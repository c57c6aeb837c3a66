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

//! Feeds a simulated stock-ticker stream into a Count-Min sketch and prints
//! the sketch estimates next to exact counts.

use std::collections::BTreeMap;

use clap::Parser;
use freqsketch::countmin::CountMinSketch;
use freqsketch::hash::DEFAULT_UPDATE_SEED;
use tracing_subscriber::EnvFilter;

const TICKERS: [&str; 8] = [
    "apple",
    "google",
    "amazon",
    "palantir",
    "facebook",
    "stripe",
    "exxon",
    "microsoft",
];

#[derive(Debug, Parser)]
#[command(about = "Compare Count-Min estimates with exact counts on a ticker stream")]
struct Args {
    /// Number of events in the stream.
    #[arg(long, default_value_t = 10_000)]
    events: usize,
    /// Rows in the sketch.
    #[arg(long, default_value_t = 10)]
    rows: u32,
    /// Hash functions (columns) in the sketch.
    #[arg(long, default_value_t = 5)]
    hashes: u8,
    /// Base seed of the sketch hash family.
    #[arg(long, default_value_t = DEFAULT_UPDATE_SEED)]
    seed: u64,
    /// Seed of the stream generator.
    #[arg(long, default_value_t = 1)]
    stream_seed: u64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut sketch = match CountMinSketch::with_seed(args.rows, args.hashes, args.seed) {
        Ok(sketch) => sketch,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };

    let mut state = args.stream_seed.max(1);
    let mut exact = BTreeMap::<&str, u64>::new();
    for _ in 0..args.events {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let ticker = TICKERS[(state % TICKERS.len() as u64) as usize];

        sketch.update(ticker);
        *exact.entry(ticker).or_default() += 1;
    }

    println!(
        "{} events, {} rows x {} hashes, relative error {:.4}",
        sketch.total_weight(),
        sketch.num_rows(),
        sketch.num_hashes(),
        sketch.relative_error()
    );
    println!();
    println!("{:<10} {:>8} {:>8} {:>8}", "ticker", "exact", "sketch", "lower");
    for (ticker, count) in &exact {
        println!(
            "{:<10} {:>8} {:>8} {:>8}",
            ticker,
            count,
            sketch.estimate(ticker),
            sketch.lower_bound(ticker)
        );
    }
}
