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

use std::path::Path;
use std::process::Command;
use std::process::ExitCode;

use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(name = "x", about = "Development tasks for the freqsketch workspace")]
struct Cli {
    #[command(subcommand)]
    task: Task,
}

#[derive(Subcommand)]
enum Task {
    /// Check formatting and run clippy with warnings denied.
    Lint {
        /// Apply formatting and clippy fixes instead of only checking.
        #[arg(long)]
        fix: bool,
    },
    /// Run the workspace tests, including doc tests.
    Test {
        /// Extra arguments passed to the test binaries.
        #[arg(last = true)]
        args: Vec<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let cargo = match which::which("cargo") {
        Ok(cargo) => cargo,
        Err(err) => {
            eprintln!("cannot find cargo: {err}");
            return ExitCode::FAILURE;
        }
    };

    let steps: Vec<Vec<String>> = match cli.task {
        Task::Lint { fix: false } => vec![
            args(["fmt", "--all", "--check"]),
            args([
                "clippy",
                "--workspace",
                "--all-targets",
                "--all-features",
                "--",
                "-D",
                "warnings",
            ]),
        ],
        Task::Lint { fix: true } => vec![
            args(["fmt", "--all"]),
            args([
                "clippy",
                "--fix",
                "--allow-dirty",
                "--allow-staged",
                "--workspace",
                "--all-targets",
                "--all-features",
            ]),
        ],
        Task::Test { args: extra } => {
            let mut test = args(["test", "--workspace", "--all-features"]);
            if !extra.is_empty() {
                test.push("--".to_string());
                test.extend(extra);
            }
            vec![test]
        }
    };

    for step in steps {
        if !run(&cargo, &step) {
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}

fn args<const N: usize>(args: [&str; N]) -> Vec<String> {
    args.into_iter().map(String::from).collect()
}

fn run(cargo: &Path, args: &[String]) -> bool {
    eprintln!("$ cargo {}", args.join(" "));
    match Command::new(cargo).args(args).status() {
        Ok(status) => status.success(),
        Err(err) => {
            eprintln!("failed to run cargo: {err}");
            false
        }
    }
}
