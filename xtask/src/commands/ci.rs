// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::helpers::*;
use anyhow::Result;
use std::time::Instant;

/// Feature sets the core crate is tested under. Each one selects a different
/// shading mode or G-buffer record, so every layout gets its own pass.
const FEATURE_MATRIX: &[(&str, &[&str])] = &[
    ("Forward / standard G-buffer", &[]),
    ("Deferred / standard G-buffer", &["--features", "deferred"]),
    (
        "Forward / high-precision G-buffer",
        &["--features", "gbuffer-high-precision"],
    ),
    (
        "Deferred / packed G-buffer",
        &["--features", "deferred gbuffer-packed"],
    ),
];

pub fn build() -> Result<()> {
    print_task_start("Building All Crates", HAMMER, BLUE);
    print_info("Compiling all workspace crates in debug mode");
    execute_command("cargo", &["build", "--workspace"], "Build")
}

pub fn test() -> Result<()> {
    print_task_start("Running All Tests", TEST_TUBE, GREEN);
    print_info("Running unit, integration and doc tests for every layout configuration");

    execute_command("cargo", &["test", "--workspace", "--exclude", "ingenero-core"], "Tool tests")?;

    for (label, features) in FEATURE_MATRIX {
        println!("{}{}▸ {}{}", BOLD, CYAN, label, RESET);
        let mut args = vec!["test", "-p", "ingenero-core"];
        args.extend_from_slice(features);
        execute_command("cargo", &args, &format!("Tests ({})", label))?;
    }
    Ok(())
}

pub fn check() -> Result<()> {
    print_task_start("Checking All Crates", MAGNIFIER, CYAN);
    print_info("Checking code for errors without building executables");
    execute_command("cargo", &["check", "--workspace", "--all-targets"], "Check")
}

pub fn format() -> Result<()> {
    print_task_start("Formatting Code", BRUSH, MAGENTA);
    print_info("Formatting code using rustfmt with default settings");
    // `fmt` takes `--all`, not `--workspace`
    execute_command("cargo", &["fmt", "--all"], "Format")
}

pub fn clippy() -> Result<()> {
    print_task_start("Running Clippy", CLIPPY, YELLOW);
    print_info("Running Clippy linter with warnings as errors");
    execute_command(
        "cargo",
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
        "Clippy",
    )
}

pub fn all() -> Result<()> {
    println!("{}", BANNER);
    println!("{}{}Starting full build pipeline...{}", BOLD, CYAN, RESET);
    println!(
        "{}💡 Pipeline:{} This will run build → test → check → format → clippy",
        BOLD, RESET
    );

    let start_time = Instant::now();
    let tasks = [
        ("Build Phase", build as fn() -> Result<()>),
        ("Test Phase", test),
        ("Check Phase", check),
        ("Format Phase", format),
        ("Clippy Phase", clippy),
    ];
    let mut report = PipelineReport::default();

    for (i, (name, task_fn)) in tasks.iter().enumerate() {
        println!(
            "\n{}{}[{}/{}] {}{}",
            BOLD,
            BLUE,
            i + 1,
            tasks.len(),
            name,
            RESET
        );
        report.record(name, &task_fn());
    }

    report.print(start_time.elapsed().as_secs_f64());
    report.into_result()
}
