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

use anyhow::Result;
use std::process::Command;
use std::time::Instant;

// ANSI color codes
pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const GREEN: &str = "\x1b[32m";
pub const RED: &str = "\x1b[31m";
pub const BLUE: &str = "\x1b[34m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";
pub const MAGENTA: &str = "\x1b[35m";

// Visual symbols
pub const CHECK: &str = "✓";
pub const CROSS: &str = "✗";
pub const ROCKET: &str = "🚀";
pub const HAMMER: &str = "🔨";
pub const TEST_TUBE: &str = "🧪";
pub const MAGNIFIER: &str = "🔍";
pub const BRUSH: &str = "🎨";
pub const CLIPPY: &str = "📎";
pub const RULER: &str = "📐";

pub const BANNER: &str = concat!(
    "\x1b[1m",
    "\x1b[36m", // BOLD, CYAN
    "╔═══════════════════════════════════════════════════════════╗\n",
    "║                         INGENERO                          ║\n",
    "║                 Layout & Build Automation                 ║\n",
    "╚═══════════════════════════════════════════════════════════╝",
    "\x1b[0m" // RESET
);

pub fn print_task_start(task_name: &str, emoji: &str, color: &str) {
    println!(
        "\n{}{}━━━ {} {} {}━━━{}",
        BOLD, color, emoji, task_name, emoji, RESET
    );
}

pub fn print_info(message: &str) {
    println!("{}💡 Info:{} {}", BOLD, RESET, message);
}

pub fn print_success(message: &str) {
    println!("{}{} {} {}{}", BOLD, GREEN, CHECK, message, RESET);
}

pub fn print_error(message: &str) {
    println!("{}{} {} {}{}", BOLD, RED, CROSS, message, RESET);
}

/// Renders a command the way a shell would echo it.
pub fn command_line(cmd: &str, args: &[&str]) -> String {
    std::iter::once(cmd)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn execute_command(cmd: &str, args: &[&str], task_name: &str) -> Result<()> {
    let start_time = Instant::now();
    let line = command_line(cmd, args);
    println!("{}{}📋 Command:{} {}", BOLD, CYAN, RESET, line);
    log::debug!("Spawning `{}`", line);

    let status = Command::new(cmd).args(args).status()?;
    let seconds = start_time.elapsed().as_secs_f64();

    if status.success() {
        print_success(&format!("{} completed in {:.2}s", task_name, seconds));
        Ok(())
    } else {
        print_error(&format!("{} failed after {:.2}s", task_name, seconds));
        anyhow::bail!("{} failed with status: {}", task_name, status);
    }
}

/// Outcome of a multi-phase run, keyed by phase name.
#[derive(Debug, Default)]
pub struct PipelineReport {
    passed: Vec<String>,
    failed: Vec<String>,
}

impl PipelineReport {
    pub fn record(&mut self, phase: &str, outcome: &Result<()>) {
        match outcome {
            Ok(()) => self.passed.push(phase.to_owned()),
            Err(e) => {
                log::warn!("{} failed: {:#}", phase, e);
                self.failed.push(phase.to_owned());
            }
        }
    }

    pub fn total(&self) -> usize {
        self.passed.len() + self.failed.len()
    }

    pub fn failed(&self) -> &[String] {
        &self.failed
    }

    pub fn print(&self, seconds: f64) {
        println!("\n{}{}━━━ Pipeline summary ━━━{}", BOLD, CYAN, RESET);
        if self.failed.is_empty() {
            println!(
                "{}{} {} All {} phases passed {}{}",
                BOLD, GREEN, CHECK, self.total(), ROCKET, RESET
            );
        } else {
            for phase in &self.failed {
                println!("{}{} {} {}{}", BOLD, RED, CROSS, phase, RESET);
            }
            println!(
                "{}{}{}/{} phases passed{}",
                BOLD,
                YELLOW,
                self.passed.len(),
                self.total(),
                RESET
            );
        }
        println!("{}{}Total time: {:.2}s{}", BOLD, BLUE, seconds, RESET);
    }

    /// Fails with the names of every phase that did not pass.
    pub fn into_result(self) -> Result<()> {
        if self.failed.is_empty() {
            Ok(())
        } else {
            anyhow::bail!("pipeline failed in: {}", self.failed.join(", "))
        }
    }
}
