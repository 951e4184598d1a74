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

mod commands;
mod helpers;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use commands::layout::{GBufferArg, ModeArg};
use commands::{ci, layout, layout_config, wgsl};
use ingenero_core::renderer::layout::{report_for, GBufferFormat};
use ingenero_core::renderer::ShadingMode;

#[derive(Parser)]
#[command(name = "xtask", about = "Ingenero build and layout automation", version)]
struct Cli {
    /// Path to the layout manifest.
    #[arg(long, global = true, default_value = layout_config::DEFAULT_MANIFEST)]
    manifest: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one CI task, or the whole pipeline.
    Ci {
        #[arg(value_enum, default_value_t = CiTask::All)]
        task: CiTask,
    },
    /// Print the layout of every GPU record.
    Layout {
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
        #[arg(long, value_enum)]
        gbuffer: Option<GBufferArg>,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Generate WGSL declarations for the uniform records.
    Wgsl {
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
        /// Print to stdout instead of the manifest's output path.
        #[arg(long)]
        stdout: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CiTask {
    Build,
    Test,
    Check,
    Format,
    Clippy,
    All,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Ci { task } => match task {
            CiTask::Build => ci::build(),
            CiTask::Test => ci::test(),
            CiTask::Check => ci::check(),
            CiTask::Format => ci::format(),
            CiTask::Clippy => ci::clippy(),
            CiTask::All => ci::all(),
        },
        Command::Layout {
            mode,
            gbuffer,
            json,
        } => {
            let manifest = layout_config::load_manifest(&cli.manifest)?;
            layout::run(
                mode.map_or(ShadingMode::ACTIVE, Into::into),
                gbuffer.map_or(GBufferFormat::ACTIVE, Into::into),
                &manifest.layout,
                json,
            )
        }
        Command::Wgsl { mode, stdout } => {
            let manifest = layout_config::load_manifest(&cli.manifest)?;
            let mode = mode.map_or(ShadingMode::ACTIVE, Into::into);
            let report = report_for(mode, GBufferFormat::ACTIVE);
            let output = (!stdout).then_some(manifest.wgsl.path.as_path());
            wgsl::run(&report, output)
        }
    }
}
