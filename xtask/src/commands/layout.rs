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

use anyhow::{Context, Result};
use clap::ValueEnum;
use ingenero_core::renderer::layout::report::RecordUsage;
use ingenero_core::renderer::layout::{
    report_for, uniform_stride, GBufferFormat, LayoutReport, RecordLayout,
};
use ingenero_core::renderer::{LayoutError, LayoutSettings, ShadingMode};
use serde::Serialize;

use crate::helpers::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Forward,
    Deferred,
}

impl From<ModeArg> for ShadingMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Forward => ShadingMode::Forward,
            ModeArg::Deferred => ShadingMode::Deferred,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GBufferArg {
    Standard,
    HighPrecision,
    Packed,
}

impl From<GBufferArg> for GBufferFormat {
    fn from(arg: GBufferArg) -> Self {
        match arg {
            GBufferArg::Standard => GBufferFormat::Standard,
            GBufferArg::HighPrecision => GBufferFormat::HighPrecision,
            GBufferArg::Packed => GBufferFormat::Packed,
        }
    }
}

/// A record together with the dynamic-offset stride it needs when staged.
#[derive(Debug, Serialize)]
struct StagedRecord<'a> {
    #[serde(flatten)]
    layout: &'a RecordLayout,
    uniform_stride: Option<usize>,
}

#[derive(Debug, Serialize)]
struct StagedReport<'a> {
    #[serde(flatten)]
    report: &'a LayoutReport,
    uniform_alignment: u32,
    staged: Vec<StagedRecord<'a>>,
}

fn staged_report<'a>(
    report: &'a LayoutReport,
    settings: &LayoutSettings,
) -> Result<StagedReport<'a>> {
    let alignment = settings.uniform_alignment as usize;
    let staged = report
        .records
        .iter()
        .map(|layout| {
            let uniform_stride = match layout.usage {
                RecordUsage::Uniform => Some(uniform_stride(layout.size, alignment)?),
                _ => None,
            };
            Ok(StagedRecord {
                layout,
                uniform_stride,
            })
        })
        .collect::<Result<Vec<_>, LayoutError>>()?;

    Ok(StagedReport {
        report,
        uniform_alignment: settings.uniform_alignment,
        staged,
    })
}

/// Prints the layout of every GPU record, as a table or as JSON.
///
/// Fails if any record has implicit padding or a misaligned uniform field.
pub fn run(
    mode: ShadingMode,
    gbuffer_format: GBufferFormat,
    settings: &LayoutSettings,
    json: bool,
) -> Result<()> {
    let report = report_for(mode, gbuffer_format);
    let staged = staged_report(&report, settings)?;

    if json {
        let text = serde_json::to_string_pretty(&staged)
            .context("Failed to serialize layout report")?;
        println!("{}", text);
    } else {
        print_task_start("GPU Record Layouts", RULER, CYAN);
        print_info(&format!(
            "Shading mode '{}' ({} light{}, {} byte block), G-buffer {:?} ({} bytes/texel)",
            mode,
            report.light_block.capacity,
            if report.light_block.capacity == 1 { "" } else { "s" },
            report.light_block.size,
            gbuffer_format,
            gbuffer_format.texel_size(),
        ));
        for record in &staged.staged {
            print_record(record);
        }
    }

    let malformed: Vec<&str> = report
        .records
        .iter()
        .filter(|record| !record.is_well_formed())
        .map(|record| record.name)
        .collect();
    if !malformed.is_empty() {
        print_error(&format!("Malformed records: {}", malformed.join(", ")));
        anyhow::bail!("{} record(s) break the layout rules", malformed.len());
    }

    if !json {
        print_success(&format!("{} records checked", report.records.len()));
    }
    Ok(())
}

fn print_record(record: &StagedRecord<'_>) {
    let layout = record.layout;
    let stride = record
        .uniform_stride
        .map(|stride| format!(", stride {}", stride))
        .unwrap_or_default();
    println!(
        "\n{}{}{}{} ({:?}, {} bytes, align {}{})",
        BOLD, BLUE, layout.name, RESET, layout.usage, layout.size, layout.align, stride
    );
    for field in &layout.fields {
        let marker = if layout.misaligned_fields().contains(&field) {
            format!(" {}{}{}", RED, CROSS, RESET)
        } else {
            String::new()
        };
        println!(
            "  {:>5}  {:>5}  {:<28} {}{}",
            field.offset, field.size, field.name, field.gpu_type, marker
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_uniform_records_get_a_stride() {
        let report = report_for(ShadingMode::Forward, GBufferFormat::Standard);
        let staged = staged_report(&report, &LayoutSettings::default()).unwrap();
        for record in &staged.staged {
            match record.layout.usage {
                RecordUsage::Uniform => assert_eq!(record.uniform_stride.unwrap() % 256, 0),
                _ => assert!(record.uniform_stride.is_none()),
            }
        }
    }

    #[test]
    fn test_material_stride_is_one_alignment_unit() {
        let report = report_for(ShadingMode::Deferred, GBufferFormat::Packed);
        let staged = staged_report(&report, &LayoutSettings::default()).unwrap();
        let material = staged
            .staged
            .iter()
            .find(|record| record.layout.name == "MaterialStruct")
            .unwrap();
        assert_eq!(material.uniform_stride, Some(256));
    }

    #[test]
    fn test_json_flattens_report_fields() {
        let report = report_for(ShadingMode::Deferred, GBufferFormat::Standard);
        let staged = staged_report(&report, &LayoutSettings::default()).unwrap();
        let json = serde_json::to_value(&staged).unwrap();
        assert_eq!(json["mode"], "deferred");
        assert_eq!(json["uniform_alignment"], 256);
        assert_eq!(json["staged"][1]["name"], "LightBlock");
    }

    #[test]
    fn test_every_configuration_passes() {
        for mode in [ModeArg::Forward, ModeArg::Deferred] {
            for format in [GBufferArg::Standard, GBufferArg::HighPrecision, GBufferArg::Packed] {
                run(mode.into(), format.into(), &LayoutSettings::default(), true).unwrap();
            }
        }
    }
}
