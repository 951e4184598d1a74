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

//! Emits WGSL declarations for the uniform records, checked against WGSL's
//! host-shareable layout rules.

use anyhow::{Context, Result};
use ingenero_core::renderer::layout::report::{GpuType, RecordUsage};
use ingenero_core::renderer::layout::{LayoutReport, MaterialFlags, RecordLayout};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::helpers::*;

/// Alignment and size of a type under WGSL's uniform address space rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WgslLayout {
    align: usize,
    size: usize,
}

const fn round_up(value: usize, align: usize) -> usize {
    value.div_ceil(align) * align
}

/// A struct member after scalar arrays have been split into single fields.
#[derive(Debug, Clone, PartialEq)]
struct Member {
    name: String,
    gpu_type: GpuType,
    offset: usize,
}

fn wgsl_type(gpu_type: &GpuType) -> Result<String> {
    Ok(match gpu_type {
        GpuType::Float => "f32".to_string(),
        GpuType::Int => "i32".to_string(),
        GpuType::Float2 => "vec2<f32>".to_string(),
        GpuType::Float3 => "vec3<f32>".to_string(),
        GpuType::Float4 => "vec4<f32>".to_string(),
        GpuType::Float3x3 => "mat3x3<f32>".to_string(),
        GpuType::Float4x4 => "mat4x4<f32>".to_string(),
        GpuType::Record(name) => name.to_string(),
        GpuType::Array(element, len) => format!("array<{}, {}>", wgsl_type(element)?, len),
        GpuType::Half | GpuType::Half3 | GpuType::Half4 | GpuType::Uchar4 => {
            anyhow::bail!("'{}' has no uniform-buffer equivalent in WGSL", gpu_type)
        }
    })
}

fn type_layout(gpu_type: &GpuType, structs: &HashMap<&str, WgslLayout>) -> Result<WgslLayout> {
    let layout = match gpu_type {
        GpuType::Float | GpuType::Int => WgslLayout { align: 4, size: 4 },
        GpuType::Float2 => WgslLayout { align: 8, size: 8 },
        GpuType::Float3 => WgslLayout { align: 16, size: 12 },
        GpuType::Float4 => WgslLayout { align: 16, size: 16 },
        GpuType::Float3x3 => WgslLayout { align: 16, size: 48 },
        GpuType::Float4x4 => WgslLayout { align: 16, size: 64 },
        GpuType::Record(name) => *structs
            .get(name)
            .with_context(|| format!("Record '{}' is used before it is declared", name))?,
        GpuType::Array(element, len) => {
            let element = type_layout(element, structs)?;
            let stride = round_up(element.size, element.align);
            if stride % 16 != 0 {
                anyhow::bail!(
                    "Uniform array of '{}' has stride {}, which is not a multiple of 16",
                    gpu_type,
                    stride
                );
            }
            WgslLayout {
                align: round_up(element.align, 16),
                size: stride * len,
            }
        }
        GpuType::Half | GpuType::Half3 | GpuType::Half4 | GpuType::Uchar4 => {
            anyhow::bail!("'{}' has no uniform-buffer equivalent in WGSL", gpu_type)
        }
    };
    Ok(layout)
}

/// Splits arrays of scalars into numbered members, since uniform arrays need a
/// 16-byte element stride.
fn members(record: &RecordLayout) -> Vec<Member> {
    let mut members = Vec::with_capacity(record.fields.len());
    for field in &record.fields {
        match &field.gpu_type {
            GpuType::Array(element, len) if !element.is_vector() => {
                let step = field.size / len;
                for i in 0..*len {
                    members.push(Member {
                        name: format!("{}_{}", field.name, i),
                        gpu_type: (**element).clone(),
                        offset: field.offset + i * step,
                    });
                }
            }
            _ => members.push(Member {
                name: field.name.to_string(),
                gpu_type: field.gpu_type.clone(),
                offset: field.offset,
            }),
        }
    }
    members
}

/// Declares `record` as a WGSL struct and returns its WGSL layout, failing if
/// any member would land at a different offset than the Rust type places it.
fn declare_struct(
    record: &RecordLayout,
    structs: &HashMap<&str, WgslLayout>,
    out: &mut String,
) -> Result<WgslLayout> {
    let mut offset = 0;
    let mut align = 4;

    writeln!(out, "struct {} {{", record.name)?;
    for member in members(record) {
        let layout = type_layout(&member.gpu_type, structs)
            .with_context(|| format!("In {}.{}", record.name, member.name))?;
        offset = round_up(offset, layout.align);
        if offset != member.offset {
            anyhow::bail!(
                "{}.{} sits at byte {} on the host but byte {} in WGSL",
                record.name,
                member.name,
                member.offset,
                offset
            );
        }
        writeln!(out, "    {}: {},", member.name, wgsl_type(&member.gpu_type)?)?;
        offset += layout.size;
        align = align.max(layout.align);
    }
    writeln!(out, "}}")?;

    let size = round_up(offset, align);
    if size != record.size {
        anyhow::bail!(
            "{} is {} bytes on the host but {} bytes in WGSL",
            record.name,
            record.size,
            size
        );
    }
    Ok(WgslLayout { align, size })
}

/// Renders constants and struct declarations for every uniform record in
/// `report`.
pub fn generate(report: &LayoutReport) -> Result<String> {
    let mut out = String::new();
    writeln!(
        out,
        "// Generated by `cargo xtask wgsl` for the {} shading mode. Do not edit.\n",
        report.mode
    )?;
    writeln!(out, "const MAX_LIGHTS: u32 = {}u;", report.light_block.capacity)?;
    for (name, flag) in [
        ("MATERIAL_AMBIENT_MAP", MaterialFlags::AMBIENT_MAP),
        ("MATERIAL_DIFFUSE_MAP", MaterialFlags::DIFFUSE_MAP),
        ("MATERIAL_SPECULAR_COLOUR_MAP", MaterialFlags::SPECULAR_COLOUR_MAP),
        ("MATERIAL_SPECULARITY_MAP", MaterialFlags::SPECULARITY_MAP),
        ("MATERIAL_NORMAL_MAP", MaterialFlags::NORMAL_MAP),
    ] {
        writeln!(out, "const {}: i32 = {};", name, flag.bits())?;
    }

    let mut structs = HashMap::new();
    for record in report
        .records
        .iter()
        .filter(|record| record.usage == RecordUsage::Uniform)
    {
        out.push('\n');
        let layout = declare_struct(record, &structs, &mut out)?;
        log::debug!("{}: align {}, size {}", record.name, layout.align, layout.size);
        structs.insert(record.name, layout);
    }

    Ok(out)
}

/// Writes the generated declarations to `output`, or to stdout when `output` is
/// `None`.
pub fn run(report: &LayoutReport, output: Option<&Path>) -> Result<()> {
    let source = generate(report)?;
    match output {
        Some(path) => {
            print_task_start("Generating WGSL Layouts", RULER, MAGENTA);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create output directory '{}'", parent.display())
                })?;
            }
            fs::write(path, &source)
                .with_context(|| format!("Failed to write '{}'", path.display()))?;
            print_success(&format!("Wrote {}", path.display()));
        }
        None => print!("{}", source),
    }
    Ok(())
}
