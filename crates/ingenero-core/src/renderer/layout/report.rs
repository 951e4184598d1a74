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

//! Descriptions of every GPU record, for tooling and layout checks.
//!
//! The report is built from `offset_of!`/`size_of_val` on the real Rust types, so it
//! always reflects what the host uploads.

use serde::{Serialize, Serializer};
use std::fmt;

use super::{
    DeferredLightBlock, ForwardLightBlock, GBufferFormat, GBuffers, HighPrecisionGBuffers,
    HighPrecisionVertexInOut, LegacyLightBlock, LegacyPerLightData, MaterialStruct,
    ModelMatrices, PackedGBuffers, PerLightData, VertexInOut,
};
use crate::renderer::mode::{select_layout, LightBlockLayout, ShadingMode};

/// Alignment every vector-typed uniform field must start on.
pub const UNIFORM_FIELD_ALIGNMENT: usize = 16;

/// The shading-language type of a record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GpuType {
    /// 32-bit float.
    Float,
    /// 32-bit signed integer.
    Int,
    /// 16-bit float.
    Half,
    /// Two 32-bit floats.
    Float2,
    /// Three 32-bit floats padded to 16 bytes.
    Float3,
    /// Four 32-bit floats.
    Float4,
    /// Three 16-bit floats padded to 8 bytes.
    Half3,
    /// Four 16-bit floats.
    Half4,
    /// Four normalized bytes.
    Uchar4,
    /// Column-major 3x3 float matrix, columns padded to 16 bytes.
    Float3x3,
    /// Column-major 4x4 float matrix.
    Float4x4,
    /// Another record, by name.
    Record(&'static str),
    /// A fixed-length array.
    Array(Box<GpuType>, usize),
}

impl GpuType {
    /// Returns `true` for types that must start on a 16-byte boundary in a uniform
    /// buffer.
    pub fn is_vector(&self) -> bool {
        match self {
            GpuType::Float | GpuType::Int | GpuType::Half => false,
            GpuType::Array(element, _) => element.is_vector(),
            _ => true,
        }
    }
}

impl fmt::Display for GpuType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuType::Float => write!(f, "float"),
            GpuType::Int => write!(f, "int"),
            GpuType::Half => write!(f, "half"),
            GpuType::Float2 => write!(f, "float2"),
            GpuType::Float3 => write!(f, "float3"),
            GpuType::Float4 => write!(f, "float4"),
            GpuType::Half3 => write!(f, "half3"),
            GpuType::Half4 => write!(f, "half4"),
            GpuType::Uchar4 => write!(f, "uchar4"),
            GpuType::Float3x3 => write!(f, "float3x3"),
            GpuType::Float4x4 => write!(f, "float4x4"),
            GpuType::Record(name) => write!(f, "{name}"),
            GpuType::Array(element, len) => write!(f, "{element}[{len}]"),
        }
    }
}

impl Serialize for GpuType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One field of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldLayout {
    /// The Rust field name.
    pub name: &'static str,
    /// Byte offset from the start of the record.
    pub offset: usize,
    /// Size in bytes.
    pub size: usize,
    /// Shading-language type.
    pub gpu_type: GpuType,
}

/// What a record is used for, which decides the alignment rules it follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordUsage {
    /// Read from a uniform buffer; vector fields must be 16-byte aligned.
    Uniform,
    /// Written to render targets by a fragment shader.
    RenderTarget,
    /// Passed from the vertex to the fragment stage.
    Interpolant,
}

/// The layout of one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordLayout {
    /// The record name shared by host and shader code.
    pub name: &'static str,
    /// How the record is consumed.
    pub usage: RecordUsage,
    /// Size in bytes.
    pub size: usize,
    /// Alignment of the Rust type in bytes.
    pub align: usize,
    /// Fields in declaration order.
    pub fields: Vec<FieldLayout>,
}

impl RecordLayout {
    /// Uniform fields that break the 16-byte rule. Always empty for other usages.
    pub fn misaligned_fields(&self) -> Vec<&FieldLayout> {
        if self.usage != RecordUsage::Uniform {
            return Vec::new();
        }
        self.fields
            .iter()
            .filter(|field| field.gpu_type.is_vector() && field.offset % UNIFORM_FIELD_ALIGNMENT != 0)
            .collect()
    }

    /// Returns `true` when fields tile the record with no implicit gaps and the
    /// uniform alignment rule holds.
    pub fn is_well_formed(&self) -> bool {
        let mut end = 0;
        for field in &self.fields {
            if field.offset != end {
                return false;
            }
            end += field.size;
        }
        end <= self.size && self.misaligned_fields().is_empty()
    }
}

/// Layout of every record in one build configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutReport {
    /// The shading mode described.
    pub mode: ShadingMode,
    /// The G-buffer variant described.
    pub gbuffer_format: GBufferFormat,
    /// Shape of the light block for `mode`.
    pub light_block: LightBlockLayout,
    /// Every record uploaded or exchanged with shaders.
    pub records: Vec<RecordLayout>,
}

impl LayoutReport {
    /// Looks up a record by name.
    pub fn record(&self, name: &str) -> Option<&RecordLayout> {
        self.records.iter().find(|record| record.name == name)
    }
}

macro_rules! field {
    ($record:ty, $field:ident, $gpu:expr) => {{
        let zeroed: $record = bytemuck::Zeroable::zeroed();
        FieldLayout {
            name: stringify!($field),
            offset: std::mem::offset_of!($record, $field),
            size: std::mem::size_of_val(&zeroed.$field),
            gpu_type: $gpu,
        }
    }};
}

macro_rules! record {
    ($record:ty, $name:expr, $usage:expr, [$($field:expr),* $(,)?]) => {
        RecordLayout {
            name: $name,
            usage: $usage,
            size: std::mem::size_of::<$record>(),
            align: std::mem::align_of::<$record>(),
            fields: vec![$($field),*],
        }
    };
}

fn per_light_data() -> RecordLayout {
    record!(PerLightData, "PerLightData", RecordUsage::Uniform, [
        field!(PerLightData, position_in_camera_space, GpuType::Float4),
        field!(PerLightData, intensity, GpuType::Float4),
        field!(PerLightData, falloff, GpuType::Float4),
    ])
}

fn light_block(mode: ShadingMode) -> RecordLayout {
    let lights = GpuType::Array(Box::new(GpuType::Record("PerLightData")), mode.light_capacity());
    match mode {
        ShadingMode::Forward => record!(ForwardLightBlock, "LightBlock", RecordUsage::Uniform, [
            field!(ForwardLightBlock, ambient_intensity, GpuType::Float4),
            field!(ForwardLightBlock, lights, lights),
        ]),
        ShadingMode::Deferred => record!(DeferredLightBlock, "LightBlock", RecordUsage::Uniform, [
            field!(DeferredLightBlock, ambient_intensity, GpuType::Float4),
            field!(DeferredLightBlock, lights, lights),
        ]),
    }
}

fn legacy_records() -> [RecordLayout; 2] {
    [
        record!(LegacyPerLightData, "LegacyPerLightData", RecordUsage::Uniform, [
            field!(LegacyPerLightData, position, GpuType::Float4),
            field!(LegacyPerLightData, intensity, GpuType::Float4),
        ]),
        record!(LegacyLightBlock, "LegacyLightBlock", RecordUsage::Uniform, [
            field!(LegacyLightBlock, ambient, GpuType::Float4),
            field!(LegacyLightBlock, num_dynamic_lights, GpuType::Int),
            field!(LegacyLightBlock, _padding1, GpuType::Int),
            field!(LegacyLightBlock, light_attenuation_factor, GpuType::Float),
            field!(LegacyLightBlock, _padding2, GpuType::Float),
            field!(
                LegacyLightBlock,
                lights,
                GpuType::Array(Box::new(GpuType::Record("LegacyPerLightData")), 32)
            ),
        ]),
    ]
}

fn material_struct() -> RecordLayout {
    record!(MaterialStruct, "MaterialStruct", RecordUsage::Uniform, [
        field!(MaterialStruct, ambient_colour, GpuType::Float4),
        field!(MaterialStruct, diffuse_colour, GpuType::Float4),
        field!(MaterialStruct, specular_colour, GpuType::Float4),
        field!(MaterialStruct, flags, GpuType::Int),
        field!(MaterialStruct, _padding, GpuType::Array(Box::new(GpuType::Int), 3)),
    ])
}

fn model_matrices() -> RecordLayout {
    record!(ModelMatrices, "ModelMatrices", RecordUsage::Uniform, [
        field!(ModelMatrices, model_to_camera_rotation, GpuType::Float3x3),
        field!(ModelMatrices, normal_model_to_camera, GpuType::Float3x3),
        field!(ModelMatrices, model_to_camera, GpuType::Float4x4),
        field!(ModelMatrices, projection, GpuType::Float4x4),
    ])
}

fn gbuffers(format: GBufferFormat) -> RecordLayout {
    match format {
        GBufferFormat::Standard => record!(GBuffers, "GBuffers", RecordUsage::RenderTarget, [
            field!(GBuffers, diffuse, GpuType::Float4),
            field!(GBuffers, normal, GpuType::Half3),
            field!(GBuffers, _normal_padding, GpuType::Half),
            field!(GBuffers, specular, GpuType::Half4),
            field!(GBuffers, light, GpuType::Float4),
        ]),
        GBufferFormat::HighPrecision => {
            record!(HighPrecisionGBuffers, "GBuffers", RecordUsage::RenderTarget, [
                field!(HighPrecisionGBuffers, diffuse, GpuType::Float4),
                field!(HighPrecisionGBuffers, normal, GpuType::Float4),
                field!(HighPrecisionGBuffers, specular, GpuType::Float4),
                field!(HighPrecisionGBuffers, light, GpuType::Float4),
            ])
        }
        GBufferFormat::Packed => record!(PackedGBuffers, "GBuffers", RecordUsage::RenderTarget, [
            field!(PackedGBuffers, light, GpuType::Uchar4),
            field!(PackedGBuffers, normal, GpuType::Uchar4),
            field!(PackedGBuffers, diffuse, GpuType::Uchar4),
        ]),
    }
}

fn vertex_in_out(format: GBufferFormat) -> RecordLayout {
    match format {
        GBufferFormat::HighPrecision => {
            record!(HighPrecisionVertexInOut, "VertexInOut", RecordUsage::Interpolant, [
                field!(HighPrecisionVertexInOut, texture_coordinate, GpuType::Float2),
                field!(HighPrecisionVertexInOut, _padding, GpuType::Float2),
                field!(HighPrecisionVertexInOut, normal, GpuType::Float3),
                field!(HighPrecisionVertexInOut, camera_space_position, GpuType::Float3),
                field!(HighPrecisionVertexInOut, position, GpuType::Float4),
                field!(
                    HighPrecisionVertexInOut,
                    tangent_to_camera,
                    GpuType::Array(Box::new(GpuType::Float3), 3)
                ),
            ])
        }
        _ => record!(VertexInOut, "VertexInOut", RecordUsage::Interpolant, [
            field!(VertexInOut, texture_coordinate, GpuType::Float2),
            field!(VertexInOut, normal, GpuType::Half3),
            field!(VertexInOut, camera_space_position, GpuType::Float3),
            field!(VertexInOut, position, GpuType::Float4),
            field!(VertexInOut, tangent_to_camera, GpuType::Array(Box::new(GpuType::Half3), 3)),
            field!(VertexInOut, _padding, GpuType::Float2),
        ]),
    }
}

/// Describes every record for `mode` and the given G-buffer variant.
pub fn report_for(mode: ShadingMode, gbuffer_format: GBufferFormat) -> LayoutReport {
    let [legacy_light, legacy_block] = legacy_records();
    LayoutReport {
        mode,
        gbuffer_format,
        light_block: select_layout(mode),
        records: vec![
            per_light_data(),
            light_block(mode),
            material_struct(),
            model_matrices(),
            gbuffers(gbuffer_format),
            vertex_in_out(gbuffer_format),
            legacy_light,
            legacy_block,
        ],
    }
}

/// Describes every record of the active build.
pub fn report() -> LayoutReport {
    report_for(ShadingMode::ACTIVE, GBufferFormat::ACTIVE)
}
