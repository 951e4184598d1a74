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

//! The GPU data layout model.
//!
//! Host code populates these records and uploads their byte images verbatim; the
//! shaders declare records with identical field order, size and padding for the
//! active [`ShadingMode`](super::ShadingMode). Sizes and offsets are checked at
//! compile time in each submodule.

pub mod gbuffer;
pub mod legacy;
pub mod lighting;
pub mod material;
pub mod model;
pub mod report;
pub mod staging;

pub use self::gbuffer::{
    ActiveGBuffers, AttachmentFormat, GBufferEncoding, GBufferFormat, GBuffers,
    HighPrecisionGBuffers, HighPrecisionVertexInOut, PackedGBuffers, SurfaceSample,
    VertexInOut,
};
pub use self::legacy::{LegacyLightBlock, LegacyPerLightData, LEGACY_MAX_LIGHTS};
pub use self::lighting::{
    populate_light_block, try_populate_light_block, DeferredLightBlock, ForwardLightBlock,
    LightBlock, LightBlockN, PerLightData,
};
pub use self::material::{
    populate_material, Material, MaterialColours, MaterialFlags, MaterialStruct,
    AMBIENT_DISABLED, AMBIENT_ENABLED,
};
pub use self::model::{GpuMat3, ModelMatrices};
pub use self::report::{report, report_for, LayoutReport, RecordLayout};
pub use self::staging::{uniform_stride, UniformStaging, MIN_UNIFORM_ALIGNMENT};
