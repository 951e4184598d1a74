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

//! Compile-time selection between the forward and deferred record layouts.
//!
//! A build targets exactly one shading mode, chosen by the `deferred` cargo feature.
//! Host code and shaders must be built for the same mode; nothing checks this at
//! runtime.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::mem::size_of;

use super::layout::{DeferredLightBlock, ForwardLightBlock, PerLightData};

/// Light capacity of a forward-shading light block.
pub const FORWARD_MAX_LIGHTS: usize = 32;

/// Light capacity of a deferred-shading light block. Deferred shading resolves one
/// light per pass.
pub const DEFERRED_MAX_LIGHTS: usize = 1;

/// The light capacity of the active build.
pub const MAX_LIGHTS: usize = ShadingMode::ACTIVE.light_capacity();

/// The lighting strategy a build is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadingMode {
    /// All lights are batched into one block and shaded per draw.
    Forward,
    /// Surface attributes go to G-buffers; lights are applied one pass at a time.
    Deferred,
}

impl ShadingMode {
    /// The mode this crate was compiled for.
    #[cfg(not(feature = "deferred"))]
    pub const ACTIVE: Self = ShadingMode::Forward;
    /// The mode this crate was compiled for.
    #[cfg(feature = "deferred")]
    pub const ACTIVE: Self = ShadingMode::Deferred;

    /// The number of lights a light block holds in this mode.
    pub const fn light_capacity(self) -> usize {
        match self {
            ShadingMode::Forward => FORWARD_MAX_LIGHTS,
            ShadingMode::Deferred => DEFERRED_MAX_LIGHTS,
        }
    }

    /// Returns `true` for [`ShadingMode::Deferred`].
    pub const fn is_deferred(self) -> bool {
        matches!(self, ShadingMode::Deferred)
    }
}

impl Default for ShadingMode {
    fn default() -> Self {
        Self::ACTIVE
    }
}

impl fmt::Display for ShadingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShadingMode::Forward => write!(f, "forward"),
            ShadingMode::Deferred => write!(f, "deferred"),
        }
    }
}

/// The shape of the light block used by a shading mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LightBlockLayout {
    /// The mode this layout belongs to.
    pub mode: ShadingMode,
    /// The number of `PerLightData` entries in the block.
    pub capacity: usize,
    /// The size of the whole block in bytes.
    pub size: usize,
    /// The size of one `PerLightData` entry in bytes.
    pub light_stride: usize,
}

/// Describes the light block layout of `mode`.
///
/// Both layouts are always compiled, so tools can inspect either one; the
/// [`LightBlock`](super::layout::LightBlock) alias names the one this build uploads.
pub const fn select_layout(mode: ShadingMode) -> LightBlockLayout {
    let size = match mode {
        ShadingMode::Forward => size_of::<ForwardLightBlock>(),
        ShadingMode::Deferred => size_of::<DeferredLightBlock>(),
    };
    LightBlockLayout {
        mode,
        capacity: mode.light_capacity(),
        size,
        light_stride: size_of::<PerLightData>(),
    }
}
