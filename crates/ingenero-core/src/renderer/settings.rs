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

//! Settings that control how host data is packed into GPU records.

use serde::{Deserialize, Serialize};

use super::error::LayoutError;

/// What to do when more lights are supplied than a light block can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityPolicy {
    /// Keep the first `capacity` lights and drop the rest with a warning.
    #[default]
    Truncate,
    /// Refuse to build the block and report [`LayoutError::CapacityExceeded`].
    Reject,
}

/// Packing settings shared by every frame.
///
/// Missing fields take their default when deserialized, so a partial `Layout.toml`
/// is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    /// The intensity mapped to 1.0 in the HDR light buffer. Light intensities and
    /// material ambient colours are divided by it when packed.
    pub hdr_max_intensity: f32,
    /// The alignment, in bytes, of consecutive records in a dynamic uniform buffer.
    pub uniform_alignment: u32,
    /// How light blocks treat lights beyond their capacity.
    pub capacity_policy: CapacityPolicy,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            hdr_max_intensity: 1.0,
            uniform_alignment: 256,
            capacity_policy: CapacityPolicy::Truncate,
        }
    }
}

impl LayoutSettings {
    /// Checks that the uniform alignment is a non-zero power of two.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let alignment = self.uniform_alignment as usize;
        if alignment.is_power_of_two() {
            Ok(())
        } else {
            Err(LayoutError::MisalignedStride {
                stride: alignment,
                alignment: alignment.next_power_of_two(),
            })
        }
    }

    /// Returns the reciprocal of `hdr_max_intensity`, or `1.0` when the setting is
    /// not a positive finite number.
    pub(crate) fn inverse_hdr(&self) -> f32 {
        if self.hdr_max_intensity.is_finite() && self.hdr_max_intensity > 0.0 {
            1.0 / self.hdr_max_intensity
        } else {
            log::warn!(
                "Ignoring invalid hdr_max_intensity {}; using 1.0",
                self.hdr_max_intensity
            );
            1.0
        }
    }
}
