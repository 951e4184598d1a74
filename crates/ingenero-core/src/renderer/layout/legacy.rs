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

//! The first-generation light layout, kept for shaders that still read it.
//!
//! Unlike the current layout it stores an explicit light count and a global
//! attenuation factor, packs the falloff into the `w` of the intensity, and always
//! holds 32 lights regardless of shading mode.

use bytemuck::{Pod, Zeroable};

use crate::math::{Vec3, Vec4};

/// Capacity of a [`LegacyLightBlock`].
pub const LEGACY_MAX_LIGHTS: usize = 32;

/// One light in the first-generation layout.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct LegacyPerLightData {
    /// Camera-space position or direction.
    pub position: Vec4,
    /// Radiance in `xyz`, scalar falloff in `w`.
    pub intensity: Vec4,
}

impl LegacyPerLightData {
    /// Packs a light entry.
    pub fn new(position: Vec4, intensity: Vec3, falloff: f32) -> Self {
        Self {
            position,
            intensity: intensity.extend(falloff),
        }
    }

    /// The scalar falloff stored in `intensity.w`.
    pub fn falloff(&self) -> f32 {
        self.intensity.w
    }
}

/// The first-generation light block.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LegacyLightBlock {
    /// Ambient radiance.
    pub ambient: Vec4,
    /// The number of valid entries at the start of `lights`.
    pub num_dynamic_lights: i32,
    /// Padding for 16-byte alignment.
    pub _padding1: i32,
    /// A global multiplier on every light's attenuation.
    pub light_attenuation_factor: f32,
    /// Padding for 16-byte alignment.
    pub _padding2: f32,
    /// The light entries. Entries past `num_dynamic_lights` are zeroed.
    pub lights: [LegacyPerLightData; LEGACY_MAX_LIGHTS],
}

const _: () = assert!(std::mem::size_of::<LegacyPerLightData>() == 32);
const _: () = assert!(std::mem::offset_of!(LegacyLightBlock, num_dynamic_lights) == 16);
const _: () = assert!(std::mem::offset_of!(LegacyLightBlock, light_attenuation_factor) == 24);
const _: () = assert!(std::mem::offset_of!(LegacyLightBlock, lights) == 32);
const _: () = assert!(std::mem::size_of::<LegacyLightBlock>() == 32 + 32 * 32);

impl Default for LegacyLightBlock {
    fn default() -> Self {
        Zeroable::zeroed()
    }
}

impl LegacyLightBlock {
    /// Copies up to 32 lights and records how many were kept.
    pub fn populate(lights: &[LegacyPerLightData], ambient: Vec4, attenuation_factor: f32) -> Self {
        let kept = lights.len().min(LEGACY_MAX_LIGHTS);
        if kept < lights.len() {
            log::warn!(
                "Legacy light block holds {} lights; dropping {}",
                LEGACY_MAX_LIGHTS,
                lights.len() - kept
            );
        }
        let mut block = Self {
            ambient,
            num_dynamic_lights: kept as i32,
            light_attenuation_factor: attenuation_factor,
            ..Self::default()
        };
        block.lights[..kept].copy_from_slice(&lights[..kept]);
        block
    }

    /// The valid entries, as counted by `num_dynamic_lights`.
    pub fn active_lights(&self) -> &[LegacyPerLightData] {
        let count = (self.num_dynamic_lights.max(0) as usize).min(LEGACY_MAX_LIGHTS);
        &self.lights[..count]
    }

    /// The byte image uploaded to the GPU.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_populate_records_count_and_attenuation() {
        let lights: Vec<_> = (0..3)
            .map(|i| LegacyPerLightData::new(Vec4::W, Vec3::splat(i as f32), 0.5))
            .collect();
        let block = LegacyLightBlock::populate(&lights, Vec4::ZERO, 0.25);
        assert_eq!(block.num_dynamic_lights, 3);
        assert_eq!(block.light_attenuation_factor, 0.25);
        assert_eq!(block.active_lights(), &lights[..]);
        assert_eq!(block.active_lights()[2].falloff(), 0.5);
    }

    #[test]
    fn test_populate_truncates_and_counts_kept_lights() {
        let lights = vec![LegacyPerLightData::new(Vec4::W, Vec3::ONE, 1.0); 40];
        let block = LegacyLightBlock::populate(&lights, Vec4::ZERO, 1.0);
        assert_eq!(block.num_dynamic_lights, 32);
        assert_eq!(block.active_lights().len(), 32);
    }

    #[test]
    fn test_header_byte_layout() {
        let block = LegacyLightBlock::populate(&[], Vec4::W, 2.0);
        let words: &[u32] = bytemuck::cast_slice(block.as_bytes());
        assert_eq!(words[4], 0);
        assert_eq!(f32::from_bits(words[6]), 2.0);
        assert_eq!(words[5], 0);
        assert_eq!(words[7], 0);
    }
}
