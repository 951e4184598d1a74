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

//! Current light-block layout.
//!
//! A light block is an ambient term followed by a fixed-capacity array of
//! [`PerLightData`]. Capacity is a compile-time constant: 32 in forward builds and 1
//! in deferred builds, where each light is resolved in its own pass. Both
//! instantiations are always available; [`LightBlock`] names the one the active
//! build uploads.

use bytemuck::{Pod, Zeroable};

use crate::math::{Mat4, Vec3, Vec4};
use crate::renderer::error::LayoutError;
use crate::renderer::light::{Light, LightFalloff, LightKind};
use crate::renderer::mode::{DEFERRED_MAX_LIGHTS, FORWARD_MAX_LIGHTS, MAX_LIGHTS};
use crate::renderer::settings::{CapacityPolicy, LayoutSettings};

/// One light as seen by the lighting shaders.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct PerLightData {
    /// Camera-space position (`w = 1`) of a point light, or the camera-space
    /// direction the light arrives from (`w = 0`) for a directional light.
    pub position_in_camera_space: Vec4,
    /// Radiance (rgb), already divided by the HDR range. `w` is unused.
    pub intensity: Vec4,
    /// `(constant, linear, quadratic, 0)` attenuation coefficients.
    pub falloff: Vec4,
}

impl PerLightData {
    /// Packs a point light at `position` (camera space).
    pub fn point(position: Vec3, intensity: Vec3, falloff: LightFalloff) -> Self {
        Self {
            position_in_camera_space: position.extend(1.0),
            intensity: intensity.extend(0.0),
            falloff: falloff.to_vec4(),
        }
    }

    /// Packs a directional light arriving from `direction` (camera space).
    pub fn directional(direction: Vec3, intensity: Vec3) -> Self {
        Self {
            position_in_camera_space: direction.extend(0.0),
            intensity: intensity.extend(0.0),
            falloff: LightFalloff::NONE.to_vec4(),
        }
    }

    /// Returns `true` when the entry describes a directional light.
    pub fn is_directional(&self) -> bool {
        self.position_in_camera_space.w == 0.0
    }
}

/// A light block holding up to `N` lights.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightBlockN<const N: usize> {
    /// Accumulated ambient radiance (rgb). `w` is unused.
    pub ambient_intensity: Vec4,
    /// The light entries. Unused entries are zeroed.
    pub lights: [PerLightData; N],
}

// SAFETY: `repr(C)`, every field is `Pod`, and all fields are 4-byte aligned `f32`
// data with sizes that are multiples of 16, so there is no padding for any `N`.
unsafe impl<const N: usize> Zeroable for LightBlockN<N> {}
// SAFETY: see above.
unsafe impl<const N: usize> Pod for LightBlockN<N> {}

/// The 32-light block used by forward shading.
pub type ForwardLightBlock = LightBlockN<FORWARD_MAX_LIGHTS>;
/// The single-light block used by each deferred lighting pass.
pub type DeferredLightBlock = LightBlockN<DEFERRED_MAX_LIGHTS>;
/// The light block of the active shading mode.
pub type LightBlock = LightBlockN<MAX_LIGHTS>;

const _: () = assert!(std::mem::size_of::<PerLightData>() == 48);
const _: () = assert!(std::mem::offset_of!(PerLightData, intensity) == 16);
const _: () = assert!(std::mem::offset_of!(PerLightData, falloff) == 32);
const _: () = assert!(std::mem::offset_of!(LightBlockN<FORWARD_MAX_LIGHTS>, lights) == 16);
const _: () = assert!(std::mem::size_of::<ForwardLightBlock>() == 16 + 32 * 48);
const _: () = assert!(std::mem::size_of::<DeferredLightBlock>() == 16 + 48);

impl<const N: usize> Default for LightBlockN<N> {
    fn default() -> Self {
        Zeroable::zeroed()
    }
}

impl<const N: usize> LightBlockN<N> {
    /// The number of light entries in this block type.
    pub const CAPACITY: usize = N;

    /// Creates a block with the given ambient term and no lights.
    pub fn new(ambient_intensity: Vec4) -> Self {
        Self {
            ambient_intensity,
            ..Self::default()
        }
    }

    /// Copies up to `N` lights into a new block. Lights past the capacity are
    /// dropped.
    pub fn populate(lights: &[PerLightData], ambient_intensity: Vec4) -> Self {
        if lights.len() > N {
            log::warn!(
                "Light block holds {} lights; dropping {} of {}",
                N,
                lights.len() - N,
                lights.len()
            );
        }
        let mut block = Self::new(ambient_intensity);
        for (slot, light) in block.lights.iter_mut().zip(lights) {
            *slot = *light;
        }
        block
    }

    /// Like [`populate`](Self::populate), but fails instead of dropping lights.
    pub fn try_populate(
        lights: &[PerLightData],
        ambient_intensity: Vec4,
    ) -> Result<Self, LayoutError> {
        if lights.len() > N {
            return Err(LayoutError::CapacityExceeded {
                capacity: N,
                requested: lights.len(),
            });
        }
        Ok(Self::populate(lights, ambient_intensity))
    }

    /// Builds a block from scene lights.
    ///
    /// Disabled lights are skipped. Ambient lights are summed into the ambient term;
    /// point positions and directional directions are moved into camera space by
    /// `world_to_camera`. All radiance is divided by `settings.hdr_max_intensity`.
    /// Overflow follows `settings.capacity_policy`.
    pub fn from_scene_lights(
        lights: &[Light],
        world_to_camera: &Mat4,
        settings: &LayoutSettings,
    ) -> Result<Self, LayoutError> {
        let inv_hdr = settings.inverse_hdr();
        let mut ambient = Vec3::ZERO;
        let mut packed = Vec::with_capacity(lights.len().min(N));

        for light in lights.iter().filter(|light| light.enabled) {
            let radiance = light.colour_vector() * inv_hdr;
            match light.kind {
                LightKind::Ambient => ambient = ambient + radiance,
                LightKind::Directional { from_direction } => {
                    let direction = (*world_to_camera * from_direction.extend(0.0))
                        .truncate()
                        .normalize();
                    packed.push(PerLightData::directional(direction, radiance));
                }
                LightKind::Point { position, falloff } => {
                    let position = (*world_to_camera * position.extend(1.0)).truncate();
                    packed.push(PerLightData::point(position, radiance, falloff));
                }
            }
        }

        log::debug!(
            "Packed {} of {} scene lights into a {}-light block",
            packed.len().min(N),
            lights.len(),
            N
        );

        let ambient = ambient.extend(0.0);
        match settings.capacity_policy {
            CapacityPolicy::Truncate => Ok(Self::populate(&packed, ambient)),
            CapacityPolicy::Reject => Self::try_populate(&packed, ambient),
        }
    }

    /// All `N` light entries, including zeroed unused ones.
    pub fn lights(&self) -> &[PerLightData] {
        &self.lights
    }

    /// The light entry at `index`, if within capacity.
    pub fn light(&self, index: usize) -> Option<&PerLightData> {
        self.lights.get(index)
    }

    /// The byte image uploaded to the GPU.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// Builds the active build's light block, dropping lights past [`MAX_LIGHTS`].
pub fn populate_light_block(lights: &[PerLightData], ambient_intensity: Vec4) -> LightBlock {
    LightBlock::populate(lights, ambient_intensity)
}

/// Builds the active build's light block, failing with
/// [`LayoutError::CapacityExceeded`] when more than [`MAX_LIGHTS`] lights are given.
pub fn try_populate_light_block(
    lights: &[PerLightData],
    ambient_intensity: Vec4,
) -> Result<LightBlock, LayoutError> {
    LightBlock::try_populate(lights, ambient_intensity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_lights(count: usize) -> Vec<PerLightData> {
        (0..count)
            .map(|i| {
                let f = i as f32;
                PerLightData::point(
                    Vec3::new(f, -f, f * 0.5),
                    Vec3::new(1.0, 0.5, f / 40.0),
                    LightFalloff::QUADRATIC,
                )
            })
            .collect()
    }

    #[test]
    fn test_forward_block_truncates_to_first_32() {
        let lights = sample_lights(40);
        let block = ForwardLightBlock::populate(&lights, Vec4::ZERO);
        assert_eq!(block.lights(), &lights[..32]);
        assert_eq!(block.light(31), Some(&lights[31]));
        assert_eq!(block.light(32), None);
    }

    #[test]
    fn test_deferred_block_keeps_only_first_light() {
        let lights = sample_lights(3);
        let block = DeferredLightBlock::populate(&lights, Vec4::ZERO);
        assert_eq!(block.lights(), &lights[..1]);
    }

    #[test]
    fn test_try_populate_reports_overflow() {
        let lights = sample_lights(40);
        assert_eq!(
            ForwardLightBlock::try_populate(&lights, Vec4::ZERO),
            Err(LayoutError::CapacityExceeded {
                capacity: 32,
                requested: 40
            })
        );
        assert!(ForwardLightBlock::try_populate(&lights[..32], Vec4::ZERO).is_ok());
    }

    #[test]
    fn test_unused_slots_are_zeroed() {
        let lights = sample_lights(2);
        let block = ForwardLightBlock::populate(&lights, Vec4::new(0.1, 0.2, 0.3, 0.0));
        assert!(block.lights()[2..]
            .iter()
            .all(|l| *l == PerLightData::default()));
        assert_eq!(block.ambient_intensity, Vec4::new(0.1, 0.2, 0.3, 0.0));
    }

    #[test]
    fn test_byte_image_layout() {
        let lights = sample_lights(1);
        let block = ForwardLightBlock::populate(&lights, Vec4::new(1.0, 2.0, 3.0, 4.0));
        let bytes = block.as_bytes();
        assert_eq!(bytes.len(), 1552);
        let floats: &[f32] = bytemuck::cast_slice(bytes);
        assert_eq!(&floats[..4], &[1.0, 2.0, 3.0, 4.0]);
        // First light's position starts right after the ambient term.
        assert_eq!(&floats[4..8], &[0.0, -0.0, 0.0, 1.0]);
        // Falloff of the first light.
        assert_eq!(&floats[12..16], &[1.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_from_scene_lights_accumulates_ambient_and_moves_to_camera_space() {
        let world_to_camera = Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0));
        let settings = LayoutSettings {
            hdr_max_intensity: 2.0,
            ..Default::default()
        };
        let lights = [
            Light::ambient(Vec3::new(0.2, 0.2, 0.2), 1.0),
            Light::ambient(Vec3::new(0.2, 0.0, 0.0), 1.0),
            Light::point(Vec3::new(1.0, 0.0, 0.0), LightFalloff::QUADRATIC, Vec3::ONE, 4.0),
            Light::directional(Vec3::new(0.0, 2.0, 0.0), Vec3::ONE, 1.0),
            Light::point(Vec3::ZERO, LightFalloff::NONE, Vec3::ONE, 1.0).with_enabled(false),
        ];

        let block = ForwardLightBlock::from_scene_lights(&lights, &world_to_camera, &settings)
            .unwrap();

        assert_relative_eq!(block.ambient_intensity.x, 0.2);
        assert_relative_eq!(block.ambient_intensity.y, 0.1);

        let point = block.light(0).unwrap();
        assert_eq!(point.position_in_camera_space, Vec4::new(1.0, 0.0, -5.0, 1.0));
        assert_eq!(point.intensity, Vec4::new(2.0, 2.0, 2.0, 0.0));
        assert!(!point.is_directional());

        let sun = block.light(1).unwrap();
        assert!(sun.is_directional());
        assert_eq!(sun.position_in_camera_space, Vec4::new(0.0, 1.0, 0.0, 0.0));
        assert_eq!(sun.falloff, LightFalloff::NONE.to_vec4());

        assert_eq!(*block.light(2).unwrap(), PerLightData::default());
    }

    #[test]
    fn test_from_scene_lights_respects_capacity_policy() {
        let lights = vec![Light::directional(Vec3::Y, Vec3::ONE, 1.0); 2];
        let truncate = LayoutSettings::default();
        let reject = LayoutSettings {
            capacity_policy: CapacityPolicy::Reject,
            ..Default::default()
        };

        let block =
            DeferredLightBlock::from_scene_lights(&lights, &Mat4::IDENTITY, &truncate).unwrap();
        assert!(block.light(0).unwrap().is_directional());
        assert_eq!(
            DeferredLightBlock::from_scene_lights(&lights, &Mat4::IDENTITY, &reject),
            Err(LayoutError::CapacityExceeded {
                capacity: 1,
                requested: 2
            })
        );
    }

    #[test]
    fn test_active_block_helpers() {
        let lights = sample_lights(MAX_LIGHTS + 3);
        let block = populate_light_block(&lights, Vec4::ZERO);
        assert_eq!(block.lights(), &lights[..MAX_LIGHTS]);
        assert!(try_populate_light_block(&lights, Vec4::ZERO).is_err());
        assert_eq!(LightBlock::CAPACITY, MAX_LIGHTS);
    }
}
