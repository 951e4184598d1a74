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

//! Scene-side light descriptions.
//!
//! These are the host representation of lights. They are packed into
//! [`PerLightData`](super::layout::PerLightData) entries by
//! [`LightBlockN::from_scene_lights`](super::layout::LightBlockN::from_scene_lights).
//! Point lights also size the light volumes drawn in deferred passes.

use serde::{Deserialize, Serialize};

use crate::math::{Mat4, Vec3, Vec4};

/// Distance attenuation `1 / (constant + linear·d + quadratic·d²)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightFalloff {
    /// The constant term.
    pub constant: f32,
    /// The term proportional to distance.
    pub linear: f32,
    /// The term proportional to squared distance.
    pub quadratic: f32,
}

impl LightFalloff {
    /// No attenuation.
    pub const NONE: Self = Self::new(1.0, 0.0, 0.0);
    /// Attenuation proportional to distance.
    pub const LINEAR: Self = Self::new(1.0, 1.0, 0.0);
    /// Inverse-square attenuation.
    pub const QUADRATIC: Self = Self::new(1.0, 0.0, 1.0);

    /// Creates a falloff from its three coefficients.
    pub const fn new(constant: f32, linear: f32, quadratic: f32) -> Self {
        Self {
            constant,
            linear,
            quadratic,
        }
    }

    /// Packs the coefficients as `(constant, linear, quadratic, 0)`.
    pub const fn to_vec4(self) -> Vec4 {
        Vec4::new(self.constant, self.linear, self.quadratic, 0.0)
    }

    /// Returns the distance at which a light of peak channel value `brightness`
    /// attenuates to `1`, or `f32::INFINITY` when it never does. Never negative: a
    /// light already dimmer than `constant` reaches `0`.
    pub fn reach(&self, brightness: f32) -> f32 {
        let (c, l, q) = (self.constant, self.linear, self.quadratic);
        if q > 0.0 {
            let discriminant = l * l - 4.0 * q * (c - brightness);
            ((-l + discriminant.max(0.0).sqrt()) / (2.0 * q)).max(0.0)
        } else if l > 0.0 {
            ((brightness - c) / l).max(0.0)
        } else {
            f32::INFINITY
        }
    }
}

impl Default for LightFalloff {
    fn default() -> Self {
        Self::QUADRATIC
    }
}

/// The kind of a light and its kind-specific parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightKind {
    /// Uniform light added to every surface. Accumulated into the block's ambient term.
    Ambient,
    /// A light infinitely far away.
    Directional {
        /// The direction, in world space, that light arrives **from**.
        from_direction: Vec3,
    },
    /// A light at a point that attenuates with distance.
    Point {
        /// The world-space position of the light.
        position: Vec3,
        /// The attenuation curve.
        falloff: LightFalloff,
    },
}

/// A light in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    /// What kind of light this is.
    pub kind: LightKind,
    /// Disabled lights are skipped when packing.
    pub enabled: bool,
    /// The linear RGB colour of the light.
    pub colour: Vec3,
    /// A multiplier applied to `colour`.
    pub intensity: f32,
}

impl Light {
    /// Creates an enabled ambient light.
    pub fn ambient(colour: Vec3, intensity: f32) -> Self {
        Self {
            kind: LightKind::Ambient,
            enabled: true,
            colour,
            intensity,
        }
    }

    /// Creates an enabled directional light arriving from `from_direction`.
    pub fn directional(from_direction: Vec3, colour: Vec3, intensity: f32) -> Self {
        Self {
            kind: LightKind::Directional { from_direction },
            enabled: true,
            colour,
            intensity,
        }
    }

    /// Creates an enabled point light.
    pub fn point(position: Vec3, falloff: LightFalloff, colour: Vec3, intensity: f32) -> Self {
        Self {
            kind: LightKind::Point { position, falloff },
            enabled: true,
            colour,
            intensity,
        }
    }

    /// Returns `self` with the enabled flag set to `enabled`.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// The emitted radiance, `colour * intensity`.
    #[inline]
    pub fn colour_vector(&self) -> Vec3 {
        self.colour * self.intensity
    }

    /// The falloff of a point light; other kinds do not attenuate.
    pub fn falloff(&self) -> LightFalloff {
        match self.kind {
            LightKind::Point { falloff, .. } => falloff,
            _ => LightFalloff::NONE,
        }
    }

    /// The radius of the sphere outside which this light contributes less than one
    /// step of an 8-bit channel.
    ///
    /// Returns `None` for lights that are not point lights.
    pub fn volume_radius(&self, hdr_max_intensity: f32) -> Option<f32> {
        match self.kind {
            LightKind::Point { falloff, .. } => {
                let max_channel = self.colour_vector().max_element() * 256.0 / hdr_max_intensity;
                Some(falloff.reach(max_channel))
            }
            _ => None,
        }
    }

    /// The transform that places a unit light-volume sphere around this light in
    /// camera space: translation to the light, then uniform scale by
    /// [`volume_radius`](Self::volume_radius).
    ///
    /// Returns `None` for lights that are not point lights.
    pub fn volume_to_camera_transform(
        &self,
        world_to_camera: &Mat4,
        hdr_max_intensity: f32,
    ) -> Option<Mat4> {
        let LightKind::Point { position, .. } = self.kind else {
            return None;
        };
        let radius = self.volume_radius(hdr_max_intensity)?;
        let centre = (*world_to_camera * position.extend(1.0)).truncate();
        Some(Mat4::from_translation(centre) * Mat4::from_scale(Vec3::splat(radius)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_colour_vector_scales_colour() {
        let light = Light::ambient(Vec3::new(0.5, 1.0, 0.25), 2.0);
        assert_eq!(light.colour_vector(), Vec3::new(1.0, 2.0, 0.5));
    }

    #[test]
    fn test_falloff_defaults_to_none_for_non_point_lights() {
        let sun = Light::directional(Vec3::Y, Vec3::ONE, 1.0);
        assert_eq!(sun.falloff(), LightFalloff::NONE);
        assert_eq!(sun.volume_radius(1.0), None);
    }

    #[test]
    fn test_quadratic_volume_radius() {
        // c + q·d² = 256  =>  d = sqrt(255)
        let light = Light::point(Vec3::ZERO, LightFalloff::QUADRATIC, Vec3::ONE, 1.0);
        let radius = light.volume_radius(1.0).unwrap();
        assert_relative_eq!(radius, 255.0f32.sqrt(), epsilon = 1e-4);
        assert_relative_eq!(1.0 + radius * radius, 256.0, epsilon = 1e-2);
    }

    #[test]
    fn test_volume_radius_shrinks_with_hdr_range() {
        let light = Light::point(Vec3::ZERO, LightFalloff::QUADRATIC, Vec3::ONE, 1.0);
        let narrow = light.volume_radius(1.0).unwrap();
        let wide = light.volume_radius(4.0).unwrap();
        assert!(wide < narrow);
    }

    #[test]
    fn test_linear_and_unattenuated_reach() {
        assert_relative_eq!(LightFalloff::LINEAR.reach(256.0), 255.0);
        assert_eq!(LightFalloff::NONE.reach(256.0), f32::INFINITY);
        assert_eq!(LightFalloff::QUADRATIC.reach(0.5), 0.0);
    }

    #[test]
    fn test_dim_light_has_empty_volume() {
        let falloff = LightFalloff::new(1.0, 2.0, 1.0);
        assert_eq!(falloff.reach(0.9), 0.0);

        let light = Light::point(Vec3::ZERO, falloff, Vec3::splat(0.05), 1.0);
        assert_eq!(light.volume_radius(16.0), Some(0.0));
        let m = light.volume_to_camera_transform(&Mat4::IDENTITY, 16.0).unwrap();
        assert!(m.cols[0].x >= 0.0);
        assert!(m.cols[2].z >= 0.0);
    }

    #[test]
    fn test_volume_transform_translates_then_scales() {
        let light = Light::point(
            Vec3::new(1.0, 2.0, 3.0),
            LightFalloff::new(1.0, 0.0, 255.0),
            Vec3::ONE,
            1.0,
        );
        let world_to_camera = Mat4::from_translation(Vec3::new(0.0, 0.0, -10.0));
        let m = light.volume_to_camera_transform(&world_to_camera, 1.0).unwrap();

        assert_relative_eq!(m.cols[0].x, 1.0, epsilon = 1e-5);
        assert_eq!(m.translation(), Vec3::new(1.0, 2.0, -7.0));
        let on_sphere = m * Vec4::new(0.0, 1.0, 0.0, 1.0);
        assert_relative_eq!(on_sphere.y, 3.0, epsilon = 1e-5);
    }

    #[test]
    fn test_with_enabled() {
        let light = Light::ambient(Vec3::ONE, 1.0).with_enabled(false);
        assert!(!light.enabled);
    }
}
