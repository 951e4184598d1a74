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

//! G-buffer and vertex interpolant layouts for deferred shading.
//!
//! Three G-buffer variants exist. Exactly one is authoritative per build, chosen
//! with the `gbuffer-high-precision` or `gbuffer-packed` feature (neither selects
//! [`GBufferFormat::Standard`]). The geometry pass that writes the G-buffer and the
//! lighting pass that reads it must agree on the variant.

use bytemuck::{Pod, Zeroable};
use half::f16;
use serde::{Deserialize, Serialize};

use crate::math::{saturate, Mat3, Vec2, Vec3, Vec4};

#[cfg(all(feature = "gbuffer-high-precision", feature = "gbuffer-packed"))]
compile_error!("features `gbuffer-high-precision` and `gbuffer-packed` are mutually exclusive");

/// Render-target pixel formats used by G-buffer attachments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttachmentFormat {
    /// Four 8-bit normalized channels in blue, green, red, alpha order.
    Bgra8Unorm,
    /// Four 16-bit float channels.
    Rgba16Float,
    /// Four 32-bit float channels.
    Rgba32Float,
}

impl AttachmentFormat {
    /// Bytes per texel.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            AttachmentFormat::Bgra8Unorm => 4,
            AttachmentFormat::Rgba16Float => 8,
            AttachmentFormat::Rgba32Float => 16,
        }
    }
}

const STANDARD_ATTACHMENTS: &[AttachmentFormat] = &[
    AttachmentFormat::Rgba32Float,
    AttachmentFormat::Rgba16Float,
    AttachmentFormat::Rgba16Float,
    AttachmentFormat::Rgba32Float,
];
const HIGH_PRECISION_ATTACHMENTS: &[AttachmentFormat] = &[AttachmentFormat::Rgba32Float; 4];
// Light, normal, diffuse.
const PACKED_ATTACHMENTS: &[AttachmentFormat] = &[AttachmentFormat::Bgra8Unorm; 3];

/// The G-buffer variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GBufferFormat {
    /// Full-precision colour and light, half-precision normal and specular.
    Standard,
    /// Every attachment in 32-bit floats.
    HighPrecision,
    /// Light, normal and diffuse in 8-bit attachments. Specular is folded into the
    /// alpha channels.
    Packed,
}

impl GBufferFormat {
    /// The variant this crate was compiled for.
    #[cfg(not(any(feature = "gbuffer-high-precision", feature = "gbuffer-packed")))]
    pub const ACTIVE: Self = GBufferFormat::Standard;
    /// The variant this crate was compiled for.
    #[cfg(feature = "gbuffer-high-precision")]
    pub const ACTIVE: Self = GBufferFormat::HighPrecision;
    /// The variant this crate was compiled for.
    #[cfg(all(feature = "gbuffer-packed", not(feature = "gbuffer-high-precision")))]
    pub const ACTIVE: Self = GBufferFormat::Packed;

    /// Colour attachment formats, in attachment-index order.
    pub const fn attachments(self) -> &'static [AttachmentFormat] {
        match self {
            GBufferFormat::Standard => STANDARD_ATTACHMENTS,
            GBufferFormat::HighPrecision => HIGH_PRECISION_ATTACHMENTS,
            GBufferFormat::Packed => PACKED_ATTACHMENTS,
        }
    }

    /// Bytes written per pixel across all attachments.
    pub const fn texel_size(self) -> usize {
        let attachments = self.attachments();
        let mut total = 0;
        let mut i = 0;
        while i < attachments.len() {
            total += attachments[i].bytes_per_pixel();
            i += 1;
        }
        total
    }
}

/// The surface attributes a geometry pass writes for one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SurfaceSample {
    /// Diffuse colour (rgb) and opacity (a).
    pub diffuse: Vec4,
    /// Camera-space unit normal.
    pub normal: Vec3,
    /// Specular colour (rgb) and specularity (a).
    pub specular: Vec4,
    /// Light accumulated so far (rgb).
    pub light: Vec4,
}

/// A G-buffer record that can be written from and read back to a [`SurfaceSample`].
///
/// Decoding is exact up to the precision of the variant.
pub trait GBufferEncoding: Pod {
    /// The variant this record implements.
    const FORMAT: GBufferFormat;

    /// Encodes a surface sample.
    fn encode(sample: &SurfaceSample) -> Self;

    /// Decodes the stored surface sample.
    fn decode(&self) -> SurfaceSample;
}

fn to_f16x4(v: Vec4) -> [f16; 4] {
    v.to_array().map(f16::from_f32)
}

fn from_f16x4(v: [f16; 4]) -> Vec4 {
    Vec4::from_array(v.map(f16::to_f32))
}

fn to_f16x3(v: Vec3) -> [f16; 3] {
    [v.x, v.y, v.z].map(f16::from_f32)
}

fn from_f16x3(v: [f16; 3]) -> Vec3 {
    Vec3::new(v[0].to_f32(), v[1].to_f32(), v[2].to_f32())
}

fn unorm8(v: f32) -> u8 {
    (saturate(v) * 255.0).round() as u8
}

/// Stores `v` as normalized bytes in blue, green, red, alpha order.
fn to_bgra8(v: Vec4) -> [u8; 4] {
    [unorm8(v.z), unorm8(v.y), unorm8(v.x), unorm8(v.w)]
}

fn from_bgra8(v: [u8; 4]) -> Vec4 {
    let [b, g, r, a] = v.map(|c| c as f32 / 255.0);
    Vec4::new(r, g, b, a)
}

/// The standard G-buffer record.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct GBuffers {
    /// Diffuse colour and opacity.
    pub diffuse: [f32; 4],
    /// Camera-space normal.
    pub normal: [f16; 3],
    /// Padding that widens `normal` to its 8-byte shader size.
    pub _normal_padding: f16,
    /// Specular colour and specularity.
    pub specular: [f16; 4],
    /// Accumulated light.
    pub light: [f32; 4],
}

impl GBufferEncoding for GBuffers {
    const FORMAT: GBufferFormat = GBufferFormat::Standard;

    fn encode(sample: &SurfaceSample) -> Self {
        Self {
            diffuse: sample.diffuse.to_array(),
            normal: to_f16x3(sample.normal),
            _normal_padding: f16::ZERO,
            specular: to_f16x4(sample.specular),
            light: sample.light.to_array(),
        }
    }

    fn decode(&self) -> SurfaceSample {
        SurfaceSample {
            diffuse: Vec4::from_array(self.diffuse),
            normal: from_f16x3(self.normal),
            specular: from_f16x4(self.specular),
            light: Vec4::from_array(self.light),
        }
    }
}

/// The all-`f32` G-buffer record.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct HighPrecisionGBuffers {
    /// Diffuse colour and opacity.
    pub diffuse: [f32; 4],
    /// Camera-space normal; `w` is zero.
    pub normal: [f32; 4],
    /// Specular colour and specularity.
    pub specular: [f32; 4],
    /// Accumulated light.
    pub light: [f32; 4],
}

impl GBufferEncoding for HighPrecisionGBuffers {
    const FORMAT: GBufferFormat = GBufferFormat::HighPrecision;

    fn encode(sample: &SurfaceSample) -> Self {
        Self {
            diffuse: sample.diffuse.to_array(),
            normal: sample.normal.extend(0.0).to_array(),
            specular: sample.specular.to_array(),
            light: sample.light.to_array(),
        }
    }

    fn decode(&self) -> SurfaceSample {
        SurfaceSample {
            diffuse: Vec4::from_array(self.diffuse),
            normal: Vec4::from_array(self.normal).truncate(),
            specular: Vec4::from_array(self.specular),
            light: Vec4::from_array(self.light),
        }
    }
}

/// The 8-bit G-buffer record, attachments in light, normal, diffuse order.
///
/// Normals are biased into `[0, 1]` with `n * 0.5 + 0.5`. The normal's alpha holds
/// specularity and the diffuse alpha holds the largest specular colour channel,
/// so decoded specular colour is grey and opacity is not stored.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct PackedGBuffers {
    /// Accumulated light, clamped to `[0, 1]`.
    pub light: [u8; 4],
    /// Biased normal (rgb) and specularity (a).
    pub normal: [u8; 4],
    /// Diffuse colour (rgb) and specular intensity (a).
    pub diffuse: [u8; 4],
}

impl GBufferEncoding for PackedGBuffers {
    const FORMAT: GBufferFormat = GBufferFormat::Packed;

    fn encode(sample: &SurfaceSample) -> Self {
        let biased = sample.normal * 0.5 + Vec3::splat(0.5);
        let specular_intensity = sample.specular.truncate().max_element();
        Self {
            light: to_bgra8(sample.light),
            normal: to_bgra8(biased.extend(sample.specular.w)),
            diffuse: to_bgra8(sample.diffuse.truncate().extend(specular_intensity)),
        }
    }

    fn decode(&self) -> SurfaceSample {
        let normal = from_bgra8(self.normal);
        let diffuse = from_bgra8(self.diffuse);
        SurfaceSample {
            diffuse: diffuse.truncate().extend(1.0),
            normal: normal.truncate() * 2.0 - Vec3::ONE,
            specular: Vec3::splat(diffuse.w).extend(normal.w),
            light: from_bgra8(self.light),
        }
    }
}

const _: () = assert!(std::mem::size_of::<GBuffers>() == 48);
const _: () = assert!(std::mem::offset_of!(GBuffers, specular) == 24);
const _: () = assert!(std::mem::offset_of!(GBuffers, light) == 32);
const _: () = assert!(std::mem::size_of::<HighPrecisionGBuffers>() == 64);
const _: () = assert!(std::mem::size_of::<PackedGBuffers>() == 12);

/// The G-buffer record of the active build.
#[cfg(not(any(feature = "gbuffer-high-precision", feature = "gbuffer-packed")))]
pub type ActiveGBuffers = GBuffers;
/// The G-buffer record of the active build.
#[cfg(feature = "gbuffer-high-precision")]
pub type ActiveGBuffers = HighPrecisionGBuffers;
/// The G-buffer record of the active build.
#[cfg(all(feature = "gbuffer-packed", not(feature = "gbuffer-high-precision")))]
pub type ActiveGBuffers = PackedGBuffers;

const _: () = assert!(matches!(
    (ActiveGBuffers::FORMAT, GBufferFormat::ACTIVE),
    (GBufferFormat::Standard, GBufferFormat::Standard)
        | (GBufferFormat::HighPrecision, GBufferFormat::HighPrecision)
        | (GBufferFormat::Packed, GBufferFormat::Packed)
));

/// Vertex-to-fragment interpolants with half-precision normal and tangent basis.
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct VertexInOut {
    /// Texture coordinate.
    pub texture_coordinate: [f32; 2],
    /// Camera-space normal; the fourth lane pads it to 8 bytes.
    pub normal: [f16; 4],
    /// Camera-space position; the fourth lane pads it to 16 bytes.
    pub camera_space_position: [f32; 4],
    /// Clip-space position.
    pub position: [f32; 4],
    /// Columns of the tangent-to-camera basis, each padded to 8 bytes.
    pub tangent_to_camera: [[f16; 4]; 3],
    /// Tail padding to the 16-byte record alignment.
    pub _padding: [f32; 2],
}

const _: () = assert!(std::mem::size_of::<VertexInOut>() == 80);
const _: () = assert!(std::mem::align_of::<VertexInOut>() == 16);
const _: () = assert!(std::mem::offset_of!(VertexInOut, camera_space_position) == 16);
const _: () = assert!(std::mem::offset_of!(VertexInOut, position) == 32);
const _: () = assert!(std::mem::offset_of!(VertexInOut, tangent_to_camera) == 48);

impl VertexInOut {
    /// Packs interpolants for one vertex.
    pub fn new(
        texture_coordinate: Vec2,
        normal: Vec3,
        camera_space_position: Vec3,
        position: Vec4,
        tangent_to_camera: Mat3,
    ) -> Self {
        Self {
            texture_coordinate: texture_coordinate.to_array(),
            normal: to_f16x4(normal.extend(0.0)),
            camera_space_position: camera_space_position.extend(0.0).to_array(),
            position: position.to_array(),
            tangent_to_camera: tangent_to_camera.cols.map(|c| to_f16x4(c.extend(0.0))),
            _padding: [0.0; 2],
        }
    }

    /// The normal widened back to `f32`.
    pub fn normal(&self) -> Vec3 {
        from_f16x4(self.normal).truncate()
    }

    /// The tangent-to-camera basis widened back to `f32`.
    pub fn tangent_to_camera(&self) -> Mat3 {
        let [c0, c1, c2] = self.tangent_to_camera.map(|c| from_f16x4(c).truncate());
        Mat3::from_cols(c0, c1, c2)
    }
}

/// Vertex-to-fragment interpolants with every field in `f32`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct HighPrecisionVertexInOut {
    /// Texture coordinate.
    pub texture_coordinate: [f32; 2],
    /// Padding so `normal` starts on a 16-byte boundary.
    pub _padding: [f32; 2],
    /// Camera-space normal; `w` is zero.
    pub normal: [f32; 4],
    /// Camera-space position; `w` is zero.
    pub camera_space_position: [f32; 4],
    /// Clip-space position.
    pub position: [f32; 4],
    /// Columns of the tangent-to-camera basis; `w` is zero.
    pub tangent_to_camera: [[f32; 4]; 3],
}

const _: () = assert!(std::mem::size_of::<HighPrecisionVertexInOut>() == 112);
const _: () = assert!(std::mem::offset_of!(HighPrecisionVertexInOut, normal) == 16);

impl From<&VertexInOut> for HighPrecisionVertexInOut {
    fn from(v: &VertexInOut) -> Self {
        Self {
            texture_coordinate: v.texture_coordinate,
            _padding: [0.0; 2],
            normal: v.normal().extend(0.0).to_array(),
            camera_space_position: v.camera_space_position,
            position: v.position,
            tangent_to_camera: v.tangent_to_camera().cols.map(|c| c.extend(0.0).to_array()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> SurfaceSample {
        SurfaceSample {
            diffuse: Vec4::new(0.8, 0.4, 0.2, 1.0),
            normal: Vec3::new(0.0, 0.6, 0.8),
            specular: Vec4::new(0.5, 0.5, 0.5, 0.25),
            light: Vec4::new(0.1, 0.2, 0.3, 1.0),
        }
    }

    #[test]
    fn test_texel_size_matches_record_size() {
        assert_eq!(GBufferFormat::Standard.texel_size(), std::mem::size_of::<GBuffers>());
        assert_eq!(
            GBufferFormat::HighPrecision.texel_size(),
            std::mem::size_of::<HighPrecisionGBuffers>()
        );
        assert_eq!(
            GBufferFormat::Packed.texel_size(),
            std::mem::size_of::<PackedGBuffers>()
        );
    }

    #[test]
    fn test_packed_attachment_order() {
        assert_eq!(GBufferFormat::Packed.attachments().len(), 3);
        let encoded = PackedGBuffers::encode(&sample());
        let bytes = bytemuck::bytes_of(&encoded);
        // Light comes first, stored blue-first.
        assert_eq!(bytes[0], unorm8(0.3));
        assert_eq!(bytes[2], unorm8(0.1));
        // Diffuse is the third attachment.
        assert_eq!(bytes[10], unorm8(0.8));
    }

    #[test]
    fn test_packed_normal_bias() {
        let encoded = PackedGBuffers::encode(&SurfaceSample {
            normal: Vec3::new(-1.0, 0.0, 1.0),
            ..Default::default()
        });
        assert_eq!(encoded.normal[..3], [255, 128, 0]);
        let decoded = encoded.decode();
        assert_relative_eq!(decoded.normal.x, -1.0);
        assert_relative_eq!(decoded.normal.z, 1.0);
        assert_relative_eq!(decoded.normal.y, 0.0, epsilon = 1.0 / 255.0);
    }

    #[test]
    fn test_standard_keeps_half_precision_normal_and_specular() {
        let decoded = GBuffers::encode(&sample()).decode();
        assert_eq!(decoded.diffuse, sample().diffuse);
        assert_eq!(decoded.light, sample().light);
        assert_relative_eq!(decoded.normal.y, 0.6, epsilon = 1e-3);
        assert_relative_eq!(decoded.specular.w, 0.25);
    }

    #[test]
    fn test_high_precision_is_lossless() {
        assert_eq!(HighPrecisionGBuffers::encode(&sample()).decode(), sample());
    }

    #[test]
    fn test_packed_folds_specular_into_alpha() {
        let decoded = PackedGBuffers::encode(&sample()).decode();
        assert_relative_eq!(decoded.specular.w, 0.25, epsilon = 1.0 / 255.0);
        assert_relative_eq!(decoded.specular.x, 0.5, epsilon = 1.0 / 255.0);
        assert_eq!(decoded.diffuse.w, 1.0);
    }

    #[test]
    fn test_active_variant_matches_format() {
        assert_eq!(ActiveGBuffers::FORMAT, GBufferFormat::ACTIVE);
    }

    #[test]
    fn test_vertex_interpolants_round_trip_through_high_precision() {
        let v = VertexInOut::new(
            Vec2::new(0.25, 0.75),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0, 2.0, -3.0),
            Vec4::new(0.5, 0.5, 0.5, 1.0),
            Mat3::IDENTITY,
        );
        assert_eq!(v.normal(), Vec3::Z);
        assert_eq!(v.tangent_to_camera(), Mat3::IDENTITY);

        let wide = HighPrecisionVertexInOut::from(&v);
        assert_eq!(wide.camera_space_position, [1.0, 2.0, -3.0, 0.0]);
        assert_eq!(wide.tangent_to_camera[1], [0.0, 1.0, 0.0, 0.0]);
        assert_eq!(wide.texture_coordinate, [0.25, 0.75]);
    }
}
