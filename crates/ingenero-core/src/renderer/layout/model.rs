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

//! Per-object transform layout.

use bytemuck::{Pod, Zeroable};

use crate::math::{Mat3, Mat4, Vec3};
use crate::renderer::error::LayoutError;

/// A 3x3 matrix in the shading-language layout: three columns, each padded to
/// 16 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct GpuMat3 {
    /// The columns, `xyz` meaningful and `w` zero.
    pub cols: [[f32; 4]; 3],
}

impl From<Mat3> for GpuMat3 {
    fn from(m: Mat3) -> Self {
        Self {
            cols: m.cols.map(|c| c.extend(0.0).to_array()),
        }
    }
}

impl From<GpuMat3> for Mat3 {
    fn from(m: GpuMat3) -> Self {
        let [c0, c1, c2] = m.cols.map(|c| Vec3::new(c[0], c[1], c[2]));
        Mat3::from_cols(c0, c1, c2)
    }
}

/// Transforms for one object, rebuilt every frame.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ModelMatrices {
    /// Upper 3x3 of `model_to_camera`; transforms tangent-space vectors.
    pub model_to_camera_rotation: GpuMat3,
    /// Inverse-transpose of the rotation; transforms normals under non-uniform scale.
    pub normal_model_to_camera: GpuMat3,
    /// Model space to camera space.
    pub model_to_camera: Mat4,
    /// Camera space to clip space.
    pub projection: Mat4,
}

const _: () = assert!(std::mem::size_of::<GpuMat3>() == 48);
const _: () = assert!(std::mem::offset_of!(ModelMatrices, normal_model_to_camera) == 48);
const _: () = assert!(std::mem::offset_of!(ModelMatrices, model_to_camera) == 96);
const _: () = assert!(std::mem::offset_of!(ModelMatrices, projection) == 160);
const _: () = assert!(std::mem::size_of::<ModelMatrices>() == 224);

impl ModelMatrices {
    /// Derives the rotation and normal matrices from `model_to_camera`.
    ///
    /// Fails with [`LayoutError::DegenerateTransform`] when the upper 3x3 is singular.
    pub fn new(model_to_camera: Mat4, projection: Mat4) -> Result<Self, LayoutError> {
        let rotation = Mat3::from_mat4(&model_to_camera);
        let normal = rotation
            .normal_matrix()
            .ok_or(LayoutError::DegenerateTransform)?;
        Ok(Self {
            model_to_camera_rotation: rotation.into(),
            normal_model_to_camera: normal.into(),
            model_to_camera,
            projection,
        })
    }

    /// The byte image uploaded to the GPU.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Quaternion, Vec4};
    use approx::assert_relative_eq;

    #[test]
    fn test_rotation_only_transform_has_equal_normal_matrix() {
        let q = Quaternion::from_axis_angle(Vec3::new(0.0, 1.0, 1.0), 0.8);
        let m = Mat4::from_scale_rotation_translation(Vec3::ONE, q, Vec3::new(3.0, 0.0, -2.0));
        let matrices = ModelMatrices::new(m, Mat4::IDENTITY).unwrap();
        for (r, n) in matrices
            .model_to_camera_rotation
            .cols
            .iter()
            .zip(matrices.normal_model_to_camera.cols.iter())
        {
            for i in 0..4 {
                assert_relative_eq!(r[i], n[i], epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_normal_matrix_under_non_uniform_scale() {
        let m = Mat4::from_scale(Vec3::new(2.0, 4.0, 8.0));
        let matrices = ModelMatrices::new(m, Mat4::IDENTITY).unwrap();
        let normal = Mat3::from(matrices.normal_model_to_camera);
        assert_relative_eq!(normal.cols[0].x, 0.5);
        assert_relative_eq!(normal.cols[1].y, 0.25);
        assert_relative_eq!(normal.cols[2].z, 0.125);
    }

    #[test]
    fn test_singular_transform_is_rejected() {
        let m = Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(
            ModelMatrices::new(m, Mat4::IDENTITY),
            Err(LayoutError::DegenerateTransform)
        );
    }

    #[test]
    fn test_centimetre_scale_is_accepted() {
        for scale in [0.01, 0.02] {
            let m = Mat4::from_scale(Vec3::splat(scale));
            let matrices = ModelMatrices::new(m, Mat4::IDENTITY).unwrap();
            let normal = Mat3::from(matrices.normal_model_to_camera);
            assert_relative_eq!(normal.cols[0].x, 1.0 / scale, max_relative = 1e-5);
            assert_relative_eq!(normal.cols[2].z, 1.0 / scale, max_relative = 1e-5);
        }
    }

    #[test]
    fn test_byte_image_is_column_major_and_padded() {
        let m = Mat4::from_translation(Vec3::new(7.0, 8.0, 9.0));
        let matrices = ModelMatrices::new(m, Mat4::IDENTITY).unwrap();
        let floats: &[f32] = bytemuck::cast_slice(matrices.as_bytes());
        assert_eq!(floats.len(), 56);
        // Rotation column 0 with zero pad lane.
        assert_eq!(&floats[0..4], &[1.0, 0.0, 0.0, 0.0]);
        // Translation is the last column of model_to_camera.
        assert_eq!(&floats[24 + 12..24 + 16], &[7.0, 8.0, 9.0, 1.0]);
        assert_eq!(Vec4::from_array([floats[40], floats[41], floats[42], floats[43]]), Vec4::X);
    }
}
