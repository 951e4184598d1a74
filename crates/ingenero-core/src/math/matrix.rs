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

//! Defines the column-major `Mat3` and `Mat4` types.
//!
//! Column-major storage matches the shading-language convention, so a `Mat4` is
//! uploaded verbatim while a `Mat3` is widened to three 16-byte columns first (see
//! [`crate::renderer::layout::GpuMat3`]).

use super::{Quaternion, Vec3, Vec4};
use std::ops::{Index, IndexMut, Mul};

/// `1 / det`, or `None` when `det` is zero or the result is not finite.
#[inline]
fn reciprocal(det: f32) -> Option<f32> {
    let inv = 1.0 / det;
    (det != 0.0 && inv.is_finite()).then_some(inv)
}

// --- Mat3 ---

/// A 3x3 column-major matrix, used for rotations and normal transforms.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct Mat3 {
    /// The columns of the matrix. `cols[0]` is the first column, and so on.
    pub cols: [Vec3; 3],
}

impl Mat3 {
    /// The 3x3 identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [Vec3::X, Vec3::Y, Vec3::Z],
    };

    /// A 3x3 matrix with all elements set to 0.
    pub const ZERO: Self = Self {
        cols: [Vec3::ZERO; 3],
    };

    /// Creates a new matrix from three column vectors.
    #[inline]
    pub const fn from_cols(c0: Vec3, c1: Vec3, c2: Vec3) -> Self {
        Self { cols: [c0, c1, c2] }
    }

    /// Creates a 3D scaling matrix.
    #[inline]
    pub fn from_scale(scale: Vec3) -> Self {
        Self::from_cols(
            Vec3::new(scale.x, 0.0, 0.0),
            Vec3::new(0.0, scale.y, 0.0),
            Vec3::new(0.0, 0.0, scale.z),
        )
    }

    /// Creates a rotation matrix from a quaternion.
    /// The quaternion is normalized before conversion to ensure a valid rotation matrix.
    #[inline]
    pub fn from_quat(q: Quaternion) -> Self {
        let m = Mat4::from_quat(q.normalize());
        Self::from_mat4(&m)
    }

    /// Creates a `Mat3` from the upper-left 3x3 corner of a [`Mat4`], discarding translation.
    #[inline]
    pub fn from_mat4(m4: &Mat4) -> Self {
        Self::from_cols(
            m4.cols[0].truncate(),
            m4.cols[1].truncate(),
            m4.cols[2].truncate(),
        )
    }

    /// Computes the determinant of the matrix.
    #[inline]
    pub fn determinant(&self) -> f32 {
        let [c0, c1, c2] = self.cols;
        c0.x * (c1.y * c2.z - c2.y * c1.z) - c1.x * (c0.y * c2.z - c2.y * c0.z)
            + c2.x * (c0.y * c1.z - c1.y * c0.z)
    }

    /// Returns the transpose of the matrix, where rows and columns are swapped.
    #[inline]
    pub fn transpose(&self) -> Self {
        Self::from_cols(
            Vec3::new(self.cols[0].x, self.cols[1].x, self.cols[2].x),
            Vec3::new(self.cols[0].y, self.cols[1].y, self.cols[2].y),
            Vec3::new(self.cols[0].z, self.cols[1].z, self.cols[2].z),
        )
    }

    /// Computes the inverse of the matrix.
    ///
    /// Returns `None` when the matrix is singular or its determinant is too small
    /// for the reciprocal to be finite. Small uniform scales such as `0.01` invert.
    pub fn inverse(&self) -> Option<Self> {
        let [c0, c1, c2] = self.cols;
        let m00 = c1.y * c2.z - c2.y * c1.z;
        let m10 = c2.y * c0.z - c0.y * c2.z;
        let m20 = c0.y * c1.z - c1.y * c0.z;
        let det = c0.x * m00 + c1.x * m10 + c2.x * m20;

        let inv_det = reciprocal(det)?;
        let m01 = c2.x * c1.z - c1.x * c2.z;
        let m11 = c0.x * c2.z - c2.x * c0.z;
        let m21 = c1.x * c0.z - c0.x * c1.z;
        let m02 = c1.x * c2.y - c2.x * c1.y;
        let m12 = c2.x * c0.y - c0.x * c2.y;
        let m22 = c0.x * c1.y - c1.x * c0.y;

        Some(Self::from_cols(
            Vec3::new(m00, m10, m20) * inv_det,
            Vec3::new(m01, m11, m21) * inv_det,
            Vec3::new(m02, m12, m22) * inv_det,
        ))
    }

    /// The matrix that transforms normals consistently with `self`: the transpose of
    /// its inverse. Returns `None` for singular matrices.
    #[inline]
    pub fn normal_matrix(&self) -> Option<Self> {
        self.inverse().map(|inv| inv.transpose())
    }
}

impl Default for Mat3 {
    /// Returns the 3x3 identity matrix.
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul<Mat3> for Mat3 {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Mat3) -> Self::Output {
        Self::from_cols(self * rhs.cols[0], self * rhs.cols[1], self * rhs.cols[2])
    }
}

impl Mul<Vec3> for Mat3 {
    type Output = Vec3;
    /// Transforms a `Vec3` by this matrix.
    #[inline]
    fn mul(self, v: Vec3) -> Self::Output {
        self.cols[0] * v.x + self.cols[1] * v.y + self.cols[2] * v.z
    }
}

impl Index<usize> for Mat3 {
    type Output = Vec3;
    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.cols[index]
    }
}

impl IndexMut<usize> for Mat3 {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.cols[index]
    }
}

// --- Mat4 ---

/// A 4x4 column-major matrix, used for model-to-camera and projection transforms.
///
/// Its memory image is identical to a shading-language `float4x4`, so it can sit
/// directly inside GPU records.
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct Mat4 {
    /// The columns of the matrix. `cols[0]` is the first column, and so on.
    pub cols: [Vec4; 4],
}

impl Mat4 {
    /// The 4x4 identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [Vec4::X, Vec4::Y, Vec4::Z, Vec4::W],
    };

    /// Creates a new matrix from four column vectors.
    #[inline]
    pub const fn from_cols(c0: Vec4, c1: Vec4, c2: Vec4, c3: Vec4) -> Self {
        Self {
            cols: [c0, c1, c2, c3],
        }
    }

    /// Returns a row of the matrix as a `Vec4`.
    #[inline]
    pub fn get_row(&self, index: usize) -> Vec4 {
        Vec4::new(
            self.cols[0].get(index),
            self.cols[1].get(index),
            self.cols[2].get(index),
            self.cols[3].get(index),
        )
    }

    /// Creates a translation matrix.
    #[inline]
    pub fn from_translation(v: Vec3) -> Self {
        Self::from_cols(Vec4::X, Vec4::Y, Vec4::Z, Vec4::from_vec3(v, 1.0))
    }

    /// Creates a non-uniform scaling matrix.
    #[inline]
    pub fn from_scale(scale: Vec3) -> Self {
        Self::from_cols(
            Vec4::new(scale.x, 0.0, 0.0, 0.0),
            Vec4::new(0.0, scale.y, 0.0, 0.0),
            Vec4::new(0.0, 0.0, scale.z, 0.0),
            Vec4::W,
        )
    }

    /// Creates a rotation matrix from a unit quaternion.
    #[inline]
    pub fn from_quat(q: Quaternion) -> Self {
        let (x, y, z, w) = (q.x, q.y, q.z, q.w);
        let x2 = x + x;
        let y2 = y + y;
        let z2 = z + z;
        let xx = x * x2;
        let xy = x * y2;
        let xz = x * z2;
        let yy = y * y2;
        let yz = y * z2;
        let zz = z * z2;
        let wx = w * x2;
        let wy = w * y2;
        let wz = w * z2;

        Self::from_cols(
            Vec4::new(1.0 - (yy + zz), xy + wz, xz - wy, 0.0),
            Vec4::new(xy - wz, 1.0 - (xx + zz), yz + wx, 0.0),
            Vec4::new(xz + wy, yz - wx, 1.0 - (xx + yy), 0.0),
            Vec4::W,
        )
    }

    /// Creates a transform that scales, then rotates, then translates.
    #[inline]
    pub fn from_scale_rotation_translation(scale: Vec3, rotation: Quaternion, translation: Vec3) -> Self {
        Self::from_translation(translation) * Self::from_quat(rotation) * Self::from_scale(scale)
    }

    /// Returns the translation stored in the fourth column.
    #[inline]
    pub fn translation(&self) -> Vec3 {
        self.cols[3].truncate()
    }

    /// Returns the transpose of the matrix, where rows and columns are swapped.
    #[inline]
    pub fn transpose(&self) -> Self {
        Self::from_cols(
            self.get_row(0),
            self.get_row(1),
            self.get_row(2),
            self.get_row(3),
        )
    }

    /// Computes the determinant of the matrix.
    pub fn determinant(&self) -> f32 {
        let (s, c) = self.minors();
        s[0] * c[5] - s[1] * c[4] + s[2] * c[3] + s[3] * c[2] - s[4] * c[1] + s[5] * c[0]
    }

    /// Computes the inverse of the matrix, or `None` when it is singular.
    ///
    /// Uses the same rule as [`Mat3::inverse`], so scaled transforms stay invertible
    /// down to the limit of `f32`.
    pub fn inverse(&self) -> Option<Self> {
        let a = self.to_cols_array_2d();
        let (s, c) = self.minors();
        let inv_det = reciprocal(self.determinant())?;

        // The adjugate of the transpose, written back as columns, is the adjugate.
        let col = |v: [f32; 4]| Vec4::from_array(v.map(|e| e * inv_det));
        Some(Self::from_cols(
            col([
                a[1][1] * c[5] - a[1][2] * c[4] + a[1][3] * c[3],
                -a[0][1] * c[5] + a[0][2] * c[4] - a[0][3] * c[3],
                a[3][1] * s[5] - a[3][2] * s[4] + a[3][3] * s[3],
                -a[2][1] * s[5] + a[2][2] * s[4] - a[2][3] * s[3],
            ]),
            col([
                -a[1][0] * c[5] + a[1][2] * c[2] - a[1][3] * c[1],
                a[0][0] * c[5] - a[0][2] * c[2] + a[0][3] * c[1],
                -a[3][0] * s[5] + a[3][2] * s[2] - a[3][3] * s[1],
                a[2][0] * s[5] - a[2][2] * s[2] + a[2][3] * s[1],
            ]),
            col([
                a[1][0] * c[4] - a[1][1] * c[2] + a[1][3] * c[0],
                -a[0][0] * c[4] + a[0][1] * c[2] - a[0][3] * c[0],
                a[3][0] * s[4] - a[3][1] * s[2] + a[3][3] * s[0],
                -a[2][0] * s[4] + a[2][1] * s[2] - a[2][3] * s[0],
            ]),
            col([
                -a[1][0] * c[3] + a[1][1] * c[1] - a[1][2] * c[0],
                a[0][0] * c[3] - a[0][1] * c[1] + a[0][2] * c[0],
                -a[3][0] * s[3] + a[3][1] * s[1] - a[3][2] * s[0],
                a[2][0] * s[3] - a[2][1] * s[1] + a[2][2] * s[0],
            ]),
        ))
    }

    /// 2x2 minors of the first two and last two columns.
    fn minors(&self) -> ([f32; 6], [f32; 6]) {
        let a = self.to_cols_array_2d();
        let s = [
            a[0][0] * a[1][1] - a[1][0] * a[0][1],
            a[0][0] * a[1][2] - a[1][0] * a[0][2],
            a[0][0] * a[1][3] - a[1][0] * a[0][3],
            a[0][1] * a[1][2] - a[1][1] * a[0][2],
            a[0][1] * a[1][3] - a[1][1] * a[0][3],
            a[0][2] * a[1][3] - a[1][2] * a[0][3],
        ];
        let c = [
            a[2][0] * a[3][1] - a[3][0] * a[2][1],
            a[2][0] * a[3][2] - a[3][0] * a[2][2],
            a[2][0] * a[3][3] - a[3][0] * a[2][3],
            a[2][1] * a[3][2] - a[3][1] * a[2][2],
            a[2][1] * a[3][3] - a[3][1] * a[2][3],
            a[2][2] * a[3][3] - a[3][2] * a[2][3],
        ];
        (s, c)
    }

    /// Returns the columns as nested arrays, the shape shader uniform structs expect.
    #[inline]
    pub fn to_cols_array_2d(&self) -> [[f32; 4]; 4] {
        self.cols.map(Vec4::to_array)
    }
}

impl Default for Mat4 {
    /// Returns the 4x4 identity matrix.
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul<Mat4> for Mat4 {
    type Output = Self;
    /// Multiplies this matrix by another `Mat4`. Matrix multiplication is not commutative.
    #[inline]
    fn mul(self, rhs: Mat4) -> Self::Output {
        Self {
            cols: rhs.cols.map(|col| self * col),
        }
    }
}

impl Mul<Vec4> for Mat4 {
    type Output = Vec4;
    /// Transforms a `Vec4` by this matrix.
    #[inline]
    fn mul(self, rhs: Vec4) -> Self::Output {
        self.cols[0] * rhs.x + self.cols[1] * rhs.y + self.cols[2] * rhs.z + self.cols[3] * rhs.w
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{approx_eq, approx_eq_eps, FRAC_PI_2};

    fn vec3_approx_eq(a: Vec3, b: Vec3) -> bool {
        approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
    }

    fn mat3_approx_eq(a: Mat3, b: Mat3) -> bool {
        vec3_approx_eq(a.cols[0], b.cols[0])
            && vec3_approx_eq(a.cols[1], b.cols[1])
            && vec3_approx_eq(a.cols[2], b.cols[2])
    }

    #[test]
    fn test_mat3_inverse_of_scale() {
        let m = Mat3::from_scale(Vec3::new(2.0, 4.0, 0.5));
        let inv = m.inverse().expect("scale matrix is invertible");
        assert!(mat3_approx_eq(m * inv, Mat3::IDENTITY));
    }

    #[test]
    fn test_mat3_singular_has_no_inverse() {
        assert!(Mat3::ZERO.inverse().is_none());
        assert!(Mat3::from_scale(Vec3::new(1.0, 0.0, 1.0)).normal_matrix().is_none());
    }

    #[test]
    fn test_normal_matrix_of_rotation_is_rotation() {
        let r = Mat3::from_quat(Quaternion::from_axis_angle(Vec3::Y, 0.7));
        let n = r.normal_matrix().expect("rotation is invertible");
        assert!(mat3_approx_eq(n, r));
    }

    #[test]
    fn test_normal_matrix_under_non_uniform_scale_keeps_normals_perpendicular() {
        let m = Mat3::from_scale(Vec3::new(4.0, 1.0, 1.0));
        let n = m.normal_matrix().expect("scale is invertible");
        // A 45 degree surface in XY: tangent (1, -1, 0), normal (1, 1, 0).
        let tangent = m * Vec3::new(1.0, -1.0, 0.0);
        let normal = n * Vec3::new(1.0, 1.0, 0.0);
        assert!(approx_eq(tangent.dot(normal), 0.0));
    }

    #[test]
    fn test_mat4_translation_moves_points_not_directions() {
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(m * Vec4::W, Vec4::new(1.0, 2.0, 3.0, 1.0));
        assert_eq!(m * Vec4::X, Vec4::X);
        assert_eq!(m.translation(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_mat4_from_quat_matches_quaternion_rotation() {
        let q = Quaternion::from_axis_angle(Vec3::Z, FRAC_PI_2);
        let rotated = Mat4::from_quat(q) * Vec4::from_vec3(Vec3::X, 0.0);
        assert!(vec3_approx_eq(rotated.truncate(), Vec3::Y));
    }

    #[test]
    fn test_mat4_transpose_is_involution() {
        let m = Mat4::from_scale_rotation_translation(
            Vec3::new(1.0, 2.0, 3.0),
            Quaternion::from_axis_angle(Vec3::X, 0.3),
            Vec3::new(-1.0, 0.5, 2.0),
        );
        assert_eq!(m.transpose().transpose(), m);
        assert_eq!(m.to_cols_array_2d()[3], [-1.0, 0.5, 2.0, 1.0]);
    }

    fn mat4_approx_eq(a: Mat4, b: Mat4) -> bool {
        a.cols
            .iter()
            .zip(b.cols.iter())
            .all(|(x, y)| (0..4).all(|i| approx_eq_eps(x.get(i), y.get(i), 1e-4)))
    }

    #[test]
    fn test_mat3_small_uniform_scale_is_invertible() {
        for scale in [0.01, 0.02] {
            let m = Mat3::from_scale(Vec3::splat(scale));
            let inv = m.inverse().expect("small scales must invert");
            assert!(mat3_approx_eq(m * inv, Mat3::IDENTITY));
            assert!(m.normal_matrix().is_some());
        }
    }

    #[test]
    fn test_mat3_underflowing_determinant_has_no_inverse() {
        let m = Mat3::from_scale(Vec3::splat(1e-20));
        assert_eq!(m.determinant(), 0.0);
        assert!(m.inverse().is_none());
    }

    #[test]
    fn test_mat4_determinant() {
        assert_eq!(Mat4::IDENTITY.determinant(), 1.0);
        assert_eq!(Mat4::from_scale(Vec3::new(2.0, 3.0, 4.0)).determinant(), 24.0);
        assert_eq!(Mat4::from_translation(Vec3::new(5.0, -1.0, 2.0)).determinant(), 1.0);
        let rotation = Mat4::from_quat(Quaternion::from_axis_angle(Vec3::Z, FRAC_PI_2));
        assert!(approx_eq(rotation.determinant(), 1.0));
    }

    #[test]
    fn test_mat4_inverse_undoes_transform() {
        let m = Mat4::from_scale_rotation_translation(
            Vec3::new(0.5, 2.0, 1.5),
            Quaternion::from_axis_angle(Vec3::new(1.0, 1.0, 0.0).normalize(), 0.7),
            Vec3::new(3.0, -4.0, 2.0),
        );
        let inv = m.inverse().expect("transform is invertible");
        assert!(mat4_approx_eq(inv * m, Mat4::IDENTITY));
        assert!(mat4_approx_eq(m * inv, Mat4::IDENTITY));

        let p = Vec4::new(1.0, 2.0, 3.0, 1.0);
        let back = inv * (m * p);
        assert!(approx_eq_eps(back.x, 1.0, 1e-4));
        assert!(approx_eq_eps(back.y, 2.0, 1e-4));
        assert!(approx_eq_eps(back.z, 3.0, 1e-4));
    }

    #[test]
    fn test_mat4_small_uniform_scale_is_invertible() {
        let inv = Mat4::from_scale(Vec3::splat(0.01)).inverse().unwrap();
        assert!(mat4_approx_eq(inv, Mat4::from_scale(Vec3::splat(100.0))));
    }

    #[test]
    fn test_mat4_inverse_of_translation() {
        let inv = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)).inverse().unwrap();
        assert_eq!(inv.translation(), Vec3::new(-1.0, -2.0, -3.0));
    }

    #[test]
    fn test_mat4_singular_has_no_inverse() {
        assert!(Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0)).inverse().is_none());
    }
}
