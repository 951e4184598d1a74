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

//! The quaternion multiplication engine.
//!
//! Each result component is one lane-wise product of a permuted left operand and
//! a permuted, sign-adjusted right operand, reduced by two levels of pairwise
//! horizontal adds. The left operand is permuted three ways (`wxyz`, `wyzx`,
//! `wzxy`; the `wxyz` permutation serves both the `x` and `w` products) and the
//! right operand four ways (`xwzy`, `ywxz`, `zwyx`, `wxyz`). Two XOR masks flip
//! signs: the last lane for the `x`, `y` and `z` products, the last three lanes
//! for the `w` product. The whole product is four vector multiplies and three
//! horizontal adds.
//!
//! Every component therefore sums as `(p0 + p1) + (p2 + p3)` with
//!
//! ```text
//! x: lw*rx, lx*rw, ly*rz, -lz*ry
//! y: lw*ry, ly*rw, lz*rx, -lx*rz
//! z: lw*rz, lz*rw, lx*ry, -ly*rx
//! w: lw*rw, -lx*rx, -ly*ry, -lz*rz
//! ```
//!
//! Three implementations share that algorithm:
//!
//! * [`multiply_scalar`]: the textbook formula, used as the reference.
//! * [`multiply_lanes`]: a portable emulation of the vector algorithm on `[f32; 4]`.
//! * an SSE3 path on `x86_64`, selected at runtime. It performs the same IEEE
//!   operations in the same order as [`multiply_lanes`] and is bit-identical to it.
//!
//! The vector form sums partial products in a different order than the scalar
//! formula, so the two agree to within a few ULP rather than bit-for-bit. Platforms
//! without the fast path lose the instruction-level parallelism but not accuracy.
//!
//! All lanes are `[x, y, z, w]`, scalar part last.

/// Builds a 2-bit-per-lane shuffle immediate, `_MM_SHUFFLE` with lanes in
/// destination order.
const fn lanes(i0: i32, i1: i32, i2: i32, i3: i32) -> i32 {
    i0 | (i1 << 2) | (i2 << 4) | (i3 << 6)
}

/// `(w, x, y, z)`: left operand of the `x` and `w` products, right operand of `w`.
const WXYZ: i32 = lanes(3, 0, 1, 2);
/// Left operand of the `y` product.
const WYZX: i32 = lanes(3, 1, 2, 0);
/// Left operand of the `z` product.
const WZXY: i32 = lanes(3, 2, 0, 1);
/// Right operand of the `x` product.
const XWZY: i32 = lanes(0, 3, 2, 1);
/// Right operand of the `y` product.
const YWXZ: i32 = lanes(1, 3, 0, 2);
/// Right operand of the `z` product.
const ZWYX: i32 = lanes(2, 3, 1, 0);

/// Lanes whose sign bit is flipped in the right operand of the `x`, `y` and `z`
/// products.
const FLIP_LAST: [bool; 4] = [false, false, false, true];
/// Lanes whose sign bit is flipped in the right operand of the `w` product.
const FLIP_VECTOR: [bool; 4] = [false, true, true, true];

const SIGN_BIT: u32 = 0x8000_0000;

/// Computes the Hamilton product `l * r` of two `[x, y, z, w]` quaternions.
///
/// Dispatches to the SSE3 path when the running CPU supports it and to
/// [`multiply_lanes`] otherwise. Total over all inputs: NaN and infinities
/// propagate per IEEE-754.
///
/// # Examples
///
/// ```
/// use ingenero_core::math::quaternion_multiply;
/// let i = [1.0, 0.0, 0.0, 0.0];
/// let j = [0.0, 1.0, 0.0, 0.0];
/// assert_eq!(quaternion_multiply(i, j), [0.0, 0.0, 1.0, 0.0]);
/// ```
#[inline]
pub fn quaternion_multiply(l: [f32; 4], r: [f32; 4]) -> [f32; 4] {
    #[cfg(target_arch = "x86_64")]
    {
        if sse::available() {
            // SAFETY: `available` confirmed SSE3 support on this CPU.
            return unsafe { sse::multiply(l, r) };
        }
    }
    multiply_lanes(l, r)
}

/// The reference Hamilton product, written component by component.
#[inline]
pub fn multiply_scalar(l: [f32; 4], r: [f32; 4]) -> [f32; 4] {
    let [lx, ly, lz, lw] = l;
    let [rx, ry, rz, rw] = r;
    [
        lw * rx + lx * rw + ly * rz - lz * ry,
        lw * ry - lx * rz + ly * rw + lz * rx,
        lw * rz + lx * ry - ly * rx + lz * rw,
        lw * rw - lx * rx - ly * ry - lz * rz,
    ]
}

/// The vectorized algorithm expressed on plain arrays.
///
/// Sign flips XOR the IEEE sign bit exactly like `_mm_xor_ps` with a `-0.0` mask,
/// and the horizontal adds pair lanes exactly like `_mm_hadd_ps`.
pub fn multiply_lanes(l: [f32; 4], r: [f32; 4]) -> [f32; 4] {
    let l_wxyz = shuffle(l, WXYZ);
    let px = mul(l_wxyz, flip_signs(shuffle(r, XWZY), FLIP_LAST));
    let py = mul(shuffle(l, WYZX), flip_signs(shuffle(r, YWXZ), FLIP_LAST));
    let pz = mul(shuffle(l, WZXY), flip_signs(shuffle(r, ZWYX), FLIP_LAST));
    let pw = mul(l_wxyz, flip_signs(shuffle(r, WXYZ), FLIP_VECTOR));
    hadd(hadd(px, py), hadd(pz, pw))
}

#[inline(always)]
fn shuffle(v: [f32; 4], mask: i32) -> [f32; 4] {
    std::array::from_fn(|i| v[((mask >> (2 * i)) & 0b11) as usize])
}

#[inline(always)]
fn flip_signs(v: [f32; 4], flip: [bool; 4]) -> [f32; 4] {
    std::array::from_fn(|i| {
        let mask = if flip[i] { SIGN_BIT } else { 0 };
        f32::from_bits(v[i].to_bits() ^ mask)
    })
}

#[inline(always)]
fn mul(a: [f32; 4], b: [f32; 4]) -> [f32; 4] {
    std::array::from_fn(|i| a[i] * b[i])
}

#[inline(always)]
fn hadd(a: [f32; 4], b: [f32; 4]) -> [f32; 4] {
    [a[0] + a[1], a[2] + a[3], b[0] + b[1], b[2] + b[3]]
}

#[cfg(target_arch = "x86_64")]
mod sse {
    use super::{FLIP_LAST, FLIP_VECTOR, WXYZ, WYZX, WZXY, XWZY, YWXZ, ZWYX};
    use std::arch::x86_64::{
        __m128, _mm_hadd_ps, _mm_loadu_ps, _mm_mul_ps, _mm_setr_ps, _mm_shuffle_ps, _mm_storeu_ps,
        _mm_xor_ps,
    };
    use std::sync::OnceLock;

    static SSE3: OnceLock<bool> = OnceLock::new();

    pub(super) fn available() -> bool {
        *SSE3.get_or_init(|| {
            let detected = is_x86_feature_detected!("sse3");
            log::trace!(
                "quaternion multiply uses the {} path",
                if detected { "SSE3" } else { "portable lane" }
            );
            detected
        })
    }

    #[inline(always)]
    unsafe fn sign_mask(flip: [bool; 4]) -> __m128 {
        let lane = |f: bool| if f { -0.0 } else { 0.0 };
        _mm_setr_ps(lane(flip[0]), lane(flip[1]), lane(flip[2]), lane(flip[3]))
    }

    /// SSE3 Hamilton product.
    ///
    /// # Safety
    ///
    /// The CPU must support SSE3.
    #[target_feature(enable = "sse3")]
    pub(super) unsafe fn multiply(l: [f32; 4], r: [f32; 4]) -> [f32; 4] {
        let l = _mm_loadu_ps(l.as_ptr());
        let r = _mm_loadu_ps(r.as_ptr());

        let l_wxyz = _mm_shuffle_ps::<WXYZ>(l, l);
        let l_wyzx = _mm_shuffle_ps::<WYZX>(l, l);
        let l_wzxy = _mm_shuffle_ps::<WZXY>(l, l);

        let last = sign_mask(FLIP_LAST);
        let vector = sign_mask(FLIP_VECTOR);
        let rx = _mm_xor_ps(_mm_shuffle_ps::<XWZY>(r, r), last);
        let ry = _mm_xor_ps(_mm_shuffle_ps::<YWXZ>(r, r), last);
        let rz = _mm_xor_ps(_mm_shuffle_ps::<ZWYX>(r, r), last);
        let rw = _mm_xor_ps(_mm_shuffle_ps::<WXYZ>(r, r), vector);

        let px = _mm_mul_ps(l_wxyz, rx);
        let py = _mm_mul_ps(l_wyzx, ry);
        let pz = _mm_mul_ps(l_wzxy, rz);
        let pw = _mm_mul_ps(l_wxyz, rw);

        let sum = _mm_hadd_ps(_mm_hadd_ps(px, py), _mm_hadd_ps(pz, pw));
        let mut out = [0.0f32; 4];
        _mm_storeu_ps(out.as_mut_ptr(), sum);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SAMPLES: [[f32; 4]; 6] = [
        [0.0, 0.0, 0.0, 1.0],
        [1.0, 2.0, 3.0, 4.0],
        [-0.5, 0.25, 0.75, -0.125],
        [0.267, 0.535, 0.802, 0.0],
        [1e-3, -7.5, 12.0, 0.3],
        [-3.0, -2.0, 9.5, -1.0],
    ];

    fn assert_lanes_close(a: [f32; 4], b: [f32; 4]) {
        for i in 0..4 {
            assert_relative_eq!(a[i], b[i], epsilon = 1e-4, max_relative = 1e-6);
        }
    }

    #[test]
    fn test_shuffle_masks_match_lane_names() {
        let v = [10.0, 11.0, 12.0, 13.0];
        assert_eq!(WXYZ, 147);
        assert_eq!(WYZX, 39);
        assert_eq!(WZXY, 75);
        assert_eq!(XWZY, 108);
        assert_eq!(YWXZ, 141);
        assert_eq!(ZWYX, 30);
        assert_eq!(shuffle(v, WXYZ), [13.0, 10.0, 11.0, 12.0]);
        assert_eq!(shuffle(v, WYZX), [13.0, 11.0, 12.0, 10.0]);
        assert_eq!(shuffle(v, WZXY), [13.0, 12.0, 10.0, 11.0]);
        assert_eq!(shuffle(v, XWZY), [10.0, 13.0, 12.0, 11.0]);
        assert_eq!(shuffle(v, YWXZ), [11.0, 13.0, 10.0, 12.0]);
        assert_eq!(shuffle(v, ZWYX), [12.0, 13.0, 11.0, 10.0]);
    }

    #[test]
    fn test_flip_signs_toggles_only_the_sign_bit() {
        let v = flip_signs([1.5, 0.0, -2.0, f32::INFINITY], [true, true, true, false]);
        assert_eq!(v[0], -1.5);
        assert_eq!(v[1].to_bits(), (-0.0f32).to_bits());
        assert_eq!(v[2], 2.0);
        assert_eq!(v[3], f32::INFINITY);
    }

    #[test]
    fn test_lanes_match_scalar_formula() {
        for l in SAMPLES {
            for r in SAMPLES {
                assert_lanes_close(multiply_lanes(l, r), multiply_scalar(l, r));
            }
        }
    }

    /// The product with every partial term and both addition levels spelled out.
    fn grouped_sums(l: [f32; 4], r: [f32; 4]) -> [f32; 4] {
        let [lx, ly, lz, lw] = l;
        let [rx, ry, rz, rw] = r;
        [
            (lw * rx + lx * rw) + (ly * rz + lz * -ry),
            (lw * ry + ly * rw) + (lz * rx + lx * -rz),
            (lw * rz + lz * rw) + (lx * ry + ly * -rx),
            (lw * rw + lx * -rx) + (ly * -ry + lz * -rz),
        ]
    }

    #[test]
    fn test_lanes_follow_the_pairwise_sum_schedule() {
        let mut state = 0x2545_f491_u32;
        let mut next = || {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 8) as f32 / (1 << 24) as f32 * 10.0 - 5.0
        };
        for _ in 0..10_000 {
            let l = [next(), next(), next(), next()];
            let r = [next(), next(), next(), next()];
            let expected = grouped_sums(l, r).map(f32::to_bits);
            assert_eq!(multiply_lanes(l, r).map(f32::to_bits), expected);
            assert_eq!(quaternion_multiply(l, r).map(f32::to_bits), expected);
        }
    }

    #[test]
    fn test_basis_products() {
        let i = [1.0, 0.0, 0.0, 0.0];
        let j = [0.0, 1.0, 0.0, 0.0];
        let k = [0.0, 0.0, 1.0, 0.0];
        assert_eq!(multiply_lanes(i, j), k);
        assert_eq!(multiply_lanes(j, i), [0.0, 0.0, -1.0, 0.0]);
        assert_eq!(multiply_lanes(i, i), [0.0, 0.0, 0.0, -1.0]);
        assert_eq!(multiply_lanes(j, k), i);
    }

    #[test]
    fn test_dispatch_agrees_with_portable_lanes() {
        for l in SAMPLES {
            for r in SAMPLES {
                let fast = quaternion_multiply(l, r);
                let portable = multiply_lanes(l, r);
                assert_eq!(fast.map(f32::to_bits), portable.map(f32::to_bits));
            }
        }
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn test_sse_path_is_bit_identical_to_lanes() {
        if !is_x86_feature_detected!("sse3") {
            return;
        }
        for l in SAMPLES {
            for r in SAMPLES {
                // SAFETY: SSE3 support checked above.
                let simd = unsafe { sse::multiply(l, r) };
                assert_eq!(simd.map(f32::to_bits), multiply_lanes(l, r).map(f32::to_bits));
            }
        }
    }

    #[test]
    fn test_nan_propagates() {
        let q = quaternion_multiply([f32::NAN, 0.0, 0.0, 1.0], [0.0, 0.0, 0.0, 1.0]);
        assert!(q[0].is_nan());
        let q = quaternion_multiply([f32::NAN, 0.0, 0.0, 1.0], [1.0, 1.0, 1.0, 1.0]);
        assert!(q.iter().all(|c| c.is_nan()));
    }

    #[test]
    fn test_operands_are_left_untouched() {
        let l = [1.0, 2.0, 3.0, 4.0];
        let r = [5.0, 6.0, 7.0, 8.0];
        let _ = quaternion_multiply(l, r);
        assert_eq!(l, [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(r, [5.0, 6.0, 7.0, 8.0]);
    }
}
