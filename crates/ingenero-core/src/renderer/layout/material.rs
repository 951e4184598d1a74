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

//! Material uniform layout.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::math::{Vec3, Vec4};

/// Flags telling the shader which material channels come from textures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialFlags {
    bits: u32,
}

impl MaterialFlags {
    /// Every channel uses its constant colour.
    pub const NONE: Self = Self { bits: 0 };
    /// Ambient colour is sampled from a texture.
    pub const AMBIENT_MAP: Self = Self { bits: 1 << 0 };
    /// Diffuse colour is sampled from a texture.
    pub const DIFFUSE_MAP: Self = Self { bits: 1 << 1 };
    /// Specular colour is sampled from a texture.
    pub const SPECULAR_COLOUR_MAP: Self = Self { bits: 1 << 2 };
    /// Specularity (shininess) is sampled from a texture.
    pub const SPECULARITY_MAP: Self = Self { bits: 1 << 3 };
    /// A normal map perturbs the surface normal.
    pub const NORMAL_MAP: Self = Self { bits: 1 << 4 };

    /// Creates a set of flags from raw bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self { bits }
    }

    /// Returns the raw bits.
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    /// Combines two sets of flags.
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// Checks whether every flag in `other` is set.
    pub const fn contains(&self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }

    /// Checks whether no flags are set.
    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }
}

impl std::ops::BitOr for MaterialFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for MaterialFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

/// The ambient `w` bit pattern meaning "ambient enabled": all bits set.
pub const AMBIENT_ENABLED: f32 = f32::from_bits(u32::MAX);
/// The ambient `w` bit pattern meaning "ambient disabled": all bits clear.
pub const AMBIENT_DISABLED: f32 = f32::from_bits(0);

/// A material as read by the shaders.
///
/// `ambient_colour.w` is a boolean encoded as a bit pattern ([`AMBIENT_ENABLED`] or
/// [`AMBIENT_DISABLED`]), not a number. The enabled pattern is a NaN, so equality is
/// defined on the byte image.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct MaterialStruct {
    /// Ambient colour (rgb) and the ambient-enabled flag (w).
    pub ambient_colour: Vec4,
    /// Diffuse colour (rgb) and opacity (w).
    pub diffuse_colour: Vec4,
    /// Specular colour (rgb) and specularity (w).
    pub specular_colour: Vec4,
    /// Raw [`MaterialFlags`] bits.
    pub flags: i32,
    /// Padding for 16-byte alignment.
    pub _padding: [i32; 3],
}

const _: () = assert!(std::mem::size_of::<MaterialStruct>() == 64);
const _: () = assert!(std::mem::offset_of!(MaterialStruct, diffuse_colour) == 16);
const _: () = assert!(std::mem::offset_of!(MaterialStruct, specular_colour) == 32);
const _: () = assert!(std::mem::offset_of!(MaterialStruct, flags) == 48);

impl PartialEq for MaterialStruct {
    fn eq(&self, other: &Self) -> bool {
        bytemuck::bytes_of(self) == bytemuck::bytes_of(other)
    }
}

impl Eq for MaterialStruct {}

impl MaterialStruct {
    /// Decodes the ambient-enabled flag from `ambient_colour.w`.
    ///
    /// Any non-zero bit pattern reads as enabled.
    pub fn use_ambient(&self) -> bool {
        self.ambient_colour.w.to_bits() != 0
    }

    /// The flags as a typed set.
    pub fn material_flags(&self) -> MaterialFlags {
        MaterialFlags::from_bits(self.flags as u32)
    }

    /// The byte image uploaded to the GPU.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// Constant colours of a material, already in the units the shader expects.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MaterialColours {
    /// Ambient colour. Its `w` slot is taken by the ambient flag.
    pub ambient: Vec3,
    /// Diffuse colour and opacity.
    pub diffuse: Vec4,
    /// Specular colour and specularity.
    pub specular: Vec4,
}

/// Packs material colours, the ambient flag and texture flags into a [`MaterialStruct`].
pub fn populate_material(
    colours: MaterialColours,
    use_ambient: bool,
    flags: MaterialFlags,
) -> MaterialStruct {
    let sentinel = if use_ambient {
        AMBIENT_ENABLED
    } else {
        AMBIENT_DISABLED
    };
    MaterialStruct {
        ambient_colour: colours.ambient.extend(sentinel),
        diffuse_colour: colours.diffuse,
        specular_colour: colours.specular,
        flags: flags.bits() as i32,
        _padding: [0; 3],
    }
}

/// A material as authored, with the ambient flag as a plain `bool`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    /// Ambient colour, in the same units as light intensities.
    pub ambient_colour: Vec3,
    /// Diffuse colour.
    pub diffuse_colour: Vec3,
    /// Specular colour.
    pub specular_colour: Vec3,
    /// Specular exponent scale in `[0, 1]`.
    pub specularity: f32,
    /// Opacity in `[0, 1]`.
    pub opacity: f32,
    /// Whether the ambient colour contributes to shading.
    pub use_ambient: bool,
    /// Which channels come from textures.
    pub flags: MaterialFlags,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient_colour: Vec3::ZERO,
            diffuse_colour: Vec3::ONE,
            specular_colour: Vec3::ZERO,
            specularity: 0.5,
            opacity: 1.0,
            use_ambient: true,
            flags: MaterialFlags::NONE,
        }
    }
}

impl Material {
    /// Packs the material for upload. The ambient colour is divided by
    /// `hdr_max_intensity` so it shares the light buffer's range.
    pub fn to_struct(&self, hdr_max_intensity: f32) -> MaterialStruct {
        populate_material(
            MaterialColours {
                ambient: self.ambient_colour / hdr_max_intensity,
                diffuse: self.diffuse_colour.extend(self.opacity),
                specular: self.specular_colour.extend(self.specularity),
            },
            self.use_ambient,
            self.flags,
        )
    }
}
