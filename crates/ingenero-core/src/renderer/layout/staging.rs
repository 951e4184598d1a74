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

//! CPU-side staging of uniform records at a fixed, aligned stride.
//!
//! Dynamic uniform offsets must be multiples of the device's minimum uniform
//! alignment, so consecutive records (one `ModelMatrices` per mesh, one
//! `DeferredLightBlock` per light pass) are laid out at
//! `uniform_stride(size_of::<T>(), alignment)` bytes apart. The staged bytes are
//! copied verbatim into a GPU buffer by the caller.

use bytemuck::Pod;

use crate::renderer::error::LayoutError;
use crate::renderer::settings::LayoutSettings;

/// Default minimum uniform alignment required by most APIs.
pub const MIN_UNIFORM_ALIGNMENT: usize = 256;

/// Rounds `size` up to the next multiple of `alignment`.
///
/// `alignment` must be a non-zero power of two.
pub fn uniform_stride(size: usize, alignment: usize) -> Result<usize, LayoutError> {
    if !alignment.is_power_of_two() {
        return Err(LayoutError::MisalignedStride {
            stride: size,
            alignment,
        });
    }
    Ok((size + alignment - 1) & !(alignment - 1))
}

/// A growable byte buffer of uniform records spaced `stride` bytes apart.
#[derive(Debug, Clone)]
pub struct UniformStaging {
    bytes: Vec<u8>,
    stride: usize,
    label: &'static str,
}

impl UniformStaging {
    /// Creates a staging buffer for records of type `T` at the given alignment.
    pub fn new<T: Pod>(alignment: usize, label: &'static str) -> Result<Self, LayoutError> {
        let stride = uniform_stride(std::mem::size_of::<T>().max(1), alignment)?;
        log::debug!(
            "Staging '{}': {} byte records at a {} byte stride",
            label,
            std::mem::size_of::<T>(),
            stride
        );
        Ok(Self {
            bytes: Vec::new(),
            stride,
            label,
        })
    }

    /// Creates a staging buffer for `T` using `settings.uniform_alignment`.
    pub fn with_settings<T: Pod>(
        settings: &LayoutSettings,
        label: &'static str,
    ) -> Result<Self, LayoutError> {
        Self::new::<T>(settings.uniform_alignment as usize, label)
    }

    /// The distance in bytes between consecutive records.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// The number of records staged.
    pub fn len(&self) -> usize {
        self.bytes.len() / self.stride
    }

    /// Returns `true` if no records are staged.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The byte offset of record `index`, suitable as a dynamic uniform offset.
    ///
    /// Returns `None` if the offset does not fit in `usize`.
    pub fn offset_of(&self, index: usize) -> Option<usize> {
        index.checked_mul(self.stride)
    }

    /// Appends a record and returns its byte offset.
    ///
    /// Fails with [`LayoutError::OutOfBounds`] if the record is larger than the stride.
    pub fn push<T: Pod>(&mut self, value: &T) -> Result<usize, LayoutError> {
        let offset = self.bytes.len();
        self.check_fits::<T>(offset)?;
        self.bytes.resize(offset + self.stride, 0);
        self.bytes[offset..offset + std::mem::size_of::<T>()]
            .copy_from_slice(bytemuck::bytes_of(value));
        Ok(offset)
    }

    /// Overwrites the already staged record at `index`.
    pub fn write_at<T: Pod>(&mut self, index: usize, value: &T) -> Result<(), LayoutError> {
        let offset = index.saturating_mul(self.stride);
        self.check_fits::<T>(offset)?;
        let len = std::mem::size_of::<T>();
        if index >= self.len() {
            return Err(LayoutError::OutOfBounds {
                offset,
                len,
                capacity: self.bytes.len(),
            });
        }
        self.bytes[offset..offset + len].copy_from_slice(bytemuck::bytes_of(value));
        Ok(())
    }

    /// Reads back the record at `index`.
    pub fn read_at<T: Pod>(&self, index: usize) -> Option<T> {
        let start = self.offset_of(index)?;
        let end = start.checked_add(std::mem::size_of::<T>())?;
        let bytes = self.bytes.get(start..end)?;
        Some(bytemuck::pod_read_unaligned(bytes))
    }

    /// The staged bytes, ready for upload.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Removes every record, keeping the allocation.
    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    fn check_fits<T>(&self, offset: usize) -> Result<(), LayoutError> {
        let len = std::mem::size_of::<T>();
        if len > self.stride {
            log::warn!(
                "Staging '{}': {} byte record does not fit the {} byte stride",
                self.label,
                len,
                self.stride
            );
            return Err(LayoutError::OutOfBounds {
                offset,
                len,
                capacity: offset.saturating_add(self.stride),
            });
        }
        Ok(())
    }
}
