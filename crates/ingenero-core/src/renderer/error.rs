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

//! Error types for building and staging GPU records.

use std::fmt;

/// An error raised while packing host data into a GPU record or staging buffer.
///
/// The core packing operations are infallible. These errors come from the strict
/// variants and from the staging helpers at the upload boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// More lights were supplied than the light block can hold.
    CapacityExceeded {
        /// The fixed capacity of the light block.
        capacity: usize,
        /// The number of lights that were supplied.
        requested: usize,
    },
    /// The upper 3x3 of a transform is singular, so no normal matrix exists.
    DegenerateTransform,
    /// A uniform stride or alignment is not usable for dynamic offsets.
    MisalignedStride {
        /// The stride that was requested.
        stride: usize,
        /// The alignment it must satisfy.
        alignment: usize,
    },
    /// A write would run past the end of a staging buffer.
    OutOfBounds {
        /// The byte offset of the write.
        offset: usize,
        /// The number of bytes written.
        len: usize,
        /// The capacity of the buffer in bytes.
        capacity: usize,
    },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::CapacityExceeded {
                capacity,
                requested,
            } => {
                write!(
                    f,
                    "Light block holds {capacity} lights but {requested} were supplied"
                )
            }
            LayoutError::DegenerateTransform => {
                write!(f, "Transform is singular; no normal matrix can be derived")
            }
            LayoutError::MisalignedStride { stride, alignment } => {
                write!(
                    f,
                    "Stride {stride} does not satisfy the required alignment of {alignment} bytes"
                )
            }
            LayoutError::OutOfBounds {
                offset,
                len,
                capacity,
            } => {
                write!(
                    f,
                    "Write of {len} bytes at offset {offset} exceeds buffer capacity {capacity}"
                )
            }
        }
    }
}

impl std::error::Error for LayoutError {}
