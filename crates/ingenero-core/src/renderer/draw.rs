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

//! The indexed draw boundary.
//!
//! Drawing is owned by the graphics backend. This module only defines the command
//! shape and the trait a backend implements to receive it unchanged.

use serde::{Deserialize, Serialize};

/// How vertices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PrimitiveTopology {
    /// Vertices are rendered as a list of isolated points.
    PointList,
    /// Every two vertices form a line.
    LineList,
    /// Vertices are rendered as a connected line strip.
    LineStrip,
    /// Every three vertices form a triangle.
    #[default]
    TriangleList,
    /// Vertices are rendered as a connected triangle strip.
    TriangleStrip,
}

/// The element type of an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IndexFormat {
    /// Indices are 16-bit unsigned integers.
    #[default]
    Uint16,
    /// Indices are 32-bit unsigned integers.
    Uint32,
}

impl IndexFormat {
    /// Size of one index in bytes.
    pub const fn byte_size(self) -> u64 {
        match self {
            IndexFormat::Uint16 => 2,
            IndexFormat::Uint32 => 4,
        }
    }
}

/// An indexed draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DrawIndexedPrimitives {
    /// Primitive assembly mode.
    pub topology: PrimitiveTopology,
    /// Number of indices to read.
    pub index_count: u32,
    /// Element type of the index buffer.
    pub index_format: IndexFormat,
    /// Byte offset into the index buffer.
    pub index_buffer_offset: u64,
}

impl DrawIndexedPrimitives {
    /// Index count of the icosahedron used as a point-light volume.
    pub const LIGHT_VOLUME_INDEX_COUNT: u32 = 60;

    /// A triangle-list draw of `index_count` indices from the start of the buffer.
    pub const fn triangles(index_count: u32, index_format: IndexFormat) -> Self {
        Self {
            topology: PrimitiveTopology::TriangleList,
            index_count,
            index_format,
            index_buffer_offset: 0,
        }
    }

    /// The draw that rasterizes one point-light volume in a deferred light pass.
    pub const fn light_volume() -> Self {
        Self::triangles(Self::LIGHT_VOLUME_INDEX_COUNT, IndexFormat::Uint16)
    }

    /// Bytes of index data the draw reads.
    pub const fn index_bytes(&self) -> u64 {
        self.index_count as u64 * self.index_format.byte_size()
    }
}

/// Receives draw calls and forwards them to a graphics API.
pub trait DrawDispatcher {
    /// Issues `draw` exactly as given.
    fn draw_indexed_primitives(&mut self, draw: &DrawIndexedPrimitives);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<DrawIndexedPrimitives>,
    }

    impl DrawDispatcher for Recorder {
        fn draw_indexed_primitives(&mut self, draw: &DrawIndexedPrimitives) {
            self.calls.push(*draw);
        }
    }

    #[test]
    fn test_dispatcher_receives_command_unchanged() {
        let draw = DrawIndexedPrimitives {
            topology: PrimitiveTopology::TriangleStrip,
            index_count: 12,
            index_format: IndexFormat::Uint32,
            index_buffer_offset: u64::MAX - 7,
        };
        let mut recorder = Recorder::default();
        recorder.draw_indexed_primitives(&draw);
        assert_eq!(recorder.calls, vec![draw]);
    }

    #[test]
    fn test_light_volume_draw() {
        let draw = DrawIndexedPrimitives::light_volume();
        assert_eq!(draw.topology, PrimitiveTopology::TriangleList);
        assert_eq!(draw.index_count, 60);
        assert_eq!(draw.index_format, IndexFormat::Uint16);
        assert_eq!(draw.index_bytes(), 120);
    }

    #[test]
    fn test_index_sizes() {
        assert_eq!(IndexFormat::Uint16.byte_size(), 2);
        assert_eq!(IndexFormat::Uint32.byte_size(), 4);
    }
}
