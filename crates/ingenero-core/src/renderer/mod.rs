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

//! Host-side rendering data: shading-mode selection, scene lights, and the GPU
//! record layouts they are packed into.

pub mod draw;
pub mod error;
pub mod layout;
pub mod light;
pub mod mode;
pub mod settings;

pub use self::draw::{DrawDispatcher, DrawIndexedPrimitives, IndexFormat, PrimitiveTopology};
pub use self::error::LayoutError;
pub use self::light::{Light, LightFalloff, LightKind};
pub use self::mode::{select_layout, LightBlockLayout, ShadingMode, MAX_LIGHTS};
pub use self::settings::{CapacityPolicy, LayoutSettings};
