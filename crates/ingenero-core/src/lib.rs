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

//! # Ingenero Core
//!
//! The numeric and data-layout layer under a forward/deferred renderer:
//!
//! * [`math`]: vectors, column-major matrices, and quaternions whose composition
//!   runs on a vectorized Hamilton product.
//! * [`renderer`]: the byte-exact records shared with shader code (light blocks,
//!   materials, model matrices, G-buffers, interpolants), selected at compile time
//!   by the `deferred` and `gbuffer-*` features.

#![warn(missing_docs)]

pub mod math;
pub mod renderer;
