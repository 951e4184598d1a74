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

use anyhow::{Context, Result};
use ingenero_core::renderer::LayoutSettings;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Default location of the layout manifest, relative to the workspace root.
pub const DEFAULT_MANIFEST: &str = "Layout.toml";

/// Represents the structure of the `Layout.toml` manifest file.
#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(default)]
pub struct LayoutManifest {
    /// Packing settings handed to the core crate.
    pub layout: LayoutSettings,
    /// Where generated shader declarations go.
    pub wgsl: WgslOutput,
}

#[derive(Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct WgslOutput {
    pub path: PathBuf,
}

impl Default for WgslOutput {
    /// Generated declarations land under `target/` so they are never committed
    /// by accident.
    fn default() -> Self {
        Self {
            path: PathBuf::from("target/ingenero/layouts.wgsl"),
        }
    }
}

/// Loads the manifest at `path`, or the default configuration when it is absent.
///
/// The layout settings are validated before being returned.
pub fn load_manifest(path: &Path) -> Result<LayoutManifest> {
    let manifest: LayoutManifest = if path.exists() {
        log::info!("Found '{}'. Loading configuration.", path.display());
        let manifest_str = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest file at '{}'", path.display()))?;
        parse_manifest(&manifest_str)
            .with_context(|| format!("Failed to parse TOML from '{}'", path.display()))?
    } else {
        log::info!("No '{}' found. Using default configuration.", path.display());
        LayoutManifest::default()
    };

    manifest
        .layout
        .validate()
        .with_context(|| format!("Invalid [layout] section in '{}'", path.display()))?;
    log::debug!("Layout settings: {:?}", manifest.layout);

    Ok(manifest)
}

fn parse_manifest(source: &str) -> Result<LayoutManifest> {
    Ok(toml::from_str(source)?)
}
