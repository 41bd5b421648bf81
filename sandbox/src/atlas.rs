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

//! Sprite atlases: one texture cut into named sprites.

use anyhow::{Context, Result};
use async_trait::async_trait;
use cairn_core::address;
use cairn_core::asset::{AssetContent, AssetHandle, ContentAsset, NestedContent};
use cairn_io::{AssetSource, Binary};
use cairn_library::{AssetLoader, LibraryHandle};
use serde::Deserialize;
use std::sync::Arc;

/// The RON document describing an atlas.
#[derive(Debug, Deserialize)]
struct AtlasManifest {
    texture: String,
    sprites: Vec<SpriteEntry>,
}

#[derive(Debug, Deserialize)]
struct SpriteEntry {
    name: String,
    rect: [u32; 4],
}

/// A rectangle of an atlas texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sprite {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl AssetContent for Sprite {
    const TYPE_NAME: &'static str = "sandbox.sprite";
}

/// A loaded atlas. Its sprites are nested assets addressed by name.
#[derive(Debug)]
pub struct Atlas {
    pub texture: AssetHandle<Binary>,
    pub sprite_names: Vec<String>,
}

impl AssetContent for Atlas {
    const TYPE_NAME: &'static str = "sandbox.atlas";
}

/// Reads an atlas manifest and loads the texture it names through the library.
pub struct AtlasLoader {
    source: Arc<dyn AssetSource>,
}

impl AtlasLoader {
    pub fn new(source: Arc<dyn AssetSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl AssetLoader<Atlas> for AtlasLoader {
    async fn load(&self, library: &LibraryHandle, address: &str) -> Result<ContentAsset<Atlas>> {
        let bytes = self.source.read(address).await?;
        let manifest: AtlasManifest = ron::de::from_bytes(&bytes)
            .with_context(|| format!("Invalid atlas manifest '{}'", address))?;

        let texture = library
            .load_main_asset_async::<Binary>(&manifest.texture)
            .await
            .with_context(|| format!("Atlas '{}' has no texture", address))?;

        let mut sprites = NestedContent::new();
        let mut sprite_names = Vec::with_capacity(manifest.sprites.len());
        for entry in manifest.sprites {
            if entry.name.contains(address::NESTED_DELIMITER) {
                anyhow::bail!("sprite name '{}' contains the nested delimiter", entry.name);
            }
            let [x, y, width, height] = entry.rect;
            sprites.insert(
                &entry.name,
                ContentAsset::create(Sprite {
                    x,
                    y,
                    width,
                    height,
                }),
            );
            sprite_names.push(entry.name);
        }

        log::debug!(
            "Atlas '{}' cut into {} sprites from {} bytes of texture.",
            address,
            sprite_names.len(),
            texture.content().len()
        );
        Ok(ContentAsset::create_with_nested(
            Atlas {
                texture,
                sprite_names,
            },
            sprites,
        ))
    }
}
