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

// Cairn Sandbox
// Loads a HUD made of an atlas, its sprites and a title through one dependency group.

mod atlas;

use anyhow::{Context, Result};
use atlas::{Atlas, AtlasLoader, Sprite};
use cairn_io::{register_file_loaders, AssetSource, DirectorySource, MemorySource, Text};
use cairn_library::{AssetDependencies, AssetTypeRegistry, CairnConfig, Library, WorkerPool};
use std::path::Path;
use std::sync::Arc;

const CONFIG_FILE: &str = "cairn.ron";

const HUD_ATLAS: &str = r#"(
    texture: "ui/hud.tex",
    sprites: [
        (name: "button", rect: [0, 0, 64, 24]),
        (name: "cursor", rect: [64, 0, 16, 16]),
        (name: "heart", rect: [80, 0, 16, 16]),
    ],
)"#;

/// The bundled demo data, used when no asset directory is given.
fn embedded_source() -> MemorySource {
    MemorySource::new()
        .with("ui/hud.atlas", HUD_ATLAS.as_bytes())
        .with("ui/hud.tex", vec![0x7f; 96 * 24 * 4])
        .with("ui/title.txt", &b"Cairn sandbox"[..])
}

fn load_config() -> Result<CairnConfig> {
    if Path::new(CONFIG_FILE).is_file() {
        log::info!("Using configuration from '{}'.", CONFIG_FILE);
        CairnConfig::from_file(CONFIG_FILE)
    } else {
        Ok(CairnConfig::default())
    }
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = load_config()?;
    let source: Arc<dyn AssetSource> = match std::env::args().nth(1) {
        Some(root) => {
            log::info!("Serving assets from '{}'.", root);
            Arc::new(DirectorySource::new(root))
        }
        None => Arc::new(embedded_source()),
    };

    // --- 1. Register every loadable type ---
    let mut loaders = AssetTypeRegistry::new();
    register_file_loaders(&mut loaders, source.clone())?;
    loaders.register(AtlasLoader::new(source))?;

    let pool = Arc::new(WorkerPool::new(config.workers.clone()).context("starting worker pool")?);
    let library = Library::with_config(loaders, pool, config.library.clone());

    // --- 2. Load the HUD as a unit ---
    let hud = AssetDependencies::new()
        .with::<Atlas, Atlas>("ui/hud.atlas")
        .with::<Atlas, Sprite>("ui/hud.atlas:/button")
        .with::<Atlas, Sprite>("ui/hud.atlas:/cursor")
        .with::<Text, Text>("ui/title.txt");

    let Some(group) = hud.load(&library) else {
        anyhow::bail!("the HUD could not be loaded");
    };

    if let Some(title) = group.find_asset::<Text, Text>("ui/title.txt") {
        log::info!("Title: {}", &**title.content());
    }
    if let Some(atlas) = group.find_asset::<Atlas, Atlas>("ui/hud.atlas") {
        log::info!(
            "Atlas sprites: {:?} ({} texture bytes)",
            atlas.content().sprite_names,
            atlas.content().texture.content().len()
        );
    }
    for name in ["button", "cursor"] {
        let address = format!("ui/hud.atlas:/{name}");
        if let Some(sprite) = group.find_asset::<Atlas, Sprite>(&address) {
            log::info!("Sprite '{}': {:?}", name, sprite.content());
        }
    }

    // A sprite outside the group is still one lookup away, and cached parents are reused.
    let heart = library.load_asset::<Atlas, Sprite>("ui/hud.atlas:/heart");
    log::info!("Heart sprite: {:?}", heart.as_deref().map(|s| *s.content()));
    let missing = library.load_asset::<Atlas, Sprite>("ui/hud.atlas:/shield");
    log::info!("Shield sprite present: {}", missing.is_some());

    log::info!("Cached assets: {:?}", library.asset_counts());

    // --- 3. Release everything and sweep the cache ---
    drop(heart);
    drop(group);
    let first = library.unload_unused_assets();
    let second = library.unload_unused_assets();
    log::info!(
        "Evicted {} assets, then {} released by them. {} remain.",
        first,
        second,
        library.asset_count()
    );

    Ok(())
}
