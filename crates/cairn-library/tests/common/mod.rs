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

//! Content types and loaders shared by the library integration tests.

#![allow(dead_code)]

use anyhow::{bail, Result};
use cairn_core::asset::{AssetContent, ContentAsset, NestedContent};
use cairn_library::{
    AssetLoader, AssetTypeRegistry, Library, LibraryHandle, WorkerPool, WorkerPoolConfig,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, PartialEq)]
pub struct Blob(pub String);
impl AssetContent for Blob {
    const TYPE_NAME: &'static str = "test.blob";
}

#[derive(Debug, PartialEq)]
pub struct Atlas(pub String);
impl AssetContent for Atlas {
    const TYPE_NAME: &'static str = "test.atlas";
}

#[derive(Debug, PartialEq)]
pub struct Sprite(pub u32);
impl AssetContent for Sprite {
    const TYPE_NAME: &'static str = "test.sprite";
}

/// Produces `Blob(address)`, optionally waiting for a gate token first.
///
/// Addresses starting with `fail` fail on their first attempt only.
pub struct BlobLoader {
    pub calls: Arc<AtomicUsize>,
    pub gate: Option<flume::Receiver<()>>,
}

#[async_trait::async_trait]
impl AssetLoader<Blob> for BlobLoader {
    async fn load(&self, _library: &LibraryHandle, address: &str) -> Result<ContentAsset<Blob>> {
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.recv_async().await?;
        }
        if address.starts_with("fail") && attempt == 0 {
            bail!("corrupt blob");
        }
        if address.starts_with("broken") {
            bail!("always broken");
        }
        Ok(ContentAsset::create(Blob(address.to_string())))
    }
}

/// Builds an atlas with sprites `button` (1) and `cursor` (2), and a nested
/// `icons` atlas holding `gear` (3).
pub struct AtlasLoader {
    pub calls: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl AssetLoader<Atlas> for AtlasLoader {
    async fn load(&self, _library: &LibraryHandle, address: &str) -> Result<ContentAsset<Atlas>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let icons = ContentAsset::create_with_nested(
            Atlas(format!("{address}/icons")),
            NestedContent::new().with("gear", ContentAsset::create(Sprite(3))),
        );
        Ok(ContentAsset::create_with_nested(
            Atlas(address.to_string()),
            NestedContent::new()
                .with("button", ContentAsset::create(Sprite(1)))
                .with("cursor", ContentAsset::create(Sprite(2)))
                .with("icons", icons),
        ))
    }
}

pub struct Fixture {
    pub library: Library,
    pub pool: Arc<WorkerPool>,
    pub blob_calls: Arc<AtomicUsize>,
    pub atlas_calls: Arc<AtomicUsize>,
}

impl Fixture {
    pub fn blob_calls(&self) -> usize {
        self.blob_calls.load(Ordering::SeqCst)
    }

    pub fn atlas_calls(&self) -> usize {
        self.atlas_calls.load(Ordering::SeqCst)
    }
}

/// A library over a pool with `worker_threads` workers, optionally gating blob loads.
pub fn fixture(worker_threads: usize, gate: Option<flume::Receiver<()>>) -> Fixture {
    let _ = env_logger::builder().is_test(true).try_init();

    let blob_calls = Arc::new(AtomicUsize::new(0));
    let atlas_calls = Arc::new(AtomicUsize::new(0));

    let mut loaders = AssetTypeRegistry::new();
    loaders
        .register(BlobLoader {
            calls: blob_calls.clone(),
            gate,
        })
        .unwrap();
    loaders
        .register(AtlasLoader {
            calls: atlas_calls.clone(),
        })
        .unwrap();

    let pool = Arc::new(
        WorkerPool::new(WorkerPoolConfig {
            worker_threads,
            thread_name: "test-worker".to_string(),
        })
        .unwrap(),
    );
    let library = Library::new(loaders, pool.clone());

    Fixture {
        library,
        pool,
        blob_calls,
        atlas_calls,
    }
}
