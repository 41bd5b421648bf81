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

//! Sources resolve a main asset address to raw bytes.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// A read-only view of stored asset bytes, addressed by main asset address.
#[async_trait]
pub trait AssetSource: Send + Sync + 'static {
    /// Reads every byte stored at `address`.
    async fn read(&self, address: &str) -> Result<Vec<u8>>;

    /// Returns `true` if something is stored at `address`.
    fn exists(&self, address: &str) -> bool;
}

/// Serves files below a root directory.
///
/// Addresses are relative paths with `/` separators. Absolute paths and `..`
/// components are rejected so a request can never leave the root.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    /// Creates a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps an address to a path below the root.
    pub fn resolve(&self, address: &str) -> Result<PathBuf> {
        let relative = Path::new(address);
        for component in relative.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => bail!("address '{}' escapes the asset root", address),
            }
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl AssetSource for DirectorySource {
    async fn read(&self, address: &str) -> Result<Vec<u8>> {
        let path = self.resolve(address)?;
        log::trace!("Reading '{}'.", path.display());
        std::fs::read(&path).with_context(|| format!("Failed to read '{}'", path.display()))
    }

    fn exists(&self, address: &str) -> bool {
        self.resolve(address).map_or(false, |path| path.is_file())
    }
}

/// Serves bytes kept in memory, for embedded data and tests.
#[derive(Debug, Default)]
pub struct MemorySource {
    files: RwLock<HashMap<String, Arc<[u8]>>>,
}

impl MemorySource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `bytes` at `address`, replacing what was there.
    pub fn insert(&self, address: impl Into<String>, bytes: impl Into<Arc<[u8]>>) {
        self.files.write().insert(address.into(), bytes.into());
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(self, address: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        self.insert(address, bytes);
        self
    }

    /// Removes whatever is stored at `address`.
    pub fn remove(&self, address: &str) -> bool {
        self.files.write().remove(address).is_some()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }
}

#[async_trait]
impl AssetSource for MemorySource {
    async fn read(&self, address: &str) -> Result<Vec<u8>> {
        let bytes = self.files.read().get(address).cloned();
        match bytes {
            Some(bytes) => Ok(bytes.to_vec()),
            None => bail!("no in-memory asset at '{}'", address),
        }
    }

    fn exists(&self, address: &str) -> bool {
        self.files.read().contains_key(address)
    }
}
