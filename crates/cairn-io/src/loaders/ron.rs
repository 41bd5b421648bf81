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

use crate::AssetSource;
use anyhow::{Context, Result};
use async_trait::async_trait;
use cairn_core::asset::{AssetContent, ContentAsset};
use cairn_library::{AssetLoader, LibraryHandle};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;

/// Loads any deserializable content type from a RON document.
///
/// The document becomes the main asset; it has no nested content. Types that
/// bundle nested assets need a loader of their own.
pub struct RonLoader<T> {
    source: Arc<dyn AssetSource>,
    _content: PhantomData<fn() -> T>,
}

impl<T> RonLoader<T> {
    /// Creates a loader reading from `source`.
    pub fn new(source: Arc<dyn AssetSource>) -> Self {
        Self {
            source,
            _content: PhantomData,
        }
    }
}

#[async_trait]
impl<T> AssetLoader<T> for RonLoader<T>
where
    T: AssetContent + DeserializeOwned,
{
    async fn load(&self, _library: &LibraryHandle, address: &str) -> Result<ContentAsset<T>> {
        let bytes = self.source.read(address).await?;
        let content: T = ::ron::de::from_bytes(&bytes)
            .with_context(|| format!("Failed to parse RON document '{}'", address))?;
        Ok(ContentAsset::create(content))
    }
}
