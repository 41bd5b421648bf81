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
use anyhow::Result;
use async_trait::async_trait;
use cairn_core::asset::{AssetContent, ContentAsset};
use cairn_library::{AssetLoader, LibraryHandle};
use std::ops::Deref;
use std::sync::Arc;

/// Raw bytes, unparsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binary(pub Vec<u8>);

impl AssetContent for Binary {
    const TYPE_NAME: &'static str = "binary";
}

impl Deref for Binary {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

/// Loads [`Binary`] assets.
#[derive(Clone)]
pub struct BinaryLoader {
    source: Arc<dyn AssetSource>,
}

impl BinaryLoader {
    /// Creates a loader reading from `source`.
    pub fn new(source: Arc<dyn AssetSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl AssetLoader<Binary> for BinaryLoader {
    async fn load(&self, _library: &LibraryHandle, address: &str) -> Result<ContentAsset<Binary>> {
        let bytes = self.source.read(address).await?;
        Ok(ContentAsset::create(Binary(bytes)))
    }
}
