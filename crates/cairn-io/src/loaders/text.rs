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
use std::ops::Deref;
use std::sync::Arc;

/// A UTF-8 document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text(pub String);

impl AssetContent for Text {
    const TYPE_NAME: &'static str = "text";
}

impl Deref for Text {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

/// Loads [`Text`] assets, rejecting invalid UTF-8.
#[derive(Clone)]
pub struct TextLoader {
    source: Arc<dyn AssetSource>,
}

impl TextLoader {
    /// Creates a loader reading from `source`.
    pub fn new(source: Arc<dyn AssetSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl AssetLoader<Text> for TextLoader {
    async fn load(&self, _library: &LibraryHandle, address: &str) -> Result<ContentAsset<Text>> {
        let bytes = self.source.read(address).await?;
        let text = String::from_utf8(bytes)
            .with_context(|| format!("'{}' is not valid UTF-8", address))?;
        Ok(ContentAsset::create(Text(text)))
    }
}
