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

use super::{downcast_asset, Asset, AssetContent, AssetHandle, AssetRef, AssetTypeKey, NameHash};
use crate::address;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// The named nested assets of a [`ContentAsset`], filled by a loader before publication.
///
/// Names are hashed on insertion. A name containing the nested delimiter can
/// never be addressed, since lookups only ever use the first segment.
#[derive(Default, Clone)]
pub struct NestedContent {
    entries: HashMap<NameHash, AssetRef>,
}

impl NestedContent {
    /// Creates an empty nested-content map.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Adds a freshly created asset under `name`, replacing any previous entry.
    pub fn insert<T: AssetContent>(&mut self, name: &str, asset: ContentAsset<T>) -> &mut Self {
        self.insert_ref(name, Arc::new(asset))
    }

    /// Adds an already shared asset under `name`, replacing any previous entry.
    ///
    /// This is how a bundle exposes an asset it obtained from the library.
    pub fn insert_ref(&mut self, name: &str, asset: AssetRef) -> &mut Self {
        if name.contains(address::NESTED_DELIMITER) {
            log::warn!(
                "Nested asset name '{}' contains '{}' and will never be found.",
                name,
                address::NESTED_DELIMITER
            );
        }
        self.entries.insert(NameHash::of(name), asset);
        self
    }

    /// Builder-style variant of [`insert`](Self::insert).
    pub fn with<T: AssetContent>(mut self, name: &str, asset: ContentAsset<T>) -> Self {
        self.insert(name, asset);
        self
    }

    /// Builder-style variant of [`insert_ref`](Self::insert_ref).
    pub fn with_ref(mut self, name: &str, asset: AssetRef) -> Self {
        self.insert_ref(name, asset);
        self
    }

    /// Returns the number of nested entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no nested entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for NestedContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

/// A decoded value of type `T` together with the named assets nested inside it.
///
/// A `ContentAsset` is built completely by its loader and only then shared.
/// Neither the content nor the nested map can change afterwards, so readers
/// never need a lock once they hold a handle.
pub struct ContentAsset<T: AssetContent> {
    content: T,
    nested: HashMap<NameHash, AssetRef>,
}

impl<T: AssetContent> ContentAsset<T> {
    /// Creates an asset with no nested content.
    pub fn create(content: T) -> Self {
        Self {
            content,
            nested: HashMap::new(),
        }
    }

    /// Creates an asset exposing `nested` under their names.
    pub fn create_with_nested(content: T, nested: NestedContent) -> Self {
        Self {
            content,
            nested: nested.entries,
        }
    }

    /// Returns the decoded value.
    pub fn content(&self) -> &T {
        &self.content
    }

    /// Returns the number of directly nested assets.
    pub fn nested_count(&self) -> usize {
        self.nested.len()
    }

    /// Resolves a nested address and returns the result only if it carries `N`.
    pub fn find_nested<N: AssetContent>(&self, address: &str) -> Option<AssetHandle<N>> {
        self.find_nested_asset(address).and_then(downcast_asset::<N>)
    }
}

impl<T: AssetContent> Deref for ContentAsset<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.content
    }
}

impl<T: AssetContent> Asset for ContentAsset<T> {
    fn type_key(&self) -> AssetTypeKey {
        T::type_key()
    }

    fn type_name(&self) -> &'static str {
        T::TYPE_NAME
    }

    fn find_nested_asset(&self, address: &str) -> Option<AssetRef> {
        let (head, rest) = address::split(address);
        let found = self.nested.get(&NameHash::of(head))?;
        if rest.is_empty() {
            Some(found.clone())
        } else {
            found.find_nested_asset(rest)
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl<T: AssetContent + fmt::Debug> fmt::Debug for ContentAsset<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentAsset")
            .field("type_name", &T::TYPE_NAME)
            .field("content", &self.content)
            .field("nested", &self.nested.len())
            .finish()
    }
}
