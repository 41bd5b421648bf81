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

use super::{AssetContent, AssetRef, ContentAsset};
use std::{fmt, ops::Deref, sync::Arc};

/// A thread-safe, reference-counted handle to a loaded `ContentAsset<T>`.
///
/// This acts as a smart pointer, providing shared ownership of the asset.
/// Cloning a handle is cheap, as it only increments the reference count
/// and does not duplicate the underlying asset data.
///
/// Every live handle keeps the asset out of reach of cache eviction; the asset
/// is deallocated when the cache and the last handle have both released it.
pub struct AssetHandle<T: AssetContent>(Arc<ContentAsset<T>>);

impl<T: AssetContent> AssetHandle<T> {
    /// Creates a new `AssetHandle` that takes ownership of the asset.
    pub fn new(asset: ContentAsset<T>) -> Self {
        Self(Arc::new(asset))
    }

    /// Wraps an already shared asset.
    pub fn from_arc(asset: Arc<ContentAsset<T>>) -> Self {
        Self(asset)
    }

    /// Returns `true` if both handles point to the same asset.
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.0, &other.0)
    }

    /// Returns a type-erased reference to the same asset.
    pub fn to_asset_ref(&self) -> AssetRef {
        self.0.clone()
    }

    /// Converts this handle into a type-erased reference to the same asset.
    pub fn into_asset_ref(self) -> AssetRef {
        self.0
    }

    /// Returns the number of strong references to the asset, this handle included.
    pub fn strong_count(this: &Self) -> usize {
        Arc::strong_count(&this.0)
    }
}

impl<T: AssetContent> Clone for AssetHandle<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: AssetContent> Deref for AssetHandle<T> {
    type Target = ContentAsset<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: AssetContent + fmt::Debug> fmt::Debug for AssetHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AssetHandle").field(&*self.0).finish()
    }
}
