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

//! The aggregate of all per-type caches.

use super::TypedAssetCache;
use cairn_core::asset::{
    downcast_asset, AddressHash, AssetContent, AssetHandle, AssetRef, AssetTypeKey,
};
use std::collections::HashMap;

/// A central, in-memory store holding one [`TypedAssetCache`] per content type.
///
/// Caches are created lazily the first time an asset of their type is stored.
#[derive(Default)]
pub struct AssetStore {
    caches: HashMap<AssetTypeKey, TypedAssetCache>,
}

impl AssetStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            caches: HashMap::new(),
        }
    }

    /// Returns the cache for `key`, if any asset of that type was ever stored.
    pub fn cache(&self, key: AssetTypeKey) -> Option<&TypedAssetCache> {
        self.caches.get(&key)
    }

    /// Returns the cache for `key`, creating it on first use.
    pub fn cache_mut(
        &mut self,
        key: AssetTypeKey,
        type_name: &'static str,
    ) -> &mut TypedAssetCache {
        self.caches
            .entry(key)
            .or_insert_with(|| TypedAssetCache::new(type_name))
    }

    /// Retrieves the type-erased asset cached for `(key, hash)`.
    pub fn find(&self, key: AssetTypeKey, hash: AddressHash) -> Option<&AssetRef> {
        self.caches.get(&key)?.find(hash)
    }

    /// Retrieves a typed handle to the `T` asset cached at `address`.
    pub fn find_typed<T: AssetContent>(&self, address: &str) -> Option<AssetHandle<T>> {
        self.find(T::type_key(), AddressHash::of(address))
            .cloned()
            .and_then(downcast_asset::<T>)
    }

    /// Inserts or overwrites an asset in the cache of its type.
    pub fn store(
        &mut self,
        key: AssetTypeKey,
        type_name: &'static str,
        hash: AddressHash,
        address: &str,
        asset: AssetRef,
    ) -> Option<AssetRef> {
        self.cache_mut(key, type_name).store(hash, address, asset)
    }

    /// Runs the eviction sweep of every cache and returns the removed assets.
    ///
    /// Each cache is swept once. An asset released by an evicted bundle may
    /// only become unused after the returned assets are dropped and is
    /// collected by the next sweep.
    pub fn unload_unused_assets(&mut self) -> Vec<AssetRef> {
        let removed: Vec<AssetRef> = self
            .caches
            .values_mut()
            .flat_map(TypedAssetCache::unload_unused)
            .collect();
        if !removed.is_empty() {
            log::debug!("Evicted {} unused assets.", removed.len());
        }
        removed
    }

    /// Returns the number of cached assets across all types.
    pub fn asset_count(&self) -> usize {
        self.caches.values().map(TypedAssetCache::len).sum()
    }

    /// Returns the number of cached assets of type `T`.
    pub fn asset_count_of<T: AssetContent>(&self) -> usize {
        self.caches
            .get(&T::type_key())
            .map_or(0, TypedAssetCache::len)
    }

    /// Lists `(type_name, count)` for every non-empty cache, sorted by name.
    pub fn asset_counts(&self) -> Vec<(&'static str, usize)> {
        let mut counts: Vec<_> = self
            .caches
            .values()
            .filter(|cache| !cache.is_empty())
            .map(|cache| (cache.type_name(), cache.len()))
            .collect();
        counts.sort_unstable();
        counts
    }
}
