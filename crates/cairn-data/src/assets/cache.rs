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

//! A cache of loaded assets for a single content type.

use cairn_core::asset::{AddressHash, AssetRef};
use std::collections::HashMap;
use std::sync::Arc;

struct CacheEntry {
    address: String,
    asset: AssetRef,
}

/// Maps address hashes to the loaded assets of one content type.
///
/// An entry exists once a load for its address has completed and until an
/// eviction sweep finds that nobody else holds the asset. The cache only ever
/// drops its own reference; it never forces an asset to be destroyed.
pub struct TypedAssetCache {
    type_name: &'static str,
    entries: HashMap<AddressHash, CacheEntry>,
}

impl TypedAssetCache {
    /// Creates an empty cache for the content type registered as `type_name`.
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            entries: HashMap::new(),
        }
    }

    /// The registered name of the content type held by this cache.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Retrieves the asset cached under `hash`, without side effects.
    pub fn find(&self, hash: AddressHash) -> Option<&AssetRef> {
        self.entries.get(&hash).map(|entry| &entry.asset)
    }

    /// Returns the address an entry was stored under.
    pub fn address(&self, hash: AddressHash) -> Option<&str> {
        self.entries.get(&hash).map(|entry| entry.address.as_str())
    }

    /// Inserts or overwrites the asset cached under `hash`, returning the previous one.
    ///
    /// Two different addresses with the same hash are a bug: they would silently
    /// share one entry.
    pub fn store(&mut self, hash: AddressHash, address: &str, asset: AssetRef) -> Option<AssetRef> {
        if let Some(existing) = self.entries.get(&hash) {
            if existing.address != address {
                log::error!(
                    "Address hash collision in '{}' cache: '{}' and '{}' share {:?}",
                    self.type_name,
                    existing.address,
                    address,
                    hash
                );
                debug_assert!(false, "address hash collision");
            }
        }

        self.entries
            .insert(
                hash,
                CacheEntry {
                    address: address.to_owned(),
                    asset,
                },
            )
            .map(|previous| previous.asset)
    }

    /// Removes the entry cached under `hash`.
    pub fn remove(&mut self, hash: AddressHash) -> Option<AssetRef> {
        self.entries.remove(&hash).map(|entry| entry.asset)
    }

    /// Drops every entry whose asset is referenced by this cache alone.
    ///
    /// A single linear pass with no recency policy. The removed assets are
    /// handed back so the caller decides where their last reference drops.
    pub fn unload_unused(&mut self) -> Vec<AssetRef> {
        let unused: Vec<AddressHash> = self
            .entries
            .iter()
            .filter(|(_, entry)| Arc::strong_count(&entry.asset) == 1)
            .map(|(hash, _)| *hash)
            .collect();
        unused
            .into_iter()
            .filter_map(|hash| self.entries.remove(&hash))
            .map(|entry| entry.asset)
            .collect()
    }

    /// Iterates over the addresses currently cached.
    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(|entry| entry.address.as_str())
    }

    /// Returns the number of cached assets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
