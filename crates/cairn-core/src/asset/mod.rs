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

//! Provides the foundational traits and primitive types for Cairn's asset model.
//!
//! This module defines the "common language" for everything the library caches.
//! It has no knowledge of how assets are loaded or where they are stored.
//!
//! The key components are:
//! - The [`AssetContent`] trait: a marker for decoded values that can be cached.
//! - The [`Asset`] trait: the type-erased, shared capability every cached item exposes.
//! - [`ContentAsset`]: a decoded value paired with its named nested assets.
//! - Stable hashed keys used to index caches and nested maps.

mod content;
mod handle;
mod key;

pub use content::*;
pub use handle::*;
pub use key::*;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A marker trait for decoded values that the asset library can cache.
///
/// `TYPE_NAME` must be unique among all registered content types. It is the
/// source of the type's [`AssetTypeKey`], so it should never change once data
/// referencing it has been produced.
///
/// # Examples
///
/// ```
/// use cairn_core::asset::AssetContent;
///
/// struct Texture {
///     width: u32,
///     height: u32,
/// }
///
/// impl AssetContent for Texture {
///     const TYPE_NAME: &'static str = "texture";
/// }
/// ```
pub trait AssetContent: Send + Sync + 'static {
    /// The stable, unique name of this content type.
    const TYPE_NAME: &'static str;

    /// Returns the stable key derived from [`Self::TYPE_NAME`].
    fn type_key() -> AssetTypeKey
    where
        Self: Sized,
    {
        AssetTypeKey::from_name(Self::TYPE_NAME)
    }
}

/// The type-erased capability shared by every cached item.
///
/// An asset is immutable once published and shared by every holder; it is
/// destroyed when the last holder releases it.
pub trait Asset: Any + Send + Sync {
    /// The key of the content type this asset carries.
    fn type_key(&self) -> AssetTypeKey;

    /// The registered name of the content type this asset carries.
    fn type_name(&self) -> &'static str;

    /// Resolves a nested address against this asset's nested content.
    ///
    /// The first segment of `address` is looked up locally; any remainder is
    /// resolved recursively against the asset found. Returns `None` when a
    /// segment is missing.
    fn find_nested_asset(&self, address: &str) -> Option<AssetRef>;

    /// Returns `self` as `&dyn Any` for typed inspection.
    fn as_any(&self) -> &dyn Any;

    /// Converts a shared asset into a shared `Any` for typed downcasting.
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// A shared, type-erased reference to an asset.
pub type AssetRef = Arc<dyn Asset>;

impl dyn Asset {
    /// Returns `true` if this asset carries content of type `T`.
    pub fn is<T: AssetContent>(&self) -> bool {
        self.as_any().is::<ContentAsset<T>>()
    }

    /// Borrows this asset as a `ContentAsset<T>`, if it carries content of type `T`.
    pub fn downcast_ref<T: AssetContent>(&self) -> Option<&ContentAsset<T>> {
        self.as_any().downcast_ref::<ContentAsset<T>>()
    }

    /// Resolves a nested address and returns the result only if it carries `T`.
    ///
    /// A type mismatch is reported as `None`, the same as a missing entry.
    pub fn find_nested<T: AssetContent>(&self, address: &str) -> Option<AssetHandle<T>> {
        self.find_nested_asset(address).and_then(downcast_asset::<T>)
    }
}

impl fmt::Debug for dyn Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Asset")
            .field("type_name", &self.type_name())
            .finish_non_exhaustive()
    }
}

/// Converts a shared type-erased asset into a typed handle.
///
/// Returns `None` if the asset does not carry content of type `T`.
pub fn downcast_asset<T: AssetContent>(asset: AssetRef) -> Option<AssetHandle<T>> {
    asset
        .into_any()
        .downcast::<ContentAsset<T>>()
        .ok()
        .map(AssetHandle::from_arc)
}
