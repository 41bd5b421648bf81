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

//! Declared sets of assets that must all be available together.

use crate::{AsyncResult, LibraryHandle};
use cairn_core::asset::{downcast_asset, AssetContent, AssetHandle, AssetRef, AssetTypeKey};
use cairn_core::AssetError;
use futures::future;
use std::fmt;

type LoadFn = fn(&LibraryHandle, &str) -> AsyncResult<Option<AssetRef>>;

fn load_erased<T: AssetContent, N: AssetContent>(
    library: &LibraryHandle,
    address: &str,
) -> AsyncResult<Option<AssetRef>> {
    library
        .load_asset_async::<T, N>(address)
        .map(|found| found.map(AssetHandle::into_asset_ref))
}

/// One declared dependency: an `N` reached through a main asset of type `T`.
#[derive(Clone)]
pub struct AssetDependency {
    type_key: AssetTypeKey,
    nested_key: AssetTypeKey,
    nested_type_name: &'static str,
    address: String,
    load: LoadFn,
}

impl AssetDependency {
    /// Declares a dependency on the `N` at `address`, whose parent part is a `T`.
    pub fn new<T: AssetContent, N: AssetContent>(address: impl Into<String>) -> Self {
        Self {
            type_key: T::type_key(),
            nested_key: N::type_key(),
            nested_type_name: N::TYPE_NAME,
            address: address.into(),
            load: load_erased::<T, N>,
        }
    }

    /// The full, possibly nested, address.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Requests this dependency. A missing nested entry fails the request.
    pub fn load_async(&self, library: &LibraryHandle) -> AsyncResult<AssetRef> {
        let address = self.address.clone();
        let type_name = self.nested_type_name;
        let pending = (self.load)(library, &self.address);
        AsyncResult::new(async move {
            pending
                .await?
                .ok_or(AssetError::MissingDependency { type_name, address })
        })
    }

    fn matches(&self, type_key: AssetTypeKey, nested_key: AssetTypeKey, address: &str) -> bool {
        self.type_key == type_key && self.nested_key == nested_key && self.address == address
    }
}

impl fmt::Debug for AssetDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetDependency")
            .field("type_name", &self.nested_type_name)
            .field("address", &self.address)
            .finish()
    }
}

/// A list of dependencies loaded as a unit.
///
/// # Examples
///
/// ```no_run
/// # use cairn_core::asset::AssetContent;
/// # use cairn_library::{AssetDependencies, LibraryHandle};
/// # struct Atlas;
/// # impl AssetContent for Atlas { const TYPE_NAME: &'static str = "atlas"; }
/// # struct Sprite;
/// # impl AssetContent for Sprite { const TYPE_NAME: &'static str = "sprite"; }
/// # fn demo(library: &LibraryHandle) {
/// let dependencies = AssetDependencies::new()
///     .with::<Atlas, Atlas>("ui.atlas")
///     .with::<Atlas, Sprite>("ui.atlas:/button");
///
/// if let Some(group) = dependencies.load(library) {
///     let button = group.find_asset::<Atlas, Sprite>("ui.atlas:/button");
///     assert!(button.is_some());
/// }
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct AssetDependencies {
    dependencies: Vec<AssetDependency>,
}

impl AssetDependencies {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a dependency on the `N` at `address`, reached through a `T`.
    pub fn add_dependency<T: AssetContent, N: AssetContent>(
        &mut self,
        address: impl Into<String>,
    ) -> &mut Self {
        self.push(AssetDependency::new::<T, N>(address))
    }

    /// Builder form of [`add_dependency`](Self::add_dependency).
    pub fn with<T: AssetContent, N: AssetContent>(mut self, address: impl Into<String>) -> Self {
        self.add_dependency::<T, N>(address);
        self
    }

    /// Appends an already declared dependency.
    pub fn push(&mut self, dependency: AssetDependency) -> &mut Self {
        self.dependencies.push(dependency);
        self
    }

    /// Appends every dependency of `other`.
    pub fn merge(&mut self, other: &AssetDependencies) -> &mut Self {
        self.dependencies.extend(other.dependencies.iter().cloned());
        self
    }

    /// Iterates over the declared dependencies.
    pub fn iter(&self) -> impl Iterator<Item = &AssetDependency> {
        self.dependencies.iter()
    }

    /// Number of declared dependencies.
    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    /// Returns `true` if nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Requests every dependency at once.
    ///
    /// The group is produced only if all of them resolve; the first failure
    /// fails the whole request. Assets that did load stay cached.
    pub fn load_async(&self, library: &LibraryHandle) -> AsyncResult<AssetGroup> {
        let loads: Vec<_> = self
            .dependencies
            .iter()
            .map(|dependency| {
                let entry = dependency.clone();
                dependency
                    .load_async(library)
                    .map(move |asset| GroupEntry {
                        dependency: entry,
                        asset,
                    })
            })
            .collect();

        AsyncResult::new(async move {
            let entries = future::try_join_all(loads).await?;
            Ok(AssetGroup { entries })
        })
    }

    /// Loads every dependency, blocking until the group is complete.
    ///
    /// Returns `None` and logs the cause if any dependency failed.
    pub fn load(&self, library: &LibraryHandle) -> Option<AssetGroup> {
        match library.block_on(self.load_async(library)) {
            Ok(group) => Some(group),
            Err(error) => {
                log::warn!("Dependency group of {} assets failed: {}", self.len(), error);
                None
            }
        }
    }
}

impl<'a> IntoIterator for &'a AssetDependencies {
    type Item = &'a AssetDependency;
    type IntoIter = std::slice::Iter<'a, AssetDependency>;

    fn into_iter(self) -> Self::IntoIter {
        self.dependencies.iter()
    }
}

#[derive(Clone)]
struct GroupEntry {
    dependency: AssetDependency,
    asset: AssetRef,
}

/// The resolved assets of a dependency list, keeping each of them alive.
#[derive(Clone, Default)]
pub struct AssetGroup {
    entries: Vec<GroupEntry>,
}

impl AssetGroup {
    /// Returns the `N` declared at `address` through a `T`.
    ///
    /// If the same dependency was declared several times, the last one wins.
    pub fn find_asset<T: AssetContent, N: AssetContent>(
        &self,
        address: &str,
    ) -> Option<AssetHandle<N>> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.dependency.matches(T::type_key(), N::type_key(), address))
            .and_then(|entry| downcast_asset::<N>(entry.asset.clone()))
    }

    /// Number of resolved entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the group holds nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for AssetGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|entry| &entry.dependency))
            .finish()
    }
}
