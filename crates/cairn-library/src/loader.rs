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

//! Loaders and the registry that maps content types to them.

use crate::LibraryHandle;
use async_trait::async_trait;
use cairn_core::asset::{AssetContent, AssetRef, AssetTypeKey, ContentAsset};
use cairn_core::{AssetError, AssetResult};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// Produces the main asset of content type `T` for an address.
///
/// A loader receives the main address only; nested addresses are resolved by
/// the library afterwards. It may request other assets through `library`,
/// which shares the deduplication and cache of the original request.
///
/// Any error is reported to every waiter as an
/// [`AssetError::LoadingFailure`] and is not cached: a later request retries.
#[async_trait]
pub trait AssetLoader<T: AssetContent>: Send + Sync + 'static {
    /// Loads the asset at `address`, with its nested content.
    async fn load(&self, library: &LibraryHandle, address: &str)
        -> anyhow::Result<ContentAsset<T>>;
}

/// Adapts an async closure into an [`AssetLoader`].
pub struct FnLoader<F>(F);

impl<F> FnLoader<F> {
    /// Wraps `f`, which receives its own clone of the library handle and address.
    pub fn new<T, Fut>(f: F) -> Self
    where
        T: AssetContent,
        F: Fn(LibraryHandle, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<ContentAsset<T>>> + Send + 'static,
    {
        Self(f)
    }
}

#[async_trait]
impl<T, F, Fut> AssetLoader<T> for FnLoader<F>
where
    T: AssetContent,
    F: Fn(LibraryHandle, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<ContentAsset<T>>> + Send + 'static,
{
    async fn load(
        &self,
        library: &LibraryHandle,
        address: &str,
    ) -> anyhow::Result<ContentAsset<T>> {
        (self.0)(library.clone(), address.to_owned()).await
    }
}

/// Type-erased view of an `AssetLoader<T>`.
#[async_trait]
pub(crate) trait ErasedLoader: Send + Sync {
    fn type_name(&self) -> &'static str;

    async fn load_erased(
        &self,
        library: &LibraryHandle,
        address: &str,
    ) -> anyhow::Result<AssetRef>;
}

struct LoaderWrapper<T, L> {
    loader: L,
    _content: PhantomData<fn() -> T>,
}

#[async_trait]
impl<T: AssetContent, L: AssetLoader<T>> ErasedLoader for LoaderWrapper<T, L> {
    fn type_name(&self) -> &'static str {
        T::TYPE_NAME
    }

    async fn load_erased(
        &self,
        library: &LibraryHandle,
        address: &str,
    ) -> anyhow::Result<AssetRef> {
        let asset = self.loader.load(library, address).await?;
        Ok(Arc::new(asset))
    }
}

/// Proof that a loader for `T` is registered.
///
/// Obtaining one is the only way to register a content type, so holding a
/// token means every request for `T` will find its loader.
pub struct AssetTypeToken<T> {
    key: AssetTypeKey,
    _content: PhantomData<fn() -> T>,
}

impl<T: AssetContent> AssetTypeToken<T> {
    /// The stable key of `T`.
    pub fn key(&self) -> AssetTypeKey {
        self.key
    }

    /// The registered name of `T`.
    pub fn type_name(&self) -> &'static str {
        T::TYPE_NAME
    }
}

impl<T> Clone for AssetTypeToken<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for AssetTypeToken<T> {}

impl<T: AssetContent> fmt::Debug for AssetTypeToken<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetTypeToken")
            .field("type_name", &T::TYPE_NAME)
            .field("key", &self.key)
            .finish()
    }
}

/// The set of content types a library can load, each with its loader.
///
/// Built up front and handed to [`Library::new`](crate::Library::new); it is
/// immutable afterwards.
#[derive(Default)]
pub struct AssetTypeRegistry {
    loaders: HashMap<AssetTypeKey, Arc<dyn ErasedLoader>>,
}

impl AssetTypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the loader of content type `T`.
    ///
    /// Fails if `T` is already registered, or if its name hashes to the key of
    /// a different registered type.
    pub fn register<T: AssetContent>(
        &mut self,
        loader: impl AssetLoader<T>,
    ) -> AssetResult<AssetTypeToken<T>> {
        let key = T::type_key();
        if let Some(existing) = self.loaders.get(&key) {
            let existing = existing.type_name();
            return Err(if existing == T::TYPE_NAME {
                AssetError::DuplicateType {
                    type_name: T::TYPE_NAME,
                }
            } else {
                AssetError::TypeKeyCollision {
                    type_name: T::TYPE_NAME,
                    existing,
                }
            });
        }

        self.loaders.insert(
            key,
            Arc::new(LoaderWrapper {
                loader,
                _content: PhantomData,
            }),
        );
        log::debug!("Registered loader for asset type '{}' ({:?}).", T::TYPE_NAME, key);

        Ok(AssetTypeToken {
            key,
            _content: PhantomData,
        })
    }

    /// Registers an async closure as the loader of content type `T`.
    pub fn register_fn<T, F, Fut>(&mut self, f: F) -> AssetResult<AssetTypeToken<T>>
    where
        T: AssetContent,
        F: Fn(LibraryHandle, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<ContentAsset<T>>> + Send + 'static,
    {
        self.register::<T>(FnLoader::new(f))
    }

    /// Returns `true` if `T` has a loader.
    pub fn contains<T: AssetContent>(&self) -> bool {
        self.loaders.contains_key(&T::type_key())
    }

    /// Names of all registered content types, sorted.
    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.loaders.values().map(|l| l.type_name()).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered content types.
    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }

    pub(crate) fn get(&self, key: AssetTypeKey) -> Option<Arc<dyn ErasedLoader>> {
        self.loaders.get(&key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Mesh;
    impl AssetContent for Mesh {
        const TYPE_NAME: &'static str = "test.mesh";
    }

    struct OtherMesh;
    impl AssetContent for OtherMesh {
        const TYPE_NAME: &'static str = "test.mesh";
    }

    struct Audio;
    impl AssetContent for Audio {
        const TYPE_NAME: &'static str = "test.audio";
    }

    fn mesh_loader() -> impl AssetLoader<Mesh> {
        FnLoader::new(|_library, _address| async { Ok(ContentAsset::create(Mesh)) })
    }

    #[test]
    fn test_register_returns_token() {
        let mut registry = AssetTypeRegistry::new();
        let token = registry.register(mesh_loader()).unwrap();

        assert_eq!(token.key(), Mesh::type_key());
        assert_eq!(token.type_name(), "test.mesh");
        assert!(registry.contains::<Mesh>());
        assert!(!registry.contains::<Audio>());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut registry = AssetTypeRegistry::new();
        registry.register(mesh_loader()).unwrap();

        let again = registry.register(mesh_loader());
        assert!(matches!(
            again,
            Err(AssetError::DuplicateType {
                type_name: "test.mesh"
            })
        ));

        // A different Rust type claiming the same name is rejected as well.
        let impostor = registry.register_fn::<OtherMesh, _, _>(|_, _| async {
            Ok(ContentAsset::create(OtherMesh))
        });
        assert!(impostor.is_err());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_type_names_are_sorted() {
        let mut registry = AssetTypeRegistry::new();
        registry.register(mesh_loader()).unwrap();
        registry
            .register_fn::<Audio, _, _>(|_, _| async { Ok(ContentAsset::create(Audio)) })
            .unwrap();
        assert_eq!(registry.type_names(), vec!["test.audio", "test.mesh"]);
    }
}
