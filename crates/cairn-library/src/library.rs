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

//! The library: a deduplicating front for the asset store.

use crate::config::LibraryConfig;
use crate::loader::{AssetTypeRegistry, ErasedLoader};
use crate::scheduler::{self, Scheduler};
use crate::AsyncResult;
use cairn_core::address;
use cairn_core::asset::{
    downcast_asset, AddressHash, AssetContent, AssetHandle, AssetRef, AssetTypeKey,
};
use cairn_core::{AssetError, AssetResult, CancellationToken};
use cairn_data::assets::AssetStore;
use futures::channel::oneshot;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::ops::Deref;
use std::sync::Arc;
use std::time::{Duration, Instant};

type PendingLoad = Shared<BoxFuture<'static, AssetResult<AssetRef>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct LoadKey {
    type_key: AssetTypeKey,
    address: AddressHash,
}

/// Everything guarded by the library lock.
///
/// No user code runs and no waiter is woken while this lock is held.
#[derive(Default)]
struct LibraryState {
    store: AssetStore,
    loading: HashMap<LoadKey, PendingLoad>,
}

struct LibraryShared {
    state: Mutex<LibraryState>,
    loaders: AssetTypeRegistry,
    scheduler: Arc<dyn Scheduler>,
    cancellation: CancellationToken,
    config: LibraryConfig,
}

enum Request {
    Cached(AssetRef),
    Pending(PendingLoad),
}

/// A shared reference to a [`Library`], handed to loaders and other threads.
///
/// Every request goes through the same cache and in-flight registry as the
/// owning `Library`. Once the owner is dropped, new requests fail with
/// [`AssetError::LibraryCancelled`].
#[derive(Clone)]
pub struct LibraryHandle {
    shared: Arc<LibraryShared>,
}

impl LibraryHandle {
    /// Requests the main asset of type `T` at `address`.
    ///
    /// A cached asset is returned immediately. Otherwise the load is started,
    /// or joined if one is already in flight for the same type and address.
    /// The address is used verbatim: it is never split on the nested delimiter.
    pub fn load_main_asset_async<T: AssetContent>(
        &self,
        address: &str,
    ) -> AsyncResult<AssetHandle<T>> {
        let pending = match self.request(T::type_key(), T::TYPE_NAME, address) {
            Ok(Request::Cached(asset)) => return AsyncResult::from(typed::<T>(asset, address)),
            Ok(Request::Pending(pending)) => pending,
            Err(error) => return AsyncResult::failed(error),
        };

        let address = address.to_owned();
        AsyncResult::new(async move {
            let asset = pending.await?;
            typed::<T>(asset, &address)
        })
    }

    /// Loads the main asset of type `T` at `address`, blocking until it is available.
    ///
    /// The calling thread runs scheduler tasks while it waits. Failures are
    /// logged and reported as `None`.
    pub fn load_main_asset<T: AssetContent>(&self, address: &str) -> Option<AssetHandle<T>> {
        self.block_on(self.load_main_asset_async::<T>(address))
            .map_err(report_failure)
            .ok()
    }

    /// Requests the asset at a possibly nested `address`.
    ///
    /// The parent part is loaded as a main asset of type `T`. With no nested
    /// part the main asset itself is returned if it is an `N`. Otherwise the
    /// nested part is resolved against it and `Ok(None)` reports a missing
    /// entry or an entry of another type.
    pub fn load_asset_async<T: AssetContent, N: AssetContent>(
        &self,
        address: &str,
    ) -> AsyncResult<Option<AssetHandle<N>>> {
        let (parent, nested) = address::split(address);
        let nested = nested.to_owned();
        self.load_main_asset_async::<T>(parent)
            .map(move |main| resolve_nested::<T, N>(main, &nested))
    }

    /// Blocking form of [`load_asset_async`](Self::load_asset_async).
    ///
    /// Returns `None` both for failed loads, which are logged, and for missing
    /// nested entries.
    pub fn load_asset<T: AssetContent, N: AssetContent>(
        &self,
        address: &str,
    ) -> Option<AssetHandle<N>> {
        self.block_on(self.load_asset_async::<T, N>(address))
            .map_err(report_failure)
            .ok()
            .flatten()
    }

    /// Looks up the cached main asset of type `T`, without loading it.
    pub fn find<T: AssetContent>(&self, address: &str) -> Option<AssetHandle<T>> {
        self.shared.state.lock().store.find_typed::<T>(address)
    }

    /// Drops cached assets nobody else holds and returns how many were removed.
    ///
    /// Loads in flight are unaffected. The evicted assets are released after
    /// the library lock, so content `Drop` impls may call back into the library.
    pub fn unload_unused_assets(&self) -> usize {
        let evicted = self.shared.state.lock().store.unload_unused_assets();
        evicted.len()
    }

    /// Number of cached assets across all types.
    pub fn asset_count(&self) -> usize {
        self.shared.state.lock().store.asset_count()
    }

    /// Number of cached assets of type `T`.
    pub fn asset_count_of<T: AssetContent>(&self) -> usize {
        self.shared.state.lock().store.asset_count_of::<T>()
    }

    /// `(type_name, count)` for every type with cached assets.
    pub fn asset_counts(&self) -> Vec<(&'static str, usize)> {
        self.shared.state.lock().store.asset_counts()
    }

    /// Number of loads currently in flight.
    pub fn loading_asset_count(&self) -> usize {
        self.shared.state.lock().loading.len()
    }

    /// Returns `true` once the owning [`Library`] has started shutting down.
    pub fn is_cancelled(&self) -> bool {
        self.shared.cancellation.is_cancelled()
    }

    /// The registry of loadable content types.
    pub fn loaders(&self) -> &AssetTypeRegistry {
        &self.shared.loaders
    }

    /// The scheduler loaders run on.
    pub fn scheduler(&self) -> &Arc<dyn Scheduler> {
        &self.shared.scheduler
    }

    /// Blocks on `future` while driving this library's scheduler.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        scheduler::block_on(
            &*self.shared.scheduler,
            self.shared.config.idle_wait(),
            future,
        )
    }

    fn request(
        &self,
        type_key: AssetTypeKey,
        type_name: &'static str,
        address: &str,
    ) -> AssetResult<Request> {
        let shared = &self.shared;
        if shared.cancellation.is_cancelled() {
            return Err(AssetError::LibraryCancelled {
                address: address.to_owned(),
            });
        }
        let loader = shared
            .loaders
            .get(type_key)
            .ok_or(AssetError::UnregisteredType { type_name })?;

        let key = LoadKey {
            type_key,
            address: AddressHash::of(address),
        };

        let (pending, sender) = {
            let mut state = shared.state.lock();
            // The drain on shutdown reads the registry under this lock.
            if shared.cancellation.is_cancelled() {
                return Err(AssetError::LibraryCancelled {
                    address: address.to_owned(),
                });
            }
            if let Some(asset) = state.store.find(type_key, key.address) {
                return Ok(Request::Cached(asset.clone()));
            }
            if let Some(pending) = state.loading.get(&key) {
                log::trace!("Joining in-flight load of {} '{}'.", type_name, address);
                return Ok(Request::Pending(pending.clone()));
            }

            let (sender, receiver) = oneshot::channel();
            let cancelled_address = address.to_owned();
            let pending = receiver
                .map(move |outcome| {
                    outcome.unwrap_or(Err(AssetError::LibraryCancelled {
                        address: cancelled_address,
                    }))
                })
                .boxed()
                .shared();
            state.loading.insert(key, pending.clone());
            (pending, sender)
        };

        self.spawn_load(loader, key, type_name, address, sender);
        Ok(Request::Pending(pending))
    }

    fn spawn_load(
        &self,
        loader: Arc<dyn ErasedLoader>,
        key: LoadKey,
        type_name: &'static str,
        address: &str,
        sender: oneshot::Sender<AssetResult<AssetRef>>,
    ) {
        log::debug!("Loading {} asset '{}'.", type_name, address);
        let settlement = Settlement {
            library: self.clone(),
            key,
            type_name,
            address: address.to_owned(),
            sender: Some(sender),
        };
        let library = self.clone();

        self.shared.scheduler.spawn(Box::pin(async move {
            let started = Instant::now();
            let outcome = loader.load_erased(&library, &settlement.address).await;
            settlement.settle(outcome, started.elapsed());
        }));
    }

    /// Records the outcome of a load and removes it from the in-flight registry.
    fn publish(
        &self,
        key: LoadKey,
        type_name: &'static str,
        address: &str,
        outcome: anyhow::Result<AssetRef>,
        elapsed: Duration,
    ) -> AssetResult<AssetRef> {
        let shared = &self.shared;
        let mut state = shared.state.lock();
        state.loading.remove(&key);

        if shared.cancellation.is_cancelled() {
            drop(state);
            log::debug!("Discarded {} asset '{}': library cancelled.", type_name, address);
            return Err(AssetError::LibraryCancelled {
                address: address.to_owned(),
            });
        }

        match outcome {
            Ok(asset) => {
                let replaced = state.store.store(
                    key.type_key,
                    type_name,
                    key.address,
                    address,
                    asset.clone(),
                );
                drop(state);
                drop(replaced);
                if elapsed >= shared.config.slow_load() {
                    log::info!("Loaded {} asset '{}' in {:?}.", type_name, address, elapsed);
                } else {
                    log::debug!("Loaded {} asset '{}' in {:?}.", type_name, address, elapsed);
                }
                Ok(asset)
            }
            Err(reason) => {
                drop(state);
                Err(AssetError::loading_failure(type_name, address, reason))
            }
        }
    }
}

/// Completes one in-flight load exactly once.
///
/// If the task is dropped before finishing, its registry entry is released
/// anyway. The load settles as cancelled when the library is shutting down and
/// as a loading failure otherwise, for instance after the loader panicked.
struct Settlement {
    library: LibraryHandle,
    key: LoadKey,
    type_name: &'static str,
    address: String,
    sender: Option<oneshot::Sender<AssetResult<AssetRef>>>,
}

impl Settlement {
    fn settle(mut self, outcome: anyhow::Result<AssetRef>, elapsed: Duration) {
        if let Some(sender) = self.sender.take() {
            let result =
                self.library
                    .publish(self.key, self.type_name, &self.address, outcome, elapsed);
            if let Err(error) = &result {
                if !error.is_cancelled() {
                    log::warn!("{}", error);
                }
            }
            // Every waiter may have stopped listening.
            let _ = sender.send(result);
        }
    }
}

impl Drop for Settlement {
    fn drop(&mut self) {
        if let Some(sender) = self.sender.take() {
            log::warn!(
                "Load of {} asset '{}' was abandoned before completing.",
                self.type_name,
                self.address
            );
            let released = self.library.shared.state.lock().loading.remove(&self.key);
            drop(released);
            let error = if self.library.is_cancelled() {
                AssetError::LibraryCancelled {
                    address: self.address.clone(),
                }
            } else {
                AssetError::loading_failure(
                    self.type_name,
                    &self.address,
                    anyhow::anyhow!("loader task was dropped before completing"),
                )
            };
            let _ = sender.send(Err(error));
        }
    }
}

/// The owner of an asset cache and its in-flight loads.
///
/// `Library` dereferences to [`LibraryHandle`] for all requests. Dropping it
/// cancels the library: loads still running complete but their results are
/// discarded, and the drop blocks, driving the scheduler, until none is left.
///
/// # Examples
///
/// ```
/// use cairn_core::asset::{AssetContent, ContentAsset};
/// use cairn_library::{AssetTypeRegistry, Library, WorkerPool, WorkerPoolConfig};
/// use std::sync::Arc;
///
/// struct Greeting(String);
/// impl AssetContent for Greeting {
///     const TYPE_NAME: &'static str = "greeting";
/// }
///
/// let mut loaders = AssetTypeRegistry::new();
/// loaders
///     .register_fn::<Greeting, _, _>(|_library, address| async move {
///         Ok(ContentAsset::create(Greeting(format!("hello {address}"))))
///     })
///     .unwrap();
///
/// let pool = Arc::new(WorkerPool::new(WorkerPoolConfig::manual()).unwrap());
/// let library = Library::new(loaders, pool);
/// let greeting = library.load_main_asset::<Greeting>("world").unwrap();
/// assert_eq!(greeting.content().0, "hello world");
/// assert_eq!(library.asset_count(), 1);
/// ```
pub struct Library {
    handle: LibraryHandle,
}

impl Library {
    /// Creates a library with default settings.
    pub fn new(loaders: AssetTypeRegistry, scheduler: Arc<dyn Scheduler>) -> Self {
        Self::with_config(loaders, scheduler, LibraryConfig::default())
    }

    /// Creates a library.
    pub fn with_config(
        loaders: AssetTypeRegistry,
        scheduler: Arc<dyn Scheduler>,
        config: LibraryConfig,
    ) -> Self {
        log::info!(
            "Asset library created for types {:?}.",
            loaders.type_names()
        );
        Self {
            handle: LibraryHandle {
                shared: Arc::new(LibraryShared {
                    state: Mutex::new(LibraryState::default()),
                    loaders,
                    scheduler,
                    cancellation: CancellationToken::new(),
                    config,
                }),
            },
        }
    }

    /// A clone of the shared handle.
    pub fn handle(&self) -> LibraryHandle {
        self.handle.clone()
    }
}

impl Deref for Library {
    type Target = LibraryHandle;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

impl Drop for Library {
    fn drop(&mut self) {
        self.shared.cancellation.cancel();

        let outstanding = self.loading_asset_count();
        if outstanding > 0 {
            log::info!("Library shutting down, waiting for {} loads.", outstanding);
        }
        scheduler::drive_until(
            &*self.shared.scheduler,
            self.shared.config.idle_wait(),
            || self.loading_asset_count() == 0,
        );
        log::debug!("Library shut down.");
    }
}

fn typed<T: AssetContent>(asset: AssetRef, address: &str) -> AssetResult<AssetHandle<T>> {
    downcast_asset::<T>(asset).ok_or_else(|| AssetError::TypeMismatch {
        expected: T::TYPE_NAME,
        address: address.to_owned(),
    })
}

fn resolve_nested<T: AssetContent, N: AssetContent>(
    main: AssetHandle<T>,
    nested: &str,
) -> Option<AssetHandle<N>> {
    if nested.is_empty() {
        downcast_asset::<N>(main.into_asset_ref())
    } else {
        main.find_nested::<N>(nested)
    }
}

/// Logs a failure the blocking API is about to swallow.
///
/// Loader failures were already reported when their load settled.
fn report_failure(error: AssetError) {
    match error {
        AssetError::LoadingFailure { .. } | AssetError::LibraryCancelled { .. } => {
            log::debug!("{}", error)
        }
        error => log::warn!("{}", error),
    }
}
