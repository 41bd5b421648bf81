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

mod common;

use anyhow::Result;
use cairn_core::asset::{AssetHandle, ContentAsset};
use cairn_core::AssetError;
use cairn_library::scheduler::{drive_until, Scheduler};
use cairn_library::{
    AssetTypeRegistry, Library, LibraryHandle, TokioScheduler, WorkerPool, WorkerPoolConfig,
};
use common::{fixture, Atlas, Blob, Sprite};
use futures::future::join3;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn test_concurrent_requests_share_one_load() -> Result<()> {
    let (gate, gate_rx) = flume::unbounded();
    let fx = fixture(0, Some(gate_rx));

    // --- 1. Three requests before the loader has run ---
    let a = fx.library.load_main_asset_async::<Blob>("shared.bin");
    let b = fx.library.load_main_asset_async::<Blob>("shared.bin");
    let c = fx.library.load_main_asset_async::<Blob>("shared.bin");
    assert_eq!(fx.library.loading_asset_count(), 1);
    assert_eq!(fx.library.asset_count(), 0);

    // --- 2. Let the single load finish ---
    gate.send(())?;
    let (a, b, c) = fx.library.block_on(join3(a, b, c));
    let (a, b, c) = (a?, b?, c?);

    // --- 3. One loader call, one cache entry, one shared asset ---
    assert_eq!(fx.blob_calls(), 1);
    assert!(AssetHandle::ptr_eq(&a, &b));
    assert!(AssetHandle::ptr_eq(&b, &c));
    assert_eq!(a.content(), &Blob("shared.bin".into()));
    assert_eq!(fx.library.asset_count(), 1);
    assert_eq!(fx.library.loading_asset_count(), 0);
    Ok(())
}

#[test]
fn test_cached_asset_is_returned_without_loading() {
    let fx = fixture(0, None);
    let first = fx.library.load_main_asset::<Blob>("a.bin").unwrap();

    let again = fx.library.load_main_asset_async::<Blob>("a.bin");
    assert_eq!(fx.library.loading_asset_count(), 0);
    let again = futures::executor::block_on(again).unwrap();

    assert!(AssetHandle::ptr_eq(&first, &again));
    assert_eq!(fx.blob_calls(), 1);
    assert!(fx.library.find::<Blob>("a.bin").is_some());
    assert!(fx.library.find::<Blob>("b.bin").is_none());
}

#[test]
fn test_different_addresses_and_types_load_separately() {
    let fx = fixture(0, None);
    fx.library.load_main_asset::<Blob>("one").unwrap();
    fx.library.load_main_asset::<Blob>("two").unwrap();
    fx.library.load_main_asset::<Atlas>("one").unwrap();

    assert_eq!(fx.blob_calls(), 2);
    assert_eq!(fx.atlas_calls(), 1);
    assert_eq!(fx.library.asset_count(), 3);
    assert_eq!(fx.library.asset_count_of::<Blob>(), 2);
    assert_eq!(fx.library.asset_count_of::<Atlas>(), 1);
    assert_eq!(
        fx.library.asset_counts(),
        vec![("test.atlas", 1), ("test.blob", 2)]
    );
}

#[test]
fn test_failures_are_not_cached() {
    let fx = fixture(0, None);

    let first = fx
        .library
        .block_on(fx.library.load_main_asset_async::<Blob>("fail-once.bin"));
    match first {
        Err(AssetError::LoadingFailure {
            type_name, address, ..
        }) => {
            assert_eq!(type_name, "test.blob");
            assert_eq!(address, "fail-once.bin");
        }
        other => panic!("expected a loading failure, got {:?}", other.map(|_| ())),
    }
    assert_eq!(fx.library.asset_count(), 0);
    assert_eq!(fx.library.loading_asset_count(), 0);

    // A fresh request retries the loader.
    let second = fx.library.load_main_asset::<Blob>("fail-once.bin");
    assert!(second.is_some());
    assert_eq!(fx.blob_calls(), 2);
}

#[test]
fn test_every_waiter_sees_the_same_failure() -> Result<()> {
    let (gate, gate_rx) = flume::unbounded();
    let fx = fixture(0, Some(gate_rx));

    let a = fx.library.load_main_asset_async::<Blob>("broken.bin");
    let b = fx.library.load_main_asset_async::<Blob>("broken.bin");
    gate.send(())?;
    let (a, b) = fx.library.block_on(futures::future::join(a, b));

    assert!(matches!(a, Err(AssetError::LoadingFailure { .. })));
    assert!(matches!(b, Err(AssetError::LoadingFailure { .. })));
    assert_eq!(fx.blob_calls(), 1);

    gate.send(())?;
    assert!(fx.library.load_main_asset::<Blob>("broken.bin").is_none());
    assert_eq!(fx.blob_calls(), 2);
    Ok(())
}

#[test]
fn test_unregistered_type_is_rejected() {
    let fx = fixture(0, None);
    let result = fx
        .library
        .block_on(fx.library.load_main_asset_async::<Sprite>("a.sprite"));
    assert!(matches!(
        result,
        Err(AssetError::UnregisteredType {
            type_name: "test.sprite"
        })
    ));
    assert_eq!(fx.library.loading_asset_count(), 0);
}

#[test]
fn test_nested_addresses_resolve_against_the_parent() {
    let fx = fixture(0, None);
    let library = &fx.library;

    let button = library.load_asset::<Atlas, Sprite>("ui.atlas:/button").unwrap();
    assert_eq!(button.content(), &Sprite(1));
    let again = library.load_asset::<Atlas, Sprite>("ui.atlas:/button").unwrap();
    assert!(AssetHandle::ptr_eq(&button, &again));

    let gear = library.load_asset::<Atlas, Sprite>("ui.atlas:/icons:/gear").unwrap();
    assert_eq!(gear.content(), &Sprite(3));

    let icons = library.load_asset::<Atlas, Atlas>("ui.atlas:/icons").unwrap();
    assert_eq!(icons.content(), &Atlas("ui.atlas/icons".into()));

    let atlas = library.load_asset::<Atlas, Atlas>("ui.atlas").unwrap();
    assert_eq!(atlas.content(), &Atlas("ui.atlas".into()));

    // Missing entries and type mismatches are not failures.
    assert!(library.load_asset::<Atlas, Sprite>("ui.atlas:/missing").is_none());
    assert!(library.load_asset::<Atlas, Atlas>("ui.atlas:/button").is_none());
    assert!(library.load_asset::<Atlas, Sprite>("ui.atlas").is_none());
    let missing = library.block_on(library.load_asset_async::<Atlas, Sprite>("ui.atlas:/nope"));
    assert!(matches!(missing, Ok(None)));

    // One parent load served every request; nested assets are not cached separately.
    assert_eq!(fx.atlas_calls(), 1);
    assert_eq!(library.asset_count(), 1);
}

#[test]
fn test_main_asset_address_is_not_split() {
    let fx = fixture(0, None);
    let blob = fx.library.load_main_asset::<Blob>("odd:/name").unwrap();
    assert_eq!(blob.content(), &Blob("odd:/name".into()));
    assert!(fx.library.find::<Blob>("odd").is_none());
}

#[test]
fn test_unused_assets_are_evicted() {
    let fx = fixture(0, None);
    let held = fx.library.load_main_asset::<Blob>("held.bin").unwrap();
    drop(fx.library.load_main_asset::<Blob>("free.bin").unwrap());

    assert_eq!(fx.library.unload_unused_assets(), 1);
    assert_eq!(fx.library.asset_count(), 1);
    assert!(fx.library.find::<Blob>("held.bin").is_some());

    drop(held);
    assert_eq!(fx.library.unload_unused_assets(), 1);
    assert_eq!(fx.library.asset_count(), 0);

    // An evicted asset is loaded again on demand.
    fx.library.load_main_asset::<Blob>("held.bin").unwrap();
    assert_eq!(fx.blob_calls(), 3);
}

#[test]
fn test_nested_handle_does_not_pin_its_parent() {
    let fx = fixture(0, None);
    let button = fx.library.load_asset::<Atlas, Sprite>("ui.atlas:/button").unwrap();

    // The sprite holds no reference to its parent: the atlas goes.
    assert_eq!(fx.library.unload_unused_assets(), 1);
    assert_eq!(button.content(), &Sprite(1));
}

#[test]
fn test_abandoned_request_still_populates_the_cache() {
    let fx = fixture(0, None);
    drop(fx.library.load_main_asset_async::<Blob>("late.bin"));
    assert_eq!(fx.library.loading_asset_count(), 1);

    drive_until(&*fx.pool, Duration::from_millis(1), || {
        fx.library.loading_asset_count() == 0
    });
    assert_eq!(fx.library.asset_count(), 1);
    assert_eq!(fx.blob_calls(), 1);
}

#[test]
fn test_loaders_can_request_other_assets() {
    let _ = env_logger::builder().is_test(true).try_init();

    #[derive(Debug)]
    struct Scene(u32);
    impl cairn_core::asset::AssetContent for Scene {
        const TYPE_NAME: &'static str = "test.scene";
    }

    let mut loaders = AssetTypeRegistry::new();
    loaders
        .register_fn::<Atlas, _, _>(|_, address| async move {
            Ok(ContentAsset::create(Atlas(address)))
        })
        .unwrap();
    loaders
        .register_fn::<Scene, _, _>(|library, address| async move {
            let atlas = library.load_main_asset_async::<Atlas>("shared.atlas").await?;
            let sprite = library
                .load_asset_async::<Atlas, Atlas>("shared.atlas")
                .await?;
            assert!(sprite.is_some());
            Ok(ContentAsset::create(Scene(
                (address.len() + atlas.content().0.len()) as u32,
            )))
        })
        .unwrap();

    let pool = Arc::new(WorkerPool::new(WorkerPoolConfig::manual()).unwrap());
    let library = Library::new(loaders, pool);

    let scene = library.load_main_asset::<Scene>("level").unwrap();
    assert_eq!(scene.content().0, 5 + 12);
    assert_eq!(library.asset_count(), 2);
}

#[test]
fn test_panicking_loader_settles_as_loading_failure() {
    let _ = env_logger::builder().is_test(true).try_init();

    #[derive(Debug)]
    struct Shader;
    impl cairn_core::asset::AssetContent for Shader {
        const TYPE_NAME: &'static str = "test.shader";
    }

    let calls = Arc::new(AtomicUsize::new(0));
    let mut loaders = AssetTypeRegistry::new();
    let counter = calls.clone();
    loaders
        .register_fn::<Shader, _, _>(move |_, address| {
            let first = counter.fetch_add(1, Ordering::SeqCst) == 0;
            async move {
                if !first {
                    return Ok(ContentAsset::create(Shader));
                }
                panic!("corrupt header in '{}'", address);
            }
        })
        .unwrap();

    let pool = Arc::new(WorkerPool::new(WorkerPoolConfig::manual()).unwrap());
    let library = Library::new(loaders, pool);

    // --- 1. The panic reaches the waiter as a loader failure ---
    let result = library.block_on(library.load_main_asset_async::<Shader>("lit.wgsl"));
    assert!(matches!(
        result,
        Err(AssetError::LoadingFailure { type_name: "test.shader", ref address, .. })
            if address == "lit.wgsl"
    ));
    assert!(!library.is_cancelled());
    assert_eq!(library.loading_asset_count(), 0);
    assert_eq!(library.asset_count(), 0);

    // --- 2. Nothing was cached, so the next request loads again ---
    assert!(library.load_main_asset::<Shader>("lit.wgsl").is_some());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_evicted_content_may_call_back_into_the_library() -> Result<()> {
    struct Holder {
        library: LibraryHandle,
        seen: Arc<AtomicUsize>,
    }
    impl cairn_core::asset::AssetContent for Holder {
        const TYPE_NAME: &'static str = "test.holder";
    }
    impl Drop for Holder {
        fn drop(&mut self) {
            self.seen.store(self.library.asset_count(), Ordering::SeqCst);
        }
    }

    let seen = Arc::new(AtomicUsize::new(usize::MAX));
    let mut loaders = AssetTypeRegistry::new();
    let recorder = seen.clone();
    loaders
        .register_fn::<Holder, _, _>(move |library, _| {
            let seen = recorder.clone();
            async move { Ok(ContentAsset::create(Holder { library, seen })) }
        })
        .unwrap();

    let pool = Arc::new(WorkerPool::new(WorkerPoolConfig::manual()).unwrap());
    let library = Library::new(loaders, pool);

    // --- 1. Load and release the only outside handle ---
    drop(library.load_main_asset::<Holder>("save.slot").unwrap());
    assert_eq!(library.asset_count(), 1);

    // --- 2. Evict on another thread so a stuck lock fails the test ---
    let handle = library.handle();
    let (done, done_rx) = flume::bounded(1);
    thread::spawn(move || {
        let _ = done.send(handle.unload_unused_assets());
    });
    let evicted = done_rx.recv_timeout(Duration::from_secs(5))?;

    // --- 3. The content was dropped after it left the cache ---
    assert_eq!(evicted, 1);
    assert_eq!(seen.load(Ordering::SeqCst), 0);
    assert_eq!(library.asset_count(), 0);
    Ok(())
}

#[test]
fn test_blocking_load_from_many_threads() {
    let fx = fixture(4, None);
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let library = fx.library.handle();
            thread::spawn(move || library.load_main_asset::<Blob>("contended.bin"))
        })
        .collect();

    let loaded: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap())
        .collect();
    assert!(loaded.windows(2).all(|w| AssetHandle::ptr_eq(&w[0], &w[1])));
    assert_eq!(fx.blob_calls(), 1);
}

#[test]
fn test_drop_cancels_and_drains_in_flight_loads() -> Result<()> {
    let (gate, gate_rx) = flume::unbounded();
    let fx = fixture(0, Some(gate_rx));
    let handle = fx.library.handle();

    // --- 1. Start a load that cannot finish yet ---
    let pending = handle.load_main_asset_async::<Blob>("slow.bin");
    assert_eq!(handle.loading_asset_count(), 1);

    // --- 2. Drop the library; the gate opens while it drains ---
    let opener = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        let _ = gate.send(());
    });
    drop(fx.library);
    opener.join().unwrap();

    // --- 3. The result was discarded, nothing is cached or in flight ---
    assert!(handle.is_cancelled());
    assert_eq!(fx.blob_calls.load(Ordering::SeqCst), 1);
    assert_eq!(handle.loading_asset_count(), 0);
    assert_eq!(handle.asset_count(), 0);
    assert!(matches!(
        futures::executor::block_on(pending),
        Err(AssetError::LibraryCancelled { .. })
    ));

    // --- 4. New requests fail immediately ---
    let late = futures::executor::block_on(handle.load_main_asset_async::<Blob>("late.bin"));
    assert!(matches!(late, Err(AssetError::LibraryCancelled { .. })));
    assert_eq!(handle.loading_asset_count(), 0);
    Ok(())
}

#[test]
fn test_tokio_scheduler_runs_loads() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;

    let calls = Arc::new(AtomicUsize::new(0));
    let mut loaders = AssetTypeRegistry::new();
    loaders.register(common::BlobLoader {
        calls: calls.clone(),
        gate: None,
    })?;
    let scheduler = Arc::new(TokioScheduler::new(runtime.handle().clone()));
    assert!(!scheduler.run_pending());
    let library = Library::new(loaders, scheduler);

    // --- 1. Awaited from async code on the runtime ---
    let handle = library.handle();
    let from_async = runtime.block_on(async move {
        handle.load_main_asset_async::<Blob>("async.bin").await
    })?;
    assert_eq!(from_async.content(), &Blob("async.bin".into()));

    // --- 2. Blocking call from a plain thread ---
    let from_sync = library.load_main_asset::<Blob>("async.bin").unwrap();
    assert!(AssetHandle::ptr_eq(&from_async, &from_sync));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    drop(library);
    Ok(())
}
