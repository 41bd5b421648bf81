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

//! # Cairn Library
//!
//! The orchestration layer of the asset library.
//!
//! A [`Library`] owns the [`AssetStore`](cairn_data::assets::AssetStore) and a
//! registry of in-flight loads. Every `(type, address)` pair is loaded at most
//! once at a time: concurrent requests share one loader invocation, completed
//! results are cached, and nested addresses are resolved against the loaded
//! parent. Loaders run on an external [`Scheduler`]; the synchronous entry
//! points drive that scheduler from the calling thread until their result
//! settles.
//!
//! [`AssetDependencies`] batches several requests that must all succeed before
//! a consumer can be built.

#![warn(missing_docs)]

mod async_result;
mod config;
mod dependency;
mod library;
mod loader;
pub mod scheduler;

pub use async_result::AsyncResult;
pub use config::{CairnConfig, LibraryConfig, WorkerPoolConfig};
pub use dependency::{AssetDependencies, AssetDependency, AssetGroup};
pub use library::{Library, LibraryHandle};
pub use loader::{AssetLoader, AssetTypeRegistry, AssetTypeToken, FnLoader};
pub use scheduler::{Scheduler, TokioScheduler, WorkerPool};
