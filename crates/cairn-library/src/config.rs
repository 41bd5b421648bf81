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

//! Tunables for the library and its worker pool.

use anyhow::Context;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Settings of a [`Library`](crate::Library).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// How long a thread driving the scheduler sleeps when no task is ready.
    pub idle_wait_ms: u64,
    /// Completed loads slower than this are reported at `info` level instead of `debug`.
    pub slow_load_ms: u64,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            idle_wait_ms: 1,
            slow_load_ms: 250,
        }
    }
}

impl LibraryConfig {
    /// The idle sleep as a [`Duration`].
    pub fn idle_wait(&self) -> Duration {
        Duration::from_millis(self.idle_wait_ms.max(1))
    }

    /// The slow-load threshold as a [`Duration`].
    pub fn slow_load(&self) -> Duration {
        Duration::from_millis(self.slow_load_ms)
    }
}

/// Settings of a [`WorkerPool`](crate::WorkerPool).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WorkerPoolConfig {
    /// Number of dedicated worker threads. With `0`, tasks only make progress
    /// while some thread drives the pool.
    pub worker_threads: usize,
    /// Prefix of the worker thread names.
    pub thread_name: String,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        let worker_threads = std::thread::available_parallelism()
            .map(|n| n.get().saturating_sub(1).max(1))
            .unwrap_or(1);
        Self {
            worker_threads,
            thread_name: "cairn-worker".to_string(),
        }
    }
}

impl WorkerPoolConfig {
    /// A pool without worker threads, driven exclusively by its callers.
    pub fn manual() -> Self {
        Self {
            worker_threads: 0,
            ..Self::default()
        }
    }
}

/// The top-level configuration file, with one section per component.
///
/// Missing sections and fields fall back to their defaults.
///
/// ```
/// use cairn_library::CairnConfig;
///
/// let config = CairnConfig::from_ron_str("(workers: (worker_threads: 2))").unwrap();
/// assert_eq!(config.workers.worker_threads, 2);
/// assert_eq!(config.library.idle_wait_ms, 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CairnConfig {
    /// Library settings.
    pub library: LibraryConfig,
    /// Worker pool settings.
    pub workers: WorkerPoolConfig,
}

impl CairnConfig {
    /// Parses a configuration from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }

    /// Reads and parses a RON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config '{}'", path.display()))?;
        Self::from_ron_str(&text).with_context(|| format!("invalid config '{}'", path.display()))
    }
}
