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

//! Error taxonomy of the asset library.
//!
//! A missing nested asset is not an error: lookups return `None` for it.

use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by loads, dependency groups, and type registration.
///
/// The type is `Clone` because every caller sharing one deduplicated load
/// receives the same outcome.
#[derive(Debug, Clone, Error)]
pub enum AssetError {
    /// The loader for `type_name` could not produce the asset at `address`.
    #[error("failed to load {type_name} asset '{address}': {reason:#}")]
    LoadingFailure {
        /// Registered name of the requested content type.
        type_name: &'static str,
        /// The main address handed to the loader.
        address: String,
        /// What the loader reported.
        reason: Arc<anyhow::Error>,
    },

    /// The load's result was discarded because its library is shutting down.
    #[error("library was cancelled while loading '{address}'")]
    LibraryCancelled {
        /// The main address whose load was discarded.
        address: String,
    },

    /// No loader has been registered for the requested content type.
    #[error("no loader registered for asset type '{type_name}'")]
    UnregisteredType {
        /// Registered name of the requested content type.
        type_name: &'static str,
    },

    /// A loader was registered twice for the same content type.
    #[error("asset type '{type_name}' is already registered")]
    DuplicateType {
        /// Registered name of the content type.
        type_name: &'static str,
    },

    /// Two distinct type names hash to the same key.
    #[error("asset type '{type_name}' has the same key as registered type '{existing}'")]
    TypeKeyCollision {
        /// The name being registered.
        type_name: &'static str,
        /// The name already holding the key.
        existing: &'static str,
    },

    /// A dependency group entry resolved to no asset.
    #[error("dependency '{address}' of type {type_name} was not found")]
    MissingDependency {
        /// Registered name of the requested nested content type.
        type_name: &'static str,
        /// The full dependency address.
        address: String,
    },

    /// A cached asset did not carry the content type it was cached under.
    #[error("asset '{address}' is not of type {expected}")]
    TypeMismatch {
        /// Registered name of the expected content type.
        expected: &'static str,
        /// The address of the offending asset.
        address: String,
    },
}

impl AssetError {
    /// Wraps a loader failure.
    pub fn loading_failure(
        type_name: &'static str,
        address: impl Into<String>,
        reason: anyhow::Error,
    ) -> Self {
        AssetError::LoadingFailure {
            type_name,
            address: address.into(),
            reason: Arc::new(reason),
        }
    }

    /// Returns `true` if this error only reports a discarded load during shutdown.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AssetError::LibraryCancelled { .. })
    }
}

/// A `Result` specialised to [`AssetError`].
pub type AssetResult<T> = Result<T, AssetError>;

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Context};

    #[test]
    fn test_loading_failure_message_includes_cause_chain() {
        let reason: anyhow::Error = Err::<(), _>(anyhow!("file not found"))
            .context("reading bytes")
            .unwrap_err();
        let error = AssetError::loading_failure("texture", "a.png", reason);
        assert_eq!(
            error.to_string(),
            "failed to load texture asset 'a.png': reading bytes: file not found"
        );
    }

    #[test]
    fn test_clones_share_the_reason() {
        let error = AssetError::loading_failure("texture", "a.png", anyhow!("bad"));
        let clone = error.clone();
        match (error, clone) {
            (
                AssetError::LoadingFailure { reason: a, .. },
                AssetError::LoadingFailure { reason: b, .. },
            ) => assert!(Arc::ptr_eq(&a, &b)),
            _ => panic!("expected loading failures"),
        }
    }

    #[test]
    fn test_is_cancelled() {
        let cancelled = AssetError::LibraryCancelled {
            address: "x".into(),
        };
        assert!(cancelled.is_cancelled());
        assert!(!AssetError::UnregisteredType { type_name: "x" }.is_cancelled());
    }
}
