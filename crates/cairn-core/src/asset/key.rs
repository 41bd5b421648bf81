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

use std::fmt;

/// Hashes `bytes` to a 64-bit value that is identical across processes and platforms.
///
/// The first eight bytes of the BLAKE3 digest are read as a little-endian integer.
pub fn stable_hash(bytes: &[u8]) -> u64 {
    let digest = blake3::hash(bytes);
    let mut word = [0u8; 8];
    word.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(word)
}

macro_rules! stable_key {
    ($(#[$meta:meta])* $name:ident, $ctor:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl $name {
            /// Computes the key of the given string.
            pub fn $ctor(value: &str) -> Self {
                Self(stable_hash(value.as_bytes()))
            }

            /// Returns the raw 64-bit hash.
            pub fn value(self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({:016x})"), self.0)
            }
        }
    };
}

stable_key!(
    /// Hash of a full main-asset address, used as the key of a typed cache.
    AddressHash,
    of
);

stable_key!(
    /// Hash of a single nested-content name inside a `ContentAsset`.
    NameHash,
    of
);

stable_key!(
    /// A stable identifier for an asset content type.
    ///
    /// Derived from the type's registered name rather than from a process-local
    /// counter, so the same type gets the same key in every run.
    AssetTypeKey,
    from_name
);
