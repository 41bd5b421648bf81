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

//! Loaders for formats that need no engine knowledge.

mod binary;
mod ron;
mod text;

pub use self::binary::{Binary, BinaryLoader};
pub use self::ron::RonLoader;
pub use self::text::{Text, TextLoader};

use crate::AssetSource;
use cairn_core::AssetResult;
use cairn_library::AssetTypeRegistry;
use std::sync::Arc;

/// Registers the [`Text`] and [`Binary`] loaders, both reading from `source`.
pub fn register_file_loaders(
    registry: &mut AssetTypeRegistry,
    source: Arc<dyn AssetSource>,
) -> AssetResult<()> {
    registry.register(TextLoader::new(source.clone()))?;
    registry.register(BinaryLoader::new(source))?;
    Ok(())
}
