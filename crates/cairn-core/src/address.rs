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

//! The two-part address grammar: `<main>[":/"<nested>]`.
//!
//! Only the first delimiter is significant. Everything after it, including any
//! further delimiters, is the nested part and is handed verbatim to the next
//! resolution step.
//!
//! ```
//! use cairn_core::address;
//!
//! assert_eq!(address::parent("atlas.json:/sprite.png:/child"), "atlas.json");
//! assert_eq!(address::nested("atlas.json:/sprite.png:/child"), "sprite.png:/child");
//! ```

/// The delimiter separating the main part of an address from its nested part.
pub const NESTED_DELIMITER: &str = ":/";

/// Returns the part of `address` before the first delimiter, or the whole
/// address if it has none.
pub fn parent(address: &str) -> &str {
    split(address).0
}

/// Returns the part of `address` after the first delimiter, or an empty string
/// if it has none.
pub fn nested(address: &str) -> &str {
    split(address).1
}

/// Splits `address` at its first delimiter into `(parent, nested)`.
pub fn split(address: &str) -> (&str, &str) {
    address
        .split_once(NESTED_DELIMITER)
        .unwrap_or((address, ""))
}

/// Builds an address from a main part and an optional nested part.
///
/// An empty `nested` yields `parent` unchanged.
pub fn join(parent: &str, nested: &str) -> String {
    if nested.is_empty() {
        parent.to_owned()
    } else {
        format!("{parent}{NESTED_DELIMITER}{nested}")
    }
}
