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

use cairn_core::{AssetError, AssetResult};
use futures::future::{self, BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// The eventual outcome of an asynchronous library request.
///
/// Await it from async code, or hand it to
/// [`LibraryHandle::block_on`](crate::LibraryHandle::block_on). Dropping it
/// only stops waiting: a load that was already started still completes and
/// populates the cache.
#[must_use = "an AsyncResult does nothing unless awaited"]
pub struct AsyncResult<T> {
    inner: BoxFuture<'static, AssetResult<T>>,
}

impl<T: Send + 'static> AsyncResult<T> {
    /// Wraps a future producing the outcome.
    pub fn new(future: impl Future<Output = AssetResult<T>> + Send + 'static) -> Self {
        Self {
            inner: future.boxed(),
        }
    }

    /// A result that is already available.
    pub fn ready(value: T) -> Self {
        Self::new(future::ready(Ok(value)))
    }

    /// A result that has already failed.
    pub fn failed(error: AssetError) -> Self {
        Self::new(future::ready(Err(error)))
    }

    /// Transforms the successful value once it is available.
    pub fn map<U, F>(self, f: F) -> AsyncResult<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        AsyncResult::new(self.inner.map(|outcome| outcome.map(f)))
    }
}

impl<T> Future for AsyncResult<T> {
    type Output = AssetResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

impl<T: Send + 'static> From<AssetResult<T>> for AsyncResult<T> {
    fn from(result: AssetResult<T>) -> Self {
        match result {
            Ok(value) => AsyncResult::ready(value),
            Err(error) => AsyncResult::failed(error),
        }
    }
}

impl<T> fmt::Debug for AsyncResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncResult").finish_non_exhaustive()
    }
}
