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

//! Execution of loader tasks.
//!
//! The library never creates threads itself. Loads are spawned on a
//! [`Scheduler`], and the synchronous entry points use [`block_on`] to drive
//! that scheduler from the calling thread until their own result is ready.

mod tokio_scheduler;
mod worker_pool;

pub use tokio_scheduler::TokioScheduler;
pub use worker_pool::WorkerPool;

use futures::future::BoxFuture;
use futures::task::ArcWake;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::thread::{self, Thread};
use std::time::Duration;

/// An executor of `'static` futures.
pub trait Scheduler: Send + Sync + 'static {
    /// Queues a task for execution.
    fn spawn(&self, task: BoxFuture<'static, ()>);

    /// Runs at most one ready task on the calling thread.
    ///
    /// Returns `false` when nothing was run, either because no task is ready or
    /// because this scheduler cannot be driven from outside.
    fn run_pending(&self) -> bool;
}

struct ThreadSignal {
    thread: Thread,
    woken: AtomicBool,
}

impl ArcWake for ThreadSignal {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.woken.store(true, Ordering::Release);
        arc_self.thread.unpark();
    }
}

/// Blocks the calling thread until `future` completes.
///
/// While the future is pending the thread runs tasks from `scheduler`; when
/// none is ready it parks for at most `idle_wait`, or until the future is woken.
pub fn block_on<F: Future>(scheduler: &dyn Scheduler, idle_wait: Duration, future: F) -> F::Output {
    let mut future = std::pin::pin!(future);
    let signal = Arc::new(ThreadSignal {
        thread: thread::current(),
        woken: AtomicBool::new(true),
    });
    let waker = futures::task::waker(signal.clone());
    let mut cx = Context::from_waker(&waker);

    loop {
        if signal.woken.swap(false, Ordering::AcqRel) {
            if let Poll::Ready(output) = future.as_mut().poll(&mut cx) {
                return output;
            }
        }
        if !scheduler.run_pending() && !signal.woken.load(Ordering::Acquire) {
            thread::park_timeout(idle_wait);
        }
    }
}

/// Drives `scheduler` from the calling thread until `done` returns `true`.
pub fn drive_until(scheduler: &dyn Scheduler, idle_wait: Duration, mut done: impl FnMut() -> bool) {
    while !done() {
        if !scheduler.run_pending() {
            thread::park_timeout(idle_wait);
        }
    }
}
