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

use super::Scheduler;
use crate::WorkerPoolConfig;
use flume::{Receiver, RecvTimeoutError, Sender};
use futures::future::BoxFuture;
use futures::task::{waker_ref, ArcWake};
use parking_lot::Mutex;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::Context;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// How often an idle worker checks whether its pool is shutting down.
const WORKER_POLL_INTERVAL: Duration = Duration::from_millis(50);

struct Task {
    future: Mutex<Option<BoxFuture<'static, ()>>>,
    queue: Sender<Arc<Task>>,
}

impl ArcWake for Task {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        // The pool may already be gone, in which case nobody will run the task.
        let _ = arc_self.queue.send(arc_self.clone());
    }
}

impl Task {
    fn run(self: &Arc<Self>) {
        let Some(mut slot) = self.future.try_lock() else {
            // Being polled on another thread; poll again once it is released.
            thread::yield_now();
            let _ = self.queue.send(self.clone());
            return;
        };

        if let Some(mut future) = slot.take() {
            let waker = waker_ref(self);
            let mut cx = Context::from_waker(&waker);
            match panic::catch_unwind(AssertUnwindSafe(|| future.as_mut().poll(&mut cx))) {
                Ok(poll) if poll.is_pending() => *slot = Some(future),
                Ok(_) => {}
                Err(_) => log::error!("An asset task panicked and was dropped."),
            }
        }
    }
}

/// A pool of named worker threads fed by a shared task queue.
///
/// Any thread may also help by calling [`Scheduler::run_pending`]. A pool with
/// zero workers runs tasks only on the threads that drive it, which makes the
/// interleaving of loads fully controllable.
pub struct WorkerPool {
    sender: Sender<Arc<Task>>,
    receiver: Receiver<Arc<Task>>,
    running: Arc<AtomicBool>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Creates a pool and starts its worker threads.
    pub fn new(config: WorkerPoolConfig) -> std::io::Result<Self> {
        let (sender, receiver) = flume::unbounded();
        let running = Arc::new(AtomicBool::new(true));

        let mut workers = Vec::with_capacity(config.worker_threads);
        for index in 0..config.worker_threads {
            let receiver: Receiver<Arc<Task>> = receiver.clone();
            let running = Arc::clone(&running);
            let worker = thread::Builder::new()
                .name(format!("{}-{}", config.thread_name, index))
                .spawn(move || {
                    log::trace!("Asset worker started.");
                    while running.load(Ordering::Relaxed) {
                        match receiver.recv_timeout(WORKER_POLL_INTERVAL) {
                            Ok(task) => task.run(),
                            Err(RecvTimeoutError::Timeout) => continue,
                            Err(RecvTimeoutError::Disconnected) => break,
                        }
                    }
                    log::trace!("Asset worker stopped.");
                })?;
            workers.push(worker);
        }

        log::debug!(
            "Worker pool '{}' started with {} threads.",
            config.thread_name,
            workers.len()
        );

        Ok(Self {
            sender,
            receiver,
            running,
            workers,
        })
    }

    /// Number of dedicated worker threads.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Number of tasks queued and waiting to be polled.
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }
}

impl Scheduler for WorkerPool {
    fn spawn(&self, task: BoxFuture<'static, ()>) {
        let task = Arc::new(Task {
            future: Mutex::new(Some(task)),
            queue: self.sender.clone(),
        });
        let _ = self.sender.send(task);
    }

    fn run_pending(&self) -> bool {
        match self.receiver.try_recv() {
            Ok(task) => {
                task.run();
                true
            }
            Err(_) => false,
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        let current = thread::current().id();
        for worker in self.workers.drain(..) {
            if worker.thread().id() == current {
                continue;
            }
            if worker.join().is_err() {
                log::error!("An asset worker thread panicked.");
            }
        }

        // Queued tasks hold a sender to this queue; release them explicitly.
        let abandoned = self.receiver.drain().count();
        if abandoned > 0 {
            log::warn!("Worker pool dropped with {} queued tasks.", abandoned);
        }
    }
}
