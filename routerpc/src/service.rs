//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Background service harness with a uniform start/stop lifecycle.
//!
//! Every long-running loop in the crate - the router coordinator, listener
//! accept loops, endpoint reader and writer workers - runs under a
//! [`BackgroundService`]. The harness provides:
//!
//! - **Ready signaling**: [`BackgroundService::run`] spawns the loop and does
//!   not return until the loop has signaled readiness, so callers observe a
//!   fully initialized service.
//! - **Quit signaling**: [`BackgroundService::stop`] flips a watch flag that
//!   the loop observes through its [`QuitSignal`], then joins the task.
//! - **Once guards**: each service is started at most once and stopped at
//!   most once; redundant transitions are no-ops.
//!
//! A service that was started but never stopped is aborted when the harness
//! is dropped.
//!
//! # Example
//!
//! ```rust
//! use routerpc::service::BackgroundService;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let service = BackgroundService::new("ticker");
//!
//! service
//!     .run(|mut quit, ready| async move {
//!         ready.notify();
//!         quit.wait().await;
//!     })
//!     .await;
//!
//! service.stop().await;
//! # }
//! ```

use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

#[cfg(feature = "observability")]
use tracing::debug;

/// Receiver side of a service's quit flag.
///
/// The signal is cloneable so a service loop can hand copies to helper tasks
/// it spawns. Once set, the flag never clears.
#[derive(Debug, Clone)]
pub struct QuitSignal {
    rx: watch::Receiver<bool>,
}

impl QuitSignal {
    /// Waits until the quit flag is raised.
    ///
    /// Also returns if the owning [`BackgroundService`] was dropped, so a
    /// loop never outlives its harness.
    pub async fn wait(&mut self) {
        loop {
            if *self.rx.borrow() {
                return;
            }
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Returns `true` if the quit flag has been raised.
    #[must_use]
    pub fn is_set(&self) -> bool {
        *self.rx.borrow()
    }
}

/// One-shot readiness notifier handed to a service loop.
///
/// The loop calls [`ReadySignal::notify`] once its setup is complete; until
/// then [`BackgroundService::run`] keeps the caller suspended.
#[derive(Debug)]
pub struct ReadySignal {
    tx: Option<oneshot::Sender<()>>,
}

impl ReadySignal {
    /// Signals that the service loop has finished initializing.
    pub fn notify(mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Uniform start/stop lifecycle wrapper for a single service loop.
///
/// See the [module documentation](self) for the lifecycle contract.
#[derive(Debug)]
pub struct BackgroundService {
    name: String,
    quit_tx: watch::Sender<bool>,
    quit_rx: watch::Receiver<bool>,
    handle: Mutex<Option<JoinHandle<()>>>,
    started: AtomicBool,
    stopped: AtomicBool,
}

impl BackgroundService {
    /// Creates a harness for a service loop identified by `name`.
    ///
    /// The name only appears in logs.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let (quit_tx, quit_rx) = watch::channel(false);
        Self {
            name: name.into(),
            quit_tx,
            quit_rx,
            handle: Mutex::new(None),
            started: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
        }
    }

    /// Returns the service name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Spawns the service loop and waits for it to signal readiness.
    ///
    /// Returns `false` without spawning anything if the service was already
    /// started. If the loop exits before notifying readiness, `run` returns
    /// normally; the exit will be observed by [`stop`](Self::stop).
    pub async fn run<F, Fut>(&self, f: F) -> bool
    where
        F: FnOnce(QuitSignal, ReadySignal) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }

        let (ready_tx, ready_rx) = oneshot::channel();
        let quit = QuitSignal {
            rx: self.quit_rx.clone(),
        };
        let ready = ReadySignal { tx: Some(ready_tx) };

        let task = tokio::spawn(f(quit, ready));
        *self.handle.lock() = Some(task);

        #[cfg(feature = "observability")]
        debug!(service = %self.name, "service started");

        // Either the loop notified readiness or it died; both unblock us.
        let _ = ready_rx.await;
        true
    }

    /// Raises the quit flag and joins the service loop.
    ///
    /// Returns `false` if the service was already stopped.
    pub async fn stop(&self) -> bool {
        if self
            .stopped
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }

        let _ = self.quit_tx.send(true);
        let task = self.handle.lock().take();
        if let Some(task) = task {
            let _ = task.await;
        }

        #[cfg(feature = "observability")]
        debug!(service = %self.name, "service stopped");
        true
    }
}

impl Drop for BackgroundService {
    fn drop(&mut self) {
        // A loop that was never joined must not outlive its harness.
        if let Some(task) = self.handle.lock().take() {
            task.abort();
        }
    }
}
