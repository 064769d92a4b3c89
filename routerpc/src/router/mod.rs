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

//! The router: single-owner coordination over many endpoints.
//!
//! A [`Router`] multiplexes long-lived byte-stream connections, correlates
//! request/reply pairs by id, and dispatches inbound messages either to the
//! application's [`ServePayload`] handler or to a waiting caller.
//!
//! # Architecture
//!
//! All router state - the endpoint map, the listener map, the call table,
//! and the id counter - is owned by a single coordinator task. Public
//! operations never touch that state directly; they enqueue work onto
//! dedicated channels that the coordinator selects over:
//!
//! ```text
//! dial/accept ----> endpoint admission --+
//! del_endpoint ---> endpoint removal ----+
//! listen ---------> listener admission --+--> coordinator --> endpoint
//! del_listener ---> listener removal ----+      loop           writers
//! call/write -----> outbound queue ------+
//! readers --------> inbound queue -------+
//! stop -----------> quit ----------------+
//! ```
//!
//! Queue submissions try immediately and then retry once bounded by the
//! submit timeout, so a wedged consumer cannot deadlock its producers.
//! Callbacks and handler invocations always run on fresh tasks; the
//! coordinator never blocks on user code.
//!
//! # Synchronous and asynchronous calls
//!
//! [`Router::call`] delivers the reply through a one-shot callback.
//! [`Router::call_wait`] parks the caller on a pooled waiter with a
//! deadline. [`Router::write`] is fire-and-forget. All three share the same
//! outbound path; a call is an rpc request iff its rpc name is nonempty.

mod builder;
mod calls;
mod coordinator;
mod error;
mod listener;
mod message;
mod metrics;
#[allow(clippy::module_inception)]
mod router;
mod waiter;

pub use builder::RouterBuilder;
pub use error::CallError;
pub use listener::Listener;
pub use message::{MessagePool, RouteCallback, RouteMessage, WrapPolicy};
pub use metrics::RouterMetrics;
pub use router::Router;

pub(crate) use builder::RouterConfig;
pub(crate) use calls::CallTable;
pub(crate) use waiter::WaiterPool;

use crate::transport::BoxedConnection;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{SendTimeoutError, TrySendError};

/// Application handler for inbound payloads.
///
/// Invoked on a fresh task for every inbound rpc request and plain message,
/// with the name of the endpoint the message arrived on. For a request, the
/// returned payload is sent back as the reply; `None` produces a
/// null-payload reply carrying the original id. For a plain message the
/// return value is ignored.
///
/// Any `Fn(&Router<P>, &str, P) -> Option<P>` closure is a handler:
///
/// ```rust
/// use routerpc::Router;
/// use serde_json::Value;
///
/// // An echo service.
/// let router = Router::new(|_: &Router<Value>, _: &str, payload: Value| Some(payload));
/// ```
#[async_trait]
pub trait ServePayload<P: Send + 'static>: Send + Sync + 'static {
    /// Serves one inbound payload from `origin`.
    async fn serve(&self, router: &Router<P>, origin: &str, payload: P) -> Option<P>;
}

#[async_trait]
impl<P, F> ServePayload<P> for F
where
    P: Send + 'static,
    F: Fn(&Router<P>, &str, P) -> Option<P> + Send + Sync + 'static,
{
    async fn serve(&self, router: &Router<P>, origin: &str, payload: P) -> Option<P> {
        self(router, origin, payload)
    }
}

/// Connection-level sieve for listeners.
///
/// Each accepted connection is offered to the sieve as a type-erased
/// [`BoxedConnection`] before it becomes a managed endpoint. Returning
/// `None` hijacks the connection: the listener forgets it and the sieve is
/// its new owner, free to keep driving the stream as a side channel.
/// Returning `Some` hands the connection back for normal endpoint
/// construction.
pub trait ConnSieve<P>: Send + Sync + 'static {
    /// Inspects an accepted connection; `None` means taken.
    fn inspect(&self, router: &Router<P>, conn: BoxedConnection) -> Option<BoxedConnection>;
}

impl<P, F> ConnSieve<P> for F
where
    F: Fn(&Router<P>, BoxedConnection) -> Option<BoxedConnection> + Send + Sync + 'static,
{
    fn inspect(&self, router: &Router<P>, conn: BoxedConnection) -> Option<BoxedConnection> {
        self(router, conn)
    }
}

/// Failure modes of a bounded queue submission.
pub(crate) enum SubmitError<T> {
    /// The queue stayed full past the submit timeout.
    Timeout(T),
    /// The consumer is gone.
    Closed(T),
}

/// Submits to a bounded queue: try immediately, then once more bounded by
/// `timeout`. The value is handed back on failure so the caller can reclaim
/// it.
pub(crate) async fn submit<T>(
    tx: &mpsc::Sender<T>,
    value: T,
    timeout: Duration,
) -> Result<(), SubmitError<T>> {
    match tx.try_send(value) {
        Ok(()) => Ok(()),
        Err(TrySendError::Closed(value)) => Err(SubmitError::Closed(value)),
        Err(TrySendError::Full(value)) => match tx.send_timeout(value, timeout).await {
            Ok(()) => Ok(()),
            Err(SendTimeoutError::Timeout(value)) => Err(SubmitError::Timeout(value)),
            Err(SendTimeoutError::Closed(value)) => Err(SubmitError::Closed(value)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_submit_succeeds_with_room() {
        let (tx, mut rx) = mpsc::channel(1);
        assert!(submit(&tx, 1u32, Duration::from_millis(10)).await.is_ok());
        assert_eq!(rx.recv().await, Some(1));
    }

    #[tokio::test]
    async fn test_submit_times_out_when_full() {
        let (tx, _rx) = mpsc::channel(1);
        tx.try_send(0u32).unwrap();
        match submit(&tx, 1, Duration::from_millis(10)).await {
            Err(SubmitError::Timeout(value)) => assert_eq!(value, 1),
            _ => panic!("expected timeout"),
        }
    }

    #[tokio::test]
    async fn test_submit_reports_closed() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        match submit(&tx, 1u32, Duration::from_millis(10)).await {
            Err(SubmitError::Closed(value)) => assert_eq!(value, 1),
            _ => panic!("expected closed"),
        }
    }

    #[tokio::test]
    async fn test_submit_retry_drains_through() {
        let (tx, mut rx) = mpsc::channel(1);
        tx.try_send(0u32).unwrap();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            rx.recv().await;
            rx.recv().await;
        });

        assert!(submit(&tx, 1, Duration::from_millis(500)).await.is_ok());
    }
}
