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

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

//! # RouterPC - RPC Transport and Routing Core
//!
//! RouterPC is a reusable RPC transport and routing core: a single
//! in-process coordinator (the [`Router`]) multiplexes many long-lived
//! byte-stream connections, carries framed messages over them, correlates
//! request/reply pairs by identifier, and dispatches inbound messages
//! either to an application-supplied handler or to a waiting caller.
//!
//! - **Single-owner coordination**: every mutation of the endpoint map, the
//!   listener map, and the call table happens on one logical actor; I/O
//!   fans out to per-connection workers
//! - **Named endpoints**: outbound connections by [`Router::dial`], inbound
//!   connections through [`Router::listen_and_serve`]
//! - **Three call shapes**: [`Router::call_wait`] blocks with a deadline,
//!   [`Router::call`] resolves through a one-shot callback, and
//!   [`Router::write`] is fire-and-forget
//! - **Pluggable codecs**: self-delimiting frames through an injected
//!   [`Codec`]/[`CodecFactory`]; the payload is opaque to the core
//! - **Pooled carriers**: route messages and waiters come from bounded free
//!   lists that keep allocator pressure flat under high fan-in
//!
//! ## Architecture
//!
//! RouterPC is organized into several layers:
//!
//! - **[`transport`]**: byte-stream connections (TCP, in-memory) and the
//!   dial factory
//! - **[`codec`]**: framed message encode/decode with scratch buffer
//!   pooling
//! - **[`endpoint`]**: one connection bound to a reader worker and a
//!   writer worker
//! - **[`router`]**: the coordinator loop, call table, waiters, and
//!   listeners
//! - **[`service`]**: the background-service harness shared by every loop
//!
//! ## Quick Start
//!
//! An echo service over loopback TCP:
//!
//! ```rust,no_run
//! use routerpc::{JsonCodecFactory, Router};
//! use serde_json::{Value, json};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let factory = Arc::new(JsonCodecFactory::new());
//!
//! // Server: reply with the request payload.
//! let server = Router::new(|_: &Router<Value>, _: &str, payload: Value| Some(payload));
//! server.run().await;
//! let addr = server
//!     .listen_and_serve("echo", "tcp", "127.0.0.1:0", factory.clone(), None)
//!     .await?;
//!
//! // Client: dial and call.
//! let client = Router::new(|_: &Router<Value>, _: &str, _: Value| None);
//! client.run().await;
//! client.dial("echo", "tcp", &addr.to_string(), factory).await?;
//!
//! let reply = client.call_wait("echo", "echo", json!({"id": 42}), 5).await?;
//! assert_eq!(reply, Some(json!({"id": 42})));
//!
//! client.stop().await;
//! server.stop().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Ordering Guarantees
//!
//! Writes issued to a single endpoint appear on the wire in submission
//! order. Inbound messages from a single endpoint reach the coordinator in
//! wire order. Across endpoints no ordering is guaranteed.
//!
//! ## Error Handling
//!
//! RouterPC layers its errors:
//!
//! - [`TransportError`]: connection establishment and binding
//! - [`CodecError`]: frame encoding and decoding
//! - [`CallError`]: what callers observe through callbacks
//!
//! [`RouterError`] composes the layers for multi-layer operations.
//!
//! ## Features
//!
//! - **`serde`** (default): the built-in length-prefixed JSON codec
//! - **`observability`**: `tracing` events and `metrics` counters
//!
//! ## Safety
//!
//! RouterPC is written in 100% safe Rust with `#![deny(unsafe_code)]`.
//! All concurrency is handled through Tokio's async runtime.

pub mod codec;
pub mod endpoint;
pub mod error;
pub mod pool;
pub mod router;
pub mod service;
pub mod transport;

pub use codec::{Codec, CodecError, CodecFactory, Envelope, MessageKind};
#[cfg(feature = "serde")]
pub use codec::{JsonCodec, JsonCodecFactory};
pub use endpoint::Endpoint;
pub use error::RouterError;
pub use router::{
    CallError, ConnSieve, Listener, RouteCallback, RouteMessage, Router, RouterBuilder,
    RouterMetrics, ServePayload, WrapPolicy,
};
pub use service::BackgroundService;
pub use transport::{BoxedConnection, Connector, TcpConnector, TransportError};
