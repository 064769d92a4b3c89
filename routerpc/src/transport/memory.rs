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

//! In-memory transport for testing.
//!
//! [`pair`] produces two connected byte streams backed by Tokio's duplex
//! pipe. Each end can be handed to
//! [`Router::endpoint_from_stream`](crate::Router::endpoint_from_stream) to
//! wire two routers together without touching the network.

use tokio::io::DuplexStream;

/// Default buffer size for in-memory pipes (64 KiB).
pub const DEFAULT_PIPE_CAPACITY: usize = 64 * 1024;

/// Creates a connected pair of in-process byte streams.
///
/// Bytes written to one end are read from the other; closing either end is
/// observed as a clean end of stream by its peer.
///
/// # Example
///
/// ```rust
/// use routerpc::transport::memory;
/// use tokio::io::{AsyncReadExt, AsyncWriteExt};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let (mut left, mut right) = memory::pair();
/// left.write_all(b"over the pipe").await.unwrap();
///
/// let mut buffer = [0u8; 13];
/// right.read_exact(&mut buffer).await.unwrap();
/// assert_eq!(&buffer, b"over the pipe");
/// # }
/// ```
#[must_use]
pub fn pair() -> (DuplexStream, DuplexStream) {
    tokio::io::duplex(DEFAULT_PIPE_CAPACITY)
}

/// Creates a connected pair with an explicit buffer capacity.
///
/// A small capacity is useful for exercising backpressure in tests.
#[must_use]
pub fn pair_with_capacity(capacity: usize) -> (DuplexStream, DuplexStream) {
    tokio::io::duplex(capacity)
}
