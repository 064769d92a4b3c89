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

//! Byte-stream transports and the connection factory.
//!
//! A connection enters the router as a [`BoxedConnection`]: a type-erased
//! bidirectional stream produced by the [`Connector`] dial factory or by a
//! listener's accept loop. The boxed connection still implements Tokio's
//! `AsyncRead + AsyncWrite`, so a sieve that hijacks one can drive it
//! directly; when it becomes an endpoint instead,
//! [`into_split`](BoxedConnection::into_split) hands one half to the reader
//! worker and the other to the writer worker.
//!
//! Anything that implements `AsyncRead + AsyncWrite` can back a connection -
//! a TCP stream, an in-memory duplex pipe, or a custom transport. The
//! built-in [`TcpConnector`] handles the `"tcp"` network; [`memory::pair`]
//! builds connected in-process streams for tests.

mod error;
pub mod memory;
mod tcp;

pub use error::TransportError;
pub use tcp::{TcpConnector, bind};

use async_trait::async_trait;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// Boxed read half of a split connection.
pub type BoxedReadHalf = Box<dyn AsyncRead + Send + Unpin>;

/// Boxed write half of a split connection.
pub type BoxedWriteHalf = Box<dyn AsyncWrite + Send + Unpin>;

/// Splits any byte stream into boxed halves for endpoint workers.
///
/// # Example
///
/// ```rust
/// use routerpc::transport::split_stream;
///
/// let (client, _server) = tokio::io::duplex(1024);
/// let (_reader, _writer) = split_stream(client);
/// ```
#[must_use]
pub fn split_stream<C>(stream: C) -> (BoxedReadHalf, BoxedWriteHalf)
where
    C: AsyncRead + AsyncWrite + Send + 'static,
{
    let (reader, writer) = tokio::io::split(stream);
    (Box::new(reader), Box::new(writer))
}

/// A type-erased bidirectional byte-stream connection.
///
/// This is what a [`Connector`] produces and what a
/// [`ConnSieve`](crate::ConnSieve) is offered before an accepted connection
/// becomes a managed endpoint. It reads and writes like any Tokio stream, so
/// a hijacker can keep using it as a side channel regardless of the
/// underlying transport.
///
/// # Example
///
/// ```rust
/// use routerpc::transport::BoxedConnection;
/// use tokio::io::{AsyncReadExt, AsyncWriteExt};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let (left, mut right) = tokio::io::duplex(1024);
/// let mut conn = BoxedConnection::new(left);
///
/// conn.write_all(b"ping").await.unwrap();
/// let mut buffer = [0u8; 4];
/// right.read_exact(&mut buffer).await.unwrap();
/// assert_eq!(&buffer, b"ping");
/// # }
/// ```
pub struct BoxedConnection {
    reader: BoxedReadHalf,
    writer: BoxedWriteHalf,
}

impl BoxedConnection {
    /// Erases a concrete byte stream into a boxed connection.
    #[must_use]
    pub fn new<C>(stream: C) -> Self
    where
        C: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = split_stream(stream);
        Self { reader, writer }
    }

    /// Builds a connection from already-split halves.
    ///
    /// Transports with owned halves (like `TcpStream`) can avoid the
    /// overhead of a second split.
    #[must_use]
    pub fn from_halves(reader: BoxedReadHalf, writer: BoxedWriteHalf) -> Self {
        Self { reader, writer }
    }

    /// Splits the connection for an endpoint's reader and writer workers.
    #[must_use]
    pub fn into_split(self) -> (BoxedReadHalf, BoxedWriteHalf) {
        (self.reader, self.writer)
    }
}

impl AsyncRead for BoxedConnection {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.reader).poll_read(cx, buf)
    }
}

impl AsyncWrite for BoxedConnection {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.writer).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.writer).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.writer).poll_shutdown(cx)
    }
}

/// Factory for outbound byte-stream connections.
///
/// The router calls `connect` from [`dial`](crate::Router::dial); the core
/// does not parse addresses, it passes `network` and `address` through
/// verbatim.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Establishes a connection to `address` over `network`.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the network is unsupported or the
    /// connection cannot be established.
    async fn connect(
        &self,
        network: &str,
        address: &str,
    ) -> Result<BoxedConnection, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_split_stream_halves_are_connected() {
        let (client, server) = tokio::io::duplex(1024);
        let (mut client_read, mut client_write) = split_stream(client);
        let (mut server_read, mut server_write) = split_stream(server);

        client_write.write_all(b"ping").await.unwrap();
        let mut buffer = [0u8; 4];
        server_read.read_exact(&mut buffer).await.unwrap();
        assert_eq!(&buffer, b"ping");

        server_write.write_all(b"pong").await.unwrap();
        client_read.read_exact(&mut buffer).await.unwrap();
        assert_eq!(&buffer, b"pong");
    }

    #[tokio::test]
    async fn test_boxed_connection_is_bidirectional() {
        let (left, right) = tokio::io::duplex(1024);
        let mut conn = BoxedConnection::new(left);
        let mut peer = BoxedConnection::new(right);

        conn.write_all(b"over").await.unwrap();
        let mut buffer = [0u8; 4];
        peer.read_exact(&mut buffer).await.unwrap();
        assert_eq!(&buffer, b"over");

        peer.write_all(b"back").await.unwrap();
        conn.read_exact(&mut buffer).await.unwrap();
        assert_eq!(&buffer, b"back");
    }

    #[tokio::test]
    async fn test_boxed_connection_split_round_trip() {
        let (left, right) = tokio::io::duplex(1024);
        let conn = BoxedConnection::new(left);
        let (mut read_half, mut write_half) = conn.into_split();
        let mut peer = BoxedConnection::new(right);

        write_half.write_all(b"half").await.unwrap();
        let mut buffer = [0u8; 4];
        peer.read_exact(&mut buffer).await.unwrap();
        assert_eq!(&buffer, b"half");

        peer.write_all(b"also").await.unwrap();
        read_half.read_exact(&mut buffer).await.unwrap();
        assert_eq!(&buffer, b"also");
    }
}
