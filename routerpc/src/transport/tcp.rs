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

//! TCP transport implementation.
//!
//! [`TcpConnector`] is the router's default dial factory, handling the
//! `"tcp"` network through Tokio's `TcpStream`. [`bind`] wraps listener
//! creation with the same error mapping for the server side.

use crate::transport::{BoxedConnection, Connector, TransportError};
use async_trait::async_trait;
use tokio::net::{TcpListener, TcpStream};

#[cfg(feature = "observability")]
use tracing::{error, info};

/// Dial factory for TCP connections.
///
/// `TCP_NODELAY` is enabled on every dialed stream: the router's frames are
/// small and latency-sensitive.
///
/// # Example
///
/// ```rust,no_run
/// use routerpc::transport::{Connector, TcpConnector};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let connector = TcpConnector::new();
/// let _conn = connector.connect("tcp", "127.0.0.1:8080").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct TcpConnector {
    _private: (),
}

impl TcpConnector {
    /// Creates a TCP connector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(
        &self,
        network: &str,
        address: &str,
    ) -> Result<BoxedConnection, TransportError> {
        if network != "tcp" {
            return Err(TransportError::UnsupportedNetwork {
                network: network.to_string(),
            });
        }

        let stream = TcpStream::connect(address).await.map_err(|e| {
            #[cfg(feature = "observability")]
            error!(address = %address, error = %e, "failed to connect");
            TransportError::ConnectionFailed {
                address: address.to_string(),
                source: e,
            }
        })?;

        let _ = stream.set_nodelay(true);

        #[cfg(feature = "observability")]
        info!(address = %address, "TCP connection established");

        let (reader, writer) = stream.into_split();
        Ok(BoxedConnection::from_halves(
            Box::new(reader),
            Box::new(writer),
        ))
    }
}

/// Binds a TCP listener for the server side of the router.
///
/// # Errors
///
/// Returns [`TransportError::BindFailed`] if the address cannot be bound.
///
/// # Example
///
/// ```rust,no_run
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let listener = routerpc::transport::bind("127.0.0.1:0").await?;
/// println!("listening on {}", listener.local_addr()?);
/// # Ok(())
/// # }
/// ```
pub async fn bind(address: &str) -> Result<TcpListener, TransportError> {
    let listener = TcpListener::bind(address).await.map_err(|e| {
        #[cfg(feature = "observability")]
        error!(address = %address, error = %e, "failed to bind");
        TransportError::BindFailed {
            address: address.to_string(),
            source: e,
        }
    })?;

    #[cfg(feature = "observability")]
    info!(address = %address, "TCP listener bound");

    Ok(listener)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_connect_and_echo() {
        let listener = bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buffer = [0u8; 5];
            stream.read_exact(&mut buffer).await.unwrap();
            stream.write_all(&buffer).await.unwrap();
        });

        let connector = TcpConnector::new();
        let mut conn = connector
            .connect("tcp", &addr.to_string())
            .await
            .unwrap();

        conn.write_all(b"hello").await.unwrap();
        let mut buffer = [0u8; 5];
        conn.read_exact(&mut buffer).await.unwrap();
        assert_eq!(&buffer, b"hello");
    }

    #[tokio::test]
    async fn test_unsupported_network() {
        let connector = TcpConnector::new();
        let result = connector.connect("udp", "127.0.0.1:1").await;
        assert!(matches!(
            result,
            Err(TransportError::UnsupportedNetwork { .. })
        ));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let connector = TcpConnector::new();
        let result = connector.connect("tcp", "127.0.0.1:1").await;
        match result {
            Err(TransportError::ConnectionFailed { address, .. }) => {
                assert_eq!(address, "127.0.0.1:1");
            }
            _ => panic!("expected ConnectionFailed"),
        }
    }
}
