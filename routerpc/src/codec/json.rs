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

//! Length-prefixed JSON frame codec.
//!
//! # Protocol
//!
//! ```text
//! +-------------------+------------------+
//! | Length (4 bytes)  | JSON body (N)    |
//! +-------------------+------------------+
//! ```
//!
//! - **Length**: u32 in big-endian format, size of the body in bytes
//! - **Body**: the JSON-serialized [`Envelope`], rpc id and name included
//!
//! Frames above [`MAX_FRAME_SIZE`] are rejected on both paths. Decode
//! buffers are drawn from the [`BufferPool`].

use crate::codec::{BufferPool, Codec, CodecError, CodecFactory, Envelope};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io;
use std::marker::PhantomData;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Maximum frame size (16 MiB).
///
/// A length prefix above this value is treated as a malformed header rather
/// than an allocation request.
pub const MAX_FRAME_SIZE: u32 = 16 * 1024 * 1024;

/// Size of the frame length prefix in bytes.
const FRAME_HEADER_SIZE: usize = 4;

/// JSON codec for any serde-compatible payload type.
///
/// # Example
///
/// ```rust
/// use routerpc::codec::{Codec, Envelope, JsonCodec};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut codec: JsonCodec<String> = JsonCodec::new();
/// let mut wire = Vec::new();
///
/// let sent = Envelope::request(1, "echo", Some("hello".to_string()));
/// codec.encode(&mut wire, &sent).await.unwrap();
///
/// let mut reader = &wire[..];
/// let received = codec.decode(&mut reader).await.unwrap();
/// assert_eq!(received, sent);
/// # }
/// ```
#[derive(Debug)]
pub struct JsonCodec<P> {
    _payload: PhantomData<fn() -> P>,
}

impl<P> JsonCodec<P> {
    /// Creates a JSON codec.
    #[must_use]
    pub fn new() -> Self {
        Self {
            _payload: PhantomData,
        }
    }
}

impl<P> Default for JsonCodec<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<P> Codec for JsonCodec<P>
where
    P: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    type Payload = P;

    async fn decode(
        &mut self,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<Envelope<P>, CodecError> {
        let mut prefix = [0u8; FRAME_HEADER_SIZE];
        if let Err(e) = reader.read_exact(&mut prefix).await {
            // A close before the first header byte is a clean end of stream.
            return Err(if e.kind() == io::ErrorKind::UnexpectedEof {
                CodecError::Eof
            } else {
                CodecError::Io { source: e }
            });
        }

        let len = u32::from_be_bytes(prefix);
        if len > MAX_FRAME_SIZE {
            return Err(CodecError::malformed(format!(
                "length prefix {} exceeds maximum frame size {}",
                len, MAX_FRAME_SIZE
            )));
        }

        let mut body = BufferPool::get(len as usize);
        body.resize(len as usize);
        if let Err(e) = reader.read_exact(&mut body).await {
            return Err(if e.kind() == io::ErrorKind::UnexpectedEof {
                CodecError::malformed("stream closed inside a frame body")
            } else {
                CodecError::Io { source: e }
            });
        }

        serde_json::from_slice(&body)
            .map_err(|e| CodecError::malformed(format!("undecodable frame body: {}", e)))
    }

    async fn encode(
        &mut self,
        writer: &mut (dyn AsyncWrite + Send + Unpin),
        envelope: &Envelope<P>,
    ) -> Result<(), CodecError> {
        let body = serde_json::to_vec(envelope)
            .map_err(|e| CodecError::malformed(format!("unencodable envelope: {}", e)))?;

        if body.len() > MAX_FRAME_SIZE as usize {
            return Err(CodecError::malformed(format!(
                "frame size {} exceeds maximum frame size {}",
                body.len(),
                MAX_FRAME_SIZE
            )));
        }

        writer.write_all(&(body.len() as u32).to_be_bytes()).await?;
        writer.write_all(&body).await?;
        writer.flush().await?;
        Ok(())
    }
}

/// Factory producing [`JsonCodec`] instances.
///
/// # Example
///
/// ```rust
/// use routerpc::codec::{CodecFactory, JsonCodecFactory};
/// use std::sync::Arc;
///
/// let factory: Arc<JsonCodecFactory<serde_json::Value>> = Arc::new(JsonCodecFactory::new());
/// let _codec = factory.codec();
/// ```
#[derive(Debug)]
pub struct JsonCodecFactory<P> {
    _payload: PhantomData<fn() -> P>,
}

impl<P> JsonCodecFactory<P> {
    /// Creates a JSON codec factory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            _payload: PhantomData,
        }
    }
}

impl<P> Default for JsonCodecFactory<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> CodecFactory<P> for JsonCodecFactory<P>
where
    P: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn codec(&self) -> Box<dyn Codec<Payload = P>> {
        Box::new(JsonCodec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::MessageKind;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestPayload {
        id: u64,
        text: String,
    }

    fn sample(id: u64) -> TestPayload {
        TestPayload {
            id,
            text: "sample".to_string(),
        }
    }

    #[tokio::test]
    async fn test_encode_decode_request() {
        let mut codec: JsonCodec<TestPayload> = JsonCodec::new();
        let mut wire = Vec::new();

        let sent = Envelope::request(9, "lookup", Some(sample(9)));
        codec.encode(&mut wire, &sent).await.unwrap();

        let mut reader = &wire[..];
        let received = codec.decode(&mut reader).await.unwrap();
        assert_eq!(received, sent);
        assert_eq!(received.kind, MessageKind::Request);
    }

    #[tokio::test]
    async fn test_null_payload_reply_round_trips() {
        let mut codec: JsonCodec<TestPayload> = JsonCodec::new();
        let mut wire = Vec::new();

        let sent: Envelope<TestPayload> = Envelope::reply(3, "lookup", None);
        codec.encode(&mut wire, &sent).await.unwrap();

        let mut reader = &wire[..];
        let received = codec.decode(&mut reader).await.unwrap();
        assert_eq!(received.call_id, 3);
        assert!(received.payload.is_none());
    }

    #[tokio::test]
    async fn test_clean_close_is_eof() {
        let mut codec: JsonCodec<TestPayload> = JsonCodec::new();
        let mut reader: &[u8] = &[];
        let error = codec.decode(&mut reader).await.unwrap_err();
        assert!(error.is_eof());
    }

    #[tokio::test]
    async fn test_oversize_prefix_is_malformed() {
        let mut codec: JsonCodec<TestPayload> = JsonCodec::new();
        let wire = (MAX_FRAME_SIZE + 1).to_be_bytes();
        let mut reader = &wire[..];
        let error = codec.decode(&mut reader).await.unwrap_err();
        assert!(error.is_malformed());
    }

    #[tokio::test]
    async fn test_truncated_body_is_malformed() {
        let mut codec: JsonCodec<TestPayload> = JsonCodec::new();
        let mut wire = Vec::new();
        wire.extend_from_slice(&32u32.to_be_bytes());
        wire.extend_from_slice(b"short");
        let mut reader = &wire[..];
        let error = codec.decode(&mut reader).await.unwrap_err();
        assert!(error.is_malformed());
    }

    #[tokio::test]
    async fn test_garbage_body_is_malformed() {
        let mut codec: JsonCodec<TestPayload> = JsonCodec::new();
        let mut wire = Vec::new();
        wire.extend_from_slice(&4u32.to_be_bytes());
        wire.extend_from_slice(b"\xff\xfe\x00\x01");
        let mut reader = &wire[..];
        let error = codec.decode(&mut reader).await.unwrap_err();
        assert!(error.is_malformed());
    }

    #[tokio::test]
    async fn test_back_to_back_frames() {
        let mut codec: JsonCodec<TestPayload> = JsonCodec::new();
        let mut wire = Vec::new();

        for id in 1..=3 {
            let envelope = Envelope::request(id, "seq", Some(sample(id)));
            codec.encode(&mut wire, &envelope).await.unwrap();
        }

        let mut reader = &wire[..];
        for id in 1..=3 {
            let received = codec.decode(&mut reader).await.unwrap();
            assert_eq!(received.call_id, id);
        }
        assert!(codec.decode(&mut reader).await.unwrap_err().is_eof());
    }
}
