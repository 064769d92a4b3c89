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

//! Frame codec layer.
//!
//! The router core never looks inside a payload; it moves [`Envelope`]s. An
//! envelope carries the routing metadata the wire must preserve - the call
//! id, the rpc name, and the message kind - plus an opaque payload of the
//! codec's choosing.
//!
//! A [`Codec`] turns envelopes into self-delimiting frames on a byte stream
//! and back. Codecs are stateful and owned by a single worker; the
//! [`CodecFactory`] mints one per worker and hands out reusable scratch
//! buffers from the [`BufferPool`].
//!
//! The built-in [`JsonCodec`] (feature `serde`) frames envelopes as a 4-byte
//! big-endian length prefix followed by a JSON body.
//!
//! # Message Classification
//!
//! ```text
//! kind      rpc semantics        router behavior
//! -------   ------------------   ------------------------------------
//! Plain     none                 dispatched to the payload handler
//! Request   awaiting a reply     served, reply sent with the same id
//! Reply     resolves a request   matched against the call table by id
//! ```

mod buffer;
mod error;
#[cfg(feature = "serde")]
mod json;

pub use buffer::{BufferPool, PooledBuffer};
pub use error::CodecError;
#[cfg(feature = "serde")]
pub use json::{JsonCodec, JsonCodecFactory};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

/// Classification of a wire message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MessageKind {
    /// Fire-and-forget message; no reply is ever generated.
    #[default]
    Plain,
    /// Rpc request; the receiver serves it and replies with the same id.
    Request,
    /// Rpc reply; resolves the outstanding request with the matching id.
    Reply,
}

impl MessageKind {
    /// Returns `true` for [`MessageKind::Request`] and [`MessageKind::Reply`].
    #[must_use]
    pub const fn is_rpc(&self) -> bool {
        !matches!(self, MessageKind::Plain)
    }

    /// Returns `true` for [`MessageKind::Request`].
    #[must_use]
    pub const fn is_request(&self) -> bool {
        matches!(self, MessageKind::Request)
    }

    /// Returns `true` for [`MessageKind::Reply`].
    #[must_use]
    pub const fn is_reply(&self) -> bool {
        matches!(self, MessageKind::Reply)
    }
}

/// The wire-visible unit: routing metadata plus an opaque payload.
///
/// The codec must preserve `call_id` and `rpc_name` across the wire; the
/// request/reply correlation depends on them.
///
/// # Example
///
/// ```rust
/// use routerpc::codec::{Envelope, MessageKind};
///
/// let request: Envelope<String> = Envelope::request(7, "echo", Some("hi".to_string()));
/// assert!(request.kind.is_request());
///
/// let reply = Envelope::reply(7, "echo", Some("hi".to_string()));
/// assert_eq!(reply.call_id, request.call_id);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Envelope<P> {
    /// Router-assigned call identifier; 0 for plain messages.
    pub call_id: u64,
    /// Opaque rpc name; empty for plain messages.
    pub rpc_name: String,
    /// Message classification.
    pub kind: MessageKind,
    /// The payload, absent for null-payload replies.
    pub payload: Option<P>,
}

impl<P> Envelope<P> {
    /// Builds a fire-and-forget envelope.
    #[must_use]
    pub fn plain(payload: Option<P>) -> Self {
        Self {
            call_id: 0,
            rpc_name: String::new(),
            kind: MessageKind::Plain,
            payload,
        }
    }

    /// Builds an rpc-request envelope.
    #[must_use]
    pub fn request(call_id: u64, rpc_name: impl Into<String>, payload: Option<P>) -> Self {
        Self {
            call_id,
            rpc_name: rpc_name.into(),
            kind: MessageKind::Request,
            payload,
        }
    }

    /// Builds an rpc-reply envelope carrying the originating call id.
    #[must_use]
    pub fn reply(call_id: u64, rpc_name: impl Into<String>, payload: Option<P>) -> Self {
        Self {
            call_id,
            rpc_name: rpc_name.into(),
            kind: MessageKind::Reply,
            payload,
        }
    }
}

/// Stateful frame codec bound to one stream direction.
///
/// A codec instance is owned by exactly one reader or writer worker, so
/// implementations may keep per-stream state (scratch buffers, partial
/// headers) without synchronization.
#[async_trait]
pub trait Codec: Send + 'static {
    /// The payload type this codec carries.
    type Payload: Send + 'static;

    /// Reads one self-delimiting frame from `reader`.
    ///
    /// # Errors
    ///
    /// - [`CodecError::Eof`] when the peer closed cleanly at a frame boundary
    /// - [`CodecError::Malformed`] when the frame is inconsistent
    /// - [`CodecError::Io`] when the underlying read fails
    async fn decode(
        &mut self,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<Envelope<Self::Payload>, CodecError>;

    /// Writes one frame to `writer`, flushing it onto the wire.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Malformed`] if the envelope cannot be encoded
    /// and [`CodecError::Io`] if the underlying write fails.
    async fn encode(
        &mut self,
        writer: &mut (dyn AsyncWrite + Send + Unpin),
        envelope: &Envelope<Self::Payload>,
    ) -> Result<(), CodecError>;
}

/// Mints codecs and scratch buffers for endpoint workers.
///
/// Each endpoint draws two codecs from its factory - one for the reader, one
/// for the writer - so the two directions never share state.
pub trait CodecFactory<P>: Send + Sync + 'static {
    /// Produces a fresh codec bound to nothing yet.
    fn codec(&self) -> Box<dyn Codec<Payload = P>>;

    /// Checks a reusable scratch buffer out of the [`BufferPool`].
    fn scratch(&self) -> PooledBuffer {
        BufferPool::get(4096)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert!(!MessageKind::Plain.is_rpc());
        assert!(MessageKind::Request.is_rpc());
        assert!(MessageKind::Request.is_request());
        assert!(MessageKind::Reply.is_rpc());
        assert!(MessageKind::Reply.is_reply());
        assert!(!MessageKind::Reply.is_request());
    }

    #[test]
    fn test_plain_envelope_has_no_rpc_identity() {
        let envelope: Envelope<u32> = Envelope::plain(Some(1));
        assert_eq!(envelope.call_id, 0);
        assert!(envelope.rpc_name.is_empty());
        assert!(!envelope.kind.is_rpc());
    }

    #[test]
    fn test_reply_preserves_call_id() {
        let request: Envelope<u32> = Envelope::request(42, "sum", Some(3));
        let reply: Envelope<u32> = Envelope::reply(request.call_id, "sum", Some(6));
        assert_eq!(reply.call_id, 42);
        assert!(reply.kind.is_reply());
    }
}
