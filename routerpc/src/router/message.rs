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

//! The pooled route-message carrier.
//!
//! A [`RouteMessage`] wraps a payload with routing metadata and, for rpc
//! requests, the callback that resolves the call. Carriers are drawn from a
//! bounded [`Pool`] and reset before every reuse.
//!
//! A carrier is owned by exactly one holder at any moment: the free list,
//! the inbound or outbound queue, the call table, or a callback in flight.
//! Rust's move semantics enforce this; the pool only sees carriers whose
//! previous holder has released them.

use crate::codec::{Envelope, MessageKind};
use crate::pool::{Pool, Reclaim};
use crate::router::CallError;
use std::fmt;

/// One-shot completion callback for a call.
///
/// On success the payload is present and the error is absent; on failure the
/// payload is absent and the error names the reason. A null-payload reply
/// delivers `(None, None)`.
pub type RouteCallback<P> = Box<dyn FnOnce(Option<P>, Option<CallError>) + Send + 'static>;

/// Pooled carrier of a payload plus routing metadata.
///
/// For outbound messages `ep_name` is the destination; for inbound messages
/// it is the origin.
pub struct RouteMessage<P> {
    pub(crate) ep_name: String,
    pub(crate) rpc_name: String,
    pub(crate) call_id: u64,
    pub(crate) kind: MessageKind,
    pub(crate) payload: Option<P>,
    pub(crate) callback: Option<RouteCallback<P>>,
}

impl<P> RouteMessage<P> {
    /// Returns the endpoint name this message routes to or from.
    #[must_use]
    pub fn ep_name(&self) -> &str {
        &self.ep_name
    }

    /// Returns the opaque rpc name; empty for plain messages.
    #[must_use]
    pub fn rpc_name(&self) -> &str {
        &self.rpc_name
    }

    /// Returns the router-assigned call id; 0 until assignment.
    #[must_use]
    pub fn call_id(&self) -> u64 {
        self.call_id
    }

    /// Returns the message classification.
    #[must_use]
    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Builds an inbound carrier from a decoded envelope tagged with its
    /// origin endpoint.
    #[must_use]
    pub fn from_envelope(origin: &str, envelope: Envelope<P>) -> Self {
        let mut message = Self::empty();
        message.fill_from_envelope(origin, envelope);
        message
    }

    pub(crate) fn empty() -> Self {
        Self {
            ep_name: String::new(),
            rpc_name: String::new(),
            call_id: 0,
            kind: MessageKind::Plain,
            payload: None,
            callback: None,
        }
    }

    /// Fills a (recycled) carrier from a decoded envelope.
    pub(crate) fn fill_from_envelope(&mut self, origin: &str, envelope: Envelope<P>) {
        self.ep_name.push_str(origin);
        self.rpc_name.push_str(&envelope.rpc_name);
        self.call_id = envelope.call_id;
        self.kind = envelope.kind;
        self.payload = envelope.payload;
        self.callback = None;
    }

    /// Fills a (recycled) carrier for an outbound submission.
    ///
    /// The message is an rpc request iff `rpc_name` is nonempty.
    pub(crate) fn fill_outbound(
        &mut self,
        ep_name: &str,
        rpc_name: &str,
        payload: P,
        callback: Option<RouteCallback<P>>,
    ) {
        self.ep_name.push_str(ep_name);
        self.rpc_name.push_str(rpc_name);
        self.call_id = 0;
        self.kind = if rpc_name.is_empty() {
            MessageKind::Plain
        } else {
            MessageKind::Request
        };
        self.payload = Some(payload);
        self.callback = callback;
    }

    /// Fills a (recycled) carrier with the reply to a served request.
    pub(crate) fn fill_reply(
        &mut self,
        ep_name: &str,
        rpc_name: &str,
        call_id: u64,
        payload: Option<P>,
    ) {
        self.ep_name.push_str(ep_name);
        self.rpc_name.push_str(rpc_name);
        self.call_id = call_id;
        self.kind = MessageKind::Reply;
        self.payload = payload;
        self.callback = None;
    }

    /// Moves the payload out of the carrier.
    pub(crate) fn take_payload(&mut self) -> Option<P> {
        self.payload.take()
    }

    /// Moves the callback out of the carrier.
    pub(crate) fn take_callback(&mut self) -> Option<RouteCallback<P>> {
        self.callback.take()
    }
}

impl<P> Default for RouteMessage<P> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<P> Reclaim for RouteMessage<P> {
    fn reset(&mut self) {
        self.ep_name.clear();
        self.rpc_name.clear();
        self.call_id = 0;
        self.kind = MessageKind::Plain;
        self.payload = None;
        self.callback = None;
    }
}

impl<P> fmt::Debug for RouteMessage<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMessage")
            .field("ep_name", &self.ep_name)
            .field("rpc_name", &self.rpc_name)
            .field("call_id", &self.call_id)
            .field("kind", &self.kind)
            .field("payload", &self.payload.is_some())
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

/// Bounded free list of route-message carriers.
pub type MessagePool<P> = Pool<RouteMessage<P>>;

/// Converts decoded envelopes into origin-tagged carriers.
///
/// The router installs itself as the wrap policy on every endpoint it
/// constructs, drawing carriers from its message pool. An endpoint without a
/// policy falls back to freshly allocated carriers.
pub trait WrapPolicy<P>: Send + Sync {
    /// Wraps a decoded envelope into a carrier tagged with `origin`.
    fn wrap(&self, origin: &str, envelope: Envelope<P>) -> RouteMessage<P>;
}
