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

//! Top-level error type.
//!
//! The crate layers its errors the way the router layers its work:
//!
//! 1. **Transport**: connection establishment and socket binding
//!    ([`TransportError`])
//! 2. **Codec**: frame encoding and decoding ([`CodecError`])
//! 3. **Call**: what callers observe through callbacks ([`CallError`])
//!
//! [`RouterError`] composes the three for operations like
//! [`dial`](crate::Router::dial) that can fail at more than one layer.

use crate::codec::CodecError;
use crate::router::CallError;
use crate::transport::TransportError;
use std::error::Error as StdError;
use std::fmt;

/// Top-level error for router operations.
#[derive(Debug)]
pub enum RouterError {
    /// A transport-layer error occurred.
    ///
    /// The connection could not be established or the server socket could
    /// not be bound.
    Transport(TransportError),

    /// A codec-layer error occurred.
    ///
    /// A frame could not be encoded or decoded.
    Codec(CodecError),

    /// A call-layer error occurred.
    ///
    /// A queue submission timed out or the router has stopped.
    Call(CallError),
}

impl RouterError {
    /// Returns `true` if this is a transport error.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns `true` if this is a codec error.
    #[must_use]
    pub const fn is_codec(&self) -> bool {
        matches!(self, Self::Codec(_))
    }

    /// Returns `true` if this is a call error.
    #[must_use]
    pub const fn is_call(&self) -> bool {
        matches!(self, Self::Call(_))
    }

    /// Returns `true` if the router has stopped.
    #[must_use]
    pub const fn is_shutdown(&self) -> bool {
        matches!(self, Self::Call(CallError::Shutdown))
    }
}

impl fmt::Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport error: {}", e),
            Self::Codec(e) => write!(f, "codec error: {}", e),
            Self::Call(e) => write!(f, "call error: {}", e),
        }
    }
}

impl StdError for RouterError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            Self::Codec(e) => Some(e),
            Self::Call(e) => Some(e),
        }
    }
}

impl From<TransportError> for RouterError {
    fn from(error: TransportError) -> Self {
        Self::Transport(error)
    }
}

impl From<CodecError> for RouterError {
    fn from(error: CodecError) -> Self {
        Self::Codec(error)
    }
}

impl From<CallError> for RouterError {
    fn from(error: CallError) -> Self {
        Self::Call(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_layer_predicates() {
        let transport: RouterError = TransportError::UnsupportedNetwork {
            network: "udp".to_string(),
        }
        .into();
        assert!(transport.is_transport());
        assert!(!transport.is_codec());
        assert!(!transport.is_call());

        let codec: RouterError = CodecError::Eof.into();
        assert!(codec.is_codec());

        let call: RouterError = CallError::Shutdown.into();
        assert!(call.is_call());
        assert!(call.is_shutdown());
    }

    #[test]
    fn test_display_names_the_layer() {
        let error: RouterError = CallError::CallTimeout.into();
        assert!(error.to_string().contains("call error"));
    }

    #[test]
    fn test_source_is_preserved() {
        let error: RouterError = TransportError::Io {
            source: io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"),
        }
        .into();
        assert!(error.source().is_some());
    }
}
