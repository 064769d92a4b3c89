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

//! Error types for the call layer.
//!
//! Every callback receives at most one [`CallError`]; on success the error
//! slot is empty and the payload slot is filled. The kinds mirror what a
//! caller can actually act on: retry later (`CallTimeout`), re-dial
//! (`EndpointGone`), give up (`Shutdown`), or investigate the peer
//! (`Codec` / `Io`).

use std::fmt;

/// Errors reported to callers through callbacks and [`crate::Router::call_wait`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    /// The deadline expired, or the outbound queue stayed full past the
    /// submit timeout.
    CallTimeout,

    /// The target endpoint was removed, never admitted, or lost mid-flight.
    EndpointGone {
        /// Name of the endpoint that is gone.
        name: String,
    },

    /// A frame could not be encoded or decoded.
    Codec {
        /// Description of the codec failure.
        reason: String,
    },

    /// The underlying stream failed while a request was in flight.
    Io {
        /// Description of the stream failure.
        reason: String,
    },

    /// The router is stopping; no new work is accepted.
    Shutdown,
}

impl CallError {
    /// Builds an [`CallError::EndpointGone`] for `name`.
    #[must_use]
    pub fn endpoint_gone(name: impl Into<String>) -> Self {
        CallError::EndpointGone { name: name.into() }
    }

    /// Returns `true` if the call timed out.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, CallError::CallTimeout)
    }

    /// Returns `true` if the target endpoint is gone.
    #[must_use]
    pub const fn is_endpoint_gone(&self) -> bool {
        matches!(self, CallError::EndpointGone { .. })
    }

    /// Returns `true` if the router is shutting down.
    #[must_use]
    pub const fn is_shutdown(&self) -> bool {
        matches!(self, CallError::Shutdown)
    }

    /// Returns `true` if retrying the call may succeed.
    ///
    /// Timeouts are retryable; a gone endpoint needs a new dial first and a
    /// shutdown router accepts nothing further.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, CallError::CallTimeout)
    }
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallError::CallTimeout => write!(f, "call timed out"),
            CallError::EndpointGone { name } => write!(f, "endpoint {:?} is gone", name),
            CallError::Codec { reason } => write!(f, "codec failure: {}", reason),
            CallError::Io { reason } => write!(f, "stream failure: {}", reason),
            CallError::Shutdown => write!(f, "router is shutting down"),
        }
    }
}

impl std::error::Error for CallError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_predicates() {
        let error = CallError::CallTimeout;
        assert!(error.is_timeout());
        assert!(error.is_recoverable());
        assert!(!error.is_endpoint_gone());
        assert!(!error.is_shutdown());
    }

    #[test]
    fn test_endpoint_gone_carries_name() {
        let error = CallError::endpoint_gone("upstream");
        assert!(error.is_endpoint_gone());
        assert!(!error.is_recoverable());
        assert!(error.to_string().contains("upstream"));
    }

    #[test]
    fn test_shutdown_is_terminal() {
        let error = CallError::Shutdown;
        assert!(error.is_shutdown());
        assert!(!error.is_recoverable());
    }
}
