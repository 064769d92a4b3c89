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

//! Codec layer error types.
//!
//! Decode failures are classified into three kinds because the router reacts
//! to each differently:
//!
//! - [`CodecError::Eof`] - the peer closed cleanly at a frame boundary; the
//!   endpoint terminates quietly.
//! - [`CodecError::Malformed`] - the frame header or body is inconsistent;
//!   fatal to the endpoint (logged, then closed).
//! - [`CodecError::Io`] - the underlying stream failed; fatal to the
//!   endpoint.

use std::io;
use thiserror::Error;

/// Errors produced while encoding or decoding frames.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The peer closed the stream cleanly at a frame boundary.
    ///
    /// This is the normal end of an endpoint's life, not a protocol failure.
    #[error("stream closed at frame boundary")]
    Eof,

    /// The frame header or body is inconsistent.
    ///
    /// A malformed frame leaves the stream position undefined, so the
    /// endpoint cannot recover and must be torn down.
    #[error("malformed frame: {reason}")]
    Malformed {
        /// Description of the inconsistency.
        reason: String,
    },

    /// The underlying stream failed while reading or writing a frame.
    #[error("frame I/O failed: {source}")]
    Io {
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl CodecError {
    /// Builds a [`CodecError::Malformed`] from a reason.
    #[must_use]
    pub fn malformed(reason: impl Into<String>) -> Self {
        CodecError::Malformed {
            reason: reason.into(),
        }
    }

    /// Returns `true` if the peer closed cleanly at a frame boundary.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self, CodecError::Eof)
    }

    /// Returns `true` if the frame itself was inconsistent.
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(self, CodecError::Malformed { .. })
    }
}

impl From<io::Error> for CodecError {
    fn from(error: io::Error) -> Self {
        CodecError::Io { source: error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eof_classification() {
        let error = CodecError::Eof;
        assert!(error.is_eof());
        assert!(!error.is_malformed());
    }

    #[test]
    fn test_malformed_classification() {
        let error = CodecError::malformed("length prefix exceeds maximum");
        assert!(!error.is_eof());
        assert!(error.is_malformed());
        assert!(error.to_string().contains("length prefix"));
    }

    #[test]
    fn test_io_from_conversion() {
        let error: CodecError = io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe").into();
        assert!(!error.is_eof());
        assert!(!error.is_malformed());
    }
}
