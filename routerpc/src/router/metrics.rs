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

//! Router metrics.
//!
//! Atomic counters updated by the coordinator loop, readable from any task
//! without synchronization. When the `observability` feature is enabled the
//! counters are mirrored to the `metrics` crate.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters for one router instance.
///
/// # Example
///
/// ```rust,no_run
/// # use routerpc::{Router, RouterMetrics};
/// # fn example<P: Send + 'static>(router: &Router<P>) {
/// let metrics = router.metrics();
/// assert_eq!(metrics.pending_calls(), 0);
/// # }
/// ```
#[derive(Debug, Default)]
pub struct RouterMetrics {
    /// Requests awaiting replies.
    pending_calls: AtomicU64,
    /// Endpoints currently admitted.
    endpoints: AtomicU64,
    /// Listeners currently admitted.
    listeners: AtomicU64,
    /// Envelopes handed to endpoint writers.
    messages_sent: AtomicU64,
    /// Route messages consumed from the inbound queue.
    messages_received: AtomicU64,
    /// Calls that completed with an error.
    calls_failed: AtomicU64,
}

impl RouterMetrics {
    /// Creates a zeroed metrics block.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_call_registered(&self) {
        self.pending_calls.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::gauge!("routerpc.calls.pending").increment(1.0);
    }

    pub(crate) fn record_call_resolved(&self) {
        self.pending_calls.fetch_sub(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::gauge!("routerpc.calls.pending").decrement(1.0);
    }

    pub(crate) fn record_call_failed(&self) {
        self.pending_calls.fetch_sub(1, Ordering::Relaxed);
        self.calls_failed.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        {
            metrics::gauge!("routerpc.calls.pending").decrement(1.0);
            metrics::counter!("routerpc.calls.failed").increment(1);
        }
    }

    pub(crate) fn record_endpoint_added(&self) {
        self.endpoints.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::gauge!("routerpc.endpoints.active").increment(1.0);
    }

    pub(crate) fn record_endpoint_removed(&self) {
        self.endpoints.fetch_sub(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::gauge!("routerpc.endpoints.active").decrement(1.0);
    }

    pub(crate) fn record_listener_added(&self) {
        self.listeners.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::gauge!("routerpc.listeners.active").increment(1.0);
    }

    pub(crate) fn record_listener_removed(&self) {
        self.listeners.fetch_sub(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::gauge!("routerpc.listeners.active").decrement(1.0);
    }

    pub(crate) fn record_message_sent(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("routerpc.messages.sent").increment(1);
    }

    pub(crate) fn record_message_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("routerpc.messages.received").increment(1);
    }

    /// Returns the number of requests currently awaiting replies.
    #[must_use]
    pub fn pending_calls(&self) -> u64 {
        self.pending_calls.load(Ordering::Relaxed)
    }

    /// Returns the number of admitted endpoints.
    #[must_use]
    pub fn endpoints(&self) -> u64 {
        self.endpoints.load(Ordering::Relaxed)
    }

    /// Returns the number of admitted listeners.
    #[must_use]
    pub fn listeners(&self) -> u64 {
        self.listeners.load(Ordering::Relaxed)
    }

    /// Returns the total envelopes handed to endpoint writers.
    #[must_use]
    pub fn messages_sent(&self) -> u64 {
        self.messages_sent.load(Ordering::Relaxed)
    }

    /// Returns the total route messages consumed from the inbound queue.
    #[must_use]
    pub fn messages_received(&self) -> u64 {
        self.messages_received.load(Ordering::Relaxed)
    }

    /// Returns the total calls that completed with an error.
    #[must_use]
    pub fn calls_failed(&self) -> u64 {
        self.calls_failed.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_gauge_tracks_lifecycle() {
        let metrics = RouterMetrics::new();
        metrics.record_call_registered();
        metrics.record_call_registered();
        assert_eq!(metrics.pending_calls(), 2);

        metrics.record_call_resolved();
        metrics.record_call_failed();
        assert_eq!(metrics.pending_calls(), 0);
        assert_eq!(metrics.calls_failed(), 1);
    }

    #[test]
    fn test_endpoint_and_listener_gauges() {
        let metrics = RouterMetrics::new();
        metrics.record_endpoint_added();
        metrics.record_listener_added();
        assert_eq!(metrics.endpoints(), 1);
        assert_eq!(metrics.listeners(), 1);

        metrics.record_endpoint_removed();
        metrics.record_listener_removed();
        assert_eq!(metrics.endpoints(), 0);
        assert_eq!(metrics.listeners(), 0);
    }

    #[test]
    fn test_message_counters_are_monotone() {
        let metrics = RouterMetrics::new();
        metrics.record_message_sent();
        metrics.record_message_sent();
        metrics.record_message_received();
        assert_eq!(metrics.messages_sent(), 2);
        assert_eq!(metrics.messages_received(), 1);
    }
}
