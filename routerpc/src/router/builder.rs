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

//! Router construction.

use crate::router::{Router, ServePayload};
use crate::transport::{Connector, TcpConnector};
use std::sync::Arc;
use std::time::Duration;

/// Tunable router parameters with their defaults.
#[derive(Debug, Clone)]
pub(crate) struct RouterConfig {
    /// Capacity of the shared inbound and outbound message queues.
    pub(crate) message_queue_capacity: usize,
    /// Capacity of each endpoint's private outbound queue.
    pub(crate) endpoint_queue_capacity: usize,
    /// Capacity of the route-message and waiter pools.
    pub(crate) pool_capacity: usize,
    /// Bound for the second attempt of a queue submission.
    pub(crate) submit_timeout: Duration,
    /// Deadline applied when `call_wait` is given a zero timeout.
    pub(crate) default_call_timeout: Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            message_queue_capacity: 5120,
            endpoint_queue_capacity: 1024,
            pool_capacity: 5120,
            submit_timeout: Duration::from_millis(500),
            default_call_timeout: Duration::from_secs(300),
        }
    }
}

/// Builder for a [`Router`].
///
/// # Example
///
/// ```rust
/// use routerpc::{Router, RouterBuilder};
/// use serde_json::Value;
/// use std::time::Duration;
///
/// let router: Router<Value> = RouterBuilder::new(
///     |_: &Router<Value>, _: &str, payload: Value| Some(payload),
/// )
/// .with_endpoint_queue_capacity(256)
/// .with_submit_timeout(Duration::from_millis(100))
/// .build();
/// ```
pub struct RouterBuilder<P> {
    handler: Arc<dyn ServePayload<P>>,
    connector: Arc<dyn Connector>,
    config: RouterConfig,
}

impl<P: Send + 'static> RouterBuilder<P> {
    /// Starts a builder around the application's payload handler.
    #[must_use]
    pub fn new(handler: impl ServePayload<P>) -> Self {
        Self {
            handler: Arc::new(handler),
            connector: Arc::new(TcpConnector::new()),
            config: RouterConfig::default(),
        }
    }

    /// Replaces the dial factory (defaults to [`TcpConnector`]).
    #[must_use]
    pub fn with_connector(mut self, connector: impl Connector) -> Self {
        self.connector = Arc::new(connector);
        self
    }

    /// Sets the capacity of the shared inbound and outbound queues.
    #[must_use]
    pub fn with_message_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.message_queue_capacity = capacity.max(1);
        self
    }

    /// Sets the capacity of each endpoint's private outbound queue.
    #[must_use]
    pub fn with_endpoint_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.endpoint_queue_capacity = capacity.max(1);
        self
    }

    /// Sets the capacity of the carrier and waiter pools.
    #[must_use]
    pub fn with_pool_capacity(mut self, capacity: usize) -> Self {
        self.config.pool_capacity = capacity;
        self
    }

    /// Sets the bound for the second attempt of a queue submission.
    #[must_use]
    pub fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.config.submit_timeout = timeout;
        self
    }

    /// Sets the deadline used when `call_wait` is given a zero timeout.
    #[must_use]
    pub fn with_default_call_timeout(mut self, timeout: Duration) -> Self {
        self.config.default_call_timeout = timeout;
        self
    }

    /// Builds the router.
    ///
    /// The router is inert until [`Router::run`](crate::Router::run) starts
    /// its coordinator.
    #[must_use]
    pub fn build(self) -> Router<P> {
        Router::assemble(self.handler, self.connector, self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = RouterConfig::default();
        assert_eq!(config.message_queue_capacity, 5120);
        assert_eq!(config.endpoint_queue_capacity, 1024);
        assert_eq!(config.pool_capacity, 5120);
        assert_eq!(config.submit_timeout, Duration::from_millis(500));
        assert_eq!(config.default_call_timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_capacities_are_clamped_to_one() {
        let builder = RouterBuilder::new(|_: &Router<u32>, _: &str, p: u32| Some(p))
            .with_message_queue_capacity(0)
            .with_endpoint_queue_capacity(0);
        assert_eq!(builder.config.message_queue_capacity, 1);
        assert_eq!(builder.config.endpoint_queue_capacity, 1);
    }
}
