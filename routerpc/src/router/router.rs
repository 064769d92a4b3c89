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

//! The public router handle.

use crate::codec::{CodecFactory, Envelope};
use crate::endpoint::Endpoint;
use crate::error::RouterError;
use crate::router::coordinator::{self, CoordinatorChannels};
use crate::router::{
    CallError, ConnSieve, Listener, MessagePool, RouteCallback, RouteMessage, RouterConfig,
    RouterMetrics, ServePayload, SubmitError, WaiterPool, WrapPolicy, submit,
};
use crate::service::BackgroundService;
use crate::transport::{BoxedReadHalf, BoxedWriteHalf, Connector, split_stream};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;

#[cfg(feature = "observability")]
use tracing::warn;

/// Capacity of the endpoint admission queue.
const ENDPOINT_ADMISSION_CAPACITY: usize = 32;
/// Capacity of the endpoint removal queue.
const ENDPOINT_REMOVAL_CAPACITY: usize = 128;
/// Capacity of the listener admission queue.
const LISTENER_ADMISSION_CAPACITY: usize = 4;
/// Capacity of the listener removal queue.
const LISTENER_REMOVAL_CAPACITY: usize = 16;

pub(crate) struct RouterShared<P> {
    pub(crate) service: BackgroundService,
    pub(crate) handler: Arc<dyn ServePayload<P>>,
    pub(crate) connector: Arc<dyn Connector>,
    pub(crate) config: RouterConfig,
    pub(crate) metrics: Arc<RouterMetrics>,
    pub(crate) messages: MessagePool<P>,
    pub(crate) waiters: WaiterPool<P>,
    pub(crate) out_tx: mpsc::Sender<RouteMessage<P>>,
    pub(crate) in_tx: mpsc::Sender<RouteMessage<P>>,
    pub(crate) ep_in_tx: mpsc::Sender<Endpoint<P>>,
    pub(crate) ep_out_tx: mpsc::Sender<String>,
    pub(crate) l_in_tx: mpsc::Sender<Listener<P>>,
    pub(crate) l_out_tx: mpsc::Sender<String>,
    pub(crate) channels: Mutex<Option<CoordinatorChannels<P>>>,
}

/// A multiplexing RPC router.
///
/// The handle is cheap to clone and safe to share across tasks; all state
/// lives behind the coordinator loop. See the [module
/// documentation](crate::router) for the architecture.
///
/// # Example
///
/// ```rust,no_run
/// use routerpc::{JsonCodecFactory, Router};
/// use serde_json::{Value, json};
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// // A server router that echoes every request.
/// let server = Router::new(|_: &Router<Value>, _: &str, payload: Value| Some(payload));
/// server.run().await;
/// let factory = Arc::new(JsonCodecFactory::new());
/// let addr = server
///     .listen_and_serve("srv", "tcp", "127.0.0.1:0", factory.clone(), None)
///     .await?;
///
/// // A client router dialing it.
/// let client = Router::new(|_: &Router<Value>, _: &str, _: Value| None);
/// client.run().await;
/// client.dial("srv", "tcp", &addr.to_string(), factory).await?;
///
/// let reply = client
///     .call_wait("srv", "echo", json!({"id": 42}), 5)
///     .await?;
/// assert_eq!(reply, Some(json!({"id": 42})));
///
/// client.stop().await;
/// server.stop().await;
/// # Ok(())
/// # }
/// ```
pub struct Router<P> {
    shared: Arc<RouterShared<P>>,
}

impl<P> Clone for Router<P> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<P: Send + 'static> Router<P> {
    /// Creates a router with default configuration around `handler`.
    ///
    /// Use [`RouterBuilder`](crate::RouterBuilder) to tune queue capacities,
    /// timeouts, or the dial factory.
    #[must_use]
    pub fn new(handler: impl ServePayload<P>) -> Self {
        crate::router::RouterBuilder::new(handler).build()
    }

    pub(crate) fn assemble(
        handler: Arc<dyn ServePayload<P>>,
        connector: Arc<dyn Connector>,
        config: RouterConfig,
    ) -> Self {
        let (out_tx, out_rx) = mpsc::channel(config.message_queue_capacity);
        let (in_tx, in_rx) = mpsc::channel(config.message_queue_capacity);
        let (ep_in_tx, ep_in_rx) = mpsc::channel(ENDPOINT_ADMISSION_CAPACITY);
        let (ep_out_tx, ep_out_rx) = mpsc::channel(ENDPOINT_REMOVAL_CAPACITY);
        let (l_in_tx, l_in_rx) = mpsc::channel(LISTENER_ADMISSION_CAPACITY);
        let (l_out_tx, l_out_rx) = mpsc::channel(LISTENER_REMOVAL_CAPACITY);

        let pool_capacity = config.pool_capacity;
        Self {
            shared: Arc::new(RouterShared {
                service: BackgroundService::new("router"),
                handler,
                connector,
                config,
                metrics: Arc::new(RouterMetrics::new()),
                messages: MessagePool::new(pool_capacity),
                waiters: WaiterPool::new(pool_capacity),
                out_tx,
                in_tx,
                ep_in_tx,
                ep_out_tx,
                l_in_tx,
                l_out_tx,
                channels: Mutex::new(Some(CoordinatorChannels {
                    ep_in_rx,
                    ep_out_rx,
                    l_in_rx,
                    l_out_rx,
                    out_rx,
                    in_rx,
                })),
            }),
        }
    }

    /// Starts the coordinator loop.
    ///
    /// Returns once the coordinator is ready; starting twice is a no-op.
    pub async fn run(&self) {
        let channels = self.shared.channels.lock().take();
        if let Some(channels) = channels {
            let router = self.clone();
            self.shared
                .service
                .run(|quit, ready| coordinator::run(router, channels, quit, ready))
                .await;
        }
    }

    /// Stops the coordinator and every owned endpoint and listener.
    ///
    /// Outstanding calls fail with [`CallError::Shutdown`]; in-flight
    /// callbacks are allowed to complete. Idempotent.
    pub async fn stop(&self) {
        self.shared.service.stop().await;
    }

    /// Returns the router's live metrics.
    #[must_use]
    pub fn metrics(&self) -> &RouterMetrics {
        &self.shared.metrics
    }

    /// Establishes an outbound connection and submits the endpoint for
    /// admission under `name`.
    ///
    /// Duplicate names are accepted here but silently dropped at admission:
    /// the first endpoint with a given name wins.
    ///
    /// # Errors
    ///
    /// Returns the transport error when the connection cannot be
    /// established, or a call error when the admission queue is stuck or
    /// the router has stopped.
    pub async fn dial(
        &self,
        name: &str,
        network: &str,
        address: &str,
        factory: Arc<dyn CodecFactory<P>>,
    ) -> Result<(), RouterError> {
        let conn = self.shared.connector.connect(network, address).await?;
        let (read_half, write_half) = conn.into_split();
        let endpoint = self.endpoint_from_halves(name.to_string(), read_half, write_half, &factory);
        self.add_endpoint(endpoint).await
    }

    /// Binds a server socket and submits a listener for admission under
    /// `name`.
    ///
    /// Endpoints produced by the accept loop are named after the listener,
    /// so with first-writer-wins admission only the first connection per
    /// listener becomes a managed endpoint. The optional `sieve` may hijack
    /// accepted connections before endpoint construction.
    ///
    /// Returns the bound address, which is useful with a `:0` port.
    ///
    /// # Errors
    ///
    /// Returns the transport error when the bind fails or the network is
    /// not `"tcp"`, or a call error when the admission queue is stuck or
    /// the router has stopped.
    pub async fn listen_and_serve(
        &self,
        name: &str,
        network: &str,
        address: &str,
        factory: Arc<dyn CodecFactory<P>>,
        sieve: Option<Arc<dyn ConnSieve<P>>>,
    ) -> Result<SocketAddr, RouterError> {
        if network != "tcp" {
            return Err(RouterError::Transport(
                crate::transport::TransportError::UnsupportedNetwork {
                    network: network.to_string(),
                },
            ));
        }

        let socket = crate::transport::bind(address).await?;
        let listener = Listener::new(name.to_string(), socket, factory, sieve, self.clone())
            .map_err(RouterError::Transport)?;
        let local_addr = listener.local_addr();
        self.add_listener(listener).await?;
        Ok(local_addr)
    }

    /// Builds an endpoint from any byte stream.
    ///
    /// The endpoint is inert until admitted with
    /// [`add_endpoint`](Self::add_endpoint). This is how in-memory streams
    /// from [`transport::memory`](crate::transport::memory) become
    /// endpoints in tests.
    pub fn endpoint_from_stream<C>(
        &self,
        name: impl Into<String>,
        stream: C,
        factory: &Arc<dyn CodecFactory<P>>,
    ) -> Endpoint<P>
    where
        C: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read_half, write_half) = split_stream(stream);
        self.endpoint_from_halves(name.into(), read_half, write_half, factory)
    }

    pub(crate) fn endpoint_from_halves(
        &self,
        name: String,
        read_half: BoxedReadHalf,
        write_half: BoxedWriteHalf,
        factory: &Arc<dyn CodecFactory<P>>,
    ) -> Endpoint<P> {
        Endpoint::new(
            name,
            read_half,
            write_half,
            factory,
            self.shared.in_tx.clone(),
            self.shared.ep_out_tx.clone(),
            Some(Arc::new(self.clone())),
            self.shared.config.endpoint_queue_capacity,
            self.shared.config.submit_timeout,
        )
    }

    /// Submits an endpoint for admission.
    ///
    /// The coordinator starts the endpoint once admitted; on a name
    /// collision the newcomer is silently dropped and closed.
    ///
    /// # Errors
    ///
    /// Returns a call error when the admission queue is stuck past the
    /// submit timeout or the router has stopped.
    pub async fn add_endpoint(&self, endpoint: Endpoint<P>) -> Result<(), RouterError> {
        match submit(
            &self.shared.ep_in_tx,
            endpoint,
            self.shared.config.submit_timeout,
        )
        .await
        {
            Ok(()) => Ok(()),
            Err(SubmitError::Timeout(_)) => Err(RouterError::Call(CallError::CallTimeout)),
            Err(SubmitError::Closed(_)) => Err(RouterError::Call(CallError::Shutdown)),
        }
    }

    /// Requests removal of the endpoint named `name`.
    ///
    /// Removal of an absent name is a no-op. Outstanding calls to the
    /// endpoint fail with [`CallError::EndpointGone`].
    ///
    /// # Errors
    ///
    /// Returns a call error when the removal queue is stuck past the submit
    /// timeout or the router has stopped.
    pub async fn del_endpoint(&self, name: &str) -> Result<(), RouterError> {
        match submit(
            &self.shared.ep_out_tx,
            name.to_string(),
            self.shared.config.submit_timeout,
        )
        .await
        {
            Ok(()) => Ok(()),
            Err(SubmitError::Timeout(_)) => Err(RouterError::Call(CallError::CallTimeout)),
            Err(SubmitError::Closed(_)) => Err(RouterError::Call(CallError::Shutdown)),
        }
    }

    /// Submits a listener for admission.
    ///
    /// # Errors
    ///
    /// Returns a call error when the admission queue is stuck past the
    /// submit timeout or the router has stopped.
    pub async fn add_listener(&self, listener: Listener<P>) -> Result<(), RouterError> {
        match submit(
            &self.shared.l_in_tx,
            listener,
            self.shared.config.submit_timeout,
        )
        .await
        {
            Ok(()) => Ok(()),
            Err(SubmitError::Timeout(_)) => Err(RouterError::Call(CallError::CallTimeout)),
            Err(SubmitError::Closed(_)) => Err(RouterError::Call(CallError::Shutdown)),
        }
    }

    /// Requests removal of the listener named `name`.
    ///
    /// # Errors
    ///
    /// Returns a call error when the removal queue is stuck past the submit
    /// timeout or the router has stopped.
    pub async fn del_listener(&self, name: &str) -> Result<(), RouterError> {
        match submit(
            &self.shared.l_out_tx,
            name.to_string(),
            self.shared.config.submit_timeout,
        )
        .await
        {
            Ok(()) => Ok(()),
            Err(SubmitError::Timeout(_)) => Err(RouterError::Call(CallError::CallTimeout)),
            Err(SubmitError::Closed(_)) => Err(RouterError::Call(CallError::Shutdown)),
        }
    }

    /// Issues a call toward the endpoint named `ep_name`.
    ///
    /// The message is an rpc request iff `rpc_name` is nonempty; plain
    /// messages never produce a reply. The callback fires exactly once: with
    /// the reply payload on success, or with a null payload and the error.
    /// If the outbound queue stays full past the submit timeout the callback
    /// fires synchronously with [`CallError::CallTimeout`]; after the router
    /// stopped it fires with [`CallError::Shutdown`].
    pub async fn call<F>(&self, ep_name: &str, rpc_name: &str, payload: P, callback: F)
    where
        F: FnOnce(Option<P>, Option<CallError>) + Send + 'static,
    {
        self.call_inner(ep_name, rpc_name, payload, Some(Box::new(callback)))
            .await;
    }

    /// Sends a fire-and-forget message toward the endpoint named `ep_name`.
    ///
    /// Equivalent to a call with an empty rpc name and no callback: no call
    /// id is assigned, no call-table entry is created, and no reply is ever
    /// delivered.
    pub async fn write(&self, ep_name: &str, payload: P) {
        self.call_inner(ep_name, "", payload, None).await;
    }

    async fn call_inner(
        &self,
        ep_name: &str,
        rpc_name: &str,
        payload: P,
        callback: Option<RouteCallback<P>>,
    ) {
        let mut message = self.shared.messages.get();
        message.fill_outbound(ep_name, rpc_name, payload, callback);

        match submit(
            &self.shared.out_tx,
            message,
            self.shared.config.submit_timeout,
        )
        .await
        {
            Ok(()) => {}
            Err(SubmitError::Timeout(mut message)) => {
                if let Some(callback) = message.take_callback() {
                    callback(None, Some(CallError::CallTimeout));
                }
                self.shared.messages.put(message);
            }
            Err(SubmitError::Closed(mut message)) => {
                if let Some(callback) = message.take_callback() {
                    callback(None, Some(CallError::Shutdown));
                }
                self.shared.messages.put(message);
            }
        }
    }

    /// Issues a call and blocks the caller until the reply or a deadline.
    ///
    /// Timeout semantics: a negative `timeout_secs` fails immediately with
    /// [`CallError::CallTimeout`]; zero applies the five-minute default
    /// ceiling; positive values are seconds.
    ///
    /// On timeout the waiter is abandoned but the call-table entry survives
    /// until the reply arrives or the endpoint is torn down; the late reply
    /// is then discarded.
    ///
    /// # Errors
    ///
    /// Returns the error delivered to the call's callback, or
    /// [`CallError::CallTimeout`] when the deadline fires first.
    pub async fn call_wait(
        &self,
        ep_name: &str,
        rpc_name: &str,
        payload: P,
        timeout_secs: i64,
    ) -> Result<Option<P>, CallError> {
        if timeout_secs < 0 {
            return Err(CallError::CallTimeout);
        }
        let timeout = if timeout_secs == 0 {
            self.shared.config.default_call_timeout
        } else {
            Duration::from_secs(timeout_secs as u64)
        };

        let checked_out = self.shared.waiters.get();
        let epoch = checked_out.waiter().epoch();
        let waiter = Arc::clone(checked_out.waiter());

        self.call(ep_name, rpc_name, payload, move |payload, error| {
            let outcome = match error {
                Some(error) => Err(error),
                None => Ok(payload),
            };
            waiter.complete(epoch, outcome);
        })
        .await;

        let outcome = checked_out.waiter().wait(timeout).await;
        // Unconditional return; the epoch guards any straggling completion.
        self.shared.waiters.put(checked_out);
        outcome
    }

    /// Queues the reply produced for a served request.
    pub(crate) async fn submit_reply(
        &self,
        origin: &str,
        rpc_name: &str,
        call_id: u64,
        payload: Option<P>,
    ) {
        let mut message = self.shared.messages.get();
        message.fill_reply(origin, rpc_name, call_id, payload);

        match submit(
            &self.shared.out_tx,
            message,
            self.shared.config.submit_timeout,
        )
        .await
        {
            Ok(()) => {}
            Err(SubmitError::Timeout(message)) | Err(SubmitError::Closed(message)) => {
                #[cfg(feature = "observability")]
                warn!(call_id, "reply dropped, outbound queue unavailable");
                self.shared.messages.put(message);
            }
        }
    }

    /// Returns a carrier to the message pool.
    pub(crate) fn recycle(&self, message: RouteMessage<P>) {
        self.shared.messages.put(message);
    }

    pub(crate) fn shared(&self) -> &RouterShared<P> {
        &self.shared
    }
}

impl<P: Send + 'static> WrapPolicy<P> for Router<P> {
    fn wrap(&self, origin: &str, envelope: Envelope<P>) -> RouteMessage<P> {
        let mut message = self.shared.messages.get();
        message.fill_from_envelope(origin, envelope);
        message
    }
}
