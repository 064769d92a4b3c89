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

//! The coordinator loop.
//!
//! One task owns the endpoint map, the listener map, the call table, and
//! the id counter. It selects over seven sources: endpoint admission,
//! endpoint removal, listener admission, listener removal, outbound
//! messages, inbound messages, and the quit signal. Because every mutation
//! happens here, none of the state needs a lock.
//!
//! User code never runs on this task. Callbacks are spawned, and the
//! payload handler runs on a fresh task per inbound message.

use crate::codec::{Envelope, MessageKind};
use crate::endpoint::Endpoint;
use crate::router::{CallError, CallTable, Listener, RouteCallback, RouteMessage, Router};
use crate::service::{QuitSignal, ReadySignal};
use std::collections::HashMap;
use std::mem;
use tokio::sync::mpsc;

#[cfg(feature = "observability")]
use tracing::{debug, info, warn};

/// Receiver ends of the router's control and data queues, consumed by the
/// coordinator when the router starts.
pub(crate) struct CoordinatorChannels<P> {
    pub(crate) ep_in_rx: mpsc::Receiver<Endpoint<P>>,
    pub(crate) ep_out_rx: mpsc::Receiver<String>,
    pub(crate) l_in_rx: mpsc::Receiver<Listener<P>>,
    pub(crate) l_out_rx: mpsc::Receiver<String>,
    pub(crate) out_rx: mpsc::Receiver<RouteMessage<P>>,
    pub(crate) in_rx: mpsc::Receiver<RouteMessage<P>>,
}

struct Coordinator<P> {
    router: Router<P>,
    endpoints: HashMap<String, Endpoint<P>>,
    listeners: HashMap<String, Listener<P>>,
    calls: CallTable<P>,
}

/// Runs the coordinator until quit, then tears everything down.
pub(crate) async fn run<P: Send + 'static>(
    router: Router<P>,
    mut channels: CoordinatorChannels<P>,
    mut quit: QuitSignal,
    ready: ReadySignal,
) {
    let mut state = Coordinator {
        router,
        endpoints: HashMap::new(),
        listeners: HashMap::new(),
        calls: CallTable::new(),
    };

    ready.notify();

    #[cfg(feature = "observability")]
    info!("coordinator started");

    loop {
        tokio::select! {
            _ = quit.wait() => break,
            admitted = channels.ep_in_rx.recv() => {
                let Some(endpoint) = admitted else { break };
                state.admit_endpoint(endpoint).await;
            }
            removed = channels.ep_out_rx.recv() => {
                let Some(name) = removed else { break };
                state.remove_endpoint(&name).await;
            }
            admitted = channels.l_in_rx.recv() => {
                let Some(listener) = admitted else { break };
                state.admit_listener(listener).await;
            }
            removed = channels.l_out_rx.recv() => {
                let Some(name) = removed else { break };
                state.remove_listener(&name).await;
            }
            outbound = channels.out_rx.recv() => {
                let Some(message) = outbound else { break };
                state.route_outbound(message).await;
            }
            inbound = channels.in_rx.recv() => {
                let Some(message) = inbound else { break };
                state.route_inbound(message);
            }
        }
    }

    state.shutdown().await;

    #[cfg(feature = "observability")]
    info!("coordinator stopped");
}

impl<P: Send + 'static> Coordinator<P> {
    /// Source 1: endpoint admission. First writer wins; a name collision
    /// drops and closes the newcomer without an error.
    async fn admit_endpoint(&mut self, endpoint: Endpoint<P>) {
        if self.endpoints.contains_key(endpoint.name()) {
            #[cfg(feature = "observability")]
            debug!(endpoint = %endpoint.name(), "duplicate endpoint dropped");
            endpoint.stop().await;
            return;
        }

        #[cfg(feature = "observability")]
        debug!(endpoint = %endpoint.name(), "endpoint admitted");

        endpoint.run().await;
        self.endpoints.insert(endpoint.name().to_string(), endpoint);
        self.router.shared().metrics.record_endpoint_added();
    }

    /// Source 2: endpoint removal. Absent names are a no-op; outstanding
    /// calls to the endpoint are reaped.
    async fn remove_endpoint(&mut self, name: &str) {
        let Some(endpoint) = self.endpoints.remove(name) else {
            return;
        };
        endpoint.stop().await;
        self.router.shared().metrics.record_endpoint_removed();

        #[cfg(feature = "observability")]
        debug!(endpoint = %name, "endpoint removed");

        for mut entry in self.calls.reap_endpoint(name) {
            self.router.shared().metrics.record_call_failed();
            let callback = entry.take_callback();
            dispatch(callback, None, Some(CallError::endpoint_gone(name)));
            self.router.recycle(entry);
        }
    }

    /// Source 3: listener admission, symmetric to endpoints.
    async fn admit_listener(&mut self, listener: Listener<P>) {
        if self.listeners.contains_key(listener.name()) {
            #[cfg(feature = "observability")]
            debug!(listener = %listener.name(), "duplicate listener dropped");
            listener.stop().await;
            return;
        }

        #[cfg(feature = "observability")]
        debug!(listener = %listener.name(), addr = %listener.local_addr(), "listener admitted");

        listener.run().await;
        self.listeners.insert(listener.name().to_string(), listener);
        self.router.shared().metrics.record_listener_added();
    }

    /// Source 4: listener removal, symmetric to endpoints.
    async fn remove_listener(&mut self, name: &str) {
        let Some(listener) = self.listeners.remove(name) else {
            return;
        };
        listener.stop().await;
        self.router.shared().metrics.record_listener_removed();

        #[cfg(feature = "observability")]
        debug!(listener = %name, "listener removed");
    }

    /// Source 5: outbound route messages.
    async fn route_outbound(&mut self, mut message: RouteMessage<P>) {
        let metrics = &self.router.shared().metrics;
        match message.kind() {
            MessageKind::Request => {
                let id = self.calls.assign_id();
                message.call_id = id;
                let envelope = Envelope::request(
                    id,
                    mem::take(&mut message.rpc_name),
                    message.take_payload(),
                );
                let name = message.ep_name.clone();

                // Recorded before the writer sees the frame, so a reply can
                // never observe a missing entry.
                self.calls.insert(message);
                metrics.record_call_registered();

                let outcome = match self.endpoints.get(&name) {
                    Some(endpoint) => endpoint.write(envelope).await,
                    // Lost race with dial: the endpoint is not admitted yet.
                    None => Err(CallError::endpoint_gone(&name)),
                };

                match outcome {
                    Ok(()) => metrics.record_message_sent(),
                    Err(error) => {
                        if let Some(mut entry) = self.calls.remove(id) {
                            self.router.shared().metrics.record_call_failed();
                            let callback = entry.take_callback();
                            dispatch(callback, None, Some(error));
                            self.router.recycle(entry);
                        }
                    }
                }
            }
            MessageKind::Plain => {
                let envelope = Envelope::plain(message.take_payload());
                match self.endpoints.get(message.ep_name()) {
                    Some(endpoint) => match endpoint.write(envelope).await {
                        Ok(()) => metrics.record_message_sent(),
                        Err(error) => {
                            dispatch(message.take_callback(), None, Some(error));
                        }
                    },
                    None => {
                        dispatch(
                            message.take_callback(),
                            None,
                            Some(CallError::endpoint_gone(message.ep_name())),
                        );
                    }
                }
                self.router.recycle(message);
            }
            MessageKind::Reply => {
                let envelope = Envelope::reply(
                    message.call_id(),
                    mem::take(&mut message.rpc_name),
                    message.take_payload(),
                );
                if let Some(endpoint) = self.endpoints.get(message.ep_name()) {
                    match endpoint.write(envelope).await {
                        Ok(()) => metrics.record_message_sent(),
                        Err(_e) => {
                            #[cfg(feature = "observability")]
                            warn!(endpoint = %message.ep_name(), error = %_e, "reply dropped");
                        }
                    }
                }
                self.router.recycle(message);
            }
        }
    }

    /// Source 6: inbound route messages from endpoint readers.
    fn route_inbound(&mut self, mut message: RouteMessage<P>) {
        self.router.shared().metrics.record_message_received();

        match message.kind() {
            MessageKind::Request => {
                let origin = mem::take(&mut message.ep_name);
                let rpc_name = mem::take(&mut message.rpc_name);
                let call_id = message.call_id();
                let payload = message.take_payload();
                let router = self.router.clone();
                let handler = self.router.shared().handler.clone();

                tokio::spawn(async move {
                    let reply = match payload {
                        Some(payload) => handler.serve(&router, &origin, payload).await,
                        None => None,
                    };
                    router.submit_reply(&origin, &rpc_name, call_id, reply).await;
                });
            }
            MessageKind::Reply => {
                match self.calls.remove(message.call_id()) {
                    Some(mut entry) => {
                        self.router.shared().metrics.record_call_resolved();
                        let payload = message.take_payload();
                        dispatch(entry.take_callback(), payload, None);
                        self.router.recycle(entry);
                    }
                    // Timed out or canceled; the reply is dropped.
                    None => {
                        #[cfg(feature = "observability")]
                        debug!(call_id = message.call_id(), "unmatched reply dropped");
                    }
                }
            }
            MessageKind::Plain => {
                if let Some(payload) = message.take_payload() {
                    let origin = mem::take(&mut message.ep_name);
                    let router = self.router.clone();
                    let handler = self.router.shared().handler.clone();
                    tokio::spawn(async move {
                        // The handler's return value is ignored for plain
                        // messages; nothing is sent back.
                        let _ = handler.serve(&router, &origin, payload).await;
                    });
                }
            }
        }

        self.router.recycle(message);
    }

    /// Source 7: quit. Stops listeners first (no new endpoints), then
    /// endpoints, then fails whatever is still outstanding.
    async fn shutdown(&mut self) {
        for (_, listener) in self.listeners.drain() {
            listener.stop().await;
            self.router.shared().metrics.record_listener_removed();
        }
        for (_, endpoint) in self.endpoints.drain() {
            endpoint.stop().await;
            self.router.shared().metrics.record_endpoint_removed();
        }
        for mut entry in self.calls.drain_all() {
            self.router.shared().metrics.record_call_failed();
            let callback = entry.take_callback();
            dispatch(callback, None, Some(CallError::Shutdown));
            self.router.recycle(entry);
        }
    }
}

/// Fires a callback on a fresh task; the coordinator never runs user code.
fn dispatch<P: Send + 'static>(
    callback: Option<RouteCallback<P>>,
    payload: Option<P>,
    error: Option<CallError>,
) {
    if let Some(callback) = callback {
        tokio::spawn(async move {
            callback(payload, error);
        });
    }
}
