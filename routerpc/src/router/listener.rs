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

//! Named acceptors producing new endpoints.
//!
//! A listener runs an accept loop under the service harness. Each accepted
//! connection is first offered to the optional [`ConnSieve`]; a hijacked
//! connection is forgotten. Otherwise the connection becomes an endpoint
//! (named after the listener) and is submitted to the router's admission
//! queue. Any accept error is terminal to the listener.

use crate::codec::CodecFactory;
use crate::router::{ConnSieve, Router};
use crate::service::{BackgroundService, QuitSignal, ReadySignal};
use crate::transport::{BoxedConnection, TransportError};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

#[cfg(feature = "observability")]
use tracing::{debug, error, info};

struct ListenerState<P> {
    name: String,
    listener: TcpListener,
    factory: Arc<dyn CodecFactory<P>>,
    sieve: Option<Arc<dyn ConnSieve<P>>>,
    router: Router<P>,
}

/// A named acceptor owned by a router.
///
/// Constructed by [`Router::listen_and_serve`](crate::Router::listen_and_serve);
/// started when the router admits it, stopped when it is removed or the
/// router stops.
pub struct Listener<P> {
    name: String,
    local_addr: SocketAddr,
    service: BackgroundService,
    state: Mutex<Option<ListenerState<P>>>,
}

impl<P: Send + 'static> Listener<P> {
    pub(crate) fn new(
        name: String,
        listener: TcpListener,
        factory: Arc<dyn CodecFactory<P>>,
        sieve: Option<Arc<dyn ConnSieve<P>>>,
        router: Router<P>,
    ) -> Result<Self, TransportError> {
        let local_addr = listener.local_addr()?;
        Ok(Self {
            name: name.clone(),
            local_addr,
            service: BackgroundService::new(format!("listener:{}", name)),
            state: Mutex::new(Some(ListenerState {
                name,
                listener,
                factory,
                sieve,
                router,
            })),
        })
    }

    /// Returns the listener name, unique within its router.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the address the server socket is bound to.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Starts the accept loop.
    ///
    /// Invoked by the router when the listener is admitted; starting twice
    /// is a no-op.
    pub async fn run(&self) {
        let state = self.state.lock().take();
        if let Some(state) = state {
            self.service
                .run(|quit, ready| Self::accept_loop(state, quit, ready))
                .await;
        }
    }

    /// Stops the accept loop.
    ///
    /// Idempotent; the quit signal unblocks a pending accept.
    pub async fn stop(&self) {
        self.service.stop().await;
    }

    async fn accept_loop(state: ListenerState<P>, mut quit: QuitSignal, ready: ReadySignal) {
        ready.notify();

        #[cfg(feature = "observability")]
        info!(listener = %state.name, "accept loop started");

        loop {
            tokio::select! {
                _ = quit.wait() => break,
                accepted = state.listener.accept() => {
                    match accepted {
                        Ok((stream, _peer)) => {
                            let _ = stream.set_nodelay(true);
                            let (reader, writer) = stream.into_split();
                            let conn = BoxedConnection::from_halves(
                                Box::new(reader),
                                Box::new(writer),
                            );
                            let conn = match &state.sieve {
                                Some(sieve) => match sieve.inspect(&state.router, conn) {
                                    Some(conn) => conn,
                                    None => {
                                        #[cfg(feature = "observability")]
                                        debug!(listener = %state.name, "connection hijacked");
                                        continue;
                                    }
                                },
                                None => conn,
                            };

                            let (read_half, write_half) = conn.into_split();
                            let endpoint = state.router.endpoint_from_halves(
                                state.name.clone(),
                                read_half,
                                write_half,
                                &state.factory,
                            );
                            if state.router.add_endpoint(endpoint).await.is_err() {
                                break;
                            }
                        }
                        Err(_e) => {
                            #[cfg(feature = "observability")]
                            error!(listener = %state.name, error = %_e, "accept failed");
                            break;
                        }
                    }
                }
            }
        }

        #[cfg(feature = "observability")]
        info!(listener = %state.name, "accept loop stopped");
    }
}
