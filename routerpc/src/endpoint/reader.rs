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

//! Reader worker: decodes frames and feeds the shared inbound queue.
//!
//! Decoded envelopes are wrapped into origin-tagged route messages through
//! the endpoint's wrap policy before entering the queue. A full inbound
//! queue suspends the reader, which stops reading from the socket; the
//! backpressure reaches the remote peer through TCP flow control.
//!
//! The reader exits - and signals endpoint teardown exactly once - when the
//! peer closes, a frame fails to decode, or the stream errors.

use crate::codec::Codec;
use crate::router::{RouteMessage, WrapPolicy};
use crate::service::{BackgroundService, QuitSignal, ReadySignal};
use crate::transport::BoxedReadHalf;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;

#[cfg(feature = "observability")]
use tracing::{debug, error};

pub(crate) struct ReaderState<P> {
    pub(crate) name: String,
    pub(crate) codec: Box<dyn Codec<Payload = P>>,
    pub(crate) read_half: BoxedReadHalf,
    pub(crate) inbound: mpsc::Sender<RouteMessage<P>>,
    pub(crate) teardown: mpsc::Sender<String>,
    pub(crate) wrapper: Option<Arc<dyn WrapPolicy<P>>>,
}

pub(crate) struct Reader<P> {
    service: BackgroundService,
    state: Mutex<Option<ReaderState<P>>>,
}

impl<P: Send + 'static> Reader<P> {
    pub(crate) fn new(state: ReaderState<P>) -> Self {
        Self {
            service: BackgroundService::new(format!("reader:{}", state.name)),
            state: Mutex::new(Some(state)),
        }
    }

    pub(crate) async fn run(&self) {
        let state = self.state.lock().take();
        if let Some(state) = state {
            self.service
                .run(|quit, ready| Self::pump(state, quit, ready))
                .await;
        }
    }

    pub(crate) async fn stop(&self) {
        self.service.stop().await;
    }

    async fn pump(mut state: ReaderState<P>, mut quit: QuitSignal, ready: ReadySignal) {
        ready.notify();

        loop {
            tokio::select! {
                _ = quit.wait() => break,
                decoded = state.codec.decode(&mut *state.read_half) => {
                    match decoded {
                        Ok(envelope) => {
                            let message = match &state.wrapper {
                                Some(wrapper) => wrapper.wrap(&state.name, envelope),
                                None => RouteMessage::from_envelope(&state.name, envelope),
                            };
                            // The send suspends on a full queue; quit still
                            // has to win so stop cannot deadlock against a
                            // coordinator that already left its loop.
                            tokio::select! {
                                _ = quit.wait() => break,
                                sent = state.inbound.send(message) => {
                                    if sent.is_err() {
                                        break;
                                    }
                                }
                            }
                        }
                        Err(e) if e.is_eof() => {
                            #[cfg(feature = "observability")]
                            debug!(endpoint = %state.name, "peer closed");
                            let _ = state.teardown.try_send(state.name.clone());
                            break;
                        }
                        Err(_e) => {
                            #[cfg(feature = "observability")]
                            error!(endpoint = %state.name, error = %_e, "read failed");
                            let _ = state.teardown.try_send(state.name.clone());
                            break;
                        }
                    }
                }
            }
        }

        #[cfg(feature = "observability")]
        debug!(endpoint = %state.name, "reader stopped");
    }
}
