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

//! Writer worker: drains an endpoint's outbound queue onto the wire.
//!
//! Frames are emitted strictly in dequeue order. On stop, an envelope that
//! was already dequeued is still encoded and flushed before the worker
//! exits; the rest of the queue is abandoned. A write error ends the worker
//! and signals the endpoint's teardown path.

use crate::codec::{Codec, Envelope};
use crate::service::{BackgroundService, QuitSignal, ReadySignal};
use crate::transport::BoxedWriteHalf;
use parking_lot::Mutex;
use tokio::sync::mpsc;

#[cfg(feature = "observability")]
use tracing::{debug, error};

pub(crate) struct WriterState<P> {
    pub(crate) name: String,
    pub(crate) codec: Box<dyn Codec<Payload = P>>,
    pub(crate) write_half: BoxedWriteHalf,
    pub(crate) queue: mpsc::Receiver<Envelope<P>>,
    pub(crate) teardown: mpsc::Sender<String>,
}

pub(crate) struct Writer<P> {
    service: BackgroundService,
    state: Mutex<Option<WriterState<P>>>,
}

impl<P: Send + 'static> Writer<P> {
    pub(crate) fn new(state: WriterState<P>) -> Self {
        Self {
            service: BackgroundService::new(format!("writer:{}", state.name)),
            state: Mutex::new(Some(state)),
        }
    }

    pub(crate) async fn run(&self) {
        let state = self.state.lock().take();
        if let Some(state) = state {
            self.service
                .run(|quit, ready| Self::drain(state, quit, ready))
                .await;
        }
    }

    pub(crate) async fn stop(&self) {
        self.service.stop().await;
    }

    async fn drain(mut state: WriterState<P>, mut quit: QuitSignal, ready: ReadySignal) {
        ready.notify();

        loop {
            tokio::select! {
                _ = quit.wait() => break,
                dequeued = state.queue.recv() => {
                    let Some(envelope) = dequeued else { break };
                    // A dequeued frame is always flushed, even if quit races in.
                    if let Err(_e) = state.codec.encode(&mut *state.write_half, &envelope).await {
                        #[cfg(feature = "observability")]
                        error!(endpoint = %state.name, error = %_e, "write failed");
                        let _ = state.teardown.try_send(state.name.clone());
                        break;
                    }
                }
            }
        }

        #[cfg(feature = "observability")]
        debug!(endpoint = %state.name, "writer stopped");

        // Dropping the write half closes our side of the stream.
    }
}
