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

//! A named binding of one byte-stream connection to a reader and a writer.

use crate::codec::{CodecFactory, Envelope};
use crate::endpoint::reader::{Reader, ReaderState};
use crate::endpoint::writer::{Writer, WriterState};
use crate::router::{CallError, RouteMessage, WrapPolicy, submit, SubmitError};
use crate::transport::{BoxedReadHalf, BoxedWriteHalf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// A named binding of a byte-stream connection to a router.
///
/// An endpoint owns its writer, its reader, and its outbound queue. It is
/// created either actively by [`dial`](crate::Router::dial) or passively by
/// a listener's accept loop, started when the router admits it, and stopped
/// when it is removed or the router stops.
///
/// Construct endpoints through
/// [`Router::endpoint_from_stream`](crate::Router::endpoint_from_stream).
pub struct Endpoint<P> {
    name: String,
    out_tx: mpsc::Sender<Envelope<P>>,
    reader: Reader<P>,
    writer: Writer<P>,
    submit_timeout: Duration,
}

impl<P: Send + 'static> Endpoint<P> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        name: String,
        read_half: BoxedReadHalf,
        write_half: BoxedWriteHalf,
        factory: &Arc<dyn CodecFactory<P>>,
        inbound: mpsc::Sender<RouteMessage<P>>,
        teardown: mpsc::Sender<String>,
        wrapper: Option<Arc<dyn WrapPolicy<P>>>,
        queue_capacity: usize,
        submit_timeout: Duration,
    ) -> Self {
        let (out_tx, out_rx) = mpsc::channel(queue_capacity);

        let reader = Reader::new(ReaderState {
            name: name.clone(),
            codec: factory.codec(),
            read_half,
            inbound,
            teardown: teardown.clone(),
            wrapper,
        });
        let writer = Writer::new(WriterState {
            name: name.clone(),
            codec: factory.codec(),
            write_half,
            queue: out_rx,
            teardown,
        });

        Self {
            name,
            out_tx,
            reader,
            writer,
            submit_timeout,
        }
    }

    /// Returns the endpoint name, unique within its router.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Starts the reader and writer workers.
    ///
    /// Invoked by the router when the endpoint is admitted; starting twice
    /// is a no-op.
    pub async fn run(&self) {
        self.reader.run().await;
        self.writer.run().await;
    }

    /// Stops both workers and closes the stream.
    ///
    /// Idempotent and safe to call from any task. The quit signal wakes a
    /// worker blocked on I/O; dropping the halves closes the connection.
    pub async fn stop(&self) {
        self.reader.stop().await;
        self.writer.stop().await;
    }

    /// Enqueues an envelope for the writer.
    ///
    /// Tries immediately, then once more bounded by the submit timeout, so a
    /// wedged endpoint cannot stall its producer indefinitely.
    pub(crate) async fn write(&self, envelope: Envelope<P>) -> Result<(), CallError> {
        match submit(&self.out_tx, envelope, self.submit_timeout).await {
            Ok(()) => Ok(()),
            Err(SubmitError::Timeout(_)) => Err(CallError::CallTimeout),
            Err(SubmitError::Closed(_)) => Err(CallError::Io {
                reason: format!("endpoint {:?} writer stopped", self.name),
            }),
        }
    }
}
