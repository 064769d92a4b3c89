//! Latency benchmarks for RouterPC
//!
//! Measures round-trip call latency over an in-memory endpoint pair:
//! - `call_wait` round-trip
//! - fire-and-forget `write`

use async_trait::async_trait;
use criterion::{Criterion, criterion_group, criterion_main};
use routerpc::transport::memory;
use routerpc::{CodecFactory, JsonCodecFactory, Router, ServePayload};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

/// Simple message for latency testing
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BenchMessage {
    id: u64,
    data: Vec<u8>,
}

struct EchoService;

#[async_trait]
impl ServePayload<BenchMessage> for EchoService {
    async fn serve(
        &self,
        _router: &Router<BenchMessage>,
        _origin: &str,
        payload: BenchMessage,
    ) -> Option<BenchMessage> {
        Some(payload)
    }
}

struct NullService;

#[async_trait]
impl ServePayload<BenchMessage> for NullService {
    async fn serve(
        &self,
        _router: &Router<BenchMessage>,
        _origin: &str,
        _payload: BenchMessage,
    ) -> Option<BenchMessage> {
        None
    }
}

async fn connected_pair() -> (Router<BenchMessage>, Router<BenchMessage>) {
    let factory: Arc<dyn CodecFactory<BenchMessage>> = Arc::new(JsonCodecFactory::new());

    let server = Router::new(EchoService);
    server.run().await;
    let client = Router::new(NullService);
    client.run().await;

    let (client_end, server_end) = memory::pair();
    let client_endpoint = client.endpoint_from_stream("peer", client_end, &factory);
    let server_endpoint = server.endpoint_from_stream("peer", server_end, &factory);
    client.add_endpoint(client_endpoint).await.unwrap();
    server.add_endpoint(server_endpoint).await.unwrap();

    while client.metrics().endpoints() == 0 || server.metrics().endpoints() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    (client, server)
}

fn bench_call_latency(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let (client, server) = rt.block_on(connected_pair());

    c.bench_function("call_wait_roundtrip", |b| {
        b.to_async(&rt).iter(|| {
            let client = client.clone();
            async move {
                let reply = client
                    .call_wait(
                        "peer",
                        "echo",
                        BenchMessage {
                            id: 1,
                            data: vec![0u8; 64],
                        },
                        30,
                    )
                    .await
                    .unwrap();
                assert!(reply.is_some());
            }
        })
    });

    c.bench_function("write_oneway", |b| {
        b.to_async(&rt).iter(|| {
            let client = client.clone();
            async move {
                client
                    .write(
                        "peer",
                        BenchMessage {
                            id: 2,
                            data: vec![0u8; 64],
                        },
                    )
                    .await;
            }
        })
    });

    rt.block_on(async {
        client.stop().await;
        server.stop().await;
    });
}

criterion_group!(benches, bench_call_latency);
criterion_main!(benches);
