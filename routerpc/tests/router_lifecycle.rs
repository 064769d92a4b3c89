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

//! Lifecycle integration tests: lost races, mid-flight removal, shutdown.

use async_trait::async_trait;
use routerpc::transport::{BoxedConnection, memory};
use routerpc::{CallError, CodecFactory, ConnSieve, JsonCodecFactory, Router, ServePayload};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct TestPayload {
    id: u64,
}

fn payload(id: u64) -> TestPayload {
    TestPayload { id }
}

fn json_factory() -> Arc<dyn CodecFactory<TestPayload>> {
    Arc::new(JsonCodecFactory::new())
}

/// Echoes after a delay, keeping calls in flight long enough to race
/// endpoint removal.
struct SlowEchoService {
    delay: Duration,
}

#[async_trait]
impl ServePayload<TestPayload> for SlowEchoService {
    async fn serve(
        &self,
        _router: &Router<TestPayload>,
        _origin: &str,
        payload: TestPayload,
    ) -> Option<TestPayload> {
        tokio::time::sleep(self.delay).await;
        Some(payload)
    }
}

struct NullService;

#[async_trait]
impl ServePayload<TestPayload> for NullService {
    async fn serve(
        &self,
        _router: &Router<TestPayload>,
        _origin: &str,
        _payload: TestPayload,
    ) -> Option<TestPayload> {
        None
    }
}

async fn wait_for_endpoint(router: &Router<TestPayload>) {
    for _ in 0..100 {
        if router.metrics().endpoints() > 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("endpoint was never admitted");
}

#[tokio::test]
async fn test_call_to_missing_endpoint_fails_once() {
    let router: Router<TestPayload> = Router::new(NullService);
    router.run().await;

    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel();
    router
        .call("ghost", "probe", payload(1), move |reply, error| {
            let _ = outcome_tx.send((reply, error));
        })
        .await;

    let (reply, error) = tokio::time::timeout(Duration::from_secs(5), outcome_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(reply.is_none());
    assert_eq!(error, Some(CallError::endpoint_gone("ghost")));

    // Exactly once.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(outcome_rx.try_recv().is_err());
    assert_eq!(router.metrics().pending_calls(), 0);

    router.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_endpoint_removal_mid_flight() {
    let server = Router::new(SlowEchoService {
        delay: Duration::from_millis(200),
    });
    server.run().await;
    let addr = server
        .listen_and_serve("srv", "tcp", "127.0.0.1:0", json_factory(), None)
        .await
        .unwrap();

    let client = Router::new(NullService);
    client.run().await;
    client
        .dial("srv", "tcp", &addr.to_string(), json_factory())
        .await
        .unwrap();
    wait_for_endpoint(&client).await;

    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel();
    for id in 0..100u64 {
        let outcome_tx = outcome_tx.clone();
        client
            .call("srv", "echo", payload(id), move |reply, error| {
                let _ = outcome_tx.send((reply, error));
            })
            .await;
    }
    drop(outcome_tx);

    tokio::time::sleep(Duration::from_millis(50)).await;
    client.del_endpoint("srv").await.unwrap();

    // Every pending callback fires exactly once, with its reply or with
    // EndpointGone; afterwards nothing is outstanding.
    let mut outcomes = 0;
    while let Some((reply, error)) = tokio::time::timeout(Duration::from_secs(10), outcome_rx.recv())
        .await
        .expect("callback went missing")
    {
        match (reply, error) {
            (Some(_), None) => {}
            (None, Some(CallError::EndpointGone { name })) => assert_eq!(name, "srv"),
            other => panic!("unexpected outcome: {:?}", other),
        }
        outcomes += 1;
        if outcomes == 100 {
            break;
        }
    }
    assert_eq!(outcomes, 100);
    assert_eq!(client.metrics().pending_calls(), 0);

    client.stop().await;
    server.stop().await;
}

#[tokio::test]
async fn test_calls_after_stop_observe_shutdown() {
    let router: Router<TestPayload> = Router::new(NullService);
    router.run().await;
    router.stop().await;

    let outcome = router.call_wait("anywhere", "probe", payload(1), 5).await;
    assert_eq!(outcome, Err(CallError::Shutdown));
}

#[tokio::test]
async fn test_stop_fails_outstanding_calls() {
    let server = Router::new(SlowEchoService {
        delay: Duration::from_secs(30),
    });
    server.run().await;
    let addr = server
        .listen_and_serve("srv", "tcp", "127.0.0.1:0", json_factory(), None)
        .await
        .unwrap();

    let client = Router::new(NullService);
    client.run().await;
    client
        .dial("srv", "tcp", &addr.to_string(), json_factory())
        .await
        .unwrap();
    wait_for_endpoint(&client).await;

    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel();
    client
        .call("srv", "stall", payload(1), move |reply, error| {
            let _ = outcome_tx.send((reply, error));
        })
        .await;

    tokio::time::sleep(Duration::from_millis(50)).await;
    client.stop().await;

    let (reply, error) = tokio::time::timeout(Duration::from_secs(5), outcome_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(reply.is_none());
    assert_eq!(error, Some(CallError::Shutdown));
    assert_eq!(client.metrics().pending_calls(), 0);

    server.stop().await;
}

#[tokio::test]
async fn test_duplicate_endpoint_name_first_writer_wins() {
    let router: Router<TestPayload> = Router::new(NullService);
    router.run().await;

    let factory = json_factory();
    let (first, _first_peer) = memory::pair();
    let (second, second_peer) = memory::pair();

    let winner = router.endpoint_from_stream("peer", first, &factory);
    let loser = router.endpoint_from_stream("peer", second, &factory);
    router.add_endpoint(winner).await.unwrap();
    router.add_endpoint(loser).await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(router.metrics().endpoints(), 1);

    // The dropped newcomer's connection is closed, not leaked.
    use tokio::io::AsyncReadExt;
    let (mut read_half, _write_half) = tokio::io::split(second_peer);
    let mut buffer = [0u8; 1];
    let n = tokio::time::timeout(Duration::from_secs(5), read_half.read(&mut buffer))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(n, 0);

    router.stop().await;
}

#[tokio::test]
async fn test_del_absent_endpoint_is_noop() {
    let router: Router<TestPayload> = Router::new(NullService);
    router.run().await;

    router.del_endpoint("never-existed").await.unwrap();
    router.del_listener("never-existed").await.unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(router.metrics().endpoints(), 0);
    assert_eq!(router.metrics().listeners(), 0);

    router.stop().await;
}

#[tokio::test]
async fn test_sieve_hijacks_accepted_connection() {
    let server = Router::new(NullService);
    server.run().await;

    let (taken_tx, mut taken_rx) = mpsc::unbounded_channel();
    let sieve: Arc<dyn ConnSieve<TestPayload>> = Arc::new(
        move |_: &Router<TestPayload>, conn: BoxedConnection| {
            let _ = taken_tx.send(conn);
            None
        },
    );
    let addr = server
        .listen_and_serve("srv", "tcp", "127.0.0.1:0", json_factory(), Some(sieve))
        .await
        .unwrap();

    for _ in 0..100 {
        if server.metrics().listeners() > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let mut client = tokio::net::TcpStream::connect(addr).await.unwrap();
    let mut hijacked = tokio::time::timeout(Duration::from_secs(5), taken_rx.recv())
        .await
        .unwrap()
        .unwrap();

    // The sieve owns the connection now and can drive it as a raw stream.
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    client.write_all(b"side").await.unwrap();
    let mut buffer = [0u8; 4];
    hijacked.read_exact(&mut buffer).await.unwrap();
    assert_eq!(&buffer, b"side");

    // The listener forgot the connection; no endpoint was admitted.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(server.metrics().endpoints(), 0);

    server.stop().await;
}

#[tokio::test]
async fn test_listener_removal_stops_accepting() {
    let server = Router::new(NullService);
    server.run().await;
    let addr = server
        .listen_and_serve("srv", "tcp", "127.0.0.1:0", json_factory(), None)
        .await
        .unwrap();

    for _ in 0..100 {
        if server.metrics().listeners() > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(server.metrics().listeners(), 1);

    server.del_listener("srv").await.unwrap();
    for _ in 0..100 {
        if server.metrics().listeners() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(server.metrics().listeners(), 0);

    // The socket is gone; a fresh connection attempt must fail.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(tokio::net::TcpStream::connect(addr).await.is_err());

    server.stop().await;
}
