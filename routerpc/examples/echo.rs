//! Minimal echo round trip over loopback TCP.
//!
//! Run with:
//! ```bash
//! cargo run --example echo
//! ```

use routerpc::{JsonCodecFactory, Router};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let factory = Arc::new(JsonCodecFactory::new());

    // Server: reply with the request payload.
    let server = Router::new(|_: &Router<Value>, _: &str, payload: Value| Some(payload));
    server.run().await;
    let addr = server
        .listen_and_serve("echo", "tcp", "127.0.0.1:0", factory.clone(), None)
        .await?;
    println!("echo server listening on {addr}");

    // Client: dial the server and wait for its endpoint to be admitted.
    let client = Router::new(|_: &Router<Value>, _: &str, _: Value| None);
    client.run().await;
    client.dial("echo", "tcp", &addr.to_string(), factory).await?;
    while client.metrics().endpoints() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let reply = client
        .call_wait("echo", "echo", json!({"id": 42, "text": "ping"}), 5)
        .await?;
    println!("reply: {reply:?}");

    client.stop().await;
    server.stop().await;
    Ok(())
}
