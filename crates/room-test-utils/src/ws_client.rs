//! WebSocket client helpers for E2E tests.
//!
//! Thin wrappers over `tokio-tungstenite` that add timeouts and skip
//! transport-level frames (ping/pong), so tests only see relayed payloads.

use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

/// Client side of a test WebSocket connection.
pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long `recv_*` helpers wait for a frame.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Open a WebSocket connection. Fails if the server refuses the upgrade.
pub async fn connect(url: &str) -> Result<WsClient, anyhow::Error> {
    let (ws, _response) = tokio_tungstenite::connect_async(url).await?;
    Ok(ws)
}

/// Attempt a WebSocket connection that is expected to be refused, returning
/// the HTTP status the server answered with.
pub async fn connect_rejection_status(url: &str) -> Result<u16, anyhow::Error> {
    match tokio_tungstenite::connect_async(url).await {
        Ok(_) => anyhow::bail!("connection to {} was unexpectedly accepted", url),
        Err(tungstenite::Error::Http(response)) => Ok(response.status().as_u16()),
        Err(e) => Err(e.into()),
    }
}

/// Send a text frame.
pub async fn send_text(ws: &mut WsClient, text: &str) -> Result<(), anyhow::Error> {
    ws.send(Message::Text(text.to_string())).await?;
    Ok(())
}

/// Send a binary frame.
pub async fn send_binary(ws: &mut WsClient, data: &[u8]) -> Result<(), anyhow::Error> {
    ws.send(Message::Binary(data.to_vec())).await?;
    Ok(())
}

/// Receive the next text or binary frame, skipping ping/pong.
pub async fn recv_message(ws: &mut WsClient) -> Result<Message, anyhow::Error> {
    tokio::time::timeout(RECV_TIMEOUT, async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                Some(Ok(message)) => return Ok(message),
                Some(Err(e)) => return Err(anyhow::Error::from(e)),
                None => anyhow::bail!("connection closed"),
            }
        }
    })
    .await
    .map_err(|_| anyhow::anyhow!("timed out waiting for a message"))?
}

/// Receive the next frame and require it to be text.
pub async fn recv_text(ws: &mut WsClient) -> Result<String, anyhow::Error> {
    match recv_message(ws).await? {
        Message::Text(text) => Ok(text),
        other => anyhow::bail!("expected text frame, got {:?}", other),
    }
}

/// Receive the next frame and require it to be binary.
pub async fn recv_binary(ws: &mut WsClient) -> Result<Vec<u8>, anyhow::Error> {
    match recv_message(ws).await? {
        Message::Binary(data) => Ok(data),
        other => anyhow::bail!("expected binary frame, got {:?}", other),
    }
}

/// Assert that no text or binary frame arrives within `wait`.
pub async fn expect_no_message(ws: &mut WsClient, wait: Duration) -> Result<(), anyhow::Error> {
    let result = tokio::time::timeout(wait, async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                other => return other,
            }
        }
    })
    .await;

    match result {
        Err(_) => Ok(()),
        Ok(frame) => anyhow::bail!("expected no message, got {:?}", frame),
    }
}
