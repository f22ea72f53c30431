//! WebSocket transport bootstrap (spec.md §6's "out of scope beyond a bind
//! address" external collaborator, kept just far enough to prove the
//! protocol layer is reachable).
//!
//! Grounded on the reader/writer task split used by `chaorderss-pokers`'
//! websocket-feature binary and `mentalcardgames-mcg`'s `ws` server loop:
//! one task reads frames off the socket and feeds them to the
//! `MessageRouter`, a second drains an `mpsc` channel of outbound
//! envelopes into the socket's write half, registered with the `ClientHub`
//! under a `ClientHandle`. Config loading/CLI flags beyond the bind
//! address are out of scope (spec.md §1).

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::unbounded_channel;
use tokio_tungstenite::tungstenite::Message;
use uuid::Uuid;

use holdem_core::app::AppState;
use holdem_core::hub::ClientHandle;
use holdem_core::router::MessageRouter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let addr: SocketAddr = std::env::var("HOLDEM_BIND")
        .unwrap_or_else(|_| "127.0.0.1:9001".to_string())
        .parse()
        .expect("HOLDEM_BIND must be a valid socket address");

    let state = Arc::new(AppState::new());
    let listener = TcpListener::bind(addr).await.expect("failed to bind listener");
    tracing::info!(%addr, "holdem-server listening");

    while let Ok((stream, peer)) = listener.accept().await {
        let state = state.clone();
        tokio::spawn(async move {
            if let Err(err) = handle_connection(state, stream, peer).await {
                tracing::warn!(%peer, error = %err, "connection closed with error");
            }
        });
    }
}

/// Extracts `?token=<uuid>` from the WebSocket handshake request so a
/// reconnect can be honoured before the first frame is read (spec.md §4.8:
/// "associated with a token either at connect ... or at first set_name").
fn token_from_uri(uri: &str) -> Option<Uuid> {
    let query = uri.split_once('?')?.1;
    for pair in query.split('&') {
        let (key, value) = pair.split_once('=')?;
        if key == "token" {
            return Uuid::parse_str(value).ok();
        }
    }
    None
}

async fn handle_connection(state: Arc<AppState>, stream: TcpStream, peer: SocketAddr) -> Result<(), tokio_tungstenite::tungstenite::Error> {
    let mut requested_token = None;
    let ws_stream = tokio_tungstenite::accept_hdr_async(stream, |request: &tokio_tungstenite::tungstenite::handshake::server::Request, response| {
        requested_token = token_from_uri(request.uri().to_string().as_str());
        Ok(response)
    })
    .await?;
    tracing::debug!(%peer, "websocket connection established");

    let (mut write, mut read) = ws_stream.split();
    let (tx, mut rx) = unbounded_channel();
    let mut connection_token = None;

    if let Some(token) = requested_token {
        match holdem_core::handlers::identity::reconnect(&state, &mut connection_token, token, ClientHandle::new(tx.clone())) {
            Ok(()) => {}
            Err(err) => {
                let envelope = holdem_core::protocol::OutboundEnvelope::new(
                    "error",
                    holdem_core::protocol::ErrorPayload {
                        code: err.code(),
                        message: err.to_string(),
                    },
                );
                let _ = tx.send(envelope);
            }
        }
    }

    let writer = tokio::spawn(async move {
        while let Some(envelope) = rx.recv().await {
            let text = serde_json::to_string(&envelope).expect("outbound envelope is always serializable");
            if write.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let router = MessageRouter::new(&state, ClientHandle::new(tx));
    while let Some(message) = read.next().await {
        let message = message?;
        if let Message::Text(text) = message {
            router.dispatch(&text, &mut connection_token);
        }
    }

    if let Some(token) = connection_token {
        state.hub.unregister(token);
    }
    writer.abort();
    Ok(())
}
