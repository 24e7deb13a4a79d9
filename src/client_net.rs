//! Dialer (C6, client side): connects to the server, retrying on failure,
//! and wires up the same read/write/dispatch transport the server uses.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::connection::{self, ConnectionIo};
use crate::error::WireError;
use crate::protocol::messages::{ClientMessage, ServerMessage};
use crate::protocol::{self, frame, registry::Registry};

const SEND_CHAN_LIMIT: usize = 8;
const RECV_CHAN_LIMIT: usize = 32;
const FLUSH_INTERVAL: Duration = Duration::from_millis(200);
const DIAL_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Dials `addr`, retrying every second until it succeeds or `token` is
/// cancelled.
pub async fn dial(addr: &str, token: &CancellationToken) -> Option<TcpStream> {
    loop {
        match TcpStream::connect(addr).await {
            Ok(stream) => return Some(stream),
            Err(e) => {
                warn!(%addr, error = %e, "dial failed, retrying");
                tokio::select! {
                    _ = token.cancelled() => return None,
                    _ = tokio::time::sleep(DIAL_RETRY_INTERVAL) => {}
                }
            }
        }
    }
}

/// Wraps a dialed stream with the standard client-side transport: decodes
/// incoming `ServerMessage`s, encodes outgoing `ClientMessage`s.
pub fn connect(stream: TcpStream, peer_addr: std::net::SocketAddr) -> anyhow::Result<ConnectionIo<ServerMessage, ClientMessage>> {
    let decoder: Arc<Registry<ServerMessage>> = Arc::new(protocol::server_registry()?);
    Ok(connection::spawn_tcp(
        stream,
        peer_addr,
        move |raw: frame::RawFrame| decoder.decode(&raw.name, &raw.body),
        encode_client_message,
        SEND_CHAN_LIMIT,
        RECV_CHAN_LIMIT,
        FLUSH_INTERVAL,
    ))
}

fn encode_client_message(msg: &ClientMessage) -> Result<Bytes, WireError> {
    match msg {
        ClientMessage::Login(m) => frame::encode_message(m),
        ClientMessage::Enter(m) => frame::encode_message(m),
        ClientMessage::Leave(m) => frame::encode_message(m),
        ClientMessage::Chat(m) => frame::encode_message(m),
        ClientMessage::CommandGm(m) => frame::encode_message(m),
    }
}
