//! Per-connection transport: a read task that turns bytes into decoded
//! messages, a write task that turns outbound messages into bytes, and a
//! buffered, periodically-flushed socket in between. This module knows
//! nothing about what a message *means* — the caller supplies `decode`/
//! `encode` closures and owns the dispatch loop over [`ConnectionIo::inbound`].

use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{SendError, WireError};
use crate::protocol::frame;

const READ_BUF_CAPACITY: usize = 1024;
const WRITE_BUF_CAPACITY: usize = 40 * 1024;

/// One item of outbound traffic: either a pre-encoded, reference-counted
/// frame shared across every recipient of a broadcast, or a message this
/// connection alone must encode.
pub enum Outbound<Out> {
    Encoded(Bytes),
    Message(Out),
}

/// A cloneable sender half bound to one connection's outbound queue.
#[derive(Clone)]
pub struct OutboundHandle<Out> {
    tx: mpsc::Sender<Outbound<Out>>,
    token: CancellationToken,
}

impl<Out> OutboundHandle<Out> {
    /// Non-blocking; drops the message and returns `WriteBlocking` if the
    /// queue is full, matching the source's drop-on-full broadcast policy.
    pub fn send_message(&self, msg: Out) -> Result<(), SendError> {
        self.try_send(Outbound::Message(msg))
    }

    pub fn send_encoded(&self, frame: Bytes) -> Result<(), SendError> {
        self.try_send(Outbound::Encoded(frame))
    }

    fn try_send(&self, item: Outbound<Out>) -> Result<(), SendError> {
        if self.token.is_cancelled() {
            return Err(SendError::ConnClosing);
        }
        self.tx.try_send(item).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SendError::WriteBlocking,
            mpsc::error::TrySendError::Closed(_) => SendError::ConnClosing,
        })
    }

    /// Bounded-blocking send for single-recipient command replies, so a
    /// momentarily slow client doesn't silently lose its own reply.
    pub async fn send_message_reliable(&self, msg: Out, timeout: Duration) -> Result<(), SendError> {
        if self.token.is_cancelled() {
            return Err(SendError::ConnClosing);
        }
        match tokio::time::timeout(timeout, self.tx.send(Outbound::Message(msg))).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(SendError::ConnClosing),
            Err(_) => Err(SendError::WriteBlocking),
        }
    }

    pub fn close(&self) {
        self.token.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Handles returned by [`spawn`]: the decoded-message stream and the means
/// to send back out. The caller owns the dispatch loop over `inbound`.
pub struct ConnectionIo<In, Out> {
    pub inbound: mpsc::Receiver<In>,
    pub outbound: OutboundHandle<Out>,
    pub peer_addr: SocketAddr,
}

/// Spawns the read and write tasks over an already-split stream. Callers
/// that dial or accept a `TcpStream` should set `SO_LINGER(0)` and use
/// `into_split()` before calling this so an abrupt close doesn't linger in
/// TIME_WAIT; `spawn_tcp` below does this for the common case.
pub fn spawn<In, Out, D, E, R, W>(
    read_half: R,
    write_half: W,
    peer_addr: SocketAddr,
    decode: D,
    encode: E,
    send_chan_limit: usize,
    recv_chan_limit: usize,
    flush_interval: Duration,
) -> ConnectionIo<In, Out>
where
    In: Send + 'static,
    Out: Send + 'static,
    D: Fn(frame::RawFrame) -> Result<In, WireError> + Send + Sync + 'static,
    E: Fn(&Out) -> Result<Bytes, WireError> + Send + Sync + 'static,
    R: AsyncRead + Send + Unpin + 'static,
    W: AsyncWrite + Send + Unpin + 'static,
{
    let token = CancellationToken::new();
    let (inbound_tx, inbound_rx) = mpsc::channel::<In>(recv_chan_limit);
    let (outbound_tx, outbound_rx) = mpsc::channel::<Outbound<Out>>(send_chan_limit.saturating_mul(100).max(1));

    spawn_read_task(read_half, decode, inbound_tx, token.clone(), peer_addr);
    spawn_write_task(write_half, encode, outbound_rx, token.clone(), flush_interval, peer_addr);

    ConnectionIo {
        inbound: inbound_rx,
        outbound: OutboundHandle {
            tx: outbound_tx,
            token,
        },
        peer_addr,
    }
}

/// Convenience wrapper for the common case of an accepted or dialed
/// `TcpStream`: disables linger before splitting so an abrupt close doesn't
/// sit in TIME_WAIT.
pub fn spawn_tcp<In, Out, D, E>(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    decode: D,
    encode: E,
    send_chan_limit: usize,
    recv_chan_limit: usize,
    flush_interval: Duration,
) -> ConnectionIo<In, Out>
where
    In: Send + 'static,
    Out: Send + 'static,
    D: Fn(frame::RawFrame) -> Result<In, WireError> + Send + Sync + 'static,
    E: Fn(&Out) -> Result<Bytes, WireError> + Send + Sync + 'static,
{
    let _ = stream.set_linger(Some(Duration::from_secs(0)));
    let (read_half, write_half) = stream.into_split();
    spawn(
        read_half,
        write_half,
        peer_addr,
        decode,
        encode,
        send_chan_limit,
        recv_chan_limit,
        flush_interval,
    )
}

fn spawn_read_task<In, D, R>(
    read_half: R,
    decode: D,
    inbound_tx: mpsc::Sender<In>,
    token: CancellationToken,
    peer_addr: SocketAddr,
) where
    In: Send + 'static,
    D: Fn(frame::RawFrame) -> Result<In, WireError> + Send + Sync + 'static,
    R: AsyncRead + Send + Unpin + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::with_capacity(READ_BUF_CAPACITY, read_half);
        loop {
            let raw = tokio::select! {
                _ = token.cancelled() => break,
                result = frame::read_frame(&mut reader) => result,
            };

            let raw = match raw {
                Ok(raw) => raw,
                Err(WireError::Eof) => {
                    debug!(%peer_addr, "connection closed by peer");
                    break;
                }
                Err(e) => {
                    warn!(%peer_addr, error = %e, "frame read failed, closing connection");
                    break;
                }
            };

            match decode(raw) {
                Ok(msg) => {
                    if inbound_tx.send(msg).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(%peer_addr, error = %e, "dropping undecodable frame, closing connection");
                    break;
                }
            }
        }
        token.cancel();
    });
}

fn spawn_write_task<Out, E, W>(
    write_half: W,
    encode: E,
    mut outbound_rx: mpsc::Receiver<Outbound<Out>>,
    token: CancellationToken,
    flush_interval: Duration,
    peer_addr: SocketAddr,
) where
    W: AsyncWrite + Send + Unpin + 'static,
    Out: Send + 'static,
    E: Fn(&Out) -> Result<Bytes, WireError> + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut writer = BufWriter::with_capacity(WRITE_BUF_CAPACITY, write_half);
        let mut flush_timer = tokio::time::interval(flush_interval);
        flush_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                item = outbound_rx.recv() => {
                    let Some(item) = item else { break };
                    let frame = match item {
                        Outbound::Encoded(bytes) => bytes,
                        Outbound::Message(msg) => match encode(&msg) {
                            Ok(bytes) => bytes,
                            Err(e) => {
                                warn!(%peer_addr, error = %e, "failed to encode outbound message");
                                continue;
                            }
                        },
                    };
                    if frame::write_encoded(&mut writer, &frame).await.is_err() {
                        break;
                    }
                }
                _ = flush_timer.tick() => {
                    if writer.flush().await.is_err() {
                        break;
                    }
                }
            }
        }
        let _ = writer.flush().await;
        token.cancel();
    });
}
