//! Per-connection session: the read loop, the outbox writer, and the state
//! the dispatcher's mode gates operate on.
//!
//! Every connection owns two tasks: the session task reading frames and
//! dispatching them, and a writer task draining the session's outbox to the
//! socket. Replies, pub/sub deliveries, and replicated frames all go through
//! the same outbox, so writes to one client are serialized no matter which
//! task produced them.

use std::sync::Arc;

use bytes::{Buf, Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::commands::dispatcher::{dispatch, Command, Outcome};
use crate::resp::{self, RespValue};
use crate::server::Shared;

/// Bound on a client's outbox. A subscriber that stays this far behind is
/// dropped from the registry rather than stalling publishers.
pub const OUTBOX_CAPACITY: usize = 256;

/// Per-connection state consulted by the dispatcher.
#[derive(Debug)]
pub struct Session {
    pub id: u64,
    pub addr: String,
    /// Outbound frames; drained by the connection's writer task.
    pub outbox: mpsc::Sender<Bytes>,
    /// Set by the first SUBSCRIBE/PSUBSCRIBE, cleared only by disconnect.
    pub subscribed: bool,
    /// `Some` while a MULTI is open; holds the queued commands.
    pub queued: Option<Vec<Command>>,
    /// Set once PSYNC promotes the connection into a replica link.
    pub replica_link: bool,
    pub shared: Arc<Shared>,
}

impl Session {
    pub fn new(shared: Arc<Shared>, addr: String, outbox: mpsc::Sender<Bytes>) -> Self {
        Session {
            id: shared.next_client_id(),
            addr,
            outbox,
            subscribed: false,
            queued: None,
            replica_link: false,
            shared,
        }
    }
}

/// Drives one client connection until it closes.
pub async fn run_client(stream: TcpStream, shared: Arc<Shared>) {
    let addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let (mut reader, mut writer) = stream.into_split();
    let (outbox, mut outbox_rx) = mpsc::channel::<Bytes>(OUTBOX_CAPACITY);

    let writer_addr = addr.clone();
    let writer_task = tokio::spawn(async move {
        while let Some(frame) = outbox_rx.recv().await {
            if writer.write_all(&frame).await.is_err() || writer.flush().await.is_err() {
                debug!(client = %writer_addr, "write side closed");
                break;
            }
        }
    });

    let mut session = Session::new(shared, addr, outbox);
    debug!(client = %session.addr, id = session.id, "client connected");

    let mut buf = BytesMut::with_capacity(4096);
    'connection: loop {
        match reader.read_buf(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }

        // A read may complete several pipelined frames; drain them all
        // before touching the socket again.
        loop {
            match resp::parse_frame(&buf) {
                Ok(Some((frame, consumed))) => {
                    buf.advance(consumed);
                    if !handle_frame(&mut session, frame).await {
                        break 'connection;
                    }
                }
                Ok(None) => break,
                Err(error) => {
                    warn!(client = %session.addr, %error, "protocol error, closing connection");
                    let reply = RespValue::Error(format!("ERR {}", error)).encode();
                    let _ = session.outbox.send(Bytes::from(reply)).await;
                    break 'connection;
                }
            }
        }
    }

    teardown(&session).await;
    debug!(client = %session.addr, id = session.id, "client disconnected");

    // Dropping the session releases its outbox sender; the writer task ends
    // once the registry and replication sides have let go of theirs.
    drop(session);
    let _ = writer_task.await;
}

/// Dispatches one frame. Returns `false` when the connection should close.
async fn handle_frame(session: &mut Session, frame: RespValue) -> bool {
    let cmd = match Command::from_resp(&frame) {
        Ok(cmd) => cmd,
        Err(error) => {
            return session
                .outbox
                .send(Bytes::from(error.to_resp()))
                .await
                .is_ok();
        }
    };

    match dispatch(session, cmd).await {
        Outcome::Reply(reply) => {
            if reply.is_empty() {
                return true;
            }
            session.outbox.send(Bytes::from(reply)).await.is_ok()
        }
        Outcome::Quiet => true,
        Outcome::Close(reply) => {
            let _ = session.outbox.send(Bytes::from(reply)).await;
            false
        }
    }
}

/// Clears every trace of the client from the shared state: subscriptions,
/// replica links, and (implicitly, by dropping the receiver) any parked
/// blocking wait.
async fn teardown(session: &Session) {
    let mut registry = session.shared.pubsub.lock().await;
    registry.remove_client(session.id);
    drop(registry);

    if session.replica_link {
        let mut replication = session.shared.replication.lock().await;
        replication.detach(session.id);
    }
}
