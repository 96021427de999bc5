//! Master-to-replica command-stream replication.
//!
//! Every successful write is captured *after* its mutation commits, while
//! the stores lock is still held, so the log's order is exactly the commit
//! order. Each attached replica link owns a cursor into the log; fan-out
//! advances the cursor with non-blocking sends into the link's outbox and
//! detaches links whose connection went away.
//!
//! The replica side connects to the master, walks the handshake
//! (`PING`, `REPLCONF listening-port`, `REPLCONF capa psync2`, `PSYNC ? -1`,
//! `+FULLRESYNC <id> <offset>`), and then applies every streamed frame
//! through the regular command executor without replying.

use std::sync::Arc;

use bytes::{Buf, Bytes, BytesMut};
use rand::distr::{Alphanumeric, SampleString};
use regex::Regex;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::commands::dispatcher::{execute, Command};
use crate::resp::{self, RespValue};
use crate::server::Shared;
use crate::session::{Session, OUTBOX_CAPACITY};

/// Generates the 40-character alphanumeric replication id a server
/// advertises over `INFO` and `FULLRESYNC`.
pub fn generate_repl_id() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), 40)
}

/// A connected replica: the outbox of its session plus a cursor into the
/// captured log.
#[derive(Debug)]
struct ReplicaLink {
    client_id: u64,
    addr: String,
    outbox: mpsc::Sender<Bytes>,
    cursor: usize,
}

/// The replication log and the links consuming it.
#[derive(Debug, Default)]
pub struct ReplicationState {
    log: Vec<Bytes>,
    offset: u64,
    links: Vec<ReplicaLink>,
}

impl ReplicationState {
    /// Appends a write's argv to the log and pushes it to every link.
    ///
    /// Callers invoke this while still holding the stores lock so captures
    /// land in commit order.
    pub fn capture<S: AsRef<str>>(&mut self, name: &str, args: &[S]) {
        let mut parts = Vec::with_capacity(args.len() + 1);
        parts.push(name.to_string());
        parts.extend(args.iter().map(|arg| arg.as_ref().to_string()));

        let frame = Bytes::from(RespValue::from_strings(parts).encode());
        self.offset += frame.len() as u64;
        self.log.push(frame);
        self.fan_out();
    }

    /// Attaches a replica link starting at the current end of the log: it
    /// receives every write captured from now on.
    pub fn attach(&mut self, client_id: u64, addr: String, outbox: mpsc::Sender<Bytes>) {
        info!(client_id, addr = %addr, "replica link attached");
        self.links.push(ReplicaLink {
            client_id,
            addr,
            outbox,
            cursor: self.log.len(),
        });
    }

    /// Detaches the link owned by `client_id`, if any. Returns whether a
    /// link was removed.
    pub fn detach(&mut self, client_id: u64) -> bool {
        let before = self.links.len();
        self.links.retain(|link| {
            if link.client_id == client_id {
                info!(client_id, addr = %link.addr, "replica link detached");
                false
            } else {
                true
            }
        });
        self.links.len() != before
    }

    pub fn replica_count(&self) -> usize {
        self.links.len()
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// The captured frames, oldest first. Used by `INFO` consumers and
    /// tests; fan-out works from the same data.
    pub fn frames(&self) -> &[Bytes] {
        &self.log
    }

    fn fan_out(&mut self) {
        let log = &self.log;
        self.links.retain_mut(|link| {
            while link.cursor < log.len() {
                match link.outbox.try_send(log[link.cursor].clone()) {
                    Ok(()) => link.cursor += 1,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        // The link keeps its cursor and catches up on the
                        // next capture.
                        return true;
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        warn!(addr = %link.addr, "replica link closed, detaching");
                        return false;
                    }
                }
            }
            true
        });
    }
}

/// Errors on the replica's link to its master.
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("master closed the connection")]
    ConnectionClosed,
    #[error(transparent)]
    Protocol(#[from] resp::RespError),
    #[error("unexpected reply from master: {0}")]
    UnexpectedReply(String),
}

/// Runs the replica side of replication: connect, handshake, then apply the
/// master's command stream until the link drops.
pub async fn run_replica_link(shared: Arc<Shared>, host: String, port: u16) {
    let master_addr = format!("{}:{}", host, port);

    let mut stream = match TcpStream::connect(&master_addr).await {
        Ok(stream) => stream,
        Err(error) => {
            warn!(master = %master_addr, %error, "failed to connect to master");
            return;
        }
    };

    let mut buf = BytesMut::with_capacity(4096);
    if let Err(error) = handshake(&mut stream, &mut buf, shared.config.port).await {
        warn!(master = %master_addr, %error, "replication handshake failed");
        return;
    }
    info!(master = %master_addr, "replication handshake complete, applying stream");

    apply_stream(shared, &master_addr, &mut stream, &mut buf).await;
}

async fn handshake(
    stream: &mut TcpStream,
    buf: &mut BytesMut,
    listening_port: u16,
) -> Result<(), LinkError> {
    let reply = roundtrip(stream, buf, &["PING"]).await?;
    expect_simple(&reply, "PONG")?;

    let port = listening_port.to_string();
    let reply = roundtrip(stream, buf, &["REPLCONF", "listening-port", &port]).await?;
    expect_simple(&reply, "OK")?;

    let reply = roundtrip(stream, buf, &["REPLCONF", "capa", "psync2"]).await?;
    expect_simple(&reply, "OK")?;

    let reply = roundtrip(stream, buf, &["PSYNC", "?", "-1"]).await?;
    expect_fullresync(&reply)?;

    Ok(())
}

async fn roundtrip(
    stream: &mut TcpStream,
    buf: &mut BytesMut,
    parts: &[&str],
) -> Result<RespValue, LinkError> {
    let frame = RespValue::from_strings(parts.iter().copied()).encode();
    stream.write_all(frame.as_bytes()).await?;
    stream.flush().await?;
    read_frame(stream, buf).await
}

async fn read_frame(stream: &mut TcpStream, buf: &mut BytesMut) -> Result<RespValue, LinkError> {
    loop {
        if let Some((value, consumed)) = resp::parse_frame(buf)? {
            buf.advance(consumed);
            return Ok(value);
        }
        if stream.read_buf(buf).await? == 0 {
            return Err(LinkError::ConnectionClosed);
        }
    }
}

fn expect_simple(reply: &RespValue, expected: &str) -> Result<(), LinkError> {
    match reply {
        RespValue::SimpleString(s) if s == expected => Ok(()),
        other => Err(LinkError::UnexpectedReply(other.encode())),
    }
}

/// Validates `+FULLRESYNC <40-char-id> <offset>`.
fn expect_fullresync(reply: &RespValue) -> Result<(), LinkError> {
    let RespValue::SimpleString(line) = reply else {
        return Err(LinkError::UnexpectedReply(reply.encode()));
    };

    let parts = line.split_whitespace().collect::<Vec<&str>>();
    let id_regex =
        Regex::new(r"^[a-zA-Z0-9]{40}$").map_err(|_| LinkError::UnexpectedReply(line.clone()))?;

    if parts.len() != 3
        || parts[0] != "FULLRESYNC"
        || !id_regex.is_match(parts[1])
        || parts[2].parse::<u64>().is_err()
    {
        return Err(LinkError::UnexpectedReply(line.clone()));
    }

    Ok(())
}

/// Applies frames from the master through the normal executor, discarding
/// replies. Captures re-run on this side, so sub-replicas and this server's
/// own subscribers observe the stream too.
async fn apply_stream(
    shared: Arc<Shared>,
    master_addr: &str,
    stream: &mut TcpStream,
    buf: &mut BytesMut,
) {
    // The apply session never subscribes and never blocks; its outbox only
    // has to exist. Keep the receiver alive so sends stay harmless.
    let (outbox, _outbox_rx) = mpsc::channel::<Bytes>(OUTBOX_CAPACITY);
    let mut session = Session::new(Arc::clone(&shared), master_addr.to_string(), outbox);

    loop {
        let frame = match read_frame(stream, buf).await {
            Ok(frame) => frame,
            Err(LinkError::ConnectionClosed) => {
                warn!(master = %master_addr, "master connection closed");
                return;
            }
            Err(error) => {
                warn!(master = %master_addr, %error, "replication stream error");
                return;
            }
        };

        let command = match Command::from_resp(&frame) {
            Ok(command) => command,
            Err(error) => {
                debug!(master = %master_addr, %error, "skipping non-command frame");
                continue;
            }
        };

        debug!(master = %master_addr, command = %command.name, "applying replicated write");
        let _ = execute(&mut session, &command, false).await;
    }
}
