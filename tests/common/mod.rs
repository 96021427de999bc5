//! Shared helpers for the integration suites: build the server's shared
//! state, open sessions with inspectable outboxes, and drive the real
//! dispatcher without a socket.

// Each suite pulls in the subset it needs.
#![allow(dead_code)]

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;

use cinder::commands::{dispatch, Command, Outcome};
use cinder::config::Config;
use cinder::server::Shared;
use cinder::session::Session;

pub struct TestEnv {
    pub shared: Arc<Shared>,
}

impl TestEnv {
    /// A master-mode environment.
    pub fn new() -> Self {
        TestEnv {
            shared: Shared::new(Config::default()),
        }
    }

    /// A replica-mode environment (without a live master link); used to
    /// exercise the write-protection gate.
    pub fn replica() -> Self {
        let config = Config::from_args(
            ["cinder", "--replicaof", "127.0.0.1 6379"]
                .iter()
                .map(|s| s.to_string()),
        )
        .expect("valid replica flags");
        TestEnv {
            shared: Shared::new(config),
        }
    }

    /// Opens a fresh client session with its own outbox.
    pub fn client(&self) -> TestClient {
        let (outbox, outbox_rx) = mpsc::channel::<Bytes>(64);
        let session = Session::new(
            Arc::clone(&self.shared),
            format!("test-client-{}", addr_suffix()),
            outbox,
        );
        TestClient { session, outbox_rx }
    }
}

fn addr_suffix() -> u64 {
    // Session ids are already unique; this only makes addresses readable.
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u64)
        .unwrap_or(0)
}

pub struct TestClient {
    pub session: Session,
    pub outbox_rx: mpsc::Receiver<Bytes>,
}

impl TestClient {
    /// Dispatches a command and returns the inline reply. Panics on a
    /// non-reply outcome; use [`TestClient::run_outcome`] for those.
    pub async fn run(&mut self, parts: &[&str]) -> String {
        match self.run_outcome(parts).await {
            Outcome::Reply(reply) => reply,
            other => panic!("expected a reply for {:?}, got {:?}", parts, other),
        }
    }

    pub async fn run_outcome(&mut self, parts: &[&str]) -> Outcome {
        dispatch(&mut self.session, Command::from_parts(parts)).await
    }

    /// Pops the next frame delivered through the outbox (pub/sub messages,
    /// replicated frames), if any.
    pub fn next_outbox_frame(&mut self) -> Option<String> {
        self.outbox_rx
            .try_recv()
            .ok()
            .map(|bytes| String::from_utf8_lossy(&bytes).to_string())
    }
}

// Expected-frame builders, mirroring the wire forms the assertions compare
// against.

pub fn simple(value: &str) -> String {
    format!("+{}\r\n", value)
}

pub fn integer(value: i64) -> String {
    format!(":{}\r\n", value)
}

pub fn bulk(value: &str) -> String {
    format!("${}\r\n{}\r\n", value.len(), value)
}

pub fn null_bulk() -> String {
    "$-1\r\n".to_string()
}

pub fn null_array() -> String {
    "*-1\r\n".to_string()
}

pub fn array_of_bulks(items: &[&str]) -> String {
    let mut out = format!("*{}\r\n", items.len());
    for item in items {
        out.push_str(&bulk(item));
    }
    out
}

pub fn error(message: &str) -> String {
    format!("-{}\r\n", message)
}
