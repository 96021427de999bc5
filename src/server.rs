//! The server root: shared state ownership and the TCP accept loop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::config::{Config, Role};
use crate::pubsub::PubSubRegistry;
use crate::replication::{self, ReplicationState};
use crate::session;
use crate::store::Stores;
use crate::waiters::WaitBoard;

/// Process-wide state handed by `Arc` into every session task.
///
/// Lock order, where more than one guard is held: `stores` before
/// `waiters` before `replication`, and `pubsub` before `replication`.
/// Holding the stores guard across the waiter handoff and the replication
/// capture is what makes wakeups race-free and the log order the commit
/// order.
#[derive(Debug)]
pub struct Shared {
    pub config: Config,
    pub repl_id: String,
    pub stores: Mutex<Stores>,
    pub waiters: Mutex<WaitBoard>,
    pub pubsub: Mutex<PubSubRegistry>,
    pub replication: Mutex<ReplicationState>,
    next_client_id: AtomicU64,
}

impl Shared {
    pub fn new(config: Config) -> Arc<Self> {
        Arc::new(Shared {
            config,
            repl_id: replication::generate_repl_id(),
            stores: Mutex::new(Stores::default()),
            waiters: Mutex::new(WaitBoard::default()),
            pubsub: Mutex::new(PubSubRegistry::default()),
            replication: Mutex::new(ReplicationState::default()),
            next_client_id: AtomicU64::new(1),
        })
    }

    pub fn next_client_id(&self) -> u64 {
        self.next_client_id.fetch_add(1, Ordering::Relaxed)
    }
}

pub struct Server {
    shared: Arc<Shared>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Server {
            shared: Shared::new(config),
        }
    }

    /// Handle to the shared state, used by integration tests to drive
    /// sessions without a socket.
    pub fn shared(&self) -> Arc<Shared> {
        Arc::clone(&self.shared)
    }

    /// Binds the listener and serves connections until the process stops.
    ///
    /// In replica mode the link to the master runs as its own task next to
    /// the accept loop, so the replica serves reads while it applies the
    /// master's stream.
    pub async fn run(&self) -> std::io::Result<()> {
        if let Role::Replica { host, port } = &self.shared.config.role {
            let shared = Arc::clone(&self.shared);
            let (host, port) = (host.clone(), *port);
            tokio::spawn(async move {
                replication::run_replica_link(shared, host, port).await;
            });
        }

        let listener = TcpListener::bind(("127.0.0.1", self.shared.config.port)).await?;
        info!(
            port = self.shared.config.port,
            role = self.shared.config.role.as_str(),
            "listening"
        );

        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let shared = Arc::clone(&self.shared);
                    tokio::spawn(async move {
                        session::run_client(stream, shared).await;
                    });
                }
                Err(error) => {
                    error!(%error, "accept failed");
                    return Err(error);
                }
            }
        }
    }
}
