use std::sync::Arc;

use bytes::Bytes;

use crate::commands::dispatcher::Outcome;
use crate::commands::error::CommandError;
use crate::resp::RespValue;
use crate::session::Session;

pub struct PsyncArguments;

impl PsyncArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 2 {
            return Err(CommandError::wrong_arity("PSYNC"));
        }

        Ok(Self)
    }
}

/// Handles PSYNC, promoting the connection to a replica link.
///
/// The `+FULLRESYNC <replid> 0` reply is pushed into the outbox *before* the
/// link attaches to the replication log, so no captured frame can overtake
/// it on the socket. From here on the session stops dispatching inbound
/// frames; the log fan-out owns the connection's outbound side.
pub async fn psync(session: &mut Session, arguments: Vec<String>) -> Outcome {
    if let Err(error) = PsyncArguments::parse(arguments) {
        return Outcome::Reply(error.to_resp());
    }

    let shared = Arc::clone(&session.shared);
    let reply = RespValue::SimpleString(format!("FULLRESYNC {} 0", shared.repl_id)).encode();
    if session.outbox.send(Bytes::from(reply)).await.is_err() {
        return Outcome::Quiet;
    }

    let mut replication = shared.replication.lock().await;
    replication.attach(session.id, session.addr.clone(), session.outbox.clone());
    drop(replication);

    session.replica_link = true;
    Outcome::Quiet
}
