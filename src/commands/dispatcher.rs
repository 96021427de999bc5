//! Command dispatch and the per-session mode gates.
//!
//! Every inbound frame flows through [`dispatch`], which applies the session
//! state machine in order:
//!
//! 1. A promoted replica link dispatches nothing further.
//! 2. A subscribed session only accepts the subscribe-mode command set.
//! 3. A replica-mode server refuses capturing writes from ordinary clients.
//! 4. An open transaction queues everything except the transaction controls,
//!    validating arity at queue time.
//! 5. `MULTI`/`EXEC`/`DISCARD`/`QUIT`/`RESET`/`PSYNC` are handled here;
//!    everything else goes through [`execute`].
//!
//! [`execute`] is also the entry point for queued commands during `EXEC` and
//! for writes streamed from a master, which bypass the gates above.

use std::sync::Arc;

use crate::commands::error::CommandError;
use crate::commands::{
    blpop, config_get, del, echo, exists, get, incr, keys, llen, lpop, lrange, ping, pub_sub,
    push, replication, set, type_command, watch, xadd, xrange, xread, zadd, zcard, zrange, zrank,
    zrem, zscore,
};
use crate::resp::RespValue;
use crate::session::Session;

/// A parsed command frame: uppercase name plus its arguments.
#[derive(Debug, PartialEq, Clone)]
pub struct Command {
    pub name: String,
    pub args: Vec<String>,
}

impl Command {
    /// Builds a command from a decoded frame, which must be a non-empty
    /// array of bulk strings. Names are ASCII case-insensitive.
    pub fn from_resp(value: &RespValue) -> Result<Self, CommandError> {
        let RespValue::Array(elements) = value else {
            return Err(CommandError::MalformedCommandFrame);
        };

        let name = match elements.first() {
            Some(RespValue::BulkString(s)) => s.to_uppercase(),
            _ => return Err(CommandError::MalformedCommandFrame),
        };

        let mut args = Vec::with_capacity(elements.len().saturating_sub(1));
        for element in &elements[1..] {
            let RespValue::BulkString(s) = element else {
                return Err(CommandError::MalformedCommandFrame);
            };
            args.push(s.clone());
        }

        Ok(Self { name, args })
    }

    /// Convenience constructor used by tests and internal callers.
    pub fn from_parts(parts: &[&str]) -> Self {
        let name = parts.first().map(|s| s.to_uppercase()).unwrap_or_default();
        Self {
            name,
            args: parts.iter().skip(1).map(|s| s.to_string()).collect(),
        }
    }
}

/// What the session loop should do with a dispatched command.
#[derive(Debug, PartialEq)]
pub enum Outcome {
    /// Write this reply to the client.
    Reply(String),
    /// Nothing to write; the reply (if any) went through the outbox.
    Quiet,
    /// Write this reply, then close the connection.
    Close(String),
}

/// Commands a subscribed session may still issue.
const SUBSCRIBED_MODE_ALLOWED: [&str; 7] = [
    "SUBSCRIBE",
    "UNSUBSCRIBE",
    "PSUBSCRIBE",
    "PUNSUBSCRIBE",
    "PING",
    "QUIT",
    "RESET",
];

/// Capturing writes, refused from ordinary clients in replica mode.
const WRITE_COMMANDS: [&str; 11] = [
    "SET", "DEL", "INCR", "RPUSH", "LPUSH", "LPOP", "BLPOP", "ZADD", "ZREM", "XADD", "PUBLISH",
];

/// Commands that may not sit in a transaction queue.
const NOT_QUEUEABLE: [&str; 5] = [
    "SUBSCRIBE",
    "UNSUBSCRIBE",
    "PSUBSCRIBE",
    "PUNSUBSCRIBE",
    "PSYNC",
];

pub async fn dispatch(session: &mut Session, cmd: Command) -> Outcome {
    if session.replica_link {
        return Outcome::Quiet;
    }

    if session.subscribed && !SUBSCRIBED_MODE_ALLOWED.contains(&cmd.name.as_str()) {
        return Outcome::Reply(
            CommandError::RestrictedInSubscribeMode(cmd.name.to_lowercase()).to_resp(),
        );
    }

    if session.shared.config.is_replica() && WRITE_COMMANDS.contains(&cmd.name.as_str()) {
        return Outcome::Reply(CommandError::ReadOnlyReplica.to_resp());
    }

    if session.queued.is_some() && !matches!(cmd.name.as_str(), "MULTI" | "EXEC" | "DISCARD" | "WATCH")
    {
        return Outcome::Reply(queue_command(session, cmd));
    }

    match cmd.name.as_str() {
        "MULTI" => Outcome::Reply(multi(session)),
        "EXEC" => Outcome::Reply(exec(session).await),
        "DISCARD" => Outcome::Reply(discard(session)),
        "RESET" => Outcome::Reply(reset(session).await),
        "QUIT" => Outcome::Close(RespValue::SimpleString("OK".to_string()).encode()),
        "PSYNC" => replication::psync(session, cmd.args).await,
        _ => Outcome::Reply(execute(session, &cmd, false).await),
    }
}

fn multi(session: &mut Session) -> String {
    if session.queued.is_some() {
        return CommandError::NestedMulti.to_resp();
    }
    session.queued = Some(Vec::new());
    RespValue::SimpleString("OK".to_string()).encode()
}

fn discard(session: &mut Session) -> String {
    if session.queued.take().is_none() {
        return CommandError::DiscardWithoutMulti.to_resp();
    }
    RespValue::SimpleString("OK".to_string()).encode()
}

/// Runs the queued commands in order against the state at EXEC time and
/// replies with the array of their replies. Errors stay per-command; the
/// remaining queue still runs. Blocking commands degrade to their immediate
/// form.
async fn exec(session: &mut Session) -> String {
    let Some(queued) = session.queued.take() else {
        return CommandError::ExecWithoutMulti.to_resp();
    };

    let mut reply = format!("*{}\r\n", queued.len());
    for cmd in &queued {
        reply.push_str(&execute(session, cmd, true).await);
    }
    reply
}

/// Clears the transaction queue and every subscription, replying `+RESET`.
/// The subscribe-mode flag itself stays until disconnect.
async fn reset(session: &mut Session) -> String {
    session.queued = None;

    let shared = Arc::clone(&session.shared);
    let mut registry = shared.pubsub.lock().await;
    registry.remove_client(session.id);

    RespValue::SimpleString("RESET".to_string()).encode()
}

fn queue_command(session: &mut Session, cmd: Command) -> String {
    if NOT_QUEUEABLE.contains(&cmd.name.as_str()) {
        return CommandError::NotAllowedInTransactions(cmd.name.clone()).to_resp();
    }

    if let Some(error) = validate(&cmd) {
        return error.to_resp();
    }

    if let Some(queue) = session.queued.as_mut() {
        queue.push(cmd);
    }
    RespValue::SimpleString("QUEUED".to_string()).encode()
}

/// Arity validation without execution, used at transaction queue time.
/// Returns the error a later execution would raise for a malformed frame.
pub fn validate(cmd: &Command) -> Option<CommandError> {
    let args = cmd.args.clone();
    match cmd.name.as_str() {
        "PING" => ping::PingArguments::parse(args).err(),
        "ECHO" => echo::EchoArguments::parse(args).err(),
        "GET" => get::GetArguments::parse(args).err(),
        "SET" => set::SetArguments::parse(args).err(),
        "INCR" => incr::IncrArguments::parse(args).err(),
        "DEL" => del::DelArguments::parse(args).err(),
        "EXISTS" => exists::ExistsArguments::parse(args).err(),
        "TYPE" => type_command::TypeArguments::parse(args).err(),
        "KEYS" => keys::KeysArguments::parse(args).err(),
        "RPUSH" => push::PushArguments::parse(args, "RPUSH").err(),
        "LPUSH" => push::PushArguments::parse(args, "LPUSH").err(),
        "LPOP" => lpop::LpopArguments::parse(args).err(),
        "LLEN" => llen::LlenArguments::parse(args).err(),
        "LRANGE" => lrange::LrangeArguments::parse(args).err(),
        "BLPOP" => blpop::BlpopArguments::parse(args).err(),
        "ZADD" => zadd::ZaddArguments::parse(args).err(),
        "ZSCORE" => zscore::ZscoreArguments::parse(args).err(),
        "ZRANK" => zrank::ZrankArguments::parse(args).err(),
        "ZRANGE" => zrange::ZrangeArguments::parse(args).err(),
        "ZREM" => zrem::ZremArguments::parse(args).err(),
        "ZCARD" => zcard::ZcardArguments::parse(args).err(),
        "XADD" => xadd::XaddArguments::parse(args).err(),
        "XRANGE" => xrange::XrangeArguments::parse(args).err(),
        "XREAD" => xread::XreadArguments::parse(args).err(),
        "PUBLISH" => pub_sub::PublishArguments::parse(args).err(),
        "WATCH" => watch::WatchArguments::parse(args).err(),
        "INFO" => replication::InfoArguments::parse(args).err(),
        "REPLCONF" => replication::ReplconfArguments::parse(args).err(),
        "CONFIG" => config_get::ConfigGetArguments::parse(args).err(),
        "MULTI" | "EXEC" | "DISCARD" | "QUIT" | "RESET" => None,
        _ => Some(CommandError::UnknownCommand(cmd.name.clone())),
    }
}

/// Executes one command and returns its encoded reply. `in_exec` degrades
/// blocking commands to their immediate form.
pub async fn execute(session: &mut Session, cmd: &Command, in_exec: bool) -> String {
    let shared = Arc::clone(&session.shared);
    let args = cmd.args.clone();

    let result = match cmd.name.as_str() {
        "PING" => ping::ping(session, args),
        "ECHO" => echo::echo(args),
        "GET" => get::get(&shared, args).await,
        "SET" => set::set(&shared, args).await,
        "INCR" => incr::incr(&shared, args).await,
        "DEL" => del::del(&shared, args).await,
        "EXISTS" => exists::exists(&shared, args).await,
        "TYPE" => type_command::type_command(&shared, args).await,
        "KEYS" => keys::keys(&shared, args).await,
        "RPUSH" => push::rpush(&shared, args).await,
        "LPUSH" => push::lpush(&shared, args).await,
        "LPOP" => lpop::lpop(&shared, args).await,
        "LLEN" => llen::llen(&shared, args).await,
        "LRANGE" => lrange::lrange(&shared, args).await,
        "BLPOP" => blpop::blpop(&shared, args, in_exec).await,
        "ZADD" => zadd::zadd(&shared, args).await,
        "ZSCORE" => zscore::zscore(&shared, args).await,
        "ZRANK" => zrank::zrank(&shared, args).await,
        "ZRANGE" => zrange::zrange(&shared, args).await,
        "ZREM" => zrem::zrem(&shared, args).await,
        "ZCARD" => zcard::zcard(&shared, args).await,
        "XADD" => xadd::xadd(&shared, args).await,
        "XRANGE" => xrange::xrange(&shared, args).await,
        "XREAD" => xread::xread(&shared, args, in_exec).await,
        "SUBSCRIBE" => pub_sub::subscribe(session, args).await,
        "UNSUBSCRIBE" => pub_sub::unsubscribe(session, args).await,
        "PSUBSCRIBE" => pub_sub::psubscribe(session, args).await,
        "PUNSUBSCRIBE" => pub_sub::punsubscribe(session, args).await,
        "PUBLISH" => pub_sub::publish(&shared, args).await,
        "WATCH" => watch::watch(args),
        "INFO" => replication::info(&shared, args).await,
        "REPLCONF" => replication::replconf(args),
        "CONFIG" => config_get::config_get(&shared, args).await,
        other => Err(CommandError::UnknownCommand(other.to_string())),
    };

    match result {
        Ok(reply) => reply,
        Err(error) => error.to_resp(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_from_resp() {
        let frame = RespValue::from_strings(["get", "mykey"]);
        let cmd = Command::from_resp(&frame).unwrap();
        assert_eq!(cmd.name, "GET");
        assert_eq!(cmd.args, vec!["mykey".to_string()]);

        let bad_frames = vec![
            RespValue::SimpleString("PING".to_string()),
            RespValue::Array(vec![]),
            RespValue::Array(vec![RespValue::Integer(1)]),
            RespValue::Array(vec![
                RespValue::BulkString("GET".to_string()),
                RespValue::Integer(1),
            ]),
        ];
        for frame in bad_frames {
            assert_eq!(
                Command::from_resp(&frame).err(),
                Some(CommandError::MalformedCommandFrame),
                "{:?}",
                frame
            );
        }
    }

    #[test]
    fn test_validate_covers_unknown_and_arity() {
        assert_eq!(
            validate(&Command::from_parts(&["NOPE"])),
            Some(CommandError::UnknownCommand("NOPE".to_string()))
        );
        assert_eq!(
            validate(&Command::from_parts(&["GET"])),
            Some(CommandError::wrong_arity("GET"))
        );
        assert_eq!(validate(&Command::from_parts(&["GET", "k"])), None);
        assert_eq!(validate(&Command::from_parts(&["MULTI"])), None);
    }
}
