use std::sync::Arc;

use crate::commands::error::CommandError;
use crate::resp::RespValue;
use crate::session::Session;

pub struct SubscribeArguments {
    channels: Vec<String>,
}

impl SubscribeArguments {
    pub fn parse(arguments: Vec<String>, command: &str) -> Result<Self, CommandError> {
        if arguments.is_empty() {
            return Err(CommandError::wrong_arity(command));
        }

        Ok(Self {
            channels: arguments,
        })
    }
}

/// Handles SUBSCRIBE.
///
/// Registers the session's outbox for each channel and emits one
/// `["subscribe", channel, count]` frame per channel, where the count is the
/// client's total subscriptions after that insert. The first subscription
/// switches the session into subscribe mode for the rest of the connection.
pub async fn subscribe(
    session: &mut Session,
    arguments: Vec<String>,
) -> Result<String, CommandError> {
    let subscribe_arguments = SubscribeArguments::parse(arguments, "SUBSCRIBE")?;

    let shared = Arc::clone(&session.shared);
    let mut registry = shared.pubsub.lock().await;
    let mut reply = String::new();

    for channel in subscribe_arguments.channels {
        let count = registry.subscribe(session.id, &channel, session.outbox.clone());
        reply.push_str(
            &RespValue::Array(vec![
                RespValue::BulkString("subscribe".to_string()),
                RespValue::BulkString(channel),
                RespValue::Integer(count as i64),
            ])
            .encode(),
        );
    }

    session.subscribed = true;
    Ok(reply)
}

/// Handles PSUBSCRIBE. Patterns are recorded and counted; no messages are
/// delivered through them.
pub async fn psubscribe(
    session: &mut Session,
    arguments: Vec<String>,
) -> Result<String, CommandError> {
    let subscribe_arguments = SubscribeArguments::parse(arguments, "PSUBSCRIBE")?;

    let shared = Arc::clone(&session.shared);
    let mut registry = shared.pubsub.lock().await;
    let mut reply = String::new();

    for pattern in subscribe_arguments.channels {
        let count = registry.subscribe_pattern(session.id, &pattern);
        reply.push_str(
            &RespValue::Array(vec![
                RespValue::BulkString("psubscribe".to_string()),
                RespValue::BulkString(pattern),
                RespValue::Integer(count as i64),
            ])
            .encode(),
        );
    }

    session.subscribed = true;
    Ok(reply)
}
