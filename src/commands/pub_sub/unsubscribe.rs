use std::sync::Arc;

use crate::commands::error::CommandError;
use crate::resp::RespValue;
use crate::session::Session;

pub struct UnsubscribeArguments {
    channels: Vec<String>,
}

impl UnsubscribeArguments {
    /// No arguments means "everything of this kind".
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        Ok(Self {
            channels: arguments,
        })
    }
}

/// Handles UNSUBSCRIBE: one `["unsubscribe", channel, count]` frame per
/// channel. Without arguments every current channel subscription is dropped;
/// with none to drop, a single frame with a null channel and the current
/// count is sent.
pub async fn unsubscribe(
    session: &mut Session,
    arguments: Vec<String>,
) -> Result<String, CommandError> {
    let unsubscribe_arguments = UnsubscribeArguments::parse(arguments)?;

    let shared = Arc::clone(&session.shared);
    let mut registry = shared.pubsub.lock().await;

    let channels = if unsubscribe_arguments.channels.is_empty() {
        registry.channels_of(session.id)
    } else {
        unsubscribe_arguments.channels
    };

    if channels.is_empty() {
        let count = registry.subscription_count(session.id);
        return Ok(RespValue::Array(vec![
            RespValue::BulkString("unsubscribe".to_string()),
            RespValue::NullBulkString,
            RespValue::Integer(count as i64),
        ])
        .encode());
    }

    let mut reply = String::new();
    for channel in channels {
        let count = registry.unsubscribe(session.id, &channel);
        reply.push_str(
            &RespValue::Array(vec![
                RespValue::BulkString("unsubscribe".to_string()),
                RespValue::BulkString(channel),
                RespValue::Integer(count as i64),
            ])
            .encode(),
        );
    }

    Ok(reply)
}

/// Handles PUNSUBSCRIBE, symmetric to [`unsubscribe`] over patterns.
pub async fn punsubscribe(
    session: &mut Session,
    arguments: Vec<String>,
) -> Result<String, CommandError> {
    let unsubscribe_arguments = UnsubscribeArguments::parse(arguments)?;

    let shared = Arc::clone(&session.shared);
    let mut registry = shared.pubsub.lock().await;

    let patterns = if unsubscribe_arguments.channels.is_empty() {
        registry.patterns_of(session.id)
    } else {
        unsubscribe_arguments.channels
    };

    if patterns.is_empty() {
        let count = registry.subscription_count(session.id);
        return Ok(RespValue::Array(vec![
            RespValue::BulkString("punsubscribe".to_string()),
            RespValue::NullBulkString,
            RespValue::Integer(count as i64),
        ])
        .encode());
    }

    let mut reply = String::new();
    for pattern in patterns {
        let count = registry.unsubscribe_pattern(session.id, &pattern);
        reply.push_str(
            &RespValue::Array(vec![
                RespValue::BulkString("punsubscribe".to_string()),
                RespValue::BulkString(pattern),
                RespValue::Integer(count as i64),
            ])
            .encode(),
        );
    }

    Ok(reply)
}
