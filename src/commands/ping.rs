use crate::commands::error::CommandError;
use crate::resp::RespValue;
use crate::session::Session;

pub struct PingArguments {
    message: Option<String>,
}

impl PingArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() > 1 {
            return Err(CommandError::wrong_arity("PING"));
        }

        Ok(Self {
            message: arguments.into_iter().next(),
        })
    }
}

/// Handles PING.
///
/// Outside subscribe mode the reply is `+PONG` (or the message echoed as a
/// bulk string). A subscribed client instead receives the array form
/// `["pong", <message-or-empty>]`, matching what subscribe-mode clients
/// expect to multiplex with channel messages.
pub fn ping(session: &Session, arguments: Vec<String>) -> Result<String, CommandError> {
    let ping_arguments = PingArguments::parse(arguments)?;

    if session.subscribed {
        let message = ping_arguments.message.unwrap_or_default();
        return Ok(RespValue::Array(vec![
            RespValue::BulkString("pong".to_string()),
            RespValue::BulkString(message),
        ])
        .encode());
    }

    match ping_arguments.message {
        Some(message) => Ok(RespValue::BulkString(message).encode()),
        None => Ok(RespValue::SimpleString("PONG".to_string()).encode()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert!(PingArguments::parse(vec![]).is_ok());
        assert!(PingArguments::parse(vec!["hi".to_string()]).is_ok());
        assert_eq!(
            PingArguments::parse(vec!["a".to_string(), "b".to_string()]).err(),
            Some(CommandError::wrong_arity("PING"))
        );
    }
}
