//! Command-level errors.
//!
//! The `Display` form of each variant is the exact RESP error payload
//! clients see; [`CommandError::to_resp`] wraps it in an error frame.
//! Command errors are per-command: they never terminate the session.

use thiserror::Error;

use crate::resp::RespValue;
use crate::store::stream::StreamIdError;

#[derive(Error, Debug, PartialEq)]
pub enum CommandError {
    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongNumberOfArguments(String),
    #[error("ERR Unknown command '{0}'")]
    UnknownCommand(String),
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,
    #[error("ERR value is not an integer or out of range")]
    NotAnInteger,
    #[error("ERR value is not a valid float")]
    NotAFloat,
    #[error(transparent)]
    StreamId(#[from] StreamIdError),
    #[error("ERR MULTI calls can not be nested")]
    NestedMulti,
    #[error("ERR EXEC without MULTI")]
    ExecWithoutMulti,
    #[error("ERR DISCARD without MULTI")]
    DiscardWithoutMulti,
    #[error("ERR {0} is not allowed in transactions")]
    NotAllowedInTransactions(String),
    #[error(
        "ERR Can't execute '{0}': only (P|S)SUBSCRIBE / (P|S)UNSUBSCRIBE / PING / QUIT / RESET are allowed in this context"
    )]
    RestrictedInSubscribeMode(String),
    #[error("READONLY You can't write against a read only replica.")]
    ReadOnlyReplica,
    #[error("ERR timeout is negative")]
    NegativeTimeout,
    #[error("ERR timeout is not a float or out of range")]
    InvalidTimeout,
    #[error("ERR syntax error")]
    Syntax,
    #[error("ERR invalid expire time in 'set' command")]
    InvalidExpireTime,
    #[error("ERR invalid glob pattern")]
    InvalidGlobPattern,
    #[error("ERR command frame must be an array of bulk strings")]
    MalformedCommandFrame,
}

impl CommandError {
    /// Shorthand for the arity error, which every parser reports with the
    /// lowercase command name.
    pub fn wrong_arity(command: &str) -> CommandError {
        CommandError::WrongNumberOfArguments(command.to_lowercase())
    }

    /// Encodes the error as a RESP error frame.
    pub fn to_resp(&self) -> String {
        RespValue::Error(self.to_string()).encode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_texts_are_exact() {
        let test_cases = vec![
            (
                CommandError::wrong_arity("SET"),
                "-ERR wrong number of arguments for 'set' command\r\n",
            ),
            (
                CommandError::UnknownCommand("FOO".to_string()),
                "-ERR Unknown command 'FOO'\r\n",
            ),
            (
                CommandError::WrongType,
                "-WRONGTYPE Operation against a key holding the wrong kind of value\r\n",
            ),
            (
                CommandError::NotAnInteger,
                "-ERR value is not an integer or out of range\r\n",
            ),
            (
                CommandError::NotAFloat,
                "-ERR value is not a valid float\r\n",
            ),
            (
                CommandError::StreamId(StreamIdError::NotGreaterThanZero),
                "-ERR The ID specified in XADD must be greater than 0-0\r\n",
            ),
            (
                CommandError::StreamId(StreamIdError::NotGreaterThanTop),
                "-ERR The ID specified in XADD is equal or smaller than the target stream top item\r\n",
            ),
            (
                CommandError::NestedMulti,
                "-ERR MULTI calls can not be nested\r\n",
            ),
            (
                CommandError::ExecWithoutMulti,
                "-ERR EXEC without MULTI\r\n",
            ),
            (
                CommandError::DiscardWithoutMulti,
                "-ERR DISCARD without MULTI\r\n",
            ),
            (
                CommandError::RestrictedInSubscribeMode("get".to_string()),
                "-ERR Can't execute 'get': only (P|S)SUBSCRIBE / (P|S)UNSUBSCRIBE / PING / QUIT / RESET are allowed in this context\r\n",
            ),
            (
                CommandError::ReadOnlyReplica,
                "-READONLY You can't write against a read only replica.\r\n",
            ),
        ];

        for (error, expected) in test_cases {
            assert_eq!(error.to_resp(), expected);
        }
    }
}
