use crate::commands::error::CommandError;
use crate::resp::RespValue;

pub struct WatchArguments;

impl WatchArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.is_empty() {
            return Err(CommandError::wrong_arity("WATCH"));
        }

        Ok(Self)
    }
}

/// Handles WATCH. Accepted for client compatibility; no keys are tracked
/// and EXEC never aborts on their account.
pub fn watch(arguments: Vec<String>) -> Result<String, CommandError> {
    WatchArguments::parse(arguments)?;
    Ok(RespValue::SimpleString("OK".to_string()).encode())
}
