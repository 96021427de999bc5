use crate::commands::error::CommandError;
use crate::resp::RespValue;

pub struct ReplconfArguments;

impl ReplconfArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.is_empty() {
            return Err(CommandError::wrong_arity("REPLCONF"));
        }

        Ok(Self)
    }
}

/// Handles REPLCONF. The handshake subcommands (`listening-port`, `capa`)
/// carry no server-side state here; everything acknowledges with `+OK`.
pub fn replconf(arguments: Vec<String>) -> Result<String, CommandError> {
    ReplconfArguments::parse(arguments)?;
    Ok(RespValue::SimpleString("OK".to_string()).encode())
}
