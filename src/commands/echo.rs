use crate::commands::error::CommandError;
use crate::resp::RespValue;

pub struct EchoArguments {
    message: String,
}

impl EchoArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::wrong_arity("ECHO"));
        }

        Ok(Self {
            message: arguments.into_iter().next().unwrap_or_default(),
        })
    }
}

pub fn echo(arguments: Vec<String>) -> Result<String, CommandError> {
    let echo_arguments = EchoArguments::parse(arguments)?;
    Ok(RespValue::BulkString(echo_arguments.message).encode())
}
