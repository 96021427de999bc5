use crate::commands::error::CommandError;
use crate::resp::RespValue;
use crate::server::Shared;

pub struct ConfigGetArguments {
    parameters: Vec<String>,
}

impl ConfigGetArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() < 2 {
            return Err(CommandError::wrong_arity("CONFIG"));
        }
        if !arguments[0].eq_ignore_ascii_case("get") {
            return Err(CommandError::Syntax);
        }

        Ok(Self {
            parameters: arguments.into_iter().skip(1).collect(),
        })
    }
}

/// Handles `CONFIG GET`, exposing the startup flags `dir` and `dbfilename`
/// as name/value pairs. Unknown or unset parameters are omitted.
pub async fn config_get(shared: &Shared, arguments: Vec<String>) -> Result<String, CommandError> {
    let config_arguments = ConfigGetArguments::parse(arguments)?;

    let mut pairs = Vec::new();
    for parameter in &config_arguments.parameters {
        let value = match parameter.to_ascii_lowercase().as_str() {
            "dir" => shared.config.dir.clone(),
            "dbfilename" => shared.config.dbfilename.clone(),
            _ => None,
        };
        if let Some(value) = value {
            pairs.push(RespValue::BulkString(parameter.to_ascii_lowercase()));
            pairs.push(RespValue::BulkString(value));
        }
    }

    Ok(RespValue::Array(pairs).encode())
}
