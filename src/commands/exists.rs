use crate::commands::error::CommandError;
use crate::resp::RespValue;
use crate::server::Shared;

pub struct ExistsArguments {
    keys: Vec<String>,
}

impl ExistsArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.is_empty() {
            return Err(CommandError::wrong_arity("EXISTS"));
        }

        Ok(Self { keys: arguments })
    }
}

/// Handles EXISTS. Keys are counted per occurrence, so repeating a live key
/// counts it again.
pub async fn exists(shared: &Shared, arguments: Vec<String>) -> Result<String, CommandError> {
    let exists_arguments = ExistsArguments::parse(arguments)?;

    let mut stores = shared.stores.lock().await;
    let count = exists_arguments
        .keys
        .iter()
        .filter(|key| stores.exists(key))
        .count();

    Ok(RespValue::Integer(count as i64).encode())
}
