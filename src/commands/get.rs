use crate::commands::{ensure_kind, error::CommandError};
use crate::resp::RespValue;
use crate::server::Shared;
use crate::store::ValueKind;

pub struct GetArguments {
    key: String,
}

impl GetArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::wrong_arity("GET"));
        }

        Ok(Self {
            key: arguments.into_iter().next().unwrap_or_default(),
        })
    }
}

/// Handles GET. Lazy expiry runs before the lookup, so an entry past its
/// deadline reads as missing.
pub async fn get(shared: &Shared, arguments: Vec<String>) -> Result<String, CommandError> {
    let get_arguments = GetArguments::parse(arguments)?;

    let mut stores = shared.stores.lock().await;
    ensure_kind(&mut stores, &get_arguments.key, ValueKind::String)?;

    match stores.strings.get(&get_arguments.key) {
        Some(value) => Ok(RespValue::BulkString(value.to_string()).encode()),
        None => Ok(RespValue::NullBulkString.encode()),
    }
}
