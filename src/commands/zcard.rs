use crate::commands::{ensure_kind, error::CommandError};
use crate::resp::RespValue;
use crate::server::Shared;
use crate::store::ValueKind;

pub struct ZcardArguments {
    key: String,
}

impl ZcardArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::wrong_arity("ZCARD"));
        }

        Ok(Self {
            key: arguments.into_iter().next().unwrap_or_default(),
        })
    }
}

pub async fn zcard(shared: &Shared, arguments: Vec<String>) -> Result<String, CommandError> {
    let zcard_arguments = ZcardArguments::parse(arguments)?;

    let mut stores = shared.stores.lock().await;
    ensure_kind(&mut stores, &zcard_arguments.key, ValueKind::SortedSet)?;

    Ok(RespValue::Integer(stores.zsets.card(&zcard_arguments.key) as i64).encode())
}
