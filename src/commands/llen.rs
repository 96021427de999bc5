use crate::commands::{ensure_kind, error::CommandError};
use crate::resp::RespValue;
use crate::server::Shared;
use crate::store::ValueKind;

pub struct LlenArguments {
    key: String,
}

impl LlenArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::wrong_arity("LLEN"));
        }

        Ok(Self {
            key: arguments.into_iter().next().unwrap_or_default(),
        })
    }
}

pub async fn llen(shared: &Shared, arguments: Vec<String>) -> Result<String, CommandError> {
    let llen_arguments = LlenArguments::parse(arguments)?;

    let mut stores = shared.stores.lock().await;
    ensure_kind(&mut stores, &llen_arguments.key, ValueKind::List)?;

    Ok(RespValue::Integer(stores.lists.len(&llen_arguments.key) as i64).encode())
}
