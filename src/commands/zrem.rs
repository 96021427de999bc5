use crate::commands::{ensure_kind, error::CommandError};
use crate::resp::RespValue;
use crate::server::Shared;
use crate::store::ValueKind;

pub struct ZremArguments {
    key: String,
    member: String,
}

impl ZremArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 2 {
            return Err(CommandError::wrong_arity("ZREM"));
        }

        let mut iter = arguments.into_iter();
        Ok(Self {
            key: iter.next().unwrap_or_default(),
            member: iter.next().unwrap_or_default(),
        })
    }
}

/// Handles ZREM: 1 when the member was removed, 0 when absent. Removing the
/// last member deletes the key. Only an effective removal is captured.
pub async fn zrem(shared: &Shared, arguments: Vec<String>) -> Result<String, CommandError> {
    let zrem_arguments = ZremArguments::parse(arguments.clone())?;

    let mut stores = shared.stores.lock().await;
    ensure_kind(&mut stores, &zrem_arguments.key, ValueKind::SortedSet)?;

    let removed = stores
        .zsets
        .remove(&zrem_arguments.key, &zrem_arguments.member);

    if removed {
        let mut replication = shared.replication.lock().await;
        replication.capture("ZREM", &arguments);
    }

    Ok(RespValue::Integer(if removed { 1 } else { 0 }).encode())
}
