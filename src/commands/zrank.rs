use crate::commands::{ensure_kind, error::CommandError};
use crate::resp::RespValue;
use crate::server::Shared;
use crate::store::ValueKind;

pub struct ZrankArguments {
    key: String,
    member: String,
}

impl ZrankArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 2 {
            return Err(CommandError::wrong_arity("ZRANK"));
        }

        let mut iter = arguments.into_iter();
        Ok(Self {
            key: iter.next().unwrap_or_default(),
            member: iter.next().unwrap_or_default(),
        })
    }
}

/// Handles ZRANK: the member's 0-based position in `(score, member)` order,
/// or a null bulk string when the member (or key) is missing.
pub async fn zrank(shared: &Shared, arguments: Vec<String>) -> Result<String, CommandError> {
    let zrank_arguments = ZrankArguments::parse(arguments)?;

    let mut stores = shared.stores.lock().await;
    ensure_kind(&mut stores, &zrank_arguments.key, ValueKind::SortedSet)?;

    match stores
        .zsets
        .rank(&zrank_arguments.key, &zrank_arguments.member)
    {
        Some(rank) => Ok(RespValue::Integer(rank as i64).encode()),
        None => Ok(RespValue::NullBulkString.encode()),
    }
}
