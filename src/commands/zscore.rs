use crate::commands::{ensure_kind, error::CommandError, format_score};
use crate::resp::RespValue;
use crate::server::Shared;
use crate::store::ValueKind;

pub struct ZscoreArguments {
    key: String,
    member: String,
}

impl ZscoreArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 2 {
            return Err(CommandError::wrong_arity("ZSCORE"));
        }

        let mut iter = arguments.into_iter();
        Ok(Self {
            key: iter.next().unwrap_or_default(),
            member: iter.next().unwrap_or_default(),
        })
    }
}

pub async fn zscore(shared: &Shared, arguments: Vec<String>) -> Result<String, CommandError> {
    let zscore_arguments = ZscoreArguments::parse(arguments)?;

    let mut stores = shared.stores.lock().await;
    ensure_kind(&mut stores, &zscore_arguments.key, ValueKind::SortedSet)?;

    match stores
        .zsets
        .score(&zscore_arguments.key, &zscore_arguments.member)
    {
        Some(score) => Ok(RespValue::BulkString(format_score(score)).encode()),
        None => Ok(RespValue::NullBulkString.encode()),
    }
}
