use crate::commands::{ensure_kind, error::CommandError};
use crate::resp::RespValue;
use crate::server::Shared;
use crate::store::ValueKind;

pub struct ZrangeArguments {
    key: String,
    start: i64,
    stop: i64,
}

impl ZrangeArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 3 {
            return Err(CommandError::wrong_arity("ZRANGE"));
        }

        let start = arguments[1]
            .parse::<i64>()
            .map_err(|_| CommandError::NotAnInteger)?;
        let stop = arguments[2]
            .parse::<i64>()
            .map_err(|_| CommandError::NotAnInteger)?;

        Ok(Self {
            key: arguments.into_iter().next().unwrap_or_default(),
            start,
            stop,
        })
    }
}

/// Handles ZRANGE with the same index semantics as LRANGE, walking members
/// in rank order.
pub async fn zrange(shared: &Shared, arguments: Vec<String>) -> Result<String, CommandError> {
    let zrange_arguments = ZrangeArguments::parse(arguments)?;

    let mut stores = shared.stores.lock().await;
    ensure_kind(&mut stores, &zrange_arguments.key, ValueKind::SortedSet)?;

    let members = stores.zsets.range(
        &zrange_arguments.key,
        zrange_arguments.start,
        zrange_arguments.stop,
    );

    Ok(RespValue::from_strings(members).encode())
}
