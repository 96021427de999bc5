use crate::commands::{ensure_kind, error::CommandError};
use crate::resp::RespValue;
use crate::server::Shared;
use crate::store::ValueKind;

pub struct IncrArguments {
    key: String,
}

impl IncrArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::wrong_arity("INCR"));
        }

        Ok(Self {
            key: arguments.into_iter().next().unwrap_or_default(),
        })
    }
}

/// Handles INCR. A missing key counts up from zero; a value that does not
/// parse as a signed 64-bit integer (or would overflow) is an error.
pub async fn incr(shared: &Shared, arguments: Vec<String>) -> Result<String, CommandError> {
    let incr_arguments = IncrArguments::parse(arguments.clone())?;

    let mut stores = shared.stores.lock().await;
    ensure_kind(&mut stores, &incr_arguments.key, ValueKind::String)?;

    let Some(value) = stores.strings.increment(&incr_arguments.key) else {
        return Err(CommandError::NotAnInteger);
    };

    let mut replication = shared.replication.lock().await;
    replication.capture("INCR", &arguments);

    Ok(RespValue::Integer(value).encode())
}
