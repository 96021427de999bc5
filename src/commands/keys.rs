use globset::Glob;

use crate::commands::error::CommandError;
use crate::resp::RespValue;
use crate::server::Shared;

pub struct KeysArguments {
    pattern: String,
}

impl KeysArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::wrong_arity("KEYS"));
        }

        Ok(Self {
            pattern: arguments.into_iter().next().unwrap_or_default(),
        })
    }
}

/// Handles KEYS: every live key across every store matching the glob
/// pattern. `*` matches any sequence; the full glob syntax comes with the
/// matcher.
pub async fn keys(shared: &Shared, arguments: Vec<String>) -> Result<String, CommandError> {
    let keys_arguments = KeysArguments::parse(arguments)?;

    let matcher = Glob::new(&keys_arguments.pattern)
        .map_err(|_| CommandError::InvalidGlobPattern)?
        .compile_matcher();

    let mut stores = shared.stores.lock().await;
    let matched = stores
        .live_keys()
        .into_iter()
        .filter(|key| matcher.is_match(key))
        .map(RespValue::BulkString)
        .collect::<Vec<_>>();

    Ok(RespValue::Array(matched).encode())
}
