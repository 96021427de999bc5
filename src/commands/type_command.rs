use crate::commands::error::CommandError;
use crate::resp::RespValue;
use crate::server::Shared;

pub struct TypeArguments {
    key: String,
}

impl TypeArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::wrong_arity("TYPE"));
        }

        Ok(Self {
            key: arguments.into_iter().next().unwrap_or_default(),
        })
    }
}

/// Handles TYPE, consulting every store: `string`, `list`, `zset`, `stream`,
/// or `none` for a missing (or expired) key.
pub async fn type_command(shared: &Shared, arguments: Vec<String>) -> Result<String, CommandError> {
    let type_arguments = TypeArguments::parse(arguments)?;

    let mut stores = shared.stores.lock().await;
    let name = stores
        .kind_of(&type_arguments.key)
        .map(|kind| kind.as_str())
        .unwrap_or("none");

    Ok(RespValue::SimpleString(name.to_string()).encode())
}
