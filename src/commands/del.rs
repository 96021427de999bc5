use crate::commands::error::CommandError;
use crate::resp::RespValue;
use crate::server::Shared;

pub struct DelArguments {
    keys: Vec<String>,
}

impl DelArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.is_empty() {
            return Err(CommandError::wrong_arity("DEL"));
        }

        Ok(Self { keys: arguments })
    }
}

/// Handles DEL across all stores, returning the number of keys actually
/// removed. The write is captured only when something changed.
pub async fn del(shared: &Shared, arguments: Vec<String>) -> Result<String, CommandError> {
    let del_arguments = DelArguments::parse(arguments.clone())?;

    let mut stores = shared.stores.lock().await;
    let mut removed = 0;
    for key in &del_arguments.keys {
        if stores.remove(key) {
            removed += 1;
        }
    }

    if removed > 0 {
        let mut replication = shared.replication.lock().await;
        replication.capture("DEL", &arguments);
    }

    Ok(RespValue::Integer(removed).encode())
}
