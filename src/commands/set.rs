use tokio::time::Duration;

use crate::commands::error::CommandError;
use crate::resp::RespValue;
use crate::server::Shared;

pub struct SetArguments {
    key: String,
    value: String,
    expire_in: Option<Duration>,
}

impl SetArguments {
    /// Parses `SET key value [PX milliseconds]`.
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 2 && arguments.len() != 4 {
            return Err(CommandError::wrong_arity("SET"));
        }

        let mut expire_in = None;
        if arguments.len() == 4 {
            if !arguments[2].eq_ignore_ascii_case("px") {
                return Err(CommandError::Syntax);
            }
            let millis = arguments[3]
                .parse::<u64>()
                .map_err(|_| CommandError::InvalidExpireTime)?;
            if millis == 0 {
                return Err(CommandError::InvalidExpireTime);
            }
            expire_in = Some(Duration::from_millis(millis));
        }

        let mut iter = arguments.into_iter();
        Ok(Self {
            key: iter.next().unwrap_or_default(),
            value: iter.next().unwrap_or_default(),
            expire_in,
        })
    }
}

/// Handles SET.
///
/// Always succeeds: a key of any prior type is replaced wholesale by the
/// string entry. The write is captured for replication after it commits.
pub async fn set(shared: &Shared, arguments: Vec<String>) -> Result<String, CommandError> {
    let set_arguments = SetArguments::parse(arguments.clone())?;

    let mut stores = shared.stores.lock().await;
    stores.remove(&set_arguments.key);
    stores
        .strings
        .set(set_arguments.key, set_arguments.value, set_arguments.expire_in);

    let mut replication = shared.replication.lock().await;
    replication.capture("SET", &arguments);

    Ok(RespValue::SimpleString("OK".to_string()).encode())
}
