use crate::commands::{ensure_kind, error::CommandError};
use crate::resp::RespValue;
use crate::server::Shared;
use crate::store::ValueKind;

pub struct LpopArguments {
    key: String,
    count: Option<usize>,
}

impl LpopArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.is_empty() || arguments.len() > 2 {
            return Err(CommandError::wrong_arity("LPOP"));
        }

        let count = match arguments.get(1) {
            Some(raw) => Some(
                raw.parse::<usize>()
                    .map_err(|_| CommandError::NotAnInteger)?,
            ),
            None => None,
        };

        Ok(Self {
            key: arguments.into_iter().next().unwrap_or_default(),
            count,
        })
    }
}

/// Handles LPOP.
///
/// Without a count the reply is the popped element or a null bulk string.
/// With a count it is an array of up to `count` elements, or a null array
/// when the key does not exist. Draining the list deletes the key. Pops that
/// modified the list are captured for replication.
pub async fn lpop(shared: &Shared, arguments: Vec<String>) -> Result<String, CommandError> {
    let lpop_arguments = LpopArguments::parse(arguments.clone())?;

    let mut stores = shared.stores.lock().await;
    ensure_kind(&mut stores, &lpop_arguments.key, ValueKind::List)?;

    let reply = match lpop_arguments.count {
        None => match stores.lists.pop_front(&lpop_arguments.key) {
            Some(element) => RespValue::BulkString(element),
            None => RespValue::NullBulkString,
        },
        Some(count) => match stores.lists.pop_count(&lpop_arguments.key, count) {
            Some(elements) => RespValue::from_strings(elements),
            None => RespValue::NullArray,
        },
    };

    let modified = !matches!(reply, RespValue::NullBulkString | RespValue::NullArray);
    if modified {
        let mut replication = shared.replication.lock().await;
        replication.capture("LPOP", &arguments);
    }

    Ok(reply.encode())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let plain = LpopArguments::parse(vec!["k".to_string()]).unwrap();
        assert_eq!(plain.count, None);

        let counted = LpopArguments::parse(vec!["k".to_string(), "3".to_string()]).unwrap();
        assert_eq!(counted.count, Some(3));

        assert_eq!(
            LpopArguments::parse(vec![]).err(),
            Some(CommandError::wrong_arity("LPOP"))
        );
        assert_eq!(
            LpopArguments::parse(vec!["k".to_string(), "x".to_string()]).err(),
            Some(CommandError::NotAnInteger)
        );
    }
}
