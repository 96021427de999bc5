use crate::commands::{ensure_kind, error::CommandError};
use crate::resp::RespValue;
use crate::server::Shared;
use crate::store::ValueKind;

pub struct LrangeArguments {
    key: String,
    start: i64,
    stop: i64,
}

impl LrangeArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 3 {
            return Err(CommandError::wrong_arity("LRANGE"));
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

/// Handles LRANGE. Indices may be negative (counted from the tail); an
/// out-of-window range replies with an empty array.
pub async fn lrange(shared: &Shared, arguments: Vec<String>) -> Result<String, CommandError> {
    let lrange_arguments = LrangeArguments::parse(arguments)?;

    let mut stores = shared.stores.lock().await;
    ensure_kind(&mut stores, &lrange_arguments.key, ValueKind::List)?;

    let elements = stores.lists.range(
        &lrange_arguments.key,
        lrange_arguments.start,
        lrange_arguments.stop,
    );

    Ok(RespValue::from_strings(elements).encode())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let parsed =
            LrangeArguments::parse(vec!["k".to_string(), "0".to_string(), "-1".to_string()])
                .unwrap();
        assert_eq!((parsed.start, parsed.stop), (0, -1));

        assert_eq!(
            LrangeArguments::parse(vec!["k".to_string(), "a".to_string(), "1".to_string()]).err(),
            Some(CommandError::NotAnInteger)
        );
        assert_eq!(
            LrangeArguments::parse(vec!["k".to_string()]).err(),
            Some(CommandError::wrong_arity("LRANGE"))
        );
    }
}
