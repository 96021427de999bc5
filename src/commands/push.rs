//! RPUSH and LPUSH.
//!
//! Pushes are the wake source for `BLPOP`: after the store mutation commits,
//! and still inside the stores critical section, freshly pushed elements are
//! handed to parked waiters oldest-first. The push itself is captured for
//! replication, followed by one `LPOP` frame per element a waiter consumed,
//! so replicas converge with the post-handoff state.

use crate::commands::ensure_kind;
use crate::commands::error::CommandError;
use crate::resp::RespValue;
use crate::server::Shared;
use crate::store::ValueKind;

pub struct PushArguments {
    key: String,
    values: Vec<String>,
}

impl PushArguments {
    pub fn parse(arguments: Vec<String>, command: &str) -> Result<Self, CommandError> {
        if arguments.len() < 2 {
            return Err(CommandError::wrong_arity(command));
        }

        let mut iter = arguments.into_iter();
        Ok(Self {
            key: iter.next().unwrap_or_default(),
            values: iter.collect(),
        })
    }
}

/// Handles RPUSH, replying with the list length right after the append.
pub async fn rpush(shared: &Shared, arguments: Vec<String>) -> Result<String, CommandError> {
    push(shared, arguments, "RPUSH").await
}

/// Handles LPUSH. Values are prepended left to right, so the last argument
/// ends up at the head.
pub async fn lpush(shared: &Shared, arguments: Vec<String>) -> Result<String, CommandError> {
    push(shared, arguments, "LPUSH").await
}

async fn push(
    shared: &Shared,
    arguments: Vec<String>,
    command: &str,
) -> Result<String, CommandError> {
    let push_arguments = PushArguments::parse(arguments.clone(), command)?;

    let mut stores = shared.stores.lock().await;
    ensure_kind(&mut stores, &push_arguments.key, ValueKind::List)?;

    let length = if command == "RPUSH" {
        stores.lists.rpush(&push_arguments.key, push_arguments.values)
    } else {
        stores.lists.lpush(&push_arguments.key, push_arguments.values)
    };

    let mut waiters = shared.waiters.lock().await;
    let delivered = waiters.drain_list_waiters(&mut stores.lists, &push_arguments.key);
    drop(waiters);

    let mut replication = shared.replication.lock().await;
    replication.capture(command, &arguments);
    for _ in 0..delivered {
        replication.capture("LPOP", std::slice::from_ref(&push_arguments.key));
    }

    Ok(RespValue::Integer(length as i64).encode())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let ok = PushArguments::parse(
            vec!["k".to_string(), "a".to_string(), "b".to_string()],
            "RPUSH",
        )
        .unwrap();
        assert_eq!(ok.key, "k");
        assert_eq!(ok.values, vec!["a".to_string(), "b".to_string()]);

        assert_eq!(
            PushArguments::parse(vec!["k".to_string()], "LPUSH").err(),
            Some(CommandError::wrong_arity("LPUSH"))
        );
    }
}
