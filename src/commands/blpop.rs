//! BLPOP: blocking head pop across one or more list keys.
//!
//! The immediate attempt and the waiter registration happen under the same
//! stores critical section the push path uses for its handoff, so a push
//! racing a registration either lands before the scan (and is consumed
//! immediately) or after the record exists (and wakes it). A parked client
//! never misses an element and is always served in arrival order.

use std::slice;

use tokio::sync::oneshot;
use tokio::time::Duration;

use crate::commands::{ensure_kind, error::CommandError};
use crate::resp::RespValue;
use crate::server::Shared;
use crate::store::ValueKind;

pub struct BlpopArguments {
    keys: Vec<String>,
    timeout_secs: f64,
}

impl BlpopArguments {
    /// Parses `BLPOP key [key ...] timeout`, where the timeout is seconds
    /// (fractions allowed; `0` blocks indefinitely).
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() < 2 {
            return Err(CommandError::wrong_arity("BLPOP"));
        }

        let mut keys = arguments;
        let raw_timeout = keys.pop().unwrap_or_default();

        let timeout_secs = raw_timeout
            .parse::<f64>()
            .map_err(|_| CommandError::InvalidTimeout)?;
        if timeout_secs.is_nan() || !timeout_secs.is_finite() {
            return Err(CommandError::InvalidTimeout);
        }
        if timeout_secs < 0.0 {
            return Err(CommandError::NegativeTimeout);
        }

        Ok(Self { keys, timeout_secs })
    }
}

/// Handles BLPOP.
///
/// Each key is tried in argument order first; a hit replies `[key, element]`
/// without parking. Otherwise a single wait record covering every key is
/// registered and the client parks until a push hands it an element, the
/// deadline passes (null reply), or the connection goes away.
///
/// With `immediate_only` (inside `EXEC`) the command degrades to the
/// non-blocking scan and replies null on empty keys.
pub async fn blpop(
    shared: &Shared,
    arguments: Vec<String>,
    immediate_only: bool,
) -> Result<String, CommandError> {
    let blpop_arguments = BlpopArguments::parse(arguments)?;

    let (token, receiver) = {
        let mut stores = shared.stores.lock().await;

        for key in &blpop_arguments.keys {
            ensure_kind(&mut stores, key, ValueKind::List)?;
        }

        for key in &blpop_arguments.keys {
            if let Some(element) = stores.lists.pop_front(key) {
                let mut replication = shared.replication.lock().await;
                replication.capture("LPOP", slice::from_ref(key));
                return Ok(RespValue::from_strings([key.clone(), element]).encode());
            }
        }

        if immediate_only {
            return Ok(RespValue::NullBulkString.encode());
        }

        let mut waiters = shared.waiters.lock().await;
        waiters.register_list_waiter(&blpop_arguments.keys)
    };

    let handoff = wait_for_handoff(receiver, blpop_arguments.timeout_secs).await;

    // Clear whatever records remain: all of them on timeout, the records on
    // the other keys after a successful handoff.
    let mut waiters = shared.waiters.lock().await;
    waiters.cancel_list_waiter(&blpop_arguments.keys, token);
    drop(waiters);

    match handoff {
        Some((key, element)) => Ok(RespValue::from_strings([key, element]).encode()),
        None => Ok(RespValue::NullBulkString.encode()),
    }
}

async fn wait_for_handoff(
    receiver: oneshot::Receiver<(String, String)>,
    timeout_secs: f64,
) -> Option<(String, String)> {
    if timeout_secs == 0.0 {
        return receiver.await.ok();
    }

    match tokio::time::timeout(Duration::from_secs_f64(timeout_secs), receiver).await {
        Ok(result) => result.ok(),
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let single = BlpopArguments::parse(vec!["q".to_string(), "5".to_string()]).unwrap();
        assert_eq!(single.keys, vec!["q".to_string()]);
        assert_eq!(single.timeout_secs, 5.0);

        let multi = BlpopArguments::parse(vec![
            "a".to_string(),
            "b".to_string(),
            "0.5".to_string(),
        ])
        .unwrap();
        assert_eq!(multi.keys, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(multi.timeout_secs, 0.5);

        let test_cases = vec![
            (vec!["q".to_string()], CommandError::wrong_arity("BLPOP")),
            (
                vec!["q".to_string(), "abc".to_string()],
                CommandError::InvalidTimeout,
            ),
            (
                vec!["q".to_string(), "nan".to_string()],
                CommandError::InvalidTimeout,
            ),
            (
                vec!["q".to_string(), "-1".to_string()],
                CommandError::NegativeTimeout,
            ),
        ];
        for (input, expected) in test_cases {
            assert_eq!(BlpopArguments::parse(input).err(), Some(expected));
        }
    }
}
