//! XADD: append one entry to a stream.
//!
//! Appends are the wake source for `XREAD BLOCK`: after the entry commits,
//! still inside the stores critical section, every reader parked on the key
//! is woken. The write is captured with the *resolved* id so replicas build
//! the same stream regardless of when they apply it.

use crate::commands::{ensure_kind, error::CommandError};
use crate::resp::RespValue;
use crate::server::Shared;
use crate::store::stream::{EntryIdSpec, FieldPairs};
use crate::store::ValueKind;

pub struct XaddArguments {
    key: String,
    id_spec: EntryIdSpec,
    fields: FieldPairs,
}

impl XaddArguments {
    /// Parses `XADD key <id|ms-*|*> field value [field value ...]`.
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() < 4 || arguments[2..].len() % 2 != 0 {
            return Err(CommandError::wrong_arity("XADD"));
        }

        let id_spec = EntryIdSpec::parse(&arguments[1])?;

        let fields = arguments[2..]
            .chunks(2)
            .map(|chunk| (chunk[0].clone(), chunk[1].clone()))
            .collect::<FieldPairs>();

        Ok(Self {
            key: arguments.into_iter().next().unwrap_or_default(),
            id_spec,
            fields,
        })
    }
}

pub async fn xadd(shared: &Shared, arguments: Vec<String>) -> Result<String, CommandError> {
    let xadd_arguments = XaddArguments::parse(arguments.clone())?;

    let mut stores = shared.stores.lock().await;
    ensure_kind(&mut stores, &xadd_arguments.key, ValueKind::Stream)?;

    let id = stores.streams.append(
        &xadd_arguments.key,
        &xadd_arguments.id_spec,
        xadd_arguments.fields,
        now_unix_ms(),
    )?;

    let mut waiters = shared.waiters.lock().await;
    waiters.notify_stream_waiters(&xadd_arguments.key);
    drop(waiters);

    let mut captured = Vec::with_capacity(arguments.len());
    captured.push(arguments[0].clone());
    captured.push(id.to_string());
    captured.extend(arguments[2..].iter().cloned());

    let mut replication = shared.replication.lock().await;
    replication.capture("XADD", &captured);

    Ok(RespValue::BulkString(id.to_string()).encode())
}

fn now_unix_ms() -> u64 {
    jiff::Timestamp::now().as_millisecond().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::stream::StreamId;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse() {
        let parsed = XaddArguments::parse(strings(&["s", "1-1", "a", "1", "b", "2"])).unwrap();
        assert_eq!(parsed.key, "s");
        assert_eq!(
            parsed.id_spec,
            EntryIdSpec::Explicit(StreamId { ms: 1, seq: 1 })
        );
        assert_eq!(parsed.fields.len(), 2);

        let auto = XaddArguments::parse(strings(&["s", "*", "a", "1"])).unwrap();
        assert_eq!(auto.id_spec, EntryIdSpec::Auto);

        let test_cases = vec![
            (strings(&["s", "*"]), CommandError::wrong_arity("XADD")),
            (
                strings(&["s", "*", "a", "1", "orphan"]),
                CommandError::wrong_arity("XADD"),
            ),
        ];
        for (input, expected) in test_cases {
            assert_eq!(XaddArguments::parse(input).err(), Some(expected));
        }
    }
}
