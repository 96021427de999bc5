//! XREAD: read entries newer than a per-stream cursor, optionally blocking.
//!
//! A `$` cursor is resolved to the stream's top id at registration time, so
//! the caller only sees entries appended after its request. Cursor
//! resolution, the first read, and (when empty) the waiter registration all
//! happen inside one stores critical section; an append racing the request
//! either lands before the read (and is returned) or after the record exists
//! (and wakes it).

use tokio::sync::oneshot;
use tokio::time::Duration;

use crate::commands::stream_utils::entries_to_resp;
use crate::commands::{ensure_kind, error::CommandError};
use crate::resp::RespValue;
use crate::server::Shared;
use crate::store::stream::{parse_read_cursor, StreamId};
use crate::store::{Stores, ValueKind};

pub struct XreadArguments {
    block_ms: Option<u64>,
    keys: Vec<String>,
    cursors: Vec<String>,
}

impl XreadArguments {
    /// Parses `XREAD [BLOCK ms] STREAMS key [key ...] id [id ...]`, with as
    /// many ids as keys.
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() < 3 {
            return Err(CommandError::wrong_arity("XREAD"));
        }

        let (block_ms, streams_index) = if arguments[0].eq_ignore_ascii_case("block") {
            let ms = arguments[1]
                .parse::<u64>()
                .map_err(|_| CommandError::InvalidTimeout)?;
            (Some(ms), 2)
        } else {
            (None, 0)
        };

        if !arguments
            .get(streams_index)
            .map(|word| word.eq_ignore_ascii_case("streams"))
            .unwrap_or(false)
        {
            return Err(CommandError::Syntax);
        }

        let tail = &arguments[streams_index + 1..];
        if tail.is_empty() || tail.len() % 2 != 0 {
            return Err(CommandError::wrong_arity("XREAD"));
        }

        let half = tail.len() / 2;
        Ok(Self {
            block_ms,
            keys: tail[..half].to_vec(),
            cursors: tail[half..].to_vec(),
        })
    }
}

/// Handles XREAD.
///
/// The reply groups entries per stream (`[key, [entries...]]`), listing only
/// streams that had qualifying entries; with nothing to report the reply is
/// a null array. `BLOCK 0` parks without a deadline. Inside `EXEC` the
/// command never blocks.
pub async fn xread(
    shared: &Shared,
    arguments: Vec<String>,
    immediate_only: bool,
) -> Result<String, CommandError> {
    let xread_arguments = XreadArguments::parse(arguments)?;

    let (token, receiver, resolved) = {
        let mut stores = shared.stores.lock().await;

        for key in &xread_arguments.keys {
            ensure_kind(&mut stores, key, ValueKind::Stream)?;
        }

        let mut resolved: Vec<(String, StreamId)> =
            Vec::with_capacity(xread_arguments.keys.len());
        for (key, cursor) in xread_arguments
            .keys
            .iter()
            .zip(xread_arguments.cursors.iter())
        {
            let after = if cursor == "$" {
                stores.streams.last_id(key)
            } else {
                parse_read_cursor(cursor)?
            };
            resolved.push((key.clone(), after));
        }

        if let Some(reply) = collect_newer(&stores, &resolved) {
            return Ok(reply);
        }

        let blocking = xread_arguments.block_ms.is_some() && !immediate_only;
        if !blocking {
            return Ok(RespValue::NullArray.encode());
        }

        let mut waiters = shared.waiters.lock().await;
        let (token, receiver) = waiters.register_stream_waiter(&xread_arguments.keys);
        (token, receiver, resolved)
    };

    let block_ms = xread_arguments.block_ms.unwrap_or(0);
    let woken = wait_for_entries(receiver, block_ms).await;

    let mut waiters = shared.waiters.lock().await;
    waiters.cancel_stream_waiter(&xread_arguments.keys, token);
    drop(waiters);

    if woken {
        let stores = shared.stores.lock().await;
        if let Some(reply) = collect_newer(&stores, &resolved) {
            return Ok(reply);
        }
    }

    Ok(RespValue::NullArray.encode())
}

/// Builds the grouped reply for every stream holding entries past its
/// cursor, or `None` when no stream qualifies.
fn collect_newer(stores: &Stores, resolved: &[(String, StreamId)]) -> Option<String> {
    let mut groups = Vec::new();

    for (key, after) in resolved {
        let entries = stores.streams.entries_after(key, *after);
        if !entries.is_empty() {
            groups.push(RespValue::Array(vec![
                RespValue::BulkString(key.clone()),
                entries_to_resp(&entries),
            ]));
        }
    }

    if groups.is_empty() {
        None
    } else {
        Some(RespValue::Array(groups).encode())
    }
}

async fn wait_for_entries(receiver: oneshot::Receiver<()>, block_ms: u64) -> bool {
    if block_ms == 0 {
        return receiver.await.is_ok();
    }

    matches!(
        tokio::time::timeout(Duration::from_millis(block_ms), receiver).await,
        Ok(Ok(()))
    )
}
