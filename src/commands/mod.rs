//! Command implementations.
//!
//! Each command module pairs an `XxxArguments::parse` constructor with an
//! async handler returning the RESP-encoded reply. Handlers lock the shared
//! state they need and capture their writes for replication before
//! releasing the stores guard, so the log order is the commit order.

pub mod dispatcher;
pub mod error;

mod blpop;
mod config_get;
mod del;
mod echo;
mod exists;
mod get;
mod incr;
mod keys;
mod llen;
mod lpop;
mod lrange;
mod ping;
mod pub_sub;
mod push;
mod replication;
mod set;
mod stream_utils;
mod type_command;
mod watch;
mod xadd;
mod xrange;
mod xread;
mod zadd;
mod zcard;
mod zrange;
mod zrank;
mod zrem;
mod zscore;

pub use dispatcher::{dispatch, execute, validate, Command, Outcome};
pub use error::CommandError;

use crate::store::{Stores, ValueKind};

/// Wrong-type guard: a key may be missing or already hold `want`, anything
/// else is a `WRONGTYPE` error. Runs lazy expiry as a side effect.
pub(crate) fn ensure_kind(
    stores: &mut Stores,
    key: &str,
    want: ValueKind,
) -> Result<(), CommandError> {
    match stores.kind_of(key) {
        Some(kind) if kind != want => Err(CommandError::WrongType),
        _ => Ok(()),
    }
}

/// Formats a sorted-set score the way clients expect: integral values
/// without a trailing `.0`, everything else in shortest-roundtrip form.
pub(crate) fn format_score(score: f64) -> String {
    score.to_string()
}
