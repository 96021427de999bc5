use crate::commands::stream_utils::entries_to_resp;
use crate::commands::{ensure_kind, error::CommandError};
use crate::server::Shared;
use crate::store::stream::{parse_range_end, parse_range_start};
use crate::store::ValueKind;

pub struct XrangeArguments {
    key: String,
    from: String,
    to: String,
}

impl XrangeArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 3 {
            return Err(CommandError::wrong_arity("XRANGE"));
        }

        let mut iter = arguments.into_iter();
        Ok(Self {
            key: iter.next().unwrap_or_default(),
            from: iter.next().unwrap_or_default(),
            to: iter.next().unwrap_or_default(),
        })
    }
}

/// Handles XRANGE, inclusive of both bounds: `-`/`+` are the open ends, a
/// bare millisecond covers that whole millisecond.
pub async fn xrange(shared: &Shared, arguments: Vec<String>) -> Result<String, CommandError> {
    let xrange_arguments = XrangeArguments::parse(arguments)?;

    let from = parse_range_start(&xrange_arguments.from)?;
    let to = parse_range_end(&xrange_arguments.to)?;

    let mut stores = shared.stores.lock().await;
    ensure_kind(&mut stores, &xrange_arguments.key, ValueKind::Stream)?;

    let entries = stores.streams.range(&xrange_arguments.key, from, to);
    Ok(entries_to_resp(&entries).encode())
}
