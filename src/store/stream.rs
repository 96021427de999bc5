//! Append-only streams keyed by 128-bit `(ms, seq)` entry ids.
//!
//! Entry ids are strictly increasing within a stream and `0-0` is never a
//! valid id. Both halves compare as unsigned integers, so the id order is the
//! insertion order by construction.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use thiserror::Error;

/// Id-resolution failures surfaced by `XADD` and the range parsers. The
/// `Display` strings are the exact wire error texts.
#[derive(Error, Debug, PartialEq)]
pub enum StreamIdError {
    #[error("ERR The ID specified in XADD must be greater than 0-0")]
    NotGreaterThanZero,
    #[error("ERR The ID specified in XADD is equal or smaller than the target stream top item")]
    NotGreaterThanTop,
    #[error("ERR Invalid stream ID specified as stream command argument")]
    Malformed,
}

/// A stream entry id: millisecond timestamp plus a per-millisecond sequence
/// number. Derived ordering is lexicographic on `(ms, seq)`, which is the
/// wire ordering.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamId {
    pub ms: u64,
    pub seq: u64,
}

impl StreamId {
    pub const ZERO: StreamId = StreamId { ms: 0, seq: 0 };
    pub const MAX: StreamId = StreamId {
        ms: u64::MAX,
        seq: u64::MAX,
    };
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.ms, self.seq)
    }
}

/// The id argument of an `XADD`, before resolution against the stream.
#[derive(Debug, PartialEq)]
pub enum EntryIdSpec {
    /// `*` - both halves chosen by the server.
    Auto,
    /// `<ms>-*` - caller fixes the timestamp, server picks the sequence.
    AtTime(u64),
    /// `<ms>-<seq>` (or bare `<ms>`, read as sequence 0).
    Explicit(StreamId),
}

impl EntryIdSpec {
    pub fn parse(spec: &str) -> Result<Self, StreamIdError> {
        if spec == "*" {
            return Ok(EntryIdSpec::Auto);
        }

        match spec.split_once('-') {
            Some((ms, "*")) => {
                let ms = ms.parse::<u64>().map_err(|_| StreamIdError::Malformed)?;
                Ok(EntryIdSpec::AtTime(ms))
            }
            _ => Ok(EntryIdSpec::Explicit(parse_id(spec)?)),
        }
    }
}

/// Parses `<ms>-<seq>` or bare `<ms>` (sequence defaults to 0).
fn parse_id(text: &str) -> Result<StreamId, StreamIdError> {
    match text.split_once('-') {
        Some((ms, seq)) => {
            let ms = ms.parse::<u64>().map_err(|_| StreamIdError::Malformed)?;
            let seq = seq.parse::<u64>().map_err(|_| StreamIdError::Malformed)?;
            Ok(StreamId { ms, seq })
        }
        None => {
            let ms = text.parse::<u64>().map_err(|_| StreamIdError::Malformed)?;
            Ok(StreamId { ms, seq: 0 })
        }
    }
}

/// Lower range bound: `-` is the smallest id, a bare `<ms>` reads as
/// `(ms, 0)`. Bounds are inclusive.
pub fn parse_range_start(text: &str) -> Result<StreamId, StreamIdError> {
    if text == "-" {
        return Ok(StreamId::ZERO);
    }
    parse_id(text)
}

/// Upper range bound: `+` is the largest id, a bare `<ms>` reads as
/// `(ms, u64::MAX)`. Bounds are inclusive.
pub fn parse_range_end(text: &str) -> Result<StreamId, StreamIdError> {
    if text == "+" {
        return Ok(StreamId::MAX);
    }
    if !text.contains('-') {
        let ms = text.parse::<u64>().map_err(|_| StreamIdError::Malformed)?;
        return Ok(StreamId { ms, seq: u64::MAX });
    }
    parse_id(text)
}

/// `XREAD` cursor: entries strictly greater than this id qualify. Bare
/// `<ms>` reads as `(ms, 0)`.
pub fn parse_read_cursor(text: &str) -> Result<StreamId, StreamIdError> {
    parse_id(text)
}

pub type FieldPairs = Vec<(String, String)>;

#[derive(Debug, Default)]
struct Stream {
    entries: BTreeMap<StreamId, FieldPairs>,
    last_id: StreamId,
}

#[derive(Debug, Default)]
pub struct StreamStore {
    entries: HashMap<String, Stream>,
}

impl StreamStore {
    /// Appends an entry, resolving `spec` against the stream's top id.
    ///
    /// Resolution:
    /// * `Auto` - `ms = max(now_ms, last.ms)`; the sequence continues the
    ///   current millisecond or restarts at 0.
    /// * `AtTime(ms)` - rejected when `ms` is behind the top item; the
    ///   sequence continues or restarts as above.
    /// * `Explicit(id)` - must be strictly greater than the top id, and
    ///   `0-0` is rejected outright.
    pub fn append(
        &mut self,
        key: &str,
        spec: &EntryIdSpec,
        fields: FieldPairs,
        now_ms: u64,
    ) -> Result<StreamId, StreamIdError> {
        let last = self.last_id(key);

        let id = match spec {
            EntryIdSpec::Auto => {
                let ms = now_ms.max(last.ms);
                StreamId {
                    ms,
                    seq: if ms == last.ms { last.seq + 1 } else { 0 },
                }
            }
            EntryIdSpec::AtTime(ms) => {
                if *ms < last.ms {
                    return Err(StreamIdError::NotGreaterThanTop);
                }
                StreamId {
                    ms: *ms,
                    seq: if *ms == last.ms { last.seq + 1 } else { 0 },
                }
            }
            EntryIdSpec::Explicit(id) => {
                if *id == StreamId::ZERO {
                    return Err(StreamIdError::NotGreaterThanZero);
                }
                if *id <= last {
                    return Err(StreamIdError::NotGreaterThanTop);
                }
                *id
            }
        };

        if id == StreamId::ZERO {
            return Err(StreamIdError::NotGreaterThanZero);
        }

        let stream = self.entries.entry(key.to_string()).or_default();
        stream.entries.insert(id, fields);
        stream.last_id = id;
        Ok(id)
    }

    /// Entries with `from <= id <= to` in ascending id order.
    pub fn range(&self, key: &str, from: StreamId, to: StreamId) -> Vec<(StreamId, &FieldPairs)> {
        let Some(stream) = self.entries.get(key) else {
            return Vec::new();
        };
        stream
            .entries
            .range(from..=to)
            .map(|(id, fields)| (*id, fields))
            .collect()
    }

    /// Entries with `id > after` in ascending id order.
    pub fn entries_after(&self, key: &str, after: StreamId) -> Vec<(StreamId, &FieldPairs)> {
        let Some(stream) = self.entries.get(key) else {
            return Vec::new();
        };
        stream
            .entries
            .range((std::ops::Bound::Excluded(after), std::ops::Bound::Unbounded))
            .map(|(id, fields)| (*id, fields))
            .collect()
    }

    /// The stream's top id, or `0-0` for a missing stream.
    pub fn last_id(&self, key: &str) -> StreamId {
        self.entries
            .get(key)
            .map(|stream| stream.last_id)
            .unwrap_or(StreamId::ZERO)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove_key(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

}
