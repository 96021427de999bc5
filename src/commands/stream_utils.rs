//! Reply shaping shared by the stream commands.

use crate::resp::RespValue;
use crate::store::stream::{FieldPairs, StreamId};

/// Encodes stream entries as the wire shape both `XRANGE` and `XREAD` use:
/// each entry is `[id, [field, value, ...]]`.
pub fn entries_to_resp(entries: &[(StreamId, &FieldPairs)]) -> RespValue {
    RespValue::Array(
        entries
            .iter()
            .map(|(id, fields)| {
                let mut flat = Vec::with_capacity(fields.len() * 2);
                for (field, value) in fields.iter() {
                    flat.push(RespValue::BulkString(field.clone()));
                    flat.push(RespValue::BulkString(value.clone()));
                }
                RespValue::Array(vec![
                    RespValue::BulkString(id.to_string()),
                    RespValue::Array(flat),
                ])
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_to_resp() {
        let fields: FieldPairs = vec![("temp".to_string(), "25".to_string())];
        let entries = vec![(StreamId { ms: 1000, seq: 0 }, &fields)];

        assert_eq!(
            entries_to_resp(&entries).encode(),
            "*1\r\n*2\r\n$6\r\n1000-0\r\n*2\r\n$4\r\ntemp\r\n$2\r\n25\r\n"
        );

        assert_eq!(entries_to_resp(&[]).encode(), "*0\r\n");
    }
}
