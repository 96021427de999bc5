//! RESP (Redis Serialization Protocol) frame parsing and encoding.
//!
//! The parser works incrementally over a byte buffer: [`parse_frame`] returns
//! the decoded value together with the number of bytes it consumed, or
//! `Ok(None)` when the buffer holds only a partial frame and more bytes are
//! needed. Bulk strings are read by their declared length, so payloads
//! containing `\r\n` are handled correctly.

use std::str;

use thiserror::Error;

/// Upper bound on a single bulk string payload, matching the conventional
/// 512 MB proto limit.
const MAX_BULK_LEN: i64 = 512 * 1024 * 1024;

/// Upper bound on the element count of a single inbound array.
const MAX_ARRAY_LEN: i64 = 1024 * 1024;

/// Errors produced while decoding an inbound frame.
///
/// The `Display` form is the wire text: sessions reply
/// `-ERR Protocol error...` and close the connection.
#[derive(Error, Debug, PartialEq)]
pub enum RespError {
    #[error("Protocol error: expected '+', '-', ':', '$' or '*', got '{0}'")]
    UnknownPrefix(char),
    #[error("Protocol error: invalid bulk length")]
    InvalidBulkLength,
    #[error("Protocol error: invalid multibulk length")]
    InvalidMultibulkLength,
    #[error("Protocol error: invalid integer")]
    InvalidInteger,
    #[error("Protocol error: invalid UTF-8 sequence")]
    InvalidUtf8,
}

/// A single RESP value, covering the five reply kinds plus the null bulk
/// string and null array forms.
#[derive(Debug, PartialEq, Clone)]
pub enum RespValue {
    SimpleString(String),
    Error(String),
    Integer(i64),
    BulkString(String),
    NullBulkString,
    Array(Vec<RespValue>),
    NullArray,
}

impl RespValue {
    /// Builds a RESP array of bulk strings, the shape of every command frame
    /// and of multi-part replies such as `BLPOP` results and pub/sub
    /// messages.
    pub fn from_strings<I, S>(items: I) -> RespValue
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RespValue::Array(
            items
                .into_iter()
                .map(|item| RespValue::BulkString(item.into()))
                .collect(),
        )
    }

    /// Encodes the value into its wire representation.
    pub fn encode(&self) -> String {
        match self {
            RespValue::SimpleString(s) => format!("+{}\r\n", s),
            RespValue::Error(s) => format!("-{}\r\n", s),
            RespValue::Integer(n) => format!(":{}\r\n", n),
            RespValue::BulkString(s) => format!("${}\r\n{}\r\n", s.len(), s),
            RespValue::NullBulkString => "$-1\r\n".to_string(),
            RespValue::Array(elements) => {
                let mut out = format!("*{}\r\n", elements.len());
                for element in elements {
                    out.push_str(&element.encode());
                }
                out
            }
            RespValue::NullArray => "*-1\r\n".to_string(),
        }
    }
}

/// Attempts to decode one frame from the front of `buf`.
///
/// # Returns
///
/// * `Ok(Some((value, consumed)))` - A complete frame and the number of bytes
///   it occupied; the caller advances its buffer by `consumed`.
/// * `Ok(None)` - The buffer ends mid-frame; read more bytes and retry.
/// * `Err(RespError)` - The bytes cannot be a valid frame; the connection is
///   beyond recovery and should be closed after an error reply.
pub fn parse_frame(buf: &[u8]) -> Result<Option<(RespValue, usize)>, RespError> {
    match parse_at(buf, 0)? {
        Some((value, end)) => Ok(Some((value, end))),
        None => Ok(None),
    }
}

fn parse_at(buf: &[u8], pos: usize) -> Result<Option<(RespValue, usize)>, RespError> {
    let Some(&prefix) = buf.get(pos) else {
        return Ok(None);
    };

    match prefix {
        b'+' => parse_line_value(buf, pos, RespValue::SimpleString),
        b'-' => parse_line_value(buf, pos, RespValue::Error),
        b':' => {
            let Some((line, next)) = read_line(buf, pos + 1)? else {
                return Ok(None);
            };
            let value = line
                .parse::<i64>()
                .map_err(|_| RespError::InvalidInteger)?;
            Ok(Some((RespValue::Integer(value), next)))
        }
        b'$' => parse_bulk(buf, pos),
        b'*' => parse_array(buf, pos),
        other => Err(RespError::UnknownPrefix(other as char)),
    }
}

fn parse_line_value(
    buf: &[u8],
    pos: usize,
    build: fn(String) -> RespValue,
) -> Result<Option<(RespValue, usize)>, RespError> {
    let Some((line, next)) = read_line(buf, pos + 1)? else {
        return Ok(None);
    };
    Ok(Some((build(line.to_string()), next)))
}

fn parse_bulk(buf: &[u8], pos: usize) -> Result<Option<(RespValue, usize)>, RespError> {
    let Some((line, payload_start)) = read_line(buf, pos + 1)? else {
        return Ok(None);
    };
    let declared = line
        .parse::<i64>()
        .map_err(|_| RespError::InvalidBulkLength)?;

    if declared == -1 {
        return Ok(Some((RespValue::NullBulkString, payload_start)));
    }
    if declared < 0 || declared > MAX_BULK_LEN {
        return Err(RespError::InvalidBulkLength);
    }

    let len = declared as usize;
    let end = payload_start + len + 2;
    if buf.len() < end {
        return Ok(None);
    }
    if &buf[payload_start + len..end] != b"\r\n" {
        return Err(RespError::InvalidBulkLength);
    }

    let payload = str::from_utf8(&buf[payload_start..payload_start + len])
        .map_err(|_| RespError::InvalidUtf8)?;
    Ok(Some((RespValue::BulkString(payload.to_string()), end)))
}

fn parse_array(buf: &[u8], pos: usize) -> Result<Option<(RespValue, usize)>, RespError> {
    let Some((line, mut cursor)) = read_line(buf, pos + 1)? else {
        return Ok(None);
    };
    let declared = line
        .parse::<i64>()
        .map_err(|_| RespError::InvalidMultibulkLength)?;

    if declared == -1 {
        return Ok(Some((RespValue::NullArray, cursor)));
    }
    if declared < 0 || declared > MAX_ARRAY_LEN {
        return Err(RespError::InvalidMultibulkLength);
    }

    let mut elements = Vec::with_capacity(declared as usize);
    for _ in 0..declared {
        let Some((element, next)) = parse_at(buf, cursor)? else {
            return Ok(None);
        };
        elements.push(element);
        cursor = next;
    }

    Ok(Some((RespValue::Array(elements), cursor)))
}

/// Reads one CRLF-terminated line starting at `pos`, returning the line
/// without its terminator and the position just past it.
fn read_line(buf: &[u8], pos: usize) -> Result<Option<(&str, usize)>, RespError> {
    let Some(offset) = buf[pos.min(buf.len())..]
        .windows(2)
        .position(|window| window == b"\r\n")
    else {
        return Ok(None);
    };

    let line = str::from_utf8(&buf[pos..pos + offset]).map_err(|_| RespError::InvalidUtf8)?;
    Ok(Some((line, pos + offset + 2)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_complete_frames() {
        let test_cases: Vec<(&[u8], RespValue, usize)> = vec![
            (b"+OK\r\n", RespValue::SimpleString("OK".to_string()), 5),
            (
                b"-ERR boom\r\n",
                RespValue::Error("ERR boom".to_string()),
                11,
            ),
            (b":42\r\n", RespValue::Integer(42), 5),
            (b":-7\r\n", RespValue::Integer(-7), 5),
            (
                b"$5\r\nhello\r\n",
                RespValue::BulkString("hello".to_string()),
                11,
            ),
            (b"$0\r\n\r\n", RespValue::BulkString(String::new()), 6),
            (b"$-1\r\n", RespValue::NullBulkString, 5),
            (b"*-1\r\n", RespValue::NullArray, 5),
            (b"*0\r\n", RespValue::Array(vec![]), 4),
            (
                b"*2\r\n$4\r\nECHO\r\n$2\r\nhi\r\n",
                RespValue::from_strings(["ECHO", "hi"]),
                22,
            ),
            (
                // Bulk payload containing the frame terminator.
                b"$4\r\na\r\nb\r\n",
                RespValue::BulkString("a\r\nb".to_string()),
                10,
            ),
        ];

        for (input, expected_value, expected_consumed) in test_cases {
            let result = parse_frame(input);
            assert_eq!(
                result,
                Ok(Some((expected_value, expected_consumed))),
                "parsing {:?}",
                String::from_utf8_lossy(input)
            );
        }
    }

    #[test]
    fn test_parse_partial_frames() {
        let partials: Vec<&[u8]> = vec![
            b"",
            b"*",
            b"*2\r\n",
            b"*2\r\n$4\r\nECHO\r\n",
            b"$5\r\nhel",
            b"$5\r\nhello",
            b"+OK",
        ];

        for input in partials {
            assert_eq!(
                parse_frame(input),
                Ok(None),
                "expected continuation for {:?}",
                String::from_utf8_lossy(input)
            );
        }
    }

    #[test]
    fn test_parse_pipelined_frames_consume_only_the_first() {
        let input = b"+PONG\r\n:1\r\n";
        let (value, consumed) = parse_frame(input).unwrap().unwrap();
        assert_eq!(value, RespValue::SimpleString("PONG".to_string()));
        assert_eq!(consumed, 7);

        let (value, consumed) = parse_frame(&input[consumed..]).unwrap().unwrap();
        assert_eq!(value, RespValue::Integer(1));
        assert_eq!(consumed, 4);
    }

    #[test]
    fn test_parse_malformed_frames() {
        let test_cases: Vec<(&[u8], RespError)> = vec![
            (b"#oops\r\n", RespError::UnknownPrefix('#')),
            (b":abc\r\n", RespError::InvalidInteger),
            (b"$abc\r\n", RespError::InvalidBulkLength),
            (b"$-2\r\n", RespError::InvalidBulkLength),
            (b"*x\r\n", RespError::InvalidMultibulkLength),
            (b"$3\r\nhello\r\n", RespError::InvalidBulkLength),
        ];

        for (input, expected) in test_cases {
            assert_eq!(
                parse_frame(input),
                Err(expected),
                "parsing {:?}",
                String::from_utf8_lossy(input)
            );
        }
    }

    #[test]
    fn test_encode_reply_kinds() {
        assert_eq!(
            RespValue::SimpleString("OK".to_string()).encode(),
            "+OK\r\n"
        );
        assert_eq!(RespValue::Error("ERR no".to_string()).encode(), "-ERR no\r\n");
        assert_eq!(RespValue::Integer(3).encode(), ":3\r\n");
        assert_eq!(
            RespValue::BulkString("bar".to_string()).encode(),
            "$3\r\nbar\r\n"
        );
        assert_eq!(RespValue::NullBulkString.encode(), "$-1\r\n");
        assert_eq!(RespValue::NullArray.encode(), "*-1\r\n");
        assert_eq!(
            RespValue::from_strings(["q", "x"]).encode(),
            "*2\r\n$1\r\nq\r\n$1\r\nx\r\n"
        );
    }
}
