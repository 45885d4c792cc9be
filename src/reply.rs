// https://redis.io/docs/reference/protocol-spec/

use std::fmt;
use std::io::Cursor;
use std::str;

use bytes::{Buf, Bytes};
use thiserror::Error as ThisError;

use crate::error::Error;

static CRLF: &[u8; 2] = b"\r\n";

#[derive(Debug, ThisError, PartialEq)]
pub enum ParseError {
    #[error("not enough data is available to parse an entire reply")]
    Incomplete,
    #[error("invalid reply type: {0:?}")]
    InvalidDataType(char),
    #[error("invalid reply; {0}")]
    Invalid(&'static str),
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Error {
        Error::Protocol(err.to_string())
    }
}

/// A decoded server reply.
///
/// Multi bulk replies only carry bulk strings (integers inside an array are kept as their
/// decimal text), and absent members are dropped, so `Array` holds plain bytes.
#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    Status(String),
    Error(String),
    Integer(i64),
    Bulk(Bytes),
    /// `$-1`, the server has no value for the key. Distinct from an empty bulk string.
    Absent,
    Array(Vec<Bytes>),
}

impl Reply {
    /// Parses one reply from the cursor. On success the cursor is left right after the reply,
    /// on `ParseError::Incomplete` the caller should retry once more data has been buffered.
    pub fn parse(src: &mut Cursor<&[u8]>) -> Result<Self, ParseError> {
        // Blank lines preceding a reply are ignored.
        let line = loop {
            let line = trim(get_line(src)?);
            if !line.is_empty() {
                break line;
            }
        };

        let rest = &line[1..];
        match line[0] {
            b'+' => Ok(Reply::Status(to_str(rest)?.trim().to_string())),
            b'-' => {
                let message = to_str(rest)?.trim();
                let message = message.strip_prefix("ERR ").unwrap_or(message);
                Ok(Reply::Error(message.trim().to_string()))
            }
            b':' => parse_number(rest, "integer reply is not a number").map(Reply::Integer),
            b'$' => Ok(parse_bulk(src, rest)?.map_or(Reply::Absent, Reply::Bulk)),
            // *<number-of-elements>\r\n<element-1>...<element-n>
            b'*' => {
                let count = parse_number(rest, "multi bulk reply expected a number")?;
                if count <= 0 {
                    return Ok(Reply::Array(Vec::new()));
                }

                // The header alone cannot be trusted to size the buffer.
                let mut items = Vec::with_capacity((count as usize).min(src.remaining()));
                for _ in 0..count {
                    if let Some(item) = parse_element(src)? {
                        items.push(item);
                    }
                }

                Ok(Reply::Array(items))
            }
            byte => Err(ParseError::InvalidDataType(byte as char)),
        }
    }

    /// Turns an error reply into an `Err`, leaving every other reply untouched.
    pub fn into_result(self) -> Result<Reply, Error> {
        match self {
            Reply::Error(message) => Err(Error::Server(message)),
            reply => Ok(reply),
        }
    }

    pub fn into_status(self) -> Result<String, Error> {
        match self.into_result()? {
            Reply::Status(status) => Ok(status),
            actual => Err(unexpected("status", actual)),
        }
    }

    pub fn into_integer(self) -> Result<i64, Error> {
        match self.into_result()? {
            Reply::Integer(i) => Ok(i),
            actual => Err(unexpected("integer", actual)),
        }
    }

    /// Integer replies that answer yes/no questions: `1` is true, anything else false.
    pub fn into_bool(self) -> Result<bool, Error> {
        self.into_integer().map(|i| i == 1)
    }

    pub fn into_bulk(self) -> Result<Bytes, Error> {
        match self.into_result()? {
            Reply::Bulk(bytes) => Ok(bytes),
            Reply::Absent => Err(Error::Absent),
            actual => Err(unexpected("bulk string", actual)),
        }
    }

    pub fn into_array(self) -> Result<Vec<Bytes>, Error> {
        match self.into_result()? {
            Reply::Array(items) => Ok(items),
            actual => Err(unexpected("array", actual)),
        }
    }
}

fn unexpected(expected: &'static str, actual: Reply) -> Error {
    Error::UnexpectedReply { expected, actual }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Status(s) => write!(f, "+{}", s),
            Reply::Error(s) => write!(f, "-{}", s),
            Reply::Integer(i) => write!(f, ":{}", i),
            Reply::Bulk(bytes) => write!(f, "${}", String::from_utf8_lossy(bytes)),
            Reply::Absent => write!(f, "$-1"),
            Reply::Array(items) => {
                write!(f, "*{}", items.len())?;
                for item in items {
                    write!(f, " ${}", String::from_utf8_lossy(item))?;
                }
                Ok(())
            }
        }
    }
}

// Elements of a multi bulk reply are either bulk strings or integers. `None` is an absent
// member.
fn parse_element(src: &mut Cursor<&[u8]>) -> Result<Option<Bytes>, ParseError> {
    let line = trim(get_line(src)?);
    match line.first() {
        Some(b'$') => parse_bulk(src, &line[1..]),
        Some(b':') => Ok(Some(Bytes::copy_from_slice(trim(&line[1..])))),
        Some(&byte) => Err(ParseError::InvalidDataType(byte as char)),
        None => Err(ParseError::Invalid("empty multi bulk element")),
    }
}

// $<length>\r\n<data>\r\n
fn parse_bulk(src: &mut Cursor<&[u8]>, header: &[u8]) -> Result<Option<Bytes>, ParseError> {
    let length = parse_number(header, "bulk length is not a number")?;
    if length == -1 {
        return Ok(None);
    }
    if length < 0 {
        return Err(ParseError::Invalid("negative bulk length"));
    }

    let start = src.position() as usize;
    let end = start + length as usize;
    let buf = *src.get_ref();
    if buf.len() < end + CRLF.len() {
        return Err(ParseError::Incomplete);
    }
    if &buf[end..end + CRLF.len()] != CRLF {
        return Err(ParseError::Invalid("bulk string is not terminated by CRLF"));
    }

    src.set_position((end + CRLF.len()) as u64);
    Ok(Some(Bytes::copy_from_slice(&buf[start..end])))
}

fn parse_number(bytes: &[u8], message: &'static str) -> Result<i64, ParseError> {
    to_str(bytes)?
        .trim()
        .parse::<i64>()
        .map_err(|_| ParseError::Invalid(message))
}

fn to_str(bytes: &[u8]) -> Result<&str, ParseError> {
    str::from_utf8(bytes).map_err(|_| ParseError::Invalid("reply line is not valid UTF-8"))
}

fn trim(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}

fn get_line<'a>(src: &mut Cursor<&'a [u8]>) -> Result<&'a [u8], ParseError> {
    if !src.has_remaining() {
        return Err(ParseError::Incomplete);
    }

    let start = src.position() as usize;
    let buf = *src.get_ref();

    let line_end = buf[start..]
        .windows(2)
        .position(|window| window == CRLF)
        .map(|index| start + index)
        .ok_or(ParseError::Incomplete)?;

    src.set_position((line_end + CRLF.len()) as u64);

    Ok(&buf[start..line_end])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(data: &[u8]) -> Result<Reply, ParseError> {
        let mut cursor = Cursor::new(data);
        Reply::parse(&mut cursor)
    }

    #[test]
    fn parse_status() {
        assert_eq!(parse(b"+OK\r\n"), Ok(Reply::Status("OK".to_string())));
    }

    #[test]
    fn parse_error_strips_marker() {
        assert_eq!(
            parse(b"-ERR unknown command 'FOO'\r\n"),
            Ok(Reply::Error("unknown command 'FOO'".to_string()))
        );
        assert_eq!(
            parse(b"-WRONGTYPE Operation against a key\r\n"),
            Ok(Reply::Error("WRONGTYPE Operation against a key".to_string()))
        );
    }

    #[test]
    fn error_reply_is_a_failure() {
        let reply = parse(b"-ERR no such key\r\n").unwrap();

        assert!(matches!(reply.into_result(), Err(Error::Server(ref m)) if m == "no such key"));
    }

    #[test]
    fn parse_integers() {
        assert_eq!(parse(b":1000\r\n"), Ok(Reply::Integer(1000)));
        assert_eq!(parse(b":-1000\r\n"), Ok(Reply::Integer(-1000)));
        assert_eq!(parse(b":0\r\n"), Ok(Reply::Integer(0)));
        assert_eq!(parse(b":+7\r\n"), Ok(Reply::Integer(7)));
        assert_eq!(parse(b":9223372036854775807\r\n"), Ok(Reply::Integer(i64::MAX)));
    }

    #[test]
    fn parse_integer_not_a_number() {
        assert_eq!(
            parse(b":12a\r\n"),
            Err(ParseError::Invalid("integer reply is not a number"))
        );
    }

    #[test]
    fn parse_bulk() {
        assert_eq!(parse(b"$6\r\nfoobar\r\n"), Ok(Reply::Bulk(Bytes::from("foobar"))));
    }

    #[test]
    fn parse_bulk_is_binary_safe() {
        assert_eq!(
            parse(b"$4\r\na\r\nb\r\n"),
            Ok(Reply::Bulk(Bytes::from_static(b"a\r\nb")))
        );
    }

    #[test]
    fn absent_is_not_empty() {
        assert_eq!(parse(b"$-1\r\n"), Ok(Reply::Absent));
        assert_eq!(parse(b"$0\r\n\r\n"), Ok(Reply::Bulk(Bytes::new())));

        assert!(matches!(Reply::Absent.into_bulk(), Err(Error::Absent)));
        assert_eq!(Reply::Bulk(Bytes::new()).into_bulk().unwrap(), Bytes::new());
    }

    #[test]
    fn parse_bulk_invalid_length() {
        assert!(matches!(parse(b"$x\r\n"), Err(ParseError::Invalid(_))));
        assert!(matches!(parse(b"$-2\r\n"), Err(ParseError::Invalid(_))));
    }

    #[test]
    fn parse_bulk_missing_terminator() {
        assert_eq!(
            parse(b"$3\r\nfooXY"),
            Err(ParseError::Invalid("bulk string is not terminated by CRLF"))
        );
    }

    #[test]
    fn parse_empty_arrays() {
        assert_eq!(parse(b"*0\r\n"), Ok(Reply::Array(vec![])));
        assert_eq!(parse(b"*-1\r\n"), Ok(Reply::Array(vec![])));
    }

    #[test]
    fn parse_array() {
        assert_eq!(
            parse(b"*2\r\n$5\r\nhello\r\n$5\r\nworld\r\n"),
            Ok(Reply::Array(vec![Bytes::from("hello"), Bytes::from("world")]))
        );
    }

    #[test]
    fn parse_array_skips_absent_members() {
        assert_eq!(
            parse(b"*2\r\n$1\r\na\r\n$-1\r\n"),
            Ok(Reply::Array(vec![Bytes::from("a")]))
        );
        assert_eq!(
            parse(b"*3\r\n$5\r\nhello\r\n$-1\r\n$5\r\nworld\r\n"),
            Ok(Reply::Array(vec![Bytes::from("hello"), Bytes::from("world")]))
        );
    }

    #[test]
    fn parse_array_with_integer_member() {
        assert_eq!(
            parse(b"*3\r\n$9\r\nsubscribe\r\n$3\r\nfoo\r\n:1\r\n"),
            Ok(Reply::Array(vec![
                Bytes::from("subscribe"),
                Bytes::from("foo"),
                Bytes::from("1")
            ]))
        );
    }

    #[test]
    fn parse_array_rejects_nested_values() {
        assert_eq!(
            parse(b"*1\r\n+OK\r\n"),
            Err(ParseError::InvalidDataType('+'))
        );
    }

    #[test]
    fn huge_multi_bulk_header_waits_for_data() {
        assert_eq!(parse(b"*9223372036854775807\r\n"), Err(ParseError::Incomplete));
        assert_eq!(
            parse(b"*100000000\r\n$1\r\na\r\n"),
            Err(ParseError::Incomplete)
        );
        assert_eq!(
            parse(b"*99999999999999999999\r\n"),
            Err(ParseError::Invalid("multi bulk reply expected a number"))
        );
    }

    #[test]
    fn skips_blank_lines() {
        assert_eq!(parse(b"\r\n\r\n+PONG\r\n"), Ok(Reply::Status("PONG".to_string())));
    }

    #[test]
    fn unknown_prefix() {
        assert_eq!(parse(b"?what\r\n"), Err(ParseError::InvalidDataType('?')));
    }

    #[test]
    fn incomplete_data() {
        assert_eq!(parse(b""), Err(ParseError::Incomplete));
        assert_eq!(parse(b"+OK"), Err(ParseError::Incomplete));
        assert_eq!(parse(b"$5\r\nhel"), Err(ParseError::Incomplete));
        assert_eq!(parse(b"*2\r\n$1\r\na\r\n"), Err(ParseError::Incomplete));
    }

    #[test]
    fn cursor_stops_after_reply() {
        let data = b":1\r\n:2\r\n";
        let mut cursor = Cursor::new(&data[..]);

        assert_eq!(Reply::parse(&mut cursor), Ok(Reply::Integer(1)));
        assert_eq!(cursor.position(), 4);
        assert_eq!(Reply::parse(&mut cursor), Ok(Reply::Integer(2)));
    }

    #[test]
    fn typed_accessors() {
        assert!(Reply::Integer(1).into_bool().unwrap());
        assert!(!Reply::Integer(0).into_bool().unwrap());
        assert_eq!(Reply::Status("OK".into()).into_status().unwrap(), "OK");

        let err = Reply::Integer(3).into_bulk().unwrap_err();
        assert!(matches!(
            err,
            Error::UnexpectedReply { expected: "bulk string", actual: Reply::Integer(3) }
        ));
    }
}
