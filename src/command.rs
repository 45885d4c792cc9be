// https://redis.io/docs/reference/protocol-spec/#sending-commands-to-a-redis-server

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

static CRLF: &[u8; 2] = b"\r\n";

/// A command ready to be sent to the server: the command name followed by its arguments.
///
/// Clients send commands as an array of bulk strings. Every token is length prefixed, so
/// arguments are binary safe and never need escaping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Command {
    parts: Vec<Bytes>,
}

impl Command {
    pub fn new(name: impl AsRef<[u8]>) -> Command {
        Command {
            parts: vec![Bytes::copy_from_slice(name.as_ref())],
        }
    }

    pub fn arg(mut self, arg: impl AsRef<[u8]>) -> Command {
        self.parts.push(Bytes::copy_from_slice(arg.as_ref()));
        self
    }

    pub fn args<I, A>(mut self, args: I) -> Command
    where
        I: IntoIterator<Item = A>,
        A: AsRef<[u8]>,
    {
        self.parts
            .extend(args.into_iter().map(|a| Bytes::copy_from_slice(a.as_ref())));
        self
    }

    pub fn name(&self) -> &[u8] {
        &self.parts[0]
    }

    /// All tokens, command name first.
    pub fn parts(&self) -> &[Bytes] {
        &self.parts
    }

    /// Writes `*<n>\r\n` followed by `$<len>\r\n<token>\r\n` for every token.
    pub fn encode(&self, dst: &mut BytesMut) {
        let header = self.parts.len().to_string();
        dst.reserve(1 + header.len() + CRLF.len() + self.encoded_parts_len());
        dst.put_u8(b'*');
        dst.put_slice(header.as_bytes());
        dst.put_slice(CRLF);

        for part in &self.parts {
            dst.put_u8(b'$');
            dst.put_slice(part.len().to_string().as_bytes());
            dst.put_slice(CRLF);
            dst.put_slice(part);
            dst.put_slice(CRLF);
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = BytesMut::new();
        self.encode(&mut bytes);
        bytes.to_vec()
    }

    fn encoded_parts_len(&self) -> usize {
        self.parts
            .iter()
            .map(|p| 1 + p.len().to_string().len() + CRLF.len() + p.len() + CRLF.len())
            .sum()
    }
}

impl From<Command> for Vec<u8> {
    fn from(command: Command) -> Self {
        command.serialize()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", String::from_utf8_lossy(part))?;
        }
        Ok(())
    }
}
