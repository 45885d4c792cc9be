use bytes::{Buf, BytesMut};
use std::io::Cursor;
use tokio_util::codec::{Decoder, Encoder};

use crate::command::Command;
use crate::reply::{ParseError, Reply};
use crate::Error;

pub const DEFAULT_MAX_FRAME_SIZE: usize = 512 * 1024 * 1024;

/// Frames replies off a byte stream and commands onto one.
///
/// Replies arrive back to back on a single stream, so decoding is restartable: an incomplete
/// reply leaves the buffer untouched until more data is available.
#[derive(Debug, Clone)]
pub struct RespCodec {
    max_frame_size: usize,
}

impl RespCodec {
    pub fn new(max_frame_size: usize) -> RespCodec {
        RespCodec { max_frame_size }
    }
}

impl Default for RespCodec {
    fn default() -> Self {
        RespCodec::new(DEFAULT_MAX_FRAME_SIZE)
    }
}

impl Decoder for RespCodec {
    type Item = Reply;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let mut cursor = Cursor::new(&src[..]);
        let reply = match Reply::parse(&mut cursor) {
            Ok(reply) => reply,
            Err(ParseError::Incomplete) => {
                // Refuse to buffer without bound while waiting for the rest of a reply.
                if src.len() > self.max_frame_size {
                    return Err(Error::Protocol("reply size exceeds limit".to_string()));
                }
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };

        let position = cursor.position() as usize;

        // Remove the parsed reply from the buffer.
        src.advance(position);

        Ok(Some(reply))
    }
}

impl<'a> Encoder<&'a Command> for RespCodec {
    type Error = Error;

    fn encode(&mut self, command: &'a Command, dst: &mut BytesMut) -> Result<(), Self::Error> {
        command.encode(dst);
        Ok(())
    }
}
