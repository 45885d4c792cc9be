use std::net::SocketAddr;

use futures::{SinkExt, StreamExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::codec::RespCodec;
use crate::command::Command;
use crate::config::Config;
use crate::reply::Reply;
use crate::{Error, Result};

/// Decoded replies coming from the read half of a connection.
pub type ReplyStream = FramedRead<OwnedReadHalf, RespCodec>;
/// Encoded commands going to the write half of a connection.
pub type CommandSink = FramedWrite<OwnedWriteHalf, RespCodec>;

/// A single session with the server.
///
/// The socket is split up front so both halves can be handed to different tasks when the
/// connection is used for streaming.
pub struct Connection {
    pub id: Uuid,
    pub peer_addr: Option<SocketAddr>,
    /// Database selected during the handshake, if any.
    pub db: Option<u32>,
    reader: ReplyStream,
    writer: CommandSink,
}

impl Connection {
    pub fn new(stream: TcpStream) -> Connection {
        Connection::with_codec(stream, RespCodec::default())
    }

    pub fn with_codec(stream: TcpStream, codec: RespCodec) -> Connection {
        let peer_addr = stream.peer_addr().ok();
        let (read_half, write_half) = stream.into_split();

        Connection {
            id: Uuid::new_v4(),
            peer_addr,
            db: None,
            reader: FramedRead::new(read_half, codec.clone()),
            writer: FramedWrite::new(write_half, codec),
        }
    }

    /// Dials the configured address and runs the `AUTH` / `SELECT` handshake. Any failure
    /// aborts the whole thing, a half initialized connection is never handed out.
    #[instrument(name = "connect", skip(config), fields(addr = %config.addr(), connection_id))]
    pub async fn open(config: &Config) -> Result<Connection> {
        let stream = TcpStream::connect(config.addr()).await?;
        // Disable Nagle to keep request latency low for small payloads.
        stream.set_nodelay(true)?;

        let mut conn = Connection::with_codec(stream, RespCodec::new(config.max_frame_size));
        tracing::Span::current().record("connection_id", conn.id.to_string());

        if let Some(password) = &config.password {
            conn.call(&Command::new("AUTH").arg(password))
                .await?
                .into_status()?;
        }

        if config.db != 0 {
            conn.call(&Command::new("SELECT").arg(config.db.to_string()))
                .await?
                .into_status()?;
            conn.db = Some(config.db);
        }

        debug!("Connection established");
        Ok(conn)
    }

    pub async fn write_command(&mut self, command: &Command) -> Result<()> {
        self.writer.send(command).await
    }

    /// Reads the next reply. The peer closing the stream surfaces as
    /// [`Error::ConnectionClosed`].
    pub async fn read_reply(&mut self) -> Result<Reply> {
        read_reply(&mut self.reader).await
    }

    /// One request/response round trip. The command is fully written before the reply is read.
    pub async fn call(&mut self, command: &Command) -> Result<Reply> {
        self.write_command(command).await?;
        self.read_reply().await
    }

    pub fn into_split(self) -> (ReplyStream, CommandSink) {
        (self.reader, self.writer)
    }
}

pub(crate) async fn read_reply(reader: &mut ReplyStream) -> Result<Reply> {
    match reader.next().await {
        Some(reply) => reply,
        None => Err(Error::ConnectionClosed),
    }
}
