use std::sync::Arc;

use futures::SinkExt;
use tokio::sync::{mpsc, OnceCell};
use tracing::{debug, instrument, warn};

use crate::command::Command;
use crate::config::Config;
use crate::connection::{self, CommandSink, ReplyStream};
use crate::pool::Pool;
use crate::reply::Reply;
use crate::{Error, Result};

/// Handle used to talk to the server.
///
/// Creating a client does not touch the network: the connection pool is set up on first use,
/// exactly once even when several tasks race for it. Clones share the same pool.
#[derive(Clone)]
pub struct Client {
    config: Config,
    pool: Arc<OnceCell<Pool>>,
}

impl Client {
    pub fn new(config: Config) -> Client {
        Client {
            config,
            pool: Default::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn pool(&self) -> &Pool {
        self.pool
            .get_or_init(|| async { Pool::new(self.config.clone()) })
            .await
    }

    /// Sends a single command and waits for its reply.
    ///
    /// If the peer closed the connection, the command is sent once more over a new
    /// connection. Any other failure, or a failure of that second attempt, is returned as is.
    /// Error replies are returned as [`Error::Server`].
    pub async fn execute(&self, command: Command) -> Result<Reply> {
        self.send(&command).await?.into_result()
    }

    /// Convenience over [`Client::execute`] for a command name and its arguments.
    pub async fn execute_args<I, A>(&self, name: &str, args: I) -> Result<Reply>
    where
        I: IntoIterator<Item = A>,
        A: AsRef<[u8]>,
    {
        self.execute(Command::new(name).args(args)).await
    }

    #[instrument(name = "execute", skip_all, fields(command = %command))]
    async fn send(&self, command: &Command) -> Result<Reply> {
        let mut lease = self.pool().await.acquire().await?;

        match lease.call(command).await {
            Err(err) if err.is_connection_closed() => {
                warn!("Connection closed by peer, retrying on a new connection");
                lease.reconnect().await?;
                lease.call(command).await
            }
            result => result,
        }
    }

    /// Holds one connection for a long lived session: every command received from `commands`
    /// is written as soon as it arrives while every reply read from the connection is pushed
    /// into `replies`.
    ///
    /// The session ends with the first failure of either side, or cleanly once `commands` is
    /// closed and `replies` has been dropped by the receiver. The connection is closed
    /// afterwards and its slot released empty, since whatever state the session set up on it
    /// (subscriptions) is not reusable.
    #[instrument(name = "stream", skip_all)]
    pub async fn run_stream(
        &self,
        commands: mpsc::Receiver<Command>,
        replies: mpsc::Sender<Reply>,
    ) -> Result<()> {
        let mut lease = self.pool().await.acquire().await?;

        // Make sure the connection is still alive before committing to it.
        let ping = Command::new("PING");
        match lease.call(&ping).await {
            Err(err) if err.is_connection_closed() => {
                warn!("Connection closed by peer, reconnecting before streaming");
                lease.reconnect().await?;
            }
            Err(err) => return Err(err),
            Ok(Reply::Status(status)) if status == "PONG" => {}
            Ok(reply) => {
                return Err(Error::UnexpectedReply {
                    expected: "PONG",
                    actual: reply,
                })
            }
        }

        let conn = lease
            .take()
            .ok_or_else(|| Error::Usage("leased slot holds no connection".to_string()))?;
        let id = conn.id;
        let (reader, writer) = conn.into_split();

        debug!(connection_id = %id, "Streaming session started");
        let result = tokio::try_join!(write_loop(writer, commands), read_loop(reader, replies));
        debug!(connection_id = %id, "Streaming session ended");

        result.map(|_| ())
    }
}

impl Default for Client {
    fn default() -> Self {
        Client::new(Config::default())
    }
}

async fn write_loop(mut writer: CommandSink, mut commands: mpsc::Receiver<Command>) -> Result<()> {
    while let Some(command) = commands.recv().await {
        debug!(command = %command, "Sending command");
        writer.send(&command).await?;
    }
    Ok(())
}

async fn read_loop(mut reader: ReplyStream, replies: mpsc::Sender<Reply>) -> Result<()> {
    loop {
        let reply = tokio::select! {
            _ = replies.closed() => return Ok(()),
            reply = connection::read_reply(&mut reader) => reply?.into_result()?,
        };

        if replies.send(reply).await.is_err() {
            return Ok(());
        }
    }
}
