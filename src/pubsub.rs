use std::future;
use std::str::{self, FromStr};

use bytes::Bytes;
use strum_macros::{EnumString, IntoStaticStr};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::client::Client;
use crate::command::Command;
use crate::reply::Reply;
use crate::{Error, Result};

const BUFFER: usize = 32;

/// A message published on a channel we are subscribed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// The pattern that matched the channel. For exact subscriptions this is the channel
    /// itself.
    pub pattern: String,
    pub channel: String,
    pub payload: Bytes,
}

/// Channels feeding a pub/sub session. Every channel name received on one of them is turned
/// into the matching request. Receiving an empty name, or the sending side being dropped,
/// ends the session. Channels that are not set are simply never polled.
#[derive(Debug, Default)]
pub struct Subscriptions {
    subscribe: Option<mpsc::Receiver<String>>,
    unsubscribe: Option<mpsc::Receiver<String>>,
    psubscribe: Option<mpsc::Receiver<String>>,
    punsubscribe: Option<mpsc::Receiver<String>>,
}

impl Subscriptions {
    pub fn new() -> Subscriptions {
        Subscriptions::default()
    }

    pub fn subscribe(mut self, channels: mpsc::Receiver<String>) -> Subscriptions {
        self.subscribe = Some(channels);
        self
    }

    pub fn unsubscribe(mut self, channels: mpsc::Receiver<String>) -> Subscriptions {
        self.unsubscribe = Some(channels);
        self
    }

    /// Glob-style patterns, e.g. `news.*`.
    pub fn psubscribe(mut self, patterns: mpsc::Receiver<String>) -> Subscriptions {
        self.psubscribe = Some(patterns);
        self
    }

    pub fn punsubscribe(mut self, patterns: mpsc::Receiver<String>) -> Subscriptions {
        self.punsubscribe = Some(patterns);
        self
    }
}

#[derive(Debug, Clone, Copy, IntoStaticStr)]
#[strum(serialize_all = "UPPERCASE")]
enum Request {
    Subscribe,
    Unsubscribe,
    Psubscribe,
    Punsubscribe,
}

/// First element of every array pushed by the server while subscribed.
#[derive(Debug, Clone, Copy, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
enum Kind {
    Message,
    Pmessage,
    Subscribe,
    Unsubscribe,
    Psubscribe,
    Punsubscribe,
}

impl Client {
    /// Runs a pub/sub session on a dedicated connection, delivering every published message to
    /// `messages`.
    ///
    /// Returns once the session is over: cleanly when one of the subscription channels signals
    /// the end or `messages` is dropped, with an error when the connection fails.
    #[instrument(name = "pubsub", skip_all)]
    pub async fn subscribe(
        &self,
        subscriptions: Subscriptions,
        messages: mpsc::Sender<Message>,
    ) -> Result<()> {
        let (command_tx, command_rx) = mpsc::channel(BUFFER);
        let (reply_tx, reply_rx) = mpsc::channel(BUFFER);
        let stop = CancellationToken::new();

        tokio::try_join!(
            self.run_stream(command_rx, reply_tx),
            forward_requests(subscriptions, command_tx, messages.clone(), stop.clone()),
            deliver_messages(reply_rx, messages, stop),
        )?;

        Ok(())
    }
}

async fn forward_requests(
    mut subscriptions: Subscriptions,
    commands: mpsc::Sender<Command>,
    messages: mpsc::Sender<Message>,
    stop: CancellationToken,
) -> Result<()> {
    // Whatever ends this loop also ends delivery.
    let _stop = stop.drop_guard();

    loop {
        let (request, channel) = tokio::select! {
            channel = recv(&mut subscriptions.subscribe) => (Request::Subscribe, channel),
            channel = recv(&mut subscriptions.unsubscribe) => (Request::Unsubscribe, channel),
            channel = recv(&mut subscriptions.psubscribe) => (Request::Psubscribe, channel),
            channel = recv(&mut subscriptions.punsubscribe) => (Request::Punsubscribe, channel),
            _ = messages.closed() => break,
        };

        let channel = match channel {
            Some(channel) if !channel.is_empty() => channel,
            _ => break,
        };

        let name: &'static str = request.into();
        debug!(request = name, channel = %channel, "Forwarding pub/sub request");
        if commands.send(Command::new(name).arg(channel)).await.is_err() {
            break;
        }
    }

    debug!("No more pub/sub requests");
    Ok(())
}

async fn recv(channels: &mut Option<mpsc::Receiver<String>>) -> Option<String> {
    match channels {
        Some(channels) => channels.recv().await,
        None => future::pending().await,
    }
}

async fn deliver_messages(
    mut replies: mpsc::Receiver<Reply>,
    messages: mpsc::Sender<Message>,
    stop: CancellationToken,
) -> Result<()> {
    loop {
        let reply = tokio::select! {
            _ = stop.cancelled() => break,
            reply = replies.recv() => match reply {
                Some(reply) => reply,
                None => break,
            },
        };

        if let Some(message) = classify(reply)? {
            tokio::select! {
                _ = stop.cancelled() => break,
                sent = messages.send(message) => {
                    if sent.is_err() {
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}

/// Picks the published messages out of the replies pushed by the server. Subscription
/// acknowledgements and anything unknown are dropped.
fn classify(reply: Reply) -> Result<Option<Message>> {
    let items = match reply {
        Reply::Array(items) => items,
        reply => {
            debug!(reply = %reply, "Ignoring reply outside of pub/sub");
            return Ok(None);
        }
    };

    let kind = match items.first() {
        Some(tag) => str::from_utf8(tag).ok().and_then(|tag| Kind::from_str(tag).ok()),
        None => return Err(Error::Usage("empty pub/sub reply".to_string())),
    };

    match kind {
        Some(Kind::Message) => {
            let [_, channel, payload] = expect_len::<3>(items, Kind::Message)?;
            let channel = lossy(channel);
            Ok(Some(Message {
                pattern: channel.clone(),
                channel,
                payload,
            }))
        }
        Some(Kind::Pmessage) => {
            let [_, pattern, channel, payload] = expect_len::<4>(items, Kind::Pmessage)?;
            Ok(Some(Message {
                pattern: lossy(pattern),
                channel: lossy(channel),
                payload,
            }))
        }
        Some(kind) => {
            let [_, channel, count] = expect_len::<3>(items, kind)?;
            let kind: &'static str = kind.into();
            debug!(
                kind,
                channel = %lossy(channel),
                count = %lossy(count),
                "Subscription acknowledged"
            );
            Ok(None)
        }
        None => {
            debug!(tag = %lossy(items[0].clone()), "Ignoring unknown pub/sub reply");
            Ok(None)
        }
    }
}

fn expect_len<const N: usize>(items: Vec<Bytes>, kind: Kind) -> Result<[Bytes; N]> {
    let name: &'static str = kind.into();
    items.try_into().map_err(|items: Vec<Bytes>| {
        Error::Usage(format!(
            "{} reply with {} elements, expected {}",
            name,
            items.len(),
            N
        ))
    })
}

fn lossy(bytes: Bytes) -> String {
    String::from_utf8_lossy(&bytes).into_owned()
}
