//! A tiny in-process server speaking just enough of the protocol for the client tests.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use futures::StreamExt;
use glob_match::glob_match;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_util::codec::FramedRead;

use rustdis_client::codec::RespCodec;
use rustdis_client::Reply;

#[derive(Default, Clone)]
pub struct Options {
    pub password: Option<String>,
    /// Number of connections that are closed as soon as their first request arrives.
    pub drop_first: usize,
}

pub struct FakeServer {
    pub addr: String,
    state: Arc<State>,
}

impl FakeServer {
    pub async fn start() -> FakeServer {
        FakeServer::with_options(Options::default()).await
    }

    pub async fn with_options(options: Options) -> FakeServer {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let state = Arc::new(State {
            options,
            accepted: AtomicUsize::new(0),
            selected: Mutex::new(Vec::new()),
            data: Mutex::new(HashMap::new()),
            subscribers: Mutex::new(HashMap::new()),
        });

        tokio::spawn({
            let state = state.clone();
            async move {
                while let Ok((socket, _)) = listener.accept().await {
                    let id = state.accepted.fetch_add(1, Ordering::SeqCst);
                    tokio::spawn(handle_connection(socket, id, state.clone()));
                }
            }
        });

        FakeServer { addr, state }
    }

    /// Connections accepted so far.
    pub fn accepted(&self) -> usize {
        self.state.accepted.load(Ordering::SeqCst)
    }

    /// Database indexes requested with SELECT, in order.
    pub fn selected(&self) -> Vec<String> {
        self.state.selected.lock().unwrap().clone()
    }
}

enum Value {
    String(Bytes),
    List(VecDeque<Bytes>),
}

struct Subscriber {
    channels: HashSet<String>,
    patterns: HashSet<String>,
    push: UnboundedSender<Vec<u8>>,
}

struct State {
    options: Options,
    accepted: AtomicUsize,
    selected: Mutex<Vec<String>>,
    data: Mutex<HashMap<Bytes, Value>>,
    subscribers: Mutex<HashMap<usize, Subscriber>>,
}

async fn handle_connection(socket: TcpStream, id: usize, state: Arc<State>) {
    let (read_half, mut write_half) = socket.into_split();
    let mut requests = FramedRead::new(read_half, RespCodec::default());
    let (push_tx, mut push_rx) = mpsc::unbounded_channel::<Vec<u8>>();
    let mut authenticated = state.options.password.is_none();

    loop {
        let response = tokio::select! {
            request = requests.next() => {
                let parts = match request {
                    Some(Ok(Reply::Array(parts))) if !parts.is_empty() => parts,
                    _ => break,
                };
                if id < state.options.drop_first {
                    break;
                }

                let name = String::from_utf8_lossy(&parts[0]).to_uppercase();
                if name == "QUIT" {
                    let _ = write_half.write_all(b"+OK\r\n").await;
                    break;
                }
                state.execute(id, &name, &parts[1..], &push_tx, &mut authenticated)
            }
            Some(push) = push_rx.recv() => push,
        };

        if write_half.write_all(&response).await.is_err() {
            break;
        }
    }

    state.subscribers.lock().unwrap().remove(&id);
}

impl State {
    fn execute(
        &self,
        id: usize,
        name: &str,
        args: &[Bytes],
        push: &UnboundedSender<Vec<u8>>,
        authenticated: &mut bool,
    ) -> Vec<u8> {
        if name == "AUTH" {
            return match (&self.options.password, args.first()) {
                (Some(password), Some(given)) if password.as_bytes() == &given[..] => {
                    *authenticated = true;
                    b"+OK\r\n".to_vec()
                }
                _ => b"-ERR invalid password\r\n".to_vec(),
            };
        }
        if !*authenticated {
            return b"-NOAUTH Authentication required.\r\n".to_vec();
        }

        match (name, args) {
            ("PING", []) => b"+PONG\r\n".to_vec(),
            ("SELECT", [index]) => {
                let index = String::from_utf8_lossy(index).to_string();
                match index.parse::<u32>() {
                    Ok(i) if i < 16 => {
                        self.selected.lock().unwrap().push(index);
                        b"+OK\r\n".to_vec()
                    }
                    _ => b"-ERR DB index is out of range\r\n".to_vec(),
                }
            }
            ("SET", [key, value]) => {
                let mut data = self.data.lock().unwrap();
                data.insert(key.clone(), Value::String(value.clone()));
                b"+OK\r\n".to_vec()
            }
            ("GET", [key]) => match self.data.lock().unwrap().get(key) {
                Some(Value::String(value)) => bulk(value),
                Some(Value::List(_)) => wrong_type(),
                None => b"$-1\r\n".to_vec(),
            },
            ("DEL", keys) if !keys.is_empty() => {
                let mut data = self.data.lock().unwrap();
                let removed = keys.iter().filter(|k| data.remove(*k).is_some()).count();
                integer(removed as i64)
            }
            ("RPUSH", [key, values @ ..]) if !values.is_empty() => {
                let mut data = self.data.lock().unwrap();
                let entry = data
                    .entry(key.clone())
                    .or_insert_with(|| Value::List(VecDeque::new()));
                match entry {
                    Value::List(list) => {
                        list.extend(values.iter().cloned());
                        integer(list.len() as i64)
                    }
                    Value::String(_) => wrong_type(),
                }
            }
            ("LRANGE", [key, start, stop]) => {
                let (Some(start), Some(stop)) = (number(start), number(stop)) else {
                    return b"-ERR value is not an integer or out of range\r\n".to_vec();
                };
                match self.data.lock().unwrap().get(key) {
                    Some(Value::List(list)) => array(&range(list, start, stop)),
                    Some(Value::String(_)) => wrong_type(),
                    None => array(&[]),
                }
            }
            ("PUBLISH", [channel, payload]) => {
                let channel = String::from_utf8_lossy(channel).to_string();
                integer(self.publish(&channel, payload))
            }
            ("SUBSCRIBE", channels) | ("PSUBSCRIBE", channels) if !channels.is_empty() => {
                self.subscribe(id, name, channels, push)
            }
            ("UNSUBSCRIBE", channels) | ("PUNSUBSCRIBE", channels) if !channels.is_empty() => {
                self.unsubscribe(id, name, channels)
            }
            _ => format!("-ERR unknown command '{}'\r\n", name).into_bytes(),
        }
    }

    fn publish(&self, channel: &str, payload: &Bytes) -> i64 {
        let subscribers = self.subscribers.lock().unwrap();
        let mut received = 0;

        for subscriber in subscribers.values() {
            if subscriber.channels.contains(channel) {
                let message = array(&[
                    Bytes::from("message"),
                    Bytes::from(channel.to_string()),
                    payload.clone(),
                ]);
                if subscriber.push.send(message).is_ok() {
                    received += 1;
                }
            }
            for pattern in &subscriber.patterns {
                if glob_match(pattern, channel) {
                    let message = array(&[
                        Bytes::from("pmessage"),
                        Bytes::from(pattern.clone()),
                        Bytes::from(channel.to_string()),
                        payload.clone(),
                    ]);
                    if subscriber.push.send(message).is_ok() {
                        received += 1;
                    }
                }
            }
        }

        received
    }

    fn subscribe(
        &self,
        id: usize,
        name: &str,
        channels: &[Bytes],
        push: &UnboundedSender<Vec<u8>>,
    ) -> Vec<u8> {
        let mut subscribers = self.subscribers.lock().unwrap();
        let subscriber = subscribers.entry(id).or_insert_with(|| Subscriber {
            channels: HashSet::new(),
            patterns: HashSet::new(),
            push: push.clone(),
        });

        let mut response = Vec::new();
        for channel in channels {
            let channel = String::from_utf8_lossy(channel).to_string();
            if name == "SUBSCRIBE" {
                subscriber.channels.insert(channel.clone());
            } else {
                subscriber.patterns.insert(channel.clone());
            }
            let count = subscriber.channels.len() + subscriber.patterns.len();
            response.extend(acknowledgement(name, &channel, count));
        }
        response
    }

    fn unsubscribe(&self, id: usize, name: &str, channels: &[Bytes]) -> Vec<u8> {
        let mut subscribers = self.subscribers.lock().unwrap();

        let mut response = Vec::new();
        for channel in channels {
            let channel = String::from_utf8_lossy(channel).to_string();
            let count = match subscribers.get_mut(&id) {
                Some(subscriber) => {
                    if name == "UNSUBSCRIBE" {
                        subscriber.channels.remove(&channel);
                    } else {
                        subscriber.patterns.remove(&channel);
                    }
                    subscriber.channels.len() + subscriber.patterns.len()
                }
                None => 0,
            };
            response.extend(acknowledgement(name, &channel, count));
        }
        response
    }
}

fn acknowledgement(name: &str, channel: &str, count: usize) -> Vec<u8> {
    let mut bytes = b"*3\r\n".to_vec();
    bytes.extend(bulk(name.to_lowercase().as_bytes()));
    bytes.extend(bulk(channel.as_bytes()));
    bytes.extend(integer(count as i64));
    bytes
}

fn range(list: &VecDeque<Bytes>, start: i64, stop: i64) -> Vec<Bytes> {
    let len = list.len() as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if start > stop || start >= len {
        return Vec::new();
    }
    list.iter()
        .skip(start as usize)
        .take((stop - start + 1) as usize)
        .cloned()
        .collect()
}

fn number(bytes: &Bytes) -> Option<i64> {
    std::str::from_utf8(bytes).ok()?.parse().ok()
}

fn wrong_type() -> Vec<u8> {
    b"-WRONGTYPE Operation against a key holding the wrong kind of value\r\n".to_vec()
}

pub fn bulk(value: &[u8]) -> Vec<u8> {
    let mut bytes = format!("${}\r\n", value.len()).into_bytes();
    bytes.extend_from_slice(value);
    bytes.extend_from_slice(b"\r\n");
    bytes
}

pub fn integer(value: i64) -> Vec<u8> {
    format!(":{}\r\n", value).into_bytes()
}

pub fn array(items: &[Bytes]) -> Vec<u8> {
    let mut bytes = format!("*{}\r\n", items.len()).into_bytes();
    for item in items {
        bytes.extend(bulk(item));
    }
    bytes
}
