pub mod client;
pub mod codec;
pub mod command;
pub mod commands;
pub mod config;
pub mod connection;
pub mod error;
pub mod pool;
pub mod pubsub;
pub mod reply;

pub use client::Client;
pub use command::Command;
pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use pubsub::{Message, Subscriptions};
pub use reply::Reply;
