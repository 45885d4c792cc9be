use bytes::Bytes;

use crate::client::Client;
use crate::command::Command;
use crate::commands::{into_strings, ok};
use crate::Result;

impl Client {
    /// Ref: <https://redis.io/docs/latest/commands/exists/>
    pub async fn exists(&self, key: &str) -> Result<bool> {
        self.execute(Command::new("EXISTS").arg(key))
            .await?
            .into_bool()
    }

    /// Removes `key`. Returns true when the key existed.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/del/>
    pub async fn del(&self, key: &str) -> Result<bool> {
        self.execute(Command::new("DEL").arg(key))
            .await?
            .into_bool()
    }

    /// Returns the string representation of the type of the value stored at `key`, `none`
    /// when it does not exist.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/type/>
    pub async fn key_type(&self, key: &str) -> Result<String> {
        self.execute(Command::new("TYPE").arg(key))
            .await?
            .into_status()
    }

    /// Ref: <https://redis.io/docs/latest/commands/keys/>
    pub async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        into_strings(self.execute(Command::new("KEYS").arg(pattern)).await?)
    }

    /// Ref: <https://redis.io/docs/latest/commands/randomkey/>
    pub async fn randomkey(&self) -> Result<Bytes> {
        self.execute(Command::new("RANDOMKEY")).await?.into_bulk()
    }

    /// Ref: <https://redis.io/docs/latest/commands/rename/>
    pub async fn rename(&self, src: &str, dst: &str) -> Result<()> {
        ok(self.execute(Command::new("RENAME").arg(src).arg(dst)).await?)
    }

    /// Ref: <https://redis.io/docs/latest/commands/renamenx/>
    pub async fn renamenx(&self, src: &str, dst: &str) -> Result<bool> {
        self.execute(Command::new("RENAMENX").arg(src).arg(dst))
            .await?
            .into_bool()
    }

    /// Ref: <https://redis.io/docs/latest/commands/dbsize/>
    pub async fn dbsize(&self) -> Result<i64> {
        self.execute(Command::new("DBSIZE")).await?.into_integer()
    }

    /// Ref: <https://redis.io/docs/latest/commands/expire/>
    pub async fn expire(&self, key: &str, seconds: i64) -> Result<bool> {
        self.execute(Command::new("EXPIRE").arg(key).arg(seconds.to_string()))
            .await?
            .into_bool()
    }

    /// Remaining time to live in seconds. `-1` when the key has no expiry, `-2` when it does
    /// not exist.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/ttl/>
    pub async fn ttl(&self, key: &str) -> Result<i64> {
        self.execute(Command::new("TTL").arg(key))
            .await?
            .into_integer()
    }

    /// Moves `key` to database `db`. Named after `MOVE`, `move` being a keyword.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/move/>
    pub async fn move_key(&self, key: &str, db: u32) -> Result<bool> {
        self.execute(Command::new("MOVE").arg(key).arg(db.to_string()))
            .await?
            .into_bool()
    }
}
