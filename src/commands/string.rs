use bytes::Bytes;

use crate::client::Client;
use crate::command::Command;
use crate::commands::ok;
use crate::Result;

impl Client {
    /// Set `key` to hold the string `value`.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/set/>
    pub async fn set(&self, key: &str, value: impl AsRef<[u8]>) -> Result<()> {
        ok(self.execute(Command::new("SET").arg(key).arg(value)).await?)
    }

    /// Get the value of `key`. A missing key is reported as [`Error::Absent`](crate::Error::Absent).
    ///
    /// Ref: <https://redis.io/docs/latest/commands/get/>
    pub async fn get(&self, key: &str) -> Result<Bytes> {
        self.execute(Command::new("GET").arg(key))
            .await?
            .into_bulk()
    }

    /// Ref: <https://redis.io/docs/latest/commands/getset/>
    pub async fn getset(&self, key: &str, value: impl AsRef<[u8]>) -> Result<Bytes> {
        self.execute(Command::new("GETSET").arg(key).arg(value))
            .await?
            .into_bulk()
    }

    /// Returns the values of all specified keys. Keys holding no value are left out of the
    /// result.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/mget/>
    pub async fn mget(&self, keys: &[&str]) -> Result<Vec<Bytes>> {
        self.execute(Command::new("MGET").args(keys))
            .await?
            .into_array()
    }

    /// Ref: <https://redis.io/docs/latest/commands/setnx/>
    pub async fn setnx(&self, key: &str, value: impl AsRef<[u8]>) -> Result<bool> {
        self.execute(Command::new("SETNX").arg(key).arg(value))
            .await?
            .into_bool()
    }

    /// Ref: <https://redis.io/docs/latest/commands/setex/>
    pub async fn setex(&self, key: &str, seconds: u64, value: impl AsRef<[u8]>) -> Result<()> {
        let command = Command::new("SETEX")
            .arg(key)
            .arg(seconds.to_string())
            .arg(value);
        ok(self.execute(command).await?)
    }

    /// Ref: <https://redis.io/docs/latest/commands/mset/>
    pub async fn mset<V: AsRef<[u8]>>(&self, pairs: &[(&str, V)]) -> Result<()> {
        ok(self.execute(pairs_command("MSET", pairs)).await?)
    }

    /// Sets the given keys only if none of them exist. Returns true when all of them were set.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/msetnx/>
    pub async fn msetnx<V: AsRef<[u8]>>(&self, pairs: &[(&str, V)]) -> Result<bool> {
        self.execute(pairs_command("MSETNX", pairs))
            .await?
            .into_bool()
    }

    /// Ref: <https://redis.io/docs/latest/commands/incr/>
    pub async fn incr(&self, key: &str) -> Result<i64> {
        self.execute(Command::new("INCR").arg(key))
            .await?
            .into_integer()
    }

    /// Ref: <https://redis.io/docs/latest/commands/incrby/>
    pub async fn incrby(&self, key: &str, increment: i64) -> Result<i64> {
        self.execute(Command::new("INCRBY").arg(key).arg(increment.to_string()))
            .await?
            .into_integer()
    }

    /// Ref: <https://redis.io/docs/latest/commands/decr/>
    pub async fn decr(&self, key: &str) -> Result<i64> {
        self.execute(Command::new("DECR").arg(key))
            .await?
            .into_integer()
    }

    /// Ref: <https://redis.io/docs/latest/commands/decrby/>
    pub async fn decrby(&self, key: &str, decrement: i64) -> Result<i64> {
        self.execute(Command::new("DECRBY").arg(key).arg(decrement.to_string()))
            .await?
            .into_integer()
    }

    /// Appends `value` to the string at `key` and returns the new length.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/append/>
    pub async fn append(&self, key: &str, value: impl AsRef<[u8]>) -> Result<i64> {
        self.execute(Command::new("APPEND").arg(key).arg(value))
            .await?
            .into_integer()
    }

    /// Substring of the value at `key`, both offsets inclusive. Sent as `GETRANGE`, which
    /// replaced `SUBSTR`.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/getrange/>
    pub async fn substr(&self, key: &str, start: i64, end: i64) -> Result<Bytes> {
        let command = Command::new("GETRANGE")
            .arg(key)
            .arg(start.to_string())
            .arg(end.to_string());
        self.execute(command).await?.into_bulk()
    }

    /// Ref: <https://redis.io/docs/latest/commands/strlen/>
    pub async fn strlen(&self, key: &str) -> Result<i64> {
        self.execute(Command::new("STRLEN").arg(key))
            .await?
            .into_integer()
    }
}

fn pairs_command<V: AsRef<[u8]>>(name: &str, pairs: &[(&str, V)]) -> Command {
    pairs
        .iter()
        .fold(Command::new(name), |command, (key, value)| {
            command.arg(key).arg(value)
        })
}
