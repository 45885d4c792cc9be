use bytes::Bytes;

use crate::client::Client;
use crate::command::Command;
use crate::commands::ok;
use crate::reply::Reply;
use crate::{Error, Result};

impl Client {
    /// Appends `value` to the list at `key` and returns the length of the list.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/rpush/>
    pub async fn rpush(&self, key: &str, value: impl AsRef<[u8]>) -> Result<i64> {
        self.execute(Command::new("RPUSH").arg(key).arg(value))
            .await?
            .into_integer()
    }

    /// Ref: <https://redis.io/docs/latest/commands/lpush/>
    pub async fn lpush(&self, key: &str, value: impl AsRef<[u8]>) -> Result<i64> {
        self.execute(Command::new("LPUSH").arg(key).arg(value))
            .await?
            .into_integer()
    }

    /// Ref: <https://redis.io/docs/latest/commands/llen/>
    pub async fn llen(&self, key: &str) -> Result<i64> {
        self.execute(Command::new("LLEN").arg(key))
            .await?
            .into_integer()
    }

    /// Elements between `start` and `stop`, both inclusive. Negative offsets count from the
    /// tail of the list.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/lrange/>
    pub async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Bytes>> {
        self.execute(range("LRANGE", key, start, stop))
            .await?
            .into_array()
    }

    /// Ref: <https://redis.io/docs/latest/commands/ltrim/>
    pub async fn ltrim(&self, key: &str, start: i64, stop: i64) -> Result<()> {
        ok(self.execute(range("LTRIM", key, start, stop)).await?)
    }

    /// Ref: <https://redis.io/docs/latest/commands/lindex/>
    pub async fn lindex(&self, key: &str, index: i64) -> Result<Bytes> {
        self.execute(Command::new("LINDEX").arg(key).arg(index.to_string()))
            .await?
            .into_bulk()
    }

    /// Ref: <https://redis.io/docs/latest/commands/lset/>
    pub async fn lset(&self, key: &str, index: i64, value: impl AsRef<[u8]>) -> Result<()> {
        let command = Command::new("LSET")
            .arg(key)
            .arg(index.to_string())
            .arg(value);
        ok(self.execute(command).await?)
    }

    /// Removes up to `count` occurrences of `value` and returns how many were removed.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/lrem/>
    pub async fn lrem(&self, key: &str, count: i64, value: impl AsRef<[u8]>) -> Result<i64> {
        let command = Command::new("LREM")
            .arg(key)
            .arg(count.to_string())
            .arg(value);
        self.execute(command).await?.into_integer()
    }

    /// Ref: <https://redis.io/docs/latest/commands/lpop/>
    pub async fn lpop(&self, key: &str) -> Result<Bytes> {
        self.execute(Command::new("LPOP").arg(key))
            .await?
            .into_bulk()
    }

    /// Ref: <https://redis.io/docs/latest/commands/rpop/>
    pub async fn rpop(&self, key: &str) -> Result<Bytes> {
        self.execute(Command::new("RPOP").arg(key))
            .await?
            .into_bulk()
    }

    /// Blocking pop from the head of the first non empty list. Returns the key the element was
    /// popped from, or `None` once `timeout` seconds elapsed (zero blocks indefinitely).
    ///
    /// The connection stays leased for as long as the server blocks.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/blpop/>
    pub async fn blpop(&self, keys: &[&str], timeout: u64) -> Result<Option<(String, Bytes)>> {
        self.bpop("BLPOP", keys, timeout).await
    }

    /// Ref: <https://redis.io/docs/latest/commands/brpop/>
    pub async fn brpop(&self, keys: &[&str], timeout: u64) -> Result<Option<(String, Bytes)>> {
        self.bpop("BRPOP", keys, timeout).await
    }

    async fn bpop(
        &self,
        name: &str,
        keys: &[&str],
        timeout: u64,
    ) -> Result<Option<(String, Bytes)>> {
        let command = Command::new(name).args(keys).arg(timeout.to_string());
        let items = match self.execute(command).await? {
            Reply::Array(items) => items,
            // Some servers answer a timeout with a null bulk instead of a null array.
            Reply::Absent => return Ok(None),
            actual => {
                return Err(Error::UnexpectedReply {
                    expected: "array",
                    actual,
                })
            }
        };

        match <[Bytes; 2]>::try_from(items) {
            Ok([key, value]) => Ok(Some((String::from_utf8_lossy(&key).into_owned(), value))),
            Err(_) => Ok(None),
        }
    }

    /// Ref: <https://redis.io/docs/latest/commands/rpoplpush/>
    pub async fn rpoplpush(&self, src: &str, dst: &str) -> Result<Bytes> {
        self.execute(Command::new("RPOPLPUSH").arg(src).arg(dst))
            .await?
            .into_bulk()
    }
}

fn range(name: &str, key: &str, start: i64, stop: i64) -> Command {
    Command::new(name)
        .arg(key)
        .arg(start.to_string())
        .arg(stop.to_string())
}
