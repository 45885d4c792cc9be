use bytes::Bytes;

use crate::client::Client;
use crate::command::Command;
use crate::Result;

impl Client {
    /// Adds `member` to the set at `key`. Returns false when it was already a member.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/sadd/>
    pub async fn sadd(&self, key: &str, member: impl AsRef<[u8]>) -> Result<bool> {
        self.execute(Command::new("SADD").arg(key).arg(member))
            .await?
            .into_bool()
    }

    /// Ref: <https://redis.io/docs/latest/commands/srem/>
    pub async fn srem(&self, key: &str, member: impl AsRef<[u8]>) -> Result<bool> {
        self.execute(Command::new("SREM").arg(key).arg(member))
            .await?
            .into_bool()
    }

    /// Ref: <https://redis.io/docs/latest/commands/spop/>
    pub async fn spop(&self, key: &str) -> Result<Bytes> {
        self.execute(Command::new("SPOP").arg(key))
            .await?
            .into_bulk()
    }

    /// Ref: <https://redis.io/docs/latest/commands/smove/>
    pub async fn smove(&self, src: &str, dst: &str, member: impl AsRef<[u8]>) -> Result<bool> {
        self.execute(Command::new("SMOVE").arg(src).arg(dst).arg(member))
            .await?
            .into_bool()
    }

    /// Ref: <https://redis.io/docs/latest/commands/scard/>
    pub async fn scard(&self, key: &str) -> Result<i64> {
        self.execute(Command::new("SCARD").arg(key))
            .await?
            .into_integer()
    }

    /// Ref: <https://redis.io/docs/latest/commands/sismember/>
    pub async fn sismember(&self, key: &str, member: impl AsRef<[u8]>) -> Result<bool> {
        self.execute(Command::new("SISMEMBER").arg(key).arg(member))
            .await?
            .into_bool()
    }

    /// Ref: <https://redis.io/docs/latest/commands/sinter/>
    pub async fn sinter(&self, keys: &[&str]) -> Result<Vec<Bytes>> {
        self.execute(Command::new("SINTER").args(keys))
            .await?
            .into_array()
    }

    /// Stores the intersection in `dst` and returns its size.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/sinterstore/>
    pub async fn sinterstore(&self, dst: &str, keys: &[&str]) -> Result<i64> {
        self.execute(Command::new("SINTERSTORE").arg(dst).args(keys))
            .await?
            .into_integer()
    }

    /// Ref: <https://redis.io/docs/latest/commands/sunion/>
    pub async fn sunion(&self, keys: &[&str]) -> Result<Vec<Bytes>> {
        self.execute(Command::new("SUNION").args(keys))
            .await?
            .into_array()
    }

    /// Ref: <https://redis.io/docs/latest/commands/sunionstore/>
    pub async fn sunionstore(&self, dst: &str, keys: &[&str]) -> Result<i64> {
        self.execute(Command::new("SUNIONSTORE").arg(dst).args(keys))
            .await?
            .into_integer()
    }

    /// Members of the set at `key` that are in none of the `others`.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/sdiff/>
    pub async fn sdiff(&self, key: &str, others: &[&str]) -> Result<Vec<Bytes>> {
        self.execute(Command::new("SDIFF").arg(key).args(others))
            .await?
            .into_array()
    }

    /// Ref: <https://redis.io/docs/latest/commands/sdiffstore/>
    pub async fn sdiffstore(&self, dst: &str, key: &str, others: &[&str]) -> Result<i64> {
        self.execute(Command::new("SDIFFSTORE").arg(dst).arg(key).args(others))
            .await?
            .into_integer()
    }

    /// Ref: <https://redis.io/docs/latest/commands/smembers/>
    pub async fn smembers(&self, key: &str) -> Result<Vec<Bytes>> {
        self.execute(Command::new("SMEMBERS").arg(key))
            .await?
            .into_array()
    }

    /// Ref: <https://redis.io/docs/latest/commands/srandmember/>
    pub async fn srandmember(&self, key: &str) -> Result<Bytes> {
        self.execute(Command::new("SRANDMEMBER").arg(key))
            .await?
            .into_bulk()
    }
}
