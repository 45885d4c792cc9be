use crate::client::Client;
use crate::command::Command;
use crate::commands::ok;
use crate::Result;

impl Client {
    /// Authenticates the connection this command happens to be sent on. To authenticate every
    /// pooled connection set [`Config::password`](crate::Config::password) instead.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/auth/>
    pub async fn auth(&self, password: &str) -> Result<()> {
        ok(self.execute(Command::new("AUTH").arg(password)).await?)
    }

    /// Ref: <https://redis.io/docs/latest/commands/ping/>
    pub async fn ping(&self) -> Result<String> {
        self.execute(Command::new("PING")).await?.into_status()
    }

    /// Removes every key of the selected database, or of all databases when `all` is set.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/flushdb/>
    pub async fn flush(&self, all: bool) -> Result<()> {
        let name = if all { "FLUSHALL" } else { "FLUSHDB" };
        ok(self.execute(Command::new(name)).await?)
    }

    /// Ref: <https://redis.io/docs/latest/commands/save/>
    pub async fn save(&self) -> Result<()> {
        ok(self.execute(Command::new("SAVE")).await?)
    }

    /// Ref: <https://redis.io/docs/latest/commands/bgsave/>
    pub async fn bgsave(&self) -> Result<()> {
        ok(self.execute(Command::new("BGSAVE")).await?)
    }

    /// Unix time of the last successful save.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/lastsave/>
    pub async fn lastsave(&self) -> Result<i64> {
        self.execute(Command::new("LASTSAVE")).await?.into_integer()
    }

    /// Ref: <https://redis.io/docs/latest/commands/bgrewriteaof/>
    pub async fn bgrewriteaof(&self) -> Result<()> {
        ok(self.execute(Command::new("BGREWRITEAOF")).await?)
    }

    /// Posts `payload` to `channel` and returns the number of subscribers that received it.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/publish/>
    pub async fn publish(&self, channel: &str, payload: impl AsRef<[u8]>) -> Result<i64> {
        self.execute(Command::new("PUBLISH").arg(channel).arg(payload))
            .await?
            .into_integer()
    }
}
