use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Semaphore;
use tracing::debug;

use crate::command::Command;
use crate::config::Config;
use crate::connection::Connection;
use crate::reply::Reply;
use crate::{Error, Result};

/// A fixed number of slots, each holding either an open connection or nothing yet.
///
/// Leasing pops a slot and waits when none is left, releasing pushes one back and never
/// waits. Empty slots are turned into connections on demand, so no network activity happens
/// until a connection is actually needed. The pool is cheap to clone.
#[derive(Clone)]
pub struct Pool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    config: Config,
    slots: Mutex<VecDeque<Option<Connection>>>,
    available: Semaphore,
}

impl Pool {
    pub fn new(config: Config) -> Pool {
        let capacity = config.capacity();
        let slots = (0..capacity).map(|_| None).collect();

        Pool {
            inner: Arc::new(PoolInner {
                config,
                slots: Mutex::new(slots),
                available: Semaphore::new(capacity),
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn capacity(&self) -> usize {
        self.inner.config.capacity()
    }

    /// Slots that can be leased right now without waiting.
    pub fn available(&self) -> usize {
        self.inner.available.available_permits()
    }

    /// Leases a connection, waiting until a slot is free. An empty slot is turned into a new
    /// connection; if that fails the slot goes back to the pool empty.
    pub async fn acquire(&self) -> Result<PooledConnection> {
        self.inner
            .available
            .acquire()
            .await
            .map_err(|_| Error::Usage("connection pool is closed".to_string()))?
            .forget();

        let mut lease = PooledConnection {
            pool: self.inner.clone(),
            conn: self.inner.slots().pop_front().flatten(),
        };

        if lease.conn.is_none() {
            lease.reconnect().await?;
        }

        Ok(lease)
    }
}

impl PoolInner {
    fn slots(&self) -> MutexGuard<'_, VecDeque<Option<Connection>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(&self, conn: Option<Connection>) {
        self.slots().push_back(conn);
        self.available.add_permits(1);
    }
}

/// Exclusive hold on one pool slot. The slot, with or without its connection, goes back to
/// the pool on drop.
pub struct PooledConnection {
    pool: Arc<PoolInner>,
    conn: Option<Connection>,
}

impl PooledConnection {
    /// Sends one command and reads its reply. A transport or protocol failure closes the
    /// connection, the slot is then released empty.
    pub async fn call(&mut self, command: &Command) -> Result<Reply> {
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| Error::Usage("leased slot holds no connection".to_string()))?;

        let result = conn.call(command).await;
        if let Err(err) = &result {
            if err.poisons_connection() {
                debug!(connection_id = %conn.id, "Discarding connection: {}", err);
                self.conn = None;
            }
        }
        result
    }

    /// Closes the current connection, if any, and opens a fresh one in its place.
    pub async fn reconnect(&mut self) -> Result<()> {
        self.conn = None;
        self.conn = Some(Connection::open(&self.pool.config).await?);
        Ok(())
    }

    /// Takes the connection out of the lease. The slot itself stays leased and is released
    /// empty.
    pub fn take(&mut self) -> Option<Connection> {
        self.conn.take()
    }

    pub fn connection(&mut self) -> Option<&mut Connection> {
        self.conn.as_mut()
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        self.pool.release(self.conn.take());
    }
}
