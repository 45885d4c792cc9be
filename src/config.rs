use crate::codec::DEFAULT_MAX_FRAME_SIZE;

pub const DEFAULT_ADDR: &str = "127.0.0.1:6379";
pub const DEFAULT_POOL_SIZE: usize = 5;

/// Everything needed to open connections to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Server address, e.g. "127.0.0.1:6379". An empty address means the default one.
    pub addr: String,
    /// Sent with `AUTH` right after connecting.
    pub password: Option<String>,
    /// Selected with `SELECT` right after connecting, unless it is the default database 0.
    pub db: u32,
    /// Maximum number of connections held by the pool. Zero means the default size.
    pub pool_size: usize,
    /// Upper bound for a single buffered reply.
    pub max_frame_size: usize,
}

impl Config {
    pub fn new(addr: impl Into<String>) -> Config {
        Config {
            addr: addr.into(),
            ..Config::default()
        }
    }

    pub fn password(mut self, password: impl Into<String>) -> Config {
        self.password = Some(password.into());
        self
    }

    pub fn db(mut self, db: u32) -> Config {
        self.db = db;
        self
    }

    pub fn pool_size(mut self, pool_size: usize) -> Config {
        self.pool_size = pool_size;
        self
    }

    pub fn max_frame_size(mut self, max_frame_size: usize) -> Config {
        self.max_frame_size = max_frame_size;
        self
    }

    pub(crate) fn addr(&self) -> &str {
        if self.addr.is_empty() {
            DEFAULT_ADDR
        } else {
            &self.addr
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        if self.pool_size == 0 {
            DEFAULT_POOL_SIZE
        } else {
            self.pool_size
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            addr: DEFAULT_ADDR.to_string(),
            password: None,
            db: 0,
            pool_size: DEFAULT_POOL_SIZE,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}
