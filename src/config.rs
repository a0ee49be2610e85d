//! Connection configuration and address parsing
//!
//! Addresses are written `host` or `host:port`; the port defaults to 19812.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{DecodeMode, DEFAULT_FIRST_PAGE_SIZE, DEFAULT_PORT};
use crate::error::{Error, Result};

/// Default connect timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection configuration for a 4D SQL server.
///
/// # Examples
///
/// ```rust
/// use fourd_rs::Config;
/// use std::time::Duration;
///
/// let config = Config::new("db.local", 19812, "Designer", "secret")
///     .read_timeout(Duration::from_secs(30))
///     .first_page_size(10_000);
/// assert_eq!(config.to_string(), "db.local:19812");
/// ```
#[derive(Clone)]
pub struct Config {
    /// Host to connect to
    pub host: String,
    /// Port to connect to
    pub port: u16,
    /// Username for LOGIN
    pub username: String,
    /// Password for LOGIN
    password: String,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Per-read deadline (None blocks indefinitely)
    pub read_timeout: Option<Duration>,
    /// FIRST-PAGE-SIZE sent with every statement
    pub first_page_size: u32,
    /// Decoding of 64-bit and VK_FLOAT values
    pub decode_mode: DecodeMode,
}

impl Config {
    /// Create a new configuration
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// Set connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the per-read deadline
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Set the FIRST-PAGE-SIZE hint
    pub fn first_page_size(mut self, rows: u32) -> Self {
        self.first_page_size = rows;
        self
    }

    /// Set the decode mode
    pub fn decode_mode(mut self, mode: DecodeMode) -> Self {
        self.decode_mode = mode;
        self
    }

    /// Get the password (for authentication)
    pub(crate) fn password(&self) -> &str {
        &self.password
    }

    /// Set the password
    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = password.into();
    }

    /// Set the username
    pub fn set_username(&mut self, username: impl Into<String>) {
        self.username = username.into();
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check the values a connection attempt depends on
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(Error::InvalidConfig("missing host".to_string()));
        }
        if self.connect_timeout.is_zero() {
            return Err(Error::InvalidConfig("connect timeout must be non-zero".to_string()));
        }
        if self.read_timeout.is_some_and(|t| t.is_zero()) {
            return Err(Error::InvalidConfig("read timeout must be non-zero".to_string()));
        }
        if self.first_page_size == 0 {
            return Err(Error::InvalidConfig("first page size must be positive".to_string()));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            username: String::new(),
            password: String::new(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: None,
            first_page_size: DEFAULT_FIRST_PAGE_SIZE,
            decode_mode: DecodeMode::default(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("first_page_size", &self.first_page_size)
            .field("decode_mode", &self.decode_mode)
            .finish()
    }
}

/// Parse a `host[:port]` address
impl FromStr for Config {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();

        if s.is_empty() {
            return Err(Error::InvalidConfig("empty address".to_string()));
        }

        let mut config = Config::default();

        match s.rsplit_once(':') {
            Some((host, port)) => {
                config.host = host.to_string();
                config.port = port
                    .parse()
                    .map_err(|_| Error::InvalidConfig(format!("invalid port number: {}", port)))?;
            }
            None => config.host = s.to_string(),
        }

        if config.host.is_empty() {
            return Err(Error::InvalidConfig("missing host".to_string()));
        }

        Ok(config)
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
