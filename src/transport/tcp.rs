//! TCP transport implementation
//!
//! Opens the blocking TCP stream a 4D session runs over.

use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::config::Config;
use crate::error::{Error, Result};

use super::Transport;

/// Transport over a plain TCP stream
pub type TcpTransport = Transport<TcpStream>;

impl Transport<TcpStream> {
    /// Connect to `host:port`
    ///
    /// Every resolved address is tried in turn with `connect_timeout`. The
    /// optional `read_timeout` bounds each individual read; without it a
    /// stalled server blocks the caller indefinitely.
    pub fn connect(
        host: &str,
        port: u16,
        connect_timeout: Duration,
        read_timeout: Option<Duration>,
    ) -> Result<Self> {
        let address = format!("{}:{}", host, port);
        let connection_error = |source| Error::Connection {
            address: address.clone(),
            source,
        };

        let addrs = (host, port).to_socket_addrs().map_err(connection_error)?;

        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, connect_timeout) {
                Ok(stream) => {
                    stream.set_nodelay(true).map_err(connection_error)?;
                    stream
                        .set_read_timeout(read_timeout)
                        .map_err(connection_error)?;
                    tracing::debug!(%addr, "connected");
                    return Ok(Transport::new(stream).with_read_timeout(read_timeout));
                }
                Err(e) => {
                    tracing::debug!(%addr, error = %e, "connect attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(connection_error(last_error.unwrap_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "host resolved to no addresses",
            )
        })))
    }

    /// Connect using a Config
    pub fn connect_with_config(config: &Config) -> Result<Self> {
        Self::connect(
            &config.host,
            config.port,
            config.connect_timeout,
            config.read_timeout,
        )
    }
}
