//! Server configuration
//!
//! The only external setting is the listen address, taken from the first
//! command-line argument. Everything else keeps its default.

use std::time::Duration;

use crate::error::AppError;

/// Default listen port
pub const DEFAULT_PORT: u16 = 1500;

/// Default maximum inbound line length in bytes
pub const DEFAULT_MAX_LINE_LENGTH: usize = 4096;

/// Default time a closing session's writer gets to flush
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Runtime settings for [`ChatServer`](crate::server::ChatServer)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind, `host:port`
    pub addr: String,
    /// Longest accepted inbound line; longer lines end the connection
    pub max_line_length: usize,
    /// How long a closing session's writer may keep flushing
    pub drain_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: format!("0.0.0.0:{}", DEFAULT_PORT),
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }
}

impl ServerConfig {
    /// Build a config from command-line arguments (program name excluded)
    ///
    /// The first argument is either a bare port (`1500`) or a full
    /// address (`127.0.0.1:9000`).
    pub fn from_args<I>(mut args: I) -> Result<Self, AppError>
    where
        I: Iterator<Item = String>,
    {
        let mut config = Self::default();
        if let Some(arg) = args.next() {
            config.addr = parse_addr(&arg)?;
        }
        Ok(config)
    }
}

fn parse_addr(arg: &str) -> Result<String, AppError> {
    let arg = arg.trim();
    if arg.contains(':') {
        return Ok(arg.to_string());
    }
    if arg.chars().all(|c| c.is_ascii_digit()) && !arg.is_empty() {
        let port: u16 = arg
            .parse()
            .map_err(|_| AppError::Config(format!("invalid port '{}'", arg)))?;
        return Ok(format!("0.0.0.0:{}", port));
    }
    Err(AppError::Config(format!(
        "expected a port or host:port, got '{}'",
        arg
    )))
}
