//! Server configuration

use std::net::{SocketAddr, ToSocketAddrs};

use semcheck_core::{CheckerError, Result};

/// tonic's own default decoding limit
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 4 * 1024 * 1024;

/// Transport-level settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on
    pub address: SocketAddr,
    /// Largest export request accepted, in bytes
    pub max_message_size: usize,
}

impl ServerConfig {
    /// Create a new configuration builder
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: SocketAddr::from(([0, 0, 0, 0], 4317)),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

/// Builder for ServerConfig
#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    address: Option<SocketAddr>,
    max_message_size: Option<usize>,
}

impl ServerConfigBuilder {
    pub fn address(mut self, address: SocketAddr) -> Self {
        self.address = Some(address);
        self
    }

    /// Resolve a `host:port` string; the first resolved address is used
    pub fn address_str(self, address: &str) -> Result<Self> {
        Ok(self.address(parse_address(address)?))
    }

    pub fn max_message_size(mut self, bytes: usize) -> Self {
        self.max_message_size = Some(bytes);
        self
    }

    pub fn build(self) -> ServerConfig {
        let defaults = ServerConfig::default();
        ServerConfig {
            address: self.address.unwrap_or(defaults.address),
            max_message_size: self.max_message_size.unwrap_or(defaults.max_message_size),
        }
    }
}

/// Parse `host:port`, resolving host names
pub fn parse_address(address: &str) -> Result<SocketAddr> {
    if let Ok(addr) = address.parse::<SocketAddr>() {
        return Ok(addr);
    }

    let invalid = |reason: String| CheckerError::InvalidConfig {
        reason: format!("server_address '{}': {}", address, reason),
    };

    address
        .to_socket_addrs()
        .map_err(|e| invalid(e.to_string()))?
        .next()
        .ok_or_else(|| invalid("resolved to no addresses".to_string()))
}
