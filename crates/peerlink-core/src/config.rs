use std::default::Default;

use crate::constants::{BANDWIDTH_UNLIMITED, DEFAULT_CHANNEL_LIMIT, DEFAULT_PEER_COUNT};

/// Address binding for a server-capable host.
///
/// Supplying a `BindConfig` at all puts the host in server mode: it will
/// accept incoming connections. An address without a port keeps the default
/// port; a port without an address binds to all interfaces.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BindConfig {
    /// Literal IP address to bind, e.g. `"0.0.0.0"` or `"127.0.0.1"`.
    /// Host names are not resolved. `None` binds all interfaces.
    pub address: Option<String>,
    /// UDP port to bind. `None` keeps the default port (0, ephemeral).
    pub port: Option<u16>,
}

impl BindConfig {
    /// Binds every interface on the given port.
    pub fn port(port: u16) -> Self {
        Self { address: None, port: Some(port) }
    }

    /// Binds a specific address and port.
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self { address: Some(address.into()), port: Some(port) }
    }
}

/// Tunable settings applied when a host is created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostOptions {
    /// Maximum number of peers the host will track.
    pub peer_count: usize,
    /// Number of channels multiplexed per connection (1-255).
    pub channel_limit: u8,
    /// Incoming bandwidth cap in bytes/sec (0 = unlimited).
    pub incoming_bandwidth: u32,
    /// Outgoing bandwidth cap in bytes/sec (0 = unlimited).
    pub outgoing_bandwidth: u32,
}

impl Default for HostOptions {
    fn default() -> Self {
        Self {
            peer_count: DEFAULT_PEER_COUNT,
            channel_limit: DEFAULT_CHANNEL_LIMIT,
            incoming_bandwidth: BANDWIDTH_UNLIMITED,
            outgoing_bandwidth: BANDWIDTH_UNLIMITED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_host_options() {
        let options = HostOptions::default();
        assert_eq!(options.peer_count, 32);
        assert_eq!(options.channel_limit, 2);
        assert_eq!(options.incoming_bandwidth, 0);
        assert_eq!(options.outgoing_bandwidth, 0);
    }

    #[test]
    fn bind_config_shortcuts() {
        assert_eq!(
            BindConfig::port(7777),
            BindConfig { address: None, port: Some(7777) }
        );
        assert_eq!(
            BindConfig::new("127.0.0.1", 9000),
            BindConfig { address: Some("127.0.0.1".into()), port: Some(9000) }
        );
    }
}
