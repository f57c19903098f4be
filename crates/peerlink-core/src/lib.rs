#![warn(missing_docs)]

//! peerlink-core: foundational types shared across the bridge layers.
//!
//! This crate provides the minimal set of core pieces used by every layer:
//! - Configuration types (`BindConfig`, `HostOptions`)
//! - Error handling (`ErrorKind`, `Result`)
//! - The opaque peer-handle codec (`PeerHandle`, `HandleValue`)
//! - Outbound packet construction and flag policy (`OutboundPacket`, `PacketFlags`)
//! - The transport seam (`Transport`, `TransportEvent`)
//!
//! Host ownership, event polling and the runtime guard live in
//! `peerlink-host`; this crate has no I/O of its own.

/// Defaults shared across layers.
pub mod constants {
    /// Default maximum number of peers a host will track.
    pub const DEFAULT_PEER_COUNT: usize = 32;
    /// Default number of channels negotiated per connection.
    pub const DEFAULT_CHANNEL_LIMIT: u8 = 2;
    /// Bandwidth value meaning "unlimited".
    pub const BANDWIDTH_UNLIMITED: u32 = 0;
    /// Largest payload a single outbound packet may carry, in bytes.
    pub const MAX_PACKET_SIZE: usize = 16 * 1024;
    /// Highest peer identity a standard floating numeric can carry without
    /// aliasing (2^53). Above this, legacy numeric handles silently lose
    /// precision.
    pub const NUMERIC_HANDLE_EXACT_MAX: u64 = 1 << 53;
}

/// Configuration options for host creation.
pub mod config;
/// Error types and results.
pub mod error;
/// Opaque peer identities and the foreign-boundary codec.
pub mod handle;
/// Outbound packet construction, payload kinds and flag policy.
pub mod packet;
/// Transport abstraction: the black-box protocol engine behind the bridge.
pub mod transport;
