#![warn(missing_docs)]

//! Peerlink: a small public API facade for the workspace.
//!
//! This crate provides a clean, stable surface that re-exports
//! the most commonly used types for driving a transport host:
//!
//! - Bridge and events (`Bridge`, `Event`)
//! - Packet inputs and flags (`SendData`, `TypedSlice`, `PacketFlags`)
//! - Peer identities (`PeerHandle`, `HandleValue`)
//! - Host configuration (`BindConfig`, `HostOptions`)
//!
//! Example
//! ```ignore
//! use std::time::Duration;
//! use peerlink::{Bridge, Event, MemoryTransport, BindConfig, HostOptions, PacketFlags, SendData};
//!
//! let mut bridge = Bridge::<MemoryTransport>::new();
//! bridge.initialize().unwrap();
//! bridge.create_host(Some(BindConfig::port(9000)), HostOptions::default()).unwrap();
//!
//! // Poll once; nothing connected yet.
//! assert!(bridge.service(Duration::ZERO).unwrap().is_none());
//!
//! // Later, after a connect event handed us `peer`:
//! // bridge.send(peer, 0, SendData::Text("hello"), PacketFlags::RELIABLE).unwrap();
//! ```

// Core config and errors
pub use peerlink_core::{
    config::{BindConfig, HostOptions},
    error::{ErrorKind, Result},
};
// Peer identities as they cross a foreign boundary
pub use peerlink_core::handle::{HandleValue, PeerHandle};
// Packet inputs, flags and the transport seam
pub use peerlink_core::{
    packet::{OutboundPacket, PacketFlags, SendData, TypedSlice},
    transport::Transport,
};
// Bridge: owns the host, the event loop and the peer registry
pub use peerlink_host::{Bridge, Event, MemoryTransport};

/// Convenience prelude with the most commonly used items.
pub mod prelude {
    pub use crate::{
        BindConfig, Bridge, ErrorKind, Event, HandleValue, HostOptions, MemoryTransport,
        PacketFlags, PeerHandle, Result, SendData, TypedSlice,
    };
}
