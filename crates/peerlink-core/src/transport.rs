//! Transport abstraction: the black-box protocol engine behind the bridge.
//!
//! The bridge never touches reliability, sequencing, fragmentation or
//! congestion control; it reaches the engine through this fixed operation
//! set. Implementations can be real protocol stacks or in-process
//! emulators plugged in for tests.

use std::{
    net::SocketAddr,
    num::NonZeroU64,
    sync::{atomic::AtomicU32, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use crate::{
    config::HostOptions,
    error::Result,
    packet::OutboundPacket,
};

/// The transport's internal reference to a peer.
///
/// Opaque above the transport: the bridge maps these to external
/// [`crate::handle::PeerHandle`]s and never interprets the value. Zero is
/// unrepresentable, so "no peer" cannot leak through.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PeerRef(NonZeroU64);

impl PeerRef {
    /// Wraps a transport-internal reference value. Returns `None` for zero.
    pub fn new(value: u64) -> Option<Self> {
        NonZeroU64::new(value).map(Self)
    }

    /// Returns the raw reference value.
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

/// How a disconnection should be carried out.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DisconnectMode {
    /// Notify the peer and wait for acknowledgement; a disconnect event
    /// follows later from `service`.
    Graceful,
    /// Tear the connection down synchronously; no later local event.
    Immediate,
    /// Disconnect once all queued outgoing data has been delivered.
    Deferred,
}

/// One event drained from the transport's internal queue.
///
/// For `Receive`, `payload` is an owned buffer: producing the event
/// releases the transport's internal packet storage, so the caller never
/// holds a reference into transport-managed memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportEvent {
    /// A connection completed (outgoing) or was accepted (incoming).
    Connect {
        /// The transport's reference to the new peer.
        peer: PeerRef,
    },
    /// A connection ended.
    Disconnect {
        /// The transport's reference to the departed peer.
        peer: PeerRef,
        /// 32-bit reason code supplied by the remote side.
        data: u32,
    },
    /// Application data arrived on a channel.
    Receive {
        /// The transport's reference to the sending peer.
        peer: PeerRef,
        /// Channel the data arrived on.
        channel: u8,
        /// Owned copy of the payload.
        payload: Vec<u8>,
    },
}

/// Process-wide reference count for a transport library's global
/// init/teardown. Each `Transport` implementation owns exactly one,
/// exposed through [`Transport::runtime`].
#[derive(Debug)]
pub struct RuntimeState {
    counter: AtomicU32,
    transitions: Mutex<()>,
}

impl RuntimeState {
    /// A fresh state with no acquisitions.
    pub const fn new() -> Self {
        Self { counter: AtomicU32::new(0), transitions: Mutex::new(()) }
    }

    /// The shared acquisition counter.
    pub fn counter(&self) -> &AtomicU32 {
        &self.counter
    }

    /// Locks counter transitions together with the startup/teardown hook
    /// they trigger. Held across the whole transition, so a teardown can
    /// never still be running when a later acquisition completes.
    pub fn lock_transitions(&self) -> MutexGuard<'_, ()> {
        self.transitions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A black-box transport engine. One value is one live host.
///
/// Dropping a value releases all transport-side resources for that host;
/// teardown is best-effort and unconditional, it never reports errors.
pub trait Transport: Sized {
    /// The process-wide runtime state shared by every host of this
    /// transport type.
    fn runtime() -> &'static RuntimeState;

    /// One-time global initialization, run on the runtime counter's 0→1
    /// transition. Returns false on failure.
    fn startup() -> bool;

    /// One-time global teardown, run on the counter's 1→0 transition.
    fn shutdown();

    /// Allocates a host. `bind` present means server-capable: the host
    /// accepts incoming connections on that address.
    fn open(bind: Option<SocketAddr>, options: &HostOptions) -> Result<Self>;

    /// Begins an asynchronous connection to a remote host. The returned
    /// reference is valid immediately; completion is observed later as a
    /// `Connect` event.
    fn connect(&mut self, addr: SocketAddr, channel_count: u8, user_data: u32) -> Result<PeerRef>;

    /// Requests disconnection of a peer.
    fn disconnect(&mut self, peer: PeerRef, mode: DisconnectMode, data: u32) -> Result<()>;

    /// Enqueues a packet to a peer on a channel, returning the number of
    /// payload bytes queued. On `Err` the packet has been released
    /// (dropped); the transport keeps no reference to it.
    fn send(&mut self, peer: PeerRef, channel: u8, packet: OutboundPacket) -> Result<usize>;

    /// Performs one service step, waiting up to `timeout` for activity
    /// (zero = non-blocking poll). Returns at most one event, in the
    /// order the transport queued them.
    fn service(&mut self, timeout: Duration) -> Result<Option<TransportEvent>>;

    /// Forces buffered outgoing data to be sent without a service step.
    fn flush(&mut self);

    /// Installs (true) or removes (false) the built-in range-coder
    /// compressor.
    fn set_compression(&mut self, enabled: bool) -> Result<()>;

    /// Toggles per-packet checksums.
    fn set_checksum(&mut self, enabled: bool) -> Result<()>;

    /// Toggles the protocol-variant packet format for the client-facing
    /// (`server_role` false) or server-facing (`server_role` true) path.
    fn set_packet_format(&mut self, enabled: bool, server_role: bool) -> Result<()>;
}
