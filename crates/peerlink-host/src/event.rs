//! User-facing events produced by polling.

use peerlink_core::handle::PeerHandle;

/// A discrete notification drained from the host by one `service` call.
///
/// Each poll materializes at most one of these; `service` returns
/// `Ok(None)` when nothing was ready within the timeout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A connection completed or was accepted.
    Connect {
        /// Handle of the new peer; valid until a disconnect is observed.
        peer: PeerHandle,
    },
    /// A connection ended.
    Disconnect {
        /// Handle of the departed peer; no longer valid after this event.
        peer: PeerHandle,
        /// 32-bit reason code supplied by the remote side.
        data: u32,
    },
    /// Application data arrived.
    Receive {
        /// Handle of the sending peer.
        peer: PeerHandle,
        /// Channel the data arrived on.
        channel: u8,
        /// Caller-owned copy of the payload. The transport's internal
        /// packet was released before this event was returned.
        payload: Vec<u8>,
    },
}

impl Event {
    /// The peer this event concerns.
    pub fn peer(&self) -> PeerHandle {
        match self {
            Event::Connect { peer }
            | Event::Disconnect { peer, .. }
            | Event::Receive { peer, .. } => *peer,
        }
    }
}
