//! Registry mapping external peer handles to transport references.
//!
//! Handles are monotonic ids starting at 1, so an external identity never
//! encodes a transport address and zero never names a peer. Entries are
//! added when a connection is initiated or first observed, and removed by
//! the cleanup hook when the transport reports the peer gone.

use std::collections::HashMap;

use peerlink_core::{handle::PeerHandle, transport::PeerRef};

/// Bidirectional handle/reference map for one host's peers.
#[derive(Debug, Default)]
pub struct PeerRegistry {
    by_handle: HashMap<PeerHandle, PeerRef>,
    by_ref: HashMap<PeerRef, PeerHandle>,
    next_id: u64,
}

impl PeerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self { by_handle: HashMap::new(), by_ref: HashMap::new(), next_id: 1 }
    }

    /// Returns the handle for a transport reference, minting one if this
    /// peer has not been seen before (e.g. an incoming connection).
    pub fn intern(&mut self, peer: PeerRef) -> PeerHandle {
        if let Some(handle) = self.by_ref.get(&peer) {
            return *handle;
        }
        let handle = PeerHandle::from_raw(self.next_id)
            .unwrap_or_else(|| unreachable!("ids start at 1"));
        self.next_id += 1;
        self.by_handle.insert(handle, peer);
        self.by_ref.insert(peer, handle);
        handle
    }

    /// Resolves a handle to the transport's reference, if the peer is
    /// still live.
    pub fn resolve(&self, handle: PeerHandle) -> Option<PeerRef> {
        self.by_handle.get(&handle).copied()
    }

    /// Removes a peer by handle. Returns the reference if it was present.
    pub fn remove(&mut self, handle: PeerHandle) -> Option<PeerRef> {
        let peer = self.by_handle.remove(&handle)?;
        self.by_ref.remove(&peer);
        Some(peer)
    }

    /// Removes a peer by transport reference, returning its handle.
    /// Cleanup hook for transport-reported departures.
    pub fn remove_ref(&mut self, peer: PeerRef) -> Option<PeerHandle> {
        let handle = self.by_ref.remove(&peer)?;
        self.by_handle.remove(&handle);
        Some(handle)
    }

    /// Drops every entry. Used when the owning host goes away: all of its
    /// handles are dead.
    pub fn clear(&mut self) {
        self.by_handle.clear();
        self.by_ref.clear();
    }

    /// Number of live peers.
    pub fn len(&self) -> usize {
        self.by_handle.len()
    }

    /// Whether the registry holds no peers.
    pub fn is_empty(&self) -> bool {
        self.by_handle.is_empty()
    }
}
