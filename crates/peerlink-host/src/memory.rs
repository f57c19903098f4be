//! In-process reference transport for tests and demos.
//!
//! Hosts live in a process-global hub whose lifetime is exactly the
//! runtime-guard lifetime: `startup` builds it, `shutdown` drops it. Every
//! host registers an event queue; `send` delivers synchronously into the
//! remote queue, so `service` is a plain (bounded-wait) channel read and
//! `flush` has nothing to do. There is no reliability machinery here - the
//! point is to exercise the bridge contract, not to be a protocol.

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{
        atomic::{AtomicU32, AtomicU64, Ordering},
        Mutex, PoisonError,
    },
    time::Duration,
};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use peerlink_core::{
    config::HostOptions,
    constants::MAX_PACKET_SIZE,
    error::{ErrorKind, Result},
    packet::OutboundPacket,
    transport::{DisconnectMode, PeerRef, RuntimeState, Transport, TransportEvent},
};
use tracing::trace;

/// Diagnostic code: the peer is gone or was never connected.
pub const REJECT_DEAD_PEER: i32 = -1;
/// Diagnostic code: the channel index is outside the negotiated count.
pub const REJECT_BAD_CHANNEL: i32 = -2;
/// Diagnostic code: the payload exceeds [`MAX_PACKET_SIZE`].
pub const REJECT_OVERSIZE: i32 = -3;

static HUB: Mutex<Option<Hub>> = Mutex::new(None);
static STARTUPS: AtomicU32 = AtomicU32::new(0);
static SHUTDOWNS: AtomicU32 = AtomicU32::new(0);
static DESTROYED_HOSTS: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Default)]
struct Hub {
    hosts: HashMap<u64, HostEntry>,
    peers: HashMap<u64, PeerEntry>,
    next_host: u64,
    next_peer: u64,
    next_ephemeral: u16,
}

#[derive(Debug)]
struct HostEntry {
    bind: Option<SocketAddr>,
    options: HostOptions,
    events: Sender<TransportEvent>,
    compression: bool,
    checksum: bool,
    packet_format_client: bool,
    packet_format_server: bool,
}

#[derive(Debug)]
struct PeerEntry {
    host: u64,
    /// The matching entry on the remote host, once the connection has a
    /// second side. A connect towards an address nobody is bound to stays
    /// pending forever, like a real handshake that never answers.
    twin: Option<u64>,
    channel_count: u8,
}

impl Hub {
    fn mint_host(&mut self) -> u64 {
        self.next_host += 1;
        self.next_host
    }

    fn mint_peer(&mut self) -> u64 {
        self.next_peer += 1;
        self.next_peer
    }

    /// Mints a port from the 49152..=65535 pool. The counter wraps, and
    /// candidates another host already claims (explicitly or ephemerally)
    /// are skipped; `None` when the whole pool is taken.
    fn ephemeral_port(&mut self) -> Option<u16> {
        for _ in 0..16384 {
            let port = 49152 + self.next_ephemeral % 16384;
            self.next_ephemeral = self.next_ephemeral.wrapping_add(1);
            if !self.port_in_use(port) {
                return Some(port);
            }
        }
        None
    }

    fn port_in_use(&self, port: u16) -> bool {
        self.hosts.values().any(|h| h.bind.is_some_and(|b| b.port() == port))
    }

    /// Finds the host reachable at `addr`: exact bind, or an unspecified
    /// bind on the same port.
    fn host_at(&self, addr: SocketAddr) -> Option<u64> {
        self.hosts.iter().find_map(|(id, entry)| {
            let bind = entry.bind?;
            let reachable =
                bind.port() == addr.port() && (bind.ip() == addr.ip() || bind.ip().is_unspecified());
            reachable.then_some(*id)
        })
    }

    fn peer_count_of(&self, host: u64) -> usize {
        self.peers.values().filter(|p| p.host == host).count()
    }
}

fn with_hub<R>(f: impl FnOnce(&mut Hub) -> Result<R>) -> Result<R> {
    let mut guard = HUB.lock().unwrap_or_else(PoisonError::into_inner);
    match guard.as_mut() {
        Some(hub) => f(hub),
        None => Err(ErrorKind::NotInitialized),
    }
}

fn peer_ref(id: u64) -> PeerRef {
    match PeerRef::new(id) {
        Some(peer) => peer,
        None => unreachable!("hub ids start at 1"),
    }
}

/// One in-process host. Created through the bridge like any transport;
/// dropping it releases its hub entry and strands its live connections.
#[derive(Debug)]
pub struct MemoryTransport {
    id: u64,
    events: Receiver<TransportEvent>,
}

impl Transport for MemoryTransport {
    fn runtime() -> &'static RuntimeState {
        static STATE: RuntimeState = RuntimeState::new();
        &STATE
    }

    fn startup() -> bool {
        let mut guard = HUB.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.is_none() {
            *guard = Some(Hub::default());
        }
        STARTUPS.fetch_add(1, Ordering::AcqRel);
        true
    }

    fn shutdown() {
        let mut guard = HUB.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
        SHUTDOWNS.fetch_add(1, Ordering::AcqRel);
    }

    fn open(bind: Option<SocketAddr>, options: &HostOptions) -> Result<Self> {
        with_hub(|hub| {
            let bind = match bind {
                Some(mut addr) => {
                    if addr.port() == 0 {
                        let port = hub.ephemeral_port().ok_or_else(|| {
                            ErrorKind::HostCreateFailed("ephemeral port pool exhausted".into())
                        })?;
                        addr.set_port(port);
                    } else if hub.host_at(addr).is_some() {
                        return Err(ErrorKind::HostCreateFailed(format!(
                            "address {addr} already in use"
                        )));
                    }
                    Some(addr)
                }
                None => None,
            };

            let (events, receiver) = unbounded();
            let id = hub.mint_host();
            hub.hosts.insert(
                id,
                HostEntry {
                    bind,
                    options: options.clone(),
                    events,
                    compression: false,
                    checksum: false,
                    packet_format_client: false,
                    packet_format_server: false,
                },
            );
            trace!(host = id, ?bind, "memory host opened");
            Ok(MemoryTransport { id, events: receiver })
        })
    }

    fn connect(&mut self, addr: SocketAddr, channel_count: u8, _user_data: u32) -> Result<PeerRef> {
        // User data would ride along in a real handshake; the bridge's
        // event shape does not surface it, so the hub drops it.
        with_hub(|hub| {
            let local_host = hub.hosts.get(&self.id).ok_or(ErrorKind::ConnectFailed)?;
            if hub.peer_count_of(self.id) >= local_host.options.peer_count {
                return Err(ErrorKind::ConnectFailed);
            }

            let channel_count = channel_count.max(1);
            let local = hub.mint_peer();

            let target = hub.host_at(addr).filter(|remote_id| {
                let remote = &hub.hosts[remote_id];
                hub.peer_count_of(*remote_id) < remote.options.peer_count
            });

            match target {
                Some(remote_id) => {
                    let negotiated = channel_count.min(hub.hosts[&remote_id].options.channel_limit);
                    let remote = hub.mint_peer();
                    hub.peers.insert(
                        local,
                        PeerEntry { host: self.id, twin: Some(remote), channel_count: negotiated },
                    );
                    hub.peers.insert(
                        remote,
                        PeerEntry { host: remote_id, twin: Some(local), channel_count: negotiated },
                    );
                    // Completion on both sides is observed by polling.
                    let _ = hub.hosts[&remote_id]
                        .events
                        .send(TransportEvent::Connect { peer: peer_ref(remote) });
                    let _ = hub.hosts[&self.id]
                        .events
                        .send(TransportEvent::Connect { peer: peer_ref(local) });
                }
                None => {
                    // Nobody answering: the attempt stays pending.
                    hub.peers.insert(
                        local,
                        PeerEntry { host: self.id, twin: None, channel_count },
                    );
                }
            }

            Ok(peer_ref(local))
        })
    }

    fn disconnect(&mut self, peer: PeerRef, mode: DisconnectMode, data: u32) -> Result<()> {
        with_hub(|hub| {
            let Some(entry) = hub.peers.remove(&peer.get()) else {
                // Already gone; disconnects are best-effort.
                return Ok(());
            };
            if let Some(twin_id) = entry.twin {
                if let Some(twin_entry) = hub.peers.remove(&twin_id) {
                    if let Some(remote) = hub.hosts.get(&twin_entry.host) {
                        let _ = remote
                            .events
                            .send(TransportEvent::Disconnect { peer: peer_ref(twin_id), data });
                    }
                }
            }

            // Immediate teardown produces no local event; the other modes
            // report back through a later service call.
            if !matches!(mode, DisconnectMode::Immediate) {
                if let Some(local) = hub.hosts.get(&entry.host) {
                    let _ = local.events.send(TransportEvent::Disconnect { peer, data });
                }
            }
            Ok(())
        })
    }

    fn send(&mut self, peer: PeerRef, channel: u8, packet: OutboundPacket) -> Result<usize> {
        with_hub(|hub| {
            let Some(entry) = hub.peers.get(&peer.get()) else {
                return Err(ErrorKind::SendRejected { code: REJECT_DEAD_PEER });
            };
            if channel >= entry.channel_count {
                return Err(ErrorKind::SendRejected { code: REJECT_BAD_CHANNEL });
            }
            if packet.payload().len() > MAX_PACKET_SIZE {
                return Err(ErrorKind::SendRejected { code: REJECT_OVERSIZE });
            }

            let twin = entry
                .twin
                .and_then(|id| hub.peers.get(&id).map(|twin| (id, twin.host)))
                .ok_or(ErrorKind::SendRejected { code: REJECT_DEAD_PEER })?;
            let remote = hub
                .hosts
                .get(&twin.1)
                .ok_or(ErrorKind::SendRejected { code: REJECT_DEAD_PEER })?;

            let payload = packet.into_payload();
            let queued = payload.len();
            let _ = remote.events.send(TransportEvent::Receive {
                peer: peer_ref(twin.0),
                channel,
                payload,
            });
            Ok(queued)
        })
    }

    fn service(&mut self, timeout: Duration) -> Result<Option<TransportEvent>> {
        if timeout.is_zero() {
            match self.events.try_recv() {
                Ok(event) => Ok(Some(event)),
                Err(TryRecvError::Empty) => Ok(None),
                Err(TryRecvError::Disconnected) => Err(ErrorKind::ServiceFailed),
            }
        } else {
            match self.events.recv_timeout(timeout) {
                Ok(event) => Ok(Some(event)),
                Err(RecvTimeoutError::Timeout) => Ok(None),
                Err(RecvTimeoutError::Disconnected) => Err(ErrorKind::ServiceFailed),
            }
        }
    }

    fn flush(&mut self) {
        // Delivery already happened inside `send`.
    }

    fn set_compression(&mut self, enabled: bool) -> Result<()> {
        self.set_option(|host| host.compression = enabled)
    }

    fn set_checksum(&mut self, enabled: bool) -> Result<()> {
        self.set_option(|host| host.checksum = enabled)
    }

    fn set_packet_format(&mut self, enabled: bool, server_role: bool) -> Result<()> {
        self.set_option(|host| {
            if server_role {
                host.packet_format_server = enabled;
            } else {
                host.packet_format_client = enabled;
            }
        })
    }
}

impl MemoryTransport {
    fn set_option(&mut self, apply: impl FnOnce(&mut HostEntry)) -> Result<()> {
        with_hub(|hub| {
            if let Some(host) = hub.hosts.get_mut(&self.id) {
                apply(host);
            }
            Ok(())
        })
    }
}

impl Drop for MemoryTransport {
    fn drop(&mut self) {
        let mut guard = HUB.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(hub) = guard.as_mut() {
            hub.hosts.remove(&self.id);
            // Strand connections into this host; remotes discover the loss
            // on their next send.
            let orphaned: Vec<u64> =
                hub.peers.iter().filter(|(_, p)| p.host == self.id).map(|(id, _)| *id).collect();
            for id in orphaned {
                if let Some(entry) = hub.peers.remove(&id) {
                    if let Some(twin) = entry.twin.and_then(|t| hub.peers.get_mut(&t)) {
                        twin.twin = None;
                    }
                }
            }
        }
        DESTROYED_HOSTS.fetch_add(1, Ordering::AcqRel);
    }
}

/// Point-in-time counters for the hub. Test instrumentation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HubStats {
    /// Times the global runtime has been started.
    pub startups: u32,
    /// Times the global runtime has been torn down.
    pub shutdowns: u32,
    /// Hosts currently registered.
    pub live_hosts: usize,
    /// Hosts destroyed since process start.
    pub destroyed_hosts: u64,
    /// Peer entries currently tracked (pending connections included).
    pub live_peers: usize,
}

/// Snapshots the hub counters.
pub fn hub_stats() -> HubStats {
    let guard = HUB.lock().unwrap_or_else(PoisonError::into_inner);
    let (live_hosts, live_peers) = match guard.as_ref() {
        Some(hub) => (hub.hosts.len(), hub.peers.len()),
        None => (0, 0),
    };
    HubStats {
        startups: STARTUPS.load(Ordering::Acquire),
        shutdowns: SHUTDOWNS.load(Ordering::Acquire),
        live_hosts,
        destroyed_hosts: DESTROYED_HOSTS.load(Ordering::Acquire),
        live_peers,
    }
}

/// Per-host option toggles as last applied. Test instrumentation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OptionState {
    /// Range-coder compressor installed.
    pub compression: bool,
    /// Per-packet checksums enabled.
    pub checksum: bool,
    /// Protocol-variant format on the client-facing path.
    pub packet_format_client: bool,
    /// Protocol-variant format on the server-facing path.
    pub packet_format_server: bool,
}

/// Snapshots the option toggles of every live host, in no particular
/// order.
pub fn option_states() -> Vec<OptionState> {
    let guard = HUB.lock().unwrap_or_else(PoisonError::into_inner);
    match guard.as_ref() {
        Some(hub) => hub
            .hosts
            .values()
            .map(|host| OptionState {
                compression: host.compression,
                checksum: host.checksum,
                packet_format_client: host.packet_format_client,
                packet_format_server: host.packet_format_server,
            })
            .collect(),
        None => Vec::new(),
    }
}
