use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    str::FromStr,
    time::Duration,
};

use peerlink_core::{
    config::{BindConfig, HostOptions},
    error::{ErrorKind, Result},
    handle::{self, HandleValue, PeerHandle},
    packet::{OutboundPacket, PacketFlags, SendData},
    transport::{DisconnectMode, Transport, TransportEvent},
};
use tracing::{debug, error};

use crate::{event::Event, registry::PeerRegistry, runtime::RuntimeGuard};

/// Host-centric bridge to a black-box transport.
///
/// A `Bridge` owns zero-or-one transport host, holds one process-wide
/// runtime acquisition for its lifetime, and exposes the polled event loop
/// plus packet sending. All operations are non-blocking except `service`,
/// which waits at most its explicit timeout; a multi-threaded caller must
/// externally serialize access to one bridge.
#[derive(Debug)]
pub struct Bridge<T: Transport> {
    host: Option<T>,
    peers: PeerRegistry,
    guard: RuntimeGuard<T>,
    legacy_numeric_handles: bool,
}

impl<T: Transport> Bridge<T> {
    /// A bridge holding nothing: no runtime acquisition, no host.
    pub fn new() -> Self {
        Self {
            host: None,
            peers: PeerRegistry::new(),
            guard: RuntimeGuard::new(),
            legacy_numeric_handles: false,
        }
    }

    /// Enables or disables acceptance of legacy floating-numeric peer
    /// identities in [`Bridge::decode_handle`]. Off by default; see
    /// [`handle::decode`] for the 53-bit aliasing hazard this opts into.
    pub fn set_legacy_numeric_handles(&mut self, enabled: bool) {
        self.legacy_numeric_handles = enabled;
    }

    /// Acquires the transport runtime. Idempotent; the first acquisition
    /// process-wide runs the transport's one-time startup.
    pub fn initialize(&mut self) -> Result<()> {
        self.guard.acquire()
    }

    /// Destroys any live host, then releases the runtime acquisition.
    /// The ordering is load-bearing: the host must not outlive the
    /// runtime it was created under.
    pub fn deinitialize(&mut self) {
        self.destroy_host();
        self.guard.release();
    }

    /// Whether this bridge currently holds a runtime acquisition.
    pub fn is_initialized(&self) -> bool {
        self.guard.is_held()
    }

    /// Whether a host currently exists on this bridge.
    pub fn has_host(&self) -> bool {
        self.host.is_some()
    }

    /// Number of peers currently tracked by the handle registry.
    pub fn tracked_peers(&self) -> usize {
        self.peers.len()
    }

    /// Creates the transport host, replacing any existing one.
    ///
    /// A `bind` config makes the host server-capable; `None` creates a
    /// connect-only host. An existing host is destroyed first - silent
    /// replacement, not an error - and its peer handles become invalid.
    pub fn create_host(&mut self, bind: Option<BindConfig>, options: HostOptions) -> Result<()> {
        if !self.guard.is_held() {
            return Err(ErrorKind::NotInitialized);
        }

        if self.host.is_some() {
            debug!("replacing existing host");
            self.destroy_host();
        }

        let bind = match bind {
            Some(config) => Some(resolve_bind(&config)?),
            None => None,
        };

        self.host = Some(T::open(bind, &options)?);
        Ok(())
    }

    /// Destroys the host, if any. Idempotent; releases all transport-side
    /// resources and invalidates every peer handle. The runtime
    /// acquisition is left alone.
    pub fn destroy_host(&mut self) {
        self.host = None;
        self.peers.clear();
    }

    /// Performs one service step, waiting up to `timeout` for activity
    /// (zero = non-blocking poll).
    ///
    /// Returns at most one event per call, in the order the transport
    /// queued them, or `Ok(None)` when nothing was ready. Receive payloads
    /// are caller-owned; the transport's internal packet is released
    /// before this returns.
    pub fn service(&mut self, timeout: Duration) -> Result<Option<Event>> {
        let host = self.host.as_mut().ok_or(ErrorKind::NoHost)?;
        let event = match host.service(timeout) {
            Ok(event) => event,
            Err(err) => {
                error!("transport service failed: {err}");
                return Err(err);
            }
        };

        Ok(event.map(|event| match event {
            TransportEvent::Connect { peer } => Event::Connect { peer: self.peers.intern(peer) },
            TransportEvent::Disconnect { peer, data } => {
                let handle = match self.peers.remove_ref(peer) {
                    Some(handle) => handle,
                    None => {
                        // Peer was never surfaced to the caller; mint a
                        // handle so the reason code still reaches them.
                        let handle = self.peers.intern(peer);
                        self.peers.remove_ref(peer);
                        handle
                    }
                };
                Event::Disconnect { peer: handle, data }
            }
            TransportEvent::Receive { peer, channel, payload } => {
                Event::Receive { peer: self.peers.intern(peer), channel, payload }
            }
        }))
    }

    /// Forces buffered outgoing data to be sent without a service step.
    pub fn flush(&mut self) -> Result<()> {
        let host = self.host.as_mut().ok_or(ErrorKind::NoHost)?;
        host.flush();
        Ok(())
    }

    /// Begins an asynchronous connection to `address:port`.
    ///
    /// The returned handle is valid immediately; completion is observed
    /// later as [`Event::Connect`]. `address` must be a literal IP.
    pub fn connect(
        &mut self,
        address: &str,
        port: u16,
        channel_count: u8,
        user_data: u32,
    ) -> Result<PeerHandle> {
        let host = self.host.as_mut().ok_or(ErrorKind::NoHost)?;
        let ip = resolve_ip(address)?;
        let peer = host.connect(SocketAddr::new(ip, port), channel_count, user_data)?;
        Ok(self.peers.intern(peer))
    }

    /// Requests a graceful disconnection; the matching
    /// [`Event::Disconnect`] arrives from a later `service` call.
    pub fn disconnect(&mut self, peer: PeerHandle, data: u32) -> Result<()> {
        self.disconnect_with(peer, DisconnectMode::Graceful, data)
    }

    /// Tears the connection down synchronously. No later disconnect event
    /// is produced for it, and the handle is invalid once this returns.
    pub fn disconnect_now(&mut self, peer: PeerHandle, data: u32) -> Result<()> {
        self.disconnect_with(peer, DisconnectMode::Immediate, data)?;
        self.peers.remove(peer);
        Ok(())
    }

    /// Requests disconnection once all queued outgoing data has been
    /// delivered.
    pub fn disconnect_later(&mut self, peer: PeerHandle, data: u32) -> Result<()> {
        self.disconnect_with(peer, DisconnectMode::Deferred, data)
    }

    fn disconnect_with(&mut self, peer: PeerHandle, mode: DisconnectMode, data: u32) -> Result<()> {
        let host = self.host.as_mut().ok_or(ErrorKind::NoHost)?;
        let peer = self.peers.resolve(peer).ok_or(ErrorKind::InvalidPeer)?;
        host.disconnect(peer, mode, data)
    }

    /// Sends `data` to a peer on a channel, reliable by default.
    ///
    /// Accepts `Bytes` and `Text` payloads. The payload is copied into
    /// independently allocated storage - the caller's buffer may be freed
    /// or mutated immediately - and the no-copy flag is masked off before
    /// the packet reaches the transport. Returns the non-negative byte
    /// count queued; a transport refusal surfaces as
    /// [`ErrorKind::SendRejected`] after the packet has been released.
    pub fn send(
        &mut self,
        peer: PeerHandle,
        channel: u8,
        data: SendData<'_>,
        flags: PacketFlags,
    ) -> Result<usize> {
        let host = self.host.as_mut().ok_or(ErrorKind::NoHost)?;
        let peer = self.peers.resolve(peer).ok_or(ErrorKind::InvalidPeer)?;
        let packet = OutboundPacket::from_data(data, flags)?;
        submit(host, peer, channel, packet)
    }

    /// Sends a raw payload: `Bytes`, `Typed` numeric arrays and `Region`
    /// views, without a copy-then-retype step on the caller's side. The
    /// same copy and flag guarantees as [`Bridge::send`] apply.
    pub fn send_raw(
        &mut self,
        peer: PeerHandle,
        channel: u8,
        data: SendData<'_>,
        flags: PacketFlags,
    ) -> Result<usize> {
        let host = self.host.as_mut().ok_or(ErrorKind::NoHost)?;
        let peer = self.peers.resolve(peer).ok_or(ErrorKind::InvalidPeer)?;
        let packet = OutboundPacket::from_raw(data, flags)?;
        submit(host, peer, channel, packet)
    }

    /// Decodes a foreign-boundary peer identity using this bridge's
    /// legacy-numeric policy. Decoding alone does not prove the peer is
    /// live; every operation re-validates against the registry.
    pub fn decode_handle(&self, value: HandleValue) -> Result<PeerHandle> {
        handle::decode(value, self.legacy_numeric_handles)
    }

    /// Installs (true) or removes (false) the transport's built-in
    /// range-coder compressor.
    pub fn set_compression(&mut self, enabled: bool) -> Result<()> {
        let host = self.host.as_mut().ok_or(ErrorKind::NoHost)?;
        host.set_compression(enabled)
    }

    /// Toggles per-packet checksums on the live host.
    pub fn set_checksum(&mut self, enabled: bool) -> Result<()> {
        let host = self.host.as_mut().ok_or(ErrorKind::NoHost)?;
        host.set_checksum(enabled)
    }

    /// Toggles the protocol-variant packet format, independently for the
    /// client-facing (`server_role` false) and server-facing paths.
    pub fn set_packet_format(&mut self, enabled: bool, server_role: bool) -> Result<()> {
        let host = self.host.as_mut().ok_or(ErrorKind::NoHost)?;
        host.set_packet_format(enabled, server_role)
    }
}

fn submit<T: Transport>(
    host: &mut T,
    peer: peerlink_core::transport::PeerRef,
    channel: u8,
    packet: OutboundPacket,
) -> Result<usize> {
    match host.send(peer, channel, packet) {
        Ok(queued) => Ok(queued),
        Err(err) => {
            // The packet was moved into the failed call and dropped there;
            // nothing to release on this side.
            error!("transport rejected packet: {err}");
            Err(err)
        }
    }
}

fn resolve_ip(address: &str) -> Result<IpAddr> {
    // Literal IPs only; names are not resolved here.
    IpAddr::from_str(address).map_err(|_| ErrorKind::InvalidAddress(address.to_owned()))
}

fn resolve_bind(config: &BindConfig) -> Result<SocketAddr> {
    let ip = match &config.address {
        Some(address) => resolve_ip(address)?,
        None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
    };
    Ok(SocketAddr::new(ip, config.port.unwrap_or(0)))
}

impl<T: Transport> Default for Bridge<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> Drop for Bridge<T> {
    fn drop(&mut self) {
        // Host before guard: destroying after runtime teardown would be a
        // use-after-teardown at the transport layer.
        self.destroy_host();
        self.guard.release();
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, collections::VecDeque};

    use peerlink_core::{
        packet::TypedSlice,
        transport::{PeerRef, RuntimeState},
    };

    use super::*;

    /// What the scripted transport should produce from its next
    /// `service` call.
    enum ScriptStep {
        Event(TransportEvent),
        Empty,
        Fail,
    }

    #[derive(Default)]
    struct Probe {
        fail_open: bool,
        fail_send: bool,
        opened: Vec<Option<SocketAddr>>,
        destroyed: u32,
        next_ref: u64,
        connects: Vec<(SocketAddr, u8, u32)>,
        disconnects: Vec<(u64, DisconnectMode, u32)>,
        sent: Vec<(u64, u8, Vec<u8>, u32)>,
        toggles: Vec<(&'static str, bool)>,
        script: VecDeque<ScriptStep>,
    }

    thread_local! {
        // One probe per test thread; resets are explicit via `probe_reset`.
        static PROBE: RefCell<Probe> = RefCell::new(Probe::default());
    }

    fn probe_reset() {
        PROBE.with(|p| *p.borrow_mut() = Probe::default());
    }

    fn with_probe<R>(f: impl FnOnce(&mut Probe) -> R) -> R {
        PROBE.with(|p| f(&mut p.borrow_mut()))
    }

    struct ScriptedTransport;

    impl Transport for ScriptedTransport {
        fn runtime() -> &'static RuntimeState {
            static STATE: RuntimeState = RuntimeState::new();
            &STATE
        }
        fn startup() -> bool {
            true
        }
        fn shutdown() {}
        fn open(bind: Option<SocketAddr>, _options: &HostOptions) -> Result<Self> {
            with_probe(|p| {
                if p.fail_open {
                    return Err(ErrorKind::HostCreateFailed("scripted refusal".into()));
                }
                p.opened.push(bind);
                Ok(ScriptedTransport)
            })
        }
        fn connect(&mut self, addr: SocketAddr, channels: u8, user_data: u32) -> Result<PeerRef> {
            with_probe(|p| {
                p.next_ref += 1;
                p.connects.push((addr, channels, user_data));
                Ok(PeerRef::new(p.next_ref).unwrap())
            })
        }
        fn disconnect(&mut self, peer: PeerRef, mode: DisconnectMode, data: u32) -> Result<()> {
            with_probe(|p| {
                p.disconnects.push((peer.get(), mode, data));
                Ok(())
            })
        }
        fn send(&mut self, peer: PeerRef, channel: u8, packet: OutboundPacket) -> Result<usize> {
            with_probe(|p| {
                if p.fail_send {
                    return Err(ErrorKind::SendRejected { code: -1 });
                }
                let len = packet.payload().len();
                let flags = packet.flags().bits();
                p.sent.push((peer.get(), channel, packet.into_payload(), flags));
                Ok(len)
            })
        }
        fn service(&mut self, _timeout: Duration) -> Result<Option<TransportEvent>> {
            with_probe(|p| match p.script.pop_front() {
                Some(ScriptStep::Event(event)) => Ok(Some(event)),
                Some(ScriptStep::Empty) | None => Ok(None),
                Some(ScriptStep::Fail) => Err(ErrorKind::ServiceFailed),
            })
        }
        fn flush(&mut self) {}
        fn set_compression(&mut self, enabled: bool) -> Result<()> {
            with_probe(|p| {
                p.toggles.push(("compression", enabled));
                Ok(())
            })
        }
        fn set_checksum(&mut self, enabled: bool) -> Result<()> {
            with_probe(|p| {
                p.toggles.push(("checksum", enabled));
                Ok(())
            })
        }
        fn set_packet_format(&mut self, enabled: bool, server_role: bool) -> Result<()> {
            with_probe(|p| {
                p.toggles.push((if server_role { "format-server" } else { "format-client" }, enabled));
                Ok(())
            })
        }
    }

    impl Drop for ScriptedTransport {
        fn drop(&mut self) {
            // PROBE may already be gone during thread teardown.
            let _ = PROBE.try_with(|p| p.borrow_mut().destroyed += 1);
        }
    }

    fn ready_bridge() -> Bridge<ScriptedTransport> {
        probe_reset();
        let mut bridge = Bridge::new();
        bridge.initialize().unwrap();
        bridge.create_host(None, HostOptions::default()).unwrap();
        bridge
    }

    #[test]
    fn create_host_requires_initialization() {
        probe_reset();
        let mut bridge = Bridge::<ScriptedTransport>::new();
        assert!(matches!(
            bridge.create_host(None, HostOptions::default()),
            Err(ErrorKind::NotInitialized)
        ));
        assert!(!bridge.has_host());
    }

    #[test]
    fn create_host_silently_replaces_existing() {
        let mut bridge = ready_bridge();
        bridge.create_host(None, HostOptions::default()).unwrap();
        assert!(bridge.has_host());
        assert_eq!(with_probe(|p| p.destroyed), 1);
        assert_eq!(with_probe(|p| p.opened.len()), 2);
    }

    #[test]
    fn create_host_failure_leaves_no_host() {
        probe_reset();
        let mut bridge = Bridge::<ScriptedTransport>::new();
        bridge.initialize().unwrap();
        with_probe(|p| p.fail_open = true);
        assert!(matches!(
            bridge.create_host(None, HostOptions::default()),
            Err(ErrorKind::HostCreateFailed(_))
        ));
        assert!(!bridge.has_host());
    }

    #[test]
    fn bind_config_defaults() {
        probe_reset();
        let mut bridge = Bridge::<ScriptedTransport>::new();
        bridge.initialize().unwrap();

        // Port without address binds all interfaces.
        bridge.create_host(Some(BindConfig::port(7777)), HostOptions::default()).unwrap();
        // Address without port keeps the default port.
        bridge
            .create_host(
                Some(BindConfig { address: Some("127.0.0.1".into()), port: None }),
                HostOptions::default(),
            )
            .unwrap();

        let opened = with_probe(|p| p.opened.clone());
        assert_eq!(opened[0], Some("0.0.0.0:7777".parse().unwrap()));
        assert_eq!(opened[1], Some("127.0.0.1:0".parse().unwrap()));
    }

    #[test]
    fn bad_bind_address_is_rejected() {
        probe_reset();
        let mut bridge = Bridge::<ScriptedTransport>::new();
        bridge.initialize().unwrap();
        let result = bridge.create_host(
            Some(BindConfig::new("not-an-ip", 7777)),
            HostOptions::default(),
        );
        assert!(matches!(result, Err(ErrorKind::InvalidAddress(_))));
        assert_eq!(with_probe(|p| p.opened.len()), 0);
    }

    #[test]
    fn destroy_host_is_idempotent() {
        let mut bridge = ready_bridge();
        bridge.destroy_host();
        bridge.destroy_host();
        assert_eq!(with_probe(|p| p.destroyed), 1);
        assert!(matches!(bridge.service(Duration::ZERO), Err(ErrorKind::NoHost)));
        assert!(matches!(bridge.flush(), Err(ErrorKind::NoHost)));
    }

    #[test]
    fn service_with_empty_queue_returns_none() {
        let mut bridge = ready_bridge();
        assert_eq!(bridge.service(Duration::ZERO).unwrap(), None);
    }

    #[test]
    fn service_surfaces_transport_errors() {
        let mut bridge = ready_bridge();
        with_probe(|p| p.script.push_back(ScriptStep::Fail));
        assert!(matches!(bridge.service(Duration::ZERO), Err(ErrorKind::ServiceFailed)));
    }

    #[test]
    fn service_materializes_one_event_per_call() {
        let mut bridge = ready_bridge();
        let remote = PeerRef::new(42).unwrap();
        with_probe(|p| {
            p.script.push_back(ScriptStep::Event(TransportEvent::Connect { peer: remote }));
            p.script.push_back(ScriptStep::Event(TransportEvent::Receive {
                peer: remote,
                channel: 3,
                payload: b"hello".to_vec(),
            }));
            p.script.push_back(ScriptStep::Empty);
        });

        let connect = bridge.service(Duration::ZERO).unwrap().unwrap();
        let Event::Connect { peer } = connect else {
            panic!("expected connect, got {connect:?}");
        };
        assert_ne!(peer.to_raw(), 0);

        let receive = bridge.service(Duration::ZERO).unwrap().unwrap();
        assert_eq!(receive, Event::Receive { peer, channel: 3, payload: b"hello".to_vec() });

        assert_eq!(bridge.service(Duration::ZERO).unwrap(), None);
    }

    #[test]
    fn disconnect_event_invalidates_the_handle() {
        let mut bridge = ready_bridge();
        let remote = PeerRef::new(9).unwrap();
        with_probe(|p| {
            p.script.push_back(ScriptStep::Event(TransportEvent::Connect { peer: remote }));
            p.script.push_back(ScriptStep::Event(TransportEvent::Disconnect {
                peer: remote,
                data: 77,
            }));
        });

        let peer = bridge.service(Duration::ZERO).unwrap().unwrap().peer();
        let event = bridge.service(Duration::ZERO).unwrap().unwrap();
        assert_eq!(event, Event::Disconnect { peer, data: 77 });

        assert!(matches!(
            bridge.send(peer, 0, SendData::Text("late"), PacketFlags::default()),
            Err(ErrorKind::InvalidPeer)
        ));
        assert_eq!(bridge.tracked_peers(), 0);
    }

    #[test]
    fn connect_returns_a_handle_before_any_service_call() {
        let mut bridge = ready_bridge();
        let peer = bridge.connect("127.0.0.1", 7777, 2, 0).unwrap();
        assert_ne!(peer.to_raw(), 0);
        // The transport already recorded the pending connection.
        assert_eq!(
            with_probe(|p| p.connects.clone()),
            vec![("127.0.0.1:7777".parse().unwrap(), 2, 0)]
        );
    }

    #[test]
    fn connect_rejects_unparsable_addresses() {
        let mut bridge = ready_bridge();
        assert!(matches!(
            bridge.connect("example.invalid", 7777, 2, 0),
            Err(ErrorKind::InvalidAddress(_))
        ));
        assert!(with_probe(|p| p.connects.is_empty()));
    }

    #[test]
    fn send_masks_the_no_copy_flag() {
        let mut bridge = ready_bridge();
        let peer = bridge.connect("127.0.0.1", 7777, 2, 0).unwrap();

        let flags = PacketFlags::RELIABLE | PacketFlags::NO_COPY;
        let queued = bridge.send(peer, 0, SendData::Bytes(b"abc"), flags).unwrap();
        assert_eq!(queued, 3);

        // ScriptedTransport::send records the flag word it was handed;
        // the zero-copy bit must be gone by then.
        let sent = with_probe(|p| p.sent.clone());
        assert_eq!(sent.len(), 1);
        let delivered = PacketFlags::from_bits(sent[0].3);
        assert!(!delivered.contains(PacketFlags::NO_COPY));
        assert!(delivered.contains(PacketFlags::RELIABLE));
    }

    #[test]
    fn send_and_send_raw_enforce_payload_kinds() {
        let mut bridge = ready_bridge();
        let peer = bridge.connect("127.0.0.1", 7777, 2, 0).unwrap();
        let flags = PacketFlags::default();

        assert!(matches!(
            bridge.send(peer, 0, SendData::Typed(TypedSlice::U32(&[1])), flags),
            Err(ErrorKind::UnsupportedInput)
        ));
        assert!(matches!(
            bridge.send_raw(peer, 0, SendData::Text("nope"), flags),
            Err(ErrorKind::UnsupportedInput)
        ));

        bridge.send(peer, 0, SendData::Text("ok"), flags).unwrap();
        bridge.send_raw(peer, 1, SendData::Typed(TypedSlice::U16(&[0x0102])), flags).unwrap();

        let sent = with_probe(|p| p.sent.clone());
        assert_eq!(sent[0].2, b"ok".to_vec());
        assert_eq!(sent[1].1, 1);
        assert_eq!(sent[1].2, vec![0x02, 0x01]);
    }

    #[test]
    fn rejected_send_surfaces_the_diagnostic() {
        let mut bridge = ready_bridge();
        let peer = bridge.connect("127.0.0.1", 7777, 2, 0).unwrap();
        with_probe(|p| p.fail_send = true);
        assert!(matches!(
            bridge.send(peer, 0, SendData::Bytes(b"x"), PacketFlags::default()),
            Err(ErrorKind::SendRejected { code: -1 })
        ));
    }

    #[test]
    fn send_to_unknown_handle_is_invalid_peer() {
        let mut bridge = ready_bridge();
        let bogus = PeerHandle::from_raw(12345).unwrap();
        assert!(matches!(
            bridge.send(bogus, 0, SendData::Bytes(b"x"), PacketFlags::default()),
            Err(ErrorKind::InvalidPeer)
        ));
        assert!(with_probe(|p| p.sent.is_empty()));
    }

    #[test]
    fn disconnect_now_completes_synchronously() {
        let mut bridge = ready_bridge();
        let peer = bridge.connect("127.0.0.1", 7777, 2, 0).unwrap();

        bridge.disconnect_now(peer, 5).unwrap();
        assert_eq!(
            with_probe(|p| p.disconnects.clone()),
            vec![(1, DisconnectMode::Immediate, 5)]
        );

        // The handle died with the call; no disconnect event will follow.
        assert!(matches!(bridge.disconnect(peer, 0), Err(ErrorKind::InvalidPeer)));

        // Immediate teardown then host destruction must be clean.
        bridge.destroy_host();
    }

    #[test]
    fn graceful_and_deferred_disconnects_keep_the_handle() {
        let mut bridge = ready_bridge();
        let peer = bridge.connect("127.0.0.1", 7777, 2, 0).unwrap();

        bridge.disconnect(peer, 1).unwrap();
        bridge.disconnect_later(peer, 2).unwrap();
        assert_eq!(
            with_probe(|p| p.disconnects.clone()),
            vec![(1, DisconnectMode::Graceful, 1), (1, DisconnectMode::Deferred, 2)]
        );
        // Still resolvable until the transport reports the departure.
        assert_eq!(bridge.tracked_peers(), 1);
    }

    #[test]
    fn deinitialize_destroys_the_host_first() {
        let mut bridge = ready_bridge();
        bridge.deinitialize();
        assert_eq!(with_probe(|p| p.destroyed), 1);
        assert!(!bridge.has_host());
        assert!(!bridge.is_initialized());
    }

    #[test]
    fn option_controls_require_a_host() {
        probe_reset();
        let mut bridge = Bridge::<ScriptedTransport>::new();
        bridge.initialize().unwrap();
        assert!(matches!(bridge.set_compression(true), Err(ErrorKind::NoHost)));
        assert!(matches!(bridge.set_checksum(true), Err(ErrorKind::NoHost)));
        assert!(matches!(bridge.set_packet_format(true, false), Err(ErrorKind::NoHost)));
    }

    #[test]
    fn option_controls_reach_the_transport() {
        let mut bridge = ready_bridge();
        bridge.set_compression(true).unwrap();
        bridge.set_checksum(false).unwrap();
        bridge.set_packet_format(true, true).unwrap();
        bridge.set_packet_format(false, false).unwrap();
        assert_eq!(
            with_probe(|p| p.toggles.clone()),
            vec![
                ("compression", true),
                ("checksum", false),
                ("format-server", true),
                ("format-client", false),
            ]
        );
    }

    #[test]
    fn decode_handle_gates_legacy_numerics() {
        let mut bridge = ready_bridge();
        assert!(bridge.decode_handle(HandleValue::Numeric(7.0)).is_err());
        bridge.set_legacy_numeric_handles(true);
        let handle = bridge.decode_handle(HandleValue::Numeric(7.0)).unwrap();
        assert_eq!(handle.to_raw(), 7);
        // Wide values are accepted regardless of the legacy mode.
        assert!(bridge.decode_handle(HandleValue::Wide(7)).is_ok());
    }
}
