//! Opaque peer identities and the foreign-boundary codec.
//!
//! A `PeerHandle` is the externally-visible 64-bit identity of a peer. It
//! is minted by the host's peer registry as a monotonic id, never as a
//! reinterpreted address, so any nonzero `u64` round-trips losslessly and
//! zero is unrepresentable by construction.
//!
//! Identities crossing a foreign boundary arrive as a [`HandleValue`]:
//! wide (bigint-style) integers, or standard floating numerics kept only
//! for legacy callers. Decoding validates before anything reaches the
//! transport; a value that cannot round-trip through 64 unsigned bits is
//! rejected outright.

use std::{fmt, num::NonZeroU64};

use crate::error::{ErrorKind, Result};

/// Opaque, externally-visible identity of a peer.
///
/// Only handles obtained from `connect` or from a connect event are valid;
/// a handle is a capability into the host's peer registry, not an address.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerHandle(NonZeroU64);

impl PeerHandle {
    /// Wraps a raw 64-bit identity. Returns `None` for zero, which never
    /// names a peer.
    pub fn from_raw(value: u64) -> Option<Self> {
        NonZeroU64::new(value).map(Self)
    }

    /// Returns the raw 64-bit identity.
    pub fn to_raw(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for PeerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A peer identity as it arrives from a foreign boundary, before decoding.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum HandleValue {
    /// An arbitrary-precision integer, carried wide so lossless fit into
    /// 64 bits can be checked.
    Wide(u128),
    /// A standard floating numeric. Legacy only: precision is limited to
    /// 53 significant bits, so values above 2^53 may alias another peer.
    Numeric(f64),
}

/// Decodes a foreign-boundary identity into a `PeerHandle`.
///
/// `Wide` values must fit losslessly in 64 unsigned bits and be nonzero.
/// `Numeric` values are accepted only when `legacy_numeric` is set, and
/// must be finite, integral and in `[1, 2^64)`; the 53-bit aliasing hazard
/// above [`crate::constants::NUMERIC_HANDLE_EXACT_MAX`] is an accepted
/// legacy risk, not something this layer papers over.
///
/// Rejection happens here, before any transport interaction.
pub fn decode(value: HandleValue, legacy_numeric: bool) -> Result<PeerHandle> {
    match value {
        HandleValue::Wide(wide) => {
            if wide > u64::MAX as u128 {
                return Err(ErrorKind::InvalidPeer);
            }
            PeerHandle::from_raw(wide as u64).ok_or(ErrorKind::InvalidPeer)
        }
        HandleValue::Numeric(number) => {
            if !legacy_numeric {
                return Err(ErrorKind::InvalidPeer);
            }
            if !number.is_finite() || number.fract() != 0.0 {
                return Err(ErrorKind::InvalidPeer);
            }
            if number < 1.0 || number >= u64::MAX as f64 {
                return Err(ErrorKind::InvalidPeer);
            }
            PeerHandle::from_raw(number as u64).ok_or(ErrorKind::InvalidPeer)
        }
    }
}
