//! Error taxonomy for the bridge.
//!
//! Every failure is surfaced synchronously to the call that triggered it;
//! nothing is retried internally. Destruction paths are best-effort and do
//! not report errors at all.

use thiserror::Error;

/// Convenience alias used across all peerlink crates.
pub type Result<T> = std::result::Result<T, ErrorKind>;

/// Errors produced by bridge operations.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// The operation requires the runtime guard, which is not held.
    #[error("transport runtime is not initialized")]
    NotInitialized,
    /// One-time global transport initialization failed.
    #[error("global transport initialization failed")]
    InitFailed,
    /// The transport refused to allocate a host (address unavailable,
    /// resource exhaustion, ...).
    #[error("failed to create host: {0}")]
    HostCreateFailed(String),
    /// The operation requires a host, and none exists on this instance.
    #[error("no host exists on this instance")]
    NoHost,
    /// The address string could not be parsed as a literal IP.
    #[error("invalid address: {0:?}")]
    InvalidAddress(String),
    /// The peer handle failed to decode or does not resolve to a live peer.
    #[error("invalid peer handle")]
    InvalidPeer,
    /// The transport could not allocate a new peer slot.
    #[error("connect failed: no free peer slot")]
    ConnectFailed,
    /// Building the outbound packet failed before it reached the transport.
    #[error("failed to build outbound packet")]
    PacketBuildFailed,
    /// The transport refused to enqueue the packet. The constructed packet
    /// has already been released; `code` is the transport's diagnostic.
    #[error("transport rejected packet (code {code})")]
    SendRejected {
        /// Negative diagnostic reported by the transport.
        code: i32,
    },
    /// The transport reported an internal error while polling.
    #[error("transport error during service")]
    ServiceFailed,
    /// The payload kind is not accepted by this send operation.
    #[error("unsupported payload kind for this operation")]
    UnsupportedInput,
}
