#![warn(missing_docs)]

//! peerlink-host: host lifecycle, runtime guard and event polling.
//!
//! The [`Bridge`] owns zero-or-one transport host, holds a process-wide
//! runtime acquisition for its lifetime, and drains the transport's event
//! queue one typed event per poll. Peers are referenced through opaque
//! registry-minted handles, never through transport internals.

/// User-facing events produced by polling.
pub mod event;
/// In-process reference transport for tests and demos.
pub mod memory;
/// Registry mapping external peer handles to transport references.
pub mod registry;
/// Process-wide reference-counted runtime init/teardown.
pub mod runtime;

mod bridge;

pub use bridge::Bridge;
pub use event::Event;
pub use memory::MemoryTransport;
pub use registry::PeerRegistry;
pub use runtime::RuntimeGuard;
