//! Process-wide reference-counted runtime init/teardown.
//!
//! Every host-owning instance holds exactly one acquisition for its
//! lifetime. The first acquisition across the process runs the transport's
//! one-time startup; the last release runs teardown. Counter transitions
//! are serialized with the hook they trigger through the runtime state's
//! transition lock, so a final release's teardown can never still be
//! running when another instance's acquire returns.

use std::{marker::PhantomData, sync::atomic::Ordering};

use peerlink_core::{
    error::{ErrorKind, Result},
    transport::Transport,
};

/// Per-instance acquisition token for a transport's global runtime.
#[derive(Debug)]
pub struct RuntimeGuard<T: Transport> {
    held: bool,
    _transport: PhantomData<fn() -> T>,
}

impl<T: Transport> RuntimeGuard<T> {
    /// A guard holding nothing.
    pub fn new() -> Self {
        Self { held: false, _transport: PhantomData }
    }

    /// Whether this instance currently holds an acquisition.
    pub fn is_held(&self) -> bool {
        self.held
    }

    /// Acquires the runtime. Idempotent per instance: if this guard
    /// already holds an acquisition it succeeds without touching the
    /// shared counter. A 0→1 transition runs `T::startup`; if startup
    /// fails the increment is rolled back and `InitFailed` is returned.
    pub fn acquire(&mut self) -> Result<()> {
        if self.held {
            return Ok(());
        }
        let state = T::runtime();
        // Held across the increment and the startup it may trigger, and
        // shared with `release`: an acquire cannot complete while a
        // teardown is still running.
        let _transitions = state.lock_transitions();
        if state.counter().fetch_add(1, Ordering::AcqRel) == 0 {
            if !T::startup() {
                state.counter().fetch_sub(1, Ordering::AcqRel);
                return Err(ErrorKind::InitFailed);
            }
        }
        self.held = true;
        Ok(())
    }

    /// Releases the runtime. No-op if this instance holds nothing. A 1→0
    /// transition runs `T::shutdown`.
    pub fn release(&mut self) {
        if !self.held {
            return;
        }
        self.held = false;
        let state = T::runtime();
        let _transitions = state.lock_transitions();
        if state.counter().fetch_sub(1, Ordering::AcqRel) == 1 {
            T::shutdown();
        }
    }
}

impl<T: Transport> Default for RuntimeGuard<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> Drop for RuntimeGuard<T> {
    fn drop(&mut self) {
        self.release();
    }
}
