//! Router contract
//!
//! Stages hand fully rewritten messages to a router for address-keyed
//! dispatch. The handoff is non-blocking and at-most-once: delivery
//! guarantees (and retries, if any) live behind the router, and dispatch
//! failures are not observable by the caller.

use crate::message::LocalMessage;

/// Address-keyed asynchronous dispatch
pub trait Router: Send + Sync + 'static {
    /// Hand a message off for dispatch. Must not block.
    fn route(&self, message: LocalMessage);
}

/// A router backed by an unbounded channel
///
/// The common in-process implementation: `route` enqueues and returns.
/// A closed receiver makes dispatch a silent no-op, matching the contract.
impl Router for tokio::sync::mpsc::UnboundedSender<LocalMessage> {
    fn route(&self, message: LocalMessage) {
        let _ = self.send(message);
    }
}
