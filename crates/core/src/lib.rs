//! Sealink Core Types
//!
//! This crate defines the fundamental data structures shared by every stage
//! of a Sealink node: addresses, routes, the local message envelope, the
//! process-local metadata model, and the router contract used to hand
//! messages between stages.

mod message;
mod metadata;
mod router;
mod types;

pub use message::*;
pub use metadata::*;
pub use router::*;
pub use types::*;
