//! Sealink Identity Relay
//!
//! Data-plane relay stage of an identity-bound secure channel. One relay
//! instance per established session sits between the encrypted transport
//! and the application layer.
//!
//! ## Responsibilities
//!
//! 1. Declare which hops may inject traffic on each of its two faces
//! 2. Rewrite routing envelopes as messages cross the boundary
//! 3. Stamp verified-identity metadata onto inbound forwards
//! 4. Answer synchronous queries for the verified remote identity
//!
//! Handshake, key exchange and the encrypted transport itself are external
//! collaborators; this crate trusts the `contact`/`contact_id` values it is
//! constructed with for the lifetime of the instance.

mod policy;
mod session;
mod worker;

pub use policy::{AddressPolicies, PolicySpec};
pub use session::{RelayConfig, SessionRecord};
pub use worker::{IdentityRelay, RelayHandle};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Missing required configuration option: {0}")]
    Configuration(&'static str),

    #[error("Inbound message has too few hops: onward {onward}, return {ret} (need 2 each)")]
    InvalidInnerMessage { onward: usize, ret: usize },

    #[error("Outbound message has an empty onward route")]
    InvalidOuterMessage,

    #[error("Inbound message is missing secure-channel tagging: {0}")]
    MetadataInvariant(String),

    #[error("Relay instance is no longer running")]
    Terminated,
}

pub type Result<T> = std::result::Result<T, RelayError>;
