//! Address and identity types
//!
//! Addresses name local routable endpoints; identifiers and descriptors name
//! verified identities. Descriptors are opaque to the data plane — only the
//! handshake layer inspects their contents.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A routable address of a local endpoint
///
/// Addresses are compared byte-for-byte; the data plane attaches no meaning
/// to their contents beyond equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    /// Create an address from any string-like value
    pub fn new(inner: impl Into<String>) -> Self {
        Self(inner.into())
    }

    /// Generate a fresh random local address (16 random bytes, hex-encoded)
    pub fn random() -> Self {
        let bytes: [u8; 16] = rand::random();
        Self(hex::encode(bytes))
    }

    /// The address as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Verified identifier of an identity (e.g. a change-history digest)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(inner: impl Into<String>) -> Self {
        Self(inner.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Opaque descriptor of an identity
///
/// Produced by the handshake layer; the data plane carries it around and
/// stamps it onto inbound traffic without ever inspecting `change_history`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityDescriptor {
    /// The identity's verified identifier
    pub identifier: Identifier,
    /// Exported change-history blob, opaque at this layer
    pub change_history: Vec<u8>,
}

impl IdentityDescriptor {
    pub fn new(identifier: Identifier, change_history: Vec<u8>) -> Self {
        Self {
            identifier,
            change_history,
        }
    }
}
