//! Process-local message metadata
//!
//! Metadata rides alongside a message between cooperating local stages and
//! is never serialized across a wire boundary. Cooperating stages use a
//! small set of reserved keys to carry trust and provenance markers; all
//! other keys are free for applications.

use std::collections::HashMap;

use crate::types::{Identifier, IdentityDescriptor};

/// Reserved key: which channel stage handled the message last
pub const KEY_CHANNEL: &str = "channel";

/// Reserved key: what kind of stage injected the message
pub const KEY_SOURCE: &str = "source";

/// Reserved key: verified identifier of the message's remote origin
pub const KEY_IDENTITY_ID: &str = "identity_id";

/// Reserved key: verified descriptor of the message's remote origin
pub const KEY_IDENTITY: &str = "identity";

/// Provenance key stamped on outbound traffic by a relay instance
pub const KEY_RELAY: &str = "relay";

/// `channel` value applied by the plain secure-channel decryptor
pub const CHANNEL_SECURE: &str = "secure_channel";

/// `channel` value applied by the identity relay on inbound forwards
pub const CHANNEL_IDENTITY_SECURE: &str = "identity_secure_channel";

/// `source` value tagging traffic injected by a channel stage
pub const SOURCE_CHANNEL: &str = "channel";

/// The four keys a relay always overwrites on inbound forwards
pub const RESERVED_KEYS: [&str; 4] = [KEY_CHANNEL, KEY_SOURCE, KEY_IDENTITY_ID, KEY_IDENTITY];

/// A single metadata value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataValue {
    /// Free-form text
    Text(String),
    /// Opaque bytes
    Bytes(Vec<u8>),
    /// A verified identifier
    Id(Identifier),
    /// A verified identity descriptor
    Identity(IdentityDescriptor),
}

impl MetadataValue {
    /// Text contents, if this value is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Identifier contents, if this value is an identifier
    pub fn as_id(&self) -> Option<&Identifier> {
        match self {
            MetadataValue::Id(id) => Some(id),
            _ => None,
        }
    }

    /// Descriptor contents, if this value is an identity
    pub fn as_identity(&self) -> Option<&IdentityDescriptor> {
        match self {
            MetadataValue::Identity(desc) => Some(desc),
            _ => None,
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        MetadataValue::Text(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        MetadataValue::Text(s)
    }
}

impl From<Identifier> for MetadataValue {
    fn from(id: Identifier) -> Self {
        MetadataValue::Id(id)
    }
}

impl From<IdentityDescriptor> for MetadataValue {
    fn from(desc: IdentityDescriptor) -> Self {
        MetadataValue::Identity(desc)
    }
}

/// Process-local key → value annotations on a message
pub type Metadata = HashMap<String, MetadataValue>;

/// Whether metadata carries the secure-channel tagging a decryptor applies
/// (`channel = secure_channel` and `source = channel`)
pub fn has_secure_channel_tagging(metadata: &Metadata) -> bool {
    metadata
        .get(KEY_CHANNEL)
        .and_then(MetadataValue::as_text)
        .map(|v| v == CHANNEL_SECURE)
        .unwrap_or(false)
        && metadata
            .get(KEY_SOURCE)
            .and_then(MetadataValue::as_text)
            .map(|v| v == SOURCE_CHANNEL)
            .unwrap_or(false)
}
