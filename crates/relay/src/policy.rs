//! Declarative authorization policy
//!
//! A relay instance declares who may inject traffic on each of its two
//! faces; enforcement belongs to the hosting runtime. The inner
//! (encryption-facing) rule is fixed at construction and cannot be
//! overridden, the outer (application-facing) rule defaults to open.

use sealink_core::Address;

/// A single access rule attached to one address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicySpec {
    /// No restriction beyond runtime defaults
    AllowAll,
    /// Accept only messages tagged as originating from the secure-channel
    /// layer whose immediate predecessor hop is exactly `encryption_channel`
    SecureChannelOnly { encryption_channel: Address },
}

/// The rule pair a relay instance declares for its two faces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressPolicies {
    /// Application-facing rule (caller-overridable)
    pub outer: PolicySpec,
    /// Encryption-facing rule (always `SecureChannelOnly`)
    pub inner: PolicySpec,
}

impl AddressPolicies {
    /// Build the rule pair for an instance talking to `encryption_channel`
    pub fn declare(encryption_channel: Address, outer_override: Option<PolicySpec>) -> Self {
        Self {
            outer: outer_override.unwrap_or(PolicySpec::AllowAll),
            inner: PolicySpec::SecureChannelOnly { encryption_channel },
        }
    }
}
