//! Session record and envelope rewriting
//!
//! The session record is built once per established session and read-only
//! afterwards. Both rewrite directions are pure functions over the record:
//! inbound forwards get identity metadata stamped on, outbound forwards get
//! the encrypted-path hops prepended. Dispatch is the worker's job.

use sealink_core::{
    has_secure_channel_tagging, Address, Identifier, IdentityDescriptor, LocalMessage, Metadata,
    MetadataValue, Route, CHANNEL_IDENTITY_SECURE, KEY_CHANNEL, KEY_IDENTITY, KEY_IDENTITY_ID,
    KEY_RELAY, KEY_SOURCE, SOURCE_CHANNEL,
};

use crate::policy::{AddressPolicies, PolicySpec};
use crate::{RelayError, Result};

/// Construction options for one relay instance
///
/// `peer_address`, `encryption_channel`, `identity`, `contact_id` and
/// `contact` are required; building without any of them fails with
/// [`RelayError::Configuration`].
#[derive(Debug, Default, Clone)]
pub struct RelayConfig {
    peer_address: Option<Address>,
    encryption_channel: Option<Address>,
    identity: Option<IdentityDescriptor>,
    contact_id: Option<Identifier>,
    contact: Option<IdentityDescriptor>,
    additional_metadata: Metadata,
    authorization: Option<PolicySpec>,
}

impl RelayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remote encrypted endpoint outbound traffic routes to
    pub fn peer_address(mut self, addr: impl Into<Address>) -> Self {
        self.peer_address = Some(addr.into());
        self
    }

    /// Local encrypted-transport endpoint this instance talks to
    pub fn encryption_channel(mut self, addr: impl Into<Address>) -> Self {
        self.encryption_channel = Some(addr.into());
        self
    }

    /// This party's own identity descriptor
    pub fn identity(mut self, identity: IdentityDescriptor) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Verified identifier of the remote party
    pub fn contact_id(mut self, id: impl Into<Identifier>) -> Self {
        self.contact_id = Some(id.into());
        self
    }

    /// Verified descriptor of the remote party
    pub fn contact(mut self, contact: IdentityDescriptor) -> Self {
        self.contact = Some(contact);
        self
    }

    /// Extra key → value pairs merged into every inbound forward
    pub fn additional_metadata(mut self, metadata: Metadata) -> Self {
        self.additional_metadata = metadata;
        self
    }

    /// Override the application-facing access rule
    pub fn authorization(mut self, policy: PolicySpec) -> Self {
        self.authorization = Some(policy);
        self
    }

    /// Validate the options and freeze them into a session record,
    /// declaring the access-rule pair for the instance's two faces
    pub fn build(self, self_address: Address) -> Result<(SessionRecord, AddressPolicies)> {
        let peer_address = self
            .peer_address
            .ok_or(RelayError::Configuration("peer_address"))?;
        let encryption_channel = self
            .encryption_channel
            .ok_or(RelayError::Configuration("encryption_channel"))?;
        let identity = self.identity.ok_or(RelayError::Configuration("identity"))?;
        let contact_id = self
            .contact_id
            .ok_or(RelayError::Configuration("contact_id"))?;
        let contact = self.contact.ok_or(RelayError::Configuration("contact"))?;

        let policies = AddressPolicies::declare(encryption_channel.clone(), self.authorization);
        let record = SessionRecord {
            self_address,
            peer_address,
            encryption_channel,
            identity,
            contact_id,
            contact,
            additional_metadata: self.additional_metadata,
        };
        Ok((record, policies))
    }
}

/// Immutable state of one relay instance
///
/// `contact` and `contact_id` come from the handshake and are trusted for
/// the record's entire lifetime.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    self_address: Address,
    peer_address: Address,
    encryption_channel: Address,
    identity: IdentityDescriptor,
    contact_id: Identifier,
    contact: IdentityDescriptor,
    additional_metadata: Metadata,
}

impl SessionRecord {
    /// This instance's own routable address
    pub fn self_address(&self) -> &Address {
        &self.self_address
    }

    /// This party's own identity descriptor
    pub fn identity(&self) -> &IdentityDescriptor {
        &self.identity
    }

    /// Verified descriptor of the remote party
    pub fn contact(&self) -> &IdentityDescriptor {
        &self.contact
    }

    /// Verified identifier of the remote party
    pub fn contact_id(&self) -> &Identifier {
        &self.contact_id
    }

    /// Rewrite an encrypted-side message for the application side.
    ///
    /// Drops the self hop from the onward route, replaces the channel hop on
    /// the return route with this instance's address, and stamps the merged
    /// identity metadata onto the forward.
    pub fn inbound(&self, mut message: LocalMessage) -> Result<LocalMessage> {
        if message.onward_route.len() < 2 || message.return_route.len() < 2 {
            return Err(RelayError::InvalidInnerMessage {
                onward: message.onward_route.len(),
                ret: message.return_route.len(),
            });
        }

        // Authorization should only admit decryptor traffic here; anything
        // else means the upstream policy engine misfired.
        if !has_secure_channel_tagging(&message.local_metadata) {
            return Err(RelayError::MetadataInvariant(format!(
                "expected decryptor tagging on message from {}",
                message.return_route
            )));
        }

        message.onward_route.step();
        message.return_route.step();
        message.return_route.prepend(self.self_address.clone());
        message.local_metadata = self.inbound_forward_metadata();
        Ok(message)
    }

    /// Rewrite an application-side message for the encrypted path.
    ///
    /// Drops the self hop and prepends the encryption channel and the remote
    /// peer, then tags the message with this instance's provenance marker.
    pub fn outbound(&self, mut message: LocalMessage) -> Result<LocalMessage> {
        if message.onward_route.is_empty() {
            return Err(RelayError::InvalidOuterMessage);
        }

        message.onward_route.step();
        message.onward_route.prepend_route(Route::from([
            self.encryption_channel.clone(),
            self.peer_address.clone(),
        ]));
        message.local_metadata.insert(
            KEY_RELAY.to_string(),
            MetadataValue::Text(self.self_address.to_string()),
        );
        Ok(message)
    }

    /// Metadata stamped onto an inbound forward.
    ///
    /// Base is the session's `additional_metadata`; the four reserved keys
    /// are then force-set, so reserved keys arriving on the message (or
    /// configured by the user) never survive, while every non-reserved user
    /// key passes through untouched.
    fn inbound_forward_metadata(&self) -> Metadata {
        let mut merged = self.additional_metadata.clone();
        merged.insert(KEY_CHANNEL.to_string(), CHANNEL_IDENTITY_SECURE.into());
        merged.insert(KEY_SOURCE.to_string(), SOURCE_CHANNEL.into());
        merged.insert(
            KEY_IDENTITY_ID.to_string(),
            MetadataValue::Id(self.contact_id.clone()),
        );
        merged.insert(
            KEY_IDENTITY.to_string(),
            MetadataValue::Identity(self.contact.clone()),
        );
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sealink_core::CHANNEL_SECURE;

    fn contact_b() -> IdentityDescriptor {
        IdentityDescriptor::new(Identifier::from("idB"), vec![0xB])
    }

    fn identity_a() -> IdentityDescriptor {
        IdentityDescriptor::new(Identifier::from("idA"), vec![0xA])
    }

    fn config() -> RelayConfig {
        RelayConfig::new()
            .peer_address("peerA")
            .encryption_channel("enc1")
            .identity(identity_a())
            .contact_id("idB")
            .contact(contact_b())
    }

    fn record() -> SessionRecord {
        config().build(Address::from("self")).unwrap().0
    }

    fn decryptor_tagging() -> Metadata {
        let mut metadata = Metadata::new();
        metadata.insert(KEY_CHANNEL.to_string(), CHANNEL_SECURE.into());
        metadata.insert(KEY_SOURCE.to_string(), SOURCE_CHANNEL.into());
        metadata
    }

    #[test]
    fn test_build_succeeds_with_all_required() {
        let (record, policies) = config().build(Address::from("self")).unwrap();
        assert_eq!(record.self_address(), &Address::from("self"));
        assert_eq!(record.contact_id(), &Identifier::from("idB"));
        assert_eq!(
            policies.inner,
            PolicySpec::SecureChannelOnly {
                encryption_channel: Address::from("enc1")
            }
        );
    }

    #[test]
    fn test_build_fails_without_peer_address() {
        let config = RelayConfig::new()
            .encryption_channel("enc1")
            .identity(identity_a())
            .contact_id("idB")
            .contact(contact_b());
        let err = config.build(Address::from("self")).unwrap_err();
        assert!(matches!(err, RelayError::Configuration("peer_address")));
    }

    #[test]
    fn test_build_fails_without_encryption_channel() {
        let config = RelayConfig::new()
            .peer_address("peerA")
            .identity(identity_a())
            .contact_id("idB")
            .contact(contact_b());
        let err = config.build(Address::from("self")).unwrap_err();
        assert!(matches!(
            err,
            RelayError::Configuration("encryption_channel")
        ));
    }

    #[test]
    fn test_build_fails_without_identity() {
        let config = RelayConfig::new()
            .peer_address("peerA")
            .encryption_channel("enc1")
            .contact_id("idB")
            .contact(contact_b());
        let err = config.build(Address::from("self")).unwrap_err();
        assert!(matches!(err, RelayError::Configuration("identity")));
    }

    #[test]
    fn test_build_fails_without_contact_id() {
        let config = RelayConfig::new()
            .peer_address("peerA")
            .encryption_channel("enc1")
            .identity(identity_a())
            .contact(contact_b());
        let err = config.build(Address::from("self")).unwrap_err();
        assert!(matches!(err, RelayError::Configuration("contact_id")));
    }

    #[test]
    fn test_build_fails_without_contact() {
        let config = RelayConfig::new()
            .peer_address("peerA")
            .encryption_channel("enc1")
            .identity(identity_a())
            .contact_id("idB");
        let err = config.build(Address::from("self")).unwrap_err();
        assert!(matches!(err, RelayError::Configuration("contact")));
    }

    #[test]
    fn test_inbound_rewrites_routes_and_stamps_identity() {
        let mut user = Metadata::new();
        user.insert("app".to_string(), "chat".into());
        let record = config()
            .additional_metadata(user)
            .build(Address::from("self"))
            .unwrap()
            .0;

        let msg = LocalMessage::new(
            Route::from(["self", "app1"]),
            Route::from(["enc1", "clientX"]),
            b"hello".to_vec(),
        )
        .with_metadata(decryptor_tagging());

        let out = record.inbound(msg).unwrap();
        assert_eq!(out.onward_route, Route::from(["app1"]));
        assert_eq!(out.return_route, Route::from(["self", "clientX"]));
        assert_eq!(out.payload, b"hello");

        let metadata = &out.local_metadata;
        assert_eq!(metadata.get("app").unwrap().as_text(), Some("chat"));
        assert_eq!(
            metadata.get(KEY_CHANNEL).unwrap().as_text(),
            Some(CHANNEL_IDENTITY_SECURE)
        );
        assert_eq!(
            metadata.get(KEY_SOURCE).unwrap().as_text(),
            Some(SOURCE_CHANNEL)
        );
        assert_eq!(
            metadata.get(KEY_IDENTITY_ID).unwrap().as_id(),
            Some(&Identifier::from("idB"))
        );
        assert_eq!(
            metadata.get(KEY_IDENTITY).unwrap().as_identity(),
            Some(&contact_b())
        );
    }

    #[test]
    fn test_inbound_short_onward_route_rejected() {
        let msg = LocalMessage::new(
            Route::from(["self"]),
            Route::from(["enc1", "clientX"]),
            Vec::new(),
        )
        .with_metadata(decryptor_tagging());
        let err = record().inbound(msg).unwrap_err();
        assert!(matches!(
            err,
            RelayError::InvalidInnerMessage { onward: 1, ret: 2 }
        ));
    }

    #[test]
    fn test_inbound_short_return_route_rejected() {
        let msg = LocalMessage::new(
            Route::from(["self", "app1"]),
            Route::from(["enc1"]),
            Vec::new(),
        )
        .with_metadata(decryptor_tagging());
        let err = record().inbound(msg).unwrap_err();
        assert!(matches!(
            err,
            RelayError::InvalidInnerMessage { onward: 2, ret: 1 }
        ));
    }

    #[test]
    fn test_inbound_without_decryptor_tagging_rejected() {
        let msg = LocalMessage::new(
            Route::from(["self", "app1"]),
            Route::from(["enc1", "clientX"]),
            Vec::new(),
        );
        let err = record().inbound(msg).unwrap_err();
        assert!(matches!(err, RelayError::MetadataInvariant(_)));
    }

    #[test]
    fn test_inbound_discards_reserved_keys_from_message() {
        let mut tagging = decryptor_tagging();
        tagging.insert(KEY_IDENTITY_ID.to_string(), "forged".into());
        let msg = LocalMessage::new(
            Route::from(["self", "app1"]),
            Route::from(["enc1", "clientX"]),
            Vec::new(),
        )
        .with_metadata(tagging);

        let out = record().inbound(msg).unwrap();
        assert_eq!(
            out.local_metadata.get(KEY_IDENTITY_ID).unwrap().as_id(),
            Some(&Identifier::from("idB"))
        );
    }

    #[test]
    fn test_inbound_reserved_keys_in_additional_metadata_overwritten() {
        let mut user = Metadata::new();
        user.insert(KEY_CHANNEL.to_string(), "spoofed".into());
        user.insert("app".to_string(), "chat".into());
        let record = config()
            .additional_metadata(user)
            .build(Address::from("self"))
            .unwrap()
            .0;

        let msg = LocalMessage::new(
            Route::from(["self", "app1"]),
            Route::from(["enc1", "clientX"]),
            Vec::new(),
        )
        .with_metadata(decryptor_tagging());

        let out = record.inbound(msg).unwrap();
        assert_eq!(
            out.local_metadata.get(KEY_CHANNEL).unwrap().as_text(),
            Some(CHANNEL_IDENTITY_SECURE)
        );
        assert_eq!(
            out.local_metadata.get("app").unwrap().as_text(),
            Some("chat")
        );
    }

    #[test]
    fn test_outbound_prepends_encrypted_path() {
        let msg = LocalMessage::new(
            Route::from(["self", "x", "y"]),
            Route::from(["clientX"]),
            b"payload".to_vec(),
        );
        let out = record().outbound(msg).unwrap();
        assert_eq!(out.onward_route, Route::from(["enc1", "peerA", "x", "y"]));
        assert_eq!(out.return_route, Route::from(["clientX"]));
        assert_eq!(out.payload, b"payload");
        assert_eq!(
            out.local_metadata.get(KEY_RELAY).unwrap().as_text(),
            Some("self")
        );
    }

    #[test]
    fn test_outbound_only_self_hop() {
        let msg = LocalMessage::new(Route::from(["self"]), Route::new(), Vec::new());
        let out = record().outbound(msg).unwrap();
        assert_eq!(out.onward_route, Route::from(["enc1", "peerA"]));
    }

    #[test]
    fn test_outbound_empty_route_rejected() {
        let msg = LocalMessage::new(Route::new(), Route::new(), Vec::new());
        let err = record().outbound(msg).unwrap_err();
        assert!(matches!(err, RelayError::InvalidOuterMessage));
    }

    #[test]
    fn test_forward_metadata_is_stable() {
        let record = record();
        assert_eq!(
            record.inbound_forward_metadata(),
            record.inbound_forward_metadata()
        );
    }
}
