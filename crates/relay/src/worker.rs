//! Per-session relay worker
//!
//! One dedicated task per relay instance consumes a single request channel,
//! so inbound traffic, outbound traffic and identity queries are processed
//! strictly in arrival order without locks. Rewritten messages are handed to
//! the router fire-and-forget; recoverable per-message errors are logged and
//! do not end the task.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

use sealink_core::{Address, Identifier, IdentityDescriptor, LocalMessage, Router};

use crate::policy::AddressPolicies;
use crate::session::{RelayConfig, SessionRecord};
use crate::{RelayError, Result};

/// Requests funneled through a relay instance's single consumer
enum RelayRequest {
    /// Message arriving from the encrypted side
    Inbound(LocalMessage),
    /// Message arriving from the application side
    Outbound(LocalMessage),
    /// Synchronous read of the verified remote descriptor
    RemoteIdentity(oneshot::Sender<IdentityDescriptor>),
    /// Synchronous read of the verified remote identifier
    RemoteIdentityId(oneshot::Sender<Identifier>),
}

/// Handle to a running relay instance
///
/// Cloneable; dropping every clone closes the request channel and ends the
/// worker task. Delivery methods enqueue and return — ordering within one
/// instance follows enqueue order.
#[derive(Clone, Debug)]
pub struct RelayHandle {
    address: Address,
    policies: AddressPolicies,
    sender: mpsc::UnboundedSender<RelayRequest>,
}

impl RelayHandle {
    /// The instance's own routable address
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// The access-rule pair the instance declared for its two faces,
    /// for the hosting runtime to install
    pub fn policies(&self) -> &AddressPolicies {
        &self.policies
    }

    /// Deliver a message that arrived from the encrypted side
    pub fn deliver_inbound(&self, message: LocalMessage) -> Result<()> {
        self.sender
            .send(RelayRequest::Inbound(message))
            .map_err(|_| RelayError::Terminated)
    }

    /// Deliver a message that arrived from the application side
    pub fn deliver_outbound(&self, message: LocalMessage) -> Result<()> {
        self.sender
            .send(RelayRequest::Outbound(message))
            .map_err(|_| RelayError::Terminated)
    }

    /// Verified descriptor of the remote party.
    ///
    /// Queues behind any pending traffic on this instance, then completes
    /// in O(1). Only fails if the instance has been torn down.
    pub async fn remote_identity(&self) -> Result<IdentityDescriptor> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(RelayRequest::RemoteIdentity(reply))
            .map_err(|_| RelayError::Terminated)?;
        response.await.map_err(|_| RelayError::Terminated)
    }

    /// Verified identifier of the remote party
    pub async fn remote_identity_id(&self) -> Result<Identifier> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(RelayRequest::RemoteIdentityId(reply))
            .map_err(|_| RelayError::Terminated)?;
        response.await.map_err(|_| RelayError::Terminated)
    }
}

/// Factory for per-session relay workers
pub struct IdentityRelay;

impl IdentityRelay {
    /// Validate the configuration and start one relay instance.
    ///
    /// The instance gets a fresh random address; the returned handle carries
    /// that address plus the declared access-rule pair. A configuration
    /// error is fatal: no task is spawned.
    pub fn spawn(config: RelayConfig, router: Arc<dyn Router>) -> Result<RelayHandle> {
        Self::spawn_at(Address::random(), config, router)
    }

    /// Start one relay instance at a caller-chosen address
    pub fn spawn_at(
        self_address: Address,
        config: RelayConfig,
        router: Arc<dyn Router>,
    ) -> Result<RelayHandle> {
        let (record, policies) = config.build(self_address.clone())?;
        let (sender, receiver) = mpsc::unbounded_channel();

        debug!(address = %self_address, contact = %record.contact_id(), "relay instance starting");
        tokio::spawn(run(record, receiver, router));

        Ok(RelayHandle {
            address: self_address,
            policies,
            sender,
        })
    }
}

/// Single-consumer loop: one request at a time, in arrival order
async fn run(
    record: SessionRecord,
    mut receiver: mpsc::UnboundedReceiver<RelayRequest>,
    router: Arc<dyn Router>,
) {
    while let Some(request) = receiver.recv().await {
        match request {
            RelayRequest::Inbound(message) => match record.inbound(message) {
                Ok(forward) => router.route(forward),
                Err(err @ RelayError::MetadataInvariant(_)) => {
                    // Points at a policy-engine defect upstream, not at the
                    // remote peer. Loud, but the instance keeps running.
                    error!(address = %record.self_address(), %err, "dropping inbound message");
                }
                Err(err) => {
                    warn!(address = %record.self_address(), %err, "dropping inbound message");
                }
            },
            RelayRequest::Outbound(message) => match record.outbound(message) {
                Ok(forward) => router.route(forward),
                Err(err) => {
                    warn!(address = %record.self_address(), %err, "dropping outbound message");
                }
            },
            RelayRequest::RemoteIdentity(reply) => {
                let _ = reply.send(record.contact().clone());
            }
            RelayRequest::RemoteIdentityId(reply) => {
                let _ = reply.send(record.contact_id().clone());
            }
        }
    }
    debug!(address = %record.self_address(), "relay instance stopped");
}
