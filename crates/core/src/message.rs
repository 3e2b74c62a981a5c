//! Routes and the local message envelope
//!
//! A route is an ordered address list: onward routes list the remaining hops
//! next-first, return routes list the hops already traversed most-recent
//! first. The local message envelope pairs the two routes with an opaque
//! payload and process-local metadata.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::metadata::Metadata;
use crate::types::Address;

/// An ordered list of addresses
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route(Vec<Address>);

impl Route {
    /// Create an empty route
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// The next hop, if any
    pub fn next(&self) -> Option<&Address> {
        self.0.first()
    }

    /// Drop the leading hop, returning it
    pub fn step(&mut self) -> Option<Address> {
        if self.0.is_empty() {
            None
        } else {
            Some(self.0.remove(0))
        }
    }

    /// Prepend one hop
    pub fn prepend(&mut self, addr: Address) {
        self.0.insert(0, addr);
    }

    /// Prepend a whole route, preserving its order
    pub fn prepend_route(&mut self, route: Route) {
        let mut hops = route.0;
        hops.append(&mut self.0);
        self.0 = hops;
    }

    /// Number of hops
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the route has no hops
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The hops as a slice
    pub fn hops(&self) -> &[Address] {
        &self.0
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for hop in &self.0 {
            if !first {
                f.write_str(" => ")?;
            }
            write!(f, "{}", hop)?;
            first = false;
        }
        Ok(())
    }
}

impl<A: Into<Address>> FromIterator<A> for Route {
    fn from_iter<T: IntoIterator<Item = A>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<A: Into<Address>, const N: usize> From<[A; N]> for Route {
    fn from(hops: [A; N]) -> Self {
        hops.into_iter().collect()
    }
}

/// A message as it moves between local stages
///
/// `local_metadata` is process-local by contract and is skipped by serde:
/// trust markers must never leave the process that established them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalMessage {
    /// Opaque payload bytes
    pub payload: Vec<u8>,
    /// Remaining hops, next hop first
    pub onward_route: Route,
    /// Traversed hops, most recent first
    pub return_route: Route,
    /// Process-local annotations, never serialized
    #[serde(skip)]
    pub local_metadata: Metadata,
}

impl LocalMessage {
    /// Create a message with the given routes and payload
    pub fn new(onward_route: Route, return_route: Route, payload: Vec<u8>) -> Self {
        Self {
            payload,
            onward_route,
            return_route,
            local_metadata: Metadata::new(),
        }
    }

    /// Attach process-local metadata
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.local_metadata = metadata;
        self
    }
}
