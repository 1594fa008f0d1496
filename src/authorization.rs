// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Authorization Rules
//!
//! Reachability is default-deny: two resources can talk only if an explicit
//! directed rule exists. Rules are values collected in an
//! [`AuthorizationSet`] at composition time and handed to the engine one by
//! one, so every edge of the topology can be inspected and tested.
//!
//! ```text
//!  internet ──443──▶ load balancer ──80──▶ service ◀──2049──▶ filesystem
//!                                           cluster ──443──▶ endpoints
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{Port, Protocol, ResourceKind};
use crate::resource::{ResourceHandle, ResourceId};

/// One side of an authorization rule
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Peer {
    /// A provisioned resource
    Resource {
        id: ResourceId,
        kind: ResourceKind,
        name: String,
    },
    /// Any IPv4 address on the internet
    AnyIpv4,
}

impl Peer {
    /// Peer for a provisioned resource
    pub fn of(handle: &ResourceHandle) -> Self {
        Peer::Resource {
            id: handle.id(),
            kind: handle.kind(),
            name: handle.logical_name().to_string(),
        }
    }

    pub fn resource_id(&self) -> Option<ResourceId> {
        match self {
            Peer::Resource { id, .. } => Some(*id),
            Peer::AnyIpv4 => None,
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, Peer::AnyIpv4)
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Peer::Resource { name, .. } => f.write_str(name),
            Peer::AnyIpv4 => f.write_str("0.0.0.0/0"),
        }
    }
}

/// Directed grant of reachability from `source` to `destination`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthorizationRule {
    source: Peer,
    destination: Peer,
    protocol: Protocol,
    port: Port,
}

impl AuthorizationRule {
    pub fn new(source: Peer, destination: Peer, protocol: Protocol, port: Port) -> Self {
        Self {
            source,
            destination,
            protocol,
            port,
        }
    }

    /// TCP rule, the only transport this topology uses
    pub fn tcp(source: Peer, destination: Peer, port: Port) -> Self {
        Self::new(source, destination, Protocol::Tcp, port)
    }

    pub fn source(&self) -> &Peer {
        &self.source
    }

    pub fn destination(&self) -> &Peer {
        &self.destination
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn port(&self) -> Port {
        self.port
    }

    /// Same rule with source and destination swapped
    pub fn reversed(&self) -> Self {
        Self {
            source: self.destination.clone(),
            destination: self.source.clone(),
            protocol: self.protocol,
            port: self.port,
        }
    }

    /// Whether the rule opens the destination to the internet
    pub fn is_public_ingress(&self) -> bool {
        self.source.is_public()
    }
}

impl fmt::Display for AuthorizationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} {}/{}",
            self.source, self.destination, self.protocol, self.port
        )
    }
}

/// Ordered, duplicate-free list of directed rules
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorizationSet {
    rules: Vec<AuthorizationRule>,
}

impl AuthorizationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule; returns `false` if an identical rule already exists
    pub fn allow(&mut self, rule: AuthorizationRule) -> bool {
        if self.rules.contains(&rule) {
            return false;
        }
        self.rules.push(rule);
        true
    }

    /// Add a rule and its reverse
    pub fn allow_bidirectional(
        &mut self,
        a: &Peer,
        b: &Peer,
        protocol: Protocol,
        port: Port,
    ) -> [AuthorizationRule; 2] {
        let forward = AuthorizationRule::new(a.clone(), b.clone(), protocol, port);
        let backward = forward.reversed();
        self.allow(forward.clone());
        self.allow(backward.clone());
        [forward, backward]
    }

    /// Whether traffic from `source` to `destination` is authorized
    ///
    /// A rule whose source is [`Peer::AnyIpv4`] admits every source.
    pub fn permits(
        &self,
        source: &Peer,
        destination: &Peer,
        protocol: Protocol,
        port: Port,
    ) -> bool {
        self.rules.iter().any(|rule| {
            (rule.source == *source || rule.source.is_public())
                && rule.destination == *destination
                && rule.protocol == protocol
                && rule.port == port
        })
    }

    /// Whether a rule names exactly `source` and `destination`
    ///
    /// Unlike [`permits`](Self::permits), a public rule does not count.
    pub fn permits_explicitly(
        &self,
        source: &Peer,
        destination: &Peer,
        protocol: Protocol,
        port: Port,
    ) -> bool {
        self.rules.iter().any(|rule| {
            rule.source == *source
                && rule.destination == *destination
                && rule.protocol == protocol
                && rule.port == port
        })
    }

    /// Rules whose source is `peer`
    pub fn outbound<'a>(&'a self, peer: &'a Peer) -> impl Iterator<Item = &'a AuthorizationRule> {
        self.rules.iter().filter(move |rule| rule.source == *peer)
    }

    /// Rules whose destination is `peer`
    pub fn inbound<'a>(&'a self, peer: &'a Peer) -> impl Iterator<Item = &'a AuthorizationRule> {
        self.rules.iter().filter(move |rule| rule.destination == *peer)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AuthorizationRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[AuthorizationRule] {
        &self.rules
    }
}

impl FromIterator<AuthorizationRule> for AuthorizationSet {
    fn from_iter<I: IntoIterator<Item = AuthorizationRule>>(iter: I) -> Self {
        let mut set = AuthorizationSet::new();
        for rule in iter {
            set.allow(rule);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(kind: ResourceKind, name: &str) -> Peer {
        Peer::Resource {
            id: ResourceId::new(),
            kind,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_default_deny() {
        let service = peer(ResourceKind::Service, "vaultwarden-service");
        let storage = peer(ResourceKind::FileSystem, "vaultwarden-filesystem");
        let set = AuthorizationSet::new();

        assert!(!set.permits(&service, &storage, Protocol::Tcp, Port::NFS));
        assert!(!set.permits(&storage, &service, Protocol::Tcp, Port::NFS));
    }

    #[test]
    fn test_rules_are_directed() {
        let service = peer(ResourceKind::Service, "vaultwarden-service");
        let storage = peer(ResourceKind::FileSystem, "vaultwarden-filesystem");
        let mut set = AuthorizationSet::new();

        set.allow(AuthorizationRule::tcp(service.clone(), storage.clone(), Port::NFS));

        assert!(set.permits(&service, &storage, Protocol::Tcp, Port::NFS));
        assert!(!set.permits(&storage, &service, Protocol::Tcp, Port::NFS));
        assert!(!set.permits(&service, &storage, Protocol::Udp, Port::NFS));
        assert!(!set.permits(&service, &storage, Protocol::Tcp, Port::HTTPS));
    }

    #[test]
    fn test_bidirectional() {
        let service = peer(ResourceKind::Service, "vaultwarden-service");
        let storage = peer(ResourceKind::FileSystem, "vaultwarden-filesystem");
        let mut set = AuthorizationSet::new();

        let [forward, backward] =
            set.allow_bidirectional(&service, &storage, Protocol::Tcp, Port::NFS);

        assert_eq!(forward.reversed(), backward);
        assert_eq!(set.len(), 2);
        assert!(set.permits(&service, &storage, Protocol::Tcp, Port::NFS));
        assert!(set.permits(&storage, &service, Protocol::Tcp, Port::NFS));
        assert_eq!(set.outbound(&service).count(), 1);
        assert_eq!(set.inbound(&service).count(), 1);
    }

    #[test]
    fn test_duplicates_are_ignored() {
        let a = peer(ResourceKind::Cluster, "cluster");
        let b = peer(ResourceKind::PrivateEndpoint, "endpoint");
        let mut set = AuthorizationSet::new();

        assert!(set.allow(AuthorizationRule::tcp(a.clone(), b.clone(), Port::HTTPS)));
        assert!(!set.allow(AuthorizationRule::tcp(a, b, Port::HTTPS)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_public_ingress_admits_any_source() {
        let lb = peer(ResourceKind::LoadBalancer, "vaultwarden-load-balancer");
        let somebody = peer(ResourceKind::Service, "elsewhere");
        let set: AuthorizationSet =
            std::iter::once(AuthorizationRule::tcp(Peer::AnyIpv4, lb.clone(), Port::HTTPS))
                .collect();

        assert!(set.permits(&somebody, &lb, Protocol::Tcp, Port::HTTPS));
        assert!(set.rules()[0].is_public_ingress());
        assert_eq!(
            set.rules()[0].to_string(),
            "0.0.0.0/0 -> vaultwarden-load-balancer tcp/443"
        );
    }
}
