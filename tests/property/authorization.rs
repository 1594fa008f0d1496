// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Authorization Rule Sets

use proptest::prelude::*;

use vaultwarden_infrastructure::authorization::{AuthorizationRule, AuthorizationSet, Peer};
use vaultwarden_infrastructure::domain::{Port, Protocol, ResourceKind};
use vaultwarden_infrastructure::resource::ResourceId;

fn peer() -> impl Strategy<Value = Peer> {
    prop_oneof![
        1 => Just(Peer::AnyIpv4),
        4 => (
            prop_oneof![
                Just(ResourceKind::Service),
                Just(ResourceKind::FileSystem),
                Just(ResourceKind::LoadBalancer),
                Just(ResourceKind::Cluster),
            ],
            "[a-z]{3,10}",
        )
            .prop_map(|(kind, name)| Peer::Resource {
                id: ResourceId::new(),
                kind,
                name,
            }),
    ]
}

fn port() -> impl Strategy<Value = Port> {
    (1u16..=u16::MAX).prop_map(|p| Port::new(p).expect("non-zero port"))
}

fn rule() -> impl Strategy<Value = AuthorizationRule> {
    (peer(), peer(), port()).prop_map(|(source, destination, port)| {
        AuthorizationRule::tcp(source, destination, port)
    })
}

proptest! {
    /// Adding the same rule twice leaves the set unchanged
    #[test]
    fn prop_allow_is_idempotent(rules in prop::collection::vec(rule(), 0..16)) {
        let mut set: AuthorizationSet = rules.iter().cloned().collect();
        let before = set.clone();

        for rule in &rules {
            prop_assert!(!set.allow(rule.clone()));
        }
        prop_assert_eq!(set, before);
    }

    /// Bidirectional rules permit both directions and nothing else
    #[test]
    fn prop_bidirectional_permits_both_ways(a in peer(), b in peer(), port in port(), other in port()) {
        prop_assume!(!a.is_public() && !b.is_public() && port != other);
        let mut set = AuthorizationSet::new();

        set.allow_bidirectional(&a, &b, Protocol::Tcp, port);

        prop_assert!(set.permits(&a, &b, Protocol::Tcp, port));
        prop_assert!(set.permits(&b, &a, Protocol::Tcp, port));
        prop_assert!(!set.permits(&a, &b, Protocol::Udp, port));
        prop_assert!(!set.permits(&a, &b, Protocol::Tcp, other));
    }

    /// Nothing is permitted without a rule
    #[test]
    fn prop_empty_set_denies(a in peer(), b in peer(), port in port()) {
        prop_assert!(!AuthorizationSet::new().permits(&a, &b, Protocol::Tcp, port));
    }

    /// Reversing twice yields the original rule
    #[test]
    fn prop_reverse_is_involution(rule in rule()) {
        prop_assert_eq!(rule.reversed().reversed(), rule);
    }
}
