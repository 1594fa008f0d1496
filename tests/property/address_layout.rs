// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Subnet Layout

use proptest::prelude::*;
use std::net::Ipv4Addr;

use vaultwarden_infrastructure::components::network::NetworkSpec;
use vaultwarden_infrastructure::domain::{CidrBlock, SubnetClass, ZoneCount};

fn block() -> impl Strategy<Value = CidrBlock> {
    (any::<u32>(), 16u8..=24).prop_map(|(address, prefix)| {
        let aligned = address & !(u32::MAX >> prefix);
        CidrBlock::from_parts(Ipv4Addr::from(aligned), prefix).expect("aligned block")
    })
}

fn zones() -> impl Strategy<Value = ZoneCount> {
    (ZoneCount::MIN..=ZoneCount::MAX).prop_map(|n| ZoneCount::new(n).expect("zone count"))
}

proptest! {
    /// Subnets lie inside the network block and never overlap
    #[test]
    fn prop_subnets_are_disjoint_and_contained(block in block(), zones in zones()) {
        let spec = NetworkSpec::new(block, zones).expect("layout fits");

        for (i, a) in spec.subnets.iter().enumerate() {
            prop_assert!(block.contains(&a.cidr));
            for b in spec.subnets.iter().skip(i + 1) {
                prop_assert!(!a.cidr.contains(&b.cidr) && !b.cidr.contains(&a.cidr));
            }
        }
    }

    /// Each class gets exactly one subnet per zone
    #[test]
    fn prop_one_subnet_per_class_and_zone(block in block(), zones in zones()) {
        let spec = NetworkSpec::new(block, zones).expect("layout fits");

        for class in [SubnetClass::Isolated, SubnetClass::Ingress] {
            let mut indices: Vec<u8> = spec.subnets_of(class).map(|s| s.zone_index).collect();
            indices.sort_unstable();
            prop_assert_eq!(indices, (0..zones.value()).collect::<Vec<_>>());
        }
        prop_assert_eq!(spec.nat_gateways, 0);
    }
}
