// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Workload Configuration Extraction

use proptest::prelude::*;
use std::collections::BTreeMap;

use vaultwarden_infrastructure::config::{ConfigurationDigest, CONFIG_PREFIX};

fn key() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Z_]{1,12}".prop_map(|suffix| format!("{CONFIG_PREFIX}{suffix}")),
        "[A-Za-z_]{1,16}",
        Just(CONFIG_PREFIX.to_string()),
    ]
}

fn environment() -> impl Strategy<Value = BTreeMap<String, Option<String>>> {
    prop::collection::btree_map(key(), prop::option::of("[ -~]{0,24}"), 0..24)
}

proptest! {
    /// Every extracted entry comes from a defined, prefixed variable
    #[test]
    fn prop_extracted_entries_are_prefixed_and_defined(env in environment()) {
        let digest = ConfigurationDigest::extract(env.clone());

        for (key, value) in digest.entries() {
            let original = env.get(&format!("{CONFIG_PREFIX}{key}")).cloned().flatten();
            prop_assert_eq!(original, Some(value.clone()));
        }
    }

    /// Every defined, prefixed variable with a non-empty suffix is extracted
    #[test]
    fn prop_no_prefixed_entry_is_lost(env in environment()) {
        let digest = ConfigurationDigest::extract(env.clone());

        let expected = env
            .iter()
            .filter(|(key, value)| {
                key.len() > CONFIG_PREFIX.len() && key.starts_with(CONFIG_PREFIX) && value.is_some()
            })
            .count();
        prop_assert_eq!(digest.len(), expected);
    }

    /// Extraction ignores the order variables are presented in
    #[test]
    fn prop_extraction_is_order_independent(env in environment()) {
        let forward = ConfigurationDigest::extract(env.clone());
        let reversed = ConfigurationDigest::extract(env.into_iter().rev());
        prop_assert_eq!(forward, reversed);
    }
}
