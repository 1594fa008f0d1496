// Copyright (c) 2025 - Cowboy AI, Inc.
//! Assembly Configuration
//!
//! Two things are read from the environment:
//!
//! - [`AssemblyConfig`]: the knobs of the topology itself (image version,
//!   optional domain, account scope, address block, zone count)
//! - [`ConfigurationDigest`]: every `CONFIG_<KEY>=<value>` entry, prefix
//!   stripped, injected verbatim into the workload's environment
//!
//! Both have a pure variant taking an explicit snapshot so they can be tested
//! without touching the process environment. All validation happens here,
//! before any resource is declared.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::components::network::NetworkSettings;
use crate::domain::{
    AccountId, AccountScope, CidrBlock, DomainName, ImageVersion, Region, ZoneCount,
};
use crate::errors::{InfrastructureError, InfrastructureResult};
use crate::resource::Tags;

/// Prefix marking an entry as workload configuration
pub const CONFIG_PREFIX: &str = "CONFIG_";

pub const BASE_VERSION_VAR: &str = "VAULTWARDEN_BASE_VERSION";
pub const DOMAIN_NAME_VAR: &str = "VAULTWARDEN_DOMAIN_NAME";
pub const ACCOUNT_ID_VAR: &str = "VAULTWARDEN_ACCOUNT_ID";
pub const REGION_VAR: &str = "VAULTWARDEN_REGION";
pub const ADDRESS_BLOCK_VAR: &str = "VAULTWARDEN_ADDRESS_BLOCK";
pub const AVAILABILITY_ZONES_VAR: &str = "VAULTWARDEN_AVAILABILITY_ZONES";
pub const CERTIFICATE_POLL_SECONDS_VAR: &str = "VAULTWARDEN_CERTIFICATE_POLL_SECONDS";

const ACCOUNT_ID_FALLBACK_VAR: &str = "AWS_ACCOUNT_ID";
const REGION_FALLBACK_VAR: &str = "AWS_REGION";

/// Seconds between certificate status polls when not configured
pub const DEFAULT_CERTIFICATE_POLL_SECONDS: u64 = 30;

/// Tag key naming the application
pub const APPLICATION_TAG: &str = "x:application";
/// Tag key naming the stack
pub const STACK_TAG: &str = "x:stack";
/// Value of both tags
pub const TAG_VALUE: &str = "vaultwarden";

/// Workload configuration derived from `CONFIG_`-prefixed entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigurationDigest(BTreeMap<String, String>);

impl ConfigurationDigest {
    pub const fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Keep prefixed entries with a defined value, prefix stripped
    ///
    /// Key casing is preserved. A key consisting of the prefix alone has
    /// nothing left to name and is skipped.
    pub fn extract<I, K, V>(environment: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<V>)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self(
            environment
                .into_iter()
                .filter_map(|(key, value)| {
                    let stripped = key.as_ref().strip_prefix(CONFIG_PREFIX)?;
                    if stripped.is_empty() {
                        return None;
                    }
                    Some((stripped.to_string(), value?.into()))
                })
                .collect(),
        )
    }

    /// Extract from the current process environment
    ///
    /// Values that are not valid Unicode count as undefined.
    pub fn from_process_env() -> Self {
        Self::extract(std::env::vars_os().filter_map(|(key, value)| {
            key.into_string()
                .ok()
                .map(|key| (key, value.into_string().ok()))
        }))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ConfigurationDigest {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

fn non_empty<'a>(environment: &'a BTreeMap<String, String>, name: &str) -> Option<&'a str> {
    environment
        .get(name)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

/// Tags applied at the application level
pub fn default_tags() -> Tags {
    Tags::from([(APPLICATION_TAG.to_string(), TAG_VALUE.to_string())])
}

/// Everything one assembly needs to know up front
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyConfig {
    pub base_version: ImageVersion,
    pub domain_name: Option<DomainName>,
    pub scope: AccountScope,
    pub network: NetworkSettings,
    pub configuration: ConfigurationDigest,
    pub certificate_poll_interval: Duration,
    pub tags: Tags,
}

impl AssemblyConfig {
    /// Defaults for everything but the account scope
    pub fn new(scope: AccountScope) -> Self {
        Self {
            base_version: ImageVersion::latest(),
            domain_name: None,
            scope,
            network: NetworkSettings::default(),
            configuration: ConfigurationDigest::empty(),
            certificate_poll_interval: Duration::from_secs(DEFAULT_CERTIFICATE_POLL_SECONDS),
            tags: default_tags(),
        }
    }

    pub fn with_domain_name(mut self, domain_name: DomainName) -> Self {
        self.domain_name = Some(domain_name);
        self
    }

    pub fn with_base_version(mut self, version: ImageVersion) -> Self {
        self.base_version = version;
        self
    }

    pub fn with_configuration(mut self, configuration: ConfigurationDigest) -> Self {
        self.configuration = configuration;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.certificate_poll_interval = interval;
        self
    }

    /// Load configuration from the process environment
    pub fn from_env() -> InfrastructureResult<Self> {
        Self::from_environment(std::env::vars_os().filter_map(|(key, value)| {
            Some((key.into_string().ok()?, value.into_string().ok()?))
        }))
    }

    /// Load configuration from an explicit environment snapshot
    pub fn from_environment<I, K, V>(environment: I) -> InfrastructureResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let environment: BTreeMap<String, String> = environment
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        let lookup = |name: &str| non_empty(&environment, name);

        let account_id = lookup(ACCOUNT_ID_VAR)
            .or_else(|| lookup(ACCOUNT_ID_FALLBACK_VAR))
            .ok_or_else(|| {
                InfrastructureError::Configuration(format!(
                    "{ACCOUNT_ID_VAR} (or {ACCOUNT_ID_FALLBACK_VAR}) is not set"
                ))
            })?;
        let region = lookup(REGION_VAR)
            .or_else(|| lookup(REGION_FALLBACK_VAR))
            .ok_or_else(|| {
                InfrastructureError::Configuration(format!(
                    "{REGION_VAR} (or {REGION_FALLBACK_VAR}) is not set"
                ))
            })?;
        let scope = AccountScope::new(AccountId::new(account_id)?, Region::new(region)?);

        let base_version = lookup(BASE_VERSION_VAR)
            .map(ImageVersion::new)
            .transpose()?
            .unwrap_or_default();

        let domain_name = DomainName::parse_optional(lookup(DOMAIN_NAME_VAR))?;

        let address_block = lookup(ADDRESS_BLOCK_VAR)
            .map(CidrBlock::new)
            .transpose()?
            .unwrap_or(CidrBlock::DEFAULT);

        let zones = match lookup(AVAILABILITY_ZONES_VAR) {
            Some(raw) => ZoneCount::new(raw.parse().map_err(|_| {
                InfrastructureError::Configuration(format!(
                    "{AVAILABILITY_ZONES_VAR} must be a number, got '{raw}'"
                ))
            })?)?,
            None => ZoneCount::default(),
        };

        let network = NetworkSettings {
            address_block,
            zones,
        };
        network.layout()?;

        let poll_seconds = match lookup(CERTIFICATE_POLL_SECONDS_VAR) {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|seconds| *seconds >= 1)
                .ok_or_else(|| {
                    InfrastructureError::Configuration(format!(
                        "{CERTIFICATE_POLL_SECONDS_VAR} must be a positive number, got '{raw}'"
                    ))
                })?,
            None => DEFAULT_CERTIFICATE_POLL_SECONDS,
        };

        let configuration = ConfigurationDigest::extract(
            environment
                .iter()
                .map(|(key, value)| (key.as_str(), Some(value.as_str()))),
        );

        Ok(Self {
            base_version,
            domain_name,
            scope,
            network,
            configuration,
            certificate_poll_interval: Duration::from_secs(poll_seconds),
            tags: default_tags(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn base() -> Vec<(&'static str, &'static str)> {
        vec![
            ("VAULTWARDEN_ACCOUNT_ID", "123456789012"),
            ("VAULTWARDEN_REGION", "eu-west-1"),
        ]
    }

    #[test]
    fn test_extract_prefixed_defined_entries() {
        let digest = ConfigurationDigest::extract([
            ("CONFIG_SENDS_ALLOWED", Some("true")),
            ("OTHER_VAR", Some("ignored")),
        ]);

        assert_eq!(
            digest,
            ConfigurationDigest::from_iter([("SENDS_ALLOWED", "true")])
        );
    }

    #[test]
    fn test_extract_skips_undefined_and_bare_prefix() {
        let digest = ConfigurationDigest::extract([
            ("CONFIG_SIGNUPS_ALLOWED", None),
            ("CONFIG_", Some("nothing")),
            ("CONFIG_Domain", Some("https://vault.example.com")),
            ("config_lower", Some("ignored")),
        ]);

        assert_eq!(digest.len(), 1);
        assert_eq!(digest.get("Domain"), Some("https://vault.example.com"));
    }

    #[test]
    fn test_extract_empty() {
        let digest = ConfigurationDigest::extract(Vec::<(String, Option<String>)>::new());
        assert!(digest.is_empty());
    }

    #[test]
    fn test_defaults() {
        let config = AssemblyConfig::from_environment(base()).unwrap();

        assert!(config.base_version.is_floating());
        assert_eq!(config.domain_name, None);
        assert_eq!(config.network, NetworkSettings::default());
        assert_eq!(config.certificate_poll_interval, Duration::from_secs(30));
        assert_eq!(config.tags.get(APPLICATION_TAG).map(String::as_str), Some(TAG_VALUE));
        assert!(config.configuration.is_empty());
    }

    #[test]
    fn test_full_environment() {
        let mut env = base();
        env.extend([
            ("VAULTWARDEN_BASE_VERSION", "1.32.0"),
            ("VAULTWARDEN_DOMAIN_NAME", "Vault.Example.com."),
            ("VAULTWARDEN_ADDRESS_BLOCK", "10.20.0.0/22"),
            ("VAULTWARDEN_AVAILABILITY_ZONES", "3"),
            ("VAULTWARDEN_CERTIFICATE_POLL_SECONDS", "5"),
            ("CONFIG_SIGNUPS_ALLOWED", "false"),
        ]);

        let config = AssemblyConfig::from_environment(env).unwrap();

        assert_eq!(config.base_version.as_str(), "1.32.0");
        assert_eq!(
            config.domain_name.as_ref().map(DomainName::as_str),
            Some("vault.example.com")
        );
        assert_eq!(config.network.address_block.to_string(), "10.20.0.0/22");
        assert_eq!(config.network.zones.value(), 3);
        assert_eq!(config.certificate_poll_interval, Duration::from_secs(5));
        assert_eq!(config.configuration.get("SIGNUPS_ALLOWED"), Some("false"));
    }

    #[test]
    fn test_fallback_scope_variables() {
        let config = AssemblyConfig::from_environment([
            ("AWS_ACCOUNT_ID", "210987654321"),
            ("AWS_REGION", "us-east-1"),
        ])
        .unwrap();

        assert_eq!(config.scope.account_id().as_str(), "210987654321");
        assert_eq!(config.scope.region().as_str(), "us-east-1");
    }

    #[test]
    fn test_empty_domain_is_absent() {
        let mut env = base();
        env.push(("VAULTWARDEN_DOMAIN_NAME", "  "));
        let config = AssemblyConfig::from_environment(env).unwrap();
        assert_eq!(config.domain_name, None);
    }

    #[test]
    fn test_invalid_values_are_configuration_errors() {
        for (key, value) in [
            ("VAULTWARDEN_DOMAIN_NAME", "localhost"),
            ("VAULTWARDEN_ADDRESS_BLOCK", "20.0.0.1/24"),
            ("VAULTWARDEN_AVAILABILITY_ZONES", "7"),
            ("VAULTWARDEN_AVAILABILITY_ZONES", "two"),
            ("VAULTWARDEN_CERTIFICATE_POLL_SECONDS", "0"),
            ("VAULTWARDEN_BASE_VERSION", "1.0:2"),
        ] {
            let mut env = base();
            env.push((key, value));
            let error = AssemblyConfig::from_environment(env).unwrap_err();
            assert!(error.is_configuration(), "{key}={value} gave {error}");
        }
    }

    #[test]
    fn test_block_too_small_for_zones() {
        for (block, zones) in [("20.0.0.0/27", None), ("20.0.0.0/26", Some("3"))] {
            let mut env = base();
            env.push(("VAULTWARDEN_ADDRESS_BLOCK", block));
            if let Some(zones) = zones {
                env.push(("VAULTWARDEN_AVAILABILITY_ZONES", zones));
            }
            let error = AssemblyConfig::from_environment(env).unwrap_err();
            assert!(error.is_configuration(), "{block} x {zones:?} gave {error}");
            assert!(error.to_string().contains(block));
        }

        let mut env = base();
        env.push(("VAULTWARDEN_ADDRESS_BLOCK", "20.0.0.0/26"));
        assert!(AssemblyConfig::from_environment(env).is_ok());
    }

    #[test]
    fn test_missing_scope() {
        let error =
            AssemblyConfig::from_environment([("VAULTWARDEN_REGION", "eu-west-1")]).unwrap_err();
        assert!(error.is_configuration());
        assert!(error.to_string().contains("VAULTWARDEN_ACCOUNT_ID"));
    }
}
