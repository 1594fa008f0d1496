// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for vaultwarden-infrastructure
//!
//! Deterministic account scope, domain and configuration used by the
//! integration tests. Resource ids are issued by the engine and therefore
//! never fixed here; tests compare kinds, names and relations instead.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use vaultwarden_infrastructure::config::ConfigurationDigest;
use vaultwarden_infrastructure::domain::{AccountId, AccountScope, DomainName, ImageVersion, Region};
use vaultwarden_infrastructure::{AssemblyConfig, CertificateValidation, RecordingEngine};

pub const ACCOUNT_ID: &str = "123456789012";
pub const REGION: &str = "eu-west-1";
pub const DOMAIN: &str = "vault.example.com";
pub const PINNED_VERSION: &str = "1.32.0";

/// Poll interval short enough to keep paused-clock tests fast
pub const FAST_POLL: Duration = Duration::from_millis(10);

pub fn scope() -> AccountScope {
    AccountScope::new(
        AccountId::new(ACCOUNT_ID).expect("Invalid account id in test fixture"),
        Region::new(REGION).expect("Invalid region in test fixture"),
    )
}

pub fn domain() -> DomainName {
    DomainName::new(DOMAIN).expect("Invalid domain in test fixture")
}

/// Configuration without a domain: plaintext branch
pub fn plaintext_config() -> AssemblyConfig {
    AssemblyConfig::new(scope())
        .with_base_version(ImageVersion::new(PINNED_VERSION).expect("Invalid version in test fixture"))
        .with_poll_interval(FAST_POLL)
}

/// Configuration with [`DOMAIN`]: TLS branch
pub fn tls_config() -> AssemblyConfig {
    plaintext_config().with_domain_name(domain())
}

pub fn workload_configuration() -> ConfigurationDigest {
    ConfigurationDigest::extract([
        ("CONFIG_SIGNUPS_ALLOWED", Some("false")),
        ("CONFIG_DOMAIN", Some("https://vault.example.com")),
        ("CONFIG_ADMIN_TOKEN", None),
        ("HOME", Some("/root")),
    ])
}

pub fn engine(validation: CertificateValidation) -> Arc<RecordingEngine> {
    Arc::new(RecordingEngine::new(scope()).with_validation(validation))
}
