// Copyright (c) 2025 - Cowboy AI, Inc.
//! Vaultwarden Topology Assembler
//!
//! Dry-runs the full topology against the recording engine and prints the
//! resulting endpoint, optionally followed by the JSON manifest of every
//! declared resource and authorization rule.
//!
//! Run with: cargo run --bin vaultwarden-assemble [-- --manifest]
//!
//! Environment:
//! 1. VAULTWARDEN_ACCOUNT_ID / VAULTWARDEN_REGION (or AWS_ACCOUNT_ID / AWS_REGION)
//! 2. VAULTWARDEN_BASE_VERSION, VAULTWARDEN_DOMAIN_NAME (optional)
//! 3. CONFIG_<KEY>=<value> entries passed to the server

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use vaultwarden_infrastructure::{
    AssemblyConfig, AssemblyStatus, CertificateValidation, RecordingEngine, TopologyAssembler,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let print_manifest = std::env::args().any(|arg| arg == "--manifest");

    let config = AssemblyConfig::from_env().context("Invalid assembly configuration")?;
    info!("Configuration loaded:");
    info!("  - Account: {}", config.scope.account_id().as_str());
    info!("  - Region: {}", config.scope.region());
    info!("  - Base version: {}", config.base_version);
    info!("  - Address block: {}", config.network.address_block);
    info!("  - Availability zones: {}", config.network.zones.value());
    info!("  - Workload configuration entries: {}", config.configuration.len());
    match &config.domain_name {
        Some(domain) => info!("  - Domain: {}", domain),
        None => warn!("  - Domain: none (plaintext listener)"),
    }

    let engine = Arc::new(
        RecordingEngine::new(config.scope.clone())
            .with_validation(CertificateValidation::Immediately),
    );
    let assembler = TopologyAssembler::new(engine.clone(), config);

    let mut status = assembler.subscribe();
    let watcher = tokio::spawn(async move {
        while status.changed().await.is_ok() {
            let current = status.borrow_and_update().clone();
            match &current {
                AssemblyStatus::Provisioning { stage } => info!("Stage: {:?}", stage),
                AssemblyStatus::AwaitingCertificateValidation { domain, record } => {
                    warn!("Publish {} to validate {}", record, domain)
                }
                AssemblyStatus::Completed { .. } | AssemblyStatus::Failed { .. } => break,
                AssemblyStatus::NotStarted => {}
            }
        }
    });

    let topology = assembler
        .assemble()
        .await
        .context("Topology assembly failed")?;
    watcher.await.context("Status watcher panicked")?;

    let endpoint = topology.endpoint();
    println!("{}", endpoint.description);
    println!("{}", endpoint.url());

    if print_manifest {
        let manifest = engine
            .manifest_json()
            .await
            .context("Failed to render manifest")?;
        println!("{manifest}");
    }

    Ok(())
}
