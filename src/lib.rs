// Copyright (c) 2025 - Cowboy AI, Inc.
//! Provisioning of a self-hosted Vaultwarden topology
//!
//! Builds an isolated network, a private image mirror, a container cluster,
//! an encrypted filesystem and a load-balanced service, in dependency order,
//! against a pluggable [`ProvisioningEngine`]. An optional custom domain adds
//! a TLS certificate whose human-gated validation blocks completion.

pub mod assembler;
pub mod authorization;
pub mod components;
pub mod config;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod events;
pub mod resource;
pub mod state_machine;

// Re-export commonly used types
pub use assembler::{AssemblyStage, AssemblyStatus, Topology, TopologyAssembler};
pub use authorization::{AuthorizationRule, AuthorizationSet, Peer};
pub use config::{AssemblyConfig, ConfigurationDigest};
pub use engine::{CertificateValidation, ProvisioningEngine, RecordingEngine, ValidationStatus};
pub use errors::{InfrastructureError, InfrastructureResult};
pub use resource::{ResourceHandle, ResourceId, ResourceRequest, ResourceSpec};
