// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Components
//!
//! Each component turns its inputs into declarations, hands them to a
//! [`ProvisioningEngine`](crate::engine::ProvisioningEngine) and keeps the
//! returned handles. Components are constructed leaf-first; a component can
//! only be built from the handles of the components it depends on.
//!
//! ```text
//! NetworkTopology ──┬──▶ Cluster ─────────┐
//!                   └──▶ PersistentVolume ─┤
//! RegistryMirror ─────────────────────────┼──▶ WorkloadService
//! CertificateBranch ──────────────────────┤
//! ConfigurationDigest ────────────────────┘
//! ```

pub mod certificate;
pub mod cluster;
pub mod network;
pub mod registry;
pub mod service;
pub mod volume;

pub use certificate::{CertificateBranch, CertificateRequest, ListenerMode, ValidationRecord};
pub use cluster::Cluster;
pub use network::{EndpointService, NetworkSettings, NetworkTopology, PrivateEndpoint};
pub use registry::RegistryMirror;
pub use service::{ServiceDependencies, ServiceEndpoint, WorkloadService};
pub use volume::PersistentVolume;
