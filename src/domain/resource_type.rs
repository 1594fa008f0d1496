// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Kind Taxonomy
//!
//! The fixed vocabulary of resources the topology is made of. Each kind
//! carries its placement rule: compute and storage live in isolated subnets,
//! only the load balancer sits in the ingress subnets.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::network::SubnetClass;

/// Kind of a provisioned resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    // Network
    /// Isolated virtual network with its subnets
    Network,
    /// Private service-access endpoint inside the network
    PrivateEndpoint,

    // Registry
    /// Private image repository
    Repository,
    /// One-time copy of a public image into the repository
    ImageCopy,

    // Compute
    /// Container scheduling cluster
    Cluster,
    /// Load-balanced container service
    Service,

    // Storage
    /// Encrypted network filesystem
    FileSystem,

    // Security
    /// Public TLS certificate
    Certificate,
    /// Identity assumed by the scheduler to pull and start containers
    ExecutionRole,
    /// Read-only pull permission on the repository
    PullGrant,

    // Edge
    /// Public load balancer
    LoadBalancer,
}

impl ResourceKind {
    /// Get the canonical string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::PrivateEndpoint => "private_endpoint",
            Self::Repository => "repository",
            Self::ImageCopy => "image_copy",
            Self::Cluster => "cluster",
            Self::Service => "service",
            Self::FileSystem => "file_system",
            Self::Certificate => "certificate",
            Self::ExecutionRole => "execution_role",
            Self::PullGrant => "pull_grant",
            Self::LoadBalancer => "load_balancer",
        }
    }

    /// Get human-readable display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Network => "Network",
            Self::PrivateEndpoint => "Private Endpoint",
            Self::Repository => "Image Repository",
            Self::ImageCopy => "Image Copy",
            Self::Cluster => "Cluster",
            Self::Service => "Container Service",
            Self::FileSystem => "Network File System",
            Self::Certificate => "TLS Certificate",
            Self::ExecutionRole => "Execution Role",
            Self::PullGrant => "Pull Grant",
            Self::LoadBalancer => "Load Balancer",
        }
    }

    /// Subnet class this kind must be placed in, if it is placed at all
    pub fn required_placement(&self) -> Option<SubnetClass> {
        match self {
            Self::PrivateEndpoint | Self::Service | Self::FileSystem => {
                Some(SubnetClass::Isolated)
            }
            Self::LoadBalancer => Some(SubnetClass::Ingress),
            Self::Network
            | Self::Repository
            | Self::ImageCopy
            | Self::Cluster
            | Self::Certificate
            | Self::ExecutionRole
            | Self::PullGrant => None,
        }
    }

    /// Whether resources of this kind accept network authorization rules
    pub fn is_network_reachable(&self) -> bool {
        matches!(
            self,
            Self::PrivateEndpoint
                | Self::Cluster
                | Self::Service
                | Self::FileSystem
                | Self::LoadBalancer
        )
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
