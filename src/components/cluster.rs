// Copyright (c) 2025 - Cowboy AI, Inc.
//! Container Scheduling Cluster
//!
//! The cluster is the consumer of the registry and log-sink endpoints: once
//! it exists, it is granted reachability to each of them on their default
//! port. The object-storage gateway endpoint needs no rule.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::authorization::AuthorizationSet;
use crate::components::network::{EndpointService, NetworkTopology};
use crate::domain::ResourceKind;
use crate::engine::ProvisioningEngine;
use crate::errors::{InfrastructureError, InfrastructureResult};
use crate::resource::{ResourceHandle, ResourceRequest, ResourceSpec, Tags};

/// Logical name of the cluster
pub const CLUSTER_NAME: &str = "vaultwarden-cluster";

/// Endpoints the cluster must reach to pull images and ship logs
pub const CONSUMED_ENDPOINTS: [EndpointService; 3] = [
    EndpointService::RegistryApi,
    EndpointService::RegistryData,
    EndpointService::LogSink,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityProvider {
    /// Serverless container capacity
    Fargate,
}

/// Declaration of the cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSpec {
    pub cluster_name: String,
    pub capacity: CapacityProvider,
    pub container_insights: bool,
}

impl Default for ClusterSpec {
    fn default() -> Self {
        Self {
            cluster_name: CLUSTER_NAME.to_string(),
            capacity: CapacityProvider::Fargate,
            container_insights: false,
        }
    }
}

/// The provisioned cluster
#[derive(Debug)]
pub struct Cluster {
    handle: ResourceHandle,
}

impl Cluster {
    /// Provision the cluster and authorize it towards the consumed endpoints
    pub async fn provision<E>(
        engine: &E,
        network: &NetworkTopology,
        rules: &mut AuthorizationSet,
        tags: &Tags,
    ) -> InfrastructureResult<Self>
    where
        E: ProvisioningEngine + ?Sized,
    {
        let handle = engine
            .provision(
                ResourceRequest::new(CLUSTER_NAME, ResourceSpec::Cluster(ClusterSpec::default()))
                    .depends_on(network.handle())
                    .with_tags(tags),
            )
            .await?;

        info!(id = %handle.id(), "Cluster provisioned");

        for service in CONSUMED_ENDPOINTS {
            let endpoint = network
                .endpoint(service)
                .ok_or(InfrastructureError::MissingDependency(ResourceKind::PrivateEndpoint))?;
            if let Some(rule) = endpoint.allow_default_access_from(&handle) {
                engine.authorize(&rule).await?;
                debug!(rule = %rule, "Endpoint access authorized");
                rules.allow(rule);
            }
        }

        Ok(Self { handle })
    }

    pub fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}
