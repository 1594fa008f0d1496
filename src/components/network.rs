// Copyright (c) 2025 - Cowboy AI, Inc.
//! Isolated Network Topology
//!
//! One network, two subnet classes replicated across the availability zones,
//! no NAT egress. Workloads reach the registry, object storage and log sink
//! through private service-access endpoints placed in the isolated subnets.
//!
//! ```text
//! 20.0.0.0/24
//! ├── isolated-a 20.0.0.0/26    ┐ service, filesystem,
//! ├── isolated-b 20.0.0.64/26   ┘ private endpoints
//! ├── ingress-a  20.0.0.128/26  ┐ load balancer
//! └── ingress-b  20.0.0.192/26  ┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

use crate::authorization::{AuthorizationRule, Peer};
use crate::domain::{
    CidrBlock, NetworkError, Port, Region, Subnet, SubnetClass, ZoneCount,
};
use crate::engine::ProvisioningEngine;
use crate::errors::InfrastructureResult;
use crate::resource::{ResourceHandle, ResourceRequest, ResourceSpec, Tags};

/// Logical name of the network
pub const NETWORK_NAME: &str = "vaultwarden-network";

/// Address block and zone replication of the network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSettings {
    pub address_block: CidrBlock,
    pub zones: ZoneCount,
}

impl NetworkSettings {
    /// Subnet layout these settings produce, or why the block is too small
    pub fn layout(&self) -> Result<NetworkSpec, NetworkError> {
        NetworkSpec::new(self.address_block, self.zones)
    }
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            address_block: CidrBlock::DEFAULT,
            zones: ZoneCount::default(),
        }
    }
}

/// Declaration of the network and its subnet layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub network_name: String,
    pub address_block: CidrBlock,
    pub zones: ZoneCount,
    pub subnets: Vec<Subnet>,
    pub nat_gateways: u8,
}

impl NetworkSpec {
    /// Lay out isolated subnets first, then ingress subnets, one per zone
    pub fn new(address_block: CidrBlock, zones: ZoneCount) -> Result<Self, NetworkError> {
        let per_class = zones.value() as usize;
        let blocks = address_block.subdivide(per_class * 2)?;

        let subnets = [SubnetClass::Isolated, SubnetClass::Ingress]
            .into_iter()
            .flat_map(|class| (0..zones.value()).map(move |zone| (class, zone)))
            .zip(blocks)
            .map(|((class, zone_index), cidr)| {
                let suffix = (b'a' + zone_index) as char;
                Subnet {
                    name: format!("{}-{}", class, suffix),
                    class,
                    zone_index,
                    cidr,
                }
            })
            .collect();

        Ok(Self {
            network_name: NETWORK_NAME.to_string(),
            address_block,
            zones,
            subnets,
            nat_gateways: 0,
        })
    }

    pub fn subnets_of(&self, class: SubnetClass) -> impl Iterator<Item = &Subnet> {
        self.subnets.iter().filter(move |subnet| subnet.class == class)
    }
}

/// Managed service reachable through a private endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointService {
    /// Registry authentication API
    RegistryApi,
    /// Registry image layer transfer
    RegistryData,
    /// Object storage backing the registry layers
    ObjectStorage,
    /// Container log sink
    LogSink,
}

impl EndpointService {
    pub const ALL: [EndpointService; 4] = [
        EndpointService::RegistryApi,
        EndpointService::RegistryData,
        EndpointService::ObjectStorage,
        EndpointService::LogSink,
    ];

    fn suffix(&self) -> &'static str {
        match self {
            EndpointService::RegistryApi => "ecr.api",
            EndpointService::RegistryData => "ecr.dkr",
            EndpointService::ObjectStorage => "s3",
            EndpointService::LogSink => "logs",
        }
    }

    /// Regional service name, e.g. `com.amazonaws.eu-west-1.ecr.api`
    pub fn service_name(&self, region: &Region) -> String {
        format!("com.amazonaws.{}.{}", region, self.suffix())
    }

    pub fn endpoint_type(&self) -> EndpointType {
        match self {
            EndpointService::ObjectStorage => EndpointType::Gateway,
            _ => EndpointType::Interface,
        }
    }

    pub fn logical_name(&self) -> String {
        format!("{}-endpoint", self.suffix().replace('.', "-"))
    }
}

impl fmt::Display for EndpointService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointService::RegistryApi => write!(f, "registry-api"),
            EndpointService::RegistryData => write!(f, "registry-data"),
            EndpointService::ObjectStorage => write!(f, "object-storage"),
            EndpointService::LogSink => write!(f, "log-sink"),
        }
    }
}

/// How an endpoint is attached to the network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointType {
    /// Network interface in each subnet, reached over TCP 443
    Interface,
    /// Route table entry, no port-level rule
    Gateway,
}

/// Declaration of a private service-access endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointSpec {
    pub service: EndpointService,
    pub service_name: String,
    pub endpoint_type: EndpointType,
    pub private_dns: bool,
    pub subnet_class: SubnetClass,
}

impl EndpointSpec {
    pub fn new(service: EndpointService, region: &Region) -> Self {
        let endpoint_type = service.endpoint_type();
        Self {
            service,
            service_name: service.service_name(region),
            endpoint_type,
            private_dns: endpoint_type == EndpointType::Interface,
            subnet_class: SubnetClass::Isolated,
        }
    }
}

/// A provisioned private endpoint
#[derive(Debug)]
pub struct PrivateEndpoint {
    service: EndpointService,
    endpoint_type: EndpointType,
    handle: ResourceHandle,
}

impl PrivateEndpoint {
    pub fn service(&self) -> EndpointService {
        self.service
    }

    pub fn handle(&self) -> &ResourceHandle {
        &self.handle
    }

    /// Port consumers connect on, if the endpoint is port-addressable
    pub fn default_port(&self) -> Option<Port> {
        match self.endpoint_type {
            EndpointType::Interface => Some(Port::HTTPS),
            EndpointType::Gateway => None,
        }
    }

    /// Rule granting `consumer` reachability on the endpoint's default port
    ///
    /// Gateway endpoints have no port and yield `None`.
    pub fn allow_default_access_from(&self, consumer: &ResourceHandle) -> Option<AuthorizationRule> {
        self.default_port().map(|port| {
            AuthorizationRule::tcp(Peer::of(consumer), Peer::of(&self.handle), port)
        })
    }
}

/// The provisioned network and its endpoints
#[derive(Debug)]
pub struct NetworkTopology {
    handle: ResourceHandle,
    subnets: Vec<Subnet>,
    endpoints: Vec<PrivateEndpoint>,
}

impl NetworkTopology {
    /// Provision the network, then one endpoint per [`EndpointService`]
    pub async fn provision<E>(
        engine: &E,
        settings: &NetworkSettings,
        region: &Region,
        tags: &Tags,
    ) -> InfrastructureResult<Self>
    where
        E: ProvisioningEngine + ?Sized,
    {
        let spec = settings.layout()?;
        let subnets = spec.subnets.clone();

        let handle = engine
            .provision(
                ResourceRequest::new(NETWORK_NAME, ResourceSpec::Network(spec)).with_tags(tags),
            )
            .await?;

        info!(
            id = %handle.id(),
            block = %settings.address_block,
            zones = settings.zones.value(),
            "Network provisioned"
        );

        let mut endpoints = Vec::with_capacity(EndpointService::ALL.len());
        for service in EndpointService::ALL {
            let spec = EndpointSpec::new(service, region);
            let endpoint_type = spec.endpoint_type;
            let endpoint = engine
                .provision(
                    ResourceRequest::new(service.logical_name(), ResourceSpec::PrivateEndpoint(spec))
                        .depends_on(&handle)
                        .with_tags(tags),
                )
                .await?;
            debug!(service = %service, id = %endpoint.id(), "Private endpoint provisioned");
            endpoints.push(PrivateEndpoint {
                service,
                endpoint_type,
                handle: endpoint,
            });
        }

        Ok(Self {
            handle,
            subnets,
            endpoints,
        })
    }

    pub fn handle(&self) -> &ResourceHandle {
        &self.handle
    }

    pub fn subnets(&self) -> &[Subnet] {
        &self.subnets
    }

    pub fn subnets_of(&self, class: SubnetClass) -> impl Iterator<Item = &Subnet> {
        self.subnets.iter().filter(move |subnet| subnet.class == class)
    }

    pub fn endpoints(&self) -> &[PrivateEndpoint] {
        &self.endpoints
    }

    pub fn endpoint(&self, service: EndpointService) -> Option<&PrivateEndpoint> {
        self.endpoints
            .iter()
            .find(|endpoint| endpoint.service == service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_layout() {
        let spec = NetworkSpec::new(CidrBlock::DEFAULT, ZoneCount::default()).unwrap();

        let names: Vec<_> = spec.subnets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["isolated-a", "isolated-b", "ingress-a", "ingress-b"]);

        let blocks: Vec<_> = spec.subnets.iter().map(|s| s.cidr.to_string()).collect();
        assert_eq!(
            blocks,
            vec!["20.0.0.0/26", "20.0.0.64/26", "20.0.0.128/26", "20.0.0.192/26"]
        );
        assert_eq!(spec.nat_gateways, 0);
        assert_eq!(spec.subnets_of(SubnetClass::Ingress).count(), 2);
    }

    #[test]
    fn test_three_zones() {
        let spec = NetworkSpec::new(
            CidrBlock::new("10.0.0.0/24").unwrap(),
            ZoneCount::new(3).unwrap(),
        )
        .unwrap();

        assert_eq!(spec.subnets.len(), 6);
        assert_eq!(spec.subnets[2].name, "isolated-c");
        assert_eq!(spec.subnets[3].name, "ingress-a");
        assert_eq!(spec.subnets[0].cidr.prefix_length(), 27);
    }

    #[test]
    fn test_block_too_small() {
        let result = NetworkSpec::new(
            CidrBlock::new("10.0.0.0/27").unwrap(),
            ZoneCount::new(6).unwrap(),
        );
        assert!(matches!(
            result,
            Err(NetworkError::InsufficientAddressSpace { .. })
        ));
    }

    #[test]
    fn test_endpoint_specs() {
        let region = Region::new("eu-west-1").unwrap();

        let api = EndpointSpec::new(EndpointService::RegistryApi, &region);
        assert_eq!(api.service_name, "com.amazonaws.eu-west-1.ecr.api");
        assert_eq!(api.endpoint_type, EndpointType::Interface);
        assert!(api.private_dns);
        assert_eq!(api.subnet_class, SubnetClass::Isolated);

        let s3 = EndpointSpec::new(EndpointService::ObjectStorage, &region);
        assert_eq!(s3.service_name, "com.amazonaws.eu-west-1.s3");
        assert_eq!(s3.endpoint_type, EndpointType::Gateway);
        assert!(!s3.private_dns);

        assert_eq!(EndpointService::RegistryData.logical_name(), "ecr-dkr-endpoint");
    }

    #[test]
    fn test_default_settings() {
        let settings = NetworkSettings::default();
        assert_eq!(settings.address_block.to_string(), "20.0.0.0/24");
        assert_eq!(settings.zones.value(), 2);
    }
}
