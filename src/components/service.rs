// Copyright (c) 2025 - Cowboy AI, Inc.
//! Load-Balanced Workload Service
//!
//! Composes the cluster, the mirrored image, the persistent volume and the
//! certificate branch into one running, internet-reachable service.
//!
//! # Provisioning Order
//!
//! 1. Execution role and its repository-scoped pull grant
//! 2. Public load balancer in the ingress subnets
//! 3. Service in the isolated subnets, bound to the volume
//! 4. Service ↔ filesystem NFS rules, validated in both directions
//! 5. Load balancer → service on the container port
//! 6. Internet → load balancer on the listener port, last
//!
//! Public ingress is opened only once everything behind it exists.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, warn};

use crate::authorization::{AuthorizationRule, AuthorizationSet, Peer};
use crate::components::certificate::{CertificateBranch, ListenerMode};
use crate::components::cluster::Cluster;
use crate::components::registry::RegistryMirror;
use crate::components::volume::PersistentVolume;
use crate::config::ConfigurationDigest;
use crate::domain::invariants::{validate_mount_authorization, validate_private_image};
use crate::domain::{ImageReference, Port, Protocol, ResourceKind, SubnetClass};
use crate::engine::ProvisioningEngine;
use crate::errors::{InfrastructureError, InfrastructureResult};
use crate::resource::{
    attributes, ResourceHandle, ResourceId, ResourceRequest, ResourceSpec, Tags,
};

/// Logical name of the service
pub const SERVICE_NAME: &str = "vaultwarden-service";
/// Logical name of the load balancer
pub const LOAD_BALANCER_NAME: &str = "vaultwarden-load-balancer";
/// Logical name of the execution role
pub const EXECUTION_ROLE_NAME: &str = "vaultwarden-task-execution-role";
/// Logical name of the pull grant
pub const PULL_GRANT_NAME: &str = "vaultwarden-image-pull";

/// CPU units reserved per task (a quarter vCPU)
pub const TASK_CPU: u32 = 256;
/// Memory reserved per task in MiB
pub const TASK_MEMORY_MIB: u32 = 512;
/// Number of tasks kept running
pub const DESIRED_COUNT: u32 = 1;
/// Port the container listens on
pub const CONTAINER_PORT: Port = Port::HTTP;
/// Name shared by the task volume and the container mount
pub const VOLUME_NAME: &str = "efs";
/// Directory the server writes its data to
pub const DATA_PATH: &str = "/data";
/// Principal allowed to assume the execution role
pub const TASK_SERVICE_PRINCIPAL: &str = "ecs-tasks.amazonaws.com";
/// Registry actions needed to pull an image
pub const PULL_ACTIONS: [&str; 3] = [
    "ecr:BatchCheckLayerAvailability",
    "ecr:GetDownloadUrlForLayer",
    "ecr:BatchGetImage",
];
/// Description attached to the published endpoint
pub const ENDPOINT_DESCRIPTION: &str =
    "The DNS name of the load balancer deployed for the Vaultwarden service.";

/// Declaration of the task execution identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRoleSpec {
    pub assumed_by: String,
}

/// Declaration of read-only pull access to one repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullGrantSpec {
    pub role: ResourceId,
    pub repository: String,
    pub actions: Vec<String>,
}

/// Public listener of the load balancer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListenerSpec {
    pub mode: ListenerMode,
    pub port: Port,
    pub certificate: Option<ResourceId>,
}

/// Declaration of the public load balancer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadBalancerSpec {
    pub internet_facing: bool,
    pub subnet_class: SubnetClass,
    pub listener: ListenerSpec,
    pub target_port: Port,
}

/// Container mount of the task volume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MountPoint {
    pub source_volume: String,
    pub container_path: String,
    pub read_only: bool,
}

/// Task volume backed by the network filesystem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeBinding {
    pub name: String,
    pub file_system_id: String,
    pub transit_encryption: bool,
}

/// The single container of the task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerSpec {
    pub image: String,
    pub port: Port,
    pub environment: BTreeMap<String, String>,
    pub mount: MountPoint,
}

/// Declaration of the scheduled service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub cpu: u32,
    pub memory_mib: u32,
    pub desired_count: u32,
    pub execution_role: ResourceId,
    pub container: ContainerSpec,
    pub volume: VolumeBinding,
    pub subnet_class: SubnetClass,
    pub assign_public_ip: bool,
}

/// Everything a [`WorkloadService`] is composed from
#[derive(Debug, Clone, Copy)]
pub struct ServiceDependencies<'a> {
    pub cluster: &'a Cluster,
    pub registry: &'a RegistryMirror,
    pub volume: &'a PersistentVolume,
    pub certificate: &'a CertificateBranch,
    pub configuration: &'a ConfigurationDigest,
}

impl<'a> ServiceDependencies<'a> {
    pub fn builder() -> ServiceDependenciesBuilder<'a> {
        ServiceDependenciesBuilder::default()
    }
}

/// Collects dependencies in any order; `build` reports the first one missing
#[derive(Debug, Default)]
pub struct ServiceDependenciesBuilder<'a> {
    cluster: Option<&'a Cluster>,
    registry: Option<&'a RegistryMirror>,
    volume: Option<&'a PersistentVolume>,
    certificate: Option<&'a CertificateBranch>,
    configuration: Option<&'a ConfigurationDigest>,
}

impl<'a> ServiceDependenciesBuilder<'a> {
    pub fn cluster(mut self, cluster: &'a Cluster) -> Self {
        self.cluster = Some(cluster);
        self
    }

    pub fn registry(mut self, registry: &'a RegistryMirror) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn volume(mut self, volume: &'a PersistentVolume) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn certificate(mut self, certificate: &'a CertificateBranch) -> Self {
        self.certificate = Some(certificate);
        self
    }

    pub fn configuration(mut self, configuration: &'a ConfigurationDigest) -> Self {
        self.configuration = Some(configuration);
        self
    }

    pub fn build(self) -> InfrastructureResult<ServiceDependencies<'a>> {
        static EMPTY: ConfigurationDigest = ConfigurationDigest::empty();

        Ok(ServiceDependencies {
            cluster: self
                .cluster
                .ok_or(InfrastructureError::MissingDependency(ResourceKind::Cluster))?,
            registry: self
                .registry
                .ok_or(InfrastructureError::MissingDependency(ResourceKind::ImageCopy))?,
            volume: self
                .volume
                .ok_or(InfrastructureError::MissingDependency(ResourceKind::FileSystem))?,
            certificate: self
                .certificate
                .ok_or(InfrastructureError::MissingDependency(ResourceKind::Certificate))?,
            configuration: self.configuration.unwrap_or(&EMPTY),
        })
    }
}

/// Public address of the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    pub dns_name: String,
    pub scheme: String,
    pub port: Port,
    pub description: String,
}

impl ServiceEndpoint {
    /// `scheme://dns_name`
    pub fn url(&self) -> String {
        format!("{}://{}", self.scheme, self.dns_name)
    }
}

impl fmt::Display for ServiceEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}

/// The provisioned service and everything it owns
#[derive(Debug)]
pub struct WorkloadService {
    execution_role: ResourceHandle,
    pull_grant: ResourceHandle,
    load_balancer: ResourceHandle,
    service: ResourceHandle,
    listener: ListenerMode,
    endpoint: ServiceEndpoint,
}

impl WorkloadService {
    pub async fn provision<E>(
        engine: &E,
        dependencies: ServiceDependencies<'_>,
        rules: &mut AuthorizationSet,
        tags: &Tags,
    ) -> InfrastructureResult<Self>
    where
        E: ProvisioningEngine + ?Sized,
    {
        let ServiceDependencies {
            cluster,
            registry,
            volume,
            certificate,
            configuration,
        } = dependencies;

        let (listener, certificate_handle) = match certificate {
            CertificateBranch::Absent => {
                warn!("Service will be published without TLS");
                (ListenerMode::Plaintext, None)
            }
            CertificateBranch::Pending(request) => {
                return Err(InfrastructureError::CertificateNotValidated(
                    request.domain().to_string(),
                ));
            }
            CertificateBranch::Validated(request) => (ListenerMode::Tls, Some(request.handle())),
        };

        let image = ImageReference::from(registry.image().clone());
        validate_private_image(&image)?;

        let execution_role = engine
            .provision(
                ResourceRequest::new(
                    EXECUTION_ROLE_NAME,
                    ResourceSpec::ExecutionRole(ExecutionRoleSpec {
                        assumed_by: TASK_SERVICE_PRINCIPAL.to_string(),
                    }),
                )
                .with_tags(tags),
            )
            .await?;

        let pull_grant = engine
            .provision(
                ResourceRequest::new(
                    PULL_GRANT_NAME,
                    ResourceSpec::PullGrant(PullGrantSpec {
                        role: execution_role.id(),
                        repository: registry.repository().physical_id().to_string(),
                        actions: PULL_ACTIONS.iter().map(|a| a.to_string()).collect(),
                    }),
                )
                .depends_on(&execution_role)
                .depends_on(registry.repository())
                .with_tags(tags),
            )
            .await?;

        let mut lb_request = ResourceRequest::new(
            LOAD_BALANCER_NAME,
            ResourceSpec::LoadBalancer(LoadBalancerSpec {
                internet_facing: true,
                subnet_class: SubnetClass::Ingress,
                listener: ListenerSpec {
                    mode: listener,
                    port: listener.port(),
                    certificate: certificate_handle.map(ResourceHandle::id),
                },
                target_port: CONTAINER_PORT,
            }),
        )
        .with_tags(tags);
        if let Some(handle) = certificate_handle {
            lb_request = lb_request.depends_on(handle);
        }
        let load_balancer = engine.provision(lb_request).await?;
        let dns_name = load_balancer
            .require_attribute(attributes::DNS_NAME)?
            .to_string();

        let service = engine
            .provision(
                ResourceRequest::new(
                    SERVICE_NAME,
                    ResourceSpec::Service(ServiceSpec {
                        cpu: TASK_CPU,
                        memory_mib: TASK_MEMORY_MIB,
                        desired_count: DESIRED_COUNT,
                        execution_role: execution_role.id(),
                        container: ContainerSpec {
                            image: image.reference(),
                            port: CONTAINER_PORT,
                            environment: configuration.entries().clone(),
                            mount: MountPoint {
                                source_volume: VOLUME_NAME.to_string(),
                                container_path: DATA_PATH.to_string(),
                                read_only: false,
                            },
                        },
                        volume: VolumeBinding {
                            name: VOLUME_NAME.to_string(),
                            file_system_id: volume.file_system_id().to_string(),
                            transit_encryption: true,
                        },
                        subnet_class: SubnetClass::Isolated,
                        assign_public_ip: false,
                    }),
                )
                .depends_on(cluster.handle())
                .depends_on(registry.image_copy())
                .depends_on(volume.handle())
                .depends_on(&execution_role)
                .depends_on(&pull_grant)
                .depends_on(&load_balancer)
                .with_tags(tags),
            )
            .await?;

        info!(
            id = %service.id(),
            image = %image,
            environment = configuration.len(),
            "Service provisioned"
        );

        let service_peer = Peer::of(&service);
        let storage_peer = Peer::of(volume.handle());
        let balancer_peer = Peer::of(&load_balancer);

        for rule in rules.allow_bidirectional(&service_peer, &storage_peer, Protocol::Tcp, Port::NFS) {
            engine.authorize(&rule).await?;
            debug!(rule = %rule, "Mount access authorized");
        }
        validate_mount_authorization(rules, &service_peer, &storage_peer, Port::NFS)?;

        let forward = AuthorizationRule::tcp(balancer_peer.clone(), service_peer, CONTAINER_PORT);
        engine.authorize(&forward).await?;
        rules.allow(forward);

        let ingress = AuthorizationRule::tcp(Peer::AnyIpv4, balancer_peer, listener.port());
        engine.authorize(&ingress).await?;
        rules.allow(ingress);

        let endpoint = ServiceEndpoint {
            dns_name,
            scheme: listener.scheme().to_string(),
            port: listener.port(),
            description: ENDPOINT_DESCRIPTION.to_string(),
        };

        info!(endpoint = %endpoint, listener = %listener, "Service published");

        Ok(Self {
            execution_role,
            pull_grant,
            load_balancer,
            service,
            listener,
            endpoint,
        })
    }

    pub fn service(&self) -> &ResourceHandle {
        &self.service
    }

    pub fn load_balancer(&self) -> &ResourceHandle {
        &self.load_balancer
    }

    pub fn execution_role(&self) -> &ResourceHandle {
        &self.execution_role
    }

    pub fn pull_grant(&self) -> &ResourceHandle {
        &self.pull_grant
    }

    pub fn listener(&self) -> ListenerMode {
        self.listener
    }

    pub fn endpoint(&self) -> &ServiceEndpoint {
        &self.endpoint
    }
}
