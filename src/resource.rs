// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Handles and Declarations
//!
//! Components describe what they need as a [`ResourceRequest`] (pure data)
//! and hand it to a [`ProvisioningEngine`](crate::engine::ProvisioningEngine),
//! which answers with a [`ResourceHandle`]. Handles are only ever produced by
//! an engine, are not `Clone`, and expose nothing but getters: dependents
//! borrow them and record the [`ResourceId`] they depend on.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::components::certificate::CertificateSpec;
use crate::components::cluster::ClusterSpec;
use crate::components::network::{EndpointSpec, NetworkSpec};
use crate::components::registry::{ImageCopySpec, RepositorySpec};
use crate::components::service::{
    ExecutionRoleSpec, LoadBalancerSpec, PullGrantSpec, ServiceSpec,
};
use crate::components::volume::FileSystemSpec;
use crate::domain::{ResourceKind, SubnetClass};
use crate::errors::{InfrastructureError, InfrastructureResult};

/// Key/value tags attached to every declaration
pub type Tags = BTreeMap<String, String>;

/// Well-known attribute keys reported by engines on handles
pub mod attributes {
    /// Filesystem identifier used in mount configuration
    pub const FILE_SYSTEM_ID: &str = "file_system_id";
    /// Public DNS name of a load balancer
    pub const DNS_NAME: &str = "dns_name";
    /// URI of a private repository
    pub const REPOSITORY_URI: &str = "repository_uri";
    /// Pull reference of a copied image
    pub const IMAGE_URI: &str = "image_uri";
    /// Name of the DNS record proving domain ownership
    pub const VALIDATION_RECORD_NAME: &str = "validation_record_name";
    /// Type of the DNS record proving domain ownership
    pub const VALIDATION_RECORD_TYPE: &str = "validation_record_type";
    /// Value of the DNS record proving domain ownership
    pub const VALIDATION_RECORD_VALUE: &str = "validation_record_value";
}

/// Stable identity of a provisioned resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(Uuid);

impl ResourceId {
    /// Fresh, time-ordered identity
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Eight hex characters from the random tail of the id
    pub fn short(&self) -> String {
        let simple = self.0.simple().to_string();
        simple[simple.len() - 8..].to_string()
    }
}

impl Default for ResourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque reference to a provisioned resource
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct ResourceHandle {
    id: ResourceId,
    kind: ResourceKind,
    logical_name: String,
    physical_id: String,
    attributes: BTreeMap<String, String>,
}

impl ResourceHandle {
    /// Issue a handle; called by engines once a resource exists
    pub fn new(
        id: ResourceId,
        kind: ResourceKind,
        logical_name: impl Into<String>,
        physical_id: impl Into<String>,
    ) -> Self {
        Self {
            id,
            kind,
            logical_name: logical_name.into(),
            physical_id: physical_id.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Attach an engine-reported attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn logical_name(&self) -> &str {
        &self.logical_name
    }

    pub fn physical_id(&self) -> &str {
        &self.physical_id
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Attribute that the engine is required to report for this kind
    pub fn require_attribute(&self, key: &str) -> InfrastructureResult<&str> {
        self.attribute(key)
            .ok_or_else(|| InfrastructureError::MissingAttribute {
                resource: self.logical_name.clone(),
                attribute: key.to_string(),
            })
    }

    /// Check the handle is of the expected kind
    ///
    /// A handle of the wrong kind is treated like an absent dependency.
    pub fn ensure_kind(&self, expected: ResourceKind) -> InfrastructureResult<()> {
        if self.kind != expected {
            return Err(InfrastructureError::MissingDependency(expected));
        }
        Ok(())
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}' ({})", self.kind, self.logical_name, self.physical_id)
    }
}

/// Declaration of a single resource's properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceSpec {
    Network(NetworkSpec),
    PrivateEndpoint(EndpointSpec),
    Repository(RepositorySpec),
    ImageCopy(ImageCopySpec),
    Cluster(ClusterSpec),
    FileSystem(FileSystemSpec),
    Certificate(CertificateSpec),
    ExecutionRole(ExecutionRoleSpec),
    PullGrant(PullGrantSpec),
    LoadBalancer(LoadBalancerSpec),
    Service(ServiceSpec),
}

impl ResourceSpec {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceSpec::Network(_) => ResourceKind::Network,
            ResourceSpec::PrivateEndpoint(_) => ResourceKind::PrivateEndpoint,
            ResourceSpec::Repository(_) => ResourceKind::Repository,
            ResourceSpec::ImageCopy(_) => ResourceKind::ImageCopy,
            ResourceSpec::Cluster(_) => ResourceKind::Cluster,
            ResourceSpec::FileSystem(_) => ResourceKind::FileSystem,
            ResourceSpec::Certificate(_) => ResourceKind::Certificate,
            ResourceSpec::ExecutionRole(_) => ResourceKind::ExecutionRole,
            ResourceSpec::PullGrant(_) => ResourceKind::PullGrant,
            ResourceSpec::LoadBalancer(_) => ResourceKind::LoadBalancer,
            ResourceSpec::Service(_) => ResourceKind::Service,
        }
    }

    /// Subnet class the declaration places the resource in
    pub fn placement(&self) -> Option<SubnetClass> {
        match self {
            ResourceSpec::PrivateEndpoint(spec) => Some(spec.subnet_class),
            ResourceSpec::FileSystem(spec) => Some(spec.subnet_class),
            ResourceSpec::LoadBalancer(spec) => Some(spec.subnet_class),
            ResourceSpec::Service(spec) => Some(spec.subnet_class),
            ResourceSpec::Network(_)
            | ResourceSpec::Repository(_)
            | ResourceSpec::ImageCopy(_)
            | ResourceSpec::Cluster(_)
            | ResourceSpec::Certificate(_)
            | ResourceSpec::ExecutionRole(_)
            | ResourceSpec::PullGrant(_) => None,
        }
    }
}

/// A declaration plus the handles it depends on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRequest {
    pub logical_name: String,
    pub spec: ResourceSpec,
    pub depends_on: Vec<ResourceId>,
    pub tags: Tags,
}

impl ResourceRequest {
    pub fn new(logical_name: impl Into<String>, spec: ResourceSpec) -> Self {
        Self {
            logical_name: logical_name.into(),
            spec,
            depends_on: Vec::new(),
            tags: Tags::new(),
        }
    }

    /// Declare a data dependency on an existing handle
    pub fn depends_on(mut self, handle: &ResourceHandle) -> Self {
        if !self.depends_on.contains(&handle.id()) {
            self.depends_on.push(handle.id());
        }
        self
    }

    pub fn with_tags(mut self, tags: &Tags) -> Self {
        self.tags
            .extend(tags.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn kind(&self) -> ResourceKind {
        self.spec.kind()
    }
}
