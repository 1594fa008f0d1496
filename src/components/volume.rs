// Copyright (c) 2025 - Cowboy AI, Inc.
//! Persistent Encrypted Volume

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::components::network::NetworkTopology;
use crate::domain::SubnetClass;
use crate::engine::ProvisioningEngine;
use crate::errors::InfrastructureResult;
use crate::resource::{attributes, ResourceHandle, ResourceRequest, ResourceSpec, Tags};

/// Logical name of the filesystem
pub const FILE_SYSTEM_NAME: &str = "vaultwarden-filesystem";

/// Idle days before files move to the infrequent-access tier
pub const INFREQUENT_ACCESS_AFTER_DAYS: u16 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceMode {
    GeneralPurpose,
    MaxIo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThroughputMode {
    Bursting,
    Elastic,
}

/// Storage tiering rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecyclePolicy {
    pub transition_to_infrequent_access_after_days: u16,
    pub transition_to_primary_on_first_access: bool,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            transition_to_infrequent_access_after_days: INFREQUENT_ACCESS_AFTER_DAYS,
            transition_to_primary_on_first_access: true,
        }
    }
}

/// Declaration of the network filesystem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSystemSpec {
    pub encrypted: bool,
    pub automatic_backups: bool,
    pub lifecycle: LifecyclePolicy,
    pub performance_mode: PerformanceMode,
    pub throughput_mode: ThroughputMode,
    pub subnet_class: SubnetClass,
}

impl Default for FileSystemSpec {
    fn default() -> Self {
        Self {
            encrypted: true,
            automatic_backups: true,
            lifecycle: LifecyclePolicy::default(),
            performance_mode: PerformanceMode::GeneralPurpose,
            throughput_mode: ThroughputMode::Bursting,
            subnet_class: SubnetClass::Isolated,
        }
    }
}

/// The provisioned filesystem
#[derive(Debug)]
pub struct PersistentVolume {
    handle: ResourceHandle,
    file_system_id: String,
}

impl PersistentVolume {
    pub async fn provision<E>(
        engine: &E,
        network: &NetworkTopology,
        tags: &Tags,
    ) -> InfrastructureResult<Self>
    where
        E: ProvisioningEngine + ?Sized,
    {
        let handle = engine
            .provision(
                ResourceRequest::new(
                    FILE_SYSTEM_NAME,
                    ResourceSpec::FileSystem(FileSystemSpec::default()),
                )
                .depends_on(network.handle())
                .with_tags(tags),
            )
            .await?;

        let file_system_id = handle
            .require_attribute(attributes::FILE_SYSTEM_ID)?
            .to_string();

        info!(file_system_id = %file_system_id, "Persistent volume provisioned");

        Ok(Self {
            handle,
            file_system_id,
        })
    }

    pub fn handle(&self) -> &ResourceHandle {
        &self.handle
    }

    /// Stable identifier used by the volume binding
    pub fn file_system_id(&self) -> &str {
        &self.file_system_id
    }
}
