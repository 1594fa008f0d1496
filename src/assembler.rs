// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Assembly
//!
//! Sequences component construction by data dependency and publishes the
//! service endpoint.
//!
//! ```text
//! ┌──────────────┐   ┌────────────────┐
//! │   network    │   │ registry mirror│   concurrent
//! └──────┬───────┘   └───────┬────────┘
//!        ▼                   │
//!     cluster                │
//!        ▼                   │
//!  certificate request       │
//!        ▼                   │
//!     volume                 │
//!        ▼                   │
//!  validation gate ◀─ blocks until an operator publishes the DNS record
//!        ▼                   │
//!     service  ◀─────────────┘
//! ```
//!
//! Progress is observable through a [`watch`] channel of [`AssemblyStatus`];
//! a stalled validation is a status, not an error.

use futures::future;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::authorization::AuthorizationSet;
use crate::components::certificate::{CertificateBranch, ListenerMode, ValidationRecord};
use crate::components::cluster::Cluster;
use crate::components::network::NetworkTopology;
use crate::components::registry::RegistryMirror;
use crate::components::service::{ServiceDependencies, ServiceEndpoint, WorkloadService};
use crate::components::volume::PersistentVolume;
use crate::config::{AssemblyConfig, STACK_TAG, TAG_VALUE};
use crate::domain::DomainName;
use crate::engine::ProvisioningEngine;
use crate::errors::InfrastructureResult;
use crate::events::{AssemblyEvent, EventLog};
use crate::resource::{ResourceHandle, Tags};

/// Step currently being provisioned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssemblyStage {
    /// Network and registry mirror, side by side
    Foundation,
    Cluster,
    Certificate,
    Volume,
    Service,
}

/// Observable state of an assembly
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AssemblyStatus {
    NotStarted,
    Provisioning {
        stage: AssemblyStage,
    },
    /// Blocked until the validation record is published
    AwaitingCertificateValidation {
        domain: DomainName,
        record: ValidationRecord,
    },
    Completed {
        endpoint: ServiceEndpoint,
    },
    Failed {
        reason: String,
    },
}

impl AssemblyStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AssemblyStatus::Completed { .. } | AssemblyStatus::Failed { .. }
        )
    }
}

/// Everything one assembly produced
#[derive(Debug)]
pub struct Topology {
    pub network: NetworkTopology,
    pub registry: RegistryMirror,
    pub cluster: Cluster,
    pub volume: PersistentVolume,
    pub certificate: CertificateBranch,
    pub service: WorkloadService,
    pub authorizations: AuthorizationSet,
    pub events: EventLog,
}

impl Topology {
    /// The assembly's single output
    pub fn endpoint(&self) -> &ServiceEndpoint {
        self.service.endpoint()
    }

    pub fn listener(&self) -> ListenerMode {
        self.service.listener()
    }

    /// Number of certificates requested (zero or one)
    pub fn certificate_requests(&self) -> usize {
        usize::from(self.certificate.is_present())
    }
}

/// Builds the topology against a provisioning engine
pub struct TopologyAssembler<E: ProvisioningEngine> {
    engine: Arc<E>,
    config: AssemblyConfig,
    status: watch::Sender<AssemblyStatus>,
    assembly_id: Uuid,
}

impl<E: ProvisioningEngine> TopologyAssembler<E> {
    pub fn new(engine: Arc<E>, config: AssemblyConfig) -> Self {
        let (status, _) = watch::channel(AssemblyStatus::NotStarted);
        Self {
            engine,
            config,
            status,
            assembly_id: Uuid::now_v7(),
        }
    }

    /// Correlation id shared by every event of this assembly
    pub fn assembly_id(&self) -> Uuid {
        self.assembly_id
    }

    pub fn config(&self) -> &AssemblyConfig {
        &self.config
    }

    /// Subscribe to status changes
    pub fn subscribe(&self) -> watch::Receiver<AssemblyStatus> {
        self.status.subscribe()
    }

    pub fn status(&self) -> AssemblyStatus {
        self.status.borrow().clone()
    }

    /// Run the assembly to completion
    ///
    /// With a domain configured this does not return until the certificate
    /// is validated.
    pub async fn assemble(&self) -> InfrastructureResult<Topology> {
        info!(assembly_id = %self.assembly_id, "Starting topology assembly");

        match self.run().await {
            Ok(topology) => {
                info!(
                    assembly_id = %self.assembly_id,
                    endpoint = %topology.endpoint(),
                    "Topology assembled"
                );
                self.status.send_replace(AssemblyStatus::Completed {
                    endpoint: topology.endpoint().clone(),
                });
                Ok(topology)
            }
            Err(err) => {
                error!(assembly_id = %self.assembly_id, error = %err, "Topology assembly failed");
                self.status.send_replace(AssemblyStatus::Failed {
                    reason: err.to_string(),
                });
                Err(err)
            }
        }
    }

    fn enter(&self, stage: AssemblyStage) {
        info!(stage = ?stage, "Entering assembly stage");
        self.status
            .send_replace(AssemblyStatus::Provisioning { stage });
    }

    async fn run(&self) -> InfrastructureResult<Topology> {
        let engine = self.engine.as_ref();
        let config = &self.config;
        let mut tags: Tags = config.tags.clone();
        tags.insert(STACK_TAG.to_string(), TAG_VALUE.to_string());

        let mut events = EventLog::new(self.assembly_id);
        let mut authorizations = AuthorizationSet::new();

        // settings may be built in code, bypassing from_environment
        config.network.layout()?;

        self.enter(AssemblyStage::Foundation);
        let (network, registry) = future::try_join(
            NetworkTopology::provision(engine, &config.network, config.scope.region(), &tags),
            RegistryMirror::provision(engine, &config.base_version, &config.scope, &tags),
        )
        .await?;
        record_provisioned(&mut events, network.handle());
        for endpoint in network.endpoints() {
            record_provisioned(&mut events, endpoint.handle());
        }
        record_provisioned(&mut events, registry.repository());
        record_provisioned(&mut events, registry.image_copy());

        self.enter(AssemblyStage::Cluster);
        let cluster = Cluster::provision(engine, &network, &mut authorizations, &tags).await?;
        record_provisioned(&mut events, cluster.handle());
        let authorized = record_authorized(&mut events, &authorizations, 0);

        self.enter(AssemblyStage::Certificate);
        let certificate =
            CertificateBranch::request(engine, config.domain_name.as_ref(), &tags).await?;
        match certificate.certificate() {
            Some(request) => {
                record_provisioned(&mut events, request.handle());
                events.record(AssemblyEvent::CertificateRequested {
                    domain: request.domain().clone(),
                    validation_record: request.validation_record().clone(),
                });
            }
            None => events.record(AssemblyEvent::PlaintextListenerSelected),
        }

        self.enter(AssemblyStage::Volume);
        let volume = PersistentVolume::provision(engine, &network, &tags).await?;
        record_provisioned(&mut events, volume.handle());

        if let CertificateBranch::Pending(request) = &certificate {
            warn!(
                domain = %request.domain(),
                record = %request.validation_record(),
                "Waiting for certificate validation"
            );
            self.status
                .send_replace(AssemblyStatus::AwaitingCertificateValidation {
                    domain: request.domain().clone(),
                    record: request.validation_record().clone(),
                });
        }
        let certificate = certificate
            .await_validation(engine, config.certificate_poll_interval)
            .await?;
        if let CertificateBranch::Validated(request) = &certificate {
            events.record(AssemblyEvent::CertificateValidated {
                domain: request.domain().clone(),
            });
        }

        self.enter(AssemblyStage::Service);
        let dependencies = ServiceDependencies::builder()
            .cluster(&cluster)
            .registry(&registry)
            .volume(&volume)
            .certificate(&certificate)
            .configuration(&config.configuration)
            .build()?;
        let service =
            WorkloadService::provision(engine, dependencies, &mut authorizations, &tags).await?;
        for handle in [
            service.execution_role(),
            service.pull_grant(),
            service.load_balancer(),
            service.service(),
        ] {
            record_provisioned(&mut events, handle);
        }
        record_authorized(&mut events, &authorizations, authorized);

        events.record(AssemblyEvent::AssemblyCompleted {
            endpoint: service.endpoint().clone(),
            listener: service.listener(),
        });

        Ok(Topology {
            network,
            registry,
            cluster,
            volume,
            certificate,
            service,
            authorizations,
            events,
        })
    }
}

fn record_provisioned(events: &mut EventLog, handle: &ResourceHandle) {
    events.record(AssemblyEvent::ResourceProvisioned {
        resource_id: handle.id(),
        kind: handle.kind(),
        logical_name: handle.logical_name().to_string(),
    });
}

/// Record rules added since `already_recorded`; returns the new total
fn record_authorized(
    events: &mut EventLog,
    authorizations: &AuthorizationSet,
    already_recorded: usize,
) -> usize {
    for rule in authorizations.rules().iter().skip(already_recorded) {
        events.record(AssemblyEvent::AccessAuthorized { rule: rule.clone() });
    }
    authorizations.len()
}
