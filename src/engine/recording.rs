// Copyright (c) 2025 - Cowboy AI, Inc.
//! Recording Engine - provisions nothing, remembers everything
//!
//! Dry-run interpreter for declarations. Each request is validated the way a
//! control plane would (dependencies must exist, placement must match the
//! kind), assigned a deterministic-looking physical identity and recorded.
//! The recorded state can be inspected or rendered as a JSON manifest.
//!
//! Certificate validation is driven by [`CertificateValidation`] or by an
//! explicit [`RecordingEngine::confirm_validation`] call, which stands in for
//! the operator publishing the DNS records.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{ProvisioningEngine, ValidationStatus};
use crate::authorization::{AuthorizationRule, Peer};
use crate::domain::invariants::{validate_dependencies, validate_placement, ValidationError};
use crate::domain::{AccountScope, DomainName, ResourceKind};
use crate::errors::{InfrastructureError, InfrastructureResult};
use crate::resource::{
    attributes, ResourceHandle, ResourceId, ResourceRequest, ResourceSpec, Tags,
};

/// How the recording engine answers certificate status polls
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CertificateValidation {
    /// Pending until confirmed with [`RecordingEngine::confirm_validation`]
    #[default]
    Never,
    /// Pending for the given number of polls, issued afterwards
    AfterPolls(u32),
    /// Issued on the first poll
    Immediately,
    /// Failed on the first poll with the given reason
    Rejected(String),
}

/// One recorded resource
#[derive(Debug, Clone, Serialize)]
pub struct RecordedResource {
    pub id: ResourceId,
    pub kind: ResourceKind,
    pub logical_name: String,
    pub physical_id: String,
    pub depends_on: Vec<ResourceId>,
    pub tags: Tags,
    pub spec: ResourceSpec,
    pub attributes: BTreeMap<String, String>,
}

impl RecordedResource {
    fn issue(&self) -> ResourceHandle {
        self.attributes.iter().fold(
            ResourceHandle::new(self.id, self.kind, &self.logical_name, &self.physical_id),
            |handle, (key, value)| handle.with_attribute(key, value),
        )
    }
}

/// Manifest of everything the engine has recorded
#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub scope: AccountScope,
    pub resources: Vec<RecordedResource>,
    pub authorizations: Vec<AuthorizationRule>,
}

#[derive(Debug, Default)]
struct RecordingState {
    resources: Vec<RecordedResource>,
    by_name: HashMap<String, usize>,
    rules: Vec<AuthorizationRule>,
    failures: HashSet<ResourceKind>,
    polls: HashMap<ResourceId, u32>,
    confirmed: HashSet<DomainName>,
    provision_calls: usize,
}

impl RecordingState {
    fn contains(&self, id: &ResourceId) -> bool {
        self.resources.iter().any(|resource| resource.id == *id)
    }

    fn find(&self, id: &ResourceId) -> Option<&RecordedResource> {
        self.resources.iter().find(|resource| resource.id == *id)
    }
}

/// Dry-run [`ProvisioningEngine`]
#[derive(Debug)]
pub struct RecordingEngine {
    scope: AccountScope,
    validation: CertificateValidation,
    state: Mutex<RecordingState>,
}

impl RecordingEngine {
    /// Create an engine recording resources into `scope`
    pub fn new(scope: AccountScope) -> Self {
        Self {
            scope,
            validation: CertificateValidation::default(),
            state: Mutex::new(RecordingState::default()),
        }
    }

    /// Set how certificate polls are answered
    pub fn with_validation(mut self, validation: CertificateValidation) -> Self {
        self.validation = validation;
        self
    }

    /// Make every provision request of `kind` fail
    pub fn failing_on(mut self, kind: ResourceKind) -> Self {
        self.state.get_mut().failures.insert(kind);
        self
    }

    pub fn scope(&self) -> &AccountScope {
        &self.scope
    }

    /// Record that the DNS validation records for `domain` were published
    pub async fn confirm_validation(&self, domain: &DomainName) {
        info!(domain = %domain, "Certificate ownership confirmed");
        self.state.lock().await.confirmed.insert(domain.clone());
    }

    /// Kinds of recorded resources, in provisioning order
    pub async fn provisioned_kinds(&self) -> Vec<ResourceKind> {
        self.state
            .lock()
            .await
            .resources
            .iter()
            .map(|resource| resource.kind)
            .collect()
    }

    /// Recorded resources, in provisioning order
    pub async fn resources(&self) -> Vec<RecordedResource> {
        self.state.lock().await.resources.clone()
    }

    /// Recorded resource by logical name
    pub async fn resource(&self, logical_name: &str) -> Option<RecordedResource> {
        let state = self.state.lock().await;
        state
            .by_name
            .get(logical_name)
            .map(|index| state.resources[*index].clone())
    }

    /// Number of recorded resources of `kind`
    pub async fn count(&self, kind: ResourceKind) -> usize {
        self.state
            .lock()
            .await
            .resources
            .iter()
            .filter(|resource| resource.kind == kind)
            .count()
    }

    /// Applied authorization rules, in order
    pub async fn rules(&self) -> Vec<AuthorizationRule> {
        self.state.lock().await.rules.clone()
    }

    /// Total provision calls, including repeated ones
    pub async fn provision_calls(&self) -> usize {
        self.state.lock().await.provision_calls
    }

    pub async fn manifest(&self) -> Manifest {
        let state = self.state.lock().await;
        Manifest {
            scope: self.scope.clone(),
            resources: state.resources.clone(),
            authorizations: state.rules.clone(),
        }
    }

    /// Render the manifest as pretty-printed JSON
    pub async fn manifest_json(&self) -> InfrastructureResult<String> {
        Ok(serde_json::to_string_pretty(&self.manifest().await)?)
    }

    fn physical_identity(
        &self,
        id: ResourceId,
        request: &ResourceRequest,
    ) -> (String, Vec<(&'static str, String)>) {
        let account = self.scope.account_id().as_str();
        let region = self.scope.region().as_str();
        let short = id.short();
        let name = request.logical_name.as_str();

        match &request.spec {
            ResourceSpec::Network(_) => (format!("vpc-{short}"), Vec::new()),
            ResourceSpec::PrivateEndpoint(_) => (format!("vpce-{short}"), Vec::new()),
            ResourceSpec::Repository(spec) => (
                format!(
                    "arn:aws:ecr:{region}:{account}:repository/{}",
                    spec.repository_name
                ),
                vec![(
                    attributes::REPOSITORY_URI,
                    format!("{}/{}", self.scope.registry_host(), spec.repository_name),
                )],
            ),
            ResourceSpec::ImageCopy(spec) => (
                format!("copy-{short}"),
                vec![(attributes::IMAGE_URI, spec.destination.reference())],
            ),
            ResourceSpec::Cluster(spec) => (
                format!("arn:aws:ecs:{region}:{account}:cluster/{}", spec.cluster_name),
                Vec::new(),
            ),
            ResourceSpec::FileSystem(_) => {
                let file_system_id = format!("fs-{short}");
                (
                    file_system_id.clone(),
                    vec![(attributes::FILE_SYSTEM_ID, file_system_id)],
                )
            }
            ResourceSpec::Certificate(spec) => (
                format!("arn:aws:acm:{region}:{account}:certificate/{id}"),
                vec![
                    (
                        attributes::VALIDATION_RECORD_NAME,
                        format!("_{short}.{}.", spec.domain_name),
                    ),
                    (attributes::VALIDATION_RECORD_TYPE, "CNAME".to_string()),
                    (
                        attributes::VALIDATION_RECORD_VALUE,
                        format!("_{}.acm-validations.aws.", id.as_uuid().simple()),
                    ),
                ],
            ),
            ResourceSpec::ExecutionRole(_) => {
                (format!("arn:aws:iam::{account}:role/{name}"), Vec::new())
            }
            ResourceSpec::PullGrant(_) => {
                (format!("arn:aws:iam::{account}:policy/{name}"), Vec::new())
            }
            ResourceSpec::LoadBalancer(_) => (
                format!("arn:aws:elasticloadbalancing:{region}:{account}:loadbalancer/app/{name}/{short}"),
                vec![(
                    attributes::DNS_NAME,
                    format!("{name}-{short}.{region}.elb.amazonaws.com"),
                )],
            ),
            ResourceSpec::Service(_) => (
                format!("arn:aws:ecs:{region}:{account}:service/{name}"),
                Vec::new(),
            ),
        }
    }
}

fn collect_attributes(attrs: Vec<(&'static str, String)>) -> BTreeMap<String, String> {
    attrs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

#[async_trait]
impl ProvisioningEngine for RecordingEngine {
    async fn provision(&self, request: ResourceRequest) -> InfrastructureResult<ResourceHandle> {
        let kind = request.kind();
        let mut state = self.state.lock().await;
        state.provision_calls += 1;

        if state.failures.contains(&kind) {
            warn!(kind = %kind, name = %request.logical_name, "Injected provisioning failure");
            return Err(InfrastructureError::ProvisioningFailed {
                kind,
                name: request.logical_name,
                reason: "injected failure".to_string(),
            });
        }

        validate_dependencies(&request.depends_on, |id| state.contains(id)).map_err(
            |error| match error {
                ValidationError::UndeclaredDependency(id) => InfrastructureError::UnknownResource(id),
                other => InfrastructureError::Invariant(other),
            },
        )?;
        validate_placement(&request.spec)?;

        if let Some(index) = state.by_name.get(&request.logical_name).copied() {
            let existing = &mut state.resources[index];
            if existing.kind != kind {
                return Err(InfrastructureError::ProvisioningFailed {
                    kind,
                    name: request.logical_name,
                    reason: format!("name already used by a {}", existing.kind),
                });
            }
            debug!(
                kind = %kind,
                name = %existing.logical_name,
                id = %existing.id,
                "Resource already recorded, updating declaration"
            );
            // identity is stable, derived attributes follow the new declaration
            let (_, attrs) = self.physical_identity(existing.id, &request);
            existing.attributes = collect_attributes(attrs);
            existing.spec = request.spec;
            existing.depends_on = request.depends_on;
            existing.tags = request.tags;
            return Ok(existing.issue());
        }

        let id = ResourceId::new();
        let (physical_id, attrs) = self.physical_identity(id, &request);
        let recorded = RecordedResource {
            id,
            kind,
            logical_name: request.logical_name,
            physical_id,
            depends_on: request.depends_on,
            tags: request.tags,
            spec: request.spec,
            attributes: collect_attributes(attrs),
        };

        info!(
            kind = %kind,
            name = %recorded.logical_name,
            id = %id,
            physical_id = %recorded.physical_id,
            "Resource recorded"
        );

        let handle = recorded.issue();
        let index = state.resources.len();
        state.by_name.insert(recorded.logical_name.clone(), index);
        state.resources.push(recorded);
        Ok(handle)
    }

    async fn authorize(&self, rule: &AuthorizationRule) -> InfrastructureResult<()> {
        let mut state = self.state.lock().await;

        for peer in [rule.source(), rule.destination()] {
            if let Peer::Resource { id, kind, .. } = peer {
                if !state.contains(id) {
                    return Err(InfrastructureError::UnknownResource(*id));
                }
                if !kind.is_network_reachable() {
                    return Err(InfrastructureError::Invariant(ValidationError::BusinessRule(
                        format!("{kind} does not accept network rules"),
                    )));
                }
            }
        }

        if state.rules.contains(rule) {
            debug!(rule = %rule, "Authorization already recorded");
        } else {
            debug!(rule = %rule, "Authorization recorded");
            state.rules.push(rule.clone());
        }
        Ok(())
    }

    async fn certificate_status(
        &self,
        certificate: &ResourceHandle,
    ) -> InfrastructureResult<ValidationStatus> {
        certificate.ensure_kind(ResourceKind::Certificate)?;
        let mut state = self.state.lock().await;

        let domain = match state.find(&certificate.id()).map(|resource| &resource.spec) {
            Some(ResourceSpec::Certificate(spec)) => spec.domain_name.clone(),
            Some(_) => return Err(InfrastructureError::MissingDependency(ResourceKind::Certificate)),
            None => return Err(InfrastructureError::UnknownResource(certificate.id())),
        };

        if state.confirmed.contains(&domain) {
            return Ok(ValidationStatus::Issued);
        }

        let polls = state.polls.entry(certificate.id()).or_insert(0);
        *polls += 1;

        let status = match &self.validation {
            CertificateValidation::Never => ValidationStatus::Pending,
            CertificateValidation::AfterPolls(pending) if *polls <= *pending => {
                ValidationStatus::Pending
            }
            CertificateValidation::AfterPolls(_) | CertificateValidation::Immediately => {
                ValidationStatus::Issued
            }
            CertificateValidation::Rejected(reason) => ValidationStatus::Failed(reason.clone()),
        };

        debug!(domain = %domain, polls = *polls, status = ?status, "Certificate status polled");
        Ok(status)
    }
}
