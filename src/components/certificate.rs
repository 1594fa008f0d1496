// Copyright (c) 2025 - Cowboy AI, Inc.
//! Optional TLS Certificate Branch
//!
//! A certificate exists if and only if a domain name was supplied. Its
//! validation is gated on a human publishing DNS records, so the branch is a
//! tagged variant the service composition must match on:
//!
//! ```text
//! None ─────────────▶ Absent ─────────────────────────▶ plaintext listener
//! Some(domain) ─────▶ Pending ──await_validation()──▶ Validated ──▶ TLS listener
//!                        │
//!                        └── polls forever while the issuer reports Pending
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

use crate::domain::{DomainName, Port, ResourceKind};
use crate::engine::{ProvisioningEngine, ValidationStatus};
use crate::errors::{InfrastructureError, InfrastructureResult};
use crate::resource::{attributes, ResourceHandle, ResourceRequest, ResourceSpec, Tags};
use crate::state_machine::{
    CertificateSignal, CertificateState, StateMachineWithHistory, Transition, TransitionOutput,
};

/// Logical name of the certificate
pub const CERTIFICATE_NAME: &str = "vaultwarden-certificate";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMethod {
    Dns,
}

/// Declaration of the certificate request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateSpec {
    pub domain_name: DomainName,
    pub validation_method: ValidationMethod,
}

/// DNS record an operator must publish to prove domain ownership
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRecord {
    pub name: String,
    pub record_type: String,
    pub value: String,
}

impl ValidationRecord {
    fn from_handle(handle: &ResourceHandle) -> InfrastructureResult<Self> {
        Ok(Self {
            name: handle
                .require_attribute(attributes::VALIDATION_RECORD_NAME)?
                .to_string(),
            record_type: handle
                .require_attribute(attributes::VALIDATION_RECORD_TYPE)?
                .to_string(),
            value: handle
                .require_attribute(attributes::VALIDATION_RECORD_VALUE)?
                .to_string(),
        })
    }
}

impl fmt::Display for ValidationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.record_type, self.value)
    }
}

/// Protocol of the public listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenerMode {
    Plaintext,
    Tls,
}

impl ListenerMode {
    pub fn port(&self) -> Port {
        match self {
            ListenerMode::Plaintext => Port::HTTP,
            ListenerMode::Tls => Port::HTTPS,
        }
    }

    pub fn scheme(&self) -> &'static str {
        match self {
            ListenerMode::Plaintext => "http",
            ListenerMode::Tls => "https",
        }
    }
}

impl fmt::Display for ListenerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerMode::Plaintext => write!(f, "HTTP/{}", self.port()),
            ListenerMode::Tls => write!(f, "HTTPS/{}", self.port()),
        }
    }
}

/// A requested certificate and its validation lifecycle
#[derive(Debug)]
pub struct CertificateRequest {
    domain: DomainName,
    handle: ResourceHandle,
    validation_record: ValidationRecord,
    lifecycle: StateMachineWithHistory<CertificateState>,
    pending_polls: u32,
}

impl CertificateRequest {
    pub fn domain(&self) -> &DomainName {
        &self.domain
    }

    pub fn handle(&self) -> &ResourceHandle {
        &self.handle
    }

    pub fn validation_record(&self) -> &ValidationRecord {
        &self.validation_record
    }

    pub fn state(&self) -> CertificateState {
        *self.lifecycle.current_state()
    }

    /// Status polls answered with Pending so far
    pub fn pending_polls(&self) -> u32 {
        self.pending_polls
    }

    /// Recorded state changes, oldest first
    pub fn history(&self) -> &[Transition<CertificateState, CertificateSignal>] {
        self.lifecycle.get_history()
    }

    fn signal(&mut self, signal: CertificateSignal) -> InfrastructureResult<TransitionOutput> {
        Ok(self.lifecycle.transition_with_history(signal, Utc::now())?)
    }
}

/// Zero or one certificate, by validation state
#[derive(Debug)]
pub enum CertificateBranch {
    /// No domain name supplied
    Absent,
    /// Requested, waiting for ownership to be proven
    Pending(CertificateRequest),
    /// Issued and usable by a listener
    Validated(CertificateRequest),
}

impl CertificateBranch {
    /// Request a certificate for `domain`, or take the plaintext branch
    pub async fn request<E>(
        engine: &E,
        domain: Option<&DomainName>,
        tags: &Tags,
    ) -> InfrastructureResult<Self>
    where
        E: ProvisioningEngine + ?Sized,
    {
        let Some(domain) = domain else {
            warn!("No domain name supplied; the public listener will serve plaintext HTTP");
            return Ok(CertificateBranch::Absent);
        };

        let handle = engine
            .provision(
                ResourceRequest::new(
                    CERTIFICATE_NAME,
                    ResourceSpec::Certificate(CertificateSpec {
                        domain_name: domain.clone(),
                        validation_method: ValidationMethod::Dns,
                    }),
                )
                .with_tags(tags),
            )
            .await?;

        let validation_record = ValidationRecord::from_handle(&handle)?;
        let mut request = CertificateRequest {
            domain: domain.clone(),
            handle,
            validation_record,
            lifecycle: StateMachineWithHistory::new(CertificateState::Requested),
            pending_polls: 0,
        };
        request.signal(CertificateSignal::RecordsIssued)?;

        info!(
            domain = %domain,
            record = %request.validation_record,
            "Certificate requested, publish the validation record to continue"
        );

        Ok(CertificateBranch::Pending(request))
    }

    /// Block until the certificate is validated
    ///
    /// Polls the engine every `poll_interval` with no upper bound. Absent and
    /// already validated branches return immediately. Dropping the future is
    /// the only way to stop waiting.
    pub async fn await_validation<E>(
        self,
        engine: &E,
        poll_interval: Duration,
    ) -> InfrastructureResult<Self>
    where
        E: ProvisioningEngine + ?Sized,
    {
        let mut request = match self {
            CertificateBranch::Pending(request) => request,
            settled => return Ok(settled),
        };

        loop {
            match engine.certificate_status(&request.handle).await? {
                ValidationStatus::Issued => {
                    request.signal(CertificateSignal::OwnershipConfirmed)?;
                    info!(domain = %request.domain, "Certificate validated");
                    return Ok(CertificateBranch::Validated(request));
                }
                ValidationStatus::Pending => {
                    let output = request.signal(CertificateSignal::StillPending)?;
                    request.pending_polls += 1;
                    for warning in output.warnings {
                        warn!(
                            domain = %request.domain,
                            record = %request.validation_record,
                            polls = request.pending_polls,
                            "{warning}"
                        );
                    }
                    tokio::time::sleep(poll_interval).await;
                }
                ValidationStatus::Failed(reason) => {
                    return Err(InfrastructureError::ProvisioningFailed {
                        kind: ResourceKind::Certificate,
                        name: request.domain.to_string(),
                        reason,
                    });
                }
            }
        }
    }

    /// Listener protocol implied by the branch
    ///
    /// Any requested certificate, validated or not, selects TLS.
    pub fn listener_mode(&self) -> ListenerMode {
        match self {
            CertificateBranch::Absent => ListenerMode::Plaintext,
            CertificateBranch::Pending(_) | CertificateBranch::Validated(_) => ListenerMode::Tls,
        }
    }

    pub fn certificate(&self) -> Option<&CertificateRequest> {
        match self {
            CertificateBranch::Absent => None,
            CertificateBranch::Pending(request) | CertificateBranch::Validated(request) => {
                Some(request)
            }
        }
    }

    pub fn is_present(&self) -> bool {
        self.certificate().is_some()
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, CertificateBranch::Pending(_))
    }
}
