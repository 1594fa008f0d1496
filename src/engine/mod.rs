// Copyright (c) 2025 - Cowboy AI, Inc.
//! Provisioning Engine Boundary
//!
//! Components never talk to a cloud API directly. They produce pure
//! declarations ([`ResourceRequest`], [`AuthorizationRule`]) and an engine
//! interprets them.
//!
//! ```text
//! Component                    Engine
//! ─────────                    ──────
//!
//! ResourceRequest ──────────▶ provision()          ──▶ ResourceHandle
//! AuthorizationRule ────────▶ authorize()
//! &ResourceHandle ──────────▶ certificate_status() ──▶ ValidationStatus
//! ```
//!
//! Calls either succeed or fail; retries and idempotence by logical name are
//! the engine's concern.

pub mod recording;

pub use recording::{CertificateValidation, RecordingEngine};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::authorization::AuthorizationRule;
use crate::errors::InfrastructureResult;
use crate::resource::{ResourceHandle, ResourceRequest};

/// Validation state of a requested certificate as reported by the issuer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum ValidationStatus {
    /// Ownership not yet proven
    Pending,
    /// Certificate issued and usable by a listener
    Issued,
    /// Issuer gave up on the request
    Failed(String),
}

/// Trait for interpreting declarations against a control plane
///
/// Implementations must be shareable across the concurrently constructed
/// branches of one assembly.
#[async_trait]
pub trait ProvisioningEngine: Send + Sync {
    /// Create (or look up by logical name) the declared resource
    ///
    /// Every id in `request.depends_on` must refer to a handle this engine
    /// issued earlier.
    async fn provision(&self, request: ResourceRequest) -> InfrastructureResult<ResourceHandle>;

    /// Apply a directed network authorization rule
    async fn authorize(&self, rule: &AuthorizationRule) -> InfrastructureResult<()>;

    /// Current validation state of a certificate
    async fn certificate_status(
        &self,
        certificate: &ResourceHandle,
    ) -> InfrastructureResult<ValidationStatus>;
}
