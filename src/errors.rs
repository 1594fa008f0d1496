// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for topology assembly

use thiserror::Error;

use crate::domain::{
    DomainNameError, ImageError, NetworkError, ResourceKind, ValidationError,
};
use crate::resource::ResourceId;
use crate::state_machine::TransitionError;

/// Errors that can occur while assembling the topology
#[derive(Debug, Error)]
pub enum InfrastructureError {
    /// Invalid or missing input, raised before any resource is created
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The provisioning engine rejected or failed a declaration
    #[error("Provisioning of {kind} '{name}' failed: {reason}")]
    ProvisioningFailed {
        kind: ResourceKind,
        name: String,
        reason: String,
    },

    /// A component was constructed before one of its dependencies
    #[error("Missing dependency: {0} must be provisioned first")]
    MissingDependency(ResourceKind),

    /// A request referenced a handle the engine never issued
    #[error("Unknown resource: {0}")]
    UnknownResource(ResourceId),

    /// The engine returned a handle without an expected attribute
    #[error("Resource '{resource}' has no attribute '{attribute}'")]
    MissingAttribute { resource: String, attribute: String },

    /// A TLS listener was requested for a certificate still pending validation
    #[error("Certificate for {0} has not been validated")]
    CertificateNotValidated(String),

    /// Certificate lifecycle transition was rejected
    #[error("Certificate transition error: {0}")]
    CertificateTransition(#[from] TransitionError),

    /// A topology invariant does not hold
    #[error("Invariant violated: {0}")]
    Invariant(#[from] ValidationError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for assembly operations
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;

impl InfrastructureError {
    /// Whether this error was raised before anything was provisioned
    pub fn is_configuration(&self) -> bool {
        matches!(self, InfrastructureError::Configuration(_))
    }
}

impl From<serde_json::Error> for InfrastructureError {
    fn from(err: serde_json::Error) -> Self {
        InfrastructureError::Serialization(err.to_string())
    }
}

impl From<DomainNameError> for InfrastructureError {
    fn from(err: DomainNameError) -> Self {
        InfrastructureError::Configuration(format!("domain name: {}", err))
    }
}

impl From<NetworkError> for InfrastructureError {
    fn from(err: NetworkError) -> Self {
        InfrastructureError::Configuration(format!("network: {}", err))
    }
}

impl From<ImageError> for InfrastructureError {
    fn from(err: ImageError) -> Self {
        InfrastructureError::Configuration(format!("image: {}", err))
    }
}
