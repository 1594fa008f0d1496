// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Validation Functions - Topology Invariants
//!
//! Business rules that must hold for every declaration and every set of
//! authorization rules. All functions are pure (no side effects) and return
//! detailed validation results.
//!
//! # Invariant Categories
//!
//! 1. **Placement**: compute and storage live in isolated subnets, only the
//!    load balancer is public
//! 2. **Mount reachability**: filesystem traffic is authorized both ways
//! 3. **Dependencies**: a declaration may only reference provisioned resources

use crate::authorization::{AuthorizationSet, Peer};
use crate::domain::{ImageReference, Port, Protocol, ResourceKind, SubnetClass};
use crate::resource::{ResourceId, ResourceSpec};

/// Validation result with detailed error information
pub type ValidationResult = Result<(), ValidationError>;

/// Validation error with context
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Resource declared in the wrong subnet class
    #[error("{kind} must be placed in {expected} subnets, declared in {actual}")]
    MisplacedResource {
        kind: ResourceKind,
        expected: SubnetClass,
        actual: SubnetClass,
    },

    /// A filesystem mount lacks one direction of authorization
    #[error("Mount authorization incomplete: missing {missing}")]
    IncompleteMountAuthorization { missing: String },

    /// A declaration references a resource that does not exist yet
    #[error("Undeclared dependency: {0}")]
    UndeclaredDependency(ResourceId),

    /// A workload would pull from outside the account
    #[error("Image {0} is not mirrored into the account")]
    PublicImage(String),

    /// Business rule violation
    #[error("Business rule violated: {0}")]
    BusinessRule(String),
}

/// Validate a declaration is placed where its kind requires
///
/// # Rules
/// - Private endpoints, services and filesystems: isolated subnets
/// - Load balancer: ingress subnets
/// - Other kinds are not placed in subnets
pub fn validate_placement(spec: &ResourceSpec) -> ValidationResult {
    let kind = spec.kind();
    match (kind.required_placement(), spec.placement()) {
        (Some(expected), Some(actual)) if expected != actual => {
            Err(ValidationError::MisplacedResource {
                kind,
                expected,
                actual,
            })
        }
        (Some(expected), None) => Err(ValidationError::BusinessRule(format!(
            "{kind} must declare {expected} placement"
        ))),
        _ => Ok(()),
    }
}

/// Validate a service can mount a filesystem
///
/// # Rules
/// - Both peers are provisioned resources
/// - Service → storage authorized on TCP at the mount port
/// - Storage → service authorized on TCP at the mount port
///
/// Only rules naming both resources count; public ingress to the storage
/// does not stand in for an explicit edge.
pub fn validate_mount_authorization(
    rules: &AuthorizationSet,
    service: &Peer,
    storage: &Peer,
    port: Port,
) -> ValidationResult {
    for (source, destination) in [(service, storage), (storage, service)] {
        let explicit = rules.permits_explicitly(source, destination, Protocol::Tcp, port);
        if source.is_public() || !explicit {
            return Err(ValidationError::IncompleteMountAuthorization {
                missing: format!("{source} -> {destination} tcp/{port}"),
            });
        }
    }
    Ok(())
}

/// Validate a workload image is pulled from the private mirror
pub fn validate_private_image(image: &ImageReference) -> ValidationResult {
    if image.is_private() {
        Ok(())
    } else {
        Err(ValidationError::PublicImage(image.to_string()))
    }
}

/// Validate every dependency of a declaration has been provisioned
pub fn validate_dependencies(
    depends_on: &[ResourceId],
    provisioned: impl Fn(&ResourceId) -> bool,
) -> ValidationResult {
    match depends_on.iter().find(|id| !provisioned(id)) {
        Some(id) => Err(ValidationError::UndeclaredDependency(*id)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authorization::AuthorizationRule;

    fn peer(kind: ResourceKind, name: &str) -> Peer {
        Peer::Resource {
            id: ResourceId::new(),
            kind,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_mount_requires_both_directions() {
        let service = peer(ResourceKind::Service, "vaultwarden-service");
        let storage = peer(ResourceKind::FileSystem, "vaultwarden-filesystem");

        let mut rules = AuthorizationSet::new();
        rules.allow(AuthorizationRule::tcp(service.clone(), storage.clone(), Port::NFS));

        let result = validate_mount_authorization(&rules, &service, &storage, Port::NFS);
        assert_eq!(
            result,
            Err(ValidationError::IncompleteMountAuthorization {
                missing: "vaultwarden-filesystem -> vaultwarden-service tcp/2049".to_string()
            })
        );

        rules.allow(AuthorizationRule::tcp(storage.clone(), service.clone(), Port::NFS));
        assert!(validate_mount_authorization(&rules, &service, &storage, Port::NFS).is_ok());
    }

    #[test]
    fn test_mount_rejects_wrong_port() {
        let service = peer(ResourceKind::Service, "svc");
        let storage = peer(ResourceKind::FileSystem, "fs");

        let mut rules = AuthorizationSet::new();
        rules.allow_bidirectional(&service, &storage, Protocol::Tcp, Port::HTTPS);

        assert!(validate_mount_authorization(&rules, &service, &storage, Port::NFS).is_err());
    }

    #[test]
    fn test_public_rule_does_not_stand_in_for_mount_edge() {
        let service = peer(ResourceKind::Service, "vaultwarden-service");
        let storage = peer(ResourceKind::FileSystem, "vaultwarden-filesystem");

        let mut rules = AuthorizationSet::new();
        rules.allow(AuthorizationRule::tcp(Peer::AnyIpv4, storage.clone(), Port::NFS));
        rules.allow(AuthorizationRule::tcp(storage.clone(), service.clone(), Port::NFS));

        assert!(rules.permits(&service, &storage, Protocol::Tcp, Port::NFS));
        assert_eq!(
            validate_mount_authorization(&rules, &service, &storage, Port::NFS),
            Err(ValidationError::IncompleteMountAuthorization {
                missing: "vaultwarden-service -> vaultwarden-filesystem tcp/2049".to_string()
            })
        );
    }

    #[test]
    fn test_public_peer_cannot_mount() {
        let storage = peer(ResourceKind::FileSystem, "fs");

        let mut rules = AuthorizationSet::new();
        rules.allow_bidirectional(&Peer::AnyIpv4, &storage, Protocol::Tcp, Port::NFS);

        assert!(validate_mount_authorization(&rules, &Peer::AnyIpv4, &storage, Port::NFS).is_err());
    }

    #[test]
    fn test_workload_image_must_be_mirrored() {
        use crate::domain::{
            AccountId, AccountScope, ImageName, ImageVersion, MirroredImage, Region, SourceImage,
        };

        let source = SourceImage::new(
            ImageName::new("vaultwarden/server").unwrap(),
            ImageVersion::latest(),
        );
        let scope = AccountScope::new(
            AccountId::new("123456789012").unwrap(),
            Region::new("eu-west-1").unwrap(),
        );
        let mirrored = MirroredImage::mirror_of(&source, &scope);

        assert!(validate_private_image(&mirrored.into()).is_ok());
        assert_eq!(
            validate_private_image(&source.into()),
            Err(ValidationError::PublicImage("vaultwarden/server:latest".to_string()))
        );
    }

    #[test]
    fn test_dependencies() {
        let known = ResourceId::new();
        let unknown = ResourceId::new();

        assert!(validate_dependencies(&[known], |id| *id == known).is_ok());
        assert_eq!(
            validate_dependencies(&[known, unknown], |id| *id == known),
            Err(ValidationError::UndeclaredDependency(unknown))
        );
        assert!(validate_dependencies(&[], |_| false).is_ok());
    }
}
