// Copyright (c) 2025 - Cowboy AI, Inc.
//! Private Registry Mirror
//!
//! Copies the public Vaultwarden image into a private, account-scoped
//! repository so the service never pulls from the shared public registry.
//! The service depends on the copy step itself, not just on the repository:
//! an empty repository is never handed to a dependent.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{
    AccountScope, ImageName, ImageVersion, MirroredImage, ResourceKind, SourceImage,
};
use crate::engine::ProvisioningEngine;
use crate::errors::{InfrastructureError, InfrastructureResult};
use crate::resource::{attributes, ResourceHandle, ResourceRequest, ResourceSpec, Tags};

/// Public image that is mirrored
pub const BASE_IMAGE_NAME: &str = "vaultwarden/server";

/// Logical name of the private repository
pub const REPOSITORY_NAME: &str = "vaultwarden-image-repository";

/// Logical name of the copy step
pub const IMAGE_COPY_NAME: &str = "vaultwarden-image-copy";

/// Declaration of the private repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositorySpec {
    pub repository_name: ImageName,
    pub scope: AccountScope,
}

/// Declaration of the one-time image copy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageCopySpec {
    pub source: SourceImage,
    pub destination: MirroredImage,
}

impl ImageCopySpec {
    /// Copy `source` into its mirror coordinates inside `scope`
    pub fn mirror(source: SourceImage, scope: &AccountScope) -> Self {
        let destination = MirroredImage::mirror_of(&source, scope);
        Self {
            source,
            destination,
        }
    }
}

/// The repository, the populated copy and the image coordinates
#[derive(Debug)]
pub struct RegistryMirror {
    repository: ResourceHandle,
    image_copy: ResourceHandle,
    image: MirroredImage,
}

impl RegistryMirror {
    pub async fn provision<E>(
        engine: &E,
        version: &ImageVersion,
        scope: &AccountScope,
        tags: &Tags,
    ) -> InfrastructureResult<Self>
    where
        E: ProvisioningEngine + ?Sized,
    {
        let name = ImageName::new(BASE_IMAGE_NAME)?;
        let source = SourceImage::new(name.clone(), version.clone());

        let repository = engine
            .provision(
                ResourceRequest::new(
                    REPOSITORY_NAME,
                    ResourceSpec::Repository(RepositorySpec {
                        repository_name: name,
                        scope: scope.clone(),
                    }),
                )
                .with_tags(tags),
            )
            .await?;

        let copy = ImageCopySpec::mirror(source, scope);
        let image = copy.destination.clone();

        let image_copy = engine
            .provision(
                ResourceRequest::new(IMAGE_COPY_NAME, ResourceSpec::ImageCopy(copy))
                    .depends_on(&repository)
                    .with_tags(tags),
            )
            .await?;

        if let Some(reported) = image_copy.attribute(attributes::IMAGE_URI) {
            if reported != image.reference() {
                return Err(InfrastructureError::ProvisioningFailed {
                    kind: ResourceKind::ImageCopy,
                    name: IMAGE_COPY_NAME.to_string(),
                    reason: format!("engine reports {reported}, declared {image}"),
                });
            }
        }

        if version.is_floating() {
            info!(image = %image, "Mirroring floating tag; pin VAULTWARDEN_BASE_VERSION for repeatable copies");
        } else {
            info!(image = %image, "Image mirrored");
        }

        Ok(Self {
            repository,
            image_copy,
            image,
        })
    }

    pub fn repository(&self) -> &ResourceHandle {
        &self.repository
    }

    /// Handle of the copy step; dependents must depend on this one
    pub fn image_copy(&self) -> &ResourceHandle {
        &self.image_copy
    }

    pub fn image(&self) -> &MirroredImage {
        &self.image
    }
}
