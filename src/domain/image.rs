// Copyright (c) 2025 - Cowboy AI, Inc.
//! Container Image Coordinates
//!
//! A [`SourceImage`] lives on the public registry. A [`MirroredImage`] is its
//! private, account-scoped copy; it can only be derived from a source image
//! and an [`AccountScope`], so its coordinates are never chosen independently.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Image coordinate validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("Invalid image name: {0}")]
    InvalidName(String),

    #[error("Invalid image version: {0}")]
    InvalidVersion(String),

    #[error("Invalid account id: {0} (must be 12 digits)")]
    InvalidAccountId(String),

    #[error("Invalid region: {0}")]
    InvalidRegion(String),
}

/// Public registry the source images are pulled from
pub const PUBLIC_REGISTRY: &str = "docker.io";

/// Repository path, e.g. `vaultwarden/server`
///
/// Invariants: non-empty `/`-separated components of `[a-z0-9._-]`, each
/// starting and ending with an alphanumeric character.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImageName(String);

impl ImageName {
    pub fn new(name: impl Into<String>) -> Result<Self, ImageError> {
        let name = name.into();

        let valid = !name.is_empty()
            && name.split('/').all(|component| {
                !component.is_empty()
                    && component.chars().all(|c| {
                        c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-')
                    })
                    && component
                        .chars()
                        .next()
                        .is_some_and(|c| c.is_ascii_alphanumeric())
                    && component
                        .chars()
                        .last()
                        .is_some_and(|c| c.is_ascii_alphanumeric())
            });

        if !valid {
            return Err(ImageError::InvalidName(name));
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ImageName {
    type Error = ImageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ImageName> for String {
    fn from(value: ImageName) -> Self {
        value.0
    }
}

/// Image tag, e.g. `1.32.0` or `latest`
///
/// Invariants: 1-128 characters of `[A-Za-z0-9_.-]`, not starting with `.` or `-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImageVersion(String);

impl ImageVersion {
    /// Maximum tag length
    pub const MAX_LENGTH: usize = 128;

    /// Tag used when no version is pinned
    pub const LATEST: &'static str = "latest";

    pub fn new(version: impl Into<String>) -> Result<Self, ImageError> {
        let version = version.into();

        let valid = !version.is_empty()
            && version.len() <= Self::MAX_LENGTH
            && !version.starts_with(['.', '-'])
            && version
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));

        if !valid {
            return Err(ImageError::InvalidVersion(version));
        }

        Ok(Self(version))
    }

    pub fn latest() -> Self {
        Self(Self::LATEST.to_string())
    }

    /// Whether this is the floating `latest` tag rather than a pinned version
    pub fn is_floating(&self) -> bool {
        self.0 == Self::LATEST
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ImageVersion {
    fn default() -> Self {
        Self::latest()
    }
}

impl fmt::Display for ImageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ImageVersion {
    type Error = ImageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ImageVersion> for String {
    fn from(value: ImageVersion) -> Self {
        value.0
    }
}

/// Twelve-digit cloud account identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Result<Self, ImageError> {
        let id = id.into();
        if id.len() != 12 || !id.chars().all(|c| c.is_ascii_digit()) {
            return Err(ImageError::InvalidAccountId(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AccountId {
    type Error = ImageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AccountId> for String {
    fn from(value: AccountId) -> Self {
        value.0
    }
}

/// Region code, e.g. `eu-west-1`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Region(String);

impl Region {
    pub fn new(region: impl Into<String>) -> Result<Self, ImageError> {
        let region = region.into();

        let valid = region.contains('-')
            && !region.starts_with('-')
            && !region.ends_with('-')
            && region
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');

        if !valid {
            return Err(ImageError::InvalidRegion(region));
        }

        Ok(Self(region))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Region {
    type Error = ImageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Region> for String {
    fn from(value: Region) -> Self {
        value.0
    }
}

/// The (account, region) pair every private resource is scoped to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountScope {
    account_id: AccountId,
    region: Region,
}

impl AccountScope {
    pub fn new(account_id: AccountId, region: Region) -> Self {
        Self { account_id, region }
    }

    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    /// Host name of the account's private registry in this region
    pub fn registry_host(&self) -> String {
        format!(
            "{}.dkr.ecr.{}.amazonaws.com",
            self.account_id.as_str(),
            self.region.as_str()
        )
    }
}

/// Publicly hosted image on the shared registry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceImage {
    name: ImageName,
    version: ImageVersion,
}

impl SourceImage {
    pub fn new(name: ImageName, version: ImageVersion) -> Self {
        Self { name, version }
    }

    pub fn registry(&self) -> &str {
        PUBLIC_REGISTRY
    }

    pub fn name(&self) -> &ImageName {
        &self.name
    }

    pub fn version(&self) -> &ImageVersion {
        &self.version
    }

    /// Pull reference as understood by the public registry (`name:version`)
    pub fn reference(&self) -> String {
        format!("{}:{}", self.name, self.version)
    }
}

impl fmt::Display for SourceImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reference())
    }
}

/// Private, account-scoped copy of a [`SourceImage`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MirroredImage {
    scope: AccountScope,
    name: ImageName,
    version: ImageVersion,
}

impl MirroredImage {
    /// Derive the mirror coordinates of `source` inside `scope`
    ///
    /// Name and version are carried over unchanged; only the registry moves.
    pub fn mirror_of(source: &SourceImage, scope: &AccountScope) -> Self {
        Self {
            scope: scope.clone(),
            name: source.name.clone(),
            version: source.version.clone(),
        }
    }

    pub fn registry(&self) -> String {
        self.scope.registry_host()
    }

    pub fn scope(&self) -> &AccountScope {
        &self.scope
    }

    pub fn name(&self) -> &ImageName {
        &self.name
    }

    pub fn version(&self) -> &ImageVersion {
        &self.version
    }

    /// Fully qualified pull reference (`registry/name:version`)
    pub fn reference(&self) -> String {
        format!("{}/{}:{}", self.registry(), self.name, self.version)
    }
}

impl fmt::Display for MirroredImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reference())
    }
}

/// Either side of a mirror relationship
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum ImageReference {
    Source(SourceImage),
    Mirrored(MirroredImage),
}

impl ImageReference {
    pub fn registry(&self) -> String {
        match self {
            Self::Source(image) => image.registry().to_string(),
            Self::Mirrored(image) => image.registry(),
        }
    }

    pub fn name(&self) -> &ImageName {
        match self {
            Self::Source(image) => image.name(),
            Self::Mirrored(image) => image.name(),
        }
    }

    pub fn version(&self) -> &ImageVersion {
        match self {
            Self::Source(image) => image.version(),
            Self::Mirrored(image) => image.version(),
        }
    }

    /// Pull reference, `registry/name:version`
    pub fn reference(&self) -> String {
        match self {
            Self::Source(image) => image.reference(),
            Self::Mirrored(image) => image.reference(),
        }
    }

    /// Whether pulling it stays inside the account
    pub fn is_private(&self) -> bool {
        matches!(self, Self::Mirrored(_))
    }
}

impl From<SourceImage> for ImageReference {
    fn from(image: SourceImage) -> Self {
        Self::Source(image)
    }
}

impl From<MirroredImage> for ImageReference {
    fn from(image: MirroredImage) -> Self {
        Self::Mirrored(image)
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reference())
    }
}
