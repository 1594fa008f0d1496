// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Domain Models
//!
//! Value objects with validation invariants that every declaration is built
//! from: domain names, address blocks and ports, image coordinates and the
//! resource kind taxonomy.
//!
//! # Value Objects with Invariants
//!
//! - [`DomainName`] - fully qualified DNS name for the TLS branch
//! - [`CidrBlock`] - aligned IPv4 block, subdivided into [`Subnet`]s
//! - [`Port`] / [`Protocol`] - authorization rule coordinates
//! - [`ZoneCount`] - availability zone replication (2-6)
//! - [`SourceImage`] / [`MirroredImage`] - public image and its private copy
//! - [`ResourceKind`] - resource taxonomy with placement rules

pub mod domain_name;
pub mod image;
pub mod invariants;
pub mod network;
pub mod resource_type;

pub use domain_name::{DomainName, DomainNameError};
pub use image::{
    AccountId, AccountScope, ImageError, ImageName, ImageReference, ImageVersion,
    MirroredImage, Region, SourceImage, PUBLIC_REGISTRY,
};
pub use invariants::{ValidationError, ValidationResult};
pub use network::{CidrBlock, NetworkError, Port, Protocol, Subnet, SubnetClass, ZoneCount};
pub use resource_type::ResourceKind;
