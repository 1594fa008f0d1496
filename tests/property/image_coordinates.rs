// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Image Mirroring

use proptest::prelude::*;

use vaultwarden_infrastructure::domain::{
    AccountId, AccountScope, ImageName, ImageVersion, MirroredImage, Region, SourceImage,
    PUBLIC_REGISTRY,
};

fn scope() -> impl Strategy<Value = AccountScope> {
    ("[0-9]{12}", "[a-z]{2}-[a-z]{4,9}-[1-3]").prop_map(|(account, region)| {
        AccountScope::new(
            AccountId::new(account).expect("generated account id"),
            Region::new(region).expect("generated region"),
        )
    })
}

fn version() -> impl Strategy<Value = ImageVersion> {
    "[0-9a-zA-Z][0-9a-zA-Z._-]{0,20}"
        .prop_map(|tag| ImageVersion::new(tag).expect("generated version"))
}

proptest! {
    /// The mirror carries name and version over and only moves registries
    #[test]
    fn prop_mirror_preserves_name_and_version(scope in scope(), version in version()) {
        let name = ImageName::new("vaultwarden/server").expect("image name");
        let source = SourceImage::new(name.clone(), version.clone());

        let mirror = MirroredImage::mirror_of(&source, &scope);

        prop_assert_eq!(mirror.name(), &name);
        prop_assert_eq!(mirror.version(), &version);
        prop_assert_eq!(mirror.registry(), scope.registry_host());
        prop_assert!(!mirror.reference().contains(PUBLIC_REGISTRY));
        prop_assert_eq!(
            mirror.reference(),
            format!("{}/vaultwarden/server:{}", scope.registry_host(), version)
        );
    }

    /// The registry host is determined by the scope alone
    #[test]
    fn prop_registry_host_embeds_scope(scope in scope()) {
        let host = scope.registry_host();
        let expected_prefix = format!("{}.dkr.ecr.", scope.account_id().as_str());
        prop_assert!(host.starts_with(&expected_prefix));
        prop_assert!(host.contains(scope.region().as_str()));
    }

    /// Scopes differing in account or region never share a mirrored reference
    #[test]
    fn prop_distinct_scopes_never_collide(a in scope(), b in scope(), version in version()) {
        prop_assume!(a != b);
        let source = SourceImage::new(
            ImageName::new("vaultwarden/server").expect("image name"),
            version,
        );

        prop_assert_ne!(
            MirroredImage::mirror_of(&source, &a).reference(),
            MirroredImage::mirror_of(&source, &b).reference()
        );
    }

    /// Same account in two regions still mirrors to two places
    #[test]
    fn prop_region_alone_separates_mirrors(scope in scope(), other in "[a-z]{2}-[a-z]{4,9}-[1-3]") {
        let moved = AccountScope::new(
            scope.account_id().clone(),
            Region::new(other).expect("generated region"),
        );
        prop_assume!(moved != scope);
        let source = SourceImage::new(
            ImageName::new("vaultwarden/server").expect("image name"),
            ImageVersion::latest(),
        );

        prop_assert_ne!(
            MirroredImage::mirror_of(&source, &scope).reference(),
            MirroredImage::mirror_of(&source, &moved).reference()
        );
    }

    /// Versions with characters outside the tag alphabet are rejected
    #[test]
    fn prop_invalid_versions_rejected(prefix in "[0-9a-z]{1,5}", bad in "[:/@ ]", suffix in "[0-9a-z]{0,5}") {
        let candidate = format!("{prefix}{bad}{suffix}");
        prop_assert!(ImageVersion::new(candidate).is_err());
    }
}
