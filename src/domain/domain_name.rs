// Copyright (c) 2025 - Cowboy AI, Inc.
//! Domain Name Value Object with DNS Validation Invariants
//!
//! The custom domain switches the certificate branch on, so it is validated
//! up front: a malformed name is a configuration error raised before any
//! resource exists.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Domain name validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainNameError {
    #[error("Domain name is empty")]
    Empty,

    #[error("Domain name exceeds maximum length of 253 characters: {0}")]
    TooLong(usize),

    #[error("Domain name must have at least two labels: {0}")]
    NotQualified(String),

    #[error("Label is empty in domain name: {0}")]
    EmptyLabel(String),

    #[error("Label exceeds maximum length of 63 characters: {0}")]
    LabelTooLong(String),

    #[error("Invalid character in domain name: {0:?}")]
    InvalidCharacter(char),

    #[error("Label cannot start or end with hyphen: {0}")]
    InvalidLabelFormat(String),

    #[error("Top-level label cannot be all numeric: {0}")]
    NumericTopLevel(String),
}

/// Fully qualified domain name used for the public TLS certificate
///
/// Invariants (RFC 1123):
/// - At least two labels, total length ≤ 253
/// - Each label 1-63 characters of `[a-z0-9-]`, no leading/trailing hyphen
/// - Top-level label not all numeric
/// - Stored lowercase, without a trailing dot
///
/// # Examples
///
/// ```rust
/// use vaultwarden_infrastructure::domain::DomainName;
///
/// let domain = DomainName::new("Vault.Example.com").unwrap();
/// assert_eq!(domain.as_str(), "vault.example.com");
///
/// assert!(DomainName::new("localhost").is_err());
/// assert!(DomainName::new("-vault.example.com").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DomainName(String);

impl DomainName {
    /// Maximum total length (RFC 1123)
    pub const MAX_LENGTH: usize = 253;

    /// Maximum length for a single label (RFC 1123)
    pub const MAX_LABEL_LENGTH: usize = 63;

    /// Create a new domain name with validation
    pub fn new(name: impl AsRef<str>) -> Result<Self, DomainNameError> {
        let trimmed = name.as_ref().trim();
        let name = trimmed.strip_suffix('.').unwrap_or(trimmed).to_ascii_lowercase();

        if name.is_empty() {
            return Err(DomainNameError::Empty);
        }

        if name.len() > Self::MAX_LENGTH {
            return Err(DomainNameError::TooLong(name.len()));
        }

        let labels: Vec<&str> = name.split('.').collect();
        if labels.len() < 2 {
            return Err(DomainNameError::NotQualified(name));
        }

        for label in &labels {
            Self::validate_label(label, &name)?;
        }

        if let Some(tld) = labels.last() {
            if tld.chars().all(|c| c.is_ascii_digit()) {
                return Err(DomainNameError::NumericTopLevel(tld.to_string()));
            }
        }

        Ok(Self(name))
    }

    /// Parse an optional input where an absent or blank value means "no domain"
    pub fn parse_optional(input: Option<&str>) -> Result<Option<Self>, DomainNameError> {
        match input.map(str::trim) {
            None | Some("") => Ok(None),
            Some(name) => Self::new(name).map(Some),
        }
    }

    fn validate_label(label: &str, name: &str) -> Result<(), DomainNameError> {
        if label.is_empty() {
            return Err(DomainNameError::EmptyLabel(name.to_string()));
        }

        if label.len() > Self::MAX_LABEL_LENGTH {
            return Err(DomainNameError::LabelTooLong(label.to_string()));
        }

        if let Some(ch) = label
            .chars()
            .find(|ch| !ch.is_ascii_alphanumeric() && *ch != '-')
        {
            return Err(DomainNameError::InvalidCharacter(ch));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(DomainNameError::InvalidLabelFormat(label.to_string()));
        }

        Ok(())
    }

    /// Get the domain name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The registrable parent (everything after the first label)
    pub fn parent(&self) -> Option<&str> {
        self.0.split_once('.').map(|(_, parent)| parent)
    }

    /// Get labels as a vector
    pub fn labels(&self) -> Vec<&str> {
        self.0.split('.').collect()
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for DomainName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DomainName {
    type Error = DomainNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for DomainName {
    type Error = DomainNameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DomainName> for String {
    fn from(value: DomainName) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_domain_names() {
        assert!(DomainName::new("vault.example.com").is_ok());
        assert!(DomainName::new("a.b").is_ok());
        assert!(DomainName::new("pass-words.eu-west-1.example.org").is_ok());
        assert!(DomainName::new("vault.example.com.").is_ok());
    }

    #[test]
    fn test_invalid_domain_names() {
        assert_eq!(DomainName::new(""), Err(DomainNameError::Empty));
        assert_eq!(DomainName::new("   "), Err(DomainNameError::Empty));
        assert!(matches!(
            DomainName::new("localhost"),
            Err(DomainNameError::NotQualified(_))
        ));
        assert!(matches!(
            DomainName::new("vault..example.com"),
            Err(DomainNameError::EmptyLabel(_))
        ));
        assert_eq!(
            DomainName::new("vault_1.example.com"),
            Err(DomainNameError::InvalidCharacter('_'))
        );
        assert!(matches!(
            DomainName::new("vault-.example.com"),
            Err(DomainNameError::InvalidLabelFormat(_))
        ));
        assert!(matches!(
            DomainName::new("10.0.0.1"),
            Err(DomainNameError::NumericTopLevel(_))
        ));
        assert_eq!(
            DomainName::new("*.example.com"),
            Err(DomainNameError::InvalidCharacter('*'))
        );
    }

    #[test]
    fn test_length_limits() {
        let long_label = "a".repeat(64);
        assert!(DomainName::new(format!("{}.com", long_label)).is_err());

        let max_label = "a".repeat(63);
        assert!(DomainName::new(format!("{}.com", max_label)).is_ok());

        let long_name = format!("{}.{}.com", "a".repeat(125), "b".repeat(125));
        assert!(matches!(
            DomainName::new(long_name),
            Err(DomainNameError::TooLong(_))
        ));
    }

    #[test]
    fn test_canonical_form() {
        let domain = DomainName::new("VAULT.Example.COM.").unwrap();
        assert_eq!(domain.as_str(), "vault.example.com");
        assert_eq!(domain.parent(), Some("example.com"));
        assert_eq!(domain.labels(), vec!["vault", "example", "com"]);
    }

    #[test]
    fn test_parse_optional() {
        assert_eq!(DomainName::parse_optional(None), Ok(None));
        assert_eq!(DomainName::parse_optional(Some("")), Ok(None));
        assert_eq!(DomainName::parse_optional(Some("  ")), Ok(None));
        assert!(DomainName::parse_optional(Some("vault.example.com"))
            .unwrap()
            .is_some());
        assert!(DomainName::parse_optional(Some("not a domain")).is_err());
    }

    #[test]
    fn test_serde_validates() {
        let domain: DomainName = serde_json::from_str("\"vault.example.com\"").unwrap();
        assert_eq!(domain.as_str(), "vault.example.com");
        assert!(serde_json::from_str::<DomainName>("\"nodots\"").is_err());
    }
}
