// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Value Objects with Validation Invariants

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

/// Network validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Invalid IPv4 address: {0}")]
    InvalidIpAddress(String),

    #[error("Invalid CIDR notation: {0}")]
    InvalidCidr(String),

    #[error("Invalid prefix length: /{0} (must be /16 to /28)")]
    InvalidPrefixLength(u8),

    #[error("Address {0} is not aligned to its prefix length")]
    NotAligned(String),

    #[error("Block {block} cannot hold {requested} subnets")]
    InsufficientAddressSpace { block: String, requested: usize },

    #[error("Invalid port: {0} (must be 1-65535)")]
    InvalidPort(u16),

    #[error("Invalid availability zone count: {0} (must be 2-6)")]
    InvalidZoneCount(u8),
}

/// IPv4 address block in CIDR notation
///
/// Invariants:
/// - Prefix length /16 to /28 (the range a private cloud network accepts)
/// - Address is the first address of the block (host bits are zero)
///
/// # Examples
///
/// ```rust
/// use vaultwarden_infrastructure::domain::CidrBlock;
///
/// let block = CidrBlock::new("20.0.0.0/24").unwrap();
/// assert_eq!(block.prefix_length(), 24);
/// assert!(CidrBlock::new("20.0.0.1/24").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CidrBlock {
    address: Ipv4Addr,
    prefix_length: u8,
}

impl CidrBlock {
    /// Largest block (smallest prefix) accepted
    pub const MIN_PREFIX: u8 = 16;

    /// Smallest block (largest prefix) accepted
    pub const MAX_PREFIX: u8 = 28;

    /// `20.0.0.0/24`, the network's default address block
    pub const DEFAULT: CidrBlock = CidrBlock {
        address: Ipv4Addr::new(20, 0, 0, 0),
        prefix_length: 24,
    };

    /// Parse a block from `a.b.c.d/n` notation
    pub fn new(cidr: impl AsRef<str>) -> Result<Self, NetworkError> {
        let cidr = cidr.as_ref().trim();

        let (addr_str, prefix_str) = cidr
            .split_once('/')
            .ok_or_else(|| NetworkError::InvalidCidr(cidr.to_string()))?;

        let address = Ipv4Addr::from_str(addr_str)
            .map_err(|_| NetworkError::InvalidIpAddress(addr_str.to_string()))?;

        let prefix_length = prefix_str
            .parse::<u8>()
            .map_err(|_| NetworkError::InvalidCidr(cidr.to_string()))?;

        Self::from_parts(address, prefix_length)
    }

    /// Create from separate address and prefix
    pub fn from_parts(address: Ipv4Addr, prefix_length: u8) -> Result<Self, NetworkError> {
        if !(Self::MIN_PREFIX..=Self::MAX_PREFIX).contains(&prefix_length) {
            return Err(NetworkError::InvalidPrefixLength(prefix_length));
        }

        if u32::from(address) & Self::host_mask(prefix_length) != 0 {
            return Err(NetworkError::NotAligned(format!(
                "{}/{}",
                address, prefix_length
            )));
        }

        Ok(Self {
            address,
            prefix_length,
        })
    }

    fn host_mask(prefix_length: u8) -> u32 {
        u32::MAX >> prefix_length
    }

    /// First address of the block
    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    /// Prefix length
    pub fn prefix_length(&self) -> u8 {
        self.prefix_length
    }

    /// Number of addresses in the block
    pub fn size(&self) -> u32 {
        1u32 << (32 - self.prefix_length)
    }

    /// Whether `other` lies entirely inside this block
    pub fn contains(&self, other: &CidrBlock) -> bool {
        other.prefix_length >= self.prefix_length
            && u32::from(other.address) & !Self::host_mask(self.prefix_length)
                == u32::from(self.address)
    }

    /// Split the block into `count` equally sized, consecutive sub-blocks
    ///
    /// The sub-block size is the largest power of two that fits `count`
    /// blocks; any remainder of the parent block is left unallocated.
    pub fn subdivide(&self, count: usize) -> Result<Vec<CidrBlock>, NetworkError> {
        let insufficient = || NetworkError::InsufficientAddressSpace {
            block: self.to_string(),
            requested: count,
        };

        if count == 0 {
            return Err(insufficient());
        }

        let extra_bits = (usize::BITS - (count - 1).leading_zeros()) as u8;
        let prefix_length = self.prefix_length + extra_bits;
        if prefix_length > Self::MAX_PREFIX {
            return Err(insufficient());
        }

        let base = u32::from(self.address);
        let step = 1u32 << (32 - prefix_length);

        (0..count as u32)
            .map(|i| Self::from_parts(Ipv4Addr::from(base + i * step), prefix_length))
            .collect()
    }
}

impl fmt::Display for CidrBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_length)
    }
}

impl FromStr for CidrBlock {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CidrBlock {
    type Error = NetworkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CidrBlock> for String {
    fn from(value: CidrBlock) -> Self {
        value.to_string()
    }
}

/// Transport protocol of an authorization rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "tcp"),
            Protocol::Udp => write!(f, "udp"),
        }
    }
}

/// Transport port (1-65535)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Port(u16);

impl Port {
    /// Plaintext HTTP
    pub const HTTP: Port = Port(80);

    /// HTTP over TLS
    pub const HTTPS: Port = Port(443);

    /// NFS, used by the network filesystem mount
    pub const NFS: Port = Port(2049);

    /// Create a new port with validation
    pub fn new(port: u16) -> Result<Self, NetworkError> {
        if port == 0 {
            return Err(NetworkError::InvalidPort(port));
        }
        Ok(Self(port))
    }

    /// Get the port number
    pub fn value(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for Port {
    type Error = NetworkError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Port> for u16 {
    fn from(value: Port) -> Self {
        value.0
    }
}

/// Number of availability zones the subnets are replicated across
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ZoneCount(u8);

impl ZoneCount {
    /// Minimum zone count (one zone outage must leave a zone standing)
    pub const MIN: u8 = 2;

    /// Maximum zone count
    pub const MAX: u8 = 6;

    /// Create a new zone count with validation
    pub fn new(count: u8) -> Result<Self, NetworkError> {
        if !(Self::MIN..=Self::MAX).contains(&count) {
            return Err(NetworkError::InvalidZoneCount(count));
        }
        Ok(Self(count))
    }

    /// Get the zone count
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl Default for ZoneCount {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

impl TryFrom<u8> for ZoneCount {
    type Error = NetworkError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ZoneCount> for u8 {
    fn from(value: ZoneCount) -> Self {
        value.0
    }
}

/// Subnet class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubnetClass {
    /// Publicly reachable; hosts only the load balancer
    Ingress,
    /// No route to or from the internet
    Isolated,
}

impl SubnetClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubnetClass::Ingress => "ingress",
            SubnetClass::Isolated => "isolated",
        }
    }

    /// Whether the subnet has a route to an internet gateway
    pub fn is_public(&self) -> bool {
        matches!(self, SubnetClass::Ingress)
    }
}

impl fmt::Display for SubnetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One subnet of the network, pinned to a single zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subnet {
    pub name: String,
    pub class: SubnetClass,
    pub zone_index: u8,
    pub cidr: CidrBlock,
}

impl Subnet {
    /// Zone suffix letter (`a`, `b`, ...)
    pub fn zone_suffix(&self) -> char {
        (b'a' + self.zone_index) as char
    }
}
