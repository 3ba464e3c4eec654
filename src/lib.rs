//! # Active Directory trust engine
//!
//! Discovers a remote Active Directory forest, establishes a cross-forest
//! trust with it and answers "which trusted domain owns this SID or name"
//! questions for the local identity directory.
//!
//! The crate provides:
//! - [`SecurityIdentifier`]: an owned, `Copy` SID with lossless string and
//!   binary codecs, and the [`sid!`] literal macro.
//! - [`DomainRegistry`]: the trusted domains known to the local directory and
//!   resolution of objects living in them.
//! - [`DomainSession`]: one LSA conversation with a domain controller, from
//!   binding negotiation to trust verification.
//! - [`TrustDomainJoins`]: the join protocol between the local domain and a
//!   remote forest.
//! - [`fetch_forest_topology`]: the domains and name suffixes of a trusted forest.
//!
//! ## Collaborators
//! Every external system is reached through a trait: directories
//! ([`directory::DirectoryClient`]), the name service cache
//! ([`name_service::NameService`]), Kerberos tooling
//! ([`kerberos::KerberosHelper`]), DNS ([`dns::DnsResolver`]) and the
//! DCE-RPC services ([`rpc`]). They are bundled with the [`TrustConfig`] in a
//! [`TrustContext`] borrowed by every component.
//!
//! ## Examples
//! ### Parse and compare SIDs
//! ```rust
//! use ad_trust::SecurityIdentifier;
//!
//! let domain: SecurityIdentifier = "S-1-5-21-9-9-9".parse().unwrap();
//! let admin: SecurityIdentifier = "S-1-5-21-9-9-9-500".parse().unwrap();
//! assert!(domain.prefix_matches(&admin));
//! assert_eq!(admin.rid(), Some(500));
//! ```
//!
//! ### Load the configuration
//! ```rust
//! use ad_trust::TrustConfig;
//!
//! let config = TrustConfig::from_toml_str(r#"
//!     domain = "ipa.test"
//!     realm = "IPA.TEST"
//!     host = "master.ipa.test"
//! "#).unwrap();
//! assert_eq!(config.trusts_dn(), "cn=ad,cn=trusts,dc=ipa,dc=test");
//! ```

pub mod auth_blob;
pub mod cipher;
mod config;
mod context;
pub mod directory;
pub mod dns;
mod error;
mod joins;
pub mod kerberos;
pub mod name_service;
pub mod nttime;
mod object_name;
mod object_type;
mod registry;
pub mod rpc;
mod security_identifier;
mod serde_impl;
mod session;
mod sid_identifier_authority;
pub mod status;
mod topology;

/// Internal utilities for validation and layout calculations.
pub(crate) mod utils;

pub use config::{CcacheKind, TrustConfig};
pub use context::TrustContext;
pub use error::{Result, TrustError};
pub use joins::{JoinOutcome, JoinResult, TrustDomainJoins};
pub use object_name::{DomainTarget, ObjectName, ObjectNameParsingError};
pub use object_type::ObjectType;
pub use parsing::InvalidSidFormat;
pub use registry::{DomainRegistry, LocalDomain, TrustedDomainMap, TrustedDomainRecord};
pub use security_identifier::SecurityIdentifier;
pub use session::{
    DomainInfo, DomainSession, GENERATED_SECRET_LEN, SessionPhase, TrustDirection, TrustSecret,
};
/// Compile-time SID literal, e.g. `sid!("S-1-5-32-544")`.
pub use sid_macro::sid;
/// Identifier authority component of a SID (6-byte value).
pub use sid_identifier_authority::SidIdentifierAuthority;
pub use topology::{ForestTopology, TopologyCredentials, TopologyDomain, fetch_forest_topology};

#[cfg(test)]
pub(crate) use security_identifier::test::arb_security_identifier;
#[cfg(test)]
pub(crate) use sid_identifier_authority::test::arb_identifier_authority;
