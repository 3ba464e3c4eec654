//! Error types of the trust engine.

use thiserror::Error;

use crate::InvalidSidFormat;
use crate::directory::DirectoryError;
use crate::kerberos::KerberosError;

/// Errors surfaced by the registry, the domain sessions and the join orchestrator.
///
/// Remote status codes never reach callers raw: they are translated by
/// [`crate::status::assess_fault`] into one of the structured variants, with
/// [`TrustError::RemoteProtocol`] as the fallback.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TrustError {
    /// A SID literal or binary blob could not be decoded.
    #[error("malformed SID: {0}")]
    MalformedSid(#[from] InvalidSidFormat),

    /// A SID handed to a resolution call could not be parsed.
    #[error("SID is not valid: {value}")]
    InvalidSid { value: String },

    /// The local domain has no trust configuration object.
    #[error("trust configuration of the local domain is not found")]
    NotConfigured,

    /// The local domain is configured but trusts no other domain.
    #[error("no trusted domain is configured")]
    NoTrustedDomains,

    #[error("not found: {reason}")]
    NotFound { reason: String },

    #[error("ambiguous result: {reason}")]
    AmbiguousResult { reason: String },

    /// Authorization failure reported by a remote service.
    #[error("insufficient access: {info}")]
    AccessDenied { info: String },

    /// A remote service could not be reached or refused to answer.
    #[error("error retrieving remote data: {reason}")]
    ServiceUnreachable { reason: String },

    /// External trusts to a child domain were not allowed by the caller.
    #[error("domain '{domain}' is not a root domain for forest '{forest}'")]
    NotAForestRoot { forest: String, domain: String },

    /// Secure channel verification kept failing with access denied.
    #[error(
        "trust to {domain} could not be verified after {attempts} attempts; \
         check that DNS records {} point to this server \
         so the trusted domain can reach {domain}",
        .records.join(" and ")
    )]
    TrustVerificationFailed {
        attempts: u32,
        domain: String,
        records: Vec<String>,
    },

    /// Remote status that has no translation.
    #[error(
        "remote protocol error (code {}): {}",
        .code.map_or_else(|| "none".to_owned(), |c| format!("{c:#010x}")),
        .message.as_deref().unwrap_or("no message")
    )]
    RemoteProtocol {
        code: Option<i32>,
        message: Option<String>,
    },

    #[error("invalid '{name}': {reason}")]
    Validation { name: String, reason: String },

    #[error("'{name}' is required")]
    Requirement { name: String },

    /// Session keys must carry at least 128 bits.
    #[error("session key of {len} bytes is too short")]
    InvalidSessionKey { len: usize },

    #[error("directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("kerberos error: {0}")]
    Kerberos(#[from] KerberosError),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

impl TrustError {
    #[inline]
    pub fn not_found(reason: impl Into<String>) -> Self {
        Self::NotFound {
            reason: reason.into(),
        }
    }

    #[inline]
    pub fn ambiguous(reason: impl Into<String>) -> Self {
        Self::AmbiguousResult {
            reason: reason.into(),
        }
    }

    #[inline]
    pub fn access_denied(info: impl Into<String>) -> Self {
        Self::AccessDenied { info: info.into() }
    }

    #[inline]
    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self::ServiceUnreachable {
            reason: reason.into(),
        }
    }

    #[inline]
    pub fn validation(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            name: name.into(),
            reason: reason.into(),
        }
    }

    #[inline]
    pub fn requirement(name: impl Into<String>) -> Self {
        Self::Requirement { name: name.into() }
    }

    /// True for errors that mean the remote side rejected our identity.
    #[inline]
    #[must_use]
    pub const fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDenied { .. })
    }
}

pub type Result<T, E = TrustError> = core::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_message_names_records() {
        let err = TrustError::TrustVerificationFailed {
            attempts: 10,
            domain: "ipa.test".into(),
            records: vec![
                "_ldap._tcp.ipa.test".into(),
                "_ldap._tcp.Default-First-Site-Name._sites.dc._msdcs.ipa.test".into(),
            ],
        };
        let message = err.to_string();
        assert!(message.contains("ipa.test"), "{message}");
        assert!(message.contains("_ldap._tcp.Default-First-Site-Name"), "{message}");
        assert!(message.contains("point to this server"), "{message}");
        assert!(!message.contains("domain controllers of"), "{message}");
    }

    #[test]
    fn remote_protocol_keeps_raw_fields() {
        let err = TrustError::RemoteProtocol {
            code: Some(-1_073_741_275),
            message: Some("NT_STATUS_NOT_FOUND".into()),
        };
        assert_eq!(
            err.to_string(),
            "remote protocol error (code 0xc0000225): NT_STATUS_NOT_FOUND"
        );
    }

    #[test]
    fn malformed_sid_converts() {
        let err: TrustError = InvalidSidFormat.into();
        assert!(matches!(err, TrustError::MalformedSid(_)));
    }
}
