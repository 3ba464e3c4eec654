//! Translation of remote RPC status codes and status names into [`TrustError`].
//!
//! Both tables are plain data: a numeric NTSTATUS table consulted first and a
//! status-name table consulted second. Anything left untranslated becomes
//! [`TrustError::RemoteProtocol`] carrying the raw code and message.

use core::fmt::{self, Display};

use crate::TrustError;

/// `NT_STATUS_UNSUCCESSFUL`
pub const STATUS_UNSUCCESSFUL: i32 = -1_073_741_823;
/// `NT_STATUS_ACCESS_DENIED`
pub const STATUS_ACCESS_DENIED: i32 = -1_073_741_790;
/// `NT_STATUS_LOGON_FAILURE`
pub const STATUS_LOGON_FAILURE: i32 = -1_073_741_715;
/// `NT_STATUS_NETWORK_ACCESS_DENIED`
pub const STATUS_NETWORK_ACCESS_DENIED: i32 = -1_073_741_614;
/// `NT_STATUS_INVALID_DOMAIN_STATE`
pub const STATUS_INVALID_DOMAIN_STATE: i32 = -1_073_741_603;
/// `NT_STATUS_INVALID_PARAMETER`
pub const STATUS_INVALID_PARAMETER: i32 = -1_073_741_811;
/// `NT_STATUS_INVALID_PARAMETER_MIX`
pub const STATUS_INVALID_PARAMETER_MIX: i32 = -1_073_741_776;
/// `NT_STATUS_OBJECT_NAME_NOT_FOUND`
pub const STATUS_OBJECT_NAME_NOT_FOUND: i32 = -1_073_741_772;

/// Status name NetLogon reports when the queried DC does not know the trust secret yet.
pub const WERR_ACCESS_DENIED: &str = "WERR_ACCESS_DENIED";

const CREDENTIALS_DENIED: &str = "CIFS server denied your credentials";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Translation {
    AccessDenied(&'static str),
    Unreachable(&'static str),
    NotFound(&'static str),
    Requirement(&'static str),
    Validation {
        name: &'static str,
        reason: &'static str,
    },
}

impl Translation {
    fn to_error(self) -> TrustError {
        match self {
            Self::AccessDenied(info) => TrustError::access_denied(info),
            Self::Unreachable(reason) => TrustError::unreachable(reason),
            Self::NotFound(reason) => TrustError::not_found(reason),
            Self::Requirement(name) => TrustError::requirement(name),
            Self::Validation { name, reason } => TrustError::validation(name, reason),
        }
    }
}

static CODE_TABLE: &[(i32, Translation)] = &[
    (
        STATUS_UNSUCCESSFUL,
        Translation::Unreachable("communication with CIFS server was unsuccessful"),
    ),
    (STATUS_ACCESS_DENIED, Translation::AccessDenied(CREDENTIALS_DENIED)),
    (STATUS_LOGON_FAILURE, Translation::AccessDenied(CREDENTIALS_DENIED)),
    (
        STATUS_NETWORK_ACCESS_DENIED,
        Translation::AccessDenied(CREDENTIALS_DENIED),
    ),
    (
        STATUS_INVALID_DOMAIN_STATE,
        Translation::Validation {
            name: "AD domain controller",
            reason: "unsupported functional level",
        },
    ),
    (
        STATUS_INVALID_PARAMETER,
        Translation::Unreachable(
            "AD domain controller complains about communication sequence. \
             It may mean unsynchronized time on both sides, for example",
        ),
    ),
    // Skips the binding candidate like any other authorization failure.
    (
        STATUS_INVALID_PARAMETER_MIX,
        Translation::AccessDenied(CREDENTIALS_DENIED),
    ),
    (
        STATUS_OBJECT_NAME_NOT_FOUND,
        Translation::Unreachable(
            "CIFS server configuration does not allow access to \\\\pipe\\lsarpc",
        ),
    ),
];

static MESSAGE_TABLE: &[(&str, Translation)] = &[
    (
        "NT_STATUS_OBJECT_NAME_NOT_FOUND",
        Translation::NotFound("Cannot find specified domain or server name"),
    ),
    (
        "WERR_NO_LOGON_SERVERS",
        Translation::Unreachable(
            "AD DC was unable to reach any IPA domain controller. \
             Most likely it is a DNS or firewall issue",
        ),
    ),
    (
        "NT_STATUS_INVALID_PARAMETER_MIX",
        Translation::Requirement("At least the domain or IP address should be specified"),
    ),
];

/// Failure reported by an RPC pipe or the domain controller locator.
///
/// Either part may be absent: transport failures carry only a message,
/// some servers return a bare status code.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RpcFault {
    pub code: Option<i32>,
    pub message: Option<String>,
}

impl RpcFault {
    #[inline]
    #[must_use]
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: Some(message.into()),
        }
    }

    #[inline]
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        Self {
            code: Some(code),
            message: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: Some(message.into()),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_code(&self, code: i32) -> bool {
        self.code == Some(code)
    }
}

impl Display for RpcFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, &self.message) {
            (Some(code), Some(message)) => write!(f, "{code:#010x}: {message}"),
            (Some(code), None) => write!(f, "{code:#010x}"),
            (None, Some(message)) => f.write_str(message),
            (None, None) => f.write_str("unknown fault"),
        }
    }
}

impl core::error::Error for RpcFault {}

impl From<RpcFault> for TrustError {
    #[inline]
    fn from(fault: RpcFault) -> Self {
        assess_fault(fault.code, fault.message.as_deref())
    }
}

/// Translates a remote status into a [`TrustError`].
///
/// The code table wins over the message table; an untranslated pair is
/// returned as [`TrustError::RemoteProtocol`].
#[inline]
#[must_use]
pub fn assess_fault(code: Option<i32>, message: Option<&str>) -> TrustError {
    let by_code = code.and_then(|code| {
        CODE_TABLE
            .iter()
            .find(|(known, _)| *known == code)
            .map(|(_, translation)| *translation)
    });
    let by_message = || {
        message.and_then(|message| {
            MESSAGE_TABLE
                .iter()
                .find(|(known, _)| *known == message)
                .map(|(_, translation)| *translation)
        })
    };
    by_code.or_else(by_message).map_or_else(
        || TrustError::RemoteProtocol {
            code,
            message: message.map(str::to_owned),
        },
        Translation::to_error,
    )
}
