use core::fmt;
use std::path::PathBuf;

use zeroize::Zeroizing;

use crate::{Result, TrustError};

/// How an RPC client authenticates.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Null session, enough for domain controller discovery.
    Anonymous,
    /// Kerberos only, from the given cache or the ambient one.
    Kerberos { ccache: Option<PathBuf> },
    /// NTLM with the password of a trusted domain account.
    Password {
        domain: String,
        user: String,
        password: Zeroizing<String>,
    },
}

impl Credentials {
    /// Parses a `DOMAIN\user%password` authentication string.
    ///
    /// # Errors
    /// - [`TrustError::Validation`] if the domain or the password separator is missing.
    #[inline]
    pub fn from_auth_string(auth: &str) -> Result<Self> {
        let invalid = || TrustError::validation("credentials", "expected DOMAIN\\user%password");
        let (account, password) = auth.split_once('%').ok_or_else(invalid)?;
        let (domain, user) = account.split_once('\\').ok_or_else(invalid)?;
        if domain.is_empty() || user.is_empty() {
            return Err(invalid());
        }
        Ok(Self::Password {
            domain: domain.to_owned(),
            user: user.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    #[inline]
    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str("Anonymous"),
            Self::Kerberos { ccache } => f.debug_struct("Kerberos").field("ccache", ccache).finish(),
            Self::Password { domain, user, .. } => f
                .debug_struct("Password")
                .field("domain", domain)
                .field("user", user)
                .finish_non_exhaustive(),
        }
    }
}

/// Credentials plus the NetBIOS identity presented to the remote side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    pub credentials: Credentials,
    /// NetBIOS name of this machine.
    pub workstation: String,
    /// NetBIOS name of the domain this machine claims to belong to.
    pub workgroup: Option<String>,
}

impl ClientIdentity {
    #[inline]
    #[must_use]
    pub fn new(credentials: Credentials, workstation: impl Into<String>) -> Self {
        Self {
            credentials,
            workstation: workstation.into(),
            workgroup: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_workgroup(mut self, workgroup: impl Into<String>) -> Self {
        self.workgroup = Some(workgroup.into());
        self
    }
}
