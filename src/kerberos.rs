//! Scoped Kerberos credential caches.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::config::{CcacheKind, TrustConfig};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot obtain credentials for {principal}: {reason}")]
pub struct KerberosError {
    pub principal: String,
    pub reason: String,
}

/// System Kerberos tooling (`kinit`/`kdestroy` equivalents).
pub trait KerberosHelper {
    /// Fills the cache at `ccache` with a ticket obtained from `keytab`.
    ///
    /// # Errors
    /// - [`KerberosError`] if no ticket could be obtained.
    fn init_with_keytab(&self, principal: &str, keytab: &Path, ccache: &Path) -> Result<(), KerberosError>;

    /// Fills the cache at `ccache` with a ticket obtained from `password`.
    ///
    /// # Errors
    /// - [`KerberosError`] if no ticket could be obtained.
    fn init_with_password(&self, principal: &str, password: &str, ccache: &Path) -> Result<(), KerberosError>;

    /// Removes every credential from the cache at `ccache`. Missing caches are not an error.
    fn destroy(&self, ccache: &Path);
}

/// Credential cache dedicated to one trusted domain, destroyed on drop.
///
/// The path is qualified by the domain name, so sessions towards different
/// domains never share a cache. Any stale content is destroyed before the
/// cache is initialized.
pub struct CredentialCache<'k> {
    helper: &'k dyn KerberosHelper,
    path: PathBuf,
    principal: String,
}

impl<'k> CredentialCache<'k> {
    /// Initializes the cache with the local HTTP service principal.
    ///
    /// # Errors
    /// - [`KerberosError`] if the keytab does not yield a ticket.
    #[inline]
    pub fn with_service_keytab(
        helper: &'k dyn KerberosHelper,
        config: &TrustConfig,
        domain: &str,
    ) -> Result<Self, KerberosError> {
        let path = config.ccache_path(CcacheKind::Service, domain);
        let principal = config.service_principal();
        helper.destroy(&path);
        debug!(%principal, ccache = %path.display(), "obtaining service ticket from keytab");
        helper.init_with_keytab(&principal, &config.keytab, &path)?;
        Ok(Self {
            helper,
            path,
            principal,
        })
    }

    /// Initializes the cache with the credentials of a trusted domain administrator.
    ///
    /// # Errors
    /// - [`KerberosError`] if the password is rejected.
    #[inline]
    pub fn with_password(
        helper: &'k dyn KerberosHelper,
        config: &TrustConfig,
        domain: &str,
        principal: &str,
        password: &str,
    ) -> Result<Self, KerberosError> {
        let path = config.ccache_path(CcacheKind::Administrator, domain);
        helper.destroy(&path);
        debug!(%principal, ccache = %path.display(), "obtaining administrator ticket");
        helper.init_with_password(principal, password, &path)?;
        Ok(Self {
            helper,
            path,
            principal: principal.to_owned(),
        })
    }

    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    #[must_use]
    pub fn principal(&self) -> &str {
        &self.principal
    }
}

impl Drop for CredentialCache<'_> {
    fn drop(&mut self) {
        debug!(ccache = %self.path.display(), "destroying credential cache");
        self.helper.destroy(&self.path);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Unwrap is not an issue in test")]
mod tests {
    use super::*;
    use core::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<String>>,
        reject: bool,
    }

    impl KerberosHelper for Recorder {
        fn init_with_keytab(&self, principal: &str, _: &Path, ccache: &Path) -> Result<(), KerberosError> {
            self.calls
                .borrow_mut()
                .push(format!("keytab {principal} {}", ccache.display()));
            Ok(())
        }

        fn init_with_password(&self, principal: &str, _: &str, ccache: &Path) -> Result<(), KerberosError> {
            self.calls
                .borrow_mut()
                .push(format!("password {principal} {}", ccache.display()));
            if self.reject {
                return Err(KerberosError {
                    principal: principal.to_owned(),
                    reason: "preauth failed".to_owned(),
                });
            }
            Ok(())
        }

        fn destroy(&self, ccache: &Path) {
            self.calls.borrow_mut().push(format!("destroy {}", ccache.display()));
        }
    }

    #[test]
    fn cache_is_destroyed_before_and_after_use() {
        let helper = Recorder::default();
        let config = TrustConfig::new("ipa.test", "IPA.TEST", "master.ipa.test");
        {
            let cache = CredentialCache::with_service_keytab(&helper, &config, "ad.test").unwrap();
            assert_eq!(cache.principal(), "HTTP/master.ipa.test@IPA.TEST");
        }
        assert_eq!(
            *helper.calls.borrow(),
            [
                "destroy /run/ipa/ccaches/krbcc_TDad-test",
                "keytab HTTP/master.ipa.test@IPA.TEST /run/ipa/ccaches/krbcc_TDad-test",
                "destroy /run/ipa/ccaches/krbcc_TDad-test",
            ]
        );
    }

    #[test]
    fn rejected_password_leaves_no_guard() {
        let helper = Recorder {
            reject: true,
            ..Recorder::default()
        };
        let config = TrustConfig::new("ipa.test", "IPA.TEST", "master.ipa.test");
        let result = CredentialCache::with_password(&helper, &config, "ad.test", "administrator@AD.TEST", "bad");
        assert!(result.is_err());
        assert_eq!(helper.calls.borrow().len(), 2);
    }
}
