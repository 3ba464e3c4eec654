//! Engine configuration.

use core::time::Duration;
use std::path::PathBuf;

use serde::Deserialize;

use crate::Result;
use crate::directory::realm_to_suffix;

/// Settings of the local domain and of the trust machinery.
///
/// Loaded from TOML; every field but `domain`, `realm` and `host` has a default.
///
/// ```rust
/// # use ad_trust::TrustConfig;
/// let config = TrustConfig::from_toml_str(r#"
///     domain = "ipa.test"
///     realm = "IPA.TEST"
///     host = "master.ipa.test"
/// "#).unwrap();
/// assert_eq!(config.base_dn(), "dc=ipa,dc=test");
/// assert_eq!(config.verification_attempts, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrustConfig {
    /// DNS domain of the local identity domain.
    pub domain: String,
    /// Kerberos realm of the local identity domain.
    pub realm: String,
    /// FQDN of this server.
    pub host: String,
    /// Suffix of the local directory, derived from `domain` when absent.
    #[serde(default)]
    pub basedn: Option<String>,
    #[serde(default = "default_container_cifsdomains")]
    pub container_cifsdomains: String,
    #[serde(default = "default_container_trusts")]
    pub container_trusts: String,
    #[serde(default = "default_realm_domains_dn")]
    pub realm_domains_dn: String,
    #[serde(default = "default_ccache_dir")]
    pub ccache_dir: PathBuf,
    #[serde(default = "default_ccache_prefix")]
    pub ccache_prefix: String,
    /// Keytab of the HTTP service principal.
    #[serde(default = "default_keytab")]
    pub keytab: PathBuf,
    #[serde(default = "default_verification_attempts")]
    pub verification_attempts: u32,
    #[serde(default = "default_verification_delay_secs")]
    pub verification_delay_secs: u64,
}

fn default_container_cifsdomains() -> String {
    "cn=ad,cn=etc".to_owned()
}

fn default_container_trusts() -> String {
    "cn=trusts".to_owned()
}

fn default_realm_domains_dn() -> String {
    "cn=Realm Domains,cn=ipa,cn=etc".to_owned()
}

fn default_ccache_dir() -> PathBuf {
    PathBuf::from("/run/ipa/ccaches")
}

fn default_ccache_prefix() -> String {
    "krbcc_".to_owned()
}

fn default_keytab() -> PathBuf {
    PathBuf::from("/etc/httpd/conf/ipa.keytab")
}

const fn default_verification_attempts() -> u32 {
    10
}

const fn default_verification_delay_secs() -> u64 {
    5
}

/// Which identity a scoped credential cache is initialized with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CcacheKind {
    /// Local HTTP service principal from the keytab.
    Service,
    /// Administrator of the trusted domain.
    Administrator,
}

impl TrustConfig {
    /// Configuration with every optional setting at its default.
    #[inline]
    #[must_use]
    pub fn new(domain: impl Into<String>, realm: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            realm: realm.into(),
            host: host.into(),
            basedn: None,
            container_cifsdomains: default_container_cifsdomains(),
            container_trusts: default_container_trusts(),
            realm_domains_dn: default_realm_domains_dn(),
            ccache_dir: default_ccache_dir(),
            ccache_prefix: default_ccache_prefix(),
            keytab: default_keytab(),
            verification_attempts: default_verification_attempts(),
            verification_delay_secs: default_verification_delay_secs(),
        }
    }

    /// # Errors
    /// - [`crate::TrustError::Config`] if the document is not valid TOML or misses a field.
    #[inline]
    pub fn from_toml_str(document: &str) -> Result<Self> {
        Ok(toml::from_str(document)?)
    }

    #[inline]
    #[must_use]
    pub fn base_dn(&self) -> String {
        self.basedn
            .clone()
            .unwrap_or_else(|| realm_to_suffix(&self.domain))
    }

    /// DN of the trust configuration object of the local domain.
    #[inline]
    #[must_use]
    pub fn cifs_domain_dn(&self) -> String {
        format!(
            "cn={},{},{}",
            self.domain,
            self.container_cifsdomains,
            self.base_dn()
        )
    }

    /// Container holding the trusted domain objects.
    #[inline]
    #[must_use]
    pub fn trusts_dn(&self) -> String {
        format!("cn=ad,{},{}", self.container_trusts, self.base_dn())
    }

    #[inline]
    #[must_use]
    pub fn realm_domains_entry_dn(&self) -> String {
        format!("{},{}", self.realm_domains_dn, self.base_dn())
    }

    /// `HTTP/<host>@<REALM>`
    #[inline]
    #[must_use]
    pub fn service_principal(&self) -> String {
        format!("HTTP/{}@{}", self.host, self.realm)
    }

    #[inline]
    #[must_use]
    pub const fn verification_delay(&self) -> Duration {
        Duration::from_secs(self.verification_delay_secs)
    }

    /// Path of the credential cache dedicated to `domain`.
    ///
    /// Dots of the domain become dashes: `<prefix>TD<domain>` for the
    /// service identity, `<prefix>TDA<domain>` for the administrator.
    #[inline]
    #[must_use]
    pub fn ccache_path(&self, kind: CcacheKind, domain: &str) -> PathBuf {
        let tag = match kind {
            CcacheKind::Service => "TD",
            CcacheKind::Administrator => "TDA",
        };
        let name = format!("{}{tag}{}", self.ccache_prefix, domain.replace('.', "-"));
        self.ccache_dir.join(name)
    }
}
