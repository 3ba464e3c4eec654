//! Establishing a trust between the local domain and a remote AD forest.

use tracing::{debug, info};

use crate::nttime::{datetime_to_nttime, parse_generalized_time};
use crate::rpc::lsa::ForestTrustRecord;
use crate::rpc::{ClientIdentity, Credentials};
use crate::session::{DomainInfo, DomainSession, TrustDirection, TrustSecret};
use crate::{DomainRegistry, Result, TrustContext, TrustError};

/// Summary of an established trust.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinResult {
    pub local: DomainInfo,
    pub remote: DomainInfo,
    /// Whether the remote domain confirmed the trust.
    pub verified: bool,
}

/// What a join request ended with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The local domain is not configured for trusts.
    NotApplicable,
    /// The remote domain was only discovered anonymously; nothing was written.
    DiscoveredOnly { remote: DomainInfo },
    Established(JoinResult),
}

/// Drives a join between the local domain and one remote domain.
///
/// # Examples
/// ```rust,no_run
/// # use ad_trust::{TrustContext, TrustDomainJoins, TrustDirection, JoinOutcome};
/// # fn join(ctx: &TrustContext) -> ad_trust::Result<()> {
/// let mut joins = TrustDomainJoins::new(ctx)?;
/// let outcome = joins.join_with_credentials(
///     "ad.test",
///     None,
///     Some("AD\\Administrator"),
///     Some("Secret123"),
///     TrustDirection::Bidirectional,
/// )?;
/// if let JoinOutcome::Established(result) = outcome {
///     assert!(result.verified);
/// }
/// # Ok(())
/// # }
/// ```
pub struct TrustDomainJoins<'ctx> {
    ctx: &'ctx TrustContext,
    local: Option<DomainSession<'ctx>>,
    local_flat_name: String,
    remote: Option<DomainSession<'ctx>>,
    allow_external: bool,
}

impl<'ctx> TrustDomainJoins<'ctx> {
    /// Reads the local domain through its own LSA, with the ambient Kerberos ticket.
    ///
    /// An unconfigured local domain is not an error; every join then
    /// returns [`JoinOutcome::NotApplicable`].
    ///
    /// # Errors
    /// - [`TrustError::Directory`] if the trust configuration cannot be read.
    /// - Errors of [`DomainSession::retrieve`] against the local host.
    #[inline]
    pub fn new(ctx: &'ctx TrustContext) -> Result<Self> {
        let mut registry = DomainRegistry::new(ctx);
        let mut joins = Self {
            ctx,
            local: None,
            local_flat_name: String::new(),
            remote: None,
            allow_external: false,
        };
        if !registry.is_configured()? {
            debug!("local domain is not configured for trusts");
            return Ok(joins);
        }
        let Some(local_domain) = registry.local_domain() else {
            return Ok(joins);
        };
        joins.local_flat_name.clone_from(&local_domain.flat_name);
        let identity = ClientIdentity::new(Credentials::Kerberos { ccache: None }, &joins.local_flat_name);
        let mut local = DomainSession::new(ctx, Some(identity));
        local.retrieve(&ctx.config.host)?;
        joins.local = Some(local);
        Ok(joins)
    }

    #[inline]
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.local.is_some()
    }

    /// Allows external (non-transitive) trusts with domains that are not a forest root.
    #[inline]
    pub const fn allow_external(&mut self, allow: bool) {
        self.allow_external = allow;
    }

    #[inline]
    #[must_use]
    pub const fn local_session(&self) -> Option<&DomainSession<'ctx>> {
        self.local.as_ref()
    }

    #[inline]
    #[must_use]
    pub const fn remote_session(&self) -> Option<&DomainSession<'ctx>> {
        self.remote.as_ref()
    }

    /// Discovers the remote domain `realm`, or the one served by `server`.
    ///
    /// Without administrator credentials the remote session is read-only.
    /// With them the `DOMAIN\` part of `admin` is replaced by the discovered
    /// NetBIOS name and the domain is read again through an authenticated LSA.
    ///
    /// # Errors
    /// - [`TrustError::NotConfigured`] if the local domain is not configured.
    /// - [`TrustError::NotFound`] if no controller of `realm` (or `server`) answered.
    /// - [`TrustError::Requirement`] if the remote controller host name is unknown.
    /// - Errors of [`DomainSession::retrieve_anonymously`] and [`DomainSession::retrieve`].
    #[inline]
    pub fn populate_remote_domain(
        &mut self,
        realm: &str,
        server: Option<&str>,
        admin: Option<&str>,
        password: Option<&str>,
    ) -> Result<()> {
        let local = self.local.as_ref().ok_or(TrustError::NotConfigured)?;
        let anonymous = ClientIdentity::new(Credentials::Anonymous, &self.local_flat_name)
            .with_workgroup(&local.info.name);
        let mut discovered = DomainSession::new(self.ctx, Some(anonymous));
        let found = match server {
            None => discovered.retrieve_anonymously(realm, true, true)?,
            Some(server) => discovered.retrieve_anonymously(server, false, true)?,
        };
        if !found {
            return Err(TrustError::not_found(format!(
                "no domain controller of {} answered",
                server.unwrap_or(realm)
            )));
        }
        discovered.read_only = true;

        let admin = admin.filter(|admin| !admin.is_empty());
        let password = password.filter(|password| !password.is_empty());
        if let (Some(admin), Some(password)) = (admin, password) {
            let user = admin.rsplit('\\').next().unwrap_or(admin);
            let credentials =
                Credentials::from_auth_string(&format!("{}\\{user}%{password}", discovered.info.name))?;
            let identity = ClientIdentity::new(credentials, &self.local_flat_name)
                .with_workgroup(&local.info.name);
            let host = match server {
                Some(server) => server.to_owned(),
                None => discovered
                    .info
                    .dns_hostname
                    .clone()
                    .ok_or_else(|| TrustError::requirement("DNS host name of the remote domain controller"))?,
            };
            let mut authenticated = DomainSession::new(self.ctx, Some(identity));
            authenticated.retrieve(&host)?;
            self.remote = Some(authenticated);
            return Ok(());
        }
        self.remote = Some(discovered);
        Ok(())
    }

    /// Establishes both halves of a trust with `realm` and verifies it.
    ///
    /// A fresh secret is generated and written on the remote side first. Only
    /// bidirectional trusts are verified; the remote side does not answer
    /// verification requests for inbound ones.
    ///
    /// # Errors
    /// - [`TrustError::NotAForestRoot`] if `realm` is not a forest root and
    ///   external trusts are not allowed.
    /// - Errors of [`TrustDomainJoins::populate_remote_domain`],
    ///   [`DomainSession::establish_trust`] and [`DomainSession::verify_trust`].
    #[inline]
    pub fn join_with_credentials(
        &mut self,
        realm: &str,
        server: Option<&str>,
        admin: Option<&str>,
        password: Option<&str>,
        direction: TrustDirection,
    ) -> Result<JoinOutcome> {
        if self.local.is_none() {
            return Ok(JoinOutcome::NotApplicable);
        }
        if self.remote.is_none() {
            self.populate_remote_domain(realm, server, admin, password)?;
        }
        let external = self.allow_external;
        if let Some(remote) = self.remote.as_ref() {
            check_forest_root(remote, external)?;
            if remote.read_only {
                return Ok(JoinOutcome::DiscoveredOnly {
                    remote: remote.info.clone(),
                });
            }
        }
        let records = self.realm_domain_records()?;
        let (Some(local), Some(remote)) = (self.local.as_mut(), self.remote.as_mut()) else {
            return Ok(JoinOutcome::NotApplicable);
        };

        let secret = TrustSecret::generate();
        local.ftinfo_records = records;
        remote.establish_trust(local, &secret, direction, external)?;
        local.establish_trust(remote, &secret, direction, external)?;
        let verified = if direction.is_bidirectional() {
            remote.verify_trust(local)?
        } else {
            true
        };
        info!(remote = %remote.info.dns_domain, verified, "trust established");
        Ok(JoinOutcome::Established(JoinResult {
            local: local.info.clone(),
            remote: remote.info.clone(),
            verified,
        }))
    }

    /// Establishes the local half of a trust whose remote half was set up
    /// by the remote administrator with the same `secret`.
    ///
    /// The trust cannot be verified from this side.
    ///
    /// # Errors
    /// - As for [`TrustDomainJoins::join_with_credentials`].
    #[inline]
    pub fn join_half_with_secret(
        &mut self,
        realm: &str,
        server: Option<&str>,
        secret: &TrustSecret,
        direction: TrustDirection,
    ) -> Result<JoinOutcome> {
        if self.local.is_none() {
            return Ok(JoinOutcome::NotApplicable);
        }
        if self.remote.is_none() {
            self.populate_remote_domain(realm, server, None, None)?;
        }
        let external = self.allow_external;
        let (Some(local), Some(remote)) = (self.local.as_mut(), self.remote.as_ref()) else {
            return Ok(JoinOutcome::NotApplicable);
        };
        check_forest_root(remote, external)?;
        local.establish_trust(remote, secret, direction, external)?;
        Ok(JoinOutcome::Established(JoinResult {
            local: local.info.clone(),
            remote: remote.info.clone(),
            verified: false,
        }))
    }

    /// Top level names of the local realm, stamped with the last change of the realm domains.
    fn realm_domain_records(&self) -> Result<Vec<ForestTrustRecord>> {
        let dn = self.ctx.config.realm_domains_entry_dn();
        let entry = self
            .ctx
            .directory
            .get_entry(&dn, &["modifyTimestamp", "associatedDomain"])?;
        let modified = entry
            .first_str("modifyTimestamp")
            .ok_or_else(|| TrustError::validation("realm domains", "entry has no modifyTimestamp"))?;
        let time = datetime_to_nttime(parse_generalized_time(modified)?);
        Ok(entry
            .strs("associatedDomain")
            .map(|domain| ForestTrustRecord::top_level_name(domain.to_owned(), time))
            .collect())
    }
}

fn check_forest_root(remote: &DomainSession<'_>, external: bool) -> Result<()> {
    if remote.info.dns_domain != remote.info.dns_forest && !external {
        return Err(TrustError::NotAForestRoot {
            forest: remote.info.dns_forest.clone(),
            domain: remote.info.dns_domain.clone(),
        });
    }
    Ok(())
}
