//! One authenticated conversation with a domain's Local Security Authority.
//!
//! A [`DomainSession`] describes either side of a trust: it negotiates a
//! working LSA binding, reads the domain identity, writes the trusted domain
//! object and asks NetLogon to verify the trust.

use core::fmt;
use std::sync::LazyLock;
use std::thread;

use rand::Rng;
use rand::distributions::Alphanumeric;
use regex::Regex;
use tracing::{debug, error, warn};
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::auth_blob::{AuthenticationInformation, TrustAuthInOutBlob, TrustDomainPasswords};
use crate::cipher::arcfour_encrypt;
use crate::directory::{DirectoryBind, LDAP_PORT, Scope};
use crate::nttime;
use crate::rpc::lsa::{
    AuthInfoInternal, ForestTrustRecord, KERB_ENCTYPE_AES128_CTS_HMAC_SHA1_96,
    KERB_ENCTYPE_AES256_CTS_HMAC_SHA1_96, KERB_ENCTYPE_RC4_HMAC_MD5, PolicyHandle, PolicyRole,
    TRUST_ATTRIBUTE_FOREST_TRANSITIVE, TRUST_ATTRIBUTE_NON_TRANSITIVE, TRUST_DIRECTION_INBOUND,
    TRUST_DIRECTION_OUTBOUND, TRUST_TYPE_UPLEVEL, TrustedDomainInfoEx,
};
use crate::rpc::netlogon::NETLOGON_CONTROL_TC_VERIFY;
use crate::rpc::{Binding, ClientIdentity, DcTarget, LsaPipe, ServerFlags};
use crate::status::{RpcFault, STATUS_ACCESS_DENIED, WERR_ACCESS_DENIED, assess_fault};
use crate::{Result, SecurityIdentifier, TrustContext, TrustError};

/// Length of the secrets generated for new trusts.
pub const GENERATED_SECRET_LEN: usize = 128;

#[expect(clippy::expect_used, reason = "The pattern is a literal")]
static NAMING_CONTEXT_SID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r".*<SID=(S-.*)>.*").expect("valid naming context pattern"));

/// Where a session stands in the trust setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionPhase {
    #[default]
    Unbound,
    Bound,
    PolicyOpen,
    /// The domain identity has been read.
    Queried,
    /// A trusted domain object has been written.
    TrustWritten,
    Verified,
    Failed,
}

/// Direction of a trust, seen from the domain that trusts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TrustDirection {
    /// Users of the other domain may access this one.
    Inbound,
    #[default]
    Bidirectional,
}

impl TrustDirection {
    #[inline]
    #[must_use]
    pub const fn is_bidirectional(self) -> bool {
        matches!(self, Self::Bidirectional)
    }

    const fn lsa_direction(self) -> u32 {
        match self {
            Self::Inbound => TRUST_DIRECTION_INBOUND,
            Self::Bidirectional => TRUST_DIRECTION_INBOUND | TRUST_DIRECTION_OUTBOUND,
        }
    }
}

/// Shared secret of a trust, wiped from memory on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct TrustSecret(Zeroizing<String>);

impl TrustSecret {
    #[inline]
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Zeroizing::new(secret.into()))
    }

    /// Random alphanumeric secret of [`GENERATED_SECRET_LEN`] characters.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        let secret: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(GENERATED_SECRET_LEN)
            .map(char::from)
            .collect();
        Self::new(secret)
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TrustSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TrustSecret(..)")
    }
}

/// Identity of a domain as read from one of its controllers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DomainInfo {
    /// NetBIOS name.
    pub name: String,
    pub dns_domain: String,
    pub dns_forest: String,
    pub guid: Uuid,
    /// Unknown after an anonymous discovery that could not read the root DSE.
    pub sid: Option<SecurityIdentifier>,
    /// Controller the information was read from.
    pub dc: String,
    pub is_pdc: bool,
    pub dns_hostname: Option<String>,
}

/// An LSA session with one domain controller.
pub struct DomainSession<'ctx> {
    ctx: &'ctx TrustContext,
    identity: Option<ClientIdentity>,
    binding: Option<Binding>,
    pipe: Option<Box<dyn LsaPipe>>,
    policy: Option<PolicyHandle>,
    auth_info: Option<AuthInfoInternal>,
    phase: SessionPhase,
    pub info: DomainInfo,
    /// Only discovered anonymously; no trust can be written through it.
    pub read_only: bool,
    /// Top level names this domain routes, pushed to the other side of a trust.
    pub ftinfo_records: Vec<ForestTrustRecord>,
}

impl<'ctx> DomainSession<'ctx> {
    #[inline]
    #[must_use]
    pub fn new(ctx: &'ctx TrustContext, identity: Option<ClientIdentity>) -> Self {
        Self {
            ctx,
            identity,
            binding: None,
            pipe: None,
            policy: None,
            auth_info: None,
            phase: SessionPhase::Unbound,
            info: DomainInfo::default(),
            read_only: false,
            ftinfo_records: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Binding selected by [`DomainSession::negotiate_binding`].
    #[inline]
    #[must_use]
    pub const fn binding(&self) -> Option<&Binding> {
        self.binding.as_ref()
    }

    #[inline]
    #[must_use]
    pub const fn identity(&self) -> Option<&ClientIdentity> {
        self.identity.as_ref()
    }

    /// Replaces the credentials; any negotiated binding is dropped with them.
    #[inline]
    pub fn set_identity(&mut self, identity: ClientIdentity) {
        self.close_policy();
        self.pipe = None;
        self.binding = None;
        self.phase = SessionPhase::Unbound;
        self.identity = Some(identity);
    }

    fn fail(&mut self, err: TrustError) -> TrustError {
        self.phase = SessionPhase::Failed;
        err
    }

    /// Connects to the LSA of `remote_host`.
    ///
    /// Every [candidate binding](Binding::candidates) is tried in order; the
    /// first one yielding a session key wins. Once a pipe is open further
    /// calls do nothing.
    ///
    /// # Errors
    /// - [`TrustError::Requirement`] if the session has no credentials.
    /// - [`TrustError::AccessDenied`] if every candidate was rejected or
    ///   returned no session key.
    /// - [`TrustError::ServiceUnreachable`] otherwise.
    #[inline]
    pub fn negotiate_binding(&mut self, remote_host: &str) -> Result<()> {
        if self.pipe.is_some() {
            return Ok(());
        }
        let Some(identity) = self.identity.as_ref() else {
            return Err(TrustError::requirement("CIFS credentials object"));
        };
        let candidates = Binding::candidates(remote_host);
        let mut rejected = 0;
        for binding in &candidates {
            match self.ctx.lsa.connect(binding, identity) {
                Ok(pipe) if !pipe.session_key().is_empty() => {
                    debug!(%binding, "LSA binding negotiated");
                    self.binding = Some(binding.clone());
                    self.pipe = Some(pipe);
                    self.phase = SessionPhase::Bound;
                    return Ok(());
                }
                Ok(_) => {
                    debug!(%binding, "no session key, skipping binding");
                    rejected += 1;
                }
                Err(fault) => {
                    let err = TrustError::from(fault);
                    debug!(%binding, error = %err, "LSA binding failed");
                    if err.is_access_denied() {
                        rejected += 1;
                    }
                }
            }
        }
        let err = if rejected == candidates.len() {
            TrustError::access_denied(format!("CIFS server {remote_host} denied your credentials"))
        } else {
            TrustError::unreachable(format!(
                "Cannot establish LSA connection to {remote_host}. Is CIFS server running?"
            ))
        };
        Err(self.fail(err))
    }

    fn pipe(&self) -> Result<&dyn LsaPipe> {
        self.pipe
            .as_deref()
            .ok_or_else(|| TrustError::requirement("LSA connection"))
    }

    fn policy(&self) -> Result<&PolicyHandle> {
        self.policy
            .as_ref()
            .ok_or_else(|| TrustError::requirement("LSA policy handle"))
    }

    /// Reads the identity and role of the domain served by `remote_host`.
    ///
    /// # Errors
    /// - Errors of [`DomainSession::negotiate_binding`].
    /// - The translated status of a failed policy call.
    #[inline]
    pub fn retrieve(&mut self, remote_host: &str) -> Result<()> {
        self.negotiate_binding(remote_host)?;
        self.query_policy(remote_host).map_err(|err| self.fail(err))
    }

    fn query_policy(&mut self, remote_host: &str) -> Result<()> {
        if self.policy.is_none() {
            self.policy = Some(self.pipe()?.open_policy2()?);
            self.phase = SessionPhase::PolicyOpen;
        }
        let pipe = self.pipe()?;
        let policy = self.policy()?;
        let dns = pipe.query_dns_domain_info(policy)?;
        let role = pipe.query_role(policy)?;
        self.info = DomainInfo {
            name: dns.name,
            dns_domain: dns.dns_domain,
            dns_forest: dns.dns_forest,
            guid: dns.domain_guid,
            sid: dns.sid,
            dc: remote_host.to_owned(),
            is_pdc: PolicyRole::try_from(role) == Ok(PolicyRole::Primary),
            dns_hostname: self.info.dns_hostname.take(),
        };
        self.phase = SessionPhase::Queried;
        Ok(())
    }

    /// Discovers a domain without credentials.
    ///
    /// `target` is a DNS domain when `discover_srv` is set and a controller
    /// address otherwise. The domain SID is recovered from the
    /// `defaultNamingContext` of the controller's root DSE; when that read
    /// fails the SID stays unknown.
    ///
    /// Returns `false` when no controller answered.
    ///
    /// # Errors
    /// - The translated locator error.
    #[inline]
    pub fn retrieve_anonymously(&mut self, target: &str, discover_srv: bool, search_pdc: bool) -> Result<bool> {
        let mut flags = ServerFlags::LDAP | ServerFlags::DS | ServerFlags::WRITABLE;
        if search_pdc {
            flags = flags | ServerFlags::PDC;
        }
        let target = if discover_srv {
            DcTarget::Domain(target.to_owned())
        } else {
            DcTarget::Address(target.to_owned())
        };
        let dc = match self.ctx.locator.find_dc(&target, flags) {
            Ok(Some(dc)) => dc,
            Ok(None) => return Ok(false),
            Err(fault) => return Err(self.fail(assess_fault(None, fault.message.as_deref()))),
        };
        self.info = DomainInfo {
            name: dc.domain_name,
            dns_domain: dc.dns_domain,
            dns_forest: dc.forest,
            guid: dc.domain_uuid,
            sid: None,
            dc: dc.pdc_dns_name,
            is_pdc: dc.server_type.contains(ServerFlags::PDC),
            dns_hostname: None,
        };
        self.read_root_dse(&dc.pdc_name);
        self.phase = SessionPhase::Queried;
        Ok(true)
    }

    fn read_root_dse(&mut self, pdc_name: &str) {
        let bind = DirectoryBind::Anonymous { extended_dn: true };
        let entry = self
            .ctx
            .remote_directory
            .connect(&self.info.dc, LDAP_PORT, &bind)
            .and_then(|conn| {
                conn.search(
                    "",
                    Scope::Base,
                    "(objectClass=*)",
                    &["defaultNamingContext", "dnsHostName"],
                )
            });
        let entry = match entry {
            Ok(result) => result.entries.into_iter().next(),
            Err(err) => {
                error!(host = %pdc_name, error = %err, "LDAP error when reading the root DSE");
                return;
            }
        };
        let (Some(context), Some(hostname)) = (
            entry.as_ref().and_then(|entry| entry.first_str("defaultNamingContext")),
            entry.as_ref().and_then(|entry| entry.first_str("dnsHostName")),
        ) else {
            error!(host = %pdc_name, "root DSE returned malformed, DNS might be misconfigured");
            return;
        };
        self.info.dns_hostname = Some(hostname.to_owned());
        self.info.sid = parse_naming_context(context);
        if self.info.sid.is_none() {
            warn!(host = %pdc_name, %context, "naming context carries no domain SID");
        }
    }

    /// Encrypts `secret` as the authentication information of a new trust.
    ///
    /// # Errors
    /// - [`TrustError::Requirement`] without an LSA connection.
    /// - [`TrustError::InvalidSessionKey`] if the session key cannot key RC4.
    #[inline]
    pub fn generate_auth(&mut self, secret: &TrustSecret) -> Result<()> {
        let pipe = self.pipe()?;
        let current = AuthenticationInformation::clear(secret.as_str(), nttime::now());
        let passwords = TrustDomainPasswords::symmetric(TrustAuthInOutBlob::new(vec![current]));
        let auth_blob = arcfour_encrypt(pipe.session_key(), &passwords.encode())?;
        self.auth_info = Some(AuthInfoInternal { auth_blob });
        Ok(())
    }

    /// Writes the trusted domain object describing `other` in this domain.
    ///
    /// Any previous object for `other` is removed first. Adjusting encryption
    /// types, transitivity and forest trust information is best effort.
    ///
    /// # Errors
    /// - [`TrustError::Validation`] if both domains share a NetBIOS name.
    /// - [`TrustError::Requirement`] if `other` has no known SID or no policy is open.
    /// - [`TrustError::AccessDenied`] if removing the previous object is denied.
    /// - The translated status of a failed creation.
    #[inline]
    pub fn establish_trust(
        &mut self,
        other: &DomainSession<'_>,
        secret: &TrustSecret,
        direction: TrustDirection,
        external: bool,
    ) -> Result<()> {
        if self.info.name.eq_ignore_ascii_case(&other.info.name) {
            return Err(TrustError::validation(
                "AD Trust Setup",
                format!(
                    "the IPA server and the remote domain cannot share the same NetBIOS name: {}",
                    self.info.name
                ),
            ));
        }
        let sid = other
            .info
            .sid
            .ok_or_else(|| TrustError::requirement("SID of the trusted domain"))?;
        self.generate_auth(secret)?;
        self.write_trust(other, sid, direction, external)
            .map_err(|err| self.fail(err))
    }

    fn write_trust(
        &mut self,
        other: &DomainSession<'_>,
        sid: SecurityIdentifier,
        direction: TrustDirection,
        external: bool,
    ) -> Result<()> {
        let pipe = self.pipe()?;
        let policy = self.policy()?;
        let auth = self
            .auth_info
            .as_ref()
            .ok_or_else(|| TrustError::requirement("trust authentication information"))?;
        let domain = other.info.dns_domain.as_str();

        let previous = pipe
            .query_trusted_domain_by_name(policy, domain)
            .and_then(|existing| pipe.delete_trusted_domain(policy, &existing.sid));
        match previous {
            Err(fault) if fault.is_code(STATUS_ACCESS_DENIED) => return Err(fault.into()),
            Err(fault) => debug!(%domain, %fault, "no previous trusted domain object removed"),
            Ok(()) => debug!(%domain, "previous trusted domain object removed"),
        }

        let info = TrustedDomainInfoEx {
            domain_name: domain.to_owned(),
            netbios_name: other.info.name.clone(),
            sid,
            trust_direction: direction.lsa_direction(),
            trust_type: TRUST_TYPE_UPLEVEL,
            trust_attributes: if external { TRUST_ATTRIBUTE_NON_TRANSITIVE } else { 0 },
        };
        let created = pipe.create_trusted_domain_ex2(policy, &info, auth)?;
        // Settings are only accepted through a handle opened by name.
        if let Err(fault) = pipe.close(created.0) {
            debug!(%domain, %fault, "cannot close creation handle");
        }
        let handle = pipe.open_trusted_domain_by_name(policy, domain)?;

        let enc_types = KERB_ENCTYPE_RC4_HMAC_MD5
            | KERB_ENCTYPE_AES128_CTS_HMAC_SHA1_96
            | KERB_ENCTYPE_AES256_CTS_HMAC_SHA1_96;
        if let Err(fault) = pipe.set_supported_enc_types(&handle, enc_types) {
            debug!(%domain, %fault, "keeping default encryption types");
        }

        if !external {
            let transitive = pipe.query_trusted_domain_info_ex(&handle).and_then(|mut info| {
                info.trust_attributes |= TRUST_ATTRIBUTE_FOREST_TRANSITIVE;
                pipe.set_trusted_domain_info_ex(&handle, &info)
            });
            if let Err(fault) = transitive {
                error!(%domain, %fault, "unable to set trust transitivity status");
            }
        }
        if let Err(fault) = pipe.close(handle.0) {
            debug!(%domain, %fault, "cannot close trusted domain handle");
        }

        if self.info.is_pdc || external {
            self.update_forest_trust_info(other);
        }
        self.phase = SessionPhase::TrustWritten;
        Ok(())
    }

    /// Routes the top level names of `other` to the trust with it.
    ///
    /// Failures and collisions are logged only.
    #[inline]
    pub fn update_forest_trust_info(&self, other: &DomainSession<'_>) {
        if other.ftinfo_records.is_empty() {
            return;
        }
        let domain = other.info.dns_domain.as_str();
        let (Ok(pipe), Ok(policy)) = (self.pipe(), self.policy()) else {
            debug!(%domain, "no open policy, forest trust information not updated");
            return;
        };
        match pipe.set_forest_trust_information(policy, domain, &other.ftinfo_records) {
            Ok(Some(collisions)) => {
                error!(%domain, %collisions, "setting forest trust information reported collisions");
            }
            Ok(None) => debug!(%domain, "forest trust information updated"),
            Err(fault) => debug!(%domain, %fault, "cannot set forest trust information"),
        }
    }

    /// Asks this domain's NetLogon to verify its trust with `other`.
    ///
    /// While the controller reports `WERR_ACCESS_DENIED` (a replica without the
    /// trust secret yet) the request is repeated, up to the configured number
    /// of attempts with the configured delay in between.
    ///
    /// Returns `false` when no verification status was returned.
    ///
    /// # Errors
    /// - [`TrustError::TrustVerificationFailed`] when every attempt was denied.
    /// - The translated NetLogon status of any other failure.
    #[inline]
    pub fn verify_trust(&mut self, other: &DomainSession<'_>) -> Result<bool> {
        self.check_trust(other).map_err(|err| self.fail(err))
    }

    fn check_trust(&mut self, other: &DomainSession<'_>) -> Result<bool> {
        let binding = self
            .binding
            .as_ref()
            .ok_or_else(|| TrustError::requirement("LSA binding"))?;
        let identity = self
            .identity
            .as_ref()
            .ok_or_else(|| TrustError::requirement("CIFS credentials object"))?;
        let config = &self.ctx.config;
        let domain = other.info.dns_domain.as_str();
        let attempts = config.verification_attempts.max(1);
        for attempt in 1..=attempts {
            let netlogon = self.ctx.netlogon.connect(binding, identity)?;
            let info = netlogon.logon_control2_ex(NETLOGON_CONTROL_TC_VERIFY, 2, domain)?;
            let Some(info) = info.filter(|info| info.status_returned()) else {
                return Ok(false);
            };
            if info.pdc_connection_status.is_ok() || info.tc_connection_status.is_ok() {
                self.phase = SessionPhase::Verified;
                return Ok(true);
            }
            if info.pdc_connection_status.name != WERR_ACCESS_DENIED {
                return Err(RpcFault::from(&info.pdc_connection_status).into());
            }
            if attempt < attempts {
                warn!(%domain, attempt, "trust validation denied, retrying");
                thread::sleep(config.verification_delay());
            }
        }
        Err(TrustError::TrustVerificationFailed {
            attempts,
            domain: domain.to_owned(),
            records: vec![
                format!("_ldap._tcp.{domain}"),
                format!("_ldap._tcp.Default-First-Site-Name._sites.dc._msdcs.{domain}"),
            ],
        })
    }

    fn close_policy(&mut self) {
        if let (Some(pipe), Some(policy)) = (self.pipe.as_deref(), self.policy.take()) {
            if let Err(fault) = pipe.close(policy.0) {
                debug!(%fault, "cannot close policy handle");
            }
        }
    }
}

impl Drop for DomainSession<'_> {
    fn drop(&mut self) {
        self.close_policy();
    }
}

/// Domain SID embedded in an extended DN such as `<GUID=…>;<SID=S-1-5-21-…>;DC=ad,DC=test`.
fn parse_naming_context(context: &str) -> Option<SecurityIdentifier> {
    let captured = NAMING_CONTEXT_SID.captures(context)?.get(1)?.as_str();
    // The capture is greedy; the SID ends at the first '>'.
    let sid = captured.split('>').next().unwrap_or(captured);
    sid.parse().ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Unwrap is not an issue in test")]
mod tests {
    use super::*;
    use crate::sid;

    #[test]
    fn generated_secrets() {
        let secret = TrustSecret::generate();
        assert_eq!(secret.as_str().len(), GENERATED_SECRET_LEN);
        assert!(secret.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(secret, TrustSecret::generate());
        assert_eq!(format!("{secret:?}"), "TrustSecret(..)");
    }

    #[test]
    fn lsa_directions() {
        assert_eq!(TrustDirection::Inbound.lsa_direction(), TRUST_DIRECTION_INBOUND);
        assert_eq!(
            TrustDirection::Bidirectional.lsa_direction(),
            TRUST_DIRECTION_INBOUND | TRUST_DIRECTION_OUTBOUND
        );
    }

    #[test]
    fn naming_context_sid() {
        assert_eq!(
            parse_naming_context("<GUID=1b1a>;<SID=S-1-5-21-9-9-9>;DC=ad,DC=test"),
            Some(sid!("S-1-5-21-9-9-9"))
        );
        assert_eq!(parse_naming_context("DC=ad,DC=test"), None);
        assert_eq!(parse_naming_context("<SID=S-1-garbage>"), None);
    }
}
