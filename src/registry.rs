//! Trusted domain registry: which trusted domain owns a SID or a name, and
//! lookups of objects living in those domains.

use std::collections::{BTreeMap, HashMap};

use delegate::delegate;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::directory::{
    DirectoryBind, DirectoryError, Entry, GC_PORT, LDAP_PORT, Scope, escape_binary, escape_filter,
    realm_to_suffix,
};
use crate::dns::gc_srv_name;
use crate::kerberos::CredentialCache;
use crate::rpc::{DcTarget, ServerFlags};
use crate::status::assess_fault;
use crate::{
    DomainTarget, ObjectName, ObjectType, Result, SecurityIdentifier, TrustContext, TrustError,
};

const ATTR_FLATNAME: &str = "ipaNTFlatName";
const ATTR_SID: &str = "ipaNTSecurityIdentifier";
const ATTR_TRUSTED_SID: &str = "ipaNTTrustedDomainSID";
const ATTR_TRUST_PARTNER: &str = "ipaNTTrustPartner";
const TRUSTED_DOMAIN_FILTER: &str = "(objectClass=ipaNTTrustedDomain)";

/// The local domain as configured for trusts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDomain {
    /// DNS name.
    pub domain: String,
    /// NetBIOS name.
    pub flat_name: String,
    pub sid: Option<SecurityIdentifier>,
    /// DN of the trust configuration object.
    pub dn: String,
}

/// A domain the local domain trusts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedDomainRecord {
    /// DNS name of the trusted domain.
    pub partner_name: String,
    /// NetBIOS name, lowercased.
    pub flat_name: String,
    pub sid: SecurityIdentifier,
}

/// Trusted domains keyed by DNS name, case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustedDomainMap {
    records: BTreeMap<String, TrustedDomainRecord>,
}

impl TrustedDomainMap {
    delegate! {
        to self.records {
            #[inline]
            #[must_use]
            pub fn len(&self) -> usize;
            #[inline]
            #[must_use]
            pub fn is_empty(&self) -> bool;
        }
    }

    /// Inserts `record`, replacing any record with the same DNS name.
    #[inline]
    pub fn insert(&mut self, mut record: TrustedDomainRecord) {
        record.flat_name = record.flat_name.to_lowercase();
        self.records
            .insert(record.partner_name.to_lowercase(), record);
    }

    #[inline]
    #[must_use]
    pub fn get(&self, domain: &str) -> Option<&TrustedDomainRecord> {
        self.records.get(&domain.to_lowercase())
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, domain: &str) -> bool {
        self.get(domain).is_some()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &TrustedDomainRecord> {
        self.records.values()
    }

    /// Records whose NetBIOS name is `flat_name`, case-insensitively.
    #[inline]
    pub fn with_flat_name<'a>(
        &'a self,
        flat_name: &str,
    ) -> impl Iterator<Item = &'a TrustedDomainRecord> + use<'a> {
        let wanted = flat_name.to_lowercase();
        self.records
            .values()
            .filter(move |record| record.flat_name == wanted)
    }
}

impl FromIterator<TrustedDomainRecord> for TrustedDomainMap {
    fn from_iter<I: IntoIterator<Item = TrustedDomainRecord>>(iter: I) -> Self {
        let mut map = Self::default();
        for record in iter {
            map.insert(record);
        }
        map
    }
}

/// Global catalog servers of a trusted domain.
#[derive(Debug, Clone, PartialEq, Eq)]
struct GcInfo {
    dns_domain: String,
    servers: Vec<(String, u16)>,
}

struct AdminCredentials {
    principal: String,
    password: Zeroizing<String>,
}

/// Registry of the domains trusted by the local domain.
///
/// [`DomainRegistry::is_configured`] must succeed before any resolution; the
/// trusted domain map is read lazily, cached, and rebuilt after
/// [`DomainRegistry::refresh`].
pub struct DomainRegistry<'ctx> {
    ctx: &'ctx TrustContext,
    local: Option<LocalDomain>,
    domains: Option<TrustedDomainMap>,
    gc_info: HashMap<String, GcInfo>,
    admin: Option<AdminCredentials>,
}

impl<'ctx> DomainRegistry<'ctx> {
    #[inline]
    #[must_use]
    pub fn new(ctx: &'ctx TrustContext) -> Self {
        Self {
            ctx,
            local: None,
            domains: None,
            gc_info: HashMap::new(),
            admin: None,
        }
    }

    /// Reads the trust configuration object of the local domain.
    ///
    /// Returns `false` when the object does not exist or misses its NetBIOS name.
    ///
    /// # Errors
    /// - [`TrustError::Directory`] on any other directory failure.
    #[inline]
    pub fn is_configured(&mut self) -> Result<bool> {
        let config = &self.ctx.config;
        let dn = config.cifs_domain_dn();
        let entry = match self.ctx.directory.get_entry(&dn, &[ATTR_FLATNAME, ATTR_SID]) {
            Ok(entry) => entry,
            Err(DirectoryError::NotFound { .. }) => return Ok(false),
            Err(err) => return Err(err.into()),
        };
        let Some(flat_name) = entry.first_str(ATTR_FLATNAME) else {
            warn!(dn = %entry.dn, "trust configuration misses {ATTR_FLATNAME}");
            return Ok(false);
        };
        let sid = entry.first_str(ATTR_SID).and_then(|sid| match sid.parse() {
            Ok(sid) => Some(sid),
            Err(_) => {
                warn!(dn = %entry.dn, %sid, "local domain SID is not valid");
                None
            }
        });
        self.local = Some(LocalDomain {
            domain: config.domain.clone(),
            flat_name: flat_name.to_owned(),
            sid,
            dn: entry.dn.clone(),
        });
        Ok(true)
    }

    /// The local domain, once [`DomainRegistry::is_configured`] returned `true`.
    #[inline]
    #[must_use]
    pub const fn local_domain(&self) -> Option<&LocalDomain> {
        self.local.as_ref()
    }

    /// Administrator of the trusted domains, used to bind to their controllers.
    #[inline]
    pub fn set_admin_credentials(&mut self, principal: impl Into<String>, password: impl Into<String>) {
        self.admin = Some(AdminCredentials {
            principal: principal.into(),
            password: Zeroizing::new(password.into()),
        });
    }

    /// Reads every trusted domain object from the local directory.
    ///
    /// Objects missing an attribute or carrying an invalid SID are skipped.
    ///
    /// # Errors
    /// - [`TrustError::Directory`] if the search fails for another reason than
    ///   a missing container.
    #[inline]
    pub fn list_trusted_domains(&self) -> Result<TrustedDomainMap> {
        let base = self.ctx.config.trusts_dn();
        let result = match self.ctx.directory.search(
            &base,
            Scope::Subtree,
            TRUSTED_DOMAIN_FILTER,
            &[ATTR_TRUSTED_SID, ATTR_FLATNAME, ATTR_TRUST_PARTNER],
        ) {
            Ok(result) => result,
            Err(DirectoryError::NotFound { .. }) => return Ok(TrustedDomainMap::default()),
            Err(err) => return Err(err.into()),
        };
        if result.truncated {
            warn!(%base, "trusted domain search was truncated");
        }
        Ok(result.entries.iter().filter_map(trusted_domain_record).collect())
    }

    /// Drops the cached trusted domain map; the next resolution reads it again.
    #[inline]
    pub fn refresh(&mut self) {
        self.domains = None;
        self.gc_info.clear();
    }

    fn trusted_domains(&mut self) -> Result<&TrustedDomainMap> {
        let domains = match self.domains.take() {
            Some(domains) if !domains.is_empty() => domains,
            _ => self.list_trusted_domains()?,
        };
        if domains.is_empty() {
            return Err(TrustError::NoTrustedDomains);
        }
        Ok(&*self.domains.insert(domains))
    }

    fn require_configured(&self) -> Result<&LocalDomain> {
        self.local.as_ref().ok_or(TrustError::NotConfigured)
    }

    /// Finds the trusted domain owning `sid`.
    ///
    /// With `exact_match` the SID must equal a trusted domain SID; otherwise
    /// the first domain whose SID [prefix-matches](SecurityIdentifier::prefix_matches)
    /// it wins.
    ///
    /// # Errors
    /// Checked in this order:
    /// - [`TrustError::NotConfigured`] if the local domain is not configured.
    /// - [`TrustError::InvalidSid`] if `sid` does not parse.
    /// - [`TrustError::NoTrustedDomains`] if no domain is trusted.
    /// - [`TrustError::NotFound`] if no trusted domain matches.
    #[inline]
    pub fn resolve_domain_by_sid(&mut self, sid: &str, exact_match: bool) -> Result<String> {
        self.require_configured()?;
        let parsed: SecurityIdentifier = sid.parse().map_err(|_| TrustError::InvalidSid {
            value: sid.to_owned(),
        })?;
        let domains = self.trusted_domains()?;
        let found = if exact_match {
            domains.iter().find(|record| record.sid == parsed)
        } else {
            domains.iter().find(|record| record.sid.prefix_matches(&parsed))
        };
        found.map(|record| record.partner_name.clone()).ok_or_else(|| {
            TrustError::not_found(if exact_match {
                "SID does not match exactly with any trusted domain's SID"
            } else {
                "SID does not match any trusted domain"
            })
        })
    }

    /// True if `sid` belongs to a trusted domain.
    #[inline]
    pub fn is_trusted_sid_valid(&mut self, sid: &str) -> bool {
        self.resolve_domain_by_sid(sid, false).is_ok()
    }

    /// True if `sid` is the SID of a trusted domain itself.
    #[inline]
    pub fn is_trusted_domain_sid_valid(&mut self, sid: &str) -> bool {
        self.resolve_domain_by_sid(sid, true).is_ok()
    }

    /// SID of the trusted domain called `name`, read fresh from the directory.
    ///
    /// # Errors
    /// - [`TrustError::Directory`] if the trusted domains cannot be listed.
    #[inline]
    pub fn sid_from_domain_name(&self, name: &str) -> Result<Option<SecurityIdentifier>> {
        Ok(self.list_trusted_domains()?.get(name).map(|record| record.sid))
    }

    /// Searches objects of a trusted domain on its domain controllers.
    ///
    /// A [`DomainTarget::FlatName`] may match several trusted domains; they are
    /// searched in turn until one returns entries. `base_dn` defaults to the
    /// root of the trusted domain.
    ///
    /// # Errors
    /// - [`TrustError::NotConfigured`] / [`TrustError::NoTrustedDomains`] as for
    ///   [`DomainRegistry::resolve_domain_by_sid`].
    /// - [`TrustError::Validation`] if the target is not a trusted domain.
    /// - [`TrustError::NotFound`] if every controller failed or nothing matched.
    /// - The translated locator error if no global catalog can be found.
    #[inline]
    pub fn search_trusted_domain(
        &mut self,
        target: &DomainTarget,
        filter: &str,
        attrs: &[&str],
        scope: Scope,
        base_dn: Option<&str>,
    ) -> Result<Vec<Entry>> {
        self.require_configured()?;
        let domains = self.trusted_domains()?;
        let candidates: Vec<String> = match target {
            DomainTarget::Domain(domain) => {
                let record = domains.get(domain).ok_or_else(|| {
                    TrustError::validation("trusted domain object", "domain is not trusted")
                })?;
                vec![record.partner_name.clone()]
            }
            DomainTarget::FlatName(flat_name) => {
                let matching: Vec<String> = domains
                    .with_flat_name(flat_name)
                    .map(|record| record.partner_name.clone())
                    .collect();
                if matching.is_empty() {
                    return Err(TrustError::validation(
                        "trusted domain object",
                        "no trusted domain matched the specified flat name",
                    ));
                }
                matching
            }
        };
        for domain in candidates {
            let entries = self.search_in_dc(&domain, filter, attrs, scope, base_dn)?;
            if !entries.is_empty() {
                return Ok(entries);
            }
        }
        Err(TrustError::not_found("trusted domain object not found"))
    }

    fn search_in_dc(
        &mut self,
        domain: &str,
        filter: &str,
        attrs: &[&str],
        scope: Scope,
        base_dn: Option<&str>,
    ) -> Result<Vec<Entry>> {
        let info = self.gc_list(domain)?;
        let base = base_dn.map_or_else(|| realm_to_suffix(&info.dns_domain), str::to_owned);
        for (host, port) in &info.servers {
            match self.search_server(&info.dns_domain, host, &base, filter, attrs, scope) {
                Ok(entries) if !entries.is_empty() => return Ok(entries),
                Ok(_) => debug!(%host, port, %filter, "no entries on AD DC"),
                Err(err) => warn!(%host, port, error = %err, "search on AD DC failed"),
            }
        }
        Ok(Vec::new())
    }

    fn search_server(
        &self,
        dns_domain: &str,
        host: &str,
        base: &str,
        filter: &str,
        attrs: &[&str],
        scope: Scope,
    ) -> Result<Vec<Entry>> {
        let cache = self
            .admin
            .as_ref()
            .map(|admin| {
                CredentialCache::with_password(
                    self.ctx.kerberos.as_ref(),
                    &self.ctx.config,
                    dns_domain,
                    &admin.principal,
                    &admin.password,
                )
            })
            .transpose()?;
        let bind = DirectoryBind::Gssapi {
            ccache: cache.as_ref().map(|cache| cache.path().to_owned()),
        };
        let connection = self.ctx.remote_directory.connect(host, LDAP_PORT, &bind)?;
        let result = connection.search(base, scope, filter, attrs)?;
        Ok(result.entries)
    }

    /// Locates global catalog servers of `domain`, closest first.
    ///
    /// The locator is asked for a close GC, then for any GC; when it fails or
    /// finds nothing the `_gc._tcp` SRV records are used instead.
    fn gc_list(&mut self, domain: &str) -> Result<GcInfo> {
        let key = domain.to_lowercase();
        if let Some(info) = self.gc_info.get(&key) {
            return Ok(info.clone());
        }
        let target = DcTarget::Domain(domain.to_owned());
        let located = self
            .ctx
            .locator
            .find_dc(&target, ServerFlags::LDAP | ServerFlags::GC | ServerFlags::CLOSEST)
            .or_else(|err| {
                debug!(%domain, error = %err, "no close global catalog, trying any");
                self.ctx
                    .locator
                    .find_dc(&target, ServerFlags::LDAP | ServerFlags::GC)
            });
        let info = match &located {
            Ok(Some(dc)) => GcInfo {
                dns_domain: dc.dns_domain.clone(),
                servers: vec![(dc.pdc_dns_name.clone(), GC_PORT)],
            },
            Ok(None) | Err(_) => GcInfo {
                dns_domain: domain.to_owned(),
                servers: self
                    .ctx
                    .dns
                    .query_srv(&gc_srv_name(domain))
                    .into_iter()
                    .map(|srv| (srv.target, srv.port))
                    .collect(),
            },
        };
        if info.servers.is_empty() {
            if let Err(fault) = located {
                return Err(assess_fault(None, fault.message.as_deref()));
            }
        }
        self.gc_info.insert(key, info.clone());
        Ok(info)
    }

    /// SID of an object of a trusted domain.
    ///
    /// The name service answers first. On a miss the object's home domain,
    /// given as `DOMAIN\name` or `name@domain`, is searched when
    /// `fallback_to_directory` allows it.
    ///
    /// # Errors
    /// - [`TrustError::NotFound`] on a name service miss without fallback, or
    ///   when the home domain has no such user or group.
    /// - [`TrustError::AmbiguousResult`] if the name has no domain part or
    ///   several objects match.
    #[inline]
    pub fn resolve_object_sid(&mut self, name: &str, fallback_to_directory: bool) -> Result<SecurityIdentifier> {
        if let Some(entry) = self.ctx.name_service.sid_by_name(name) {
            return entry.value.parse().map_err(|_| TrustError::InvalidSid {
                value: entry.value.clone(),
            });
        }
        if !fallback_to_directory {
            return Err(TrustError::not_found(
                "name service was unable to resolve the object to a valid SID",
            ));
        }
        let (home, object) = home_and_name(name)?;
        let filter = format!(
            "(&(sAMAccountName={})(|(objectClass=user)(objectClass=group)))",
            escape_filter(&object)
        );
        let entries = self.search_trusted_domain(&home, &filter, &["objectSid"], Scope::Subtree, None)?;
        let entry = unique(entries)?;
        object_sid(&entry)
    }

    /// Whether a trusted domain object is a user, a group, or both.
    ///
    /// # Errors
    /// - [`TrustError::NotFound`] if neither the name service nor the home
    ///   domain know the object.
    /// - [`TrustError::AmbiguousResult`] as for [`DomainRegistry::resolve_object_sid`].
    #[inline]
    pub fn resolve_object_type(&mut self, name_or_sid: &str) -> Result<ObjectType> {
        let as_sid = name_or_sid.parse::<SecurityIdentifier>().ok();
        let cached = match &as_sid {
            Some(sid) => self.ctx.name_service.name_by_sid(sid),
            None => self.ctx.name_service.sid_by_name(name_or_sid),
        };
        if let Some(entry) = cached {
            match entry.object_type() {
                Ok(object_type) => return Ok(object_type),
                Err(err) => debug!(%name_or_sid, error = %err, "name service returned an unknown id type"),
            }
        }
        let (target, filter) = match as_sid {
            Some(sid) => (
                DomainTarget::Domain(self.resolve_domain_by_sid(name_or_sid, false)?),
                sid_filter(&sid),
            ),
            None => {
                let (home, object) = home_and_name(name_or_sid)?;
                (
                    home,
                    format!(
                        "(&(sAMAccountName={})(|(objectClass=user)(objectClass=group)))",
                        escape_filter(&object)
                    ),
                )
            }
        };
        let entries = self.search_trusted_domain(&target, &filter, &["objectClass"], Scope::Subtree, None)?;
        let entry = unique(entries)?;
        ObjectType::from_object_classes(entry.strs("objectClass"))
            .ok_or_else(|| TrustError::not_found("object is neither a user nor a group"))
    }

    /// `name@domain` of the trusted domain object owning `sid`.
    ///
    /// # Errors
    /// - [`TrustError::InvalidSid`] if `sid` does not belong to a trusted domain.
    /// - [`TrustError::NotFound`] / [`TrustError::AmbiguousResult`] from the directory fallback.
    #[inline]
    pub fn resolve_object_name_by_sid(&mut self, sid: &str) -> Result<String> {
        debug!(%sid, "converting SID to object name");
        if !self.is_trusted_sid_valid(sid) {
            return Err(TrustError::InvalidSid {
                value: sid.to_owned(),
            });
        }
        let parsed: SecurityIdentifier = sid.parse()?;
        if let Some(entry) = self.ctx.name_service.name_by_sid(&parsed) {
            if entry.object_type().is_ok() {
                return Ok(entry.value);
            }
        }
        debug!(%sid, "searching AD DC LDAP");
        let domain = self.resolve_domain_by_sid(sid, false)?;
        let entries = self.search_trusted_domain(
            &DomainTarget::Domain(domain.clone()),
            &sid_filter(&parsed),
            &["sAMAccountName"],
            Scope::Subtree,
            None,
        )?;
        let entry = unique(entries)?;
        let account = entry
            .first_str("sAMAccountName")
            .ok_or_else(|| TrustError::not_found("trusted domain object has no sAMAccountName"))?;
        Ok(format!("{}@{}", account.to_lowercase(), domain.to_lowercase()))
    }

    /// SID of a trusted domain user and SIDs of the groups it belongs to.
    ///
    /// The name service is used when it knows both the user and its groups.
    /// Otherwise the user entry is located in its home domain and its
    /// `tokenGroups` are read with a base search on that entry.
    ///
    /// # Errors
    /// - [`TrustError::NotFound`] if the user does not exist in its home domain.
    /// - [`TrustError::AmbiguousResult`] if a name has no domain part.
    /// - [`TrustError::MalformedSid`] if the controller returns an undecodable SID.
    #[inline]
    pub fn resolve_user_group_memberships(
        &mut self,
        name_or_sid: &str,
    ) -> Result<(SecurityIdentifier, Vec<SecurityIdentifier>)> {
        let as_sid = name_or_sid.parse::<SecurityIdentifier>().ok();
        let names = &self.ctx.name_service;
        let (user_sid, groups) = match &as_sid {
            Some(sid) => (
                Some(*sid),
                names
                    .name_by_sid(sid)
                    .and_then(|entry| names.groups_of(&entry.value)),
            ),
            None => match names.sid_by_name(name_or_sid) {
                Some(entry) => (entry.value.parse().ok(), names.groups_of(name_or_sid)),
                None => (None, None),
            },
        };
        if let (Some(user_sid), Some(groups)) = (user_sid, groups) {
            if !groups.is_empty() {
                let group_sids = groups
                    .iter()
                    .filter_map(|group| {
                        let resolved = names.sid_by_name(group).and_then(|entry| entry.value.parse().ok());
                        if resolved.is_none() {
                            warn!(%group, "group has no SID in the name service");
                        }
                        resolved
                    })
                    .collect();
                return Ok((user_sid, group_sids));
            }
        }
        self.memberships_from_directory(name_or_sid, as_sid)
    }

    fn memberships_from_directory(
        &mut self,
        name_or_sid: &str,
        as_sid: Option<SecurityIdentifier>,
    ) -> Result<(SecurityIdentifier, Vec<SecurityIdentifier>)> {
        let (target, filter) = match as_sid {
            Some(sid) => (
                DomainTarget::Domain(self.resolve_domain_by_sid(name_or_sid, false)?),
                format!("(&(objectClass=user)(objectSid={sid}))"),
            ),
            None => {
                let (home, object) = home_and_name(name_or_sid)?;
                (
                    home,
                    format!("(&(sAMAccountName={})(objectClass=user))", escape_filter(&object)),
                )
            }
        };
        let user_dn = self
            .search_trusted_domain(&target, &filter, &["cn"], Scope::Subtree, None)
            .map_err(|err| match err {
                TrustError::NotFound { .. } => TrustError::not_found("trusted domain user not found"),
                other => other,
            })?
            .into_iter()
            .next()
            .map(|entry| entry.dn)
            .ok_or_else(|| TrustError::not_found("trusted domain user not found"))?;
        // tokenGroups is only computed for a base search on the user entry.
        let entry = self
            .search_trusted_domain(
                &target,
                "(objectClass=user)",
                &["objectSid", "tokenGroups"],
                Scope::Base,
                Some(&user_dn),
            )?
            .into_iter()
            .next()
            .ok_or_else(|| TrustError::not_found("trusted domain user not found"))?;
        let user_sid = object_sid(&entry)?;
        let groups = entry
            .values("tokenGroups")
            .iter()
            .map(|value| SecurityIdentifier::from_bytes(value))
            .collect::<core::result::Result<Vec<_>, _>>()?;
        Ok((user_sid, groups))
    }
}

fn trusted_domain_record(entry: &Entry) -> Option<TrustedDomainRecord> {
    let (Some(partner), Some(flat_name), Some(sid)) = (
        entry.first_str(ATTR_TRUST_PARTNER),
        entry.first_str(ATTR_FLATNAME),
        entry.first_str(ATTR_TRUSTED_SID),
    ) else {
        warn!(dn = %entry.dn, "trusted domain entry misses an attribute, skipped");
        return None;
    };
    match sid.parse() {
        Ok(sid) => Some(TrustedDomainRecord {
            partner_name: partner.to_owned(),
            flat_name: flat_name.to_lowercase(),
            sid,
        }),
        Err(_) => {
            warn!(dn = %entry.dn, %sid, "trusted domain entry has an invalid SID, skipped");
            None
        }
    }
}

/// Splits a qualified object name into its home domain and bare name.
fn home_and_name(name: &str) -> Result<(DomainTarget, String)> {
    let parsed: ObjectName = name
        .parse()
        .map_err(|_| TrustError::validation("trusted domain object", format!("'{name}' is not a valid name")))?;
    let home = parsed
        .home
        .ok_or_else(|| TrustError::ambiguous("user domain was not specified"))?;
    Ok((home, parsed.name))
}

fn sid_filter(sid: &SecurityIdentifier) -> String {
    format!(
        "(&(objectSid={})(|(objectClass=user)(objectClass=group)))",
        escape_binary(&sid.to_bytes())
    )
}

fn unique(entries: Vec<Entry>) -> Result<Entry> {
    let mut entries = entries.into_iter();
    let first = entries
        .next()
        .ok_or_else(|| TrustError::not_found("trusted domain object not found"))?;
    if entries.next().is_some() {
        return Err(TrustError::ambiguous("trusted domain did not return a unique object"));
    }
    Ok(first)
}

fn object_sid(entry: &Entry) -> Result<SecurityIdentifier> {
    let bytes = entry
        .first("objectSid")
        .ok_or_else(|| TrustError::not_found("trusted domain object has no objectSid"))?;
    Ok(SecurityIdentifier::from_bytes(bytes)?)
}
