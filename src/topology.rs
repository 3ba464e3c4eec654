//! Enumerating the domains and name suffixes of a trusted forest.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;
use zeroize::Zeroizing;

use crate::kerberos::CredentialCache;
use crate::rpc::lsa::ForestTrustData;
use crate::rpc::{ClientIdentity, Credentials, DcTarget, ServerFlags};
use crate::session::DomainSession;
use crate::status::assess_fault;
use crate::{DomainRegistry, Result, SecurityIdentifier, TrustContext, TrustError};

/// How to authenticate against the trusted forest.
pub enum TopologyCredentials {
    /// A Kerberos ticket already present in the environment.
    ExistingTicket,
    /// A trusted forest administrator, for one-way trusts.
    Administrator {
        principal: String,
        password: Zeroizing<String>,
    },
    /// The local service principal, over the cross-forest trust.
    ServiceKeytab,
}

/// A domain of the trusted forest other than its root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopologyDomain {
    /// DNS name.
    pub name: String,
    /// NetBIOS name.
    pub flat_name: String,
    pub sid: SecurityIdentifier,
}

/// What a trusted forest reports about itself, minus its root domain.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ForestTopology {
    /// Child and tree domains, keyed by DNS name.
    pub domains: BTreeMap<String, TopologyDomain>,
    /// Additional UPN and SPN suffixes routed to the forest.
    pub suffixes: BTreeSet<String>,
}

/// Reads the forest trust information of `remote_realm`.
///
/// `local_domain` is the NetBIOS workgroup presented to the remote side. The
/// controller is located through `server` when given, through the DNS
/// records of `remote_realm` otherwise.
///
/// Returns `None` when the local domain is not configured for trusts.
///
/// # Errors
/// - The translated locator error, or [`TrustError::NotFound`] if no controller answered.
/// - [`TrustError::Kerberos`] if the scoped credential cache cannot be initialized.
/// - Errors of [`DomainSession::negotiate_binding`] and the translated NetLogon status.
#[inline]
pub fn fetch_forest_topology(
    ctx: &TrustContext,
    local_domain: &str,
    remote_realm: &str,
    credentials: &TopologyCredentials,
    server: Option<&str>,
) -> Result<Option<ForestTopology>> {
    let mut registry = DomainRegistry::new(ctx);
    if !registry.is_configured()? {
        return Ok(None);
    }
    let flat_name = registry
        .local_domain()
        .map(|local| local.flat_name.clone())
        .unwrap_or_default();

    let target = server.map_or_else(
        || DcTarget::Domain(remote_realm.to_owned()),
        |server| DcTarget::Address(server.to_owned()),
    );
    let dc = ctx
        .locator
        .find_dc(&target, ServerFlags::LDAP | ServerFlags::DS)
        .map_err(|fault| assess_fault(None, fault.message.as_deref()))?
        .ok_or_else(|| TrustError::not_found(format!("no domain controller of {remote_realm} answered")))?;

    let cache = match credentials {
        TopologyCredentials::ExistingTicket => None,
        TopologyCredentials::Administrator { principal, password } => Some(CredentialCache::with_password(
            ctx.kerberos.as_ref(),
            &ctx.config,
            remote_realm,
            principal,
            password,
        )?),
        TopologyCredentials::ServiceKeytab => Some(CredentialCache::with_service_keytab(
            ctx.kerberos.as_ref(),
            &ctx.config,
            remote_realm,
        )?),
    };
    let identity = ClientIdentity::new(
        Credentials::Kerberos {
            ccache: cache.as_ref().map(|cache| cache.path().to_owned()),
        },
        flat_name,
    )
    .with_workgroup(local_domain);

    let mut session = DomainSession::new(ctx, Some(identity.clone()));
    session.info.dc.clone_from(&dc.pdc_dns_name);
    session.info.dns_domain.clone_from(&dc.dns_domain);
    session.negotiate_binding(&dc.pdc_dns_name)?;
    let binding = session
        .binding()
        .ok_or_else(|| TrustError::requirement("LSA binding"))?;
    let netlogon = ctx.netlogon.connect(binding, &identity)?;
    let records = netlogon.get_forest_trust_information(&dc.pdc_dns_name)?;
    debug!(realm = %remote_realm, records = records.len(), "forest trust information read");

    let mut topology = ForestTopology::default();
    for record in records {
        match record.data {
            ForestTrustData::DomainInfo {
                dns_domain_name,
                netbios_domain_name,
                domain_sid,
            } if !dns_domain_name.eq_ignore_ascii_case(remote_realm) => {
                topology.domains.insert(
                    dns_domain_name.clone(),
                    TopologyDomain {
                        name: dns_domain_name,
                        flat_name: netbios_domain_name,
                        sid: domain_sid,
                    },
                );
            }
            ForestTrustData::TopLevelName(name) if !name.eq_ignore_ascii_case(remote_realm) => {
                topology.suffixes.insert(name);
            }
            _ => {}
        }
    }
    Ok(Some(topology))
}
