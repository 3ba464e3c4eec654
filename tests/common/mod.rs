// In-memory doubles of every collaborator, sharing one recorded world.
#![allow(dead_code, reason = "Each test binary uses a subset of the doubles")]
#![allow(clippy::unwrap_used, reason = "Unwrap is not an issue in tests")]

use core::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::rc::Rc;

use ad_trust::directory::{
    DirectoryBind, DirectoryClient, DirectoryConnector, DirectoryError, Entry, Scope, SearchResult,
};
use ad_trust::dns::{DnsResolver, SrvTarget};
use ad_trust::kerberos::{KerberosError, KerberosHelper};
use ad_trust::name_service::{NameService, NameServiceEntry};
use ad_trust::rpc::lsa::{
    AuthInfoInternal, CollisionInfo, DnsDomainInfo, ForestTrustRecord, PolicyHandle,
    TrustedDomainHandle, TrustedDomainInfoEx,
};
use ad_trust::rpc::netlogon::{NETLOGON_VERIFY_STATUS_RETURNED, NetlogonInfo2, WerrorStatus};
use ad_trust::rpc::{
    Binding, ClientIdentity, Credentials, DcInfo, DcLocator, DcTarget, LsaConnector, LsaPipe,
    NetlogonConnector, NetlogonPipe, ServerFlags,
};
use ad_trust::status::{RpcFault, STATUS_OBJECT_NAME_NOT_FOUND};
use ad_trust::{SecurityIdentifier, TrustConfig, TrustContext};
use uuid::Uuid;

pub const LOCAL_HOST: &str = "master.ipa.test";
pub const LOCAL_SID: &str = "S-1-5-21-100-200-300";
pub const AD_DC: &str = "dc1.ad.test";
pub const AD_SID: &str = "S-1-5-21-9-9-9";
pub const SESSION_KEY: [u8; 16] = [7; 16];

/// A trusted domain controller reachable through LDAP.
#[derive(Default)]
pub struct RemoteDc {
    pub by_filter: HashMap<String, Vec<Entry>>,
}

/// Everything the doubles know and every call they received.
#[derive(Default)]
pub struct World {
    calls: RefCell<Vec<String>>,
    pub local_entries: RefCell<Vec<Entry>>,
    pub remote_dcs: RefCell<HashMap<String, RemoteDc>>,
    pub sid_by_name: RefCell<HashMap<String, NameServiceEntry>>,
    pub name_by_sid: RefCell<HashMap<String, NameServiceEntry>>,
    pub groups: RefCell<HashMap<String, Vec<String>>>,
    pub kerberos_reject: Cell<bool>,
    pub srv: RefCell<HashMap<String, Vec<SrvTarget>>>,
    pub locator: RefCell<HashMap<DcTarget, Result<Option<DcInfo>, RpcFault>>>,
    /// Binding string → session key, or the fault of the bind.
    pub bindings: RefCell<HashMap<String, Result<Vec<u8>, RpcFault>>>,
    /// LSA host → DNS domain information and role.
    pub lsa_domains: RefCell<HashMap<String, (DnsDomainInfo, u32)>>,
    pub existing_trusts: RefCell<HashMap<String, TrustedDomainInfoEx>>,
    pub delete_fault: RefCell<Option<RpcFault>>,
    pub created: RefCell<Vec<(String, TrustedDomainInfoEx, AuthInfoInternal)>>,
    pub attributes_set: RefCell<Vec<(String, u32)>>,
    pub verify_answers: RefCell<VecDeque<Option<NetlogonInfo2>>>,
    pub verify_default: RefCell<Option<NetlogonInfo2>>,
    pub forest_records: RefCell<Vec<ForestTrustRecord>>,
}

impl World {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn record(&self, call: impl Into<String>) {
        self.calls.borrow_mut().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls.borrow().iter().filter(|call| call.starts_with(prefix)).count()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Trust configuration object of `ipa.test` with NetBIOS name `IPA`.
    pub fn configure_local(&self) {
        self.local_entries.borrow_mut().push(
            Entry::new("cn=ipa.test,cn=ad,cn=etc,dc=ipa,dc=test")
                .with_attr("ipaNTFlatName", ["IPA"])
                .with_attr("ipaNTSecurityIdentifier", [LOCAL_SID]),
        );
        self.lsa_domains.borrow_mut().insert(
            LOCAL_HOST.to_owned(),
            (dns_info("IPA", "ipa.test", "ipa.test", LOCAL_SID), 3),
        );
    }

    pub fn add_trusted_domain(&self, partner: &str, flat_name: &str, sid: &str) {
        self.local_entries.borrow_mut().push(
            Entry::new(format!("cn={partner},cn=ad,cn=trusts,dc=ipa,dc=test"))
                .with_attr("objectClass", ["ipaNTTrustedDomain"])
                .with_attr("ipaNTTrustPartner", [partner])
                .with_attr("ipaNTFlatName", [flat_name])
                .with_attr("ipaNTTrustedDomainSID", [sid]),
        );
    }

    pub fn add_realm_domains(&self, timestamp: &str, domains: &[&str]) {
        self.local_entries.borrow_mut().push(
            Entry::new("cn=Realm Domains,cn=ipa,cn=etc,dc=ipa,dc=test")
                .with_attr("modifyTimestamp", [timestamp])
                .with_attr("associatedDomain", domains.iter().copied()),
        );
    }

    /// Answer of the LDAP server at `host` for `filter`.
    pub fn add_remote_entries(&self, host: &str, filter: &str, entries: Vec<Entry>) {
        self.remote_dcs
            .borrow_mut()
            .entry(host.to_owned())
            .or_default()
            .by_filter
            .insert(filter.to_owned(), entries);
    }

    pub fn locate(&self, target: DcTarget, answer: Result<Option<DcInfo>, RpcFault>) {
        self.locator.borrow_mut().insert(target, answer);
    }

    /// `ad.test`, a forest root whose PDC is [`AD_DC`], reachable through LSA.
    pub fn add_ad_forest(&self) {
        self.lsa_domains.borrow_mut().insert(
            AD_DC.to_owned(),
            (dns_info("AD", "ad.test", "ad.test", AD_SID), 3),
        );
        let dc = dc_info("AD", "ad.test", "ad.test", ServerFlags::PDC | ServerFlags::LDAP);
        self.locate(DcTarget::Domain("ad.test".into()), Ok(Some(dc.clone())));
        self.locate(DcTarget::Address(AD_DC.into()), Ok(Some(dc)));
        self.add_remote_entries(
            AD_DC,
            "(objectClass=*)",
            vec![
                Entry::new("")
                    .with_attr(
                        "defaultNamingContext",
                        [format!("<GUID=5a1b>;<SID={AD_SID}>;DC=ad,DC=test")],
                    )
                    .with_attr("dnsHostName", [AD_DC]),
            ],
        );
    }

    pub fn queue_verify(&self, answer: Option<NetlogonInfo2>) {
        self.verify_answers.borrow_mut().push_back(answer);
    }
}

pub fn dns_info(name: &str, dns_domain: &str, forest: &str, sid: &str) -> DnsDomainInfo {
    DnsDomainInfo {
        name: name.into(),
        dns_domain: dns_domain.into(),
        dns_forest: forest.into(),
        domain_guid: Uuid::nil(),
        sid: Some(sid.parse().unwrap()),
    }
}

pub fn dc_info(name: &str, dns_domain: &str, forest: &str, server_type: ServerFlags) -> DcInfo {
    DcInfo {
        domain_name: name.into(),
        dns_domain: dns_domain.into(),
        forest: forest.into(),
        domain_uuid: Uuid::nil(),
        pdc_dns_name: AD_DC.into(),
        pdc_name: "DC1".into(),
        server_type,
    }
}

pub fn netlogon_info(pdc: WerrorStatus, tc: WerrorStatus) -> NetlogonInfo2 {
    NetlogonInfo2 {
        flags: NETLOGON_VERIFY_STATUS_RETURNED,
        trusted_dc_name: format!("\\\\{AD_DC}"),
        pdc_connection_status: pdc,
        tc_connection_status: tc,
    }
}

pub fn access_denied() -> WerrorStatus {
    WerrorStatus::new(5, "WERR_ACCESS_DENIED")
}

pub fn config() -> TrustConfig {
    let mut config = TrustConfig::new("ipa.test", "IPA.TEST", LOCAL_HOST);
    config.verification_delay_secs = 0;
    config
}

pub fn context(world: &Rc<World>) -> TrustContext {
    TrustContext {
        config: config(),
        directory: Box::new(Fake(Rc::clone(world))),
        remote_directory: Box::new(Fake(Rc::clone(world))),
        name_service: Box::new(Fake(Rc::clone(world))),
        kerberos: Box::new(Fake(Rc::clone(world))),
        dns: Box::new(Fake(Rc::clone(world))),
        locator: Box::new(Fake(Rc::clone(world))),
        lsa: Box::new(Fake(Rc::clone(world))),
        netlogon: Box::new(Fake(Rc::clone(world))),
    }
}

pub fn sid(value: &str) -> SecurityIdentifier {
    value.parse().unwrap()
}

fn credentials_tag(credentials: &Credentials) -> String {
    match credentials {
        Credentials::Anonymous => "anonymous".to_owned(),
        Credentials::Kerberos { ccache: None } => "kerberos".to_owned(),
        Credentials::Kerberos { ccache: Some(path) } => format!("kerberos {}", path.display()),
        Credentials::Password { domain, user, .. } => format!("password {domain}\\{user}"),
    }
}

pub struct Fake(Rc<World>);

impl DirectoryClient for Fake {
    fn get_entry(&self, dn: &str, _attrs: &[&str]) -> Result<Entry, DirectoryError> {
        self.0.record(format!("ldap get {dn}"));
        self.0
            .local_entries
            .borrow()
            .iter()
            .find(|entry| entry.dn.eq_ignore_ascii_case(dn))
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound { dn: dn.to_owned() })
    }

    fn search(&self, base: &str, scope: Scope, filter: &str, _attrs: &[&str]) -> Result<SearchResult, DirectoryError> {
        self.0.record(format!("ldap search {base} {filter}"));
        let base = base.to_ascii_lowercase();
        let entries = self
            .0
            .local_entries
            .borrow()
            .iter()
            .filter(|entry| {
                let dn = entry.dn.to_ascii_lowercase();
                match scope {
                    Scope::Base => dn == base,
                    _ => dn != base && dn.ends_with(&format!(",{base}")),
                }
            })
            .filter(|entry| !filter.contains("objectClass=ipaNTTrustedDomain") || entry.first_str("objectClass").is_some())
            .cloned()
            .collect();
        Ok(SearchResult {
            entries,
            truncated: false,
        })
    }
}

struct RemoteClient {
    world: Rc<World>,
    host: String,
}

impl DirectoryClient for RemoteClient {
    fn get_entry(&self, dn: &str, _attrs: &[&str]) -> Result<Entry, DirectoryError> {
        Err(DirectoryError::NotFound { dn: dn.to_owned() })
    }

    fn search(&self, base: &str, scope: Scope, filter: &str, _attrs: &[&str]) -> Result<SearchResult, DirectoryError> {
        self.world.record(format!("remote search {} {base} {filter}", self.host));
        let dcs = self.world.remote_dcs.borrow();
        let mut entries = dcs
            .get(&self.host)
            .and_then(|dc| dc.by_filter.get(filter))
            .cloned()
            .unwrap_or_default();
        if scope == Scope::Base && !base.is_empty() {
            entries.retain(|entry| entry.dn == base);
        }
        Ok(SearchResult {
            entries,
            truncated: false,
        })
    }
}

impl DirectoryConnector for Fake {
    fn connect(&self, host: &str, port: u16, bind: &DirectoryBind) -> Result<Box<dyn DirectoryClient>, DirectoryError> {
        let bind = match bind {
            DirectoryBind::Anonymous { extended_dn } => format!("anonymous extended_dn={extended_dn}"),
            DirectoryBind::Gssapi { ccache: None } => "gssapi".to_owned(),
            DirectoryBind::Gssapi { ccache: Some(path) } => format!("gssapi {}", path.display()),
        };
        self.0.record(format!("remote connect {host}:{port} {bind}"));
        if !self.0.remote_dcs.borrow().contains_key(host) {
            return Err(DirectoryError::Operation(format!("{host} is unreachable")));
        }
        Ok(Box::new(RemoteClient {
            world: Rc::clone(&self.0),
            host: host.to_owned(),
        }))
    }
}

impl NameService for Fake {
    fn sid_by_name(&self, name: &str) -> Option<NameServiceEntry> {
        self.0.sid_by_name.borrow().get(name).cloned()
    }

    fn name_by_sid(&self, sid: &SecurityIdentifier) -> Option<NameServiceEntry> {
        self.0.name_by_sid.borrow().get(&sid.to_string()).cloned()
    }

    fn groups_of(&self, name: &str) -> Option<Vec<String>> {
        self.0.groups.borrow().get(name).cloned()
    }
}

impl KerberosHelper for Fake {
    fn init_with_keytab(&self, principal: &str, keytab: &Path, ccache: &Path) -> Result<(), KerberosError> {
        self.0.record(format!(
            "kinit keytab {principal} {} {}",
            keytab.display(),
            ccache.display()
        ));
        Ok(())
    }

    fn init_with_password(&self, principal: &str, _password: &str, ccache: &Path) -> Result<(), KerberosError> {
        self.0.record(format!("kinit password {principal} {}", ccache.display()));
        if self.0.kerberos_reject.get() {
            return Err(KerberosError {
                principal: principal.to_owned(),
                reason: "Password incorrect".to_owned(),
            });
        }
        Ok(())
    }

    fn destroy(&self, ccache: &Path) {
        self.0.record(format!("kdestroy {}", ccache.display()));
    }
}

impl DnsResolver for Fake {
    fn query_srv(&self, name: &str) -> Vec<SrvTarget> {
        self.0.record(format!("srv {name}"));
        self.0.srv.borrow().get(name).cloned().unwrap_or_default()
    }
}

impl DcLocator for Fake {
    fn find_dc(&self, target: &DcTarget, flags: ServerFlags) -> Result<Option<DcInfo>, RpcFault> {
        let shown = match target {
            DcTarget::Domain(domain) => format!("domain {domain}"),
            DcTarget::Address(address) => format!("address {address}"),
        };
        self.0.record(format!("finddc {shown} {:#x}", flags.0));
        self.0.locator.borrow().get(target).cloned().unwrap_or(Ok(None))
    }
}

impl LsaConnector for Fake {
    fn connect(&self, binding: &Binding, identity: &ClientIdentity) -> Result<Box<dyn LsaPipe>, RpcFault> {
        self.0.record(format!(
            "lsa connect {binding} {}",
            credentials_tag(&identity.credentials)
        ));
        let scripted = self.0.bindings.borrow().get(&binding.to_string()).cloned();
        let session_key = match scripted {
            Some(answer) => answer?,
            None if self.0.lsa_domains.borrow().contains_key(&binding.host) => SESSION_KEY.to_vec(),
            None => return Err(RpcFault::from_message("NT_STATUS_HOST_UNREACHABLE")),
        };
        Ok(Box::new(FakeLsaPipe {
            world: Rc::clone(&self.0),
            host: binding.host.clone(),
            session_key,
        }))
    }
}

struct FakeLsaPipe {
    world: Rc<World>,
    host: String,
    session_key: Vec<u8>,
}

impl FakeLsaPipe {
    fn record(&self, call: &str) {
        self.world.record(format!("{} {call}", self.host));
    }
}

impl LsaPipe for FakeLsaPipe {
    fn session_key(&self) -> &[u8] {
        &self.session_key
    }

    fn open_policy2(&self) -> Result<PolicyHandle, RpcFault> {
        self.record("open_policy2");
        Ok(PolicyHandle(Uuid::new_v4()))
    }

    fn query_dns_domain_info(&self, _policy: &PolicyHandle) -> Result<DnsDomainInfo, RpcFault> {
        self.record("query_dns_domain_info");
        self.world
            .lsa_domains
            .borrow()
            .get(&self.host)
            .map(|(info, _)| info.clone())
            .ok_or_else(|| RpcFault::from_code(STATUS_OBJECT_NAME_NOT_FOUND))
    }

    fn query_role(&self, _policy: &PolicyHandle) -> Result<u32, RpcFault> {
        self.record("query_role");
        Ok(self
            .world
            .lsa_domains
            .borrow()
            .get(&self.host)
            .map_or(2, |(_, role)| *role))
    }

    fn query_trusted_domain_by_name(&self, _policy: &PolicyHandle, name: &str) -> Result<TrustedDomainInfoEx, RpcFault> {
        self.record(&format!("query_trusted_domain {name}"));
        self.world
            .existing_trusts
            .borrow()
            .get(&format!("{} {name}", self.host))
            .cloned()
            .ok_or_else(|| RpcFault::new(STATUS_OBJECT_NAME_NOT_FOUND, "NT_STATUS_OBJECT_NAME_NOT_FOUND"))
    }

    fn delete_trusted_domain(&self, _policy: &PolicyHandle, sid: &SecurityIdentifier) -> Result<(), RpcFault> {
        self.record(&format!("delete_trusted_domain {sid}"));
        self.world.delete_fault.borrow().clone().map_or(Ok(()), Err)
    }

    fn create_trusted_domain_ex2(
        &self,
        _policy: &PolicyHandle,
        info: &TrustedDomainInfoEx,
        auth: &AuthInfoInternal,
    ) -> Result<TrustedDomainHandle, RpcFault> {
        self.record(&format!("create_trusted_domain {}", info.domain_name));
        self.world
            .created
            .borrow_mut()
            .push((self.host.clone(), info.clone(), auth.clone()));
        Ok(TrustedDomainHandle(Uuid::new_v4()))
    }

    fn open_trusted_domain_by_name(&self, _policy: &PolicyHandle, name: &str) -> Result<TrustedDomainHandle, RpcFault> {
        self.record(&format!("open_trusted_domain {name}"));
        Ok(TrustedDomainHandle(Uuid::new_v4()))
    }

    fn set_supported_enc_types(&self, _handle: &TrustedDomainHandle, enc_types: u32) -> Result<(), RpcFault> {
        self.record(&format!("set_enc_types {enc_types:#x}"));
        Ok(())
    }

    fn query_trusted_domain_info_ex(&self, _handle: &TrustedDomainHandle) -> Result<TrustedDomainInfoEx, RpcFault> {
        self.record("query_trusted_domain_info_ex");
        self.world
            .created
            .borrow()
            .iter()
            .rev()
            .find(|(host, _, _)| *host == self.host)
            .map(|(_, info, _)| info.clone())
            .ok_or_else(|| RpcFault::from_code(STATUS_OBJECT_NAME_NOT_FOUND))
    }

    fn set_trusted_domain_info_ex(&self, _handle: &TrustedDomainHandle, info: &TrustedDomainInfoEx) -> Result<(), RpcFault> {
        self.record(&format!("set_trusted_domain_info_ex {:#x}", info.trust_attributes));
        self.world
            .attributes_set
            .borrow_mut()
            .push((self.host.clone(), info.trust_attributes));
        Ok(())
    }

    fn set_forest_trust_information(
        &self,
        _policy: &PolicyHandle,
        domain: &str,
        records: &[ForestTrustRecord],
    ) -> Result<Option<CollisionInfo>, RpcFault> {
        self.record(&format!("set_forest_trust_information {domain} {}", records.len()));
        Ok(None)
    }

    fn close(&self, _handle: Uuid) -> Result<(), RpcFault> {
        Ok(())
    }
}

impl NetlogonConnector for Fake {
    fn connect(&self, binding: &Binding, identity: &ClientIdentity) -> Result<Box<dyn NetlogonPipe>, RpcFault> {
        self.0.record(format!(
            "netlogon connect {binding} {}",
            credentials_tag(&identity.credentials)
        ));
        Ok(Box::new(FakeNetlogonPipe {
            world: Rc::clone(&self.0),
            host: binding.host.clone(),
        }))
    }
}

struct FakeNetlogonPipe {
    world: Rc<World>,
    host: String,
}

impl NetlogonPipe for FakeNetlogonPipe {
    fn logon_control2_ex(&self, function_code: u32, level: u32, domain: &str) -> Result<Option<NetlogonInfo2>, RpcFault> {
        self.world.record(format!(
            "{} logon_control2_ex {function_code} {level} {domain}",
            self.host
        ));
        let queued = self.world.verify_answers.borrow_mut().pop_front();
        Ok(queued.unwrap_or_else(|| self.world.verify_default.borrow().clone()))
    }

    fn get_forest_trust_information(&self, server: &str) -> Result<Vec<ForestTrustRecord>, RpcFault> {
        self.world
            .record(format!("{} get_forest_trust_information {server}", self.host));
        Ok(self.world.forest_records.borrow().clone())
    }
}
