//! Local Security Authority (`lsarpc`) policy operations used by trust setup.

use core::fmt::{self, Display};

use num_enum::{IntoPrimitive, TryFromPrimitive};
use uuid::Uuid;

use crate::SecurityIdentifier;
use crate::rpc::{Binding, ClientIdentity};
use crate::status::RpcFault;

pub const TRUST_DIRECTION_INBOUND: u32 = 0x1;
pub const TRUST_DIRECTION_OUTBOUND: u32 = 0x2;

pub const TRUST_TYPE_UPLEVEL: u32 = 0x2;

pub const TRUST_ATTRIBUTE_NON_TRANSITIVE: u32 = 0x1;
pub const TRUST_ATTRIBUTE_FOREST_TRANSITIVE: u32 = 0x8;

pub const KERB_ENCTYPE_RC4_HMAC_MD5: u32 = 0x4;
pub const KERB_ENCTYPE_AES128_CTS_HMAC_SHA1_96: u32 = 0x8;
pub const KERB_ENCTYPE_AES256_CTS_HMAC_SHA1_96: u32 = 0x10;

/// Opaque policy handle returned by `LsarOpenPolicy2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PolicyHandle(pub Uuid);

/// Opaque trusted domain object handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrustedDomainHandle(pub Uuid);

/// `LSA_ROLE_*`
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u32)]
pub enum PolicyRole {
    Backup = 2,
    Primary = 3,
}

/// `LSA_POLICY_INFO_DNS`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsDomainInfo {
    /// NetBIOS name of the domain.
    pub name: String,
    pub dns_domain: String,
    pub dns_forest: String,
    pub domain_guid: Uuid,
    pub sid: Option<SecurityIdentifier>,
}

/// `LSA_TRUSTED_DOMAIN_INFO_INFO_EX`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedDomainInfoEx {
    pub domain_name: String,
    pub netbios_name: String,
    pub sid: SecurityIdentifier,
    pub trust_direction: u32,
    pub trust_type: u32,
    pub trust_attributes: u32,
}

/// RC4-encrypted `trustDomainPasswords`, the `LSA_TRUSTED_DOMAIN_INFO_AUTH_INFO_INTERNAL` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthInfoInternal {
    pub auth_blob: Vec<u8>,
}

/// `LSA_FOREST_TRUST_*` record types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u32)]
pub enum ForestTrustRecordType {
    TopLevelName = 0,
    TopLevelNameEx = 1,
    DomainInfo = 2,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForestTrustData {
    /// A DNS suffix routed to the forest.
    TopLevelName(String),
    /// A DNS suffix excluded from routing.
    TopLevelNameEx(String),
    DomainInfo {
        dns_domain_name: String,
        netbios_domain_name: String,
        domain_sid: SecurityIdentifier,
    },
}

/// One entry of the forest trust information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForestTrustRecord {
    pub flags: u32,
    /// NTTIME of the last update.
    pub time: u64,
    pub data: ForestTrustData,
}

impl ForestTrustRecord {
    #[inline]
    #[must_use]
    pub const fn top_level_name(name: String, time: u64) -> Self {
        Self {
            flags: 0,
            time,
            data: ForestTrustData::TopLevelName(name),
        }
    }

    #[inline]
    #[must_use]
    pub const fn record_type(&self) -> ForestTrustRecordType {
        match self.data {
            ForestTrustData::TopLevelName(_) => ForestTrustRecordType::TopLevelName,
            ForestTrustData::TopLevelNameEx(_) => ForestTrustRecordType::TopLevelNameEx,
            ForestTrustData::DomainInfo { .. } => ForestTrustRecordType::DomainInfo,
        }
    }
}

/// One conflict reported by `LsarSetForestTrustInformation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollisionRecord {
    pub index: u32,
    pub collision_type: u32,
    pub flags: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CollisionInfo {
    pub entries: Vec<CollisionRecord>,
}

impl Display for CollisionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, record) in self.entries.iter().enumerate() {
            if position > 0 {
                f.write_str("; ")?;
            }
            write!(
                f,
                "record {} ({}) type {} flags {:#x}",
                record.index, record.name, record.collision_type, record.flags
            )?;
        }
        Ok(())
    }
}

/// Opens `lsarpc` pipes.
pub trait LsaConnector {
    /// Connects and authenticates over `binding`.
    ///
    /// # Errors
    /// - [`RpcFault`] with the NTSTATUS of the failed bind.
    fn connect(&self, binding: &Binding, identity: &ClientIdentity) -> Result<Box<dyn LsaPipe>, RpcFault>;
}

/// An authenticated `lsarpc` pipe.
pub trait LsaPipe {
    /// Session key derived during authentication; empty when none was negotiated.
    fn session_key(&self) -> &[u8];

    /// `LsarOpenPolicy2` with `MAXIMUM_ALLOWED` access.
    fn open_policy2(&self) -> Result<PolicyHandle, RpcFault>;

    /// `LsarQueryInformationPolicy2(LSA_POLICY_INFO_DNS)`
    fn query_dns_domain_info(&self, policy: &PolicyHandle) -> Result<DnsDomainInfo, RpcFault>;

    /// `LsarQueryInformationPolicy2(LSA_POLICY_INFO_ROLE)`, raw role value.
    fn query_role(&self, policy: &PolicyHandle) -> Result<u32, RpcFault>;

    /// `LsarQueryTrustedDomainInfoByName(LSA_TRUSTED_DOMAIN_INFO_FULL_INFO)`
    fn query_trusted_domain_by_name(
        &self,
        policy: &PolicyHandle,
        name: &str,
    ) -> Result<TrustedDomainInfoEx, RpcFault>;

    fn delete_trusted_domain(&self, policy: &PolicyHandle, sid: &SecurityIdentifier) -> Result<(), RpcFault>;

    /// `LsarCreateTrustedDomainEx2`
    fn create_trusted_domain_ex2(
        &self,
        policy: &PolicyHandle,
        info: &TrustedDomainInfoEx,
        auth: &AuthInfoInternal,
    ) -> Result<TrustedDomainHandle, RpcFault>;

    /// `LsarOpenTrustedDomainByName` with `MAXIMUM_ALLOWED` access.
    fn open_trusted_domain_by_name(
        &self,
        policy: &PolicyHandle,
        name: &str,
    ) -> Result<TrustedDomainHandle, RpcFault>;

    /// `LsarSetInformationTrustedDomain(LSA_TRUSTED_DOMAIN_SUPPORTED_ENCRYPTION_TYPES)`
    fn set_supported_enc_types(&self, handle: &TrustedDomainHandle, enc_types: u32) -> Result<(), RpcFault>;

    /// `LsarQueryInfoTrustedDomain(LSA_TRUSTED_DOMAIN_INFO_INFO_EX)`
    fn query_trusted_domain_info_ex(&self, handle: &TrustedDomainHandle) -> Result<TrustedDomainInfoEx, RpcFault>;

    /// `LsarSetInformationTrustedDomain(LSA_TRUSTED_DOMAIN_INFO_INFO_EX)`
    fn set_trusted_domain_info_ex(
        &self,
        handle: &TrustedDomainHandle,
        info: &TrustedDomainInfoEx,
    ) -> Result<(), RpcFault>;

    /// `lsaRSetForestTrustInformation` for the trust with `domain`.
    fn set_forest_trust_information(
        &self,
        policy: &PolicyHandle,
        domain: &str,
        records: &[ForestTrustRecord],
    ) -> Result<Option<CollisionInfo>, RpcFault>;

    /// `LsarClose`
    fn close(&self, handle: Uuid) -> Result<(), RpcFault>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_types() {
        let record = ForestTrustRecord::top_level_name("ipa.test".into(), 1);
        assert_eq!(u32::from(record.record_type()), 0);
        assert_eq!(record.flags, 0);
        assert_eq!(PolicyRole::try_from(3), Ok(PolicyRole::Primary));
    }

    #[test]
    fn collision_display() {
        let info = CollisionInfo {
            entries: vec![CollisionRecord {
                index: 0,
                collision_type: 1,
                flags: 0x10,
                name: "ipa.test".into(),
            }],
        };
        assert_eq!(info.to_string(), "record 0 (ipa.test) type 1 flags 0x10");
    }
}
