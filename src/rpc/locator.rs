//! Domain controller discovery (the NetLogon/CLDAP "finddc" ping).

use core::ops::BitOr;

use uuid::Uuid;

use crate::status::RpcFault;

/// `NBT_SERVER_*` flags, both as query requirements and as reported server type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ServerFlags(pub u32);

impl ServerFlags {
    pub const PDC: Self = Self(0x0000_0001);
    pub const GC: Self = Self(0x0000_0004);
    pub const LDAP: Self = Self(0x0000_0008);
    pub const DS: Self = Self(0x0000_0010);
    pub const CLOSEST: Self = Self(0x0000_0080);
    pub const WRITABLE: Self = Self(0x0000_0100);

    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ServerFlags {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// What to locate a controller for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DcTarget {
    /// Any controller of the DNS domain, found through SRV records.
    Domain(String),
    /// The controller at a given host name or IP address.
    Address(String),
}

/// Answer of a located controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DcInfo {
    /// NetBIOS name of the domain.
    pub domain_name: String,
    pub dns_domain: String,
    pub forest: String,
    pub domain_uuid: Uuid,
    pub pdc_dns_name: String,
    pub pdc_name: String,
    pub server_type: ServerFlags,
}

pub trait DcLocator {
    /// Finds a controller of `target` satisfying `flags`. `None` when nothing answered.
    ///
    /// # Errors
    /// - [`RpcFault`] carrying the status name of the failed lookup.
    fn find_dc(&self, target: &DcTarget, flags: ServerFlags) -> Result<Option<DcInfo>, RpcFault>;
}
