//! NetLogon operations used to verify trusts and enumerate forests.

use crate::rpc::lsa::ForestTrustRecord;
use crate::rpc::{Binding, ClientIdentity};
use crate::status::RpcFault;

/// `NETLOGON_CONTROL_TC_VERIFY`
pub const NETLOGON_CONTROL_TC_VERIFY: u32 = 10;
/// `NETLOGON_VERIFY_STATUS_RETURNED`
pub const NETLOGON_VERIFY_STATUS_RETURNED: u32 = 0x80;

/// A WERROR status with its symbolic name (`WERR_OK`, `WERR_ACCESS_DENIED`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WerrorStatus {
    pub code: i32,
    pub name: String,
}

impl WerrorStatus {
    #[inline]
    #[must_use]
    pub fn new(code: i32, name: impl Into<String>) -> Self {
        Self {
            code,
            name: name.into(),
        }
    }

    #[inline]
    #[must_use]
    pub fn ok() -> Self {
        Self::new(0, "WERR_OK")
    }

    #[inline]
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.code == 0
    }
}

impl From<&WerrorStatus> for RpcFault {
    fn from(status: &WerrorStatus) -> Self {
        Self::new(status.code, status.name.clone())
    }
}

/// `NETLOGON_INFO_2`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetlogonInfo2 {
    pub flags: u32,
    pub trusted_dc_name: String,
    pub pdc_connection_status: WerrorStatus,
    pub tc_connection_status: WerrorStatus,
}

impl NetlogonInfo2 {
    #[inline]
    #[must_use]
    pub const fn status_returned(&self) -> bool {
        self.flags & NETLOGON_VERIFY_STATUS_RETURNED != 0
    }
}

/// Opens `netlogon` pipes.
pub trait NetlogonConnector {
    /// # Errors
    /// - [`RpcFault`] with the NTSTATUS of the failed bind.
    fn connect(&self, binding: &Binding, identity: &ClientIdentity) -> Result<Box<dyn NetlogonPipe>, RpcFault>;
}

pub trait NetlogonPipe {
    /// `NetrLogonControl2Ex` at information level 2 with a domain name as data.
    ///
    /// `None` when the server answered without an information structure.
    fn logon_control2_ex(
        &self,
        function_code: u32,
        level: u32,
        domain: &str,
    ) -> Result<Option<NetlogonInfo2>, RpcFault>;

    /// `DsRGetForestTrustInformation` for the forest of `server`.
    fn get_forest_trust_information(&self, server: &str) -> Result<Vec<ForestTrustRecord>, RpcFault>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_returned_flag() {
        let info = NetlogonInfo2 {
            flags: NETLOGON_VERIFY_STATUS_RETURNED | 0x1,
            trusted_dc_name: String::new(),
            pdc_connection_status: WerrorStatus::ok(),
            tc_connection_status: WerrorStatus::ok(),
        };
        assert!(info.status_returned());
        assert!(info.pdc_connection_status.is_ok());
    }
}
