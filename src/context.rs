use crate::TrustConfig;
use crate::directory::{DirectoryClient, DirectoryConnector};
use crate::dns::DnsResolver;
use crate::kerberos::KerberosHelper;
use crate::name_service::NameService;
use crate::rpc::{DcLocator, LsaConnector, NetlogonConnector};

/// Configuration and every external collaborator of the engine.
///
/// Registries, sessions and joins borrow the context; it is built once by the
/// caller with real clients or with test doubles.
pub struct TrustContext {
    pub config: TrustConfig,
    /// Local identity directory, already bound with the service identity.
    pub directory: Box<dyn DirectoryClient>,
    /// Opens connections to trusted domain controllers.
    pub remote_directory: Box<dyn DirectoryConnector>,
    pub name_service: Box<dyn NameService>,
    pub kerberos: Box<dyn KerberosHelper>,
    pub dns: Box<dyn DnsResolver>,
    pub locator: Box<dyn DcLocator>,
    pub lsa: Box<dyn LsaConnector>,
    pub netlogon: Box<dyn NetlogonConnector>,
}
