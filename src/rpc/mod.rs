//! Contracts of the DCE-RPC services a trust setup talks to.
//!
//! The engine drives the protocol (binding order, handle lifecycle, status
//! translation); the byte-level SMB and DCE-RPC transport lives behind
//! [`LsaConnector`], [`NetlogonConnector`] and [`DcLocator`].

mod binding;
mod credentials;
pub mod locator;
pub mod lsa;
pub mod netlogon;

pub use binding::{Binding, Transport, TransportOptions};
pub use credentials::{ClientIdentity, Credentials};
pub use locator::{DcInfo, DcLocator, DcTarget, ServerFlags};
pub use lsa::{LsaConnector, LsaPipe};
pub use netlogon::{NetlogonConnector, NetlogonPipe};
