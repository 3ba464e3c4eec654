//! Contract of the LDAP directories the engine reads from.
//!
//! The local identity directory and the trusted domain controllers are both
//! reached through [`DirectoryClient`]; remote controllers are opened with a
//! [`DirectoryConnector`].

use core::fmt::Write as _;
use std::collections::BTreeMap;
use std::path::PathBuf;

use thiserror::Error;

/// Plain LDAP port, used for searches in trusted domain controllers.
pub const LDAP_PORT: u16 = 389;
/// Global catalog port advertised by located controllers.
pub const GC_PORT: u16 = 3268;
/// `LDAP_SERVER_EXTENDED_DN_OID`: makes DN values carry `<GUID=…>;<SID=…>` prefixes.
pub const EXTENDED_DN_OID: &str = "1.2.840.113556.1.4.529";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("entry not found: {dn}")]
    NotFound { dn: String },
    #[error("{0}")]
    Operation(String),
}

/// Search scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Base,
    OneLevel,
    Subtree,
}

/// A directory entry. Attribute names are case-insensitive and kept lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Entry {
    pub dn: String,
    attrs: BTreeMap<String, Vec<Vec<u8>>>,
}

impl Entry {
    #[inline]
    #[must_use]
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attrs: BTreeMap::new(),
        }
    }

    /// Adds `values` to `name`, keeping values already present.
    #[inline]
    #[must_use]
    pub fn with_attr<I, V>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Vec<u8>>,
    {
        self.attrs
            .entry(name.to_ascii_lowercase())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    #[inline]
    #[must_use]
    pub fn values(&self, name: &str) -> &[Vec<u8>] {
        self.attrs
            .get(&name.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    #[inline]
    #[must_use]
    pub fn first(&self, name: &str) -> Option<&[u8]> {
        self.values(name).first().map(Vec::as_slice)
    }

    /// First value of `name` when it is valid UTF-8.
    #[inline]
    #[must_use]
    pub fn first_str(&self, name: &str) -> Option<&str> {
        self.first(name).and_then(|value| core::str::from_utf8(value).ok())
    }

    /// Every UTF-8 value of `name`.
    #[inline]
    pub fn strs<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + use<'a> {
        self.values(name)
            .iter()
            .filter_map(|value| core::str::from_utf8(value).ok())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchResult {
    pub entries: Vec<Entry>,
    /// The server stopped before returning every match.
    pub truncated: bool,
}

/// How a connection to a remote directory authenticates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryBind {
    /// Anonymous bind, optionally sending the extended DN control.
    Anonymous { extended_dn: bool },
    /// SASL GSSAPI bind using the given credential cache, or the ambient one.
    Gssapi { ccache: Option<PathBuf> },
}

pub trait DirectoryClient {
    /// Reads a single entry.
    ///
    /// # Errors
    /// - [`DirectoryError::NotFound`] if `dn` does not exist.
    fn get_entry(&self, dn: &str, attrs: &[&str]) -> Result<Entry, DirectoryError>;

    /// # Errors
    /// - [`DirectoryError::NotFound`] if `base` does not exist.
    fn search(
        &self,
        base: &str,
        scope: Scope,
        filter: &str,
        attrs: &[&str],
    ) -> Result<SearchResult, DirectoryError>;
}

pub trait DirectoryConnector {
    /// Opens and binds a connection to `host:port`.
    ///
    /// # Errors
    /// - [`DirectoryError::Operation`] if the server cannot be reached or the bind fails.
    fn connect(
        &self,
        host: &str,
        port: u16,
        bind: &DirectoryBind,
    ) -> Result<Box<dyn DirectoryClient>, DirectoryError>;
}

/// Escapes an assertion value for an LDAP filter (RFC 4515).
#[inline]
#[must_use]
pub fn escape_filter(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '*' => escaped.push_str("\\2a"),
            '(' => escaped.push_str("\\28"),
            ')' => escaped.push_str("\\29"),
            '\\' => escaped.push_str("\\5c"),
            '\0' => escaped.push_str("\\00"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Escapes every byte of a binary assertion value, as needed for `objectSid`.
#[inline]
#[must_use]
pub fn escape_binary(value: &[u8]) -> String {
    value
        .iter()
        .fold(String::with_capacity(value.len() * 3), |mut escaped, byte| {
            let _ = write!(escaped, "\\{byte:02x}");
            escaped
        })
}

/// `ad.example.com` → `dc=ad,dc=example,dc=com`
#[inline]
#[must_use]
pub fn realm_to_suffix(domain: &str) -> String {
    domain
        .split('.')
        .filter(|label| !label.is_empty())
        .map(|label| format!("dc={}", label.to_ascii_lowercase()))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_names_are_case_insensitive() {
        let entry = Entry::new("cn=x")
            .with_attr("ipaNTFlatName", ["IPA"])
            .with_attr("objectClass", ["top", "user"]);
        assert_eq!(entry.first_str("ipantflatname"), Some("IPA"));
        assert_eq!(entry.strs("OBJECTCLASS").collect::<Vec<_>>(), ["top", "user"]);
        assert!(entry.first("missing").is_none());
    }

    #[test]
    fn filter_escaping() {
        assert_eq!(escape_filter("a*(b)\\c"), "a\\2a\\28b\\29\\5cc");
        assert_eq!(escape_filter("plain name"), "plain name");
    }

    #[test]
    fn binary_escaping() {
        assert_eq!(escape_binary(&[1, 0x2a, 0xff]), "\\01\\2a\\ff");
    }

    #[test]
    fn suffix() {
        assert_eq!(realm_to_suffix("AD.Example.com"), "dc=ad,dc=example,dc=com");
        assert_eq!(realm_to_suffix("ad.test."), "dc=ad,dc=test");
    }
}
