use core::fmt::{self, Display};
use core::str::FromStr;

/// Error returned when an object name cannot be split into name and domain.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObjectNameParsingError;

impl Display for ObjectNameParsingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to parse object name and domain")
    }
}
impl core::error::Error for ObjectNameParsingError {}

/// Trusted domain designated either by its DNS name or by its NetBIOS name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DomainTarget {
    /// DNS name of the domain (`ad.example.com`).
    Domain(String),
    /// NetBIOS (flat) name of the domain (`AD`).
    FlatName(String),
}

impl Display for DomainTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domain(domain) => f.write_str(domain),
            Self::FlatName(flatname) => f.write_str(flatname),
        }
    }
}

/// Name of an object in a trusted domain, `user@domain`, `DOMAIN\user` or a
/// bare `user`. Components are lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectName {
    pub name: String,
    pub home: Option<DomainTarget>,
}

impl ObjectName {
    #[inline]
    pub fn new<N: Into<String>>(name: N, home: Option<DomainTarget>) -> Self {
        Self {
            name: name.into(),
            home,
        }
    }
}

impl Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.home {
            Some(DomainTarget::Domain(domain)) => write!(f, "{}@{domain}", self.name),
            Some(DomainTarget::FlatName(flatname)) => write!(f, "{flatname}\\{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

impl FromStr for ObjectName {
    type Err = ObjectNameParsingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_lowercase();
        let (name, home) = if let Some((name, domain)) = lowered.split_once('@') {
            (name, Some(DomainTarget::Domain(domain.to_owned())))
        } else if let Some((flatname, name)) = lowered.split_once('\\') {
            (name, Some(DomainTarget::FlatName(flatname.to_owned())))
        } else {
            (lowered.as_str(), None)
        };
        let domain_is_empty = match &home {
            Some(DomainTarget::Domain(d) | DomainTarget::FlatName(d)) => d.is_empty(),
            None => false,
        };
        if name.is_empty() || domain_is_empty || name.contains(['@', '\\']) {
            return Err(ObjectNameParsingError);
        }
        Ok(Self::new(name, home))
    }
}
