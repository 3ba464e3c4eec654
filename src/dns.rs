/// One answer of an SRV query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SrvTarget {
    /// Target host, without the trailing dot.
    pub target: String,
    pub port: u16,
}

impl SrvTarget {
    /// Builds a target, stripping the trailing dot of absolute names.
    #[inline]
    #[must_use]
    pub fn new(target: &str, port: u16) -> Self {
        Self {
            target: target.trim_end_matches('.').to_owned(),
            port,
        }
    }
}

/// DNS resolution used to discover global catalog servers.
pub trait DnsResolver {
    /// Resolves the SRV records of `name`. Resolution failures are an empty answer.
    fn query_srv(&self, name: &str) -> Vec<SrvTarget>;
}

/// `_gc._tcp.<domain>.`
#[inline]
#[must_use]
pub fn gc_srv_name(domain: &str) -> String {
    format!("_gc._tcp.{domain}.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_names_are_stripped() {
        assert_eq!(SrvTarget::new("dc1.ad.test.", 3268).target, "dc1.ad.test");
        assert_eq!(gc_srv_name("ad.test"), "_gc._tcp.ad.test.");
    }
}
