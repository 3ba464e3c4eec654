use core::fmt::{self, Display};

/// DCE-RPC protocol sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    /// `ncacn_np`, SMB named pipe.
    NamedPipe,
    /// `ncacn_ip_tcp`
    Tcp,
}

impl Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NamedPipe => "ncacn_np",
            Self::Tcp => "ncacn_ip_tcp",
        })
    }
}

/// Binding options controlling the SMB dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportOptions {
    /// Prefer SMB2.
    Smb2Print,
    /// SMB1 or the transport default.
    Print,
}

impl Display for TransportOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Smb2Print => "smb2,print",
            Self::Print => "print",
        })
    }
}

/// A string binding such as `ncacn_np:dc1.ad.test[smb2,print]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Binding {
    pub transport: Transport,
    pub host: String,
    pub options: TransportOptions,
}

impl Binding {
    #[inline]
    #[must_use]
    pub fn new(transport: Transport, host: impl Into<String>, options: TransportOptions) -> Self {
        Self {
            transport,
            host: host.into(),
            options,
        }
    }

    /// Every binding worth trying against `host`, in preference order.
    ///
    /// Named pipes come before TCP and SMB2 before the default dialect,
    /// local policies may block any of them.
    #[inline]
    #[must_use]
    pub fn candidates(host: &str) -> Vec<Self> {
        [Transport::NamedPipe, Transport::Tcp]
            .into_iter()
            .flat_map(|transport| {
                [TransportOptions::Smb2Print, TransportOptions::Print]
                    .into_iter()
                    .map(move |options| Self::new(transport, host, options))
            })
            .collect()
    }
}

impl Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}[{}]", self.transport, self.host, self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_order() {
        let candidates: Vec<String> = Binding::candidates("dc1.ad.test")
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            candidates,
            [
                "ncacn_np:dc1.ad.test[smb2,print]",
                "ncacn_np:dc1.ad.test[print]",
                "ncacn_ip_tcp:dc1.ad.test[smb2,print]",
                "ncacn_ip_tcp:dc1.ad.test[print]",
            ]
        );
    }
}
