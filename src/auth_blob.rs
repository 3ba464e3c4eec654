//! Wire encoding of the trust authentication information.
//!
//! The blob handed to `LsarCreateTrustedDomainEx2` is a little-endian
//! `trustDomainPasswords` structure:
//!
//! ```text
//! confounder[512] | outgoing | incoming | outgoing_size: u32 | incoming_size: u32
//! ```
//!
//! where `outgoing` and `incoming` are `trustAuthInOutBlob`s:
//!
//! ```text
//! count: u32 | current_offset: u32 | previous_offset: u32 | current[count] | previous[count]
//! ```
//!
//! and every entry is an `AuthenticationInformation`:
//!
//! ```text
//! last_update_time: u64 | auth_type: u32 | size: u32 | password[size] | padding to 4 bytes
//! ```

use bytes::BufMut;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

pub const CONFOUNDER_LEN: usize = 512;
const IN_OUT_HEADER_LEN: u32 = 12;

/// `TRUST_AUTH_TYPE_*`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u32)]
pub enum TrustAuthType {
    None = 0,
    Nt4Owf = 1,
    Clear = 2,
    Version = 3,
}

/// One authentication entry of a trust: a password with its update time.
#[derive(Debug, Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct AuthenticationInformation {
    pub last_update_time: u64,
    #[zeroize(skip)]
    pub auth_type: TrustAuthType,
    password: Vec<u8>,
}

impl AuthenticationInformation {
    /// Clear-text entry; the password is stored UTF-16LE encoded.
    #[inline]
    #[must_use]
    pub fn clear(password: &str, last_update_time: u64) -> Self {
        Self {
            last_update_time,
            auth_type: TrustAuthType::Clear,
            password: utf16le(password),
        }
    }

    #[inline]
    #[must_use]
    pub fn password(&self) -> &[u8] {
        &self.password
    }

    fn padding(&self) -> usize {
        (4 - self.password.len() % 4) % 4
    }

    fn encoded_len(&self) -> usize {
        8 + 4 + 4 + self.password.len() + self.padding()
    }

    fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.put_u64_le(self.last_update_time);
        buf.put_u32_le(self.auth_type.into());
        buf.put_u32_le(len_u32(self.password.len()));
        buf.put_slice(&self.password);
        buf.put_bytes(0, self.padding());
    }
}

/// `trustAuthInOutBlob`: current authentication entries of one trust direction.
///
/// No rotation history is kept, so the previous entries mirror the current ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustAuthInOutBlob {
    pub current: Vec<AuthenticationInformation>,
}

impl TrustAuthInOutBlob {
    #[inline]
    #[must_use]
    pub fn new(current: Vec<AuthenticationInformation>) -> Self {
        Self { current }
    }

    fn entries_len(&self) -> usize {
        self.current
            .iter()
            .map(AuthenticationInformation::encoded_len)
            .sum()
    }

    #[inline]
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        IN_OUT_HEADER_LEN as usize + 2 * self.entries_len()
    }

    fn encode_into(&self, buf: &mut Vec<u8>) {
        let count = len_u32(self.current.len());
        let (current_offset, previous_offset) = if count > 0 {
            (
                IN_OUT_HEADER_LEN,
                IN_OUT_HEADER_LEN.saturating_add(len_u32(self.entries_len())),
            )
        } else {
            (0, 0)
        };
        buf.put_u32_le(count);
        buf.put_u32_le(current_offset);
        buf.put_u32_le(previous_offset);
        for _ in 0..2 {
            for entry in &self.current {
                entry.encode_into(buf);
            }
        }
    }
}

/// `trustDomainPasswords`: random confounder followed by both trust directions.
pub struct TrustDomainPasswords {
    confounder: Zeroizing<[u8; CONFOUNDER_LEN]>,
    pub outgoing: TrustAuthInOutBlob,
    pub incoming: TrustAuthInOutBlob,
}

impl TrustDomainPasswords {
    /// Same blob for both directions with a fresh random confounder.
    #[inline]
    #[must_use]
    pub fn symmetric(blob: TrustAuthInOutBlob) -> Self {
        let mut confounder = Zeroizing::new([0u8; CONFOUNDER_LEN]);
        rand::thread_rng().fill_bytes(confounder.as_mut_slice());
        Self::with_confounder(confounder, blob)
    }

    #[inline]
    #[must_use]
    pub fn with_confounder(
        confounder: Zeroizing<[u8; CONFOUNDER_LEN]>,
        blob: TrustAuthInOutBlob,
    ) -> Self {
        Self {
            confounder,
            incoming: blob.clone(),
            outgoing: blob,
        }
    }

    #[inline]
    #[must_use]
    pub fn encode(&self) -> Zeroizing<Vec<u8>> {
        let outgoing_len = self.outgoing.encoded_len();
        let incoming_len = self.incoming.encoded_len();
        let mut buf = Zeroizing::new(Vec::with_capacity(
            CONFOUNDER_LEN + outgoing_len + incoming_len + 8,
        ));
        buf.put_slice(self.confounder.as_slice());
        self.outgoing.encode_into(&mut buf);
        self.incoming.encode_into(&mut buf);
        buf.put_u32_le(len_u32(outgoing_len));
        buf.put_u32_le(len_u32(incoming_len));
        buf
    }
}

fn utf16le(value: &str) -> Vec<u8> {
    value.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

fn len_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Unwrap is not an issue in test")]
#[allow(clippy::indexing_slicing, reason = "Offsets are checked against the blob length")]
mod tests {
    use super::*;

    fn read_u32(buf: &[u8], at: usize) -> u32 {
        u32::from_le_bytes(buf[at..at + 4].try_into().unwrap())
    }

    #[test]
    fn clear_entry_layout() {
        let entry = AuthenticationInformation::clear("abc", 0x0102_0304_0506_0708);
        let mut buf = Vec::new();
        entry.encode_into(&mut buf);
        assert_eq!(buf.len(), 8 + 4 + 4 + 6 + 2);
        assert_eq!(buf[..8], 0x0102_0304_0506_0708u64.to_le_bytes());
        assert_eq!(read_u32(&buf, 8), 2);
        assert_eq!(read_u32(&buf, 12), 6);
        assert_eq!(&buf[16..22], b"a\0b\0c\0");
        assert_eq!(&buf[22..], [0, 0]);
    }

    #[test]
    fn in_out_blob_offsets() {
        let blob = TrustAuthInOutBlob::new(vec![AuthenticationInformation::clear("abcd", 7)]);
        let mut buf = Vec::new();
        blob.encode_into(&mut buf);
        let entry_len = 8 + 4 + 4 + 8;
        assert_eq!(buf.len(), blob.encoded_len());
        assert_eq!(read_u32(&buf, 0), 1);
        assert_eq!(read_u32(&buf, 4), 12);
        assert_eq!(read_u32(&buf, 8), 12 + entry_len);
        assert_eq!(buf[12..12 + entry_len as usize], buf[12 + entry_len as usize..]);
    }

    #[test]
    fn empty_blob_has_zero_offsets() {
        let mut buf = Vec::new();
        TrustAuthInOutBlob::new(Vec::new()).encode_into(&mut buf);
        assert_eq!(buf, [0u8; 12]);
    }

    #[test]
    fn passwords_layout() {
        let blob = TrustAuthInOutBlob::new(vec![AuthenticationInformation::clear("secret", 1)]);
        let blob_len = blob.encoded_len();
        let passwords = TrustDomainPasswords::with_confounder(Zeroizing::new([0xAA; CONFOUNDER_LEN]), blob);
        let encoded = passwords.encode();
        assert_eq!(encoded.len(), CONFOUNDER_LEN + 2 * blob_len + 8);
        assert!(encoded[..CONFOUNDER_LEN].iter().all(|b| *b == 0xAA));
        let outgoing = &encoded[CONFOUNDER_LEN..CONFOUNDER_LEN + blob_len];
        let incoming = &encoded[CONFOUNDER_LEN + blob_len..CONFOUNDER_LEN + 2 * blob_len];
        assert_eq!(outgoing, incoming);
        let tail = encoded.len() - 8;
        assert_eq!(read_u32(&encoded, tail) as usize, blob_len);
        assert_eq!(read_u32(&encoded, tail + 4) as usize, blob_len);
    }

    #[test]
    fn confounders_are_random() {
        let blob = TrustAuthInOutBlob::new(vec![AuthenticationInformation::clear("s", 1)]);
        let a = TrustDomainPasswords::symmetric(blob.clone()).encode();
        let b = TrustDomainPasswords::symmetric(blob).encode();
        assert_ne!(a[..CONFOUNDER_LEN], b[..CONFOUNDER_LEN]);
    }
}
