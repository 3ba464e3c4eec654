pub use crate::InvalidSidFormat;
use crate::SidIdentifierAuthority;
use crate::utils::{SID_HEAD_SIZE, binary_size, sub_authority_size_guard, validate_sid_bytes};
use core::fmt::{self, Debug, Display};
use core::hash::{Hash, Hasher};
use core::str::FromStr;
use parsing::{MAX_SUBAUTHORITY_COUNT, SidComponents};

const MAX_SUBAUTHORITIES: usize = MAX_SUBAUTHORITY_COUNT as usize;

/// Owned **Security Identifier** (SID).
///
/// A SID is a revision, a 48-bit identifier authority and an ordered list of
/// 1 to 15 32-bit sub-authorities. Domain SIDs look like
/// `S-1-5-21-<a>-<b>-<c>` and every principal of that domain extends the
/// domain SID with one more sub-authority (its RID).
///
/// The value is stored inline (no allocation) and is `Copy`.
///
/// # Examples
/// ```rust
/// # use ad_trust::{SecurityIdentifier, SidIdentifierAuthority};
/// let sid = SecurityIdentifier::try_new(
///     1,
///     SidIdentifierAuthority::NT_AUTHORITY,
///     [32u32, 544u32],
/// ).expect("valid SID parts");
/// assert_eq!(sid.to_string(), "S-1-5-32-544");
/// assert_eq!(sid.to_bytes(), [1, 2, 0, 0, 0, 0, 0, 5, 32, 0, 0, 0, 32, 2, 0, 0]);
/// ```
#[derive(Clone, Copy)]
pub struct SecurityIdentifier {
    /// The SID revision value, generally 1.
    pub revision: u8,
    sub_authority_count: u8,
    /// The SID identifier authority value.
    pub identifier_authority: SidIdentifierAuthority,
    sub_authority: [u32; MAX_SUBAUTHORITIES],
}

impl Debug for SecurityIdentifier {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({self})", stringify!(SecurityIdentifier))
    }
}

impl SecurityIdentifier {
    /// The revision every SID produced by Windows carries.
    pub const REVISION: u8 = 1;

    /// Creates a new `SecurityIdentifier` from parts, validating input.
    ///
    /// Returns `None` if `sub_authority` length is out of bounds (not in 1..=15).
    ///
    /// # Examples
    /// ```rust
    /// # use ad_trust::{SecurityIdentifier, SidIdentifierAuthority};
    /// let sid = SecurityIdentifier::try_new(
    ///     1,
    ///     SidIdentifierAuthority::NT_AUTHORITY,
    ///     [21, 100, 200, 300],
    /// ).unwrap();
    /// assert_eq!(sid.get_sub_authorities(), [21, 100, 200, 300]);
    /// assert!(SecurityIdentifier::try_new(1, SidIdentifierAuthority::NT_AUTHORITY, []).is_none());
    /// ```
    #[must_use]
    #[inline]
    #[expect(
        clippy::indexing_slicing,
        clippy::cast_possible_truncation,
        reason = "N is checked against the array capacity (at most 15) by the guard"
    )]
    pub const fn try_new<const N: usize>(
        revision: u8,
        identifier_authority: SidIdentifierAuthority,
        sub_authority: [u32; N],
    ) -> Option<Self> {
        if !sub_authority_size_guard(N) {
            return None;
        }
        let mut array = [0u32; MAX_SUBAUTHORITIES];
        let mut index = 0;
        while index < N {
            array[index] = sub_authority[index];
            index += 1;
        }
        Some(Self {
            revision,
            sub_authority_count: N as u8,
            identifier_authority,
            sub_authority: array,
        })
    }

    /// Creates a new `SecurityIdentifier` from a slice of sub-authorities.
    ///
    /// Returns `None` if the slice length is not in 1..=15.
    #[must_use]
    #[inline]
    pub fn from_parts(
        revision: u8,
        identifier_authority: SidIdentifierAuthority,
        sub_authority: &[u32],
    ) -> Option<Self> {
        if !sub_authority_size_guard(sub_authority.len()) {
            return None;
        }
        let mut array = [0u32; MAX_SUBAUTHORITIES];
        array
            .iter_mut()
            .zip(sub_authority)
            .for_each(|(slot, value)| *slot = *value);
        Some(Self {
            revision,
            sub_authority_count: u8::try_from(sub_authority.len()).ok()?,
            identifier_authority,
            sub_authority: array,
        })
    }

    /// Decodes the binary wire form of a SID.
    ///
    /// The layout is an 8-byte header (revision, sub-authority count, 6-byte
    /// big-endian authority) followed by `count` little-endian `u32`
    /// sub-authorities. Bytes after the declared length are ignored.
    ///
    /// # Errors
    /// - [`InvalidSidFormat`] if fewer than 8 bytes are given, the declared
    ///   count is not in 1..=15 or exceeds the available bytes.
    ///
    /// # Examples
    /// ```rust
    /// # use ad_trust::SecurityIdentifier;
    /// let bytes: [u8; 16] = [
    ///     1,    // Revision
    ///     2,    // SubAuthorityCount
    ///     0, 0, 0, 0, 0, 5, // IdentifierAuthority = NT AUTHORITY
    ///     32, 0, 0, 0,      // SubAuthority[0] = 32
    ///     32, 2, 0, 0       // SubAuthority[1] = 544 (0x220 little endian)
    /// ];
    /// let sid = SecurityIdentifier::from_bytes(&bytes).unwrap();
    /// assert_eq!(sid.to_string(), "S-1-5-32-544");
    /// ```
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, InvalidSidFormat> {
        let count = validate_sid_bytes(bytes)?;
        let (head, tail) = bytes.split_at(SID_HEAD_SIZE);
        let [revision, _, a, b, c, d, e, f] =
            <[u8; SID_HEAD_SIZE]>::try_from(head).map_err(|_| InvalidSidFormat)?;
        let mut sub_authority = [0u32; MAX_SUBAUTHORITIES];
        for (slot, chunk) in sub_authority
            .iter_mut()
            .zip(tail.chunks_exact(size_of::<u32>()).take(count))
        {
            *slot = u32::from_le_bytes(chunk.try_into().map_err(|_| InvalidSidFormat)?);
        }
        Ok(Self {
            revision,
            sub_authority_count: u8::try_from(count).map_err(|_| InvalidSidFormat)?,
            identifier_authority: SidIdentifierAuthority::new([a, b, c, d, e, f]),
            sub_authority,
        })
    }

    /// Encodes this SID into its binary wire form.
    #[must_use]
    #[inline]
    pub fn to_bytes(&self) -> Vec<u8> {
        let subs = self.get_sub_authorities();
        let mut bytes = Vec::with_capacity(binary_size(subs.len()));
        bytes.push(self.revision);
        bytes.push(self.sub_authority_count);
        bytes.extend_from_slice(&self.identifier_authority.value);
        for sub in subs {
            bytes.extend_from_slice(&sub.to_le_bytes());
        }
        bytes
    }

    /// Returns the slice of sub-authorities.
    #[must_use]
    #[inline]
    pub fn get_sub_authorities(&self) -> &[u32] {
        // The count is kept in 1..=15 by every constructor.
        self.sub_authority
            .get(..usize::from(self.sub_authority_count))
            .unwrap_or_default()
    }

    /// Number of sub-authorities.
    #[must_use]
    #[inline]
    pub const fn sub_authority_count(&self) -> u8 {
        self.sub_authority_count
    }

    /// The last sub-authority, the relative identifier of an account SID.
    #[must_use]
    #[inline]
    pub fn rid(&self) -> Option<u32> {
        self.get_sub_authorities().last().copied()
    }

    /// Domain membership test.
    ///
    /// True when both SIDs share the identifier authority and the first
    /// `min(len_a, len_b)` sub-authorities are pairwise equal. The revision is
    /// ignored. A domain SID `S-1-5-21-1-2-3` therefore matches every
    /// principal `S-1-5-21-1-2-3-<rid>` of that domain.
    ///
    /// # Examples
    /// ```rust
    /// # use ad_trust::SecurityIdentifier;
    /// let domain: SecurityIdentifier = "S-1-5-21-1-2-3".parse().unwrap();
    /// let user: SecurityIdentifier = "S-1-5-21-1-2-3-1001".parse().unwrap();
    /// let other: SecurityIdentifier = "S-1-5-21-1-2-9-1001".parse().unwrap();
    /// assert!(domain.prefix_matches(&user));
    /// assert!(!domain.prefix_matches(&other));
    /// ```
    #[must_use]
    #[inline]
    pub fn prefix_matches(&self, other: &Self) -> bool {
        self.identifier_authority == other.identifier_authority
            && self
                .get_sub_authorities()
                .iter()
                .zip(other.get_sub_authorities())
                .all(|(a, b)| a == b)
    }
}

impl TryFrom<&[u8]> for SecurityIdentifier {
    type Error = InvalidSidFormat;

    #[inline]
    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(value)
    }
}

impl FromStr for SecurityIdentifier {
    type Err = InvalidSidFormat;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let components = SidComponents::from_str(s)?;
        Self::from_parts(
            components.revision,
            components.identifier_authority.into(),
            components.sub_authority.as_slice(),
        )
        .ok_or(InvalidSidFormat)
    }
}

impl Display for SecurityIdentifier {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.revision)?;

        // Identifier Authority: print as decimal if fits in u32, else as hex
        let id_auth_value = self.identifier_authority.as_u64();
        if id_auth_value <= 0xFFFF_FFFF {
            write!(f, "-{id_auth_value}")?;
        } else {
            write!(f, "-0x{id_auth_value:X}")?;
        }

        for &sub_auth in self.get_sub_authorities() {
            write!(f, "-{sub_auth}")?;
        }
        Ok(())
    }
}

impl PartialEq for SecurityIdentifier {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.revision == other.revision
            && self.identifier_authority == other.identifier_authority
            && self.get_sub_authorities() == other.get_sub_authorities()
    }
}

impl Eq for SecurityIdentifier {}

impl Hash for SecurityIdentifier {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.revision.hash(state);
        self.sub_authority_count.hash(state);
        self.identifier_authority.hash(state);
        Hash::hash_slice(self.get_sub_authorities(), state);
    }
}
