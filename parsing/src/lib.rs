//! Textual grammar of security identifiers (`S-<rev>-<authority>-<sub>…`).
#![cfg_attr(not(feature = "std"), no_std)]
use core::fmt::{self, Display};
use core::str::FromStr;

use arrayvec::ArrayVec;
use thiserror::Error;

/// Maximum number of sub-authorities a SID can carry.
pub const MAX_SUBAUTHORITY_COUNT: u8 = 15;
/// Minimum number of sub-authorities a SID must carry.
pub const MIN_SUBAUTHORITY_COUNT: u8 = 1;

/// Largest identifier authority value (48 bits).
const MAX_AUTHORITY: u64 = 0xFFFF_FFFF_FFFF;

pub struct SidComponents {
    /// The SID revision value, generally 1.
    pub revision: u8,
    /// The SID identifier authority value, big-endian.
    pub identifier_authority: [u8; 6],
    /// The SID sub-authority values.
    pub sub_authority: ArrayVec<u32, { MAX_SUBAUTHORITY_COUNT as usize }>,
}

/// Error returned when a SID string or blob does not have the expected format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub struct InvalidSidFormat;

impl Display for InvalidSidFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Invalid format for Sid")
    }
}

fn parse_authority(s: &str) -> Result<[u8; 6], InvalidSidFormat> {
    let value = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse::<u64>(),
    }
    .map_err(|_| InvalidSidFormat)?;
    if value > MAX_AUTHORITY {
        return Err(InvalidSidFormat);
    }
    let [_, _, a, b, c, d, e, f] = value.to_be_bytes();
    Ok([a, b, c, d, e, f])
}

impl FromStr for SidComponents {
    type Err = InvalidSidFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut s_cmp = s.split('-');
        if !s_cmp
            .next()
            .is_some_and(|head| head.eq_ignore_ascii_case("s"))
        {
            return Err(InvalidSidFormat);
        }
        let revision = s_cmp
            .next()
            .ok_or(InvalidSidFormat)?
            .parse::<u8>()
            .map_err(|_| InvalidSidFormat)?;

        let identifier_authority = s_cmp
            .next()
            .ok_or(InvalidSidFormat)
            .and_then(parse_authority)?;
        let mut sub_authority = ArrayVec::new();
        for item in s_cmp {
            // `parse::<u32>` accepts a leading '+', the textual form never has one.
            if !item.bytes().all(|b| b.is_ascii_digit()) {
                return Err(InvalidSidFormat);
            }
            let item = item.parse::<u32>().map_err(|_| InvalidSidFormat)?;
            sub_authority.try_push(item).map_err(|_| InvalidSidFormat)?;
        }
        if sub_authority.len() < MIN_SUBAUTHORITY_COUNT as usize {
            return Err(InvalidSidFormat);
        }

        Ok(Self {
            revision,
            identifier_authority,
            sub_authority,
        })
    }
}
