use parsing::{InvalidSidFormat, MAX_SUBAUTHORITY_COUNT, MIN_SUBAUTHORITY_COUNT};

/// Revision byte, sub-authority count byte and 6-byte authority.
pub const SID_HEAD_SIZE: usize = 8;
const COUNT_OFFSET: usize = 1;

pub const fn sub_authority_size_guard(size: usize) -> bool {
    MIN_SUBAUTHORITY_COUNT as usize <= size && size <= MAX_SUBAUTHORITY_COUNT as usize
}

/// Size in bytes of the binary form of a SID with `count` sub-authorities.
pub const fn binary_size(count: usize) -> usize {
    SID_HEAD_SIZE + count * size_of::<u32>()
}

/// Validates the header of a binary SID and returns its sub-authority count.
///
/// - at least the 8-byte header must be present
/// - `sub_authority_count` in [1..=15]
/// - the buffer must hold every declared sub-authority; trailing bytes are ignored
/// - any revision and identifier authority value is accepted
pub const fn validate_sid_bytes(buf: &[u8]) -> Result<usize, InvalidSidFormat> {
    if buf.len() < SID_HEAD_SIZE {
        return Err(InvalidSidFormat);
    }
    #[expect(
        clippy::indexing_slicing,
        reason = "We know the count offset is in the bound (was checked by minimum size)"
    )]
    let count = buf[COUNT_OFFSET] as usize;

    if !sub_authority_size_guard(count) {
        return Err(InvalidSidFormat);
    }
    if buf.len() < binary_size(count) {
        return Err(InvalidSidFormat);
    }
    Ok(count)
}
