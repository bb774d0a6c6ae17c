//! Rolling 64-bit content hash
//!
//! Line and word identity throughout the engine is hash identity: two lines
//! are "equal" when their normalized contents fold to the same value. The
//! mixer is FNV-like with an extra high shift so single-byte lines spread
//! across the full 64 bits.

/// Initial hash value.
///
/// A line or word whose normalized content is empty keeps this value, so the
/// seed doubles as the empty sentinel (`ignore_empty_lines` checks against it
/// instead of tracking a separate flag).
pub const HASH_SEED: u64 = 0x8422_2325;

/// Fold one byte into the running hash.
#[inline]
pub fn hash_byte(hval: u64, byte: u8) -> u64 {
    let hval = hval ^ u64::from(byte);

    hval.wrapping_add(
        (hval << 1)
            .wrapping_add(hval << 4)
            .wrapping_add(hval << 5)
            .wrapping_add(hval << 7)
            .wrapping_add(hval << 8)
            .wrapping_add(hval << 40),
    )
}

/// Hash a whole byte slice starting from the seed.
#[inline]
pub fn hash_bytes(bytes: &[u8]) -> u64 {
    bytes.iter().fold(HASH_SEED, |h, &b| hash_byte(h, b))
}
