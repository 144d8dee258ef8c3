//! Deterministic fallback scoring
//!
//! When live ledger data cannot be fetched, the engine still has to answer
//! with something stable: the same address must map to the same score on
//! every call, in every process, with no clock or I/O involved. The range
//! is deliberately depressed - a fallback-scored wallet is "unscored, not
//! hostile", so it lands between the extremes and never clears the default
//! bypass threshold.

/// Lower bound of the fallback score range.
pub const FALLBACK_MIN: u8 = 20;
/// Upper bound of the fallback score range.
pub const FALLBACK_MAX: u8 = 60;

/// Deterministic synthetic score for an address, in [20, 60].
///
/// Rolling 32-bit hash over the address bytes (`h = h * 31 + byte` with
/// wrapping arithmetic), reduced into the fallback range.
pub fn fallback_score(address: &str) -> u8 {
    let mut hash: i32 = 0;
    for byte in address.bytes() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(byte as i32);
    }
    let span = (FALLBACK_MAX - FALLBACK_MIN + 1) as u32;
    FALLBACK_MIN + (hash.unsigned_abs() % span) as u8
}
