//! Passive-income arithmetic. Accrual is computed lazily whenever an
//! operation touches a user and folded into the balance in the same commit
//! that advances `last_seen_ms`, which makes re-evaluation at the same
//! instant a no-op.

use puglands_types::economy::BOOST_MULTIPLIER;

/// Income earned between `from_ms` and `to_ms` at `pps` base units per
/// second per plot over `lands` plots, honoring a boost interval that may
/// overlap any part of the window.
///
/// The window is split at `min(to_ms, boost_end_ms)`: the leading
/// sub-interval earns at `BOOST_MULTIPLIER` times the base rate, the
/// remainder at the base rate. Returns 0 when the window is empty or
/// inverted.
pub fn accrue(pps: u64, lands: u32, from_ms: u64, to_ms: u64, boost_end_ms: Option<u64>) -> u64 {
    if to_ms <= from_ms || pps == 0 || lands == 0 {
        return 0;
    }

    let rate = (pps as u128).saturating_mul(lands as u128);
    let split_ms = boost_end_ms.map_or(from_ms, |end| end.clamp(from_ms, to_ms));

    let boosted = rate
        .saturating_mul(BOOST_MULTIPLIER as u128)
        .saturating_mul((split_ms - from_ms) as u128)
        / 1_000;
    let base = rate.saturating_mul((to_ms - split_ms) as u128) / 1_000;

    u64::try_from(boosted.saturating_add(base)).unwrap_or(u64::MAX)
}
