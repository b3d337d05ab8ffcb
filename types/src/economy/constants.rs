/// Base currency units per Pugbuck (and per Pug Coin). The fine scale keeps
/// the per-land income rate (1.1e-9 Pugbucks/second) an exact integer.
pub const UNITS_PER_PUGBUCK: u64 = 1_000_000_000_000;

/// Balance granted to a freshly registered user.
pub const STARTING_BALANCE: u64 = 50 * UNITS_PER_PUGBUCK;

/// Cost of one plot when buying with Pugbucks.
pub const LAND_COST: u64 = 50 * UNITS_PER_PUGBUCK;

/// Income rate contributed by one plot, in base units per second
/// (1.1e-9 Pugbucks/second).
pub const LAND_PPS: u64 = 1_100;

/// Income multiplier while a boost is active.
pub const BOOST_MULTIPLIER: u64 = 20;

/// Income boost duration (10 minutes).
pub const BOOST_DURATION_MS: u64 = 10 * 60 * 1_000;

/// Claim-range boost duration (5 minutes).
pub const RANGE_BOOST_DURATION_MS: u64 = 5 * 60 * 1_000;

/// Cooldown between ad-reward grants, per reward type (23 hours).
pub const AD_COOLDOWN_MS: u64 = 23 * 60 * 60 * 1_000;

/// Pugbucks credited per Pug Coin exchanged.
pub const EXCHANGE_RATE: u64 = 150;

/// Largest whole-coin amount accepted by a single exchange.
pub const MAX_EXCHANGE_COINS: u64 = 100_000;

/// Redemption bounds, in whole Pug Coins.
pub const MIN_REDEEM_COINS: u64 = 1;
pub const MAX_REDEEM_COINS: u64 = 3;

/// Largest whole-coin amount a privileged grant may credit at once.
pub const MAX_GRANT_COINS: u64 = 1_000_000;

/// Maximum plots per bulk claim.
pub const MAX_BULK_CLAIM_PLOTS: usize = 64;

/// Maximum name length for user registration.
pub const MAX_NAME_LENGTH: usize = 32;

/// Claim radius around the player without a range boost, in meters.
pub const BASE_CLAIM_RADIUS_METERS: f64 = 400.0;

/// Claim-radius multiplier while a range boost is active.
pub const RANGE_BOOST_MULTIPLIER: f64 = 1.67;
