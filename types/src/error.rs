/// Typed failure surfaced by every economy operation. A failed operation
/// commits nothing: callers observe either the full effect or this error.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum EconomyError {
    /// The caller's credential did not resolve to a registered user.
    NotAuthenticated,
    /// The caller resolved but is not allowed to perform this operation.
    PermissionDenied,
    /// Unknown user or land.
    NotFound,
    /// A user already exists for this key.
    AlreadyRegistered,
    /// The targeted cell already has an owner.
    AlreadyOwned { gx: i64, gy: i64 },
    InsufficientFunds,
    InsufficientVouchers,
    /// The per-reward cooldown has not elapsed yet.
    CooldownActive { remaining_ms: u64 },
    /// A pending redemption request already exists for this user.
    PendingRequestExists,
    InvalidArgument(&'static str),
    /// The transaction nonce did not match; re-sync and retry.
    Conflict { expected_nonce: u64 },
    /// The ledger could not durably record the operation.
    Unavailable,
}

impl std::fmt::Display for EconomyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EconomyError::NotAuthenticated => write!(f, "not authenticated"),
            EconomyError::PermissionDenied => write!(f, "permission denied"),
            EconomyError::NotFound => write!(f, "not found"),
            EconomyError::AlreadyRegistered => write!(f, "user already registered"),
            EconomyError::AlreadyOwned { gx, gy } => {
                write!(f, "land ({gx}, {gy}) is already owned")
            }
            EconomyError::InsufficientFunds => write!(f, "insufficient funds"),
            EconomyError::InsufficientVouchers => write!(f, "insufficient vouchers"),
            EconomyError::CooldownActive { remaining_ms } => {
                write!(f, "cooldown active for another {remaining_ms}ms")
            }
            EconomyError::PendingRequestExists => {
                write!(f, "a redemption request is already pending")
            }
            EconomyError::InvalidArgument(reason) => write!(f, "invalid argument: {reason}"),
            EconomyError::Conflict { expected_nonce } => {
                write!(f, "nonce conflict (expected {expected_nonce})")
            }
            EconomyError::Unavailable => write!(f, "service unavailable"),
        }
    }
}

impl std::error::Error for EconomyError {}
