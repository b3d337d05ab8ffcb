use commonware_cryptography::ed25519::PublicKey;
use puglands_types::{
    api::Receipt,
    economy::{User, LAND_PPS},
    execution::{Instruction, Key, Transaction, Value},
    EconomyError,
};
use std::collections::BTreeMap;

use crate::{
    accrual,
    state::{load_account, load_user, validate_and_increment_nonce, State, Status},
};

mod handlers;


/// One atomic unit of work against the ledger: reads go through a pending
/// overlay, writes are staged, and [Layer::commit] yields the changeset to
/// persist. Dropping the layer instead commits nothing, which is how a
/// failed instruction leaves zero side effects (the nonce included).
pub struct Layer<'a, S: State> {
    state: &'a S,
    pending: BTreeMap<Key, Status>,

    admin: Option<PublicKey>,
    now_ms: u64,
}

impl<'a, S: State> Layer<'a, S> {
    pub fn new(state: &'a S, admin: Option<PublicKey>, now_ms: u64) -> Self {
        Self {
            state,
            pending: BTreeMap::new(),
            admin,
            now_ms,
        }
    }

    fn insert(&mut self, key: Key, value: Value) {
        self.pending.insert(key, Status::Update(value));
    }

    pub fn now(&self) -> u64 {
        self.now_ms
    }

    /// Validate the transaction's nonce against the signer's account and
    /// stage the increment. Only committed on success of the whole
    /// operation.
    pub async fn prepare(&mut self, transaction: &Transaction) -> Result<(), EconomyError> {
        let mut account = load_account(self, &transaction.public).await;
        validate_and_increment_nonce(&mut account, transaction.nonce)?;
        self.insert(
            Key::Account(transaction.public.clone()),
            Value::Account(account),
        );

        Ok(())
    }

    /// Apply one instruction, returning the canonical post-commit snapshot
    /// of everything it changed.
    pub async fn apply(&mut self, transaction: &Transaction) -> Result<Receipt, EconomyError> {
        match &transaction.instruction {
            Instruction::Register { name } => {
                self.handle_register(&transaction.public, name).await
            }
            Instruction::AcquireLand { gx, gy, method } => {
                self.handle_acquire_land(&transaction.public, *gx, *gy, *method)
                    .await
            }
            Instruction::BulkClaim { plots } => {
                self.handle_bulk_claim(&transaction.public, plots).await
            }
            Instruction::ExchangePugCoins { coins } => {
                self.handle_exchange_pug_coins(&transaction.public, *coins)
                    .await
            }
            Instruction::GrantVoucher => self.handle_grant_voucher(&transaction.public).await,
            Instruction::GrantBoost => self.handle_grant_boost(&transaction.public).await,
            Instruction::GrantRangeBoost => {
                self.handle_grant_range_boost(&transaction.public).await
            }
            Instruction::SubmitRedemption { coins } => {
                self.handle_submit_redemption(&transaction.public, *coins)
                    .await
            }
            Instruction::GrantPugbucks { user, coins } => {
                self.handle_grant_pugbucks(&transaction.public, user, *coins)
                    .await
            }
            Instruction::ResolveRedemption { user, approve } => {
                self.handle_resolve_redemption(&transaction.public, user, *approve)
                    .await
            }
        }
    }

    /// Read-path accrual: fold pending income into the user's balance and
    /// advance the watermark. `getUser` runs through this so a poll is just
    /// another committed (idempotent) mutation.
    pub async fn touch(&mut self, public: &PublicKey) -> Result<User, EconomyError> {
        let mut user = load_user(self, public).await.ok_or(EconomyError::NotFound)?;
        self.fold_accrual(&mut user);
        self.insert(Key::User(public.clone()), Value::User(user.clone()));
        Ok(user)
    }

    /// Fold income earned since `last_seen_ms` into the balance. The
    /// watermark never moves backwards, so a wall clock step backwards
    /// cannot re-earn an interval.
    fn fold_accrual(&self, user: &mut User) {
        let now = self.now_ms.max(user.last_seen_ms);
        let earned = accrual::accrue(
            LAND_PPS,
            user.land_count,
            user.last_seen_ms,
            now,
            user.boost_end_ms,
        );
        user.balance = user.balance.saturating_add(earned);
        user.last_seen_ms = now;
    }

    /// Load the signer's user with accrual folded, or refuse the operation:
    /// a valid signature without a registered user does not resolve.
    async fn require_user(&mut self, public: &PublicKey) -> Result<User, EconomyError> {
        let mut user = load_user(self, public)
            .await
            .ok_or(EconomyError::NotAuthenticated)?;
        self.fold_accrual(&mut user);
        Ok(user)
    }

    fn require_admin(&self, caller: &PublicKey) -> Result<(), EconomyError> {
        match &self.admin {
            Some(admin) if admin == caller => Ok(()),
            _ => Err(EconomyError::PermissionDenied),
        }
    }

    pub fn commit(self) -> Vec<(Key, Status)> {
        self.pending.into_iter().collect()
    }
}

impl<'a, S: State> State for Layer<'a, S> {
    async fn get(&self, key: &Key) -> Option<Value> {
        match self.pending.get(key) {
            Some(Status::Update(value)) => Some(value.clone()),
            Some(Status::Delete) => None,
            None => self.state.get(key).await,
        }
    }

    async fn insert(&mut self, key: Key, value: Value) {
        self.pending.insert(key, Status::Update(value));
    }

    async fn delete(&mut self, key: &Key) {
        self.pending.insert(key.clone(), Status::Delete);
    }
}
