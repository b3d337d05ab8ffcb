use super::super::*;
use crate::geo;
use puglands_types::economy::{
    AcquireMethod, Land, EXCHANGE_RATE, LAND_COST, MAX_BULK_CLAIM_PLOTS, MAX_EXCHANGE_COINS,
    MAX_NAME_LENGTH, UNITS_PER_PUGBUCK,
};
use std::collections::BTreeSet;

impl<'a, S: State> Layer<'a, S> {
    // === Registration and land handlers ===

    pub(in crate::layer) async fn handle_register(
        &mut self,
        public: &PublicKey,
        name: &str,
    ) -> Result<Receipt, EconomyError> {
        if name.is_empty() {
            return Err(EconomyError::InvalidArgument("name must not be empty"));
        }
        if name.len() > MAX_NAME_LENGTH {
            return Err(EconomyError::InvalidArgument("name too long"));
        }
        if load_user(self, public).await.is_some() {
            return Err(EconomyError::AlreadyRegistered);
        }

        let user = User::new(name.to_string(), self.now_ms);
        self.insert(Key::User(public.clone()), Value::User(user.clone()));

        Ok(Receipt {
            uid: public.clone(),
            user,
            lands: Vec::new(),
        })
    }

    pub(in crate::layer) async fn handle_acquire_land(
        &mut self,
        public: &PublicKey,
        gx: i64,
        gy: i64,
        method: AcquireMethod,
    ) -> Result<Receipt, EconomyError> {
        if !geo::in_bounds(gx, gy) {
            return Err(EconomyError::InvalidArgument("coordinates out of range"));
        }

        let mut user = self.require_user(public).await?;

        // First writer wins: the check and the create are part of the same
        // changeset, and commits are serialized by the caller.
        if self.get(&Key::Land { gx, gy }).await.is_some() {
            return Err(EconomyError::AlreadyOwned { gx, gy });
        }

        match method {
            AcquireMethod::Buy => {
                if user.balance < LAND_COST {
                    return Err(EconomyError::InsufficientFunds);
                }
                user.balance -= LAND_COST;
            }
            AcquireMethod::Voucher => {
                if user.land_vouchers < 1 {
                    return Err(EconomyError::InsufficientVouchers);
                }
                user.land_vouchers -= 1;
            }
        }
        user.land_count = user.land_count.saturating_add(1);

        let land = Land {
            gx,
            gy,
            pps: LAND_PPS,
            owner: public.clone(),
            owner_name: user.name.clone(),
            purchased_at_ms: self.now_ms,
        };

        self.insert(Key::User(public.clone()), Value::User(user.clone()));
        self.insert(Key::Land { gx, gy }, Value::Land(land.clone()));

        Ok(Receipt {
            uid: public.clone(),
            user,
            lands: vec![land],
        })
    }

    pub(in crate::layer) async fn handle_bulk_claim(
        &mut self,
        public: &PublicKey,
        plots: &[(i64, i64)],
    ) -> Result<Receipt, EconomyError> {
        if plots.is_empty() {
            return Err(EconomyError::InvalidArgument("no plots requested"));
        }
        if plots.len() > MAX_BULK_CLAIM_PLOTS {
            return Err(EconomyError::InvalidArgument("too many plots requested"));
        }
        let mut seen = BTreeSet::new();
        for &(gx, gy) in plots {
            if !geo::in_bounds(gx, gy) {
                return Err(EconomyError::InvalidArgument("coordinates out of range"));
            }
            if !seen.insert((gx, gy)) {
                return Err(EconomyError::InvalidArgument("duplicate plot in batch"));
            }
        }

        let mut user = self.require_user(public).await?;
        if (user.land_vouchers as usize) < plots.len() {
            return Err(EconomyError::InsufficientVouchers);
        }

        // The client's spatial search is advisory; each plot is re-validated
        // here. Any owned plot fails the whole batch so the caller can retry
        // with an explicit conflict instead of guessing at partial success.
        for &(gx, gy) in plots {
            if self.get(&Key::Land { gx, gy }).await.is_some() {
                return Err(EconomyError::AlreadyOwned { gx, gy });
            }
        }

        user.land_vouchers -= plots.len() as u32;
        user.land_count = user.land_count.saturating_add(plots.len() as u32);

        let mut lands = Vec::with_capacity(plots.len());
        for &(gx, gy) in plots {
            let land = Land {
                gx,
                gy,
                pps: LAND_PPS,
                owner: public.clone(),
                owner_name: user.name.clone(),
                purchased_at_ms: self.now_ms,
            };
            self.insert(Key::Land { gx, gy }, Value::Land(land.clone()));
            lands.push(land);
        }
        self.insert(Key::User(public.clone()), Value::User(user.clone()));

        Ok(Receipt {
            uid: public.clone(),
            user,
            lands,
        })
    }

    pub(in crate::layer) async fn handle_exchange_pug_coins(
        &mut self,
        public: &PublicKey,
        coins: u64,
    ) -> Result<Receipt, EconomyError> {
        if coins == 0 {
            return Err(EconomyError::InvalidArgument("amount must be at least 1"));
        }
        if coins > MAX_EXCHANGE_COINS {
            return Err(EconomyError::InvalidArgument("amount too large"));
        }

        let mut user = self.require_user(public).await?;

        let debit = coins * UNITS_PER_PUGBUCK;
        if user.pug_coins < debit {
            return Err(EconomyError::InsufficientFunds);
        }
        user.pug_coins -= debit;
        user.balance = user
            .balance
            .saturating_add(coins.saturating_mul(EXCHANGE_RATE).saturating_mul(UNITS_PER_PUGBUCK));

        self.insert(Key::User(public.clone()), Value::User(user.clone()));

        Ok(Receipt {
            uid: public.clone(),
            user,
            lands: Vec::new(),
        })
    }
}
