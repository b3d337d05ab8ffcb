use super::super::*;
use puglands_types::economy::{
    RedemptionRequest, RedemptionStatus, AD_COOLDOWN_MS, BOOST_DURATION_MS, MAX_GRANT_COINS,
    MAX_REDEEM_COINS, MIN_REDEEM_COINS, RANGE_BOOST_DURATION_MS, UNITS_PER_PUGBUCK,
};

impl<'a, S: State> Layer<'a, S> {
    // === Reward and redemption handlers ===

    /// Each reward type has its own watermark; "ad watched" is an untrusted
    /// external signal, so the cooldown is the only gate.
    fn check_cooldown(&self, last_ms: Option<u64>) -> Result<(), EconomyError> {
        if let Some(last_ms) = last_ms {
            let elapsed = self.now_ms.saturating_sub(last_ms);
            if elapsed < AD_COOLDOWN_MS {
                return Err(EconomyError::CooldownActive {
                    remaining_ms: AD_COOLDOWN_MS - elapsed,
                });
            }
        }
        Ok(())
    }

    pub(in crate::layer) async fn handle_grant_voucher(
        &mut self,
        public: &PublicKey,
    ) -> Result<Receipt, EconomyError> {
        let mut user = self.require_user(public).await?;
        self.check_cooldown(user.last_voucher_ad_ms)?;

        user.last_voucher_ad_ms = Some(self.now_ms);
        user.land_vouchers = user.land_vouchers.saturating_add(1);

        self.insert(Key::User(public.clone()), Value::User(user.clone()));

        Ok(Receipt {
            uid: public.clone(),
            user,
            lands: Vec::new(),
        })
    }

    pub(in crate::layer) async fn handle_grant_boost(
        &mut self,
        public: &PublicKey,
    ) -> Result<Receipt, EconomyError> {
        // Accrual up to now ran at the old boost state in require_user, so
        // replacing the window below cannot retroactively boost the past.
        let mut user = self.require_user(public).await?;
        self.check_cooldown(user.last_boost_ad_ms)?;

        user.last_boost_ad_ms = Some(self.now_ms);
        // Replaces any active boost; windows never stack.
        user.boost_end_ms = Some(self.now_ms + BOOST_DURATION_MS);

        self.insert(Key::User(public.clone()), Value::User(user.clone()));

        Ok(Receipt {
            uid: public.clone(),
            user,
            lands: Vec::new(),
        })
    }

    pub(in crate::layer) async fn handle_grant_range_boost(
        &mut self,
        public: &PublicKey,
    ) -> Result<Receipt, EconomyError> {
        let mut user = self.require_user(public).await?;
        self.check_cooldown(user.last_range_boost_ad_ms)?;

        user.last_range_boost_ad_ms = Some(self.now_ms);
        user.range_boost_end_ms = Some(self.now_ms + RANGE_BOOST_DURATION_MS);

        self.insert(Key::User(public.clone()), Value::User(user.clone()));

        Ok(Receipt {
            uid: public.clone(),
            user,
            lands: Vec::new(),
        })
    }

    pub(in crate::layer) async fn handle_submit_redemption(
        &mut self,
        public: &PublicKey,
        coins: u64,
    ) -> Result<Receipt, EconomyError> {
        if !(MIN_REDEEM_COINS..=MAX_REDEEM_COINS).contains(&coins) {
            return Err(EconomyError::InvalidArgument(
                "redemption amount out of range",
            ));
        }

        let mut user = self.require_user(public).await?;

        if let Some(Value::Redemption(existing)) =
            self.get(&Key::Redemption(public.clone())).await
        {
            if existing.status == RedemptionStatus::Pending {
                return Err(EconomyError::PendingRequestExists);
            }
        }

        let debit = coins * UNITS_PER_PUGBUCK;
        if user.pug_coins < debit {
            return Err(EconomyError::InsufficientFunds);
        }
        user.pug_coins -= debit;

        let request = RedemptionRequest {
            user: public.clone(),
            coins,
            status: RedemptionStatus::Pending,
            requested_at_ms: self.now_ms,
        };

        self.insert(Key::User(public.clone()), Value::User(user.clone()));
        self.insert(
            Key::Redemption(public.clone()),
            Value::Redemption(request),
        );

        Ok(Receipt {
            uid: public.clone(),
            user,
            lands: Vec::new(),
        })
    }

    pub(in crate::layer) async fn handle_grant_pugbucks(
        &mut self,
        caller: &PublicKey,
        user_key: &PublicKey,
        coins: u64,
    ) -> Result<Receipt, EconomyError> {
        self.require_admin(caller)?;
        if coins == 0 || coins > MAX_GRANT_COINS {
            return Err(EconomyError::InvalidArgument("grant amount out of range"));
        }

        let mut user = load_user(self, user_key)
            .await
            .ok_or(EconomyError::NotFound)?;
        self.fold_accrual(&mut user);
        user.pug_coins = user
            .pug_coins
            .saturating_add(coins.saturating_mul(UNITS_PER_PUGBUCK));

        self.insert(Key::User(user_key.clone()), Value::User(user.clone()));

        Ok(Receipt {
            uid: user_key.clone(),
            user,
            lands: Vec::new(),
        })
    }

    pub(in crate::layer) async fn handle_resolve_redemption(
        &mut self,
        caller: &PublicKey,
        user_key: &PublicKey,
        approve: bool,
    ) -> Result<Receipt, EconomyError> {
        self.require_admin(caller)?;

        let mut request = match self.get(&Key::Redemption(user_key.clone())).await {
            Some(Value::Redemption(request)) if request.status == RedemptionStatus::Pending => {
                request
            }
            _ => return Err(EconomyError::NotFound),
        };

        let mut user = load_user(self, user_key)
            .await
            .ok_or(EconomyError::NotFound)?;
        self.fold_accrual(&mut user);

        if approve {
            request.status = RedemptionStatus::Approved;
        } else {
            // The submitting debit is credited back.
            request.status = RedemptionStatus::Rejected;
            user.pug_coins = user
                .pug_coins
                .saturating_add(request.coins.saturating_mul(UNITS_PER_PUGBUCK));
        }

        self.insert(Key::User(user_key.clone()), Value::User(user.clone()));
        self.insert(
            Key::Redemption(user_key.clone()),
            Value::Redemption(request),
        );

        Ok(Receipt {
            uid: user_key.clone(),
            user,
            lands: Vec::new(),
        })
    }
}
