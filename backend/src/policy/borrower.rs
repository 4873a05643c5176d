//! Borrower policies
//!
//! # Auction market
//!
//! Post a request when none is outstanding and a uniform draw exceeds the
//! borrower's reputation (low-reputation borrowers ask more often), then
//! refresh the informational health factor.
//!
//! # Pooled market
//!
//! ```text
//! liquidated?            → no-op
//! timer += 1
//! debt > 0:
//!     ratio < threshold  → liquidate, stop
//!     volatility shock   (p = 0.05·(1 − 0.5·rep))
//! debt == 0, timer > 10  → borrow decision
//! debt > 0               → repayment attempt
//! ```

use super::{MarketParticipant, StepContext, StepOutcome};
use crate::models::borrower::Borrower;
use crate::models::event::Event;
use crate::models::market::{MarketState, RateModel};
use crate::rng::RngManager;
use crate::settlement::{self, SettlementError};

/// Borrows at or below this amount are never attempted
pub const MIN_BORROW_AMOUNT: f64 = 50.0;

/// Ticks a pooled borrower waits after its last borrow
pub const BORROW_COOLDOWN_TICKS: usize = 10;

/// Collateral ratio targeted by control borrowers
pub const CONTROL_TARGET_RATIO: f64 = 2.2;

/// Amount a pooled borrower would ask the pool for, before the minimum check
///
/// `min(max_borrow × borrow_factor, available_liquidity)`, where control
/// borrowers cap `max_borrow` at `collateral / 2.2` and use a factor of 0.8,
/// and reputation borrowers use `min(0.95, 0.6 + 0.3·rep·(1 + sensitivity))`.
///
/// # Example
/// ```
/// use lending_simulator_core_rs::Borrower;
/// use lending_simulator_core_rs::models::MarketState;
/// use lending_simulator_core_rs::policy::planned_borrow_amount;
///
/// let market = MarketState::new_pooled(1_000_000.0, 0.03, 0.0, 0.75, 1.05, 365);
/// let borrower = Borrower::new_pooled("borrower_0000".to_string(), 2_200.0);
/// assert!((planned_borrow_amount(&borrower, &market) - 800.0).abs() < 1e-9);
/// ```
pub fn planned_borrow_amount(borrower: &Borrower, market: &MarketState) -> f64 {
    let sensitivity = market.reputation_sensitivity();
    let mut max_borrow = borrower.max_borrow_amount(market.base_collateral_factor(), sensitivity);

    let borrow_factor = if market.is_control() {
        max_borrow = max_borrow.min(borrower.collateral() / CONTROL_TARGET_RATIO);
        0.8
    } else {
        (0.6 + borrower.reputation() * 0.3 * (1.0 + sensitivity)).min(0.95)
    };

    (max_borrow * borrow_factor).min(market.available_liquidity())
}

/// `(attempt_probability, success_probability)` for a repayment attempt
pub fn repayment_odds(reputation: f64, is_control: bool) -> (f64, f64) {
    if is_control {
        (0.05, 0.5)
    } else {
        (0.02 + 0.08 * reputation, 0.4 + 0.5 * reputation)
    }
}

impl MarketParticipant for Borrower {
    fn id(&self) -> &str {
        Borrower::id(self)
    }

    fn step(&mut self, ctx: &mut StepContext<'_>) -> Result<StepOutcome, SettlementError> {
        match ctx.market.rate_model() {
            RateModel::TwoSlope(_) => Ok(self.auction_step(ctx)),
            RateModel::Pooled { .. } => self.pooled_step(ctx),
        }
    }
}

impl Borrower {
    // ========================================================================
    // Auction market
    // ========================================================================

    fn auction_step(&mut self, ctx: &mut StepContext<'_>) -> StepOutcome {
        let mut outcome = StepOutcome::Idle;

        if self.pending_request().is_none() && ctx.rng.next_f64() > self.reputation() {
            let amount = self.request_amount();
            if amount > 0.0 {
                let request_id = ctx.market.register_request(
                    self.id(),
                    amount,
                    self.collateral(),
                    self.reputation(),
                    ctx.tick,
                );
                self.set_pending_request(request_id);
                ctx.events.log(Event::LoanRequested {
                    tick: ctx.tick,
                    request_id,
                    borrower_id: self.id().to_string(),
                    amount,
                });
                outcome = StepOutcome::Requested;
            }
        }

        self.update_health_factor(ctx.market.liquidation_threshold());
        outcome
    }

    // ========================================================================
    // Pooled market
    // ========================================================================

    fn pooled_step(&mut self, ctx: &mut StepContext<'_>) -> Result<StepOutcome, SettlementError> {
        if self.is_liquidated() {
            return Ok(StepOutcome::Idle);
        }

        self.tick_borrow_timer();

        if self.has_debt() {
            let threshold = ctx.market.liquidation_threshold_for(self.reputation());
            if self.collateral_ratio() < threshold {
                let outcome = settlement::liquidate_position(ctx.market, self)?;
                ctx.events.log(Event::Liquidated {
                    tick: ctx.tick,
                    borrower_id: self.id().to_string(),
                    debt_cleared: outcome.debt_cleared,
                    collateral: outcome.collateral,
                    penalty: outcome.penalty,
                });
                return Ok(StepOutcome::Liquidated);
            }

            self.maybe_collateral_shock(ctx);
        }

        if !self.has_debt() && self.time_since_last_borrow() > BORROW_COOLDOWN_TICKS {
            Ok(self.try_borrow(ctx))
        } else if self.has_debt() {
            Ok(self.attempt_repayment(ctx))
        } else {
            Ok(StepOutcome::Idle)
        }
    }

    fn maybe_collateral_shock(&mut self, ctx: &mut StepContext<'_>) {
        let reputation = self.reputation();
        let probability = 0.05 * (1.0 - reputation * 0.5);
        if !ctx.rng.chance(probability) {
            return;
        }

        let factor = draw_shock_factor(ctx.rng, reputation);
        self.apply_collateral_shock(factor);
        ctx.events.log(Event::CollateralShock {
            tick: ctx.tick,
            borrower_id: self.id().to_string(),
            factor,
            new_collateral: self.collateral(),
        });
    }

    fn try_borrow(&mut self, ctx: &mut StepContext<'_>) -> StepOutcome {
        // Control borrowers hold back half the time in a busy pool
        if ctx.market.is_control() && ctx.market.utilization() > 0.5 && ctx.rng.next_f64() < 0.5 {
            return StepOutcome::Idle;
        }

        let amount = planned_borrow_amount(self, ctx.market);
        if amount <= MIN_BORROW_AMOUNT {
            return StepOutcome::Idle;
        }

        match settlement::process_borrow(ctx.market, amount) {
            Ok(()) => {
                self.open_position(amount);
                ctx.events.log(Event::Borrowed {
                    tick: ctx.tick,
                    borrower_id: self.id().to_string(),
                    amount,
                    collateral: self.collateral(),
                    liquidation_threshold: ctx.market.liquidation_threshold_for(self.reputation()),
                });
                StepOutcome::Borrowed(amount)
            }
            Err(_) => {
                ctx.events.log(Event::BorrowRejected {
                    tick: ctx.tick,
                    borrower_id: self.id().to_string(),
                    amount,
                    available: ctx.market.available_liquidity(),
                });
                StepOutcome::BorrowRejected
            }
        }
    }

    fn attempt_repayment(&mut self, ctx: &mut StepContext<'_>) -> StepOutcome {
        let (attempt, success) = repayment_odds(self.reputation(), ctx.market.is_control());
        if !ctx.rng.chance(attempt) {
            return StepOutcome::Idle;
        }

        if ctx.rng.chance(success) {
            let amount = self.settle_debt();
            settlement::process_repayment(ctx.market, amount);
            let reputation = self.record_repayment_outcome(true);
            ctx.events.log(Event::Repaid {
                tick: ctx.tick,
                borrower_id: self.id().to_string(),
                amount,
                reputation,
            });
            StepOutcome::Repaid(amount)
        } else {
            let reputation = self.record_repayment_outcome(false);
            ctx.events.log(Event::RepaymentFailed {
                tick: ctx.tick,
                borrower_id: self.id().to_string(),
                outstanding: self.borrowed_amount(),
                reputation,
            });
            StepOutcome::RepaymentFailed
        }
    }
}

/// Collateral multiplier in `[0.85 + 0.1·rep, 0.98]`
fn draw_shock_factor(rng: &mut RngManager, reputation: f64) -> f64 {
    let low = 0.85 + reputation * 0.1;
    if low >= 0.98 {
        return 0.98;
    }
    rng.uniform(low, 0.98)
}
