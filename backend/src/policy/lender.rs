//! Lender policies
//!
//! # Auction market
//!
//! A lender scans the requests registered so far this tick and bids on the
//! ones it accepts:
//!
//! ```text
//! accept = coverage ≥ 1.5
//!          and base ≤ current_rate ≤ 1.5·base
//!          and (reputation > 0.6 or risk_tolerance > 0.5)
//! otherwise accept with probability 0.3·risk_tolerance
//! ```
//!
//! Requests larger than the lender's idle capital are skipped without a
//! draw. Only requests that already exist when the lender acts are visible,
//! so activation order matters.
//!
//! # Pooled market
//!
//! Supply half of idle capital when utilization is above 70%, pull back 10%
//! of the supplied amount when it is below 30%, and accrue one tick of
//! interest on whatever remains supplied.

use super::{MarketParticipant, StepContext, StepOutcome};
use crate::models::event::Event;
use crate::models::lender::Lender;
use crate::models::loan::{Bid, LoanRequest};
use crate::models::market::RateModel;
use crate::rng::RngManager;
use crate::settlement::{self, SettlementError};

/// Minimum collateral coverage for the heuristic to accept
pub const MIN_COVERAGE_RATIO: f64 = 1.5;

/// Utilization above which pooled lenders add capital
pub const SUPPLY_UTILIZATION: f64 = 0.7;

/// Utilization below which pooled lenders withdraw capital
pub const WITHDRAW_UTILIZATION: f64 = 0.3;

/// How a lender reached its decision on one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidDecision {
    /// Heuristic accepted
    Accept,
    /// Heuristic rejected; the risk-tolerance draw accepted
    AcceptOnChance,
    Reject,
}

impl BidDecision {
    pub fn is_bid(&self) -> bool {
        !matches!(self, BidDecision::Reject)
    }
}

/// Decide whether `lender` bids on `request` at `current_rate`
///
/// Consumes one draw from `rng` only when the heuristic rejects.
pub fn evaluate_request(
    lender: &Lender,
    request: &LoanRequest,
    current_rate: f64,
    rng: &mut RngManager,
) -> BidDecision {
    let heuristic = request.coverage_ratio() >= MIN_COVERAGE_RATIO
        && lender.accepts_rate(current_rate)
        && (request.reputation > 0.6 || lender.risk_tolerance() > 0.5);

    if heuristic {
        BidDecision::Accept
    } else if rng.next_f64() < lender.risk_tolerance() * 0.3 {
        BidDecision::AcceptOnChance
    } else {
        BidDecision::Reject
    }
}

impl MarketParticipant for Lender {
    fn id(&self) -> &str {
        Lender::id(self)
    }

    fn step(&mut self, ctx: &mut StepContext<'_>) -> Result<StepOutcome, SettlementError> {
        match ctx.market.rate_model() {
            RateModel::TwoSlope(_) => Ok(self.bid_on_requests(ctx)),
            RateModel::Pooled { .. } => self.manage_supply(ctx),
        }
    }
}

impl Lender {
    fn bid_on_requests(&mut self, ctx: &mut StepContext<'_>) -> StepOutcome {
        let current_rate = ctx.market.current_interest_rate();
        let bid_rate = self.bid_rate(current_rate);
        let (requests, bids) = ctx.market.requests_and_bids_mut();

        let mut submitted = 0;
        for request in requests {
            if !self.can_fund(request.amount) {
                continue;
            }
            if !evaluate_request(self, request, current_rate, ctx.rng).is_bid() {
                continue;
            }

            bids.push(Bid {
                request_id: request.id,
                borrower_id: request.borrower_id.clone(),
                lender_id: self.id().to_string(),
                rate: bid_rate,
            });
            ctx.events.log(Event::BidSubmitted {
                tick: ctx.tick,
                request_id: request.id,
                lender_id: self.id().to_string(),
                rate: bid_rate,
            });
            submitted += 1;
        }

        if submitted > 0 {
            StepOutcome::Bid(submitted)
        } else {
            StepOutcome::Idle
        }
    }

    fn manage_supply(&mut self, ctx: &mut StepContext<'_>) -> Result<StepOutcome, SettlementError> {
        let u = ctx.market.utilization();
        let mut outcome = StepOutcome::Idle;

        if u > SUPPLY_UTILIZATION && self.capital() > 0.0 {
            let amount = self.capital() * 0.5;
            settlement::add_liquidity(ctx.market, amount)?;
            self.supply(amount);
            ctx.events.log(Event::LiquiditySupplied {
                tick: ctx.tick,
                lender_id: self.id().to_string(),
                amount,
            });
            outcome = StepOutcome::Supplied(amount);
        } else if u < WITHDRAW_UTILIZATION && self.supplied_amount() > 0.0 {
            let requested = self.supplied_amount() * 0.1;
            let removed = settlement::remove_liquidity(ctx.market, requested);
            let withdrawn = self.withdraw(removed);
            ctx.events.log(Event::LiquidityWithdrawn {
                tick: ctx.tick,
                lender_id: self.id().to_string(),
                requested,
                withdrawn,
            });
            if withdrawn > 0.0 {
                outcome = StepOutcome::Withdrew(withdrawn);
            }
        }

        let interest = settlement::accrue_lender_interest(ctx.market, self.supplied_amount());
        self.accrue_interest(interest);

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::EventLog;
    use crate::models::market::MarketState;
    use crate::rates::TwoSlopeCurve;

    fn request(amount: f64, collateral: f64, reputation: f64) -> LoanRequest {
        LoanRequest {
            id: 1,
            borrower_id: "borrower_0000".to_string(),
            amount,
            collateral,
            reputation,
            created_tick: 0,
        }
    }

    #[test]
    fn test_heuristic_accepts_without_draw() {
        let lender = Lender::new_auction("l".to_string(), 100_000.0, 0.2, 0.02);
        let mut rng = RngManager::new(7);
        let before = rng.get_state();

        let decision = evaluate_request(&lender, &request(1_000.0, 2_000.0, 0.9), 0.02, &mut rng);
        assert_eq!(decision, BidDecision::Accept);
        assert_eq!(rng.get_state(), before);
    }

    #[test]
    fn test_zero_risk_tolerance_never_accepts_on_chance() {
        let lender = Lender::new_auction("l".to_string(), 100_000.0, 0.0, 0.02);
        let mut rng = RngManager::new(7);
        for _ in 0..100 {
            // Coverage 1.0 < 1.5 forces the draw
            let decision = evaluate_request(&lender, &request(1_000.0, 1_000.0, 0.9), 0.02, &mut rng);
            assert_eq!(decision, BidDecision::Reject);
        }
    }

    #[test]
    fn test_rate_outside_window_falls_back_to_draw() {
        let lender = Lender::new_auction("l".to_string(), 100_000.0, 0.9, 0.02);
        let mut rng = RngManager::new(7);
        let before = rng.get_state();
        evaluate_request(&lender, &request(1_000.0, 2_000.0, 0.9), 0.05, &mut rng);
        assert_ne!(rng.get_state(), before);
    }

    #[test]
    fn test_auction_lender_skips_unaffordable_requests() {
        let mut market = MarketState::new_auction(1e6, TwoSlopeCurve::default(), 1.0, 365);
        market.register_request("borrower_0000", 5_000.0, 20_000.0, 0.9, 0);
        let mut lender = Lender::new_auction("lender_0000".to_string(), 1_000.0, 1.0, 0.02);
        let mut rng = RngManager::new(1);
        let mut events = EventLog::new();

        let mut ctx = StepContext {
            market: &mut market,
            rng: &mut rng,
            events: &mut events,
            tick: 0,
        };
        assert_eq!(lender.step(&mut ctx).unwrap(), StepOutcome::Idle);
        assert!(market.pending_bids().is_empty());
    }

    #[test]
    fn test_auction_lender_bids_with_risk_premium() {
        let mut market = MarketState::new_auction(1e6, TwoSlopeCurve::default(), 1.0, 365);
        market.register_request("borrower_0000", 1_000.0, 5_000.0, 0.9, 0);
        let mut lender = Lender::new_auction("lender_0000".to_string(), 100_000.0, 0.0, 0.02);
        let mut rng = RngManager::new(1);
        let mut events = EventLog::new();

        let mut ctx = StepContext {
            market: &mut market,
            rng: &mut rng,
            events: &mut events,
            tick: 3,
        };
        assert_eq!(lender.step(&mut ctx).unwrap(), StepOutcome::Bid(1));

        let bid = &market.pending_bids()[0];
        assert!((bid.rate - 0.021).abs() < 1e-12);
        assert_eq!(events.events_of_type("BidSubmitted").len(), 1);
    }

    #[test]
    fn test_pooled_lender_supplies_when_utilization_high() {
        let mut market = MarketState::new_pooled(1_000.0, 0.03, 0.2, 0.75, 1.05, 365);
        settlement::process_borrow(&mut market, 800.0).unwrap();
        let mut lender = Lender::new_pooled("lender_0000".to_string(), 1_000.0);
        let mut rng = RngManager::new(1);
        let mut events = EventLog::new();

        let mut ctx = StepContext {
            market: &mut market,
            rng: &mut rng,
            events: &mut events,
            tick: 0,
        };
        assert_eq!(lender.step(&mut ctx).unwrap(), StepOutcome::Supplied(500.0));
        assert_eq!(market.liquidity(), 1_500.0);
        assert_eq!(lender.capital(), 500.0);
    }

    #[test]
    fn test_pooled_withdrawal_books_clamped_amount() {
        let mut market = MarketState::new_pooled(1_000.0, 0.03, 0.2, 0.75, 1.05, 365);
        settlement::process_borrow(&mut market, 200.0).unwrap();
        // Lender claims far more supply than the pool holds unborrowed
        let mut lender = Lender::new_pooled("lender_0000".to_string(), 100_000.0);
        lender.supply(100_000.0);
        let mut rng = RngManager::new(1);
        let mut events = EventLog::new();

        let mut ctx = StepContext {
            market: &mut market,
            rng: &mut rng,
            events: &mut events,
            tick: 0,
        };
        assert_eq!(lender.step(&mut ctx).unwrap(), StepOutcome::Withdrew(800.0));
        assert_eq!(lender.supplied_amount(), 99_200.0);
        assert_eq!(market.liquidity(), 200.0);
    }

    #[test]
    fn test_rejected_supply_leaves_lender_and_pool_unchanged() {
        let mut market = MarketState::new_pooled(1_000.0, 0.03, 0.2, 0.75, 1.05, 365);
        settlement::process_borrow(&mut market, 800.0).unwrap();
        let mut lender = Lender::new_pooled("lender_0000".to_string(), f64::INFINITY);
        let mut rng = RngManager::new(1);
        let mut events = EventLog::new();

        let mut ctx = StepContext {
            market: &mut market,
            rng: &mut rng,
            events: &mut events,
            tick: 0,
        };
        assert!(lender.step(&mut ctx).is_err());
        assert_eq!(lender.capital(), f64::INFINITY);
        assert_eq!(lender.supplied_amount(), 0.0);
        assert_eq!(market.liquidity(), 1_000.0);
        assert!(events.is_empty());
    }
}
