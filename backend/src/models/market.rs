//! Market (platform) state
//!
//! Holds the shared numbers every agent reads and the settlement engine
//! writes: total liquidity, total borrowed, pricing parameters, counters and
//! the per-tick pending request/bid buffers.
//!
//! # Critical Invariants
//!
//! 1. `0 ≤ total_borrowed ≤ total_liquidity` after every operation
//! 2. Pending requests and bids never survive a settlement pass
//!
//! Mutators that move money are `pub(crate)`; outside the crate the market
//! changes only through [`crate::settlement`].

use crate::models::loan::{Bid, LoanRequest};
use crate::rates::{self, TwoSlopeCurve};
use serde::{Deserialize, Serialize};

/// Liquidation threshold applied by control pools regardless of reputation
pub const CONTROL_LIQUIDATION_THRESHOLD: f64 = 1.8;

/// Floor of the reputation-adjusted liquidation threshold
pub const MIN_LIQUIDATION_THRESHOLD: f64 = 1.01;

/// Pricing mode of the market
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RateModel {
    /// Auction market: static two-slope curve
    TwoSlope(TwoSlopeCurve),

    /// Pooled market: `base · (1 + U·k)` with a controller-driven base
    Pooled {
        base_interest_rate: f64,
        reputation_sensitivity: f64,
    },
}

/// Complete platform state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketState {
    total_liquidity: f64,
    total_borrowed: f64,
    rate_model: RateModel,

    /// Auction market: health-factor multiplier. Pooled market: base
    /// threshold before the reputation adjustment.
    liquidation_threshold: f64,

    /// Pooled market only
    base_collateral_factor: f64,

    /// Auction market: redrawn every tick; drives passive repayment
    volatility: f64,

    total_liquidations: usize,
    cumulative_interest: f64,
    ticks_per_year: usize,

    pending_requests: Vec<LoanRequest>,
    pending_bids: Vec<Bid>,
    next_request_id: u64,
}

impl MarketState {
    /// Create an auction market with `initial_liquidity` in the platform
    pub fn new_auction(
        initial_liquidity: f64,
        curve: TwoSlopeCurve,
        liquidation_threshold: f64,
        ticks_per_year: usize,
    ) -> Self {
        Self {
            total_liquidity: initial_liquidity,
            total_borrowed: 0.0,
            rate_model: RateModel::TwoSlope(curve),
            liquidation_threshold,
            base_collateral_factor: 0.0,
            volatility: 0.1,
            total_liquidations: 0,
            cumulative_interest: 0.0,
            ticks_per_year,
            pending_requests: Vec::new(),
            pending_bids: Vec::new(),
            next_request_id: 1,
        }
    }

    /// Create a pooled market; lenders' initial supply is added afterwards
    pub fn new_pooled(
        initial_liquidity: f64,
        base_interest_rate: f64,
        reputation_sensitivity: f64,
        base_collateral_factor: f64,
        liquidation_threshold: f64,
        ticks_per_year: usize,
    ) -> Self {
        Self {
            total_liquidity: initial_liquidity,
            total_borrowed: 0.0,
            rate_model: RateModel::Pooled {
                base_interest_rate,
                reputation_sensitivity,
            },
            liquidation_threshold,
            base_collateral_factor,
            volatility: 0.1,
            total_liquidations: 0,
            cumulative_interest: 0.0,
            ticks_per_year,
            pending_requests: Vec::new(),
            pending_bids: Vec::new(),
            next_request_id: 1,
        }
    }

    // ========================================================================
    // Reporters
    // ========================================================================

    pub fn liquidity(&self) -> f64 {
        self.total_liquidity
    }

    pub fn total_borrowed(&self) -> f64 {
        self.total_borrowed
    }

    /// Unborrowed liquidity, never negative
    pub fn available_liquidity(&self) -> f64 {
        (self.total_liquidity - self.total_borrowed).max(0.0)
    }

    /// Borrowed / liquidity (0 for an empty pool)
    pub fn utilization(&self) -> f64 {
        rates::utilization(self.total_borrowed, self.total_liquidity)
    }

    /// Borrowing rate implied by the pricing mode at current utilization
    pub fn current_interest_rate(&self) -> f64 {
        let u = self.utilization();
        match self.rate_model {
            RateModel::TwoSlope(curve) => curve.rate(u),
            RateModel::Pooled {
                base_interest_rate,
                reputation_sensitivity,
            } => rates::pooled_rate(base_interest_rate, u, reputation_sensitivity),
        }
    }

    /// Base rate of the pricing mode
    pub fn base_rate(&self) -> f64 {
        match self.rate_model {
            RateModel::TwoSlope(curve) => curve.base_rate,
            RateModel::Pooled {
                base_interest_rate, ..
            } => base_interest_rate,
        }
    }

    pub fn rate_model(&self) -> &RateModel {
        &self.rate_model
    }

    /// Reputation sensitivity (0 for auction markets and control pools)
    pub fn reputation_sensitivity(&self) -> f64 {
        match self.rate_model {
            RateModel::TwoSlope(_) => 0.0,
            RateModel::Pooled {
                reputation_sensitivity,
                ..
            } => reputation_sensitivity,
        }
    }

    /// Pooled market running without reputation effects
    pub fn is_control(&self) -> bool {
        self.reputation_sensitivity() == 0.0
    }

    pub fn liquidation_threshold(&self) -> f64 {
        self.liquidation_threshold
    }

    /// Liquidation threshold for a pooled borrower with the given reputation
    ///
    /// Control pools use a fixed 1.8. Reputation pools lower the base
    /// threshold by `sensitivity·0.2·(rep − 0.5)`, floored at 1.01.
    ///
    /// # Example
    /// ```
    /// use lending_simulator_core_rs::models::MarketState;
    ///
    /// let market = MarketState::new_pooled(0.0, 0.03, 0.2, 0.75, 1.05, 365);
    /// assert!((market.liquidation_threshold_for(0.5) - 1.05).abs() < 1e-12);
    /// assert!(market.liquidation_threshold_for(1.0) < 1.05);
    /// ```
    pub fn liquidation_threshold_for(&self, reputation: f64) -> f64 {
        match self.rate_model {
            RateModel::TwoSlope(_) => self.liquidation_threshold,
            RateModel::Pooled {
                reputation_sensitivity,
                ..
            } => {
                if reputation_sensitivity == 0.0 {
                    CONTROL_LIQUIDATION_THRESHOLD
                } else {
                    let adjustment = reputation_sensitivity * 0.2 * (reputation - 0.5);
                    (self.liquidation_threshold - adjustment).max(MIN_LIQUIDATION_THRESHOLD)
                }
            }
        }
    }

    pub fn base_collateral_factor(&self) -> f64 {
        self.base_collateral_factor
    }

    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    pub fn total_liquidations(&self) -> usize {
        self.total_liquidations
    }

    pub fn cumulative_interest(&self) -> f64 {
        self.cumulative_interest
    }

    pub fn ticks_per_year(&self) -> usize {
        self.ticks_per_year
    }

    /// Requests registered so far this tick
    pub fn pending_requests(&self) -> &[LoanRequest] {
        &self.pending_requests
    }

    /// Bids submitted so far this tick
    pub fn pending_bids(&self) -> &[Bid] {
        &self.pending_bids
    }

    // ========================================================================
    // Per-tick buffers
    // ========================================================================

    /// Register an auction request, returning its id
    pub fn register_request(
        &mut self,
        borrower_id: &str,
        amount: f64,
        collateral: f64,
        reputation: f64,
        tick: usize,
    ) -> u64 {
        let id = self.next_request_id;
        self.next_request_id += 1;
        self.pending_requests.push(LoanRequest {
            id,
            borrower_id: borrower_id.to_string(),
            amount,
            collateral,
            reputation,
            created_tick: tick,
        });
        id
    }

    /// Split the buffers so a lender can read requests while appending bids
    pub fn requests_and_bids_mut(&mut self) -> (&[LoanRequest], &mut Vec<Bid>) {
        (&self.pending_requests, &mut self.pending_bids)
    }

    /// Freeze and drain both buffers for settlement
    pub fn take_pending(&mut self) -> (Vec<LoanRequest>, Vec<Bid>) {
        (
            std::mem::take(&mut self.pending_requests),
            std::mem::take(&mut self.pending_bids),
        )
    }

    // ========================================================================
    // Money movement (settlement only)
    // ========================================================================

    pub(crate) fn credit_liquidity(&mut self, amount: f64) {
        self.total_liquidity += amount;
    }

    pub(crate) fn debit_liquidity(&mut self, amount: f64) {
        self.total_liquidity = (self.total_liquidity - amount).max(0.0);
    }

    pub(crate) fn increase_borrowed(&mut self, amount: f64) {
        self.total_borrowed += amount;
    }

    pub(crate) fn decrease_borrowed(&mut self, amount: f64) {
        self.total_borrowed = (self.total_borrowed - amount).max(0.0);
    }

    pub(crate) fn record_liquidation(&mut self) {
        self.total_liquidations += 1;
    }

    pub(crate) fn record_interest(&mut self, interest: f64) {
        self.cumulative_interest += interest;
    }

    pub(crate) fn set_volatility(&mut self, volatility: f64) {
        self.volatility = volatility;
    }

    /// Mutable handle on the pooled base rate (rate controller)
    pub(crate) fn pooled_base_rate_mut(&mut self) -> Option<&mut f64> {
        match &mut self.rate_model {
            RateModel::Pooled {
                base_interest_rate, ..
            } => Some(base_interest_rate),
            RateModel::TwoSlope(_) => None,
        }
    }
}
