//! Borrower model
//!
//! A borrower pledges collateral and takes on debt. Two flavours exist, one per
//! market mechanism:
//!
//! - **Auction market**: a credit tier (high/medium/low) fixes collateral,
//!   income and a static reputation at creation. Debt grows whenever one of
//!   the borrower's requests wins an auction.
//! - **Pooled market**: no credit tier; reputation starts at 0.5 and evolves
//!   with repayment history. Positions can be liquidated, which is terminal.
//!
//! # Lifecycle
//!
//! ```text
//! Idle ──request──▶ Requested ──settlement──▶ Idle (debt may have grown)
//! Idle ──borrow───▶ Borrowed ──repay──▶ Idle
//!                      │  └──failed repayment──▶ Borrowed (reputation down)
//!                      └──ratio < threshold──▶ Liquidated (terminal)
//! ```
//!
//! Decision logic lives in [`crate::policy`]; this module holds state and the
//! state transitions themselves.

use serde::{Deserialize, Serialize};

/// Credit tier of an auction-market borrower
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreditRating {
    High,
    Medium,
    Low,
}

impl CreditRating {
    /// Tier for the `index`-th of `count` borrowers: 50% high, 30% medium,
    /// 20% low, assigned in creation order.
    pub fn for_population_index(index: usize, count: usize) -> Self {
        let i = index as f64;
        let n = count as f64;
        if i < n * 0.5 {
            CreditRating::High
        } else if i < n * 0.8 {
            CreditRating::Medium
        } else {
            CreditRating::Low
        }
    }

    /// Sampling ranges `(collateral, reputation, income_flow)` for the tier
    pub fn attribute_ranges(&self) -> ((f64, f64), (f64, f64), (f64, f64)) {
        match self {
            CreditRating::High => ((10_000.0, 20_000.0), (0.8, 1.0), (500.0, 1_000.0)),
            CreditRating::Medium => ((5_000.0, 15_000.0), (0.5, 0.8), (300.0, 700.0)),
            CreditRating::Low => ((1_000.0, 8_000.0), (0.2, 0.5), (100.0, 500.0)),
        }
    }
}

/// Observable lifecycle state, derived from the borrower's fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BorrowerState {
    Idle,
    Requested,
    Borrowed,
    Liquidated,
}

/// Represents one borrower in the market
///
/// # Example
/// ```
/// use lending_simulator_core_rs::Borrower;
///
/// let mut borrower = Borrower::new_pooled("borrower_0000".to_string(), 1_000.0);
/// assert_eq!(borrower.reputation(), 0.5);
/// assert_eq!(borrower.collateral_ratio(), f64::INFINITY);
///
/// borrower.open_position(500.0);
/// assert_eq!(borrower.collateral_ratio(), 2.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Borrower {
    id: String,

    /// Credit tier (auction market only)
    credit_rating: Option<CreditRating>,

    /// Collateral balance (≥ 0)
    collateral: f64,

    /// Outstanding debt (≥ 0)
    borrow_balance: f64,

    /// Reputation score in [0, 1]
    reputation: f64,

    /// Cash flow that caps request size (auction market only)
    income_flow: f64,

    /// `collateral × liquidation_threshold / debt`, refreshed each auction
    /// tick; informational only
    #[serde(with = "infinite_as_null")]
    health_factor: f64,

    /// Terminal flag (pooled market only)
    is_liquidated: bool,

    /// Outstanding auction request, cleared by settlement
    pending_request: Option<u64>,

    /// Ticks since the last successful pool borrow
    time_since_last_borrow: usize,

    successful_repayments: u32,

    defaults: u32,
}

impl Borrower {
    /// Create an auction-market borrower with tier-sampled attributes
    pub fn new_auction(
        id: String,
        credit_rating: CreditRating,
        collateral: f64,
        reputation: f64,
        income_flow: f64,
    ) -> Self {
        Self {
            id,
            credit_rating: Some(credit_rating),
            collateral,
            borrow_balance: 0.0,
            reputation: reputation.clamp(0.0, 1.0),
            income_flow,
            health_factor: f64::INFINITY,
            is_liquidated: false,
            pending_request: None,
            time_since_last_borrow: 0,
            successful_repayments: 0,
            defaults: 0,
        }
    }

    /// Create a pooled-market borrower with neutral reputation
    pub fn new_pooled(id: String, collateral: f64) -> Self {
        Self {
            id,
            credit_rating: None,
            collateral,
            borrow_balance: 0.0,
            reputation: 0.5,
            income_flow: 0.0,
            health_factor: f64::INFINITY,
            is_liquidated: false,
            pending_request: None,
            time_since_last_borrow: 0,
            successful_repayments: 0,
            defaults: 0,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn credit_rating(&self) -> Option<CreditRating> {
        self.credit_rating
    }

    pub fn collateral(&self) -> f64 {
        self.collateral
    }

    /// Outstanding debt
    pub fn borrowed_amount(&self) -> f64 {
        self.borrow_balance
    }

    pub fn reputation(&self) -> f64 {
        self.reputation
    }

    pub fn income_flow(&self) -> f64 {
        self.income_flow
    }

    pub fn health_factor(&self) -> f64 {
        self.health_factor
    }

    pub fn is_liquidated(&self) -> bool {
        self.is_liquidated
    }

    pub fn pending_request(&self) -> Option<u64> {
        self.pending_request
    }

    pub fn time_since_last_borrow(&self) -> usize {
        self.time_since_last_borrow
    }

    pub fn successful_repayments(&self) -> u32 {
        self.successful_repayments
    }

    pub fn defaults(&self) -> u32 {
        self.defaults
    }

    pub fn has_debt(&self) -> bool {
        self.borrow_balance > 0.0
    }

    /// Current lifecycle state
    pub fn state(&self) -> BorrowerState {
        if self.is_liquidated {
            BorrowerState::Liquidated
        } else if self.pending_request.is_some() {
            BorrowerState::Requested
        } else if self.has_debt() {
            BorrowerState::Borrowed
        } else {
            BorrowerState::Idle
        }
    }

    /// Collateral / debt; +∞ without debt
    pub fn collateral_ratio(&self) -> f64 {
        if self.borrow_balance <= 0.0 {
            return f64::INFINITY;
        }
        self.collateral / self.borrow_balance
    }

    // ========================================================================
    // Auction market
    // ========================================================================

    /// Size of the next auction request: `min(0.5·collateral, 10·income)`
    pub fn request_amount(&self) -> f64 {
        (self.collateral * 0.5).min(self.income_flow * 10.0)
    }

    /// Mark a request as outstanding
    pub fn set_pending_request(&mut self, request_id: u64) {
        self.pending_request = Some(request_id);
    }

    /// Settlement consumed the outstanding request (matched or discarded)
    pub fn clear_pending_request(&mut self) {
        self.pending_request = None;
    }

    /// Add a funded auction loan to the debt
    pub fn add_debt(&mut self, amount: f64) {
        self.borrow_balance += amount;
    }

    /// Recompute `collateral × liquidation_threshold / debt` (+∞ without debt)
    pub fn update_health_factor(&mut self, liquidation_threshold: f64) {
        self.health_factor = if self.borrow_balance > 0.0 {
            self.collateral * liquidation_threshold / self.borrow_balance
        } else {
            f64::INFINITY
        };
    }

    // ========================================================================
    // Pooled market
    // ========================================================================

    /// Collateral factor after the reputation adjustment
    ///
    /// Control markets (`sensitivity == 0`) apply a flat 20% haircut to the
    /// base factor. Otherwise the factor moves by `sensitivity·0.3·(rep − 0.5)`
    /// and is clamped to [0.3, 0.95].
    pub fn adjusted_collateral_factor(&self, base_collateral_factor: f64, sensitivity: f64) -> f64 {
        if sensitivity == 0.0 {
            base_collateral_factor * 0.8
        } else {
            let bonus = sensitivity * (self.reputation - 0.5) * 0.3;
            (base_collateral_factor + bonus).clamp(0.3, 0.95)
        }
    }

    /// Maximum borrowable amount: `collateral × adjusted_collateral_factor`
    pub fn max_borrow_amount(&self, base_collateral_factor: f64, sensitivity: f64) -> f64 {
        self.collateral * self.adjusted_collateral_factor(base_collateral_factor, sensitivity)
    }

    /// Advance the borrow debounce counter by one tick
    pub fn tick_borrow_timer(&mut self) {
        self.time_since_last_borrow += 1;
    }

    /// Record a successful pool borrow
    pub fn open_position(&mut self, amount: f64) {
        self.borrow_balance = amount;
        self.time_since_last_borrow = 0;
    }

    /// Multiply collateral by `factor` (price shock)
    pub fn apply_collateral_shock(&mut self, factor: f64) {
        self.collateral = (self.collateral * factor).max(0.0);
    }

    /// Zero the debt after a full repayment, returning the amount repaid
    pub fn settle_debt(&mut self) -> f64 {
        std::mem::replace(&mut self.borrow_balance, 0.0)
    }

    /// Enter the terminal liquidated state, returning the debt removed
    ///
    /// Collateral is left at its current value.
    pub fn mark_liquidated(&mut self) -> f64 {
        self.is_liquidated = true;
        self.pending_request = None;
        std::mem::replace(&mut self.borrow_balance, 0.0)
    }

    /// Apply the asymmetric reputation rule and return the new score
    ///
    /// Success adds `0.05·(1 − 0.5·rep)` (diminishing near the top); failure
    /// subtracts `0.2·(1 + rep)` (high scores fall fastest). Result is clamped
    /// to [0, 1].
    ///
    /// # Example
    /// ```
    /// use lending_simulator_core_rs::Borrower;
    ///
    /// let mut borrower = Borrower::new_pooled("borrower_0000".to_string(), 1_000.0);
    /// let up = borrower.record_repayment_outcome(true);
    /// assert!((up - (0.5 + 0.05 * 0.75)).abs() < 1e-12);
    ///
    /// let down = borrower.record_repayment_outcome(false);
    /// assert!((down - (up - 0.2 * (1.0 + up))).abs() < 1e-12);
    /// ```
    pub fn record_repayment_outcome(&mut self, success: bool) -> f64 {
        if success {
            self.successful_repayments += 1;
            let increase = 0.05 * (1.0 - self.reputation * 0.5);
            self.reputation = (self.reputation + increase).min(1.0);
        } else {
            self.defaults += 1;
            let decrease = 0.2 * (1.0 + self.reputation);
            self.reputation = (self.reputation - decrease).max(0.0);
        }
        self.reputation
    }

    // ========================================================================
    // Direct state manipulation (scenario setup and tests)
    // ========================================================================

    pub fn set_collateral(&mut self, collateral: f64) {
        self.collateral = collateral.max(0.0);
    }

    pub fn set_reputation(&mut self, reputation: f64) {
        self.reputation = reputation.clamp(0.0, 1.0);
    }
}

/// JSON has no infinity: +∞ travels as `null`
mod infinite_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_some(value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_factor_survives_json() {
        let b = Borrower::new_pooled("b".to_string(), 1_000.0);
        let json = serde_json::to_string(&b).unwrap();
        let restored: Borrower = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, b);
    }

    #[test]
    fn test_credit_rating_population_split() {
        let tiers: Vec<CreditRating> = (0..10)
            .map(|i| CreditRating::for_population_index(i, 10))
            .collect();
        assert_eq!(tiers.iter().filter(|t| **t == CreditRating::High).count(), 5);
        assert_eq!(tiers.iter().filter(|t| **t == CreditRating::Medium).count(), 3);
        assert_eq!(tiers.iter().filter(|t| **t == CreditRating::Low).count(), 2);
    }

    #[test]
    fn test_request_amount_capped_by_income() {
        let b = Borrower::new_auction("b".to_string(), CreditRating::High, 15_000.0, 0.9, 600.0);
        assert_eq!(b.request_amount(), 6_000.0);

        let b = Borrower::new_auction("b".to_string(), CreditRating::Low, 2_000.0, 0.3, 400.0);
        assert_eq!(b.request_amount(), 1_000.0);
    }

    #[test]
    fn test_health_factor_infinite_without_debt() {
        let mut b = Borrower::new_auction("b".to_string(), CreditRating::Medium, 8_000.0, 0.6, 500.0);
        b.update_health_factor(1.0);
        assert_eq!(b.health_factor(), f64::INFINITY);

        b.add_debt(4_000.0);
        b.update_health_factor(1.0);
        assert_eq!(b.health_factor(), 2.0);
    }

    #[test]
    fn test_adjusted_collateral_factor_control_is_flat() {
        let mut b = Borrower::new_pooled("b".to_string(), 1_000.0);
        b.set_reputation(1.0);
        assert!((b.adjusted_collateral_factor(0.75, 0.0) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_adjusted_collateral_factor_clamped() {
        let mut b = Borrower::new_pooled("b".to_string(), 1_000.0);
        b.set_reputation(1.0);
        assert_eq!(b.adjusted_collateral_factor(0.9, 2.0), 0.95);
        b.set_reputation(0.0);
        assert_eq!(b.adjusted_collateral_factor(0.35, 2.0), 0.3);
    }

    #[test]
    fn test_reputation_floor_and_ceiling() {
        let mut b = Borrower::new_pooled("b".to_string(), 1_000.0);
        b.set_reputation(0.1);
        assert_eq!(b.record_repayment_outcome(false), 0.0);
        assert_eq!(b.defaults(), 1);

        b.set_reputation(0.999);
        assert_eq!(b.record_repayment_outcome(true), 1.0);
        assert_eq!(b.successful_repayments(), 1);
    }

    #[test]
    fn test_mark_liquidated_zeroes_debt_keeps_collateral() {
        let mut b = Borrower::new_pooled("b".to_string(), 400.0);
        b.open_position(500.0);
        let cleared = b.mark_liquidated();
        assert_eq!(cleared, 500.0);
        assert_eq!(b.borrowed_amount(), 0.0);
        assert_eq!(b.collateral(), 400.0);
        assert_eq!(b.state(), BorrowerState::Liquidated);
    }

    #[test]
    fn test_state_transitions() {
        let mut b = Borrower::new_auction("b".to_string(), CreditRating::Low, 2_000.0, 0.3, 200.0);
        assert_eq!(b.state(), BorrowerState::Idle);
        b.set_pending_request(7);
        assert_eq!(b.state(), BorrowerState::Requested);
        b.clear_pending_request();
        b.add_debt(1_000.0);
        assert_eq!(b.state(), BorrowerState::Borrowed);
    }
}
