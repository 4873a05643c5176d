//! Lender model
//!
//! Auction-market lenders hold a lending balance, a risk tolerance and a
//! preferred rate window, and keep a book of funded loans. Pooled-market
//! lenders split their capital between idle funds and an amount supplied to
//! the shared pool, on which they accrue interest.

use crate::models::loan::Loan;
use serde::{Deserialize, Serialize};

/// Represents one lender in the market
///
/// # Example
/// ```
/// use lending_simulator_core_rs::Lender;
///
/// let mut lender = Lender::new_pooled("lender_0000".to_string(), 10_000.0);
/// lender.supply(7_000.0);
/// assert_eq!(lender.capital(), 3_000.0);
/// assert_eq!(lender.supplied_amount(), 7_000.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lender {
    id: String,

    /// Idle capital (auction market: lending balance)
    capital: f64,

    /// Willingness to take risk, in [0, 1] (auction market)
    risk_tolerance: f64,

    /// Acceptable market-rate window `[low, high]` (auction market)
    rate_preference: Option<(f64, f64)>,

    /// Loans won at auction
    active_loans: Vec<Loan>,

    /// Capital currently supplied to the pool (pooled market)
    supplied_amount: f64,

    accumulated_interest: f64,
}

impl Lender {
    /// Create an auction-market lender
    ///
    /// The preferred rate window is `[base_rate, 1.5·base_rate]`.
    pub fn new_auction(id: String, lending_balance: f64, risk_tolerance: f64, base_rate: f64) -> Self {
        Self {
            id,
            capital: lending_balance,
            risk_tolerance: risk_tolerance.clamp(0.0, 1.0),
            rate_preference: Some((base_rate, base_rate * 1.5)),
            active_loans: Vec::new(),
            supplied_amount: 0.0,
            accumulated_interest: 0.0,
        }
    }

    /// Create a pooled-market lender with all capital idle
    pub fn new_pooled(id: String, capital: f64) -> Self {
        Self {
            id,
            capital,
            risk_tolerance: 0.0,
            rate_preference: None,
            active_loans: Vec::new(),
            supplied_amount: 0.0,
            accumulated_interest: 0.0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Idle capital / lending balance
    pub fn capital(&self) -> f64 {
        self.capital
    }

    pub fn risk_tolerance(&self) -> f64 {
        self.risk_tolerance
    }

    pub fn rate_preference(&self) -> Option<(f64, f64)> {
        self.rate_preference
    }

    pub fn active_loans(&self) -> &[Loan] {
        &self.active_loans
    }

    pub fn supplied_amount(&self) -> f64 {
        self.supplied_amount
    }

    pub fn accumulated_interest(&self) -> f64 {
        self.accumulated_interest
    }

    /// Whether `rate` lies inside the preferred window (inclusive)
    pub fn accepts_rate(&self, rate: f64) -> bool {
        match self.rate_preference {
            Some((low, high)) => low <= rate && rate <= high,
            None => false,
        }
    }

    /// Rate this lender bids: the market rate plus a risk premium of up to 5%
    /// that grows as risk tolerance falls.
    pub fn bid_rate(&self, current_rate: f64) -> f64 {
        current_rate * (1.0 + (1.0 - self.risk_tolerance) * 0.05)
    }

    /// Whether idle capital covers `amount`
    pub fn can_fund(&self, amount: f64) -> bool {
        self.capital >= amount
    }

    /// Book a loan won at auction, locking its principal
    pub fn fund_loan(&mut self, loan: Loan) {
        self.capital -= loan.amount;
        self.active_loans.push(loan);
    }

    /// Move idle capital into the pool (clamped to idle capital); returns the
    /// amount moved
    pub fn supply(&mut self, amount: f64) -> f64 {
        let amount = amount.min(self.capital).max(0.0);
        self.capital -= amount;
        self.supplied_amount += amount;
        amount
    }

    /// Move supplied capital back to idle (clamped to the supplied amount);
    /// returns the amount moved
    pub fn withdraw(&mut self, amount: f64) -> f64 {
        let amount = amount.min(self.supplied_amount).max(0.0);
        self.supplied_amount -= amount;
        self.capital += amount;
        amount
    }

    pub fn accrue_interest(&mut self, interest: f64) {
        self.accumulated_interest += interest;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_preference_window() {
        let lender = Lender::new_auction("l".to_string(), 100_000.0, 0.4, 0.02);
        assert!(lender.accepts_rate(0.02));
        assert!(lender.accepts_rate(0.03));
        assert!(!lender.accepts_rate(0.031));
        assert!(!lender.accepts_rate(0.019));
    }

    #[test]
    fn test_bid_rate_risk_premium() {
        let averse = Lender::new_auction("a".to_string(), 100_000.0, 0.0, 0.02);
        let tolerant = Lender::new_auction("t".to_string(), 100_000.0, 1.0, 0.02);
        assert!((averse.bid_rate(0.04) - 0.042).abs() < 1e-12);
        assert_eq!(tolerant.bid_rate(0.04), 0.04);
    }

    #[test]
    fn test_pooled_lender_never_accepts_auction_rates() {
        let lender = Lender::new_pooled("l".to_string(), 5_000.0);
        assert!(!lender.accepts_rate(0.03));
    }

    #[test]
    fn test_fund_loan_locks_capital() {
        let mut lender = Lender::new_auction("l".to_string(), 100_000.0, 0.5, 0.02);
        lender.fund_loan(Loan {
            request_id: 1,
            borrower_id: "b".to_string(),
            lender_id: "l".to_string(),
            amount: 4_000.0,
            rate: 0.03,
            originated_tick: 0,
        });
        assert_eq!(lender.capital(), 96_000.0);
        assert_eq!(lender.active_loans().len(), 1);
    }

    #[test]
    fn test_supply_and_withdraw_clamped() {
        let mut lender = Lender::new_pooled("l".to_string(), 1_000.0);
        assert_eq!(lender.supply(2_000.0), 1_000.0);
        assert_eq!(lender.withdraw(5_000.0), 1_000.0);
        assert_eq!(lender.capital(), 1_000.0);
        assert_eq!(lender.supplied_amount(), 0.0);
    }
}
