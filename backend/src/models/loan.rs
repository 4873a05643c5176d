//! Loan requests, bids and funded loans
//!
//! Requests and bids are per-tick artifacts of the auction market: they are
//! registered during the activation pass and drained by settlement before the
//! tick ends. A [`Loan`] is the durable record a lender keeps after winning an
//! auction.

use serde::{Deserialize, Serialize};

/// A borrower's request for funding, posted to the auction market
///
/// Carries snapshots of the borrower's collateral and reputation taken when
/// the request was created; lenders evaluate the snapshot, not live state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRequest {
    pub id: u64,
    pub borrower_id: String,
    /// Requested principal (> 0)
    pub amount: f64,
    /// Collateral balance at request time
    pub collateral: f64,
    /// Borrower reputation at request time
    pub reputation: f64,
    pub created_tick: usize,
}

impl LoanRequest {
    /// Collateral coverage: collateral / amount
    ///
    /// # Example
    /// ```
    /// use lending_simulator_core_rs::models::LoanRequest;
    ///
    /// let request = LoanRequest {
    ///     id: 1,
    ///     borrower_id: "borrower_0001".to_string(),
    ///     amount: 4_000.0,
    ///     collateral: 8_000.0,
    ///     reputation: 0.9,
    ///     created_tick: 0,
    /// };
    /// assert_eq!(request.coverage_ratio(), 2.0);
    /// ```
    pub fn coverage_ratio(&self) -> f64 {
        if self.amount <= 0.0 {
            return f64::INFINITY;
        }
        self.collateral / self.amount
    }
}

/// A lender's offer to fund a specific request at a given rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    pub request_id: u64,
    pub borrower_id: String,
    pub lender_id: String,
    pub rate: f64,
}

/// A funded loan, recorded in the winning lender's book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub request_id: u64,
    pub borrower_id: String,
    pub lender_id: String,
    pub amount: f64,
    pub rate: f64,
    pub originated_tick: usize,
}
