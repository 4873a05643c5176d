//! Auction settlement
//!
//! Runs once per tick, after every agent has acted. Settlement drains the
//! frozen request and bid buffers, so nothing carries into the next tick.
//!
//! # Matching Rule
//!
//! ```text
//! for each borrower with ≥ 1 bid (in order of first bid):
//!     candidates = bids whose lender capital ≥ amount
//!     winner = lowest-rate candidate (first minimum wins ties)
//!     fund if platform available liquidity ≥ amount
//!     otherwise discard the request
//! every request not funded is discarded
//! ```
//!
//! After matching, a passive repayment drift returns `1% × volatility` of
//! the outstanding total to liquidity.

use crate::models::event::{Event, EventLog};
use crate::models::loan::{Bid, Loan, LoanRequest};
use crate::models::market::MarketState;
use crate::models::state::SimulationState;
use std::collections::HashMap;

/// Statistics from one auction pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuctionResult {
    /// Requests drained this tick
    pub num_requests: usize,

    /// Bids drained this tick
    pub num_bids: usize,

    /// Requests funded
    pub num_matched: usize,

    /// Total principal funded
    pub matched_volume: f64,
}

/// Why a request left the market unfunded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    NoBids,
    LenderCapital,
    PlatformLiquidity,
    UnknownBorrower,
}

impl DiscardReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscardReason::NoBids => "no_bids",
            DiscardReason::LenderCapital => "insufficient_lender_capital",
            DiscardReason::PlatformLiquidity => "insufficient_platform_liquidity",
            DiscardReason::UnknownBorrower => "unknown_borrower",
        }
    }
}

/// Lowest-rate bid; on ties the earliest bid wins
///
/// # Example
///
/// ```rust
/// use lending_simulator_core_rs::models::Bid;
/// use lending_simulator_core_rs::settlement::auction::select_winning_bid;
///
/// let bid = |lender: &str, rate: f64| Bid {
///     request_id: 1,
///     borrower_id: "borrower_0000".to_string(),
///     lender_id: lender.to_string(),
///     rate,
/// };
/// let bids = vec![bid("a", 0.05), bid("b", 0.03), bid("c", 0.07)];
/// assert_eq!(select_winning_bid(&bids).unwrap().rate, 0.03);
/// ```
pub fn select_winning_bid(bids: &[Bid]) -> Option<&Bid> {
    let mut best: Option<&Bid> = None;
    for bid in bids {
        match best {
            Some(current) if bid.rate >= current.rate => {}
            _ => best = Some(bid),
        }
    }
    best
}

/// Group bids by borrower, preserving first-encounter order
fn group_bids_by_borrower(bids: Vec<Bid>) -> Vec<(String, Vec<Bid>)> {
    let mut groups: Vec<(String, Vec<Bid>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for bid in bids {
        match index.get(&bid.borrower_id) {
            Some(&i) => groups[i].1.push(bid),
            None => {
                index.insert(bid.borrower_id.clone(), groups.len());
                groups.push((bid.borrower_id.clone(), vec![bid]));
            }
        }
    }
    groups
}

/// Match this tick's requests against this tick's bids
///
/// Drains the market's pending buffers and clears every requesting
/// borrower's pending flag, whether funded or not.
pub fn run_auction(state: &mut SimulationState, tick: usize, events: &mut EventLog) -> AuctionResult {
    let (requests, bids) = state.market_mut().take_pending();

    let mut result = AuctionResult {
        num_requests: requests.len(),
        num_bids: bids.len(),
        ..Default::default()
    };

    let requests_by_id: HashMap<u64, &LoanRequest> = requests.iter().map(|r| (r.id, r)).collect();
    let mut outcomes: HashMap<u64, Result<(), DiscardReason>> = HashMap::new();

    for (borrower_id, group) in group_bids_by_borrower(bids) {
        let Some(request) = group.first().and_then(|bid| requests_by_id.get(&bid.request_id)) else {
            continue;
        };
        let amount = request.amount;

        if state.get_borrower(&borrower_id).is_none() {
            outcomes.insert(request.id, Err(DiscardReason::UnknownBorrower));
            continue;
        }

        // Lenders drained earlier in the pass drop out of the running
        let fundable: Vec<Bid> = group
            .iter()
            .filter(|bid| {
                state
                    .get_lender(&bid.lender_id)
                    .is_some_and(|lender| lender.can_fund(amount))
            })
            .cloned()
            .collect();
        let Some(winner) = select_winning_bid(&fundable) else {
            outcomes.insert(request.id, Err(DiscardReason::LenderCapital));
            continue;
        };
        if amount > state.market().available_liquidity() {
            outcomes.insert(request.id, Err(DiscardReason::PlatformLiquidity));
            continue;
        }

        if let Some(lender) = state.get_lender_mut(&winner.lender_id) {
            lender.fund_loan(Loan {
                request_id: request.id,
                borrower_id: borrower_id.clone(),
                lender_id: winner.lender_id.clone(),
                amount,
                rate: winner.rate,
                originated_tick: tick,
            });
        }
        if let Some(borrower) = state.get_borrower_mut(&borrower_id) {
            borrower.add_debt(amount);
        }
        state.market_mut().increase_borrowed(amount);

        outcomes.insert(request.id, Ok(()));
        result.num_matched += 1;
        result.matched_volume += amount;

        events.log(Event::LoanMatched {
            tick,
            request_id: request.id,
            borrower_id,
            lender_id: winner.lender_id.clone(),
            amount,
            rate: winner.rate,
            num_bids: group.len(),
        });
    }

    for request in &requests {
        let outcome = outcomes
            .get(&request.id)
            .copied()
            .unwrap_or(Err(DiscardReason::NoBids));
        if let Err(reason) = outcome {
            events.log(Event::RequestDiscarded {
                tick,
                request_id: request.id,
                borrower_id: request.borrower_id.clone(),
                reason: reason.as_str().to_string(),
            });
        }
        if let Some(borrower) = state.get_borrower_mut(&request.borrower_id) {
            borrower.clear_pending_request();
        }
    }

    result
}

/// Background repayment: `1% × volatility` of the outstanding total flows
/// back into liquidity. Returns the amount repaid.
pub fn apply_repayment_drift(market: &mut MarketState) -> f64 {
    let repaid = market.total_borrowed() * 0.01 * market.volatility();
    market.decrease_borrowed(repaid);
    market.credit_liquidity(repaid);
    repaid
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bid(borrower: &str, lender: &str, rate: f64) -> Bid {
        Bid {
            request_id: 1,
            borrower_id: borrower.to_string(),
            lender_id: lender.to_string(),
            rate,
        }
    }

    #[test]
    fn test_first_minimum_wins_ties() {
        let bids = vec![bid("b", "l1", 0.04), bid("b", "l2", 0.03), bid("b", "l3", 0.03)];
        assert_eq!(select_winning_bid(&bids).unwrap().lender_id, "l2");
    }

    #[test]
    fn test_no_bids_no_winner() {
        assert!(select_winning_bid(&[]).is_none());
    }

    #[test]
    fn test_grouping_preserves_encounter_order() {
        let groups = group_bids_by_borrower(vec![
            bid("b2", "l1", 0.05),
            bid("b1", "l1", 0.04),
            bid("b2", "l2", 0.03),
        ]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "b2");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, "b1");
    }

    #[test]
    fn test_repayment_drift() {
        let mut market = MarketState::new_auction(
            1_000.0,
            crate::rates::TwoSlopeCurve::default(),
            1.0,
            365,
        );
        market.increase_borrowed(500.0);
        market.set_volatility(0.1);
        let repaid = apply_repayment_drift(&mut market);
        assert!((repaid - 0.5).abs() < 1e-12);
        assert!((market.total_borrowed() - 499.5).abs() < 1e-9);
        assert!((market.liquidity() - 1_000.5).abs() < 1e-9);
    }
}
