//! Settlement Module
//!
//! The only code that moves money between agents and the shared market:
//!
//! - **pool**: immediate reservation, repayment, liquidity supply and
//!   liquidation against the shared pool (pooled market)
//! - **auction**: end-of-tick matching of requests against bids, plus the
//!   passive repayment drift (auction market)
//!
//! # Critical Invariants
//!
//! 1. **Borrowed bound**: `0 ≤ total_borrowed ≤ total_liquidity` holds after
//!    every settlement call
//! 2. **All-or-nothing**: a rejected reservation or an unfunded request
//!    changes neither the borrower nor the market
//! 3. **Drained buffers**: no request or bid survives an auction pass
//!
//! # Example
//!
//! ```rust
//! use lending_simulator_core_rs::Borrower;
//! use lending_simulator_core_rs::models::MarketState;
//! use lending_simulator_core_rs::settlement;
//!
//! let mut market = MarketState::new_pooled(10_000.0, 0.03, 0.2, 0.75, 1.05, 365);
//! let mut borrower = Borrower::new_pooled("borrower_0000".to_string(), 400.0);
//!
//! settlement::process_borrow(&mut market, 500.0).unwrap();
//! borrower.open_position(500.0);
//!
//! let outcome = settlement::liquidate_position(&mut market, &mut borrower).unwrap();
//! assert_eq!(outcome.penalty, 40.0);
//! assert_eq!(market.total_borrowed(), 0.0);
//! assert_eq!(market.liquidity(), 10_040.0);
//! ```

pub mod auction;
pub mod pool;

// Re-export public API
pub use auction::{apply_repayment_drift, run_auction, select_winning_bid, AuctionResult, DiscardReason};
pub use pool::{
    accrue_lender_interest, add_liquidity, liquidate_position, process_borrow, process_repayment,
    remove_liquidity, LiquidationOutcome, SettlementError, LIQUIDATION_PENALTY,
};
