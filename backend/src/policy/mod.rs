//! Agent Decision Policies
//!
//! Every agent acts once per tick through the [`MarketParticipant`] trait.
//! Borrowers and lenders carry fixed heuristics: there is no learning and no
//! strategy search. Each heuristic branches on the market mechanism, which is
//! read from the market's rate model.
//!
//! # Step Contract
//!
//! A step receives a [`StepContext`]: the shared market, the run's only
//! random stream, the event log and the current tick. A step may
//!
//! - register an auction request or append bids (auction market), or
//! - settle immediately against the pool through [`crate::settlement`]
//!   (pooled market)
//!
//! and reports what it did as a [`StepOutcome`] so the orchestrator can
//! count actions per tick.
//!
//! # Example
//!
//! ```rust
//! use lending_simulator_core_rs::policy::{MarketParticipant, StepContext, StepOutcome};
//! use lending_simulator_core_rs::models::{EventLog, MarketState};
//! use lending_simulator_core_rs::settlement;
//! use lending_simulator_core_rs::{Lender, RngManager};
//!
//! let mut market = MarketState::new_pooled(0.0, 0.03, 0.2, 0.75, 1.05, 365);
//! let mut rng = RngManager::new(42);
//! let mut events = EventLog::new();
//! let mut lender = Lender::new_pooled("lender_0000".to_string(), 1_000.0);
//! let supplied = lender.supply(700.0);
//! settlement::add_liquidity(&mut market, supplied).unwrap();
//!
//! // Idle pool (U = 0 < 0.3): the lender pulls back 10% of its supply
//! let mut ctx = StepContext { market: &mut market, rng: &mut rng, events: &mut events, tick: 0 };
//! let outcome = lender.step(&mut ctx).unwrap();
//! assert_eq!(outcome, StepOutcome::Withdrew(70.0));
//! assert_eq!(market.liquidity(), 630.0);
//! assert!(lender.accumulated_interest() > 0.0);
//! ```

use crate::models::event::EventLog;
use crate::models::market::MarketState;
use crate::rng::RngManager;
use crate::settlement::SettlementError;

pub mod borrower;
pub mod lender;

pub use borrower::{planned_borrow_amount, repayment_odds, MIN_BORROW_AMOUNT};
pub use lender::{evaluate_request, BidDecision};

/// Everything an agent may touch during its step
pub struct StepContext<'a> {
    pub market: &'a mut MarketState,
    pub rng: &'a mut RngManager,
    pub events: &'a mut EventLog,
    pub tick: usize,
}

/// What an agent did during one step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// Nothing observable happened
    Idle,

    /// Borrower posted an auction request
    Requested,

    /// Lender submitted this many bids
    Bid(usize),

    /// Borrower drew funds from the pool
    Borrowed(f64),

    /// Pool could not reserve the amount
    BorrowRejected,

    /// Borrower repaid the full debt
    Repaid(f64),

    /// Repayment attempt failed
    RepaymentFailed,

    /// Borrower's position was liquidated
    Liquidated,

    /// Lender supplied capital to the pool
    Supplied(f64),

    /// Lender withdrew capital from the pool
    Withdrew(f64),
}

/// An agent activated once per tick by the scheduler
pub trait MarketParticipant {
    /// Unique agent identifier
    fn id(&self) -> &str;

    /// Act for one tick
    ///
    /// # Errors
    ///
    /// Settlement failures that indicate broken state (for example,
    /// liquidating a position twice). Ordinary rejections, like a borrow the
    /// pool cannot cover, are outcomes rather than errors.
    fn step(&mut self, ctx: &mut StepContext<'_>) -> Result<StepOutcome, SettlementError>;
}
