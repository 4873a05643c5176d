//! Event logging for simulation replay and analysis.
//!
//! Every significant state change in the market is captured as an [`Event`].
//! The log is the simulator's structured trace: collectors can query it by
//! tick, type or agent, or export it with `serde_json`.
//!
//! # Event Types
//!
//! - **Auction**: requests, bids, matches, discarded requests
//! - **Pool**: borrows, rejected borrows, repayments, supply/withdrawal
//! - **Risk**: collateral shocks, liquidations
//! - **Market**: passive repayment drift, rate controller adjustments
//!
//! # Example
//!
//! ```rust
//! use lending_simulator_core_rs::models::{Event, EventLog};
//!
//! let mut log = EventLog::new();
//! log.log(Event::Liquidated {
//!     tick: 12,
//!     borrower_id: "borrower_0003".to_string(),
//!     debt_cleared: 500.0,
//!     collateral: 400.0,
//!     penalty: 40.0,
//! });
//!
//! assert_eq!(log.events_at_tick(12).len(), 1);
//! assert_eq!(log.events_for_agent("borrower_0003").len(), 1);
//! ```

use crate::rates::RateAdjustment;
use serde::{Deserialize, Serialize};

/// Simulation event capturing a state change.
///
/// All events include a tick number. Events are logged in the order they
/// occur within a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum Event {
    /// Borrower posted a request to the auction market
    LoanRequested {
        tick: usize,
        request_id: u64,
        borrower_id: String,
        amount: f64,
    },

    /// Lender bid on a pending request
    BidSubmitted {
        tick: usize,
        request_id: u64,
        lender_id: String,
        rate: f64,
    },

    /// Auction settled a request with its lowest bid
    LoanMatched {
        tick: usize,
        request_id: u64,
        borrower_id: String,
        lender_id: String,
        amount: f64,
        rate: f64,
        num_bids: usize,
    },

    /// Request left the market unfunded
    RequestDiscarded {
        tick: usize,
        request_id: u64,
        borrower_id: String,
        reason: String,
    },

    /// Borrower drew funds from the pool
    Borrowed {
        tick: usize,
        borrower_id: String,
        amount: f64,
        collateral: f64,
        liquidation_threshold: f64,
    },

    /// Pool could not reserve the amount
    BorrowRejected {
        tick: usize,
        borrower_id: String,
        amount: f64,
        available: f64,
    },

    /// Borrower repaid the full outstanding debt
    Repaid {
        tick: usize,
        borrower_id: String,
        amount: f64,
        reputation: f64,
    },

    /// Borrower attempted repayment and failed
    RepaymentFailed {
        tick: usize,
        borrower_id: String,
        outstanding: f64,
        reputation: f64,
    },

    /// Collateral value dropped
    CollateralShock {
        tick: usize,
        borrower_id: String,
        factor: f64,
        new_collateral: f64,
    },

    /// Under-collateralized position closed
    Liquidated {
        tick: usize,
        borrower_id: String,
        debt_cleared: f64,
        collateral: f64,
        penalty: f64,
    },

    /// Lender supplied idle capital to the pool
    LiquiditySupplied {
        tick: usize,
        lender_id: String,
        amount: f64,
    },

    /// Lender withdrew supplied capital
    LiquidityWithdrawn {
        tick: usize,
        lender_id: String,
        requested: f64,
        withdrawn: f64,
    },

    /// Aggregate background repayment (auction market)
    PassiveRepayment {
        tick: usize,
        amount: f64,
        volatility: f64,
    },

    /// Pool rate controller moved the base rate
    RateAdjusted {
        tick: usize,
        direction: RateAdjustment,
        old_rate: f64,
        new_rate: f64,
        utilization: f64,
    },
}

impl Event {
    /// Get the tick number when this event occurred
    pub fn tick(&self) -> usize {
        match self {
            Event::LoanRequested { tick, .. } => *tick,
            Event::BidSubmitted { tick, .. } => *tick,
            Event::LoanMatched { tick, .. } => *tick,
            Event::RequestDiscarded { tick, .. } => *tick,
            Event::Borrowed { tick, .. } => *tick,
            Event::BorrowRejected { tick, .. } => *tick,
            Event::Repaid { tick, .. } => *tick,
            Event::RepaymentFailed { tick, .. } => *tick,
            Event::CollateralShock { tick, .. } => *tick,
            Event::Liquidated { tick, .. } => *tick,
            Event::LiquiditySupplied { tick, .. } => *tick,
            Event::LiquidityWithdrawn { tick, .. } => *tick,
            Event::PassiveRepayment { tick, .. } => *tick,
            Event::RateAdjusted { tick, .. } => *tick,
        }
    }

    /// Get a short description of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::LoanRequested { .. } => "LoanRequested",
            Event::BidSubmitted { .. } => "BidSubmitted",
            Event::LoanMatched { .. } => "LoanMatched",
            Event::RequestDiscarded { .. } => "RequestDiscarded",
            Event::Borrowed { .. } => "Borrowed",
            Event::BorrowRejected { .. } => "BorrowRejected",
            Event::Repaid { .. } => "Repaid",
            Event::RepaymentFailed { .. } => "RepaymentFailed",
            Event::CollateralShock { .. } => "CollateralShock",
            Event::Liquidated { .. } => "Liquidated",
            Event::LiquiditySupplied { .. } => "LiquiditySupplied",
            Event::LiquidityWithdrawn { .. } => "LiquidityWithdrawn",
            Event::PassiveRepayment { .. } => "PassiveRepayment",
            Event::RateAdjusted { .. } => "RateAdjusted",
        }
    }

    /// Get agent ID if event relates to a specific agent
    ///
    /// Matches report the borrower; bids report the lender.
    pub fn agent_id(&self) -> Option<&str> {
        match self {
            Event::LoanRequested { borrower_id, .. } => Some(borrower_id),
            Event::BidSubmitted { lender_id, .. } => Some(lender_id),
            Event::LoanMatched { borrower_id, .. } => Some(borrower_id),
            Event::RequestDiscarded { borrower_id, .. } => Some(borrower_id),
            Event::Borrowed { borrower_id, .. } => Some(borrower_id),
            Event::BorrowRejected { borrower_id, .. } => Some(borrower_id),
            Event::Repaid { borrower_id, .. } => Some(borrower_id),
            Event::RepaymentFailed { borrower_id, .. } => Some(borrower_id),
            Event::CollateralShock { borrower_id, .. } => Some(borrower_id),
            Event::Liquidated { borrower_id, .. } => Some(borrower_id),
            Event::LiquiditySupplied { lender_id, .. } => Some(lender_id),
            Event::LiquidityWithdrawn { lender_id, .. } => Some(lender_id),
            _ => None,
        }
    }
}

/// Event log for storing and querying simulation events.
///
/// Thin wrapper around `Vec<Event>` with query helpers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Add an event to the log
    pub fn log(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Get the number of events logged
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Get all events
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Get events for a specific tick
    pub fn events_at_tick(&self, tick: usize) -> Vec<&Event> {
        self.events.iter().filter(|e| e.tick() == tick).collect()
    }

    /// Get events of a specific type
    pub fn events_of_type(&self, event_type: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Get events for a specific agent
    pub fn events_for_agent(&self, agent_id: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.agent_id() == Some(agent_id))
            .collect()
    }

    /// Serialize the log as a JSON array
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.events)
    }

    /// Clear all events
    pub fn clear(&mut self) {
        self.events.clear();
    }
}
