//! Domain models for the lending market simulator

pub mod borrower;
pub mod event;
pub mod lender;
pub mod loan;
pub mod market;
pub mod state;

// Re-exports
pub use borrower::{Borrower, BorrowerState, CreditRating};
pub use event::{Event, EventLog};
pub use lender::Lender;
pub use loan::{Bid, Loan, LoanRequest};
pub use market::{MarketState, RateModel};
pub use state::{AgentRef, SimulationState};
