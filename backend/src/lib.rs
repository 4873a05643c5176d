//! Lending Market Simulator Core - Rust Engine
//!
//! Discrete-time, agent-based simulation of a peer-to-peer lending market
//! with deterministic execution. Two market mechanisms share one engine:
//! an auction market (lowest-rate bid wins) and a pooled market with
//! reputation-weighted collateral factors and liquidation thresholds.
//!
//! # Architecture
//!
//! - **core**: Time management
//! - **models**: Domain types (Borrower, Lender, MarketState, State, Events)
//! - **rates**: Interest-rate curves and the pool rate controller
//! - **policy**: Per-tick agent heuristics
//! - **settlement**: Auction matching and pool settlement
//! - **orchestrator**: Main simulation loop and checkpointing
//! - **rng**: Deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. `0 ≤ total_borrowed ≤ total_liquidity` after every tick
//! 2. All randomness is deterministic (seeded RNG)
//! 3. FFI boundary is minimal and safe

// Module declarations
pub mod core;
pub mod models;
pub mod orchestrator;
pub mod policy;
pub mod rates;
pub mod rng;
pub mod settlement;

// Re-exports for convenience
pub use crate::core::time::TimeManager;
pub use models::{
    borrower::{Borrower, BorrowerState, CreditRating},
    event::{Event, EventLog},
    lender::Lender,
    market::MarketState,
    state::SimulationState,
};
pub use orchestrator::{
    AuctionConfig, BorrowerMetrics, MarketConfig, MarketMechanism, MarketMetrics, Orchestrator,
    PoolConfig, SimulationError, TickResult,
};
pub use policy::{MarketParticipant, StepContext, StepOutcome};
pub use rng::RngManager;
pub use settlement::SettlementError;

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn lending_simulator_core_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ffi::orchestrator::PyLendingMarket>()?;
    Ok(())
}
