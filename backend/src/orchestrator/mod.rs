//! Orchestrator - main simulation loop
//!
//! Owns the run: configuration, agents, market, random stream, clock and
//! event log. See `engine.rs` for the tick loop.

pub mod checkpoint;
pub mod engine;

// Re-export main types for convenience
pub use engine::{
    AuctionConfig, BorrowerMetrics, MarketConfig, MarketMechanism, MarketMetrics, Orchestrator,
    PoolConfig, SimulationError, TickResult,
};

// Re-export checkpoint types
pub use checkpoint::{compute_config_hash, validate_snapshot, StateSnapshot};
