//! Checkpoint - Save/Load Simulation State
//!
//! Enables serialization and deserialization of complete orchestrator state
//! for pause/resume functionality.
//!
//! # Critical Invariants
//!
//! - **Determinism**: a restored run continues with the identical tick sequence
//! - **Borrowed Bound**: `0 ≤ total_borrowed ≤ total_liquidity`
//! - **Between Ticks**: no pending request or bid exists in a snapshot
//! - **Config Matching**: state can only be loaded with a matching config

use crate::models::state::SimulationState;
use crate::orchestrator::SimulationError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// Slack allowed on the borrowed bound for floating-point accumulation
const BALANCE_TOLERANCE: f64 = 1e-6;

// ============================================================================
// Snapshot Structures
// ============================================================================

/// Complete orchestrator state snapshot
///
/// Captures everything needed to resume a simulation from a tick boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Current tick position
    pub current_tick: usize,

    /// RNG state at time of snapshot (CRITICAL for determinism)
    pub rng_state: u64,

    /// Run identity (metadata only)
    pub run_id: String,

    /// Borrowers, lenders and market
    pub state: SimulationState,

    /// SHA256 hash of original config (for validation)
    pub config_hash: String,
}

// ============================================================================
// Config Hashing
// ============================================================================

/// Compute deterministic SHA256 hash of config
///
/// Uses canonical JSON serialization with sorted keys so the hash does not
/// depend on field or map ordering.
pub fn compute_config_hash<T: Serialize>(config: &T) -> Result<String, SimulationError> {
    use serde_json::Value;
    use std::collections::BTreeMap;

    let value = serde_json::to_value(config).map_err(|e| {
        SimulationError::SerializationError(format!("Config serialization failed: {}", e))
    })?;

    fn canonicalize(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
            other => other,
        }
    }

    let json = serde_json::to_string(&canonicalize(value)).map_err(|e| {
        SimulationError::SerializationError(format!("Config serialization failed: {}", e))
    })?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Validate state snapshot integrity
///
/// Checks:
/// - Market totals are non-negative and the borrowed bound holds
/// - Agent ids are unique
/// - Reputations lie in [0, 1]; debts and collateral are non-negative
/// - Liquidated borrowers carry no debt
/// - Pending buffers are empty
pub fn validate_snapshot(snapshot: &StateSnapshot) -> Result<(), SimulationError> {
    let state = &snapshot.state;
    let market = state.market();

    // 1. Market totals
    if market.liquidity() < 0.0 || market.total_borrowed() < 0.0 {
        return Err(SimulationError::StateValidationError(format!(
            "Negative market totals: liquidity {}, borrowed {}",
            market.liquidity(),
            market.total_borrowed()
        )));
    }
    if market.total_borrowed() > market.liquidity() + BALANCE_TOLERANCE {
        return Err(SimulationError::StateValidationError(format!(
            "Borrowed {} exceeds liquidity {}",
            market.total_borrowed(),
            market.liquidity()
        )));
    }

    // 2. Unique ids
    let mut seen = HashSet::new();
    for id in state
        .borrowers()
        .iter()
        .map(|b| b.id())
        .chain(state.lenders().iter().map(|l| l.id()))
    {
        if !seen.insert(id) {
            return Err(SimulationError::StateValidationError(format!(
                "Duplicate agent id: {}",
                id
            )));
        }
    }

    // 3. Borrower invariants
    for borrower in state.borrowers() {
        if !(0.0..=1.0).contains(&borrower.reputation()) {
            return Err(SimulationError::StateValidationError(format!(
                "Borrower {} reputation {} outside [0, 1]",
                borrower.id(),
                borrower.reputation()
            )));
        }
        if borrower.borrowed_amount() < 0.0 || borrower.collateral() < 0.0 {
            return Err(SimulationError::StateValidationError(format!(
                "Borrower {} has negative balances",
                borrower.id()
            )));
        }
        if borrower.is_liquidated() && borrower.has_debt() {
            return Err(SimulationError::StateValidationError(format!(
                "Liquidated borrower {} still holds debt {}",
                borrower.id(),
                borrower.borrowed_amount()
            )));
        }
    }

    // 4. Tick boundary
    if !market.pending_requests().is_empty() || !market.pending_bids().is_empty() {
        return Err(SimulationError::StateValidationError(
            "Snapshot contains unsettled requests or bids".to_string(),
        ));
    }

    Ok(())
}
