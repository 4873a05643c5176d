//! Checkpoint Tests - Save/Load Simulation State
//!
//! Critical invariants tested:
//! - Determinism: a restored simulation produces identical results
//! - Market integrity: corrupted snapshots are rejected
//! - Config matching: state from a different config is rejected

use lending_simulator_core_rs::orchestrator::{
    validate_snapshot, MarketConfig, Orchestrator, SimulationError, StateSnapshot,
};

// ============================================================================
// Test Helpers
// ============================================================================

fn pooled_config(seed: u64) -> MarketConfig {
    let mut config = MarketConfig::pooled(0.2);
    config.rng_seed = seed;
    config
}

fn auction_config(seed: u64) -> MarketConfig {
    let mut config = MarketConfig::auction();
    config.num_borrowers = 80;
    config.num_lenders = 16;
    config.rng_seed = seed;
    config
}

fn parse(json: &str) -> StateSnapshot {
    serde_json::from_str(json).expect("snapshot should parse")
}

// ============================================================================
// Round trip
// ============================================================================

#[test]
fn test_save_state_is_json() {
    let mut orchestrator = Orchestrator::new(pooled_config(42)).unwrap();
    orchestrator.run(5).unwrap();

    let json = orchestrator.save_state().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["current_tick"], 5);
    assert!(value["config_hash"].as_str().unwrap().len() == 64);
}

#[test]
fn test_restore_preserves_position() {
    let mut orchestrator = Orchestrator::new(pooled_config(42)).unwrap();
    orchestrator.run(40).unwrap();
    let json = orchestrator.save_state().unwrap();

    let restored = Orchestrator::load_state(pooled_config(42), &json).unwrap();
    assert_eq!(restored.current_tick(), 40);
    assert_eq!(restored.rng_state(), orchestrator.rng_state());
    assert_eq!(restored.run_id(), orchestrator.run_id());
    assert_eq!(restored.metrics(), orchestrator.metrics());
    assert_eq!(restored.borrower_metrics(), orchestrator.borrower_metrics());
}

#[test]
fn test_pooled_restore_continues_identically() {
    let mut original = Orchestrator::new(pooled_config(7)).unwrap();
    original.run(60).unwrap();
    let json = original.save_state().unwrap();

    let mut restored = Orchestrator::load_state(pooled_config(7), &json).unwrap();

    for _ in 0..120 {
        let a = original.tick().unwrap();
        let b = restored.tick().unwrap();
        assert_eq!(a, b);
    }
    assert_eq!(original.borrower_metrics(), restored.borrower_metrics());
}

#[test]
fn test_auction_restore_continues_identically() {
    let mut original = Orchestrator::new(auction_config(3)).unwrap();
    original.run(10).unwrap();
    let json = original.save_state().unwrap();

    let mut restored = Orchestrator::load_state(auction_config(3), &json).unwrap();

    for _ in 0..20 {
        assert_eq!(original.tick().unwrap(), restored.tick().unwrap());
    }
}

#[test]
fn test_restore_at_tick_zero() {
    let original = Orchestrator::new(pooled_config(1)).unwrap();
    let json = original.save_state().unwrap();
    let mut restored = Orchestrator::load_state(pooled_config(1), &json).unwrap();

    let mut fresh = Orchestrator::new(pooled_config(1)).unwrap();
    for _ in 0..30 {
        assert_eq!(fresh.tick().unwrap(), restored.tick().unwrap());
    }
}

#[test]
fn test_event_log_not_restored() {
    let mut orchestrator = Orchestrator::new(pooled_config(42)).unwrap();
    orchestrator.run(30).unwrap();
    assert!(orchestrator.event_count() > 0);

    let json = orchestrator.save_state().unwrap();
    let restored = Orchestrator::load_state(pooled_config(42), &json).unwrap();
    assert_eq!(restored.event_count(), 0);
}

// ============================================================================
// Rejection
// ============================================================================

#[test]
fn test_config_mismatch_rejected() {
    let mut orchestrator = Orchestrator::new(pooled_config(42)).unwrap();
    orchestrator.run(5).unwrap();
    let json = orchestrator.save_state().unwrap();

    let other_seed = Orchestrator::load_state(pooled_config(43), &json);
    assert!(matches!(other_seed, Err(SimulationError::InvalidConfig(_))));

    let other_mechanism = Orchestrator::load_state(MarketConfig::pooled(0.0), &json);
    assert!(matches!(other_mechanism, Err(SimulationError::InvalidConfig(_))));
}

#[test]
fn test_garbage_json_rejected() {
    let result = Orchestrator::load_state(pooled_config(42), "{ not json");
    assert!(matches!(result, Err(SimulationError::SerializationError(_))));
}

#[test]
fn test_bad_run_id_rejected() {
    let orchestrator = Orchestrator::new(pooled_config(42)).unwrap();
    let mut value: serde_json::Value =
        serde_json::from_str(&orchestrator.save_state().unwrap()).unwrap();
    value["run_id"] = serde_json::Value::String("not-a-uuid".to_string());

    let result = Orchestrator::load_state(pooled_config(42), &value.to_string());
    assert!(matches!(result, Err(SimulationError::SerializationError(_))));
}

#[test]
fn test_overborrowed_snapshot_rejected() {
    let orchestrator = Orchestrator::new(pooled_config(42)).unwrap();
    let mut value: serde_json::Value =
        serde_json::from_str(&orchestrator.save_state().unwrap()).unwrap();
    let liquidity = value["state"]["market"]["total_liquidity"].as_f64().unwrap();
    value["state"]["market"]["total_borrowed"] = serde_json::json!(liquidity * 2.0);

    let result = Orchestrator::load_state(pooled_config(42), &value.to_string());
    assert!(matches!(result, Err(SimulationError::StateValidationError(_))));
}

#[test]
fn test_duplicate_borrower_ids_rejected() {
    let orchestrator = Orchestrator::new(pooled_config(42)).unwrap();
    let mut snapshot = parse(&orchestrator.save_state().unwrap());
    let mut value = serde_json::to_value(&snapshot.state).unwrap();
    value["borrowers"][1]["id"] = value["borrowers"][0]["id"].clone();
    snapshot.state = serde_json::from_value(value).unwrap();

    assert!(matches!(
        validate_snapshot(&snapshot),
        Err(SimulationError::StateValidationError(_))
    ));
}

#[test]
fn test_reputation_out_of_range_rejected() {
    let orchestrator = Orchestrator::new(pooled_config(42)).unwrap();
    let mut snapshot = parse(&orchestrator.save_state().unwrap());
    let mut value = serde_json::to_value(&snapshot.state).unwrap();
    value["borrowers"][0]["reputation"] = serde_json::json!(1.5);
    snapshot.state = serde_json::from_value(value).unwrap();

    assert!(validate_snapshot(&snapshot).is_err());
}
