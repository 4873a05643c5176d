//! Pool settlement tests
//!
//! Liquidity accounting for the pooled market: supply, withdrawal, borrow
//! reservation, repayment and interest accrual.

use lending_simulator_core_rs::models::MarketState;
use lending_simulator_core_rs::settlement::{
    accrue_lender_interest, add_liquidity, process_borrow, process_repayment, remove_liquidity,
    SettlementError,
};

fn empty_pool() -> MarketState {
    MarketState::new_pooled(0.0, 0.03, 0.2, 0.75, 1.05, 365)
}

// ============================================================================
// Supply and withdrawal
// ============================================================================

#[test]
fn test_add_then_remove_restores_liquidity() {
    let mut market = empty_pool();
    add_liquidity(&mut market, 5_000.0).unwrap();
    add_liquidity(&mut market, 1_250.0).unwrap();
    assert_eq!(market.liquidity(), 6_250.0);

    assert_eq!(remove_liquidity(&mut market, 1_250.0), 1_250.0);
    assert_eq!(market.liquidity(), 5_000.0);
}

#[test]
fn test_add_rejects_invalid_amounts() {
    let mut market = empty_pool();
    assert_eq!(
        add_liquidity(&mut market, -1.0),
        Err(SettlementError::InvalidAmount(-1.0))
    );
    assert!(add_liquidity(&mut market, f64::NAN).is_err());
    assert!(add_liquidity(&mut market, f64::INFINITY).is_err());
    assert_eq!(market.liquidity(), 0.0);
}

#[test]
fn test_remove_never_touches_borrowed_funds() {
    let mut market = empty_pool();
    add_liquidity(&mut market, 1_000.0).unwrap();
    process_borrow(&mut market, 600.0).unwrap();

    assert_eq!(remove_liquidity(&mut market, 1_000.0), 400.0);
    assert_eq!(market.liquidity(), 600.0);
    assert_eq!(market.total_borrowed(), 600.0);
    assert_eq!(market.utilization(), 1.0);
}

#[test]
fn test_remove_ignores_non_positive_amounts() {
    let mut market = empty_pool();
    add_liquidity(&mut market, 100.0).unwrap();
    assert_eq!(remove_liquidity(&mut market, 0.0), 0.0);
    assert_eq!(remove_liquidity(&mut market, -50.0), 0.0);
    assert_eq!(market.liquidity(), 100.0);
}

#[test]
fn test_zero_liquidity_utilization_is_zero() {
    let market = empty_pool();
    assert_eq!(market.liquidity(), 0.0);
    assert_eq!(market.utilization(), 0.0);
    assert_eq!(market.current_interest_rate(), 0.03);
}

// ============================================================================
// Borrow and repayment
// ============================================================================

#[test]
fn test_borrow_exactly_available_succeeds() {
    let mut market = empty_pool();
    add_liquidity(&mut market, 500.0).unwrap();
    process_borrow(&mut market, 500.0).unwrap();
    assert_eq!(market.available_liquidity(), 0.0);
}

#[test]
fn test_borrow_over_available_fails_without_side_effects() {
    let mut market = empty_pool();
    add_liquidity(&mut market, 500.0).unwrap();
    process_borrow(&mut market, 300.0).unwrap();

    let err = process_borrow(&mut market, 300.0).unwrap_err();
    assert_eq!(
        err,
        SettlementError::InsufficientLiquidity {
            required: 300.0,
            available: 200.0
        }
    );
    assert_eq!(market.total_borrowed(), 300.0);
    assert_eq!(market.liquidity(), 500.0);
}

#[test]
fn test_repayment_floors_at_zero() {
    let mut market = empty_pool();
    add_liquidity(&mut market, 1_000.0).unwrap();
    process_borrow(&mut market, 200.0).unwrap();

    assert_eq!(process_repayment(&mut market, 500.0), 200.0);
    assert_eq!(market.total_borrowed(), 0.0);
    assert_eq!(market.liquidity(), 1_000.0);
}

#[test]
fn test_rate_rises_with_utilization() {
    let mut market = empty_pool();
    add_liquidity(&mut market, 1_000.0).unwrap();
    let idle = market.current_interest_rate();

    process_borrow(&mut market, 900.0).unwrap();
    let busy = market.current_interest_rate();
    assert!(busy > idle);
    // 0.03·(1 + 0.9·3)
    assert!((busy - 0.111).abs() < 1e-12);
}

// ============================================================================
// Interest
// ============================================================================

#[test]
fn test_interest_accrual_uses_ticks_per_year() {
    let mut market = MarketState::new_pooled(1_000.0, 0.0365, 0.0, 0.75, 1.05, 365);
    let interest = accrue_lender_interest(&mut market, 10_000.0);
    assert!((interest - 1.0).abs() < 1e-9);
    assert!((market.cumulative_interest() - 1.0).abs() < 1e-9);

    assert_eq!(accrue_lender_interest(&mut market, 0.0), 0.0);
    assert!((market.cumulative_interest() - 1.0).abs() < 1e-9);
}
