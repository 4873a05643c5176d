//! Pool settlement: liquidity, reservations, repayments and liquidation
//!
//! The pooled market settles every agent action immediately against the
//! shared [`MarketState`]. A borrow is a reservation of unborrowed
//! liquidity: it either fits or it is rejected, and a rejected borrow leaves
//! no trace on either side.
//!
//! # Critical Invariants
//!
//! - **Borrowed bound**: `0 ≤ total_borrowed ≤ total_liquidity`
//! - **Withdrawal clamp**: liquidity never drops below what is borrowed
//! - **Liquidation conservation**: the debt removed from the borrower equals
//!   the amount subtracted from `total_borrowed`
//! - **Liquidation idempotence**: a liquidated borrower cannot be liquidated
//!   again

use crate::models::borrower::Borrower;
use crate::models::market::MarketState;
use thiserror::Error;

/// Share of the liquidated collateral credited back to the pool
pub const LIQUIDATION_PENALTY: f64 = 0.1;

/// Errors that can occur during pool settlement
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SettlementError {
    #[error("Insufficient liquidity: required {required}, available {available}")]
    InsufficientLiquidity { required: f64, available: f64 },

    #[error("Borrower {borrower_id} is already liquidated")]
    AlreadyLiquidated { borrower_id: String },

    #[error("Invalid amount: {0}")]
    InvalidAmount(f64),
}

/// Details of a completed liquidation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiquidationOutcome {
    /// Debt removed from the borrower and from `total_borrowed`
    pub debt_cleared: f64,
    /// Collateral left with the borrower
    pub collateral: f64,
    /// Amount credited to `total_liquidity`
    pub penalty: f64,
}

fn validate_amount(amount: f64) -> Result<(), SettlementError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(SettlementError::InvalidAmount(amount));
    }
    Ok(())
}

/// Add liquidity to the pool
///
/// # Example
///
/// ```rust
/// use lending_simulator_core_rs::models::MarketState;
/// use lending_simulator_core_rs::settlement::pool;
///
/// let mut market = MarketState::new_pooled(0.0, 0.03, 0.2, 0.75, 1.05, 365);
/// pool::add_liquidity(&mut market, 1_000.0).unwrap();
/// let removed = pool::remove_liquidity(&mut market, 1_000.0);
/// assert_eq!(removed, 1_000.0);
/// assert_eq!(market.liquidity(), 0.0);
/// ```
pub fn add_liquidity(market: &mut MarketState, amount: f64) -> Result<(), SettlementError> {
    validate_amount(amount)?;
    market.credit_liquidity(amount);
    Ok(())
}

/// Remove up to `amount` of unborrowed liquidity, returning what was removed
///
/// Requests beyond the available (unborrowed) liquidity are clamped;
/// negative or non-finite requests remove nothing.
pub fn remove_liquidity(market: &mut MarketState, amount: f64) -> f64 {
    if !amount.is_finite() || amount <= 0.0 {
        return 0.0;
    }
    let removed = amount.min(market.available_liquidity());
    market.debit_liquidity(removed);
    removed
}

/// Reserve `amount` of available liquidity for a borrow
///
/// On error nothing changes; the caller must not touch its own debt.
///
/// # Example
///
/// ```rust
/// use lending_simulator_core_rs::models::MarketState;
/// use lending_simulator_core_rs::settlement::pool::{self, SettlementError};
///
/// let mut market = MarketState::new_pooled(1_000.0, 0.03, 0.2, 0.75, 1.05, 365);
/// assert!(pool::process_borrow(&mut market, 600.0).is_ok());
/// assert_eq!(
///     pool::process_borrow(&mut market, 600.0),
///     Err(SettlementError::InsufficientLiquidity { required: 600.0, available: 400.0 })
/// );
/// assert_eq!(market.total_borrowed(), 600.0);
/// ```
pub fn process_borrow(market: &mut MarketState, amount: f64) -> Result<(), SettlementError> {
    validate_amount(amount)?;
    let available = market.available_liquidity();
    if amount > available {
        return Err(SettlementError::InsufficientLiquidity {
            required: amount,
            available,
        });
    }
    market.increase_borrowed(amount);
    Ok(())
}

/// Return `amount` to the pool; `total_borrowed` is floored at 0
///
/// Returns the amount actually subtracted.
pub fn process_repayment(market: &mut MarketState, amount: f64) -> f64 {
    if !amount.is_finite() || amount <= 0.0 {
        return 0.0;
    }
    let repaid = amount.min(market.total_borrowed());
    market.decrease_borrowed(repaid);
    repaid
}

/// Close an under-collateralized position
///
/// Increments the liquidation counter, subtracts the borrower's debt from
/// `total_borrowed`, credits `10% × collateral` to liquidity and zeroes the
/// debt. The borrower's collateral keeps its (possibly depleted) value.
pub fn liquidate_position(
    market: &mut MarketState,
    borrower: &mut Borrower,
) -> Result<LiquidationOutcome, SettlementError> {
    if borrower.is_liquidated() {
        return Err(SettlementError::AlreadyLiquidated {
            borrower_id: borrower.id().to_string(),
        });
    }

    let debt_cleared = borrower.mark_liquidated();
    let collateral = borrower.collateral();
    let penalty = collateral * LIQUIDATION_PENALTY;

    market.record_liquidation();
    market.decrease_borrowed(debt_cleared);
    market.credit_liquidity(penalty);

    Ok(LiquidationOutcome {
        debt_cleared,
        collateral,
        penalty,
    })
}

/// Interest earned this tick on `supplied_amount` at the current pool rate
///
/// The annual rate is spread over `ticks_per_year`; the result is added to
/// the market's cumulative interest.
pub fn accrue_lender_interest(market: &mut MarketState, supplied_amount: f64) -> f64 {
    if supplied_amount <= 0.0 {
        return 0.0;
    }
    let interest =
        supplied_amount * market.current_interest_rate() / market.ticks_per_year() as f64;
    market.record_interest(interest);
    interest
}

#[cfg(test)]
mod tests {
    use super::*;

    fn market(liquidity: f64) -> MarketState {
        MarketState::new_pooled(liquidity, 0.03, 0.2, 0.75, 1.05, 365)
    }

    #[test]
    fn test_remove_liquidity_clamped_to_available() {
        let mut m = market(1_000.0);
        process_borrow(&mut m, 800.0).unwrap();
        assert_eq!(remove_liquidity(&mut m, 500.0), 200.0);
        assert_eq!(m.liquidity(), 800.0);
        assert!(m.total_borrowed() <= m.liquidity());
    }

    #[test]
    fn test_add_liquidity_rejects_negative() {
        let mut m = market(0.0);
        assert_eq!(
            add_liquidity(&mut m, -5.0),
            Err(SettlementError::InvalidAmount(-5.0))
        );
        assert_eq!(m.liquidity(), 0.0);
    }

    #[test]
    fn test_process_borrow_rejects_nan() {
        let mut m = market(1_000.0);
        assert!(process_borrow(&mut m, f64::NAN).is_err());
        assert_eq!(m.total_borrowed(), 0.0);
    }

    #[test]
    fn test_repayment_floors_at_zero() {
        let mut m = market(1_000.0);
        process_borrow(&mut m, 100.0).unwrap();
        assert_eq!(process_repayment(&mut m, 250.0), 100.0);
        assert_eq!(m.total_borrowed(), 0.0);
    }

    #[test]
    fn test_liquidation_is_idempotent() {
        let mut m = market(1_000.0);
        let mut b = Borrower::new_pooled("b".to_string(), 400.0);
        process_borrow(&mut m, 500.0).unwrap();
        b.open_position(500.0);

        let outcome = liquidate_position(&mut m, &mut b).unwrap();
        assert_eq!(outcome.debt_cleared, 500.0);
        assert_eq!(outcome.penalty, 40.0);
        assert_eq!(m.total_borrowed(), 0.0);
        assert_eq!(m.liquidity(), 1_040.0);

        let again = liquidate_position(&mut m, &mut b);
        assert!(matches!(again, Err(SettlementError::AlreadyLiquidated { .. })));
        assert_eq!(m.total_liquidations(), 1);
        assert_eq!(m.liquidity(), 1_040.0);
    }

    #[test]
    fn test_interest_accrues_daily_share() {
        let mut m = market(1_000.0);
        // U = 0 → rate = base = 0.03
        let interest = accrue_lender_interest(&mut m, 365_000.0);
        assert!((interest - 30.0).abs() < 1e-9);
        assert!((m.cumulative_interest() - 30.0).abs() < 1e-9);
    }
}
