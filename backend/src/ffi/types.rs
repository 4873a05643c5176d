//! Type conversion utilities for FFI boundary
//!
//! Converts between Rust types and PyO3-compatible types (PyDict, PyList).

use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use crate::orchestrator::{
    AuctionConfig, BorrowerMetrics, MarketConfig, MarketMechanism, MarketMetrics, PoolConfig,
    TickResult,
};

// ========================================================================
// PyDict Extraction Helpers
// ========================================================================

/// Extract a field with a default value if missing.
///
/// # Errors
/// Returns error only if type conversion fails (not if field is missing)
fn extract_with_default<'py, T>(dict: &Bound<'py, PyDict>, key: &str, default: T) -> PyResult<T>
where
    T: FromPyObject<'py>,
{
    match dict.get_item(key)? {
        Some(value) => value.extract(),
        None => Ok(default),
    }
}

fn value_error(msg: String) -> PyErr {
    PyErr::new::<pyo3::exceptions::PyValueError, _>(msg)
}

// ========================================================================
// Configuration Parsers
// ========================================================================

/// Convert Python dict to MarketConfig
///
/// `mechanism` selects `"auction"` (default) or `"pooled"`; every other
/// field falls back to that mechanism's defaults.
///
/// # Errors
///
/// Returns PyValueError if the mechanism is unknown or a value has the
/// wrong type. Range checks happen in `Orchestrator::new`.
pub fn parse_market_config(py_config: &Bound<'_, PyDict>) -> PyResult<MarketConfig> {
    let mechanism: String = extract_with_default(py_config, "mechanism", "auction".to_string())?;

    let base = match mechanism.as_str() {
        "auction" => MarketConfig::auction(),
        "pooled" => MarketConfig::pooled(PoolConfig::default().reputation_sensitivity),
        other => {
            return Err(value_error(format!(
                "Unknown mechanism '{}': expected 'auction' or 'pooled'",
                other
            )))
        }
    };

    let mechanism = match base.mechanism {
        MarketMechanism::Auction(defaults) => MarketMechanism::Auction(AuctionConfig {
            initial_liquidity: extract_with_default(
                py_config,
                "initial_liquidity",
                defaults.initial_liquidity,
            )?,
            base_rate: extract_with_default(py_config, "base_rate", defaults.base_rate)?,
            target_utilization: extract_with_default(
                py_config,
                "target_utilization",
                defaults.target_utilization,
            )?,
            slope1: extract_with_default(py_config, "slope1", defaults.slope1)?,
            slope2: extract_with_default(py_config, "slope2", defaults.slope2)?,
            liquidation_threshold: extract_with_default(
                py_config,
                "liquidation_threshold",
                defaults.liquidation_threshold,
            )?,
        }),
        MarketMechanism::Pooled(defaults) => MarketMechanism::Pooled(PoolConfig {
            initial_liquidity: extract_with_default(
                py_config,
                "initial_liquidity",
                defaults.initial_liquidity,
            )?,
            base_interest_rate: extract_with_default(
                py_config,
                "base_interest_rate",
                defaults.base_interest_rate,
            )?,
            base_collateral_factor: extract_with_default(
                py_config,
                "base_collateral_factor",
                defaults.base_collateral_factor,
            )?,
            reputation_sensitivity: extract_with_default(
                py_config,
                "reputation_sensitivity",
                defaults.reputation_sensitivity,
            )?,
            liquidation_threshold: extract_with_default(
                py_config,
                "liquidation_threshold",
                defaults.liquidation_threshold,
            )?,
        }),
    };

    Ok(MarketConfig {
        num_borrowers: extract_with_default(py_config, "num_borrowers", base.num_borrowers)?,
        num_lenders: extract_with_default(py_config, "num_lenders", base.num_lenders)?,
        rng_seed: extract_with_default(py_config, "rng_seed", base.rng_seed)?,
        ticks_per_year: extract_with_default(py_config, "ticks_per_year", base.ticks_per_year)?,
        mechanism,
    })
}

// ========================================================================
// Result Converters
// ========================================================================

/// Convert MarketMetrics to Python dict
pub fn metrics_to_py<'py>(py: Python<'py>, metrics: &MarketMetrics) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new_bound(py);
    dict.set_item("liquidity", metrics.liquidity)?;
    dict.set_item("total_borrowed", metrics.total_borrowed)?;
    dict.set_item("utilization", metrics.utilization)?;
    dict.set_item("current_interest_rate", metrics.current_interest_rate)?;
    dict.set_item("base_rate", metrics.base_rate)?;
    dict.set_item("total_liquidations", metrics.total_liquidations)?;
    dict.set_item("average_reputation", metrics.average_reputation)?;
    dict.set_item("average_collateral_ratio", metrics.average_collateral_ratio)?;
    dict.set_item("active_borrowers", metrics.active_borrowers)?;
    dict.set_item("liquidated_borrowers", metrics.liquidated_borrowers)?;
    dict.set_item("cumulative_interest", metrics.cumulative_interest)?;
    dict.set_item("volatility", metrics.volatility)?;
    Ok(dict)
}

/// Convert TickResult to Python dict
pub fn tick_result_to_py(py: Python, result: &TickResult) -> PyResult<Py<PyDict>> {
    let dict = PyDict::new_bound(py);

    dict.set_item("tick", result.tick)?;
    dict.set_item("num_requests", result.num_requests)?;
    dict.set_item("num_bids", result.num_bids)?;
    dict.set_item("num_matched", result.num_matched)?;
    dict.set_item("matched_volume", result.matched_volume)?;
    dict.set_item("num_borrows", result.num_borrows)?;
    dict.set_item("num_rejected_borrows", result.num_rejected_borrows)?;
    dict.set_item("num_repayments", result.num_repayments)?;
    dict.set_item("num_failed_repayments", result.num_failed_repayments)?;
    dict.set_item("num_liquidations", result.num_liquidations)?;
    dict.set_item("metrics", metrics_to_py(py, &result.metrics)?)?;

    Ok(dict.unbind())
}

/// Convert per-borrower reporters to a Python list of dicts
pub fn borrower_metrics_to_py(py: Python, borrowers: &[BorrowerMetrics]) -> PyResult<Py<PyList>> {
    let list = PyList::empty_bound(py);
    for borrower in borrowers {
        let dict = PyDict::new_bound(py);
        dict.set_item("id", &borrower.id)?;
        dict.set_item("reputation", borrower.reputation)?;
        dict.set_item("borrowed_amount", borrower.borrowed_amount)?;
        dict.set_item("collateral", borrower.collateral)?;
        dict.set_item("is_liquidated", borrower.is_liquidated)?;
        list.append(dict)?;
    }
    Ok(list.unbind())
}
