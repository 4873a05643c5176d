//! PyO3 wrapper for Orchestrator
//!
//! This module provides the Python interface to the Rust orchestrator, so
//! external tooling (plotting, sensitivity sweeps) can drive the core.

use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use super::types::{borrower_metrics_to_py, metrics_to_py, parse_market_config, tick_result_to_py};
use crate::orchestrator::Orchestrator;

fn runtime_error(context: &str, e: impl std::fmt::Display) -> PyErr {
    PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!("{}: {}", context, e))
}

/// Python wrapper for the lending market orchestrator
///
/// # Example (from Python)
///
/// ```python
/// from lending_simulator_core_rs import LendingMarket
///
/// market = LendingMarket({"mechanism": "pooled", "reputation_sensitivity": 0.5})
/// for _ in range(365):
///     result = market.tick()
/// print(market.metrics()["utilization"])
/// ```
#[pyclass(name = "LendingMarket")]
pub struct PyLendingMarket {
    inner: Orchestrator,
}

#[pymethods]
impl PyLendingMarket {
    /// Create a new market from a configuration dict
    ///
    /// Raises ValueError on malformed fields and RuntimeError when the
    /// configuration is rejected.
    #[new]
    fn new(config: &Bound<'_, PyDict>) -> PyResult<Self> {
        let rust_config = parse_market_config(config)?;
        let inner = Orchestrator::new(rust_config)
            .map_err(|e| runtime_error("Failed to create market", e))?;
        Ok(Self { inner })
    }

    /// Execute one simulation tick, returning the tick result dict
    fn tick(&mut self, py: Python) -> PyResult<Py<PyDict>> {
        let result = self
            .inner
            .tick()
            .map_err(|e| runtime_error("Tick execution failed", e))?;
        tick_result_to_py(py, &result)
    }

    fn current_tick(&self) -> usize {
        self.inner.current_tick()
    }

    fn run_id(&self) -> String {
        self.inner.run_id().to_string()
    }

    // ========================================================================
    // Reporters
    // ========================================================================

    fn liquidity(&self) -> f64 {
        self.inner.liquidity()
    }

    fn total_borrowed(&self) -> f64 {
        self.inner.total_borrowed()
    }

    fn utilization(&self) -> f64 {
        self.inner.utilization()
    }

    fn current_interest_rate(&self) -> f64 {
        self.inner.current_interest_rate()
    }

    fn total_liquidations(&self) -> usize {
        self.inner.total_liquidations()
    }

    fn average_reputation(&self) -> f64 {
        self.inner.average_reputation()
    }

    fn average_collateral_ratio(&self) -> f64 {
        self.inner.average_collateral_ratio()
    }

    fn metrics(&self, py: Python) -> PyResult<Py<PyDict>> {
        Ok(metrics_to_py(py, &self.inner.metrics())?.unbind())
    }

    fn borrower_metrics(&self, py: Python) -> PyResult<Py<PyList>> {
        borrower_metrics_to_py(py, &self.inner.borrower_metrics())
    }

    /// Event log as a JSON array string
    fn events_json(&self) -> PyResult<String> {
        self.inner
            .event_log()
            .to_json()
            .map_err(|e| runtime_error("Event serialization failed", e))
    }

    // ========================================================================
    // Checkpointing
    // ========================================================================

    fn save_state(&self) -> PyResult<String> {
        self.inner
            .save_state()
            .map_err(|e| runtime_error("Failed to save state", e))
    }

    /// Restore a market from `save_state()` output and its original config
    #[staticmethod]
    fn load_state(config: &Bound<'_, PyDict>, state_json: &str) -> PyResult<Self> {
        let rust_config = parse_market_config(config)?;
        let inner = Orchestrator::load_state(rust_config, state_json)
            .map_err(|e| runtime_error("Failed to load state", e))?;
        Ok(Self { inner })
    }
}
