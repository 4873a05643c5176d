//! Time management for the simulation
//!
//! The market advances in discrete ticks; one tick is one day. Annual
//! interest rates are converted to per-tick accruals with `ticks_per_year`.

use serde::{Deserialize, Serialize};

/// Manages simulation time in discrete ticks
///
/// # Example
/// ```
/// use lending_simulator_core_rs::TimeManager;
///
/// let mut time = TimeManager::new(365);
/// assert_eq!(time.current_tick(), 0);
///
/// time.advance_tick();
/// assert_eq!(time.current_tick(), 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeManager {
    /// Total ticks elapsed since simulation start
    current_tick: usize,
    /// Number of ticks in one year (interest accrual convention)
    ticks_per_year: usize,
}

impl TimeManager {
    /// Create a new TimeManager
    ///
    /// # Panics
    /// Panics if `ticks_per_year` is zero.
    pub fn new(ticks_per_year: usize) -> Self {
        assert!(ticks_per_year > 0, "ticks_per_year must be positive");
        Self {
            current_tick: 0,
            ticks_per_year,
        }
    }

    /// Restore a TimeManager at a given tick (checkpoint restore)
    pub fn at_tick(ticks_per_year: usize, current_tick: usize) -> Self {
        let mut time = Self::new(ticks_per_year);
        time.current_tick = current_tick;
        time
    }

    /// Advance time by one tick
    pub fn advance_tick(&mut self) {
        self.current_tick += 1;
    }

    /// Get the current tick (total ticks since start)
    pub fn current_tick(&self) -> usize {
        self.current_tick
    }

    /// Get the current year (0-indexed)
    ///
    /// # Example
    /// ```
    /// use lending_simulator_core_rs::TimeManager;
    ///
    /// let mut time = TimeManager::new(10);
    /// for _ in 0..25 {
    ///     time.advance_tick();
    /// }
    /// assert_eq!(time.current_year(), 2);
    /// ```
    pub fn current_year(&self) -> usize {
        self.current_tick / self.ticks_per_year
    }

    /// Get ticks per year
    pub fn ticks_per_year(&self) -> usize {
        self.ticks_per_year
    }

    /// Convert an annual rate into the rate for a single tick
    ///
    /// # Example
    /// ```
    /// use lending_simulator_core_rs::TimeManager;
    ///
    /// let time = TimeManager::new(365);
    /// assert!((time.per_tick_rate(0.365) - 0.001).abs() < 1e-12);
    /// ```
    pub fn per_tick_rate(&self, annual_rate: f64) -> f64 {
        annual_rate / self.ticks_per_year as f64
    }
}
