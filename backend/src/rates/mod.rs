//! Interest Rate Models
//!
//! Maps platform utilization to a borrowing rate. Two curves exist, one per
//! market mechanism:
//!
//! - **Two-slope** (auction market): linear below the target utilization,
//!   steeper above it. Continuous at the kink.
//! - **Pooled** (reputation-weighted pool): `base · (1 + U·k)` where `k` is 1
//!   for the control market and 3 when reputation effects are enabled.
//!
//! The pooled market also runs a slow feedback loop ([`RateController`]) that
//! nudges its base rate toward a utilization target every tick.
//!
//! # Example
//!
//! ```rust
//! use lending_simulator_core_rs::rates::{TwoSlopeCurve, utilization};
//!
//! let curve = TwoSlopeCurve::default();
//! let u = utilization(40_000_000.0, 50_000_000.0);
//! assert!((curve.rate(u) - (0.02 + 0.1 * 0.8)).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};

/// Utilization rate: borrowed / liquidity, defined as 0 for an empty pool
pub fn utilization(total_borrowed: f64, total_liquidity: f64) -> f64 {
    if total_liquidity <= 0.0 {
        return 0.0;
    }
    total_borrowed / total_liquidity
}

/// Two-slope utilization curve used by the auction market
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TwoSlopeCurve {
    pub base_rate: f64,
    pub target_utilization: f64,
    /// Slope below the target
    pub slope1: f64,
    /// Slope above the target
    pub slope2: f64,
}

impl Default for TwoSlopeCurve {
    fn default() -> Self {
        Self {
            base_rate: 0.02,
            target_utilization: 0.8,
            slope1: 0.1,
            slope2: 0.3,
        }
    }
}

impl TwoSlopeCurve {
    /// Rate at utilization `u`
    pub fn rate(&self, u: f64) -> f64 {
        if u < self.target_utilization {
            self.below_kink(u)
        } else {
            self.above_kink(u)
        }
    }

    /// Lower branch: `base + slope1·u`
    pub fn below_kink(&self, u: f64) -> f64 {
        self.base_rate + self.slope1 * u
    }

    /// Upper branch: `base + slope1·target + slope2·(u − target)`
    pub fn above_kink(&self, u: f64) -> f64 {
        self.base_rate
            + self.slope1 * self.target_utilization
            + self.slope2 * (u - self.target_utilization)
    }
}

/// Utilization multiplier of the pooled curve
///
/// Reputation-aware pools deliberately price utilization three times more
/// steeply than the control pool.
pub fn pooled_multiplier(reputation_sensitivity: f64) -> f64 {
    if reputation_sensitivity == 0.0 {
        1.0
    } else {
        3.0
    }
}

/// Pooled curve: `base · (1 + u·k)`
pub fn pooled_rate(base_interest_rate: f64, u: f64, reputation_sensitivity: f64) -> f64 {
    base_interest_rate * (1.0 + u * pooled_multiplier(reputation_sensitivity))
}

/// Direction of a controller adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateAdjustment {
    Lowered,
    Raised,
    Unchanged,
}

/// Feedback loop steering the pooled base rate toward a utilization target
///
/// Each call to [`RateController::adjust`] moves the base rate by 5% at most,
/// clamped to `[min_rate, max_rate]`. Utilization within ±`band` of the
/// target leaves the rate untouched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateController {
    pub target_utilization: f64,
    pub band: f64,
    pub step: f64,
    pub min_rate: f64,
    pub max_rate: f64,
}

impl RateController {
    /// Controller for a pool with the given reputation sensitivity
    ///
    /// Control pools aim for 50% utilization; reputation pools aim higher,
    /// at `0.6 + 0.1·sensitivity`.
    pub fn for_sensitivity(reputation_sensitivity: f64) -> Self {
        let target_utilization = if reputation_sensitivity == 0.0 {
            0.5
        } else {
            0.6 + reputation_sensitivity * 0.1
        };
        Self {
            target_utilization,
            band: 0.1,
            step: 0.05,
            min_rate: 0.01,
            max_rate: 0.10,
        }
    }

    /// Apply one adjustment step to `base_rate` given current utilization
    ///
    /// # Example
    /// ```
    /// use lending_simulator_core_rs::rates::{RateAdjustment, RateController};
    ///
    /// let controller = RateController::for_sensitivity(0.0);
    /// let mut base = 0.03;
    /// assert_eq!(controller.adjust(&mut base, 0.1), RateAdjustment::Lowered);
    /// assert!((base - 0.0285).abs() < 1e-12);
    /// ```
    pub fn adjust(&self, base_rate: &mut f64, u: f64) -> RateAdjustment {
        if u < self.target_utilization - self.band {
            *base_rate = (*base_rate * (1.0 - self.step)).max(self.min_rate);
            RateAdjustment::Lowered
        } else if u > self.target_utilization + self.band {
            *base_rate = (*base_rate * (1.0 + self.step)).min(self.max_rate);
            RateAdjustment::Raised
        } else {
            RateAdjustment::Unchanged
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utilization_empty_pool_is_zero() {
        assert_eq!(utilization(0.0, 0.0), 0.0);
        assert_eq!(utilization(100.0, 0.0), 0.0);
    }

    #[test]
    fn test_two_slope_kink_continuity() {
        let curve = TwoSlopeCurve::default();
        let expected = 0.02 + 0.1 * 0.8;
        assert!((curve.below_kink(0.8) - expected).abs() < 1e-12);
        assert!((curve.above_kink(0.8) - expected).abs() < 1e-12);
        assert!((curve.rate(0.8) - 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_two_slope_steeper_above_target() {
        let curve = TwoSlopeCurve::default();
        let below = curve.rate(0.7) - curve.rate(0.6);
        let above = curve.rate(0.95) - curve.rate(0.85);
        assert!(above > below);
    }

    #[test]
    fn test_pooled_rate_control_vs_reputation() {
        assert!((pooled_rate(0.03, 0.5, 0.0) - 0.045).abs() < 1e-12);
        assert!((pooled_rate(0.03, 0.5, 0.2) - 0.075).abs() < 1e-12);
    }

    #[test]
    fn test_controller_clamps() {
        let controller = RateController::for_sensitivity(0.2);
        let mut base = 0.0101;
        controller.adjust(&mut base, 0.0);
        assert_eq!(base, 0.01);

        let mut base = 0.099;
        controller.adjust(&mut base, 1.0);
        assert_eq!(base, 0.10);
    }

    #[test]
    fn test_controller_dead_band() {
        let controller = RateController::for_sensitivity(0.2);
        let mut base = 0.05;
        // target = 0.62, band ±0.1
        assert_eq!(controller.adjust(&mut base, 0.62), RateAdjustment::Unchanged);
        assert_eq!(base, 0.05);
    }
}
