//! Orchestrator Engine
//!
//! Main simulation loop integrating all components:
//! - Agent activation (random permutation per tick)
//! - Agent policies (requests, bids, borrows, repayments, supply)
//! - Settlement (auction matching or immediate pool settlement)
//! - Passive effects (repayment drift, rate control)
//! - Event logging (complete simulation history)
//!
//! # Architecture
//!
//! ```text
//! For each tick t:
//! 1. Redraw market volatility              (auction market)
//! 2. Shuffle the agent activation order
//! 3. Step every agent in that order
//! 4. Match requests against bids           (auction market)
//! 5. Apply passive repayment drift         (auction market)
//! 6. Record market metrics
//! 7. Run the base-rate controller          (pooled market)
//! 8. Advance time
//! ```
//!
//! # Example
//!
//! ```rust
//! use lending_simulator_core_rs::orchestrator::{MarketConfig, Orchestrator};
//!
//! let mut config = MarketConfig::pooled(0.2);
//! config.rng_seed = 12345;
//!
//! let mut orchestrator = Orchestrator::new(config).unwrap();
//!
//! for _ in 0..30 {
//!     let result = orchestrator.tick().unwrap();
//!     assert!(result.metrics.total_borrowed <= result.metrics.liquidity + 1e-6);
//! }
//! assert_eq!(orchestrator.current_tick(), 30);
//! ```

use crate::core::time::TimeManager;
use crate::models::borrower::{Borrower, CreditRating};
use crate::models::event::{Event, EventLog};
use crate::models::lender::Lender;
use crate::models::market::MarketState;
use crate::models::state::{AgentRef, SimulationState};
use crate::orchestrator::checkpoint::{compute_config_hash, validate_snapshot, StateSnapshot};
use crate::policy::{MarketParticipant, StepContext, StepOutcome};
use crate::rates::{RateAdjustment, RateController, TwoSlopeCurve};
use crate::rng::RngManager;
use crate::settlement::{self, SettlementError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Configuration Types
// ============================================================================

/// Auction market parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuctionConfig {
    /// Platform liquidity at tick 0
    pub initial_liquidity: f64,

    /// Rate at zero utilization; also the lower bound of lender rate windows
    pub base_rate: f64,

    /// Kink of the two-slope curve
    pub target_utilization: f64,

    /// Slope below the kink
    pub slope1: f64,

    /// Slope above the kink
    pub slope2: f64,

    /// Health-factor multiplier
    pub liquidation_threshold: f64,
}

impl Default for AuctionConfig {
    fn default() -> Self {
        Self {
            initial_liquidity: 50e6,
            base_rate: 0.02,
            target_utilization: 0.8,
            slope1: 0.1,
            slope2: 0.3,
            liquidation_threshold: 1.0,
        }
    }
}

impl AuctionConfig {
    pub fn curve(&self) -> TwoSlopeCurve {
        TwoSlopeCurve {
            base_rate: self.base_rate,
            target_utilization: self.target_utilization,
            slope1: self.slope1,
            slope2: self.slope2,
        }
    }
}

/// Pooled (reputation-weighted) market parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Liquidity seeded before lenders supply (normally 0)
    pub initial_liquidity: f64,

    /// Starting base rate; the controller moves it afterwards
    pub base_interest_rate: f64,

    pub base_collateral_factor: f64,

    /// 0 selects the control configuration
    pub reputation_sensitivity: f64,

    /// Base liquidation threshold before the reputation adjustment
    pub liquidation_threshold: f64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_liquidity: 0.0,
            base_interest_rate: 0.03,
            base_collateral_factor: 0.75,
            reputation_sensitivity: 0.2,
            liquidation_threshold: 1.05,
        }
    }
}

/// Market mechanism selector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarketMechanism {
    Auction(AuctionConfig),
    Pooled(PoolConfig),
}

/// Complete simulation configuration
///
/// # Example
///
/// ```rust
/// use lending_simulator_core_rs::orchestrator::{MarketConfig, MarketMechanism};
///
/// let json = r#"{
///     "num_borrowers": 10,
///     "num_lenders": 5,
///     "rng_seed": 7,
///     "mechanism": { "type": "pooled", "reputation_sensitivity": 0.0 }
/// }"#;
/// let config = MarketConfig::from_json(json).unwrap();
/// assert_eq!(config.ticks_per_year, 365);
/// match config.mechanism {
///     MarketMechanism::Pooled(pool) => assert_eq!(pool.base_collateral_factor, 0.75),
///     MarketMechanism::Auction(_) => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketConfig {
    pub num_borrowers: usize,
    pub num_lenders: usize,

    /// RNG seed for deterministic simulation
    pub rng_seed: u64,

    /// Interest accrual convention (one tick = one day)
    #[serde(default = "default_ticks_per_year")]
    pub ticks_per_year: usize,

    pub mechanism: MarketMechanism,
}

fn default_ticks_per_year() -> usize {
    365
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self::auction()
    }
}

impl MarketConfig {
    /// Auction market with 1000 borrowers and 200 lenders
    pub fn auction() -> Self {
        Self {
            num_borrowers: 1000,
            num_lenders: 200,
            rng_seed: 42,
            ticks_per_year: default_ticks_per_year(),
            mechanism: MarketMechanism::Auction(AuctionConfig::default()),
        }
    }

    /// Pooled market with 100 borrowers and 50 lenders
    ///
    /// `reputation_sensitivity == 0.0` gives the control configuration.
    pub fn pooled(reputation_sensitivity: f64) -> Self {
        Self {
            num_borrowers: 100,
            num_lenders: 50,
            rng_seed: 42,
            ticks_per_year: default_ticks_per_year(),
            mechanism: MarketMechanism::Pooled(PoolConfig {
                reputation_sensitivity,
                ..PoolConfig::default()
            }),
        }
    }

    /// Parse a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, SimulationError> {
        serde_json::from_str(json).map_err(|e| {
            SimulationError::SerializationError(format!("Config parse failed: {}", e))
        })
    }

    pub fn is_auction(&self) -> bool {
        matches!(self.mechanism, MarketMechanism::Auction(_))
    }

    /// Check every parameter against its domain
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.ticks_per_year == 0 {
            return Err(invalid("ticks_per_year must be > 0"));
        }

        match &self.mechanism {
            MarketMechanism::Auction(auction) => {
                non_negative("initial_liquidity", auction.initial_liquidity)?;
                non_negative("base_rate", auction.base_rate)?;
                non_negative("slope1", auction.slope1)?;
                non_negative("slope2", auction.slope2)?;
                unit_interval("target_utilization", auction.target_utilization)?;
                positive("liquidation_threshold", auction.liquidation_threshold)?;
            }
            MarketMechanism::Pooled(pool) => {
                non_negative("initial_liquidity", pool.initial_liquidity)?;
                non_negative("base_interest_rate", pool.base_interest_rate)?;
                non_negative("reputation_sensitivity", pool.reputation_sensitivity)?;
                unit_interval("base_collateral_factor", pool.base_collateral_factor)?;
                positive("liquidation_threshold", pool.liquidation_threshold)?;
            }
        }

        Ok(())
    }
}

fn invalid(msg: &str) -> SimulationError {
    SimulationError::InvalidConfig(msg.to_string())
}

fn non_negative(name: &str, value: f64) -> Result<(), SimulationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(SimulationError::InvalidConfig(format!(
            "{} must be finite and >= 0, got {}",
            name, value
        )));
    }
    Ok(())
}

fn positive(name: &str, value: f64) -> Result<(), SimulationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(SimulationError::InvalidConfig(format!(
            "{} must be finite and > 0, got {}",
            name, value
        )));
    }
    Ok(())
}

fn unit_interval(name: &str, value: f64) -> Result<(), SimulationError> {
    if !(value > 0.0 && value <= 1.0) {
        return Err(SimulationError::InvalidConfig(format!(
            "{} must be in (0, 1], got {}",
            name, value
        )));
    }
    Ok(())
}

// ============================================================================
// Results & Errors
// ============================================================================

/// Market-level reporters at one point in time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketMetrics {
    pub liquidity: f64,
    pub total_borrowed: f64,
    pub utilization: f64,
    pub current_interest_rate: f64,
    pub base_rate: f64,
    pub total_liquidations: usize,

    /// Mean reputation of non-liquidated borrowers (0 if none)
    pub average_reputation: f64,

    /// Mean collateral ratio of borrowers with debt (0 if none)
    pub average_collateral_ratio: f64,

    pub active_borrowers: usize,
    pub liquidated_borrowers: usize,
    pub cumulative_interest: f64,
    pub volatility: f64,
}

/// Per-borrower reporters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorrowerMetrics {
    pub id: String,
    pub reputation: f64,
    pub borrowed_amount: f64,
    pub collateral: f64,
    pub is_liquidated: bool,
}

/// Result of a single tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickResult {
    /// Tick number
    pub tick: usize,

    /// Auction requests posted this tick
    pub num_requests: usize,

    /// Auction bids submitted this tick
    pub num_bids: usize,

    /// Auction requests funded this tick
    pub num_matched: usize,

    /// Principal funded at auction this tick
    pub matched_volume: f64,

    /// Pool borrows that went through
    pub num_borrows: usize,

    /// Pool borrows the pool could not cover
    pub num_rejected_borrows: usize,

    pub num_repayments: usize,
    pub num_failed_repayments: usize,
    pub num_liquidations: usize,

    /// Reporters after settlement, before the rate controller
    pub metrics: MarketMetrics,
}

impl TickResult {
    fn record(&mut self, outcome: StepOutcome) {
        match outcome {
            StepOutcome::Requested => self.num_requests += 1,
            StepOutcome::Bid(n) => self.num_bids += n,
            StepOutcome::Borrowed(_) => self.num_borrows += 1,
            StepOutcome::BorrowRejected => self.num_rejected_borrows += 1,
            StepOutcome::Repaid(_) => self.num_repayments += 1,
            StepOutcome::RepaymentFailed => self.num_failed_repayments += 1,
            StepOutcome::Liquidated => self.num_liquidations += 1,
            StepOutcome::Idle | StepOutcome::Supplied(_) | StepOutcome::Withdrew(_) => {}
        }
    }
}

/// Simulation error types
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Borrower not found: {0}")]
    BorrowerNotFound(String),

    #[error("Lender not found: {0}")]
    LenderNotFound(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("State validation error: {0}")]
    StateValidationError(String),

    #[error("Settlement error: {0}")]
    Settlement(#[from] SettlementError),
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Main orchestrator managing simulation state and the tick loop
///
/// # Determinism
///
/// All randomness is drawn from `rng_manager` (seeded xorshift64*).
/// Same seed + same config = identical tick-by-tick results. The `run_id`
/// is metadata and never feeds the simulation.
#[derive(Debug)]
pub struct Orchestrator {
    config: MarketConfig,

    /// Simulation state (borrowers, lenders, market)
    state: SimulationState,

    time_manager: TimeManager,

    /// Deterministic RNG
    rng_manager: RngManager,

    /// Base-rate feedback loop (pooled market only)
    rate_controller: Option<RateController>,

    /// Event log (all simulation events)
    event_log: EventLog,

    run_id: Uuid,
    config_hash: String,
}

impl Orchestrator {
    /// Create new orchestrator from configuration
    ///
    /// Samples every agent from the seeded stream. Pooled-market lenders
    /// are created first and supply 70% of their capital to the pool.
    ///
    /// # Errors
    ///
    /// `SimulationError::InvalidConfig` when a parameter is out of range.
    pub fn new(config: MarketConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let config_hash = compute_config_hash(&config)?;
        let mut rng_manager = RngManager::new(config.rng_seed);

        let (state, rate_controller) = match &config.mechanism {
            MarketMechanism::Auction(auction) => {
                (Self::init_auction(&config, auction, &mut rng_manager), None)
            }
            MarketMechanism::Pooled(pool) => (
                Self::init_pooled(&config, pool, &mut rng_manager)?,
                Some(RateController::for_sensitivity(pool.reputation_sensitivity)),
            ),
        };

        Ok(Self {
            time_manager: TimeManager::new(config.ticks_per_year),
            config,
            state,
            rng_manager,
            rate_controller,
            event_log: EventLog::new(),
            run_id: Uuid::new_v4(),
            config_hash,
        })
    }

    fn init_auction(
        config: &MarketConfig,
        auction: &AuctionConfig,
        rng: &mut RngManager,
    ) -> SimulationState {
        let borrowers = (0..config.num_borrowers)
            .map(|i| {
                let rating = CreditRating::for_population_index(i, config.num_borrowers);
                let (collateral, reputation, income) = rating.attribute_ranges();
                let collateral = rng.uniform(collateral.0, collateral.1);
                let reputation = rng.uniform(reputation.0, reputation.1);
                let income = rng.uniform(income.0, income.1);
                Borrower::new_auction(borrower_id(i), rating, collateral, reputation, income)
            })
            .collect();

        let lenders = (0..config.num_lenders)
            .map(|i| {
                let risk_tolerance = rng.uniform(0.0, 1.0);
                let balance = rng.uniform(100_000.0, 500_000.0);
                Lender::new_auction(lender_id(i), balance, risk_tolerance, auction.base_rate)
            })
            .collect();

        let market = MarketState::new_auction(
            auction.initial_liquidity,
            auction.curve(),
            auction.liquidation_threshold,
            config.ticks_per_year,
        );

        SimulationState::new(borrowers, lenders, market)
    }

    fn init_pooled(
        config: &MarketConfig,
        pool: &PoolConfig,
        rng: &mut RngManager,
    ) -> Result<SimulationState, SimulationError> {
        let mut market = MarketState::new_pooled(
            pool.initial_liquidity,
            pool.base_interest_rate,
            pool.reputation_sensitivity,
            pool.base_collateral_factor,
            pool.liquidation_threshold,
            config.ticks_per_year,
        );

        let mut lenders = Vec::with_capacity(config.num_lenders);
        for i in 0..config.num_lenders {
            let mut lender = Lender::new_pooled(lender_id(i), rng.uniform(1_000.0, 10_000.0));
            let supplied = lender.supply(lender.capital() * 0.7);
            settlement::add_liquidity(&mut market, supplied)?;
            lenders.push(lender);
        }

        let borrowers = (0..config.num_borrowers)
            .map(|i| Borrower::new_pooled(borrower_id(i), rng.uniform(500.0, 5_000.0)))
            .collect();

        Ok(SimulationState::new(borrowers, lenders, market))
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Get current tick number
    pub fn current_tick(&self) -> usize {
        self.time_manager.current_tick()
    }

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    /// Get reference to simulation state
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Get mutable reference to simulation state
    ///
    /// Primarily for scenario setup in tests. Direct mutation bypasses the
    /// settlement invariants.
    pub fn state_mut(&mut self) -> &mut SimulationState {
        &mut self.state
    }

    /// Get reference to event log
    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    /// Get total events logged
    pub fn event_count(&self) -> usize {
        self.event_log.len()
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn rng_state(&self) -> u64 {
        self.rng_manager.get_state()
    }

    pub fn get_borrower(&self, id: &str) -> Result<&Borrower, SimulationError> {
        self.state
            .get_borrower(id)
            .ok_or_else(|| SimulationError::BorrowerNotFound(id.to_string()))
    }

    pub fn get_lender(&self, id: &str) -> Result<&Lender, SimulationError> {
        self.state
            .get_lender(id)
            .ok_or_else(|| SimulationError::LenderNotFound(id.to_string()))
    }

    // ========================================================================
    // Reporters
    // ========================================================================

    pub fn liquidity(&self) -> f64 {
        self.state.market().liquidity()
    }

    pub fn total_borrowed(&self) -> f64 {
        self.state.market().total_borrowed()
    }

    pub fn utilization(&self) -> f64 {
        self.state.market().utilization()
    }

    pub fn current_interest_rate(&self) -> f64 {
        self.state.market().current_interest_rate()
    }

    pub fn total_liquidations(&self) -> usize {
        self.state.market().total_liquidations()
    }

    pub fn average_reputation(&self) -> f64 {
        self.state.average_reputation()
    }

    pub fn average_collateral_ratio(&self) -> f64 {
        self.state.average_collateral_ratio()
    }

    /// Bundle of market-level reporters
    pub fn metrics(&self) -> MarketMetrics {
        let market = self.state.market();
        MarketMetrics {
            liquidity: market.liquidity(),
            total_borrowed: market.total_borrowed(),
            utilization: market.utilization(),
            current_interest_rate: market.current_interest_rate(),
            base_rate: market.base_rate(),
            total_liquidations: market.total_liquidations(),
            average_reputation: self.state.average_reputation(),
            average_collateral_ratio: self.state.average_collateral_ratio(),
            active_borrowers: self.state.active_borrowers(),
            liquidated_borrowers: self.state.liquidated_borrowers(),
            cumulative_interest: market.cumulative_interest(),
            volatility: market.volatility(),
        }
    }

    /// Per-borrower reporters in creation order
    pub fn borrower_metrics(&self) -> Vec<BorrowerMetrics> {
        self.state
            .borrowers()
            .iter()
            .map(|b| BorrowerMetrics {
                id: b.id().to_string(),
                reputation: b.reputation(),
                borrowed_amount: b.borrowed_amount(),
                collateral: b.collateral(),
                is_liquidated: b.is_liquidated(),
            })
            .collect()
    }

    // ========================================================================
    // Tick Loop Implementation
    // ========================================================================

    /// Execute one simulation tick
    ///
    /// # Returns
    ///
    /// * `Ok(TickResult)` - Tick executed successfully
    /// * `Err(SimulationError)` - Settlement found the state inconsistent
    pub fn tick(&mut self) -> Result<TickResult, SimulationError> {
        let tick = self.current_tick();
        let is_auction = self.config.is_auction();
        let mut result = TickResult {
            tick,
            ..Default::default()
        };

        // STEP 1: MARKET VOLATILITY
        if is_auction {
            let volatility = self.rng_manager.uniform(0.05, 0.2);
            self.state.market_mut().set_volatility(volatility);
        }

        // STEP 2: ACTIVATION ORDER
        let mut order = self.state.agent_refs(!is_auction);
        self.rng_manager.shuffle(&mut order);

        // STEP 3: AGENT STEPS
        for agent in order {
            let outcome = match agent {
                AgentRef::Borrower(index) => {
                    let (borrower, market) = self.state.borrower_with_market(index);
                    let mut ctx = StepContext {
                        market,
                        rng: &mut self.rng_manager,
                        events: &mut self.event_log,
                        tick,
                    };
                    borrower.step(&mut ctx)?
                }
                AgentRef::Lender(index) => {
                    let (lender, market) = self.state.lender_with_market(index);
                    let mut ctx = StepContext {
                        market,
                        rng: &mut self.rng_manager,
                        events: &mut self.event_log,
                        tick,
                    };
                    lender.step(&mut ctx)?
                }
            };
            result.record(outcome);
        }

        // STEP 4-5: AUCTION SETTLEMENT + PASSIVE REPAYMENT
        if is_auction {
            let auction = settlement::run_auction(&mut self.state, tick, &mut self.event_log);
            result.num_matched = auction.num_matched;
            result.matched_volume = auction.matched_volume;

            let market = self.state.market_mut();
            let volatility = market.volatility();
            let amount = settlement::apply_repayment_drift(market);
            self.event_log.log(Event::PassiveRepayment {
                tick,
                amount,
                volatility,
            });
        }

        // STEP 6: METRICS
        result.metrics = self.metrics();

        // STEP 7: RATE CONTROL
        self.adjust_base_rate(tick);

        // STEP 8: ADVANCE TIME
        self.time_manager.advance_tick();

        Ok(result)
    }

    /// Run `num_ticks` ticks, collecting every result
    pub fn run(&mut self, num_ticks: usize) -> Result<Vec<TickResult>, SimulationError> {
        (0..num_ticks).map(|_| self.tick()).collect()
    }

    fn adjust_base_rate(&mut self, tick: usize) {
        let Some(controller) = self.rate_controller else {
            return;
        };
        let market = self.state.market_mut();
        let utilization = market.utilization();
        let Some(base_rate) = market.pooled_base_rate_mut() else {
            return;
        };

        let old_rate = *base_rate;
        let direction = controller.adjust(base_rate, utilization);
        let new_rate = *base_rate;

        if direction != RateAdjustment::Unchanged {
            self.event_log.log(Event::RateAdjusted {
                tick,
                direction,
                old_rate,
                new_rate,
                utilization,
            });
        }
    }

    // ========================================================================
    // Checkpointing
    // ========================================================================

    /// Serialize the complete run state to JSON
    ///
    /// The event log is not part of the checkpoint.
    pub fn save_state(&self) -> Result<String, SimulationError> {
        let snapshot = StateSnapshot {
            current_tick: self.current_tick(),
            rng_state: self.rng_manager.get_state(),
            run_id: self.run_id.to_string(),
            state: self.state.clone(),
            config_hash: self.config_hash.clone(),
        };
        serde_json::to_string(&snapshot).map_err(|e| {
            SimulationError::SerializationError(format!("Snapshot serialization failed: {}", e))
        })
    }

    /// Restore a run saved by [`Orchestrator::save_state`]
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` if `config` is invalid or differs from the one
    ///   the checkpoint was taken with
    /// - `SerializationError` if `json` does not parse
    /// - `StateValidationError` if the snapshot breaks a market invariant
    pub fn load_state(config: MarketConfig, json: &str) -> Result<Self, SimulationError> {
        config.validate()?;
        let snapshot: StateSnapshot = serde_json::from_str(json).map_err(|e| {
            SimulationError::SerializationError(format!("Snapshot parse failed: {}", e))
        })?;

        let config_hash = compute_config_hash(&config)?;
        if snapshot.config_hash != config_hash {
            return Err(SimulationError::InvalidConfig(
                "Config hash mismatch: checkpoint was taken with a different config".to_string(),
            ));
        }

        validate_snapshot(&snapshot)?;

        let run_id = Uuid::parse_str(&snapshot.run_id).map_err(|e| {
            SimulationError::SerializationError(format!("Invalid run id: {}", e))
        })?;

        let mut state = snapshot.state;
        state.rebuild_indexes();

        let rate_controller = match &config.mechanism {
            MarketMechanism::Auction(_) => None,
            MarketMechanism::Pooled(pool) => {
                Some(RateController::for_sensitivity(pool.reputation_sensitivity))
            }
        };

        Ok(Self {
            time_manager: TimeManager::at_tick(config.ticks_per_year, snapshot.current_tick),
            config,
            state,
            rng_manager: RngManager::new(snapshot.rng_state),
            rate_controller,
            event_log: EventLog::new(),
            run_id,
            config_hash,
        })
    }
}

fn borrower_id(index: usize) -> String {
    format!("borrower_{:04}", index)
}

fn lender_id(index: usize) -> String {
    format!("lender_{:04}", index)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn small_pooled(sensitivity: f64) -> MarketConfig {
        let mut config = MarketConfig::pooled(sensitivity);
        config.num_borrowers = 20;
        config.num_lenders = 10;
        config
    }

    fn small_auction() -> MarketConfig {
        let mut config = MarketConfig::auction();
        config.num_borrowers = 50;
        config.num_lenders = 10;
        config
    }

    #[test]
    fn test_default_is_auction() {
        assert!(MarketConfig::default().is_auction());
    }

    #[test]
    fn test_rejects_zero_ticks_per_year() {
        let mut config = small_pooled(0.2);
        config.ticks_per_year = 0;
        assert!(matches!(
            Orchestrator::new(config),
            Err(SimulationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_target_utilization_out_of_range() {
        let mut config = small_auction();
        if let MarketMechanism::Auction(auction) = &mut config.mechanism {
            auction.target_utilization = 1.2;
        }
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_nan_collateral_factor() {
        let mut config = small_pooled(0.2);
        if let MarketMechanism::Pooled(pool) = &mut config.mechanism {
            pool.base_collateral_factor = f64::NAN;
        }
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pooled_lenders_seed_liquidity() {
        let orchestrator = Orchestrator::new(small_pooled(0.2)).unwrap();
        let supplied: f64 = orchestrator
            .state()
            .lenders()
            .iter()
            .map(|l| l.supplied_amount())
            .sum();
        assert!((orchestrator.liquidity() - supplied).abs() < 1e-6);
        for lender in orchestrator.state().lenders() {
            let total = lender.capital() + lender.supplied_amount();
            assert!((lender.supplied_amount() - 0.7 * total).abs() < 1e-6);
        }
    }

    #[test]
    fn test_agent_ids_zero_padded() {
        let orchestrator = Orchestrator::new(small_auction()).unwrap();
        assert!(orchestrator.get_borrower("borrower_0000").is_ok());
        assert!(orchestrator.get_lender("lender_0009").is_ok());
        assert_eq!(
            orchestrator.get_lender("lender_0010").unwrap_err(),
            SimulationError::LenderNotFound("lender_0010".to_string())
        );
    }

    #[test]
    fn test_auction_tick_drains_buffers() {
        let mut orchestrator = Orchestrator::new(small_auction()).unwrap();
        for _ in 0..5 {
            orchestrator.tick().unwrap();
            assert!(orchestrator.state().market().pending_requests().is_empty());
            assert!(orchestrator.state().market().pending_bids().is_empty());
            assert!(orchestrator
                .state()
                .borrowers()
                .iter()
                .all(|b| b.pending_request().is_none()));
        }
    }

    #[test]
    fn test_auction_volatility_in_range() {
        let mut orchestrator = Orchestrator::new(small_auction()).unwrap();
        for _ in 0..20 {
            let result = orchestrator.tick().unwrap();
            assert!((0.05..0.2).contains(&result.metrics.volatility));
        }
    }

    #[test]
    fn test_tick_advances_time() {
        let mut orchestrator = Orchestrator::new(small_pooled(0.0)).unwrap();
        let results = orchestrator.run(3).unwrap();
        assert_eq!(results.iter().map(|r| r.tick).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(orchestrator.current_tick(), 3);
    }

    #[test]
    fn test_rate_controller_logs_adjustments() {
        // Pool starts idle (U = 0), far below every target: the base rate falls
        let mut orchestrator = Orchestrator::new(small_pooled(0.2)).unwrap();
        let before = orchestrator.state().market().base_rate();
        orchestrator.tick().unwrap();
        assert!(orchestrator.state().market().base_rate() < before);
        assert_eq!(orchestrator.event_log().events_of_type("RateAdjusted").len(), 1);
    }
}
