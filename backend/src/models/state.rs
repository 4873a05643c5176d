//! Simulation State
//!
//! Represents the complete state of one market run: every borrower, every
//! lender and the shared market state.
//!
//! Agents are stored in creation order (iteration order is part of the
//! determinism contract) with id → index maps for lookups.
//!
//! # Critical Invariants
//!
//! 1. **Unique IDs**: each agent id appears exactly once
//! 2. **Borrowed bound**: `0 ≤ total_borrowed ≤ total_liquidity`
//! 3. **Terminal liquidation**: a liquidated borrower holds no debt

use crate::models::borrower::Borrower;
use crate::models::lender::Lender;
use crate::models::market::MarketState;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Reference to an agent by position, used for activation ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentRef {
    Borrower(usize),
    Lender(usize),
}

/// Complete simulation state
///
/// # Example
///
/// ```rust
/// use lending_simulator_core_rs::{Borrower, Lender, SimulationState};
/// use lending_simulator_core_rs::models::MarketState;
///
/// let market = MarketState::new_pooled(0.0, 0.03, 0.2, 0.75, 1.05, 365);
/// let state = SimulationState::new(
///     vec![Borrower::new_pooled("borrower_0000".to_string(), 1_000.0)],
///     vec![Lender::new_pooled("lender_0000".to_string(), 5_000.0)],
///     market,
/// );
/// assert_eq!(state.num_borrowers(), 1);
/// assert_eq!(state.num_lenders(), 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationState {
    borrowers: Vec<Borrower>,
    lenders: Vec<Lender>,
    market: MarketState,

    #[serde(skip)]
    borrower_index: HashMap<String, usize>,

    #[serde(skip)]
    lender_index: HashMap<String, usize>,
}

impl SimulationState {
    /// Create a new simulation state
    pub fn new(borrowers: Vec<Borrower>, lenders: Vec<Lender>, market: MarketState) -> Self {
        let mut state = Self {
            borrowers,
            lenders,
            market,
            borrower_index: HashMap::new(),
            lender_index: HashMap::new(),
        };
        state.rebuild_indexes();
        state
    }

    /// Rebuild id → index maps (after deserialization)
    pub fn rebuild_indexes(&mut self) {
        self.borrower_index = self
            .borrowers
            .iter()
            .enumerate()
            .map(|(i, b)| (b.id().to_string(), i))
            .collect();
        self.lender_index = self
            .lenders
            .iter()
            .enumerate()
            .map(|(i, l)| (l.id().to_string(), i))
            .collect();
    }

    // ========================================================================
    // Agent access
    // ========================================================================

    pub fn borrowers(&self) -> &[Borrower] {
        &self.borrowers
    }

    pub fn lenders(&self) -> &[Lender] {
        &self.lenders
    }

    pub fn borrowers_mut(&mut self) -> &mut [Borrower] {
        &mut self.borrowers
    }

    pub fn lenders_mut(&mut self) -> &mut [Lender] {
        &mut self.lenders
    }

    pub fn get_borrower(&self, id: &str) -> Option<&Borrower> {
        self.borrower_index.get(id).map(|&i| &self.borrowers[i])
    }

    pub fn get_borrower_mut(&mut self, id: &str) -> Option<&mut Borrower> {
        match self.borrower_index.get(id) {
            Some(&i) => Some(&mut self.borrowers[i]),
            None => None,
        }
    }

    pub fn get_lender(&self, id: &str) -> Option<&Lender> {
        self.lender_index.get(id).map(|&i| &self.lenders[i])
    }

    pub fn get_lender_mut(&mut self, id: &str) -> Option<&mut Lender> {
        match self.lender_index.get(id) {
            Some(&i) => Some(&mut self.lenders[i]),
            None => None,
        }
    }

    pub fn market(&self) -> &MarketState {
        &self.market
    }

    pub fn market_mut(&mut self) -> &mut MarketState {
        &mut self.market
    }

    /// Borrower and market borrowed together (agent activation)
    pub fn borrower_with_market(&mut self, index: usize) -> (&mut Borrower, &mut MarketState) {
        (&mut self.borrowers[index], &mut self.market)
    }

    /// Lender and market borrowed together (agent activation)
    pub fn lender_with_market(&mut self, index: usize) -> (&mut Lender, &mut MarketState) {
        (&mut self.lenders[index], &mut self.market)
    }

    /// All agents in creation order
    ///
    /// `lenders_first` reproduces the pooled market's creation order (lenders
    /// are created first so their initial supply seeds the pool).
    pub fn agent_refs(&self, lenders_first: bool) -> Vec<AgentRef> {
        let borrowers = (0..self.borrowers.len()).map(AgentRef::Borrower);
        let lenders = (0..self.lenders.len()).map(AgentRef::Lender);
        if lenders_first {
            lenders.chain(borrowers).collect()
        } else {
            borrowers.chain(lenders).collect()
        }
    }

    pub fn num_borrowers(&self) -> usize {
        self.borrowers.len()
    }

    pub fn num_lenders(&self) -> usize {
        self.lenders.len()
    }

    // ========================================================================
    // Aggregate reporters
    // ========================================================================

    /// Mean reputation of non-liquidated borrowers (0 if none)
    pub fn average_reputation(&self) -> f64 {
        let scores: Vec<f64> = self
            .borrowers
            .iter()
            .filter(|b| !b.is_liquidated())
            .map(|b| b.reputation())
            .collect();
        mean(&scores)
    }

    /// Mean collateral ratio of borrowers with debt (0 if none)
    pub fn average_collateral_ratio(&self) -> f64 {
        let ratios: Vec<f64> = self
            .borrowers
            .iter()
            .filter(|b| b.has_debt())
            .map(|b| b.collateral_ratio())
            .collect();
        mean(&ratios)
    }

    /// Borrowers currently holding debt
    pub fn active_borrowers(&self) -> usize {
        self.borrowers.iter().filter(|b| b.has_debt()).count()
    }

    pub fn liquidated_borrowers(&self) -> usize {
        self.borrowers.iter().filter(|b| b.is_liquidated()).count()
    }

    /// Sum of individual borrower debts
    pub fn total_borrower_debt(&self) -> f64 {
        self.borrowers.iter().map(|b| b.borrowed_amount()).sum()
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
