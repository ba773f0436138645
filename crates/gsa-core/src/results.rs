//! Solved result fields attached to a network snapshot.
//!
//! A network is either unsolved (`results == None`) or solved, in which case
//! every table here is populated consistently with the topology at solve
//! time. Perturbing the topology clears the results, so a stale solution can
//! never be read against a changed network.

use serde::Serialize;

use crate::{BranchId, BusId, SourceRef};

/// Per-bus solved state.
#[derive(Debug, Clone, Serialize)]
pub struct BusResult {
    pub bus: BusId,
    pub vm_pu: f64,
    pub va_deg: f64,
}

/// Per-branch solved state. Out-of-service branches keep a row (all zeros,
/// `in_service == false`) so branch tables stay index-aligned.
#[derive(Debug, Clone, Serialize)]
pub struct BranchResult {
    pub branch: BranchId,
    pub in_service: bool,
    pub p_from_mw: f64,
    pub q_from_mvar: f64,
    pub p_to_mw: f64,
    pub q_to_mvar: f64,
    /// Active-power loss on the branch
    pub pl_mw: f64,
    /// Apparent power as a percentage of the thermal rating (0 when unrated)
    pub loading_percent: f64,
}

/// Per-source solved output, covering all three generation categories.
#[derive(Debug, Clone, Serialize)]
pub struct SourceResult {
    pub source: SourceRef,
    pub name: String,
    pub p_mw: f64,
    pub q_mvar: f64,
}

/// Full solved state of a snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct SolvedState {
    pub bus: Vec<BusResult>,
    pub branch: Vec<BranchResult>,
    pub sources: Vec<SourceResult>,
    /// Newton iterations of the final (inner) solve
    pub iterations: usize,
    /// Largest power mismatch at termination, per unit
    pub max_mismatch_pu: f64,
}

impl SolvedState {
    /// Voltage magnitudes in bus-table order.
    pub fn bus_voltages(&self) -> Vec<f64> {
        self.bus.iter().map(|b| b.vm_pu).collect()
    }

    /// Loading percentages for in-service branches, in branch-table order.
    pub fn branch_loadings(&self) -> Vec<f64> {
        self.branch
            .iter()
            .filter(|b| b.in_service)
            .map(|b| b.loading_percent)
            .collect()
    }

    /// Total active-power loss across in-service branches.
    pub fn total_losses_mw(&self) -> f64 {
        self.branch
            .iter()
            .filter(|b| b.in_service)
            .map(|b| b.pl_mw)
            .sum()
    }

    /// Total active output summed over every generation-source category.
    pub fn total_generation_mw(&self) -> f64 {
        self.sources.iter().map(|s| s.p_mw).sum()
    }

    pub fn source_result(&self, source: SourceRef) -> Option<&SourceResult> {
        self.sources.iter().find(|s| s.source == source)
    }
}
