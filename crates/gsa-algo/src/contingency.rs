//! N-1 contingency screening.
//!
//! Quantifies single-outage security: every branch of the base snapshot is
//! taken out of service in its own deep copy, the perturbed copy is
//! re-solved (plain power flow or full dispatch), and the outcome is
//! classified into one report row. The enumeration never stops early and
//! never raises: a trial that fails to solve becomes a FAIL row, not an
//! error.
//!
//! Isolation is the correctness invariant here: each trial owns a full
//! clone of the base network, so no trial can observe another's topology
//! change and the base snapshot is never mutated. That same discipline is
//! what makes the optional parallel sweep safe; outcomes are aggregated in
//! branch-index order regardless of completion order.

use rayon::prelude::*;
use serde::Serialize;
use std::fmt;

use gsa_core::{BranchId, Network};

use crate::dispatch::{run_dispatch, OpfOptions};
use crate::pf::{run_power_flow, PfOptions};
use crate::violations::ViolationSummary;

/// How each perturbed copy is re-solved.
#[derive(Debug, Clone)]
pub enum Resolve {
    /// Plain AC power flow with the base-case setpoints
    PowerFlow(PfOptions),
    /// Full constrained dispatch (the snapshot must carry a cost table)
    Dispatch(OpfOptions),
}

impl Default for Resolve {
    fn default() -> Self {
        Resolve::PowerFlow(PfOptions::default())
    }
}

/// Contingency engine configuration.
#[derive(Debug, Clone, Default)]
pub struct N1Options {
    pub resolve: Resolve,
    /// Evaluate trials concurrently. Each trial still owns its clone;
    /// the report order is branch-index order either way.
    pub parallel: bool,
}

impl N1Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resolve(mut self, resolve: Resolve) -> Self {
        self.resolve = resolve;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Pass/fail status of one trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutcomeStatus {
    Ok,
    Fail,
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeStatus::Ok => f.write_str("OK"),
            OutcomeStatus::Fail => f.write_str("FAIL"),
        }
    }
}

/// One report row: the outcome of removing one branch.
#[derive(Debug, Clone, Serialize)]
pub struct ContingencyOutcome {
    /// Human-readable contingency identifier, e.g. "Line 7"
    pub label: String,
    pub branch: BranchId,
    pub status: OutcomeStatus,
    /// "Stable", "Solver Error", or the violation counts
    pub reason: String,
    /// Solver failure detail; empty on success and on limit violations
    pub details: String,
}

/// The aggregated screening report, one row per branch in ascending
/// branch-index order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct N1Report {
    pub outcomes: Vec<ContingencyOutcome>,
}

impl N1Report {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == OutcomeStatus::Fail)
            .count()
    }

    /// Did every trial come back stable?
    pub fn is_secure(&self) -> bool {
        self.failures() == 0
    }
}

/// Screen every single-branch outage of the base snapshot.
///
/// Branches are enumerated in ascending index order over ALL branches,
/// in-service or not; removing an already-out branch is a valid, harmless
/// trial. A network with no branches yields an empty report. The base
/// snapshot is never mutated.
pub fn run_n1(base: &Network, opts: &N1Options) -> N1Report {
    let branch_ids = base.branch_ids();

    let evaluate = |branch: BranchId| evaluate_outage(base, branch, &opts.resolve);

    let outcomes: Vec<ContingencyOutcome> = if opts.parallel {
        branch_ids.par_iter().map(|&id| evaluate(id)).collect()
    } else {
        branch_ids.iter().map(|&id| evaluate(id)).collect()
    };

    N1Report { outcomes }
}

fn evaluate_outage(base: &Network, branch: BranchId, resolve: &Resolve) -> ContingencyOutcome {
    let label = format!("Line {}", branch);

    // Full deep copy: the trial must share no mutable state with the base
    // or with sibling trials.
    let mut trial = base.clone();
    if let Err(e) = trial.set_branch_status(branch, false) {
        return ContingencyOutcome {
            label,
            branch,
            status: OutcomeStatus::Fail,
            reason: "Solver Error".to_string(),
            details: e.to_string(),
        };
    }

    let solved = match resolve {
        Resolve::PowerFlow(pf_opts) => run_power_flow(&mut trial, pf_opts).map(|r| r.violations),
        Resolve::Dispatch(opf_opts) => run_dispatch(&mut trial, opf_opts).map(|r| r.violations),
    };

    match solved {
        Err(failure) => ContingencyOutcome {
            label,
            branch,
            status: OutcomeStatus::Fail,
            reason: "Solver Error".to_string(),
            details: failure.detail,
        },
        Ok(violations) => classify_trial(label, branch, &violations),
    }
}

fn classify_trial(
    label: String,
    branch: BranchId,
    violations: &ViolationSummary,
) -> ContingencyOutcome {
    if violations.is_clean() {
        ContingencyOutcome {
            label,
            branch,
            status: OutcomeStatus::Ok,
            reason: "Stable".to_string(),
            details: String::new(),
        }
    } else {
        ContingencyOutcome {
            label,
            branch,
            status: OutcomeStatus::Fail,
            reason: format!(
                "{} voltage violations, {} overloads",
                violations.voltage_violations, violations.overloaded_branches
            ),
            details: String::new(),
        }
    }
}
