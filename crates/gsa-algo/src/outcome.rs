//! Normalized solver outcomes.
//!
//! Runners hand every solver-level fault back as data: the caller receives
//! `Result<Report, SolveFailure>` and decides what a failure means. Nothing
//! in this module ever panics or propagates a raised fault across the runner
//! boundary; only structural misuse upstream of a solve (bad case name,
//! malformed options) is allowed to be a hard error, and that lives in
//! `gsa_core::GsaError`.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// How a solve failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The iterative solver ran but did not reach a solution
    DidNotConverge,
    /// Any other solver-raised fault (structural, numerical, infeasible)
    SolverError,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::DidNotConverge => f.write_str("did not converge"),
            FailureKind::SolverError => f.write_str("unexpected solver error"),
        }
    }
}

/// A structured solve failure: kind plus whatever detail the solver exposed.
#[derive(Debug, Clone, Error, Serialize)]
#[error("{kind}: {detail}")]
pub struct SolveFailure {
    pub kind: FailureKind,
    pub detail: String,
}

impl SolveFailure {
    pub fn did_not_converge(detail: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::DidNotConverge,
            detail: detail.into(),
        }
    }

    pub fn solver_error(detail: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::SolverError,
            detail: detail.into(),
        }
    }
}

/// Runner result: a report on success, a structured failure otherwise.
pub type SolveOutcome<T> = Result<T, SolveFailure>;

/// Scalar energy summary of a solved snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PowerSummary {
    pub total_load_mw: f64,
    /// Summed over every generation-source category, the grid tie included
    pub total_gen_mw: f64,
    pub losses_mw: f64,
    /// Losses as a percentage of total generation; exactly 0 when there is
    /// no generation, never NaN or infinite
    pub loss_percent: f64,
}

impl PowerSummary {
    pub fn from_parts(total_load_mw: f64, total_gen_mw: f64, losses_mw: f64) -> Self {
        let loss_percent = if total_gen_mw == 0.0 {
            0.0
        } else {
            losses_mw / total_gen_mw * 100.0
        };
        Self {
            total_load_mw,
            total_gen_mw,
            losses_mw,
            loss_percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loss_percent_zero_generation() {
        let summary = PowerSummary::from_parts(0.0, 0.0, 0.0);
        assert_eq!(summary.loss_percent, 0.0);
        assert!(summary.loss_percent.is_finite());
    }

    #[test]
    fn test_loss_percent() {
        let summary = PowerSummary::from_parts(98.0, 100.0, 2.0);
        assert!((summary.loss_percent - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_failure_display() {
        let f = SolveFailure::did_not_converge("max mismatch 0.3 p.u. after 20 iterations");
        assert!(f.to_string().starts_with("did not converge"));
        let f = SolveFailure::solver_error("no reference source");
        assert!(f.to_string().starts_with("unexpected solver error"));
    }
}
