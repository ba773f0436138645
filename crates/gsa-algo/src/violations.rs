//! Shared voltage-band and thermal-loading classification.
//!
//! Both the power-flow runner and the contingency engine count violations
//! through this one function, so the thresholds live in exactly one place.
//! Boundary values are safe: a bus sitting exactly on the band edge and a
//! branch loaded at exactly the ceiling are NOT violations.

use serde::Serialize;

/// Operating limits used to classify a solved snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViolationLimits {
    /// Lower voltage band edge (per-unit)
    pub v_min_pu: f64,
    /// Upper voltage band edge (per-unit)
    pub v_max_pu: f64,
    /// Thermal loading ceiling (percent of rating)
    pub max_loading_percent: f64,
}

impl Default for ViolationLimits {
    fn default() -> Self {
        Self {
            v_min_pu: 0.95,
            v_max_pu: 1.05,
            max_loading_percent: 100.0,
        }
    }
}

impl ViolationLimits {
    pub fn with_voltage_band(mut self, v_min_pu: f64, v_max_pu: f64) -> Self {
        self.v_min_pu = v_min_pu;
        self.v_max_pu = v_max_pu;
        self
    }

    pub fn with_loading_ceiling(mut self, max_loading_percent: f64) -> Self {
        self.max_loading_percent = max_loading_percent;
        self
    }
}

/// Violation counts derived from a solved snapshot. Never cached: computed
/// fresh from result fields every time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ViolationSummary {
    /// Buses below the lower band edge or above the upper one
    pub voltage_violations: usize,
    /// Branches loaded above the thermal ceiling
    pub overloaded_branches: usize,
}

impl ViolationSummary {
    pub fn is_clean(&self) -> bool {
        self.voltage_violations == 0 && self.overloaded_branches == 0
    }
}

/// Count violations over solved voltage magnitudes and branch loadings.
///
/// Empty inputs mean zero violations, not an error. Comparison is strict:
/// `vm < v_min`, `vm > v_max`, `loading > ceiling`.
pub fn classify(
    bus_vm_pu: &[f64],
    branch_loading_percent: &[f64],
    limits: &ViolationLimits,
) -> ViolationSummary {
    let voltage_violations = bus_vm_pu
        .iter()
        .filter(|&&vm| vm < limits.v_min_pu || vm > limits.v_max_pu)
        .count();
    let overloaded_branches = branch_loading_percent
        .iter()
        .filter(|&&loading| loading > limits.max_loading_percent)
        .count();
    ViolationSummary {
        voltage_violations,
        overloaded_branches,
    }
}
