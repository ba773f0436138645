//! AC power-flow runner.
//!
//! [`run_power_flow`] solves a snapshot in place and normalizes the outcome:
//! a [`PfReport`] (violations plus scalar summary) on success, a
//! [`SolveFailure`] otherwise. Non-convergence is never a raised fault; it
//! comes back as data, after a diagnostic dump of the last voltage state to
//! the log sink.

use num_complex::Complex64;
use std::collections::HashMap;
use tracing::warn;

use gsa_core::{
    BranchResult, BusId, BusResult, Network, SolvedState, SourceKind, SourceRef, SourceResult,
};

use crate::outcome::{PowerSummary, SolveFailure, SolveOutcome};
use crate::violations::{classify, ViolationLimits, ViolationSummary};

mod newton;

pub use newton::BusType;
use newton::{Divergence, NewtonOutcome, NewtonSolution};

/// Voltage starting point for the Newton solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitStrategy {
    /// Flat 1.0 p.u. / reference-angle start
    Flat,
    /// Angles seeded from a linearized (DC) solve
    #[default]
    DcStart,
}

impl std::str::FromStr for InitStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "flat" => Ok(InitStrategy::Flat),
            "dc" => Ok(InitStrategy::DcStart),
            _ => Err(format!("unknown init strategy `{}` (flat|dc)", s)),
        }
    }
}

/// Power-flow solver configuration.
#[derive(Debug, Clone)]
pub struct PfOptions {
    /// Enforce generator reactive limits via PV->PQ switching
    pub enforce_q_limits: bool,
    /// Honor the reference angle and branch phase shifts; when false both
    /// are taken as zero
    pub calculate_voltage_angles: bool,
    pub init: InitStrategy,
    /// Use the optimized LU path; false falls back to plain elimination
    pub accelerate: bool,
    /// Newton iteration cap
    pub max_iterations: usize,
    /// Convergence tolerance on the power mismatch (per-unit)
    pub tolerance: f64,
    /// Thresholds for the violation summary
    pub limits: ViolationLimits,
}

impl Default for PfOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl PfOptions {
    pub fn new() -> Self {
        Self {
            enforce_q_limits: true,
            calculate_voltage_angles: true,
            init: InitStrategy::DcStart,
            accelerate: true,
            max_iterations: 20,
            tolerance: 1e-8,
            limits: ViolationLimits::default(),
        }
    }

    pub fn with_q_limit_enforcement(mut self, enable: bool) -> Self {
        self.enforce_q_limits = enable;
        self
    }

    pub fn with_voltage_angles(mut self, enable: bool) -> Self {
        self.calculate_voltage_angles = enable;
        self
    }

    pub fn with_init(mut self, init: InitStrategy) -> Self {
        self.init = init;
        self
    }

    pub fn with_acceleration(mut self, enable: bool) -> Self {
        self.accelerate = enable;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_limits(mut self, limits: ViolationLimits) -> Self {
        self.limits = limits;
        self
    }
}

/// What a successful power flow hands back. The solved tables themselves
/// land in `network.results`.
#[derive(Debug, Clone, Copy)]
pub struct PfReport {
    pub violations: ViolationSummary,
    pub summary: PowerSummary,
}

// Band for the "critical excursion" section of the divergence report.
const EXTREME_V_MIN_PU: f64 = 0.8;
const EXTREME_V_MAX_PU: f64 = 1.2;

/// Solve AC power flow in place.
///
/// Contingency trials call this on clones; nothing here ever mutates beyond
/// the snapshot it is handed. All solver-level faults come back as
/// `Err(SolveFailure)`, never as a panic or a hard error.
pub fn run_power_flow(net: &mut Network, opts: &PfOptions) -> SolveOutcome<PfReport> {
    match newton::solve(net, opts) {
        Err(structural) => Err(SolveFailure::solver_error(structural.to_string())),
        Ok(NewtonOutcome::NotConverged(div)) => {
            log_divergence_report(&div);
            Err(SolveFailure::did_not_converge(div.detail))
        }
        Ok(NewtonOutcome::Converged(sol)) => {
            let state = build_solved_state(net, &sol, opts);
            let violations = classify(
                &state.bus_voltages(),
                &state.branch_loadings(),
                &opts.limits,
            );
            let summary = PowerSummary::from_parts(
                net.total_load_mw(),
                state.total_generation_mw(),
                state.total_losses_mw(),
            );
            net.results = Some(state);
            Ok(PfReport {
                violations,
                summary,
            })
        }
    }
}

/// Observability only: dump the last voltage state when a solve fails to
/// converge. Does not affect the returned failure payload.
fn log_divergence_report(div: &Divergence) {
    warn!(
        "power flow failed to converge after {} iterations (max mismatch {:.3e} p.u.)",
        div.iterations, div.max_mismatch_pu
    );
    warn!("bus voltages at last iteration:");
    for (i, bus) in div.bus_ids.iter().enumerate() {
        warn!(
            "  bus {:>4}  vm {:7.4} p.u.  va {:9.3} deg",
            bus.value(),
            div.v_mag[i],
            div.v_ang_rad[i].to_degrees()
        );
    }
    let extreme: Vec<String> = div
        .bus_ids
        .iter()
        .zip(&div.v_mag)
        .filter(|(_, &vm)| !(EXTREME_V_MIN_PU..=EXTREME_V_MAX_PU).contains(&vm))
        .map(|(bus, vm)| format!("bus {} ({:.4} p.u.)", bus.value(), vm))
        .collect();
    if !extreme.is_empty() {
        warn!("critical voltage excursions at: {}", extreme.join(", "));
    }
}

/// Derive the full solved tables from a converged voltage state.
fn build_solved_state(net: &Network, sol: &NewtonSolution, opts: &PfOptions) -> SolvedState {
    let idx: HashMap<BusId, usize> = sol
        .bus_ids
        .iter()
        .enumerate()
        .map(|(i, &b)| (b, i))
        .collect();
    let base = net.base_mva;
    let voltage =
        |i: usize| Complex64::from_polar(sol.v_mag[i], sol.v_ang_rad[i]);

    let bus_table: Vec<BusResult> = sol
        .bus_ids
        .iter()
        .enumerate()
        .map(|(i, &bus)| BusResult {
            bus,
            vm_pu: sol.v_mag[i],
            va_deg: sol.v_ang_rad[i].to_degrees(),
        })
        .collect();

    // Branch flows, accumulating the per-bus network injection as we go.
    let n = sol.bus_ids.len();
    let mut p_net_mw = vec![0.0; n];
    let mut q_net_mvar = vec![0.0; n];
    let branch_ids = net.branch_ids();
    let mut branch_table = Vec::with_capacity(branch_ids.len());
    for id in branch_ids {
        let branch = net.branch(id).expect("id enumerated from this network");
        let active = branch.in_service
            && branch.resistance_pu.abs() + branch.reactance_pu.abs() > 1e-12;
        let (Some(&i), Some(&j)) = (idx.get(&branch.from_bus), idx.get(&branch.to_bus)) else {
            continue;
        };
        if !active {
            branch_table.push(BranchResult {
                branch: id,
                in_service: branch.in_service,
                p_from_mw: 0.0,
                q_from_mvar: 0.0,
                p_to_mw: 0.0,
                q_to_mvar: 0.0,
                pl_mw: 0.0,
                loading_percent: 0.0,
            });
            continue;
        }

        let z = Complex64::new(branch.resistance_pu, branch.reactance_pu);
        let y_series = z.inv();
        let b_shunt = Complex64::new(0.0, branch.charging_b_pu / 2.0);
        let tap_mag = if branch.tap_ratio > 0.0 { branch.tap_ratio } else { 1.0 };
        let shift = if opts.calculate_voltage_angles {
            branch.phase_shift_rad
        } else {
            0.0
        };
        let tap = Complex64::from_polar(tap_mag, shift);

        // Same branch model the solver's admittance matrix uses.
        let y_ff = y_series / (tap_mag * tap_mag) + b_shunt;
        let y_ft = -(y_series / tap.conj());
        let y_tf = -(y_series / tap);
        let y_tt = y_series + b_shunt;

        let v_f = voltage(i);
        let v_t = voltage(j);
        let s_from = v_f * (y_ff * v_f + y_ft * v_t).conj() * base;
        let s_to = v_t * (y_tf * v_f + y_tt * v_t).conj() * base;

        p_net_mw[i] += s_from.re;
        q_net_mvar[i] += s_from.im;
        p_net_mw[j] += s_to.re;
        q_net_mvar[j] += s_to.im;

        let loading_percent = branch
            .rating_mva
            .map(|rating| s_from.norm().max(s_to.norm()) / rating * 100.0)
            .unwrap_or(0.0);

        branch_table.push(BranchResult {
            branch: id,
            in_service: true,
            p_from_mw: s_from.re,
            q_from_mvar: s_from.im,
            p_to_mw: s_to.re,
            q_to_mvar: s_to.im,
            pl_mw: s_from.re + s_to.re,
            loading_percent,
        });
    }

    // Shunt consumption is part of the bus injection balance.
    for shunt in net.shunts().into_iter().filter(|s| s.in_service) {
        if let Some(&i) = idx.get(&shunt.bus) {
            let vm_sq = sol.v_mag[i] * sol.v_mag[i];
            p_net_mw[i] += shunt.gs_pu * vm_sq * base;
            q_net_mvar[i] -= shunt.bs_pu * vm_sq * base;
        }
    }

    // Per-bus element sums used to back out source outputs.
    let mut load_p = vec![0.0; n];
    let mut load_q = vec![0.0; n];
    for load in net.loads() {
        if let Some(&i) = idx.get(&load.bus) {
            load_p[i] += load.p_mw;
            load_q[i] += load.q_mvar;
        }
    }
    let mut sgen_p = vec![0.0; n];
    let mut sgen_q = vec![0.0; n];
    for sgen in net.sgens().into_iter().filter(|s| s.in_service) {
        if let Some(&i) = idx.get(&sgen.bus) {
            sgen_p[i] += sgen.p_mw;
            sgen_q[i] += sgen.q_mvar;
        }
    }
    let mut gen_p = vec![0.0; n];
    let mut gens_at_bus = vec![0usize; n];
    for gen in net.generators().into_iter().filter(|g| g.in_service) {
        if let Some(&i) = idx.get(&gen.bus) {
            gen_p[i] += gen.p_mw;
            gens_at_bus[i] += 1;
        }
    }

    // Reference selection mirrors the solver: the first in-service ext
    // grid, or the first in-service generator bus when there is no tie.
    let ext_slack_bus = {
        let mut exts: Vec<_> = net.ext_grids().into_iter().filter(|e| e.in_service).collect();
        exts.sort_by_key(|e| e.id);
        exts.first().map(|e| e.bus)
    };
    let gen_slack_bus = if ext_slack_bus.is_none() {
        let mut gens: Vec<_> = net.generators().into_iter().filter(|g| g.in_service).collect();
        gens.sort_by_key(|g| g.id);
        gens.first().map(|g| g.bus)
    } else {
        None
    };

    let mut sources = Vec::new();
    for gen in net.generators() {
        let mut p = 0.0;
        let mut q = 0.0;
        if gen.in_service {
            if let Some(&i) = idx.get(&gen.bus) {
                let share = gens_at_bus[i].max(1) as f64;
                if Some(gen.bus) == gen_slack_bus {
                    // No grid tie: the reference generators absorb the
                    // whole residual at their bus.
                    p = (p_net_mw[i] + load_p[i] - sgen_p[i]) / share;
                    q = (q_net_mvar[i] + load_q[i] - sgen_q[i]) / share;
                } else {
                    p = gen.p_mw;
                    // Generators at the tie bus leave Q to the grid tie.
                    if Some(gen.bus) != ext_slack_bus {
                        q = (q_net_mvar[i] + load_q[i] - sgen_q[i]) / share;
                    }
                }
            }
        }
        sources.push(SourceResult {
            source: SourceRef::new(SourceKind::Gen, gen.id.value()),
            name: gen.name.clone(),
            p_mw: p,
            q_mvar: q,
        });
    }
    let mut first_ext = true;
    let mut ext_grids: Vec<_> = net.ext_grids();
    ext_grids.sort_by_key(|e| e.id);
    for ext in ext_grids {
        let mut p = 0.0;
        let mut q = 0.0;
        if ext.in_service && first_ext {
            if let Some(&i) = idx.get(&ext.bus) {
                p = p_net_mw[i] + load_p[i] - gen_p[i] - sgen_p[i];
                q = q_net_mvar[i] + load_q[i] - sgen_q[i];
                first_ext = false;
            }
        }
        sources.push(SourceResult {
            source: SourceRef::new(SourceKind::ExtGrid, ext.id.value()),
            name: ext.name.clone(),
            p_mw: p,
            q_mvar: q,
        });
    }
    for sgen in net.sgens() {
        let (p, q) = if sgen.in_service {
            (sgen.p_mw, sgen.q_mvar)
        } else {
            (0.0, 0.0)
        };
        sources.push(SourceResult {
            source: SourceRef::new(SourceKind::Sgen, sgen.id.value()),
            name: sgen.name.clone(),
            p_mw: p,
            q_mvar: q,
        });
    }
    sources.sort_by_key(|s| s.source);

    SolvedState {
        bus: bus_table,
        branch: branch_table,
        sources,
        iterations: sol.iterations,
        max_mismatch_pu: sol.max_mismatch_pu,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::FailureKind;
    use gsa_core::{
        Branch, BranchId, Bus, ExtGrid, ExtGridId, Gen, GenId, Load, LoadId,
    };

    fn bus(id: usize) -> Bus {
        Bus {
            id: BusId::new(id),
            name: format!("Bus {}", id),
            base_kv: 138.0,
            ..Bus::default()
        }
    }

    fn two_bus_net(load_mw: f64, load_mvar: f64) -> Network {
        let mut net = Network::new();
        net.add_bus(bus(0));
        net.add_bus(bus(1));
        net.add_ext_grid(ExtGrid::new(ExtGridId::new(0), "Grid", BusId::new(0)).with_voltage(1.02))
            .unwrap();
        net.add_load(Load::new(
            LoadId::new(0),
            "Load",
            BusId::new(1),
            load_mw,
            load_mvar,
        ))
        .unwrap();
        net.add_branch(
            Branch::line(BranchId::new(0), "0-1", BusId::new(0), BusId::new(1), 0.01, 0.1)
                .with_rating(100.0),
        )
        .unwrap();
        net
    }

    #[test]
    fn test_two_bus_solves() {
        let mut net = two_bus_net(50.0, 10.0);
        let report = run_power_flow(&mut net, &PfOptions::default()).unwrap();
        assert!(net.is_solved());
        assert!(report.summary.losses_mw > 0.0);
        assert!((report.summary.total_load_mw - 50.0).abs() < 1e-9);
        // Slack covers load plus losses.
        assert!(report.summary.total_gen_mw > 50.0);

        let state = net.results.as_ref().unwrap();
        let vm1 = state.bus[1].vm_pu;
        assert!(vm1 < 1.02 && vm1 > 0.9, "vm1 = {vm1}");
    }

    #[test]
    fn test_flat_and_dc_start_agree() {
        let mut flat = two_bus_net(50.0, 10.0);
        let mut dc = two_bus_net(50.0, 10.0);
        run_power_flow(&mut flat, &PfOptions::default().with_init(InitStrategy::Flat)).unwrap();
        run_power_flow(&mut dc, &PfOptions::default().with_init(InitStrategy::DcStart)).unwrap();
        let v_flat = flat.results.unwrap().bus_voltages();
        let v_dc = dc.results.unwrap().bus_voltages();
        for (a, b) in v_flat.iter().zip(&v_dc) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_acceleration_toggle_agrees() {
        let mut fast = two_bus_net(50.0, 10.0);
        let mut plain = two_bus_net(50.0, 10.0);
        run_power_flow(&mut fast, &PfOptions::default()).unwrap();
        run_power_flow(&mut plain, &PfOptions::default().with_acceleration(false)).unwrap();
        let v_fast = fast.results.unwrap().bus_voltages();
        let v_plain = plain.results.unwrap().bus_voltages();
        for (a, b) in v_fast.iter().zip(&v_plain) {
            assert!((a - b).abs() < 1e-8);
        }
    }

    #[test]
    fn test_isolated_bus_is_solver_error() {
        let mut net = Network::new();
        net.add_bus(bus(0));
        net.add_bus(bus(1));
        net.add_ext_grid(ExtGrid::new(ExtGridId::new(0), "Grid", BusId::new(0)))
            .unwrap();
        net.add_load(Load::new(LoadId::new(0), "Load", BusId::new(1), 10.0, 2.0))
            .unwrap();

        let failure = run_power_flow(&mut net, &PfOptions::default()).unwrap_err();
        assert_eq!(failure.kind, FailureKind::SolverError);
        assert!(failure.detail.contains("isolated"));
        assert!(!net.is_solved());
    }

    #[test]
    fn test_impossible_transfer_does_not_converge() {
        // Far beyond the maximum power transfer of the line; no solution
        // exists, so the solve must come back as a structured failure.
        let mut net = two_bus_net(5000.0, 1000.0);
        let failure = run_power_flow(&mut net, &PfOptions::default()).unwrap_err();
        assert_eq!(failure.kind, FailureKind::DidNotConverge);
        assert!(!net.is_solved());
    }

    #[test]
    fn test_no_reference_source_is_solver_error() {
        let mut net = Network::new();
        net.add_bus(bus(0));
        net.add_load(Load::new(LoadId::new(0), "Load", BusId::new(0), 10.0, 2.0))
            .unwrap();
        let failure = run_power_flow(&mut net, &PfOptions::default()).unwrap_err();
        assert_eq!(failure.kind, FailureKind::SolverError);
    }

    #[test]
    fn test_loss_percent_zero_when_no_generation() {
        let mut net = Network::new();
        net.add_bus(bus(0));
        net.add_ext_grid(ExtGrid::new(ExtGridId::new(0), "Grid", BusId::new(0)))
            .unwrap();
        let report = run_power_flow(&mut net, &PfOptions::default()).unwrap();
        assert_eq!(report.summary.total_gen_mw, 0.0);
        assert_eq!(report.summary.loss_percent, 0.0);
    }

    #[test]
    fn test_q_limit_enforcement_drops_voltage() {
        // Reactive-hungry load; the generator cannot hold its setpoint once
        // the Q ceiling binds.
        let mut net = two_bus_net(40.0, 35.0);
        net.add_gen(
            Gen::new(GenId::new(0), "G", BusId::new(1), 10.0)
                .with_setpoint(1.05)
                .with_q_limits(-5.0, 5.0),
        )
        .unwrap();

        let mut free = net.clone();
        run_power_flow(&mut free, &PfOptions::default().with_q_limit_enforcement(false))
            .unwrap();
        let vm_free = free.results.unwrap().bus[1].vm_pu;
        assert!((vm_free - 1.05).abs() < 1e-6);

        run_power_flow(&mut net, &PfOptions::default()).unwrap();
        let vm_limited = net.results.unwrap().bus[1].vm_pu;
        assert!(vm_limited < 1.05 - 1e-4, "vm_limited = {vm_limited}");
    }

    #[test]
    fn test_determinism_on_reference_case() {
        let mut a = gsa_cases::case9();
        let mut b = gsa_cases::case9();
        let ra = run_power_flow(&mut a, &PfOptions::default()).unwrap();
        let rb = run_power_flow(&mut b, &PfOptions::default()).unwrap();
        assert_eq!(ra.violations, rb.violations);
        assert_eq!(ra.summary, rb.summary);
        assert_eq!(
            a.results.unwrap().bus_voltages(),
            b.results.unwrap().bus_voltages()
        );
    }

    #[test]
    fn test_case9_base_case_is_clean() {
        let mut net = gsa_cases::case9();
        let report = run_power_flow(&mut net, &PfOptions::default()).unwrap();
        assert_eq!(report.violations.voltage_violations, 0);
        assert_eq!(report.violations.overloaded_branches, 0);
        assert!(report.summary.losses_mw > 0.0);
        assert!(report.summary.loss_percent < 5.0);

        // Every category with elements has result rows.
        let state = net.results.as_ref().unwrap();
        assert_eq!(state.bus.len(), 9);
        assert_eq!(state.branch.len(), 9);
        assert_eq!(state.sources.len(), 3);
    }

    #[test]
    fn test_case14_converges_with_q_limits() {
        let mut net = gsa_cases::case14();
        let report = run_power_flow(&mut net, &PfOptions::default()).unwrap();
        assert!(report.summary.losses_mw > 0.0);
        let state = net.results.as_ref().unwrap();
        assert!(state.bus.iter().all(|b| b.vm_pu > 0.9 && b.vm_pu < 1.15));
    }

    #[test]
    fn test_case30_converges() {
        let mut net = gsa_cases::case30();
        let report = run_power_flow(&mut net, &PfOptions::default()).unwrap();
        assert!((report.summary.total_load_mw - 283.4).abs() < 1e-9);
        assert!(report.summary.loss_percent > 0.0);
    }
}
