//! Constrained least-cost dispatch.
//!
//! Minimizes total linear generation cost subject to per-bus power balance
//! and branch thermal limits on the linearized network, then re-solves AC
//! power flow with the dispatched setpoints to recover voltages, reactive
//! outputs, and losses. The snapshot must carry a cost table (see
//! `Network::assign_costs`) before dispatch runs.
//!
//! The dispatch table spans every generation-source category present in the
//! snapshot; an absent category simply contributes no rows. All solver
//! faults, an infeasible program included, come back as structured
//! failures, never as raised errors.

use good_lp::solvers::clarabel::clarabel;
use good_lp::{constraint, variable, variables, Expression, Solution, SolverModel, Variable};
use sprs::TriMat;
use std::collections::HashMap;
use tracing::debug;

use gsa_core::{BusId, Network, Node, SourceRef, SourceResult};

use crate::outcome::{PowerSummary, SolveFailure, SolveOutcome};
use crate::pf::{run_power_flow, PfOptions};
use crate::violations::ViolationSummary;

// Bound stand-in for sources with unbounded limits, in MW.
const WIDE_LIMIT_MW: f64 = 1e6;

/// Dispatch solver configuration.
#[derive(Debug, Clone, Default)]
pub struct OpfOptions {
    /// Options for the AC verification solve; its voltage-angle flag and
    /// violation thresholds apply to the dispatch report as well.
    pub pf: PfOptions,
}

impl OpfOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pf(mut self, pf: PfOptions) -> Self {
        self.pf = pf;
        self
    }

    /// Toggle voltage-angle calculation for the verification solve.
    pub fn with_voltage_angles(mut self, enable: bool) -> Self {
        self.pf.calculate_voltage_angles = enable;
        self
    }
}

/// Result of a successful dispatch solve.
#[derive(Debug, Clone)]
pub struct DispatchReport {
    /// Optimizer objective: total cost of the dispatched outputs
    pub objective_cost: f64,
    /// One row per generation source, all categories unified
    pub dispatch: Vec<SourceResult>,
    pub violations: ViolationSummary,
    pub summary: PowerSummary,
}

struct DispatchVar {
    source: SourceRef,
    bus: BusId,
    var: Variable,
    cost: f64,
}

/// Solve the constrained-dispatch problem in place.
///
/// On success the snapshot carries the dispatched setpoints and the solved
/// result fields of the verification power flow.
pub fn run_dispatch(net: &mut Network, opts: &OpfOptions) -> SolveOutcome<DispatchReport> {
    if net.costs.is_empty() {
        return Err(SolveFailure::solver_error(
            "no cost structure attached; assign costs before dispatch",
        ));
    }

    let mut bus_ids: Vec<BusId> = net.buses().iter().map(|b| b.id).collect();
    bus_ids.sort();
    if bus_ids.is_empty() {
        return Err(SolveFailure::solver_error("network has no buses"));
    }
    let n = bus_ids.len();
    let idx: HashMap<BusId, usize> = bus_ids.iter().enumerate().map(|(i, &b)| (b, i)).collect();
    let base = net.base_mva;

    // Reference bus mirrors the power-flow solver's choice.
    let slack_idx = {
        let mut exts: Vec<_> = net.ext_grids().into_iter().filter(|e| e.in_service).collect();
        exts.sort_by_key(|e| e.id);
        let slack_bus = exts.first().map(|e| e.bus).or_else(|| {
            let mut gens: Vec<_> = net.generators().into_iter().filter(|g| g.in_service).collect();
            gens.sort_by_key(|g| g.id);
            gens.first().map(|g| g.bus)
        });
        match slack_bus.and_then(|b| idx.get(&b)) {
            Some(&i) => i,
            None => {
                return Err(SolveFailure::solver_error(
                    "no in-service reference source for dispatch",
                ))
            }
        }
    };

    // Decision variables for dispatchable sources; everything else enters
    // the balance as a fixed injection.
    let mut vars = variables!();
    let mut dispatch_vars: Vec<DispatchVar> = Vec::new();
    let mut fixed_p = vec![0.0; n];
    let mut fixed_cost = 0.0;

    for gen in net.generators().into_iter().filter(|g| g.in_service) {
        let source = SourceRef::gen(gen.id.value());
        let cost = net.cost_for(source).unwrap_or(0.0);
        if gen.dispatchable {
            let pmax = if gen.pmax_mw.is_finite() { gen.pmax_mw } else { WIDE_LIMIT_MW };
            let var = vars.add(variable().min(gen.pmin_mw.max(0.0) / base).max(pmax / base));
            dispatch_vars.push(DispatchVar {
                source,
                bus: gen.bus,
                var,
                cost,
            });
        } else if let Some(&i) = idx.get(&gen.bus) {
            fixed_p[i] += gen.p_mw / base;
            fixed_cost += cost * gen.p_mw;
        }
    }
    for ext in net.ext_grids().into_iter().filter(|e| e.in_service) {
        let source = SourceRef::ext_grid(ext.id.value());
        let cost = net.cost_for(source).unwrap_or(0.0);
        let lo = ext.pmin_mw.max(-WIDE_LIMIT_MW) / base;
        let hi = ext.pmax_mw.min(WIDE_LIMIT_MW) / base;
        let var = vars.add(variable().min(lo).max(hi));
        dispatch_vars.push(DispatchVar {
            source,
            bus: ext.bus,
            var,
            cost,
        });
    }
    for sgen in net.sgens().into_iter().filter(|s| s.in_service) {
        let source = SourceRef::sgen(sgen.id.value());
        let cost = net.cost_for(source).unwrap_or(0.0);
        if sgen.dispatchable {
            let pmax = if sgen.pmax_mw.is_finite() { sgen.pmax_mw } else { WIDE_LIMIT_MW };
            let var = vars.add(variable().min(sgen.pmin_mw.max(0.0) / base).max(pmax / base));
            dispatch_vars.push(DispatchVar {
                source,
                bus: sgen.bus,
                var,
                cost,
            });
        } else if let Some(&i) = idx.get(&sgen.bus) {
            fixed_p[i] += sgen.p_mw / base;
            fixed_cost += cost * sgen.p_mw;
        }
    }

    if dispatch_vars.is_empty() {
        return Err(SolveFailure::solver_error(
            "no dispatchable generation sources in the snapshot",
        ));
    }

    for load in net.loads() {
        if let Some(&i) = idx.get(&load.bus) {
            fixed_p[i] -= load.p_mw / base;
        }
    }

    // Bus angle variables, reference excluded.
    let mut theta: HashMap<usize, Variable> = HashMap::new();
    for i in 0..n {
        if i != slack_idx {
            theta.insert(i, vars.add(variable().min(-1e3).max(1e3)));
        }
    }

    // Susceptance matrix over the in-service topology.
    struct LpBranch {
        i: usize,
        j: usize,
        susceptance: f64,
        rating_pu: Option<f64>,
    }
    let mut lp_branches: Vec<LpBranch> = Vec::new();
    let mut triplets = TriMat::new((n, n));
    for branch in net.branches() {
        if !branch.in_service || branch.reactance_pu.abs() < 1e-12 {
            continue;
        }
        let (Some(&i), Some(&j)) = (idx.get(&branch.from_bus), idx.get(&branch.to_bus)) else {
            continue;
        };
        let tap = if branch.tap_ratio > 0.0 { branch.tap_ratio } else { 1.0 };
        let b = 1.0 / (branch.reactance_pu * tap);
        triplets.add_triplet(i, j, -b);
        triplets.add_triplet(j, i, -b);
        triplets.add_triplet(i, i, b);
        triplets.add_triplet(j, j, b);
        lp_branches.push(LpBranch {
            i,
            j,
            susceptance: b,
            rating_pu: branch.rating_mva.map(|r| r / base),
        });
    }
    let b_prime = triplets.to_csr::<usize>();

    // Objective: total cost of dispatched output, in currency per hour.
    let mut cost_expr = Expression::from(0.0);
    for dv in &dispatch_vars {
        cost_expr += dv.cost * base * dv.var;
    }

    let mut problem = vars.minimise(cost_expr).using(clarabel);

    // Per-bus balance: dispatched + fixed injection = angle-driven outflow.
    let mut bus_var_expr: Vec<Expression> = (0..n).map(|_| Expression::from(0.0)).collect();
    for dv in &dispatch_vars {
        if let Some(&i) = idx.get(&dv.bus) {
            bus_var_expr[i] += dv.var;
        }
    }
    for i in 0..n {
        let mut flow_expr = Expression::from(0.0);
        if let Some(row) = b_prime.outer_view(i) {
            for (j, &b_ij) in row.iter() {
                if let Some(&theta_j) = theta.get(&j) {
                    flow_expr += b_ij * theta_j;
                }
                // Reference-bus angle is identically zero.
            }
        }
        let injection = bus_var_expr[i].clone() + fixed_p[i];
        problem = problem.with(constraint!(injection - flow_expr == 0.0));
    }

    // Thermal limits on rated branches.
    for lb in &lp_branches {
        let Some(rating) = lb.rating_pu else { continue };
        let theta_i = theta.get(&lb.i).copied();
        let theta_j = theta.get(&lb.j).copied();
        let mut flow = Expression::from(0.0);
        if let Some(t) = theta_i {
            flow += lb.susceptance * t;
        }
        if let Some(t) = theta_j {
            flow += -lb.susceptance * t;
        }
        problem = problem.with(constraint!(flow.clone() <= rating));
        problem = problem.with(constraint!(flow >= -rating));
    }

    let solution = problem
        .solve()
        .map_err(|e| SolveFailure::solver_error(format!("dispatch optimization failed: {:?}", e)))?;

    // Extract dispatched outputs and the objective.
    let mut dispatched: HashMap<SourceRef, f64> = HashMap::new();
    let mut objective_cost = fixed_cost;
    for dv in &dispatch_vars {
        let p_mw = solution.value(dv.var) * base;
        objective_cost += dv.cost * p_mw;
        dispatched.insert(dv.source, p_mw);
    }
    debug!(objective_cost, "dispatch optimization solved");

    // Write dispatched setpoints back into the snapshot. The grid tie needs
    // no setpoint: the verification solve recomputes its output as slack.
    for node in net.graph.node_weights_mut() {
        match node {
            Node::Gen(g) => {
                if let Some(&p) = dispatched.get(&SourceRef::gen(g.id.value())) {
                    g.p_mw = p;
                }
            }
            Node::Sgen(s) => {
                if let Some(&p) = dispatched.get(&SourceRef::sgen(s.id.value())) {
                    s.p_mw = p;
                }
            }
            _ => {}
        }
    }

    let pf_report = run_power_flow(net, &opts.pf).map_err(|f| SolveFailure {
        kind: f.kind,
        detail: format!("dispatch verification solve: {}", f.detail),
    })?;

    let dispatch = net
        .results
        .as_ref()
        .map(|state| state.sources.clone())
        .unwrap_or_default();

    Ok(DispatchReport {
        objective_cost,
        dispatch,
        violations: pf_report.violations,
        summary: pf_report.summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::FailureKind;
    use gsa_core::{
        Branch, BranchId, Bus, CostAssignment, ExtGrid, ExtGridId, Gen, GenId, Load, LoadId, Sgen,
        SgenId, SourceKind,
    };

    fn bus(id: usize) -> Bus {
        Bus {
            id: BusId::new(id),
            name: format!("Bus {}", id),
            base_kv: 138.0,
            ..Bus::default()
        }
    }

    /// Radial 3-bus net: grid tie at 0, machine at 1, load at 2, with the
    /// tie-side line rated tight enough to matter.
    fn three_bus_net(tie_rating: f64) -> Network {
        let mut net = Network::new();
        for i in 0..3 {
            net.add_bus(bus(i));
        }
        net.add_ext_grid(
            ExtGrid::new(ExtGridId::new(0), "Grid", BusId::new(0))
                .with_voltage(1.02)
                .with_p_limits(-500.0, 500.0),
        )
        .unwrap();
        net.add_gen(
            Gen::new(GenId::new(0), "Unit", BusId::new(1), 0.0)
                .with_setpoint(1.01)
                .with_p_limits(0.0, 100.0)
                .with_q_limits(-80.0, 80.0),
        )
        .unwrap();
        net.add_load(Load::new(LoadId::new(0), "Load", BusId::new(2), 100.0, 20.0))
            .unwrap();
        net.add_branch(
            Branch::line(BranchId::new(0), "0-2", BusId::new(0), BusId::new(2), 0.01, 0.1)
                .with_rating(tie_rating),
        )
        .unwrap();
        net.add_branch(
            Branch::line(BranchId::new(1), "1-2", BusId::new(1), BusId::new(2), 0.01, 0.1)
                .with_rating(150.0),
        )
        .unwrap();
        net
    }

    #[test]
    fn test_dispatch_requires_cost_structure() {
        let mut net = three_bus_net(200.0);
        let failure = run_dispatch(&mut net, &OpfOptions::default()).unwrap_err();
        assert_eq!(failure.kind, FailureKind::SolverError);
        assert!(failure.detail.contains("cost structure"));
    }

    #[test]
    fn test_cheapest_source_carries_the_load() {
        let mut net = three_bus_net(200.0);
        net.assign_costs(
            &CostAssignment::new()
                .set(SourceRef::ext_grid(0), 10.0)
                .set(SourceRef::gen(0), 100.0),
        )
        .unwrap();
        let report = run_dispatch(&mut net, &OpfOptions::default()).unwrap();

        let gen_row = report
            .dispatch
            .iter()
            .find(|r| r.source == SourceRef::gen(0))
            .unwrap();
        assert!(gen_row.p_mw < 1e-3, "expensive unit should stay at Pmin");

        let ext_row = report
            .dispatch
            .iter()
            .find(|r| r.source == SourceRef::ext_grid(0))
            .unwrap();
        assert!(ext_row.p_mw > 99.0, "tie should carry the load plus losses");
    }

    #[test]
    fn test_thermal_limit_forces_redispatch() {
        let mut net = three_bus_net(60.0);
        net.assign_costs(
            &CostAssignment::new()
                .set(SourceRef::ext_grid(0), 10.0)
                .set(SourceRef::gen(0), 100.0),
        )
        .unwrap();
        let report = run_dispatch(&mut net, &OpfOptions::default()).unwrap();

        let gen_p = report
            .dispatch
            .iter()
            .find(|r| r.source == SourceRef::gen(0))
            .unwrap()
            .p_mw;
        // The tie-side line caps at 60 MW, so the expensive unit must pick
        // up the remaining ~40 MW.
        assert!((gen_p - 40.0).abs() < 1.0, "gen_p = {gen_p}");
    }

    #[test]
    fn test_lowering_one_cost_reduces_total_and_raises_output() {
        let high = CostAssignment::new()
            .set(SourceRef::ext_grid(0), 50.0)
            .set(SourceRef::gen(0), 100.0);
        let mut net_high = three_bus_net(200.0);
        net_high.assign_costs(&high).unwrap();
        let before = run_dispatch(&mut net_high, &OpfOptions::default()).unwrap();

        let cheap = CostAssignment::new()
            .set(SourceRef::ext_grid(0), 50.0)
            .set(SourceRef::gen(0), 10.0);
        let mut net_cheap = three_bus_net(200.0);
        net_cheap.assign_costs(&cheap).unwrap();
        let after = run_dispatch(&mut net_cheap, &OpfOptions::default()).unwrap();

        assert!(
            after.objective_cost < before.objective_cost,
            "total cost must strictly decrease ({} -> {})",
            before.objective_cost,
            after.objective_cost
        );
        let p_before = before
            .dispatch
            .iter()
            .find(|r| r.source == SourceRef::gen(0))
            .unwrap()
            .p_mw;
        let p_after = after
            .dispatch
            .iter()
            .find(|r| r.source == SourceRef::gen(0))
            .unwrap()
            .p_mw;
        assert!(p_after > p_before, "{p_after} vs {p_before}");
    }

    #[test]
    fn test_dispatch_is_idempotent_under_reassignment() {
        let assignment = CostAssignment::new()
            .set(SourceRef::ext_grid(0), 20.0)
            .set(SourceRef::gen(0), 40.0);

        let mut net = three_bus_net(200.0);
        net.assign_costs(&assignment).unwrap();
        let first = run_dispatch(&mut net, &OpfOptions::default()).unwrap();

        net.assign_costs(&assignment).unwrap();
        let second = run_dispatch(&mut net, &OpfOptions::default()).unwrap();

        assert!((first.objective_cost - second.objective_cost).abs() < 1e-6);
        for (a, b) in first.dispatch.iter().zip(&second.dispatch) {
            assert_eq!(a.source, b.source);
            assert!((a.p_mw - b.p_mw).abs() < 1e-6);
        }
    }

    #[test]
    fn test_dispatch_covers_every_populated_category() {
        let mut net = three_bus_net(200.0);
        net.add_sgen(
            Sgen::new(SgenId::new(0), "PV park", BusId::new(1), 10.0, 0.0)
                .dispatchable(0.0, 25.0),
        )
        .unwrap();
        net.assign_costs(
            &CostAssignment::new()
                .set(SourceRef::ext_grid(0), 30.0)
                .set(SourceRef::gen(0), 40.0)
                .set(SourceRef::sgen(0), 5.0),
        )
        .unwrap();
        let report = run_dispatch(&mut net, &OpfOptions::default()).unwrap();

        let kinds: Vec<SourceKind> = report.dispatch.iter().map(|r| r.source.kind).collect();
        assert!(kinds.contains(&SourceKind::Gen));
        assert!(kinds.contains(&SourceKind::ExtGrid));
        assert!(kinds.contains(&SourceKind::Sgen));

        // Cheap park runs flat out.
        let sgen_p = report
            .dispatch
            .iter()
            .find(|r| r.source == SourceRef::sgen(0))
            .unwrap()
            .p_mw;
        assert!((sgen_p - 25.0).abs() < 1e-3);
    }

    #[test]
    fn test_absent_category_produces_no_rows_and_no_error() {
        let mut net = three_bus_net(200.0);
        net.assign_costs(&CostAssignment::new().set(SourceRef::ext_grid(0), 30.0))
            .unwrap();
        let report = run_dispatch(&mut net, &OpfOptions::default()).unwrap();
        assert!(report
            .dispatch
            .iter()
            .all(|r| r.source.kind != SourceKind::Sgen));
    }

    #[test]
    fn test_infeasible_program_is_structured_failure() {
        let mut net = three_bus_net(200.0);
        // Tie capped far below the load, machine too small to cover it.
        for node in net.graph.node_weights_mut() {
            if let Node::ExtGrid(e) = node {
                e.pmin_mw = 0.0;
                e.pmax_mw = 10.0;
            }
            if let Node::Gen(g) = node {
                g.pmax_mw = 20.0;
            }
        }
        net.assign_costs(
            &CostAssignment::new()
                .set(SourceRef::ext_grid(0), 10.0)
                .set(SourceRef::gen(0), 20.0),
        )
        .unwrap();
        let failure = run_dispatch(&mut net, &OpfOptions::default()).unwrap_err();
        assert_eq!(failure.kind, FailureKind::SolverError);
    }

    #[test]
    fn test_total_generation_sums_dispatch_table() {
        let mut net = three_bus_net(200.0);
        net.assign_costs(
            &CostAssignment::new()
                .set(SourceRef::ext_grid(0), 10.0)
                .set(SourceRef::gen(0), 20.0),
        )
        .unwrap();
        let report = run_dispatch(&mut net, &OpfOptions::default()).unwrap();
        let table_sum: f64 = report.dispatch.iter().map(|r| r.p_mw).sum();
        assert!((report.summary.total_gen_mw - table_sum).abs() < 1e-9);
    }
}
