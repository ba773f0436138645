//! Newton-Raphson AC power flow on a network snapshot.
//!
//! Classifies buses (slack from the external grid tie, PV at generator
//! buses, PQ elsewhere), builds the admittance matrix over the in-service
//! topology, and iterates the full Newton step until the power mismatches
//! close. Generator reactive limits are enforced by PV→PQ switching in an
//! outer loop.
//!
//! Structural problems (no buses, no reference source, buses cut off from
//! the reference) are `Err`; a solver that ran but failed to close the
//! mismatches is `Ok(NewtonOutcome::NotConverged)` carrying the last
//! voltage state for diagnostics. The runner layer decides how each case is
//! surfaced.

use anyhow::{anyhow, bail, Result};
use faer::prelude::SpSolver;
use faer::{FaerMat, Mat};
use num_complex::Complex64;
use sprs::TriMat;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, warn};

use gsa_core::{BusId, Network};

use super::{InitStrategy, PfOptions};

/// Bus classification for power flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusType {
    /// Voltage magnitude and angle fixed; P and Q fall out of the solve
    Slack,
    /// Active power and voltage magnitude specified
    Pv,
    /// Active and reactive power specified
    Pq,
}

/// Converged voltage state in solver bus order.
#[derive(Debug, Clone)]
pub(crate) struct NewtonSolution {
    pub bus_ids: Vec<BusId>,
    pub v_mag: Vec<f64>,
    pub v_ang_rad: Vec<f64>,
    pub iterations: usize,
    pub max_mismatch_pu: f64,
    pub bus_types: HashMap<BusId, BusType>,
}

/// Last voltage state of a solve that did not close.
#[derive(Debug, Clone)]
pub(crate) struct Divergence {
    pub bus_ids: Vec<BusId>,
    pub v_mag: Vec<f64>,
    pub v_ang_rad: Vec<f64>,
    pub iterations: usize,
    pub max_mismatch_pu: f64,
    pub detail: String,
}

#[derive(Debug)]
pub(crate) enum NewtonOutcome {
    Converged(NewtonSolution),
    NotConverged(Divergence),
}

// Outer rounds of PV->PQ switching before giving up.
const MAX_Q_ROUNDS: usize = 10;

struct BranchData {
    from: BusId,
    to: BusId,
    r_pu: f64,
    x_pu: f64,
    charging_b_pu: f64,
    tap: f64,
    shift_rad: f64,
}

pub(crate) fn solve(net: &Network, opts: &PfOptions) -> Result<NewtonOutcome> {
    let mut bus_ids: Vec<BusId> = net.buses().iter().map(|b| b.id).collect();
    bus_ids.sort();
    if bus_ids.is_empty() {
        bail!("network has no buses");
    }
    let n = bus_ids.len();
    let idx: HashMap<BusId, usize> = bus_ids.iter().enumerate().map(|(i, &b)| (b, i)).collect();

    let branches: Vec<BranchData> = net
        .branches()
        .into_iter()
        .filter(|b| b.in_service && b.reactance_pu.abs() + b.resistance_pu.abs() > 1e-12)
        .map(|b| BranchData {
            from: b.from_bus,
            to: b.to_bus,
            r_pu: b.resistance_pu,
            x_pu: b.reactance_pu,
            charging_b_pu: b.charging_b_pu,
            tap: if b.tap_ratio > 0.0 { b.tap_ratio } else { 1.0 },
            shift_rad: if opts.calculate_voltage_angles {
                b.phase_shift_rad
            } else {
                0.0
            },
        })
        .collect();

    // Reference selection: the external grid tie, or the first generator bus
    // when the snapshot has no tie at all.
    let (slack_bus, slack_vm, slack_va_rad) = {
        let mut ext_grids: Vec<_> = net.ext_grids().into_iter().filter(|e| e.in_service).collect();
        ext_grids.sort_by_key(|e| e.id);
        if let Some(ext) = ext_grids.first() {
            let va = if opts.calculate_voltage_angles {
                ext.va_deg.to_radians()
            } else {
                0.0
            };
            (ext.bus, ext.vm_pu, va)
        } else {
            let mut gens: Vec<_> = net.generators().into_iter().filter(|g| g.in_service).collect();
            gens.sort_by_key(|g| g.id);
            let gen = gens
                .first()
                .ok_or_else(|| anyhow!("no in-service reference source (ext grid or generator)"))?;
            warn!(bus = %gen.bus, "no external grid tie; using generator bus as reference");
            (gen.bus, gen.vm_setpoint_pu, 0.0)
        }
    };
    let slack_idx = *idx
        .get(&slack_bus)
        .ok_or_else(|| anyhow!("reference source sits on missing bus {}", slack_bus))?;

    check_connectivity(&bus_ids, &idx, slack_idx, &branches)?;

    // Bus classification.
    let mut bus_types: HashMap<BusId, BusType> = bus_ids.iter().map(|&b| (b, BusType::Pq)).collect();
    bus_types.insert(slack_bus, BusType::Slack);
    for gen in net.generators().into_iter().filter(|g| g.in_service) {
        if gen.bus != slack_bus {
            bus_types.insert(gen.bus, BusType::Pv);
        }
    }

    // Voltage state initialization.
    let mut v_mag = vec![1.0; n];
    let mut v_ang = vec![slack_va_rad; n];
    v_mag[slack_idx] = slack_vm;
    for gen in net.generators().into_iter().filter(|g| g.in_service) {
        if let Some(&i) = idx.get(&gen.bus) {
            if i != slack_idx {
                v_mag[i] = gen.vm_setpoint_pu;
            }
        }
    }

    let y_bus = build_y_bus(net, &idx, &branches);

    // Specified injections, per unit. Generator reactive output is free at
    // PV buses, so q_spec initially carries only non-generator injections.
    let base = net.base_mva;
    let mut p_spec = vec![0.0; n];
    let mut q_nongen = vec![0.0; n];
    for gen in net.generators().into_iter().filter(|g| g.in_service) {
        if let Some(&i) = idx.get(&gen.bus) {
            p_spec[i] += gen.p_mw / base;
        }
    }
    for sgen in net.sgens().into_iter().filter(|s| s.in_service) {
        if let Some(&i) = idx.get(&sgen.bus) {
            p_spec[i] += sgen.p_mw / base;
            q_nongen[i] += sgen.q_mvar / base;
        }
    }
    for load in net.loads() {
        if let Some(&i) = idx.get(&load.bus) {
            p_spec[i] -= load.p_mw / base;
            q_nongen[i] -= load.q_mvar / base;
        }
    }
    let mut q_spec = q_nongen.clone();

    if opts.init == InitStrategy::DcStart {
        apply_dc_start(&mut v_ang, slack_idx, &idx, &branches, &p_spec, opts);
    }

    // Aggregate generator Q capability per bus, for limit enforcement.
    let mut q_caps: HashMap<usize, (f64, f64)> = HashMap::new();
    for gen in net.generators().into_iter().filter(|g| g.in_service) {
        if let Some(&i) = idx.get(&gen.bus) {
            let entry = q_caps.entry(i).or_insert((0.0, 0.0));
            entry.0 += gen.qmin_mvar;
            entry.1 += gen.qmax_mvar;
        }
    }

    let mut switched_buses: HashSet<usize> = HashSet::new();
    for round in 0..MAX_Q_ROUNDS {
        let nr = newton_iterations(
            &bus_ids, &bus_types, &y_bus, &p_spec, &q_spec, &mut v_mag, &mut v_ang, opts,
        );

        if !nr.converged {
            let detail = nr.note.unwrap_or_else(|| {
                format!(
                    "power mismatch {:.3e} p.u. after {} iterations",
                    nr.max_mismatch, nr.iterations
                )
            });
            return Ok(NewtonOutcome::NotConverged(Divergence {
                bus_ids,
                v_mag,
                v_ang_rad: v_ang,
                iterations: nr.iterations,
                max_mismatch_pu: nr.max_mismatch,
                detail,
            }));
        }

        if !opts.enforce_q_limits {
            return Ok(NewtonOutcome::Converged(NewtonSolution {
                bus_ids,
                v_mag,
                v_ang_rad: v_ang,
                iterations: nr.iterations,
                max_mismatch_pu: nr.max_mismatch,
                bus_types,
            }));
        }

        // Check PV buses against the aggregate generator Q capability.
        let (_, q_calc) = compute_power(&y_bus, &v_mag, &v_ang);
        let mut switched = false;
        for (i, &bus_id) in bus_ids.iter().enumerate() {
            if bus_types.get(&bus_id) != Some(&BusType::Pv) || switched_buses.contains(&i) {
                continue;
            }
            let Some(&(qmin, qmax)) = q_caps.get(&i) else {
                continue;
            };
            let required_mvar = (q_calc[i] - q_nongen[i]) * base;
            let fixed = if required_mvar > qmax + 1e-9 && qmax.is_finite() {
                Some(qmax)
            } else if required_mvar < qmin - 1e-9 && qmin.is_finite() {
                Some(qmin)
            } else {
                None
            };
            if let Some(q_limit) = fixed {
                warn!(
                    bus = %bus_id,
                    required_mvar,
                    q_limit,
                    "generator reactive limit hit, switching bus PV->PQ"
                );
                bus_types.insert(bus_id, BusType::Pq);
                switched_buses.insert(i);
                q_spec[i] = q_nongen[i] + q_limit / base;
                switched = true;
            }
        }

        if !switched {
            return Ok(NewtonOutcome::Converged(NewtonSolution {
                bus_ids,
                v_mag,
                v_ang_rad: v_ang,
                iterations: nr.iterations,
                max_mismatch_pu: nr.max_mismatch,
                bus_types,
            }));
        }
        debug!(round = round + 1, "re-solving after PV->PQ switching");
    }

    Ok(NewtonOutcome::NotConverged(Divergence {
        iterations: opts.max_iterations,
        max_mismatch_pu: f64::INFINITY,
        detail: format!(
            "reactive-limit enforcement did not settle after {} rounds",
            MAX_Q_ROUNDS
        ),
        bus_ids,
        v_mag,
        v_ang_rad: v_ang,
    }))
}

/// Every bus must reach the reference through in-service branches.
fn check_connectivity(
    bus_ids: &[BusId],
    idx: &HashMap<BusId, usize>,
    slack_idx: usize,
    branches: &[BranchData],
) -> Result<()> {
    let n = bus_ids.len();
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];
    for branch in branches {
        if let (Some(&i), Some(&j)) = (idx.get(&branch.from), idx.get(&branch.to)) {
            adjacency[i].push(j);
            adjacency[j].push(i);
        }
    }

    let mut visited = vec![false; n];
    let mut queue = VecDeque::from([slack_idx]);
    visited[slack_idx] = true;
    while let Some(i) = queue.pop_front() {
        for &j in &adjacency[i] {
            if !visited[j] {
                visited[j] = true;
                queue.push_back(j);
            }
        }
    }

    if let Some(i) = visited.iter().position(|&v| !v) {
        bail!(
            "bus {} is isolated from the reference bus; cannot solve the island",
            bus_ids[i]
        );
    }
    Ok(())
}

/// Admittance matrix over the in-service topology, including branch taps,
/// phase shifts, line charging, and bus shunts.
fn build_y_bus(
    net: &Network,
    idx: &HashMap<BusId, usize>,
    branches: &[BranchData],
) -> Vec<Vec<Complex64>> {
    let n = idx.len();
    let mut y_bus = vec![vec![Complex64::new(0.0, 0.0); n]; n];

    for branch in branches {
        let (Some(&i), Some(&j)) = (idx.get(&branch.from), idx.get(&branch.to)) else {
            continue;
        };
        let z = Complex64::new(branch.r_pu, branch.x_pu);
        let y_series = z.inv();
        let b_shunt = Complex64::new(0.0, branch.charging_b_pu / 2.0);

        let tap = Complex64::from_polar(branch.tap, branch.shift_rad);
        let tap_mag_sq = branch.tap * branch.tap;

        y_bus[i][j] += -(y_series / tap.conj());
        y_bus[j][i] += -(y_series / tap);
        y_bus[i][i] += y_series / tap_mag_sq + b_shunt;
        y_bus[j][j] += y_series + b_shunt;
    }

    for shunt in net.shunts().into_iter().filter(|s| s.in_service) {
        if let Some(&i) = idx.get(&shunt.bus) {
            y_bus[i][i] += Complex64::new(shunt.gs_pu, shunt.bs_pu);
        }
    }

    y_bus
}

/// Linearized angle estimate used as the Newton starting point.
///
/// Solves the reduced susceptance system B'·θ = P over in-service branches.
/// Falls back to the flat start when the reduced system is singular (a
/// structural problem the main solve will report properly).
fn apply_dc_start(
    v_ang: &mut [f64],
    slack_idx: usize,
    idx: &HashMap<BusId, usize>,
    branches: &[BranchData],
    p_spec: &[f64],
    _opts: &PfOptions,
) {
    let n = v_ang.len();
    if n <= 1 {
        return;
    }

    let mut triplets = TriMat::new((n, n));
    for branch in branches {
        let (Some(&i), Some(&j)) = (idx.get(&branch.from), idx.get(&branch.to)) else {
            continue;
        };
        if branch.x_pu.abs() < 1e-12 {
            continue;
        }
        let b = 1.0 / (branch.x_pu * branch.tap);
        triplets.add_triplet(i, j, -b);
        triplets.add_triplet(j, i, -b);
        triplets.add_triplet(i, i, b);
        triplets.add_triplet(j, j, b);
    }
    let b_prime = triplets.to_csr::<usize>();

    // Reduced system: drop the slack row and column.
    let reduced: Vec<usize> = (0..n).filter(|&i| i != slack_idx).collect();
    let m = reduced.len();
    let mut mat = Mat::zeros(m, m);
    let mut rhs = Mat::zeros(m, 1);
    for (row, &i) in reduced.iter().enumerate() {
        rhs.write(row, 0, p_spec[i]);
        if let Some(row_view) = b_prime.outer_view(i) {
            for (j, &b_ij) in row_view.iter() {
                if let Some(col) = reduced.iter().position(|&k| k == j) {
                    mat.write(row, col, b_ij);
                }
            }
        }
    }

    let lu = mat.partial_piv_lu();
    let theta = lu.solve(&rhs);
    let deltas: Vec<f64> = (0..m).map(|i| theta.read(i, 0)).collect();
    if deltas.iter().any(|d| !d.is_finite()) {
        warn!("DC start produced a singular system, falling back to flat start");
        return;
    }
    for (row, &i) in reduced.iter().enumerate() {
        v_ang[i] += deltas[row];
    }
}

struct NrResult {
    converged: bool,
    iterations: usize,
    max_mismatch: f64,
    note: Option<String>,
}

#[allow(clippy::too_many_arguments)]
fn newton_iterations(
    bus_ids: &[BusId],
    bus_types: &HashMap<BusId, BusType>,
    y_bus: &[Vec<Complex64>],
    p_spec: &[f64],
    q_spec: &[f64],
    v_mag: &mut [f64],
    v_ang: &mut [f64],
    opts: &PfOptions,
) -> NrResult {
    // P equations at every non-slack bus, Q equations at PQ buses.
    let mut p_buses: Vec<usize> = Vec::new();
    let mut q_buses: Vec<usize> = Vec::new();
    for (i, bus_id) in bus_ids.iter().enumerate() {
        let bus_type = bus_types.get(bus_id).copied().unwrap_or(BusType::Pq);
        if bus_type != BusType::Slack {
            p_buses.push(i);
        }
        if bus_type == BusType::Pq {
            q_buses.push(i);
        }
    }
    let n_p = p_buses.len();
    let n_vars = n_p + q_buses.len();
    if n_vars == 0 {
        return NrResult {
            converged: true,
            iterations: 0,
            max_mismatch: 0.0,
            note: None,
        };
    }

    for iter in 0..opts.max_iterations {
        let (p_calc, q_calc) = compute_power(y_bus, v_mag, v_ang);

        let mut mismatch = vec![0.0; n_vars];
        let mut max_mismatch: f64 = 0.0;
        for (k, &i) in p_buses.iter().enumerate() {
            mismatch[k] = p_spec[i] - p_calc[i];
            max_mismatch = max_mismatch.max(mismatch[k].abs());
        }
        for (k, &i) in q_buses.iter().enumerate() {
            mismatch[n_p + k] = q_spec[i] - q_calc[i];
            max_mismatch = max_mismatch.max(mismatch[n_p + k].abs());
        }

        if max_mismatch < opts.tolerance {
            return NrResult {
                converged: true,
                iterations: iter,
                max_mismatch,
                note: None,
            };
        }

        let jacobian = build_jacobian(y_bus, v_mag, v_ang, &p_buses, &q_buses);
        let delta = if opts.accelerate {
            solve_linear_system_faer(&jacobian, &mismatch)
        } else {
            solve_linear_system_gauss(&jacobian, &mismatch)
        };
        let delta = match delta {
            Ok(d) => d,
            Err(e) => {
                return NrResult {
                    converged: false,
                    iterations: iter,
                    max_mismatch,
                    note: Some(e.to_string()),
                }
            }
        };

        for (k, &i) in p_buses.iter().enumerate() {
            v_ang[i] += delta[k];
        }
        for (k, &i) in q_buses.iter().enumerate() {
            v_mag[i] += delta[n_p + k];
        }

        if v_mag.iter().any(|v| !v.is_finite() || *v <= 0.0)
            || v_ang.iter().any(|a| !a.is_finite())
        {
            return NrResult {
                converged: false,
                iterations: iter + 1,
                max_mismatch,
                note: Some("voltage state diverged to a non-physical point".into()),
            };
        }
    }

    // Report the final mismatch for the divergence payload.
    let (p_calc, q_calc) = compute_power(y_bus, v_mag, v_ang);
    let mut max_mismatch: f64 = 0.0;
    for &i in &p_buses {
        max_mismatch = max_mismatch.max((p_spec[i] - p_calc[i]).abs());
    }
    for &i in &q_buses {
        max_mismatch = max_mismatch.max((q_spec[i] - q_calc[i]).abs());
    }
    NrResult {
        converged: false,
        iterations: opts.max_iterations,
        max_mismatch,
        note: None,
    }
}

/// P and Q injections implied by the current voltage state.
pub(crate) fn compute_power(
    y_bus: &[Vec<Complex64>],
    v_mag: &[f64],
    v_ang: &[f64],
) -> (Vec<f64>, Vec<f64>) {
    let n = v_mag.len();
    let mut p = vec![0.0; n];
    let mut q = vec![0.0; n];
    for i in 0..n {
        for j in 0..n {
            let y = y_bus[i][j];
            let theta = v_ang[i] - v_ang[j];
            let (sin_t, cos_t) = theta.sin_cos();
            p[i] += v_mag[i] * v_mag[j] * (y.re * cos_t + y.im * sin_t);
            q[i] += v_mag[i] * v_mag[j] * (y.re * sin_t - y.im * cos_t);
        }
    }
    (p, q)
}

fn build_jacobian(
    y_bus: &[Vec<Complex64>],
    v_mag: &[f64],
    v_ang: &[f64],
    p_buses: &[usize],
    q_buses: &[usize],
) -> Vec<Vec<f64>> {
    let n_p = p_buses.len();
    let n_q = q_buses.len();
    let n_vars = n_p + n_q;
    let (p_calc, q_calc) = compute_power(y_bus, v_mag, v_ang);

    let mut jac = vec![vec![0.0; n_vars]; n_vars];

    // J11: dP/dθ
    for (row, &i) in p_buses.iter().enumerate() {
        for (col, &j) in p_buses.iter().enumerate() {
            let y = y_bus[i][j];
            jac[row][col] = if i == j {
                -q_calc[i] - y.im * v_mag[i] * v_mag[i]
            } else {
                let theta = v_ang[i] - v_ang[j];
                v_mag[i] * v_mag[j] * (y.re * theta.sin() - y.im * theta.cos())
            };
        }
    }

    // J12: dP/dV
    for (row, &i) in p_buses.iter().enumerate() {
        for (col, &j) in q_buses.iter().enumerate() {
            let y = y_bus[i][j];
            jac[row][n_p + col] = if i == j {
                p_calc[i] / v_mag[i] + y.re * v_mag[i]
            } else {
                let theta = v_ang[i] - v_ang[j];
                v_mag[i] * (y.re * theta.cos() + y.im * theta.sin())
            };
        }
    }

    // J21: dQ/dθ
    for (row, &i) in q_buses.iter().enumerate() {
        for (col, &j) in p_buses.iter().enumerate() {
            let y = y_bus[i][j];
            jac[n_p + row][col] = if i == j {
                p_calc[i] - y.re * v_mag[i] * v_mag[i]
            } else {
                let theta = v_ang[i] - v_ang[j];
                -v_mag[i] * v_mag[j] * (y.re * theta.cos() + y.im * theta.sin())
            };
        }
    }

    // J22: dQ/dV
    for (row, &i) in q_buses.iter().enumerate() {
        for (col, &j) in q_buses.iter().enumerate() {
            let y = y_bus[i][j];
            jac[n_p + row][n_p + col] = if i == j {
                q_calc[i] / v_mag[i] - y.im * v_mag[i]
            } else {
                let theta = v_ang[i] - v_ang[j];
                v_mag[i] * (y.re * theta.sin() - y.im * theta.cos())
            };
        }
    }

    jac
}

/// LU with partial pivoting via faer; the accelerated default.
fn solve_linear_system_faer(a: &[Vec<f64>], b: &[f64]) -> Result<Vec<f64>> {
    let n = b.len();
    if n == 0 {
        return Ok(vec![]);
    }
    let mut mat = Mat::zeros(n, n);
    for (i, row) in a.iter().enumerate() {
        for (j, &val) in row.iter().enumerate() {
            mat.write(i, j, val);
        }
    }
    let mut rhs = Mat::zeros(n, 1);
    for (i, &val) in b.iter().enumerate() {
        rhs.write(i, 0, val);
    }

    let lu = mat.partial_piv_lu();
    let solution = lu.solve(&rhs);
    let x: Vec<f64> = (0..n).map(|i| solution.read(i, 0)).collect();
    if x.iter().any(|v| !v.is_finite()) {
        bail!("singular Jacobian matrix");
    }
    Ok(x)
}

/// Plain Gaussian elimination with partial pivoting; the fallback path
/// behind the acceleration toggle.
fn solve_linear_system_gauss(a: &[Vec<f64>], b: &[f64]) -> Result<Vec<f64>> {
    let n = b.len();
    if n == 0 {
        return Ok(vec![]);
    }
    let mut aug: Vec<Vec<f64>> = a.to_vec();
    for (i, row) in aug.iter_mut().enumerate() {
        row.push(b[i]);
    }

    for col in 0..n {
        let mut max_row = col;
        let mut max_val = aug[col][col].abs();
        for row in (col + 1)..n {
            if aug[row][col].abs() > max_val {
                max_val = aug[row][col].abs();
                max_row = row;
            }
        }
        if max_val < 1e-12 {
            bail!("singular Jacobian matrix");
        }
        aug.swap(col, max_row);

        for row in (col + 1)..n {
            let factor = aug[row][col] / aug[col][col];
            for j in col..=n {
                aug[row][j] -= factor * aug[col][j];
            }
        }
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = aug[i][n];
        for j in (i + 1)..n {
            sum -= aug[i][j] * x[j];
        }
        x[i] = sum / aug[i][i];
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_solvers_agree() {
        let a = vec![
            vec![4.0, 1.0, 0.0],
            vec![1.0, 4.0, 1.0],
            vec![0.0, 1.0, 4.0],
        ];
        let b = vec![1.0, 2.0, 1.0];
        let x_faer = solve_linear_system_faer(&a, &b).unwrap();
        let x_gauss = solve_linear_system_gauss(&a, &b).unwrap();
        for i in 0..3 {
            assert!((x_faer[i] - x_gauss[i]).abs() < 1e-10);
        }
    }

    #[test]
    fn test_singular_system_rejected() {
        let a = vec![vec![1.0, 1.0], vec![1.0, 1.0]];
        let b = vec![1.0, 2.0];
        assert!(solve_linear_system_gauss(&a, &b).is_err());
    }

    #[test]
    fn test_compute_power_zero_state() {
        // Flat voltage, zero angles, symmetric Y-bus: injections are the
        // row sums of the admittance matrix.
        let y = Complex64::new(2.0, -4.0);
        let y_bus = vec![vec![y, -y], vec![-y, y]];
        let (p, q) = compute_power(&y_bus, &[1.0, 1.0], &[0.0, 0.0]);
        assert!(p.iter().all(|v| v.abs() < 1e-12));
        assert!(q.iter().all(|v| v.abs() < 1e-12));
    }
}
