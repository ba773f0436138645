use anyhow::{anyhow, Result};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tabwriter::TabWriter;

use gsa_algo::{run_power_flow, InitStrategy, PfOptions, PowerSummary, ViolationSummary};
use gsa_core::SolvedState;

use crate::commands::util::{load_network, write_json};

#[derive(Serialize)]
struct PfExport<'a> {
    case: &'a str,
    violations: ViolationSummary,
    summary: PowerSummary,
    results: &'a SolvedState,
}

#[allow(clippy::too_many_arguments)]
pub fn handle(
    case: &str,
    init: &str,
    no_q_limits: bool,
    no_angles: bool,
    plain_solver: bool,
    max_iterations: usize,
    shunt: Option<&str>,
    json: Option<&PathBuf>,
) -> Result<()> {
    let init: InitStrategy = init.parse().map_err(|e: String| anyhow!(e))?;
    let opts = PfOptions::default()
        .with_init(init)
        .with_q_limit_enforcement(!no_q_limits)
        .with_voltage_angles(!no_angles)
        .with_acceleration(!plain_solver)
        .with_max_iterations(max_iterations);

    let mut net = load_network(case, shunt)?;
    let report = run_power_flow(&mut net, &opts)
        .map_err(|failure| anyhow!("power flow on {case} failed: {failure}"))?;

    let state = net
        .results
        .as_ref()
        .expect("successful solve populates results");

    let mut writer = TabWriter::new(std::io::stdout());
    writeln!(writer, "BUS\tVM PU\tVA DEG")?;
    for row in &state.bus {
        writeln!(writer, "{}\t{:.4}\t{:.3}", row.bus, row.vm_pu, row.va_deg)?;
    }
    writeln!(writer)?;
    writeln!(writer, "BRANCH\tP FROM MW\tQ FROM MVAR\tLOSS MW\tLOADING %")?;
    for row in &state.branch {
        writeln!(
            writer,
            "{}\t{:.2}\t{:.2}\t{:.3}\t{:.1}",
            row.branch, row.p_from_mw, row.q_from_mvar, row.pl_mw, row.loading_percent
        )?;
    }
    writer.flush()?;

    println!();
    println!(
        "load {:.2} MW, generation {:.2} MW, losses {:.2} MW ({:.2}%)",
        report.summary.total_load_mw,
        report.summary.total_gen_mw,
        report.summary.losses_mw,
        report.summary.loss_percent
    );
    println!(
        "violations: {} voltage, {} overload",
        report.violations.voltage_violations, report.violations.overloaded_branches
    );

    if let Some(path) = json {
        write_json(
            path,
            &PfExport {
                case,
                violations: report.violations,
                summary: report.summary,
                results: state,
            },
        )?;
    }
    Ok(())
}
