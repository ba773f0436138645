use anyhow::{anyhow, Result};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tabwriter::TabWriter;

use gsa_algo::{run_dispatch, OpfOptions, PowerSummary, ViolationSummary};
use gsa_core::SourceResult;

use crate::commands::util::{load_network, parse_cost_args, write_json};

#[derive(Serialize)]
struct OpfExport<'a> {
    case: &'a str,
    objective_cost: f64,
    dispatch: &'a [SourceResult],
    violations: ViolationSummary,
    summary: PowerSummary,
}

pub fn handle(case: &str, costs: &[String], json: Option<&PathBuf>) -> Result<()> {
    let assignment = parse_cost_args(costs)?;
    let mut net = load_network(case, None)?;
    let outcome = net.assign_costs(&assignment)?;
    if outcome.skipped > 0 {
        println!(
            "note: {} cost entr{} referenced sources not in {case} and were skipped",
            outcome.skipped,
            if outcome.skipped == 1 { "y" } else { "ies" }
        );
    }

    let report = run_dispatch(&mut net, &OpfOptions::default())
        .map_err(|failure| anyhow!("dispatch on {case} failed: {failure}"))?;

    let mut writer = TabWriter::new(std::io::stdout());
    writeln!(writer, "SOURCE\tNAME\tP MW\tQ MVAR")?;
    for row in &report.dispatch {
        writeln!(
            writer,
            "{}\t{}\t{:.2}\t{:.2}",
            row.source, row.name, row.p_mw, row.q_mvar
        )?;
    }
    writer.flush()?;

    println!();
    println!("objective cost: {:.2}", report.objective_cost);
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
            &OpfExport {
                case,
                objective_cost: report.objective_cost,
                dispatch: &report.dispatch,
                violations: report.violations,
                summary: report.summary,
            },
        )?;
    }
    Ok(())
}
