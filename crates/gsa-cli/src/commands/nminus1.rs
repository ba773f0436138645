use anyhow::{anyhow, bail, Result};
use std::io::Write;
use std::path::PathBuf;
use tabwriter::TabWriter;

use gsa_algo::{run_n1, run_power_flow, N1Options, N1Report, OpfOptions, PfOptions, Resolve};

use crate::commands::util::{load_network, parse_cost_args, write_json};

#[allow(clippy::too_many_arguments)]
pub fn handle(
    case: &str,
    dispatch: bool,
    parallel: bool,
    costs: &[String],
    shunt: Option<&str>,
    json: Option<&PathBuf>,
    csv: Option<&PathBuf>,
) -> Result<()> {
    let mut net = load_network(case, shunt)?;

    let resolve = if dispatch {
        if costs.is_empty() {
            bail!("--dispatch requires at least one --cost entry");
        }
        net.assign_costs(&parse_cost_args(costs)?)?;
        Resolve::Dispatch(OpfOptions::default())
    } else {
        Resolve::PowerFlow(PfOptions::default())
    };

    // Screening starts from a solved base case.
    run_power_flow(&mut net, &PfOptions::default())
        .map_err(|failure| anyhow!("base power flow on {case} failed: {failure}"))?;

    let opts = N1Options::default()
        .with_resolve(resolve)
        .with_parallel(parallel);
    let report = run_n1(&net, &opts);

    print_report(&report)?;
    println!();
    println!(
        "{}/{} outages secure",
        report.len() - report.failures(),
        report.len()
    );

    if let Some(path) = json {
        write_json(path, &report)?;
    }
    if let Some(path) = csv {
        let mut writer = csv::Writer::from_path(path)?;
        for outcome in &report.outcomes {
            writer.serialize(outcome)?;
        }
        writer.flush()?;
        println!("wrote {}", path.display());
    }
    Ok(())
}

fn print_report(report: &N1Report) -> Result<()> {
    let mut writer = TabWriter::new(std::io::stdout());
    writeln!(writer, "CONTINGENCY\tSTATUS\tREASON\tDETAILS")?;
    for outcome in &report.outcomes {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}",
            outcome.label, outcome.status, outcome.reason, outcome.details
        )?;
    }
    writer.flush()?;
    Ok(())
}
