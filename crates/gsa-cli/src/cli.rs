//! Argument definitions for the `gsa` binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Grid security assessment toolkit", long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Benchmark case catalog
    Cases {
        #[command(subcommand)]
        command: CasesCommands,
    },
    /// AC power flow on a benchmark case
    Pf {
        /// Case name from the catalog
        #[arg(long)]
        case: String,
        /// Voltage initialization: flat or dc
        #[arg(long, default_value = "dc")]
        init: String,
        /// Disable generator reactive-limit enforcement
        #[arg(long)]
        no_q_limits: bool,
        /// Ignore reference angle and branch phase shifts
        #[arg(long)]
        no_angles: bool,
        /// Use plain Gaussian elimination instead of the optimized LU path
        #[arg(long)]
        plain_solver: bool,
        /// Newton iteration cap
        #[arg(long, default_value_t = 20)]
        max_iterations: usize,
        /// Add a capacitor bank before solving: BUS:QMVAR (e.g. 28:50)
        #[arg(long)]
        shunt: Option<String>,
        /// Write the solved tables as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Least-cost constrained dispatch
    Opf {
        /// Case name from the catalog
        #[arg(long)]
        case: String,
        /// Marginal cost per source, repeatable: SRC=PRICE (e.g. gen0=10)
        #[arg(long = "cost", required = true)]
        costs: Vec<String>,
        /// Write the dispatch report as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// N-1 contingency screening
    Nminus1 {
        /// Case name from the catalog
        #[arg(long)]
        case: String,
        /// Re-solve each outage with full dispatch instead of power flow
        #[arg(long)]
        dispatch: bool,
        /// Evaluate outages concurrently
        #[arg(long)]
        parallel: bool,
        /// Marginal costs, required with --dispatch: SRC=PRICE
        #[arg(long = "cost")]
        costs: Vec<String>,
        /// Add a capacitor bank before solving: BUS:QMVAR
        #[arg(long)]
        shunt: Option<String>,
        /// Write the report as JSON
        #[arg(long)]
        json: Option<PathBuf>,
        /// Write the report as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Full analysis: power flow, dispatch, and N-1 screening with KPIs
    Report {
        /// Case name from the catalog
        #[arg(long)]
        case: String,
        /// Marginal cost per source, repeatable: SRC=PRICE
        #[arg(long = "cost", required = true)]
        costs: Vec<String>,
        /// Add a capacitor bank before solving: BUS:QMVAR
        #[arg(long)]
        shunt: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum CasesCommands {
    /// List the catalog
    List,
    /// Show element counts for one case
    Show {
        /// Case name from the catalog
        name: String,
    },
}
