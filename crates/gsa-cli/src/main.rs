use clap::Parser;
use tracing_subscriber::FmtSubscriber;

use gsa_cli::cli::{Cli, Commands};

mod commands;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    match &cli.command {
        Commands::Cases { command } => commands::cases::handle(command),
        Commands::Pf {
            case,
            init,
            no_q_limits,
            no_angles,
            plain_solver,
            max_iterations,
            shunt,
            json,
        } => commands::pf::handle(
            case,
            init,
            *no_q_limits,
            *no_angles,
            *plain_solver,
            *max_iterations,
            shunt.as_deref(),
            json.as_ref(),
        ),
        Commands::Opf { case, costs, json } => commands::opf::handle(case, costs, json.as_ref()),
        Commands::Nminus1 {
            case,
            dispatch,
            parallel,
            costs,
            shunt,
            json,
            csv,
        } => commands::nminus1::handle(
            case,
            *dispatch,
            *parallel,
            costs,
            shunt.as_deref(),
            json.as_ref(),
            csv.as_ref(),
        ),
        Commands::Report { case, costs, shunt } => {
            commands::report::handle(case, costs, shunt.as_deref())
        }
    }
}
