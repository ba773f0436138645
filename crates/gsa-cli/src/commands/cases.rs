use anyhow::Result;
use std::io::Write;
use tabwriter::TabWriter;

use gsa_cli::cli::CasesCommands;
use gsa_core::Diagnostics;

pub fn handle(command: &CasesCommands) -> Result<()> {
    match command {
        CasesCommands::List => {
            let mut writer = TabWriter::new(std::io::stdout());
            writeln!(writer, "NAME\tBUSES\tBRANCHES\tLOAD MW")?;
            for name in gsa_cases::available_cases() {
                let stats = gsa_cases::load_case(name)?.stats();
                writeln!(
                    writer,
                    "{}\t{}\t{}\t{:.1}",
                    name, stats.num_buses, stats.num_branches, stats.total_load_mw
                )?;
            }
            writer.flush()?;
            Ok(())
        }
        CasesCommands::Show { name } => {
            let net = gsa_cases::load_case(name)?;
            println!("{}: {}", name, net.stats());
            let mut diag = Diagnostics::new();
            net.validate_into(&mut diag);
            if diag.is_empty() {
                println!("validation: clean");
            } else {
                print!("validation: {}", diag);
            }
            Ok(())
        }
    }
}
