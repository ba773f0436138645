//! Shared helpers for the command handlers.

use anyhow::{anyhow, Context, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use gsa_core::{BusId, CostAssignment, Network, SourceRef};

/// Parse repeatable `--cost SRC=PRICE` arguments.
pub fn parse_cost_args(args: &[String]) -> Result<CostAssignment> {
    let mut assignment = CostAssignment::new();
    for arg in args {
        let (source, price) = arg
            .split_once('=')
            .ok_or_else(|| anyhow!("bad cost `{}` (expected SRC=PRICE, e.g. gen0=10)", arg))?;
        let source: SourceRef = source.parse().map_err(|e| anyhow!("bad cost `{arg}`: {e}"))?;
        let price: f64 = price
            .parse()
            .with_context(|| format!("bad price in cost `{}`", arg))?;
        assignment.insert(source, price);
    }
    Ok(assignment)
}

/// Parse a `--shunt BUS:QMVAR` argument.
pub fn parse_shunt_arg(arg: &str) -> Result<(BusId, f64)> {
    let (bus, q) = arg
        .split_once(':')
        .ok_or_else(|| anyhow!("bad shunt `{}` (expected BUS:QMVAR, e.g. 28:50)", arg))?;
    let bus: usize = bus
        .parse()
        .with_context(|| format!("bad bus in shunt `{}`", arg))?;
    let q: f64 = q
        .parse()
        .with_context(|| format!("bad Mvar in shunt `{}`", arg))?;
    Ok((BusId::new(bus), q))
}

/// Load a catalog case and apply the optional reinforcement shunt.
pub fn load_network(case: &str, shunt: Option<&str>) -> Result<Network> {
    let mut net = gsa_cases::load_case(case)?;
    if let Some(arg) = shunt {
        let (bus, q_mvar) = parse_shunt_arg(arg)?;
        gsa_cases::reinforce_with_shunt(&mut net, bus, q_mvar)?;
    }
    Ok(net)
}

/// Serialize a report to pretty JSON at `path`.
pub fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)?;
    println!("wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cost_args() {
        let assignment =
            parse_cost_args(&["gen0=10".into(), "ext_grid0=25.5".into()]).unwrap();
        assert_eq!(assignment.len(), 2);
        assert_eq!(assignment.get(SourceRef::gen(0)), Some(10.0));
        assert_eq!(assignment.get(SourceRef::ext_grid(0)), Some(25.5));
    }

    #[test]
    fn test_parse_cost_args_rejects_garbage() {
        assert!(parse_cost_args(&["gen0".into()]).is_err());
        assert!(parse_cost_args(&["windmill0=10".into()]).is_err());
        assert!(parse_cost_args(&["gen0=cheap".into()]).is_err());
    }

    #[test]
    fn test_parse_shunt_arg() {
        let (bus, q) = parse_shunt_arg("28:50").unwrap();
        assert_eq!(bus, BusId::new(28));
        assert_eq!(q, 50.0);
        assert!(parse_shunt_arg("28").is_err());
    }
}
