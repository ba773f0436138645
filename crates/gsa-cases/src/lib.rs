//! # gsa-cases: Benchmark Network Catalog
//!
//! Fixed catalog of reference transmission grids, constructed in code. Case
//! names are the loading interface of the analysis tools: an unknown name is
//! a hard [`GsaError::Catalog`] fault, per the load-error policy.
//!
//! | name | size | notes |
//! |---|---|---|
//! | `case5` | 5 buses, 6 branches | synthetic grid with tight thermal ratings |
//! | `case9` | 9 buses, 9 branches | 3-machine reference grid, violation-free base case |
//! | `case14` | 14 buses, 20 branches | reference grid with transformers and a shunt |
//! | `case30` | 30 buses, 41 branches | medium reference grid, six machines |

use gsa_core::{BusId, GsaError, GsaResult, Network, Shunt, ShuntId};

mod case14;
mod case30;
mod case5;
mod case9;

pub use case14::case14;
pub use case30::case30;
pub use case5::case5;
pub use case9::case9;

/// Catalog names accepted by [`load_case`].
pub fn available_cases() -> &'static [&'static str] {
    &["case5", "case9", "case14", "case30"]
}

/// Construct a benchmark network by catalog name.
pub fn load_case(name: &str) -> GsaResult<Network> {
    match name {
        "case5" => Ok(case5()),
        "case9" => Ok(case9()),
        "case14" => Ok(case14()),
        "case30" => Ok(case30()),
        _ => Err(GsaError::Catalog {
            name: name.to_string(),
            available: available_cases().join(", "),
        }),
    }
}

/// Add a capacitor bank at `bus`, rated `q_mvar` at nominal voltage.
///
/// Reference cases are not always N-1 secure as published; reactive support
/// at a weak bus is the usual reinforcement to clear post-contingency
/// voltage collapse.
pub fn reinforce_with_shunt(net: &mut Network, bus: BusId, q_mvar: f64) -> GsaResult<ShuntId> {
    let id = ShuntId::new(net.shunts().len());
    let shunt = Shunt::capacitor(
        id,
        format!("Capacitor bank at bus {}", bus),
        bus,
        q_mvar,
        net.base_mva,
    );
    net.add_shunt(shunt)?;
    tracing::info!(%bus, q_mvar, "added reinforcement shunt");
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gsa_core::Diagnostics;

    #[test]
    fn test_unknown_case_is_catalog_error() {
        let err = load_case("case99").unwrap_err();
        match err {
            GsaError::Catalog { name, available } => {
                assert_eq!(name, "case99");
                assert!(available.contains("case9"));
            }
            other => panic!("expected catalog error, got {other}"),
        }
    }

    #[test]
    fn test_every_listed_case_loads_and_validates() {
        for name in available_cases() {
            let net = load_case(name).unwrap();
            let mut diag = Diagnostics::new();
            net.validate_into(&mut diag);
            assert!(!diag.has_errors(), "{name}: {diag}");
        }
    }

    #[test]
    fn test_case_sizes() {
        let sizes = [
            ("case5", 5usize, 6usize),
            ("case9", 9, 9),
            ("case14", 14, 20),
            ("case30", 30, 41),
        ];
        for (name, buses, branches) in sizes {
            let stats = load_case(name).unwrap().stats();
            assert_eq!(stats.num_buses, buses, "{name} buses");
            assert_eq!(stats.num_branches, branches, "{name} branches");
        }
    }

    #[test]
    fn test_every_case_has_reference_source() {
        for name in available_cases() {
            let net = load_case(name).unwrap();
            assert_eq!(net.ext_grids().len(), 1, "{name}");
        }
    }

    #[test]
    fn test_reinforce_with_shunt() {
        let mut net = load_case("case30").unwrap();
        let before = net.shunts().len();
        reinforce_with_shunt(&mut net, BusId::new(28), 50.0).unwrap();
        assert_eq!(net.shunts().len(), before + 1);
        let added = *net.shunts().last().unwrap();
        assert!((added.bs_pu - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_reinforce_rejects_missing_bus() {
        let mut net = load_case("case5").unwrap();
        assert!(reinforce_with_shunt(&mut net, BusId::new(40), 10.0).is_err());
    }
}
