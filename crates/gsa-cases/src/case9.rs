//! 9-bus, 3-machine reference grid.
//!
//! The classic small stability test system: three machines behind step-up
//! transformers feeding three loads over a 345 kV ring. Healthy base case:
//! power flow converges with every voltage inside the band and every branch
//! under its rating.

use gsa_core::{
    Branch, BranchId, BranchKind, Bus, BusId, ExtGrid, ExtGridId, Gen, GenId, Load, LoadId,
    Network,
};

pub fn case9() -> Network {
    let mut net = Network::new();

    for i in 0..9 {
        net.add_bus(Bus {
            id: BusId::new(i),
            name: format!("Bus {}", i + 1),
            base_kv: 345.0,
            ..Bus::default()
        });
    }

    net.add_ext_grid(
        ExtGrid::new(ExtGridId::new(0), "Machine 1", BusId::new(0)).with_voltage(1.04),
    )
    .expect("bus 0 exists");
    net.add_gen(
        Gen::new(GenId::new(0), "Machine 2", BusId::new(1), 163.0)
            .with_setpoint(1.025)
            .with_p_limits(10.0, 300.0)
            .with_q_limits(-300.0, 300.0),
    )
    .expect("bus 1 exists");
    net.add_gen(
        Gen::new(GenId::new(1), "Machine 3", BusId::new(2), 85.0)
            .with_setpoint(1.025)
            .with_p_limits(10.0, 270.0)
            .with_q_limits(-300.0, 300.0),
    )
    .expect("bus 2 exists");

    net.add_load(Load::new(LoadId::new(0), "Load A", BusId::new(4), 90.0, 30.0))
        .expect("bus 4 exists");
    net.add_load(Load::new(LoadId::new(1), "Load B", BusId::new(6), 100.0, 35.0))
        .expect("bus 6 exists");
    net.add_load(Load::new(LoadId::new(2), "Load C", BusId::new(8), 125.0, 50.0))
        .expect("bus 8 exists");

    // (id, from, to, r, x, b, rating, transformer)
    let branches: [(usize, usize, usize, f64, f64, f64, f64, bool); 9] = [
        (0, 0, 3, 0.0, 0.0576, 0.0, 250.0, true),
        (1, 3, 4, 0.017, 0.092, 0.158, 250.0, false),
        (2, 4, 5, 0.039, 0.17, 0.358, 150.0, false),
        (3, 2, 5, 0.0, 0.0586, 0.0, 300.0, true),
        (4, 5, 6, 0.0119, 0.1008, 0.209, 150.0, false),
        (5, 6, 7, 0.0085, 0.072, 0.149, 250.0, false),
        (6, 7, 1, 0.0, 0.0625, 0.0, 250.0, true),
        (7, 7, 8, 0.032, 0.161, 0.306, 250.0, false),
        (8, 8, 3, 0.01, 0.085, 0.176, 250.0, false),
    ];
    for (id, from, to, r, x, b, rate, is_tx) in branches {
        let name = format!("{}-{}", from + 1, to + 1);
        let mut branch = Branch::line(BranchId::new(id), name, BusId::new(from), BusId::new(to), r, x)
            .with_charging(b)
            .with_rating(rate);
        if is_tx {
            branch.kind = BranchKind::Transformer;
        }
        net.add_branch(branch).expect("endpoints exist");
    }

    net
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case9_structure() {
        let net = case9();
        let stats = net.stats();
        assert_eq!(stats.num_buses, 9);
        assert_eq!(stats.num_branches, 9);
        assert_eq!(stats.num_gens, 2);
        assert_eq!(stats.num_ext_grids, 1);
        assert!((stats.total_load_mw - 315.0).abs() < 1e-9);
    }

    #[test]
    fn test_case9_branch_ids_ascending() {
        let net = case9();
        let ids = net.branch_ids();
        let values: Vec<usize> = ids.iter().map(|id| id.value()).collect();
        assert_eq!(values, (0..9).collect::<Vec<_>>());
    }
}
