//! Synthetic 5-bus transmission grid.
//!
//! Small meshed system with deliberately tight thermal ratings: dispatch
//! changes visibly re-route flows, and single outages can overload the
//! survivors. Two dispatchable machines plus the grid tie.

use gsa_core::{
    Branch, BranchId, Bus, BusId, ExtGrid, ExtGridId, Gen, GenId, Load, LoadId, Network,
};

pub fn case5() -> Network {
    let mut net = Network::new();

    for i in 0..5 {
        net.add_bus(Bus {
            id: BusId::new(i),
            name: format!("Bus {}", i),
            base_kv: 230.0,
            ..Bus::default()
        });
    }

    net.add_ext_grid(
        ExtGrid::new(ExtGridId::new(0), "Grid tie", BusId::new(0)).with_voltage(1.02),
    )
    .expect("bus 0 exists");

    net.add_gen(
        Gen::new(GenId::new(0), "Unit A", BusId::new(2), 80.0)
            .with_setpoint(1.01)
            .with_p_limits(0.0, 120.0)
            .with_q_limits(-60.0, 60.0),
    )
    .expect("bus 2 exists");
    net.add_gen(
        Gen::new(GenId::new(1), "Unit B", BusId::new(3), 50.0)
            .with_setpoint(1.01)
            .with_p_limits(0.0, 100.0)
            .with_q_limits(-50.0, 50.0),
    )
    .expect("bus 3 exists");

    net.add_load(Load::new(LoadId::new(0), "City load", BusId::new(1), 90.0, 30.0))
        .expect("bus 1 exists");
    net.add_load(Load::new(LoadId::new(1), "Mill load", BusId::new(4), 70.0, 20.0))
        .expect("bus 4 exists");

    let lines: [(usize, usize, usize, f64, f64, f64, f64); 6] = [
        (0, 0, 1, 0.010, 0.060, 0.030, 120.0),
        (1, 0, 2, 0.020, 0.090, 0.030, 100.0),
        (2, 1, 2, 0.020, 0.080, 0.020, 80.0),
        (3, 1, 3, 0.015, 0.070, 0.020, 80.0),
        (4, 2, 4, 0.020, 0.090, 0.020, 90.0),
        (5, 3, 4, 0.025, 0.100, 0.020, 90.0),
    ];
    for (id, from, to, r, x, b, rate) in lines {
        net.add_branch(
            Branch::line(
                BranchId::new(id),
                format!("{}-{}", from, to),
                BusId::new(from),
                BusId::new(to),
                r,
                x,
            )
            .with_charging(b)
            .with_rating(rate),
        )
        .expect("endpoints exist");
    }

    net
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case5_balance() {
        let net = case5();
        assert!((net.total_load_mw() - 160.0).abs() < 1e-9);
        assert_eq!(net.generators().len(), 2);
        assert!(net.branches().iter().all(|b| b.rating_mva.is_some()));
    }
}
