//! 14-bus reference grid.
//!
//! Two voltage levels joined by three tap-changing transformers, five
//! machines (four of them reactive-support only), and a capacitor bank.
//! Branches are unrated in the reference data, so thermal screening reports
//! no overloads here by construction.

use gsa_core::{
    Branch, BranchId, Bus, BusId, ExtGrid, ExtGridId, Gen, GenId, Load, LoadId, Network, Shunt,
    ShuntId,
};

pub fn case14() -> Network {
    let mut net = Network::new();

    for i in 0..14 {
        let base_kv = if i < 5 { 132.0 } else { 33.0 };
        net.add_bus(Bus {
            id: BusId::new(i),
            name: format!("Bus {}", i + 1),
            base_kv,
            ..Bus::default()
        });
    }

    net.add_ext_grid(
        ExtGrid::new(ExtGridId::new(0), "Slack machine", BusId::new(0)).with_voltage(1.06),
    )
    .expect("bus 0 exists");

    // (id, bus, p_mw, setpoint, qmin, qmax)
    let gens: [(usize, usize, f64, f64, f64, f64); 4] = [
        (0, 1, 40.0, 1.045, -40.0, 50.0),
        (1, 2, 0.0, 1.01, 0.0, 40.0),
        (2, 5, 0.0, 1.07, -6.0, 24.0),
        (3, 7, 0.0, 1.09, -6.0, 24.0),
    ];
    for (id, bus, p, vset, qmin, qmax) in gens {
        net.add_gen(
            Gen::new(GenId::new(id), format!("Machine {}", bus + 1), BusId::new(bus), p)
                .with_setpoint(vset)
                .with_p_limits(0.0, 100.0)
                .with_q_limits(qmin, qmax),
        )
        .expect("gen bus exists");
    }

    // (id, bus, p_mw, q_mvar)
    let loads: [(usize, usize, f64, f64); 11] = [
        (0, 1, 21.7, 12.7),
        (1, 2, 94.2, 19.0),
        (2, 3, 47.8, -3.9),
        (3, 4, 7.6, 1.6),
        (4, 8, 29.5, 16.6),
        (5, 9, 9.0, 5.8),
        (6, 10, 3.5, 1.8),
        (7, 11, 6.1, 1.6),
        (8, 12, 13.5, 5.8),
        (9, 13, 14.9, 5.0),
        (10, 5, 11.2, 7.5),
    ];
    for (id, bus, p, q) in loads {
        net.add_load(Load::new(
            LoadId::new(id),
            format!("Load {}", bus + 1),
            BusId::new(bus),
            p,
            q,
        ))
        .expect("load bus exists");
    }

    net.add_shunt(Shunt {
        id: ShuntId::new(0),
        name: "Bus 9 capacitor".into(),
        bus: BusId::new(8),
        gs_pu: 0.0,
        bs_pu: 0.19,
        in_service: true,
    })
    .expect("bus 8 exists");

    // (id, from, to, r, x, b, tap)
    let branches: [(usize, usize, usize, f64, f64, f64, f64); 20] = [
        (0, 0, 1, 0.01938, 0.05917, 0.0528, 0.0),
        (1, 0, 4, 0.05403, 0.22304, 0.0492, 0.0),
        (2, 1, 2, 0.04699, 0.19797, 0.0438, 0.0),
        (3, 1, 3, 0.05811, 0.17632, 0.0340, 0.0),
        (4, 1, 4, 0.05695, 0.17388, 0.0346, 0.0),
        (5, 2, 3, 0.06701, 0.17103, 0.0128, 0.0),
        (6, 3, 4, 0.01335, 0.04211, 0.0, 0.0),
        (7, 3, 6, 0.0, 0.20912, 0.0, 0.978),
        (8, 3, 8, 0.0, 0.55618, 0.0, 0.969),
        (9, 4, 5, 0.0, 0.25202, 0.0, 0.932),
        (10, 5, 10, 0.09498, 0.19890, 0.0, 0.0),
        (11, 5, 11, 0.12291, 0.25581, 0.0, 0.0),
        (12, 5, 12, 0.06615, 0.13027, 0.0, 0.0),
        (13, 6, 7, 0.0, 0.17615, 0.0, 0.0),
        (14, 6, 8, 0.0, 0.11001, 0.0, 0.0),
        (15, 8, 9, 0.03181, 0.08450, 0.0, 0.0),
        (16, 8, 13, 0.12711, 0.27038, 0.0, 0.0),
        (17, 9, 10, 0.08205, 0.19207, 0.0, 0.0),
        (18, 11, 12, 0.22092, 0.19988, 0.0, 0.0),
        (19, 12, 13, 0.17093, 0.34802, 0.0, 0.0),
    ];
    for (id, from, to, r, x, b, tap) in branches {
        let name = format!("{}-{}", from + 1, to + 1);
        let branch = if tap > 0.0 {
            Branch::transformer(
                BranchId::new(id),
                name,
                BusId::new(from),
                BusId::new(to),
                r,
                x,
                tap,
            )
        } else {
            Branch::line(BranchId::new(id), name, BusId::new(from), BusId::new(to), r, x)
                .with_charging(b)
        };
        net.add_branch(branch).expect("endpoints exist");
    }

    net
}

#[cfg(test)]
mod tests {
    use super::*;
    use gsa_core::BranchKind;

    #[test]
    fn test_case14_structure() {
        let net = case14();
        let stats = net.stats();
        assert_eq!(stats.num_buses, 14);
        assert_eq!(stats.num_branches, 20);
        assert_eq!(stats.num_gens, 4);
        assert_eq!(stats.num_shunts, 1);
        assert!((stats.total_load_mw - 259.0).abs() < 1e-9);
    }

    #[test]
    fn test_case14_has_three_transformers() {
        let net = case14();
        let tx = net
            .branches()
            .iter()
            .filter(|b| b.kind == BranchKind::Transformer)
            .count();
        assert_eq!(tx, 3);
    }
}
