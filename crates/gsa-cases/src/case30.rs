//! 30-bus reference grid.
//!
//! The medium study case: six machines, 41 branches across two voltage
//! levels with four tap-changing transformers and two capacitor banks.
//! Ratings follow the reference data, so contingency screening on the
//! unreinforced network does surface real overloads and voltage issues.

use gsa_core::{
    Branch, BranchId, Bus, BusId, ExtGrid, ExtGridId, Gen, GenId, Load, LoadId, Network, Shunt,
    ShuntId,
};

pub fn case30() -> Network {
    let mut net = Network::new();

    for i in 0..30 {
        let base_kv = if i < 8 { 132.0 } else { 33.0 };
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

    // (id, bus, p_mw, setpoint, qmin, qmax, pmax)
    let gens: [(usize, usize, f64, f64, f64, f64, f64); 5] = [
        (0, 1, 40.0, 1.043, -40.0, 50.0, 80.0),
        (1, 4, 0.0, 1.01, -40.0, 40.0, 50.0),
        (2, 7, 0.0, 1.01, -10.0, 40.0, 35.0),
        (3, 10, 0.0, 1.082, -6.0, 24.0, 30.0),
        (4, 12, 0.0, 1.071, -6.0, 24.0, 40.0),
    ];
    for (id, bus, p, vset, qmin, qmax, pmax) in gens {
        net.add_gen(
            Gen::new(GenId::new(id), format!("Machine {}", bus + 1), BusId::new(bus), p)
                .with_setpoint(vset)
                .with_p_limits(0.0, pmax)
                .with_q_limits(qmin, qmax),
        )
        .expect("gen bus exists");
    }

    // (id, bus, p_mw, q_mvar)
    let loads: [(usize, usize, f64, f64); 21] = [
        (0, 1, 21.7, 12.7),
        (1, 2, 2.4, 1.2),
        (2, 3, 7.6, 1.6),
        (3, 4, 94.2, 19.0),
        (4, 6, 22.8, 10.9),
        (5, 7, 30.0, 30.0),
        (6, 9, 5.8, 2.0),
        (7, 11, 11.2, 7.5),
        (8, 13, 6.2, 1.6),
        (9, 14, 8.2, 2.5),
        (10, 15, 3.5, 1.8),
        (11, 16, 9.0, 5.8),
        (12, 17, 3.2, 0.9),
        (13, 18, 9.5, 3.4),
        (14, 19, 2.2, 0.7),
        (15, 20, 17.5, 11.2),
        (16, 22, 3.2, 1.6),
        (17, 23, 8.7, 6.7),
        (18, 25, 3.5, 2.3),
        (19, 28, 2.4, 0.9),
        (20, 29, 10.6, 1.9),
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

    let shunts: [(usize, usize, f64); 2] = [(0, 9, 0.19), (1, 23, 0.043)];
    for (id, bus, bs) in shunts {
        net.add_shunt(Shunt {
            id: ShuntId::new(id),
            name: format!("Bus {} capacitor", bus + 1),
            bus: BusId::new(bus),
            gs_pu: 0.0,
            bs_pu: bs,
            in_service: true,
        })
        .expect("shunt bus exists");
    }

    // (id, from, to, r, x, b, rating, tap)
    let branches: [(usize, usize, usize, f64, f64, f64, f64, f64); 41] = [
        (0, 0, 1, 0.0192, 0.0575, 0.0528, 130.0, 0.0),
        (1, 0, 2, 0.0452, 0.1652, 0.0408, 130.0, 0.0),
        (2, 1, 3, 0.0570, 0.1737, 0.0368, 65.0, 0.0),
        (3, 2, 3, 0.0132, 0.0379, 0.0084, 130.0, 0.0),
        (4, 1, 4, 0.0472, 0.1983, 0.0418, 130.0, 0.0),
        (5, 1, 5, 0.0581, 0.1763, 0.0374, 65.0, 0.0),
        (6, 3, 5, 0.0119, 0.0414, 0.0090, 90.0, 0.0),
        (7, 4, 6, 0.0460, 0.1160, 0.0204, 70.0, 0.0),
        (8, 5, 6, 0.0267, 0.0820, 0.0170, 130.0, 0.0),
        (9, 5, 7, 0.0120, 0.0420, 0.0090, 32.0, 0.0),
        (10, 5, 8, 0.0, 0.2080, 0.0, 65.0, 0.978),
        (11, 5, 9, 0.0, 0.5560, 0.0, 32.0, 0.969),
        (12, 8, 10, 0.0, 0.2080, 0.0, 65.0, 0.0),
        (13, 8, 9, 0.0, 0.1100, 0.0, 65.0, 0.0),
        (14, 3, 11, 0.0, 0.2560, 0.0, 65.0, 0.932),
        (15, 11, 12, 0.0, 0.1400, 0.0, 65.0, 0.0),
        (16, 11, 13, 0.1231, 0.2559, 0.0, 32.0, 0.0),
        (17, 11, 14, 0.0662, 0.1304, 0.0, 32.0, 0.0),
        (18, 11, 15, 0.0945, 0.1987, 0.0, 32.0, 0.0),
        (19, 13, 14, 0.2210, 0.1997, 0.0, 16.0, 0.0),
        (20, 15, 16, 0.0524, 0.1923, 0.0, 16.0, 0.0),
        (21, 14, 17, 0.1073, 0.2185, 0.0, 16.0, 0.0),
        (22, 17, 18, 0.0639, 0.1292, 0.0, 16.0, 0.0),
        (23, 18, 19, 0.0340, 0.0680, 0.0, 32.0, 0.0),
        (24, 9, 19, 0.0936, 0.2090, 0.0, 32.0, 0.0),
        (25, 9, 16, 0.0324, 0.0845, 0.0, 32.0, 0.0),
        (26, 9, 20, 0.0348, 0.0749, 0.0, 32.0, 0.0),
        (27, 9, 21, 0.0727, 0.1499, 0.0, 32.0, 0.0),
        (28, 20, 21, 0.0116, 0.0236, 0.0, 32.0, 0.0),
        (29, 14, 22, 0.1000, 0.2020, 0.0, 16.0, 0.0),
        (30, 21, 23, 0.1150, 0.1790, 0.0, 16.0, 0.0),
        (31, 22, 23, 0.1320, 0.2700, 0.0, 16.0, 0.0),
        (32, 23, 24, 0.1885, 0.3292, 0.0, 16.0, 0.0),
        (33, 24, 25, 0.2544, 0.3800, 0.0, 16.0, 0.0),
        (34, 24, 26, 0.1093, 0.2087, 0.0, 16.0, 0.0),
        (35, 27, 26, 0.0, 0.3960, 0.0, 65.0, 0.968),
        (36, 26, 28, 0.2198, 0.4153, 0.0, 16.0, 0.0),
        (37, 26, 29, 0.3202, 0.6027, 0.0, 16.0, 0.0),
        (38, 28, 29, 0.2399, 0.4533, 0.0, 16.0, 0.0),
        (39, 7, 27, 0.0636, 0.2000, 0.0428, 32.0, 0.0),
        (40, 5, 27, 0.0169, 0.0599, 0.0130, 32.0, 0.0),
    ];
    for (id, from, to, r, x, b, rate, tap) in branches {
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
            .with_rating(rate)
        } else {
            Branch::line(BranchId::new(id), name, BusId::new(from), BusId::new(to), r, x)
                .with_charging(b)
                .with_rating(rate)
        };
        net.add_branch(branch).expect("endpoints exist");
    }

    net
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case30_structure() {
        let net = case30();
        let stats = net.stats();
        assert_eq!(stats.num_buses, 30);
        assert_eq!(stats.num_branches, 41);
        assert_eq!(stats.num_gens, 5);
        assert_eq!(stats.num_shunts, 2);
        assert!((stats.total_load_mw - 283.4).abs() < 1e-9);
    }

    #[test]
    fn test_case30_every_branch_rated() {
        let net = case30();
        assert!(net.branches().iter().all(|b| b.rating_mva.is_some()));
    }
}
