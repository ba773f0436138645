//! # gsa-core: Transmission Network Model
//!
//! Data structures shared by the GSA analysis crates: a graph-based network
//! snapshot, typed element IDs, generation-source identity, cost assignment,
//! and validation diagnostics.
//!
//! ## Design
//!
//! A network is an undirected [`petgraph`] graph whose nodes are electrical
//! elements (buses, generators, the external grid tie, static generators,
//! loads, shunts) and whose edges are branches (lines and transformers).
//! Solved result fields live in [`SolvedState`] next to the topology; a
//! snapshot is either unsolved (`results == None`) or fully solved.
//!
//! ## Snapshot discipline
//!
//! `Network` is `Clone`, and cloning IS the deep-copy operation: a clone
//! shares no mutable state with the original. Contingency trials depend on
//! this: every perturbed snapshot is a clone, and `set_branch_status`
//! clears any attached results so a perturbed snapshot can never expose a
//! stale solution.
//!
//! ## Quick start
//!
//! ```rust
//! use gsa_core::*;
//!
//! let mut net = Network::new();
//! let _b0 = net.add_bus(Bus {
//!     id: BusId::new(0),
//!     name: "Bus 0".to_string(),
//!     base_kv: 138.0,
//!     ..Bus::default()
//! });
//! let _b1 = net.add_bus(Bus {
//!     id: BusId::new(1),
//!     name: "Bus 1".to_string(),
//!     base_kv: 138.0,
//!     ..Bus::default()
//! });
//! net.add_ext_grid(ExtGrid::new(ExtGridId::new(0), "Grid", BusId::new(0))).unwrap();
//! net.add_load(Load::new(LoadId::new(0), "Load 1", BusId::new(1), 50.0, 10.0)).unwrap();
//! net.add_branch(Branch::line(BranchId::new(0), "0-1", BusId::new(0), BusId::new(1), 0.01, 0.1))
//!     .unwrap();
//!
//! assert_eq!(net.stats().num_buses, 2);
//! ```

use petgraph::graph::EdgeIndex;
use petgraph::{prelude::*, Undirected};
use serde::{Deserialize, Serialize};

pub mod cost;
pub mod diagnostics;
pub mod error;
pub mod results;
pub mod source;

pub use cost::{CostAssignment, CostAssignmentOutcome, CostTerm};
pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use error::{GsaError, GsaResult};
pub use petgraph::graph::NodeIndex;
pub use results::{BranchResult, BusResult, SolvedState, SourceResult};
pub use source::{SourceKind, SourceRef};

macro_rules! element_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(usize);

        impl $name {
            #[inline]
            pub fn new(value: usize) -> Self {
                $name(value)
            }

            #[inline]
            pub fn value(&self) -> usize {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

element_id!(
    /// Identifier of a bus (network node with voltage state)
    BusId
);
element_id!(
    /// Identifier of a branch (line or transformer)
    BranchId
);
element_id!(
    /// Identifier of a synchronous generator
    GenId
);
element_id!(
    /// Identifier of an external grid tie
    ExtGridId
);
element_id!(
    /// Identifier of a static generator
    SgenId
);
element_id!(
    /// Identifier of a load
    LoadId
);
element_id!(
    /// Identifier of a shunt element
    ShuntId
);

/// A network node where voltage magnitude and angle are defined.
#[derive(Debug, Clone)]
pub struct Bus {
    pub id: BusId,
    pub name: String,
    /// Nominal voltage in kilovolts
    pub base_kv: f64,
    /// Optional per-bus lower voltage limit (per-unit)
    pub vmin_pu: Option<f64>,
    /// Optional per-bus upper voltage limit (per-unit)
    pub vmax_pu: Option<f64>,
    pub zone: Option<i64>,
}

impl Default for Bus {
    fn default() -> Self {
        Self {
            id: BusId(0),
            name: String::new(),
            base_kv: 0.0,
            vmin_pu: None,
            vmax_pu: None,
            zone: None,
        }
    }
}

/// Whether a branch is a plain line or a transformer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchKind {
    Line,
    Transformer,
}

/// A transmission line or transformer connecting two buses.
#[derive(Debug, Clone)]
pub struct Branch {
    pub id: BranchId,
    pub name: String,
    pub from_bus: BusId,
    pub to_bus: BusId,
    /// Series resistance (per-unit on the system base)
    pub resistance_pu: f64,
    /// Series reactance (per-unit on the system base)
    pub reactance_pu: f64,
    /// Total line charging susceptance (per-unit, split half/half)
    pub charging_b_pu: f64,
    /// Off-nominal tap magnitude on the from side
    pub tap_ratio: f64,
    /// Phase shift on the from side (radians)
    pub phase_shift_rad: f64,
    /// Thermal rating in MVA; unrated branches are never counted as overloaded
    pub rating_mva: Option<f64>,
    pub in_service: bool,
    pub kind: BranchKind,
}

impl Default for Branch {
    fn default() -> Self {
        Self {
            id: BranchId(0),
            name: String::new(),
            from_bus: BusId(0),
            to_bus: BusId(0),
            resistance_pu: 0.0,
            reactance_pu: 0.0,
            charging_b_pu: 0.0,
            tap_ratio: 1.0,
            phase_shift_rad: 0.0,
            rating_mva: None,
            in_service: true,
            kind: BranchKind::Line,
        }
    }
}

impl Branch {
    /// Construct a line from its impedance, filling the rest with defaults.
    pub fn line(
        id: BranchId,
        name: impl Into<String>,
        from_bus: BusId,
        to_bus: BusId,
        resistance_pu: f64,
        reactance_pu: f64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            from_bus,
            to_bus,
            resistance_pu,
            reactance_pu,
            ..Self::default()
        }
    }

    /// Construct a transformer; `tap_ratio` applies on the from side.
    pub fn transformer(
        id: BranchId,
        name: impl Into<String>,
        from_bus: BusId,
        to_bus: BusId,
        resistance_pu: f64,
        reactance_pu: f64,
        tap_ratio: f64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            from_bus,
            to_bus,
            resistance_pu,
            reactance_pu,
            tap_ratio,
            kind: BranchKind::Transformer,
            ..Self::default()
        }
    }

    pub fn with_charging(mut self, charging_b_pu: f64) -> Self {
        self.charging_b_pu = charging_b_pu;
        self
    }

    pub fn with_rating(mut self, rating_mva: f64) -> Self {
        self.rating_mva = Some(rating_mva);
        self
    }
}

/// A synchronous generator: fixed active output, voltage-controlled bus.
#[derive(Debug, Clone)]
pub struct Gen {
    pub id: GenId,
    pub name: String,
    pub bus: BusId,
    /// Scheduled active power output (MW)
    pub p_mw: f64,
    /// Voltage setpoint at the terminal bus (per-unit)
    pub vm_setpoint_pu: f64,
    pub qmin_mvar: f64,
    pub qmax_mvar: f64,
    pub pmin_mw: f64,
    pub pmax_mw: f64,
    pub in_service: bool,
    /// Whether the dispatch solver may move this unit
    pub dispatchable: bool,
}

impl Gen {
    pub fn new(id: GenId, name: impl Into<String>, bus: BusId, p_mw: f64) -> Self {
        Self {
            id,
            name: name.into(),
            bus,
            p_mw,
            vm_setpoint_pu: 1.0,
            qmin_mvar: f64::NEG_INFINITY,
            qmax_mvar: f64::INFINITY,
            pmin_mw: 0.0,
            pmax_mw: f64::INFINITY,
            in_service: true,
            dispatchable: true,
        }
    }

    pub fn with_setpoint(mut self, vm_pu: f64) -> Self {
        self.vm_setpoint_pu = vm_pu;
        self
    }

    pub fn with_p_limits(mut self, pmin_mw: f64, pmax_mw: f64) -> Self {
        self.pmin_mw = pmin_mw;
        self.pmax_mw = pmax_mw;
        self
    }

    pub fn with_q_limits(mut self, qmin_mvar: f64, qmax_mvar: f64) -> Self {
        self.qmin_mvar = qmin_mvar;
        self.qmax_mvar = qmax_mvar;
        self
    }
}

/// The external grid tie: provides the voltage and angle reference and
/// absorbs the generation/load mismatch.
#[derive(Debug, Clone)]
pub struct ExtGrid {
    pub id: ExtGridId,
    pub name: String,
    pub bus: BusId,
    /// Reference voltage magnitude (per-unit)
    pub vm_pu: f64,
    /// Reference voltage angle (degrees)
    pub va_deg: f64,
    pub pmin_mw: f64,
    pub pmax_mw: f64,
    pub in_service: bool,
}

impl ExtGrid {
    pub fn new(id: ExtGridId, name: impl Into<String>, bus: BusId) -> Self {
        Self {
            id,
            name: name.into(),
            bus,
            vm_pu: 1.0,
            va_deg: 0.0,
            pmin_mw: f64::NEG_INFINITY,
            pmax_mw: f64::INFINITY,
            in_service: true,
        }
    }

    pub fn with_voltage(mut self, vm_pu: f64) -> Self {
        self.vm_pu = vm_pu;
        self
    }

    pub fn with_p_limits(mut self, pmin_mw: f64, pmax_mw: f64) -> Self {
        self.pmin_mw = pmin_mw;
        self.pmax_mw = pmax_mw;
        self
    }
}

/// A static (distributed) generator: PQ injection, optionally dispatchable.
#[derive(Debug, Clone)]
pub struct Sgen {
    pub id: SgenId,
    pub name: String,
    pub bus: BusId,
    pub p_mw: f64,
    pub q_mvar: f64,
    pub pmin_mw: f64,
    pub pmax_mw: f64,
    pub in_service: bool,
    pub dispatchable: bool,
}

impl Sgen {
    pub fn new(id: SgenId, name: impl Into<String>, bus: BusId, p_mw: f64, q_mvar: f64) -> Self {
        Self {
            id,
            name: name.into(),
            bus,
            p_mw,
            q_mvar,
            pmin_mw: 0.0,
            pmax_mw: p_mw,
            in_service: true,
            dispatchable: false,
        }
    }

    pub fn dispatchable(mut self, pmin_mw: f64, pmax_mw: f64) -> Self {
        self.dispatchable = true;
        self.pmin_mw = pmin_mw;
        self.pmax_mw = pmax_mw;
        self
    }
}

/// A load: fixed PQ demand at a bus.
#[derive(Debug, Clone)]
pub struct Load {
    pub id: LoadId,
    pub name: String,
    pub bus: BusId,
    pub p_mw: f64,
    pub q_mvar: f64,
}

impl Load {
    pub fn new(id: LoadId, name: impl Into<String>, bus: BusId, p_mw: f64, q_mvar: f64) -> Self {
        Self {
            id,
            name: name.into(),
            bus,
            p_mw,
            q_mvar,
        }
    }
}

/// Shunt element (capacitor or reactor) connected to a bus.
///
/// Enters the admittance matrix diagonal as `gs + j*bs` (per-unit);
/// positive `bs` is a capacitor, negative a reactor.
#[derive(Debug, Clone)]
pub struct Shunt {
    pub id: ShuntId,
    pub name: String,
    pub bus: BusId,
    pub gs_pu: f64,
    pub bs_pu: f64,
    pub in_service: bool,
}

impl Shunt {
    pub fn capacitor(id: ShuntId, name: impl Into<String>, bus: BusId, q_mvar: f64, base_mva: f64) -> Self {
        Self {
            id,
            name: name.into(),
            bus,
            gs_pu: 0.0,
            bs_pu: q_mvar / base_mva,
            in_service: true,
        }
    }
}

/// Node kinds in the network graph.
#[derive(Debug, Clone)]
pub enum Node {
    Bus(Bus),
    Gen(Gen),
    ExtGrid(ExtGrid),
    Sgen(Sgen),
    Load(Load),
    Shunt(Shunt),
}

impl Node {
    /// Human-readable label for the node.
    pub fn label(&self) -> &str {
        match self {
            Node::Bus(e) => &e.name,
            Node::Gen(e) => &e.name,
            Node::ExtGrid(e) => &e.name,
            Node::Sgen(e) => &e.name,
            Node::Load(e) => &e.name,
            Node::Shunt(e) => &e.name,
        }
    }
}

/// A network snapshot: topology and injections, plus solved results once a
/// solver has run.
#[derive(Debug, Clone)]
pub struct Network {
    pub graph: Graph<Node, Branch, Undirected>,
    /// System MVA base for per-unit conversion
    pub base_mva: f64,
    /// Optimizer-facing linear cost table, keyed by generation source
    pub costs: Vec<CostTerm>,
    /// Solved result fields; `None` until a solver has run
    pub results: Option<SolvedState>,
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl Network {
    pub fn new() -> Self {
        Self {
            graph: Graph::new_undirected(),
            base_mva: 100.0,
            costs: Vec::new(),
            results: None,
        }
    }

    // =========================================================================
    // Construction
    // =========================================================================

    pub fn add_bus(&mut self, bus: Bus) -> NodeIndex {
        self.graph.add_node(Node::Bus(bus))
    }

    /// Add a branch between two existing buses. Fails if either endpoint is
    /// missing from the snapshot.
    pub fn add_branch(&mut self, branch: Branch) -> GsaResult<EdgeIndex> {
        let from = self.bus_node(branch.from_bus).ok_or_else(|| {
            GsaError::Validation(format!(
                "branch {} references missing bus {}",
                branch.id, branch.from_bus
            ))
        })?;
        let to = self.bus_node(branch.to_bus).ok_or_else(|| {
            GsaError::Validation(format!(
                "branch {} references missing bus {}",
                branch.id, branch.to_bus
            ))
        })?;
        Ok(self.graph.add_edge(from, to, branch))
    }

    pub fn add_gen(&mut self, gen: Gen) -> GsaResult<NodeIndex> {
        self.require_bus(gen.bus, "gen")?;
        Ok(self.graph.add_node(Node::Gen(gen)))
    }

    pub fn add_ext_grid(&mut self, ext: ExtGrid) -> GsaResult<NodeIndex> {
        self.require_bus(ext.bus, "ext_grid")?;
        Ok(self.graph.add_node(Node::ExtGrid(ext)))
    }

    pub fn add_sgen(&mut self, sgen: Sgen) -> GsaResult<NodeIndex> {
        self.require_bus(sgen.bus, "sgen")?;
        Ok(self.graph.add_node(Node::Sgen(sgen)))
    }

    pub fn add_load(&mut self, load: Load) -> GsaResult<NodeIndex> {
        self.require_bus(load.bus, "load")?;
        Ok(self.graph.add_node(Node::Load(load)))
    }

    pub fn add_shunt(&mut self, shunt: Shunt) -> GsaResult<NodeIndex> {
        self.require_bus(shunt.bus, "shunt")?;
        Ok(self.graph.add_node(Node::Shunt(shunt)))
    }

    fn require_bus(&self, bus: BusId, what: &str) -> GsaResult<()> {
        if self.bus_node(bus).is_none() {
            return Err(GsaError::Validation(format!(
                "{} references missing bus {}",
                what, bus
            )));
        }
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn bus_node(&self, id: BusId) -> Option<NodeIndex> {
        self.graph.node_indices().find(|&n| match &self.graph[n] {
            Node::Bus(b) => b.id == id,
            _ => false,
        })
    }

    pub fn bus(&self, id: BusId) -> Option<&Bus> {
        self.buses().into_iter().find(|b| b.id == id)
    }

    pub fn buses(&self) -> Vec<&Bus> {
        self.graph
            .node_weights()
            .filter_map(|n| match n {
                Node::Bus(b) => Some(b),
                _ => None,
            })
            .collect()
    }

    pub fn generators(&self) -> Vec<&Gen> {
        self.graph
            .node_weights()
            .filter_map(|n| match n {
                Node::Gen(g) => Some(g),
                _ => None,
            })
            .collect()
    }

    pub fn ext_grids(&self) -> Vec<&ExtGrid> {
        self.graph
            .node_weights()
            .filter_map(|n| match n {
                Node::ExtGrid(e) => Some(e),
                _ => None,
            })
            .collect()
    }

    pub fn sgens(&self) -> Vec<&Sgen> {
        self.graph
            .node_weights()
            .filter_map(|n| match n {
                Node::Sgen(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn loads(&self) -> Vec<&Load> {
        self.graph
            .node_weights()
            .filter_map(|n| match n {
                Node::Load(l) => Some(l),
                _ => None,
            })
            .collect()
    }

    pub fn shunts(&self) -> Vec<&Shunt> {
        self.graph
            .node_weights()
            .filter_map(|n| match n {
                Node::Shunt(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    /// Branches in edge-insertion order.
    pub fn branches(&self) -> Vec<&Branch> {
        self.graph.edge_weights().collect()
    }

    /// Branch ids in ascending order, the canonical contingency ordering.
    pub fn branch_ids(&self) -> Vec<BranchId> {
        let mut ids: Vec<BranchId> = self.graph.edge_weights().map(|b| b.id).collect();
        ids.sort();
        ids
    }

    pub fn branch(&self, id: BranchId) -> Option<&Branch> {
        self.graph.edge_weights().find(|b| b.id == id)
    }

    /// Flip a branch's in-service flag. Clears any attached results, since a
    /// perturbed snapshot is unsolved by definition.
    pub fn set_branch_status(&mut self, id: BranchId, in_service: bool) -> GsaResult<()> {
        let branch = self
            .graph
            .edge_weights_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| GsaError::Validation(format!("no branch with id {}", id)))?;
        branch.in_service = in_service;
        self.results = None;
        Ok(())
    }

    /// All generation sources present in the snapshot, grouped by category
    /// and ordered by index within each.
    pub fn source_refs(&self) -> Vec<SourceRef> {
        let mut refs = Vec::new();
        for g in self.generators() {
            refs.push(SourceRef::gen(g.id.value()));
        }
        for e in self.ext_grids() {
            refs.push(SourceRef::ext_grid(e.id.value()));
        }
        for s in self.sgens() {
            refs.push(SourceRef::sgen(s.id.value()));
        }
        refs.sort();
        refs
    }

    pub fn has_source(&self, source: SourceRef) -> bool {
        match source.kind {
            SourceKind::Gen => self.generators().iter().any(|g| g.id.value() == source.index),
            SourceKind::ExtGrid => self
                .ext_grids()
                .iter()
                .any(|e| e.id.value() == source.index),
            SourceKind::Sgen => self.sgens().iter().any(|s| s.id.value() == source.index),
        }
    }

    pub fn source_name(&self, source: SourceRef) -> Option<String> {
        match source.kind {
            SourceKind::Gen => self
                .generators()
                .iter()
                .find(|g| g.id.value() == source.index)
                .map(|g| g.name.clone()),
            SourceKind::ExtGrid => self
                .ext_grids()
                .iter()
                .find(|e| e.id.value() == source.index)
                .map(|e| e.name.clone()),
            SourceKind::Sgen => self
                .sgens()
                .iter()
                .find(|s| s.id.value() == source.index)
                .map(|s| s.name.clone()),
        }
    }

    // =========================================================================
    // Aggregates
    // =========================================================================

    pub fn total_load_mw(&self) -> f64 {
        self.loads().iter().map(|l| l.p_mw).sum()
    }

    /// Scheduled generation: gen setpoints plus in-service sgen injections.
    /// The external grid contribution is only known after a solve.
    pub fn scheduled_generation_mw(&self) -> f64 {
        let gen: f64 = self
            .generators()
            .iter()
            .filter(|g| g.in_service)
            .map(|g| g.p_mw)
            .sum();
        let sgen: f64 = self
            .sgens()
            .iter()
            .filter(|s| s.in_service)
            .map(|s| s.p_mw)
            .sum();
        gen + sgen
    }

    pub fn stats(&self) -> NetworkStats {
        let mut stats = NetworkStats::default();
        for node in self.graph.node_weights() {
            match node {
                Node::Bus(_) => stats.num_buses += 1,
                Node::Gen(g) => {
                    stats.num_gens += 1;
                    if g.pmax_mw.is_finite() {
                        stats.total_gen_capacity_mw += g.pmax_mw;
                    }
                }
                Node::ExtGrid(_) => stats.num_ext_grids += 1,
                Node::Sgen(s) => {
                    stats.num_sgens += 1;
                    if s.pmax_mw.is_finite() {
                        stats.total_gen_capacity_mw += s.pmax_mw;
                    }
                }
                Node::Load(l) => {
                    stats.num_loads += 1;
                    stats.total_load_mw += l.p_mw;
                    stats.total_load_mvar += l.q_mvar;
                }
                Node::Shunt(_) => stats.num_shunts += 1,
            }
        }
        stats.num_branches = self.graph.edge_count();
        stats.num_in_service_branches = self
            .graph
            .edge_weights()
            .filter(|b| b.in_service)
            .count();
        stats
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Validate the snapshot for issues that make a solve pointless or
    /// misleading. Populates `diag`; never fails.
    pub fn validate_into(&self, diag: &mut Diagnostics) {
        let stats = self.stats();

        if stats.num_buses == 0 {
            diag.add_error("structure", "network has no buses");
            return;
        }

        if stats.num_gens == 0 && stats.num_ext_grids == 0 {
            diag.add_error(
                "structure",
                "network has no generators and no external grid tie",
            );
        }

        if stats.num_loads > 0 && stats.total_load_mw.abs() < 1e-9 {
            diag.add_error(
                "structure",
                &format!(
                    "total load is 0 MW but {} loads exist - likely a data-entry bug",
                    stats.num_loads
                ),
            );
        } else if stats.num_loads == 0 {
            diag.add_warning("structure", "network has no loads");
        }

        if stats.num_branches == 0 && stats.num_buses > 1 {
            diag.add_error("structure", "network has multiple buses but no branches");
        }

        // Capacity check only binds when no ext grid can pick up the slack.
        if stats.num_ext_grids == 0 && stats.total_gen_capacity_mw < stats.total_load_mw {
            diag.add_warning(
                "capacity",
                &format!(
                    "generation capacity ({:.1} MW) is below total load ({:.1} MW)",
                    stats.total_gen_capacity_mw, stats.total_load_mw
                ),
            );
        }

        for branch in self.branches() {
            if branch.reactance_pu.abs() < 1e-12 {
                diag.add(
                    DiagnosticIssue::new(
                        Severity::Error,
                        "physical",
                        "branch has zero series reactance",
                    )
                    .with_entity(format!("Branch {}", branch.id)),
                );
            }
        }
    }

    /// `true` when the snapshot carries a solved state.
    pub fn is_solved(&self) -> bool {
        self.results.is_some()
    }
}

/// Size and capacity summary of a network.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NetworkStats {
    pub num_buses: usize,
    pub num_branches: usize,
    pub num_in_service_branches: usize,
    pub num_gens: usize,
    pub num_ext_grids: usize,
    pub num_sgens: usize,
    pub num_loads: usize,
    pub num_shunts: usize,
    pub total_load_mw: f64,
    pub total_load_mvar: f64,
    pub total_gen_capacity_mw: f64,
}

impl std::fmt::Display for NetworkStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} buses, {} branches, {} gens, {} ext grids, {} sgens, {} loads ({:.0} MW)",
            self.num_buses,
            self.num_branches,
            self.num_gens,
            self.num_ext_grids,
            self.num_sgens,
            self.num_loads,
            self.total_load_mw
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_bus_net() -> Network {
        let mut net = Network::new();
        net.add_bus(Bus {
            id: BusId::new(0),
            name: "Bus 0".into(),
            base_kv: 138.0,
            ..Bus::default()
        });
        net.add_bus(Bus {
            id: BusId::new(1),
            name: "Bus 1".into(),
            base_kv: 138.0,
            ..Bus::default()
        });
        net.add_ext_grid(ExtGrid::new(ExtGridId::new(0), "Grid", BusId::new(0)))
            .unwrap();
        net.add_load(Load::new(LoadId::new(0), "Load 1", BusId::new(1), 50.0, 10.0))
            .unwrap();
        net.add_branch(Branch::line(
            BranchId::new(0),
            "0-1",
            BusId::new(0),
            BusId::new(1),
            0.01,
            0.1,
        ))
        .unwrap();
        net
    }

    #[test]
    fn test_stats() {
        let net = two_bus_net();
        let stats = net.stats();
        assert_eq!(stats.num_buses, 2);
        assert_eq!(stats.num_branches, 1);
        assert_eq!(stats.num_ext_grids, 1);
        assert_eq!(stats.num_loads, 1);
        assert!((stats.total_load_mw - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_branch_referencing_missing_bus_rejected() {
        let mut net = Network::new();
        net.add_bus(Bus {
            id: BusId::new(0),
            ..Bus::default()
        });
        let err = net
            .add_branch(Branch::line(
                BranchId::new(0),
                "bad",
                BusId::new(0),
                BusId::new(9),
                0.01,
                0.1,
            ))
            .unwrap_err();
        assert!(err.to_string().contains("missing bus"));
    }

    #[test]
    fn test_set_branch_status_clears_results() {
        let mut net = two_bus_net();
        net.results = Some(SolvedState {
            bus: vec![],
            branch: vec![],
            sources: vec![],
            iterations: 1,
            max_mismatch_pu: 0.0,
        });
        net.set_branch_status(BranchId::new(0), false).unwrap();
        assert!(!net.is_solved());
        assert!(!net.branch(BranchId::new(0)).unwrap().in_service);
    }

    #[test]
    fn test_set_branch_status_unknown_id() {
        let mut net = two_bus_net();
        assert!(net.set_branch_status(BranchId::new(42), false).is_err());
    }

    #[test]
    fn test_clone_is_deep() {
        let base = two_bus_net();
        let mut copy = base.clone();
        copy.set_branch_status(BranchId::new(0), false).unwrap();
        assert!(base.branch(BranchId::new(0)).unwrap().in_service);
        assert!(!copy.branch(BranchId::new(0)).unwrap().in_service);
    }

    #[test]
    fn test_source_refs_ordering() {
        let mut net = two_bus_net();
        net.add_sgen(Sgen::new(SgenId::new(0), "pv", BusId::new(1), 5.0, 0.0))
            .unwrap();
        net.add_gen(Gen::new(GenId::new(0), "g0", BusId::new(1), 20.0))
            .unwrap();
        let refs = net.source_refs();
        assert_eq!(
            refs,
            vec![
                SourceRef::gen(0),
                SourceRef::ext_grid(0),
                SourceRef::sgen(0)
            ]
        );
    }

    #[test]
    fn test_validation_empty_network() {
        let net = Network::new();
        let mut diag = Diagnostics::new();
        net.validate_into(&mut diag);
        assert!(diag.has_errors());
        assert!(diag.errors().any(|i| i.message.contains("no buses")));
    }

    #[test]
    fn test_validation_clean_network() {
        let net = two_bus_net();
        let mut diag = Diagnostics::new();
        net.validate_into(&mut diag);
        assert!(!diag.has_errors());
    }

    #[test]
    fn test_validation_flags_zero_reactance() {
        let mut net = two_bus_net();
        net.add_branch(Branch::line(
            BranchId::new(1),
            "degenerate",
            BusId::new(0),
            BusId::new(1),
            0.0,
            0.0,
        ))
        .unwrap();
        let mut diag = Diagnostics::new();
        net.validate_into(&mut diag);
        assert!(diag.errors().any(|i| i.message.contains("reactance")));
    }
}
