//! Linear marginal-cost assignment for the dispatch solver.
//!
//! A [`CostAssignment`] maps generation sources to non-negative marginal
//! costs (currency per MWh). Applying one to a snapshot REPLACES the whole
//! cost table: stale terms from an earlier assignment never survive, which
//! makes repeated application idempotent. Entries naming a source the
//! snapshot does not have are skipped with a warning rather than failing
//! the assignment.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::{GsaError, GsaResult, Network, SourceRef};

/// One optimizer-facing cost term: `cost = c1 * P` for the named source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostTerm {
    pub source: SourceRef,
    /// Linear marginal cost, currency per MWh
    pub c1: f64,
}

/// A full cost assignment, deterministic in iteration order.
#[derive(Debug, Clone, Default)]
pub struct CostAssignment {
    entries: BTreeMap<SourceRef, f64>,
}

impl CostAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the marginal cost for one source, replacing any prior entry.
    pub fn set(mut self, source: SourceRef, c1: f64) -> Self {
        self.entries.insert(source, c1);
        self
    }

    pub fn insert(&mut self, source: SourceRef, c1: f64) {
        self.entries.insert(source, c1);
    }

    pub fn get(&self, source: SourceRef) -> Option<f64> {
        self.entries.get(&source).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SourceRef, f64)> + '_ {
        self.entries.iter().map(|(s, c)| (*s, *c))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(SourceRef, f64)> for CostAssignment {
    fn from_iter<T: IntoIterator<Item = (SourceRef, f64)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// What an assignment actually did: entries written vs. skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CostAssignmentOutcome {
    pub applied: usize,
    pub skipped: usize,
}

impl Network {
    /// Replace the snapshot's cost table with `assignment`.
    ///
    /// The existing table is cleared unconditionally before any new term is
    /// written. Entries referencing a source absent from the snapshot are
    /// skipped with a warning; a negative coefficient rejects the whole
    /// assignment before anything is modified.
    pub fn assign_costs(
        &mut self,
        assignment: &CostAssignment,
    ) -> GsaResult<CostAssignmentOutcome> {
        if let Some((source, c1)) = assignment.iter().find(|(_, c1)| *c1 < 0.0) {
            return Err(GsaError::Validation(format!(
                "negative marginal cost {} for {}",
                c1, source
            )));
        }

        self.costs.clear();
        let mut outcome = CostAssignmentOutcome {
            applied: 0,
            skipped: 0,
        };
        for (source, c1) in assignment.iter() {
            if !self.has_source(source) {
                warn!(%source, "cost entry names a source not in the snapshot, skipping");
                outcome.skipped += 1;
                continue;
            }
            self.costs.push(CostTerm { source, c1 });
            outcome.applied += 1;
        }
        Ok(outcome)
    }

    /// Marginal cost attached to a source, if any.
    pub fn cost_for(&self, source: SourceRef) -> Option<f64> {
        self.costs
            .iter()
            .find(|t| t.source == source)
            .map(|t| t.c1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Bus, BusId, ExtGrid, ExtGridId, Gen, GenId};

    fn net_with_two_gens() -> Network {
        let mut net = Network::new();
        net.add_bus(Bus {
            id: BusId::new(0),
            name: "Bus 0".into(),
            base_kv: 138.0,
            ..Bus::default()
        });
        net.add_ext_grid(ExtGrid::new(ExtGridId::new(0), "Grid", BusId::new(0)))
            .unwrap();
        net.add_gen(Gen::new(GenId::new(0), "g0", BusId::new(0), 40.0))
            .unwrap();
        net.add_gen(Gen::new(GenId::new(1), "g1", BusId::new(0), 60.0))
            .unwrap();
        net
    }

    #[test]
    fn test_assignment_replaces_prior_table() {
        let mut net = net_with_two_gens();
        let first = CostAssignment::new()
            .set(SourceRef::gen(0), 10.0)
            .set(SourceRef::gen(1), 20.0)
            .set(SourceRef::ext_grid(0), 50.0);
        net.assign_costs(&first).unwrap();
        assert_eq!(net.costs.len(), 3);

        let second = CostAssignment::new().set(SourceRef::gen(1), 5.0);
        net.assign_costs(&second).unwrap();
        assert_eq!(net.costs.len(), 1);
        assert_eq!(net.cost_for(SourceRef::gen(1)), Some(5.0));
        assert_eq!(net.cost_for(SourceRef::gen(0)), None);
    }

    #[test]
    fn test_assignment_is_idempotent() {
        let mut net = net_with_two_gens();
        let assignment = CostAssignment::new()
            .set(SourceRef::gen(0), 12.0)
            .set(SourceRef::gen(1), 30.0);
        net.assign_costs(&assignment).unwrap();
        let once = net.costs.clone();
        net.assign_costs(&assignment).unwrap();
        assert_eq!(net.costs, once);
    }

    #[test]
    fn test_missing_source_skipped_not_fatal() {
        let mut net = net_with_two_gens();
        let assignment = CostAssignment::new()
            .set(SourceRef::gen(0), 10.0)
            .set(SourceRef::sgen(7), 99.0);
        let outcome = net.assign_costs(&assignment).unwrap();
        assert_eq!(outcome.applied, 1);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(net.costs.len(), 1);
    }

    #[test]
    fn test_negative_cost_rejected_atomically() {
        let mut net = net_with_two_gens();
        net.assign_costs(&CostAssignment::new().set(SourceRef::gen(0), 10.0))
            .unwrap();

        let bad = CostAssignment::new()
            .set(SourceRef::gen(0), 5.0)
            .set(SourceRef::gen(1), -1.0);
        assert!(net.assign_costs(&bad).is_err());
        // Prior table untouched by the rejected assignment.
        assert_eq!(net.cost_for(SourceRef::gen(0)), Some(10.0));
    }
}
