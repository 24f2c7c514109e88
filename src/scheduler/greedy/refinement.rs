//! Post-sweep refinement of the open slot set.
//!
//! After the greedy sweep every open slot is necessary on its own, but
//! closing several slots while opening fewer others may still be
//! feasible. A refinement gets the chance to find such swaps before the
//! final flow is decoded into job executions.

use std::collections::BTreeSet;
use std::fmt::Debug;

use itertools::Itertools;

use super::FeasibilityNetwork;
use crate::models::Schedulable;

/// Improves the set of active slots after the greedy sweep.
///
/// On return, `active` must hold exactly the open slots that may carry
/// work, and the network must be feasible.
pub trait SlotRefinement: Send + Sync + Debug {
    /// Refinement name.
    fn name(&self) -> &'static str;

    /// Refines `active` in place, keeping `network` in sync.
    fn refine<J: Schedulable>(
        &self,
        network: &mut FeasibilityNetwork<'_, J>,
        active: &mut BTreeSet<i64>,
    );
}

/// Keeps the sweep result as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRefinement;

impl SlotRefinement for NoRefinement {
    fn name(&self) -> &'static str {
        "none"
    }

    fn refine<J: Schedulable>(
        &self,
        _network: &mut FeasibilityNetwork<'_, J>,
        _active: &mut BTreeSet<i64>,
    ) {
    }
}

/// Swap-based local search.
///
/// For `k = 1..=B`, tries closing `k` active slots while opening `k - 1`
/// inactive candidate slots. The first feasible swap is kept and the
/// search restarts; it stops once no swap of any size is feasible.
/// Every kept swap reduces the active time by one.
///
/// The neighbourhood grows exponentially with `B`, which is typically
/// small. [`LocalSearch::with_max_iterations`] bounds the number of kept
/// swaps.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalSearch {
    max_iterations: Option<usize>,
}

impl LocalSearch {
    /// Unbounded local search.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stops after `max_iterations` improving swaps (`None` = unbounded).
    pub fn with_max_iterations(mut self, max_iterations: Option<usize>) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Finds and applies one improving swap. Returns whether it did.
    fn improve<J: Schedulable>(
        &self,
        network: &mut FeasibilityNetwork<'_, J>,
        active: &mut BTreeSet<i64>,
    ) -> bool {
        let opened: Vec<i64> = active.iter().copied().collect();
        let closed: Vec<i64> = network
            .candidate_slots()
            .into_iter()
            .filter(|t| !active.contains(t))
            .collect();

        for k in 1..=network.max_concurrency().min(opened.len()) {
            for close in (0..opened.len()).combinations(k) {
                for open in (0..closed.len()).combinations(k - 1) {
                    for &i in &close {
                        network.close_slot(opened[i]);
                    }
                    for &i in &open {
                        network.open_slot(closed[i]);
                    }

                    if network.is_feasible() {
                        for &i in &close {
                            active.remove(&opened[i]);
                        }
                        active.extend(open.iter().map(|&i| closed[i]));
                        tracing::debug!(closed = k, opened = k - 1, "local search swap kept");
                        return true;
                    }

                    for &i in &open {
                        network.close_slot(closed[i]);
                    }
                    for &i in &close {
                        network.open_slot(opened[i]);
                    }
                }
            }
        }
        false
    }
}

impl SlotRefinement for LocalSearch {
    fn name(&self) -> &'static str {
        "local_search"
    }

    fn refine<J: Schedulable>(
        &self,
        network: &mut FeasibilityNetwork<'_, J>,
        active: &mut BTreeSet<i64>,
    ) {
        let mut swaps = 0usize;
        loop {
            if self.max_iterations.is_some_and(|max| swaps >= max) {
                break;
            }
            if !self.improve(network, active) {
                break;
            }
            swaps += 1;
        }
        tracing::debug!(swaps, active = active.len(), "local search finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{JobCollection, JobPool};
    use crate::network::FlowMethod;

    /// Two jobs spread over slots 0 and 2 can share slot 1 instead.
    fn spread_instance() -> (JobPool, BTreeSet<i64>) {
        let mut pool = JobPool::new();
        pool.add_job(0, 1, 1).unwrap();
        pool.add_job(1, 2, 1).unwrap();
        (pool, BTreeSet::from([0, 2]))
    }

    #[test]
    fn test_local_search_merges_slots() {
        let (pool, mut active) = spread_instance();
        let solver = FlowMethod::default();
        let mut net = FeasibilityNetwork::build(pool.jobs(), 2, &solver).unwrap();
        net.close_slot(1);
        assert!(net.is_feasible());

        LocalSearch::new().refine(&mut net, &mut active);
        assert_eq!(active, BTreeSet::from([1]));
        assert!(net.is_open(1));
        assert!(!net.is_open(0));
        assert!(net.is_feasible());
    }

    #[test]
    fn test_local_search_closes_redundant_slot() {
        let mut pool = JobPool::new();
        pool.add_job(0, 2, 1).unwrap();
        let mut active = BTreeSet::from([0, 2]);
        let solver = FlowMethod::default();
        let mut net = FeasibilityNetwork::build(pool.jobs(), 1, &solver).unwrap();
        net.close_slot(1);

        LocalSearch::new().refine(&mut net, &mut active);
        assert_eq!(active, BTreeSet::from([2]));
        assert!(!net.is_open(0));
        assert!(net.is_open(2));
        assert!(net.is_feasible());
    }

    #[test]
    fn test_local_search_iteration_budget() {
        let (pool, mut active) = spread_instance();
        let solver = FlowMethod::default();
        let mut net = FeasibilityNetwork::build(pool.jobs(), 2, &solver).unwrap();
        net.close_slot(1);

        LocalSearch::new()
            .with_max_iterations(Some(0))
            .refine(&mut net, &mut active);
        assert_eq!(active, BTreeSet::from([0, 2]));
    }

    #[test]
    fn test_no_refinement() {
        let (pool, mut active) = spread_instance();
        let solver = FlowMethod::default();
        let mut net = FeasibilityNetwork::build(pool.jobs(), 2, &solver).unwrap();
        NoRefinement.refine(&mut net, &mut active);
        assert_eq!(active, BTreeSet::from([0, 2]));
    }
}
