//! Slot-level feasibility network.
//!
//! # Layout
//!
//! ```text
//! source --d_j--> job_j --1--> slot_t --B--> sink
//! ```
//!
//! Node 0 is the source, jobs follow in pool order, then one node per
//! timestamp of the horizon, then the sink. A job is linked to every slot
//! of its availability. Closing a slot drops its sink capacity to zero,
//! which cuts every job edge into it at once.
//!
//! All jobs fit into the open slots iff the max flow equals the total
//! demand.

use crate::error::SchedulingError;
use crate::models::{Schedulable, TimeInterval};
use crate::network::{FlowNetwork, FlowResult, MaxFlowSolver, NodeIndex};

/// Flow network deciding whether a set of open slots can host all jobs.
#[derive(Debug)]
pub struct FeasibilityNetwork<'a, J> {
    jobs: &'a [J],
    solver: &'a dyn MaxFlowSolver,
    network: FlowNetwork,
    horizon: TimeInterval,
    demand: i64,
    max_concurrency: usize,
}

impl<'a, J: Schedulable> FeasibilityNetwork<'a, J> {
    /// Builds the network with every slot of the horizon open.
    ///
    /// `jobs` must be non-empty.
    pub fn build(
        jobs: &'a [J],
        max_concurrency: usize,
        solver: &'a dyn MaxFlowSolver,
    ) -> Result<Self, SchedulingError> {
        let t_min = jobs.iter().map(Schedulable::earliest_start).min().unwrap_or(0);
        let t_max = jobs.iter().map(Schedulable::latest_end).max().unwrap_or(0);
        let horizon = TimeInterval::try_new(t_min, t_max)?;

        let node_count = jobs.len() + horizon.duration() as usize + 2;
        let mut this = Self {
            jobs,
            solver,
            network: FlowNetwork::new(node_count),
            horizon,
            demand: 0,
            max_concurrency,
        };

        for (i, job) in jobs.iter().enumerate() {
            let duration = job
                .duration()
                .ok_or(SchedulingError::MissingDuration(job.id()))?;
            this.demand += duration;
            let (source, node) = (this.source(), this.job_node(i));
            this.network.set_capacity(source, node, duration);
            for window in job.availability_intervals() {
                for t in window.iter() {
                    let slot = this.slot_node(t);
                    this.network.set_capacity(node, slot, 1);
                }
            }
        }
        for t in horizon.iter() {
            this.open_slot(t);
        }

        Ok(this)
    }

    /// First and last timestamp any job can use.
    pub fn horizon(&self) -> TimeInterval {
        self.horizon
    }

    /// Total units of work to place.
    pub fn demand(&self) -> i64 {
        self.demand
    }

    /// Concurrency bound per slot.
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// The jobs the network was built from.
    pub fn jobs(&self) -> &'a [J] {
        self.jobs
    }

    /// Makes slot `t` available to every job.
    pub fn open_slot(&mut self, t: i64) {
        let (slot, sink) = (self.slot_node(t), self.sink());
        self.network.set_capacity(slot, sink, self.max_concurrency as i64);
    }

    /// Makes slot `t` unavailable.
    pub fn close_slot(&mut self, t: i64) {
        let (slot, sink) = (self.slot_node(t), self.sink());
        self.network.set_capacity(slot, sink, 0);
    }

    /// Whether slot `t` is currently open.
    pub fn is_open(&self, t: i64) -> bool {
        self.horizon.contains(t) && self.network.capacity(self.slot_node(t), self.sink()) > 0
    }

    /// Timestamps at which at least one job is available.
    pub fn candidate_slots(&self) -> Vec<i64> {
        self.horizon
            .iter()
            .filter(|&t| self.jobs.iter().any(|j| j.is_available_at(t)))
            .collect()
    }

    /// Maximum flow under the current open slots.
    pub fn max_flow(&self) -> FlowResult {
        self.solver.max_flow(&self.network, self.source(), self.sink())
    }

    /// Whether every job fits into the open slots.
    pub fn is_feasible(&self) -> bool {
        self.max_flow().value >= self.demand
    }

    /// Timestamps at which job `index` receives flow.
    pub fn job_timestamps(&self, flow: &FlowResult, index: usize) -> Vec<i64> {
        let job = self.job_node(index);
        self.jobs[index]
            .availability_intervals()
            .iter()
            .flat_map(TimeInterval::iter)
            .filter(|&t| flow.flow(job, self.slot_node(t)) > 0)
            .collect()
    }

    #[inline]
    fn source(&self) -> NodeIndex {
        0
    }

    #[inline]
    fn job_node(&self, index: usize) -> NodeIndex {
        1 + index
    }

    #[inline]
    fn slot_node(&self, t: i64) -> NodeIndex {
        1 + self.jobs.len() + (t - self.horizon.start) as usize
    }

    #[inline]
    fn sink(&self) -> NodeIndex {
        self.network.node_count() - 1
    }
}
