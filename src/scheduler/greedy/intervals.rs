//! Greedy scheduling over elementary intervals.
//!
//! The horizon is cut at every window start and every window end + 1.
//! Inside one of the resulting elementary intervals every timestamp is
//! available to exactly the same jobs, so only the number of open
//! timestamps matters, not which ones. Each interval gets a single node:
//!
//! ```text
//! source --d_j--> job_j --L_k--> interval_k --B*L_k--> sink
//! ```
//!
//! where `L_k` is the open length of interval `k`. Intervals are visited
//! left to right; a binary search finds the largest suffix that can be
//! withdrawn while the flow still meets the demand. The open prefix
//! `[start, end - left]` stays active.
//!
//! Decoding lays the flow of each interval out over its open prefix with
//! wrap-around packing, which gives every job at most one unit per
//! timestamp and at most `B` jobs per timestamp.
//!
//! # Complexity
//! O(n log T) max-flow computations on a network with O(n) interval nodes.
//!
//! # Reference
//! Kumar & Khuller (2018), "A Greedy 2 Approximation for the Active Time
//! Problem"

use std::sync::Arc;

use crate::error::{ensure_concurrency, SchedulingError};
use crate::models::{JobCollection, JobScheduleMI, Schedulable, Schedule, TimeInterval};
use crate::network::{FlowMethod, FlowNetwork, FlowResult, MaxFlowSolver, NodeIndex};
use crate::scheduler::Scheduler;

/// Interval-node greedy scheduler (2-approximation for single-window jobs).
#[derive(Debug, Clone)]
pub struct GreedyIntervalsScheduler {
    solver: Arc<dyn MaxFlowSolver>,
}

impl GreedyIntervalsScheduler {
    /// Creates the scheduler with the default flow method.
    pub fn new() -> Self {
        Self {
            solver: Arc::new(FlowMethod::default()),
        }
    }

    /// Uses one of the built-in max-flow algorithms.
    pub fn with_flow_method(mut self, method: FlowMethod) -> Self {
        self.solver = Arc::new(method);
        self
    }

    /// Uses a custom max-flow solver.
    pub fn with_flow_solver(mut self, solver: Arc<dyn MaxFlowSolver>) -> Self {
        self.solver = solver;
        self
    }
}

impl Default for GreedyIntervalsScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Scheduler<P> for GreedyIntervalsScheduler
where
    P: JobCollection,
    P::Job: Clone,
{
    type Output = JobScheduleMI<P::Job>;

    fn name(&self) -> &'static str {
        "greedy_intervals"
    }

    #[tracing::instrument(level = "debug", name = "Greedy Intervals", skip_all, fields(jobs = pool.size()))]
    fn process(
        &self,
        pool: &P,
        max_concurrency: usize,
    ) -> Result<Schedule<Self::Output>, SchedulingError> {
        ensure_concurrency(max_concurrency)?;
        if pool.is_empty() {
            return Ok(Schedule::empty());
        }

        let jobs = pool.jobs();
        let solver = self.solver.as_ref();
        let mut network = IntervalNetwork::build(jobs, max_concurrency)?;
        if !network.is_feasible(solver) {
            tracing::debug!(demand = network.demand, "infeasible with every interval open");
            return Ok(Schedule::infeasible());
        }

        for k in 0..network.intervals.len() {
            let duration = network.intervals[k].duration();
            let (mut left, mut right) = (0, duration + 1);
            while right - left > 1 {
                let middle = (left + right) / 2;
                network.set_open_length(k, duration - middle);
                if network.is_feasible(solver) {
                    left = middle;
                } else {
                    right = middle;
                }
            }
            network.set_open_length(k, duration - left);
            tracing::trace!(
                interval = %network.intervals[k],
                withdrawn = left,
                "interval shrunk"
            );
        }

        let flow = solver.max_flow(&network.network, network.source(), network.sink());
        if flow.value < network.demand {
            return Ok(Schedule::infeasible());
        }

        let timestamps = network.decode(&flow);
        let job_schedules: Vec<_> = jobs
            .iter()
            .zip(timestamps)
            .map(|(job, ts)| JobScheduleMI::new(job.clone(), TimeInterval::merge_timestamps(ts)))
            .collect();
        let active_time = TimeInterval::merge_time_intervals(
            job_schedules
                .iter()
                .flat_map(|s| s.execution_intervals.iter().copied()),
        );
        tracing::debug!(
            active = TimeInterval::total_duration(&active_time),
            "interval sweep finished"
        );

        Ok(Schedule::feasible(active_time, job_schedules))
    }
}

/// Flow network over elementary intervals.
struct IntervalNetwork {
    intervals: Vec<TimeInterval>,
    /// Jobs available throughout each interval.
    coverage: Vec<Vec<usize>>,
    open: Vec<i64>,
    network: FlowNetwork,
    job_count: usize,
    demand: i64,
    max_concurrency: i64,
}

impl IntervalNetwork {
    /// Builds the network with every interval fully open.
    fn build<J: Schedulable>(jobs: &[J], max_concurrency: usize) -> Result<Self, SchedulingError> {
        let mut breakpoints: Vec<i64> = jobs
            .iter()
            .flat_map(|j| j.availability_intervals())
            .flat_map(|w| [w.start, w.end + 1])
            .collect();
        breakpoints.sort_unstable();
        breakpoints.dedup();

        let mut intervals = Vec::new();
        let mut coverage = Vec::new();
        for pair in breakpoints.windows(2) {
            let interval = TimeInterval::new(pair[0], pair[1] - 1);
            let covering: Vec<usize> = jobs
                .iter()
                .enumerate()
                .filter(|(_, j)| j.availability_intervals().iter().any(|w| w.covers(&interval)))
                .map(|(i, _)| i)
                .collect();
            if !covering.is_empty() {
                intervals.push(interval);
                coverage.push(covering);
            }
        }

        let node_count = jobs.len() + intervals.len() + 2;
        let mut this = Self {
            open: vec![0; intervals.len()],
            intervals,
            coverage,
            network: FlowNetwork::new(node_count),
            job_count: jobs.len(),
            demand: 0,
            max_concurrency: max_concurrency as i64,
        };

        for (i, job) in jobs.iter().enumerate() {
            let duration = job
                .duration()
                .ok_or(SchedulingError::MissingDuration(job.id()))?;
            this.demand += duration;
            let (source, node) = (this.source(), this.job_node(i));
            this.network.set_capacity(source, node, duration);
        }
        for k in 0..this.intervals.len() {
            let duration = this.intervals[k].duration();
            this.set_open_length(k, duration);
        }

        Ok(this)
    }

    /// Keeps the first `length` timestamps of interval `k` open.
    fn set_open_length(&mut self, k: usize, length: i64) {
        self.open[k] = length;
        let (node, sink) = (self.interval_node(k), self.sink());
        for idx in 0..self.coverage[k].len() {
            let job = self.job_node(self.coverage[k][idx]);
            self.network.set_capacity(job, node, length);
        }
        self.network
            .set_capacity(node, sink, self.max_concurrency * length);
    }

    fn is_feasible(&self, solver: &dyn MaxFlowSolver) -> bool {
        solver
            .max_flow(&self.network, self.source(), self.sink())
            .value
            >= self.demand
    }

    /// Per-job executed timestamps, packed with wrap-around per interval.
    fn decode(&self, flow: &FlowResult) -> Vec<Vec<i64>> {
        let mut timestamps = vec![Vec::new(); self.job_count];
        for (k, interval) in self.intervals.iter().enumerate() {
            let open = self.open[k];
            if open == 0 {
                continue;
            }
            let node = self.interval_node(k);
            let mut cursor = 0;
            for &j in &self.coverage[k] {
                let units = flow.flow(self.job_node(j), node);
                for _ in 0..units {
                    timestamps[j].push(interval.start + cursor % open);
                    cursor += 1;
                }
            }
        }
        timestamps
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
    fn interval_node(&self, k: usize) -> NodeIndex {
        1 + self.job_count + k
    }

    #[inline]
    fn sink(&self) -> NodeIndex {
        self.network.node_count() - 1
    }
}
