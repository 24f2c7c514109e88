//! Exact schedulers for `B = 2` via maximum matching.
//!
//! # Unit jobs
//!
//! [`MatchingScheduler`] gives every timestamp two slot nodes and links
//! each job to both slots of every timestamp it may use. A first maximum
//! matching places as many jobs as possible. A second pass adds an edge
//! between the two slots of each timestamp and resumes from the first
//! matching: placed jobs stay placed, and every timestamp left without
//! jobs contributes its slot pair, so a maximum matching maximises the
//! number of idle timestamps.
//!
//! # Arbitrary durations
//!
//! [`DegreeConstrainedSubgraphScheduler`] replaces the slot pair by a
//! three-node gadget: a hub with cap 2 and two cap-1 nodes. Jobs connect
//! to hubs with cap = duration. The triangle edges of a gadget add 2 to a
//! degree-constrained subgraph when the hub is idle and 1 otherwise. The
//! same two passes then yield a full schedule with the most idle hubs.
//!
//! # Reference
//! Chang, Gabow & Khuller (2014), "A Model for Minimizing Active
//! Processor Time", Sec. 4

use std::sync::Arc;

use super::Scheduler;
use crate::error::{ensure_concurrency, SchedulingError};
use crate::models::{JobCollection, JobScheduleMI, Schedulable, Schedule, TimeInterval};
use crate::network::{
    DcsReduction, EdmondsBlossom, Graph, MatchingSolver, NodeIndex, VertexSplittingReduction,
};

/// The only concurrency bound the matching schedulers support.
pub const MAX_CONCURRENCY: usize = 2;

/// Checks the requested bound against [`MAX_CONCURRENCY`].
fn ensure_pairwise(max_concurrency: usize) -> Result<(), SchedulingError> {
    ensure_concurrency(max_concurrency)?;
    if max_concurrency != MAX_CONCURRENCY {
        return Err(SchedulingError::UnsupportedConcurrency {
            expected: MAX_CONCURRENCY,
            actual: max_concurrency,
        });
    }
    Ok(())
}

/// First and last timestamp any job can use.
fn horizon<J: Schedulable>(jobs: &[J]) -> TimeInterval {
    let start = jobs.iter().map(Schedulable::earliest_start).min().unwrap_or(0);
    let end = jobs.iter().map(Schedulable::latest_end).max().unwrap_or(0);
    TimeInterval::new(start, end)
}

/// Active time from realised job executions.
fn active_time<J: Schedulable>(job_schedules: &[JobScheduleMI<J>]) -> Vec<TimeInterval> {
    TimeInterval::merge_time_intervals(
        job_schedules
            .iter()
            .flat_map(|s| s.execution_intervals.iter().copied()),
    )
}

/// Optimal scheduler for unit jobs with `B = 2`.
#[derive(Debug, Clone)]
pub struct MatchingScheduler {
    solver: Arc<dyn MatchingSolver>,
}

impl MatchingScheduler {
    /// Creates the scheduler with Edmonds' blossom algorithm.
    pub fn new() -> Self {
        Self {
            solver: Arc::new(EdmondsBlossom),
        }
    }

    /// Uses a custom maximum matching solver.
    pub fn with_matching_solver(mut self, solver: Arc<dyn MatchingSolver>) -> Self {
        self.solver = solver;
        self
    }

    /// Schedules `pool` with at most two jobs per timestamp.
    #[tracing::instrument(level = "debug", name = "Matching", skip_all, fields(jobs = pool.size()))]
    pub fn schedule<P>(&self, pool: &P) -> Result<Schedule<JobScheduleMI<P::Job>>, SchedulingError>
    where
        P: JobCollection,
        P::Job: Clone,
    {
        let jobs = pool.jobs();
        for job in jobs {
            match job.duration() {
                Some(1) => {}
                Some(duration) => {
                    return Err(SchedulingError::NonUnitJob {
                        job: job.id(),
                        duration,
                    })
                }
                None => return Err(SchedulingError::MissingDuration(job.id())),
            }
        }
        if jobs.is_empty() {
            return Ok(Schedule::empty());
        }

        let horizon = horizon(jobs);
        let n = jobs.len();
        let slot = |t: i64, k: usize| n + 2 * (t - horizon.start) as usize + k;

        let mut graph = Graph::new(n + 2 * horizon.duration() as usize);
        for (i, job) in jobs.iter().enumerate() {
            for t in job.availability_intervals().iter().flat_map(TimeInterval::iter) {
                graph.add_edge(i, slot(t, 0));
                graph.add_edge(i, slot(t, 1));
            }
        }

        let placing = self.solver.maximum_matching(&graph, None);
        let placed = (0..n).filter(|&i| placing.is_matched(i)).count();
        if placed < n {
            tracing::debug!(placed, jobs = n, "not every job fits");
            return Ok(Schedule::infeasible());
        }

        for t in horizon.iter() {
            graph.add_edge(slot(t, 0), slot(t, 1));
        }
        let matching = self.solver.maximum_matching(&graph, Some(&placing));

        let mut job_schedules = Vec::with_capacity(n);
        for (i, job) in jobs.iter().enumerate() {
            let Some(node) = matching.mate(i) else {
                return Ok(Schedule::infeasible());
            };
            let t = horizon.start + ((node - n) / 2) as i64;
            job_schedules.push(JobScheduleMI::new(job.clone(), vec![TimeInterval::unit(t)]));
        }
        let active_time = active_time(&job_schedules);
        tracing::debug!(
            active = TimeInterval::total_duration(&active_time),
            idle_pairs = matching.size() - n,
            "matching finished"
        );

        Ok(Schedule::feasible(active_time, job_schedules))
    }
}

impl Default for MatchingScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Scheduler<P> for MatchingScheduler
where
    P: JobCollection,
    P::Job: Clone,
{
    type Output = JobScheduleMI<P::Job>;

    fn name(&self) -> &'static str {
        "matching"
    }

    fn process(
        &self,
        pool: &P,
        max_concurrency: usize,
    ) -> Result<Schedule<Self::Output>, SchedulingError> {
        ensure_pairwise(max_concurrency)?;
        self.schedule(pool)
    }
}

/// Optimal scheduler for jobs of any duration with `B = 2`.
#[derive(Debug, Clone)]
pub struct DegreeConstrainedSubgraphScheduler {
    solver: Arc<dyn MatchingSolver>,
    reduction: Arc<dyn DcsReduction>,
}

impl DegreeConstrainedSubgraphScheduler {
    /// Creates the scheduler with Edmonds' blossom algorithm and the
    /// vertex-splitting reduction.
    pub fn new() -> Self {
        Self {
            solver: Arc::new(EdmondsBlossom),
            reduction: Arc::new(VertexSplittingReduction),
        }
    }

    /// Uses a custom maximum matching solver.
    pub fn with_matching_solver(mut self, solver: Arc<dyn MatchingSolver>) -> Self {
        self.solver = solver;
        self
    }

    /// Uses a custom DCS reduction.
    pub fn with_reduction(mut self, reduction: Arc<dyn DcsReduction>) -> Self {
        self.reduction = reduction;
        self
    }

    /// Schedules `pool` with at most two jobs per timestamp.
    #[tracing::instrument(level = "debug", name = "Degree Constrained Subgraph", skip_all, fields(jobs = pool.size()))]
    pub fn schedule<P>(&self, pool: &P) -> Result<Schedule<JobScheduleMI<P::Job>>, SchedulingError>
    where
        P: JobCollection,
        P::Job: Clone,
    {
        let jobs = pool.jobs();
        let mut demand = Vec::with_capacity(jobs.len());
        for job in jobs {
            let duration = job
                .duration()
                .ok_or(SchedulingError::MissingDuration(job.id()))?;
            demand.push(duration);
        }
        if jobs.is_empty() {
            return Ok(Schedule::empty());
        }

        let horizon = horizon(jobs);
        let n = jobs.len();
        let hub = |t: i64| n + 3 * (t - horizon.start) as usize;
        let node_count = n + 3 * horizon.duration() as usize;

        let mut capacities = vec![0usize; node_count];
        for (i, &d) in demand.iter().enumerate() {
            capacities[i] = d as usize;
        }
        for t in horizon.iter() {
            capacities[hub(t)] = MAX_CONCURRENCY;
            capacities[hub(t) + 1] = 1;
            capacities[hub(t) + 2] = 1;
        }

        let mut graph = Graph::new(node_count);
        for (i, job) in jobs.iter().enumerate() {
            for t in job.availability_intervals().iter().flat_map(TimeInterval::iter) {
                graph.add_edge(i, hub(t));
            }
        }
        let auxiliary = self.reduction.construct_auxiliary_graph(&graph, &capacities);
        let placing = self.solver.maximum_matching(&auxiliary.graph, None);

        for t in horizon.iter() {
            let h = hub(t);
            graph.add_edge(h, h + 1);
            graph.add_edge(h, h + 2);
            graph.add_edge(h + 1, h + 2);
        }
        let auxiliary = self.reduction.construct_auxiliary_graph(&graph, &capacities);
        let matching = self.solver.maximum_matching(&auxiliary.graph, Some(&placing));
        let dcs = self.reduction.construct_dcs_from_matching(&auxiliary, &matching);

        let mut job_schedules = Vec::with_capacity(n);
        for (i, job) in jobs.iter().enumerate() {
            let timestamps: Vec<i64> = dcs
                .get(&i)
                .into_iter()
                .flatten()
                .map(|&h: &NodeIndex| horizon.start + ((h - n) / 3) as i64)
                .collect();
            demand[i] -= timestamps.len() as i64;
            job_schedules.push(JobScheduleMI::new(
                job.clone(),
                TimeInterval::merge_timestamps(timestamps),
            ));
        }
        if demand.iter().any(|&d| d != 0) {
            tracing::debug!(
                unmet = demand.iter().filter(|&&d| d != 0).count(),
                "jobs left with unmet demand"
            );
            return Ok(Schedule::infeasible());
        }

        let active_time = active_time(&job_schedules);
        tracing::debug!(
            active = TimeInterval::total_duration(&active_time),
            "degree constrained subgraph finished"
        );
        Ok(Schedule::feasible(active_time, job_schedules))
    }
}

impl Default for DegreeConstrainedSubgraphScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Scheduler<P> for DegreeConstrainedSubgraphScheduler
where
    P: JobCollection,
    P::Job: Clone,
{
    type Output = JobScheduleMI<P::Job>;

    fn name(&self) -> &'static str {
        "degree_constrained_subgraph"
    }

    fn process(
        &self,
        pool: &P,
        max_concurrency: usize,
    ) -> Result<Schedule<Self::Output>, SchedulingError> {
        ensure_pairwise(max_concurrency)?;
        self.schedule(pool)
    }
}
