//! Greedy flow-based schedulers.
//!
//! # Algorithm
//!
//! 1. Build the [`FeasibilityNetwork`] with every slot open. If the max
//!    flow is below the total demand, the instance is infeasible.
//! 2. Visit slots in the order of a [`SlotOrdering`]. Close each one; if
//!    the flow drops below the demand, reopen it and mark it active.
//! 3. Let a [`SlotRefinement`] improve the active set.
//! 4. Compute the final flow and read each job's timestamps off the
//!    job-to-slot edges carrying flow.
//!
//! The active time reported is the union of the realised executions.
//!
//! # Variants
//!
//! | Alias | Ordering | Refinement |
//! |-------|----------|------------|
//! | [`GreedyScheduler`] | [`IncreasingTime`] | none |
//! | [`GreedyLocalSearchScheduler`] | [`IncreasingTime`] | [`LocalSearch`] |
//! | [`GreedyLowestDensityFirstScheduler`] | [`LowestDensityFirst`] | none |
//! | [`MinFeasScheduler`] | [`RandomOrder`] | none |
//!
//! [`GreedyIntervalsScheduler`] follows the same idea on interval nodes
//! instead of per-timestamp slots.
//!
//! # Complexity
//! O(T) max-flow computations for the sweep, T = horizon length.

mod feasibility;
mod intervals;
mod ordering;
mod refinement;

pub use feasibility::FeasibilityNetwork;
pub use intervals::GreedyIntervalsScheduler;
pub use ordering::{IncreasingTime, LowestDensityFirst, RandomOrder, SlotOrdering, SlotWeight};
pub use refinement::{LocalSearch, NoRefinement, SlotRefinement};

use std::collections::BTreeSet;
use std::sync::Arc;

use super::Scheduler;
use crate::error::{ensure_concurrency, SchedulingError};
use crate::models::{JobCollection, JobScheduleMI, Schedule, TimeInterval};
use crate::network::{FlowMethod, MaxFlowSolver};

/// Greedy slot-closing scheduler, parameterized by ordering and refinement.
#[derive(Debug, Clone)]
pub struct GreedyFlowScheduler<O, R> {
    name: &'static str,
    ordering: O,
    refinement: R,
    solver: Arc<dyn MaxFlowSolver>,
}

/// Increasing-time sweep (2-approximation).
pub type GreedyScheduler = GreedyFlowScheduler<IncreasingTime, NoRefinement>;
/// Increasing-time sweep followed by swap local search.
pub type GreedyLocalSearchScheduler = GreedyFlowScheduler<IncreasingTime, LocalSearch>;
/// Lowest-density-first sweep (3-approximation without a weight).
pub type GreedyLowestDensityFirstScheduler = GreedyFlowScheduler<LowestDensityFirst, NoRefinement>;
/// Random-order sweep (3-approximation).
pub type MinFeasScheduler = GreedyFlowScheduler<RandomOrder, NoRefinement>;

impl<O, R> GreedyFlowScheduler<O, R> {
    /// Creates a scheduler from its strategies.
    pub fn with_strategies(name: &'static str, ordering: O, refinement: R) -> Self {
        Self {
            name,
            ordering,
            refinement,
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

    /// Replaces the slot ordering.
    pub fn with_ordering<O2>(self, ordering: O2) -> GreedyFlowScheduler<O2, R> {
        GreedyFlowScheduler {
            name: self.name,
            ordering,
            refinement: self.refinement,
            solver: self.solver,
        }
    }

    /// Replaces the refinement.
    pub fn with_refinement<R2>(self, refinement: R2) -> GreedyFlowScheduler<O, R2> {
        GreedyFlowScheduler {
            name: self.name,
            ordering: self.ordering,
            refinement,
            solver: self.solver,
        }
    }

    /// The configured max-flow solver.
    pub fn flow_solver(&self) -> &dyn MaxFlowSolver {
        self.solver.as_ref()
    }
}

impl GreedyFlowScheduler<IncreasingTime, NoRefinement> {
    /// Creates the increasing-time greedy scheduler.
    pub fn new() -> Self {
        Self::with_strategies("greedy", IncreasingTime, NoRefinement)
    }
}

impl GreedyFlowScheduler<IncreasingTime, LocalSearch> {
    /// Creates the greedy scheduler with unbounded local search.
    pub fn new() -> Self {
        Self::with_strategies("greedy_local_search", IncreasingTime, LocalSearch::new())
    }
}

impl GreedyFlowScheduler<LowestDensityFirst, NoRefinement> {
    /// Creates the lowest-density-first scheduler without a weight.
    pub fn new() -> Self {
        Self::with_strategies(
            "greedy_lowest_density_first",
            LowestDensityFirst::new(),
            NoRefinement,
        )
    }
}

impl GreedyFlowScheduler<RandomOrder, NoRefinement> {
    /// Creates the random-order scheduler with an unseeded RNG.
    pub fn new() -> Self {
        Self::with_strategies("min_feas", RandomOrder::new(), NoRefinement)
    }
}

impl Default for GreedyScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for GreedyLocalSearchScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for GreedyLowestDensityFirstScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for MinFeasScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, O, R> Scheduler<P> for GreedyFlowScheduler<O, R>
where
    P: JobCollection,
    P::Job: Clone,
    O: SlotOrdering,
    R: SlotRefinement,
{
    type Output = JobScheduleMI<P::Job>;

    fn name(&self) -> &'static str {
        self.name
    }

    #[tracing::instrument(level = "debug", name = "Greedy Flow", skip_all, fields(scheduler = self.name, jobs = pool.size()))]
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
        let mut network = FeasibilityNetwork::build(jobs, max_concurrency, self.solver.as_ref())?;
        if !network.is_feasible() {
            tracing::debug!(demand = network.demand(), "infeasible with every slot open");
            return Ok(Schedule::infeasible());
        }

        let mut active = BTreeSet::new();
        for t in self.ordering.order(jobs, network.horizon()) {
            network.close_slot(t);
            if !network.is_feasible() {
                network.open_slot(t);
                active.insert(t);
                tracing::trace!(t, "slot kept open");
            }
        }
        tracing::debug!(
            ordering = self.ordering.name(),
            active = active.len(),
            "greedy sweep finished"
        );

        self.refinement.refine(&mut network, &mut active);

        let flow = network.max_flow();
        if flow.value < network.demand() {
            tracing::warn!(
                refinement = self.refinement.name(),
                "refinement left an infeasible network"
            );
            return Ok(Schedule::infeasible());
        }

        let job_schedules: Vec<_> = jobs
            .iter()
            .enumerate()
            .map(|(i, job)| {
                let executed = TimeInterval::merge_timestamps(network.job_timestamps(&flow, i));
                JobScheduleMI::new(job.clone(), executed)
            })
            .collect();
        let active_time = TimeInterval::merge_time_intervals(
            job_schedules
                .iter()
                .flat_map(|s| s.execution_intervals.iter().copied()),
        );

        Ok(Schedule::feasible(active_time, job_schedules))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{JobPool, JobPoolMI, UnitJobPool};
    use crate::scheduler::testing::{
        assert_verified, brute_force_optimum, random_job_pool, random_multi_interval_pool,
    };
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_empty_pool() {
        let pool = JobPool::new();
        let schedule = GreedyScheduler::new().process(&pool, 2).unwrap();
        assert!(schedule.all_jobs_scheduled());
        assert_eq!(schedule.active_time_intervals(), Some(&[][..]));
        assert_eq!(schedule.job_schedules().map(<[_]>::len), Some(0));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut pool = JobPool::new();
        pool.add_job(0, 1, 1).unwrap();
        assert_eq!(
            GreedyScheduler::new().process(&pool, 0).unwrap_err(),
            SchedulingError::InvalidMaxConcurrency
        );
    }

    #[test]
    fn test_sequential_unit_jobs() {
        let mut pool = JobPool::new();
        pool.add_job(0, 1, 1).unwrap();
        pool.add_job(0, 1, 1).unwrap();

        let schedule = GreedyScheduler::new().process(&pool, 1).unwrap();
        assert!(schedule.all_jobs_scheduled());
        assert_eq!(schedule.active_time(), Some(2));
        assert_verified(&pool, &schedule, 1);
    }

    #[test]
    fn test_infeasible_instance() {
        let mut pool = UnitJobPool::new();
        for _ in 0..3 {
            pool.add_job(0, 0).unwrap();
        }
        let schedule = GreedyScheduler::new().process(&pool, 2).unwrap();
        assert!(!schedule.all_jobs_scheduled());
        assert!(schedule.active_time_intervals().is_none());
        assert!(schedule.job_schedules().is_none());
    }

    #[test]
    fn test_jobs_share_a_slot() {
        let mut pool = JobPool::new();
        pool.add_job(0, 4, 1).unwrap();
        pool.add_job(2, 6, 1).unwrap();
        pool.add_job(4, 8, 1).unwrap();

        let schedule = GreedyScheduler::new().process(&pool, 3).unwrap();
        assert_eq!(schedule.active_time(), Some(1));
        assert_eq!(
            schedule.active_time_intervals(),
            Some(&[TimeInterval::new(4, 4)][..])
        );
        assert_verified(&pool, &schedule, 3);
    }

    #[test]
    fn test_multi_interval_jobs() {
        let mut pool = JobPoolMI::new();
        pool.add_job(vec![TimeInterval::new(0, 1), TimeInterval::new(6, 7)], 2)
            .unwrap();
        pool.add_job(vec![TimeInterval::new(6, 9)], 2).unwrap();

        let schedule = GreedyScheduler::new().process(&pool, 2).unwrap();
        assert_eq!(schedule.active_time(), Some(2));
        assert_verified(&pool, &schedule, 2);
    }

    #[test]
    fn test_every_flow_method_is_feasible() {
        let mut rng = SmallRng::seed_from_u64(11);
        let pool = random_job_pool(&mut rng, 6, 10, 3);
        for method in FlowMethod::ALL {
            let scheduler = GreedyScheduler::new().with_flow_method(method);
            assert_eq!(scheduler.flow_solver().name(), method.name());
            let schedule = scheduler.process(&pool, 2).unwrap();
            if schedule.all_jobs_scheduled() {
                assert_verified(&pool, &schedule, 2);
            }
        }
    }

    #[test]
    fn test_approximation_bounds() {
        let mut rng = SmallRng::seed_from_u64(42);
        for round in 0..30 {
            let pool = random_job_pool(&mut rng, 5, 9, 3);
            let b = 1 + round % 3;
            let Some(opt) = brute_force_optimum(&pool, b) else {
                assert!(!GreedyScheduler::new().process(&pool, b).unwrap().all_jobs_scheduled());
                continue;
            };

            let greedy = GreedyScheduler::new().process(&pool, b).unwrap();
            let local = GreedyLocalSearchScheduler::new().process(&pool, b).unwrap();
            let density = GreedyLowestDensityFirstScheduler::new().process(&pool, b).unwrap();
            let min_feas = MinFeasScheduler::new()
                .with_ordering(RandomOrder::new().with_seed(round as u64))
                .process(&pool, b)
                .unwrap();

            for (schedule, factor) in [(&greedy, 2), (&local, 2), (&density, 3), (&min_feas, 3)] {
                assert!(schedule.all_jobs_scheduled());
                assert_verified(&pool, schedule, b);
                let active = schedule.active_time().unwrap();
                assert!(active >= opt);
                assert!(active <= factor * opt, "{active} > {factor} * {opt}");
            }
            assert!(local.active_time() <= greedy.active_time());
        }
    }

    #[test]
    fn test_multi_interval_feasibility() {
        let mut rng = SmallRng::seed_from_u64(5);
        for _ in 0..20 {
            let pool = random_multi_interval_pool(&mut rng, 4, 8, 2);
            let schedule = GreedyScheduler::new().process(&pool, 2).unwrap();
            match brute_force_optimum(&pool, 2) {
                None => assert!(!schedule.all_jobs_scheduled()),
                Some(opt) => {
                    assert_verified(&pool, &schedule, 2);
                    assert!(schedule.active_time().unwrap() >= opt);
                }
            }
        }
    }

    #[test]
    fn test_weighted_lowest_density_first() {
        let mut rng = SmallRng::seed_from_u64(8);
        let pool = random_job_pool(&mut rng, 6, 10, 2);
        let scheduler = GreedyLowestDensityFirstScheduler::new()
            .with_ordering(LowestDensityFirst::new().with_weight(|load| load * load));
        let schedule = scheduler.process(&pool, 3).unwrap();
        if schedule.all_jobs_scheduled() {
            assert_verified(&pool, &schedule, 3);
        }
        assert_eq!(Scheduler::<JobPool>::name(&scheduler), "greedy_lowest_density_first");
    }
}
