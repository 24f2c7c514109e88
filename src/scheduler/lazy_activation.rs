//! Lazy activation for unit jobs.
//!
//! Exact algorithm for unit-length, single-window jobs.
//!
//! # Algorithm
//!
//! **Deadline contraction.** Jobs are taken in decreasing release order
//! and each one claims the latest slot at or before its deadline that
//! still has room. A [`DisjointSetForest`] over the distinct deadlines
//! finds that slot: each element tracks the latest free slot of the run
//! ending at its deadline, and a run whose slots are all saturated is
//! united with its left neighbour. A job whose resolved slot lies before
//! its release cannot be placed and the instance is infeasible.
//!
//! **Lazy activation.** Resolved deadlines are walked in increasing
//! order. A slot is activated only when some job still waits for it as
//! its resolved deadline; those jobs run there, and the remaining room
//! is filled with released jobs of earliest resolved deadline.
//!
//! # Variants
//!
//! | Type | Ordering | Complexity |
//! |------|----------|------------|
//! | [`LazyActivationSchedulerNLogN`] | comparison sort | O(n log n) |
//! | [`LazyActivationSchedulerT`] | buckets over the horizon | O(n + T) |
//!
//! [`LazyActivationScheduler`] is the bucketed variant.
//!
//! # Reference
//! Chang, Gabow & Khuller (2014), "A Model for Minimizing Active
//! Processor Time", Sec. 3

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use super::Scheduler;
use crate::disjoint_set::DisjointSetForest;
use crate::error::{ensure_concurrency, SchedulingError};
use crate::models::{Job, JobCollection, JobSchedule, Schedulable, Schedule, TimeInterval};

/// Lazy activation with comparison sorts.
#[derive(Debug, Clone, Copy, Default)]
pub struct LazyActivationSchedulerNLogN;

/// Lazy activation with bucket sorts over the horizon.
#[derive(Debug, Clone, Copy, Default)]
pub struct LazyActivationSchedulerT;

/// Default lazy activation scheduler.
pub type LazyActivationScheduler = LazyActivationSchedulerT;

impl LazyActivationSchedulerNLogN {
    /// Creates the scheduler.
    pub fn new() -> Self {
        Self
    }
}

impl LazyActivationSchedulerT {
    /// Creates the scheduler.
    pub fn new() -> Self {
        Self
    }
}

/// What distinguishes the two variants.
trait ActivationOrder {
    const NAME: &'static str;

    /// Indices of `keys` by increasing key, ties by index. Every key lies
    /// within `horizon`.
    fn ordered(keys: &[i64], horizon: TimeInterval) -> Vec<usize>;

    /// Active intervals of the realised executions.
    fn active_time(schedules: &[JobSchedule]) -> Vec<TimeInterval>;
}

impl ActivationOrder for LazyActivationSchedulerNLogN {
    const NAME: &'static str = "lazy_activation_nlogn";

    fn ordered(keys: &[i64], _horizon: TimeInterval) -> Vec<usize> {
        let mut order: Vec<usize> = (0..keys.len()).collect();
        order.sort_by_key(|&i| keys[i]);
        order
    }

    fn active_time(schedules: &[JobSchedule]) -> Vec<TimeInterval> {
        TimeInterval::merge_time_intervals(schedules.iter().map(JobSchedule::execution_interval))
    }
}

impl ActivationOrder for LazyActivationSchedulerT {
    const NAME: &'static str = "lazy_activation_t";

    fn ordered(keys: &[i64], horizon: TimeInterval) -> Vec<usize> {
        let mut buckets = vec![Vec::new(); horizon.duration() as usize];
        for (i, &key) in keys.iter().enumerate() {
            buckets[(key - horizon.start) as usize].push(i);
        }
        buckets.into_iter().flatten().collect()
    }

    fn active_time(schedules: &[JobSchedule]) -> Vec<TimeInterval> {
        TimeInterval::merge_timestamps(schedules.iter().map(|s| s.execution_start))
    }
}

impl<P> Scheduler<P> for LazyActivationSchedulerNLogN
where
    P: JobCollection<Job = Job>,
{
    type Output = JobSchedule;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn process(
        &self,
        pool: &P,
        max_concurrency: usize,
    ) -> Result<Schedule<JobSchedule>, SchedulingError> {
        lazy_activation::<Self>(pool.jobs(), max_concurrency)
    }
}

impl<P> Scheduler<P> for LazyActivationSchedulerT
where
    P: JobCollection<Job = Job>,
{
    type Output = JobSchedule;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn process(
        &self,
        pool: &P,
        max_concurrency: usize,
    ) -> Result<Schedule<JobSchedule>, SchedulingError> {
        lazy_activation::<Self>(pool.jobs(), max_concurrency)
    }
}

#[tracing::instrument(level = "debug", name = "Lazy Activation", skip_all, fields(variant = O::NAME, jobs = jobs.len()))]
fn lazy_activation<O: ActivationOrder>(
    jobs: &[Job],
    max_concurrency: usize,
) -> Result<Schedule<JobSchedule>, SchedulingError> {
    ensure_concurrency(max_concurrency)?;
    if let Some(job) = jobs.iter().find(|j| j.required_duration() != 1) {
        return Err(SchedulingError::NonUnitJob {
            job: job.id(),
            duration: job.required_duration(),
        });
    }
    if jobs.is_empty() {
        return Ok(Schedule::empty());
    }

    let releases: Vec<i64> = jobs.iter().map(Job::release_time).collect();
    let deadlines: Vec<i64> = jobs.iter().map(Job::deadline).collect();
    let horizon = TimeInterval::new(
        releases.iter().copied().min().unwrap_or(0),
        deadlines.iter().copied().max().unwrap_or(0),
    );
    let by_release = O::ordered(&releases, horizon);

    let Some(resolved) =
        contract_deadlines::<O>(&releases, &deadlines, &by_release, horizon, max_concurrency)
    else {
        return Ok(Schedule::infeasible());
    };

    let slots = activate::<O>(&releases, &resolved, &by_release, horizon, max_concurrency);
    let job_schedules: Vec<JobSchedule> = jobs
        .iter()
        .zip(slots)
        .map(|(job, t)| JobSchedule {
            job: job.clone(),
            execution_start: t,
            execution_end: t,
        })
        .collect();
    let active_time = O::active_time(&job_schedules);
    tracing::debug!(
        active = TimeInterval::total_duration(&active_time),
        "lazy activation finished"
    );

    Ok(Schedule::feasible(active_time, job_schedules))
}

/// Resolved deadline of every job, or `None` if some job cannot be placed.
///
/// The forest has one element per distinct deadline `d_i`, standing for
/// the run of slots `(d_{i-1}, d_i]`, plus a sentinel below every
/// release. An element's value is the latest slot of its run with room
/// left. A saturated slot lowers that value by one; once a run is used
/// up, it is united with its left neighbour. The forest never depends on
/// the length of the horizon.
fn contract_deadlines<O: ActivationOrder>(
    releases: &[i64],
    deadlines: &[i64],
    by_release: &[usize],
    horizon: TimeInterval,
    max_concurrency: usize,
) -> Option<Vec<i64>> {
    let n = releases.len();
    let mut tops: Vec<i64> = Vec::new();
    let mut run_of = vec![0usize; n];
    for j in O::ordered(deadlines, horizon) {
        if tops.last() != Some(&deadlines[j]) {
            tops.push(deadlines[j]);
        }
        run_of[j] = tops.len();
    }

    // Lowest slot of every run. Element 0 is the sentinel.
    let floor: Vec<i64> = [i64::MIN, horizon.start]
        .into_iter()
        .chain(tops.iter().take(tops.len().saturating_sub(1)).map(|d| d + 1))
        .collect();
    let mut forest =
        DisjointSetForest::new(std::iter::once(horizon.start - 1).chain(tops.iter().copied()));
    let mut load = vec![0usize; forest.len()];
    let mut leftmost: Vec<usize> = (0..forest.len()).collect();
    let mut resolved = vec![horizon.start - 1; n];
    let mut dropped = 0usize;

    for &j in by_release.iter().rev() {
        let root = forest.find(run_of[j]);
        let slot = forest.resolve(root);
        if slot < releases[j] {
            tracing::trace!(job = j, slot, "job dropped");
            dropped += 1;
            continue;
        }
        resolved[j] = slot;
        load[root] += 1;
        if load[root] < max_concurrency {
            continue;
        }

        if slot > floor[leftmost[root]] {
            forest.set_value(root, slot - 1);
            load[root] = 0;
        } else {
            let left = forest.find(leftmost[root] - 1);
            let (left_load, left_start) = (load[left], leftmost[left]);
            forest.unite(root, left);
            let merged = forest.find(root);
            load[merged] = left_load;
            leftmost[merged] = left_start;
        }
    }

    if dropped > 0 {
        tracing::debug!(dropped, "deadline contraction left jobs unplaced");
        return None;
    }
    Some(resolved)
}

/// Execution slot of every job.
fn activate<O: ActivationOrder>(
    releases: &[i64],
    resolved: &[i64],
    by_release: &[usize],
    horizon: TimeInterval,
    max_concurrency: usize,
) -> Vec<i64> {
    let n = releases.len();
    let by_deadline = O::ordered(resolved, horizon);
    let mut slot = vec![horizon.start; n];
    let mut used = vec![false; n];
    let mut ready: BinaryHeap<Reverse<(i64, usize)>> = BinaryHeap::new();
    let mut released = 0;
    let mut i = 0;

    while i < n {
        let t = resolved[by_deadline[i]];
        while released < n && releases[by_release[released]] <= t {
            let j = by_release[released];
            ready.push(Reverse((resolved[j], j)));
            released += 1;
        }

        let mut load = 0;
        while i < n && resolved[by_deadline[i]] == t {
            let j = by_deadline[i];
            if !used[j] {
                used[j] = true;
                slot[j] = t;
                load += 1;
            }
            i += 1;
        }
        if load == 0 {
            continue;
        }

        while load < max_concurrency {
            let Some(Reverse((_, j))) = ready.pop() else {
                break;
            };
            if !used[j] {
                used[j] = true;
                slot[j] = t;
                load += 1;
            }
        }
        tracing::trace!(t, load, "slot activated");
    }
    slot
}
