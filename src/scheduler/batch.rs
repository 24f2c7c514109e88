//! Batch scheduling of fixed-length jobs.
//!
//! Jobs of a [`FixedLengthJobPool`] are grouped into batches. A batch runs
//! all its members (at most `B`) in one shared slot of the pool's
//! duration `p`. On `m` machines at most `m` batches overlap; with one
//! machine, batches are disjoint and the union of their slots is the
//! active time.
//!
//! # Algorithm
//!
//! The scheduler uses as few batches as possible.
//!
//! 1. **Pre-check**: a job whose window is shorter than `p` makes the
//!    instance infeasible.
//! 2. **Candidate starts**: some optimal schedule starts every batch at
//!    `r_j + k * p` for a release `r_j` and `0 <= k < n`. Shifting each
//!    batch left until it hits a member's release or its machine's
//!    previous batch gives such a schedule.
//! 3. **Batch profile**: `X_i` counts the batches started at the first
//!    `i` candidates. Jobs fit iff every window `[a, b]` holds at least
//!    `ceil(N(a, b) / B)` batch starts, where `N(a, b)` counts the jobs
//!    whose start range `[r_j, d_j - p + 1]` lies inside it, and every
//!    span of length `p` holds at most `m` starts. These are difference
//!    constraints on `X`; their least solution, found by label
//!    correcting, is the minimum batch profile. A value above `n` means
//!    no profile exists.
//! 4. **Filling**: batches are walked by start and filled with released
//!    jobs of earliest latest start.
//!
//! # Complexity
//! O(n^3)
//!
//! # References
//! - Koehler & Khuller (2013), "Optimal Batch Schedules for Parallel
//!   Machines"
//! - Koehler & Khuller (2017), "Busy Time Scheduling on a Bounded Number
//!   of Machines"

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, VecDeque};

use super::Scheduler;
use crate::error::{ensure_concurrency, SchedulingError};
use crate::models::{
    BatchJob, BatchJobSchedule, FixedLengthJobPool, Job, JobCollection, Schedulable, Schedule,
    TimeInterval,
};

/// Batch scheduler for fixed-length jobs.
///
/// The concurrency bound `B` is the batch capacity. With `m` machines up
/// to `m * B` jobs may run at once.
#[derive(Debug, Clone, Copy)]
pub struct BatchScheduler {
    machines: usize,
}

impl BatchScheduler {
    /// Single-machine batch scheduler.
    pub fn new() -> Self {
        Self { machines: 1 }
    }

    /// Sets the number of machines.
    pub fn with_machines(mut self, machines: usize) -> Self {
        self.machines = machines;
        self
    }

    /// Number of machines.
    pub fn machines(&self) -> usize {
        self.machines
    }

    /// Start of every batch in a schedule with the fewest batches, in
    /// increasing order. `None` if the jobs cannot be batched.
    fn batch_starts(&self, jobs: &[Job], duration: i64, capacity: usize) -> Option<Vec<i64>> {
        let latest: Vec<i64> = jobs.iter().map(|j| j.deadline() - duration + 1).collect();
        let last = latest.iter().copied().max()?;
        let candidates = candidate_starts(jobs, duration, last);

        let mut profile = BatchProfile::new(candidates.len());
        for i in 1..=candidates.len() {
            let reach = candidates.partition_point(|&c| c < candidates[i - 1] + duration);
            profile.at_most(i - 1, reach, self.machines as i64);
        }
        for (lo, hi, count) in window_demands(jobs, &latest, &candidates) {
            profile.at_least(lo, hi, count.div_ceil(capacity) as i64);
        }

        let counts = profile.solve(jobs.len() as i64)?;
        Some(
            candidates
                .iter()
                .zip(counts.windows(2))
                .flat_map(|(&start, pair)| std::iter::repeat(start).take((pair[1] - pair[0]) as usize))
                .collect(),
        )
    }
}

impl Default for BatchScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Candidate batch starts `r_j + k * p` no later than `last`.
fn candidate_starts(jobs: &[Job], duration: i64, last: i64) -> Vec<i64> {
    let mut candidates = BTreeSet::new();
    for job in jobs {
        let mut start = job.release_time();
        for _ in 0..jobs.len() {
            if start > last {
                break;
            }
            candidates.insert(start);
            start += duration;
        }
    }
    candidates.into_iter().collect()
}

/// `(lo, hi, count)` for every window `[a, b]` between a release `a` and
/// a latest start `b`: `count` jobs must start inside it, and the
/// candidates inside it are `candidates[lo..hi]`.
fn window_demands(jobs: &[Job], latest: &[i64], candidates: &[i64]) -> Vec<(usize, usize, usize)> {
    let releases: BTreeSet<i64> = jobs.iter().map(Job::release_time).collect();
    let ends: BTreeSet<i64> = latest.iter().copied().collect();

    let mut demands = Vec::new();
    for &a in &releases {
        let mut inside: Vec<i64> = jobs
            .iter()
            .zip(latest)
            .filter(|(job, _)| job.release_time() >= a)
            .map(|(_, &l)| l)
            .collect();
        inside.sort_unstable();

        let lo = candidates.partition_point(|&c| c < a);
        for &b in ends.range(a..) {
            let count = inside.partition_point(|&l| l <= b);
            if count > 0 {
                demands.push((lo, candidates.partition_point(|&c| c <= b), count));
            }
        }
    }
    demands
}

/// Difference constraints over prefix counts of batch starts.
///
/// Node `i` is the number of batches starting at the first `i`
/// candidates. An edge `u -> v` of weight `w` reads `X_v >= X_u + w`.
struct BatchProfile {
    edges: Vec<Vec<(usize, i64)>>,
}

impl BatchProfile {
    fn new(candidates: usize) -> Self {
        let mut edges = vec![Vec::new(); candidates + 1];
        for (i, out) in edges.iter_mut().enumerate().take(candidates) {
            out.push((i + 1, 0));
        }
        Self { edges }
    }

    /// `X_hi - X_lo >= count`.
    fn at_least(&mut self, lo: usize, hi: usize, count: i64) {
        self.edges[lo].push((hi, count));
    }

    /// `X_hi - X_lo <= count`.
    fn at_most(&mut self, lo: usize, hi: usize, count: i64) {
        self.edges[hi].push((lo, -count));
    }

    /// Least solution with `X_0 = 0`, or `None` once some count exceeds
    /// `bound`.
    fn solve(&self, bound: i64) -> Option<Vec<i64>> {
        let n = self.edges.len();
        let mut value = vec![0i64; n];
        let mut queued = vec![true; n];
        let mut queue: VecDeque<usize> = (0..n).collect();

        while let Some(u) = queue.pop_front() {
            queued[u] = false;
            for &(v, w) in &self.edges[u] {
                if value[u] + w <= value[v] {
                    continue;
                }
                value[v] = value[u] + w;
                if value[v] > bound {
                    tracing::debug!(node = v, bound, "batch profile exceeds job count");
                    return None;
                }
                if !queued[v] {
                    queued[v] = true;
                    queue.push_back(v);
                }
            }
        }
        Some(value)
    }
}

/// Fills batches starting at `starts` with released jobs of earliest
/// latest start. `None` if some job is left over or misses its batch.
fn fill_batches(
    jobs: &[Job],
    starts: &[i64],
    duration: i64,
    capacity: usize,
) -> Option<Vec<BatchJobSchedule>> {
    let mut by_release: Vec<&Job> = jobs.iter().collect();
    by_release.sort();

    let mut ready: BinaryHeap<Reverse<(i64, usize)>> = BinaryHeap::new();
    let mut released = 0;
    let mut batches = Vec::with_capacity(starts.len());

    for &start in starts {
        while released < by_release.len() && by_release[released].release_time() <= start {
            ready.push(Reverse((by_release[released].deadline(), released)));
            released += 1;
        }

        let mut members: Vec<&Job> = Vec::with_capacity(capacity);
        while members.len() < capacity {
            let Some(Reverse((deadline, k))) = ready.pop() else {
                break;
            };
            if deadline < start + duration - 1 {
                tracing::debug!(job = %by_release[k].id(), start, "job misses its batch");
                return None;
            }
            members.push(by_release[k]);
        }
        if members.is_empty() {
            continue;
        }

        members.sort();
        tracing::trace!(start, jobs = members.len(), "batch filled");
        batches.push(BatchJobSchedule {
            jobs: members.into_iter().map(BatchJob::from).collect(),
            execution_start: start,
            execution_end: start + duration - 1,
        });
    }

    if released < by_release.len() || !ready.is_empty() {
        tracing::debug!(left = by_release.len() - released + ready.len(), "jobs left unbatched");
        return None;
    }
    Some(batches)
}

impl Scheduler<FixedLengthJobPool> for BatchScheduler {
    type Output = BatchJobSchedule;

    fn name(&self) -> &'static str {
        "batch"
    }

    #[tracing::instrument(level = "debug", name = "Batch", skip_all, fields(jobs = pool.size(), machines = self.machines))]
    fn process(
        &self,
        pool: &FixedLengthJobPool,
        max_concurrency: usize,
    ) -> Result<Schedule<BatchJobSchedule>, SchedulingError> {
        ensure_concurrency(max_concurrency)?;
        if self.machines == 0 {
            return Err(SchedulingError::InvalidMachineCount);
        }
        if pool.is_empty() {
            return Ok(Schedule::empty());
        }

        let duration = pool.duration();
        let jobs = pool.jobs();
        if let Some(job) = jobs.iter().find(|j| j.interval().duration() < duration) {
            tracing::debug!(job = %job.id(), duration, "window shorter than job length");
            return Ok(Schedule::infeasible());
        }

        let Some(starts) = self.batch_starts(jobs, duration, max_concurrency) else {
            return Ok(Schedule::infeasible());
        };
        tracing::debug!(batches = starts.len(), "batch profile computed");
        let Some(job_schedules) = fill_batches(jobs, &starts, duration, max_concurrency) else {
            return Ok(Schedule::infeasible());
        };

        let active_time = TimeInterval::merge_time_intervals(
            job_schedules.iter().map(BatchJobSchedule::execution_interval),
        );
        Ok(Schedule::feasible(active_time, job_schedules))
    }
}
