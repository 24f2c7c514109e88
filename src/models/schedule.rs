//! Schedule (solution) model.
//!
//! A schedule is either infeasible, or a set of active time intervals
//! together with the realised execution of every job.
//!
//! # Invariant
//! `active_time_intervals` and `job_schedules` are both `None` exactly
//! when `all_jobs_scheduled` is `false`. The constructors are the only
//! way to build a schedule, so the invariant cannot be broken.

use serde::{Deserialize, Serialize};

use super::{ExecutionRecord, JobId, TimeInterval};

/// Result of a scheduling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule<S> {
    all_jobs_scheduled: bool,
    active_time_intervals: Option<Vec<TimeInterval>>,
    job_schedules: Option<Vec<S>>,
}

impl<S> Schedule<S> {
    /// The schedule of an instance that admits no feasible solution.
    pub fn infeasible() -> Self {
        Self {
            all_jobs_scheduled: false,
            active_time_intervals: None,
            job_schedules: None,
        }
    }

    /// A feasible schedule.
    pub fn feasible(active_time_intervals: Vec<TimeInterval>, job_schedules: Vec<S>) -> Self {
        Self {
            all_jobs_scheduled: true,
            active_time_intervals: Some(active_time_intervals),
            job_schedules: Some(job_schedules),
        }
    }

    /// The trivially feasible schedule of an empty pool.
    pub fn empty() -> Self {
        Self::feasible(Vec::new(), Vec::new())
    }

    /// Whether every job of the pool was scheduled.
    #[inline]
    pub fn all_jobs_scheduled(&self) -> bool {
        self.all_jobs_scheduled
    }

    /// Ordered, disjoint intervals during which at least one job runs.
    pub fn active_time_intervals(&self) -> Option<&[TimeInterval]> {
        self.active_time_intervals.as_deref()
    }

    /// Per-job (or per-batch) executions.
    pub fn job_schedules(&self) -> Option<&[S]> {
        self.job_schedules.as_deref()
    }

    /// Number of active timestamps, `None` if infeasible.
    pub fn active_time(&self) -> Option<i64> {
        self.active_time_intervals
            .as_ref()
            .map(|intervals| TimeInterval::total_duration(intervals))
    }

    /// Consumes the schedule, returning its parts.
    pub fn into_parts(self) -> (bool, Option<Vec<TimeInterval>>, Option<Vec<S>>) {
        (
            self.all_jobs_scheduled,
            self.active_time_intervals,
            self.job_schedules,
        )
    }
}

impl<S: ExecutionRecord> Schedule<S> {
    /// Flattened `(job, intervals)` pairs across all job schedules.
    ///
    /// Empty for an infeasible schedule.
    pub fn executions(&self) -> Vec<(JobId, Vec<TimeInterval>)> {
        self.job_schedules
            .iter()
            .flatten()
            .flat_map(ExecutionRecord::executions)
            .collect()
    }

    /// Execution intervals of one job, if it was scheduled.
    pub fn execution_of(&self, job: JobId) -> Option<Vec<TimeInterval>> {
        self.executions()
            .into_iter()
            .find(|(id, _)| *id == job)
            .map(|(_, intervals)| intervals)
    }
}
