//! Realised executions of jobs.
//!
//! Each scheduler reports per-job results in the shape that suits its
//! algorithm:
//! - [`JobScheduleMI`]: a job and the intervals it runs in (flow and
//!   matching schedulers).
//! - [`JobSchedule`]: a job and one contiguous execution window (lazy
//!   activation).
//! - [`BatchJobSchedule`]: several jobs sharing one slot (batch scheduler).
//!
//! [`ExecutionRecord`] flattens all three for verification.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::{BatchJob, Job, JobId, Schedulable, TimeInterval};

/// Uniform view of what a job schedule executed.
pub trait ExecutionRecord {
    /// `(job, execution intervals)` for every job covered by the record.
    fn executions(&self) -> Vec<(JobId, Vec<TimeInterval>)>;
}

/// A job together with the ordered intervals it executes in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobScheduleMI<J> {
    /// The scheduled job.
    pub job: J,
    /// Ordered, disjoint execution intervals.
    pub execution_intervals: Vec<TimeInterval>,
}

impl<J: Schedulable> JobScheduleMI<J> {
    /// Creates a job schedule.
    pub fn new(job: J, execution_intervals: Vec<TimeInterval>) -> Self {
        Self {
            job,
            execution_intervals,
        }
    }

    /// Total executed units.
    pub fn executed_duration(&self) -> i64 {
        TimeInterval::total_duration(&self.execution_intervals)
    }
}

impl<J: Schedulable> ExecutionRecord for JobScheduleMI<J> {
    fn executions(&self) -> Vec<(JobId, Vec<TimeInterval>)> {
        vec![(self.job.id(), self.execution_intervals.clone())]
    }
}

/// A single-window job executing in one contiguous window.
///
/// Ordered by `(execution_start, execution_end, job)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSchedule {
    /// The scheduled job.
    pub job: Job,
    /// First executed timestamp.
    pub execution_start: i64,
    /// Last executed timestamp.
    pub execution_end: i64,
}

impl JobSchedule {
    /// Creates a job schedule spanning the job's whole window.
    pub fn new(job: Job) -> Self {
        let execution_start = job.release_time();
        let execution_end = job.deadline();
        Self {
            job,
            execution_start,
            execution_end,
        }
    }

    /// The execution window.
    pub fn execution_interval(&self) -> TimeInterval {
        TimeInterval::new(self.execution_start, self.execution_end)
    }
}

impl PartialOrd for JobSchedule {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for JobSchedule {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.execution_start, self.execution_end, &self.job).cmp(&(
            other.execution_start,
            other.execution_end,
            &other.job,
        ))
    }
}

impl ExecutionRecord for JobSchedule {
    fn executions(&self) -> Vec<(JobId, Vec<TimeInterval>)> {
        vec![(self.job.id(), vec![self.execution_interval()])]
    }
}

/// A batch of jobs sharing the slot `[execution_start, execution_end]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchJobSchedule {
    /// Jobs in the batch, ordered by `(release_time, deadline, id)`.
    pub jobs: Vec<BatchJob>,
    /// First timestamp of the shared slot.
    pub execution_start: i64,
    /// Last timestamp of the shared slot.
    pub execution_end: i64,
}

impl BatchJobSchedule {
    /// The shared slot.
    pub fn execution_interval(&self) -> TimeInterval {
        TimeInterval::new(self.execution_start, self.execution_end)
    }

    /// Number of jobs in the batch.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether the batch holds no job.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

impl PartialOrd for BatchJobSchedule {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BatchJobSchedule {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.execution_start, self.execution_end, &self.jobs).cmp(&(
            other.execution_start,
            other.execution_end,
            &other.jobs,
        ))
    }
}

impl ExecutionRecord for BatchJobSchedule {
    fn executions(&self) -> Vec<(JobId, Vec<TimeInterval>)> {
        let slot = self.execution_interval();
        self.jobs.iter().map(|j| (j.id(), vec![slot])).collect()
    }
}
