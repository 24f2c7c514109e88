//! Job models.
//!
//! A job is a demand for `duration` units of execution that may only run
//! inside its availability windows. Three variants exist:
//!
//! | Type | Windows | Duration | Used by |
//! |------|---------|----------|---------|
//! | [`JobMI`] | one or more | yes | greedy flow, matching |
//! | [`Job`] | exactly one | yes | every scheduler |
//! | [`BatchJob`] | exactly one | none | batch schedules |
//!
//! Identity comes from [`JobId`], handed out by the owning
//! [`JobPool`](super::JobPool).

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use super::pool::normalize_windows;
use super::TimeInterval;
use crate::error::{ensure_positive, SchedulingError};

/// Pool-assigned job identifier.
///
/// Ids are allocated in increasing order by the owning pool and are used
/// for tie-breaking and hashing, never for ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(pub usize);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Common view over every job variant.
pub trait Schedulable {
    /// Pool-assigned identifier.
    fn id(&self) -> JobId;

    /// Ordered, disjoint windows in which the job may execute.
    fn availability_intervals(&self) -> &[TimeInterval];

    /// Required execution units, if the job carries its own duration.
    fn duration(&self) -> Option<i64>;

    /// Total span available: sum of availability window durations.
    fn length(&self) -> i64 {
        TimeInterval::total_duration(self.availability_intervals())
    }

    /// Whether the job may execute at timestamp `t`.
    fn is_available_at(&self, t: i64) -> bool {
        self.availability_intervals().iter().any(|i| i.contains(t))
    }

    /// Earliest timestamp of any window.
    fn earliest_start(&self) -> i64 {
        self.availability_intervals()
            .first()
            .map(|i| i.start)
            .unwrap_or(0)
    }

    /// Latest timestamp of any window.
    fn latest_end(&self) -> i64 {
        self.availability_intervals()
            .last()
            .map(|i| i.end)
            .unwrap_or(0)
    }
}

/// A job with several disjoint availability windows.
///
/// Equality and hashing use the id only. Deserialized windows are
/// merged into ordered, disjoint form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "JobMIFields")]
pub struct JobMI {
    id: JobId,
    availability_intervals: Vec<TimeInterval>,
    duration: i64,
}

#[derive(Deserialize)]
struct JobMIFields {
    id: JobId,
    availability_intervals: Vec<TimeInterval>,
    duration: i64,
}

impl TryFrom<JobMIFields> for JobMI {
    type Error = SchedulingError;

    fn try_from(fields: JobMIFields) -> Result<Self, Self::Error> {
        ensure_positive(fields.duration)?;
        let windows = normalize_windows(fields.availability_intervals)?;
        Ok(Self::new(fields.id, windows, fields.duration))
    }
}

impl JobMI {
    /// Creates a job. Windows are expected ordered and disjoint.
    pub(crate) fn new(id: JobId, availability_intervals: Vec<TimeInterval>, duration: i64) -> Self {
        Self {
            id,
            availability_intervals,
            duration,
        }
    }
}

impl Schedulable for JobMI {
    fn id(&self) -> JobId {
        self.id
    }

    fn availability_intervals(&self) -> &[TimeInterval] {
        &self.availability_intervals
    }

    fn duration(&self) -> Option<i64> {
        Some(self.duration)
    }
}

impl PartialEq for JobMI {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for JobMI {}

impl Hash for JobMI {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A job with a single availability window `[release_time, deadline]`.
///
/// The window is the only stored time data; `release_time` and
/// `deadline` are views onto it. Ordered by `(release_time, deadline, id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "JobFields")]
pub struct Job {
    id: JobId,
    interval: TimeInterval,
    duration: i64,
}

#[derive(Deserialize)]
struct JobFields {
    id: JobId,
    interval: TimeInterval,
    duration: i64,
}

impl TryFrom<JobFields> for Job {
    type Error = SchedulingError;

    fn try_from(fields: JobFields) -> Result<Self, Self::Error> {
        ensure_positive(fields.duration)?;
        Ok(Self::new(fields.id, fields.interval, fields.duration))
    }
}

impl Job {
    pub(crate) fn new(id: JobId, interval: TimeInterval, duration: i64) -> Self {
        Self {
            id,
            interval,
            duration,
        }
    }

    /// Earliest timestamp the job may execute at.
    #[inline]
    pub fn release_time(&self) -> i64 {
        self.interval.start
    }

    /// Latest timestamp the job may execute at.
    #[inline]
    pub fn deadline(&self) -> i64 {
        self.interval.end
    }

    /// The single availability window.
    #[inline]
    pub fn interval(&self) -> TimeInterval {
        self.interval
    }

    /// Required execution units.
    #[inline]
    pub fn required_duration(&self) -> i64 {
        self.duration
    }

    /// Converts into the multi-interval representation.
    pub fn to_multi_interval(&self) -> JobMI {
        JobMI::new(self.id, vec![self.interval], self.duration)
    }

    fn key(&self) -> (i64, i64, JobId) {
        (self.release_time(), self.deadline(), self.id)
    }
}

impl Schedulable for Job {
    fn id(&self) -> JobId {
        self.id
    }

    fn availability_intervals(&self) -> &[TimeInterval] {
        std::slice::from_ref(&self.interval)
    }

    fn duration(&self) -> Option<i64> {
        Some(self.duration)
    }
}

impl PartialEq for Job {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Job {}

impl Hash for Job {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for Job {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Job {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// A single-window job without its own duration.
///
/// Members of a batch share the batch's slot, so the slot length rather
/// than the job defines how long it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BatchJob {
    id: JobId,
    interval: TimeInterval,
}

impl BatchJob {
    /// Earliest timestamp the job may start at.
    #[inline]
    pub fn release_time(&self) -> i64 {
        self.interval.start
    }

    /// Latest timestamp the job may execute at.
    #[inline]
    pub fn deadline(&self) -> i64 {
        self.interval.end
    }
}

impl From<&Job> for BatchJob {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id,
            interval: job.interval,
        }
    }
}

impl Schedulable for BatchJob {
    fn id(&self) -> JobId {
        self.id
    }

    fn availability_intervals(&self) -> &[TimeInterval] {
        std::slice::from_ref(&self.interval)
    }

    fn duration(&self) -> Option<i64> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_job_views() {
        let job = Job::new(JobId(0), TimeInterval::new(2, 9), 3);
        assert_eq!(job.release_time(), 2);
        assert_eq!(job.deadline(), 9);
        assert_eq!(job.duration(), Some(3));
        assert_eq!(job.length(), 8);
        assert_eq!(job.availability_intervals(), &[TimeInterval::new(2, 9)]);
        assert!(job.is_available_at(9));
        assert!(!job.is_available_at(10));
    }

    #[test]
    fn test_job_ordering() {
        let a = Job::new(JobId(2), TimeInterval::new(0, 5), 1);
        let b = Job::new(JobId(1), TimeInterval::new(0, 6), 1);
        let c = Job::new(JobId(0), TimeInterval::new(1, 2), 1);
        let d = Job::new(JobId(3), TimeInterval::new(0, 5), 1);

        let mut jobs = vec![c.clone(), d.clone(), b.clone(), a.clone()];
        jobs.sort();
        let ids: Vec<_> = jobs.iter().map(|j| j.id()).collect();
        assert_eq!(ids, vec![JobId(2), JobId(3), JobId(1), JobId(0)]);
    }

    #[test]
    fn test_multi_interval_job() {
        let job = JobMI::new(
            JobId(4),
            vec![TimeInterval::new(0, 1), TimeInterval::new(5, 7)],
            2,
        );
        assert_eq!(job.length(), 5);
        assert_eq!(job.earliest_start(), 0);
        assert_eq!(job.latest_end(), 7);
        assert!(job.is_available_at(6));
        assert!(!job.is_available_at(3));
    }

    #[test]
    fn test_multi_interval_identity() {
        let a = JobMI::new(JobId(1), vec![TimeInterval::new(0, 1)], 1);
        let b = JobMI::new(JobId(1), vec![TimeInterval::new(3, 4)], 2);
        let set: HashSet<JobMI> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_conversions() {
        let job = Job::new(JobId(7), TimeInterval::new(3, 4), 2);
        let mi = job.to_multi_interval();
        assert_eq!(mi.id(), JobId(7));
        assert_eq!(mi.duration(), Some(2));

        let batch = BatchJob::from(&job);
        assert_eq!(batch.release_time(), 3);
        assert_eq!(batch.deadline(), 4);
        assert_eq!(batch.duration(), None);
    }

    #[test]
    fn test_deserialize_rejects_bad_jobs() {
        let job: Job =
            serde_json::from_str(r#"{"id":2,"interval":{"start":0,"end":3},"duration":2}"#).unwrap();
        assert_eq!(job.id(), JobId(2));
        assert_eq!(job.required_duration(), 2);

        let err = serde_json::from_str::<Job>(r#"{"id":0,"interval":{"start":0,"end":3},"duration":0}"#)
            .unwrap_err();
        assert!(err.to_string().contains("duration must be positive, got 0"));
    }

    #[test]
    fn test_deserialize_normalizes_windows() {
        let job: JobMI = serde_json::from_str(
            r#"{"id":1,"availability_intervals":[{"start":4,"end":5},{"start":0,"end":3}],"duration":1}"#,
        )
        .unwrap();
        assert_eq!(job.availability_intervals(), &[TimeInterval::new(0, 5)]);

        let err = serde_json::from_str::<JobMI>(r#"{"id":1,"availability_intervals":[],"duration":1}"#)
            .unwrap_err();
        assert!(err.to_string().contains("at least one availability interval"));
    }
}
