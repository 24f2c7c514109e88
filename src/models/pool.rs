//! Job pools.
//!
//! A pool owns a set of jobs and the id allocator that names them. Ids
//! are dense per pool (`#0`, `#1`, ...), so two pools built the same way
//! produce identical jobs.
//!
//! | Alias | Jobs | Duration |
//! |-------|------|----------|
//! | [`JobPool`] | single window | per job |
//! | [`JobPoolMI`] | multiple windows | per job |
//! | [`FixedLengthJobPool`] | single window | pool-wide |
//! | [`FixedLengthJobPoolMI`] | multiple windows | pool-wide |
//! | [`UnitJobPool`] | single window | 1 |
//! | [`UnitJobPoolMI`] | multiple windows | 1 |

use serde::{Deserialize, Serialize};

use super::{Job, JobId, JobMI, Schedulable, TimeInterval};
use crate::error::{ensure_positive, SchedulingError};

/// Read access shared by every pool variant.
pub trait JobCollection {
    /// Job variant held by the pool.
    type Job: Schedulable;

    /// Jobs in id order.
    fn jobs(&self) -> &[Self::Job];

    /// Number of jobs.
    fn size(&self) -> usize {
        self.jobs().len()
    }

    /// Whether the pool holds no job.
    fn is_empty(&self) -> bool {
        self.jobs().is_empty()
    }

    /// Looks a job up by id.
    fn get(&self, id: JobId) -> Option<&Self::Job> {
        let jobs = self.jobs();
        jobs.binary_search_by_key(&id, |j| j.id())
            .ok()
            .map(|idx| &jobs[idx])
    }

    /// Sum of the durations of all jobs that carry one.
    fn total_duration(&self) -> i64 {
        self.jobs().iter().filter_map(|j| j.duration()).sum()
    }
}

/// A set of jobs with per-job durations.
///
/// Deserialization checks that job ids increase and stay below the id
/// counter; jobs validate themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    try_from = "PoolFields<J>",
    bound(deserialize = "J: Schedulable + Deserialize<'de>")
)]
pub struct Pool<J> {
    jobs: Vec<J>,
    next_id: usize,
}

#[derive(Deserialize)]
struct PoolFields<J> {
    jobs: Vec<J>,
    next_id: usize,
}

impl<J: Schedulable> TryFrom<PoolFields<J>> for Pool<J> {
    type Error = SchedulingError;

    fn try_from(fields: PoolFields<J>) -> Result<Self, Self::Error> {
        let mut bound = None;
        for job in &fields.jobs {
            let id = job.id();
            if bound.is_some_and(|prev| id <= prev) || id.0 >= fields.next_id {
                return Err(SchedulingError::InvalidJobId(id));
            }
            bound = Some(id);
        }
        Ok(Self {
            jobs: fields.jobs,
            next_id: fields.next_id,
        })
    }
}

/// Pool of single-window jobs.
pub type JobPool = Pool<Job>;
/// Pool of multi-window jobs.
pub type JobPoolMI = Pool<JobMI>;

impl<J> Pool<J> {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self {
            jobs: Vec::new(),
            next_id: 0,
        }
    }

    /// Iterates jobs in id order.
    pub fn iter(&self) -> std::slice::Iter<'_, J> {
        self.jobs.iter()
    }

    fn allocate_id(&mut self) -> JobId {
        let id = JobId(self.next_id);
        self.next_id += 1;
        id
    }
}

impl<J> Default for Pool<J> {
    fn default() -> Self {
        Self::new()
    }
}

impl<J: Schedulable> JobCollection for Pool<J> {
    type Job = J;

    fn jobs(&self) -> &[J] {
        &self.jobs
    }
}

impl Pool<Job> {
    /// Adds a job available in `[release_time, deadline]` that needs
    /// `duration` units. Returns the new job's id.
    ///
    /// ```
    /// use active_time_scheduling::models::{JobCollection, JobPool};
    ///
    /// let mut pool = JobPool::new();
    /// let id = pool.add_job(0, 4, 2).unwrap();
    /// assert_eq!(pool.size(), 1);
    /// assert_eq!(pool.get(id).unwrap().deadline(), 4);
    /// ```
    pub fn add_job(
        &mut self,
        release_time: i64,
        deadline: i64,
        duration: i64,
    ) -> Result<JobId, SchedulingError> {
        let interval = TimeInterval::try_new(release_time, deadline)?;
        ensure_positive(duration)?;
        let id = self.allocate_id();
        self.jobs.push(Job::new(id, interval, duration));
        Ok(id)
    }
}

impl Pool<JobMI> {
    /// Adds a job available in the union of `intervals` that needs
    /// `duration` units. Windows are merged into ordered, disjoint form.
    pub fn add_job(
        &mut self,
        intervals: Vec<TimeInterval>,
        duration: i64,
    ) -> Result<JobId, SchedulingError> {
        let windows = normalize_windows(intervals)?;
        ensure_positive(duration)?;
        let id = self.allocate_id();
        self.jobs.push(JobMI::new(id, windows, duration));
        Ok(id)
    }
}

/// A pool whose jobs all share one duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    try_from = "FixedLengthFields<J>",
    bound(deserialize = "J: Schedulable + Deserialize<'de>")
)]
pub struct FixedLengthPool<J> {
    duration: i64,
    pool: Pool<J>,
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "J: Schedulable + Deserialize<'de>"))]
struct FixedLengthFields<J> {
    duration: i64,
    pool: Pool<J>,
}

impl<J: Schedulable> TryFrom<FixedLengthFields<J>> for FixedLengthPool<J> {
    type Error = SchedulingError;

    fn try_from(fields: FixedLengthFields<J>) -> Result<Self, Self::Error> {
        ensure_positive(fields.duration)?;
        ensure_durations(&fields.pool, fields.duration)?;
        Ok(Self {
            duration: fields.duration,
            pool: fields.pool,
        })
    }
}

/// Fixed-length pool of single-window jobs.
pub type FixedLengthJobPool = FixedLengthPool<Job>;
/// Fixed-length pool of multi-window jobs.
pub type FixedLengthJobPoolMI = FixedLengthPool<JobMI>;

impl<J> FixedLengthPool<J> {
    /// Creates an empty pool whose jobs will all need `duration` units.
    pub fn new(duration: i64) -> Result<Self, SchedulingError> {
        ensure_positive(duration)?;
        Ok(Self {
            duration,
            pool: Pool::new(),
        })
    }

    /// Pool-wide job duration.
    #[inline]
    pub fn duration(&self) -> i64 {
        self.duration
    }

    /// The underlying pool.
    pub fn as_pool(&self) -> &Pool<J> {
        &self.pool
    }
}

impl<J: Schedulable> JobCollection for FixedLengthPool<J> {
    type Job = J;

    fn jobs(&self) -> &[J] {
        self.pool.jobs()
    }
}

impl FixedLengthPool<Job> {
    /// Adds a job available in `[release_time, deadline]`.
    pub fn add_job(&mut self, release_time: i64, deadline: i64) -> Result<JobId, SchedulingError> {
        self.pool.add_job(release_time, deadline, self.duration)
    }
}

impl FixedLengthPool<JobMI> {
    /// Adds a job available in the union of `intervals`.
    pub fn add_job(&mut self, intervals: Vec<TimeInterval>) -> Result<JobId, SchedulingError> {
        self.pool.add_job(intervals, self.duration)
    }
}

impl<J: Schedulable> TryFrom<Pool<J>> for FixedLengthPool<J> {
    type Error = SchedulingError;

    /// Wraps a pool whose jobs already share one duration. An empty pool
    /// has no duration to share; use [`FixedLengthPool::new`] instead.
    fn try_from(pool: Pool<J>) -> Result<Self, Self::Error> {
        let first = pool.jobs.first().ok_or(SchedulingError::EmptyPool)?;
        let duration = first
            .duration()
            .ok_or(SchedulingError::MissingDuration(first.id()))?;
        ensure_durations(&pool, duration)?;
        Ok(Self { duration, pool })
    }
}

/// A pool of unit-length jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    try_from = "UnitFields<J>",
    bound(deserialize = "J: Schedulable + Deserialize<'de>")
)]
pub struct UnitPool<J> {
    pool: Pool<J>,
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "J: Schedulable + Deserialize<'de>"))]
struct UnitFields<J> {
    pool: Pool<J>,
}

impl<J: Schedulable> TryFrom<UnitFields<J>> for UnitPool<J> {
    type Error = SchedulingError;

    fn try_from(fields: UnitFields<J>) -> Result<Self, Self::Error> {
        ensure_durations(&fields.pool, 1)?;
        Ok(Self { pool: fields.pool })
    }
}

/// Unit-length pool of single-window jobs.
pub type UnitJobPool = UnitPool<Job>;
/// Unit-length pool of multi-window jobs.
pub type UnitJobPoolMI = UnitPool<JobMI>;

impl<J> UnitPool<J> {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self { pool: Pool::new() }
    }

    /// Always 1.
    #[inline]
    pub fn duration(&self) -> i64 {
        1
    }

    /// The underlying pool.
    pub fn as_pool(&self) -> &Pool<J> {
        &self.pool
    }
}

impl<J> Default for UnitPool<J> {
    fn default() -> Self {
        Self::new()
    }
}

impl<J: Schedulable> JobCollection for UnitPool<J> {
    type Job = J;

    fn jobs(&self) -> &[J] {
        self.pool.jobs()
    }
}

impl UnitPool<Job> {
    /// Adds a unit job available in `[release_time, deadline]`.
    pub fn add_job(&mut self, release_time: i64, deadline: i64) -> Result<JobId, SchedulingError> {
        self.pool.add_job(release_time, deadline, 1)
    }
}

impl UnitPool<JobMI> {
    /// Adds a unit job available in the union of `intervals`.
    pub fn add_job(&mut self, intervals: Vec<TimeInterval>) -> Result<JobId, SchedulingError> {
        self.pool.add_job(intervals, 1)
    }
}

impl<J> From<UnitPool<J>> for FixedLengthPool<J> {
    fn from(unit: UnitPool<J>) -> Self {
        Self {
            duration: 1,
            pool: unit.pool,
        }
    }
}

/// Checks that every job of `pool` needs exactly `duration` units.
fn ensure_durations<J: Schedulable>(pool: &Pool<J>, duration: i64) -> Result<(), SchedulingError> {
    for job in &pool.jobs {
        let actual = job
            .duration()
            .ok_or(SchedulingError::MissingDuration(job.id()))?;
        if actual != duration {
            return Err(SchedulingError::DurationMismatch {
                job: job.id(),
                expected: duration,
                actual,
            });
        }
    }
    Ok(())
}

pub(crate) fn normalize_windows(
    intervals: Vec<TimeInterval>,
) -> Result<Vec<TimeInterval>, SchedulingError> {
    if intervals.is_empty() {
        return Err(SchedulingError::NoAvailability);
    }
    for interval in &intervals {
        TimeInterval::try_new(interval.start, interval.end)?;
    }
    Ok(TimeInterval::merge_time_intervals(intervals))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_pool_ids_are_dense() {
        let mut pool = JobPool::new();
        let a = pool.add_job(0, 3, 2).unwrap();
        let b = pool.add_job(1, 5, 1).unwrap();
        assert_eq!(a, JobId(0));
        assert_eq!(b, JobId(1));
        assert_eq!(pool.size(), 2);
        assert_eq!(pool.total_duration(), 3);
        assert_eq!(pool.get(b).unwrap().release_time(), 1);
        assert!(pool.get(JobId(9)).is_none());
    }

    #[test]
    fn test_job_pool_rejects_bad_input() {
        let mut pool = JobPool::new();
        assert_eq!(
            pool.add_job(4, 3, 1),
            Err(SchedulingError::InvalidInterval { start: 4, end: 3 })
        );
        assert_eq!(pool.add_job(0, 3, 0), Err(SchedulingError::InvalidDuration(0)));
        assert!(pool.is_empty());
    }

    #[test]
    fn test_multi_interval_pool_normalizes() {
        let mut pool = JobPoolMI::new();
        let id = pool
            .add_job(
                vec![
                    TimeInterval::new(6, 8),
                    TimeInterval::new(0, 2),
                    TimeInterval::new(3, 4),
                ],
                2,
            )
            .unwrap();
        let job = pool.get(id).unwrap();
        assert_eq!(
            job.availability_intervals(),
            &[TimeInterval::new(0, 4), TimeInterval::new(6, 8)]
        );
        assert_eq!(pool.add_job(vec![], 1), Err(SchedulingError::NoAvailability));
    }

    #[test]
    fn test_fixed_length_pool() {
        assert_eq!(
            FixedLengthJobPool::new(0).unwrap_err(),
            SchedulingError::InvalidDuration(0)
        );

        let mut pool = FixedLengthJobPool::new(3).unwrap();
        pool.add_job(0, 5).unwrap();
        pool.add_job(2, 9).unwrap();
        assert_eq!(pool.duration(), 3);
        assert!(pool.jobs().iter().all(|j| j.duration() == Some(3)));

        let mut mi = FixedLengthJobPoolMI::new(2).unwrap();
        mi.add_job(vec![TimeInterval::new(0, 0), TimeInterval::new(4, 4)])
            .unwrap();
        assert_eq!(mi.jobs()[0].length(), 2);
    }

    #[test]
    fn test_fixed_length_from_pool() {
        let mut pool = JobPool::new();
        pool.add_job(0, 4, 2).unwrap();
        pool.add_job(1, 4, 2).unwrap();
        let fixed = FixedLengthJobPool::try_from(pool).unwrap();
        assert_eq!(fixed.duration(), 2);

        let mut mixed = JobPool::new();
        mixed.add_job(0, 4, 2).unwrap();
        mixed.add_job(0, 4, 3).unwrap();
        assert_eq!(
            FixedLengthJobPool::try_from(mixed).unwrap_err(),
            SchedulingError::DurationMismatch {
                job: JobId(1),
                expected: 2,
                actual: 3
            }
        );

        assert_eq!(
            FixedLengthJobPool::try_from(JobPool::new()).unwrap_err(),
            SchedulingError::EmptyPool
        );
    }

    #[test]
    fn test_pool_deserialize_rejects_empty_window() {
        let json = r#"{"jobs":[{"id":0,"interval":{"start":5,"end":1},"duration":1}],"next_id":1}"#;
        let err = serde_json::from_str::<JobPool>(json).unwrap_err();
        assert!(err.to_string().contains("interval [5, 1] is empty"));

        let json = r#"{"jobs":[{"id":0,"interval":{"start":1,"end":5},"duration":1}],"next_id":1}"#;
        let pool: JobPool = serde_json::from_str(json).unwrap();
        assert_eq!(pool.size(), 1);
    }

    #[test]
    fn test_pool_deserialize_checks_ids() {
        let job = |id: usize| format!(r#"{{"id":{id},"interval":{{"start":0,"end":2}},"duration":1}}"#);

        let repeated = format!(r#"{{"jobs":[{},{}],"next_id":2}}"#, job(0), job(0));
        let err = serde_json::from_str::<JobPool>(&repeated).unwrap_err();
        assert!(err.to_string().contains("job #0 is out of id order"));

        let stale = format!(r#"{{"jobs":[{}],"next_id":1}}"#, job(3));
        assert!(serde_json::from_str::<JobPool>(&stale).is_err());

        let mut pool = JobPool::new();
        pool.add_job(0, 2, 1).unwrap();
        pool.add_job(1, 4, 2).unwrap();
        let mut back: JobPool = serde_json::from_str(&serde_json::to_string(&pool).unwrap()).unwrap();
        assert_eq!(back.add_job(0, 1, 1).unwrap(), JobId(2));
    }

    #[test]
    fn test_fixed_and_unit_deserialize_check_durations() {
        let mut pool = FixedLengthJobPool::new(2).unwrap();
        pool.add_job(0, 4).unwrap();
        let json = serde_json::to_string(&pool).unwrap();
        let back: FixedLengthJobPool = serde_json::from_str(&json).unwrap();
        assert_eq!(back.duration(), 2);

        let forged = json.replacen(r#""duration":2,"pool""#, r#""duration":3,"pool""#, 1);
        let err = serde_json::from_str::<FixedLengthJobPool>(&forged).unwrap_err();
        assert!(err.to_string().contains("pool requires 3"));

        let not_unit = json.replacen(r#""duration":2,"pool":"#, r#""pool":"#, 1);
        let err = serde_json::from_str::<UnitJobPool>(&not_unit).unwrap_err();
        assert!(err.to_string().contains("pool requires 1"));
    }

    #[test]
    fn test_unit_pool() {
        let mut pool = UnitJobPool::new();
        pool.add_job(0, 2).unwrap();
        pool.add_job(1, 1).unwrap();
        assert_eq!(pool.duration(), 1);
        assert_eq!(pool.total_duration(), 2);

        let fixed: FixedLengthJobPool = pool.into();
        assert_eq!(fixed.duration(), 1);
        assert_eq!(fixed.size(), 2);

        let mut mi = UnitJobPoolMI::new();
        mi.add_job(vec![TimeInterval::new(0, 0), TimeInterval::new(3, 3)])
            .unwrap();
        assert_eq!(mi.jobs()[0].duration(), Some(1));
    }
}
