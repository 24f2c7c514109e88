//! Pool validation and schedule verification.
//!
//! [`validate_pool`] checks the structural integrity of a job pool before
//! scheduling. Detects:
//! - Duplicate job IDs
//! - Jobs without availability
//! - Non-positive durations
//! - Windows shorter than the job's duration
//!
//! [`verify_schedule`] checks a produced schedule against its pool:
//! every job runs exactly once, inside its availability, for exactly its
//! duration; no timestamp exceeds the concurrency bound; and the reported
//! active time is exactly the union of all executions.
//!
//! Both collect every issue instead of stopping at the first.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::models::{ExecutionRecord, JobCollection, JobId, Schedulable, Schedule, TimeInterval};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two jobs share the same ID.
    DuplicateId,
    /// A job has no availability window.
    EmptyAvailability,
    /// A job's duration is zero or negative.
    NonPositiveDuration,
    /// A job's availability is shorter than its duration.
    WindowTooShort,
    /// A pool job is missing from the schedule.
    MissingJob,
    /// The schedule contains a job the pool does not know.
    UnknownJob,
    /// A job appears more than once in the schedule.
    DuplicateJob,
    /// A job executes outside its availability.
    OutsideAvailability,
    /// A job's executed units differ from its duration.
    WrongDuration,
    /// More than `max_concurrency` jobs run at one timestamp.
    ConcurrencyExceeded,
    /// Reported active time differs from the union of executions.
    ActiveTimeMismatch,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates the jobs of a pool.
///
/// Checks:
/// 1. No duplicate job IDs
/// 2. Every job has at least one availability window
/// 3. Every duration is positive
/// 4. Every job fits in its availability
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_pool<P: JobCollection>(pool: &P) -> ValidationResult {
    let mut errors = Vec::new();
    let mut ids = HashSet::new();

    for job in pool.jobs() {
        let id = job.id();
        if !ids.insert(id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate job ID: {id}"),
            ));
        }

        if job.availability_intervals().is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyAvailability,
                format!("Job {id} has no availability interval"),
            ));
            continue;
        }

        match job.duration() {
            Some(d) if d < 1 => errors.push(ValidationError::new(
                ValidationErrorKind::NonPositiveDuration,
                format!("Job {id} has non-positive duration {d}"),
            )),
            Some(d) if d > job.length() => errors.push(ValidationError::new(
                ValidationErrorKind::WindowTooShort,
                format!(
                    "Job {id} needs {d} units but is available for {}",
                    job.length()
                ),
            )),
            _ => {}
        }
    }

    finish(errors)
}

/// Verifies a schedule against its pool and concurrency bound.
///
/// An infeasible schedule carries no executions and always verifies.
/// Jobs without their own duration are only checked for availability.
pub fn verify_schedule<P, S>(
    pool: &P,
    schedule: &Schedule<S>,
    max_concurrency: usize,
) -> ValidationResult
where
    P: JobCollection,
    S: ExecutionRecord,
{
    if !schedule.all_jobs_scheduled() {
        return Ok(());
    }

    let mut errors = Vec::new();
    let mut seen: HashSet<JobId> = HashSet::new();
    let mut load: BTreeMap<i64, usize> = BTreeMap::new();

    for (id, intervals) in schedule.executions() {
        if !seen.insert(id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateJob,
                format!("Job {id} is scheduled more than once"),
            ));
            continue;
        }

        let Some(job) = pool.get(id) else {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownJob,
                format!("Scheduled job {id} is not in the pool"),
            ));
            continue;
        };

        let windows = job.availability_intervals();
        for interval in &intervals {
            if !windows.iter().any(|w| w.covers(interval)) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::OutsideAvailability,
                    format!("Job {id} executes in {interval} outside its availability"),
                ));
            }
        }

        let timestamps: BTreeSet<i64> = intervals.iter().flat_map(TimeInterval::iter).collect();
        let executed = TimeInterval::total_duration(&intervals);
        if executed != timestamps.len() as i64 {
            errors.push(ValidationError::new(
                ValidationErrorKind::WrongDuration,
                format!("Job {id} has overlapping execution intervals"),
            ));
        }
        if let Some(d) = job.duration() {
            if timestamps.len() as i64 != d {
                errors.push(ValidationError::new(
                    ValidationErrorKind::WrongDuration,
                    format!("Job {id} executes {} units, needs {d}", timestamps.len()),
                ));
            }
        }

        for t in timestamps {
            *load.entry(t).or_insert(0) += 1;
        }
    }

    for job in pool.jobs() {
        if !seen.contains(&job.id()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingJob,
                format!("Job {} is not scheduled", job.id()),
            ));
        }
    }

    for (&t, &count) in &load {
        if count > max_concurrency {
            errors.push(ValidationError::new(
                ValidationErrorKind::ConcurrencyExceeded,
                format!("{count} jobs run at {t}, limit is {max_concurrency}"),
            ));
        }
    }

    let expected = TimeInterval::merge_timestamps(load.keys().copied());
    let reported = schedule.active_time_intervals().unwrap_or_default();
    if expected.as_slice() != reported {
        errors.push(ValidationError::new(
            ValidationErrorKind::ActiveTimeMismatch,
            format!(
                "Active time {} differs from executions {}",
                format_intervals(reported),
                format_intervals(&expected)
            ),
        ));
    }

    finish(errors)
}

fn finish(errors: Vec<ValidationError>) -> ValidationResult {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn format_intervals(intervals: &[TimeInterval]) -> String {
    let parts: Vec<String> = intervals.iter().map(ToString::to_string).collect();
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Job, JobPool, JobScheduleMI};

    fn sample_pool() -> JobPool {
        let mut pool = JobPool::new();
        pool.add_job(0, 3, 2).unwrap();
        pool.add_job(1, 2, 1).unwrap();
        pool
    }

    fn schedule_of(
        pool: &JobPool,
        runs: &[&[TimeInterval]],
        active: Vec<TimeInterval>,
    ) -> Schedule<JobScheduleMI<Job>> {
        let jobs = pool
            .jobs()
            .iter()
            .zip(runs)
            .map(|(job, run)| JobScheduleMI::new(job.clone(), run.to_vec()))
            .collect();
        Schedule::feasible(active, jobs)
    }

    fn kinds(result: ValidationResult) -> Vec<ValidationErrorKind> {
        result.unwrap_err().into_iter().map(|e| e.kind).collect()
    }

    #[test]
    fn test_valid_pool() {
        assert!(validate_pool(&sample_pool()).is_ok());
    }

    #[test]
    fn test_window_too_short() {
        let mut pool = JobPool::new();
        pool.add_job(0, 1, 3).unwrap();
        assert_eq!(
            kinds(validate_pool(&pool)),
            vec![ValidationErrorKind::WindowTooShort]
        );
    }

    #[test]
    fn test_valid_schedule() {
        let pool = sample_pool();
        let schedule = schedule_of(
            &pool,
            &[&[TimeInterval::new(1, 2)], &[TimeInterval::new(2, 2)]],
            vec![TimeInterval::new(1, 2)],
        );
        assert!(verify_schedule(&pool, &schedule, 2).is_ok());
    }

    #[test]
    fn test_concurrency_and_active_time() {
        let pool = sample_pool();
        let schedule = schedule_of(
            &pool,
            &[&[TimeInterval::new(1, 2)], &[TimeInterval::new(2, 2)]],
            vec![TimeInterval::new(0, 2)],
        );
        let found = kinds(verify_schedule(&pool, &schedule, 1));
        assert!(found.contains(&ValidationErrorKind::ConcurrencyExceeded));
        assert!(found.contains(&ValidationErrorKind::ActiveTimeMismatch));
    }

    #[test]
    fn test_outside_availability_and_duration() {
        let pool = sample_pool();
        let schedule = schedule_of(
            &pool,
            &[&[TimeInterval::new(3, 3)], &[TimeInterval::new(0, 0)]],
            vec![TimeInterval::new(0, 0), TimeInterval::new(3, 3)],
        );
        let found = kinds(verify_schedule(&pool, &schedule, 2));
        assert!(found.contains(&ValidationErrorKind::OutsideAvailability));
        assert!(found.contains(&ValidationErrorKind::WrongDuration));
        assert!(!found.contains(&ValidationErrorKind::ActiveTimeMismatch));
    }

    #[test]
    fn test_missing_job() {
        let pool = sample_pool();
        let schedule = schedule_of(
            &pool,
            &[&[TimeInterval::new(0, 1)]],
            vec![TimeInterval::new(0, 1)],
        );
        assert_eq!(
            kinds(verify_schedule(&pool, &schedule, 2)),
            vec![ValidationErrorKind::MissingJob]
        );
    }

    #[test]
    fn test_infeasible_schedule_verifies() {
        let pool = sample_pool();
        let schedule: Schedule<JobScheduleMI<Job>> = Schedule::infeasible();
        assert!(verify_schedule(&pool, &schedule, 1).is_ok());
    }
}
