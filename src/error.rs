//! Error types for pool construction and scheduler preconditions.
//!
//! Infeasibility is not an error: schedulers report it through
//! [`Schedule::infeasible`](crate::models::Schedule::infeasible). The
//! variants here describe malformed input that no scheduler should
//! silently accept.

use thiserror::Error;

use crate::models::JobId;

/// Errors raised by malformed pools or scheduler misuse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulingError {
    /// `max_concurrency` was zero.
    #[error("max concurrency must be at least 1")]
    InvalidMaxConcurrency,

    /// The scheduler only supports one fixed concurrency bound.
    #[error("scheduler requires max concurrency {expected}, got {actual}")]
    UnsupportedConcurrency {
        /// The only supported bound.
        expected: usize,
        /// Requested bound.
        actual: usize,
    },

    /// The number of machines of a batch scheduler was zero.
    #[error("number of machines must be at least 1")]
    InvalidMachineCount,

    /// A job (or a fixed-length pool) was given a non-positive duration.
    #[error("duration must be positive, got {0}")]
    InvalidDuration(i64),

    /// An interval with `start > end` was supplied.
    #[error("interval [{start}, {end}] is empty")]
    InvalidInterval {
        /// Supplied start.
        start: i64,
        /// Supplied end.
        end: i64,
    },

    /// A multi-interval job was created without any availability window.
    #[error("job must have at least one availability interval")]
    NoAvailability,

    /// The scheduler needs a per-job duration but the job has none.
    #[error("job {0} has no duration")]
    MissingDuration(JobId),

    /// The scheduler only handles unit-length jobs.
    #[error("job {job} has duration {duration}, expected unit length")]
    NonUnitJob {
        /// Offending job.
        job: JobId,
        /// Its duration.
        duration: i64,
    },

    /// A fixed duration was requested from a pool without jobs.
    #[error("cannot infer a fixed duration from an empty pool")]
    EmptyPool,

    /// A deserialized pool lists job ids out of order or at or above its
    /// id counter.
    #[error("job {0} is out of id order")]
    InvalidJobId(JobId),

    /// A job's duration disagrees with the fixed length of its pool.
    #[error("job {job} has duration {actual}, pool requires {expected}")]
    DurationMismatch {
        /// Offending job.
        job: JobId,
        /// Pool-wide duration.
        expected: i64,
        /// Job duration.
        actual: i64,
    },
}

/// Checks the shared `max_concurrency >= 1` precondition.
pub(crate) fn ensure_concurrency(max_concurrency: usize) -> Result<(), SchedulingError> {
    if max_concurrency == 0 {
        Err(SchedulingError::InvalidMaxConcurrency)
    } else {
        Ok(())
    }
}

/// Checks that a job or pool duration is at least 1.
pub(crate) fn ensure_positive(duration: i64) -> Result<(), SchedulingError> {
    if duration < 1 {
        return Err(SchedulingError::InvalidDuration(duration));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SchedulingError::NonUnitJob {
            job: JobId(3),
            duration: 2,
        };
        assert_eq!(err.to_string(), "job #3 has duration 2, expected unit length");

        let err = SchedulingError::InvalidInterval { start: 5, end: 1 };
        assert_eq!(err.to_string(), "interval [5, 1] is empty");
    }

    #[test]
    fn test_ensure_concurrency() {
        assert_eq!(
            ensure_concurrency(0),
            Err(SchedulingError::InvalidMaxConcurrency)
        );
        assert!(ensure_concurrency(1).is_ok());
    }

    #[test]
    fn test_ensure_positive() {
        assert_eq!(ensure_positive(0), Err(SchedulingError::InvalidDuration(0)));
        assert_eq!(ensure_positive(-3), Err(SchedulingError::InvalidDuration(-3)));
        assert!(ensure_positive(1).is_ok());
    }
}
