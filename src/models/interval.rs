//! Closed integer time intervals.
//!
//! # Time Model
//! Time is discrete. A timestamp `t` denotes the unit slot `[t, t + 1)`,
//! so an interval `[start, end]` covers `end - start + 1` slots. The
//! consumer defines what one unit means (a second, a tick, a shift).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::ops::RangeInclusive;

use crate::error::SchedulingError;

/// A closed interval `[start, end]` of integer timestamps.
///
/// Ordered by `(start, end)`. An interval always holds `start <= end`;
/// empty ranges are represented by the absence of an interval.
/// Deserialization rejects `start > end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "IntervalFields")]
pub struct TimeInterval {
    /// First covered timestamp.
    pub start: i64,
    /// Last covered timestamp (inclusive).
    pub end: i64,
}

#[derive(Deserialize)]
struct IntervalFields {
    start: i64,
    end: i64,
}

impl TryFrom<IntervalFields> for TimeInterval {
    type Error = SchedulingError;

    fn try_from(fields: IntervalFields) -> Result<Self, Self::Error> {
        Self::try_new(fields.start, fields.end)
    }
}

impl TimeInterval {
    /// Creates a new interval.
    ///
    /// Callers must ensure `start <= end`; use [`TimeInterval::try_new`]
    /// for untrusted input.
    pub fn new(start: i64, end: i64) -> Self {
        debug_assert!(start <= end, "empty interval [{start}, {end}]");
        Self { start, end }
    }

    /// Creates a new interval, rejecting `start > end`.
    pub fn try_new(start: i64, end: i64) -> Result<Self, SchedulingError> {
        if start > end {
            return Err(SchedulingError::InvalidInterval { start, end });
        }
        Ok(Self { start, end })
    }

    /// A single-timestamp interval `[t, t]`.
    #[inline]
    pub fn unit(t: i64) -> Self {
        Self { start: t, end: t }
    }

    /// Number of timestamps covered.
    #[inline]
    pub fn duration(&self) -> i64 {
        self.end - self.start + 1
    }

    /// Whether a timestamp falls within this interval.
    #[inline]
    pub fn contains(&self, t: i64) -> bool {
        self.start <= t && t <= self.end
    }

    /// Whether `other` lies entirely within this interval.
    #[inline]
    pub fn covers(&self, other: &Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Whether two intervals share at least one timestamp.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Iterates the covered timestamps in increasing order.
    pub fn iter(&self) -> RangeInclusive<i64> {
        self.start..=self.end
    }

    /// Merges a set of timestamps into ordered, disjoint intervals.
    ///
    /// Consecutive timestamps form one run; any gap of one or more
    /// missing timestamps splits runs. Duplicates are ignored.
    ///
    /// ```
    /// use active_time_scheduling::models::TimeInterval;
    ///
    /// let merged = TimeInterval::merge_timestamps([1, 2, 3, 5, 6]);
    /// assert_eq!(merged, vec![TimeInterval::new(1, 3), TimeInterval::new(5, 6)]);
    /// ```
    pub fn merge_timestamps<I>(timestamps: I) -> Vec<TimeInterval>
    where
        I: IntoIterator<Item = i64>,
    {
        let sorted: BTreeSet<i64> = timestamps.into_iter().collect();
        let mut merged = Vec::new();
        let mut run: Option<TimeInterval> = None;

        for t in sorted {
            run = match run {
                Some(current) if current.end + 1 == t => Some(TimeInterval::new(current.start, t)),
                Some(current) => {
                    merged.push(current);
                    Some(TimeInterval::unit(t))
                }
                None => Some(TimeInterval::unit(t)),
            };
        }

        merged.extend(run);
        merged
    }

    /// Merges intervals into ordered, disjoint intervals covering their union.
    ///
    /// Overlapping intervals merge, and so do adjacent ones
    /// (`a.end + 1 == b.start`).
    ///
    /// ```
    /// use active_time_scheduling::models::TimeInterval;
    ///
    /// let merged = TimeInterval::merge_time_intervals([
    ///     TimeInterval::new(1, 3),
    ///     TimeInterval::new(4, 6),
    /// ]);
    /// assert_eq!(merged, vec![TimeInterval::new(1, 6)]);
    /// ```
    pub fn merge_time_intervals<I>(intervals: I) -> Vec<TimeInterval>
    where
        I: IntoIterator<Item = TimeInterval>,
    {
        let mut sorted: Vec<TimeInterval> = intervals.into_iter().collect();
        sorted.sort();

        let mut merged: Vec<TimeInterval> = Vec::with_capacity(sorted.len());
        for interval in sorted {
            match merged.last_mut() {
                Some(current) if interval.start <= current.end + 1 => {
                    current.end = current.end.max(interval.end);
                }
                _ => merged.push(interval),
            }
        }
        merged
    }

    /// Sum of durations of the given intervals.
    pub fn total_duration<'a, I>(intervals: I) -> i64
    where
        I: IntoIterator<Item = &'a TimeInterval>,
    {
        intervals.into_iter().map(TimeInterval::duration).sum()
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_basics() {
        let i = TimeInterval::new(3, 7);
        assert_eq!(i.duration(), 5);
        assert!(i.contains(3));
        assert!(i.contains(7));
        assert!(!i.contains(8));
        assert_eq!(i.iter().collect::<Vec<_>>(), vec![3, 4, 5, 6, 7]);
        assert_eq!(TimeInterval::unit(4).duration(), 1);
    }

    #[test]
    fn test_try_new_rejects_empty() {
        assert!(TimeInterval::try_new(2, 2).is_ok());
        assert_eq!(
            TimeInterval::try_new(3, 2),
            Err(SchedulingError::InvalidInterval { start: 3, end: 2 })
        );
    }

    #[test]
    fn test_deserialize_validates_bounds() {
        let interval: TimeInterval = serde_json::from_str(r#"{"start":1,"end":4}"#).unwrap();
        assert_eq!(interval, TimeInterval::new(1, 4));

        let err = serde_json::from_str::<TimeInterval>(r#"{"start":5,"end":1}"#).unwrap_err();
        assert!(err.to_string().contains("interval [5, 1] is empty"));
    }

    #[test]
    fn test_overlaps_and_covers() {
        let a = TimeInterval::new(0, 4);
        let b = TimeInterval::new(4, 9);
        let c = TimeInterval::new(5, 9);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert!(TimeInterval::new(0, 9).covers(&b));
        assert!(!a.covers(&b));
    }

    #[test]
    fn test_ordering() {
        let mut v = vec![
            TimeInterval::new(2, 5),
            TimeInterval::new(1, 9),
            TimeInterval::new(2, 3),
        ];
        v.sort();
        assert_eq!(
            v,
            vec![
                TimeInterval::new(1, 9),
                TimeInterval::new(2, 3),
                TimeInterval::new(2, 5)
            ]
        );
    }

    #[test]
    fn test_merge_timestamps() {
        assert!(TimeInterval::merge_timestamps(Vec::<i64>::new()).is_empty());
        assert_eq!(
            TimeInterval::merge_timestamps([5]),
            vec![TimeInterval::new(5, 5)]
        );
        assert_eq!(
            TimeInterval::merge_timestamps([6, 1, 3, 2, 5, 2]),
            vec![TimeInterval::new(1, 3), TimeInterval::new(5, 6)]
        );
        assert_eq!(
            TimeInterval::merge_timestamps([-2, -1, 0]),
            vec![TimeInterval::new(-2, 0)]
        );
    }

    #[test]
    fn test_merge_time_intervals_adjacent() {
        assert_eq!(
            TimeInterval::merge_time_intervals([TimeInterval::new(1, 3), TimeInterval::new(4, 6)]),
            vec![TimeInterval::new(1, 6)]
        );
    }

    #[test]
    fn test_merge_time_intervals_gap_and_nesting() {
        let merged = TimeInterval::merge_time_intervals([
            TimeInterval::new(10, 12),
            TimeInterval::new(0, 5),
            TimeInterval::new(2, 3),
            TimeInterval::new(7, 8),
        ]);
        assert_eq!(
            merged,
            vec![
                TimeInterval::new(0, 5),
                TimeInterval::new(7, 8),
                TimeInterval::new(10, 12)
            ]
        );
        assert!(TimeInterval::merge_time_intervals(Vec::new()).is_empty());
    }

    #[test]
    fn test_total_duration() {
        let intervals = [TimeInterval::new(0, 1), TimeInterval::new(5, 9)];
        assert_eq!(TimeInterval::total_duration(&intervals), 7);
    }
}
