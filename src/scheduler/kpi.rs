//! Schedule quality metrics (KPIs).
//!
//! Summarizes how well a schedule uses the timestamps it keeps active.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Active time | Number of active timestamps |
//! | Busy time | Sum of executed job units |
//! | Active intervals | Number of maximal active runs (power-on events) |
//! | Utilization | busy / (active * B) |
//! | Mean concurrency | busy / active |
//! | Peak concurrency | Most jobs running at one timestamp |
//!
//! # Reference
//! Chang, Khuller & Mukherjee (2017), "LP Rounding and Combinatorial
//! Algorithms for Minimizing Active and Busy Time", Sec. 1

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{ExecutionRecord, Schedule, TimeInterval};

/// Active time indicators of one schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleKpi {
    /// Whether every job was scheduled. All other fields are zero if not.
    pub feasible: bool,
    /// Number of active timestamps.
    pub active_time: i64,
    /// Executed job units over all jobs.
    pub busy_time: i64,
    /// Number of maximal active intervals.
    pub active_intervals: usize,
    /// Fraction of active capacity in use (0.0..1.0).
    pub utilization: f64,
    /// Mean number of jobs per active timestamp.
    pub mean_concurrency: f64,
    /// Largest number of jobs at one timestamp.
    pub peak_concurrency: usize,
}

impl ScheduleKpi {
    /// Computes KPIs of `schedule` under the bound `max_concurrency`.
    pub fn calculate<S: ExecutionRecord>(schedule: &Schedule<S>, max_concurrency: usize) -> Self {
        let Some(intervals) = schedule.active_time_intervals() else {
            return Self::infeasible();
        };

        let mut load: BTreeMap<i64, usize> = BTreeMap::new();
        for (_, executed) in schedule.executions() {
            for t in executed.iter().flat_map(TimeInterval::iter) {
                *load.entry(t).or_insert(0) += 1;
            }
        }

        let active_time = TimeInterval::total_duration(intervals);
        let busy_time = load.values().sum::<usize>() as i64;
        let capacity = active_time * max_concurrency as i64;

        Self {
            feasible: true,
            active_time,
            busy_time,
            active_intervals: intervals.len(),
            utilization: if capacity == 0 {
                0.0
            } else {
                busy_time as f64 / capacity as f64
            },
            mean_concurrency: if active_time == 0 {
                0.0
            } else {
                busy_time as f64 / active_time as f64
            },
            peak_concurrency: load.values().copied().max().unwrap_or(0),
        }
    }

    fn infeasible() -> Self {
        Self {
            feasible: false,
            active_time: 0,
            busy_time: 0,
            active_intervals: 0,
            utilization: 0.0,
            mean_concurrency: 0.0,
            peak_concurrency: 0,
        }
    }

    /// Whether the schedule is feasible and uses at least
    /// `min_utilization` of its active capacity.
    pub fn meets_utilization(&self, min_utilization: f64) -> bool {
        self.feasible && self.utilization >= min_utilization
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Job, JobCollection, JobPool, JobScheduleMI};
    use crate::scheduler::{GreedyScheduler, Scheduler};

    #[test]
    fn test_kpi_basic() {
        let mut pool = JobPool::new();
        pool.add_job(0, 5, 2).unwrap();
        pool.add_job(0, 5, 1).unwrap();
        let jobs = pool.jobs();

        let schedule = Schedule::feasible(
            vec![TimeInterval::new(0, 1), TimeInterval::new(4, 4)],
            vec![
                JobScheduleMI::new(jobs[0].clone(), vec![TimeInterval::new(0, 1)]),
                JobScheduleMI::new(jobs[1].clone(), vec![TimeInterval::new(4, 4)]),
            ],
        );

        let kpi = ScheduleKpi::calculate(&schedule, 2);
        assert!(kpi.feasible);
        assert_eq!(kpi.active_time, 3);
        assert_eq!(kpi.busy_time, 3);
        assert_eq!(kpi.active_intervals, 2);
        assert!((kpi.utilization - 0.5).abs() < 1e-10);
        assert!((kpi.mean_concurrency - 1.0).abs() < 1e-10);
        assert_eq!(kpi.peak_concurrency, 1);
        assert!(kpi.meets_utilization(0.5));
        assert!(!kpi.meets_utilization(0.6));
    }

    #[test]
    fn test_kpi_infeasible() {
        let schedule: Schedule<JobScheduleMI<Job>> = Schedule::infeasible();
        let kpi = ScheduleKpi::calculate(&schedule, 2);
        assert!(!kpi.feasible);
        assert_eq!(kpi.active_time, 0);
        assert!(!kpi.meets_utilization(0.0));
    }

    #[test]
    fn test_kpi_empty() {
        let schedule: Schedule<JobScheduleMI<Job>> = Schedule::empty();
        let kpi = ScheduleKpi::calculate(&schedule, 3);
        assert!(kpi.feasible);
        assert_eq!(kpi.utilization, 0.0);
        assert_eq!(kpi.peak_concurrency, 0);
    }

    #[test]
    fn test_kpi_of_full_slot() {
        let mut pool = JobPool::new();
        pool.add_job(0, 3, 1).unwrap();
        pool.add_job(2, 5, 1).unwrap();
        let schedule = GreedyScheduler::new().process(&pool, 2).unwrap();

        let kpi = ScheduleKpi::calculate(&schedule, 2);
        assert_eq!(kpi.active_time, 1);
        assert_eq!(kpi.peak_concurrency, 2);
        assert!((kpi.utilization - 1.0).abs() < 1e-10);

        let json = serde_json::to_string(&kpi).unwrap();
        let back: ScheduleKpi = serde_json::from_str(&json).unwrap();
        assert_eq!(back, kpi);
    }
}
