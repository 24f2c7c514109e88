//! Active time scheduling.
//!
//! Schedules jobs with release times, deadlines and durations on a
//! machine that runs at most `B` jobs at once, keeping the number of
//! timestamps at which the machine is switched on (its *active time*) as
//! small as possible.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `TimeInterval`, `Job`, `JobMI`, job pools,
//!   job schedules and `Schedule`
//! - **`scheduler`**: The `Scheduler` trait and every algorithm: batch,
//!   greedy flow, lazy activation and matching-based schedulers, plus
//!   `ScheduleKpi`
//! - **`network`**: Max-flow, maximum matching and degree-constrained
//!   subgraph building blocks
//! - **`disjoint_set`**: Union-find over timestamps
//! - **`validation`**: Pool integrity checks and schedule verification
//! - **`error`**: `SchedulingError`
//!
//! # Example
//!
//! ```
//! use active_time_scheduling::models::JobPool;
//! use active_time_scheduling::scheduler::{GreedyScheduler, Scheduler};
//!
//! let mut pool = JobPool::new();
//! pool.add_job(0, 1, 1).unwrap();
//! pool.add_job(0, 1, 1).unwrap();
//!
//! let schedule = GreedyScheduler::new().process(&pool, 1).unwrap();
//! assert!(schedule.all_jobs_scheduled());
//! assert_eq!(schedule.active_time(), Some(2));
//! ```
//!
//! # References
//!
//! - Chang, Gabow & Khuller (2014), "A Model for Minimizing Active
//!   Processor Time"
//! - Chang, Khuller & Mukherjee (2017), "LP Rounding and Combinatorial
//!   Algorithms for Minimizing Active and Busy Time"
//! - Kumar & Khuller (2018), "Brief Announcement: A Greedy 2
//!   Approximation for the Active Time Problem"

pub mod disjoint_set;
pub mod error;
pub mod models;
pub mod network;
pub mod scheduler;
pub mod validation;

pub use error::SchedulingError;
