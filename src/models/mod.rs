//! Active time scheduling domain models.
//!
//! Provides the data types shared by every scheduler: time intervals,
//! jobs, job pools, realised job schedules and the final schedule.
//!
//! # Domain Mappings
//!
//! | Model | Data center | Batch processing | Energy |
//! |-------|-------------|------------------|--------|
//! | Job | VM request | Batch item | Charging demand |
//! | Availability interval | Lease window | Processing window | Plug-in window |
//! | Max concurrency | Slots per server | Oven capacity | Charger ports |
//! | Active time | Server power-on time | Oven runs | Charger on-time |

mod interval;
mod job;
mod job_schedule;
mod pool;
mod schedule;

pub use interval::TimeInterval;
pub use job::{BatchJob, Job, JobId, JobMI, Schedulable};
pub use job_schedule::{BatchJobSchedule, ExecutionRecord, JobSchedule, JobScheduleMI};
pub use pool::{
    FixedLengthJobPool, FixedLengthJobPoolMI, FixedLengthPool, JobCollection, JobPool, JobPoolMI,
    Pool, UnitJobPool, UnitJobPoolMI, UnitPool,
};
pub use schedule::Schedule;
