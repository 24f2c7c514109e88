//! Active time schedulers and schedule metrics.
//!
//! Every scheduler turns a job pool and a concurrency bound `B` into a
//! [`Schedule`](crate::models::Schedule) that keeps as few timestamps
//! active as it can.
//!
//! # Algorithms
//!
//! | Scheduler | Jobs | Guarantee |
//! |-----------|------|-----------|
//! | [`BatchScheduler`] | fixed length, single window | optimal |
//! | [`GreedyScheduler`] | any duration, multi-window | 2-approx (single window) |
//! | [`GreedyLocalSearchScheduler`] | any duration, multi-window | 2-approx (single window) |
//! | [`GreedyLowestDensityFirstScheduler`] | any duration, multi-window | 3-approx |
//! | [`MinFeasScheduler`] | any duration, multi-window | 3-approx |
//! | [`GreedyIntervalsScheduler`] | any duration, multi-window | 2-approx (single window) |
//! | [`LazyActivationScheduler`] | unit, single window | optimal |
//! | [`MatchingScheduler`] | unit, multi-window, `B = 2` | optimal |
//! | [`DegreeConstrainedSubgraphScheduler`] | any duration, multi-window, `B = 2` | optimal |
//!
//! # KPI
//!
//! [`ScheduleKpi`] summarizes a schedule: active time, busy time and
//! how well active timestamps are used.
//!
//! # References
//!
//! - Chang, Gabow & Khuller (2014), "A Model for Minimizing Active
//!   Processor Time"
//! - Chang, Khuller & Mukherjee (2017), "LP Rounding and Combinatorial
//!   Algorithms for Minimizing Active and Busy Time"
//! - Koehler & Khuller (2017), "Busy Time Scheduling on a Bounded Number
//!   of Machines"
//! - Kumar & Khuller (2018), "Brief Announcement: A Greedy 2
//!   Approximation for the Active Time Problem"

mod batch;
mod greedy;
mod kpi;
mod lazy_activation;
mod matching;

#[cfg(test)]
pub(crate) mod testing;

pub use batch::BatchScheduler;
pub use greedy::{
    FeasibilityNetwork, GreedyFlowScheduler, GreedyIntervalsScheduler, GreedyLocalSearchScheduler,
    GreedyLowestDensityFirstScheduler, GreedyScheduler, IncreasingTime, LocalSearch,
    LowestDensityFirst, MinFeasScheduler, NoRefinement, RandomOrder, SlotOrdering,
    SlotRefinement, SlotWeight,
};
pub use kpi::ScheduleKpi;
pub use lazy_activation::{
    LazyActivationScheduler, LazyActivationSchedulerNLogN, LazyActivationSchedulerT,
};
pub use matching::{DegreeConstrainedSubgraphScheduler, MatchingScheduler, MAX_CONCURRENCY};

use crate::error::SchedulingError;
use crate::models::{JobCollection, Schedule};

/// An active time scheduler over pools of type `P`.
///
/// Infeasible instances yield `Ok` with an infeasible schedule; `Err` is
/// reserved for malformed input such as `max_concurrency == 0`.
pub trait Scheduler<P: JobCollection> {
    /// Per-job (or per-batch) record in the produced schedule.
    type Output;

    /// Scheduler name (e.g., "greedy").
    fn name(&self) -> &'static str;

    /// Schedules every job of `pool` with at most `max_concurrency`
    /// jobs per timestamp.
    fn process(
        &self,
        pool: &P,
        max_concurrency: usize,
    ) -> Result<Schedule<Self::Output>, SchedulingError>;
}
