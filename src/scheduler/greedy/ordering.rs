//! Slot visitation orders for the greedy sweep.
//!
//! The greedy flow scheduler tries to close slots one by one in the order
//! produced here. Any order yields a feasible, minimal set of open slots;
//! the order only affects how small that set ends up.
//!
//! # Built-in orders
//!
//! - **`IncreasingTime`**: earliest slot first (2-approximation)
//! - **`LowestDensityFirst`**: sparsest slot first (3-approximation
//!   without a weight)
//! - **`RandomOrder`**: uniformly random (3-approximation)
//!
//! # References
//! - Kumar & Khuller (2018), "A Greedy 2 Approximation for the Active
//!   Time Problem"
//! - Chang, Khuller & Mukherjee (2017), "LP Rounding and Combinatorial
//!   Algorithms for Minimizing Active and Busy Time", Sec. 4 (MinFeas)

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::fmt;
use std::sync::Arc;

use crate::models::{Schedulable, TimeInterval};

/// Decides in which order the greedy sweep visits slots.
pub trait SlotOrdering: Send + Sync + fmt::Debug {
    /// Ordering name (e.g., "increasing_time").
    fn name(&self) -> &'static str;

    /// Slots of `horizon` to visit, in visiting order.
    ///
    /// Slots left out stay open during the sweep.
    fn order<J: Schedulable>(&self, jobs: &[J], horizon: TimeInterval) -> Vec<i64>;

    /// Ordering description.
    fn description(&self) -> &'static str {
        self.name()
    }
}

/// Visits every slot of the horizon from earliest to latest.
#[derive(Debug, Clone, Copy, Default)]
pub struct IncreasingTime;

impl SlotOrdering for IncreasingTime {
    fn name(&self) -> &'static str {
        "increasing_time"
    }

    fn order<J: Schedulable>(&self, _jobs: &[J], horizon: TimeInterval) -> Vec<i64> {
        horizon.iter().collect()
    }

    fn description(&self) -> &'static str {
        "Earliest slot first"
    }
}

/// Per-job weight as a function of its relative load
/// `duration / availability length` (in `(0, 1]`).
pub type SlotWeight = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

/// Visits slots by ascending density, ties broken by time.
///
/// The density of a slot is the number of jobs available there, or, with
/// a weight `f`, the sum of `f(duration / length)` over those jobs. Slots
/// where no job is available are not visited.
#[derive(Clone, Default)]
pub struct LowestDensityFirst {
    weight: Option<SlotWeight>,
}

impl LowestDensityFirst {
    /// Counts available jobs per slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Weights each available job by `f(duration / length)`.
    pub fn with_weight<F>(mut self, f: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        self.weight = Some(Arc::new(f));
        self
    }

    fn job_weight<J: Schedulable>(&self, job: &J) -> f64 {
        match &self.weight {
            None => 1.0,
            Some(f) => {
                let load = job.duration().unwrap_or(0) as f64 / job.length().max(1) as f64;
                f(load)
            }
        }
    }
}

impl fmt::Debug for LowestDensityFirst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LowestDensityFirst")
            .field("weighted", &self.weight.is_some())
            .finish()
    }
}

impl SlotOrdering for LowestDensityFirst {
    fn name(&self) -> &'static str {
        "lowest_density_first"
    }

    fn order<J: Schedulable>(&self, jobs: &[J], horizon: TimeInterval) -> Vec<i64> {
        let weights: Vec<f64> = jobs.iter().map(|j| self.job_weight(j)).collect();

        let mut density: Vec<(f64, i64)> = horizon
            .iter()
            .filter_map(|t| {
                let mut available = jobs
                    .iter()
                    .zip(&weights)
                    .filter(|(j, _)| j.is_available_at(t))
                    .peekable();
                available.peek()?;
                Some((available.map(|(_, w)| w).sum(), t))
            })
            .collect();

        density.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        density.into_iter().map(|(_, t)| t).collect()
    }

    fn description(&self) -> &'static str {
        "Sparsest slot first"
    }
}

/// Visits the slots of [`IncreasingTime`] in a uniformly random order.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomOrder {
    seed: Option<u64>,
}

impl RandomOrder {
    /// Draws a fresh order on every run.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixes the random seed, making runs reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl SlotOrdering for RandomOrder {
    fn name(&self) -> &'static str {
        "random"
    }

    fn order<J: Schedulable>(&self, jobs: &[J], horizon: TimeInterval) -> Vec<i64> {
        let mut order = IncreasingTime.order(jobs, horizon);
        let mut rng = match self.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_rng(&mut rand::rng()),
        };
        order.shuffle(&mut rng);
        order
    }

    fn description(&self) -> &'static str {
        "Uniformly random slot order"
    }
}
