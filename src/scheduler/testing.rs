//! Test helpers: random instances and a brute-force optimum.

use rand::rngs::SmallRng;
use rand::Rng;

use crate::models::{
    ExecutionRecord, JobCollection, JobPool, JobPoolMI, Schedulable, Schedule, TimeInterval,
    UnitJobPool,
};
use crate::network::{FlowMethod, FlowNetwork, MaxFlowSolver};
use crate::validation::verify_schedule;

/// Minimum active time of `pool` under `max_concurrency`, by trying every
/// subset of the horizon. `None` if no subset is feasible.
///
/// Only meant for horizons of a dozen timestamps or fewer.
pub(crate) fn brute_force_optimum<P: JobCollection>(
    pool: &P,
    max_concurrency: usize,
) -> Option<i64> {
    let jobs = pool.jobs();
    if jobs.is_empty() {
        return Some(0);
    }
    let t_min = jobs.iter().map(|j| j.earliest_start()).min()?;
    let t_max = jobs.iter().map(|j| j.latest_end()).max()?;
    let horizon = (t_max - t_min + 1) as usize;
    assert!(horizon <= 16, "horizon too long for brute force");

    let demand: i64 = jobs.iter().filter_map(|j| j.duration()).sum();
    let source = 0;
    let sink = jobs.len() + horizon + 1;
    let mut best: Option<u32> = None;

    for mask in 0u32..(1 << horizon) {
        let size = mask.count_ones();
        if best.is_some_and(|b| size >= b) {
            continue;
        }
        let mut network = FlowNetwork::new(sink + 1);
        for (i, job) in jobs.iter().enumerate() {
            network.set_capacity(source, 1 + i, job.duration().unwrap_or(0));
            for slot in 0..horizon {
                let t = t_min + slot as i64;
                if mask & (1 << slot) != 0 && job.is_available_at(t) {
                    network.set_capacity(1 + i, 1 + jobs.len() + slot, 1);
                }
            }
        }
        for slot in 0..horizon {
            network.set_capacity(1 + jobs.len() + slot, sink, max_concurrency as i64);
        }
        if FlowMethod::Dinitz.max_flow(&network, source, sink).value == demand {
            best = Some(size);
        }
    }
    best.map(i64::from)
}

/// Asserts that a feasible schedule respects every pool constraint.
pub(crate) fn assert_verified<P, S>(pool: &P, schedule: &Schedule<S>, max_concurrency: usize)
where
    P: JobCollection,
    S: ExecutionRecord,
{
    if let Err(errors) = verify_schedule(pool, schedule, max_concurrency) {
        panic!("schedule failed verification: {errors:#?}");
    }
}

/// Random single-window jobs within `[0, horizon)`.
pub(crate) fn random_job_pool(
    rng: &mut SmallRng,
    jobs: usize,
    horizon: i64,
    max_duration: i64,
) -> JobPool {
    let mut pool = JobPool::new();
    for _ in 0..jobs {
        let release = rng.random_range(0..horizon);
        let deadline = rng.random_range(release..horizon);
        let window = deadline - release + 1;
        let duration = rng.random_range(1..=max_duration.min(window));
        pool.add_job(release, deadline, duration).unwrap();
    }
    pool
}

/// Random unit jobs within `[0, horizon)`.
pub(crate) fn random_unit_pool(rng: &mut SmallRng, jobs: usize, horizon: i64) -> UnitJobPool {
    let mut pool = UnitJobPool::new();
    for _ in 0..jobs {
        let release = rng.random_range(0..horizon);
        let deadline = rng.random_range(release..horizon);
        pool.add_job(release, deadline).unwrap();
    }
    pool
}

/// Random jobs with one or two windows within `[0, horizon)`.
pub(crate) fn random_multi_interval_pool(
    rng: &mut SmallRng,
    jobs: usize,
    horizon: i64,
    max_duration: i64,
) -> JobPoolMI {
    let mut pool = JobPoolMI::new();
    for _ in 0..jobs {
        let mut windows = Vec::new();
        for _ in 0..rng.random_range(1..=2) {
            let start = rng.random_range(0..horizon);
            let end = rng.random_range(start..(start + 3).min(horizon));
            windows.push(TimeInterval::new(start, end));
        }
        let merged = TimeInterval::merge_time_intervals(windows.clone());
        let length = TimeInterval::total_duration(&merged);
        let duration = rng.random_range(1..=max_duration.min(length));
        pool.add_job(windows, duration).unwrap();
    }
    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_brute_force_small_cases() {
        let mut pool = JobPool::new();
        pool.add_job(0, 1, 1).unwrap();
        pool.add_job(0, 1, 1).unwrap();
        assert_eq!(brute_force_optimum(&pool, 1), Some(2));
        assert_eq!(brute_force_optimum(&pool, 2), Some(1));

        let mut tight = UnitJobPool::new();
        for _ in 0..3 {
            tight.add_job(0, 0).unwrap();
        }
        assert_eq!(brute_force_optimum(&tight, 2), None);
    }

    #[test]
    fn test_random_pools_are_well_formed() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..20 {
            let pool = random_job_pool(&mut rng, 5, 8, 3);
            assert!(crate::validation::validate_pool(&pool).is_ok());
            let mi = random_multi_interval_pool(&mut rng, 4, 8, 3);
            assert!(crate::validation::validate_pool(&mi).is_ok());
        }
    }
}
