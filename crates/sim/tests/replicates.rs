//! Integration tests for the replicate runner.

use pvasim_sim::base::{PopulationState, Sex};
use pvasim_sim::dynamics::{CapacityStrategy, NoiseConfig};
use pvasim_sim::simulation::{
    Configuration, ExtinctionCriterion, ReplicateRunner, RunControl, SimulationBuilder,
};
use std::sync::atomic::AtomicBool;
use tempfile::tempdir;

fn three_class() -> SimulationBuilder {
    SimulationBuilder::new()
        .years(10)
        .replicates(1)
        .symmetric_rates(vec![0.6, 0.7, 0.5], vec![0.0, 1.0, 2.0])
        .initial_population(vec![20, 20, 0], vec![20, 20, 0])
}

fn noisy() -> SimulationBuilder {
    SimulationBuilder::new()
        .years(40)
        .replicates(64)
        .seed(2024)
        .symmetric_rates(vec![0.5, 0.7, 0.6, 0.4, 0.2], vec![0.0, 1.0, 1.0, 0.5, 0.0])
        .initial_population(vec![10, 10, 5, 0, 0], vec![10, 10, 5, 0, 0])
        .environmental_noise(0.15, 0.3)
        .catastrophe(0.05, 0.4)
}

#[test]
fn test_three_class_deterministic_example() {
    let runner = three_class().deterministic().seed(42).build().unwrap();
    let batch = runner.run();

    assert_eq!(batch.len(), 1);
    let trajectory = &batch.trajectories[0];
    assert_eq!(trajectory.states().len(), 11);
    assert_eq!(
        trajectory.totals(),
        vec![80, 92, 96, 103, 109, 113, 120, 127, 135, 140, 149]
    );
    assert_eq!(trajectory.states()[1].females(), &[20, 12, 14]);
    assert_eq!(trajectory.extinction_time(), None);

    let replay = three_class().deterministic().seed(42).build().unwrap().run();
    assert_eq!(batch, replay);
}

#[test]
fn test_deterministic_has_zero_variance() {
    let batch = three_class()
        .deterministic()
        .replicates(8)
        .build()
        .unwrap()
        .run();
    let first = batch.trajectories[0].states();
    for trajectory in &batch.trajectories {
        assert_eq!(trajectory.states(), first);
    }
}

#[test]
fn test_same_seed_identical_batch() {
    let a = noisy().build().unwrap().run();
    let b = noisy().build().unwrap().run();
    assert_eq!(a, b);

    let c = noisy().seed(2025).build().unwrap().run();
    assert_ne!(a.trajectories, c.trajectories);
}

#[test]
fn test_sequential_and_parallel_agree() {
    let parallel = noisy().parallel(true).build().unwrap().run();
    let sequential = noisy().parallel(false).build().unwrap().run();
    assert_eq!(parallel, sequential);
}

#[test]
fn test_results_independent_of_thread_count() {
    let expected = noisy().build().unwrap().run();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(2)
        .build()
        .unwrap();
    let on_two = pool.install(|| noisy().build().unwrap().run());
    assert_eq!(expected, on_two);
}

#[test]
fn test_all_zero_initial_state() {
    let batch = noisy()
        .initial_population(vec![0; 5], vec![0; 5])
        .q_threshold(0)
        .build()
        .unwrap()
        .run();
    for trajectory in &batch.trajectories {
        assert_eq!(trajectory.extinction_time(), Some(0));
        assert!(trajectory.states().iter().all(PopulationState::is_empty));
    }
}

#[test]
fn test_certain_total_catastrophe() {
    let batch = noisy()
        .catastrophe(1.0, 1.0)
        .q_threshold(0)
        .build()
        .unwrap()
        .run();
    for trajectory in &batch.trajectories {
        assert_eq!(trajectory.extinction_time(), Some(1));
        assert_eq!(trajectory.catastrophe_steps(), &[1]);
        // remaining years are padded with the empty state
        assert_eq!(trajectory.states().len(), 41);
        assert!(trajectory.states()[1..].iter().all(PopulationState::is_empty));
    }
}

#[test]
fn test_unbounded_growth_saturates() {
    for noise in [NoiseConfig::deterministic(), NoiseConfig::full()] {
        let batch = SimulationBuilder::new()
            .years(40)
            .replicates(2)
            .seed(8)
            .symmetric_rates(vec![1.0, 1.0], vec![0.0, 10.0])
            .initial_population(vec![10, 10], vec![10, 10])
            .noise(noise)
            .build()
            .unwrap()
            .run();
        for trajectory in &batch.trajectories {
            assert_eq!(trajectory.extinction_time(), None);
            assert_eq!(trajectory.states().len(), 41);
            // no deaths, so the total never decreases
            for pair in trajectory.states().windows(2) {
                assert!(pair[1].total() >= pair[0].total());
            }
            assert_eq!(trajectory.final_state().map(PopulationState::total), Some(u64::MAX));
        }
    }
}

#[test]
fn test_capacity_never_exceeded() {
    for strategy in CapacityStrategy::ALL {
        let batch = SimulationBuilder::new()
            .years(30)
            .replicates(16)
            .seed(5)
            .symmetric_rates(vec![0.9, 0.9, 0.9], vec![0.0, 2.0, 2.0])
            .initial_population(vec![40, 40, 40], vec![40, 40, 40])
            .environmental_noise(0.1, 0.1)
            .carrying_capacity(150, strategy)
            .build()
            .unwrap()
            .run();
        for trajectory in &batch.trajectories {
            // the initial state is not subject to the capacity
            for state in &trajectory.states()[1..] {
                assert!(state.total() <= 150, "{strategy:?}: {}", state.total());
            }
        }
    }
}

#[test]
fn test_counts_stay_bounded_by_growth() {
    // survivors can never exceed the previous class count
    let batch = SimulationBuilder::new()
        .years(20)
        .replicates(16)
        .seed(77)
        .symmetric_rates(vec![0.8, 0.8, 0.8], vec![0.0, 0.0, 0.0])
        .initial_population(vec![100, 50, 25], vec![90, 45, 20])
        .environmental_noise(0.5, 0.0)
        .build()
        .unwrap()
        .run();
    for trajectory in &batch.trajectories {
        for pair in trajectory.states().windows(2) {
            for sex in Sex::BOTH {
                assert!(pair[1].counts(sex).iter().sum::<u64>() <= pair[0].counts(sex).iter().sum());
            }
        }
    }
}

#[test]
fn test_limiting_sex_extinction() {
    let batch = SimulationBuilder::new()
        .years(5)
        .replicates(1)
        .seed(1)
        .symmetric_rates(vec![1.0], vec![0.0])
        .initial_population(vec![50], vec![2])
        .deterministic()
        .q_threshold(5)
        .extinction_criterion(ExtinctionCriterion::LimitingSex)
        .build()
        .unwrap()
        .run();
    assert_eq!(batch.trajectories[0].extinction_time(), Some(0));
    assert_eq!(batch.criterion, ExtinctionCriterion::LimitingSex);
}

#[test]
fn test_cancelled_run_is_marked() {
    let flag = AtomicBool::new(true);
    let runner = noisy().build().unwrap();
    let batch = runner.run_with(&RunControl::new().with_cancel_flag(&flag));
    assert!(batch.cancelled);
    assert!(batch.trajectories.len() < batch.n_requested);
}

#[test]
fn test_configuration_file_roundtrip() {
    let config = noisy().build_config().unwrap();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, config.to_json_pretty().unwrap()).unwrap();

    let loaded = Configuration::from_file(&path).unwrap();
    assert_eq!(loaded, config);

    let a = ReplicateRunner::new(loaded).unwrap().run();
    let b = ReplicateRunner::new(config).unwrap().run();
    assert_eq!(a, b);
}

#[test]
fn test_demographic_only_noise_varies() {
    let batch = three_class()
        .replicates(20)
        .seed(9)
        .noise(NoiseConfig {
            demographic: true,
            environmental: false,
        })
        .build()
        .unwrap()
        .run();
    let finals: Vec<u64> = batch
        .trajectories
        .iter()
        .filter_map(|t| t.final_state().map(PopulationState::total))
        .collect();
    assert!(finals.iter().any(|&total| total != finals[0]));
}
