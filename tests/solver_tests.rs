//! End-to-end solver tests
//!
//! Tests for convergence, elitism, determinism and file-backed worlds.

mod fixtures;

use std::io::Write;

use rand::SeedableRng;
use rand::rngs::StdRng;

use tsp_evo::dataset::Preset;
use tsp_evo::{EvolutionaryAlgo, Hyperparams, Route, Tsp, TspError, World, WorldSource};

fn params(pop_size: usize, generations: usize, elite_size: usize, mutation_rate: f64) -> Hyperparams {
    Hyperparams {
        pop_size,
        generations,
        elite_size,
        mutation_rate,
    }
}

// ============================================================================
// Convergence
// ============================================================================

#[test]
fn finds_square_perimeter() {
    let tsp = Tsp::from_world(fixtures::square_world());
    let algo = EvolutionaryAlgo::new(params(20, 20, 2, 0.3)).unwrap();

    for seed in [0, 1, 2, 42] {
        let solution = algo.solve_seeded(&tsp, seed).unwrap();
        assert!(
            (solution.best_score - 4.0).abs() < 1e-9,
            "seed {} gave {}",
            seed,
            solution.best_score
        );
        assert_eq!(solution.best_route.len(), 4);
    }
}

#[test]
fn returned_route_scores_its_reported_length() {
    let tsp = Tsp::new(WorldSource::Preset(Preset::Burma14), &mut StdRng::seed_from_u64(0)).unwrap();
    let algo = EvolutionaryAlgo::new(params(30, 40, 4, 0.02)).unwrap();
    let solution = algo.solve_seeded(&tsp, 7).unwrap();

    let rescored = tsp.solve(Route::Names(&solution.best_route)).unwrap();
    assert_eq!(rescored, solution.best_score);
}

#[test]
fn elitism_never_loses_the_initial_best() {
    let tsp = Tsp::from_world(World::random(25, &mut StdRng::seed_from_u64(13)));
    let algo = EvolutionaryAlgo::new(params(30, 60, 3, 0.05)).unwrap();

    for seed in [3, 4, 5] {
        let mut rng = StdRng::seed_from_u64(seed);
        let initial = algo.generate_init_pop(tsp.n_cities(), &mut rng);
        let (_, initial_best) = algo.best_solution(&initial, &tsp).unwrap();

        let solution = algo.solve_seeded(&tsp, seed).unwrap();
        assert!(
            solution.best_score <= initial_best,
            "seed {}: {} > initial {}",
            seed,
            solution.best_score,
            initial_best
        );
    }
}

#[test]
fn all_elite_population_still_runs() {
    let tsp = Tsp::from_world(World::random(10, &mut StdRng::seed_from_u64(1)));
    let algo = EvolutionaryAlgo::new(params(8, 15, 8, 0.5)).unwrap();
    let solution = algo.solve_seeded(&tsp, 1).unwrap();
    assert_eq!(solution.best_route.len(), 10);
}

#[test]
fn single_city_world_without_generations() {
    let tsp = Tsp::from_world(World::from_mapping(vec![("solo", [3.0, 4.0])]).unwrap());
    let algo = EvolutionaryAlgo::new(params(2, 0, 0, 0.0)).unwrap();
    let solution = algo.solve_seeded(&tsp, 0).unwrap();
    assert_eq!(solution.best_route, vec!["solo".to_string()]);
    assert_eq!(solution.best_score, 0.0);
}

#[test]
fn single_city_world_cannot_evolve() {
    let tsp = Tsp::from_world(World::from_mapping(vec![("solo", [3.0, 4.0])]).unwrap());
    let algo = EvolutionaryAlgo::new(params(2, 1, 0, 0.0)).unwrap();
    assert!(matches!(algo.solve_seeded(&tsp, 0), Err(TspError::ZeroLengthTour)));
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn same_seed_same_solution() {
    let tsp = Tsp::new(WorldSource::Random { n_cities: 20 }, &mut StdRng::seed_from_u64(2)).unwrap();
    let algo = EvolutionaryAlgo::new(params(24, 30, 2, 0.03)).unwrap();

    let a = algo.solve_seeded(&tsp, 100).unwrap();
    let b = algo.solve(&tsp, &mut StdRng::seed_from_u64(100)).unwrap();
    assert_eq!(a, b);
}

// ============================================================================
// File-backed worlds
// ============================================================================

#[test]
fn solves_world_loaded_from_coordinate_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "NAME: square").unwrap();
    writeln!(file, "NODE_COORD_SECTION").unwrap();
    writeln!(file, "1 0.0 1.0").unwrap();
    writeln!(file, "2 0.0 0.0").unwrap();
    writeln!(file, "3 1.0 0.0").unwrap();
    writeln!(file, "4 1.0 1.0").unwrap();
    writeln!(file, "EOF").unwrap();

    let world = World::from_coordinate_file(file.path()).unwrap();
    assert_eq!(world.len(), 4);

    let tsp = Tsp::from_world(world);
    let algo = EvolutionaryAlgo::new(params(20, 10, 2, 0.3)).unwrap();
    let solution = algo.solve_seeded(&tsp, 9).unwrap();
    assert!((solution.best_score - 4.0).abs() < 1e-9);
}

#[test]
fn duplicate_ids_in_file_are_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "1 0.0 1.0").unwrap();
    writeln!(file, "1 5.0 5.0").unwrap();

    let err = World::from_coordinate_file(file.path()).unwrap_err();
    assert!(matches!(err, TspError::DuplicateCity(name) if name == "1"));
}
