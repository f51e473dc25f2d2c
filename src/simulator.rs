//! Episode wrapper used to train a hyperparameter recommender.
//!
//! An episode starts with [`Simulator::reset`], which fixes the problem, and
//! each [`Simulator::step`] runs the solver once with the chosen
//! hyperparameters and reports the score and wall-clock time.

use std::time::Instant;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{TspError, TspResult};
use crate::problem::{Tsp, WorldSource};
use crate::solver::{EvolutionaryAlgo, Hyperparams};

/// Identity advertised to the training platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Interface {
    pub name: &'static str,
    pub timeout: u64,
}

/// Observation returned after every reset and step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimState {
    pub n_cities: usize,
    pub score: f64,
    pub seconds_run: f64,
}

#[derive(Debug, Default)]
pub struct Simulator {
    tsp: Option<Tsp>,
}

impl Simulator {
    pub const INTERFACE: Interface = Interface {
        name: "TSP-EA-Solver",
        timeout: 120,
    };

    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset<R: Rng>(&mut self, source: WorldSource, rng: &mut R) -> TspResult<SimState> {
        let tsp = Tsp::new(source, rng)?;
        let state = SimState {
            n_cities: tsp.n_cities(),
            score: 0.0,
            seconds_run: 0.0,
        };
        tracing::debug!(n_cities = state.n_cities, "simulator reset");
        self.tsp = Some(tsp);
        Ok(state)
    }

    pub fn step<R: Rng>(&mut self, action: Hyperparams, rng: &mut R) -> TspResult<SimState> {
        let tsp = self.tsp.as_ref().ok_or(TspError::NotReset)?;
        let algo = EvolutionaryAlgo::new(action)?;

        let start = Instant::now();
        let solution = algo.solve(tsp, rng)?;
        let seconds_run = start.elapsed().as_secs_f64();

        Ok(SimState {
            n_cities: tsp.n_cities(),
            score: solution.best_score,
            seconds_run,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Preset;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn action() -> Hyperparams {
        Hyperparams {
            pop_size: 10,
            generations: 5,
            elite_size: 2,
            mutation_rate: 0.05,
        }
    }

    #[test]
    fn test_reset_reports_size() {
        let mut sim = Simulator::new();
        let state = sim
            .reset(WorldSource::Random { n_cities: 9 }, &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert_eq!(
            state,
            SimState {
                n_cities: 9,
                score: 0.0,
                seconds_run: 0.0
            }
        );
    }

    #[test]
    fn test_step_runs_solver() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut sim = Simulator::new();
        sim.reset(WorldSource::Preset(Preset::Burma14), &mut rng).unwrap();
        let state = sim.step(action(), &mut rng).unwrap();
        assert_eq!(state.n_cities, 14);
        assert!(state.score > 0.0);
        assert!(state.seconds_run >= 0.0);
    }

    #[test]
    fn test_step_before_reset_fails() {
        let mut sim = Simulator::new();
        let err = sim.step(action(), &mut StdRng::seed_from_u64(0)).unwrap_err();
        assert!(matches!(err, TspError::NotReset));
    }

    #[test]
    fn test_interface() {
        assert_eq!(Simulator::INTERFACE.name, "TSP-EA-Solver");
        assert_eq!(Simulator::INTERFACE.timeout, 120);
    }
}
