//! tsp-evo: travelling salesman tours by evolutionary search
//!
//! Cities live on a plane; the solver evolves permutations of them with
//! roulette-wheel selection, order crossover and swap mutation.

pub mod error;
pub mod geometry;
pub mod dataset;
pub mod problem;
pub mod solver;
pub mod recommender;
pub mod simulator;
pub mod server;

pub use error::{TspError, TspResult};
pub use geometry::{City, Tour, TourInput, World};
pub use problem::{Route, Tsp, WorldSource};
pub use solver::{EvolutionaryAlgo, Hyperparams, Solution};
