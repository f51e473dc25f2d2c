//! The travelling salesman objective bound to a world.

use rand::Rng;

use crate::dataset::Preset;
use crate::error::{TspError, TspResult};
use crate::geometry::{City, Tour, TourInput, World};

/// City count used when no world is specified.
pub const DEFAULT_N_CITIES: usize = 100;

/// Where the world of a problem comes from.
#[derive(Debug, Clone)]
pub enum WorldSource {
    Explicit(World),
    Preset(Preset),
    Random { n_cities: usize },
}

impl Default for WorldSource {
    fn default() -> Self {
        Self::Random {
            n_cities: DEFAULT_N_CITIES,
        }
    }
}

/// A candidate route handed to [`Tsp::solve`].
#[derive(Debug, Clone, Copy)]
pub enum Route<'a> {
    Tour(&'a Tour<'a>),
    Cities(&'a [City]),
    Names(&'a [String]),
    Indices(&'a [usize]),
}

/// A travelling salesman problem over one world.
#[derive(Debug, Clone)]
pub struct Tsp {
    world: World,
}

impl Tsp {
    /// Build the problem, generating a random world if the source asks for one.
    pub fn new<R: Rng>(source: WorldSource, rng: &mut R) -> TspResult<Self> {
        let world = match source {
            WorldSource::Explicit(world) => world,
            WorldSource::Preset(preset) => preset.world()?,
            WorldSource::Random { n_cities } => World::random(n_cities, rng),
        };
        Ok(Self { world })
    }

    pub fn from_world(world: World) -> Self {
        Self { world }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn n_cities(&self) -> usize {
        self.world.len()
    }

    /// Length of a route that must visit every city of the world exactly once.
    pub fn solve(&self, route: Route<'_>) -> TspResult<f64> {
        match route {
            Route::Tour(tour) => {
                self.check_membership(tour)?;
                self.score(tour)
            }
            Route::Cities(cities) => {
                let tour = Tour::new(TourInput::Cities(cities))?;
                self.check_membership(&tour)?;
                self.score(&tour)
            }
            Route::Names(names) => self.score(&Tour::new(TourInput::Names(names, &self.world))?),
            Route::Indices(indices) => {
                self.score(&Tour::new(TourInput::Indices(indices, &self.world))?)
            }
        }
    }

    /// Every city must be the world's city of that name, at the same position.
    fn check_membership(&self, tour: &Tour<'_>) -> TspResult<()> {
        for city in tour.cities() {
            match self.world.city(&city.name) {
                Some(known) if known.x == city.x && known.y == city.y => {}
                _ => return Err(TspError::UnknownCity(city.name.clone())),
            }
        }
        Ok(())
    }

    fn score(&self, tour: &Tour<'_>) -> TspResult<f64> {
        if tour.len() != self.world.len() {
            return Err(TspError::IncompleteTour {
                visited: tour.len(),
                expected: self.world.len(),
            });
        }
        Ok(tour.length())
    }
}
