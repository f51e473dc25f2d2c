//! Cities on a plane, the worlds they form, and closed tours through them.
//!
//! Cities are identified by name: equality and hashing only look at the
//! name, so two cities with the same name are the same city even if their
//! coordinates differ. Distances use the coordinates.

use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::dataset;
use crate::error::{TspError, TspResult};

/// Width of the square random worlds are drawn in.
pub const WORLD_LIM_X: f64 = 200.0;

/// Height of the square random worlds are drawn in.
pub const WORLD_LIM_Y: f64 = 200.0;

const NAME_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const NAME_LEN: usize = 6;

/// A named point on the plane.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub x: f64,
    pub y: f64,
}

impl City {
    pub fn new(name: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            name: name.into(),
            x,
            y,
        }
    }

    /// Euclidean distance to another city.
    pub fn dist(&self, other: &City) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl PartialEq for City {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for City {}

impl Hash for City {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// The complete set of cities available to a problem.
///
/// Cities keep the order they were supplied in; that order defines the
/// city indices used by [`TourInput::Indices`].
#[derive(Debug, Clone)]
pub struct World {
    cities: Vec<City>,
    index: HashMap<String, usize>,
}

impl World {
    /// Build a world, rejecting duplicate names.
    pub fn new(cities: Vec<City>) -> TspResult<Self> {
        let mut index = HashMap::with_capacity(cities.len());
        for (i, city) in cities.iter().enumerate() {
            if index.insert(city.name.clone(), i).is_some() {
                return Err(TspError::DuplicateCity(city.name.clone()));
            }
        }

        Ok(Self { cities, index })
    }

    /// Build a world from `name -> [x, y]` pairs, e.g. a decoded request body.
    pub fn from_mapping<I, S>(mapping: I) -> TspResult<Self>
    where
        I: IntoIterator<Item = (S, [f64; 2])>,
        S: Into<String>,
    {
        let cities = mapping
            .into_iter()
            .map(|(name, [x, y])| City::new(name, x, y))
            .collect();
        Self::new(cities)
    }

    /// Load a world from a whitespace-delimited `<name> <x> <y>` file.
    pub fn from_coordinate_file(path: &Path) -> TspResult<Self> {
        Self::new(dataset::load_cities(path)?)
    }

    /// Generate `n_cities` uniformly random cities with unique 6-character names.
    pub fn random<R: Rng>(n_cities: usize, rng: &mut R) -> Self {
        let mut used = HashSet::with_capacity(n_cities);
        let mut cities = Vec::with_capacity(n_cities);

        while cities.len() < n_cities {
            let name = random_name(rng);
            if !used.insert(name.clone()) {
                continue;
            }
            let x = WORLD_LIM_X * rng.gen_range(0.0..1.0);
            let y = WORLD_LIM_Y * rng.gen_range(0.0..1.0);
            cities.push(City::new(name, x, y));
        }

        let index = cities
            .iter()
            .enumerate()
            .map(|(i, city)| (city.name.clone(), i))
            .collect();
        Self { cities, index }
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    pub fn city(&self, name: &str) -> Option<&City> {
        self.index.get(name).map(|&i| &self.cities[i])
    }

    pub fn city_at(&self, index: usize) -> Option<&City> {
        self.cities.get(index)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }
}

fn random_name<R: Rng>(rng: &mut R) -> String {
    (0..NAME_LEN)
        .map(|_| NAME_CHARSET[rng.gen_range(0..NAME_CHARSET.len())] as char)
        .collect()
}

/// Stops of a tour, either already resolved or resolved against a world.
#[derive(Debug, Clone, Copy)]
pub enum TourInput<'a> {
    Cities(&'a [City]),
    Names(&'a [String], &'a World),
    Indices(&'a [usize], &'a World),
}

/// A closed tour: the last city connects back to the first.
///
/// A tour never visits a city twice, but it may skip cities; coverage of a
/// whole world is checked by [`crate::problem::Tsp`].
#[derive(Debug, Clone)]
pub struct Tour<'a> {
    path: Vec<&'a City>,
}

impl<'a> Tour<'a> {
    pub fn new(input: TourInput<'a>) -> TspResult<Self> {
        let path = match input {
            TourInput::Cities(cities) => cities.iter().collect::<Vec<_>>(),
            TourInput::Names(names, world) => names
                .iter()
                .map(|name| {
                    world
                        .city(name)
                        .ok_or_else(|| TspError::UnknownCity(name.clone()))
                })
                .collect::<TspResult<Vec<_>>>()?,
            TourInput::Indices(indices, world) => indices
                .iter()
                .map(|&i| world.city_at(i).ok_or(TspError::UnknownCityIndex(i)))
                .collect::<TspResult<Vec<_>>>()?,
        };

        let mut seen = HashSet::with_capacity(path.len());
        for city in &path {
            if !seen.insert(city.name.as_str()) {
                return Err(TspError::RepeatedVisit(city.name.clone()));
            }
        }

        Ok(Self { path })
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    pub fn cities(&self) -> &[&'a City] {
        &self.path
    }

    /// Total length including the closing edge back to the first city.
    pub fn length(&self) -> f64 {
        let Some(first) = self.path.first() else {
            return 0.0;
        };

        let closing = self.path[self.path.len() - 1].dist(first);
        self.path
            .windows(2)
            .map(|pair| pair[0].dist(pair[1]))
            .sum::<f64>()
            + closing
    }

    pub fn names(&self) -> Vec<String> {
        self.path.iter().map(|city| city.name.clone()).collect()
    }
}
