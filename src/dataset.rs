//! Coordinate-file loading and bundled preset datasets.
//!
//! Data lines have the form `<id> <x> <y>`. Lines whose first token is not
//! all digits (headers, section markers, `EOF`) are skipped, as are data
//! lines whose coordinates do not parse.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{TspError, TspResult};
use crate::geometry::{City, World};

const BURMA14: &str = include_str!("../data/burma14.tsp");

/// Datasets shipped with the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Burma14,
}

impl Preset {
    pub fn from_name(name: &str) -> TspResult<Self> {
        match name.to_lowercase().as_str() {
            "burma14" => Ok(Self::Burma14),
            _ => Err(TspError::UnknownPreset(name.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Burma14 => "burma14",
        }
    }

    pub fn world(&self) -> TspResult<World> {
        let content = match self {
            Self::Burma14 => BURMA14,
        };
        World::new(parse_cities(content))
    }
}

/// Parse every well-formed data line of a coordinate file.
pub fn parse_cities(content: &str) -> Vec<City> {
    let mut cities = Vec::new();

    for (line_num, line) in content.lines().enumerate() {
        let mut parts = line.split_whitespace();
        let Some(name) = parts.next() else {
            continue;
        };
        if !name.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }

        let coords = (
            parts.next().and_then(parse_coordinate),
            parts.next().and_then(parse_coordinate),
        );
        match coords {
            (Some(x), Some(y)) => cities.push(City::new(name, x, y)),
            _ => {
                tracing::warn!(line = line_num + 1, "skipping malformed coordinate line");
            }
        }
    }

    cities
}

fn parse_coordinate(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Read the cities of a coordinate file.
pub fn load_cities(path: &Path) -> TspResult<Vec<City>> {
    let content = fs::read_to_string(path)?;
    let cities = parse_cities(&content);
    tracing::debug!(path = %path.display(), cities = cities.len(), "loaded coordinate file");
    Ok(cities)
}

/// Read a coordinate file as a `name -> [x, y]` mapping, the shape the
/// solve endpoint accepts.
pub fn load_mapping(path: &Path) -> TspResult<BTreeMap<String, [f64; 2]>> {
    Ok(load_cities(path)?
        .into_iter()
        .map(|city| (city.name, [city.x, city.y]))
        .collect())
}
