//! Error types for the TSP solver.

use thiserror::Error;

/// Result alias used across the crate.
pub type TspResult<T> = Result<T, TspError>;

#[derive(Debug, Error)]
pub enum TspError {
    /// Two cities in one world share a name.
    #[error("duplicate city name: {0}")]
    DuplicateCity(String),

    /// A tour visits the same city more than once.
    #[error("invalid route: city {0} is visited more than once")]
    RepeatedVisit(String),

    #[error("unknown city: {0}")]
    UnknownCity(String),

    #[error("unknown city index: {0}")]
    UnknownCityIndex(usize),

    /// A scored tour does not cover every city of the world.
    #[error("route should visit all cities: visited {visited}, expected {expected}")]
    IncompleteTour { visited: usize, expected: usize },

    #[error("tour has zero length; fitness is undefined")]
    ZeroLengthTour,

    #[error("world has no cities")]
    EmptyWorld,

    #[error("invalid hyperparameters: {0}")]
    InvalidHyperparams(String),

    #[error("unknown preset dataset: {0}")]
    UnknownPreset(String),

    #[error("simulator has not been reset")]
    NotReset,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The recommender answered, but not with usable hyperparameters.
    #[error("recommender error: {0}")]
    Recommender(String),
}

impl TspError {
    /// True for errors caused by malformed caller-supplied data.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            TspError::DuplicateCity(_)
                | TspError::RepeatedVisit(_)
                | TspError::UnknownCity(_)
                | TspError::UnknownCityIndex(_)
                | TspError::IncompleteTour { .. }
                | TspError::ZeroLengthTour
                | TspError::EmptyWorld
                | TspError::InvalidHyperparams(_)
                | TspError::UnknownPreset(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_classification() {
        assert!(TspError::DuplicateCity("a".into()).is_validation());
        assert!(TspError::IncompleteTour { visited: 1, expected: 4 }.is_validation());
        assert!(!TspError::Recommender("down".into()).is_validation());
        assert!(!TspError::NotReset.is_validation());
    }

    #[test]
    fn test_display_mentions_name() {
        let err = TspError::RepeatedVisit("como".into());
        assert!(err.to_string().contains("como"));
    }
}
