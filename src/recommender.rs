//! Hyperparameter recommender adapter.
//!
//! The solve endpoint asks a [`HyperparamProvider`] which hyperparameters to
//! use for a given city count. [`RecommenderClient`] asks an external
//! prediction service over HTTP; a fixed [`Hyperparams`] value answers with
//! itself.

use std::env;
use std::time::Duration;

use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};

use crate::error::{TspError, TspResult};
use crate::solver::Hyperparams;

const CLIENT_ID_LEN: usize = 10;

/// Chooses solver hyperparameters for a problem size.
pub trait HyperparamProvider {
    fn hyperparams_for(&self, n_cities: usize) -> TspResult<Hyperparams>;
}

impl HyperparamProvider for Hyperparams {
    fn hyperparams_for(&self, _n_cities: usize) -> TspResult<Hyperparams> {
        Ok(*self)
    }
}

#[derive(Debug, Clone)]
pub struct RecommenderConfig {
    pub host: String,
    pub port: u16,
    pub timeout_secs: u64,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            timeout_secs: 30,
        }
    }
}

impl RecommenderConfig {
    /// Read `BRAIN_HOST` and `BRAIN_PORT`, falling back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env::var("BRAIN_HOST").unwrap_or(defaults.host),
            port: env::var("BRAIN_PORT")
                .ok()
                .and_then(|port| port.parse().ok())
                .unwrap_or(defaults.port),
            timeout_secs: defaults.timeout_secs,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct RecommenderClient {
    config: RecommenderConfig,
    client: reqwest::blocking::Client,
}

impl RecommenderClient {
    pub fn new(config: RecommenderConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }
}

impl HyperparamProvider for RecommenderClient {
    fn hyperparams_for(&self, n_cities: usize) -> TspResult<Hyperparams> {
        let client_id = random_client_id(&mut rand::thread_rng());
        let url = format!(
            "{}/v2/clients/{}/predict",
            self.config.base_url(),
            client_id
        );

        let body = PredictRequest {
            state: PredictState { n_cities },
        };
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<PredictResponse>())
            .map_err(|err| {
                tracing::warn!(%url, error = %err, "recommender request failed");
                err
            })?;

        let params = response.concepts.tune_hyperparams.action;
        params
            .validate()
            .map_err(|err| TspError::Recommender(err.to_string()))?;
        tracing::debug!(n_cities, ?params, "received hyperparameters");
        Ok(params)
    }
}

fn random_client_id<R: Rng>(rng: &mut R) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(CLIENT_ID_LEN)
        .map(char::from)
        .collect()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictRequest {
    pub state: PredictState,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictState {
    pub n_cities: usize,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    concepts: Concepts,
}

#[derive(Debug, Deserialize)]
struct Concepts {
    #[serde(rename = "TuneHyperparams")]
    tune_hyperparams: ConceptAction,
}

#[derive(Debug, Deserialize)]
struct ConceptAction {
    action: Hyperparams,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_fixed_provider_ignores_size() {
        let params = Hyperparams::default();
        assert_eq!(params.hyperparams_for(3).unwrap(), params);
        assert_eq!(params.hyperparams_for(3000).unwrap(), params);
    }

    #[test]
    fn test_client_id_shape() {
        let id = random_client_id(&mut StdRng::seed_from_u64(1));
        assert_eq!(id.len(), CLIENT_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_base_url() {
        let config = RecommenderConfig {
            host: "brain".into(),
            port: 5001,
            timeout_secs: 1,
        };
        assert_eq!(config.base_url(), "http://brain:5001");
    }

    #[test]
    fn test_parse_predict_response() {
        let body = r#"{
            "concepts": {
                "TuneHyperparams": {
                    "action": {
                        "pop_size": 120.0,
                        "generations": 300.4,
                        "elite_size": 12,
                        "mutation_rate": 0.015
                    }
                }
            }
        }"#;
        let response: PredictResponse = serde_json::from_str(body).unwrap();
        let params = response.concepts.tune_hyperparams.action;
        assert_eq!(params.pop_size, 120);
        assert_eq!(params.generations, 300);
        assert_eq!(params.elite_size, 12);
    }

    #[test]
    fn test_request_body_shape() {
        let body = PredictRequest {
            state: PredictState { n_cities: 14 },
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"state": {"n_cities": 14}})
        );
    }
}
