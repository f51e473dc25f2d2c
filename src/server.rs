//! HTTP front end: `POST /predict` solves the posted cities.
//!
//! The request body maps city names to `[x, y]`. Hyperparameters come from
//! the configured [`HyperparamProvider`]; the search itself runs on a
//! blocking worker so the runtime stays responsive.

use std::collections::BTreeMap;
use std::env;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::error::TspError;
use crate::geometry::World;
use crate::problem::Tsp;
use crate::recommender::HyperparamProvider;
use crate::solver::{EvolutionaryAlgo, Solution};

pub type SharedProvider = Arc<dyn HyperparamProvider + Send + Sync>;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl ServerConfig {
    /// Read `SOLVER_HOST` and `SOLVER_PORT`, falling back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env::var("SOLVER_HOST").unwrap_or(defaults.host),
            port: env::var("SOLVER_PORT")
                .ok()
                .and_then(|port| port.parse().ok())
                .unwrap_or(defaults.port),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Clone)]
struct AppState {
    provider: SharedProvider,
    parallel_scoring: bool,
}

/// Routes of the solve service.
pub fn router(provider: SharedProvider, parallel_scoring: bool) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route(
            "/health",
            get(|| async { Json(serde_json::json!({"status": "healthy"})) }),
        )
        .with_state(AppState {
            provider,
            parallel_scoring,
        })
}

/// Bind and serve until Ctrl+C.
pub async fn serve(
    config: &ServerConfig,
    provider: SharedProvider,
    parallel_scoring: bool,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(addr = %listener.local_addr()?, "solver listening");

    axum::serve(listener, router(provider, parallel_scoring))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for shutdown signal");
    }
}

async fn predict(
    State(state): State<AppState>,
    Json(cities): Json<BTreeMap<String, [f64; 2]>>,
) -> Result<Json<Solution>, ApiError> {
    let world = World::from_mapping(cities)?;
    if world.is_empty() {
        return Err(TspError::EmptyWorld.into());
    }
    tracing::info!(n_cities = world.len(), "predict request");

    let provider = state.provider.clone();
    let parallel_scoring = state.parallel_scoring;
    let solution = tokio::task::spawn_blocking(move || {
        let params = provider.hyperparams_for(world.len())?;
        let algo = EvolutionaryAlgo::new(params)?.with_parallel_scoring(parallel_scoring);
        let tsp = Tsp::from_world(world);
        algo.solve(&tsp, &mut StdRng::from_entropy())
    })
    .await
    .map_err(|err| ApiError::Worker(err.to_string()))??;

    Ok(Json(solution))
}

#[derive(Debug)]
enum ApiError {
    Tsp(TspError),
    Worker(String),
}

impl From<TspError> for ApiError {
    fn from(err: TspError) -> Self {
        ApiError::Tsp(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Tsp(err) if err.is_validation() => (StatusCode::BAD_REQUEST, err.to_string()),
            ApiError::Tsp(err @ (TspError::Http(_) | TspError::Recommender(_))) => {
                (StatusCode::BAD_GATEWAY, err.to_string())
            }
            ApiError::Tsp(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            ApiError::Worker(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            tracing::warn!(%status, %message, "predict request failed");
        }
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_addr() {
        let config = ServerConfig {
            host: "127.0.0.1".into(),
            port: 9000,
        };
        assert_eq!(config.bind_addr(), "127.0.0.1:9000");
        assert_eq!(ServerConfig::default().bind_addr(), "0.0.0.0:8000");
    }

    #[test]
    fn test_error_status_mapping() {
        let status = |err: ApiError| err.into_response().status();
        assert_eq!(
            status(TspError::DuplicateCity("a".into()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(TspError::Recommender("bad action".into()).into()),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(status(TspError::NotReset.into()), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            status(ApiError::Worker("panicked".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
