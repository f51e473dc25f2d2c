//! Solve service: `POST /predict` with `{"name": [x, y], ...}`.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tsp_evo::Hyperparams;
use tsp_evo::recommender::{RecommenderClient, RecommenderConfig};
use tsp_evo::server::{self, ServerConfig, SharedProvider};

#[derive(Parser)]
#[command(name = "tsp-server")]
#[command(about = "Serve evolutionary TSP solutions over HTTP")]
struct Args {
    /// Bind host (defaults to SOLVER_HOST or 0.0.0.0)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (defaults to SOLVER_PORT or 8000)
    #[arg(long)]
    port: Option<u16>,

    /// Use fixed hyperparameters instead of asking the recommender
    #[arg(long, default_value_t = false)]
    fixed: bool,

    /// population size (with --fixed)
    #[arg(long, default_value_t = 100)]
    pop_size: usize,

    /// number of generations (with --fixed)
    #[arg(long, default_value_t = 500)]
    generations: usize,

    /// elite size (with --fixed)
    #[arg(long, default_value_t = 20)]
    elite_size: usize,

    /// mutation rate (with --fixed)
    #[arg(long, default_value_t = 0.01)]
    mutation_rate: f64,

    /// Score populations on all cores
    #[arg(long, default_value_t = false)]
    parallel: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = ServerConfig::from_env();
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    // The blocking recommender client must be built outside the async runtime.
    let provider: SharedProvider = if args.fixed {
        let params = Hyperparams {
            pop_size: args.pop_size,
            generations: args.generations,
            elite_size: args.elite_size,
            mutation_rate: args.mutation_rate,
        };
        if let Err(err) = params.validate() {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
        Arc::new(params)
    } else {
        let recommender = RecommenderConfig::from_env();
        tracing::info!(url = %recommender.base_url(), "using hyperparameter recommender");
        match RecommenderClient::new(recommender) {
            Ok(client) => Arc::new(client),
            Err(err) => {
                eprintln!("failed to build recommender client: {err}");
                return ExitCode::FAILURE;
            }
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("failed to start runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(server::serve(&config, provider.clone(), args.parallel));
    drop(runtime);
    drop(provider);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("server error: {err}");
            ExitCode::FAILURE
        }
    }
}
