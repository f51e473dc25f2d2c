//! Batch evaluation: solve every `*.tsp` file in a directory and report
//! the tour length and wall-clock time of each.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tsp_evo::dataset::load_mapping;
use tsp_evo::{EvolutionaryAlgo, Hyperparams, Solution, Tsp, TspResult, World};

#[derive(Parser)]
#[command(name = "tsp-evaluate")]
#[command(about = "Time the TSP solver on a folder of coordinate files")]
struct Args {
    /// Folder containing *.tsp files
    #[arg(default_value = "data")]
    data_dir: PathBuf,

    /// Solve endpoint base URL
    #[arg(long, default_value = "http://127.0.0.1:8000")]
    url: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 600)]
    timeout_secs: u64,

    /// Solve in-process instead of calling the endpoint
    #[arg(long, default_value_t = false)]
    local: bool,

    /// RNG seed (with --local)
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// population size (with --local)
    #[arg(long, default_value_t = 100)]
    pop_size: usize,

    /// number of generations (with --local)
    #[arg(long, default_value_t = 500)]
    generations: usize,

    /// elite size (with --local)
    #[arg(long, default_value_t = 20)]
    elite_size: usize,

    /// mutation rate (with --local)
    #[arg(long, default_value_t = 0.01)]
    mutation_rate: f64,
}

enum Backend {
    Remote {
        client: reqwest::blocking::Client,
        url: String,
    },
    Local {
        algo: EvolutionaryAlgo,
        seed: u64,
    },
}

impl Backend {
    fn solve(&self, cities: BTreeMap<String, [f64; 2]>) -> TspResult<Solution> {
        match self {
            Backend::Remote { client, url } => {
                let solution = client
                    .post(format!("{url}/predict"))
                    .json(&cities)
                    .send()?
                    .error_for_status()?
                    .json::<Solution>()?;
                Ok(solution)
            }
            Backend::Local { algo, seed } => {
                let tsp = Tsp::from_world(World::from_mapping(cities)?);
                algo.solve_seeded(&tsp, *seed)
            }
        }
    }
}

fn tsp_files(dir: &Path) -> TspResult<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "tsp"))
        .collect();
    files.sort();
    Ok(files)
}

fn run(args: Args) -> TspResult<()> {
    let backend = if args.local {
        let params = Hyperparams {
            pop_size: args.pop_size,
            generations: args.generations,
            elite_size: args.elite_size,
            mutation_rate: args.mutation_rate,
        };
        Backend::Local {
            algo: EvolutionaryAlgo::new(params)?,
            seed: args.seed,
        }
    } else {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(args.timeout_secs))
            .build()?;
        Backend::Remote {
            client,
            url: args.url.trim_end_matches('/').to_string(),
        }
    };

    let files = tsp_files(&args.data_dir)?;
    if files.is_empty() {
        tracing::warn!(dir = %args.data_dir.display(), "no .tsp files found");
    }

    println!("name length seconds");
    for path in files {
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
            .to_string();
        let cities = load_mapping(&path)?;

        let start = Instant::now();
        let solution = match backend.solve(cities) {
            Ok(solution) => solution,
            Err(err) => {
                tracing::warn!(file = %path.display(), error = %err, "solve failed");
                continue;
            }
        };
        let seconds = start.elapsed().as_secs_f64();

        println!("{} {:.2} {}", name, solution.best_score, seconds);
    }

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
