//! POI Tour Planner - Command Line Interface
//!
//! Plans a visiting order over a JSON file of points of interest.

use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use poi_tour_planner::{
    cluster, Algorithm, CategoryDurations, HaversineMatrixProvider, MetricsRecorder, PlannerConfig,
    PoiInstance, SweepStrategy, TourPlanner,
};

use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "poi-tour-planner")]
#[command(version = "1.0")]
#[command(about = "Plans visiting orders over points of interest")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Solve {
        #[arg(short, long)]
        instance: PathBuf,

        /// Algorithm to use
        #[arg(short, long, value_enum, default_value = "held-karp")]
        algorithm: AlgorithmArg,

        #[command(flatten)]
        common: CommonArgs,

        /// Sweep strategy for the bitonic heuristic (e.g. west-east, clockwise)
        #[arg(long)]
        strategy: Option<SweepStrategy>,

        /// Approximation parameter for the grid heuristic
        #[arg(long)]
        epsilon: Option<f64>,

        /// Random seed for the ant colony
        #[arg(short, long)]
        seed: Option<u64>,

        /// Output route to file (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Analyze an instance
    Analyze {
        /// Path to the instance file
        #[arg(short, long)]
        instance: PathBuf,

        /// Cluster radius in meters
        #[arg(long, default_value = "100")]
        cluster_distance: f64,
    },

    /// Compare algorithms on an instance
    Compare {
        /// Path to the instance file
        #[arg(short, long)]
        instance: PathBuf,

        #[command(flatten)]
        common: CommonArgs,

        /// Number of runs
        #[arg(short, long, default_value = "1")]
        runs: usize,

        /// Output metrics CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct CommonArgs {
    /// Planner configuration (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Category visit durations (JSON array of {category, subCategory, minutes})
    #[arg(short, long)]
    durations: Option<PathBuf>,

    /// Assumed travel speed for straight-line matrices
    #[arg(long, default_value = "40")]
    speed_kmh: f64,

    /// Search deadline in milliseconds
    #[arg(long)]
    deadline_ms: Option<u64>,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum AlgorithmArg {
    /// Exhaustive permutation search
    Backtracking,
    /// Best-first branch and bound
    BranchBound,
    /// Held-Karp dynamic programming
    HeldKarp,
    /// Bitonic sweep along a geographic axis
    Bitonic,
    /// Grid-decomposition heuristic
    Ptas,
    /// Ant Colony Optimization
    Aco,
    /// Nearest Neighbor construction
    Nn,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Solve {
            instance,
            algorithm,
            common,
            strategy,
            epsilon,
            seed,
            output,
            verbose,
        } => {
            solve_instance(&instance, algorithm, &common, strategy, epsilon, seed, output, verbose);
        }

        Commands::Analyze {
            instance,
            cluster_distance,
        } => {
            analyze_instance(&instance, cluster_distance);
        }

        Commands::Compare {
            instance,
            common,
            runs,
            output,
        } => {
            compare_algorithms(&instance, &common, runs, output);
        }
    }
}

fn load_instance(path: &Path) -> PoiInstance {
    match PoiInstance::from_file(path) {
        Ok(inst) => inst,
        Err(e) => {
            eprintln!("Error loading instance: {}", e);
            std::process::exit(1);
        }
    }
}

fn build_planner(common: &CommonArgs) -> TourPlanner<HaversineMatrixProvider, CategoryDurations> {
    let mut config = match &common.config {
        Some(path) => match PlannerConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading configuration: {}", e);
                std::process::exit(1);
            }
        },
        None => PlannerConfig::default(),
    };
    if common.deadline_ms.is_some() {
        config.deadline_ms = common.deadline_ms;
    }

    let durations = match &common.durations {
        Some(path) => match CategoryDurations::from_file(path) {
            Ok(d) => d,
            Err(e) => {
                eprintln!("Error loading visit durations: {}", e);
                std::process::exit(1);
            }
        },
        None => CategoryDurations::new(),
    };

    let provider = HaversineMatrixProvider::new(common.speed_kmh);
    match TourPlanner::new(config, provider, durations, Arc::new(MetricsRecorder::new())) {
        Ok(planner) => planner,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn select_algorithm(
    arg: AlgorithmArg,
    config: &PlannerConfig,
    strategy: Option<SweepStrategy>,
    epsilon: Option<f64>,
    seed: Option<u64>,
) -> Algorithm {
    match arg {
        AlgorithmArg::Backtracking => Algorithm::Backtracking,
        AlgorithmArg::BranchBound => Algorithm::BranchAndBound,
        AlgorithmArg::HeldKarp => Algorithm::HeldKarp,
        AlgorithmArg::Bitonic => Algorithm::BitonicSweep(strategy.unwrap_or(config.sweep_strategy)),
        AlgorithmArg::Ptas => Algorithm::GridPtas {
            epsilon: epsilon.unwrap_or(config.grid.epsilon),
        },
        AlgorithmArg::Aco => {
            let mut aco = config.aco.clone();
            if let Some(seed) = seed {
                aco.seed = seed;
            }
            Algorithm::AntColony(aco)
        }
        AlgorithmArg::Nn => Algorithm::NearestNeighbor,
    }
}

#[allow(clippy::too_many_arguments)]
fn solve_instance(
    path: &Path,
    algorithm: AlgorithmArg,
    common: &CommonArgs,
    strategy: Option<SweepStrategy>,
    epsilon: Option<f64>,
    seed: Option<u64>,
    output: Option<PathBuf>,
    verbose: bool,
) {
    println!("Loading instance from {:?}...", path);
    let instance = load_instance(path);
    let planner = build_planner(common);

    if verbose {
        println!("{}", instance.statistics());
    }

    let algorithm = select_algorithm(algorithm, planner.config(), strategy, epsilon, seed);
    println!("Solving with {}...", algorithm);

    let route = match planner.solve(&instance.pois, Some(&instance.metadata), &algorithm) {
        Ok(route) => route,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let time_ms = planner
        .metrics()
        .all()
        .last()
        .map(|e| e.execution_time_ms)
        .unwrap_or_default();

    println!("\n========== Results ==========");
    print!("{}", route);
    println!("Time: {:.2} ms", time_ms);
    if let Some(iter) = route.iterations {
        println!("Iterations: {}", iter);
    }

    if verbose {
        println!("\nStops:");
        for (poi, stop) in route.order.iter().zip(&route.stops) {
            println!("  #{:<4} ({:.6}, {:.6})", poi, stop.latitude, stop.longitude);
        }
    }

    if let Some(out_path) = output {
        let written = serde_json::to_string_pretty(&route)
            .map_err(|e| e.to_string())
            .and_then(|json| std::fs::write(&out_path, json).map_err(|e| e.to_string()));
        match written {
            Ok(()) => println!("\nRoute saved to {:?}", out_path),
            Err(e) => {
                eprintln!("Failed to write output: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn analyze_instance(path: &Path, cluster_distance: f64) {
    let instance = load_instance(path);

    println!("========== Instance Analysis ==========\n");
    println!("{}", instance.statistics());

    let clustering = cluster(&instance.pois, cluster_distance, Some(&instance.metadata));
    let largest = clustering.records.iter().map(|r| r.size()).max().unwrap_or(0);

    println!("Clustering at {:.0} m:", cluster_distance);
    println!("  Nodes after clustering: {}", clustering.len());
    println!("  Largest cluster: {}", largest);

    let mut categories: Vec<String> = instance
        .metadata
        .iter()
        .filter_map(|m| m.category.clone())
        .collect();
    categories.sort();
    categories.dedup();
    if !categories.is_empty() {
        println!("\nCategories: {}", categories.join(", "));
    }

    let limits = PlannerConfig::default().limits;
    let n = clustering.len();
    println!("\nExact solvers at this size:");
    println!("  Backtracking: {}", if n <= limits.backtracking { "yes" } else { "no" });
    println!("  Branch-and-Bound: {}", if n <= limits.branch_and_bound { "yes" } else { "no" });
    println!("  Held-Karp: {}", if n <= limits.held_karp { "yes" } else { "no" });
}

fn compare_algorithms(path: &Path, common: &CommonArgs, runs: usize, output: Option<PathBuf>) {
    let instance = load_instance(path);
    let planner = build_planner(common);

    println!("Comparing algorithms on {} (n={})...\n", instance.name, instance.len());

    let mut algorithms = Vec::new();
    for run in 0..runs.max(1) {
        for mut algorithm in Algorithm::all(planner.config()) {
            if let Algorithm::AntColony(aco) = &mut algorithm {
                aco.seed = aco.seed.wrapping_add(run as u64);
            }
            algorithms.push(algorithm);
        }
    }

    let progress = ProgressBar::new(algorithms.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}").unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    for algorithm in &algorithms {
        progress.set_message(algorithm.name());
        if let Err(e) = planner.solve(&instance.pois, Some(&instance.metadata), algorithm) {
            progress.println(format!("{} failed: {}", algorithm, e));
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    println!("{}", planner.metrics().summary_report());

    if let Some(out_path) = output {
        match planner.metrics().export_to_csv(&out_path) {
            Ok(()) => println!("\nMetrics exported to {:?}", out_path),
            Err(e) => {
                eprintln!("Failed to export metrics: {}", e);
                std::process::exit(1);
            }
        }
    }
}
