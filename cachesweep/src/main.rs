use std::path::PathBuf;
use std::time::Instant;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use sweeplib::config::SweepConfig;
use sweeplib::dispatcher::ConsoleObserver;
use sweeplib::enumerator::enumerate;
use sweeplib::report::filter_report;
use sweeplib::simulator::Simulator;
use sweeplib::sweep::run_sweep;

#[derive(Parser, Debug)]
#[command(about = String::from("Parameter sweep harness for the cache simulator"))]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log debug information, including one line per simulator run. Ignored when RUST_LOG is set
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the simulator for every trace and configuration, writing the result table
    Run(RunArgs),
    /// Reduce a result table to the best block size per cache geometry and L2 policy
    Report {
        /// The result table written by `run`
        #[arg(short, long, default_value = "cache_results.csv")]
        input: PathBuf,
        /// Where the reduced table is written
        #[arg(short, long, default_value = "cache_results_best.csv")]
        output: PathBuf,
    },
    /// Print the configurations a sweep would run, one JSON object per line
    Configs {
        /// JSON sweep configuration, defaults are used for anything missing
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// JSON sweep configuration, defaults are used for anything missing
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Simulator executable
    #[arg(short, long)]
    executable: Option<PathBuf>,

    /// Directory holding the trace files
    #[arg(short, long)]
    trace_dir: Option<PathBuf>,

    /// Output CSV path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of simulator processes run at once
    #[arg(short, long)]
    workers: Option<usize>,
}

fn load_config(path: Option<&PathBuf>) -> Result<SweepConfig, String> {
    match path {
        Some(path) => SweepConfig::from_path(path)
            .map_err(|e| format!("Couldn't load the sweep configuration at path {}: {e}", path.display())),
        None => Ok(SweepConfig::default()),
    }
}

/// RUST_LOG takes precedence, otherwise `--debug` picks between debug and info
fn log_directive(debug: bool, rust_log: Option<String>) -> String {
    match rust_log {
        Some(directive) if !directive.trim().is_empty() => directive,
        _ if debug => "debug".to_string(),
        _ => "info".to_string(),
    }
}

fn init_logging(debug: bool) {
    let directive = log_directive(debug, std::env::var(EnvFilter::DEFAULT_ENV).ok());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<(), String> {
    let cli = Cli::parse();
    init_logging(cli.debug);
    match cli.command {
        Command::Run(args) => run(args),
        Command::Report { input, output } => {
            filter_report(&input, &output).map_err(|e| format!("Couldn't build the report from {}: {e}", input.display()))?;
            Ok(())
        }
        Command::Configs { config } => {
            let config = load_config(config.as_ref())?;
            config.validate().map_err(|e| e.to_string())?;
            for configuration in enumerate(&config) {
                println!("{}", serde_json::to_string(&configuration).map_err(|e| format!("Couldn't serialise the configuration {e}"))?);
            }
            Ok(())
        }
    }
}

fn run(args: RunArgs) -> Result<(), String> {
    let start = Instant::now();
    let mut config = load_config(args.config.as_ref())?;
    if let Some(executable) = args.executable {
        config.executable = executable;
    }
    if let Some(trace_dir) = args.trace_dir {
        config.trace_dir = trace_dir;
    }
    if let Some(output) = args.output {
        config.output = output;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    let config = config;
    let simulator = Simulator::from_config(&config);
    let summary = run_sweep(&config, simulator, &ConsoleObserver).map_err(|e| e.to_string())?;
    info!(
        configurations = summary.configurations,
        tasks = summary.tasks,
        failures = summary.failures,
        "Sweep finished in {:.2}s",
        start.elapsed().as_secs_f64()
    );
    Ok(())
}
