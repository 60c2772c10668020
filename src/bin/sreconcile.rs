//! sreconcile - inspect reconciliation decisions from the command line.
//!
//! `compare` prints the filtered diff between a live and a desired object.
//! `plan` prints the replica group plan for a live and a desired set of
//! StatefulSets.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use k8s_openapi::api::apps::v1::StatefulSet;
use tracing::{debug, error};

use stack_reconcile::config::ReconcileConfig;
use stack_reconcile::logging::init_logging;
use stack_reconcile::{compare_values, plan_statefulsets, value, Error, Result};

/// Exit code for a plan that is blocked by the quorum policy.
const EXIT_CONFLICT: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "sreconcile", version, about = "Inspect reconciliation decisions")]
struct Cli {
    /// Configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output location. Use '-' for stdout
    #[arg(short, long, default_value = "-", global = true)]
    output: String,

    /// Log level, overriding the configuration
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compare a live object with a desired object (YAML or JSON)
    Compare {
        #[arg(long)]
        live: PathBuf,
        #[arg(long)]
        desired: PathBuf,
    },
    /// Plan replica group changes from two YAML lists of StatefulSets
    Plan {
        #[arg(long)]
        existing: PathBuf,
        #[arg(long)]
        expected: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config.logging);

    match run(cli, &config) {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<ReconcileConfig> {
    let mut config = match &cli.config {
        Some(path) => ReconcileConfig::load(path)?,
        None => ReconcileConfig::default(),
    };
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if cli.log_json {
        config.logging.json = true;
    }
    config.apply_env()?;
    Ok(config)
}

fn run(cli: Cli, config: &ReconcileConfig) -> Result<ExitCode> {
    let mut output: Box<dyn Write> = if cli.output == "-" {
        Box::new(io::stdout())
    } else {
        Box::new(fs::File::create(&cli.output)?)
    };

    match cli.command {
        Command::Compare { live, desired } => compare(&live, &desired, &mut output),
        Command::Plan { existing, expected } => plan(&existing, &expected, config, &mut output),
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::read(path, e))
}

fn compare(live: &Path, desired: &Path, output: &mut dyn Write) -> Result<ExitCode> {
    let live_obj = value::from_yaml(&read(live)?).map_err(|e| Error::parse(live.display().to_string(), e))?;
    let desired_obj =
        value::from_yaml(&read(desired)?).map_err(|e| Error::parse(desired.display().to_string(), e))?;

    let diff = compare_values(&live_obj, &desired_obj);
    if diff.is_empty() {
        writeln!(output, "No meaningful difference")?;
    } else {
        write!(output, "{}", diff)?;
    }
    Ok(ExitCode::SUCCESS)
}

fn read_groups(path: &Path) -> Result<Vec<StatefulSet>> {
    let content = read(path)?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    let groups: Vec<StatefulSet> =
        serde_yaml::from_str(&content).map_err(|e| Error::parse(path.display().to_string(), e))?;
    debug!(path = %path.display(), count = groups.len(), "loaded replica groups");
    Ok(groups)
}

fn plan(existing: &Path, expected: &Path, config: &ReconcileConfig, output: &mut dyn Write) -> Result<ExitCode> {
    let existing = read_groups(existing)?;
    let expected = read_groups(expected)?;

    let plan = plan_statefulsets(&existing, &expected, &config.planner);
    write!(output, "{}", serde_yaml::to_string(&plan)?)?;

    if let Some(conflict) = &plan.conflict {
        eprintln!("Degraded: {}", conflict);
        return Ok(ExitCode::from(EXIT_CONFLICT));
    }
    Ok(ExitCode::SUCCESS)
}
