use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lockwatch_engine::adapters::{replay, ActorFailure, Simulation, SimulationSummary};
use lockwatch_engine::domain::{DetectionReport, Snapshot};
use lockwatch_engine::infrastructure::SimulationConfig;
use lockwatch_trace::{ProcFs, TraceAnalysis, TraceError, Verdict};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// lockwatch - resource-allocation deadlock detector
#[derive(Parser)]
#[command(name = "lockwatch", version)]
#[command(about = "Wait-for-graph deadlock detection and trace analysis", long_about = None)]
struct Cli {
    /// Log filter (e.g. `info`, `lockwatch_engine=debug`); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run scripted actors against a live periodic detector
    Simulate {
        /// JSON scenario file (built-in circular wait if omitted)
        #[arg(short, long)]
        scenario: Option<PathBuf>,
        /// Run time in seconds
        #[arg(short, long)]
        duration: Option<u64>,
        /// Detection interval in seconds
        #[arg(short, long)]
        interval: Option<u64>,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replay a scenario without timers and run one detection pass
    Detect {
        /// JSON scenario file
        #[arg(short, long)]
        scenario: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Confirm deadlocks from `strace -f` output
    AnalyzeTrace {
        /// Trace files to analyse, each optionally paired with the traced
        /// program's name (`out2.txt:threads`)
        #[arg(required = true, value_name = "FILE[:NAME]", value_parser = parse_trace_target)]
        targets: Vec<TraceTarget>,
        /// Process name for files given without one
        #[arg(short, long)]
        process: Option<String>,
    },
}

/// One trace file and the program that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
struct TraceTarget {
    file: PathBuf,
    process: Option<String>,
}

/// `out2.txt:threads` -> file `out2.txt`, process `threads`
///
/// The name follows the last `:`; a trailing `:` or a separator inside the
/// directory part leaves the whole argument as the path.
fn parse_trace_target(arg: &str) -> Result<TraceTarget, String> {
    if arg.is_empty() {
        return Err("trace file must not be empty".to_string());
    }
    let target = match arg.rsplit_once(':') {
        Some((file, name)) if !file.is_empty() && !name.is_empty() && !name.contains('/') => {
            TraceTarget {
                file: PathBuf::from(file),
                process: Some(name.to_string()),
            }
        }
        _ => TraceTarget {
            file: PathBuf::from(arg),
            process: None,
        },
    };
    Ok(target)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref())?;

    match cli.command {
        Commands::Simulate {
            scenario,
            duration,
            interval,
            json,
        } => simulate(scenario.as_deref(), duration, interval, json).await,
        Commands::Detect { scenario, json } => detect(&scenario, json),
        Commands::AnalyzeTrace { targets, process } => analyze_trace(&targets, process.as_deref()),
    }
}

fn init_tracing(level: Option<&str>) -> Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).with_context(|| format!("invalid log level {level:?}"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn load_scenario(path: &Path) -> Result<SimulationConfig> {
    SimulationConfig::from_path(path)
        .with_context(|| format!("failed to load scenario {}", path.display()))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// simulate / detect
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

async fn simulate(
    scenario: Option<&Path>,
    duration: Option<u64>,
    interval: Option<u64>,
    json: bool,
) -> Result<()> {
    let mut config = match scenario {
        Some(path) => load_scenario(path)?,
        None => SimulationConfig::circular_wait(),
    };
    if let Some(secs) = duration {
        config.duration = Duration::from_secs(secs);
    }
    if let Some(secs) = interval {
        config.engine.detection_interval = Duration::from_secs(secs);
    }

    info!("⚡ lockwatch v{}", lockwatch_engine::VERSION);
    let simulation = Simulation::new(config).context("invalid simulation settings")?;
    let summary = simulation.run().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary_json(&summary))?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn detect(scenario: &Path, json: bool) -> Result<()> {
    let config = load_scenario(scenario)?;
    let replay = replay(&config).context("invalid scenario")?;

    if json {
        let value = json!({
            "report": replay.report,
            "failures": failures_json(&replay.failures),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        for failure in &replay.failures {
            println!("⚠️  {failure}");
        }
        println!("{}", replay.report);
    }
    Ok(())
}

fn failures_json(failures: &[ActorFailure]) -> serde_json::Value {
    failures
        .iter()
        .map(|f| json!({ "process": f.process, "step": f.step, "error": f.error.to_string() }))
        .collect()
}

fn summary_json(summary: &SimulationSummary) -> serde_json::Value {
    json!({
        "reports": summary.reports,
        "final_snapshot": summary.final_snapshot,
        "failures": failures_json(&summary.failures),
    })
}

fn print_summary(summary: &SimulationSummary) {
    println!("{}", "=".repeat(50));
    println!(
        "Detection passes: {} ({} reported a deadlock)",
        summary.reports.len(),
        summary.deadlock_passes()
    );
    match summary.reports.iter().rev().find(|r| r.is_deadlock()) {
        Some(report) => println!("{report}"),
        None => println!("{}", DetectionReport::NoDeadlock),
    }
    for failure in &summary.failures {
        println!("⚠️  {failure}");
    }
    print_snapshot(&summary.final_snapshot);
    println!("{}", "=".repeat(50));
}

fn print_snapshot(snapshot: &Snapshot) {
    println!("Final ledger:");
    println!("Available: {:?}", snapshot.available());
    println!("Allocation:\n{}", snapshot.allocation());
    println!("Request:\n{}", snapshot.request());
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// analyze-trace
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn analyze_trace(targets: &[TraceTarget], default_process: Option<&str>) -> Result<()> {
    for target in targets {
        let file = &target.file;
        let process = target.process.as_deref().or(default_process);
        println!("{}", "#".repeat(70));
        println!("## Analyzing {}", file.display());
        println!("{}", "#".repeat(70));

        let analysis = match TraceAnalysis::from_path(file) {
            Ok(analysis) => analysis,
            Err(e @ TraceError::NotFound { .. }) => {
                warn!(error = %e, "skipping trace");
                continue;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("failed to analyse {}", file.display()))
            }
        };

        println!("Analyzed {} syscall lines.", analysis.lines());
        let verdict = analysis.verdict();
        println!("{verdict}");

        if let (Verdict::Deadlocked { .. }, Some(name)) = (&verdict, process) {
            inspect_process(name);
        }

        println!("{}", "=".repeat(50));
        if verdict.is_deadlocked() {
            println!("SUMMARY: 🔴 DEADLOCK CONFIRMED");
        } else {
            println!("SUMMARY: 🟢 NO DEADLOCK CONFIRMED");
        }
        println!("{}", "=".repeat(50));
    }
    Ok(())
}

fn inspect_process(name: &str) {
    info!("🔍 searching for running process {name:?}");
    let proc_fs = ProcFs::default();

    let info = proc_fs
        .find_pid_by_name(name)
        .and_then(|pid| proc_fs.process_info(pid));
    match info {
        Ok(info) => {
            println!("--- Process Information (Live) ---");
            println!("{info}");
        }
        // The traced program is usually terminated to capture the trace
        Err(e) if e.is_not_found() => println!("{e} (expected once the traced program has exited)"),
        Err(e) => warn!(error = %e, "process inspection failed"),
    }
}
