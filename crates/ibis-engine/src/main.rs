//! `ibis-stress`: serialization stress and layout sampling

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use ibis_engine::harness::{run_layout_sample, run_serialization_stress, SerializationStressConfig};
use ibis_engine::EngineConfig;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("ibis-stress")
        .version(ibis_engine::VERSION)
        .about("Stress and sampling checks for the IBIS graph engine")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Engine configuration (TOML)"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Print the report as JSON"),
        )
        .subcommand(
            Command::new("serialize")
                .about("Concurrent near-duplicate submissions; expects one node per author")
                .arg(
                    Arg::new("authors")
                        .long("authors")
                        .default_value("8")
                        .value_parser(value_parser!(usize))
                        .help("Number of concurrent authors"),
                )
                .arg(
                    Arg::new("submissions")
                        .long("submissions")
                        .default_value("4")
                        .value_parser(value_parser!(usize))
                        .help("Near-identical submissions per author"),
                )
                .arg(
                    Arg::new("rounds")
                        .long("rounds")
                        .default_value("10")
                        .value_parser(value_parser!(usize))
                        .help("Independent runs"),
                )
                .arg(
                    Arg::new("latency-ms")
                        .long("latency-ms")
                        .default_value("2")
                        .value_parser(value_parser!(u64))
                        .help("Simulated repository latency per call"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .default_value("42")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducibility"),
                ),
        )
        .subcommand(
            Command::new("layout")
                .about("Sample the position allocator and check layout invariants")
                .arg(
                    Arg::new("samples")
                        .long("samples")
                        .default_value("1000")
                        .value_parser(value_parser!(usize))
                        .help("Placements per category"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .default_value("42")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducibility"),
                ),
        )
}

fn load_config(args: &ArgMatches) -> anyhow::Result<EngineConfig> {
    match args.get_one::<PathBuf>("config") {
        Some(path) => {
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            EngineConfig::from_toml_str(&source).with_context(|| format!("parsing {}", path.display()))
        }
        None => Ok(EngineConfig::default()),
    }
}

fn arg<T: Clone + Send + Sync + 'static>(args: &ArgMatches, name: &str) -> anyhow::Result<T> {
    args.get_one::<T>(name)
        .cloned()
        .with_context(|| format!("missing --{name}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    let (command, args) = matches.subcommand().context("no subcommand given")?;
    // Global flags are propagated into the subcommand's matches.
    let json = args.get_flag("json");
    let config = load_config(args)?;

    let passed = match command {
        "serialize" => {
            let rounds: usize = arg(args, "rounds")?;
            let seed: u64 = arg(args, "seed")?;
            let mut passed = true;

            for round in 0..rounds {
                let stress = SerializationStressConfig {
                    authors: arg(args, "authors")?,
                    submissions_per_author: arg(args, "submissions")?,
                    latency: Duration::from_millis(arg(args, "latency-ms")?),
                    seed: seed.wrapping_add(round as u64),
                    engine: config.clone(),
                };
                let report = run_serialization_stress(&stress).await;

                if json {
                    println!("{}", serde_json::to_string(&report)?);
                } else {
                    println!(
                        "round {round}: created={} duplicates={} failures={} pending_authors={}",
                        report.created, report.duplicates, report.failures, report.pending_authors
                    );
                    for violation in &report.violations {
                        println!("  VIOLATION: {violation}");
                    }
                }
                passed &= report.passed();
            }
            passed
        }
        "layout" => {
            let report = run_layout_sample(&config, arg(args, "samples")?, arg(args, "seed")?);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "samples={} outside_canvas={} outside_zone={} not_idempotent={} overlapping_grids={}",
                    report.samples,
                    report.outside_canvas,
                    report.outside_zone,
                    report.not_idempotent,
                    report.overlapping_grids
                );
            }
            report.passed()
        }
        other => anyhow::bail!("unknown subcommand {other}"),
    };

    std::process::exit(if passed { 0 } else { 1 });
}
