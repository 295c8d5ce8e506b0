//! `loam-stress` - drive the reference types under contention and report

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use loam_ref::stress::{self, StressReport};
use loam_ref::{executor, DispatchMode, RuntimeConfig};
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("loam-stress")
        .version(loam_ref::VERSION)
        .about("Stress the Loam reference types and check their invariants")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_name("PATH")
                .help("Runtime config file (TOML)"),
        )
        .subcommand(
            Command::new("agents")
                .about("Many sends to many agents; every send must apply exactly once")
                .arg(
                    Arg::new("agents")
                        .long("agents")
                        .default_value("64")
                        .value_parser(value_parser!(usize))
                        .help("Number of agents"),
                )
                .arg(
                    Arg::new("sends")
                        .long("sends")
                        .default_value("1000")
                        .value_parser(value_parser!(u64))
                        .help("Sends per agent"),
                )
                .arg(
                    Arg::new("solo")
                        .long("solo")
                        .action(ArgAction::SetTrue)
                        .help("Run actions on dedicated threads instead of the pool"),
                ),
        )
        .subcommand(
            Command::new("atom")
                .about("Concurrent swaps on one atom; no update may be lost")
                .arg(
                    Arg::new("threads")
                        .long("threads")
                        .default_value("8")
                        .value_parser(value_parser!(usize))
                        .help("Number of writer threads"),
                )
                .arg(
                    Arg::new("increments")
                        .long("increments")
                        .default_value("10000")
                        .value_parser(value_parser!(u64))
                        .help("Increments per thread"),
                ),
        )
        .subcommand(
            Command::new("lazy")
                .about("Concurrent realization of one lazy sequence; the body must run once")
                .arg(
                    Arg::new("callers")
                        .long("callers")
                        .default_value("32")
                        .value_parser(value_parser!(usize))
                        .help("Number of concurrent callers"),
                ),
        )
}

fn configure(matches: &ArgMatches) -> Result<()> {
    let Some(path) = matches.get_one::<String>("config") else {
        return Ok(());
    };
    let config = RuntimeConfig::load(path)?;
    executor::configure(&config).context("installing runtime")?;
    Ok(())
}

fn run(matches: &ArgMatches) -> Result<StressReport> {
    let report = match matches.subcommand() {
        Some(("agents", args)) => {
            let agents = *args.get_one::<usize>("agents").context("missing --agents")?;
            let sends = *args.get_one::<u64>("sends").context("missing --sends")?;
            let mode = if args.get_flag("solo") {
                DispatchMode::Solo
            } else {
                DispatchMode::Pooled
            };
            println!("Agents: {agents}, sends per agent: {sends}, mode: {mode:?}");
            stress::run_agents(agents, sends, mode)?
        }
        Some(("atom", args)) => {
            let threads = *args.get_one::<usize>("threads").context("missing --threads")?;
            let increments = *args.get_one::<u64>("increments").context("missing --increments")?;
            println!("Threads: {threads}, increments per thread: {increments}");
            stress::run_atom(threads, increments)?
        }
        Some(("lazy", args)) => {
            let callers = *args.get_one::<usize>("callers").context("missing --callers")?;
            println!("Callers: {callers}");
            stress::run_lazy(callers)?
        }
        _ => anyhow::bail!("unknown subcommand"),
    };
    Ok(report)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env("LOAM_LOG"))
        .init();

    let matches = cli().get_matches();
    configure(&matches)?;

    let report = run(&matches)?;
    println!();
    print!("{}", report.generate_text());

    std::process::exit(if report.passed() { 0 } else { 1 });
}
