use clap::{Args, Parser, Subcommand};
use parrondo_sim::prelude::*;
use parrondo_sim::write;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

/// Monte-Carlo blackjack simulator measuring the edge of flat, percentage and two-hand betting policies.
#[derive(Debug, Parser)]
#[command(name = "parrondo_sim", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a simulation under a single betting policy
    Run(RunArgs),
    /// Run the basic, Stutzer and Parrondo games side by side
    Compare(SharedArgs),
}

#[derive(Debug, Args)]
struct SharedArgs {
    /// JSON configuration file, flags override its values
    #[arg(long)]
    config: Option<PathBuf>,
    /// JSON strategy table, the built-in basic strategy is used otherwise
    #[arg(long)]
    strategy: Option<PathBuf>,
    /// Number of games (one shoe each)
    #[arg(long)]
    games: Option<u32>,
    #[arg(long)]
    decks: Option<usize>,
    /// Remaining fraction of the shoe that ends a game
    #[arg(long)]
    penetration: Option<f64>,
    /// Stake unit when the true count is high
    #[arg(long)]
    bet_spread: Option<f64>,
    /// Count three sevens as a blackjack
    #[arg(long)]
    triple_seven: bool,
    #[arg(long)]
    bankroll: Option<f64>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    threads: Option<usize>,
    /// Print the final bankroll and amount wagered of every game
    #[arg(long)]
    see_results: bool,
    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Args)]
struct RunArgs {
    #[command(flatten)]
    shared: SharedArgs,
    #[arg(long, value_enum)]
    staking: Option<StakingPolicy>,
    /// Raise the stake to the bet spread when the true count exceeds 6
    #[arg(long)]
    count_sizing: bool,
    /// Play two hands every round
    #[arg(long)]
    two_hands: bool,
    /// Write the true count history to this file, one value per line
    #[arg(long)]
    count_history: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbose = match &cli.command {
        Command::Run(args) => args.shared.verbose,
        Command::Compare(args) => args.verbose,
    };
    init_logging(verbose);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialise the `tracing` subscriber.
fn init_logging(verbose: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = match verbose {
        0 => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("parrondo_sim=info")),
        1 => EnvFilter::new("parrondo_sim=debug"),
        _ => EnvFilter::new("parrondo_sim=trace,parrondo_lib=trace"),
    };

    fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();
}

fn run(command: Command) -> Result<(), SimulationError> {
    match command {
        Command::Run(args) => {
            let mut builder = config_builder(&args.shared)?;
            if let Some(staking) = args.staking {
                builder.staking(staking);
            }
            if args.count_sizing {
                builder.count_sizing(true);
            }
            if args.two_hands {
                builder.two_hands(true);
            }
            if args.count_history.is_some() {
                builder.record_count_history(true);
            }
            let config = builder.build();
            let strategy = load_strategy(args.shared.strategy.as_deref())?;

            let summary = BlackjackSimulator::new(config, &strategy)?.run()?;
            report(&summary, &args.shared)?;

            if let Some(path) = args.count_history {
                let file = File::create(&path).map_err(|source| io_error(&path, source))?;
                write::write_count_history(&summary.count_history, BufWriter::new(file))
                    .map_err(|source| io_error(&path, source))?;
                info!(path = %path.display(), values = summary.count_history.len(), "wrote count history");
            }
            Ok(())
        }
        Command::Compare(args) => {
            let config = config_builder(&args)?.record_count_history(false).build();
            let strategy = load_strategy(args.strategy.as_deref())?;
            let summaries = parrondo_comparison(config, &strategy)?;

            let stdout = io::stdout();
            if args.json {
                write::write_json(&summaries, stdout.lock())?;
            } else {
                write::write_comparison(&summaries, stdout.lock())
                    .map_err(|source| io_error(Path::new("<stdout>"), source))?;
            }
            if args.see_results {
                for summary in &summaries {
                    let mut out = stdout.lock();
                    writeln!(out, "{}", summary.label)
                        .and_then(|_| write::write_game_results(&summary.game_results, &mut out))
                        .map_err(|source| io_error(Path::new("<stdout>"), source))?;
                }
            }
            Ok(())
        }
    }
}

/// Starts from the config file when given one, then applies the flags that were set.
fn config_builder(args: &SharedArgs) -> Result<SimulationConfigBuilder, SimulationError> {
    let mut builder = match &args.config {
        Some(path) => {
            let json = fs::read_to_string(path).map_err(|source| io_error(path, source))?;
            SimulationConfigFile::from_json(&json)?.into_builder()
        }
        None => SimulationConfig::new(),
    };

    if let Some(games) = args.games {
        builder.num_games(games);
    }
    if let Some(decks) = args.decks {
        builder.num_decks(decks);
    }
    if let Some(penetration) = args.penetration {
        builder.penetration(penetration);
    }
    if let Some(spread) = args.bet_spread {
        builder.bet_spread(spread);
    }
    if args.triple_seven {
        builder.triple_seven(true);
    }
    if let Some(bankroll) = args.bankroll {
        builder.starting_bankroll(bankroll);
    }
    if let Some(seed) = args.seed {
        builder.seed(seed);
    }
    if let Some(threads) = args.threads {
        builder.threads(threads);
    }
    Ok(builder)
}

fn load_strategy(path: Option<&Path>) -> Result<StrategyTable, SimulationError> {
    match path {
        Some(path) => {
            let json = fs::read_to_string(path).map_err(|source| io_error(path, source))?;
            let table = StrategyTable::from_json(&json).map_err(SimulationError::Strategy)?;
            info!(path = %path.display(), "loaded strategy table");
            Ok(table)
        }
        None => Ok(BASIC_STRATEGY.clone()),
    }
}

fn report(summary: &SimulationSummary, args: &SharedArgs) -> Result<(), SimulationError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.json {
        write::write_json(summary, &mut out)?;
    } else {
        write::write_summary(summary, &mut out)
            .map_err(|source| io_error(Path::new("<stdout>"), source))?;
    }
    if args.see_results {
        write::write_game_results(&summary.game_results, &mut out)
            .map_err(|source| io_error(Path::new("<stdout>"), source))?;
    }
    Ok(())
}

fn io_error(path: &Path, source: io::Error) -> SimulationError {
    SimulationError::Io {
        path: path.to_path_buf(),
        source,
    }
}
