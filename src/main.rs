//! Main entry point for the Pokémon ranker
//!
//! Loads configuration, initializes logging and runs one of the subcommands
//! against the JSON snapshot.

use anyhow::Result;
use clap::{Parser, Subcommand};
use pokemon_ranker::config::AppConfig;
use pokemon_ranker::display::{
    format_leaderboard, format_outcome, format_pair, format_store_summary, format_top_cards,
    format_vote_summary,
};
use pokemon_ranker::matchmaking::Matchmaker;
use pokemon_ranker::rating::RatingEngine;
use pokemon_ranker::session::{is_persistence_failure, SessionController};
use pokemon_ranker::store::{
    merge_import, read_metadata_file, ImportOptions, JsonSnapshotStore, SnapshotStore,
};
use pokemon_ranker::Side;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Pokémon Ranker - Rank Pokémon by pairwise preference
#[derive(Parser)]
#[command(
    name = "pokemon-ranker",
    version,
    about = "Rank Pokémon by repeatedly picking the better of two",
    long_about = "Pokémon Ranker presents two Pokémon at a time, records which one you prefer \
                 and keeps Elo ratings for every Pokémon in a JSON snapshot. Pairs are chosen \
                 among similarly rated Pokémon, with occasional random pairings."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Snapshot path override
    #[arg(short, long, value_name = "FILE", help = "Override snapshot file path")]
    snapshot: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// K-factor override
    #[arg(long, value_name = "K", help = "Override the Elo K-factor")]
    k_factor: Option<f64>,

    /// RNG seed override
    #[arg(long, value_name = "SEED", help = "Seed pair selection for a reproducible session")]
    seed: Option<u64>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Dry run mode (validate config and exit)
    #[arg(long, help = "Validate configuration and exit without touching the snapshot")]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Vote on pairs interactively (default)
    Vote,
    /// Print the full leaderboard
    Leaderboard {
        /// Only show the first N rows
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Print detail cards for the best Pokémon
    Top {
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,
    },
    /// Print vote totals
    Stats,
    /// Merge Pokémon metadata into the snapshot, keeping existing standings
    Import {
        /// Metadata file (JSON object keyed by name, or a list)
        #[arg(long, value_name = "FILE")]
        from: PathBuf,
        /// Remove Pokémon missing from the metadata file
        #[arg(long)]
        prune: bool,
    },
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_line_number(true)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Display startup banner with configuration details
fn display_startup_banner(config: &AppConfig) {
    info!("Pokémon Ranker v{}", pokemon_ranker::VERSION);
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!("   Snapshot: {}", config.store.snapshot_path.display());
    info!(
        "   Elo: K={} initial={}",
        config.rating.k_factor, config.rating.initial_rating
    );
    info!(
        "   Matchmaking: threshold={} exploration={}",
        config.matchmaking.pairing.proximity_threshold,
        config.matchmaking.pairing.exploration_rate
    );
    if let Some(seed) = config.matchmaking.seed {
        info!("   Seed: {}", seed);
    }
}

/// Load and merge configuration from environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    if let Some(snapshot) = &args.snapshot {
        config.store.snapshot_path = snapshot.clone();
    }

    if let Some(k_factor) = args.k_factor {
        config.rating.k_factor = k_factor;
    }

    if let Some(seed) = args.seed {
        config.matchmaking.seed = Some(seed);
    }

    pokemon_ranker::config::validate_config(&config)?;
    Ok(config)
}

fn snapshot_store(config: &AppConfig) -> JsonSnapshotStore {
    JsonSnapshotStore::new(&config.store.snapshot_path)
        .with_initial_rating(config.rating.initial_rating)
}

fn session_rng(config: &AppConfig) -> StdRng {
    match config.matchmaking.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Interactive voting loop over stdin
fn run_vote(config: &AppConfig) -> Result<()> {
    let mut session = SessionController::open(
        snapshot_store(config),
        RatingEngine::elo(config.rating.clone())?,
        Matchmaker::new(config.matchmaking.pairing.clone())?,
        session_rng(config),
    )?;

    debug!(
        "Rating calculator settings: {}",
        session.engine().calculator().config()
    );

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut stdout = io::stdout();

    loop {
        let selection = session.current_selection();
        debug!(
            "Pair {} vs {} via {:?} ({} near the seed)",
            selection.seed, selection.partner, selection.strategy, selection.candidate_count
        );

        let (a, b) = session.current_pair();
        println!("\n{}", format_pair(a, b));
        print!("Pick 1 or 2 (l = leaderboard, q = quit): ");
        stdout.flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => break,
        };

        let side = match line.trim().to_lowercase().as_str() {
            "1" | "a" => Side::A,
            "2" | "b" => Side::B,
            "l" => {
                println!("{}", format_leaderboard(&session.top(20)));
                continue;
            }
            "q" | "quit" => break,
            other => {
                println!("Unrecognized choice: {:?}", other);
                continue;
            }
        };

        match session.choose(side) {
            Ok(outcome) => println!("{}", format_outcome(&outcome)),
            Err(e) if is_persistence_failure(&e) => {
                // Progress stays in memory; the next vote retries the save
                warn!("Vote recorded but not saved yet: {}", e);
            }
            Err(e) => return Err(e),
        }
    }

    if let Err(e) = session.flush() {
        error!("Final save failed, unsaved votes are lost: {}", e);
        return Err(e);
    }

    println!(
        "{}",
        format_vote_summary(
            session.store().len(),
            session.total_votes(),
            session.stats().matches_recorded
        )
    );
    Ok(())
}

fn run_import(config: &AppConfig, from: &Path, prune: bool) -> Result<()> {
    let snapshots = snapshot_store(config);
    let mut store = snapshots.load()?;
    let incoming = read_metadata_file(from)?;

    let options = ImportOptions {
        initial_rating: config.rating.initial_rating,
        prune_missing: prune,
    };
    let report = merge_import(&mut store, incoming, &options)?;
    snapshots.save(&store)?;

    println!(
        "Imported into {}: {} added, {} refreshed, {} pruned ({} total)",
        snapshots.location(),
        report.added,
        report.refreshed,
        report.pruned,
        store.len()
    );
    Ok(())
}

fn run(config: &AppConfig, command: Command) -> Result<()> {
    match command {
        Command::Vote => run_vote(config),
        Command::Leaderboard { limit } => {
            let store = snapshot_store(config).load()?;
            let ranked = match limit {
                Some(limit) => store.top(limit),
                None => store.ranked(),
            };
            print!("{}", format_leaderboard(&ranked));
            Ok(())
        }
        Command::Top { count } => {
            let store = snapshot_store(config).load()?;
            print!("{}", format_top_cards(&store.top(count)));
            Ok(())
        }
        Command::Stats => {
            let store = snapshot_store(config).load()?;
            println!("{}", format_store_summary(store.len(), store.total_votes()));
            Ok(())
        }
        Command::Import { from, prune } => run_import(config, &from, prune),
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration (CLI args can override environment/config file)
    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    // Initialize logging early (before any other operations)
    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    display_startup_banner(&config);

    if args.dry_run {
        info!("Dry run completed - configuration is valid");
        return Ok(());
    }

    if let Err(e) = run(&config, args.command.unwrap_or(Command::Vote)) {
        error!("{:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
