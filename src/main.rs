use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{info, LevelFilter};
use std::path::PathBuf;
use tokio::sync::mpsc::{self, UnboundedReceiver};

use game_dashboard::onboarding::{OnboardingOutcome, Storefront, StorefrontKind};
use game_dashboard::reconcile::{ReconcileEvent, ReconcileOutcome};
use game_dashboard::{Config, Dashboard, APP_NAME, VERSION};

#[derive(Parser)]
#[command(name = "game-dashboard")]
#[command(version)]
#[command(about = "Keeps a catalogue of your games, imported from Steam and friends")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (RUST_LOG still takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file to use instead of the default one
    #[arg(long, global = true, env = "GAME_DASHBOARD_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the games in the catalogue
    List,

    /// Remove a game from the catalogue
    Remove {
        /// Exact title of the game
        title: String,
    },

    /// Start a game from the catalogue
    Launch {
        /// Exact title of the game
        title: String,
    },

    /// Search the metadata service
    Search {
        /// Free-text query
        query: String,
    },

    /// Connect a storefront and import its games
    Onboard {
        /// Storefront to connect
        #[arg(value_enum)]
        service: StorefrontKind,

        /// Install directory (Steam only)
        location: Option<String>,
    },

    /// Re-import games from the configured Steam location
    Rescan,
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(Config::config_path);
    let config = Config::load_from(&path)?;

    // Create default configuration if it doesn't exist
    if !path.exists() {
        config.save_to(&path)?;
    }

    Ok((config, path))
}

/// Print reconciliation progress until the sender goes away
async fn print_events(mut rx: UnboundedReceiver<ReconcileEvent>) {
    let mut in_flight = 0usize;

    while let Some(event) = rx.recv().await {
        match event {
            ReconcileEvent::PhaseChanged(phase) => println!("[{}]", phase),
            ReconcileEvent::TitlesQueued(titles) => {
                in_flight = titles.len();
                println!("Looking up {} installed titles", in_flight);
            }
            ReconcileEvent::Resolved { title, .. } => {
                in_flight = in_flight.saturating_sub(1);
                println!("  + {} ({} left)", title, in_flight);
            }
            ReconcileEvent::Unresolved { title, reason } => {
                in_flight = in_flight.saturating_sub(1);
                println!("  - {}: {} ({} left)", title, reason, in_flight);
            }
            ReconcileEvent::Finished(summary) => println!(
                "Done: {} imported, {} not found, {} removed",
                summary.resolved, summary.unresolved, summary.removed
            ),
            ReconcileEvent::Rejected(problem) => println!("Location rejected: {}", problem),
            ReconcileEvent::Aborted(message) => println!("Scan aborted: {}", message),
        }
    }
}

fn report_outcome(outcome: &OnboardingOutcome) -> Result<()> {
    match outcome {
        OnboardingOutcome::Steam(ReconcileOutcome::Completed(summary)) => {
            info!("Steam location {} is now configured", summary.location);
            Ok(())
        }
        OnboardingOutcome::Steam(ReconcileOutcome::Rejected(problem)) => {
            bail!("Steam location not accepted: {}", problem)
        }
        OnboardingOutcome::Steam(ReconcileOutcome::Aborted(message)) => {
            bail!("Steam import failed: {}", message)
        }
        OnboardingOutcome::NotYetSupported(kind) => {
            bail!("{} is not supported yet", kind)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    info!("Starting {} {}", APP_NAME, VERSION);

    let (config, config_path) = load_config(cli.config)?;
    let mut dashboard = Dashboard::open(config, config_path)?;

    match cli.command {
        Commands::List => {
            let catalogue = dashboard.catalogue();
            if catalogue.is_empty() {
                println!("The catalogue is empty");
            }
            for entry in catalogue.entries() {
                match entry.steam_app_id {
                    Some(app_id) => println!("{} [steam {}]", entry.title, app_id),
                    None => println!("{}", entry.title),
                }
                println!("    {}", entry.launch_command);
            }
        }
        Commands::Remove { title } => {
            dashboard
                .remove_game(&title)
                .with_context(|| format!("Failed to remove \"{}\"", title))?;
            println!("Removed {}", title);
        }
        Commands::Launch { title } => {
            let pid = dashboard
                .launch(&title)
                .with_context(|| format!("Failed to launch \"{}\"", title))?;
            println!("Started {} (pid {})", title, pid);
        }
        Commands::Search { query } => {
            let candidates = dashboard.search(&query).await;
            if candidates.is_empty() {
                println!("No results");
            }
            for candidate in candidates {
                println!("{}", candidate.name.as_deref().unwrap_or("<unnamed>"));
                if let Some(cover) = candidate.cover_url {
                    println!("    cover: {}", cover);
                }
            }
        }
        Commands::Onboard { service, location } => {
            let (tx, rx) = mpsc::unbounded_channel();
            dashboard.set_event_channel(tx);
            let printer = tokio::spawn(print_events(rx));

            let outcome = dashboard.onboard(Storefront::new(service, location)).await?;

            // Closes the event channel so the printer can finish
            drop(dashboard);
            printer.await?;
            report_outcome(&outcome)?;
        }
        Commands::Rescan => {
            let (tx, rx) = mpsc::unbounded_channel();
            dashboard.set_event_channel(tx);
            let printer = tokio::spawn(print_events(rx));

            let outcome = dashboard.rescan().await?;

            drop(dashboard);
            printer.await?;
            match outcome {
                Some(outcome) => report_outcome(&OnboardingOutcome::Steam(outcome))?,
                None => println!("No Steam location configured; run `onboard steam <location>` first"),
            }
        }
    }

    Ok(())
}
