//! pullreq CLI - reviewer assignment server and admin commands

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pullreq_core::{Config, LogFormat};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{PrArgs, ServeArgs, TeamArgs, UserArgs};

/// pullreq: automatic reviewer assignment for pull requests
#[derive(Parser, Debug)]
#[command(name = "pullreq")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.config/pullreq/config.toml)
    #[arg(short, long, global = true, env = "PULLREQ_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file (overrides config and env)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API
    Serve(ServeArgs),

    /// Manage teams
    Team(TeamArgs),

    /// Manage users
    User(UserArgs),

    /// Create, merge and reassign pull requests
    Pr(PrArgs),

    /// Show current configuration
    Config,

    /// Show version information
    Version,
}

fn init_tracing(config: &Config, verbose: bool) {
    let level = if verbose { "debug" } else { config.log_level() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format() {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Text => registry.with(fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let port = match &cli.command {
        Some(Commands::Serve(args)) => args.port,
        _ => None,
    };
    let config = Config::load_with_overrides(cli.config.as_deref(), cli.database.clone(), port)?;

    init_tracing(&config, cli.verbose);
    tracing::debug!(
        env = %config.env,
        database = %config.database.path.display(),
        reviewer_count = config.app.reviewer_count,
        "Configuration loaded"
    );

    match cli.command {
        Some(Commands::Serve(args)) => args.execute(&config).await?,
        Some(Commands::Team(args)) => args.execute(&config).await?,
        Some(Commands::User(args)) => args.execute(&config).await?,
        Some(Commands::Pr(args)) => args.execute(&config).await?,
        Some(Commands::Config) => print_config(&config, cli.config.as_deref()),
        Some(Commands::Version) => {
            println!("pullreq {}", env!("CARGO_PKG_VERSION"));
        }
        None => {
            println!("pullreq - automatic reviewer assignment for pull requests");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(())
}

fn print_config(config: &Config, explicit: Option<&std::path::Path>) {
    println!("pullreq Configuration");
    println!("=====================");
    println!();
    println!("Environment: {}", config.env);
    println!();
    println!("Server:");
    println!("  address: {}", config.server.bind_address());
    println!(
        "  request_timeout: {}s",
        config.server.request_timeout.as_secs()
    );
    println!();
    println!("Database:");
    println!("  path: {}", config.database.path.display());
    println!("  max_connections: {}", config.database.max_connections);
    println!();
    println!("Logging:");
    println!("  level: {}", config.log_level());
    println!("  format: {:?}", config.log_format());
    println!();
    println!("Reviewer Assignment:");
    println!("  reviewer_count: {}", config.app.reviewer_count);
    match config.app.random_seed {
        Some(seed) if seed != 0 => println!("  random_seed: {}", seed),
        _ => println!("  random_seed: (clock)"),
    }
    println!();

    let path = explicit
        .map(|p| p.to_path_buf())
        .or_else(Config::default_config_path);
    if let Some(path) = path {
        println!("Config file: {}", path.display());
        if path.exists() {
            println!("  (exists)");
        } else {
            println!("  (not found - using defaults)");
        }
    }
}
