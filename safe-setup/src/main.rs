//! Seeds the periodic tasks and Safe contract addresses the transaction
//! service indexer needs. Safe to run on every deploy.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use safe_setup::{
    bootstrap, networks, Config, ConfigError, PostgresRepo, RegistryKind, Report, SafeSetupError,
    Setup, DEFAULT_NETWORK_LOOKUP_TIMEOUT_MS,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "safe-setup")]
#[command(about = "Seed periodic tasks and Safe contract addresses for the transaction indexer")]
#[command(version)]
struct Cli {
    /// Postgres database holding the indexer's tables
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,

    /// JSON-RPC endpoint used to detect the connected network
    #[arg(long, env = "ETHEREUM_NODE_URL", default_value = "http://localhost:8545")]
    ethereum_node_url: String,

    /// TOML file with [[schedules]] and [[networks]] replacing the built-in catalog
    #[arg(long, env = "SAFE_SETUP_CATALOG")]
    catalog: Option<PathBuf>,

    /// How long to wait for the node to report its chain id
    #[arg(long, env = "SAFE_SETUP_NETWORK_LOOKUP_TIMEOUT_MS", default_value_t = DEFAULT_NETWORK_LOOKUP_TIMEOUT_MS)]
    network_lookup_timeout_ms: u64,

    /// Do not create missing tables before seeding
    #[arg(long)]
    skip_migrations: bool,

    /// Print the schedules and catalog that would be seeded, then exit
    #[arg(long)]
    list: bool,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Used when RUST_LOG is not set
    #[arg(long, env = "SAFE_SETUP_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), SafeSetupError> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let setup = match &cli.catalog {
        Some(path) => Setup::from_file(path)?,
        None => Setup::builtin()?,
    };

    if cli.list {
        print_setup(&setup);

        return Ok(());
    }

    let database_url = cli.database_url.as_deref().ok_or(ConfigError::MissingDatabaseUrl)?;
    let repo = PostgresRepo::new(database_url).await?;
    let provider = networks::get(&cli.ethereum_node_url)?;

    let mut config = Config::new(repo, provider)
        .with_setup(setup)
        .with_network_lookup_timeout_ms(cli.network_lookup_timeout_ms);
    if cli.skip_migrations {
        config = config.skip_migrations();
    }

    let report = bootstrap::run(&config).await;
    print_report(&report, cli.format);

    // Partial failures are in the report. Bootstrap is meant to be re-run, so
    // they do not change the exit code.
    info!(
        failures = report.failures().len(),
        warnings = report.warnings().len(),
        "Setup finished"
    );

    Ok(())
}

fn print_report(report: &Report, format: Format) {
    match format {
        Format::Text => print!("{report}"),
        Format::Json => match serde_json::to_string_pretty(report) {
            Ok(json) => println!("{json}"),
            Err(error) => eprintln!("could not serialize report: {error}"),
        },
    }
}

fn print_setup(Setup { schedules, catalog }: &Setup) {
    for schedule in schedules {
        println!(
            "periodic task {} ({}) every {} {}",
            schedule.name, schedule.description, schedule.interval, schedule.period
        );
    }

    for (network_id, contracts) in catalog.iter() {
        for kind in [RegistryKind::MasterCopy, RegistryKind::ProxyFactory] {
            for entry in contracts.get_entries(kind) {
                println!("{network_id}: {kind} {entry}");
            }
        }
    }
}
