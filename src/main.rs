use anyhow::{Context, Result};
use check_balance::{
    config::{Config, DEFAULT_CONFIG_PATH},
    db::DatabaseManager,
    logging, server,
    service::BudgetService,
    storage::{DatabaseStorage, InMemoryStorage, Storage},
};
use clap::{Parser, Subcommand};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "check_balance")]
#[command(about = "Personal budget tracking GraphQL API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Port to run the server on (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,
        /// Keep all data in memory instead of the SQLite database
        #[arg(long)]
        in_memory: bool,
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },
    /// Create or update the database schema and exit
    Migrate {
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },
}

fn open_database(config: &Config) -> Result<Arc<DatabaseManager>> {
    let db = DatabaseManager::open(&config.database.path)
        .with_context(|| format!("opening database '{}'", config.database.path))?;
    db.run_migrations().context("running migrations")?;
    Ok(Arc::new(db))
}

fn create_storage(config: &Config, in_memory: bool) -> Result<Arc<dyn Storage>> {
    if in_memory {
        info!("Using in-memory storage");
        Ok(Arc::new(InMemoryStorage::new()))
    } else {
        info!("Initializing database storage...");
        let db = open_database(config)?;
        Ok(Arc::new(DatabaseStorage::new(db)))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let _log_guard = logging::init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            port,
            in_memory,
            config,
        } => {
            let mut config = Config::load_from(&config).context("loading configuration")?;
            if let Some(port) = port {
                config.server.port = port;
            }
            if config.uses_development_secret() {
                warn!("Using the built-in development JWT secret; set CHECK_BALANCE_JWT_SECRET in production");
            }

            let storage = create_storage(&config, in_memory)?;
            let service = BudgetService::from_config(storage, &config.auth);

            let host: IpAddr = config
                .server
                .host
                .parse()
                .with_context(|| format!("invalid server host '{}'", config.server.host))?;
            server::start_server(service, SocketAddr::new(host, config.server.port)).await
        }
        Commands::Migrate { config } => {
            let config = Config::load_from(&config).context("loading configuration")?;
            open_database(&config)?;
            info!("Database at {} is up to date", config.database.path);
            Ok(())
        }
    }
}
