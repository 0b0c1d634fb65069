use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tavola_restaurant_service::{
    RestaurantService,
    accounts::{TokenKeys, register},
    store::{MemoryStore, PgStore, Store},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod flash;
mod handlers;
mod session;
mod views;

use config::Config;
use handlers::{AppState, router};

#[derive(Parser)]
#[command(version, about = "Restaurant and menu catalogue")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the web server.
    Serve {
        /// Address to listen on; overrides LISTEN_ADDR.
        #[arg(long)]
        listen: Option<SocketAddr>,
        /// Keep all data in memory instead of PostgreSQL.
        #[arg(long)]
        in_memory: bool,
    },
    /// Apply pending database migrations.
    Migrate,
    /// Register a user account.
    CreateUser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
}

fn open_database(config: &Config) -> Result<PgStore, Box<dyn std::error::Error>> {
    let store = PgStore::new(config.database_url()?);
    let applied = store.run_migrations()?;
    info!(applied, "database ready");
    Ok(store)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Serve { listen, in_memory } => {
            let store: Arc<dyn Store> = if in_memory {
                info!("using in-memory store");
                Arc::new(MemoryStore::new())
            } else {
                Arc::new(open_database(&config)?)
            };
            let state = AppState {
                service: RestaurantService::new(store),
                tokens: Arc::new(TokenKeys::new(
                    config.secret_key()?,
                    config.session_lifetime,
                )),
            };

            let listener =
                tokio::net::TcpListener::bind(listen.unwrap_or(config.listen_addr)).await?;
            info!("Restaurant System listening on {}", listener.local_addr()?);

            axum::serve(listener, router(state)).await?;
        }
        Commands::Migrate => {
            open_database(&config)?;
        }
        Commands::CreateUser { username, password } => {
            let store = open_database(&config)?;
            register(&store, &username, &password)?;
        }
    }

    Ok(())
}
