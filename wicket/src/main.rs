use clap::Parser;
use tracing_subscriber::EnvFilter;
use wicket::sqlite::SqliteBackend;

/// Maintenance commands for a wicket SQLite database
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(clap::Subcommand)]
enum Commands {
    /// Create the wicket tables
    Migrate {
        /// Database connection string
        #[arg(long, env = "DATABASE_URL")]
        db_url: String,
    },
    /// Delete expired sessions, tickets and pending authorizations
    Purge {
        /// Database connection string
        #[arg(long, env = "DATABASE_URL")]
        db_url: String,
    },
    /// Print version information
    Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Migrate { db_url } => {
            let backend = SqliteBackend::connect(&db_url).await?;
            backend.migrate().await?;
            println!("Migrations applied");
        }
        Commands::Purge { db_url } => {
            let backend = SqliteBackend::connect(&db_url).await?;
            let store = backend.token_store();
            let removed = wicket::TokenStore::purge_expired(store.as_ref()).await?;
            println!("Removed {removed} expired records");
        }
        Commands::Version => {
            println!("wicket v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
