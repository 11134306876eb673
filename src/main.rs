//! Fieldops - scheduling API for field service teams
//!
//! Serves the HTTP API over a SQLite or PostgreSQL database and applies
//! schema migrations.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fieldops_api::bootstrap::{ensure_admin, AdminSeed};
use fieldops_api::{ApiServer, ApiServerConfig};
use std::net::SocketAddr;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Fieldops - schedule and track field service visits
#[derive(Parser, Debug)]
#[command(name = "fieldops")]
#[command(about = "Schedule and track field service visits", long_about = None)]
#[command(version = env!("GIT_TAG"))]
#[command(long_version = concat!(env!("GIT_TAG"), "\nCommit: ", env!("GIT_HASH"), "\nBuilt: ", env!("BUILD_TIME")))]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API
    #[command(long_about = r#"
Run the HTTP API. Migrations are applied before the listener opens.

EXAMPLES:
  # Local development with SQLite
  fieldops serve --jwt-secret dev-secret \
    --admin-email admin@example.com --admin-password changeme

  # PostgreSQL behind a reverse proxy
  fieldops serve --bind 0.0.0.0:3001 \
    --database-url postgres://fieldops:secret@db/fieldops \
    --cors-origin https://app.example.com

ENVIRONMENT VARIABLES:
  FIELDOPS_BIND             Address to bind
  DATABASE_URL              Database connection URL
  JWT_SECRET                Secret for signing session tokens
  FIELDOPS_TOKEN_TTL_HOURS  Session token lifetime in hours
  FIELDOPS_CORS_ORIGINS     Allowed origins, comma separated
  FIELDOPS_ADMIN_EMAIL      Administrator to create on start-up
  FIELDOPS_ADMIN_PASSWORD   Its password
  FIELDOPS_ADMIN_NAME       Its display name
    "#)]
    Serve {
        /// Address to bind the API server
        #[arg(long, env = "FIELDOPS_BIND", default_value = "127.0.0.1:3001")]
        bind: SocketAddr,

        /// Database URL (sqlite://... or postgres://...)
        #[arg(long, env = "DATABASE_URL", default_value = "sqlite://./fieldops.db?mode=rwc")]
        database_url: String,

        /// Secret for signing session tokens
        #[arg(long, env = "JWT_SECRET")]
        jwt_secret: String,

        /// Session token lifetime in hours
        #[arg(long, env = "FIELDOPS_TOKEN_TTL_HOURS", default_value = "24")]
        token_ttl_hours: i64,

        /// Allowed CORS origin (repeatable); localhost origins when absent
        #[arg(long = "cors-origin", env = "FIELDOPS_CORS_ORIGINS", value_delimiter = ',')]
        cors_origins: Vec<String>,

        /// Disable CORS headers entirely
        #[arg(long)]
        no_cors: bool,

        /// Email of an administrator to create if missing
        #[arg(long, env = "FIELDOPS_ADMIN_EMAIL", requires = "admin_password")]
        admin_email: Option<String>,

        /// Password for the bootstrap administrator
        #[arg(long, env = "FIELDOPS_ADMIN_PASSWORD", requires = "admin_email")]
        admin_password: Option<String>,

        /// Display name for the bootstrap administrator (defaults to the email prefix)
        #[arg(long, env = "FIELDOPS_ADMIN_NAME")]
        admin_name: Option<String>,
    },
    /// Apply database migrations and exit
    Migrate {
        /// Database URL (sqlite://... or postgres://...)
        #[arg(long, env = "DATABASE_URL", default_value = "sqlite://./fieldops.db?mode=rwc")]
        database_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    match cli.command {
        Commands::Serve {
            bind,
            database_url,
            jwt_secret,
            token_ttl_hours,
            cors_origins,
            no_cors,
            admin_email,
            admin_password,
            admin_name,
        } => {
            if token_ttl_hours <= 0 {
                anyhow::bail!("--token-ttl-hours must be positive");
            }

            let db = fieldops_db::connect(&database_url)
                .await
                .context("Failed to connect to database")?;
            fieldops_db::migrate(&db)
                .await
                .context("Failed to run database migrations")?;

            if let (Some(email), Some(password)) = (admin_email, admin_password) {
                ensure_admin(
                    &db,
                    AdminSeed {
                        email,
                        password,
                        name: admin_name,
                    },
                )
                .await?;
            }

            let config = ApiServerConfig {
                bind_addr: bind,
                enable_cors: !no_cors,
                cors_origins: if cors_origins.is_empty() {
                    None
                } else {
                    Some(cors_origins)
                },
                jwt_secret,
                token_ttl: chrono::Duration::hours(token_ttl_hours),
            };

            if config.cors_origins.is_none() && config.enable_cors {
                warn!("No CORS origins configured; allowing localhost origins only");
            }

            info!("Fieldops {} ({})", env!("GIT_TAG"), env!("GIT_HASH"));
            ApiServer::new(config, db).start().await?;
        }
        Commands::Migrate { database_url } => {
            let db = fieldops_db::connect(&database_url)
                .await
                .context("Failed to connect to database")?;
            fieldops_db::migrate(&db)
                .await
                .context("Failed to run database migrations")?;

            info!("Migrations applied");
        }
    }

    Ok(())
}

fn init_logging(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .context("Failed to initialize logging filter")?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    Ok(())
}
