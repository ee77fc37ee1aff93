//! askweb: web search answered by a language model
//!
//! This is the main entry point for the application.

use anyhow::{Context, Result};
use askweb::{
    auth::SessionTokens,
    config::{self, Settings},
    network::HttpClient,
    store::{Plan, SqliteStore, UserStore},
    web::{create_router, AppState},
};
use clap::{Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Lifetime of tokens printed by `create-user`
const ISSUED_TOKEN_DAYS: i64 = 30;

/// Web search answered by a language model
#[derive(Parser)]
#[command(name = "askweb", version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to settings.yml
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default if no command specified)
    Serve,
    /// Register a user and print a signed session token
    CreateUser {
        /// Plan tier that sets the usage limit
        #[arg(long, value_enum, default_value_t = PlanArg::Free)]
        plan: PlanArg,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum PlanArg {
    Free,
    Paid,
}

impl From<PlanArg> for Plan {
    fn from(plan: PlanArg) -> Self {
        match plan {
            PlanArg::Free => Plan::Free,
            PlanArg::Paid => Plan::Paid,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = config::load(cli.config)?;
    init_logging(&settings);
    info!("Loaded configuration for instance: {}", settings.general.instance_name);

    let store = SqliteStore::connect(&settings.database)
        .await
        .with_context(|| format!("failed to open database {}", settings.database.url))?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(settings, store).await,
        Commands::CreateUser { plan } => create_user(&settings, &store, plan.into()).await,
    }
}

fn init_logging(settings: &Settings) {
    let default_level = if settings.general.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn serve(settings: Settings, store: SqliteStore) -> Result<()> {
    info!("Starting askweb v{}", askweb::VERSION);

    if settings.search_provider.api_key.is_none() {
        warn!("TAVILY_API_KEY is not set; searches will fail");
    }
    if settings.completion_provider.api_key.is_none() {
        warn!("MISTRAL_API_KEY is not set; searches will fail");
    }

    // Initialize HTTP client
    let client = HttpClient::with_settings(&settings.outgoing)?;
    info!("HTTP client initialized");

    let addr = SocketAddr::new(
        settings.server.bind_address.parse()?,
        settings.server.port,
    );

    // Create application state
    let state = AppState::new(settings, Arc::new(store), client)?;
    let app = create_router(state);

    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn create_user(settings: &Settings, store: &SqliteStore, plan: Plan) -> Result<()> {
    let limit = match plan {
        Plan::Free => settings.plans.free_limit,
        Plan::Paid => settings.plans.paid_limit,
    };
    let tokens = SessionTokens::new(
        settings.server.session_secret()?,
        &settings.server.session_cookie,
    )
    .map_err(|e| anyhow::anyhow!("invalid session secret: {}", e))?;

    let user = store.create_user(plan, limit).await?;
    let token = tokens.issue_for(&user.id, chrono::Duration::days(ISSUED_TOKEN_DAYS));

    println!("user:  {} ({}, limit {})", user.id, user.plan, user.usage_limit);
    println!("token: {}", token);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_serve_is_the_default() {
        let cli = Cli::try_parse_from(["askweb", "-c", "settings.yml"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config, Some(PathBuf::from("settings.yml")));
    }

    #[test]
    fn test_create_user_plan() {
        let cli = Cli::try_parse_from(["askweb", "create-user", "--plan", "paid", "--config", "a.yml"])
            .unwrap();
        match cli.command {
            Some(Commands::CreateUser { plan }) => assert_eq!(Plan::from(plan), Plan::Paid),
            _ => panic!("expected create-user"),
        }
        assert_eq!(cli.config, Some(PathBuf::from("a.yml")));

        let cli = Cli::try_parse_from(["askweb", "create-user"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::CreateUser { plan: PlanArg::Free })
        ));
    }

    #[test]
    fn test_bad_arguments_are_rejected() {
        assert!(Cli::try_parse_from(["askweb", "--plan", "paid"]).is_err());
        assert!(Cli::try_parse_from(["askweb", "create-user", "--plan", "gold"]).is_err());
        assert!(Cli::try_parse_from(["askweb", "bogus"]).is_err());
    }
}
