use auctioneer::auction::{run_settlement_sweep, spawn_sweep_loop};
use auctioneer::notify::{emitter_from_config, run_notification_dispatch, spawn_dispatch_loop};
use auctioneer::{api, config::Config, db::init_db, AuctionService, Repository};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "auctioneer")]
#[command(about = "Free-agent auction server for fantasy leagues")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API with the settlement and notification loops (default)
    Serve,
    /// Settle every auction that has closed, then exit
    Sweep,
    /// Send every due notification, then exit
    Dispatch,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let pool = match init_db(&config.database_path).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    let repo = Arc::new(Repository::new(pool));
    let emitter = emitter_from_config(&config);
    let service = AuctionService::new(repo.clone(), config.auction.clone(), emitter.clone());

    match cli.command.unwrap_or(Command::Serve) {
        Command::Sweep => {
            let settled = run_settlement_sweep(&service, Utc::now()).await?;
            tracing::info!("Settled {} nominations", settled);
        }
        Command::Dispatch => {
            let sent = run_notification_dispatch(&repo, emitter.as_ref(), Utc::now()).await?;
            tracing::info!("Sent {} notifications", sent);
        }
        Command::Serve => {
            let sweep = spawn_sweep_loop(
                service.clone(),
                Duration::from_secs(config.sweep_interval_secs),
            );
            let dispatch = spawn_dispatch_loop(
                repo,
                emitter,
                Duration::from_secs(config.dispatch_interval_secs),
            );

            let app = api::create_router(api::AppState::new(service));
            let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Server listening on {}", addr);

            let served = axum::serve(listener, app).await;
            sweep.abort();
            dispatch.abort();
            served?;
        }
    }

    Ok(())
}
