//! sessiongate - session-based authentication gateway

use clap::Parser;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sessiongate::{
    auth::TokenIssuer,
    config::Args,
    db::{MongoClient, MongoUserRepository},
    server::{self, AppState},
    session::{spawn_sweep_task, MongoSessionStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let dotenv = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("sessiongate={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match dotenv {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) => info!("No .env file loaded ({}), using process environment", e),
    }

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  sessiongate");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("MongoDB database: {}", args.mongodb_db);
    info!("Token TTL: {}s", args.token_ttl_secs);
    info!("======================================");

    let keys = args.signing_keys()?;
    info!(
        "Signing with key '{}' ({} verification keys)",
        keys.current().kid(),
        keys.verification_keys().count()
    );
    let tokens = TokenIssuer::new(Arc::new(keys), args.token_ttl());

    // Connect to MongoDB (in-memory fallback in dev mode)
    let state = match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
        Ok(client) => {
            info!("MongoDB connected successfully");
            let users = MongoUserRepository::new(&client).await?;
            let sessions = MongoSessionStore::new(&client).await?;
            AppState::new(args, Arc::new(users), Arc::new(sessions), tokens)
        }
        Err(e) if args.dev_mode => {
            warn!(
                "MongoDB connection failed (dev mode, using in-memory stores): {}",
                e
            );
            let interval = args.session_sweep_interval();
            let (state, sessions) = AppState::in_memory(args, tokens);
            spawn_sweep_task(sessions, interval);
            state
        }
        Err(e) => {
            error!("MongoDB connection failed: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server::run(Arc::new(state)).await {
        error!("Server error: {:?}", e);
        std::process::exit(1);
    }

    Ok(())
}
