use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use field_notes::comments::{CommentStore, FileStorage};
use field_notes::config::Config;
use field_notes::db::{self, Database};
use field_notes::web::{self, AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_tracing()?;

    info!("Starting field-notes");

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!(
        database = %config.database_path.display(),
        comments_dir = %config.comments_dir.display(),
        "Configuration loaded"
    );

    if let Some(parent) = config.database_path.parent() {
        tokio::fs::create_dir_all(parent).await.with_context(|| {
            format!("Failed to create database directory: {}", parent.display())
        })?;
    }

    let db = Database::new(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    info!("Database initialized");

    if config.seed_defaults {
        db::seed_defaults(db.pool())
            .await
            .context("Failed to seed default content")?;
    }

    if let Some(admin) = &config.admin {
        db::upsert_admin(db.pool(), &admin.name, &admin.email, &admin.password)
            .await
            .context("Failed to bootstrap admin account")?;
    } else if db::count_users(db.pool()).await? == 0 {
        warn!("No users exist and ADMIN_EMAIL is not set; nobody can moderate posts");
    }

    let purged = db::delete_expired_sessions(db.pool(), &chrono::Utc::now().to_rfc3339()).await?;
    if purged > 0 {
        info!(purged, "Removed expired sessions");
    }

    let storage = FileStorage::new(&config.comments_dir).with_context(|| {
        format!(
            "Failed to open comments directory: {}",
            config.comments_dir.display()
        )
    })?;
    let comments = CommentStore::new(Arc::new(storage));

    let events = comments.subscribe();
    tokio::spawn(log_comment_events(events));

    let state = AppState::new(db, config, comments);
    web::serve(state, shutdown_signal()).await?;

    info!("Shutdown complete");

    Ok(())
}

async fn log_comment_events(
    mut events: tokio::sync::broadcast::Receiver<field_notes::comments::CommentEvent>,
) {
    loop {
        match events.recv().await {
            Ok(event) => debug!(slug = %event.slug, comment_id = ?event.comment_id, "Comments changed"),
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "Comment event log fell behind"),
            Err(RecvError::Closed) => break,
        }
    }
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,field_notes=debug"));

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    if use_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutting down...");
}
