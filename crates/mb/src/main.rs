use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use mb_core::{config::Config, reconcile::reconcile, relay::Relay};
use mb_postgres::PgChatRegistry;
use mb_telegram::{webhook, TelegramPlatform};

#[tokio::main]
async fn main() -> Result<(), mb_core::Error> {
    mb_core::logging::init("mb")?;

    let cfg = Config::load()?;

    let platform = Arc::new(TelegramPlatform::from_token(cfg.bot_token.clone()));
    let registry = Arc::new(
        PgChatRegistry::connect(&cfg.database_url, cfg.database_max_connections).await?,
    );
    info!("database connected");

    reconcile(registry.as_ref(), platform.as_ref()).await?;

    let identity = platform.identity(&cfg.bot_display_name).await;
    platform
        .register_webhook(cfg.webhook_url.clone(), cfg.webhook_secret.as_deref())
        .await?;

    if cfg.admin_user_ids.is_empty() {
        warn!("ADMIN_USER_IDS is not set, any private chat can broadcast");
    }
    let relay = Relay::new(registry.clone(), platform, identity).with_admins(cfg.admin_user_ids);

    // The router owns the only sender; the event loop ends once the server stops.
    let (tx, rx) = mpsc::unbounded_channel();
    let app = webhook::router(tx, cfg.webhook_secret);
    let server = tokio::spawn(webhook::serve(cfg.port, app, shutdown_signal()));

    mb_core::relay::run_event_loop(&relay, rx).await;

    let served = server
        .await
        .map_err(|e| mb_core::Error::Io(std::io::Error::other(format!("server task failed: {e}"))));
    registry.close().await;
    served??;

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
