//! Webhook receiver: decodes Telegram updates and hands relay events to the
//! single consumer through an mpsc channel.

use std::{future::Future, net::SocketAddr, sync::Arc};

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Router,
};
use teloxide::types::Update;
use tokio::{net::TcpListener, sync::mpsc};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use mb_core::{messaging::types::InboundEvent, Result};

use crate::convert::event_from_update;

pub const SECRET_TOKEN_HEADER: &str = "x-telegram-bot-api-secret-token";

#[derive(Clone)]
struct WebhookState {
    tx: mpsc::UnboundedSender<InboundEvent>,
    secret_token: Option<Arc<str>>,
}

/// Router with the single `POST /` route Telegram delivers to.
pub fn router(tx: mpsc::UnboundedSender<InboundEvent>, secret_token: Option<String>) -> Router {
    let state = WebhookState {
        tx,
        secret_token: secret_token.map(Arc::from),
    };

    Router::new()
        .route("/", post(handle_update))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `app` on all interfaces until `shutdown` resolves.
pub async fn serve(
    port: u16,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "webhook server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("webhook server stopped");
    Ok(())
}

async fn handle_update(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if !secret_matches(&headers, state.secret_token.as_deref()) {
        warn!("rejected webhook call with bad secret token");
        return StatusCode::UNAUTHORIZED;
    }

    // Telegram redelivers anything that is not 2xx, so undecodable bodies are
    // acknowledged and dropped.
    let update: Update = match serde_json::from_slice(&body) {
        Ok(u) => u,
        Err(e) => {
            warn!(error = %e, "dropping undecodable update");
            return StatusCode::OK;
        }
    };

    let Some(event) = event_from_update(&update) else {
        debug!(update_id = ?update.id, "update without relevant message, ignoring");
        return StatusCode::OK;
    };

    if state.tx.send(event).is_err() {
        error!("event consumer is gone");
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    StatusCode::OK
}

fn secret_matches(headers: &HeaderMap, expected: Option<&str>) -> bool {
    let Some(expected) = expected else {
        return true;
    };
    headers
        .get(SECRET_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|provided| provided == expected)
}
