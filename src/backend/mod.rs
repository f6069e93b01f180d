pub mod auth;
pub mod extract;
mod handlers;
mod routes;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::backend::auth::TokenSigner;
use crate::sacco::Sacco;

#[derive(Clone)]
pub struct AppState {
    pub sacco: Sacco,
    pub tokens: TokenSigner,
}

impl AppState {
    pub fn new(sacco: Sacco) -> Self {
        let config = sacco.config();
        let tokens = TokenSigner::new(&config.auth_secret, config.token_ttl);
        Self { sacco, tokens }
    }
}

/// Full HTTP surface with state attached.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "Backend is running" }))
        .merge(routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(sacco: Sacco) -> anyhow::Result<()> {
    let addr = sacco.config().bind_addr;
    let app = app(AppState::new(sacco));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
