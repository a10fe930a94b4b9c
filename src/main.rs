use std::sync::Arc;

use anyhow::Context;
use axum::{debug_handler, routing::get, Router};
use cohortroom::{
    auth::{self, LinkedIn},
    chat::RocketClient,
    config::Config,
    crawl::PhantomClient,
    db::SqliteStore,
    users, AppState,
};
use tower_http::cors::CorsLayer;
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::from_env()?;

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::hours(12)));

    let store = SqliteStore::connect(&config.database_url)
        .await
        .context("opening database")?;

    let chat = RocketClient::new(&config.chat);
    chat.init().await.context("logging in to rocket.chat")?;

    let app_state = AppState {
        store,
        crawler: Arc::new(PhantomClient::new(&config.crawl)),
        chat: Arc::new(chat),
        chat_settings: Arc::new(config.chat.clone()),
        linkedin: LinkedIn::new(&config.linkedin).context("building linkedin client")?,
    };

    let app = Router::new()
        .route("/healthcheck", get(healthcheck))
        .route("/ping", get(ping))

        .merge(auth::router())
        .nest("/user", users::router())

        .with_state(app_state)
        .layer(session_layer)
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

#[debug_handler]
async fn healthcheck() -> &'static str {
    "ok"
}

#[debug_handler]
async fn ping() -> &'static str {
    "pong"
}
