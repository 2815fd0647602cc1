//! Alfred AI - chat assistant API
//!
//! General chat grounded in the conversation so far, document chat grounded
//! in an uploaded PDF, and a small analysis pipeline over the same document:
//! named entities, keyword search and sentiment.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod analysis;
mod config;
mod conversation;
mod core;
mod document;
mod providers;
mod routes;

use analysis::DocumentAnalyzer;
use config::Config;
use crate::core::{ChatEngine, Session};
use providers::{ChatEndpointClient, CompletionClient};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub chat_engine: Arc<ChatEngine>,
    pub analyzer: Arc<DocumentAnalyzer>,
    pub session: Arc<Mutex<Session>>,
}

impl AppState {
    pub fn new(config: &Config, client: Arc<dyn CompletionClient>) -> Self {
        let session = Session::new(config);
        Self {
            chat_engine: Arc::new(ChatEngine::new(client)),
            analyzer: Arc::new(DocumentAnalyzer::default()),
            session: Arc::new(Mutex::new(session)),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "alfred_ai=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let client = Arc::new(ChatEndpointClient::from_settings(&config.completion)?);
    tracing::info!(
        "🔌 Completion endpoint {} (timeout {}s, tone {})",
        config.completion.api_url,
        config.completion.timeout_secs,
        config.tone
    );

    let state = AppState::new(&config, client);

    let app = Router::new()
        .merge(routes::router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("🎩 Alfred AI running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
