//! REST API server for Meetdesk.
//!
//! Provides HTTP endpoints for:
//! - Account registration, login and token refresh
//! - Meeting CRUD
//! - Meeting status changes with OTP-confirmed completion
//! - Meeting photo uploads

pub mod error;
pub mod routes;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{DefaultBodyLimit, FromRef},
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tracing::info;

use crate::auth::{AccountService, TokenIssuer};
use crate::config::Config;
use crate::db::Database;
use crate::meeting::MeetingService;
use crate::notify::{self, Notifier};

/// Shared state for all routes.
#[derive(Clone)]
pub struct AppState {
    pub meetings: Arc<MeetingService>,
    pub accounts: Arc<AccountService>,
    pub tokens: Arc<TokenIssuer>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(config: &Config, db: Database, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let tokens = Arc::new(TokenIssuer::new(&config.auth));
        let media_dir = config.storage.media_path()?;

        Ok(Self {
            meetings: Arc::new(MeetingService::new(
                db.clone(),
                notifier,
                media_dir,
                &config.otp,
            )),
            accounts: Arc::new(AccountService::new(db, tokens.clone())),
            tokens,
            max_upload_bytes: config.storage.max_upload_bytes,
        })
    }

    /// Open the configured database and pick the notifier from the email config.
    pub fn from_config(config: &Config) -> Result<Self> {
        let db_path = config.storage.db_path()?;
        let db = Database::open(&db_path)
            .with_context(|| format!("Failed to open database at {:?}", db_path))?;
        info!("Using database {:?}", db.path());

        Self::new(config, db, notify::from_config(&config.email))
    }
}

impl FromRef<AppState> for Arc<TokenIssuer> {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        .route("/", get(hello))
        .merge(routes::accounts::router())
        .merge(routes::meetings::router())
        .layer(ServiceBuilder::new().layer(DefaultBodyLimit::max(body_limit)))
        .with_state(state)
}

pub struct ApiServer {
    host: String,
    port: u16,
    state: AppState,
}

impl ApiServer {
    pub fn new(config: &Config, state: AppState) -> Self {
        Self {
            host: config.server.host.clone(),
            port: config.server.port,
            state,
        }
    }

    pub async fn start(self) -> Result<()> {
        let app = build_router(self.state);

        let addr = format!("{}:{}", self.host, self.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;

        info!("API server listening on http://{}", addr);
        info!("Endpoints:");
        info!("  GET    /                              - Service check");
        info!("  POST   /auth/create                   - Register a user");
        info!("  POST   /auth/login                    - Obtain tokens");
        info!("  POST   /auth/refresh                  - Refresh access token");
        info!("  GET    /auth/profile                  - Current user");
        info!("  GET    /meetings                      - List meetings");
        info!("  POST   /meetings                      - Create meeting");
        info!("  GET    /meetings/:uid                 - Get meeting");
        info!("  PUT    /meetings/:uid                 - Update meeting");
        info!("  DELETE /meetings/:uid                 - Delete meeting");
        info!("  POST   /meetings/:uid/mark-in-progress");
        info!("  POST   /meetings/:uid/mark-completed  - Sends OTP, or completes with otp_code");
        info!("  POST   /meetings/:uid/mark-cancelled");
        info!("  POST   /meetings/:uid/generate-otp");
        info!("  POST   /meetings/:uid/verify-otp");
        info!("  POST   /meetings/:uid/upload-photo    - multipart field `file`");

        axum::serve(listener, app).await?;

        Ok(())
    }
}

async fn hello() -> Json<Value> {
    Json(json!({ "message": "Hello World" }))
}
