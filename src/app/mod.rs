use std::sync::Arc;

use axum::Router;
use sqlx::SqlitePool;

use credentials::PasswordDecryptor;
use dispatch::{Dispatcher, SqliteCampaignStore};
use mail::DeliveryAdapter;
use sessions::SendSessionRegistry;

/// Human-readable application name, used in logs.
pub const APP_NAME: &str = "Mailgo";

/// Shared state available to all handlers via Axum's state extractor.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub delivery: Arc<dyn DeliveryAdapter>,
    pub sessions: SendSessionRegistry,
    pub decryptor: Arc<dyn PasswordDecryptor>,
    pub config: config::Config,
}

impl AppState {
    /// Dispatcher sharing this state's pool, sessions and delivery adapter.
    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(
            Arc::new(SqliteCampaignStore::new(self.db.clone())),
            self.sessions.clone(),
            self.delivery.clone(),
            self.config.dispatch.clone(),
        )
    }
}

/// API routes (campaigns, recipients, keys, health).
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(features::campaigns::routes())
        .merge(features::recipients::routes())
        .merge(features::keys::routes())
        .merge(features::health::routes())
}

pub mod config;
pub mod credentials;
pub mod db;
pub mod dispatch;
pub mod domain;
pub mod error;
pub mod features;
pub mod mail;
pub mod sessions;
pub mod single_writer;
