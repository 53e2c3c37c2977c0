mod import;
mod list;

pub use import::{plan_import, ImportResult, ImportRow};

use axum::Router;

use crate::app::AppState;

/// Recipient ledger routes (list, import).
pub fn routes() -> Router<AppState> {
    Router::new().merge(list::routes()).merge(import::routes())
}
