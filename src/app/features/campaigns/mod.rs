mod create;
mod list;
mod logs;
mod send_now;
mod send_test;
pub mod service;
mod show;
pub mod stats;
pub mod types;
mod update;

use axum::Router;

use crate::app::AppState;

/// Campaign routes (CRUD, logs, test send, send-now).
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(list::routes())
        .merge(create::routes())
        .merge(show::routes())
        .merge(update::routes())
        .merge(logs::routes())
        .merge(send_test::routes())
        .merge(send_now::routes())
}
