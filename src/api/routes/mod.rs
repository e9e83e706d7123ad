pub mod ai;
pub mod alerts;
pub mod auth;
pub mod groups;
pub mod health;
pub mod reports;
pub mod scanner_assets;
pub mod scanner_users;
pub mod schedules;
pub mod targets;
pub mod tasks;

use axum::Router;
use crate::api::AppState;

/// Every `/scanner/*` route.
pub fn scanner_routes() -> Router<AppState> {
    Router::new()
        .merge(scanner_users::routes())
        .merge(scanner_assets::routes())
        .merge(targets::routes())
        .merge(tasks::routes())
        .merge(reports::routes())
        .merge(schedules::routes())
        .merge(alerts::routes())
}
