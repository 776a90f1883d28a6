//! API endpoints.

mod account;
mod auth;
mod complaints;
mod meta;
mod notifications;
mod stats;
mod team;
mod uploads;
mod votes;

use axum::Router;

use crate::middleware::AppState;
use crate::sse;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .nest("/meta", meta::router())
        .nest("/i", account::router())
        .nest("/complaints", complaints::router())
        .nest("/complaints/votes", votes::router())
        .nest("/notifications", notifications::router())
        .nest("/uploads", uploads::router())
        .nest("/admin/team", team::router())
        .nest("/stats", stats::router())
        .nest("/streaming/sse", sse::router())
}
