//! Stats endpoints (admin analytics).

use axum::{extract::State, routing::post, Router};
use campusdesk_common::AppResult;
use campusdesk_core::stats::{CategoryCount, DayCount, Overview};

use crate::{extractors::AdminUser, middleware::AppState, response::ApiResponse};

/// Headline counts for the admin's branch.
async fn overview(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Overview>> {
    let overview = state.stats_service.overview(&admin.branch).await?;
    Ok(ApiResponse::ok(overview))
}

/// Per-category counts for the admin's branch.
async fn by_category(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<CategoryCount>>> {
    let counts = state.stats_service.by_category(&admin.branch).await?;
    Ok(ApiResponse::ok(counts))
}

/// Complaints per weekday over the trailing week.
async fn daily(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<DayCount>>> {
    let counts = state.stats_service.daily(&admin.branch).await?;
    Ok(ApiResponse::ok(counts))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/overview", post(overview))
        .route("/by-category", post(by_category))
        .route("/daily", post(daily))
}
