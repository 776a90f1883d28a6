//! Portal metadata endpoint.

use axum::{extract::State, routing::get, Router};
use campusdesk_common::AppResult;
use campusdesk_db::entities::complaint::{Category, Status};
use serde::Serialize;

use crate::{middleware::AppState, response::ApiResponse};

/// Portal metadata: the vocabulary clients render pickers from.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaResponse {
    pub name: String,
    pub branches: Vec<String>,
    pub categories: Vec<&'static str>,
    pub statuses: Vec<&'static str>,
}

/// Get portal metadata.
async fn meta(State(state): State<AppState>) -> AppResult<ApiResponse<MetaResponse>> {
    Ok(ApiResponse::ok(MetaResponse {
        name: state.portal.name.clone(),
        branches: state.portal.branches.clone(),
        categories: Category::ALL.iter().map(|c| c.as_str()).collect(),
        statuses: Status::ALL.iter().map(|s| s.as_str()).collect(),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(meta))
}
