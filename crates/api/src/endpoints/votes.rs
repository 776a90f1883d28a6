//! Vote endpoints.

use axum::{extract::State, routing::post, Json, Router};
use campusdesk_common::AppResult;
use campusdesk_db::entities::vote::VoteType;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Cast vote request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastVoteRequest {
    pub complaint_id: String,
    pub vote_type: VoteType,
}

/// Cast vote response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CastVoteResponse {
    pub complaint_id: String,
    /// The caller's vote after the cast; absent when it was a retraction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_vote: Option<String>,
    /// Score delta that was applied atomically.
    pub delta: i32,
    /// Score as seen by this request.
    pub score: i32,
}

/// Cast, flip or retract a vote on a complaint.
///
/// Casting the direction you already voted retracts it; casting the
/// opposite direction flips it.
async fn cast(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CastVoteRequest>,
) -> AppResult<ApiResponse<CastVoteResponse>> {
    let result = state
        .vote_service
        .cast(&user.id, &req.complaint_id, req.vote_type)
        .await?;

    Ok(ApiResponse::ok(CastVoteResponse {
        complaint_id: req.complaint_id,
        my_vote: result.vote.map(|v| v.as_str().to_string()),
        delta: result.delta,
        score: result.score,
    }))
}

/// Vote response for listings.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub id: String,
    pub complaint_id: String,
    pub vote_type: String,
    pub created_at: String,
}

/// Get all votes the caller has cast.
async fn mine(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<VoteResponse>>> {
    let votes = state.vote_service.votes_by_user(&user.id).await?;

    Ok(ApiResponse::ok(
        votes
            .into_iter()
            .map(|v| VoteResponse {
                id: v.id,
                complaint_id: v.complaint_id,
                vote_type: v.vote_type.as_str().to_string(),
                created_at: v.created_at.to_rfc3339(),
            })
            .collect(),
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cast", post(cast))
        .route("/mine", post(mine))
}
