//! Account endpoints for the signed-in user.

use axum::{extract::State, routing::post, Json, Router};
use campusdesk_common::AppResult;
use campusdesk_db::entities::{user, user_profile};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Profile response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: String,
    pub email: String,
    pub role: String,
    pub full_name: String,
    pub branch: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_number: Option<String>,
    pub created_at: String,
}

impl ProfileResponse {
    fn from_parts(user: user::Model, profile: &user_profile::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role.as_str().to_string(),
            full_name: user.full_name,
            branch: user.branch,
            avatar_url: user.avatar_url,
            contact_number: profile.contact_number.clone(),
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Get the signed-in user's profile.
async fn me(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<ProfileResponse>> {
    let (user, profile) = state.account_service.get_with_profile(&user.id).await?;
    Ok(ApiResponse::ok(ProfileResponse::from_parts(user, &profile)))
}

/// Update profile request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 256))]
    pub full_name: Option<String>,

    #[validate(length(min = 1, max = 64))]
    pub branch: Option<String>,

    #[validate(length(max = 512))]
    pub avatar_url: Option<String>,

    #[validate(length(max = 32))]
    pub contact_number: Option<String>,
}

/// Update the signed-in user's profile.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateProfileRequest>,
) -> AppResult<ApiResponse<ProfileResponse>> {
    req.validate()?;

    let input = campusdesk_core::account::UpdateAccountInput {
        full_name: req.full_name,
        branch: req.branch,
        avatar_url: req.avatar_url,
        contact_number: req.contact_number,
    };

    state.account_service.update(&user.id, input).await?;
    let (user, profile) = state.account_service.get_with_profile(&user.id).await?;

    Ok(ApiResponse::ok(ProfileResponse::from_parts(user, &profile)))
}

/// Change password request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Change password response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordResponse {
    pub ok: bool,
}

/// Change the signed-in user's password.
async fn change_password(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ChangePasswordRequest>,
) -> AppResult<ApiResponse<ChangePasswordResponse>> {
    state
        .account_service
        .change_password(&user.id, &req.current_password, &req.new_password)
        .await?;

    Ok(ApiResponse::ok(ChangePasswordResponse { ok: true }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(me))
        .route("/update", post(update))
        .route("/change-password", post(change_password))
}
