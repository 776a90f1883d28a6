//! Team management endpoints (super admin only).

use axum::{extract::State, routing::post, Json, Router};
use campusdesk_common::AppResult;
use campusdesk_db::entities::user::Model as UserModel;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{extractors::AdminUser, middleware::AppState, response::ApiResponse};

/// Admin listing entry.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminResponse {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub branch: String,
    pub is_super_admin: bool,
}

fn to_admin_response(state: &AppState, user: UserModel) -> AdminResponse {
    let is_super_admin = state
        .account_service
        .policy()
        .is_super_admin(&user.email);

    AdminResponse {
        id: user.id,
        email: user.email,
        full_name: user.full_name,
        branch: user.branch,
        is_super_admin,
    }
}

/// List all admins, ordered by branch.
async fn list(
    AdminUser(actor): AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<AdminResponse>>> {
    let admins = state.team_service.list_admins(&actor).await?;

    Ok(ApiResponse::ok(
        admins
            .into_iter()
            .map(|a| to_admin_response(&state, a))
            .collect(),
    ))
}

/// Allocate admin request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AllocateAdminRequest {
    #[validate(length(min = 1, max = 256))]
    pub full_name: String,

    #[validate(email, length(max = 256))]
    pub email: String,

    #[validate(length(min = 1, max = 64))]
    pub branch: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Allocate a new branch admin.
async fn allocate(
    AdminUser(actor): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<AllocateAdminRequest>,
) -> AppResult<ApiResponse<AdminResponse>> {
    req.validate()?;

    let input = campusdesk_core::team::AllocateAdminInput {
        full_name: req.full_name,
        email: req.email,
        branch: req.branch,
        password: req.password,
    };

    let admin = state.team_service.allocate(&actor, input).await?;

    Ok(ApiResponse::ok(to_admin_response(&state, admin)))
}

/// Update admin request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAdminRequest {
    pub admin_id: String,

    #[validate(length(min = 1, max = 256))]
    pub full_name: Option<String>,

    #[validate(length(min = 1, max = 64))]
    pub branch: Option<String>,
}

/// Update a branch admin's name or branch.
async fn update(
    AdminUser(actor): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateAdminRequest>,
) -> AppResult<ApiResponse<AdminResponse>> {
    req.validate()?;

    let input = campusdesk_core::team::UpdateAdminInput {
        full_name: req.full_name,
        branch: req.branch,
    };

    let admin = state
        .team_service
        .update(&actor, &req.admin_id, input)
        .await?;

    Ok(ApiResponse::ok(to_admin_response(&state, admin)))
}

/// Remove admin request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveAdminRequest {
    pub admin_id: String,
}

/// Remove a branch admin.
async fn remove(
    AdminUser(actor): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<RemoveAdminRequest>,
) -> AppResult<ApiResponse<()>> {
    state.team_service.remove(&actor, &req.admin_id).await?;
    Ok(ApiResponse::ok(()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/list", post(list))
        .route("/allocate", post(allocate))
        .route("/update", post(update))
        .route("/remove", post(remove))
}
