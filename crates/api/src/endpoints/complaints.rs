//! Complaint endpoints.

use axum::{extract::State, routing::post, Json, Router};
use campusdesk_common::AppResult;
use campusdesk_core::complaint::{available_actions, ComplaintAction};
use campusdesk_db::entities::complaint::{Category, Model as ComplaintModel, Status};
use campusdesk_db::repositories::ComplaintFilter;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    extractors::{AdminUser, AuthUser},
    middleware::AppState,
    response::ApiResponse,
};

const fn default_limit() -> u64 {
    20
}

/// Complaint response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintResponse {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub status: String,
    pub branch: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub score: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_remark: Option<String>,
    /// Admin actions valid in the current status.
    pub available_actions: Vec<String>,
    /// The requesting user's vote, when decorated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_vote: Option<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl From<ComplaintModel> for ComplaintResponse {
    fn from(c: ComplaintModel) -> Self {
        let actions = available_actions(c.status)
            .iter()
            .map(|a| ComplaintAction::as_str(*a).to_string())
            .collect();

        Self {
            id: c.id,
            user_id: c.user_id,
            title: c.title,
            description: c.description,
            category: c.category.as_str().to_string(),
            status: c.status.as_str().to_string(),
            branch: c.branch,
            image_url: c.image_url,
            score: c.score,
            rating: c.rating,
            review_comment: c.review_comment,
            admin_remark: c.admin_remark,
            available_actions: actions,
            my_vote: None,
            created_at: c.created_at.to_rfc3339(),
            updated_at: c.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Create complaint request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateComplaintRequest {
    #[validate(length(min = 1, max = 256))]
    pub title: String,

    #[validate(length(min = 1, max = 8192))]
    pub description: String,

    pub category: Category,

    #[validate(length(max = 512))]
    pub image_url: Option<String>,
}

/// Create complaint response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateComplaintResponse {
    pub complaint: ComplaintResponse,
    /// How many branch admins were notified; zero signals a fan-out failure.
    pub notified_admins: usize,
}

/// File a new complaint under the caller's branch.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateComplaintRequest>,
) -> AppResult<ApiResponse<CreateComplaintResponse>> {
    req.validate()?;

    let input = campusdesk_core::complaint::FileComplaintInput {
        title: req.title,
        description: req.description,
        category: req.category,
        image_url: req.image_url,
    };

    let filed = state.complaint_service.file(&user, input).await?;

    Ok(ApiResponse::ok(CreateComplaintResponse {
        complaint: filed.complaint.into(),
        notified_admins: filed.notified_admins,
    }))
}

/// Update complaint request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateComplaintRequest {
    pub complaint_id: String,

    #[validate(length(min = 1, max = 256))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 8192))]
    pub description: Option<String>,

    pub category: Option<Category>,

    #[validate(length(max = 512))]
    pub image_url: Option<String>,
}

/// Edit an open complaint. Owner only.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateComplaintRequest>,
) -> AppResult<ApiResponse<ComplaintResponse>> {
    req.validate()?;

    let input = campusdesk_core::complaint::EditComplaintInput {
        title: req.title,
        description: req.description,
        category: req.category,
        image_url: req.image_url,
    };

    let updated = state
        .complaint_service
        .edit(&user, &req.complaint_id, input)
        .await?;

    Ok(ApiResponse::ok(updated.into()))
}

/// List complaints request (the branch feed).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListComplaintsRequest {
    pub category: Option<Category>,
    pub status: Option<Status>,
    /// Case-insensitive title search.
    pub search: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub until_id: Option<String>,
}

/// Get the caller's branch feed, decorated with their own votes.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListComplaintsRequest>,
) -> AppResult<ApiResponse<Vec<ComplaintResponse>>> {
    let limit = req.limit.min(100);
    let filter = ComplaintFilter {
        category: req.category,
        status: req.status,
        search: req.search,
    };

    let complaints = state
        .complaint_service
        .list_branch(&user.branch, &filter, limit, req.until_id.as_deref())
        .await?;

    Ok(ApiResponse::ok(
        decorate_with_votes(&state, &user.id, complaints).await?,
    ))
}

/// Show complaint request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowComplaintRequest {
    pub complaint_id: String,
}

/// Get a single complaint.
async fn show(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ShowComplaintRequest>,
) -> AppResult<ApiResponse<ComplaintResponse>> {
    let complaint = state.complaint_service.get(&req.complaint_id).await?;
    let vote = state
        .vote_service
        .vote_on(&user.id, &req.complaint_id)
        .await?;

    let mut response: ComplaintResponse = complaint.into();
    response.my_vote = vote.map(|v| v.vote_type.as_str().to_string());

    Ok(ApiResponse::ok(response))
}

/// History request (the caller's own complaints).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRequest {
    pub status: Option<Status>,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub until_id: Option<String>,
}

/// Get the caller's complaint history.
async fn history(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<HistoryRequest>,
) -> AppResult<ApiResponse<Vec<ComplaintResponse>>> {
    let limit = req.limit.min(100);

    let complaints = state
        .complaint_service
        .list_by_user(&user.id, req.status, limit, req.until_id.as_deref())
        .await?;

    Ok(ApiResponse::ok(
        decorate_with_votes(&state, &user.id, complaints).await?,
    ))
}

async fn decorate_with_votes(
    state: &AppState,
    user_id: &str,
    complaints: Vec<ComplaintModel>,
) -> AppResult<Vec<ComplaintResponse>> {
    let votes = state.vote_service.votes_by_user(user_id).await?;

    Ok(complaints
        .into_iter()
        .map(|c| {
            let my_vote = votes
                .iter()
                .find(|v| v.complaint_id == c.id)
                .map(|v| v.vote_type.as_str().to_string());
            let mut response: ComplaintResponse = c.into();
            response.my_vote = my_vote;
            response
        })
        .collect())
}

/// Start progress request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartProgressRequest {
    pub complaint_id: String,
}

/// Move an open complaint to in progress. Branch admins only.
async fn start_progress(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<StartProgressRequest>,
) -> AppResult<ApiResponse<ComplaintResponse>> {
    let updated = state
        .complaint_service
        .start_progress(&admin, &req.complaint_id)
        .await?;

    Ok(ApiResponse::ok(updated.into()))
}

/// Resolve request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    pub complaint_id: String,

    #[validate(length(max = 8192))]
    pub remark: Option<String>,
}

/// Resolve an in-progress complaint. Branch admins only.
async fn resolve(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<ResolveRequest>,
) -> AppResult<ApiResponse<ComplaintResponse>> {
    req.validate()?;

    let updated = state
        .complaint_service
        .resolve(&admin, &req.complaint_id, req.remark)
        .await?;

    Ok(ApiResponse::ok(updated.into()))
}

/// Review request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub complaint_id: String,

    #[validate(range(min = 1, max = 5))]
    pub rating: i32,

    #[validate(length(max = 8192))]
    pub comment: Option<String>,
}

/// Rate a resolved complaint. Owner only.
async fn review(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ReviewRequest>,
) -> AppResult<ApiResponse<ComplaintResponse>> {
    req.validate()?;

    let updated = state
        .complaint_service
        .review(&user, &req.complaint_id, req.rating, req.comment)
        .await?;

    Ok(ApiResponse::ok(updated.into()))
}

/// Remove complaint request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveComplaintRequest {
    pub complaint_id: String,
}

/// Remove a complaint. Branch admins only.
async fn remove(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<RemoveComplaintRequest>,
) -> AppResult<ApiResponse<()>> {
    state
        .complaint_service
        .remove(&admin, &req.complaint_id)
        .await?;

    Ok(ApiResponse::ok(()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create))
        .route("/update", post(update))
        .route("/list", post(list))
        .route("/show", post(show))
        .route("/history", post(history))
        .route("/start-progress", post(start_progress))
        .route("/resolve", post(resolve))
        .route("/review", post(review))
        .route("/remove", post(remove))
}
