//! Notification endpoints.

use axum::{extract::State, routing::post, Json, Router};
use campusdesk_common::AppResult;
use campusdesk_db::entities::notification::Model as NotificationModel;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// List notifications request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotificationsRequest {
    /// Maximum results (default: 10, max: 100)
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Cursor for pagination (before this ID)
    pub until_id: Option<String>,
    /// Only unread notifications
    #[serde(default)]
    pub unread_only: bool,
}

const fn default_limit() -> u64 {
    10
}

/// Notifications response with the unread badge count.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationsListResponse {
    pub notifications: Vec<NotificationResponse>,
    pub unread_count: u64,
}

/// Notification response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: String,
    #[serde(rename = "type")]
    pub notification_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complaint_id: Option<String>,
    pub is_read: bool,
    pub created_at: String,
}

impl From<NotificationModel> for NotificationResponse {
    fn from(n: NotificationModel) -> Self {
        Self {
            id: n.id,
            notification_type: n.notification_type.as_str().to_string(),
            message: n.message,
            complaint_id: n.complaint_id,
            is_read: n.is_read,
            created_at: n.created_at.to_rfc3339(),
        }
    }
}

/// Get notifications for the authenticated user.
async fn get_notifications(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListNotificationsRequest>,
) -> AppResult<ApiResponse<NotificationsListResponse>> {
    let limit = req.limit.min(100);

    let notifications = state
        .notification_service
        .list(&user.id, limit, req.until_id.as_deref(), req.unread_only)
        .await?;

    let unread_count = state.notification_service.count_unread(&user.id).await?;

    Ok(ApiResponse::ok(NotificationsListResponse {
        notifications: notifications.into_iter().map(Into::into).collect(),
        unread_count,
    }))
}

/// Mark notification as read request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAsReadRequest {
    pub notification_id: String,
}

/// Mark a notification as read.
async fn mark_as_read(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<MarkAsReadRequest>,
) -> AppResult<ApiResponse<()>> {
    state
        .notification_service
        .mark_as_read(&user.id, &req.notification_id)
        .await?;
    Ok(ApiResponse::ok(()))
}

/// Mark all as read response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAllAsReadResponse {
    pub count: u64,
}

/// Mark all notifications as read.
async fn mark_all_as_read(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<MarkAllAsReadResponse>> {
    let count = state.notification_service.mark_all_as_read(&user.id).await?;
    Ok(ApiResponse::ok(MarkAllAsReadResponse { count }))
}

/// Unread count response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCountResponse {
    pub count: u64,
}

/// Get unread notification count.
async fn unread_count(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<UnreadCountResponse>> {
    let count = state.notification_service.count_unread(&user.id).await?;
    Ok(ApiResponse::ok(UnreadCountResponse { count }))
}

/// Delete notification request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteNotificationRequest {
    pub notification_id: String,
}

/// Delete a notification.
async fn delete_notification(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<DeleteNotificationRequest>,
) -> AppResult<ApiResponse<()>> {
    state
        .notification_service
        .delete(&user.id, &req.notification_id)
        .await?;
    Ok(ApiResponse::ok(()))
}

/// Delete all response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAllResponse {
    pub count: u64,
}

/// Delete all notifications.
async fn delete_all_notifications(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<DeleteAllResponse>> {
    let count = state.notification_service.delete_all(&user.id).await?;
    Ok(ApiResponse::ok(DeleteAllResponse { count }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(get_notifications))
        .route("/mark-as-read", post(mark_as_read))
        .route("/mark-all-as-read", post(mark_all_as_read))
        .route("/unread-count", post(unread_count))
        .route("/delete", post(delete_notification))
        .route("/delete-all", post(delete_all_notifications))
}
