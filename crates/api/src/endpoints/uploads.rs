//! Upload endpoints for evidence images and avatars.

use axum::{
    extract::{Multipart, State},
    routing::post,
    Json, Router,
};
use campusdesk_common::AppResult;
use campusdesk_core::upload::UploadInput;
use campusdesk_db::entities::upload::Model as UploadModel;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Upload response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub size: i64,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blurhash: Option<String>,
    pub created_at: String,
}

impl From<UploadModel> for UploadResponse {
    fn from(u: UploadModel) -> Self {
        Self {
            id: u.id,
            name: u.name,
            content_type: u.content_type,
            size: u.size,
            url: u.url,
            width: u.width,
            height: u.height,
            blurhash: u.blurhash,
            created_at: u.created_at.to_rfc3339(),
        }
    }
}

/// Upload an image via multipart form.
async fn upload_file(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<UploadResponse>> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut content_type: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| campusdesk_common::AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                file_name = field.file_name().map(std::string::ToString::to_string);
                content_type = field.content_type().map(std::string::ToString::to_string);
                file_data = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| campusdesk_common::AppError::BadRequest(e.to_string()))?
                        .to_vec(),
                );
            }
            "name" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| campusdesk_common::AppError::BadRequest(e.to_string()))?;
                if !text.is_empty() {
                    file_name = Some(text);
                }
            }
            _ => {}
        }
    }

    let data = file_data
        .ok_or_else(|| campusdesk_common::AppError::BadRequest("No file provided".to_string()))?;

    let input = UploadInput {
        name: file_name.unwrap_or_else(|| "unnamed".to_string()),
        content_type: content_type.unwrap_or_else(|| "application/octet-stream".to_string()),
        data,
    };

    let upload = state.upload_service.upload(&user.id, input).await?;

    Ok(ApiResponse::ok(upload.into()))
}

/// Delete upload request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUploadRequest {
    pub upload_id: String,
}

/// Delete an upload. Only the uploader may do this.
async fn delete_file(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<DeleteUploadRequest>,
) -> AppResult<ApiResponse<()>> {
    state.upload_service.delete(&user.id, &req.upload_id).await?;
    Ok(ApiResponse::ok(()))
}

/// List uploads request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUploadsRequest {
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub until_id: Option<String>,
}

const fn default_limit() -> u64 {
    20
}

/// List the caller's uploads.
async fn list_files(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListUploadsRequest>,
) -> AppResult<ApiResponse<Vec<UploadResponse>>> {
    let limit = req.limit.min(100);
    let uploads = state
        .upload_service
        .list_by_user(&user.id, limit, req.until_id.as_deref())
        .await?;

    Ok(ApiResponse::ok(uploads.into_iter().map(Into::into).collect()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(upload_file))
        .route("/delete", post(delete_file))
        .route("/list", post(list_files))
}
