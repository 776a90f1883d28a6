//! Upload service.
//!
//! Accepts image evidence and avatars: decodes the bytes to prove they are
//! a real image, records dimensions and a blurhash placeholder, and hands
//! the data to the configured storage backend.

use std::sync::Arc;

use campusdesk_common::{evidence_key, AppError, AppResult, IdGenerator, StorageBackend};
use campusdesk_db::{entities::upload, repositories::UploadRepository};
use sea_orm::Set;

/// Maximum accepted upload size in bytes (8 MiB).
pub const MAX_UPLOAD_SIZE: usize = 8 * 1024 * 1024;

/// Input for an upload.
#[derive(Debug)]
pub struct UploadInput {
    /// Original file name.
    pub name: String,
    /// Declared MIME type.
    pub content_type: String,
    /// Raw file bytes.
    pub data: Vec<u8>,
}

/// Upload service for business logic.
#[derive(Clone)]
pub struct UploadService {
    upload_repo: UploadRepository,
    storage: Arc<dyn StorageBackend>,
    id_gen: IdGenerator,
}

impl UploadService {
    /// Create a new upload service.
    #[must_use]
    pub fn new(upload_repo: UploadRepository, storage: Arc<dyn StorageBackend>) -> Self {
        Self {
            upload_repo,
            storage,
            id_gen: IdGenerator::new(),
        }
    }

    /// Store an image upload for a user.
    pub async fn upload(&self, user_id: &str, input: UploadInput) -> AppResult<upload::Model> {
        if !input.content_type.starts_with("image/") {
            return Err(AppError::BadRequest(
                "Only image uploads are accepted".to_string(),
            ));
        }
        if input.data.is_empty() {
            return Err(AppError::BadRequest("Empty file".to_string()));
        }
        if input.data.len() > MAX_UPLOAD_SIZE {
            return Err(AppError::BadRequest(format!(
                "File exceeds the {} MiB limit",
                MAX_UPLOAD_SIZE / (1024 * 1024)
            )));
        }

        // Decode to prove the bytes really are an image
        let decoded = image::load_from_memory(&input.data)
            .map_err(|e| AppError::BadRequest(format!("Not a valid image: {e}")))?;

        let width = decoded.width();
        let height = decoded.height();
        let blurhash = compute_blurhash(&decoded);

        let key = evidence_key(user_id, &input.name);
        let stored = self
            .storage
            .put(&key, &input.data, &input.content_type)
            .await?;

        let model = upload::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            name: Set(input.name),
            content_type: Set(stored.content_type),
            size: Set(stored.size as i64),
            storage_key: Set(stored.key),
            url: Set(stored.url),
            md5: Set(stored.md5),
            width: Set(Some(width as i32)),
            height: Set(Some(height as i32)),
            blurhash: Set(blurhash),
            ..Default::default()
        };

        self.upload_repo.create(model).await
    }

    /// Get an upload by ID.
    pub async fn get(&self, id: &str) -> AppResult<upload::Model> {
        self.upload_repo.get_by_id(id).await
    }

    /// List a user's uploads.
    pub async fn list_by_user(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<upload::Model>> {
        self.upload_repo.find_by_user(user_id, limit, until_id).await
    }

    /// Delete an upload. Only the uploader may do this.
    pub async fn delete(&self, user_id: &str, id: &str) -> AppResult<()> {
        let upload = self.upload_repo.get_by_id(id).await?;

        if upload.user_id != user_id {
            return Err(AppError::Forbidden("Not your upload".to_string()));
        }

        self.storage.remove(&upload.storage_key).await?;
        self.upload_repo.delete(id).await
    }
}

/// Compute a blurhash placeholder. Failures degrade to no placeholder.
fn compute_blurhash(image: &image::DynamicImage) -> Option<String> {
    // Blurhash cost scales with pixel count; a thumbnail is plenty
    let thumb = image.thumbnail(64, 64);
    let rgba = thumb.to_rgba8();
    blurhash::encode(4, 3, rgba.width(), rgba.height(), rgba.as_raw()).ok()
}
