//! Upload repository.

use std::sync::Arc;

use crate::entities::{upload, Upload};
use campusdesk_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

/// Upload repository for database operations.
#[derive(Clone)]
pub struct UploadRepository {
    db: Arc<DatabaseConnection>,
}

impl UploadRepository {
    /// Create a new upload repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an upload by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<upload::Model>> {
        Upload::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get an upload by ID, failing if it does not exist.
    pub async fn get_by_id(&self, id: &str) -> AppResult<upload::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Upload {id}")))
    }

    /// Create a new upload record.
    pub async fn create(&self, model: upload::ActiveModel) -> AppResult<upload::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete an upload record.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let upload = self.find_by_id(id).await?;
        if let Some(u) = upload {
            u.delete(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }
        Ok(())
    }

    /// Get uploads by a user (paginated, newest first).
    pub async fn find_by_user(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<upload::Model>> {
        let mut query = Upload::find()
            .filter(upload::Column::UserId.eq(user_id))
            .order_by_desc(upload::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(upload::Column::Id.lt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_upload(id: &str, user_id: &str) -> upload::Model {
        upload::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            name: "evidence.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            size: 1024,
            storage_key: "2026/08/05/u1/abc.jpg".to_string(),
            url: "/files/2026/08/05/u1/abc.jpg".to_string(),
            md5: "d41d8cd98f00b204e9800998ecf8427e".to_string(),
            width: Some(640),
            height: Some(480),
            blurhash: None,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let upload = create_test_upload("f1", "u1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[upload]])
                .into_connection(),
        );

        let repo = UploadRepository::new(db);
        let result = repo.find_by_id("f1").await.unwrap();

        assert!(result.is_some());
    }

    #[tokio::test]
    async fn test_get_by_id_missing() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<upload::Model>::new()])
                .into_connection(),
        );

        let repo = UploadRepository::new(db);
        let result = repo.get_by_id("ghost").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
