//! Vote repository.

use std::sync::Arc;

use crate::entities::{
    vote::{self, VoteType},
    Vote,
};
use campusdesk_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter,
};

/// Vote repository for database operations.
#[derive(Clone)]
pub struct VoteRepository {
    db: Arc<DatabaseConnection>,
}

impl VoteRepository {
    /// Create a new vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a vote by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<vote::Model>> {
        Vote::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user's vote on a complaint. At most one exists.
    pub async fn find_by_user_and_complaint(
        &self,
        user_id: &str,
        complaint_id: &str,
    ) -> AppResult<Option<vote::Model>> {
        Vote::find()
            .filter(vote::Column::UserId.eq(user_id))
            .filter(vote::Column::ComplaintId.eq(complaint_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new vote.
    pub async fn create(&self, model: vote::ActiveModel) -> AppResult<vote::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a vote.
    pub async fn update(&self, model: vote::ActiveModel) -> AppResult<vote::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a vote.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let vote = self.find_by_id(id).await?;
        if let Some(v) = vote {
            v.delete(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }
        Ok(())
    }

    /// Get all votes cast by a user.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<vote::Model>> {
        Vote::find()
            .filter(vote::Column::UserId.eq(user_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count votes of a given type on a complaint.
    pub async fn count_by_complaint_and_type(
        &self,
        complaint_id: &str,
        vote_type: VoteType,
    ) -> AppResult<u64> {
        Vote::find()
            .filter(vote::Column::ComplaintId.eq(complaint_id))
            .filter(vote::Column::VoteType.eq(vote_type))
            .count(self.db.as_ref())
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

    fn create_test_vote(
        id: &str,
        user_id: &str,
        complaint_id: &str,
        vote_type: VoteType,
    ) -> vote::Model {
        vote::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            complaint_id: complaint_id.to_string(),
            vote_type,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_user_and_complaint_found() {
        let vote = create_test_vote("v1", "u1", "c1", VoteType::Like);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[vote.clone()]])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let result = repo.find_by_user_and_complaint("u1", "c1").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().vote_type, VoteType::Like);
    }

    #[tokio::test]
    async fn test_find_by_user_and_complaint_missing() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<vote::Model>::new()])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let result = repo.find_by_user_and_complaint("u1", "c2").await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_find_by_user() {
        let v1 = create_test_vote("v1", "u1", "c1", VoteType::Like);
        let v2 = create_test_vote("v2", "u1", "c2", VoteType::Dislike);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[v1, v2]])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let result = repo.find_by_user("u1").await.unwrap();

        assert_eq!(result.len(), 2);
    }
}
