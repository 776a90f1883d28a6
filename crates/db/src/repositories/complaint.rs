//! Complaint repository.

use std::sync::Arc;

use crate::entities::{
    complaint::{self, Category, Status},
    Complaint,
};
use campusdesk_common::{AppError, AppResult};
use sea_orm::{
    sea_query::{Expr, Func},
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};

/// Filters for the branch feed query.
#[derive(Debug, Clone, Default)]
pub struct ComplaintFilter {
    /// Restrict to a category.
    pub category: Option<Category>,
    /// Restrict to a status.
    pub status: Option<Status>,
    /// Case-insensitive title substring match.
    pub search: Option<String>,
}

/// Complaint repository for database operations.
#[derive(Clone)]
pub struct ComplaintRepository {
    db: Arc<DatabaseConnection>,
}

impl ComplaintRepository {
    /// Create a new complaint repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a complaint by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<complaint::Model>> {
        Complaint::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a complaint by ID, failing if it does not exist.
    pub async fn get_by_id(&self, id: &str) -> AppResult<complaint::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ComplaintNotFound(id.to_string()))
    }

    /// Create a new complaint.
    pub async fn create(&self, model: complaint::ActiveModel) -> AppResult<complaint::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a complaint.
    pub async fn update(&self, model: complaint::ActiveModel) -> AppResult<complaint::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a complaint.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let complaint = self.find_by_id(id).await?;
        if let Some(c) = complaint {
            c.delete(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }
        Ok(())
    }

    /// Get the branch feed (paginated, newest first).
    pub async fn find_by_branch(
        &self,
        branch: &str,
        filter: &ComplaintFilter,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<complaint::Model>> {
        let mut query = Complaint::find()
            .filter(complaint::Column::Branch.eq(branch))
            .order_by_desc(complaint::Column::Id);

        if let Some(category) = filter.category {
            query = query.filter(complaint::Column::Category.eq(category));
        }
        if let Some(status) = filter.status {
            query = query.filter(complaint::Column::Status.eq(status));
        }
        if let Some(search) = filter.search.as_deref() {
            // Case-insensitive title match with escaped wildcards
            let pattern = format!(
                "%{}%",
                search.to_lowercase().replace('%', "\\%").replace('_', "\\_")
            );
            query = query.filter(
                Expr::expr(Func::lower(Expr::col(complaint::Column::Title))).like(pattern),
            );
        }
        if let Some(id) = until_id {
            query = query.filter(complaint::Column::Id.lt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a user's own complaints (paginated, newest first).
    pub async fn find_by_user(
        &self,
        user_id: &str,
        status: Option<Status>,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<complaint::Model>> {
        let mut query = Complaint::find()
            .filter(complaint::Column::UserId.eq(user_id))
            .order_by_desc(complaint::Column::Id);

        if let Some(status) = status {
            query = query.filter(complaint::Column::Status.eq(status));
        }
        if let Some(id) = until_id {
            query = query.filter(complaint::Column::Id.lt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Adjust the score atomically (single UPDATE query, no fetch).
    ///
    /// Concurrent adjustments compose instead of overwriting each other.
    pub async fn adjust_score(&self, id: &str, delta: i32) -> AppResult<()> {
        Complaint::update_many()
            .col_expr(
                complaint::Column::Score,
                Expr::col(complaint::Column::Score).add(delta),
            )
            .filter(complaint::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Count complaints in a branch.
    pub async fn count_by_branch(&self, branch: &str) -> AppResult<u64> {
        Complaint::find()
            .filter(complaint::Column::Branch.eq(branch))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count complaints in a branch with a given status.
    pub async fn count_by_branch_and_status(
        &self,
        branch: &str,
        status: Status,
    ) -> AppResult<u64> {
        Complaint::find()
            .filter(complaint::Column::Branch.eq(branch))
            .filter(complaint::Column::Status.eq(status))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count complaints in a branch with a given category.
    pub async fn count_by_branch_and_category(
        &self,
        branch: &str,
        category: Category,
    ) -> AppResult<u64> {
        Complaint::find()
            .filter(complaint::Column::Branch.eq(branch))
            .filter(complaint::Column::Category.eq(category))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get complaints in a branch created since the given time.
    pub async fn find_created_since(
        &self,
        branch: &str,
        since: chrono::DateTime<chrono::Utc>,
    ) -> AppResult<Vec<complaint::Model>> {
        Complaint::find()
            .filter(complaint::Column::Branch.eq(branch))
            .filter(complaint::Column::CreatedAt.gte(since))
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
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_complaint(id: &str, user_id: &str, branch: &str) -> complaint::Model {
        complaint::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            title: "Broken WiFi".to_string(),
            description: "Second floor router down".to_string(),
            category: Category::WiFi,
            status: Status::Open,
            branch: branch.to_string(),
            image_url: None,
            score: 0,
            rating: None,
            review_comment: None,
            admin_remark: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let complaint = create_test_complaint("c1", "u1", "Kochi");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[complaint.clone()]])
                .into_connection(),
        );

        let repo = ComplaintRepository::new(db);
        let result = repo.find_by_id("c1").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().title, "Broken WiFi");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<complaint::Model>::new()])
                .into_connection(),
        );

        let repo = ComplaintRepository::new(db);
        let result = repo.get_by_id("nonexistent").await;

        match result {
            Err(AppError::ComplaintNotFound(id)) => assert_eq!(id, "nonexistent"),
            _ => panic!("Expected ComplaintNotFound error"),
        }
    }

    #[tokio::test]
    async fn test_find_by_branch() {
        let c1 = create_test_complaint("c1", "u1", "Kochi");
        let c2 = create_test_complaint("c2", "u2", "Kochi");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[c1, c2]])
                .into_connection(),
        );

        let repo = ComplaintRepository::new(db);
        let result = repo
            .find_by_branch("Kochi", &ComplaintFilter::default(), 10, None)
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn test_find_by_user() {
        let c1 = create_test_complaint("c1", "u1", "Kochi");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[c1]])
                .into_connection(),
        );

        let repo = ComplaintRepository::new(db);
        let result = repo
            .find_by_user("u1", Some(Status::Open), 10, None)
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
    }

    #[tokio::test]
    async fn test_adjust_score_issues_single_update() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = ComplaintRepository::new(db);
        repo.adjust_score("c1", 2).await.unwrap();
    }
}
