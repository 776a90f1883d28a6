//! User repository.

use std::sync::Arc;

use crate::entities::{
    user::{self, Role},
    User,
};
use campusdesk_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder,
};

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a user by ID, failing if it does not exist.
    pub async fn get_by_id(&self, id: &str) -> AppResult<user::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(id.to_string()))
    }

    /// Find a user by email (case-insensitive).
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::EmailLower.eq(email.to_lowercase()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by access token.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Token.eq(token))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new user.
    pub async fn create(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a user.
    pub async fn update(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a user.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let user = self.find_by_id(id).await?;
        if let Some(u) = user {
            u.delete(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }
        Ok(())
    }

    /// List all admins, ordered by branch.
    pub async fn list_admins(&self) -> AppResult<Vec<user::Model>> {
        User::find()
            .filter(user::Column::Role.eq(Role::Admin))
            .order_by_asc(user::Column::Branch)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the admins of a branch.
    pub async fn find_branch_admins(&self, branch: &str) -> AppResult<Vec<user::Model>> {
        User::find()
            .filter(user::Column::Role.eq(Role::Admin))
            .filter(user::Column::Branch.eq(branch))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count admins assigned to a branch.
    pub async fn count_branch_admins(&self, branch: &str) -> AppResult<u64> {
        User::find()
            .filter(user::Column::Role.eq(Role::Admin))
            .filter(user::Column::Branch.eq(branch))
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

    fn create_test_user(id: &str, email: &str, role: Role) -> user::Model {
        user::Model {
            id: id.to_string(),
            email: email.to_string(),
            email_lower: email.to_lowercase(),
            token: Some("test_token".to_string()),
            role,
            full_name: "Test User".to_string(),
            branch: "Kochi".to_string(),
            avatar_url: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_email_found() {
        let user = create_test_user("u1", "student@example.com", Role::Student);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user.clone()]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let result = repo.find_by_email("Student@Example.com").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().id, "u1");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let result = repo.get_by_id("nonexistent").await;

        match result {
            Err(AppError::AccountNotFound(id)) => assert_eq!(id, "nonexistent"),
            _ => panic!("Expected AccountNotFound error"),
        }
    }

    #[tokio::test]
    async fn test_find_by_token() {
        let user = create_test_user("u1", "student@example.com", Role::Student);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user.clone()]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let result = repo.find_by_token("test_token").await.unwrap();

        assert!(result.is_some());
    }

    #[tokio::test]
    async fn test_list_admins() {
        let a1 = create_test_user("a1", "admin.blr@example.com", Role::Admin);
        let a2 = create_test_user("a2", "admin.chn@example.com", Role::Admin);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[a1, a2]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let result = repo.list_admins().await.unwrap();

        assert_eq!(result.len(), 2);
    }
}
