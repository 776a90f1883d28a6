//! Account service.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use campusdesk_common::{AppError, AppResult, IdGenerator};
use campusdesk_db::{
    entities::{user, user_profile},
    repositories::{UserProfileRepository, UserRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use crate::services::role_policy::RolePolicy;

/// Account service for business logic.
#[derive(Clone)]
pub struct AccountService {
    user_repo: UserRepository,
    profile_repo: UserProfileRepository,
    policy: RolePolicy,
    id_gen: IdGenerator,
}

/// Input for creating a new account.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAccountInput {
    #[validate(email, length(max = 256))]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[validate(length(min = 1, max = 256))]
    pub full_name: String,

    #[validate(length(min = 1, max = 64))]
    pub branch: String,
}

/// Input for updating an account.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAccountInput {
    #[validate(length(min = 1, max = 256))]
    pub full_name: Option<String>,

    #[validate(length(min = 1, max = 64))]
    pub branch: Option<String>,

    #[validate(length(max = 512))]
    pub avatar_url: Option<String>,

    #[validate(length(max = 32))]
    pub contact_number: Option<String>,
}

impl AccountService {
    /// Create a new account service.
    #[must_use]
    pub const fn new(
        user_repo: UserRepository,
        profile_repo: UserProfileRepository,
        policy: RolePolicy,
    ) -> Self {
        Self {
            user_repo,
            profile_repo,
            policy,
            id_gen: IdGenerator::new(),
        }
    }

    /// The role policy this service provisions accounts with.
    #[must_use]
    pub const fn policy(&self) -> &RolePolicy {
        &self.policy
    }

    /// Create a new account.
    ///
    /// Role is decided by the configured policy, never by the caller.
    pub async fn create(&self, input: CreateAccountInput) -> AppResult<user::Model> {
        input.validate()?;

        if self.user_repo.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let role = self.policy.role_for(&input.email);
        let branch = self
            .policy
            .branch_override(&input.email)
            .map_or(input.branch, str::to_string);

        if !self.policy.is_valid_branch(&branch) {
            return Err(AppError::BadRequest(format!("Unknown branch: {branch}")));
        }

        let password_hash = hash_password(&input.password)?;

        let user_id = self.id_gen.generate();
        let token = self.id_gen.generate_token();

        let user_model = user::ActiveModel {
            id: Set(user_id.clone()),
            email: Set(input.email.clone()),
            email_lower: Set(input.email.to_lowercase()),
            token: Set(Some(token)),
            role: Set(role),
            full_name: Set(input.full_name),
            branch: Set(branch),
            ..Default::default()
        };

        let user = self.user_repo.create(user_model).await?;

        let profile_model = user_profile::ActiveModel {
            user_id: Set(user_id),
            password: Set(password_hash),
            ..Default::default()
        };

        self.profile_repo.create(profile_model).await?;

        Ok(user)
    }

    /// Get an account by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// Get an account together with its profile.
    pub async fn get_with_profile(
        &self,
        id: &str,
    ) -> AppResult<(user::Model, user_profile::Model)> {
        let user = self.user_repo.get_by_id(id).await?;
        let profile = self.profile_repo.get_by_user_id(id).await?;
        Ok((user, profile))
    }

    /// Authenticate an account by token.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Authenticate an account by email and password.
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let profile = self
            .profile_repo
            .find_by_user_id(&user.id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &profile.password)? {
            return Err(AppError::Unauthorized);
        }

        Ok(user)
    }

    /// Regenerate an account's authentication token.
    pub async fn regenerate_token(&self, user_id: &str) -> AppResult<String> {
        let user = self.user_repo.get_by_id(user_id).await?;
        let new_token = self.id_gen.generate_token();

        let mut active: user::ActiveModel = user.into();
        active.token = Set(Some(new_token.clone()));
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.user_repo.update(active).await?;

        Ok(new_token)
    }

    /// Update an account's profile fields.
    pub async fn update(&self, id: &str, input: UpdateAccountInput) -> AppResult<user::Model> {
        input.validate()?;

        if let Some(branch) = input.branch.as_deref() {
            if !self.policy.is_valid_branch(branch) {
                return Err(AppError::BadRequest(format!("Unknown branch: {branch}")));
            }
        }

        let user = self.user_repo.get_by_id(id).await?;
        let mut active: user::ActiveModel = user.into();

        if let Some(full_name) = input.full_name {
            active.full_name = Set(full_name);
        }
        if let Some(branch) = input.branch {
            active.branch = Set(branch);
        }
        if let Some(avatar_url) = input.avatar_url {
            active.avatar_url = Set(Some(avatar_url));
        }

        active.updated_at = Set(Some(chrono::Utc::now().into()));

        let updated = self.user_repo.update(active).await?;

        if let Some(contact_number) = input.contact_number {
            let profile = self.profile_repo.get_by_user_id(id).await?;
            let mut active: user_profile::ActiveModel = profile.into();
            active.contact_number = Set(Some(contact_number));
            active.updated_at = Set(Some(chrono::Utc::now().into()));
            self.profile_repo.update(active).await?;
        }

        Ok(updated)
    }

    /// Change an account's password, verifying the current one first.
    pub async fn change_password(
        &self,
        user_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        if new_password.len() < 8 || new_password.len() > 128 {
            return Err(AppError::Validation(
                "Password must be 8-128 characters".to_string(),
            ));
        }

        let profile = self.profile_repo.get_by_user_id(user_id).await?;

        if !verify_password(current_password, &profile.password)? {
            return Err(AppError::Forbidden("Current password is wrong".to_string()));
        }

        let mut active: user_profile::ActiveModel = profile.into();
        active.password = Set(hash_password(new_password)?);
        active.updated_at = Set(Some(chrono::Utc::now().into()));
        self.profile_repo.update(active).await?;

        Ok(())
    }
}

/// Hash a password using Argon2.
pub(crate) fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
pub(crate) fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use campusdesk_common::config::PortalConfig;
    use campusdesk_db::entities::user::Role;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn test_policy() -> RolePolicy {
        RolePolicy::new(&PortalConfig {
            name: "Test Portal".to_string(),
            branches: vec!["Kochi".to_string(), "Chennai".to_string()],
            admin_emails: vec!["admin.chn@example.com".to_string()],
            super_admin_email: "admin.kochi@example.com".to_string(),
            super_admin_branch: "Kochi".to_string(),
        })
    }

    fn create_test_user(id: &str, email: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            email: email.to_string(),
            email_lower: email.to_lowercase(),
            token: Some("test_token".to_string()),
            role: Role::Student,
            full_name: "Test User".to_string(),
            branch: "Kochi".to_string(),
            avatar_url: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_service(
        user_db: Arc<sea_orm::DatabaseConnection>,
        profile_db: Arc<sea_orm::DatabaseConnection>,
    ) -> AccountService {
        AccountService::new(
            UserRepository::new(user_db),
            UserProfileRepository::new(profile_db),
            test_policy(),
        )
    }

    // Unit tests for password functions
    #[test]
    fn test_hash_password() {
        let hash = hash_password("test_password_123").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(hash.len() > 50);
    }

    #[test]
    fn test_verify_password_correct() {
        let hash = hash_password("test_password_123").unwrap();
        assert!(verify_password("test_password_123", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_incorrect() {
        let hash = hash_password("test_password_123").unwrap();
        assert!(!verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        assert!(verify_password("test", "invalid_hash").is_err());
    }

    #[test]
    fn test_hash_password_different_each_time() {
        let hash1 = hash_password("same_password").unwrap();
        let hash2 = hash_password("same_password").unwrap();

        // Different salts should produce different hashes
        assert_ne!(hash1, hash2);
        assert!(verify_password("same_password", &hash1).unwrap());
        assert!(verify_password("same_password", &hash2).unwrap());
    }

    // Input validation
    #[test]
    fn test_create_account_input_validation() {
        let input = CreateAccountInput {
            email: "not-an-email".to_string(),
            password: "password123".to_string(),
            full_name: "Test".to_string(),
            branch: "Kochi".to_string(),
        };
        assert!(input.validate().is_err());

        let input = CreateAccountInput {
            email: "student@example.com".to_string(),
            password: "short".to_string(),
            full_name: "Test".to_string(),
            branch: "Kochi".to_string(),
        };
        assert!(input.validate().is_err());

        let input = CreateAccountInput {
            email: "student@example.com".to_string(),
            password: "password123".to_string(),
            full_name: "Test".to_string(),
            branch: "Kochi".to_string(),
        };
        assert!(input.validate().is_ok());
    }

    // Service tests
    #[tokio::test]
    async fn test_authenticate_by_token_found() {
        let user = create_test_user("u1", "student@example.com");

        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .into_connection(),
        );
        let profile_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = create_test_service(user_db, profile_db);

        let result = service.authenticate_by_token("test_token").await.unwrap();
        assert_eq!(result.id, "u1");
    }

    #[tokio::test]
    async fn test_authenticate_by_token_not_found() {
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );
        let profile_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = create_test_service(user_db, profile_db);

        let result = service.authenticate_by_token("invalid").await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_create_rejects_taken_email() {
        let existing = create_test_user("u1", "student@example.com");

        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .into_connection(),
        );
        let profile_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = create_test_service(user_db, profile_db);

        let result = service
            .create(CreateAccountInput {
                email: "student@example.com".to_string(),
                password: "password123".to_string(),
                full_name: "Dup".to_string(),
                branch: "Kochi".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_branch() {
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );
        let profile_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = create_test_service(user_db, profile_db);

        let result = service
            .create(CreateAccountInput {
                email: "student@example.com".to_string(),
                password: "password123".to_string(),
                full_name: "Test".to_string(),
                branch: "Atlantis".to_string(),
            })
            .await;

        match result {
            Err(AppError::BadRequest(msg)) => assert!(msg.contains("Unknown branch")),
            _ => panic!("Expected BadRequest error"),
        }
    }
}
