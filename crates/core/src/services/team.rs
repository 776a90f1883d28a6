//! Team service.
//!
//! Branch-admin management, restricted to the super admin. Each branch has
//! at most one admin, and the super admin's own branch is reserved.

use campusdesk_common::{AppError, AppResult, IdGenerator};
use campusdesk_db::{
    entities::{
        user::{self, Role},
        user_profile,
    },
    repositories::{UserProfileRepository, UserRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use crate::services::account::hash_password;
use crate::services::role_policy::RolePolicy;

/// Input for allocating a branch admin.
#[derive(Debug, Deserialize, Validate)]
pub struct AllocateAdminInput {
    #[validate(length(min = 1, max = 256))]
    pub full_name: String,

    #[validate(email, length(max = 256))]
    pub email: String,

    #[validate(length(min = 1, max = 64))]
    pub branch: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Input for updating a branch admin. Only set fields change.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAdminInput {
    #[validate(length(min = 1, max = 256))]
    pub full_name: Option<String>,

    #[validate(length(min = 1, max = 64))]
    pub branch: Option<String>,
}

/// Team service for business logic.
#[derive(Clone)]
pub struct TeamService {
    user_repo: UserRepository,
    profile_repo: UserProfileRepository,
    policy: RolePolicy,
    id_gen: IdGenerator,
}

impl TeamService {
    /// Create a new team service.
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

    fn ensure_super_admin(&self, actor: &user::Model) -> AppResult<()> {
        if !self.policy.is_super_admin(&actor.email) {
            return Err(AppError::Forbidden(
                "Super admin privileges required".to_string(),
            ));
        }
        Ok(())
    }

    /// List all admins, ordered by branch.
    pub async fn list_admins(&self, actor: &user::Model) -> AppResult<Vec<user::Model>> {
        self.ensure_super_admin(actor)?;
        self.user_repo.list_admins().await
    }

    /// Allocate a new branch admin.
    pub async fn allocate(
        &self,
        actor: &user::Model,
        input: AllocateAdminInput,
    ) -> AppResult<user::Model> {
        self.ensure_super_admin(actor)?;
        input.validate()?;

        if !self.policy.is_valid_branch(&input.branch) {
            return Err(AppError::BadRequest(format!(
                "Unknown branch: {}",
                input.branch
            )));
        }
        if input.branch == self.policy.super_admin_branch() {
            return Err(AppError::BadRequest(format!(
                "{} is reserved for the super admin",
                input.branch
            )));
        }
        if self.user_repo.count_branch_admins(&input.branch).await? > 0 {
            return Err(AppError::Conflict(format!(
                "{} already has an admin",
                input.branch
            )));
        }
        if self.user_repo.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_password(&input.password)?;
        let user_id = self.id_gen.generate();

        let user_model = user::ActiveModel {
            id: Set(user_id.clone()),
            email: Set(input.email.clone()),
            email_lower: Set(input.email.to_lowercase()),
            token: Set(Some(self.id_gen.generate_token())),
            role: Set(Role::Admin),
            full_name: Set(input.full_name),
            branch: Set(input.branch),
            ..Default::default()
        };

        let admin = self.user_repo.create(user_model).await?;

        let profile_model = user_profile::ActiveModel {
            user_id: Set(user_id),
            password: Set(password_hash),
            ..Default::default()
        };
        self.profile_repo.create(profile_model).await?;

        Ok(admin)
    }

    /// Update a branch admin's name or branch.
    pub async fn update(
        &self,
        actor: &user::Model,
        admin_id: &str,
        input: UpdateAdminInput,
    ) -> AppResult<user::Model> {
        self.ensure_super_admin(actor)?;
        input.validate()?;

        let target = self.user_repo.get_by_id(admin_id).await?;

        if target.role != Role::Admin {
            return Err(AppError::BadRequest("Not an admin account".to_string()));
        }
        if self.policy.is_super_admin(&target.email) {
            return Err(AppError::Forbidden(
                "The super admin account cannot be reassigned".to_string(),
            ));
        }

        if let Some(branch) = input.branch.as_deref() {
            if !self.policy.is_valid_branch(branch) {
                return Err(AppError::BadRequest(format!("Unknown branch: {branch}")));
            }
            if branch == self.policy.super_admin_branch() {
                return Err(AppError::BadRequest(format!(
                    "{branch} is reserved for the super admin"
                )));
            }
            if branch != target.branch
                && self.user_repo.count_branch_admins(branch).await? > 0
            {
                return Err(AppError::Conflict(format!("{branch} already has an admin")));
            }
        }

        let mut active: user::ActiveModel = target.into();
        if let Some(full_name) = input.full_name {
            active.full_name = Set(full_name);
        }
        if let Some(branch) = input.branch {
            active.branch = Set(branch);
        }
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.user_repo.update(active).await
    }

    /// Remove a branch admin. The super admin can never be removed.
    pub async fn remove(&self, actor: &user::Model, admin_id: &str) -> AppResult<()> {
        self.ensure_super_admin(actor)?;

        let target = self.user_repo.get_by_id(admin_id).await?;

        if target.role != Role::Admin {
            return Err(AppError::BadRequest("Not an admin account".to_string()));
        }
        if self.policy.is_super_admin(&target.email) {
            return Err(AppError::Forbidden(
                "The super admin account cannot be removed".to_string(),
            ));
        }

        self.user_repo.delete(&target.id).await
    }
}
