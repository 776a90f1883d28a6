//! Complaint service.
//!
//! Filing, editing, triage and resolution review. Status moves forward
//! only (Open -> In_Progress -> Resolved) and every transition is checked
//! here, server side.

use crate::services::event_publisher::EventPublisherService;
use crate::services::notification::NotificationService;
use campusdesk_common::{AppError, AppResult, IdGenerator};
use campusdesk_db::{
    entities::{
        complaint::{self, Category, Status},
        user::{self, Role},
    },
    repositories::{ComplaintFilter, ComplaintRepository, UserRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Actions an admin can take on a complaint in its current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComplaintAction {
    /// Open -> `In_Progress`
    StartProgress,
    /// `In_Progress` -> Resolved
    Resolve,
}

impl ComplaintAction {
    /// String form used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StartProgress => "start_progress",
            Self::Resolve => "resolve",
        }
    }
}

/// The admin actions available for a complaint in the given status.
#[must_use]
pub const fn available_actions(status: Status) -> &'static [ComplaintAction] {
    match status {
        Status::Open => &[ComplaintAction::StartProgress],
        Status::InProgress => &[ComplaintAction::Resolve],
        Status::Resolved => &[],
    }
}

/// Input for filing a complaint.
#[derive(Debug, Deserialize, Validate)]
pub struct FileComplaintInput {
    #[validate(length(min = 1, max = 256))]
    pub title: String,

    #[validate(length(min = 1, max = 8192))]
    pub description: String,

    pub category: Category,

    #[validate(length(max = 512))]
    pub image_url: Option<String>,
}

/// Input for editing a complaint. Only set fields change.
#[derive(Debug, Deserialize, Validate)]
pub struct EditComplaintInput {
    #[validate(length(min = 1, max = 256))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 8192))]
    pub description: Option<String>,

    pub category: Option<Category>,

    #[validate(length(max = 512))]
    pub image_url: Option<String>,
}

/// A freshly filed complaint plus how many branch admins were notified.
#[derive(Debug, Clone)]
pub struct FiledComplaint {
    /// The created complaint.
    pub complaint: complaint::Model,
    /// How many branch admins received a notification. Zero when the
    /// fan-out failed; the complaint itself is still committed.
    pub notified_admins: usize,
}

/// Complaint service for business logic.
#[derive(Clone)]
pub struct ComplaintService {
    complaint_repo: ComplaintRepository,
    user_repo: UserRepository,
    notifications: NotificationService,
    event_publisher: Option<EventPublisherService>,
    id_gen: IdGenerator,
}

impl ComplaintService {
    /// Create a new complaint service.
    #[must_use]
    pub const fn new(
        complaint_repo: ComplaintRepository,
        user_repo: UserRepository,
        notifications: NotificationService,
    ) -> Self {
        Self {
            complaint_repo,
            user_repo,
            notifications,
            event_publisher: None,
            id_gen: IdGenerator::new(),
        }
    }

    /// Set the event publisher.
    pub fn set_event_publisher(&mut self, event_publisher: EventPublisherService) {
        self.event_publisher = Some(event_publisher);
    }

    /// File a complaint under the filer's branch and notify that branch's
    /// admins.
    ///
    /// The notification fan-out is deliberately non-fatal: a failure leaves
    /// the complaint committed, is logged, and is surfaced to the caller
    /// through `notified_admins`.
    pub async fn file(
        &self,
        filer: &user::Model,
        input: FileComplaintInput,
    ) -> AppResult<FiledComplaint> {
        input.validate()?;

        let model = complaint::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(filer.id.clone()),
            title: Set(input.title),
            description: Set(input.description),
            category: Set(input.category),
            status: Set(Status::Open),
            branch: Set(filer.branch.clone()),
            image_url: Set(input.image_url),
            score: Set(0),
            ..Default::default()
        };

        let complaint = self.complaint_repo.create(model).await?;

        let notified_admins = match self.notify_branch_admins(&complaint).await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    complaint_id = %complaint.id,
                    "Failed to notify branch admins about new complaint"
                );
                0
            }
        };

        if let Some(ref event_publisher) = self.event_publisher {
            if let Err(e) = event_publisher
                .publish_complaint_created(
                    &complaint.id,
                    &complaint.user_id,
                    &complaint.branch,
                    complaint.category.as_str(),
                    &complaint.title,
                )
                .await
            {
                tracing::warn!(error = %e, "Failed to publish complaint created event");
            }
        }

        Ok(FiledComplaint {
            complaint,
            notified_admins,
        })
    }

    async fn notify_branch_admins(&self, complaint: &complaint::Model) -> AppResult<usize> {
        let admins = self.user_repo.find_branch_admins(&complaint.branch).await?;

        for admin in &admins {
            self.notifications
                .notify_new_complaint(
                    &admin.id,
                    complaint.category.as_str(),
                    &complaint.title,
                    &complaint.id,
                )
                .await?;
        }

        Ok(admins.len())
    }

    /// Get a complaint by ID.
    pub async fn get(&self, id: &str) -> AppResult<complaint::Model> {
        self.complaint_repo.get_by_id(id).await
    }

    /// Get the branch feed.
    pub async fn list_branch(
        &self,
        branch: &str,
        filter: &ComplaintFilter,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<complaint::Model>> {
        self.complaint_repo
            .find_by_branch(branch, filter, limit, until_id)
            .await
    }

    /// Get a user's own complaint history.
    pub async fn list_by_user(
        &self,
        user_id: &str,
        status: Option<Status>,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<complaint::Model>> {
        self.complaint_repo
            .find_by_user(user_id, status, limit, until_id)
            .await
    }

    /// Edit a complaint. Owner only, and only while it is still Open.
    pub async fn edit(
        &self,
        editor: &user::Model,
        id: &str,
        input: EditComplaintInput,
    ) -> AppResult<complaint::Model> {
        input.validate()?;

        let complaint = self.complaint_repo.get_by_id(id).await?;

        if complaint.user_id != editor.id {
            return Err(AppError::Forbidden(
                "Only the owner can edit a complaint".to_string(),
            ));
        }
        if complaint.status != Status::Open {
            return Err(AppError::BadRequest(
                "Only open complaints can be edited".to_string(),
            ));
        }

        let branch = complaint.branch.clone();
        let mut active: complaint::ActiveModel = complaint.into();

        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(category) = input.category {
            active.category = Set(category);
        }
        if let Some(image_url) = input.image_url {
            active.image_url = Set(Some(image_url));
        }

        active.updated_at = Set(Some(chrono::Utc::now().into()));

        let updated = self.complaint_repo.update(active).await?;
        self.publish_updated(&updated.id, &branch, updated.status)
            .await;

        Ok(updated)
    }

    /// Move an Open complaint to `In_Progress`. Branch admins only.
    pub async fn start_progress(
        &self,
        admin: &user::Model,
        id: &str,
    ) -> AppResult<complaint::Model> {
        self.transition(admin, id, Status::InProgress, None).await
    }

    /// Resolve an `In_Progress` complaint, optionally attaching a remark.
    /// Branch admins only.
    pub async fn resolve(
        &self,
        admin: &user::Model,
        id: &str,
        remark: Option<String>,
    ) -> AppResult<complaint::Model> {
        self.transition(admin, id, Status::Resolved, remark).await
    }

    async fn transition(
        &self,
        admin: &user::Model,
        id: &str,
        to: Status,
        remark: Option<String>,
    ) -> AppResult<complaint::Model> {
        let complaint = self.complaint_repo.get_by_id(id).await?;
        Self::check_branch_admin(admin, &complaint)?;

        let allowed = matches!(
            (complaint.status, to),
            (Status::Open, Status::InProgress) | (Status::InProgress, Status::Resolved)
        );
        if !allowed {
            return Err(AppError::BadRequest(format!(
                "Cannot move a {} complaint to {}",
                complaint.status.as_str(),
                to.as_str()
            )));
        }

        let owner_id = complaint.user_id.clone();
        let title = complaint.title.clone();
        let branch = complaint.branch.clone();

        let mut active: complaint::ActiveModel = complaint.into();
        active.status = Set(to);
        if let Some(remark) = remark {
            active.admin_remark = Set(Some(remark));
        }
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        let updated = self.complaint_repo.update(active).await?;

        if let Err(e) = self
            .notifications
            .notify_status_change(&owner_id, &title, to, &updated.id)
            .await
        {
            tracing::warn!(error = %e, "Failed to notify owner about status change");
        }

        self.publish_updated(&updated.id, &branch, to).await;

        Ok(updated)
    }

    /// Rate a resolved complaint. Owner only, first rating wins.
    pub async fn review(
        &self,
        reviewer: &user::Model,
        id: &str,
        rating: i32,
        comment: Option<String>,
    ) -> AppResult<complaint::Model> {
        if !(1..=5).contains(&rating) {
            return Err(AppError::Validation(
                "Rating must be between 1 and 5".to_string(),
            ));
        }

        let complaint = self.complaint_repo.get_by_id(id).await?;

        if complaint.user_id != reviewer.id {
            return Err(AppError::Forbidden(
                "Only the owner can rate a complaint".to_string(),
            ));
        }
        if complaint.status != Status::Resolved {
            return Err(AppError::BadRequest(
                "Only resolved complaints can be rated".to_string(),
            ));
        }
        if complaint.rating.is_some() {
            return Err(AppError::Conflict("Already rated".to_string()));
        }

        let title = complaint.title.clone();
        let branch = complaint.branch.clone();

        let mut active: complaint::ActiveModel = complaint.into();
        active.rating = Set(Some(rating));
        active.review_comment = Set(comment);
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        let updated = self.complaint_repo.update(active).await?;

        // Tell the branch admins how their service landed
        match self.user_repo.find_branch_admins(&branch).await {
            Ok(admins) => {
                for admin in admins {
                    if let Err(e) = self
                        .notifications
                        .notify_review_received(&admin.id, rating, &title, &updated.id)
                        .await
                    {
                        tracing::warn!(error = %e, "Failed to notify admin about review");
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to look up branch admins for review");
            }
        }

        Ok(updated)
    }

    /// Remove a complaint. Branch admins only; the one hard-delete path.
    pub async fn remove(&self, admin: &user::Model, id: &str) -> AppResult<()> {
        let complaint = self.complaint_repo.get_by_id(id).await?;
        Self::check_branch_admin(admin, &complaint)?;

        self.complaint_repo.delete(id).await?;

        if let Some(ref event_publisher) = self.event_publisher {
            if let Err(e) = event_publisher
                .publish_complaint_removed(id, &complaint.branch)
                .await
            {
                tracing::warn!(error = %e, "Failed to publish complaint removed event");
            }
        }

        Ok(())
    }

    fn check_branch_admin(admin: &user::Model, complaint: &complaint::Model) -> AppResult<()> {
        if admin.role != Role::Admin {
            return Err(AppError::Forbidden("Admin role required".to_string()));
        }
        if admin.branch != complaint.branch {
            return Err(AppError::Forbidden(
                "Complaint belongs to another branch".to_string(),
            ));
        }
        Ok(())
    }

    async fn publish_updated(&self, id: &str, branch: &str, status: Status) {
        if let Some(ref event_publisher) = self.event_publisher {
            if let Err(e) = event_publisher
                .publish_complaint_updated(id, branch, status.as_str())
                .await
            {
                tracing::warn!(error = %e, "Failed to publish complaint updated event");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use campusdesk_db::repositories::NotificationRepository;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_user(id: &str, role: Role, branch: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            email: format!("{id}@example.com"),
            email_lower: format!("{id}@example.com"),
            token: None,
            role,
            full_name: "Test User".to_string(),
            branch: branch.to_string(),
            avatar_url: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_complaint(id: &str, user_id: &str, status: Status) -> complaint::Model {
        complaint::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            title: "Broken WiFi".to_string(),
            description: "Router down".to_string(),
            category: Category::WiFi,
            status,
            branch: "Kochi".to_string(),
            image_url: None,
            score: 0,
            rating: None,
            review_comment: None,
            admin_remark: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn service_with(
        complaint_db: Arc<sea_orm::DatabaseConnection>,
        user_db: Arc<sea_orm::DatabaseConnection>,
    ) -> ComplaintService {
        let notification_db =
            Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        ComplaintService::new(
            ComplaintRepository::new(complaint_db),
            UserRepository::new(user_db),
            NotificationService::new(NotificationRepository::new(notification_db)),
        )
    }

    // Status-action derivation (what the UI renders as buttons)
    #[test]
    fn test_open_offers_only_start_progress() {
        assert_eq!(
            available_actions(Status::Open),
            &[ComplaintAction::StartProgress]
        );
    }

    #[test]
    fn test_in_progress_offers_only_resolve() {
        assert_eq!(
            available_actions(Status::InProgress),
            &[ComplaintAction::Resolve]
        );
    }

    #[test]
    fn test_resolved_offers_nothing() {
        assert!(available_actions(Status::Resolved).is_empty());
    }

    #[tokio::test]
    async fn test_edit_requires_owner() {
        let complaint = create_test_complaint("c1", "owner", Status::Open);
        let stranger = create_test_user("stranger", Role::Student, "Kochi");

        let complaint_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[complaint]])
                .into_connection(),
        );
        let user_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = service_with(complaint_db, user_db);

        let result = service
            .edit(
                &stranger,
                "c1",
                EditComplaintInput {
                    title: Some("Hijacked".to_string()),
                    description: None,
                    category: None,
                    image_url: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_edit_rejected_once_in_progress() {
        let complaint = create_test_complaint("c1", "owner", Status::InProgress);
        let owner = create_test_user("owner", Role::Student, "Kochi");

        let complaint_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[complaint]])
                .into_connection(),
        );
        let user_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = service_with(complaint_db, user_db);

        let result = service
            .edit(
                &owner,
                "c1",
                EditComplaintInput {
                    title: Some("Updated".to_string()),
                    description: None,
                    category: None,
                    image_url: None,
                },
            )
            .await;

        match result {
            Err(AppError::BadRequest(msg)) => assert!(msg.contains("open complaints")),
            _ => panic!("Expected BadRequest error"),
        }
    }

    #[tokio::test]
    async fn test_start_progress_requires_admin_role() {
        let complaint = create_test_complaint("c1", "owner", Status::Open);
        let student = create_test_user("student", Role::Student, "Kochi");

        let complaint_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[complaint]])
                .into_connection(),
        );
        let user_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = service_with(complaint_db, user_db);

        let result = service.start_progress(&student, "c1").await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_start_progress_requires_same_branch() {
        let complaint = create_test_complaint("c1", "owner", Status::Open);
        let other_admin = create_test_user("admin2", Role::Admin, "Chennai");

        let complaint_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[complaint]])
                .into_connection(),
        );
        let user_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = service_with(complaint_db, user_db);

        let result = service.start_progress(&other_admin, "c1").await;
        match result {
            Err(AppError::Forbidden(msg)) => assert!(msg.contains("another branch")),
            _ => panic!("Expected Forbidden error"),
        }
    }

    #[tokio::test]
    async fn test_resolve_rejects_open_complaint() {
        // Open -> Resolved skips In_Progress and must fail
        let complaint = create_test_complaint("c1", "owner", Status::Open);
        let admin = create_test_user("admin", Role::Admin, "Kochi");

        let complaint_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[complaint]])
                .into_connection(),
        );
        let user_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = service_with(complaint_db, user_db);

        let result = service.resolve(&admin, "c1", None).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_start_progress_rejects_resolved_complaint() {
        // Resolved is terminal
        let complaint = create_test_complaint("c1", "owner", Status::Resolved);
        let admin = create_test_user("admin", Role::Admin, "Kochi");

        let complaint_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[complaint]])
                .into_connection(),
        );
        let user_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = service_with(complaint_db, user_db);

        let result = service.start_progress(&admin, "c1").await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_review_requires_resolved_status() {
        let complaint = create_test_complaint("c1", "owner", Status::InProgress);
        let owner = create_test_user("owner", Role::Student, "Kochi");

        let complaint_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[complaint]])
                .into_connection(),
        );
        let user_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = service_with(complaint_db, user_db);

        let result = service.review(&owner, "c1", 5, None).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_review_rejects_second_rating() {
        let mut complaint = create_test_complaint("c1", "owner", Status::Resolved);
        complaint.rating = Some(4);
        let owner = create_test_user("owner", Role::Student, "Kochi");

        let complaint_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[complaint]])
                .into_connection(),
        );
        let user_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = service_with(complaint_db, user_db);

        let result = service.review(&owner, "c1", 5, None).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_review_rejects_out_of_range_rating() {
        let complaint_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let user_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let owner = create_test_user("owner", Role::Student, "Kochi");

        let service = service_with(complaint_db, user_db);

        let result = service.review(&owner, "c1", 6, None).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
