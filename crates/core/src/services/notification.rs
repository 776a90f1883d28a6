//! Notification service.

use crate::services::event_publisher::EventPublisherService;
use campusdesk_common::{AppError, AppResult, IdGenerator};
use campusdesk_db::{
    entities::{
        complaint::Status,
        notification::{self, NotificationType},
    },
    repositories::NotificationRepository,
};
use sea_orm::Set;

/// Notification service for business logic.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    event_publisher: Option<EventPublisherService>,
    id_gen: IdGenerator,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(notification_repo: NotificationRepository) -> Self {
        Self {
            notification_repo,
            event_publisher: None,
            id_gen: IdGenerator::new(),
        }
    }

    /// Set the event publisher.
    pub fn set_event_publisher(&mut self, event_publisher: EventPublisherService) {
        self.event_publisher = Some(event_publisher);
    }

    /// Notify a branch admin that a complaint was filed.
    pub async fn notify_new_complaint(
        &self,
        recipient_id: &str,
        category: &str,
        title: &str,
        complaint_id: &str,
    ) -> AppResult<notification::Model> {
        let message = format!("New {category} complaint: \"{title}\"");
        self.create_internal(
            recipient_id,
            NotificationType::NewComplaint,
            message,
            Some(complaint_id),
        )
        .await
    }

    /// Notify a complaint owner about a status change.
    pub async fn notify_status_change(
        &self,
        recipient_id: &str,
        title: &str,
        status: Status,
        complaint_id: &str,
    ) -> AppResult<notification::Model> {
        let phrase = match status {
            Status::InProgress => "picked up and is in progress",
            Status::Resolved => "resolved",
            Status::Open => "reopened",
        };
        let message = format!("Your complaint \"{title}\" has been {phrase}");
        self.create_internal(
            recipient_id,
            NotificationType::StatusChange,
            message,
            Some(complaint_id),
        )
        .await
    }

    /// Notify a branch admin that a resolved complaint was rated.
    pub async fn notify_review_received(
        &self,
        recipient_id: &str,
        rating: i32,
        title: &str,
        complaint_id: &str,
    ) -> AppResult<notification::Model> {
        let message = format!("\u{2B50} New {rating}-star rating for \"{title}\"");
        self.create_internal(
            recipient_id,
            NotificationType::ReviewReceived,
            message,
            Some(complaint_id),
        )
        .await
    }

    async fn create_internal(
        &self,
        recipient_id: &str,
        notification_type: NotificationType,
        message: String,
        complaint_id: Option<&str>,
    ) -> AppResult<notification::Model> {
        let model = notification::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(recipient_id.to_string()),
            notification_type: Set(notification_type),
            message: Set(message),
            complaint_id: Set(complaint_id.map(ToString::to_string)),
            ..Default::default()
        };

        let created = self.notification_repo.create(model).await?;

        if let Some(ref event_publisher) = self.event_publisher {
            if let Err(e) = event_publisher
                .publish_notification(
                    &created.id,
                    &created.user_id,
                    created.notification_type.as_str(),
                    &created.message,
                    created.complaint_id.as_deref(),
                )
                .await
            {
                tracing::warn!(error = %e, "Failed to publish notification event");
            }
        }

        Ok(created)
    }

    /// Get notifications for a user.
    pub async fn list(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
        unread_only: bool,
    ) -> AppResult<Vec<notification::Model>> {
        self.notification_repo
            .find_by_user(user_id, limit, until_id, unread_only)
            .await
    }

    /// Count unread notifications for a user.
    pub async fn count_unread(&self, user_id: &str) -> AppResult<u64> {
        self.notification_repo.count_unread(user_id).await
    }

    /// Mark a notification as read. Only the recipient may do this.
    pub async fn mark_as_read(&self, user_id: &str, notification_id: &str) -> AppResult<()> {
        let notification = self
            .notification_repo
            .find_by_id(notification_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;

        if notification.user_id != user_id {
            return Err(AppError::Forbidden(
                "Not your notification".to_string(),
            ));
        }

        self.notification_repo.mark_as_read(notification_id).await
    }

    /// Mark all of a user's notifications as read. Returns how many changed.
    pub async fn mark_all_as_read(&self, user_id: &str) -> AppResult<u64> {
        self.notification_repo.mark_all_as_read(user_id).await
    }

    /// Delete a notification. Only the recipient may do this.
    pub async fn delete(&self, user_id: &str, notification_id: &str) -> AppResult<()> {
        let notification = self
            .notification_repo
            .find_by_id(notification_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;

        if notification.user_id != user_id {
            return Err(AppError::Forbidden(
                "Not your notification".to_string(),
            ));
        }

        self.notification_repo.delete(notification_id).await
    }

    /// Delete all of a user's notifications. Returns how many were removed.
    pub async fn delete_all(&self, user_id: &str) -> AppResult<u64> {
        self.notification_repo.delete_all_for_user(user_id).await
    }
}
