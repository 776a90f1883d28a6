//! Event publisher service.
//!
//! Provides an abstraction for publishing real-time events.
//! The actual implementation is provided by the realtime crate (Redis
//! Pub/Sub) or an in-process fallback in the server.

use async_trait::async_trait;
use campusdesk_common::AppResult;
use std::sync::Arc;

/// Trait for publishing real-time events.
///
/// Core services publish through this trait so they never depend on the
/// pub/sub implementation.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a complaint created event to its branch feed.
    async fn publish_complaint_created(
        &self,
        id: &str,
        user_id: &str,
        branch: &str,
        category: &str,
        title: &str,
    ) -> AppResult<()>;

    /// Publish a complaint updated event (edit or status change).
    async fn publish_complaint_updated(&self, id: &str, branch: &str, status: &str)
        -> AppResult<()>;

    /// Publish a complaint removed event.
    async fn publish_complaint_removed(&self, id: &str, branch: &str) -> AppResult<()>;

    /// Publish a vote cast event with the applied delta and resulting score.
    async fn publish_vote_cast(
        &self,
        complaint_id: &str,
        user_id: &str,
        branch: &str,
        vote: Option<&str>,
        delta: i32,
        score: i32,
    ) -> AppResult<()>;

    /// Publish a notification event to its recipient.
    async fn publish_notification(
        &self,
        id: &str,
        user_id: &str,
        notification_type: &str,
        message: &str,
        complaint_id: Option<&str>,
    ) -> AppResult<()>;
}

/// A no-op implementation of `EventPublisher` for testing or when real-time
/// events are disabled.
#[derive(Clone, Default)]
pub struct NoOpEventPublisher;

#[async_trait]
impl EventPublisher for NoOpEventPublisher {
    async fn publish_complaint_created(
        &self,
        _id: &str,
        _user_id: &str,
        _branch: &str,
        _category: &str,
        _title: &str,
    ) -> AppResult<()> {
        Ok(())
    }

    async fn publish_complaint_updated(
        &self,
        _id: &str,
        _branch: &str,
        _status: &str,
    ) -> AppResult<()> {
        Ok(())
    }

    async fn publish_complaint_removed(&self, _id: &str, _branch: &str) -> AppResult<()> {
        Ok(())
    }

    async fn publish_vote_cast(
        &self,
        _complaint_id: &str,
        _user_id: &str,
        _branch: &str,
        _vote: Option<&str>,
        _delta: i32,
        _score: i32,
    ) -> AppResult<()> {
        Ok(())
    }

    async fn publish_notification(
        &self,
        _id: &str,
        _user_id: &str,
        _notification_type: &str,
        _message: &str,
        _complaint_id: Option<&str>,
    ) -> AppResult<()> {
        Ok(())
    }
}

/// Wrapper for boxed `EventPublisher` trait object.
pub type EventPublisherService = Arc<dyn EventPublisher>;
