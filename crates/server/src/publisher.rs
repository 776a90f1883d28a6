//! Event publisher wiring.
//!
//! With Redis enabled, events flow through Pub/Sub and come back via the
//! bridge, so every instance fans them out to its SSE clients. Without
//! Redis, `SsePublisher` short-circuits straight into the local broadcaster.

use async_trait::async_trait;
use campusdesk_api::{SseBroadcaster, SseEvent};
use campusdesk_common::AppResult;
use campusdesk_core::services::EventPublisher;
use campusdesk_realtime::PubSubEvent;

/// In-process publisher for single-instance deployments.
#[derive(Clone)]
pub struct SsePublisher {
    broadcaster: SseBroadcaster,
}

impl SsePublisher {
    /// Create a new in-process publisher.
    #[must_use]
    pub const fn new(broadcaster: SseBroadcaster) -> Self {
        Self { broadcaster }
    }
}

#[async_trait]
impl EventPublisher for SsePublisher {
    async fn publish_complaint_created(
        &self,
        id: &str,
        user_id: &str,
        branch: &str,
        category: &str,
        title: &str,
    ) -> AppResult<()> {
        self.broadcaster
            .broadcast_to_branch(
                branch,
                SseEvent::ComplaintCreated {
                    id: id.to_string(),
                    user_id: user_id.to_string(),
                    category: category.to_string(),
                    title: title.to_string(),
                },
            )
            .await;
        Ok(())
    }

    async fn publish_complaint_updated(
        &self,
        id: &str,
        branch: &str,
        status: &str,
    ) -> AppResult<()> {
        self.broadcaster
            .broadcast_to_branch(
                branch,
                SseEvent::ComplaintUpdated {
                    id: id.to_string(),
                    status: status.to_string(),
                },
            )
            .await;
        Ok(())
    }

    async fn publish_complaint_removed(&self, id: &str, branch: &str) -> AppResult<()> {
        self.broadcaster
            .broadcast_to_branch(branch, SseEvent::ComplaintRemoved { id: id.to_string() })
            .await;
        Ok(())
    }

    async fn publish_vote_cast(
        &self,
        complaint_id: &str,
        _user_id: &str,
        branch: &str,
        _vote: Option<&str>,
        delta: i32,
        score: i32,
    ) -> AppResult<()> {
        self.broadcaster
            .broadcast_to_branch(
                branch,
                SseEvent::VoteCast {
                    complaint_id: complaint_id.to_string(),
                    delta,
                    score,
                },
            )
            .await;
        Ok(())
    }

    async fn publish_notification(
        &self,
        id: &str,
        user_id: &str,
        notification_type: &str,
        message: &str,
        complaint_id: Option<&str>,
    ) -> AppResult<()> {
        self.broadcaster
            .broadcast_to_user(
                user_id,
                SseEvent::Notification {
                    id: id.to_string(),
                    notification_type: notification_type.to_string(),
                    message: message.to_string(),
                    complaint_id: complaint_id.map(String::from),
                },
            )
            .await;
        Ok(())
    }
}

/// Forward a Pub/Sub event received from Redis into the SSE broadcaster.
pub async fn forward_pubsub_event(broadcaster: &SseBroadcaster, event: PubSubEvent) {
    match event {
        PubSubEvent::ComplaintCreated {
            id,
            user_id,
            branch,
            category,
            title,
        } => {
            broadcaster
                .broadcast_to_branch(
                    &branch,
                    SseEvent::ComplaintCreated {
                        id,
                        user_id,
                        category,
                        title,
                    },
                )
                .await;
        }
        PubSubEvent::ComplaintUpdated { id, branch, status } => {
            broadcaster
                .broadcast_to_branch(&branch, SseEvent::ComplaintUpdated { id, status })
                .await;
        }
        PubSubEvent::ComplaintRemoved { id, branch } => {
            broadcaster
                .broadcast_to_branch(&branch, SseEvent::ComplaintRemoved { id })
                .await;
        }
        PubSubEvent::VoteCast {
            complaint_id,
            branch,
            delta,
            score,
            ..
        } => {
            broadcaster
                .broadcast_to_branch(
                    &branch,
                    SseEvent::VoteCast {
                        complaint_id,
                        delta,
                        score,
                    },
                )
                .await;
        }
        PubSubEvent::Notification {
            id,
            user_id,
            notification_type,
            message,
            complaint_id,
        } => {
            broadcaster
                .broadcast_to_user(
                    &user_id,
                    SseEvent::Notification {
                        id,
                        notification_type,
                        message,
                        complaint_id,
                    },
                )
                .await;
        }
    }
}
