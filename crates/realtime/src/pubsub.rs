//! Redis Pub/Sub for cross-instance event distribution.
//!
//! Enables real-time event synchronization across multiple server instances
//! using Redis Pub/Sub channels.

#![allow(missing_docs)]

use std::sync::Arc;

use async_trait::async_trait;
use campusdesk_common::AppResult;
use campusdesk_core::services::EventPublisher;
use fred::clients::{Client, SubscriberClient};
use fred::error::{Error as RedisError, ErrorKind as RedisErrorKind};
use fred::interfaces::{ClientLike, EventInterface, PubsubInterface};
use fred::types::config::Config as RedisConfig;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Pub/Sub channel names.
pub mod channels {
    /// Complaint lifecycle events (create, update, vote, remove).
    pub const COMPLAINTS: &str = "campusdesk:complaints";
    /// Notification events.
    pub const NOTIFICATIONS: &str = "campusdesk:notifications";
}

/// Pub/Sub event types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PubSubEvent {
    /// A complaint was filed.
    ComplaintCreated {
        id: String,
        user_id: String,
        branch: String,
        category: String,
        title: String,
    },
    /// A complaint was edited or its status changed.
    ComplaintUpdated {
        id: String,
        branch: String,
        status: String,
    },
    /// A complaint was removed.
    ComplaintRemoved { id: String, branch: String },
    /// A vote was cast, retracted or flipped.
    VoteCast {
        complaint_id: String,
        user_id: String,
        branch: String,
        vote: Option<String>,
        delta: i32,
        score: i32,
    },
    /// A notification was created for a user.
    Notification {
        id: String,
        user_id: String,
        notification_type: String,
        message: String,
        complaint_id: Option<String>,
    },
}

/// Redis Pub/Sub manager for event distribution.
#[derive(Clone)]
pub struct RedisPubSub {
    publisher: Client,
    subscriber: SubscriberClient,
    /// Local broadcast channel for events received from Redis.
    local_tx: broadcast::Sender<PubSubEvent>,
}

impl RedisPubSub {
    /// Create a new Redis Pub/Sub manager.
    pub async fn new(redis_url: &str) -> Result<Self, RedisError> {
        let config = RedisConfig::from_url(redis_url)?;

        let publisher = Client::new(config.clone(), None, None, None);
        publisher.init().await?;

        let subscriber = SubscriberClient::new(config, None, None, None);
        subscriber.init().await?;

        let (local_tx, _) = broadcast::channel(1000);

        info!("Redis Pub/Sub initialized");

        Ok(Self {
            publisher,
            subscriber,
            local_tx,
        })
    }

    /// Subscribe to the portal channels and start the event loop.
    pub async fn start(&self) -> Result<(), RedisError> {
        self.subscriber.subscribe(channels::COMPLAINTS).await?;
        self.subscriber.subscribe(channels::NOTIFICATIONS).await?;

        info!("Subscribed to Redis Pub/Sub channels");

        let local_tx = self.local_tx.clone();
        let mut message_stream = self.subscriber.message_rx();

        tokio::spawn(async move {
            while let Ok(message) = message_stream.recv().await {
                if let Some(payload) = message.value.as_string() {
                    match serde_json::from_str::<PubSubEvent>(&payload) {
                        Ok(event) => {
                            debug!(?event, "Received Pub/Sub event");
                            if local_tx.send(event).is_err() {
                                warn!("No local subscribers for Pub/Sub event");
                            }
                        }
                        Err(e) => {
                            warn!("Failed to parse Pub/Sub message: {}", e);
                        }
                    }
                }
            }
            info!("Pub/Sub message stream ended");
        });

        Ok(())
    }

    /// Publish an event to a channel.
    pub async fn publish(&self, channel: &str, event: &PubSubEvent) -> Result<(), RedisError> {
        let payload = serde_json::to_string(event).map_err(|e| {
            RedisError::new(
                RedisErrorKind::InvalidArgument,
                format!("Serialization error: {e}"),
            )
        })?;
        let _: () = self.publisher.publish(channel, payload).await?;
        debug!(channel, ?event, "Published Pub/Sub event");
        Ok(())
    }

    /// Get a receiver for local broadcast events.
    #[must_use]
    pub fn subscribe_local(&self) -> broadcast::Receiver<PubSubEvent> {
        self.local_tx.subscribe()
    }

    /// Get the number of local subscribers.
    #[must_use]
    pub fn local_subscriber_count(&self) -> usize {
        self.local_tx.receiver_count()
    }

    /// Shutdown the Pub/Sub manager.
    pub async fn shutdown(&self) -> Result<(), RedisError> {
        self.subscriber.quit().await?;
        self.publisher.quit().await?;
        info!("Redis Pub/Sub shutdown");
        Ok(())
    }

    fn redis_err(e: RedisError) -> campusdesk_common::AppError {
        campusdesk_common::AppError::Redis(e.to_string())
    }
}

/// Implementation of `EventPublisher` for `RedisPubSub`.
/// Core services publish events without depending on this crate directly.
#[async_trait]
impl EventPublisher for RedisPubSub {
    async fn publish_complaint_created(
        &self,
        id: &str,
        user_id: &str,
        branch: &str,
        category: &str,
        title: &str,
    ) -> AppResult<()> {
        let event = PubSubEvent::ComplaintCreated {
            id: id.to_string(),
            user_id: user_id.to_string(),
            branch: branch.to_string(),
            category: category.to_string(),
            title: title.to_string(),
        };
        self.publish(channels::COMPLAINTS, &event)
            .await
            .map_err(Self::redis_err)
    }

    async fn publish_complaint_updated(
        &self,
        id: &str,
        branch: &str,
        status: &str,
    ) -> AppResult<()> {
        let event = PubSubEvent::ComplaintUpdated {
            id: id.to_string(),
            branch: branch.to_string(),
            status: status.to_string(),
        };
        self.publish(channels::COMPLAINTS, &event)
            .await
            .map_err(Self::redis_err)
    }

    async fn publish_complaint_removed(&self, id: &str, branch: &str) -> AppResult<()> {
        let event = PubSubEvent::ComplaintRemoved {
            id: id.to_string(),
            branch: branch.to_string(),
        };
        self.publish(channels::COMPLAINTS, &event)
            .await
            .map_err(Self::redis_err)
    }

    async fn publish_vote_cast(
        &self,
        complaint_id: &str,
        user_id: &str,
        branch: &str,
        vote: Option<&str>,
        delta: i32,
        score: i32,
    ) -> AppResult<()> {
        let event = PubSubEvent::VoteCast {
            complaint_id: complaint_id.to_string(),
            user_id: user_id.to_string(),
            branch: branch.to_string(),
            vote: vote.map(String::from),
            delta,
            score,
        };
        self.publish(channels::COMPLAINTS, &event)
            .await
            .map_err(Self::redis_err)
    }

    async fn publish_notification(
        &self,
        id: &str,
        user_id: &str,
        notification_type: &str,
        message: &str,
        complaint_id: Option<&str>,
    ) -> AppResult<()> {
        let event = PubSubEvent::Notification {
            id: id.to_string(),
            user_id: user_id.to_string(),
            notification_type: notification_type.to_string(),
            message: message.to_string(),
            complaint_id: complaint_id.map(String::from),
        };
        self.publish(channels::NOTIFICATIONS, &event)
            .await
            .map_err(Self::redis_err)
    }
}

/// Bridge between Redis Pub/Sub and the SSE broadcaster.
pub struct PubSubSseBridge {
    pubsub: Arc<RedisPubSub>,
}

impl PubSubSseBridge {
    /// Create a new bridge.
    #[must_use]
    pub const fn new(pubsub: Arc<RedisPubSub>) -> Self {
        Self { pubsub }
    }

    /// Start the bridge, forwarding events from Redis to the callback.
    pub async fn start<F>(&self, on_event: F)
    where
        F: Fn(PubSubEvent) + Send + Sync + 'static,
    {
        let mut rx = self.pubsub.subscribe_local();

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => on_event(event),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("SSE bridge lagged by {} events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("SSE bridge channel closed");
                        break;
                    }
                }
            }
        });
    }
}
